// Follower NPC movement: trail the owner with a capped step per tick.

use crate::domain::state::Position;
use crate::domain::tuning::TickTuning;

/// Moves `from` toward `to` by at most `step` units, snapping once within reach.
pub fn lerp(from: (i32, i32), to: (i32, i32), step: i32) -> (i32, i32) {
    if step <= 0 {
        return from;
    }

    let dx = f64::from(to.0) - f64::from(from.0);
    let dy = f64::from(to.1) - f64::from(from.1);
    let distance = dx.hypot(dy);
    if distance <= f64::from(step) {
        return to;
    }

    let step = f64::from(step);
    (
        from.0 + (dx * step / distance) as i32,
        from.1 + (dy * step / distance) as i32,
    )
}

/// Next follower position, or `None` when it is already close enough to its owner.
///
/// A visible owner keeps a trailing gap; a vanished owner is walked right up to.
pub fn next_step(
    follower: &Position,
    owner: &Position,
    owner_vanished: bool,
    tuning: &TickTuning,
) -> Option<Position> {
    let mut distance = follower.planar_distance(owner) as i32;
    if !owner_vanished {
        distance -= tuning.follower_trail;
    }
    let travel = distance.min(tuning.follower_step);
    if travel < 1 {
        return None;
    }

    let (x, y) = lerp((follower.x, follower.y), (owner.x, owner.y), travel);
    Some(Position::new(x, y, owner.z))
}
