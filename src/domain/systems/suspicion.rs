use crate::domain::state::{Player, Suspicion};
use crate::domain::tuning::SuspicionTuning;

/// What the attack handler should do with the shot that was just recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Go ahead, scaling outgoing damage by `penalty` (1.0 means untouched).
    Allow { penalty: f32 },
    /// Drop the connection and discard the attack.
    Terminate,
}

/// Scores the cadence of one ranged or melee attack and stamps the shot time.
pub fn record_shot(player: &mut Player, tuning: &SuspicionTuning, now: u64) -> Verdict {
    let elapsed = now.saturating_sub(player.last_shot).min(i64::MAX as u64) as i64;
    let fire_rate = i64::from(player.fire_rate);
    let mut score = i64::from(player.suspicion.fire_rate);
    let gain = fire_rate * tuning.expected_gap - elapsed;

    if elapsed < fire_rate * tuning.rapid_window {
        score += gain;
    } else if elapsed < fire_rate * tuning.decay_window && score > 0 {
        score += gain;
    } else if score > i64::from(tuning.penalty_threshold) {
        score -= i64::from(tuning.bleed);
    }

    player.last_shot = now;
    player.last_activity = now;
    player.suspicion.fire_rate = score.clamp(0, i64::from(i32::MAX)) as i32;

    if player.suspicion.fire_rate > tuning.kill_threshold {
        Verdict::Terminate
    } else {
        Verdict::Allow {
            penalty: penalty(player.suspicion.fire_rate, tuning),
        }
    }
}

/// Damage multiplier for a fire-rate score.
pub fn penalty(score: i32, tuning: &SuspicionTuning) -> f32 {
    if score <= tuning.penalty_threshold {
        return 1.0;
    }
    let excess = (score - tuning.penalty_threshold) as f32;
    (1.0 - excess * tuning.penalty_slope).max(0.0)
}

/// Folds one player tick's worth of movement messages into the movement score.
pub fn record_movement_tick(suspicion: &mut Suspicion, movements: u32, tuning: &SuspicionTuning) {
    if movements > tuning.movement_burst {
        let burst = (movements - tuning.movement_burst).min(i32::MAX as u32) as i32;
        suspicion.movement = suspicion
            .movement
            .saturating_add(burst.saturating_mul(tuning.movement_gain));
    } else if movements > 0 && suspicion.movement > tuning.movement_relief {
        suspicion.movement -= tuning.movement_relief;
    }
}

/// Leaving combat forgives half of the fire-rate score above the penalty threshold.
pub fn relax_after_combat(suspicion: &mut Suspicion, tuning: &SuspicionTuning) {
    if suspicion.fire_rate > tuning.penalty_threshold {
        suspicion.fire_rate -= (suspicion.fire_rate - tuning.penalty_threshold) / 2;
    }
}

/// Defense a player gets against mob strikes while their movement score is high.
pub fn defense_under_suspicion(defense: i32, movement_score: i32, tuning: &SuspicionTuning) -> i32 {
    let reduced = if movement_score > tuning.defense_threshold {
        defense - (movement_score - tuning.defense_threshold)
    } else {
        defense
    };
    reduced.max(1)
}
