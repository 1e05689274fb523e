use rand::Rng;

use crate::domain::state::{GroupMembership, PlayerId, Position};
use crate::domain::tuning::RewardTuning;

/// One set of random draws shared by every member rewarded for the same kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedRoll {
    pub loot: u32,
    pub event_loot: u32,
    pub qualifying_item: u32,
}

impl SharedRoll {
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            loot: rng.r#gen(),
            event_loot: rng.r#gen(),
            qualifying_item: rng.r#gen(),
        }
    }
}

/// What the distributor needs to know about a live group member.
#[derive(Debug, Clone, Copy)]
pub struct MemberView {
    pub last_activity: u64,
    pub position: Position,
}

#[derive(Debug, Clone, Copy)]
pub struct KillSite {
    pub killed_at: u64,
    pub position: Position,
}

/// Players who share in a kill made by `killer`.
///
/// `lookup` returns `None` for members whose session is gone. A solo killer is always
/// rewarded; group members must have been active recently and be near the kill.
pub fn eligible_recipients<F>(
    killer: PlayerId,
    group: &GroupMembership,
    lookup: F,
    kill: &KillSite,
    tuning: &RewardTuning,
) -> Vec<PlayerId>
where
    F: Fn(PlayerId) -> Option<MemberView>,
{
    if group.member_ids.len() <= 1 && group.leader_id == killer {
        return vec![killer];
    }

    group
        .member_ids
        .iter()
        .copied()
        .filter(|member_id| {
            let Some(member) = lookup(*member_id) else {
                return false;
            };
            let idle = kill.killed_at.saturating_sub(member.last_activity);
            idle <= tuning.activity_window_ms
                && member.position.planar_distance(&kill.position) <= tuning.share_radius
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    const KILLED_AT: u64 = 100_000;

    fn site() -> KillSite {
        KillSite {
            killed_at: KILLED_AT,
            position: Position::new(0, 0, 0),
        }
    }

    #[test]
    fn solo_killer_is_the_only_recipient() {
        let recipients = eligible_recipients(
            5,
            &GroupMembership::solo(5),
            |_| None,
            &site(),
            &RewardTuning::default(),
        );
        assert_eq!(recipients, vec![5]);
    }

    #[test]
    fn distant_and_idle_members_are_left_out() {
        let members = HashMap::from([
            (1, MemberView { last_activity: KILLED_AT, position: Position::new(100, 0, 0) }),
            (2, MemberView { last_activity: KILLED_AT, position: Position::new(6000, 0, 0) }),
            (3, MemberView { last_activity: KILLED_AT - 40_000, position: Position::new(50, 50, 0) }),
        ]);
        let group = GroupMembership {
            leader_id: 1,
            member_ids: vec![1, 2, 3],
        };

        let recipients = eligible_recipients(
            1,
            &group,
            |id| members.get(&id).copied(),
            &site(),
            &RewardTuning::default(),
        );
        assert_eq!(recipients, vec![1]);
    }

    #[test]
    fn offline_members_are_skipped_but_the_rest_share() {
        let members = HashMap::from([
            (1, MemberView { last_activity: KILLED_AT - 1_000, position: Position::new(0, 4999, 0) }),
            (3, MemberView { last_activity: KILLED_AT - 30_000, position: Position::new(0, 0, 0) }),
        ]);
        let group = GroupMembership {
            leader_id: 3,
            member_ids: vec![3, 2, 1],
        };

        let recipients = eligible_recipients(
            1,
            &group,
            |id| members.get(&id).copied(),
            &site(),
            &RewardTuning::default(),
        );
        assert_eq!(recipients, vec![3, 1]);
    }

    #[test]
    fn shared_roll_is_reproducible_from_a_seed() {
        let mut first = ChaCha8Rng::seed_from_u64(21);
        let mut second = ChaCha8Rng::seed_from_u64(21);
        assert_eq!(SharedRoll::draw(&mut first), SharedRoll::draw(&mut second));
    }
}
