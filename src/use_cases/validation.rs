// Size checks for variable-length attack messages, done before anything is trusted.

use crate::domain::CombatError;

/// Largest frame a response may occupy, header included.
pub const PACKET_BUFFER_SIZE: usize = 4096;
pub const PACKET_HEADER_SIZE: usize = 8;

/// Fixed part of each response kind and the size of one trailing result.
pub const ATTACK_NPCS_HEADER: usize = 8;
pub const ATTACK_CHARS_HEADER: usize = 8;
pub const GRENADE_HIT_HEADER: usize = 16;
pub const ATTACK_RESULT_SIZE: usize = 16;
pub const CHAR_ATTACK_RESULT_SIZE: usize = 20;

/// How many results fit in a response whose fixed part is `header` bytes.
pub const fn result_capacity(header: usize, item: usize) -> usize {
    (PACKET_BUFFER_SIZE - PACKET_HEADER_SIZE - header) / item
}

/// Checks a claimed target count against what arrived and what can be answered.
pub fn validate_targets(
    claimed: usize,
    received: usize,
    limit: Option<usize>,
    capacity: usize,
) -> Result<(), CombatError> {
    if claimed != received {
        return Err(CombatError::CountMismatch { claimed, received });
    }
    if let Some(limit) = limit {
        if claimed > limit {
            return Err(CombatError::TooManyTargets {
                count: claimed,
                limit,
            });
        }
    }
    if claimed > capacity {
        return Err(CombatError::ResponseOverflow { count: claimed });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_accounts_for_header_and_item_size() {
        assert_eq!(result_capacity(ATTACK_NPCS_HEADER, ATTACK_RESULT_SIZE), 255);
        assert_eq!(
            result_capacity(ATTACK_CHARS_HEADER, CHAR_ATTACK_RESULT_SIZE),
            204
        );
    }

    #[test]
    fn mismatched_counts_are_rejected_first() {
        assert_eq!(
            validate_targets(2, 5, Some(3), 255),
            Err(CombatError::CountMismatch {
                claimed: 2,
                received: 5
            })
        );
    }

    #[test]
    fn limit_and_capacity_are_both_enforced() {
        assert_eq!(
            validate_targets(4, 4, Some(3), 255),
            Err(CombatError::TooManyTargets { count: 4, limit: 3 })
        );
        assert_eq!(
            validate_targets(300, 300, None, 255),
            Err(CombatError::ResponseOverflow { count: 300 })
        );
        assert_eq!(validate_targets(3, 3, Some(3), 255), Ok(()));
        assert_eq!(validate_targets(0, 0, None, 255), Ok(()));
    }
}
