use rand::Rng;

use crate::domain::state::{HitFlag, Style};

#[derive(Debug, Clone, Copy)]
pub struct DamageInput {
    pub attack: i32,
    pub defense: i32,
    /// Crit chance in percent.
    pub crit_rate: i32,
    pub crit_power: i32,
    pub attacker_style: Option<Style>,
    pub defender_style: Option<Style>,
}

/// Jitter-free damage before style and crit multipliers.
pub fn base_damage(attack: i32, defense: i32) -> f32 {
    let attack = attack as f32;
    let defense = defense as f32;
    let floor = 50.0 + attack * 0.1;
    (attack * attack / (attack + defense)).max(floor)
}

/// Style wheel multiplier: 1.25 for the winning side, 0.8 for the losing side.
pub fn style_multiplier(attacker: Option<Style>, defender: Option<Style>) -> f32 {
    let (Some(attacker), Some(defender)) = (attacker, defender) else {
        return 1.0;
    };
    if attacker == defender {
        return 1.0;
    }

    let attacker = attacker.index();
    let mut defender = defender.index();
    // Fold the two-step wraparound so the lower index always wins.
    if attacker - defender == 2 {
        defender += 3;
    }
    if defender - attacker == 2 {
        defender -= 3;
    }

    if attacker < defender { 1.25 } else { 0.8 }
}

/// Rolls one hit. Draws exactly two values from `rng` (jitter, then crit) unless
/// both powers are zero.
pub fn damage<R: Rng + ?Sized>(input: &DamageInput, rng: &mut R) -> (i32, HitFlag) {
    if i64::from(input.attack) + i64::from(input.defense) == 0 {
        return (0, HitFlag::Normal);
    }

    let mut amount = base_damage(input.attack, input.defense);
    amount *= rng.gen_range(0.8f32..=1.2f32);
    amount *= style_multiplier(input.attacker_style, input.defender_style);

    let flag = if rng.gen_range(0..100) < input.crit_rate {
        amount *= input.crit_power as f32;
        HitFlag::Critical
    } else {
        HitFlag::Normal
    };

    (amount as i32, flag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const STYLES: [Style; 3] = [Style::Adaptium, Style::Blastons, Style::Cosmix];

    fn plain(attack: i32, defense: i32) -> DamageInput {
        DamageInput {
            attack,
            defense,
            crit_rate: 0,
            crit_power: 1,
            attacker_style: None,
            defender_style: None,
        }
    }

    #[test]
    fn zero_powers_deal_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(damage(&plain(0, 0), &mut rng), (0, HitFlag::Normal));
    }

    #[test]
    fn extreme_powers_saturate_instead_of_overflowing() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let input = DamageInput {
            crit_rate: 100,
            crit_power: 2,
            ..plain(i32::MAX, 600)
        };
        let (amount, flag) = damage(&input, &mut rng);
        assert_eq!(flag, HitFlag::Critical);
        assert_eq!(amount, i32::MAX);
    }

    #[test]
    fn expectation_is_monotonic_in_attack_and_defense() {
        for defense in (0..2000).step_by(50) {
            let mut previous = base_damage(1, defense);
            for attack in (1..3000).step_by(25) {
                let current = base_damage(attack, defense);
                assert!(current >= previous, "attack {attack} defense {defense}");
                previous = current;
            }
        }

        for attack in (1..3000).step_by(50) {
            let mut previous = base_damage(attack, 0);
            for defense in (0..3000).step_by(25) {
                let current = base_damage(attack, defense);
                assert!(current <= previous, "attack {attack} defense {defense}");
                previous = current;
            }
        }
    }

    #[test]
    fn rolls_stay_inside_the_jitter_band() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for attack in [10, 200, 1500] {
            let expected = base_damage(attack, 300);
            for _ in 0..100 {
                let (amount, flag) = damage(&plain(attack, 300), &mut rng);
                assert_eq!(flag, HitFlag::Normal);
                assert!(amount as f32 >= (expected * 0.8).floor() - 1.0);
                assert!(amount as f32 <= expected * 1.2);
            }
        }
    }

    #[test]
    fn each_style_beats_exactly_one_other() {
        for attacker in STYLES {
            let wins = STYLES
                .iter()
                .filter(|defender| style_multiplier(Some(attacker), Some(**defender)) == 1.25)
                .count();
            assert_eq!(wins, 1, "{attacker:?}");
        }

        for attacker in STYLES {
            for defender in STYLES {
                if attacker == defender {
                    assert_eq!(style_multiplier(Some(attacker), Some(defender)), 1.0);
                    continue;
                }
                let forward = style_multiplier(Some(attacker), Some(defender));
                let backward = style_multiplier(Some(defender), Some(attacker));
                assert!(
                    (forward == 1.25 && backward == 0.8) || (forward == 0.8 && backward == 1.25),
                    "{attacker:?} vs {defender:?}"
                );
            }
        }
    }

    #[test]
    fn missing_style_on_either_side_is_neutral() {
        for style in STYLES {
            assert_eq!(style_multiplier(None, Some(style)), 1.0);
            assert_eq!(style_multiplier(Some(style), None), 1.0);
        }
        assert_eq!(style_multiplier(None, None), 1.0);
    }

    #[test]
    fn wheel_order_matches_the_lower_index_rule() {
        assert_eq!(
            style_multiplier(Some(Style::Adaptium), Some(Style::Blastons)),
            1.25
        );
        assert_eq!(
            style_multiplier(Some(Style::Blastons), Some(Style::Cosmix)),
            1.25
        );
        assert_eq!(
            style_multiplier(Some(Style::Cosmix), Some(Style::Adaptium)),
            1.25
        );
    }

    #[test]
    fn guaranteed_crit_multiplies_and_flags() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let input = DamageInput {
            crit_rate: 100,
            crit_power: 3,
            ..plain(400, 100)
        };
        let expected = base_damage(400, 100);
        for _ in 0..50 {
            let (amount, flag) = damage(&input, &mut rng);
            assert_eq!(flag, HitFlag::Critical);
            assert!(amount as f32 >= (expected * 0.8 * 3.0).floor() - 1.0);
            assert!(amount as f32 <= expected * 1.2 * 3.0);
        }
    }

    #[test]
    fn same_seed_reproduces_the_same_rolls() {
        let input = DamageInput {
            crit_rate: 30,
            crit_power: 2,
            attacker_style: Some(Style::Cosmix),
            defender_style: Some(Style::Adaptium),
            ..plain(250, 80)
        };
        let mut first = ChaCha8Rng::seed_from_u64(99);
        let mut second = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..64 {
            assert_eq!(damage(&input, &mut first), damage(&input, &mut second));
        }
    }
}
