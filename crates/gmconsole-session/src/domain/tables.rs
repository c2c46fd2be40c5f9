//! Fixed rule tables.

/// Experience awarded for defeating a creature of challenge rating 0 to 30.
const CHALLENGE_XP: [i32; 31] = [
    100, 200, 450, 700, 1_100, 1_800, 2_300, 2_900, 3_900, 5_000, 5_900, 7_200, 8_400, 10_000,
    11_500, 13_000, 15_000, 18_000, 20_000, 22_000, 25_000, 33_000, 41_000, 50_000, 62_000,
    75_000, 90_000, 105_000, 120_000, 135_000, 155_000,
];

/// Experience needed to reach levels 1 to 19.
const LEVEL_THRESHOLDS: [i32; 19] = [
    0, 300, 900, 2_700, 6_500, 14_000, 23_000, 34_000, 48_000, 64_000, 85_000, 100_000, 120_000,
    140_000, 165_000, 195_000, 225_000, 265_000, 305_000,
];

/// Modifier for an ability score: -5 at 1, 0 at 10-11, +10 at 30.
#[must_use]
pub fn ability_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// Experience for a challenge rating; ratings outside 0-30 award nothing.
#[must_use]
pub fn challenge_xp(rating: i32) -> i32 {
    usize::try_from(rating)
        .ok()
        .and_then(|i| CHALLENGE_XP.get(i))
        .copied()
        .unwrap_or(0)
}

/// Highest level whose threshold `experience` meets.
#[must_use]
pub fn level_for_experience(experience: i32) -> i32 {
    let reached = LEVEL_THRESHOLDS
        .iter()
        .take_while(|&&threshold| experience >= threshold)
        .count();
    i32::try_from(reached.max(1)).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_modifier_matches_table_ends() {
        assert_eq!(ability_modifier(1), -5);
        assert_eq!(ability_modifier(9), -1);
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(18), 4);
        assert_eq!(ability_modifier(30), 10);
    }

    #[test]
    fn test_challenge_xp_lookup() {
        assert_eq!(challenge_xp(0), 100);
        assert_eq!(challenge_xp(1), 200);
        assert_eq!(challenge_xp(30), 155_000);
        assert_eq!(challenge_xp(31), 0);
        assert_eq!(challenge_xp(-1), 0);
    }

    #[test]
    fn test_level_for_experience() {
        assert_eq!(level_for_experience(0), 1);
        assert_eq!(level_for_experience(299), 1);
        assert_eq!(level_for_experience(300), 2);
        assert_eq!(level_for_experience(7_000), 5);
        assert_eq!(level_for_experience(1_000_000), 19);
        assert_eq!(level_for_experience(-10), 1);
    }
}
