//! Embassy mission success model, reward scaling, and embassy progression.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::{MissionDifficulty, MissionType};

// --- Success chance ---
const BASE_SUCCESS_CHANCE: f64 = 60.0;
const LEVEL_BONUS: f64 = 8.0;
const STAFF_BONUS: f64 = 5.0;
const EFFECTIVENESS_BASELINE: f64 = 50.0;
const EFFECTIVENESS_WEIGHT: f64 = 0.3;
const SPECIALIZATION_BONUS: f64 = 10.0;
pub const MIN_SUCCESS_CHANCE: f64 = 10.0;
pub const MAX_SUCCESS_CHANCE: f64 = 95.0;
const THRESHOLD_SUCCESS_CHANCE: f64 = 50.0;

// --- Rewards ---
const SUCCESS_REWARD_PERCENT: i64 = 100;
const FAILURE_REWARD_PERCENT: i64 = 30;
pub const STAT_CAP: i32 = 100;

// --- Progression ---
const EXPERIENCE_PER_LEVEL: i64 = 1000;
pub const MAX_EMBASSY_LEVEL: i32 = 10;

pub fn difficulty_modifier(difficulty: MissionDifficulty) -> f64 {
    match difficulty {
        MissionDifficulty::Easy => 20.0,
        MissionDifficulty::Medium => 0.0,
        MissionDifficulty::Hard => -15.0,
        MissionDifficulty::Expert => -25.0,
    }
}

/// Reward multiplier per difficulty, in percent.
pub fn difficulty_reward_percent(difficulty: MissionDifficulty) -> i64 {
    match difficulty {
        MissionDifficulty::Easy => 75,
        MissionDifficulty::Medium => 100,
        MissionDifficulty::Hard => 150,
        MissionDifficulty::Expert => 200,
    }
}

fn percent_of(amount: i64, percent: i64) -> i64 {
    amount * percent / 100
}

fn percent_of_i32(amount: i32, percent: i64) -> i32 {
    i32::try_from(percent_of(i64::from(amount), percent)).unwrap_or(i32::MAX)
}

/// Embassy attributes that feed the success chance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissionOdds {
    pub difficulty: MissionDifficulty,
    pub level: i32,
    pub staff_assigned: i32,
    pub effectiveness: i32,
    pub specialization_level: i32,
}

/// Percentage chance that a mission succeeds, clamped to `[10, 95]`.
pub fn success_chance(odds: &MissionOdds) -> f64 {
    let raw = BASE_SUCCESS_CHANCE
        + difficulty_modifier(odds.difficulty)
        + f64::from(odds.level - 1) * LEVEL_BONUS
        + f64::from(odds.staff_assigned - 1) * STAFF_BONUS
        + (f64::from(odds.effectiveness) - EFFECTIVENESS_BASELINE) * EFFECTIVENESS_WEIGHT
        + f64::from(odds.specialization_level) * SPECIALIZATION_BONUS;
    raw.clamp(MIN_SUCCESS_CHANCE, MAX_SUCCESS_CHANCE)
}

/// How a finished mission decides between success and failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Uniform draw in `[0, 100)` compared against the chance.
    #[default]
    Roll,
    /// Succeeds whenever the chance is at least 50%.
    Threshold,
}

impl std::str::FromStr for ResolutionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "roll" => Ok(ResolutionPolicy::Roll),
            "threshold" => Ok(ResolutionPolicy::Threshold),
            other => Err(format!("unknown resolution policy: {other}")),
        }
    }
}

impl ResolutionPolicy {
    pub fn resolve(self, chance: f64, rng: &mut impl Rng) -> bool {
        match self {
            ResolutionPolicy::Roll => rng.random_range(0.0..100.0) < chance,
            ResolutionPolicy::Threshold => chance >= THRESHOLD_SUCCESS_CHANCE,
        }
    }
}

/// Fixed per-type mission parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MissionTemplate {
    pub experience: i64,
    pub influence: i32,
    pub reputation: i32,
    pub budget: i64,
    pub cost: i64,
    pub duration_days: i32,
}

pub fn mission_template(mission_type: MissionType) -> MissionTemplate {
    let (experience, influence, reputation, budget, cost, duration_days) = match mission_type {
        MissionType::TradeNegotiation => (100, 5, 3, 20_000, 5_000, 7),
        MissionType::CulturalExchange => (80, 3, 6, 5_000, 3_000, 5),
        MissionType::IntelligenceGathering => (150, 4, 1, 0, 8_000, 10),
        MissionType::CrisisManagement => (200, 8, 8, 0, 12_000, 3),
        MissionType::EconomicCooperation => (120, 6, 4, 30_000, 10_000, 14),
    };
    MissionTemplate {
        experience,
        influence,
        reputation,
        budget,
        cost,
        duration_days,
    }
}

/// Rewards promised by a mission, fixed when the mission starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MissionRewards {
    pub experience: i64,
    pub influence: i32,
    pub reputation: i32,
    pub budget: i64,
}

impl MissionRewards {
    pub fn for_mission(mission_type: MissionType, difficulty: MissionDifficulty) -> Self {
        let template = mission_template(mission_type);
        let pct = difficulty_reward_percent(difficulty);
        Self {
            experience: percent_of(template.experience, pct),
            influence: percent_of_i32(template.influence, pct),
            reputation: percent_of_i32(template.reputation, pct),
            budget: percent_of(template.budget, pct),
        }
    }

    /// Full rewards on success, 30% on failure.
    pub fn scaled(&self, success: bool) -> Self {
        let pct = if success {
            SUCCESS_REWARD_PERCENT
        } else {
            FAILURE_REWARD_PERCENT
        };
        Self {
            experience: percent_of(self.experience, pct),
            influence: percent_of_i32(self.influence, pct),
            reputation: percent_of_i32(self.reputation, pct),
            budget: percent_of(self.budget, pct),
        }
    }
}

/// Add `amount` to a capped stat without leaving `[0, 100]`.
pub fn capped_add(current: i32, amount: i32) -> i32 {
    current.saturating_add(amount).clamp(0, STAT_CAP)
}

pub fn experience_to_next_level(level: i32) -> i64 {
    i64::from(level) * EXPERIENCE_PER_LEVEL
}

/// Level and leftover experience after spending accumulated experience on
/// level-ups. Surplus carries over; the max level keeps the remainder.
pub fn advance_level(level: i32, experience: i64) -> (i32, i64) {
    let mut level = level.max(1);
    let mut experience = experience.max(0);
    while level < MAX_EMBASSY_LEVEL && experience >= experience_to_next_level(level) {
        experience -= experience_to_next_level(level);
        level += 1;
    }
    (level, experience)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn odds(difficulty: MissionDifficulty) -> MissionOdds {
        MissionOdds {
            difficulty,
            level: 1,
            staff_assigned: 1,
            effectiveness: 50,
            specialization_level: 0,
        }
    }

    #[test]
    fn baseline_chances_per_difficulty() {
        assert_eq!(success_chance(&odds(MissionDifficulty::Easy)), 80.0);
        assert_eq!(success_chance(&odds(MissionDifficulty::Medium)), 60.0);
        assert_eq!(success_chance(&odds(MissionDifficulty::Hard)), 45.0);
        assert_eq!(success_chance(&odds(MissionDifficulty::Expert)), 35.0);
    }

    #[test]
    fn attributes_add_up() {
        let chance = success_chance(&MissionOdds {
            difficulty: MissionDifficulty::Hard,
            level: 2,
            staff_assigned: 3,
            effectiveness: 60,
            specialization_level: 1,
        });
        // 60 - 15 + 8 + 10 + 3 + 10
        assert!((chance - 76.0).abs() < 1e-9);
    }

    #[test]
    fn chance_always_clamped() {
        for difficulty in MissionDifficulty::ALL {
            for level in [1, 5, 10, 40] {
                for staff_assigned in [1, 4, 20] {
                    for effectiveness in [0, 50, 100, 1000] {
                        for specialization_level in [0, 5] {
                            let chance = success_chance(&MissionOdds {
                                difficulty: *difficulty,
                                level,
                                staff_assigned,
                                effectiveness,
                                specialization_level,
                            });
                            assert!((MIN_SUCCESS_CHANCE..=MAX_SUCCESS_CHANCE).contains(&chance));
                        }
                    }
                }
            }
        }
        let floor = success_chance(&MissionOdds {
            difficulty: MissionDifficulty::Expert,
            level: 1,
            staff_assigned: 1,
            effectiveness: -200,
            specialization_level: 0,
        });
        assert_eq!(floor, MIN_SUCCESS_CHANCE);
    }

    #[test]
    fn threshold_policy_is_deterministic() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(ResolutionPolicy::Threshold.resolve(50.0, &mut rng));
        assert!(!ResolutionPolicy::Threshold.resolve(49.9, &mut rng));
    }

    #[test]
    fn roll_policy_tracks_chance() {
        let mut rng = SmallRng::seed_from_u64(42);
        let wins = (0..10_000)
            .filter(|_| ResolutionPolicy::Roll.resolve(80.0, &mut rng))
            .count();
        assert!((7_500..8_500).contains(&wins), "wins = {wins}");
        assert!(!ResolutionPolicy::Roll.resolve(0.0, &mut rng));
        assert!(ResolutionPolicy::Roll.resolve(100.0, &mut rng));
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!("roll".parse::<ResolutionPolicy>(), Ok(ResolutionPolicy::Roll));
        assert_eq!("threshold".parse::<ResolutionPolicy>(), Ok(ResolutionPolicy::Threshold));
        assert!("coin".parse::<ResolutionPolicy>().is_err());
    }

    #[test]
    fn failure_pays_thirty_percent() {
        let rewards =
            MissionRewards::for_mission(MissionType::TradeNegotiation, MissionDifficulty::Medium);
        assert_eq!(rewards.experience, 100);
        assert_eq!(rewards.scaled(true), rewards);
        let failed = rewards.scaled(false);
        assert_eq!(failed.experience, 30);
        assert_eq!(failed.influence, 1);
        assert_eq!(failed.reputation, 0);
        assert_eq!(failed.budget, 6_000);
    }

    #[test]
    fn difficulty_scales_rewards() {
        let expert =
            MissionRewards::for_mission(MissionType::CrisisManagement, MissionDifficulty::Expert);
        assert_eq!(expert.experience, 400);
        assert_eq!(expert.influence, 16);
        let easy =
            MissionRewards::for_mission(MissionType::CulturalExchange, MissionDifficulty::Easy);
        assert_eq!(easy.experience, 60);
        assert_eq!(easy.reputation, 4);
    }

    #[test]
    fn capped_add_never_exceeds_hundred() {
        assert_eq!(capped_add(95, 16), 100);
        assert_eq!(capped_add(100, 1), 100);
        assert_eq!(capped_add(40, 5), 45);
        assert_eq!(capped_add(i32::MAX, i32::MAX), 100);
        assert_eq!(capped_add(3, -10), 0);
    }

    #[test]
    fn level_up_carries_surplus() {
        assert_eq!(advance_level(1, 999), (1, 999));
        assert_eq!(advance_level(1, 1000), (2, 0));
        // 1000 for level 1, 2000 for level 2, 500 left over.
        assert_eq!(advance_level(1, 3500), (3, 500));
    }

    #[test]
    fn level_up_stops_at_max() {
        let (level, leftover) = advance_level(9, 1_000_000);
        assert_eq!(level, MAX_EMBASSY_LEVEL);
        assert_eq!(leftover, 1_000_000 - 9_000);
    }
}
