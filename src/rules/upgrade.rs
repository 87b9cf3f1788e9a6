use serde::Serialize;

use super::RuleViolation;
use super::mission::{STAT_CAP, capped_add};
use crate::model::{Embassy, UpgradeType};

pub const MAX_UPGRADE_LEVEL: i32 = 5;
pub const MAX_SPECIALIZATION_LEVEL: i32 = 5;

pub fn base_upgrade_cost(upgrade: UpgradeType) -> i64 {
    match upgrade {
        UpgradeType::StaffExpansion => 15_000,
        UpgradeType::SecurityEnhancement => 20_000,
        UpgradeType::TechnologyUpgrade => 25_000,
        UpgradeType::SpecializationTraining => 30_000,
        UpgradeType::FacilityExpansion => 50_000,
    }
}

/// Price of taking `upgrade` from `current_level` to the next level on an
/// embassy of `embassy_level`.
pub fn upgrade_cost(upgrade: UpgradeType, current_level: i32, embassy_level: i32) -> i64 {
    base_upgrade_cost(upgrade) * i64::from(current_level + 1) * i64::from(embassy_level.max(1))
}

/// Embassy stats after an upgrade lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpgradeOutcome {
    pub new_level: i32,
    pub cost: i64,
    pub staff_count: i32,
    pub effectiveness: i32,
    pub specialization_level: i32,
    pub reputation: i32,
}

pub fn plan_upgrade(
    embassy: &Embassy,
    upgrade: UpgradeType,
    current_level: i32,
) -> Result<UpgradeOutcome, RuleViolation> {
    if current_level >= MAX_UPGRADE_LEVEL {
        return Err(RuleViolation::new(format!(
            "{upgrade} is already at max level {MAX_UPGRADE_LEVEL}"
        )));
    }
    let cost = upgrade_cost(upgrade, current_level, embassy.level);
    if embassy.budget < cost {
        return Err(RuleViolation::new(format!(
            "insufficient embassy budget: {upgrade} costs {cost}, budget is {}",
            embassy.budget
        )));
    }

    let mut outcome = UpgradeOutcome {
        new_level: current_level + 1,
        cost,
        staff_count: embassy.staff_count,
        effectiveness: embassy.effectiveness,
        specialization_level: embassy.specialization_level,
        reputation: embassy.reputation,
    };
    match upgrade {
        UpgradeType::StaffExpansion => outcome.staff_count += 1,
        UpgradeType::SecurityEnhancement => {
            outcome.effectiveness = capped_add(outcome.effectiveness, 5);
        }
        UpgradeType::TechnologyUpgrade => {
            outcome.effectiveness = capped_add(outcome.effectiveness, 8);
        }
        UpgradeType::SpecializationTraining => {
            if embassy.specialization.is_none() {
                return Err(RuleViolation::new(
                    "specialization training requires a specialization",
                ));
            }
            if outcome.specialization_level >= MAX_SPECIALIZATION_LEVEL {
                return Err(RuleViolation::new("specialization is already at max level"));
            }
            outcome.specialization_level += 1;
        }
        UpgradeType::FacilityExpansion => {
            outcome.staff_count += 2;
            outcome.reputation = capped_add(outcome.reputation, 5);
        }
    }
    debug_assert!(outcome.effectiveness <= STAT_CAP && outcome.reputation <= STAT_CAP);
    Ok(outcome)
}
