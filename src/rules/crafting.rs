use std::collections::HashSet;

use rand::Rng;
use serde::Serialize;

use super::RuleViolation;
use crate::model::{CardInstance, CraftingRecipe, Rarity};

const XP_PER_COLLECTOR_LEVEL: i64 = 1000;
pub const MIN_MATERIAL_COUNT: i32 = 2;
pub const MAX_MATERIAL_COUNT: i32 = 10;

/// Fixed crafting parameters for a result rarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RarityTable {
    /// Percent chance the craft succeeds.
    pub success_rate: i32,
    pub ix_credits_cost: i64,
    pub collector_xp_gain: i64,
}

pub fn rarity_table(rarity: Rarity) -> RarityTable {
    let (success_rate, ix_credits_cost, collector_xp_gain) = match rarity {
        Rarity::Common => (100, 100, 10),
        Rarity::Uncommon => (90, 250, 25),
        Rarity::Rare => (75, 500, 50),
        Rarity::UltraRare => (60, 1_000, 100),
        Rarity::Epic => (50, 2_500, 250),
        Rarity::Legendary => (30, 5_000, 500),
        Rarity::Mythic => (15, 10_000, 1_000),
    };
    RarityTable {
        success_rate,
        ix_credits_cost,
        collector_xp_gain,
    }
}

pub fn collector_level(collector_xp: i64) -> i32 {
    i32::try_from(collector_xp.max(0) / XP_PER_COLLECTOR_LEVEL + 1).unwrap_or(i32::MAX)
}

/// Validate the shape of a craft request before touching any owned rows:
/// the right number of distinct material ids.
pub fn check_material_ids(recipe: &CraftingRecipe, material_ids: &[i64]) -> Result<(), RuleViolation> {
    let distinct: HashSet<i64> = material_ids.iter().copied().collect();
    if distinct.len() != material_ids.len() {
        return Err(RuleViolation::new("material card ids must be distinct"));
    }
    if material_ids.len() != recipe.material_count as usize {
        return Err(RuleViolation::new(format!(
            "recipe {} needs {} materials, got {}",
            recipe.name,
            recipe.material_count,
            material_ids.len()
        )));
    }
    Ok(())
}

/// Check the locked material rows: every requested id must be present, owned
/// by `owner_id`, and of the recipe's required rarity.
pub fn check_materials(
    recipe: &CraftingRecipe,
    owner_id: &str,
    material_ids: &[i64],
    owned: &[CardInstance],
) -> Result<(), RuleViolation> {
    let owned_ids: HashSet<i64> = owned
        .iter()
        .filter(|c| c.owner_id == owner_id)
        .map(|c| c.id)
        .collect();
    if material_ids.iter().any(|id| !owned_ids.contains(id)) {
        return Err(RuleViolation::new("materials not owned"));
    }
    if let Some(wrong) = owned.iter().find(|c| c.rarity != recipe.required_rarity) {
        return Err(RuleViolation::new(format!(
            "card instance {} is {}, recipe requires {}",
            wrong.id, wrong.rarity, recipe.required_rarity
        )));
    }
    Ok(())
}

pub fn check_balance(recipe: &CraftingRecipe, balance: i64) -> Result<(), RuleViolation> {
    if balance < recipe.ix_credits_cost {
        return Err(RuleViolation::new(format!(
            "insufficient IxCredits: need {}, have {balance}",
            recipe.ix_credits_cost
        )));
    }
    Ok(())
}

pub fn roll_success(recipe: &CraftingRecipe, rng: &mut impl Rng) -> bool {
    rng.random_range(0..100) < recipe.success_rate
}

/// Collector progression after a craft. Only successful crafts award xp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectorProgress {
    pub xp_gained: i64,
    pub collector_xp: i64,
    pub collector_level: i32,
    pub leveled_up: bool,
}

pub fn progress_collector(current_xp: i64, current_level: i32, xp_gain: i64) -> CollectorProgress {
    let collector_xp = current_xp + xp_gain;
    let level = collector_level(collector_xp);
    CollectorProgress {
        xp_gained: xp_gain,
        collector_xp,
        collector_level: level,
        leveled_up: level > current_level,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::model::AcquiredVia;

    fn recipe(result: Rarity, material_count: i32) -> CraftingRecipe {
        let table = rarity_table(result);
        CraftingRecipe {
            id: 1,
            name: "fusion".to_string(),
            result_rarity: result,
            required_rarity: Rarity::Rare,
            material_count,
            success_rate: table.success_rate,
            ix_credits_cost: table.ix_credits_cost,
            collector_xp_gain: table.collector_xp_gain,
        }
    }

    fn instance(id: i64, owner: &str, rarity: Rarity) -> CardInstance {
        CardInstance {
            id,
            card_id: 100 + id,
            owner_id: owner.to_string(),
            rarity,
            acquired_via: AcquiredVia::Pack,
            acquired_at: Utc::now(),
        }
    }

    #[test]
    fn epic_table_values() {
        let table = rarity_table(Rarity::Epic);
        assert_eq!(table.success_rate, 50);
        assert_eq!(table.ix_credits_cost, 2_500);
        assert_eq!(table.collector_xp_gain, 250);
    }

    #[test]
    fn table_bounds() {
        assert_eq!(rarity_table(Rarity::Common).success_rate, 100);
        assert_eq!(rarity_table(Rarity::Mythic).success_rate, 15);
        let rates: Vec<i32> = Rarity::ALL.iter().map(|r| rarity_table(*r).success_rate).collect();
        assert!(rates.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn collector_level_steps_every_thousand() {
        assert_eq!(collector_level(0), 1);
        assert_eq!(collector_level(999), 1);
        assert_eq!(collector_level(1_000), 2);
        assert_eq!(collector_level(12_345), 13);
        assert_eq!(collector_level(-50), 1);
    }

    #[test]
    fn progress_reports_level_up() {
        let p = progress_collector(900, 1, 250);
        assert_eq!(p.collector_xp, 1_150);
        assert_eq!(p.collector_level, 2);
        assert!(p.leveled_up);
        assert!(!progress_collector(0, 1, 0).leveled_up);
    }

    #[test]
    fn material_ids_must_be_distinct_and_counted() {
        let r = recipe(Rarity::Epic, 3);
        assert!(check_material_ids(&r, &[1, 2, 3]).is_ok());
        assert!(check_material_ids(&r, &[1, 1, 2]).is_err());
        assert!(check_material_ids(&r, &[1, 2]).is_err());
    }

    #[test]
    fn materials_must_be_owned_and_of_required_rarity() {
        let r = recipe(Rarity::Epic, 2);
        let owned = vec![instance(1, "u1", Rarity::Rare), instance(2, "u1", Rarity::Rare)];
        assert!(check_materials(&r, "u1", &[1, 2], &owned).is_ok());

        let err = check_materials(&r, "u2", &[1, 2], &owned).unwrap_err();
        assert_eq!(err.to_string(), "materials not owned");

        let missing = check_materials(&r, "u1", &[1, 3], &owned[..1]).unwrap_err();
        assert_eq!(missing.to_string(), "materials not owned");

        let wrong = vec![instance(1, "u1", Rarity::Rare), instance(2, "u1", Rarity::Common)];
        assert!(check_materials(&r, "u1", &[1, 2], &wrong).is_err());
    }

    #[test]
    fn balance_must_cover_cost() {
        let r = recipe(Rarity::Epic, 2);
        assert!(check_balance(&r, 2_500).is_ok());
        assert!(check_balance(&r, 2_499).is_err());
    }

    #[test]
    fn common_always_succeeds_and_mythic_is_rare() {
        let mut rng = SmallRng::seed_from_u64(3);
        let common = recipe(Rarity::Common, 2);
        assert!((0..1_000).all(|_| roll_success(&common, &mut rng)));
        let mythic = recipe(Rarity::Mythic, 2);
        let wins = (0..10_000).filter(|_| roll_success(&mythic, &mut rng)).count();
        assert!((1_000..2_000).contains(&wins), "wins = {wins}");
    }
}
