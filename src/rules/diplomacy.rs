use serde::Serialize;

use crate::model::{EmbassyStatus, EmbassyTier, RelationshipCategory};

// --- Relation strength ---
pub const STRENGTH_MIN: f64 = 0.0;
pub const STRENGTH_MAX: f64 = 100.0;
pub const DEFAULT_STRENGTH: f64 = 50.0;
const ALLIANCE_THRESHOLD: f64 = 80.0;
const TRADE_THRESHOLD: f64 = 60.0;
const TENSION_THRESHOLD: f64 = 30.0;
const INFLUENCE_STEP: f64 = 10.0;

// --- Embassy establishment ---
pub const BASE_ESTABLISHMENT_COST: f64 = 100_000.0;
const AUTO_APPROVAL_MAX_DAYS: i32 = 7;

/// How much of an influence delta a relation absorbs given where it starts.
/// Low baselines move easily, strong alliances are slow to grow further.
pub fn influence_multiplier(category: RelationshipCategory) -> f64 {
    match category {
        RelationshipCategory::Tension => 1.5,
        RelationshipCategory::Neutral => 1.0,
        RelationshipCategory::Trade => 0.8,
        RelationshipCategory::Alliance => 0.5,
    }
}

/// Strength change produced by an influence delta: whole steps of ten,
/// scaled by the current category's multiplier.
pub fn influence_impact(delta: i32, current: RelationshipCategory) -> f64 {
    (f64::from(delta) / INFLUENCE_STEP).floor() * influence_multiplier(current)
}

/// Re-derive the category after a strength change.
///
/// Only three transitions exist: anything reaching 80 becomes an alliance, a
/// neutral relation reaching 60 becomes a trade partnership, and anything
/// falling under 30 becomes tension. Every other case keeps its label.
pub fn derive_category(current: RelationshipCategory, strength: f64) -> RelationshipCategory {
    if strength >= ALLIANCE_THRESHOLD {
        RelationshipCategory::Alliance
    } else if strength >= TRADE_THRESHOLD && current == RelationshipCategory::Neutral {
        RelationshipCategory::Trade
    } else if strength < TENSION_THRESHOLD {
        RelationshipCategory::Tension
    } else {
        current
    }
}

/// Category a freshly established relation starts in.
pub fn initial_category(strength: f64) -> RelationshipCategory {
    derive_category(RelationshipCategory::Neutral, strength)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelationshipUpdate {
    pub impact: f64,
    pub old_strength: f64,
    pub new_strength: f64,
    pub old_category: RelationshipCategory,
    pub new_category: RelationshipCategory,
}

impl RelationshipUpdate {
    pub fn category_changed(&self) -> bool {
        self.old_category != self.new_category
    }
}

pub fn apply_influence(
    category: RelationshipCategory,
    strength: f64,
    delta: i32,
) -> RelationshipUpdate {
    let impact = influence_impact(delta, category);
    let new_strength = (strength + impact).clamp(STRENGTH_MIN, STRENGTH_MAX);
    RelationshipUpdate {
        impact,
        old_strength: strength,
        new_strength,
        old_category: category,
        new_category: derive_category(category, new_strength),
    }
}

/// Cost multiplier for opening an embassy: hostile pairs pay double, close
/// allies half.
pub fn establishment_multiplier(strength: f64) -> f64 {
    if strength >= 80.0 {
        0.5
    } else if strength >= 60.0 {
        0.75
    } else if strength >= 30.0 {
        1.0
    } else {
        2.0
    }
}

pub fn approval_days(strength: f64) -> i32 {
    if strength >= 80.0 {
        7
    } else if strength >= 60.0 {
        14
    } else if strength >= 30.0 {
        30
    } else {
        45
    }
}

pub fn tier_multiplier(tier: EmbassyTier) -> f64 {
    match tier {
        EmbassyTier::Embassy => 1.0,
        EmbassyTier::Consulate => 0.6,
        EmbassyTier::LiaisonOffice => 0.3,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstablishmentQuote {
    pub relationship_multiplier: f64,
    pub tier_multiplier: f64,
    pub total_cost: i64,
    pub approval_days: i32,
}

impl EstablishmentQuote {
    /// Quick approvals open immediately; everything else waits for the host.
    pub fn initial_status(&self) -> EmbassyStatus {
        if self.approval_days > AUTO_APPROVAL_MAX_DAYS {
            EmbassyStatus::Pending
        } else {
            EmbassyStatus::Active
        }
    }
}

pub fn quote_establishment(strength: f64, tier: EmbassyTier) -> EstablishmentQuote {
    let relationship_multiplier = establishment_multiplier(strength);
    let tier_multiplier = tier_multiplier(tier);
    EstablishmentQuote {
        relationship_multiplier,
        tier_multiplier,
        total_cost: (BASE_ESTABLISHMENT_COST * relationship_multiplier * tier_multiplier).round()
            as i64,
        approval_days: approval_days(strength),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RelationshipCategory::*;

    #[test]
    fn impact_uses_whole_steps_of_ten() {
        assert_eq!(influence_impact(25, Neutral), 2.0);
        assert_eq!(influence_impact(9, Neutral), 0.0);
        assert_eq!(influence_impact(40, Tension), 6.0);
        assert_eq!(influence_impact(40, Alliance), 2.0);
        assert_eq!(influence_impact(50, Trade), 4.0);
    }

    #[test]
    fn negative_delta_floors_away_from_zero() {
        assert_eq!(influence_impact(-15, Neutral), -2.0);
        assert_eq!(influence_impact(-1, Tension), -1.5);
    }

    #[test]
    fn strength_stays_clamped_for_extreme_deltas() {
        for category in RelationshipCategory::ALL {
            for delta in [-1000, -999, -10, 0, 10, 999, 1000] {
                for start in [0.0, 12.5, 50.0, 99.0, 100.0] {
                    let update = apply_influence(*category, start, delta);
                    assert!(
                        (0.0..=100.0).contains(&update.new_strength),
                        "{category} from {start} by {delta} gave {}",
                        update.new_strength
                    );
                }
            }
        }
    }

    #[test]
    fn jump_past_eighty_becomes_alliance() {
        // 55 -> 82 requires an impact of 27: 27 whole steps at 1.0x from neutral.
        let update = apply_influence(Neutral, 55.0, 270);
        assert_eq!(update.new_strength, 82.0);
        assert_eq!(update.new_category, Alliance);
        assert!(update.category_changed());

        assert_eq!(derive_category(Trade, 82.0), Alliance);
        assert_eq!(derive_category(Tension, 82.0), Alliance);
    }

    #[test]
    fn trade_only_reached_from_neutral() {
        assert_eq!(derive_category(Neutral, 65.0), Trade);
        assert_eq!(derive_category(Tension, 65.0), Tension);
        assert_eq!(derive_category(Alliance, 65.0), Alliance);
        assert_eq!(derive_category(Neutral, 59.9), Neutral);
    }

    #[test]
    fn falling_under_thirty_is_tension() {
        assert_eq!(derive_category(Alliance, 29.0), Tension);
        assert_eq!(derive_category(Neutral, 0.0), Tension);
        assert_eq!(derive_category(Neutral, 30.0), Neutral);
    }

    #[test]
    fn no_change_keeps_label() {
        let update = apply_influence(Trade, 70.0, 5);
        assert_eq!(update.impact, 0.0);
        assert!(!update.category_changed());
    }

    #[test]
    fn initial_category_from_strength() {
        assert_eq!(initial_category(DEFAULT_STRENGTH), Neutral);
        assert_eq!(initial_category(90.0), Alliance);
        assert_eq!(initial_category(62.0), Trade);
        assert_eq!(initial_category(10.0), Tension);
    }

    #[test]
    fn hostile_pair_pays_double_and_waits_longest() {
        let quote = quote_establishment(20.0, EmbassyTier::Embassy);
        assert_eq!(quote.relationship_multiplier, 2.0);
        assert_eq!(quote.tier_multiplier, 1.0);
        assert_eq!(quote.total_cost, 200_000);
        assert_eq!(quote.approval_days, 45);
        assert_eq!(quote.initial_status(), EmbassyStatus::Pending);
    }

    #[test]
    fn allies_get_discount_and_instant_opening() {
        let quote = quote_establishment(85.0, EmbassyTier::Consulate);
        assert_eq!(quote.total_cost, 30_000);
        assert_eq!(quote.approval_days, 7);
        assert_eq!(quote.initial_status(), EmbassyStatus::Active);
    }

    #[test]
    fn establishment_bands() {
        assert_eq!(establishment_multiplier(60.0), 0.75);
        assert_eq!(establishment_multiplier(30.0), 1.0);
        assert_eq!(approval_days(59.9), 30);
        assert_eq!(approval_days(29.9), 45);
        assert_eq!(
            quote_establishment(50.0, EmbassyTier::LiaisonOffice).total_cost,
            30_000
        );
    }
}
