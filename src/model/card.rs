use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Card rarity. Crafting tables are keyed by this closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    UltraRare,
    Epic,
    Legendary,
    Mythic,
}

string_enum!(Rarity {
    Common => "COMMON",
    Uncommon => "UNCOMMON",
    Rare => "RARE",
    UltraRare => "ULTRA_RARE",
    Epic => "EPIC",
    Legendary => "LEGENDARY",
    Mythic => "MYTHIC",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum AcquiredVia {
    Pack,
    Craft,
    Trade,
    Grant,
}

string_enum!(AcquiredVia {
    Pack => "pack",
    Craft => "craft",
    Trade => "trade",
    Grant => "grant",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub id: i64,
    pub name: String,
    pub rarity: Rarity,
    pub season: i32,
}

/// One owned copy of a card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardInstance {
    pub id: i64,
    pub card_id: i64,
    pub owner_id: String,
    pub rarity: Rarity,
    pub acquired_via: AcquiredVia,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CraftingRecipe {
    pub id: i64,
    pub name: String,
    pub result_rarity: Rarity,
    pub required_rarity: Rarity,
    pub material_count: i32,
    pub success_rate: i32,
    pub ix_credits_cost: i64,
    pub collector_xp_gain: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collector {
    pub user_id: String,
    pub ix_credits: i64,
    pub collector_xp: i64,
    pub collector_level: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CraftingAttempt {
    pub id: i64,
    pub user_id: String,
    pub recipe_id: i64,
    pub success: bool,
    pub result_instance_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
