#[macro_use]
mod macros;

pub mod card;
pub mod country;
pub mod embassy;
pub mod notification;
pub mod relation;
pub mod security;

pub use card::{AcquiredVia, Card, CardInstance, Collector, CraftingAttempt, CraftingRecipe, Rarity};
pub use country::{Country, CountryRecord};
pub use embassy::{
    Embassy, EmbassyMission, EmbassyStatus, EmbassyTier, EmbassyUpgrade, MissionDifficulty,
    MissionStatus, MissionType, Specialization, UpgradeType,
};
pub use notification::{Notification, NotificationTarget, Priority};
pub use relation::{DiplomaticRelation, RelationshipCategory};
pub use security::{
    EventStatus, MilitaryBranch, SecurityEvent, SecurityEventType, SecurityLevel, SecurityThreat,
    Severity,
};
