use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EmbassyStatus {
    Pending,
    Active,
}

string_enum!(EmbassyStatus {
    Pending => "pending",
    Active => "active",
});

/// Diplomatic post size; scales the establishment cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EmbassyTier {
    Embassy,
    Consulate,
    LiaisonOffice,
}

string_enum!(EmbassyTier {
    Embassy => "embassy",
    Consulate => "consulate",
    LiaisonOffice => "liaison_office",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Specialization {
    Trade,
    Cultural,
    Intelligence,
    Security,
    Economic,
}

string_enum!(Specialization {
    Trade => "trade",
    Cultural => "cultural",
    Intelligence => "intelligence",
    Security => "security",
    Economic => "economic",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embassy {
    pub id: i64,
    pub host_country_id: i64,
    pub guest_country_id: i64,
    pub name: String,
    pub tier: EmbassyTier,
    pub status: EmbassyStatus,
    pub level: i32,
    pub experience: i64,
    /// Capped to `[0, 100]`.
    pub influence: i32,
    /// Capped to `[0, 100]`.
    pub reputation: i32,
    pub budget: i64,
    pub effectiveness: i32,
    pub staff_count: i32,
    pub specialization: Option<Specialization>,
    pub specialization_level: i32,
    pub establishment_cost: i64,
    pub approval_days: i32,
    pub established_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MissionType {
    TradeNegotiation,
    CulturalExchange,
    IntelligenceGathering,
    CrisisManagement,
    EconomicCooperation,
}

string_enum!(MissionType {
    TradeNegotiation => "trade_negotiation",
    CulturalExchange => "cultural_exchange",
    IntelligenceGathering => "intelligence_gathering",
    CrisisManagement => "crisis_management",
    EconomicCooperation => "economic_cooperation",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MissionDifficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

string_enum!(MissionDifficulty {
    Easy => "easy",
    Medium => "medium",
    Hard => "hard",
    Expert => "expert",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MissionStatus {
    Active,
    Completed,
    Failed,
}

string_enum!(MissionStatus {
    Active => "active",
    Completed => "completed",
    Failed => "failed",
});

impl MissionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, MissionStatus::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbassyMission {
    pub id: i64,
    pub embassy_id: i64,
    pub mission_type: MissionType,
    pub difficulty: MissionDifficulty,
    pub staff_assigned: i32,
    /// Percentage in `[10, 95]`, fixed at creation.
    pub success_chance: f64,
    pub status: MissionStatus,
    pub reward_experience: i64,
    pub reward_influence: i32,
    pub reward_reputation: i32,
    pub reward_budget: i64,
    pub cost: i64,
    pub duration_days: i32,
    pub started_at: DateTime<Utc>,
    pub completes_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum UpgradeType {
    StaffExpansion,
    SecurityEnhancement,
    TechnologyUpgrade,
    SpecializationTraining,
    FacilityExpansion,
}

string_enum!(UpgradeType {
    StaffExpansion => "staff_expansion",
    SecurityEnhancement => "security_enhancement",
    TechnologyUpgrade => "technology_upgrade",
    SpecializationTraining => "specialization_training",
    FacilityExpansion => "facility_expansion",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbassyUpgrade {
    pub id: i64,
    pub embassy_id: i64,
    pub upgrade_type: UpgradeType,
    pub level: i32,
    pub cost: i64,
    pub applied_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiword_variants_use_snake_case() {
        assert_eq!(EmbassyTier::LiaisonOffice.as_str(), "liaison_office");
        assert_eq!(
            "intelligence_gathering".parse::<MissionType>(),
            Ok(MissionType::IntelligenceGathering)
        );
        assert_eq!(
            serde_json::to_string(&UpgradeType::SpecializationTraining).unwrap(),
            "\"specialization_training\""
        );
    }

    #[test]
    fn only_active_missions_are_open() {
        assert!(!MissionStatus::Active.is_terminal());
        assert!(MissionStatus::Completed.is_terminal());
        assert!(MissionStatus::Failed.is_terminal());
    }

    #[test]
    fn all_lists_every_variant() {
        assert_eq!(MissionDifficulty::ALL.len(), 4);
        assert_eq!(Specialization::ALL.len(), 5);
    }

    #[test]
    fn embassies_are_pending_or_active() {
        assert_eq!(EmbassyStatus::ALL, &[EmbassyStatus::Pending, EmbassyStatus::Active]);
        assert!("suspended".parse::<EmbassyStatus>().is_err());
    }
}
