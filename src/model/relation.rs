use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categorical label of a diplomatic relation, re-derived from its strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RelationshipCategory {
    Alliance,
    Trade,
    Neutral,
    Tension,
}

string_enum!(RelationshipCategory {
    Alliance => "alliance",
    Trade => "trade",
    Neutral => "neutral",
    Tension => "tension",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiplomaticRelation {
    pub id: i64,
    pub country_a: i64,
    pub country_b: i64,
    pub relationship: RelationshipCategory,
    /// Always within `[0, 100]`.
    pub strength: f64,
    pub last_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl DiplomaticRelation {
    pub fn involves(&self, country_id: i64) -> bool {
        self.country_a == country_id || self.country_b == country_id
    }

    /// The other side of the relation from `country_id`'s point of view.
    pub fn counterpart(&self, country_id: i64) -> i64 {
        if self.country_a == country_id {
            self.country_b
        } else {
            self.country_a
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RelationshipCategory::Alliance).unwrap(),
            "\"alliance\""
        );
        let back: RelationshipCategory = serde_json::from_str("\"tension\"").unwrap();
        assert_eq!(back, RelationshipCategory::Tension);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = serde_json::from_str::<RelationshipCategory>("\"frenemy\"").unwrap_err();
        assert!(err.to_string().contains("unknown RelationshipCategory"));
    }

    #[test]
    fn counterpart_resolves_either_side() {
        let rel = DiplomaticRelation {
            id: 1,
            country_a: 10,
            country_b: 20,
            relationship: RelationshipCategory::Neutral,
            strength: 50.0,
            last_reason: None,
            updated_at: Utc::now(),
        };
        assert_eq!(rel.counterpart(10), 20);
        assert_eq!(rel.counterpart(20), 10);
        assert!(rel.involves(20));
        assert!(!rel.involves(30));
    }
}
