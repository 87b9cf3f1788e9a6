use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

string_enum!(Severity {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

impl Severity {
    pub fn weight(self) -> f64 {
        match self {
            Severity::Low => 1.0,
            Severity::Medium => 2.0,
            Severity::High => 3.0,
            Severity::Critical => 4.0,
        }
    }
}

/// Step classification of a country's overall security score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SecurityLevel {
    VerySecure,
    Secure,
    Moderate,
    Elevated,
    HighRisk,
    Critical,
}

string_enum!(SecurityLevel {
    VerySecure => "very_secure",
    Secure => "secure",
    Moderate => "moderate",
    Elevated => "elevated",
    HighRisk => "high_risk",
    Critical => "critical",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecurityThreat {
    pub id: i64,
    pub country_id: i64,
    pub threat_type: String,
    pub severity: Severity,
    pub likelihood: f64,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl SecurityThreat {
    /// Severity-weighted likelihood, in `[0, 4]`.
    pub fn score(&self) -> f64 {
        self.severity.weight() * self.likelihood.clamp(0.0, 100.0) / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SecurityEventType {
    Riot,
    CrimeWave,
    EthnicClash,
    PoliticalUnrest,
}

string_enum!(SecurityEventType {
    Riot => "riot",
    CrimeWave => "crime_wave",
    EthnicClash => "ethnic_clash",
    PoliticalUnrest => "political_unrest",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EventStatus {
    Active,
    Resolved,
}

string_enum!(EventStatus {
    Active => "active",
    Resolved => "resolved",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecurityEvent {
    pub id: i64,
    pub country_id: i64,
    pub event_type: SecurityEventType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub casualties: i64,
    pub economic_impact: i64,
    pub status: EventStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MilitaryBranch {
    pub id: i64,
    pub country_id: i64,
    pub name: String,
    pub readiness: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threat(severity: Severity, likelihood: f64) -> SecurityThreat {
        SecurityThreat {
            id: 1,
            country_id: 1,
            threat_type: "insurgency".to_string(),
            severity,
            likelihood,
            description: String::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn threat_score_weights_severity() {
        assert_eq!(threat(Severity::Low, 50.0).score(), 0.5);
        assert_eq!(threat(Severity::Critical, 50.0).score(), 2.0);
        assert_eq!(threat(Severity::High, 250.0).score(), 3.0);
    }

    #[test]
    fn severity_orders_by_gravity() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Low < Severity::Medium);
    }
}
