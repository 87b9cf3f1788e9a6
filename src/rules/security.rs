//! Security scoring and procedural security-event generation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::{Country, SecurityEventType, SecurityLevel, Severity};

// --- Overall score weights ---
const STABILITY_WEIGHT: f64 = 0.3;
const BORDER_WEIGHT: f64 = 0.3;
const READINESS_WEIGHT: f64 = 0.4;

// --- Risk terms ---
const RIOT_INSTABILITY_WEIGHT: f64 = 0.4;
const RIOT_UNEMPLOYMENT_WEIGHT: f64 = 0.3;
const CRIME_BORDER_WEIGHT: f64 = 0.3;
const CRIME_POVERTY_WEIGHT: f64 = 0.4;
const ETHNIC_DIVERSITY_WEIGHT: f64 = 0.5;
const ETHNIC_INSTABILITY_WEIGHT: f64 = 0.2;
const POLARIZATION_WEIGHT: f64 = 0.6;
const POLARIZATION_INSTABILITY_WEIGHT: f64 = 0.1;
const RISK_JITTER_MIN: f64 = 0.8;
const RISK_JITTER_MAX: f64 = 1.2;
const MAGNITUDE_JITTER_MIN: f64 = 0.5;
const MAGNITUDE_JITTER_MAX: f64 = 1.5;

// --- Derived pressures ---
const PROSPERITY_GDP: f64 = 50_000.0;
const GDP_PER_POVERTY_POINT: f64 = 500.0;
const UNEMPLOYMENT_FROM_POVERTY: f64 = 0.6;
const DEFAULT_DIVERSITY: f64 = 40.0;
const POLARIZATION_FROM_INSTABILITY: f64 = 0.8;

/// `0.3 * stability + 0.3 * border + 0.4 * mean readiness`. No branches counts
/// as zero readiness.
pub fn overall_score(internal_stability: f64, border_security: f64, readiness: &[f64]) -> f64 {
    STABILITY_WEIGHT * internal_stability
        + BORDER_WEIGHT * border_security
        + READINESS_WEIGHT * average_readiness(readiness)
}

pub fn average_readiness(readiness: &[f64]) -> f64 {
    if readiness.is_empty() {
        0.0
    } else {
        readiness.iter().sum::<f64>() / readiness.len() as f64
    }
}

pub fn security_level(score: f64) -> SecurityLevel {
    if score >= 80.0 {
        SecurityLevel::VerySecure
    } else if score >= 65.0 {
        SecurityLevel::Secure
    } else if score >= 50.0 {
        SecurityLevel::Moderate
    } else if score >= 35.0 {
        SecurityLevel::Elevated
    } else if score >= 25.0 {
        SecurityLevel::HighRisk
    } else {
        SecurityLevel::Critical
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SecurityScore {
    pub internal_stability: f64,
    pub border_security: f64,
    pub military_readiness: f64,
    pub overall_score: f64,
    pub level: SecurityLevel,
}

pub fn score_country(country: &Country, readiness: &[f64]) -> SecurityScore {
    let overall = overall_score(country.internal_stability, country.border_security, readiness);
    SecurityScore {
        internal_stability: country.internal_stability,
        border_security: country.border_security,
        military_readiness: average_readiness(readiness),
        overall_score: overall,
        level: security_level(overall),
    }
}

/// Social pressures that feed the event generator, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub stability: f64,
    pub border_security: f64,
    pub unemployment: f64,
    pub poverty: f64,
    pub diversity: f64,
    pub polarization: f64,
}

impl RiskFactors {
    /// Pressures derived from a country's stats. Poverty falls as GDP per capita
    /// approaches 50k; polarization grows with instability.
    pub fn from_country(country: &Country) -> Self {
        let stability = country.internal_stability.clamp(0.0, 100.0);
        let poverty =
            ((PROSPERITY_GDP - country.gdp_per_capita) / GDP_PER_POVERTY_POINT).clamp(0.0, 100.0);
        Self {
            stability,
            border_security: country.border_security.clamp(0.0, 100.0),
            unemployment: poverty * UNEMPLOYMENT_FROM_POVERTY,
            poverty,
            diversity: DEFAULT_DIVERSITY,
            polarization: (100.0 - stability) * POLARIZATION_FROM_INSTABILITY,
        }
    }

    /// Unweighted risk terms, before jitter.
    pub fn risks(&self) -> [(SecurityEventType, f64); 4] {
        let instability = 100.0 - self.stability;
        [
            (
                SecurityEventType::Riot,
                instability * RIOT_INSTABILITY_WEIGHT + self.unemployment * RIOT_UNEMPLOYMENT_WEIGHT,
            ),
            (
                SecurityEventType::CrimeWave,
                (100.0 - self.border_security) * CRIME_BORDER_WEIGHT
                    + self.poverty * CRIME_POVERTY_WEIGHT,
            ),
            (
                SecurityEventType::EthnicClash,
                self.diversity * ETHNIC_DIVERSITY_WEIGHT + instability * ETHNIC_INSTABILITY_WEIGHT,
            ),
            (
                SecurityEventType::PoliticalUnrest,
                self.polarization * POLARIZATION_WEIGHT
                    + instability * POLARIZATION_INSTABILITY_WEIGHT,
            ),
        ]
    }
}

pub fn severity_for_risk(risk: f64) -> Severity {
    if risk >= 60.0 {
        Severity::Critical
    } else if risk >= 40.0 {
        Severity::High
    } else if risk >= 20.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn casualty_base(severity: Severity) -> f64 {
    match severity {
        Severity::Low => 0.0,
        Severity::Medium => 5.0,
        Severity::High => 25.0,
        Severity::Critical => 100.0,
    }
}

fn economic_base(severity: Severity) -> f64 {
    match severity {
        Severity::Low => 10_000.0,
        Severity::Medium => 100_000.0,
        Severity::High => 1_000_000.0,
        Severity::Critical => 10_000_000.0,
    }
}

fn event_title(event_type: SecurityEventType, severity: Severity) -> &'static str {
    match (event_type, severity) {
        (SecurityEventType::Riot, Severity::Critical | Severity::High) => "Violent riots erupt",
        (SecurityEventType::Riot, _) => "Street protests turn unruly",
        (SecurityEventType::CrimeWave, Severity::Critical | Severity::High) => {
            "Organized crime surge"
        }
        (SecurityEventType::CrimeWave, _) => "Rise in petty crime",
        (SecurityEventType::EthnicClash, Severity::Critical | Severity::High) => {
            "Deadly ethnic clashes"
        }
        (SecurityEventType::EthnicClash, _) => "Communal tensions flare",
        (SecurityEventType::PoliticalUnrest, Severity::Critical | Severity::High) => {
            "Political crisis paralyzes government"
        }
        (SecurityEventType::PoliticalUnrest, _) => "Partisan demonstrations",
    }
}

/// One procedurally generated security incident, ready to insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedEvent {
    pub event_type: SecurityEventType,
    pub severity: Severity,
    pub risk: f64,
    pub title: String,
    pub description: String,
    pub casualties: i64,
    pub economic_impact: i64,
}

/// Jitter every risk term, keep the largest, and size the incident from its
/// severity tier.
pub fn generate_event(country_name: &str, factors: &RiskFactors, rng: &mut impl Rng) -> GeneratedEvent {
    let (event_type, risk) = factors
        .risks()
        .into_iter()
        .map(|(kind, risk)| (kind, risk * rng.random_range(RISK_JITTER_MIN..RISK_JITTER_MAX)))
        .fold((SecurityEventType::Riot, f64::MIN), |best, candidate| {
            if candidate.1 > best.1 { candidate } else { best }
        });

    let severity = severity_for_risk(risk);
    let casualties = (casualty_base(severity)
        * rng.random_range(MAGNITUDE_JITTER_MIN..MAGNITUDE_JITTER_MAX))
    .round() as i64;
    let economic_impact = (economic_base(severity)
        * rng.random_range(MAGNITUDE_JITTER_MIN..MAGNITUDE_JITTER_MAX))
    .round() as i64;

    let title = format!("{} in {country_name}", event_title(event_type, severity));
    let description = format!(
        "A {severity} {} in {country_name} (risk {risk:.1}) left {casualties} casualties \
         and an estimated economic impact of {economic_impact}.",
        event_type.as_str().replace('_', " "),
    );

    GeneratedEvent {
        event_type,
        severity,
        risk,
        title,
        description,
        casualties,
        economic_impact,
    }
}
