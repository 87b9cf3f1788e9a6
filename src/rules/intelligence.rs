use serde::Serialize;

use super::security::SecurityScore;
use crate::model::{
    DiplomaticRelation, RelationshipCategory, SecurityEvent, SecurityLevel, SecurityThreat,
    Severity,
};

const TOP_THREATS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BriefingPriority {
    Routine,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Briefing {
    pub country_id: i64,
    pub priority: BriefingPriority,
    pub security: SecurityScore,
    pub top_threats: Vec<SecurityThreat>,
    pub active_events: Vec<SecurityEvent>,
    pub tensions: Vec<DiplomaticRelation>,
    pub strongest_alliance: Option<DiplomaticRelation>,
    pub summary: String,
}

fn priority(
    security: &SecurityScore,
    threats: &[SecurityThreat],
    tensions: &[DiplomaticRelation],
) -> BriefingPriority {
    if security.level == SecurityLevel::Critical
        || threats.iter().any(|t| t.severity == Severity::Critical)
    {
        BriefingPriority::Critical
    } else if matches!(security.level, SecurityLevel::HighRisk | SecurityLevel::Elevated)
        || !tensions.is_empty()
    {
        BriefingPriority::High
    } else {
        BriefingPriority::Routine
    }
}

/// Assemble an intelligence briefing from a country's current records.
/// Inactive threats and events are ignored.
pub fn build_briefing(
    country_id: i64,
    security: SecurityScore,
    threats: Vec<SecurityThreat>,
    events: Vec<SecurityEvent>,
    relations: Vec<DiplomaticRelation>,
) -> Briefing {
    let mut top_threats: Vec<SecurityThreat> = threats.into_iter().filter(|t| t.is_active).collect();
    top_threats.sort_by(|a, b| b.score().total_cmp(&a.score()).then(a.id.cmp(&b.id)));
    top_threats.truncate(TOP_THREATS);

    let active_events: Vec<SecurityEvent> = events.into_iter().filter(|e| e.is_active).collect();

    let strongest_alliance = relations
        .iter()
        .filter(|r| r.relationship == RelationshipCategory::Alliance)
        .max_by(|a, b| a.strength.total_cmp(&b.strength))
        .cloned();
    let tensions: Vec<DiplomaticRelation> = relations
        .into_iter()
        .filter(|r| r.relationship == RelationshipCategory::Tension)
        .collect();

    let priority = priority(&security, &top_threats, &tensions);
    let summary = format!(
        "Security {} ({:.1}); {} active threat(s), {} active incident(s), {} tense relation(s).",
        security.level,
        security.overall_score,
        top_threats.len(),
        active_events.len(),
        tensions.len()
    );

    Briefing {
        country_id,
        priority,
        security,
        top_threats,
        active_events,
        tensions,
        strongest_alliance,
        summary,
    }
}
