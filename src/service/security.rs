use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::diplomacy::CountryQuery;
use super::{Context, load_country};
use crate::access::{Actor, Capability};
use crate::db;
use crate::error::{ServiceError, ensure};
use crate::model::{
    EventStatus, MilitaryBranch, Notification, Priority, SecurityEvent, SecurityThreat, Severity,
};
use crate::rules::security::{self, RiskFactors, SecurityScore};

const MAX_THREAT_TYPE_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 2000;
const MAX_BRANCH_NAME_CHARS: usize = 100;

fn check_percent(name: &str, value: f64) -> Result<(), ServiceError> {
    ensure((0.0..=100.0).contains(&value), || {
        format!("{name} must be within 0..=100")
    })
}

fn check_text(name: &str, value: &str, max: usize) -> Result<(), ServiceError> {
    let len = value.trim().chars().count();
    ensure((1..=max).contains(&len), || {
        format!("{name} must be 1 to {max} characters")
    })
}

// --- Assessment ---

#[derive(Debug, Clone, Serialize)]
pub struct SecurityAssessment {
    pub country_id: i64,
    pub score: SecurityScore,
    pub branches: Vec<MilitaryBranch>,
    pub active_threats: usize,
}

pub async fn get_security_assessment(
    ctx: &Context,
    input: CountryQuery,
) -> Result<SecurityAssessment, ServiceError> {
    let country = load_country(&ctx.pool, input.country_id).await?;
    let branches = db::security::list_branches(&ctx.pool, country.id).await?;
    let readiness: Vec<f64> = branches.iter().map(|b| b.readiness).collect();
    let active_threats = db::security::active_threats(&ctx.pool, country.id).await?.len();
    Ok(SecurityAssessment {
        country_id: country.id,
        score: security::score_country(&country, &readiness),
        branches,
        active_threats,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStability {
    pub country_id: i64,
    pub internal_stability: Option<f64>,
    pub border_security: Option<f64>,
}

/// Admin-only: overwrite the country stats the score reads.
pub async fn update_stability(
    ctx: &Context,
    actor: &Actor,
    input: UpdateStability,
) -> Result<SecurityScore, ServiceError> {
    actor.require(Capability::Admin)?;
    if let Some(value) = input.internal_stability {
        check_percent("internal_stability", value)?;
    }
    if let Some(value) = input.border_security {
        check_percent("border_security", value)?;
    }
    let updated = db::security::set_country_stats(
        &ctx.pool,
        input.country_id,
        input.internal_stability,
        input.border_security,
    )
    .await?;
    if !updated {
        return Err(ServiceError::not_found("country", input.country_id));
    }
    let country = load_country(&ctx.pool, input.country_id).await?;
    let readiness = db::security::readiness_levels(&ctx.pool, country.id).await?;
    Ok(security::score_country(&country, &readiness))
}

// --- Threats ---

pub async fn list_threats(
    ctx: &Context,
    input: CountryQuery,
) -> Result<Vec<SecurityThreat>, ServiceError> {
    load_country(&ctx.pool, input.country_id).await?;
    Ok(db::security::active_threats(&ctx.pool, input.country_id).await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateThreat {
    pub country_id: i64,
    pub threat_type: String,
    pub severity: Severity,
    pub likelihood: f64,
    pub description: String,
}

impl CreateThreat {
    fn validate(&self) -> Result<(), ServiceError> {
        check_text("threat_type", &self.threat_type, MAX_THREAT_TYPE_CHARS)?;
        check_text("description", &self.description, MAX_DESCRIPTION_CHARS)?;
        check_percent("likelihood", self.likelihood)
    }
}

pub async fn create_threat(
    ctx: &Context,
    actor: &Actor,
    input: CreateThreat,
) -> Result<SecurityThreat, ServiceError> {
    actor.require(Capability::Admin)?;
    input.validate()?;
    load_country(&ctx.pool, input.country_id).await?;
    let threat = db::security::insert_threat(
        &ctx.pool,
        input.country_id,
        input.threat_type.trim(),
        input.severity,
        input.likelihood,
        input.description.trim(),
    )
    .await?;
    info!(threat_id = threat.id, country_id = threat.country_id, severity = %threat.severity, "threat recorded");
    Ok(threat)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreatQuery {
    pub threat_id: i64,
}

pub async fn resolve_threat(
    ctx: &Context,
    actor: &Actor,
    input: ThreatQuery,
) -> Result<SecurityThreat, ServiceError> {
    actor.require(Capability::Admin)?;
    let threat = db::security::get_threat(&ctx.pool, input.threat_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("threat", input.threat_id))?;
    if !threat.is_active {
        return Err(ServiceError::bad_request("threat is already resolved"));
    }
    db::security::deactivate_threat(&ctx.pool, threat.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("threat", input.threat_id))
}

// --- Events ---

#[derive(Debug, Clone, Deserialize)]
pub struct ListEvents {
    pub country_id: i64,
    #[serde(default = "active_only_default")]
    pub active_only: bool,
}

fn active_only_default() -> bool {
    true
}

pub async fn list_events(
    ctx: &Context,
    input: ListEvents,
) -> Result<Vec<SecurityEvent>, ServiceError> {
    load_country(&ctx.pool, input.country_id).await?;
    Ok(db::security::list_events(&ctx.pool, input.country_id, input.active_only).await?)
}

/// Optional replacements for the pressures derived from country stats.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RiskOverrides {
    pub unemployment: Option<f64>,
    pub poverty: Option<f64>,
    pub diversity: Option<f64>,
    pub polarization: Option<f64>,
}

impl RiskOverrides {
    fn validate(&self) -> Result<(), ServiceError> {
        for (name, value) in [
            ("unemployment", self.unemployment),
            ("poverty", self.poverty),
            ("diversity", self.diversity),
            ("polarization", self.polarization),
        ] {
            if let Some(value) = value {
                check_percent(name, value)?;
            }
        }
        Ok(())
    }

    fn apply(&self, mut factors: RiskFactors) -> RiskFactors {
        factors.unemployment = self.unemployment.unwrap_or(factors.unemployment);
        factors.poverty = self.poverty.unwrap_or(factors.poverty);
        factors.diversity = self.diversity.unwrap_or(factors.diversity);
        factors.polarization = self.polarization.unwrap_or(factors.polarization);
        factors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateEvent {
    pub country_id: i64,
    #[serde(default)]
    pub overrides: RiskOverrides,
}

/// Roll one security incident for a country and store it. Critical incidents
/// notify the country.
pub async fn generate_event(
    ctx: &Context,
    actor: &Actor,
    input: GenerateEvent,
) -> Result<SecurityEvent, ServiceError> {
    actor.require(Capability::CountryOwner(input.country_id))?;
    input.overrides.validate()?;
    let country = load_country(&ctx.pool, input.country_id).await?;

    let factors = input.overrides.apply(RiskFactors::from_country(&country));
    let generated = ctx.with_rng(|rng| security::generate_event(&country.name, &factors, rng));
    let event = db::security::insert_event(&ctx.pool, country.id, &generated).await?;

    info!(
        event_id = event.id,
        country_id = country.id,
        event_type = %event.event_type,
        severity = %event.severity,
        risk = generated.risk,
        "security event generated"
    );
    if event.severity == Severity::Critical {
        let queued = ctx.notify(Notification::to_country(
            country.id,
            "security",
            Priority::Critical,
            event.title.clone(),
            event.description.clone(),
        ));
        if !queued {
            warn!(event_id = event.id, "critical event notice dropped");
        }
    }
    Ok(event)
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventQuery {
    pub event_id: i64,
}

pub async fn resolve_event(
    ctx: &Context,
    actor: &Actor,
    input: EventQuery,
) -> Result<SecurityEvent, ServiceError> {
    let event = db::security::get_event(&ctx.pool, input.event_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("security event", input.event_id))?;
    actor.require(Capability::CountryOwner(event.country_id))?;
    if event.status == EventStatus::Resolved {
        return Err(ServiceError::bad_request("security event is already resolved"));
    }
    let event = db::security::resolve_event(&ctx.pool, event.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("security event", input.event_id))?;
    info!(event_id = event.id, "security event resolved");
    Ok(event)
}

// --- Military ---

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBranch {
    pub country_id: i64,
    pub name: String,
    pub readiness: f64,
}

pub async fn create_military_branch(
    ctx: &Context,
    actor: &Actor,
    input: CreateBranch,
) -> Result<MilitaryBranch, ServiceError> {
    actor.require(Capability::CountryOwner(input.country_id))?;
    check_text("name", &input.name, MAX_BRANCH_NAME_CHARS)?;
    check_percent("readiness", input.readiness)?;
    load_country(&ctx.pool, input.country_id).await?;
    Ok(db::security::insert_branch(&ctx.pool, input.country_id, input.name.trim(), input.readiness).await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateReadiness {
    pub branch_id: i64,
    pub readiness: f64,
}

pub async fn update_military_readiness(
    ctx: &Context,
    actor: &Actor,
    input: UpdateReadiness,
) -> Result<MilitaryBranch, ServiceError> {
    check_percent("readiness", input.readiness)?;
    let branch = db::security::get_branch(&ctx.pool, input.branch_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("military branch", input.branch_id))?;
    actor.require(Capability::CountryOwner(branch.country_id))?;
    let branch = db::security::set_readiness(&ctx.pool, branch.id, input.readiness)
        .await?
        .ok_or_else(|| ServiceError::not_found("military branch", input.branch_id))?;
    info!(branch_id = branch.id, readiness = branch.readiness, "readiness updated");
    Ok(branch)
}
