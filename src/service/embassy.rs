use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Context, actor_name, load_country, unique_violation};
use crate::access::{Actor, Capability};
use crate::audit::AuditEntry;
use crate::db;
use crate::db::embassy::NewEmbassy;
use crate::error::{ServiceError, ensure};
use crate::model::{
    Embassy, EmbassyStatus, EmbassyTier, EmbassyUpgrade, Notification, Priority, Specialization,
    UpgradeType,
};
use crate::rules::diplomacy::{self, DEFAULT_STRENGTH, EstablishmentQuote};
use crate::rules::upgrade;

const MAX_NAME_CHARS: usize = 100;
const MAX_ALLOCATION: i64 = 1_000_000_000;

pub(crate) async fn load_embassy<'e>(
    exec: impl sqlx::PgExecutor<'e>,
    embassy_id: i64,
) -> Result<Embassy, ServiceError> {
    db::embassy::get_embassy(exec, embassy_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("embassy", embassy_id))
}

pub(crate) async fn lock_embassy<'e>(
    exec: impl sqlx::PgExecutor<'e>,
    embassy_id: i64,
) -> Result<Embassy, ServiceError> {
    db::embassy::lock_embassy(exec, embassy_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("embassy", embassy_id))
}

// --- Establishment ---

#[derive(Debug, Clone, Deserialize)]
pub struct EstablishEmbassy {
    /// Country the embassy is located in.
    pub host_country_id: i64,
    /// Country that operates the embassy.
    pub guest_country_id: i64,
    pub name: String,
    #[serde(default)]
    pub tier: Option<EmbassyTier>,
}

impl EstablishEmbassy {
    fn validate(&self) -> Result<(), ServiceError> {
        ensure(self.host_country_id != self.guest_country_id, || {
            "a country cannot open an embassy in itself".to_string()
        })?;
        let len = self.name.trim().chars().count();
        ensure((1..=MAX_NAME_CHARS).contains(&len), || {
            format!("name must be 1 to {MAX_NAME_CHARS} characters")
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbassyEstablished {
    pub embassy: Embassy,
    pub quote: EstablishmentQuote,
}

/// Open an embassy on behalf of the guest country. Cost and approval time
/// follow the current relation between the pair.
pub async fn establish_embassy(
    ctx: &Context,
    actor: &Actor,
    input: EstablishEmbassy,
) -> Result<EmbassyEstablished, ServiceError> {
    input.validate()?;
    actor.require(Capability::CountryOwner(input.guest_country_id))?;
    load_country(&ctx.pool, input.host_country_id).await?;
    load_country(&ctx.pool, input.guest_country_id).await?;

    if db::embassy::find_pair(&ctx.pool, input.host_country_id, input.guest_country_id)
        .await?
        .is_some()
    {
        return Err(ServiceError::bad_request(
            "an embassy already exists for this country pair",
        ));
    }

    let strength =
        db::relation::find_between(&ctx.pool, input.host_country_id, input.guest_country_id)
            .await?
            .map_or(DEFAULT_STRENGTH, |r| r.strength);
    let tier = input.tier.unwrap_or(EmbassyTier::Embassy);
    let quote = diplomacy::quote_establishment(strength, tier);

    let embassy = db::embassy::insert_embassy(
        &ctx.pool,
        &NewEmbassy {
            host_country_id: input.host_country_id,
            guest_country_id: input.guest_country_id,
            name: input.name.trim(),
            tier,
            status: quote.initial_status(),
            establishment_cost: quote.total_cost,
            approval_days: quote.approval_days,
        },
    )
    .await
    .map_err(|err| unique_violation(err, "an embassy already exists for this country pair"))?;

    info!(
        embassy_id = embassy.id,
        host = embassy.host_country_id,
        guest = embassy.guest_country_id,
        cost = quote.total_cost,
        approval_days = quote.approval_days,
        "embassy established"
    );
    ctx.notify(Notification::to_country(
        embassy.host_country_id,
        "embassy",
        Priority::Medium,
        format!("Country {} opened {}", embassy.guest_country_id, embassy.name),
        format!(
            "A new {} is {} with approval expected in {} days.",
            embassy.tier.as_str().replace('_', " "),
            embassy.status,
            quote.approval_days
        ),
    ));
    Ok(EmbassyEstablished { embassy, quote })
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbassyQuery {
    pub embassy_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbassyDetails {
    pub embassy: Embassy,
    pub upgrades: Vec<EmbassyUpgrade>,
}

pub async fn get_embassy(ctx: &Context, input: EmbassyQuery) -> Result<EmbassyDetails, ServiceError> {
    let embassy = load_embassy(&ctx.pool, input.embassy_id).await?;
    let upgrades = db::embassy::list_upgrades(&ctx.pool, embassy.id).await?;
    Ok(EmbassyDetails { embassy, upgrades })
}

pub async fn list_embassies(
    ctx: &Context,
    input: super::diplomacy::CountryQuery,
) -> Result<Vec<Embassy>, ServiceError> {
    load_country(&ctx.pool, input.country_id).await?;
    Ok(db::embassy::list_for_country(&ctx.pool, input.country_id).await?)
}

// --- Budget and status ---

#[derive(Debug, Clone, Deserialize)]
pub struct AllocateBudget {
    pub embassy_id: i64,
    pub amount: i64,
}

pub async fn allocate_budget(
    ctx: &Context,
    actor: &Actor,
    input: AllocateBudget,
) -> Result<Embassy, ServiceError> {
    ensure((1..=MAX_ALLOCATION).contains(&input.amount), || {
        format!("amount must be within 1..={MAX_ALLOCATION}")
    })?;
    let embassy = load_embassy(&ctx.pool, input.embassy_id).await?;
    actor.require(Capability::CountryOwner(embassy.guest_country_id))?;

    let embassy = db::embassy::add_budget(&ctx.pool, embassy.id, input.amount)
        .await?
        .ok_or_else(|| ServiceError::not_found("embassy", input.embassy_id))?;
    info!(embassy_id = embassy.id, amount = input.amount, budget = embassy.budget, "budget allocated");
    ctx.record(
        AuditEntry::new(actor_name(actor), "allocate_budget", format!("embassy:{}", embassy.id))
            .with_details(serde_json::json!({ "amount": input.amount, "budget": embassy.budget })),
    )
    .await;
    Ok(embassy)
}

/// Approve a pending embassy. Host owner or admin.
pub async fn activate_embassy(
    ctx: &Context,
    actor: &Actor,
    input: EmbassyQuery,
) -> Result<Embassy, ServiceError> {
    let mut tx = ctx.pool.begin().await?;
    let embassy = lock_embassy(&mut *tx, input.embassy_id).await?;
    actor.require(Capability::CountryOwner(embassy.host_country_id))?;
    if embassy.status != EmbassyStatus::Pending {
        return Err(ServiceError::bad_request(format!(
            "embassy is {}, only pending embassies can be activated",
            embassy.status
        )));
    }
    let embassy = db::embassy::set_status(&mut *tx, embassy.id, EmbassyStatus::Active).await?;
    tx.commit().await?;

    info!(embassy_id = embassy.id, "embassy activated");
    ctx.notify(Notification::to_country(
        embassy.guest_country_id,
        "embassy",
        Priority::Medium,
        format!("{} is now active", embassy.name),
        format!("Country {} approved the embassy.", embassy.host_country_id),
    ));
    Ok(embassy)
}

// --- Upgrades ---

#[derive(Debug, Clone, Deserialize)]
pub struct UpgradeEmbassy {
    pub embassy_id: i64,
    pub upgrade_type: UpgradeType,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpgradeApplied {
    pub embassy: Embassy,
    pub upgrade: EmbassyUpgrade,
}

/// Buy the next level of an upgrade out of the embassy budget.
pub async fn upgrade_embassy(
    ctx: &Context,
    actor: &Actor,
    input: UpgradeEmbassy,
) -> Result<UpgradeApplied, ServiceError> {
    let mut tx = ctx.pool.begin().await?;
    let embassy = lock_embassy(&mut *tx, input.embassy_id).await?;
    actor.require(Capability::CountryOwner(embassy.guest_country_id))?;
    if embassy.status != EmbassyStatus::Active {
        return Err(ServiceError::bad_request("embassy is not active"));
    }

    let current_level = db::embassy::upgrade_level(&mut *tx, embassy.id, input.upgrade_type).await?;
    let outcome = upgrade::plan_upgrade(&embassy, input.upgrade_type, current_level)?;
    let embassy = db::embassy::apply_upgrade_outcome(&mut *tx, embassy.id, &outcome).await?;
    let upgrade = db::embassy::insert_upgrade(
        &mut *tx,
        embassy.id,
        input.upgrade_type,
        outcome.new_level,
        outcome.cost,
    )
    .await?;
    tx.commit().await?;

    info!(
        embassy_id = embassy.id,
        upgrade = %input.upgrade_type,
        level = outcome.new_level,
        cost = outcome.cost,
        "embassy upgraded"
    );
    Ok(UpgradeApplied { embassy, upgrade })
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetSpecialization {
    pub embassy_id: i64,
    pub specialization: Specialization,
}

pub async fn set_specialization(
    ctx: &Context,
    actor: &Actor,
    input: SetSpecialization,
) -> Result<Embassy, ServiceError> {
    let embassy = load_embassy(&ctx.pool, input.embassy_id).await?;
    actor.require(Capability::CountryOwner(embassy.guest_country_id))?;
    let embassy = db::embassy::set_specialization(&ctx.pool, embassy.id, input.specialization)
        .await?
        .ok_or_else(|| ServiceError::not_found("embassy", input.embassy_id))?;
    info!(embassy_id = embassy.id, specialization = %input.specialization, "specialization set");
    Ok(embassy)
}
