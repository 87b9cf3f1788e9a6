use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Row};

use super::{enum_col, opt_enum_col};
use crate::model::{
    Embassy, EmbassyMission, EmbassyStatus, EmbassyTier, EmbassyUpgrade, MissionDifficulty,
    MissionStatus, MissionType, Specialization, UpgradeType,
};
use crate::rules::mission::MissionRewards;
use crate::rules::upgrade::UpgradeOutcome;

const EMBASSY_COLUMNS: &str = "id, host_country_id, guest_country_id, name, tier, status, level, \
                               experience, influence, reputation, budget, effectiveness, \
                               staff_count, specialization, specialization_level, \
                               establishment_cost, approval_days, established_at";

const MISSION_COLUMNS: &str = "id, embassy_id, mission_type, difficulty, staff_assigned, \
                               success_chance, status, reward_experience, reward_influence, \
                               reward_reputation, reward_budget, cost, duration_days, \
                               started_at, completes_at, resolved_at";

const UPGRADE_COLUMNS: &str = "id, embassy_id, upgrade_type, level, cost, applied_at";

fn embassy_from_row(row: &PgRow) -> Result<Embassy, sqlx::Error> {
    Ok(Embassy {
        id: row.try_get("id")?,
        host_country_id: row.try_get("host_country_id")?,
        guest_country_id: row.try_get("guest_country_id")?,
        name: row.try_get("name")?,
        tier: enum_col(row, "tier")?,
        status: enum_col(row, "status")?,
        level: row.try_get("level")?,
        experience: row.try_get("experience")?,
        influence: row.try_get("influence")?,
        reputation: row.try_get("reputation")?,
        budget: row.try_get("budget")?,
        effectiveness: row.try_get("effectiveness")?,
        staff_count: row.try_get("staff_count")?,
        specialization: opt_enum_col(row, "specialization")?,
        specialization_level: row.try_get("specialization_level")?,
        establishment_cost: row.try_get("establishment_cost")?,
        approval_days: row.try_get("approval_days")?,
        established_at: row.try_get("established_at")?,
    })
}

fn mission_from_row(row: &PgRow) -> Result<EmbassyMission, sqlx::Error> {
    Ok(EmbassyMission {
        id: row.try_get("id")?,
        embassy_id: row.try_get("embassy_id")?,
        mission_type: enum_col(row, "mission_type")?,
        difficulty: enum_col(row, "difficulty")?,
        staff_assigned: row.try_get("staff_assigned")?,
        success_chance: row.try_get("success_chance")?,
        status: enum_col(row, "status")?,
        reward_experience: row.try_get("reward_experience")?,
        reward_influence: row.try_get("reward_influence")?,
        reward_reputation: row.try_get("reward_reputation")?,
        reward_budget: row.try_get("reward_budget")?,
        cost: row.try_get("cost")?,
        duration_days: row.try_get("duration_days")?,
        started_at: row.try_get("started_at")?,
        completes_at: row.try_get("completes_at")?,
        resolved_at: row.try_get("resolved_at")?,
    })
}

fn upgrade_from_row(row: &PgRow) -> Result<EmbassyUpgrade, sqlx::Error> {
    Ok(EmbassyUpgrade {
        id: row.try_get("id")?,
        embassy_id: row.try_get("embassy_id")?,
        upgrade_type: enum_col(row, "upgrade_type")?,
        level: row.try_get("level")?,
        cost: row.try_get("cost")?,
        applied_at: row.try_get("applied_at")?,
    })
}

// --- Embassies ---

pub async fn get_embassy<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
) -> Result<Option<Embassy>, sqlx::Error> {
    sqlx::query(&format!("SELECT {EMBASSY_COLUMNS} FROM embassies WHERE id = $1"))
        .bind(id)
        .fetch_optional(exec)
        .await?
        .map(|row| embassy_from_row(&row))
        .transpose()
}

pub async fn lock_embassy<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
) -> Result<Option<Embassy>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {EMBASSY_COLUMNS} FROM embassies WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await?
    .map(|row| embassy_from_row(&row))
    .transpose()
}

pub async fn find_pair<'e>(
    exec: impl PgExecutor<'e>,
    host_country_id: i64,
    guest_country_id: i64,
) -> Result<Option<Embassy>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {EMBASSY_COLUMNS} FROM embassies \
         WHERE host_country_id = $1 AND guest_country_id = $2"
    ))
    .bind(host_country_id)
    .bind(guest_country_id)
    .fetch_optional(exec)
    .await?
    .map(|row| embassy_from_row(&row))
    .transpose()
}

/// Embassies a country hosts or operates abroad.
pub async fn list_for_country<'e>(
    exec: impl PgExecutor<'e>,
    country_id: i64,
) -> Result<Vec<Embassy>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {EMBASSY_COLUMNS} FROM embassies \
         WHERE host_country_id = $1 OR guest_country_id = $1 ORDER BY id"
    ))
    .bind(country_id)
    .fetch_all(exec)
    .await?
    .iter()
    .map(embassy_from_row)
    .collect()
}

pub struct NewEmbassy<'a> {
    pub host_country_id: i64,
    pub guest_country_id: i64,
    pub name: &'a str,
    pub tier: EmbassyTier,
    pub status: EmbassyStatus,
    pub establishment_cost: i64,
    pub approval_days: i32,
}

pub async fn insert_embassy<'e>(
    exec: impl PgExecutor<'e>,
    new: &NewEmbassy<'_>,
) -> Result<Embassy, sqlx::Error> {
    let row = sqlx::query(&format!(
        "INSERT INTO embassies (host_country_id, guest_country_id, name, tier, status, \
                                establishment_cost, approval_days) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {EMBASSY_COLUMNS}"
    ))
    .bind(new.host_country_id)
    .bind(new.guest_country_id)
    .bind(new.name)
    .bind(new.tier.as_str())
    .bind(new.status.as_str())
    .bind(new.establishment_cost)
    .bind(new.approval_days)
    .fetch_one(exec)
    .await?;
    embassy_from_row(&row)
}

pub async fn set_status<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
    status: EmbassyStatus,
) -> Result<Embassy, sqlx::Error> {
    let row = sqlx::query(&format!(
        "UPDATE embassies SET status = $2 WHERE id = $1 RETURNING {EMBASSY_COLUMNS}"
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_one(exec)
    .await?;
    embassy_from_row(&row)
}

pub async fn add_budget<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
    amount: i64,
) -> Result<Option<Embassy>, sqlx::Error> {
    sqlx::query(&format!(
        "UPDATE embassies SET budget = budget + $2 WHERE id = $1 RETURNING {EMBASSY_COLUMNS}"
    ))
    .bind(id)
    .bind(amount)
    .fetch_optional(exec)
    .await?
    .map(|row| embassy_from_row(&row))
    .transpose()
}

/// Atomically take `amount` from the budget. `None` when the embassy does not
/// exist or cannot afford it.
pub async fn deduct_budget<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
    amount: i64,
) -> Result<Option<Embassy>, sqlx::Error> {
    sqlx::query(&format!(
        "UPDATE embassies SET budget = budget - $2 \
         WHERE id = $1 AND budget >= $2 RETURNING {EMBASSY_COLUMNS}"
    ))
    .bind(id)
    .bind(amount)
    .fetch_optional(exec)
    .await?
    .map(|row| embassy_from_row(&row))
    .transpose()
}

/// Add mission rewards with in-place increments. Influence and reputation
/// saturate at 100.
pub async fn apply_rewards<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
    rewards: &MissionRewards,
) -> Result<Embassy, sqlx::Error> {
    let row = sqlx::query(&format!(
        "UPDATE embassies SET \
             experience = experience + $2, \
             influence = LEAST(influence + $3, 100), \
             reputation = LEAST(reputation + $4, 100), \
             budget = budget + $5 \
         WHERE id = $1 RETURNING {EMBASSY_COLUMNS}"
    ))
    .bind(id)
    .bind(rewards.experience)
    .bind(rewards.influence)
    .bind(rewards.reputation)
    .bind(rewards.budget)
    .fetch_one(exec)
    .await?;
    embassy_from_row(&row)
}

pub async fn set_level<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
    level: i32,
    experience: i64,
) -> Result<Embassy, sqlx::Error> {
    let row = sqlx::query(&format!(
        "UPDATE embassies SET level = $2, experience = $3 WHERE id = $1 RETURNING {EMBASSY_COLUMNS}"
    ))
    .bind(id)
    .bind(level)
    .bind(experience)
    .fetch_one(exec)
    .await?;
    embassy_from_row(&row)
}

pub async fn apply_upgrade_outcome<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
    outcome: &UpgradeOutcome,
) -> Result<Embassy, sqlx::Error> {
    let row = sqlx::query(&format!(
        "UPDATE embassies SET \
             budget = budget - $2, \
             staff_count = $3, \
             effectiveness = $4, \
             specialization_level = $5, \
             reputation = $6 \
         WHERE id = $1 RETURNING {EMBASSY_COLUMNS}"
    ))
    .bind(id)
    .bind(outcome.cost)
    .bind(outcome.staff_count)
    .bind(outcome.effectiveness)
    .bind(outcome.specialization_level)
    .bind(outcome.reputation)
    .fetch_one(exec)
    .await?;
    embassy_from_row(&row)
}

/// Changing specialization restarts its training.
pub async fn set_specialization<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
    specialization: Specialization,
) -> Result<Option<Embassy>, sqlx::Error> {
    sqlx::query(&format!(
        "UPDATE embassies SET \
             specialization_level = CASE WHEN specialization IS DISTINCT FROM $2 \
                                         THEN 0 ELSE specialization_level END, \
             specialization = $2 \
         WHERE id = $1 RETURNING {EMBASSY_COLUMNS}"
    ))
    .bind(id)
    .bind(specialization.as_str())
    .fetch_optional(exec)
    .await?
    .map(|row| embassy_from_row(&row))
    .transpose()
}

// --- Missions ---

pub struct NewMission {
    pub embassy_id: i64,
    pub mission_type: MissionType,
    pub difficulty: MissionDifficulty,
    pub staff_assigned: i32,
    pub success_chance: f64,
    pub rewards: MissionRewards,
    pub cost: i64,
    pub duration_days: i32,
    pub completes_at: DateTime<Utc>,
}

pub async fn insert_mission<'e>(
    exec: impl PgExecutor<'e>,
    new: &NewMission,
) -> Result<EmbassyMission, sqlx::Error> {
    let row = sqlx::query(&format!(
        "INSERT INTO embassy_missions (embassy_id, mission_type, difficulty, staff_assigned, \
             success_chance, status, reward_experience, reward_influence, reward_reputation, \
             reward_budget, cost, duration_days, completes_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         RETURNING {MISSION_COLUMNS}"
    ))
    .bind(new.embassy_id)
    .bind(new.mission_type.as_str())
    .bind(new.difficulty.as_str())
    .bind(new.staff_assigned)
    .bind(new.success_chance)
    .bind(MissionStatus::Active.as_str())
    .bind(new.rewards.experience)
    .bind(new.rewards.influence)
    .bind(new.rewards.reputation)
    .bind(new.rewards.budget)
    .bind(new.cost)
    .bind(new.duration_days)
    .bind(new.completes_at)
    .fetch_one(exec)
    .await?;
    mission_from_row(&row)
}

pub async fn lock_mission<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
) -> Result<Option<EmbassyMission>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {MISSION_COLUMNS} FROM embassy_missions WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await?
    .map(|row| mission_from_row(&row))
    .transpose()
}

pub async fn list_missions<'e>(
    exec: impl PgExecutor<'e>,
    embassy_id: i64,
    status: Option<MissionStatus>,
) -> Result<Vec<EmbassyMission>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {MISSION_COLUMNS} FROM embassy_missions \
         WHERE embassy_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
         ORDER BY started_at DESC, id DESC"
    ))
    .bind(embassy_id)
    .bind(status.map(|s| s.as_str()))
    .fetch_all(exec)
    .await?
    .iter()
    .map(mission_from_row)
    .collect()
}

pub async fn resolve_mission<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
    status: MissionStatus,
) -> Result<EmbassyMission, sqlx::Error> {
    let row = sqlx::query(&format!(
        "UPDATE embassy_missions SET status = $2, resolved_at = now() \
         WHERE id = $1 RETURNING {MISSION_COLUMNS}"
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_one(exec)
    .await?;
    mission_from_row(&row)
}

// --- Upgrades ---

pub async fn upgrade_level<'e>(
    exec: impl PgExecutor<'e>,
    embassy_id: i64,
    upgrade_type: UpgradeType,
) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(MAX(level), 0) FROM embassy_upgrades \
         WHERE embassy_id = $1 AND upgrade_type = $2",
    )
    .bind(embassy_id)
    .bind(upgrade_type.as_str())
    .fetch_one(exec)
    .await
}

pub async fn insert_upgrade<'e>(
    exec: impl PgExecutor<'e>,
    embassy_id: i64,
    upgrade_type: UpgradeType,
    level: i32,
    cost: i64,
) -> Result<EmbassyUpgrade, sqlx::Error> {
    let row = sqlx::query(&format!(
        "INSERT INTO embassy_upgrades (embassy_id, upgrade_type, level, cost) \
         VALUES ($1, $2, $3, $4) RETURNING {UPGRADE_COLUMNS}"
    ))
    .bind(embassy_id)
    .bind(upgrade_type.as_str())
    .bind(level)
    .bind(cost)
    .fetch_one(exec)
    .await?;
    upgrade_from_row(&row)
}

pub async fn list_upgrades<'e>(
    exec: impl PgExecutor<'e>,
    embassy_id: i64,
) -> Result<Vec<EmbassyUpgrade>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {UPGRADE_COLUMNS} FROM embassy_upgrades WHERE embassy_id = $1 ORDER BY id"
    ))
    .bind(embassy_id)
    .fetch_all(exec)
    .await?
    .iter()
    .map(upgrade_from_row)
    .collect()
}
