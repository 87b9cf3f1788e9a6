use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::Context;
use super::embassy::lock_embassy;
use crate::access::{Actor, Capability};
use crate::db;
use crate::db::embassy::NewMission;
use crate::error::{ServiceError, ensure};
use crate::model::{
    Embassy, EmbassyMission, EmbassyStatus, MissionDifficulty, MissionStatus, MissionType,
    Notification, Priority,
};
use crate::rules::mission::{self, MissionOdds, MissionRewards};

const MAX_STAFF_ASSIGNED: i32 = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct StartMission {
    pub embassy_id: i64,
    pub mission_type: MissionType,
    pub difficulty: MissionDifficulty,
    pub staff_assigned: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissionStarted {
    pub mission: EmbassyMission,
    pub embassy: Embassy,
}

/// Start a mission, paying its cost out of the embassy budget.
pub async fn start_mission(
    ctx: &Context,
    actor: &Actor,
    input: StartMission,
) -> Result<MissionStarted, ServiceError> {
    ensure((1..=MAX_STAFF_ASSIGNED).contains(&input.staff_assigned), || {
        format!("staff_assigned must be within 1..={MAX_STAFF_ASSIGNED}")
    })?;

    let mut tx = ctx.pool.begin().await?;
    let embassy = lock_embassy(&mut *tx, input.embassy_id).await?;
    actor.require(Capability::CountryOwner(embassy.guest_country_id))?;
    if embassy.status != EmbassyStatus::Active {
        return Err(ServiceError::bad_request("embassy is not active"));
    }
    if input.staff_assigned > embassy.staff_count {
        return Err(ServiceError::bad_request(format!(
            "embassy has {} staff, cannot assign {}",
            embassy.staff_count, input.staff_assigned
        )));
    }

    let template = mission::mission_template(input.mission_type);
    if embassy.budget < template.cost {
        return Err(ServiceError::bad_request(format!(
            "insufficient embassy budget: mission costs {}, budget is {}",
            template.cost, embassy.budget
        )));
    }
    let embassy = db::embassy::deduct_budget(&mut *tx, embassy.id, template.cost)
        .await?
        .ok_or_else(|| ServiceError::bad_request("insufficient embassy budget"))?;

    let chance = mission::success_chance(&MissionOdds {
        difficulty: input.difficulty,
        level: embassy.level,
        staff_assigned: input.staff_assigned,
        effectiveness: embassy.effectiveness,
        specialization_level: embassy.specialization_level,
    });
    let mission = db::embassy::insert_mission(
        &mut *tx,
        &NewMission {
            embassy_id: embassy.id,
            mission_type: input.mission_type,
            difficulty: input.difficulty,
            staff_assigned: input.staff_assigned,
            success_chance: chance,
            rewards: MissionRewards::for_mission(input.mission_type, input.difficulty),
            cost: template.cost,
            duration_days: template.duration_days,
            completes_at: Utc::now() + Duration::days(i64::from(template.duration_days)),
        },
    )
    .await?;
    tx.commit().await?;

    info!(
        mission_id = mission.id,
        embassy_id = embassy.id,
        mission_type = %mission.mission_type,
        difficulty = %mission.difficulty,
        success_chance = chance,
        "mission started"
    );
    Ok(MissionStarted { mission, embassy })
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteMission {
    pub mission_id: i64,
    /// Skip the `completes_at` wait. Admin only.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissionOutcome {
    pub mission: EmbassyMission,
    pub embassy: Embassy,
    pub success: bool,
    pub rewards: MissionRewards,
    pub leveled_up: bool,
}

/// Resolve an active mission and pay out its rewards: in full on success,
/// partially on failure.
pub async fn complete_mission(
    ctx: &Context,
    actor: &Actor,
    input: CompleteMission,
) -> Result<MissionOutcome, ServiceError> {
    let mut tx = ctx.pool.begin().await?;
    let mission = db::embassy::lock_mission(&mut *tx, input.mission_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("mission", input.mission_id))?;
    let embassy = lock_embassy(&mut *tx, mission.embassy_id).await?;
    actor.require(Capability::CountryOwner(embassy.guest_country_id))?;
    if input.force {
        actor.require(Capability::Admin)?;
    }
    if mission.status.is_terminal() {
        return Err(ServiceError::bad_request(format!(
            "mission {} is already {}",
            mission.id, mission.status
        )));
    }
    if !input.force && Utc::now() < mission.completes_at {
        return Err(ServiceError::bad_request(format!(
            "mission {} completes at {}",
            mission.id,
            mission.completes_at.to_rfc3339()
        )));
    }

    let success = ctx.with_rng(|rng| ctx.resolution.resolve(mission.success_chance, rng));
    let rewards = MissionRewards {
        experience: mission.reward_experience,
        influence: mission.reward_influence,
        reputation: mission.reward_reputation,
        budget: mission.reward_budget,
    }
    .scaled(success);

    let rewarded = db::embassy::apply_rewards(&mut *tx, embassy.id, &rewards).await?;
    let (level, experience) = mission::advance_level(rewarded.level, rewarded.experience);
    let leveled_up = level != rewarded.level;
    let embassy = if leveled_up {
        db::embassy::set_level(&mut *tx, embassy.id, level, experience).await?
    } else {
        rewarded
    };
    let status = if success {
        MissionStatus::Completed
    } else {
        MissionStatus::Failed
    };
    let mission = db::embassy::resolve_mission(&mut *tx, mission.id, status).await?;
    tx.commit().await?;

    info!(
        mission_id = mission.id,
        embassy_id = embassy.id,
        success,
        level = embassy.level,
        influence = embassy.influence,
        reputation = embassy.reputation,
        "mission resolved"
    );
    ctx.notify(Notification::to_country(
        embassy.guest_country_id,
        "embassy",
        if success { Priority::Medium } else { Priority::Low },
        format!("{} mission {}", mission.mission_type.as_str().replace('_', " "), mission.status),
        format!(
            "{} earned {} experience, {} influence and {} reputation.",
            embassy.name, rewards.experience, rewards.influence, rewards.reputation
        ),
    ));
    Ok(MissionOutcome {
        mission,
        embassy,
        success,
        rewards,
        leveled_up,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListMissions {
    pub embassy_id: i64,
    #[serde(default)]
    pub status: Option<MissionStatus>,
}

pub async fn list_missions(
    ctx: &Context,
    input: ListMissions,
) -> Result<Vec<EmbassyMission>, ServiceError> {
    super::embassy::load_embassy(&ctx.pool, input.embassy_id).await?;
    Ok(db::embassy::list_missions(&ctx.pool, input.embassy_id, input.status).await?)
}
