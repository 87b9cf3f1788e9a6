use serde::Deserialize;

use super::diplomacy::CountryQuery;
use super::{Context, load_country};
use crate::access::{Actor, Capability};
use crate::db;
use crate::db::notification::StoredNotification;
use crate::error::{ServiceError, ensure};
use crate::rules::intelligence::{self, Briefing};
use crate::rules::security;

const DEFAULT_NOTIFICATION_LIMIT: i64 = 50;
const MAX_NOTIFICATION_LIMIT: i64 = 200;

/// Current intelligence picture for a country. Owner or admin; read-only.
pub async fn get_briefing(
    ctx: &Context,
    actor: &Actor,
    input: CountryQuery,
) -> Result<Briefing, ServiceError> {
    actor.require(Capability::CountryOwner(input.country_id))?;
    let country = load_country(&ctx.pool, input.country_id).await?;
    let readiness = db::security::readiness_levels(&ctx.pool, country.id).await?;
    let threats = db::security::active_threats(&ctx.pool, country.id).await?;
    let events = db::security::list_events(&ctx.pool, country.id, true).await?;
    let relations = db::relation::list_for_country(&ctx.pool, country.id).await?;

    Ok(intelligence::build_briefing(
        country.id,
        security::score_country(&country, &readiness),
        threats,
        events,
        relations,
    ))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListNotifications {
    pub country_id: i64,
    pub limit: Option<i64>,
}

/// Delivered notifications for a country, broadcasts included.
pub async fn list_notifications(
    ctx: &Context,
    actor: &Actor,
    input: ListNotifications,
) -> Result<Vec<StoredNotification>, ServiceError> {
    actor.require(Capability::CountryOwner(input.country_id))?;
    let limit = input.limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT);
    ensure((1..=MAX_NOTIFICATION_LIMIT).contains(&limit), || {
        format!("limit must be within 1..={MAX_NOTIFICATION_LIMIT}")
    })?;
    Ok(db::notification::list_for_country(&ctx.pool, input.country_id, limit).await?)
}
