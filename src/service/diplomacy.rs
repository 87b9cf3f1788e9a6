use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Context, load_country, unique_violation};
use crate::access::{Actor, Capability};
use crate::db;
use crate::error::{ServiceError, ensure};
use crate::model::{DiplomaticRelation, Notification, Priority, RelationshipCategory};
use crate::rules::diplomacy::{self, DEFAULT_STRENGTH, RelationshipUpdate};

const MAX_INFLUENCE_CHANGE: i32 = 1000;
const MAX_REASON_CHARS: usize = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRelationship {
    pub relationship_id: i64,
    pub influence_change: i32,
    pub reason: String,
}

impl UpdateRelationship {
    fn validate(&self) -> Result<(), ServiceError> {
        ensure(
            self.influence_change.abs() <= MAX_INFLUENCE_CHANGE,
            || format!("influence_change must be within -{MAX_INFLUENCE_CHANGE}..={MAX_INFLUENCE_CHANGE}"),
        )?;
        let len = self.reason.trim().chars().count();
        ensure((1..=MAX_REASON_CHARS).contains(&len), || {
            format!("reason must be 1 to {MAX_REASON_CHARS} characters")
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationshipChange {
    pub relation: DiplomaticRelation,
    pub update: RelationshipUpdate,
    /// Whether a category-change notification was queued.
    pub notified: bool,
}

/// Apply an influence delta to a relation. Either side's owner may call it.
pub async fn update_relationship(
    ctx: &Context,
    actor: &Actor,
    input: UpdateRelationship,
) -> Result<RelationshipChange, ServiceError> {
    input.validate()?;

    let mut tx = ctx.pool.begin().await?;
    let current = db::relation::lock_relation(&mut *tx, input.relationship_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("relationship", input.relationship_id))?;
    actor.require_any_owner(&[current.country_a, current.country_b])?;

    let update =
        diplomacy::apply_influence(current.relationship, current.strength, input.influence_change);
    let relation = db::relation::update_strength(
        &mut *tx,
        current.id,
        update.new_category,
        update.new_strength,
        input.reason.trim(),
    )
    .await?;
    tx.commit().await?;

    info!(
        relationship_id = relation.id,
        delta = input.influence_change,
        impact = update.impact,
        strength = update.new_strength,
        category = %update.new_category,
        "relationship updated"
    );

    let notified = update.category_changed() && notify_category_change(ctx, &relation, &update);
    Ok(RelationshipChange {
        relation,
        update,
        notified,
    })
}

/// Queue a notice to both countries. True only if both were accepted.
fn notify_category_change(
    ctx: &Context,
    relation: &DiplomaticRelation,
    update: &RelationshipUpdate,
) -> bool {
    let priority = if update.new_category == RelationshipCategory::Tension {
        Priority::High
    } else {
        Priority::Medium
    };
    [relation.country_a, relation.country_b]
        .into_iter()
        .map(|country_id| {
            let other = relation.counterpart(country_id);
            ctx.notify(Notification::to_country(
                country_id,
                "diplomatic",
                priority,
                format!("Relations with country {other} are now {}", update.new_category),
                format!(
                    "Relations moved from {} to {} (strength {:.1} to {:.1}).",
                    update.old_category,
                    update.new_category,
                    update.old_strength,
                    update.new_strength
                ),
            ))
        })
        .fold(true, |all, accepted| all && accepted)
}

#[derive(Debug, Clone, Deserialize)]
pub struct EstablishRelation {
    pub country_a: i64,
    pub country_b: i64,
    pub strength: Option<f64>,
}

impl EstablishRelation {
    fn validate(&self) -> Result<(), ServiceError> {
        ensure(self.country_a != self.country_b, || {
            "a country cannot have a relation with itself".to_string()
        })?;
        if let Some(strength) = self.strength {
            ensure((0.0..=100.0).contains(&strength), || {
                "strength must be within 0..=100".to_string()
            })?;
        }
        Ok(())
    }
}

/// Admin-only: open a relation between two countries that have none.
pub async fn establish_relation(
    ctx: &Context,
    actor: &Actor,
    input: EstablishRelation,
) -> Result<DiplomaticRelation, ServiceError> {
    actor.require(Capability::Admin)?;
    input.validate()?;
    load_country(&ctx.pool, input.country_a).await?;
    load_country(&ctx.pool, input.country_b).await?;
    if db::relation::find_between(&ctx.pool, input.country_a, input.country_b)
        .await?
        .is_some()
    {
        return Err(ServiceError::bad_request("relation already exists"));
    }

    let strength = input.strength.unwrap_or(DEFAULT_STRENGTH);
    let relation = db::relation::insert_relation(
        &ctx.pool,
        input.country_a,
        input.country_b,
        diplomacy::initial_category(strength),
        strength,
    )
    .await
    .map_err(|err| unique_violation(err, "relation already exists"))?;
    info!(relationship_id = relation.id, strength, "relation established");
    Ok(relation)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryQuery {
    pub country_id: i64,
}

pub async fn list_relations(
    ctx: &Context,
    input: CountryQuery,
) -> Result<Vec<DiplomaticRelation>, ServiceError> {
    load_country(&ctx.pool, input.country_id).await?;
    Ok(db::relation::list_for_country(&ctx.pool, input.country_id).await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationQuery {
    pub relationship_id: i64,
}

pub async fn get_relation(
    ctx: &Context,
    input: RelationQuery,
) -> Result<DiplomaticRelation, ServiceError> {
    db::relation::get_relation(&ctx.pool, input.relationship_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("relationship", input.relationship_id))
}
