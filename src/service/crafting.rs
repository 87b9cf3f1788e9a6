use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Context, actor_name, unique_violation};
use crate::access::{Actor, Capability};
use crate::audit::AuditEntry;
use crate::db;
use crate::db::card::NewRecipe;
use crate::error::{ServiceError, ensure};
use crate::model::{AcquiredVia, Card, CardInstance, Collector, CraftingRecipe, Rarity};
use crate::rules::crafting::{
    self, CollectorProgress, MAX_MATERIAL_COUNT, MIN_MATERIAL_COUNT,
};

const MAX_NAME_CHARS: usize = 100;
const MAX_GRANT: i64 = 1_000_000;

// --- Crafting ---

#[derive(Debug, Clone, Deserialize)]
pub struct CraftCard {
    pub recipe_id: i64,
    pub material_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CraftResult {
    pub attempt_id: i64,
    pub success: bool,
    /// The minted card, on success.
    pub card: Option<CardInstance>,
    pub consumed: Vec<i64>,
    pub credits_spent: i64,
    pub progress: CollectorProgress,
    pub collector: Collector,
}

/// Fuse owned material cards into one card of the recipe's result rarity.
///
/// Everything happens in one transaction. Any rejected check leaves the
/// materials and balance untouched; a failed roll still consumes both.
pub async fn craft_card(
    ctx: &Context,
    actor: &Actor,
    input: CraftCard,
) -> Result<CraftResult, ServiceError> {
    let user_id = actor.require_user()?.to_string();
    let result = craft(ctx, &user_id, &input).await;

    let entry = AuditEntry::new(&user_id, "craft_card", format!("recipe:{}", input.recipe_id));
    match &result {
        Ok(craft) => {
            ctx.record(entry.with_details(serde_json::json!({
                "success": craft.success,
                "consumed": craft.consumed,
                "credits_spent": craft.credits_spent,
            })))
            .await;
        }
        Err(err) => {
            ctx.record(
                entry
                    .with_details(serde_json::json!({ "error": err.to_string() }))
                    .failed(),
            )
            .await;
        }
    }
    result
}

async fn craft(ctx: &Context, user_id: &str, input: &CraftCard) -> Result<CraftResult, ServiceError> {
    let mut tx = ctx.pool.begin().await?;
    let recipe = db::card::get_recipe(&mut *tx, input.recipe_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("recipe", input.recipe_id))?;
    crafting::check_material_ids(&recipe, &input.material_ids)?;

    let materials = db::card::lock_instances(&mut *tx, &input.material_ids).await?;
    crafting::check_materials(&recipe, user_id, &input.material_ids, &materials)?;

    let collector = db::card::lock_collector(&mut *tx, user_id).await?;
    crafting::check_balance(&recipe, collector.ix_credits)?;

    db::card::delete_instances(&mut *tx, &input.material_ids).await?;

    let success = ctx.with_rng(|rng| crafting::roll_success(&recipe, rng));
    let card = if success {
        let template = db::card::random_card_of_rarity(&mut *tx, recipe.result_rarity)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("no {} card available", recipe.result_rarity))
            })?;
        Some(db::card::insert_instance(&mut *tx, &template, user_id, AcquiredVia::Craft).await?)
    } else {
        None
    };

    let xp_gain = if success { recipe.collector_xp_gain } else { 0 };
    let progress =
        crafting::progress_collector(collector.collector_xp, collector.collector_level, xp_gain);
    let collector = db::card::settle_craft(
        &mut *tx,
        user_id,
        recipe.ix_credits_cost,
        progress.collector_xp,
        progress.collector_level,
    )
    .await?;
    let attempt = db::card::insert_attempt(
        &mut *tx,
        user_id,
        recipe.id,
        success,
        card.as_ref().map(|c| c.id),
    )
    .await?;
    tx.commit().await?;

    info!(
        user_id,
        recipe_id = recipe.id,
        success,
        credits_spent = recipe.ix_credits_cost,
        collector_level = collector.collector_level,
        "craft attempted"
    );
    Ok(CraftResult {
        attempt_id: attempt.id,
        success,
        card,
        consumed: input.material_ids.clone(),
        credits_spent: recipe.ix_credits_cost,
        progress,
        collector,
    })
}

// --- Recipes ---

pub async fn list_recipes(ctx: &Context) -> Result<Vec<CraftingRecipe>, ServiceError> {
    Ok(db::card::list_recipes(&ctx.pool).await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecipe {
    pub name: String,
    pub result_rarity: Rarity,
    pub required_rarity: Rarity,
    pub material_count: i32,
}

impl CreateRecipe {
    fn validate(&self) -> Result<(), ServiceError> {
        let len = self.name.trim().chars().count();
        ensure((1..=MAX_NAME_CHARS).contains(&len), || {
            format!("name must be 1 to {MAX_NAME_CHARS} characters")
        })?;
        ensure(
            (MIN_MATERIAL_COUNT..=MAX_MATERIAL_COUNT).contains(&self.material_count),
            || format!("material_count must be within {MIN_MATERIAL_COUNT}..={MAX_MATERIAL_COUNT}"),
        )
    }
}

/// Admin-only. Rate, cost and xp come from the result rarity's table.
pub async fn create_recipe(
    ctx: &Context,
    actor: &Actor,
    input: CreateRecipe,
) -> Result<CraftingRecipe, ServiceError> {
    actor.require(Capability::Admin)?;
    input.validate()?;
    let table = crafting::rarity_table(input.result_rarity);
    let recipe = db::card::insert_recipe(
        &ctx.pool,
        &NewRecipe {
            name: input.name.trim(),
            result_rarity: input.result_rarity,
            required_rarity: input.required_rarity,
            material_count: input.material_count,
            success_rate: table.success_rate,
            ix_credits_cost: table.ix_credits_cost,
            collector_xp_gain: table.collector_xp_gain,
        },
    )
    .await
    .map_err(|err| unique_violation(err, "a recipe with this name already exists"))?;

    info!(recipe_id = recipe.id, result = %recipe.result_rarity, "recipe created");
    ctx.record(
        AuditEntry::new(actor_name(actor), "create_recipe", format!("recipe:{}", recipe.id))
            .with_details(serde_json::json!({ "name": recipe.name, "result_rarity": recipe.result_rarity })),
    )
    .await;
    Ok(recipe)
}

// --- Collectors and cards ---

/// The caller's collector profile. Users who never crafted start empty.
pub async fn get_collector(ctx: &Context, actor: &Actor) -> Result<Collector, ServiceError> {
    let user_id = actor.require_user()?;
    Ok(db::card::get_collector(&ctx.pool, user_id)
        .await?
        .unwrap_or_else(|| Collector {
            user_id: user_id.to_string(),
            ix_credits: 0,
            collector_xp: 0,
            collector_level: crafting::collector_level(0),
        }))
}

pub async fn list_owned_cards(
    ctx: &Context,
    actor: &Actor,
) -> Result<Vec<CardInstance>, ServiceError> {
    let user_id = actor.require_user()?;
    Ok(db::card::list_owned(&ctx.pool, user_id).await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrantCredits {
    pub user_id: String,
    pub amount: i64,
}

pub async fn grant_credits(
    ctx: &Context,
    actor: &Actor,
    input: GrantCredits,
) -> Result<Collector, ServiceError> {
    actor.require(Capability::Admin)?;
    ensure(!input.user_id.trim().is_empty(), || "user_id is required".to_string())?;
    ensure((1..=MAX_GRANT).contains(&input.amount), || {
        format!("amount must be within 1..={MAX_GRANT}")
    })?;
    let collector = db::card::add_credits(&ctx.pool, input.user_id.trim(), input.amount).await?;
    info!(user_id = %collector.user_id, amount = input.amount, "credits granted");
    ctx.record(
        AuditEntry::new(actor_name(actor), "grant_credits", collector.user_id.clone())
            .with_details(serde_json::json!({ "amount": input.amount, "balance": collector.ix_credits })),
    )
    .await;
    Ok(collector)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCard {
    pub name: String,
    pub rarity: Rarity,
    #[serde(default = "first_season")]
    pub season: i32,
}

fn first_season() -> i32 {
    1
}

pub async fn create_card(
    ctx: &Context,
    actor: &Actor,
    input: CreateCard,
) -> Result<Card, ServiceError> {
    actor.require(Capability::Admin)?;
    let len = input.name.trim().chars().count();
    ensure((1..=MAX_NAME_CHARS).contains(&len), || {
        format!("name must be 1 to {MAX_NAME_CHARS} characters")
    })?;
    ensure(input.season >= 1, || "season must be at least 1".to_string())?;
    Ok(db::card::insert_card(&ctx.pool, input.name.trim(), input.rarity, input.season).await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrantCard {
    pub user_id: String,
    pub card_id: i64,
}

pub async fn grant_card(
    ctx: &Context,
    actor: &Actor,
    input: GrantCard,
) -> Result<CardInstance, ServiceError> {
    actor.require(Capability::Admin)?;
    ensure(!input.user_id.trim().is_empty(), || "user_id is required".to_string())?;
    let card = db::card::get_card(&ctx.pool, input.card_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("card", input.card_id))?;
    let instance =
        db::card::insert_instance(&ctx.pool, &card, input.user_id.trim(), AcquiredVia::Grant)
            .await?;
    ctx.record(
        AuditEntry::new(actor_name(actor), "grant_card", instance.owner_id.clone())
            .with_details(serde_json::json!({ "card_id": card.id, "instance_id": instance.id })),
    )
    .await;
    Ok(instance)
}
