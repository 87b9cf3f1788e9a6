use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgExecutor, Row};

use super::enum_col;
use crate::model::{
    AcquiredVia, Card, CardInstance, Collector, CraftingAttempt, CraftingRecipe, Rarity,
};

const INSTANCE_SELECT: &str = "SELECT ci.id, ci.card_id, ci.owner_id, c.rarity, ci.acquired_via, \
                                      ci.acquired_at \
                               FROM card_instances ci JOIN cards c ON c.id = ci.card_id";

const RECIPE_COLUMNS: &str = "id, name, result_rarity, required_rarity, material_count, \
                              success_rate, ix_credits_cost, collector_xp_gain";

const COLLECTOR_COLUMNS: &str = "user_id, ix_credits, collector_xp, collector_level";

fn card_from_row(row: &PgRow) -> Result<Card, sqlx::Error> {
    Ok(Card {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        rarity: enum_col(row, "rarity")?,
        season: row.try_get("season")?,
    })
}

fn instance_from_row(row: &PgRow) -> Result<CardInstance, sqlx::Error> {
    Ok(CardInstance {
        id: row.try_get("id")?,
        card_id: row.try_get("card_id")?,
        owner_id: row.try_get("owner_id")?,
        rarity: enum_col(row, "rarity")?,
        acquired_via: enum_col(row, "acquired_via")?,
        acquired_at: row.try_get("acquired_at")?,
    })
}

fn recipe_from_row(row: &PgRow) -> Result<CraftingRecipe, sqlx::Error> {
    Ok(CraftingRecipe {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        result_rarity: enum_col(row, "result_rarity")?,
        required_rarity: enum_col(row, "required_rarity")?,
        material_count: row.try_get("material_count")?,
        success_rate: row.try_get("success_rate")?,
        ix_credits_cost: row.try_get("ix_credits_cost")?,
        collector_xp_gain: row.try_get("collector_xp_gain")?,
    })
}

fn collector_from_row(row: &PgRow) -> Result<Collector, sqlx::Error> {
    Ok(Collector {
        user_id: row.try_get("user_id")?,
        ix_credits: row.try_get("ix_credits")?,
        collector_xp: row.try_get("collector_xp")?,
        collector_level: row.try_get("collector_level")?,
    })
}

// --- Cards ---

pub async fn insert_card<'e>(
    exec: impl PgExecutor<'e>,
    name: &str,
    rarity: Rarity,
    season: i32,
) -> Result<Card, sqlx::Error> {
    let row = sqlx::query(
        "INSERT INTO cards (name, rarity, season) VALUES ($1, $2, $3) \
         RETURNING id, name, rarity, season",
    )
    .bind(name)
    .bind(rarity.as_str())
    .bind(season)
    .fetch_one(exec)
    .await?;
    card_from_row(&row)
}

pub async fn get_card<'e>(exec: impl PgExecutor<'e>, id: i64) -> Result<Option<Card>, sqlx::Error> {
    sqlx::query("SELECT id, name, rarity, season FROM cards WHERE id = $1")
        .bind(id)
        .fetch_optional(exec)
        .await?
        .map(|row| card_from_row(&row))
        .transpose()
}

/// A uniformly random card of the given rarity, if any exists.
pub async fn random_card_of_rarity<'e>(
    exec: impl PgExecutor<'e>,
    rarity: Rarity,
) -> Result<Option<Card>, sqlx::Error> {
    sqlx::query(
        "SELECT id, name, rarity, season FROM cards WHERE rarity = $1 ORDER BY random() LIMIT 1",
    )
    .bind(rarity.as_str())
    .fetch_optional(exec)
    .await?
    .map(|row| card_from_row(&row))
    .transpose()
}

// --- Instances ---

pub async fn list_owned<'e>(
    exec: impl PgExecutor<'e>,
    owner_id: &str,
) -> Result<Vec<CardInstance>, sqlx::Error> {
    sqlx::query(&format!(
        "{INSTANCE_SELECT} WHERE ci.owner_id = $1 ORDER BY ci.acquired_at DESC, ci.id DESC"
    ))
    .bind(owner_id)
    .fetch_all(exec)
    .await?
    .iter()
    .map(instance_from_row)
    .collect()
}

/// Lock the requested instances for the rest of the transaction. Ids that do
/// not exist are simply absent from the result.
pub async fn lock_instances<'e>(
    exec: impl PgExecutor<'e>,
    ids: &[i64],
) -> Result<Vec<CardInstance>, sqlx::Error> {
    sqlx::query(&format!(
        "{INSTANCE_SELECT} WHERE ci.id = ANY($1) ORDER BY ci.id FOR UPDATE OF ci"
    ))
    .bind(ids)
    .fetch_all(exec)
    .await?
    .iter()
    .map(instance_from_row)
    .collect()
}

pub async fn delete_instances<'e>(
    exec: impl PgExecutor<'e>,
    ids: &[i64],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM card_instances WHERE id = ANY($1)")
        .bind(ids)
        .execute(exec)
        .await?;
    Ok(result.rows_affected())
}

pub async fn insert_instance<'e>(
    exec: impl PgExecutor<'e>,
    card: &Card,
    owner_id: &str,
    acquired_via: AcquiredVia,
) -> Result<CardInstance, sqlx::Error> {
    let row = sqlx::query(
        "INSERT INTO card_instances (card_id, owner_id, acquired_via) VALUES ($1, $2, $3) \
         RETURNING id, card_id, owner_id, acquired_via, acquired_at",
    )
    .bind(card.id)
    .bind(owner_id)
    .bind(acquired_via.as_str())
    .fetch_one(exec)
    .await?;
    Ok(CardInstance {
        id: row.try_get("id")?,
        card_id: row.try_get("card_id")?,
        owner_id: row.try_get("owner_id")?,
        rarity: card.rarity,
        acquired_via: enum_col(&row, "acquired_via")?,
        acquired_at: row.try_get("acquired_at")?,
    })
}

// --- Recipes ---

pub async fn get_recipe<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
) -> Result<Option<CraftingRecipe>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {RECIPE_COLUMNS} FROM crafting_recipes WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await?
    .map(|row| recipe_from_row(&row))
    .transpose()
}

pub async fn list_recipes<'e>(exec: impl PgExecutor<'e>) -> Result<Vec<CraftingRecipe>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {RECIPE_COLUMNS} FROM crafting_recipes ORDER BY id"
    ))
    .fetch_all(exec)
    .await?
    .iter()
    .map(recipe_from_row)
    .collect()
}

pub struct NewRecipe<'a> {
    pub name: &'a str,
    pub result_rarity: Rarity,
    pub required_rarity: Rarity,
    pub material_count: i32,
    pub success_rate: i32,
    pub ix_credits_cost: i64,
    pub collector_xp_gain: i64,
}

pub async fn insert_recipe<'e>(
    exec: impl PgExecutor<'e>,
    new: &NewRecipe<'_>,
) -> Result<CraftingRecipe, sqlx::Error> {
    let row = sqlx::query(&format!(
        "INSERT INTO crafting_recipes (name, result_rarity, required_rarity, material_count, \
                                       success_rate, ix_credits_cost, collector_xp_gain) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {RECIPE_COLUMNS}"
    ))
    .bind(new.name)
    .bind(new.result_rarity.as_str())
    .bind(new.required_rarity.as_str())
    .bind(new.material_count)
    .bind(new.success_rate)
    .bind(new.ix_credits_cost)
    .bind(new.collector_xp_gain)
    .fetch_one(exec)
    .await?;
    recipe_from_row(&row)
}

// --- Collectors ---

pub async fn get_collector<'e>(
    exec: impl PgExecutor<'e>,
    user_id: &str,
) -> Result<Option<Collector>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {COLLECTOR_COLUMNS} FROM collectors WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(exec)
    .await?
    .map(|row| collector_from_row(&row))
    .transpose()
}

/// Lock the collector row, creating an empty one first if needed.
pub async fn lock_collector(
    conn: &mut PgConnection,
    user_id: &str,
) -> Result<Collector, sqlx::Error> {
    sqlx::query("INSERT INTO collectors (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    let row = sqlx::query(&format!(
        "SELECT {COLLECTOR_COLUMNS} FROM collectors WHERE user_id = $1 FOR UPDATE"
    ))
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;
    collector_from_row(&row)
}

pub async fn add_credits<'e>(
    exec: impl PgExecutor<'e>,
    user_id: &str,
    amount: i64,
) -> Result<Collector, sqlx::Error> {
    let row = sqlx::query(&format!(
        "INSERT INTO collectors (user_id, ix_credits) VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE SET ix_credits = collectors.ix_credits + $2 \
         RETURNING {COLLECTOR_COLUMNS}"
    ))
    .bind(user_id)
    .bind(amount)
    .fetch_one(exec)
    .await?;
    collector_from_row(&row)
}

/// Debit credits and record progression in one statement.
pub async fn settle_craft<'e>(
    exec: impl PgExecutor<'e>,
    user_id: &str,
    credits_spent: i64,
    collector_xp: i64,
    collector_level: i32,
) -> Result<Collector, sqlx::Error> {
    let row = sqlx::query(&format!(
        "UPDATE collectors SET ix_credits = ix_credits - $2, collector_xp = $3, \
                               collector_level = $4 \
         WHERE user_id = $1 RETURNING {COLLECTOR_COLUMNS}"
    ))
    .bind(user_id)
    .bind(credits_spent)
    .bind(collector_xp)
    .bind(collector_level)
    .fetch_one(exec)
    .await?;
    collector_from_row(&row)
}

// --- Attempts ---

pub async fn insert_attempt<'e>(
    exec: impl PgExecutor<'e>,
    user_id: &str,
    recipe_id: i64,
    success: bool,
    result_instance_id: Option<i64>,
) -> Result<CraftingAttempt, sqlx::Error> {
    let row = sqlx::query(
        "INSERT INTO crafting_attempts (user_id, recipe_id, success, result_instance_id) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, user_id, recipe_id, success, result_instance_id, created_at",
    )
    .bind(user_id)
    .bind(recipe_id)
    .bind(success)
    .bind(result_instance_id)
    .fetch_one(exec)
    .await?;
    Ok(CraftingAttempt {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        recipe_id: row.try_get("recipe_id")?,
        success: row.try_get("success")?,
        result_instance_id: row.try_get("result_instance_id")?,
        created_at: row.try_get("created_at")?,
    })
}
