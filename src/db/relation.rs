use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Row};

use super::enum_col;
use crate::model::{DiplomaticRelation, RelationshipCategory};

const COLUMNS: &str = "id, country_a, country_b, relationship, strength, last_reason, updated_at";

fn from_row(row: &PgRow) -> Result<DiplomaticRelation, sqlx::Error> {
    Ok(DiplomaticRelation {
        id: row.try_get("id")?,
        country_a: row.try_get("country_a")?,
        country_b: row.try_get("country_b")?,
        relationship: enum_col(row, "relationship")?,
        strength: row.try_get("strength")?,
        last_reason: row.try_get("last_reason")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn get_relation<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
) -> Result<Option<DiplomaticRelation>, sqlx::Error> {
    sqlx::query(&format!("SELECT {COLUMNS} FROM diplomatic_relations WHERE id = $1"))
        .bind(id)
        .fetch_optional(exec)
        .await?
        .map(|row| from_row(&row))
        .transpose()
}

/// Same as `get_relation`, holding a row lock until the transaction ends.
pub async fn lock_relation<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
) -> Result<Option<DiplomaticRelation>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {COLUMNS} FROM diplomatic_relations WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await?
    .map(|row| from_row(&row))
    .transpose()
}

/// The relation between two countries, in either direction.
pub async fn find_between<'e>(
    exec: impl PgExecutor<'e>,
    a: i64,
    b: i64,
) -> Result<Option<DiplomaticRelation>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {COLUMNS} FROM diplomatic_relations \
         WHERE (country_a = $1 AND country_b = $2) OR (country_a = $2 AND country_b = $1)"
    ))
    .bind(a)
    .bind(b)
    .fetch_optional(exec)
    .await?
    .map(|row| from_row(&row))
    .transpose()
}

pub async fn list_for_country<'e>(
    exec: impl PgExecutor<'e>,
    country_id: i64,
) -> Result<Vec<DiplomaticRelation>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {COLUMNS} FROM diplomatic_relations \
         WHERE country_a = $1 OR country_b = $1 ORDER BY strength DESC, id"
    ))
    .bind(country_id)
    .fetch_all(exec)
    .await?
    .iter()
    .map(from_row)
    .collect()
}

pub async fn insert_relation<'e>(
    exec: impl PgExecutor<'e>,
    a: i64,
    b: i64,
    category: RelationshipCategory,
    strength: f64,
) -> Result<DiplomaticRelation, sqlx::Error> {
    let row = sqlx::query(&format!(
        "INSERT INTO diplomatic_relations (country_a, country_b, relationship, strength) \
         VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
    ))
    .bind(a)
    .bind(b)
    .bind(category.as_str())
    .bind(strength)
    .fetch_one(exec)
    .await?;
    from_row(&row)
}

pub async fn update_strength<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
    category: RelationshipCategory,
    strength: f64,
    reason: &str,
) -> Result<DiplomaticRelation, sqlx::Error> {
    let row = sqlx::query(&format!(
        "UPDATE diplomatic_relations \
         SET relationship = $2, strength = $3, last_reason = $4, updated_at = now() \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(category.as_str())
    .bind(strength)
    .bind(reason)
    .fetch_one(exec)
    .await?;
    from_row(&row)
}
