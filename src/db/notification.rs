use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, Row};

use super::enum_col;
use crate::model::{Notification, Priority};

pub async fn insert_notification<'e>(
    exec: impl PgExecutor<'e>,
    notification: &Notification,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO notifications (title, message, country_id, category, priority) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(notification.target.country_id())
    .bind(&notification.category)
    .bind(notification.priority.as_str())
    .fetch_one(exec)
    .await
}

/// A stored notification as clients read it back.
#[derive(Debug, Clone, Serialize)]
pub struct StoredNotification {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub country_id: Option<i64>,
    pub category: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

/// Notifications addressed to a country plus broadcasts, newest first.
pub async fn list_for_country<'e>(
    exec: impl PgExecutor<'e>,
    country_id: i64,
    limit: i64,
) -> Result<Vec<StoredNotification>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, title, message, country_id, category, priority, created_at \
         FROM notifications WHERE country_id = $1 OR country_id IS NULL \
         ORDER BY created_at DESC, id DESC LIMIT $2",
    )
    .bind(country_id)
    .bind(limit)
    .fetch_all(exec)
    .await?;
    rows.iter()
        .map(|row| {
            Ok(StoredNotification {
                id: row.try_get("id")?,
                title: row.try_get("title")?,
                message: row.try_get("message")?,
                country_id: row.try_get("country_id")?,
                category: row.try_get("category")?,
                priority: enum_col(row, "priority")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}
