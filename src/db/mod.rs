//! Row-level access to Postgres. Every function takes any executor, so the
//! same query runs against the pool or inside a procedure's transaction.

pub mod audit;
pub mod card;
pub mod country;
pub mod embassy;
pub mod migrate;
pub mod notification;
pub mod relation;
pub mod security;

use std::str::FromStr;

use sqlx::Row;
use sqlx::postgres::PgRow;

pub use migrate::migrate;

/// Decode a TEXT column holding one of the model's string enums.
pub(crate) fn enum_col<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|err: String| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: err.into(),
    })
}

pub(crate) fn opt_enum_col<T>(row: &PgRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr<Err = String>,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| {
        s.parse().map_err(|err: String| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: err.into(),
        })
    })
    .transpose()
}
