use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Row};

use crate::model::{Country, CountryRecord};

const COLUMNS: &str = "id, name, population, gdp_per_capita, government_type, \
                       capital, continent, internal_stability, border_security";

fn from_row(row: &PgRow) -> Result<Country, sqlx::Error> {
    Ok(Country {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        population: row.try_get("population")?,
        gdp_per_capita: row.try_get("gdp_per_capita")?,
        government_type: row.try_get("government_type")?,
        capital: row.try_get("capital")?,
        continent: row.try_get("continent")?,
        internal_stability: row.try_get("internal_stability")?,
        border_security: row.try_get("border_security")?,
    })
}

pub async fn get_country<'e>(
    exec: impl PgExecutor<'e>,
    id: i64,
) -> Result<Option<Country>, sqlx::Error> {
    sqlx::query(&format!("SELECT {COLUMNS} FROM countries WHERE id = $1"))
        .bind(id)
        .fetch_optional(exec)
        .await?
        .map(|row| from_row(&row))
        .transpose()
}

/// Insert a country with explicit stats. Returns the new id.
pub async fn insert_country<'e>(
    exec: impl PgExecutor<'e>,
    name: &str,
    internal_stability: f64,
    border_security: f64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO countries (name, internal_stability, border_security) \
         VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(name)
    .bind(internal_stability)
    .bind(border_security)
    .fetch_one(exec)
    .await
}

/// Insert or refresh a country from an imported record, keyed by name.
/// Fields missing from the record keep their stored values.
pub async fn upsert_record<'e>(
    exec: impl PgExecutor<'e>,
    record: &CountryRecord,
    source: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO countries (name, capital, population, gdp_per_capita, government_type, \
                                continent, source) \
         VALUES ($1, $2, COALESCE($3, 0), COALESCE($4, 0), $5, $6, $7) \
         ON CONFLICT (name) DO UPDATE SET \
             capital = COALESCE(EXCLUDED.capital, countries.capital), \
             population = COALESCE($3, countries.population), \
             gdp_per_capita = COALESCE($4, countries.gdp_per_capita), \
             government_type = COALESCE(EXCLUDED.government_type, countries.government_type), \
             continent = COALESCE(EXCLUDED.continent, countries.continent), \
             source = EXCLUDED.source, \
             updated_at = now() \
         RETURNING id",
    )
    .bind(&record.name)
    .bind(&record.capital)
    .bind(record.population)
    .bind(record.gdp_per_capita)
    .bind(&record.government_type)
    .bind(&record.continent)
    .bind(source)
    .fetch_one(exec)
    .await
}
