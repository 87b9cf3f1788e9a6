use serde::Deserialize;
use tracing::info;

use super::{Context, actor_name, load_country};
use crate::access::{Actor, Capability};
use crate::audit::AuditEntry;
use crate::db;
use crate::error::{ServiceError, ensure};
use crate::model::{Country, CountryRecord};
use crate::wiki;

const MAX_SOURCE_CHARS: usize = 200;
const MAX_WIKITEXT_BYTES: usize = 2 * 1024 * 1024;

fn check_wikitext(wikitext: &str) -> Result<(), ServiceError> {
    ensure(!wikitext.trim().is_empty(), || "wikitext is required".to_string())?;
    ensure(wikitext.len() <= MAX_WIKITEXT_BYTES, || {
        format!("wikitext exceeds {MAX_WIKITEXT_BYTES} bytes")
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewImport {
    pub wikitext: String,
}

/// Parse without writing anything.
pub fn preview_import(input: PreviewImport) -> Result<CountryRecord, ServiceError> {
    check_wikitext(&input.wikitext)?;
    Ok(wiki::parse_country(&input.wikitext)?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportCountry {
    /// Where the wikitext came from, e.g. a page title or URL.
    pub source: String,
    pub wikitext: String,
}

/// Admin-only: create or refresh a country from its infobox. Existing
/// countries are matched by name.
pub async fn import_country(
    ctx: &Context,
    actor: &Actor,
    input: ImportCountry,
) -> Result<Country, ServiceError> {
    actor.require(Capability::Admin)?;
    let len = input.source.trim().chars().count();
    ensure((1..=MAX_SOURCE_CHARS).contains(&len), || {
        format!("source must be 1 to {MAX_SOURCE_CHARS} characters")
    })?;
    check_wikitext(&input.wikitext)?;

    let record = wiki::parse_country(&input.wikitext)?;
    let country_id = db::country::upsert_record(&ctx.pool, &record, input.source.trim()).await?;
    let country = load_country(&ctx.pool, country_id).await?;

    info!(country_id, name = %country.name, source = %input.source.trim(), "country imported");
    ctx.record(
        AuditEntry::new(actor_name(actor), "import_country", format!("country:{country_id}"))
            .with_details(serde_json::json!({ "source": input.source.trim(), "record": record })),
    )
    .await;
    Ok(country)
}
