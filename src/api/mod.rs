//! HTTP transport: every procedure is `POST /rpc/{router}.{procedure}` with a
//! JSON body. Identity comes from request headers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::access::{Actor, Role};
use crate::error::ServiceError;
use crate::service::{
    Context, crafting, diplomacy, embassy, intelligence, mission, security, wiki_import,
};

pub const USER_HEADER: &str = "x-user-id";
pub const COUNTRY_HEADER: &str = "x-country-id";
pub const ROLE_HEADER: &str = "x-role";

/// Every procedure name `dispatch` understands.
pub const PROCEDURES: &[&str] = &[
    "diplomacy.update_relationship",
    "diplomacy.establish_relation",
    "diplomacy.list_relations",
    "diplomacy.get_relation",
    "embassy.establish_embassy",
    "embassy.get_embassy",
    "embassy.list_embassies",
    "embassy.allocate_budget",
    "embassy.activate_embassy",
    "embassy.upgrade_embassy",
    "embassy.set_specialization",
    "mission.start_mission",
    "mission.complete_mission",
    "mission.list_missions",
    "security.get_security_assessment",
    "security.update_stability",
    "security.list_threats",
    "security.create_threat",
    "security.resolve_threat",
    "security.list_events",
    "security.generate_event",
    "security.resolve_event",
    "security.create_military_branch",
    "security.update_military_readiness",
    "intelligence.get_briefing",
    "intelligence.list_notifications",
    "crafting.craft_card",
    "crafting.list_recipes",
    "crafting.create_recipe",
    "crafting.get_collector",
    "crafting.list_owned_cards",
    "crafting.grant_credits",
    "crafting.create_card",
    "crafting.grant_card",
    "wiki.import_country",
    "wiki.preview_import",
];

pub fn router(ctx: Context) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rpc/{procedure}", post(rpc))
        .with_state(ctx)
}

#[derive(Serialize)]
struct Success<T> {
    result: T,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = json!({
            "error": { "code": self.code(), "message": self.to_string() }
        });
        (status, Json(body)).into_response()
    }
}

async fn health(State(ctx): State<Context>) -> Response {
    match sqlx::query("SELECT 1").execute(&ctx.pool).await {
        Ok(_) => Json(json!({ "status": "ok" })).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
                .into_response()
        }
    }
}

async fn rpc(
    State(ctx): State<Context>,
    Path(procedure): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let result: Result<Response, ServiceError> = async {
        let actor = actor_from_headers(&headers)?;
        let input = parse_body(&body)?;
        tracing::debug!(procedure = %procedure, user = ?actor.user_id, "rpc");
        dispatch(&ctx, &actor, &procedure, input).await
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

/// Build the caller from identity headers. No `x-user-id` means anonymous.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ServiceError> {
    let header = |name: &str| -> Result<Option<String>, ServiceError> {
        headers
            .get(name)
            .map(|value| {
                value
                    .to_str()
                    .map(|s| s.trim().to_string())
                    .map_err(|_| ServiceError::bad_request(format!("{name} is not valid text")))
            })
            .transpose()
    };

    let Some(user_id) = header(USER_HEADER)?.filter(|s| !s.is_empty()) else {
        return Ok(Actor::anonymous());
    };
    let country_id = header(COUNTRY_HEADER)?
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| ServiceError::bad_request(format!("{COUNTRY_HEADER} must be an integer")))
        })
        .transpose()?;
    let role = header(ROLE_HEADER)?
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Role>().map_err(ServiceError::BadRequest))
        .transpose()?
        .unwrap_or_default();

    Ok(Actor {
        user_id: Some(user_id),
        country_id,
        role,
    })
}

fn parse_body(body: &[u8]) -> Result<Value, ServiceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|err| ServiceError::bad_request(format!("invalid JSON body: {err}")))
}

fn input<T: DeserializeOwned>(value: Value) -> Result<T, ServiceError> {
    serde_json::from_value(value)
        .map_err(|err| ServiceError::bad_request(format!("invalid input: {err}")))
}

fn respond<T: Serialize>(result: Result<T, ServiceError>) -> Result<Response, ServiceError> {
    result.map(|result| Json(Success { result }).into_response())
}

/// Route one call to its procedure.
pub async fn dispatch(
    ctx: &Context,
    actor: &Actor,
    procedure: &str,
    body: Value,
) -> Result<Response, ServiceError> {
    match procedure {
        "diplomacy.update_relationship" => {
            respond(diplomacy::update_relationship(ctx, actor, input(body)?).await)
        }
        "diplomacy.establish_relation" => {
            respond(diplomacy::establish_relation(ctx, actor, input(body)?).await)
        }
        "diplomacy.list_relations" => respond(diplomacy::list_relations(ctx, input(body)?).await),
        "diplomacy.get_relation" => respond(diplomacy::get_relation(ctx, input(body)?).await),

        "embassy.establish_embassy" => {
            respond(embassy::establish_embassy(ctx, actor, input(body)?).await)
        }
        "embassy.get_embassy" => respond(embassy::get_embassy(ctx, input(body)?).await),
        "embassy.list_embassies" => respond(embassy::list_embassies(ctx, input(body)?).await),
        "embassy.allocate_budget" => {
            respond(embassy::allocate_budget(ctx, actor, input(body)?).await)
        }
        "embassy.activate_embassy" => {
            respond(embassy::activate_embassy(ctx, actor, input(body)?).await)
        }
        "embassy.upgrade_embassy" => {
            respond(embassy::upgrade_embassy(ctx, actor, input(body)?).await)
        }
        "embassy.set_specialization" => {
            respond(embassy::set_specialization(ctx, actor, input(body)?).await)
        }

        "mission.start_mission" => respond(mission::start_mission(ctx, actor, input(body)?).await),
        "mission.complete_mission" => {
            respond(mission::complete_mission(ctx, actor, input(body)?).await)
        }
        "mission.list_missions" => respond(mission::list_missions(ctx, input(body)?).await),

        "security.get_security_assessment" => {
            respond(security::get_security_assessment(ctx, input(body)?).await)
        }
        "security.update_stability" => {
            respond(security::update_stability(ctx, actor, input(body)?).await)
        }
        "security.list_threats" => respond(security::list_threats(ctx, input(body)?).await),
        "security.create_threat" => {
            respond(security::create_threat(ctx, actor, input(body)?).await)
        }
        "security.resolve_threat" => {
            respond(security::resolve_threat(ctx, actor, input(body)?).await)
        }
        "security.list_events" => respond(security::list_events(ctx, input(body)?).await),
        "security.generate_event" => {
            respond(security::generate_event(ctx, actor, input(body)?).await)
        }
        "security.resolve_event" => {
            respond(security::resolve_event(ctx, actor, input(body)?).await)
        }
        "security.create_military_branch" => {
            respond(security::create_military_branch(ctx, actor, input(body)?).await)
        }
        "security.update_military_readiness" => {
            respond(security::update_military_readiness(ctx, actor, input(body)?).await)
        }

        "intelligence.get_briefing" => {
            respond(intelligence::get_briefing(ctx, actor, input(body)?).await)
        }
        "intelligence.list_notifications" => {
            respond(intelligence::list_notifications(ctx, actor, input(body)?).await)
        }

        "crafting.craft_card" => respond(crafting::craft_card(ctx, actor, input(body)?).await),
        "crafting.list_recipes" => respond(crafting::list_recipes(ctx).await),
        "crafting.create_recipe" => {
            respond(crafting::create_recipe(ctx, actor, input(body)?).await)
        }
        "crafting.get_collector" => respond(crafting::get_collector(ctx, actor).await),
        "crafting.list_owned_cards" => respond(crafting::list_owned_cards(ctx, actor).await),
        "crafting.grant_credits" => {
            respond(crafting::grant_credits(ctx, actor, input(body)?).await)
        }
        "crafting.create_card" => respond(crafting::create_card(ctx, actor, input(body)?).await),
        "crafting.grant_card" => respond(crafting::grant_card(ctx, actor, input(body)?).await),

        "wiki.import_country" => {
            respond(wiki_import::import_country(ctx, actor, input(body)?).await)
        }
        "wiki.preview_import" => respond(wiki_import::preview_import(input(body)?)),

        other => Err(ServiceError::NotFound(format!("unknown procedure {other}"))),
    }
}
