mod common;

use nation_sim::Actor;
use nation_sim::audit::{AuditLog, PgAudit};
use nation_sim::db;
use nation_sim::model::Rarity;
use nation_sim::service::crafting::{
    self, CraftCard, CreateCard, CreateRecipe, GrantCard, GrantCredits,
};

async fn owned_cards(h: &common::Harness, user: &str, rarity: Rarity, count: usize) -> Vec<i64> {
    let admin = Actor::admin("root");
    let card = crafting::create_card(
        &h.ctx,
        &admin,
        CreateCard {
            name: format!("{rarity} material"),
            rarity,
            season: 1,
        },
    )
    .await
    .unwrap();
    let mut ids = Vec::new();
    for _ in 0..count {
        let instance = crafting::grant_card(
            &h.ctx,
            &admin,
            GrantCard {
                user_id: user.to_string(),
                card_id: card.id,
            },
        )
        .await
        .unwrap();
        ids.push(instance.id);
    }
    ids
}

#[tokio::test]
#[ignore]
async fn recipe_values_follow_result_rarity() {
    let h = common::setup().await;
    let recipe = crafting::create_recipe(
        &h.ctx,
        &Actor::admin("root"),
        CreateRecipe {
            name: "Epic fusion".to_string(),
            result_rarity: Rarity::Epic,
            required_rarity: Rarity::UltraRare,
            material_count: 3,
        },
    )
    .await
    .unwrap();
    assert_eq!(recipe.success_rate, 50);
    assert_eq!(recipe.ix_credits_cost, 2_500);
    assert_eq!(recipe.collector_xp_gain, 250);

    let listed = crafting::list_recipes(&h.ctx).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
#[ignore]
async fn insufficient_credits_leave_materials_untouched() {
    let h = common::setup().await;
    let user = Actor::user("collector-1", None);
    let recipe = crafting::create_recipe(
        &h.ctx,
        &Actor::admin("root"),
        CreateRecipe {
            name: "Rare upgrade".to_string(),
            result_rarity: Rarity::Rare,
            required_rarity: Rarity::Uncommon,
            material_count: 2,
        },
    )
    .await
    .unwrap();
    let materials = owned_cards(&h, "collector-1", Rarity::Uncommon, 2).await;

    let err = crafting::craft_card(
        &h.ctx,
        &user,
        CraftCard {
            recipe_id: recipe.id,
            material_ids: materials.clone(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "BAD_REQUEST");
    assert!(err.to_string().contains("insufficient IxCredits"));

    let owned = crafting::list_owned_cards(&h.ctx, &user).await.unwrap();
    assert_eq!(owned.len(), 2);
    let attempts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM crafting_attempts")
        .fetch_one(h.pool())
        .await
        .unwrap();
    assert_eq!(attempts, 0);
}

#[tokio::test]
#[ignore]
async fn successful_craft_consumes_and_mints() {
    let h = common::setup().await;
    let admin = Actor::admin("root");
    let user = Actor::user("collector-2", None);
    let recipe = crafting::create_recipe(
        &h.ctx,
        &admin,
        CreateRecipe {
            name: "Common merge".to_string(),
            result_rarity: Rarity::Common,
            required_rarity: Rarity::Common,
            material_count: 2,
        },
    )
    .await
    .unwrap();
    let materials = owned_cards(&h, "collector-2", Rarity::Common, 2).await;
    crafting::grant_credits(
        &h.ctx,
        &admin,
        GrantCredits {
            user_id: "collector-2".to_string(),
            amount: 150,
        },
    )
    .await
    .unwrap();

    let result = crafting::craft_card(
        &h.ctx,
        &user,
        CraftCard {
            recipe_id: recipe.id,
            material_ids: materials.clone(),
        },
    )
    .await
    .unwrap();
    assert!(result.success);
    assert_eq!(result.consumed, materials);
    assert_eq!(result.collector.ix_credits, 50);
    assert_eq!(result.progress.xp_gained, 10);
    let minted = result.card.unwrap();
    assert_eq!(minted.rarity, Rarity::Common);

    let owned = crafting::list_owned_cards(&h.ctx, &user).await.unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].id, minted.id);

    // Someone else's cards cannot be fused.
    let thief = crafting::craft_card(
        &h.ctx,
        &Actor::user("collector-3", None),
        CraftCard {
            recipe_id: recipe.id,
            material_ids: vec![minted.id, minted.id + 1000],
        },
    )
    .await
    .unwrap_err();
    assert_eq!(thief.to_string(), "materials not owned");
}

#[tokio::test]
#[ignore]
async fn rejected_crafts_are_audited() {
    let mut h = common::setup().await;
    h.ctx.audit = AuditLog::Postgres(PgAudit::new(h.pool().clone()));
    let user = Actor::user("collector-4", None);

    let err = crafting::craft_card(
        &h.ctx,
        &user,
        CraftCard {
            recipe_id: 999,
            material_ids: vec![1, 2],
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    let rows = db::audit::recent_for_action(h.pool(), "craft_card", 10)
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![("collector-4".to_string(), "recipe:999".to_string(), false)]
    );
}
