mod common;

use nation_sim::Actor;
use nation_sim::model::{
    EmbassyStatus, MissionDifficulty, MissionStatus, MissionType, Specialization, UpgradeType,
};
use nation_sim::service::diplomacy::{self, EstablishRelation};
use nation_sim::service::embassy::{
    self, AllocateBudget, EmbassyQuery, EstablishEmbassy, SetSpecialization, UpgradeEmbassy,
};
use nation_sim::service::mission::{self, CompleteMission, ListMissions, StartMission};

/// Close allies get an embassy that is active on creation.
async fn active_embassy(h: &common::Harness, guest_actor: &Actor, host: i64, guest: i64) -> i64 {
    diplomacy::establish_relation(
        &h.ctx,
        &Actor::admin("root"),
        EstablishRelation {
            country_a: host,
            country_b: guest,
            strength: Some(85.0),
        },
    )
    .await
    .unwrap();
    let established = embassy::establish_embassy(
        &h.ctx,
        guest_actor,
        EstablishEmbassy {
            host_country_id: host,
            guest_country_id: guest,
            name: "Mission House".to_string(),
            tier: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(established.embassy.status, EmbassyStatus::Active);
    assert_eq!(established.quote.total_cost, 50_000);
    established.embassy.id
}

#[tokio::test]
#[ignore]
async fn completed_mission_caps_influence_and_levels_up() {
    let h = common::setup().await;
    let host = common::country(h.pool(), "Faneria", 60.0, 60.0).await;
    let guest = common::country(h.pool(), "Alstin", 60.0, 60.0).await;
    let guest_actor = Actor::user("u-alstin", Some(guest));
    let embassy_id = active_embassy(&h, &guest_actor, host, guest).await;

    embassy::allocate_budget(
        &h.ctx,
        &guest_actor,
        AllocateBudget {
            embassy_id,
            amount: 40_000,
        },
    )
    .await
    .unwrap();
    let upgraded = embassy::upgrade_embassy(
        &h.ctx,
        &guest_actor,
        UpgradeEmbassy {
            embassy_id,
            upgrade_type: UpgradeType::StaffExpansion,
        },
    )
    .await
    .unwrap();
    assert_eq!(upgraded.embassy.staff_count, 2);
    assert_eq!(upgraded.embassy.budget, 25_000);
    assert_eq!(upgraded.upgrade.level, 1);

    let started = mission::start_mission(
        &h.ctx,
        &guest_actor,
        StartMission {
            embassy_id,
            mission_type: MissionType::CrisisManagement,
            difficulty: MissionDifficulty::Medium,
            staff_assigned: 2,
        },
    )
    .await
    .unwrap();
    assert_eq!(started.embassy.budget, 13_000);
    assert_eq!(started.mission.status, MissionStatus::Active);
    assert!(started.mission.success_chance >= 50.0);

    // Not due yet, and only admins may force.
    let early = mission::complete_mission(
        &h.ctx,
        &guest_actor,
        CompleteMission {
            mission_id: started.mission.id,
            force: false,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(early.code(), "BAD_REQUEST");
    let forced = mission::complete_mission(
        &h.ctx,
        &guest_actor,
        CompleteMission {
            mission_id: started.mission.id,
            force: true,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(forced.code(), "FORBIDDEN");

    sqlx::query("UPDATE embassies SET influence = 96, experience = 900 WHERE id = $1")
        .bind(embassy_id)
        .execute(h.pool())
        .await
        .unwrap();

    let outcome = mission::complete_mission(
        &h.ctx,
        &Actor::admin("root"),
        CompleteMission {
            mission_id: started.mission.id,
            force: true,
        },
    )
    .await
    .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.rewards.experience, 200);
    assert_eq!(outcome.embassy.influence, 100);
    assert_eq!(outcome.embassy.reputation, 58);
    assert!(outcome.leveled_up);
    assert_eq!(outcome.embassy.level, 2);
    assert_eq!(outcome.embassy.experience, 100);
    assert_eq!(outcome.mission.status, MissionStatus::Completed);

    let again = mission::complete_mission(
        &h.ctx,
        &Actor::admin("root"),
        CompleteMission {
            mission_id: started.mission.id,
            force: true,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(again.code(), "BAD_REQUEST");

    let completed = mission::list_missions(
        &h.ctx,
        ListMissions {
            embassy_id,
            status: Some(MissionStatus::Completed),
        },
    )
    .await
    .unwrap();
    assert_eq!(completed.len(), 1);
}

#[tokio::test]
#[ignore]
async fn mission_needs_budget_and_staff() {
    let h = common::setup().await;
    let host = common::country(h.pool(), "Gallovia", 60.0, 60.0).await;
    let guest = common::country(h.pool(), "Corumm", 60.0, 60.0).await;
    let guest_actor = Actor::user("u-corumm", Some(guest));
    let embassy_id = active_embassy(&h, &guest_actor, host, guest).await;

    let broke = mission::start_mission(
        &h.ctx,
        &guest_actor,
        StartMission {
            embassy_id,
            mission_type: MissionType::TradeNegotiation,
            difficulty: MissionDifficulty::Easy,
            staff_assigned: 1,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(broke.code(), "BAD_REQUEST");

    embassy::allocate_budget(
        &h.ctx,
        &guest_actor,
        AllocateBudget {
            embassy_id,
            amount: 10_000,
        },
    )
    .await
    .unwrap();
    let overstaffed = mission::start_mission(
        &h.ctx,
        &guest_actor,
        StartMission {
            embassy_id,
            mission_type: MissionType::TradeNegotiation,
            difficulty: MissionDifficulty::Easy,
            staff_assigned: 3,
        },
    )
    .await
    .unwrap_err();
    assert!(overstaffed.to_string().contains("staff"));

    let stranger = mission::start_mission(
        &h.ctx,
        &Actor::user("u-other", Some(host)),
        StartMission {
            embassy_id,
            mission_type: MissionType::TradeNegotiation,
            difficulty: MissionDifficulty::Easy,
            staff_assigned: 1,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(stranger.code(), "FORBIDDEN");
}

#[tokio::test]
#[ignore]
async fn failed_mission_pays_thirty_percent() {
    let h = common::setup().await;
    let host = common::country(h.pool(), "Kiravia", 60.0, 60.0).await;
    let guest = common::country(h.pool(), "Ixnay", 60.0, 60.0).await;
    let guest_actor = Actor::user("u-ixnay", Some(guest));
    let embassy_id = active_embassy(&h, &guest_actor, host, guest).await;
    embassy::allocate_budget(
        &h.ctx,
        &guest_actor,
        AllocateBudget {
            embassy_id,
            amount: 5_000,
        },
    )
    .await
    .unwrap();

    // Expert difficulty at level 1 with one staff: 60 - 25 = 35%.
    let started = mission::start_mission(
        &h.ctx,
        &guest_actor,
        StartMission {
            embassy_id,
            mission_type: MissionType::TradeNegotiation,
            difficulty: MissionDifficulty::Expert,
            staff_assigned: 1,
        },
    )
    .await
    .unwrap();
    assert_eq!(started.mission.success_chance, 35.0);
    assert_eq!(started.embassy.budget, 0);

    let outcome = mission::complete_mission(
        &h.ctx,
        &Actor::admin("root"),
        CompleteMission {
            mission_id: started.mission.id,
            force: true,
        },
    )
    .await
    .unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.mission.status, MissionStatus::Failed);
    // Expert trade rewards are 200 / 10 / 6 / 40000, floored to 30%.
    assert_eq!(outcome.rewards.experience, 60);
    assert_eq!(outcome.rewards.influence, 3);
    assert_eq!(outcome.rewards.reputation, 1);
    assert_eq!(outcome.rewards.budget, 12_000);
    assert_eq!(outcome.embassy.experience, 60);
    assert_eq!(outcome.embassy.influence, 13);
    assert_eq!(outcome.embassy.reputation, 51);
    assert_eq!(outcome.embassy.budget, 12_000);
    assert!(!outcome.leveled_up);

    let failed = mission::list_missions(
        &h.ctx,
        ListMissions {
            embassy_id,
            status: Some(MissionStatus::Failed),
        },
    )
    .await
    .unwrap();
    assert_eq!(failed.len(), 1);
}

#[tokio::test]
#[ignore]
async fn host_owner_activates_pending_embassy() {
    let mut h = common::setup().await;
    let host = common::country(h.pool(), "Burgundie", 60.0, 60.0).await;
    let guest = common::country(h.pool(), "Cartadania", 60.0, 60.0).await;
    let host_actor = Actor::user("u-burgundie", Some(host));
    let guest_actor = Actor::user("u-cartadania", Some(guest));
    diplomacy::establish_relation(
        &h.ctx,
        &Actor::admin("root"),
        EstablishRelation {
            country_a: host,
            country_b: guest,
            strength: Some(20.0),
        },
    )
    .await
    .unwrap();
    let established = embassy::establish_embassy(
        &h.ctx,
        &guest_actor,
        EstablishEmbassy {
            host_country_id: host,
            guest_country_id: guest,
            name: "Cartadanian Legation".to_string(),
            tier: None,
        },
    )
    .await
    .unwrap();
    let embassy_id = established.embassy.id;
    assert_eq!(established.embassy.status, EmbassyStatus::Pending);
    h.drain_notifications();

    // The guest cannot approve its own embassy.
    let err = embassy::activate_embassy(&h.ctx, &guest_actor, EmbassyQuery { embassy_id })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");

    let activated = embassy::activate_embassy(&h.ctx, &host_actor, EmbassyQuery { embassy_id })
        .await
        .unwrap();
    assert_eq!(activated.status, EmbassyStatus::Active);
    let notices = h.drain_notifications();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Cartadanian Legation is now active");

    let again = embassy::activate_embassy(&h.ctx, &Actor::admin("root"), EmbassyQuery { embassy_id })
        .await
        .unwrap_err();
    assert_eq!(again.code(), "BAD_REQUEST");

    let stored = embassy::get_embassy(&h.ctx, EmbassyQuery { embassy_id })
        .await
        .unwrap();
    assert_eq!(stored.embassy.status, EmbassyStatus::Active);
}

#[tokio::test]
#[ignore]
async fn changing_specialization_restarts_training() {
    let h = common::setup().await;
    let host = common::country(h.pool(), "Urcea", 60.0, 60.0).await;
    let guest = common::country(h.pool(), "Pelaxia", 60.0, 60.0).await;
    let guest_actor = Actor::user("u-pelaxia", Some(guest));
    let embassy_id = active_embassy(&h, &guest_actor, host, guest).await;

    let set = |specialization| SetSpecialization {
        embassy_id,
        specialization,
    };
    let trade = embassy::set_specialization(&h.ctx, &guest_actor, set(Specialization::Trade))
        .await
        .unwrap();
    assert_eq!(trade.specialization, Some(Specialization::Trade));
    assert_eq!(trade.specialization_level, 0);

    sqlx::query("UPDATE embassies SET specialization_level = 3 WHERE id = $1")
        .bind(embassy_id)
        .execute(h.pool())
        .await
        .unwrap();

    let same = embassy::set_specialization(&h.ctx, &guest_actor, set(Specialization::Trade))
        .await
        .unwrap();
    assert_eq!(same.specialization_level, 3);

    let changed = embassy::set_specialization(&h.ctx, &guest_actor, set(Specialization::Cultural))
        .await
        .unwrap();
    assert_eq!(changed.specialization, Some(Specialization::Cultural));
    assert_eq!(changed.specialization_level, 0);

    let outsider = embassy::set_specialization(
        &h.ctx,
        &Actor::user("u-urcea", Some(host)),
        set(Specialization::Security),
    )
    .await
    .unwrap_err();
    assert_eq!(outsider.code(), "FORBIDDEN");
}
