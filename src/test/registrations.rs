use axum::http::StatusCode;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use serde_json::{Value, json};

use crate::{
    schema::tournaments,
    test::{TestApp, WithToken, error_of},
};

async fn setup(app: &TestApp) -> i32 {
    let (_, admin) = app.admin().await;
    let arena = app.create_arena(&admin, "Arena").await;
    app.create_tournament(&admin, arena, json!({})).await
}

fn register_path(tournament: i32) -> String {
    format!("/api/registrations/{tournament}/register")
}

#[tokio::test]
async fn users_register_with_a_partner() {
    let app = TestApp::new().await;
    let tournament = setup(&app).await;
    let (ana, ana_token) = app.register("Ana", "ana@example.com").await;
    let (bia, _) = app.register("Bia", "bia@example.com").await;

    let res = app
        .server
        .post(&register_path(tournament))
        .token(&ana_token)
        .json(&json!({ "partnerId": bia }))
        .await;
    res.assert_status(StatusCode::CREATED);

    let body = res.json::<Value>();
    assert_eq!(body["tournamentId"], tournament);
    assert_eq!(body["userId"], ana);
    assert_eq!(body["partnerId"], bia);
    assert_eq!(body["user"]["fullName"], "Ana");
    assert_eq!(body["partner"]["email"], "bia@example.com");

    let res = app
        .server
        .get(&format!("/api/registrations/{tournament}"))
        .await;
    res.assert_status_ok();
    let list = res.json::<Value>();
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let res = app
        .server
        .get(&format!("/api/tournaments/{tournament}"))
        .await;
    assert_eq!(res.json::<Value>()["data"]["registrationCount"], 1);
}

#[tokio::test]
async fn solo_registration_needs_no_body() {
    let app = TestApp::new().await;
    let tournament = setup(&app).await;
    let (_, token) = app.register("Ana", "ana@example.com").await;

    let res = app
        .server
        .post(&register_path(tournament))
        .token(&token)
        .await;
    res.assert_status(StatusCode::CREATED);
    assert!(res.json::<Value>()["partner"].is_null());
}

#[tokio::test]
async fn malformed_partner_id_is_rejected() {
    let app = TestApp::new().await;
    let tournament = setup(&app).await;
    let (_, token) = app.register("Ana", "ana@example.com").await;
    let (bia, _) = app.register("Bia", "bia@example.com").await;

    let res = app
        .server
        .post(&register_path(tournament))
        .token(&token)
        .json(&json!({ "partnerId": "abc" }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&res.json::<Value>()), "Invalid partner id");

    let res = app
        .server
        .get(&format!("/api/registrations/{tournament}"))
        .await;
    assert_eq!(res.json::<Value>().as_array().map(Vec::len), Some(0));

    let res = app
        .server
        .post(&register_path(tournament))
        .token(&token)
        .json(&json!({ "partnerId": bia.to_string() }))
        .await;
    res.assert_status(StatusCode::CREATED);
    assert_eq!(res.json::<Value>()["partnerId"], bia);
}

#[tokio::test]
async fn registration_guards() {
    let app = TestApp::new().await;
    let tournament = setup(&app).await;
    let (ana, ana_token) = app.register("Ana", "ana@example.com").await;
    let (bia, bia_token) = app.register("Bia", "bia@example.com").await;
    let (_, caio_token) = app.register("Caio", "caio@example.com").await;

    let res = app
        .server
        .post(&register_path(tournament))
        .await;
    res.assert_status(StatusCode::UNAUTHORIZED);

    let res = app
        .server
        .post("/api/registrations/abc/register")
        .token(&ana_token)
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&res.json::<Value>()), "Invalid tournament id");

    let res = app
        .server
        .post(&register_path(9999))
        .token(&ana_token)
        .await;
    res.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_of(&res.json::<Value>()), "Tournament not found");

    let res = app
        .server
        .post(&register_path(tournament))
        .token(&ana_token)
        .json(&json!({ "partnerId": ana }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        error_of(&res.json::<Value>()),
        "Partner cannot be the same as the user"
    );

    let res = app
        .server
        .post(&register_path(tournament))
        .token(&ana_token)
        .json(&json!({ "partnerId": 777 }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&res.json::<Value>()), "Partner not found");

    app.server
        .post(&register_path(tournament))
        .token(&ana_token)
        .json(&json!({ "partnerId": bia }))
        .await
        .assert_status(StatusCode::CREATED);

    let res = app
        .server
        .post(&register_path(tournament))
        .token(&ana_token)
        .await;
    res.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        error_of(&res.json::<Value>()),
        "User already registered in this tournament"
    );

    // Bia takes part as Ana's partner.
    let res = app
        .server
        .post(&register_path(tournament))
        .token(&bia_token)
        .await;
    res.assert_status(StatusCode::CONFLICT);

    let res = app
        .server
        .post(&register_path(tournament))
        .token(&caio_token)
        .json(&json!({ "partnerId": bia }))
        .await;
    res.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        error_of(&res.json::<Value>()),
        "Partner already registered in this tournament"
    );
}

#[tokio::test]
async fn closed_tournaments_reject_registrations() {
    let app = TestApp::new().await;
    let (_, admin) = app.admin().await;
    let arena = app.create_arena(&admin, "Arena").await;
    let (_, token) = app.register("Ana", "ana@example.com").await;

    let scheduled = app
        .create_tournament(&admin, arena, json!({ "status": "SCHEDULED" }))
        .await;
    let res = app
        .server
        .post(&register_path(scheduled))
        .token(&token)
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        error_of(&res.json::<Value>()),
        "Tournament not open for registrations"
    );

    let late = app.create_tournament(&admin, arena, json!({})).await;
    let started = app.create_tournament(&admin, arena, json!({})).await;
    {
        let mut conn = app.pool.get().unwrap();
        let now = Utc::now().naive_utc();
        diesel::update(tournaments::table.filter(tournaments::id.eq(late)))
            .set(tournaments::registration_deadline.eq(Some(now - Duration::days(1))))
            .execute(&mut *conn)
            .unwrap();
        diesel::update(tournaments::table.filter(tournaments::id.eq(started)))
            .set(tournaments::start_date.eq(now - Duration::hours(2)))
            .execute(&mut *conn)
            .unwrap();
    }

    let res = app.server.post(&register_path(late)).token(&token).await;
    res.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        error_of(&res.json::<Value>()),
        "Registration deadline has passed"
    );

    let res = app.server.post(&register_path(started)).token(&token).await;
    res.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&res.json::<Value>()), "Tournament already started");
}

#[tokio::test]
async fn users_unregister_and_see_their_tournaments() {
    let app = TestApp::new().await;
    let tournament = setup(&app).await;
    let (_, ana_token) = app.register("Ana", "ana@example.com").await;
    let (bia, bia_token) = app.register("Bia", "bia@example.com").await;

    app.server
        .post(&register_path(tournament))
        .token(&ana_token)
        .json(&json!({ "partnerId": bia }))
        .await
        .assert_status(StatusCode::CREATED);

    // Partners see the tournament too.
    let res = app.server.get("/api/tournaments/my").token(&bia_token).await;
    res.assert_status_ok();
    assert_eq!(res.json::<Value>()["data"][0]["id"], tournament);

    // Only the registrant can withdraw the pair.
    let res = app
        .server
        .delete(&format!("/api/registrations/{tournament}/unregister"))
        .token(&bia_token)
        .await;
    res.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_of(&res.json::<Value>()), "Registration not found");

    let res = app
        .server
        .delete(&format!("/api/registrations/{tournament}/unregister"))
        .token(&ana_token)
        .await;
    res.assert_status_ok();
    assert_eq!(
        res.json::<Value>()["message"],
        "User unregistered successfully"
    );

    let res = app.server.get("/api/tournaments/my").token(&ana_token).await;
    assert_eq!(res.json::<Value>()["data"], json!([]));
}

#[tokio::test]
async fn listing_registrations_of_missing_tournament_is_404() {
    let app = TestApp::new().await;

    let res = app.server.get("/api/registrations/31").await;
    res.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_of(&res.json::<Value>()), "Tournament not found");
}
