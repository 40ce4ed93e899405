use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::test::{TestApp, WithToken, days_from_now, error_of};

struct Fixture {
    admin: String,
    arena: i32,
    tournament: i32,
    players: Vec<i32>,
}

async fn setup(app: &TestApp) -> Fixture {
    let (_, admin) = app.admin().await;
    let arena = app.create_arena(&admin, "Arena").await;
    let tournament = app.create_tournament(&admin, arena, json!({})).await;

    let mut players = Vec::new();
    for name in ["Ana", "Bia", "Caio", "Duda"] {
        let email = format!("{}@example.com", name.to_lowercase());
        players.push(app.register(name, &email).await.0);
    }

    Fixture {
        admin,
        arena,
        tournament,
        players,
    }
}

#[tokio::test]
async fn admins_create_matches_with_rosters() {
    let app = TestApp::new().await;
    let f = setup(&app).await;

    let res = app
        .server
        .post("/api/matches")
        .token(&f.admin)
        .json(&json!({
            "arenaId": f.arena,
            "tournamentId": f.tournament,
            "matchDate": days_from_now(11),
            "players": [
                { "userId": f.players[0], "team": 1 },
                { "userId": f.players[1], "team": 1 },
                { "userId": f.players[2], "team": 2 },
                { "userId": f.players[3], "team": 2 },
            ],
        }))
        .await;
    res.assert_status(StatusCode::CREATED);

    let data = res.json::<Value>()["data"].clone();
    assert_eq!(data["status"], "SCHEDULED");
    assert_eq!(data["tournamentId"], f.tournament);
    assert_eq!(data["players"].as_array().map(Vec::len), Some(4));
    assert_eq!(data["players"][0]["fullName"], "Ana");
    assert_eq!(data["players"][3]["team"], 2);

    let id = data["id"].as_i64().unwrap();
    let res = app.server.get(&format!("/api/matches/{id}")).await;
    res.assert_status_ok();
    assert_eq!(res.json::<Value>()["data"]["players"][2]["fullName"], "Caio");

    let res = app
        .server
        .get(&format!("/api/matches/tournament/{}", f.tournament))
        .await;
    res.assert_status_ok();
    assert_eq!(res.json::<Value>()["count"], 1);
}

#[tokio::test]
async fn match_creation_is_validated() {
    let app = TestApp::new().await;
    let f = setup(&app).await;
    let (_, user) = app.register("Eva", "eva@example.com").await;

    let res = app
        .server
        .post("/api/matches")
        .token(&user)
        .json(&json!({ "arenaId": f.arena, "matchDate": days_from_now(1) }))
        .await;
    res.assert_status(StatusCode::FORBIDDEN);

    let res = app
        .server
        .post("/api/matches")
        .token(&f.admin)
        .json(&json!({ "arenaId": f.arena, "matchDate": "someday" }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        error_of(&res.json::<Value>()),
        "Invalid arenaId or matchDate"
    );

    let res = app
        .server
        .post("/api/matches")
        .token(&f.admin)
        .json(&json!({
            "arenaId": f.arena,
            "matchDate": days_from_now(1),
            "winnerTeamId": 3,
        }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&res.json::<Value>()), "Invalid winnerTeamId");

    let res = app
        .server
        .post("/api/matches")
        .token(&f.admin)
        .json(&json!({ "arenaId": 999, "matchDate": days_from_now(1) }))
        .await;
    res.assert_status(StatusCode::NOT_FOUND);

    let res = app
        .server
        .post("/api/matches")
        .token(&f.admin)
        .json(&json!({
            "arenaId": f.arena,
            "matchDate": days_from_now(1),
            "players": [{ "userId": 12345, "team": 1 }],
        }))
        .await;
    res.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_of(&res.json::<Value>()), "Player not found");

    let res = app
        .server
        .post("/api/matches")
        .token(&f.admin)
        .json(&json!({
            "arenaId": f.arena,
            "matchDate": days_from_now(1),
            "players": [
                { "userId": f.players[0], "team": 1 },
                { "userId": f.players[0], "team": 2 },
            ],
        }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);

    // Failed requests leave nothing behind.
    let res = app.server.get("/api/matches").await;
    assert_eq!(res.json::<Value>()["count"], 0);
}

#[tokio::test]
async fn matches_are_updated_and_deleted() {
    let app = TestApp::new().await;
    let f = setup(&app).await;

    let res = app
        .server
        .post("/api/matches")
        .token(&f.admin)
        .json(&json!({
            "arenaId": f.arena,
            "tournamentId": f.tournament,
            "matchDate": days_from_now(2),
            "players": [
                { "userId": f.players[0], "team": 1 },
                { "userId": f.players[1], "team": 2 },
            ],
        }))
        .await;
    let id = res.json::<Value>()["data"]["id"].as_i64().unwrap();

    let res = app
        .server
        .put(&format!("/api/matches/{id}"))
        .token(&f.admin)
        .json(&json!({
            "status": "FINISHED",
            "scoreResult": "6-4 7-5",
            "winnerTeamId": 2,
            "tournamentId": null,
        }))
        .await;
    res.assert_status_ok();
    let data = res.json::<Value>()["data"].clone();
    assert_eq!(data["status"], "FINISHED");
    assert_eq!(data["winnerTeamId"], 2);
    assert!(data["tournamentId"].is_null());
    assert_eq!(data["players"].as_array().map(Vec::len), Some(2));

    let res = app
        .server
        .put(&format!("/api/matches/{id}"))
        .token(&f.admin)
        .json(&json!({
            "players": [
                { "userId": f.players[2], "team": 1 },
                { "userId": f.players[3], "team": 2 },
            ],
        }))
        .await;
    res.assert_status_ok();
    let data = res.json::<Value>()["data"].clone();
    assert_eq!(data["players"][0]["fullName"], "Caio");
    assert_eq!(data["scoreResult"], "6-4 7-5");

    let res = app
        .server
        .put("/api/matches/9999")
        .token(&f.admin)
        .json(&json!({ "status": "CANCELLED" }))
        .await;
    res.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_of(&res.json::<Value>()), "Match not found");

    let res = app
        .server
        .delete(&format!("/api/matches/{id}"))
        .token(&f.admin)
        .await;
    res.assert_status_ok();
    assert_eq!(res.json::<Value>()["message"], "Match deleted successfully");

    let res = app.server.get(&format!("/api/matches/{id}")).await;
    res.assert_status(StatusCode::NOT_FOUND);

    let res = app.server.get("/api/matches/abc").await;
    res.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&res.json::<Value>()), "Invalid match id");
}
