//! End-to-end tests which drive the router over an in-memory database.

use axum::http::{HeaderName, HeaderValue, StatusCode, header::AUTHORIZATION};
use axum_test::{TestRequest, TestServer};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use serde_json::{Value, json};

use crate::{
    config::{Settings, create_app, make_pool, run_migrations},
    enums::Role,
    schema::users,
    state::DbPool,
};

mod matches;
mod registrations;

pub const PASSWORD: &str = "areia123";

pub struct TestApp {
    pub server: TestServer,
    pub pool: DbPool,
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

pub trait WithToken {
    fn token(self, token: &str) -> Self;
}

impl WithToken for TestRequest {
    fn token(self, token: &str) -> Self {
        let (name, value) = bearer(token);
        self.add_header(name, value)
    }
}

/// An RFC 3339 timestamp `days` from now.
pub fn days_from_now(days: i64) -> String {
    (Utc::now() + Duration::days(days)).to_rfc3339()
}

impl TestApp {
    pub async fn new() -> TestApp {
        let pool = make_pool(":memory:", 1).unwrap();
        run_migrations(&pool).await.unwrap();

        let settings = Settings {
            jwt_secret: "test-secret".to_string(),
            ..Settings::default()
        };
        let server = TestServer::new(create_app(pool.clone(), &settings)).unwrap();

        TestApp { server, pool }
    }

    /// Registers a user, returning `(id, token)`.
    pub async fn register(&self, full_name: &str, email: &str) -> (i32, String) {
        let res = self
            .server
            .post("/api/auth/register")
            .json(&json!({
                "fullName": full_name,
                "email": email,
                "password": PASSWORD,
            }))
            .await;
        res.assert_status(StatusCode::CREATED);

        let body = res.json::<Value>();
        (
            body["user"]["id"].as_i64().unwrap() as i32,
            body["token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn login(&self, email: &str) -> String {
        let res = self
            .server
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": PASSWORD }))
            .await;
        res.assert_status_ok();
        res.json::<Value>()["token"].as_str().unwrap().to_string()
    }

    pub fn set_role(&self, id: i32, role: Role) {
        let mut conn = self.pool.get().unwrap();
        diesel::update(users::table.filter(users::id.eq(id)))
            .set(users::role.eq(role))
            .execute(&mut *conn)
            .unwrap();
    }

    /// Registers an admin and returns a token carrying the admin role.
    pub async fn admin(&self) -> (i32, String) {
        let (id, _) = self.register("Admin", "admin@example.com").await;
        self.set_role(id, Role::Admin);
        (id, self.login("admin@example.com").await)
    }

    pub async fn create_arena(&self, admin_token: &str, name: &str) -> i32 {
        let res = self
            .server
            .post("/api/arenas")
            .token(admin_token)
            .json(&json!({ "name": name, "city": "Ubatuba" }))
            .await;
        res.assert_status(StatusCode::CREATED);
        res.json::<Value>()["data"]["id"].as_i64().unwrap() as i32
    }

    /// Creates an open tournament starting in ten days.
    pub async fn create_tournament(
        &self,
        admin_token: &str,
        arena_id: i32,
        extra: Value,
    ) -> i32 {
        let mut body = json!({
            "name": "Copa Verão",
            "arenaId": arena_id,
            "startDate": days_from_now(10),
        });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }

        let res = self
            .server
            .post("/api/tournaments")
            .token(admin_token)
            .json(&body)
            .await;
        res.assert_status(StatusCode::CREATED);
        res.json::<Value>()["data"]["id"].as_i64().unwrap() as i32
    }
}

pub fn error_of(body: &Value) -> &str {
    body["error"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn health_check_responds() {
    let app = TestApp::new().await;

    let res = app.server.get("/health").await;
    res.assert_status_ok();
    res.assert_json(&json!({ "message": "Beach Tennis API is running" }));
}
