use std::path::{Path, PathBuf};

use axum::{
    Router,
    middleware::from_fn,
    routing::{delete, get, post},
};
use diesel::{
    SqliteConnection,
    r2d2::{ConnectionManager, Pool, PoolError},
};
use diesel_migrations::MigrationHarness;
use serde::Deserialize;
use tokio::task::spawn_blocking;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::{
    MIGRATIONS,
    arenas::{
        manage::{create_arena, delete_arena},
        view::{get_arena, list_arenas},
    },
    auth::{login::do_login, me, register::do_register, token::TokenKeys},
    matches::{
        create::create_match,
        manage::{delete_match, update_match},
        view::{get_match, list_matches, tournament_matches},
    },
    posts::{
        create::{create_post, delete_post},
        view::list_posts,
    },
    state::{AppState, ConnectionOptions, DbPool, tx_commit},
    tournaments::{
        create::create_tournament,
        manage::{delete_tournament, update_tournament},
        registrations::{
            register::{register, unregister},
            view::list_registrations,
        },
        view::{get_tournament, list_tournaments, my_tournaments},
    },
    users::{
        manage::{create_user, delete_user, update_user},
        view::{get_user, get_user_by_email, list_users},
    },
    util_resp::{StandardResponse, message},
};

/// Only suitable for local development.
pub const DEV_JWT_SECRET: &str = "courtside-dev-secret-change-me";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_days: u32,
    pub pool_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "0.0.0.0".to_string(),
            port: 3002,
            database_url: "courtside.db".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_days: 7,
            pool_size: 10,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },
}

impl Settings {
    /// Reads `path` (if given) and then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        let mut settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| {
                    ConfigError::Read {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                toml::from_str(&raw)?
            }
            None => Settings::default(),
        };

        settings.apply_env(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    pub fn apply_env(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = var("HOST") {
            self.host = host;
        }
        if let Some(port) = var("PORT") {
            self.port = port.parse().map_err(|_| ConfigError::Env {
                name: "PORT",
                value: port,
            })?;
        }
        if let Some(url) = var("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(secret) = var("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(days) = var("TOKEN_TTL_DAYS") {
            self.token_ttl_days = days.parse().map_err(|_| ConfigError::Env {
                name: "TOKEN_TTL_DAYS",
                value: days,
            })?;
        }
        Ok(())
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn token_keys(&self) -> TokenKeys {
        TokenKeys::new(&self.jwt_secret, self.token_ttl_days)
    }
}

/// An in-memory database lives and dies with its connection, so it gets a
/// pool of exactly one.
pub fn make_pool(url: &str, size: u32) -> Result<DbPool, PoolError> {
    let size = if url == ":memory:" { 1 } else { size.max(1) };

    Pool::builder()
        .max_size(size)
        .connection_customizer(Box::new(ConnectionOptions::default()))
        .build(ConnectionManager::<SqliteConnection>::new(url))
}

pub async fn run_migrations(
    pool: &DbPool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let pool = pool.clone();

    spawn_blocking(move || {
        let mut conn = pool.get()?;
        let applied = conn.run_pending_migrations(MIGRATIONS)?;
        for version in applied {
            tracing::info!("applied migration {version}");
        }
        Ok::<_, Box<dyn std::error::Error + Send + Sync>>(())
    })
    .await?
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("courtside=info,tower_http=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub async fn health() -> StandardResponse {
    message("Beach Tennis API is running")
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(do_register))
        .route("/auth/login", post(do_login))
        .route("/auth/me", get(me))
        .route("/users", get(list_users).post(create_user))
        .route("/users/email/:email", get(get_user_by_email))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/arenas", get(list_arenas).post(create_arena))
        .route("/arenas/:id", get(get_arena).delete(delete_arena))
        .route("/tournaments", get(list_tournaments).post(create_tournament))
        .route("/tournaments/my", get(my_tournaments))
        .route(
            "/tournaments/:id",
            get(get_tournament)
                .put(update_tournament)
                .delete(delete_tournament),
        )
        .route(
            "/registrations/:tournament_id/register",
            post(register),
        )
        .route(
            "/registrations/:tournament_id/unregister",
            delete(unregister),
        )
        .route("/registrations/:tournament_id", get(list_registrations))
        .route("/matches", get(list_matches).post(create_match))
        .route(
            "/matches/tournament/:tournament_id",
            get(tournament_matches),
        )
        .route(
            "/matches/:id",
            get(get_match).put(update_match).delete(delete_match),
        )
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", delete(delete_post))
}

pub fn create_app(pool: DbPool, settings: &Settings) -> Router {
    let state = AppState {
        pool,
        tokens: settings.token_keys(),
    };

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .layer(from_fn(tx_commit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn env_overrides_defaults() {
        let env: HashMap<&str, &str> =
            [("PORT", "8080"), ("JWT_SECRET", "s3cret"), ("TOKEN_TTL_DAYS", "1")]
                .into_iter()
                .collect();

        let mut settings = Settings::default();
        settings
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.port, 8080);
        assert_eq!(settings.jwt_secret, "s3cret");
        assert_eq!(settings.token_ttl_days, 1);
        assert_eq!(settings.database_url, "courtside.db");
        assert!(!settings.uses_dev_secret());
    }

    #[test]
    fn bad_port_is_reported() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(|k| (k == "PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings: Settings =
            toml::from_str("port = 4000\ndatabase_url = \":memory:\"").unwrap();
        assert_eq!(settings.port, 4000);
        assert_eq!(settings.database_url, ":memory:");
        assert_eq!(settings.token_ttl_days, 7);
        assert!(settings.uses_dev_secret());
    }
}
