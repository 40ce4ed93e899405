use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
    time::Duration,
};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use diesel::{
    SqliteConnection,
    connection::{AnsiTransactionManager, SimpleConnection, TransactionManager},
    r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection},
};
use tokio::sync::{Mutex, OnceCell, OwnedMutexGuard};

use crate::{auth::token::TokenKeys, util_resp::FailureResponse};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type PooledConn = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: DbPool,
    pub tokens: TokenKeys,
}

/// Applied to every connection handed out by the pool. SQLite does not
/// enforce foreign keys unless asked to, per connection.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionOptions {
    pub busy_timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for ConnectionOptions
{
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout.as_millis()
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

struct RequestConn {
    conn: PooledConn,
    in_tx: bool,
}

/// Holds the connection checked out for the current request (if any).
///
/// [`tx_commit`] installs an empty slot into the request extensions; the
/// first [`Conn`] extractor fills it, and once the handler has produced a
/// response the middleware commits or rolls back the open transaction.
#[derive(Clone, Default)]
pub struct ConnSlot {
    inner: Arc<OnceCell<Arc<Mutex<RequestConn>>>>,
}

/// This middleware commits opened transactions, after each request has been
/// handled.
pub async fn tx_commit(mut request: Request, next: Next) -> Response {
    let slot = ConnSlot::default();
    request.extensions_mut().insert(slot.clone());

    let response = next.run(request).await;

    if let Some(shared) = slot.inner.get() {
        let mut held = shared.lock().await;
        if held.in_tx {
            let ok = response.status().is_success()
                || response.status().is_redirection()
                || response.status().is_informational();

            let outcome = if ok {
                <SqliteConnection as diesel::Connection>::TransactionManager::commit_transaction(&mut *held.conn)
            } else {
                <SqliteConnection as diesel::Connection>::TransactionManager::rollback_transaction(&mut *held.conn)
            };

            match outcome {
                Ok(()) => held.in_tx = false,
                Err(e) => {
                    tracing::error!("failed to finish request transaction: {e}");
                }
            }
        }
    }

    response
}

/// A pooled connection, exclusive to the handler for the rest of the request.
///
/// `Conn<true>` wraps all work of the request in a single transaction, which
/// is committed only if the response is successful. The transaction is
/// opened with `BEGIN IMMEDIATE` so concurrent writers queue on
/// `busy_timeout` instead of failing when a read lock is upgraded.
pub struct Conn<const TX: bool> {
    inner: OwnedMutexGuard<RequestConn>,
}

impl<const TX: bool> Deref for Conn<TX> {
    type Target = PooledConn;

    fn deref(&self) -> &Self::Target {
        &self.inner.conn
    }
}

impl<const TX: bool> DerefMut for Conn<TX> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner.conn
    }
}

#[async_trait]
impl<S, const TX: bool> FromRequestParts<S> for Conn<TX>
where
    S: Send + Sync,
    DbPool: FromRef<S>,
{
    type Rejection = FailureResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let slot = parts.extensions.get::<ConnSlot>().cloned().ok_or_else(
            || {
                tracing::error!("request reached a handler without tx_commit");
                FailureResponse::ServerError("Database unavailable".to_string())
            },
        )?;

        let pool = DbPool::from_ref(state);
        let shared = slot
            .inner
            .get_or_try_init(|| async move {
                let conn = tokio::task::spawn_blocking(move || pool.get())
                    .await
                    .map_err(|e| {
                        tracing::error!("connection task failed: {e}");
                        FailureResponse::ServerError(
                            "Database unavailable".to_string(),
                        )
                    })?
                    .map_err(|e| {
                        tracing::error!("could not check out connection: {e}");
                        FailureResponse::ServerError(
                            "Database unavailable".to_string(),
                        )
                    })?;

                Ok::<_, FailureResponse>(Arc::new(Mutex::new(RequestConn {
                    conn,
                    in_tx: false,
                })))
            })
            .await?
            .clone();

        let mut inner = shared.try_lock_owned().map_err(|_| {
            FailureResponse::ServerError("Connection already in use".to_string())
        })?;

        if TX && !inner.in_tx {
            AnsiTransactionManager::begin_transaction_sql(
                &mut *inner.conn,
                "BEGIN IMMEDIATE",
            )
            .map_err(FailureResponse::from)?;
            inner.in_tx = true;
        }

        Ok(Conn { inner })
    }
}
