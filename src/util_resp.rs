use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;
use serde_json::{Value, json};

pub fn success<T: Serialize>(body: T) -> StandardResponse {
    Ok(SuccessResponse::Ok(to_value(body)?))
}

pub fn created<T: Serialize>(body: T) -> StandardResponse {
    Ok(SuccessResponse::Created(to_value(body)?))
}

/// Wraps `body` in the `{"data": ...}` envelope used by most endpoints.
pub fn data<T: Serialize>(body: T) -> StandardResponse {
    success(json!({ "data": to_value(body)? }))
}

pub fn created_data<T: Serialize>(body: T) -> StandardResponse {
    created(json!({ "data": to_value(body)? }))
}

/// Wraps a list in the `{"data": [...], "count": n}` envelope.
pub fn data_with_count<T: Serialize>(items: Vec<T>) -> StandardResponse {
    let count = items.len();
    success(json!({ "data": to_value(items)?, "count": count }))
}

pub fn message(msg: &str) -> StandardResponse {
    success(json!({ "message": msg }))
}

pub fn bad_request(msg: impl Into<String>) -> StandardResponse {
    Err(FailureResponse::BadRequest(msg.into()))
}

pub fn err_not_found(msg: impl Into<String>) -> StandardResponse {
    Err(FailureResponse::NotFound(msg.into()))
}

fn to_value<T: Serialize>(body: T) -> Result<Value, FailureResponse> {
    serde_json::to_value(body).map_err(|e| {
        tracing::error!("failed to serialize response: {e}");
        FailureResponse::ServerError("Failed to encode response".to_string())
    })
}

pub type StandardResponse = Result<SuccessResponse, FailureResponse>;

#[derive(Debug)]
pub enum SuccessResponse {
    Ok(Value),
    Created(Value),
}

impl IntoResponse for SuccessResponse {
    fn into_response(self) -> Response {
        match self {
            SuccessResponse::Ok(v) => (StatusCode::OK, Json(v)).into_response(),
            SuccessResponse::Created(v) => {
                (StatusCode::CREATED, Json(v)).into_response()
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FailureResponse {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    ServerError(String),
}

impl FailureResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            FailureResponse::BadRequest(_) => StatusCode::BAD_REQUEST,
            FailureResponse::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            FailureResponse::Forbidden(_) => StatusCode::FORBIDDEN,
            FailureResponse::NotFound(_) => StatusCode::NOT_FOUND,
            FailureResponse::Conflict(_) => StatusCode::CONFLICT,
            FailureResponse::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            FailureResponse::ServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for FailureResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<DieselError> for FailureResponse {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => {
                FailureResponse::NotFound("Not found".to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                tracing::debug!("unique violation: {}", info.message());
                FailureResponse::Conflict("Record already exists".to_string())
            }
            DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => {
                tracing::debug!("foreign key violation: {}", info.message());
                FailureResponse::Conflict(
                    "Record is referenced by other records".to_string(),
                )
            }
            DieselError::DatabaseError(_, info) if is_busy(info.message()) => {
                tracing::warn!("database busy: {}", info.message());
                FailureResponse::Unavailable(
                    "Database is busy, retry the request".to_string(),
                )
            }
            e => {
                tracing::error!("database error: {e}");
                FailureResponse::ServerError("Database error".to_string())
            }
        }
    }
}

/// SQLITE_BUSY and SQLITE_LOCKED surface as these messages.
fn is_busy(message: &str) -> bool {
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("database is busy")
}

impl From<JsonRejection> for FailureResponse {
    fn from(rejection: JsonRejection) -> Self {
        FailureResponse::BadRequest(rejection.body_text())
    }
}

/// JSON body extractor whose rejections use the API's error envelope.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(FailureResponse))]
pub struct ApiJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diesel_not_found_maps_to_404() {
        let resp = FailureResponse::from(DieselError::NotFound);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn other_diesel_errors_are_opaque() {
        let resp = FailureResponse::from(DieselError::RollbackTransaction);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.to_string(), "Database error");
    }

    struct SqliteMessage(&'static str);

    impl diesel::result::DatabaseErrorInformation for SqliteMessage {
        fn message(&self) -> &str {
            self.0
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            None
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    #[test]
    fn locked_database_maps_to_503() {
        let resp = FailureResponse::from(DieselError::DatabaseError(
            DatabaseErrorKind::Unknown,
            Box::new(SqliteMessage("database is locked")),
        ));
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unknown_database_errors_stay_500() {
        let resp = FailureResponse::from(DieselError::DatabaseError(
            DatabaseErrorKind::Unknown,
            Box::new(SqliteMessage("no such table: widgets")),
        ));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
