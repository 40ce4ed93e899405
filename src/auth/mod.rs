use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    enums::Role,
    state::Conn,
    users::User,
    util_resp::{FailureResponse, StandardResponse, data},
};

pub mod login;
pub mod password;
pub mod register;
pub mod token;

use token::TokenKeys;

/// The caller, as identified by a valid bearer token.
///
/// The role is taken from the token claims, so a role change only applies to
/// tokens issued after it.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug)]
pub enum AuthError {
    HeaderMissingOrMalformed,
    InvalidToken,
}

impl From<AuthError> for FailureResponse {
    fn from(e: AuthError) -> Self {
        let msg = match e {
            AuthError::HeaderMissingOrMalformed => {
                "Missing or invalid authorization header"
            }
            AuthError::InvalidToken => "Invalid or expired token",
        };
        FailureResponse::Unauthorized(msg.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        FailureResponse::from(self).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(
                parts, state,
            )
            .await
            .map_err(|_| AuthError::HeaderMissingOrMalformed)?;

        let claims = TokenKeys::from_ref(state)
            .verify(bearer.token())
            .map_err(|e| {
                tracing::warn!("rejected bearer token: {e}");
                AuthError::InvalidToken
            })?;

        Ok(AuthUser {
            id: claims.user_id,
            email: claims.email,
            role: claims.role,
        })
    }
}

pub async fn me(user: AuthUser, mut conn: Conn<false>) -> StandardResponse {
    let user = User::fetch(user.id, &mut *conn)?;
    data(user)
}
