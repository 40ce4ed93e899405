use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{password::verify_password, token::TokenKeys},
    state::Conn,
    users::{SessionUser, User},
    util_resp::{
        ApiJson, FailureResponse, StandardResponse, bad_request, success,
    },
    validation::{non_blank, normalize_email},
};

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn invalid_credentials() -> FailureResponse {
    FailureResponse::Unauthorized("Invalid credentials".to_string())
}

#[tracing::instrument(skip_all)]
pub async fn do_login(
    State(tokens): State<TokenKeys>,
    mut conn: Conn<false>,
    ApiJson(form): ApiJson<LoginForm>,
) -> StandardResponse {
    let (Some(email), Some(password)) = (
        non_blank(form.email.as_deref()),
        form.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return bad_request("Missing required fields: email, password");
    };

    let user = User::find_by_email(&normalize_email(email), &mut *conn)?
        .ok_or_else(invalid_credentials)?;

    // todo: rate limit failed attempts per email
    if !verify_password(password, &user.password_hash) {
        tracing::warn!(user_id = user.id, "failed login attempt");
        return Err(invalid_credentials());
    }

    let token = tokens.issue(user.id, &user.email, user.role)?;
    success(json!({ "user": SessionUser::from(user), "token": token }))
}
