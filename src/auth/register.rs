use axum::extract::State;
use chrono::Utc;
use diesel::{insert_into, prelude::*};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{password::hash_password, token::TokenKeys},
    enums::{Gender, Role},
    parse::parse_date,
    schema::users,
    state::Conn,
    users::{NewUser, SessionUser, User},
    util_resp::{
        ApiJson, FailureResponse, StandardResponse, bad_request, created,
    },
    validation::*,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub location_city: Option<String>,
}

#[tracing::instrument(skip_all)]
pub async fn do_register(
    State(tokens): State<TokenKeys>,
    mut conn: Conn<true>,
    ApiJson(form): ApiJson<RegisterForm>,
) -> StandardResponse {
    let (Some(full_name), Some(email), Some(password)) = (
        non_blank(form.full_name.as_deref()),
        non_blank(form.email.as_deref()),
        form.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return bad_request("Missing required fields: fullName, email, password");
    };

    let email = normalize_email(email);
    is_valid_email(&email).map_err(FailureResponse::BadRequest)?;
    is_valid_password(password).map_err(FailureResponse::BadRequest)?;

    let gender = match non_blank(form.gender.as_deref()) {
        Some(raw) => Some(raw.parse::<Gender>().map_err(|_| {
            FailureResponse::BadRequest("Invalid gender".to_string())
        })?),
        None => None,
    };
    let birth_date = match non_blank(form.birth_date.as_deref()) {
        Some(raw) => Some(parse_date(raw).ok_or_else(|| {
            FailureResponse::BadRequest("Invalid birthDate".to_string())
        })?),
        None => None,
    };

    if User::find_by_email(&email, &mut *conn)?.is_some() {
        return Err(FailureResponse::Conflict(
            "Email already registered".to_string(),
        ));
    }

    let password_hash = hash_password(password)?;
    let now = Utc::now().naive_utc();
    let user = insert_into(users::table)
        .values(NewUser {
            full_name,
            email: &email,
            password_hash: &password_hash,
            role: Role::User,
            gender,
            birth_date,
            level: None,
            location_city: non_blank(form.location_city.as_deref()),
            created_at: now,
            updated_at: now,
        })
        .returning(User::as_returning())
        .get_result(&mut *conn)?;

    tracing::info!(user_id = user.id, "registered new user");

    let token = tokens.issue(user.id, &user.email, user.role)?;
    created(json!({ "user": SessionUser::from(user), "token": token }))
}
