use axum::extract::Path;
use diesel::prelude::*;

use crate::{
    schema::users,
    state::Conn,
    users::User,
    util_resp::{StandardResponse, data, data_with_count, err_not_found},
    validation::{normalize_email, parse_id},
};

pub async fn list_users(mut conn: Conn<false>) -> StandardResponse {
    let users = users::table
        .order((users::created_at.desc(), users::id.desc()))
        .select(User::as_select())
        .load::<User>(&mut *conn)?;

    data_with_count(users)
}

pub async fn get_user(
    Path(id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let id = parse_id(&id, "user")?;
    data(User::fetch(id, &mut *conn)?)
}

pub async fn get_user_by_email(
    Path(email): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    match User::find_by_email(&normalize_email(&email), &mut *conn)? {
        Some(user) => data(user),
        None => err_not_found("User not found"),
    }
}
