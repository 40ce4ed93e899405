use chrono::{NaiveDate, NaiveDateTime};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::Serialize;

use crate::{
    enums::{Backhand, Forehand, Gender, Role, SkillLevel},
    schema::users,
    util_resp::FailureResponse,
};

pub mod manage;
pub mod view;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub level: Option<SkillLevel>,
    pub forehand: Option<Forehand>,
    pub backhand: Option<Backhand>,
    pub location_city: Option<String>,
    pub photo_url: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn fetch(
        id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<User, FailureResponse> {
        users::table
            .filter(users::id.eq(id))
            .select(User::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| FailureResponse::NotFound("User not found".to_string()))
    }

    pub fn find_by_email(
        email: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Option<User>> {
        users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(conn)
            .optional()
    }
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub level: Option<SkillLevel>,
    pub location_city: Option<&'a str>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// The user fields embedded in registration responses.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub level: Option<SkillLevel>,
}

/// The author of a feed post.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct PostAuthor {
    pub id: i32,
    pub full_name: String,
    pub photo_url: Option<String>,
}

/// What a client learns about itself right after logging in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        SessionUser {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            photo_url: user.photo_url,
        }
    }
}
