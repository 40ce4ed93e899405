use std::str::FromStr;

use axum::extract::Path;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::{insert_into, prelude::*};
use serde::Deserialize;

use crate::{
    auth::{AuthUser, password::hash_password},
    enums::{Backhand, Forehand, Gender, Role, SkillLevel},
    parse::{nullable, parse_date},
    permission::{AdminUser, ensure_owner_or_admin},
    schema::users,
    state::Conn,
    users::{NewUser, User},
    util_resp::{
        ApiJson, FailureResponse, StandardResponse, bad_request, created_data,
        data, message,
    },
    validation::*,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserForm {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[tracing::instrument(skip_all)]
pub async fn create_user(
    AdminUser(admin): AdminUser,
    mut conn: Conn<true>,
    ApiJson(form): ApiJson<CreateUserForm>,
) -> StandardResponse {
    let (Some(email), Some(full_name), Some(password)) = (
        non_blank(form.email.as_deref()),
        non_blank(form.full_name.as_deref()),
        form.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return bad_request("Missing required fields");
    };

    let email = normalize_email(email);
    is_valid_email(&email).map_err(FailureResponse::BadRequest)?;
    is_valid_password(password).map_err(FailureResponse::BadRequest)?;

    // Unknown roles silently fall back to a regular account.
    let role = form
        .role
        .as_deref()
        .and_then(|r| r.parse::<Role>().ok())
        .unwrap_or(Role::User);

    if User::find_by_email(&email, &mut *conn)?.is_some() {
        return Err(FailureResponse::Conflict("Email already exists".to_string()));
    }

    let password_hash = hash_password(password)?;
    let now = Utc::now().naive_utc();
    let user = insert_into(users::table)
        .values(NewUser {
            full_name,
            email: &email,
            password_hash: &password_hash,
            role,
            gender: None,
            birth_date: None,
            level: None,
            location_city: None,
            created_at: now,
            updated_at: now,
        })
        .returning(User::as_returning())
        .get_result(&mut *conn)?;

    tracing::info!(admin_id = admin.id, user_id = user.id, "created user");

    created_data(user)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserForm {
    pub full_name: Option<String>,
    pub role: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub photo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub cover_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub birth_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub level: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub forehand: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub backhand: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub location_city: Option<Option<String>>,
}

#[derive(AsChangeset)]
#[diesel(table_name = users)]
struct UserChanges {
    full_name: Option<String>,
    role: Option<Role>,
    photo_url: Option<Option<String>>,
    cover_url: Option<Option<String>>,
    gender: Option<Option<Gender>>,
    birth_date: Option<Option<NaiveDate>>,
    level: Option<Option<SkillLevel>>,
    forehand: Option<Option<Forehand>>,
    backhand: Option<Option<Backhand>>,
    location_city: Option<Option<String>>,
    updated_at: Option<NaiveDateTime>,
}

/// `null` and `""` clear the field; anything else must parse as `T`.
fn clearable<T, F>(
    value: Option<Option<String>>,
    field: &str,
    parse: F,
) -> Result<Option<Option<T>>, FailureResponse>
where
    F: FnOnce(&str) -> Option<T>,
{
    match value {
        None => Ok(None),
        Some(raw) => match non_blank(raw.as_deref()) {
            None => Ok(Some(None)),
            Some(raw) => parse(raw).map(|v| Some(Some(v))).ok_or_else(|| {
                FailureResponse::BadRequest(format!("Invalid {field}"))
            }),
        },
    }
}

fn clearable_enum<T: FromStr>(
    value: Option<Option<String>>,
    field: &str,
) -> Result<Option<Option<T>>, FailureResponse> {
    clearable(value, field, |raw| raw.parse::<T>().ok())
}

fn clearable_url(
    value: Option<Option<String>>,
    field: &str,
) -> Result<Option<Option<String>>, FailureResponse> {
    clearable(value, field, |raw| is_http_url(raw).then(|| raw.to_string()))
}

impl UpdateUserForm {
    fn into_changes(
        self,
        caller: &AuthUser,
    ) -> Result<UserChanges, FailureResponse> {
        let role = match self.role.as_deref() {
            None => None,
            Some(raw) => {
                if !caller.is_admin() {
                    return Err(FailureResponse::Forbidden(
                        "Only admins can change roles".to_string(),
                    ));
                }
                Some(raw.parse::<Role>().map_err(|_| {
                    FailureResponse::BadRequest("Invalid role".to_string())
                })?)
            }
        };

        let full_name = match self.full_name {
            Some(name) => match non_blank(Some(name.as_str())) {
                Some(name) => Some(name.to_string()),
                None => {
                    return Err(FailureResponse::BadRequest(
                        "fullName cannot be empty".to_string(),
                    ));
                }
            },
            None => None,
        };

        Ok(UserChanges {
            full_name,
            role,
            photo_url: clearable_url(self.photo_url, "photoUrl")?,
            cover_url: clearable_url(self.cover_url, "coverUrl")?,
            gender: clearable_enum(self.gender, "gender")?,
            birth_date: clearable(self.birth_date, "birthDate", parse_date)?,
            level: clearable_enum(self.level, "level")?,
            forehand: clearable_enum(self.forehand, "forehand")?,
            backhand: clearable_enum(self.backhand, "backhand")?,
            location_city: self
                .location_city
                .map(|c| non_blank(c.as_deref()).map(str::to_string)),
            updated_at: Some(Utc::now().naive_utc()),
        })
    }
}

#[tracing::instrument(skip_all)]
pub async fn update_user(
    user: AuthUser,
    Path(id): Path<String>,
    mut conn: Conn<true>,
    ApiJson(form): ApiJson<UpdateUserForm>,
) -> StandardResponse {
    let id = parse_id(&id, "user")?;
    ensure_owner_or_admin(&user, Some(id), "You can only edit your own profile")?;

    let changes = form.into_changes(&user)?;
    User::fetch(id, &mut *conn)?;

    let updated = diesel::update(users::table.filter(users::id.eq(id)))
        .set(&changes)
        .returning(User::as_returning())
        .get_result(&mut *conn)?;

    data(updated)
}

#[tracing::instrument(skip_all)]
pub async fn delete_user(
    user: AuthUser,
    Path(id): Path<String>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let id = parse_id(&id, "user")?;
    ensure_owner_or_admin(
        &user,
        Some(id),
        "You can only delete your own account",
    )?;

    let n = diesel::delete(users::table.filter(users::id.eq(id)))
        .execute(&mut *conn)?;
    if n == 0 {
        return Err(FailureResponse::NotFound("User not found".to_string()));
    }

    tracing::info!(by = user.id, user_id = id, "deleted user");
    message("User deleted successfully")
}
