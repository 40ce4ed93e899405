use axum::{body::Bytes, extract::Path};
use chrono::Utc;
use diesel::{dsl::exists, insert_into, prelude::*, select};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    auth::AuthUser,
    schema::{tournament_registrations, users},
    state::Conn,
    tournaments::{
        Tournament,
        registrations::{
            Registration, RegistrationError, RegistrationView,
            check_registration_window, is_participant,
        },
    },
    util_resp::{FailureResponse, StandardResponse, created, message},
    validation::parse_id,
};

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    #[serde(default)]
    pub partner_id: Option<Value>,
}

fn invalid_partner() -> FailureResponse {
    FailureResponse::BadRequest("Invalid partner id".to_string())
}

/// An empty body (or a `null`/absent `partnerId`) registers the user
/// alone. A numeric string is accepted as an id.
fn partner_from_body(body: &[u8]) -> Result<Option<i32>, FailureResponse> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let form: RegisterForm =
        serde_json::from_slice(body).map_err(|_| invalid_partner())?;

    match form.partner_id {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Some)
            .ok_or_else(invalid_partner),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| invalid_partner()),
        Some(_) => Err(invalid_partner()),
    }
}

#[tracing::instrument(skip_all)]
pub async fn register(
    user: AuthUser,
    Path(tournament_id): Path<String>,
    mut conn: Conn<true>,
    body: Bytes,
) -> StandardResponse {
    let tournament_id = parse_id(&tournament_id, "tournament")?;
    let partner_id = partner_from_body(&body)?;

    let tournament = Tournament::fetch(tournament_id, &mut *conn)?;

    check_registration_window(&tournament, Utc::now().naive_utc())?;

    if is_participant(tournament_id, user.id, &mut *conn)? {
        return Err(RegistrationError::AlreadyRegistered.into());
    }

    if let Some(partner_id) = partner_id {
        if partner_id == user.id {
            return Err(RegistrationError::PartnerIsSelf.into());
        }
        let partner_exists =
            select(exists(users::table.filter(users::id.eq(partner_id))))
                .get_result::<bool>(&mut *conn)?;
        if !partner_exists {
            return Err(RegistrationError::PartnerNotFound.into());
        }
        if is_participant(tournament_id, partner_id, &mut *conn)? {
            return Err(RegistrationError::PartnerAlreadyRegistered.into());
        }
    }

    let registration = insert_into(tournament_registrations::table)
        .values((
            tournament_registrations::tournament_id.eq(tournament_id),
            tournament_registrations::user_id.eq(user.id),
            tournament_registrations::partner_id.eq(partner_id),
            tournament_registrations::registration_date
                .eq(Utc::now().naive_utc()),
        ))
        .returning(Registration::as_returning())
        .get_result(&mut *conn)?;

    tracing::info!(
        user_id = user.id,
        tournament_id,
        partner_id,
        "registered for tournament"
    );

    let mut views = RegistrationView::load_many(vec![registration], &mut *conn)?;
    match views.pop() {
        Some(view) => created(view),
        None => Err(FailureResponse::ServerError(
            "Registration could not be loaded".to_string(),
        )),
    }
}

#[tracing::instrument(skip_all)]
pub async fn unregister(
    user: AuthUser,
    Path(tournament_id): Path<String>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let tournament_id = parse_id(&tournament_id, "tournament")?;

    let n = diesel::delete(
        tournament_registrations::table.filter(
            tournament_registrations::tournament_id
                .eq(tournament_id)
                .and(tournament_registrations::user_id.eq(user.id)),
        ),
    )
    .execute(&mut *conn)?;

    if n == 0 {
        return Err(FailureResponse::NotFound(
            "Registration not found".to_string(),
        ));
    }

    tracing::info!(user_id = user.id, tournament_id, "unregistered");
    message("User unregistered successfully")
}
