//! Tournament registrations, optionally paired with a partner.
//!
//! A user takes part in a tournament at most once: either as the registrant
//! of a registration, or as the partner on someone else's.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::{
    connection::LoadConnection, dsl::exists, prelude::*, select,
    sqlite::Sqlite,
};
use serde::Serialize;

use crate::{
    enums::Status,
    schema::{tournament_registrations, users},
    tournaments::Tournament,
    users::UserSummary,
    util_resp::FailureResponse,
};

pub mod register;
pub mod view;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = tournament_registrations)]
#[diesel(check_for_backend(Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: i32,
    pub tournament_id: i32,
    pub user_id: i32,
    pub partner_id: Option<i32>,
    pub registration_date: NaiveDateTime,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Tournament not open for registrations")]
    NotOpen,
    #[error("Registration deadline has passed")]
    DeadlinePassed,
    #[error("Tournament already started")]
    AlreadyStarted,
    #[error("User already registered in this tournament")]
    AlreadyRegistered,
    #[error("Partner cannot be the same as the user")]
    PartnerIsSelf,
    #[error("Partner not found")]
    PartnerNotFound,
    #[error("Partner already registered in this tournament")]
    PartnerAlreadyRegistered,
}

impl From<RegistrationError> for FailureResponse {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::AlreadyRegistered
            | RegistrationError::PartnerAlreadyRegistered => {
                FailureResponse::Conflict(e.to_string())
            }
            RegistrationError::NotOpen
            | RegistrationError::DeadlinePassed
            | RegistrationError::AlreadyStarted
            | RegistrationError::PartnerIsSelf
            | RegistrationError::PartnerNotFound => {
                FailureResponse::BadRequest(e.to_string())
            }
        }
    }
}

/// Checks that `tournament` accepts registrations at `now`.
pub fn check_registration_window(
    tournament: &Tournament,
    now: NaiveDateTime,
) -> Result<(), RegistrationError> {
    if tournament.status != Status::Open {
        return Err(RegistrationError::NotOpen);
    }
    if tournament
        .registration_deadline
        .is_some_and(|deadline| deadline < now)
    {
        return Err(RegistrationError::DeadlinePassed);
    }
    if tournament.start_date < now {
        return Err(RegistrationError::AlreadyStarted);
    }
    Ok(())
}

/// Whether `user_id` already takes part in the tournament, on either side of
/// a registration.
pub fn is_participant(
    tournament_id: i32,
    user_id: i32,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<bool> {
    select(exists(
        tournament_registrations::table.filter(
            tournament_registrations::tournament_id.eq(tournament_id).and(
                tournament_registrations::user_id
                    .eq(user_id)
                    .or(tournament_registrations::partner_id.eq(user_id)),
            ),
        ),
    ))
    .get_result(conn)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationView {
    #[serde(flatten)]
    pub registration: Registration,
    pub user: Option<UserSummary>,
    pub partner: Option<UserSummary>,
}

impl RegistrationView {
    pub fn load_many(
        registrations: Vec<Registration>,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<RegistrationView>> {
        let ids: Vec<i32> = registrations
            .iter()
            .flat_map(|r| std::iter::once(r.user_id).chain(r.partner_id))
            .collect();

        let people: HashMap<i32, UserSummary> = users::table
            .filter(users::id.eq_any(&ids))
            .select(UserSummary::as_select())
            .load::<UserSummary>(conn)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(registrations
            .into_iter()
            .map(|registration| RegistrationView {
                user: people.get(&registration.user_id).cloned(),
                partner: registration
                    .partner_id
                    .and_then(|id| people.get(&id).cloned()),
                registration,
            })
            .collect())
    }
}
