use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::{
    connection::LoadConnection, dsl::count_star, prelude::*, sqlite::Sqlite,
};
use serde::Serialize;

use crate::{
    arenas::ArenaSummary,
    auth::AuthUser,
    enums::Status,
    permission::ensure_owner_or_admin,
    schema::{arenas, tournament_registrations, tournaments},
    util_resp::FailureResponse,
};

pub mod create;
pub mod manage;
pub mod registrations;
pub mod view;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = tournaments)]
#[diesel(check_for_backend(Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: i32,
    pub name: String,
    pub arena_id: i32,
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub registration_deadline: Option<NaiveDateTime>,
    pub category_filter: Option<String>,
    pub status: Status,
    pub created_by_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Tournament {
    pub fn fetch(
        id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Tournament, FailureResponse> {
        tournaments::table
            .filter(tournaments::id.eq(id))
            .select(Tournament::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| {
                FailureResponse::NotFound("Tournament not found".to_string())
            })
    }

    /// Tournaments may be edited or deleted by admins and by whoever
    /// created them.
    pub fn check_user_can_manage(
        &self,
        user: &AuthUser,
        action: &str,
    ) -> Result<(), FailureResponse> {
        ensure_owner_or_admin(
            user,
            self.created_by_id,
            &format!("Only admins or tournament owners can {action}"),
        )
    }
}

/// A tournament must not end before it starts, and registration must close
/// no later than the start.
pub fn check_dates(
    start_date: NaiveDateTime,
    end_date: Option<NaiveDateTime>,
    registration_deadline: Option<NaiveDateTime>,
) -> Result<(), FailureResponse> {
    if end_date.is_some_and(|end| end < start_date) {
        return Err(FailureResponse::BadRequest(
            "endDate must not be before startDate".to_string(),
        ));
    }
    if registration_deadline.is_some_and(|deadline| deadline > start_date) {
        return Err(FailureResponse::BadRequest(
            "registrationDeadline must not be after startDate".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentView {
    #[serde(flatten)]
    pub tournament: Tournament,
    pub arena: Option<ArenaSummary>,
    pub registration_count: i64,
}

impl TournamentView {
    /// Attaches arenas and registration counts, preserving the input order.
    pub fn load_many(
        tournaments: Vec<Tournament>,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<TournamentView>> {
        let arena_ids: Vec<i32> =
            tournaments.iter().map(|t| t.arena_id).collect();
        let tournament_ids: Vec<i32> = tournaments.iter().map(|t| t.id).collect();

        let arenas: HashMap<i32, ArenaSummary> = arenas::table
            .filter(arenas::id.eq_any(&arena_ids))
            .select(ArenaSummary::as_select())
            .load::<ArenaSummary>(conn)?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let counts: HashMap<i32, i64> = tournament_registrations::table
            .filter(tournament_registrations::tournament_id.eq_any(&tournament_ids))
            .group_by(tournament_registrations::tournament_id)
            .select((tournament_registrations::tournament_id, count_star()))
            .load::<(i32, i64)>(conn)?
            .into_iter()
            .collect();

        Ok(tournaments
            .into_iter()
            .map(|tournament| TournamentView {
                arena: arenas.get(&tournament.arena_id).cloned(),
                registration_count: counts
                    .get(&tournament.id)
                    .copied()
                    .unwrap_or(0),
                tournament,
            })
            .collect())
    }

    pub fn load(
        tournament: Tournament,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<TournamentView> {
        let mut views = Self::load_many(vec![tournament], conn)?;
        views.pop().ok_or(diesel::result::Error::NotFound)
    }
}
