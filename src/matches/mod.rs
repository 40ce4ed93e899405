use chrono::NaiveDateTime;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    enums::Status,
    schema::{match_players, matches, users},
    util_resp::FailureResponse,
};

pub mod create;
pub mod manage;
pub mod view;

/// Players per side in a doubles match.
pub const MAX_TEAM_SIZE: usize = 2;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = matches)]
#[diesel(check_for_backend(Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: i32,
    pub arena_id: i32,
    pub tournament_id: Option<i32>,
    pub match_date: NaiveDateTime,
    pub status: Status,
    pub score_result: Option<String>,
    pub winner_team_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl Match {
    pub fn fetch(
        id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Match, FailureResponse> {
        matches::table
            .filter(matches::id.eq(id))
            .select(Match::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| FailureResponse::NotFound("Match not found".to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub user_id: i32,
    pub full_name: String,
    pub team: i32,
}

#[derive(Debug, Serialize)]
pub struct MatchView {
    #[serde(flatten)]
    pub game: Match,
    pub players: Vec<PlayerView>,
}

impl MatchView {
    pub fn load_many(
        games: Vec<Match>,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<MatchView>> {
        let ids: Vec<i32> = games.iter().map(|m| m.id).collect();

        let mut rosters = match_players::table
            .inner_join(users::table)
            .filter(match_players::match_id.eq_any(&ids))
            .order((match_players::team.asc(), match_players::id.asc()))
            .select((
                match_players::match_id,
                match_players::user_id,
                users::full_name,
                match_players::team,
            ))
            .load::<(i32, i32, String, i32)>(conn)?
            .into_iter()
            .map(|(match_id, user_id, full_name, team)| {
                (
                    match_id,
                    PlayerView {
                        user_id,
                        full_name,
                        team,
                    },
                )
            })
            .into_group_map();

        Ok(games
            .into_iter()
            .map(|game| MatchView {
                players: rosters.remove(&game.id).unwrap_or_default(),
                game,
            })
            .collect())
    }

    pub fn load(
        game: Match,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<MatchView> {
        let mut views = Self::load_many(vec![game], conn)?;
        views.pop().ok_or(diesel::result::Error::NotFound)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInput {
    pub user_id: i32,
    pub team: i32,
}

pub fn check_team(team: i32, what: &str) -> Result<(), FailureResponse> {
    if matches!(team, 1 | 2) {
        Ok(())
    } else {
        Err(FailureResponse::BadRequest(format!("Invalid {what}")))
    }
}

/// Validates a roster without touching the database: teams are 1 or 2, no
/// team is over-full and nobody appears twice.
pub fn check_roster(players: &[PlayerInput]) -> Result<(), FailureResponse> {
    for player in players {
        check_team(player.team, "team")?;
    }

    if let Some(dup) = players.iter().map(|p| p.user_id).duplicates().next() {
        return Err(FailureResponse::BadRequest(format!(
            "Player {dup} appears more than once"
        )));
    }

    let sizes = players.iter().counts_by(|p| p.team);
    if sizes.values().any(|&n| n > MAX_TEAM_SIZE) {
        return Err(FailureResponse::BadRequest(format!(
            "A team has at most {MAX_TEAM_SIZE} players"
        )));
    }

    Ok(())
}

/// Replaces the roster of `match_id` with `players`, which must already have
/// passed [`check_roster`].
pub fn replace_roster(
    match_id: i32,
    players: &[PlayerInput],
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<(), FailureResponse> {
    let ids: Vec<i32> = players.iter().map(|p| p.user_id).collect();
    let known = users::table
        .filter(users::id.eq_any(&ids))
        .count()
        .get_result::<i64>(conn)?;
    if known != ids.len() as i64 {
        return Err(FailureResponse::NotFound("Player not found".to_string()));
    }

    diesel::delete(match_players::table.filter(match_players::match_id.eq(match_id)))
        .execute(conn)?;

    let rows: Vec<_> = players
        .iter()
        .map(|p| {
            (
                match_players::match_id.eq(match_id),
                match_players::user_id.eq(p.user_id),
                match_players::team.eq(p.team),
            )
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(match_players::table)
            .values(&rows)
            .execute(conn)?;
    }

    Ok(())
}
