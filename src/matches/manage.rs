use axum::extract::Path;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Deserialize;

use crate::{
    arenas::Arena,
    enums::Status,
    matches::{
        Match, MatchView, PlayerInput, check_roster, check_team,
        create::parse_match_status, replace_roster,
    },
    parse::{nullable, parse_datetime},
    permission::AdminUser,
    schema::matches,
    state::Conn,
    tournaments::Tournament,
    util_resp::{ApiJson, FailureResponse, StandardResponse, data, message},
    validation::{non_blank, parse_id},
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMatchForm {
    pub arena_id: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub tournament_id: Option<Option<i32>>,
    pub match_date: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub score_result: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub winner_team_id: Option<Option<i32>>,
    pub players: Option<Vec<PlayerInput>>,
}

#[derive(AsChangeset)]
#[diesel(table_name = matches)]
struct MatchChanges {
    arena_id: Option<i32>,
    tournament_id: Option<Option<i32>>,
    match_date: Option<NaiveDateTime>,
    status: Option<Status>,
    score_result: Option<Option<String>>,
    winner_team_id: Option<Option<i32>>,
}

impl MatchChanges {
    fn is_empty(&self) -> bool {
        self.arena_id.is_none()
            && self.tournament_id.is_none()
            && self.match_date.is_none()
            && self.status.is_none()
            && self.score_result.is_none()
            && self.winner_team_id.is_none()
    }
}

#[tracing::instrument(skip_all)]
pub async fn update_match(
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    mut conn: Conn<true>,
    ApiJson(form): ApiJson<UpdateMatchForm>,
) -> StandardResponse {
    let id = parse_id(&id, "match")?;
    Match::fetch(id, &mut *conn)?;

    let match_date = match form.match_date.as_deref() {
        Some(raw) => Some(parse_datetime(raw).ok_or_else(|| {
            FailureResponse::BadRequest("Invalid matchDate".to_string())
        })?),
        None => None,
    };
    let status = form.status.as_deref().map(parse_match_status).transpose()?;
    if let Some(Some(winner)) = form.winner_team_id {
        check_team(winner, "winnerTeamId")?;
    }
    if let Some(players) = &form.players {
        check_roster(players)?;
    }

    if let Some(arena_id) = form.arena_id {
        Arena::fetch(arena_id, &mut *conn)?;
    }
    if let Some(Some(tournament_id)) = form.tournament_id {
        Tournament::fetch(tournament_id, &mut *conn)?;
    }

    let changes = MatchChanges {
        arena_id: form.arena_id,
        tournament_id: form.tournament_id,
        match_date,
        status,
        score_result: form
            .score_result
            .map(|s| non_blank(s.as_deref()).map(str::to_string)),
        winner_team_id: form.winner_team_id,
    };
    if !changes.is_empty() {
        diesel::update(matches::table.filter(matches::id.eq(id)))
            .set(&changes)
            .execute(&mut *conn)?;
    }
    if let Some(players) = &form.players {
        replace_roster(id, players, &mut *conn)?;
    }

    tracing::info!(admin_id = admin.id, match_id = id, "updated match");
    let game = Match::fetch(id, &mut *conn)?;
    data(MatchView::load(game, &mut *conn)?)
}

#[tracing::instrument(skip_all)]
pub async fn delete_match(
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let id = parse_id(&id, "match")?;

    let n = diesel::delete(matches::table.filter(matches::id.eq(id)))
        .execute(&mut *conn)?;
    if n == 0 {
        return Err(FailureResponse::NotFound("Match not found".to_string()));
    }

    tracing::info!(admin_id = admin.id, match_id = id, "deleted match");
    message("Match deleted successfully")
}
