use chrono::Utc;
use diesel::{insert_into, prelude::*};
use serde::Deserialize;

use crate::{
    arenas::Arena,
    enums::Status,
    matches::{
        Match, MatchView, PlayerInput, check_roster, check_team, replace_roster,
    },
    parse::parse_datetime,
    permission::AdminUser,
    schema::matches,
    state::Conn,
    tournaments::Tournament,
    util_resp::{
        ApiJson, FailureResponse, StandardResponse, bad_request, created_data,
    },
    validation::non_blank,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchForm {
    pub arena_id: Option<i32>,
    pub match_date: Option<String>,
    pub tournament_id: Option<i32>,
    pub status: Option<String>,
    pub score_result: Option<String>,
    pub winner_team_id: Option<i32>,
    #[serde(default)]
    pub players: Vec<PlayerInput>,
}

pub(super) fn parse_match_status(raw: &str) -> Result<Status, FailureResponse> {
    raw.parse::<Status>()
        .map_err(|_| FailureResponse::BadRequest("Invalid status".to_string()))
}

#[tracing::instrument(skip_all)]
pub async fn create_match(
    AdminUser(admin): AdminUser,
    mut conn: Conn<true>,
    ApiJson(form): ApiJson<CreateMatchForm>,
) -> StandardResponse {
    let (Some(arena_id), Some(match_date)) = (
        form.arena_id,
        non_blank(form.match_date.as_deref()).and_then(parse_datetime),
    ) else {
        return bad_request("Invalid arenaId or matchDate");
    };

    let status = match non_blank(form.status.as_deref()) {
        Some(raw) => parse_match_status(raw)?,
        None => Status::Scheduled,
    };
    if let Some(winner) = form.winner_team_id {
        check_team(winner, "winnerTeamId")?;
    }
    check_roster(&form.players)?;

    Arena::fetch(arena_id, &mut *conn)?;
    if let Some(tournament_id) = form.tournament_id {
        Tournament::fetch(tournament_id, &mut *conn)?;
    }

    let game = insert_into(matches::table)
        .values((
            matches::arena_id.eq(arena_id),
            matches::tournament_id.eq(form.tournament_id),
            matches::match_date.eq(match_date),
            matches::status.eq(status),
            matches::score_result.eq(non_blank(form.score_result.as_deref())),
            matches::winner_team_id.eq(form.winner_team_id),
            matches::created_at.eq(Utc::now().naive_utc()),
        ))
        .returning(Match::as_returning())
        .get_result(&mut *conn)?;

    replace_roster(game.id, &form.players, &mut *conn)?;

    tracing::info!(admin_id = admin.id, match_id = game.id, "created match");
    created_data(MatchView::load(game, &mut *conn)?)
}
