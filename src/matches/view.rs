use axum::extract::Path;
use diesel::prelude::*;

use crate::{
    matches::{Match, MatchView},
    schema::matches,
    state::Conn,
    util_resp::{StandardResponse, data, data_with_count},
    validation::parse_id,
};

pub async fn list_matches(mut conn: Conn<false>) -> StandardResponse {
    let games = matches::table
        .order((matches::match_date.asc(), matches::id.asc()))
        .select(Match::as_select())
        .load::<Match>(&mut *conn)?;

    data_with_count(MatchView::load_many(games, &mut *conn)?)
}

pub async fn tournament_matches(
    Path(tournament_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let tournament_id = parse_id(&tournament_id, "tournament")?;

    let games = matches::table
        .filter(matches::tournament_id.eq(tournament_id))
        .order((matches::match_date.asc(), matches::id.asc()))
        .select(Match::as_select())
        .load::<Match>(&mut *conn)?;

    data_with_count(MatchView::load_many(games, &mut *conn)?)
}

pub async fn get_match(
    Path(id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let id = parse_id(&id, "match")?;
    let game = Match::fetch(id, &mut *conn)?;
    data(MatchView::load(game, &mut *conn)?)
}
