use axum::extract::{Path, Query};
use diesel::prelude::*;
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    enums::Status,
    parse::parse_datetime,
    schema::{tournament_registrations, tournaments},
    state::Conn,
    tournaments::{Tournament, TournamentView},
    util_resp::{
        FailureResponse, StandardResponse, data, data_with_count,
    },
    validation::{non_blank, parse_id},
};

#[derive(Deserialize, Default)]
pub struct TournamentFilters {
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn list_tournaments(
    Query(filters): Query<TournamentFilters>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let mut query = tournaments::table.into_boxed();

    if let Some(raw) = non_blank(filters.status.as_deref()) {
        let status = raw.parse::<Status>().map_err(|_| {
            FailureResponse::BadRequest("Invalid status filter".to_string())
        })?;
        query = query.filter(tournaments::status.eq(status));
    }
    if let Some(raw) = non_blank(filters.from.as_deref()) {
        let from = parse_datetime(raw).ok_or_else(|| {
            FailureResponse::BadRequest("Invalid from date".to_string())
        })?;
        query = query.filter(tournaments::start_date.ge(from));
    }
    if let Some(raw) = non_blank(filters.to.as_deref()) {
        let to = parse_datetime(raw).ok_or_else(|| {
            FailureResponse::BadRequest("Invalid to date".to_string())
        })?;
        query = query.filter(tournaments::start_date.le(to));
    }

    let tournaments = query
        .order((tournaments::start_date.asc(), tournaments::id.asc()))
        .select(Tournament::as_select())
        .load::<Tournament>(&mut *conn)?;

    data_with_count(TournamentView::load_many(tournaments, &mut *conn)?)
}

/// Tournaments the caller takes part in, either as registrant or as partner.
pub async fn my_tournaments(
    user: AuthUser,
    mut conn: Conn<false>,
) -> StandardResponse {
    let ids = tournament_registrations::table
        .filter(
            tournament_registrations::user_id
                .eq(user.id)
                .or(tournament_registrations::partner_id.eq(user.id)),
        )
        .select(tournament_registrations::tournament_id)
        .load::<i32>(&mut *conn)?;

    let tournaments = tournaments::table
        .filter(tournaments::id.eq_any(&ids))
        .order((tournaments::start_date.asc(), tournaments::id.asc()))
        .select(Tournament::as_select())
        .load::<Tournament>(&mut *conn)?;

    data(TournamentView::load_many(tournaments, &mut *conn)?)
}

pub async fn get_tournament(
    Path(id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let id = parse_id(&id, "tournament")?;
    let tournament = Tournament::fetch(id, &mut *conn)?;
    data(TournamentView::load(tournament, &mut *conn)?)
}
