use chrono::{NaiveDateTime, Utc};
use diesel::{insert_into, prelude::*};
use serde::Deserialize;

use crate::{
    arenas::Arena,
    enums::Status,
    parse::parse_datetime,
    permission::AdminUser,
    schema::tournaments,
    state::Conn,
    tournaments::{Tournament, TournamentView, check_dates},
    util_resp::{
        ApiJson, FailureResponse, StandardResponse, bad_request, created_data,
    },
    validation::non_blank,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournamentForm {
    pub name: Option<String>,
    pub arena_id: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub registration_deadline: Option<String>,
    pub category_filter: Option<String>,
    pub status: Option<String>,
}

/// Parses an optional timestamp field, rejecting values that are present
/// but unparsable.
pub(super) fn optional_datetime(
    raw: Option<&str>,
    field: &str,
) -> Result<Option<NaiveDateTime>, FailureResponse> {
    match non_blank(raw) {
        None => Ok(None),
        Some(raw) => parse_datetime(raw).map(Some).ok_or_else(|| {
            FailureResponse::BadRequest(format!("Invalid {field}"))
        }),
    }
}

pub(super) fn parse_status(raw: &str) -> Result<Status, FailureResponse> {
    raw.parse::<Status>()
        .map_err(|_| FailureResponse::BadRequest("Invalid status".to_string()))
}

#[tracing::instrument(skip_all)]
pub async fn create_tournament(
    AdminUser(user): AdminUser,
    mut conn: Conn<true>,
    ApiJson(form): ApiJson<CreateTournamentForm>,
) -> StandardResponse {
    let (Some(name), Some(arena_id), Some(start_date)) = (
        non_blank(form.name.as_deref()),
        form.arena_id,
        non_blank(form.start_date.as_deref()).and_then(parse_datetime),
    ) else {
        return bad_request("Missing required fields");
    };

    let status = match non_blank(form.status.as_deref()) {
        Some(raw) => parse_status(raw)?,
        None => Status::Open,
    };
    let end_date = optional_datetime(form.end_date.as_deref(), "endDate")?;
    let registration_deadline = optional_datetime(
        form.registration_deadline.as_deref(),
        "registrationDeadline",
    )?;
    check_dates(start_date, end_date, registration_deadline)?;

    Arena::fetch(arena_id, &mut *conn)?;

    let now = Utc::now().naive_utc();
    let tournament = insert_into(tournaments::table)
        .values((
            tournaments::name.eq(name),
            tournaments::arena_id.eq(arena_id),
            tournaments::start_date.eq(start_date),
            tournaments::end_date.eq(end_date),
            tournaments::registration_deadline.eq(registration_deadline),
            tournaments::category_filter
                .eq(non_blank(form.category_filter.as_deref())),
            tournaments::status.eq(status),
            tournaments::created_by_id.eq(Some(user.id)),
            tournaments::created_at.eq(now),
            tournaments::updated_at.eq(now),
        ))
        .returning(Tournament::as_returning())
        .get_result(&mut *conn)?;

    tracing::info!(
        user_id = user.id,
        tournament_id = tournament.id,
        "created tournament"
    );

    created_data(TournamentView::load(tournament, &mut *conn)?)
}
