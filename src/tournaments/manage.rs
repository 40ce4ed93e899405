use axum::extract::Path;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;

use crate::{
    arenas::Arena,
    auth::AuthUser,
    enums::Status,
    parse::nullable,
    schema::tournaments,
    state::Conn,
    tournaments::{
        Tournament, TournamentView, check_dates,
        create::{optional_datetime, parse_status},
    },
    util_resp::{ApiJson, FailureResponse, StandardResponse, data, message},
    validation::{non_blank, parse_id},
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTournamentForm {
    pub name: Option<String>,
    pub arena_id: Option<i32>,
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub registration_deadline: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub category_filter: Option<Option<String>>,
    pub status: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = tournaments)]
struct TournamentChanges {
    name: Option<String>,
    arena_id: Option<i32>,
    start_date: Option<NaiveDateTime>,
    end_date: Option<Option<NaiveDateTime>>,
    registration_deadline: Option<Option<NaiveDateTime>>,
    category_filter: Option<Option<String>>,
    status: Option<Status>,
    updated_at: NaiveDateTime,
}

impl UpdateTournamentForm {
    fn into_changes(self) -> Result<TournamentChanges, FailureResponse> {
        let name = match self.name {
            Some(name) => Some(
                non_blank(Some(name.as_str()))
                    .ok_or_else(|| {
                        FailureResponse::BadRequest(
                            "Tournament name cannot be empty".to_string(),
                        )
                    })?
                    .to_string(),
            ),
            None => None,
        };

        let start_date = match self.start_date {
            Some(raw) => {
                Some(optional_datetime(Some(raw.as_str()), "startDate")?.ok_or_else(
                    || FailureResponse::BadRequest("Invalid startDate".to_string()),
                )?)
            }
            None => None,
        };

        Ok(TournamentChanges {
            name,
            arena_id: self.arena_id,
            start_date,
            end_date: self
                .end_date
                .map(|raw| optional_datetime(raw.as_deref(), "endDate"))
                .transpose()?,
            registration_deadline: self
                .registration_deadline
                .map(|raw| {
                    optional_datetime(raw.as_deref(), "registrationDeadline")
                })
                .transpose()?,
            category_filter: self
                .category_filter
                .map(|raw| non_blank(raw.as_deref()).map(str::to_string)),
            status: self.status.as_deref().map(parse_status).transpose()?,
            updated_at: Utc::now().naive_utc(),
        })
    }
}

#[tracing::instrument(skip_all)]
pub async fn update_tournament(
    user: AuthUser,
    Path(id): Path<String>,
    mut conn: Conn<true>,
    ApiJson(form): ApiJson<UpdateTournamentForm>,
) -> StandardResponse {
    let id = parse_id(&id, "tournament")?;
    let tournament = Tournament::fetch(id, &mut *conn)?;
    tournament.check_user_can_manage(&user, "edit")?;

    let changes = form.into_changes()?;

    check_dates(
        changes.start_date.unwrap_or(tournament.start_date),
        changes.end_date.unwrap_or(tournament.end_date),
        changes
            .registration_deadline
            .unwrap_or(tournament.registration_deadline),
    )?;
    if let Some(arena_id) = changes.arena_id {
        Arena::fetch(arena_id, &mut *conn)?;
    }

    let updated = diesel::update(tournaments::table.filter(tournaments::id.eq(id)))
        .set(&changes)
        .returning(Tournament::as_returning())
        .get_result(&mut *conn)?;

    tracing::info!(user_id = user.id, tournament_id = id, "updated tournament");
    data(TournamentView::load(updated, &mut *conn)?)
}

#[tracing::instrument(skip_all)]
pub async fn delete_tournament(
    user: AuthUser,
    Path(id): Path<String>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let id = parse_id(&id, "tournament")?;
    let tournament = Tournament::fetch(id, &mut *conn)?;
    tournament.check_user_can_manage(&user, "delete")?;

    diesel::delete(tournaments::table.filter(tournaments::id.eq(id)))
        .execute(&mut *conn)?;

    tracing::info!(user_id = user.id, tournament_id = id, "deleted tournament");
    message("Tournament deleted successfully")
}
