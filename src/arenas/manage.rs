use axum::extract::Path;
use chrono::Utc;
use diesel::{dsl::exists, insert_into, prelude::*, select};
use serde::Deserialize;

use crate::{
    arenas::Arena,
    permission::AdminUser,
    schema::{arenas, matches, tournaments},
    state::Conn,
    util_resp::{
        ApiJson, FailureResponse, StandardResponse, bad_request, created_data,
        message,
    },
    validation::{non_blank, parse_id},
};

#[derive(Deserialize)]
pub struct ArenaForm {
    pub name: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
}

#[tracing::instrument(skip_all)]
pub async fn create_arena(
    AdminUser(admin): AdminUser,
    mut conn: Conn<true>,
    ApiJson(form): ApiJson<ArenaForm>,
) -> StandardResponse {
    let Some(name) = non_blank(form.name.as_deref()) else {
        return bad_request("Arena name is required");
    };

    let arena = insert_into(arenas::table)
        .values((
            arenas::name.eq(name),
            arenas::city.eq(non_blank(form.city.as_deref())),
            arenas::address.eq(non_blank(form.address.as_deref())),
            arenas::created_at.eq(Utc::now().naive_utc()),
        ))
        .returning(Arena::as_returning())
        .get_result(&mut *conn)?;

    tracing::info!(admin_id = admin.id, arena_id = arena.id, "created arena");
    created_data(arena)
}

#[tracing::instrument(skip_all)]
pub async fn delete_arena(
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let id = parse_id(&id, "arena")?;
    Arena::fetch(id, &mut *conn)?;

    let has_tournaments = select(exists(
        tournaments::table.filter(tournaments::arena_id.eq(id)),
    ))
    .get_result::<bool>(&mut *conn)?;
    let has_matches =
        select(exists(matches::table.filter(matches::arena_id.eq(id))))
            .get_result::<bool>(&mut *conn)?;

    if has_tournaments || has_matches {
        return Err(FailureResponse::Conflict(
            "Arena is in use by tournaments or matches".to_string(),
        ));
    }

    diesel::delete(arenas::table.filter(arenas::id.eq(id)))
        .execute(&mut *conn)?;

    tracing::info!(admin_id = admin.id, arena_id = id, "deleted arena");
    message("Arena deleted successfully")
}
