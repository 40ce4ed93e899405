use axum::extract::Path;
use diesel::prelude::*;

use crate::{
    arenas::{Arena, ArenaSummary},
    schema::arenas,
    state::Conn,
    util_resp::{StandardResponse, data},
    validation::parse_id,
};

pub async fn list_arenas(mut conn: Conn<false>) -> StandardResponse {
    let arenas = arenas::table
        .order((arenas::name.asc(), arenas::id.asc()))
        .select(ArenaSummary::as_select())
        .load::<ArenaSummary>(&mut *conn)?;

    data(arenas)
}

pub async fn get_arena(
    Path(id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let id = parse_id(&id, "arena")?;
    data(Arena::fetch(id, &mut *conn)?)
}
