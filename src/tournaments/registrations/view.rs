use axum::extract::Path;
use diesel::prelude::*;

use crate::{
    schema::tournament_registrations,
    state::Conn,
    tournaments::{
        Tournament,
        registrations::{Registration, RegistrationView},
    },
    util_resp::{StandardResponse, success},
    validation::parse_id,
};

pub async fn list_registrations(
    Path(tournament_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let tournament_id = parse_id(&tournament_id, "tournament")?;
    Tournament::fetch(tournament_id, &mut *conn)?;

    let registrations = tournament_registrations::table
        .filter(tournament_registrations::tournament_id.eq(tournament_id))
        .order((
            tournament_registrations::registration_date.asc(),
            tournament_registrations::id.asc(),
        ))
        .select(Registration::as_select())
        .load::<Registration>(&mut *conn)?;

    success(RegistrationView::load_many(registrations, &mut *conn)?)
}
