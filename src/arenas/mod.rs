use chrono::NaiveDateTime;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::Serialize;

use crate::{schema::arenas, util_resp::FailureResponse};

pub mod manage;
pub mod view;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = arenas)]
#[diesel(check_for_backend(Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Arena {
    pub id: i32,
    pub name: String,
    pub city: Option<String>,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Arena {
    pub fn fetch(
        id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Arena, FailureResponse> {
        arenas::table
            .filter(arenas::id.eq(id))
            .select(Arena::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| FailureResponse::NotFound("Arena not found".to_string()))
    }
}

/// The arena fields embedded in tournament listings.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = arenas)]
#[diesel(check_for_backend(Sqlite))]
pub struct ArenaSummary {
    pub id: i32,
    pub name: String,
    pub city: Option<String>,
}
