use chrono::NaiveDateTime;
use diesel::{prelude::*, sqlite::Sqlite};
use serde::Serialize;

use crate::{schema::posts, users::PostAuthor};

pub mod create;
pub mod view;

pub const MAX_CONTENT_LEN: usize = 2000;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i32,
    pub user_id: i32,
    pub content_text: String,
    pub image_url: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub user: PostAuthor,
}
