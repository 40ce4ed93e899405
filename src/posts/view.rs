use diesel::prelude::*;

use crate::{
    auth::AuthUser,
    posts::{Post, PostView},
    schema::{posts, users},
    state::Conn,
    users::PostAuthor,
    util_resp::{StandardResponse, data_with_count},
};

pub async fn list_posts(_user: AuthUser, mut conn: Conn<false>) -> StandardResponse {
    let feed = posts::table
        .inner_join(users::table)
        .order((posts::created_at.desc(), posts::id.desc()))
        .select((Post::as_select(), PostAuthor::as_select()))
        .load::<(Post, PostAuthor)>(&mut *conn)?
        .into_iter()
        .map(|(post, user)| PostView { post, user })
        .collect::<Vec<_>>();

    data_with_count(feed)
}
