use axum::extract::Path;
use chrono::Utc;
use diesel::{insert_into, prelude::*};
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    permission::ensure_owner_or_admin,
    posts::{MAX_CONTENT_LEN, Post},
    schema::posts,
    state::Conn,
    util_resp::{
        ApiJson, FailureResponse, StandardResponse, bad_request, created,
        message,
    },
    validation::{is_http_url, non_blank, parse_id},
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostForm {
    pub content_text: Option<String>,
    pub image_url: Option<String>,
}

#[tracing::instrument(skip_all)]
pub async fn create_post(
    user: AuthUser,
    mut conn: Conn<true>,
    ApiJson(form): ApiJson<PostForm>,
) -> StandardResponse {
    let Some(content) = non_blank(form.content_text.as_deref()) else {
        return bad_request("contentText is required");
    };
    if content.chars().count() > MAX_CONTENT_LEN {
        return bad_request(format!(
            "contentText must be at most {MAX_CONTENT_LEN} characters"
        ));
    }

    let image_url = non_blank(form.image_url.as_deref());
    if image_url.is_some_and(|url| !is_http_url(url)) {
        return bad_request("Invalid imageUrl");
    }

    let post = insert_into(posts::table)
        .values((
            posts::user_id.eq(user.id),
            posts::content_text.eq(content),
            posts::image_url.eq(image_url),
            posts::created_at.eq(Utc::now().naive_utc()),
        ))
        .returning(Post::as_returning())
        .get_result(&mut *conn)?;

    tracing::info!(user_id = user.id, post_id = post.id, "created post");
    created(post)
}

#[tracing::instrument(skip_all)]
pub async fn delete_post(
    user: AuthUser,
    Path(id): Path<String>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let id = parse_id(&id, "post")?;

    let author = posts::table
        .filter(posts::id.eq(id))
        .select(posts::user_id)
        .first::<i32>(&mut *conn)
        .optional()?
        .ok_or_else(|| FailureResponse::NotFound("Post not found".to_string()))?;
    ensure_owner_or_admin(&user, Some(author), "You can only delete your own posts")?;

    diesel::delete(posts::table.filter(posts::id.eq(id))).execute(&mut *conn)?;

    tracing::info!(user_id = user.id, post_id = id, "deleted post");
    message("Post deleted successfully")
}
