//! Comment handlers, nested under a review within a title.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AppState, LimitOffsetQuery, Page, acquire, extract::CurrentUser};
use crate::{
    db::{self, DbConnection},
    error::{Error, Result},
    models::{Comment, NewComment, Review, User},
    policy,
    validate::validate_text,
};

/// A comment with its author resolved to a username.
#[derive(Serialize)]
pub(super) struct CommentOut {
    id: i32,
    author: String,
    text: String,
    pub_date: NaiveDateTime,
}

#[derive(Deserialize)]
pub(super) struct CommentRequest {
    text: String,
}

#[derive(Deserialize)]
pub(super) struct UpdateCommentRequest {
    text: Option<String>,
}

/// Resolve both parents; a comment id only means something within its
/// review, and a review id within its title.
async fn require_review(
    conn: &mut DbConnection,
    title_id: i32,
    review_id: i32,
) -> Result<Review> {
    db::get_title(conn, title_id)
        .await?
        .ok_or(Error::NotFound("title"))?;
    db::get_review(conn, title_id, review_id)
        .await?
        .ok_or(Error::NotFound("review"))
}

async fn with_authors(conn: &mut DbConnection, comments: Vec<Comment>) -> Result<Vec<CommentOut>> {
    let ids: Vec<i32> = comments.iter().map(|c| c.author_id).collect();
    let names: std::collections::HashMap<i32, String> =
        db::usernames_by_ids(conn, &ids).await?.into_iter().collect();
    Ok(comments
        .into_iter()
        .map(|comment| CommentOut {
            id: comment.id,
            author: names.get(&comment.author_id).cloned().unwrap_or_default(),
            text: comment.text,
            pub_date: comment.pub_date,
        })
        .collect())
}

async fn single_out(conn: &mut DbConnection, comment: Comment) -> Result<CommentOut> {
    let mut out = with_authors(conn, vec![comment]).await?;
    out.pop().ok_or(Error::NotFound("comment"))
}

/// `GET .../comments`: public listing, newest first.
pub(super) async fn list(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    Query(query): Query<LimitOffsetQuery>,
) -> Result<Json<Page<CommentOut>>> {
    let mut conn = acquire(&state.pool).await?;
    let review = require_review(&mut conn, title_id, review_id).await?;
    let (limit, offset) = query.limit_offset();
    let count = db::count_comments(&mut conn, review.id).await?;
    let comments = db::list_comments(&mut conn, review.id, limit, offset).await?;
    let results = with_authors(&mut conn, comments).await?;
    Ok(Json(Page { count, results }))
}

/// `POST .../comments`: any authenticated user may comment.
pub(super) async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path((title_id, review_id)): Path<(i32, i32)>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentOut>)> {
    policy::content_list(false, Some(&actor))?;
    validate_text(&req.text)?;
    let mut conn = acquire(&state.pool).await?;
    let review = require_review(&mut conn, title_id, review_id).await?;
    let comment = db::create_comment(
        &mut conn,
        &NewComment {
            review_id: review.id,
            author_id: actor.id,
            text: &req.text,
            pub_date: Utc::now().naive_utc(),
        },
    )
    .await?;
    let out = single_out(&mut conn, comment).await?;
    Ok((StatusCode::CREATED, Json(out)))
}

/// `GET .../comments/{comment_id}`: public lookup.
pub(super) async fn retrieve(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
) -> Result<Json<CommentOut>> {
    let mut conn = acquire(&state.pool).await?;
    let review = require_review(&mut conn, title_id, review_id).await?;
    let comment = db::get_comment(&mut conn, review.id, comment_id)
        .await?
        .ok_or(Error::NotFound("comment"))?;
    let out = single_out(&mut conn, comment).await?;
    Ok(Json(out))
}

async fn load_for_write(
    conn: &mut DbConnection,
    actor: &User,
    title_id: i32,
    review_id: i32,
    comment_id: i32,
) -> Result<Comment> {
    let review = require_review(conn, title_id, review_id).await?;
    let comment = db::get_comment(conn, review.id, comment_id)
        .await?
        .ok_or(Error::NotFound("comment"))?;
    policy::content_object(Some(actor), comment.author_id)?;
    Ok(comment)
}

/// `PATCH .../comments/{comment_id}`: author, moderator, or admin.
pub(super) async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<CommentOut>> {
    if let Some(text) = &req.text {
        validate_text(text)?;
    }
    let mut conn = acquire(&state.pool).await?;
    let comment = load_for_write(&mut conn, &actor, title_id, review_id, comment_id).await?;
    let comment = match req.text {
        Some(text) => db::update_comment_text(&mut conn, comment.id, &text).await?,
        None => comment,
    };
    let out = single_out(&mut conn, comment).await?;
    Ok(Json(out))
}

/// `DELETE .../comments/{comment_id}`: author, moderator, or admin.
pub(super) async fn destroy(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
) -> Result<StatusCode> {
    let mut conn = acquire(&state.pool).await?;
    let comment = load_for_write(&mut conn, &actor, title_id, review_id, comment_id).await?;
    db::delete_comment(&mut conn, comment.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
