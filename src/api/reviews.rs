//! Review handlers, nested under a title.
//!
//! Every operation resolves the parent title first, so a review id is only
//! meaningful within the title it belongs to.

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
    models::{NewReview, Review, ReviewChanges, User},
    policy,
    validate::{validate_score, validate_text},
};

/// A review with its author resolved to a username.
#[derive(Serialize)]
pub(super) struct ReviewOut {
    id: i32,
    author: String,
    text: String,
    score: i32,
    pub_date: NaiveDateTime,
}

#[derive(Deserialize)]
pub(super) struct CreateReviewRequest {
    text: String,
    score: i32,
}

#[derive(Deserialize)]
pub(super) struct UpdateReviewRequest {
    text: Option<String>,
    score: Option<i32>,
}

async fn require_title(conn: &mut DbConnection, title_id: i32) -> Result<()> {
    db::get_title(conn, title_id)
        .await?
        .map(|_| ())
        .ok_or(Error::NotFound("title"))
}

/// Resolve author ids to usernames for a batch of reviews.
async fn with_authors(conn: &mut DbConnection, reviews: Vec<Review>) -> Result<Vec<ReviewOut>> {
    let ids: Vec<i32> = reviews.iter().map(|r| r.author_id).collect();
    let names: std::collections::HashMap<i32, String> =
        db::usernames_by_ids(conn, &ids).await?.into_iter().collect();
    Ok(reviews
        .into_iter()
        .map(|review| ReviewOut {
            id: review.id,
            author: names.get(&review.author_id).cloned().unwrap_or_default(),
            text: review.text,
            score: review.score,
            pub_date: review.pub_date,
        })
        .collect())
}

async fn single_out(conn: &mut DbConnection, review: Review) -> Result<ReviewOut> {
    let mut out = with_authors(conn, vec![review]).await?;
    out.pop().ok_or(Error::NotFound("review"))
}

/// `GET /titles/{title_id}/reviews`: public listing, newest first.
pub(super) async fn list(
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
    Query(query): Query<LimitOffsetQuery>,
) -> Result<Json<Page<ReviewOut>>> {
    let mut conn = acquire(&state.pool).await?;
    require_title(&mut conn, title_id).await?;
    let (limit, offset) = query.limit_offset();
    let count = db::count_reviews(&mut conn, title_id).await?;
    let reviews = db::list_reviews(&mut conn, title_id, limit, offset).await?;
    let results = with_authors(&mut conn, reviews).await?;
    Ok(Json(Page { count, results }))
}

/// `POST /titles/{title_id}/reviews`: one review per author per title.
pub(super) async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(title_id): Path<i32>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewOut>)> {
    policy::content_list(false, Some(&actor))?;
    validate_text(&req.text)?;
    validate_score(req.score)?;
    let mut conn = acquire(&state.pool).await?;
    require_title(&mut conn, title_id).await?;
    // Friendly pre-check; the unique constraint still backstops races.
    if db::review_exists(&mut conn, title_id, actor.id).await? {
        return Err(Error::conflict(
            "title",
            "you have already reviewed this title",
        ));
    }
    let review = db::create_review(
        &mut conn,
        &NewReview {
            title_id,
            author_id: actor.id,
            text: &req.text,
            score: req.score,
            pub_date: Utc::now().naive_utc(),
        },
    )
    .await
    .map_err(|e| Error::from(e).or_conflict("title", "you have already reviewed this title"))?;
    let out = single_out(&mut conn, review).await?;
    Ok((StatusCode::CREATED, Json(out)))
}

/// `GET /titles/{title_id}/reviews/{review_id}`: public lookup.
pub(super) async fn retrieve(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
) -> Result<Json<ReviewOut>> {
    let mut conn = acquire(&state.pool).await?;
    require_title(&mut conn, title_id).await?;
    let review = db::get_review(&mut conn, title_id, review_id)
        .await?
        .ok_or(Error::NotFound("review"))?;
    let out = single_out(&mut conn, review).await?;
    Ok(Json(out))
}

async fn load_for_write(
    conn: &mut DbConnection,
    actor: &User,
    title_id: i32,
    review_id: i32,
) -> Result<Review> {
    require_title(conn, title_id).await?;
    let review = db::get_review(conn, title_id, review_id)
        .await?
        .ok_or(Error::NotFound("review"))?;
    policy::content_object(Some(actor), review.author_id)?;
    Ok(review)
}

/// `PATCH /titles/{title_id}/reviews/{review_id}`: author, moderator, or
/// admin.
pub(super) async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path((title_id, review_id)): Path<(i32, i32)>,
    Json(req): Json<UpdateReviewRequest>,
) -> Result<Json<ReviewOut>> {
    if let Some(text) = &req.text {
        validate_text(text)?;
    }
    if let Some(score) = req.score {
        validate_score(score)?;
    }
    let mut conn = acquire(&state.pool).await?;
    let review = load_for_write(&mut conn, &actor, title_id, review_id).await?;
    let changes = ReviewChanges {
        text: req.text,
        score: req.score,
    };
    let review = if changes.is_empty() {
        review
    } else {
        db::update_review(&mut conn, review.id, &changes).await?
    };
    let out = single_out(&mut conn, review).await?;
    Ok(Json(out))
}

/// `DELETE /titles/{title_id}/reviews/{review_id}`: author, moderator, or
/// admin; comments cascade away.
pub(super) async fn destroy(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path((title_id, review_id)): Path<(i32, i32)>,
) -> Result<StatusCode> {
    let mut conn = acquire(&state.pool).await?;
    let review = load_for_write(&mut conn, &actor, title_id, review_id).await?;
    db::delete_review(&mut conn, review.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
