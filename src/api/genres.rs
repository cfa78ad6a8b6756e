//! Genre handlers: public listing, admin-only writes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use super::{AppState, Page, PageQuery, acquire, extract::CurrentUser};
use crate::{
    db,
    error::{Error, Result},
    models::{Genre, NewGenre},
    policy,
    validate::{validate_name, validate_slug},
};

#[derive(Deserialize)]
pub(super) struct GenreRequest {
    name: String,
    slug: String,
}

/// `GET /genres`: public listing with an optional name search.
pub(super) async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Genre>>> {
    let (limit, offset) = query.limit_offset();
    let search = query.search.as_deref();
    let mut conn = acquire(&state.pool).await?;
    let count = db::count_genres(&mut conn, search).await?;
    let results = db::list_genres(&mut conn, search, limit, offset).await?;
    Ok(Json(Page { count, results }))
}

/// `POST /genres`: admin-only creation.
pub(super) async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<GenreRequest>,
) -> Result<(StatusCode, Json<Genre>)> {
    policy::admin_or_read_only(false, Some(&actor))?;
    validate_name(&req.name)?;
    validate_slug(&req.slug)?;
    let mut conn = acquire(&state.pool).await?;
    let genre = db::create_genre(
        &mut conn,
        &NewGenre {
            name: &req.name,
            slug: &req.slug,
        },
    )
    .await
    .map_err(|e| Error::from(e).or_conflict("slug", "slug already in use"))?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// `DELETE /genres/{slug}`: admin-only removal; titles keep existing, the
/// link rows null out.
pub(super) async fn destroy(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(slug): Path<String>,
) -> Result<StatusCode> {
    policy::admin_or_read_only(false, Some(&actor))?;
    let mut conn = acquire(&state.pool).await?;
    let removed = db::delete_genre_by_slug(&mut conn, &slug).await?;
    if removed == 0 {
        return Err(Error::NotFound("genre"));
    }
    Ok(StatusCode::NO_CONTENT)
}
