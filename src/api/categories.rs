//! Category handlers: public listing, admin-only writes.

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
    models::{Category, NewCategory},
    policy,
    validate::{validate_name, validate_slug},
};

#[derive(Deserialize)]
pub(super) struct CategoryRequest {
    name: String,
    slug: String,
}

/// `GET /categories`: public listing with an optional name search.
pub(super) async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Category>>> {
    let (limit, offset) = query.limit_offset();
    let search = query.search.as_deref();
    let mut conn = acquire(&state.pool).await?;
    let count = db::count_categories(&mut conn, search).await?;
    let results = db::list_categories(&mut conn, search, limit, offset).await?;
    Ok(Json(Page { count, results }))
}

/// `POST /categories`: admin-only creation.
pub(super) async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    policy::admin_or_read_only(false, Some(&actor))?;
    validate_name(&req.name)?;
    validate_slug(&req.slug)?;
    let mut conn = acquire(&state.pool).await?;
    let category = db::create_category(
        &mut conn,
        &NewCategory {
            name: &req.name,
            slug: &req.slug,
        },
    )
    .await
    .map_err(|e| Error::from(e).or_conflict("slug", "slug already in use"))?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// `DELETE /categories/{slug}`: admin-only removal; titles keep existing
/// without a category.
pub(super) async fn destroy(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(slug): Path<String>,
) -> Result<StatusCode> {
    policy::admin_or_read_only(false, Some(&actor))?;
    let mut conn = acquire(&state.pool).await?;
    let removed = db::delete_category_by_slug(&mut conn, &slug).await?;
    if removed == 0 {
        return Err(Error::NotFound("category"));
    }
    Ok(StatusCode::NO_CONTENT)
}
