//! Title handlers.
//!
//! The listing hydrates each row with its category, genres, and the derived
//! rating, then orders and paginates in-process: the rating is computed from
//! review scores rather than stored, so it cannot drive SQL ordering.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Deserializer, Serialize};

use super::{AppState, LimitOffsetQuery, Page, acquire, extract::CurrentUser};
use crate::{
    db::{
        self, DbConnection, TitleQuery, genres_for_titles, mean_rating, scores_for_titles,
    },
    error::{Error, Result},
    models::{Category, Genre, NewTitle, Title, TitleChanges},
    policy,
    validate::{validate_name, validate_year},
};

/// A title with its derived rating and hydrated relations.
#[derive(Serialize)]
pub(super) struct TitleOut {
    id: i32,
    name: String,
    year: i32,
    rating: Option<i32>,
    description: Option<String>,
    genre: Vec<Genre>,
    category: Option<Category>,
}

#[derive(Deserialize)]
pub(super) struct CreateTitleRequest {
    name: String,
    year: i32,
    description: Option<String>,
    #[serde(default)]
    genre: Vec<String>,
    category: Option<String>,
}

/// Distinguishes an absent `category` (leave alone) from an explicit null
/// (clear it).
fn double_option<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
pub(super) struct UpdateTitleRequest {
    name: Option<String>,
    year: Option<i32>,
    description: Option<String>,
    genre: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    category: Option<Option<String>>,
}

// Flattening `LimitOffsetQuery` here would break extraction: the query
// deserializer cannot see through `#[serde(flatten)]` to the numeric types.
#[derive(Deserialize)]
pub(super) struct TitleListQuery {
    category: Option<String>,
    genre: Option<String>,
    name: Option<String>,
    year: Option<i32>,
    ordering: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl TitleListQuery {
    fn page(&self) -> LimitOffsetQuery {
        LimitOffsetQuery {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

async fn resolve_category(conn: &mut DbConnection, slug: &str) -> Result<i32> {
    db::get_category_by_slug(conn, slug)
        .await?
        .map(|c| c.id)
        .ok_or_else(|| Error::invalid("category", format!("unknown category slug: {slug}")))
}

async fn resolve_genres(conn: &mut DbConnection, slugs: &[String]) -> Result<Vec<i32>> {
    let found = db::get_genres_by_slugs(conn, slugs).await?;
    if found.len() != slugs.len() {
        let known: Vec<&str> = found.iter().map(|g| g.slug.as_str()).collect();
        let missing = slugs
            .iter()
            .find(|s| !known.contains(&s.as_str()))
            .map_or_else(String::new, Clone::clone);
        return Err(Error::invalid(
            "genre",
            format!("unknown genre slug: {missing}"),
        ));
    }
    Ok(found.into_iter().map(|g| g.id).collect())
}

/// Attach categories, genres, and derived ratings to a batch of titles.
async fn hydrate(conn: &mut DbConnection, titles: Vec<Title>) -> Result<Vec<TitleOut>> {
    let ids: Vec<i32> = titles.iter().map(|t| t.id).collect();

    let mut genres: HashMap<i32, Vec<Genre>> = HashMap::new();
    for (title_id, genre) in genres_for_titles(conn, &ids).await? {
        genres.entry(title_id).or_default().push(genre);
    }

    let mut scores: HashMap<i32, Vec<i32>> = HashMap::new();
    for (title_id, score) in scores_for_titles(conn, &ids).await? {
        scores.entry(title_id).or_default().push(score);
    }

    let category_ids: Vec<i32> = titles.iter().filter_map(|t| t.category_id).collect();
    let categories: HashMap<i32, Category> = db::get_categories_by_ids(conn, &category_ids)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    Ok(titles
        .into_iter()
        .map(|title| TitleOut {
            rating: scores
                .get(&title.id)
                .and_then(|title_scores| mean_rating(title_scores)),
            genre: genres.remove(&title.id).unwrap_or_default(),
            category: title.category_id.and_then(|cid| categories.get(&cid).cloned()),
            id: title.id,
            name: title.name,
            year: title.year,
            description: title.description,
        })
        .collect())
}

fn apply_ordering(items: &mut [TitleOut], ordering: Option<&str>) {
    let Some(ordering) = ordering else { return };
    let (field, descending) = match ordering.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (ordering, false),
    };
    match field {
        "name" => items.sort_by(|a, b| a.name.cmp(&b.name)),
        "year" => items.sort_by_key(|t| t.year),
        // Unrated titles sort last in both directions.
        "rating" => {
            items.sort_by(|a, b| match (a.rating, b.rating) {
                (Some(x), Some(y)) if descending => y.cmp(&x),
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
            return;
        }
        _ => return,
    }
    if descending {
        items.reverse();
    }
}

/// `GET /titles`: public listing with filters, ordering, and pagination.
pub(super) async fn list(
    State(state): State<AppState>,
    Query(query): Query<TitleListQuery>,
) -> Result<Json<Page<TitleOut>>> {
    let mut conn = acquire(&state.pool).await?;

    // An unknown filter slug yields an empty page rather than an error.
    let mut filter = TitleQuery {
        name: query.name.clone(),
        year: query.year,
        ..TitleQuery::default()
    };
    let mut unmatched_filter = false;
    if let Some(slug) = query.category.as_deref() {
        match db::get_category_by_slug(&mut conn, slug).await? {
            Some(category) => filter.category_id = Some(category.id),
            None => unmatched_filter = true,
        }
    }
    if let Some(slug) = query.genre.as_deref() {
        match db::get_genre_by_slug(&mut conn, slug).await? {
            Some(genre) => filter.genre_id = Some(genre.id),
            None => unmatched_filter = true,
        }
    }
    if unmatched_filter {
        return Ok(Json(Page {
            count: 0,
            results: Vec::new(),
        }));
    }

    let titles = db::list_titles(&mut conn, &filter).await?;
    let mut items = hydrate(&mut conn, titles).await?;
    apply_ordering(&mut items, query.ordering.as_deref());

    let count = i64::try_from(items.len()).unwrap_or(i64::MAX);
    let (limit, offset) = query.page().limit_offset();
    let results = items
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(0))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect();
    Ok(Json(Page { count, results }))
}

/// `POST /titles`: admin-only creation with genre links.
pub(super) async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<CreateTitleRequest>,
) -> Result<(StatusCode, Json<TitleOut>)> {
    policy::admin_or_read_only(false, Some(&actor))?;
    validate_name(&req.name)?;
    validate_year(req.year)?;
    let mut conn = acquire(&state.pool).await?;
    let category_id = match req.category.as_deref() {
        Some(slug) => Some(resolve_category(&mut conn, slug).await?),
        None => None,
    };
    let genre_ids = resolve_genres(&mut conn, &req.genre).await?;
    let title = db::create_title(
        &mut conn,
        &NewTitle {
            name: &req.name,
            year: req.year,
            description: req.description.as_deref(),
            category_id,
        },
        &genre_ids,
    )
    .await
    .map_err(|e| Error::from(e).or_conflict("name", "title name already in use"))?;
    let mut hydrated = hydrate(&mut conn, vec![title]).await?;
    let out = hydrated.pop().ok_or(Error::NotFound("title"))?;
    Ok((StatusCode::CREATED, Json(out)))
}

/// `GET /titles/{title_id}`: public lookup.
pub(super) async fn retrieve(
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
) -> Result<Json<TitleOut>> {
    let mut conn = acquire(&state.pool).await?;
    let title = db::get_title(&mut conn, title_id)
        .await?
        .ok_or(Error::NotFound("title"))?;
    let mut hydrated = hydrate(&mut conn, vec![title]).await?;
    let out = hydrated.pop().ok_or(Error::NotFound("title"))?;
    Ok(Json(out))
}

/// `PATCH /titles/{title_id}`: admin-only partial update.
pub(super) async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(title_id): Path<i32>,
    Json(req): Json<UpdateTitleRequest>,
) -> Result<Json<TitleOut>> {
    policy::admin_or_read_only(false, Some(&actor))?;
    if let Some(name) = &req.name {
        validate_name(name)?;
    }
    if let Some(year) = req.year {
        validate_year(year)?;
    }
    let mut conn = acquire(&state.pool).await?;
    if db::get_title(&mut conn, title_id).await?.is_none() {
        return Err(Error::NotFound("title"));
    }
    let category_id = match &req.category {
        Some(Some(slug)) => Some(Some(resolve_category(&mut conn, slug).await?)),
        Some(None) => Some(None),
        None => None,
    };
    let genre_ids = match &req.genre {
        Some(slugs) => Some(resolve_genres(&mut conn, slugs).await?),
        None => None,
    };
    let changes = TitleChanges {
        name: req.name,
        year: req.year,
        description: req.description,
        category_id,
    };
    let title = db::update_title(&mut conn, title_id, &changes, genre_ids.as_deref())
        .await
        .map_err(|e| Error::from(e).or_conflict("name", "title name already in use"))?;
    let mut hydrated = hydrate(&mut conn, vec![title]).await?;
    let out = hydrated.pop().ok_or(Error::NotFound("title"))?;
    Ok(Json(out))
}

/// `DELETE /titles/{title_id}`: admin-only removal; reviews and comments
/// cascade away.
pub(super) async fn destroy(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(title_id): Path<i32>,
) -> Result<StatusCode> {
    policy::admin_or_read_only(false, Some(&actor))?;
    let mut conn = acquire(&state.pool).await?;
    let removed = db::delete_title(&mut conn, title_id).await?;
    if removed == 0 {
        return Err(Error::NotFound("title"));
    }
    Ok(StatusCode::NO_CONTENT)
}
