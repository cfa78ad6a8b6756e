//! Genre queries.

use diesel::{prelude::*, result::QueryResult};
use diesel_async::RunQueryDsl;

use super::connection::DbConnection;
use crate::models::{Genre, NewGenre};

/// Insert a new genre and return the stored row.
///
/// # Errors
/// Returns any error produced by the insertion query, including the
/// unique-violation for duplicate names or slugs.
pub async fn create_genre(conn: &mut DbConnection, genre: &NewGenre<'_>) -> QueryResult<Genre> {
    use crate::schema::genres::dsl::genres;
    diesel::insert_into(genres)
        .values(genre)
        .returning(Genre::as_returning())
        .get_result(conn)
        .await
}

/// Look up a genre by its slug.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn get_genre_by_slug(
    conn: &mut DbConnection,
    slug_value: &str,
) -> QueryResult<Option<Genre>> {
    use crate::schema::genres::dsl::{genres, slug};
    genres
        .filter(slug.eq(slug_value))
        .select(Genre::as_select())
        .first(conn)
        .await
        .optional()
}

/// Resolve a set of slugs to genre rows, preserving request order.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn get_genres_by_slugs(
    conn: &mut DbConnection,
    slugs: &[String],
) -> QueryResult<Vec<Genre>> {
    use crate::schema::genres::dsl::{genres, slug};
    let mut found: Vec<Genre> = genres
        .filter(slug.eq_any(slugs))
        .select(Genre::as_select())
        .load(conn)
        .await?;
    found.sort_by_key(|g| slugs.iter().position(|s| *s == g.slug));
    Ok(found)
}

/// Delete a genre by slug; join rows referencing it null out via the
/// storage-level set-null action.
///
/// # Errors
/// Returns any error produced by the deletion query.
pub async fn delete_genre_by_slug(conn: &mut DbConnection, slug_value: &str) -> QueryResult<usize> {
    use crate::schema::genres::dsl::{genres, slug};
    diesel::delete(genres.filter(slug.eq(slug_value)))
        .execute(conn)
        .await
}

/// List genres ordered by name, optionally filtered by a name substring.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn list_genres(
    conn: &mut DbConnection,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> QueryResult<Vec<Genre>> {
    use crate::schema::genres::dsl::{genres, name};
    let mut query = genres.into_boxed();
    if let Some(needle) = search {
        query = query.filter(name.like(format!("%{needle}%")));
    }
    query
        .order(name.asc())
        .limit(limit)
        .offset(offset)
        .select(Genre::as_select())
        .load(conn)
        .await
}

/// Count genres matching the optional name substring.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn count_genres(conn: &mut DbConnection, search: Option<&str>) -> QueryResult<i64> {
    use crate::schema::genres::dsl::{genres, name};
    let mut query = genres.into_boxed();
    if let Some(needle) = search {
        query = query.filter(name.like(format!("%{needle}%")));
    }
    query.count().get_result(conn).await
}
