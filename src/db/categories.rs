//! Category queries.

use diesel::{prelude::*, result::QueryResult};
use diesel_async::RunQueryDsl;

use super::connection::DbConnection;
use crate::models::{Category, NewCategory};

/// Insert a new category and return the stored row.
///
/// # Errors
/// Returns any error produced by the insertion query, including the
/// unique-violation for duplicate names or slugs.
pub async fn create_category(
    conn: &mut DbConnection,
    cat: &NewCategory<'_>,
) -> QueryResult<Category> {
    use crate::schema::categories::dsl::categories;
    diesel::insert_into(categories)
        .values(cat)
        .returning(Category::as_returning())
        .get_result(conn)
        .await
}

/// Look up a category by its slug.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn get_category_by_slug(
    conn: &mut DbConnection,
    slug_value: &str,
) -> QueryResult<Option<Category>> {
    use crate::schema::categories::dsl::{categories, slug};
    categories
        .filter(slug.eq(slug_value))
        .select(Category::as_select())
        .first(conn)
        .await
        .optional()
}

/// Resolve a set of category ids to rows.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn get_categories_by_ids(
    conn: &mut DbConnection,
    ids: &[i32],
) -> QueryResult<Vec<Category>> {
    use crate::schema::categories::dsl::{categories, id};
    categories
        .filter(id.eq_any(ids))
        .select(Category::as_select())
        .load(conn)
        .await
}

/// Delete a category by slug; titles referencing it fall back to no
/// category via the storage-level set-null action.
///
/// # Errors
/// Returns any error produced by the deletion query.
pub async fn delete_category_by_slug(
    conn: &mut DbConnection,
    slug_value: &str,
) -> QueryResult<usize> {
    use crate::schema::categories::dsl::{categories, slug};
    diesel::delete(categories.filter(slug.eq(slug_value)))
        .execute(conn)
        .await
}

/// List categories ordered by name, optionally filtered by a name
/// substring.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn list_categories(
    conn: &mut DbConnection,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> QueryResult<Vec<Category>> {
    use crate::schema::categories::dsl::{categories, name};
    let mut query = categories.into_boxed();
    if let Some(needle) = search {
        query = query.filter(name.like(format!("%{needle}%")));
    }
    query
        .order(name.asc())
        .limit(limit)
        .offset(offset)
        .select(Category::as_select())
        .load(conn)
        .await
}

/// Count categories matching the optional name substring.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn count_categories(conn: &mut DbConnection, search: Option<&str>) -> QueryResult<i64> {
    use crate::schema::categories::dsl::{categories, name};
    let mut query = categories.into_boxed();
    if let Some(needle) = search {
        query = query.filter(name.like(format!("%{needle}%")));
    }
    query.count().get_result(conn).await
}
