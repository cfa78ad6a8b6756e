//! Review queries.
//!
//! The one-review-per-(title, author) invariant lives here twice: an
//! existence pre-check for a friendly error, and the unique constraint in
//! the schema as the authoritative backstop against racing inserts.

use diesel::{prelude::*, result::QueryResult};
use diesel_async::RunQueryDsl;

use super::connection::DbConnection;
use crate::models::{NewReview, Review, ReviewChanges};

/// Insert a review and return the stored row.
///
/// # Errors
/// Returns any error produced by the insertion query; a second review by
/// the same author on the same title raises the unique-violation.
pub async fn create_review(conn: &mut DbConnection, review: &NewReview<'_>) -> QueryResult<Review> {
    use crate::schema::reviews::dsl::reviews;
    diesel::insert_into(reviews)
        .values(review)
        .returning(Review::as_returning())
        .get_result(conn)
        .await
}

/// Has `author_id` already reviewed `title_id`?
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn review_exists(
    conn: &mut DbConnection,
    title: i32,
    author: i32,
) -> QueryResult<bool> {
    use crate::schema::reviews::dsl::{author_id, reviews, title_id};
    let found: i64 = reviews
        .filter(title_id.eq(title))
        .filter(author_id.eq(author))
        .count()
        .get_result(conn)
        .await?;
    Ok(found > 0)
}

/// Look up a review by id, scoped to its parent title.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn get_review(
    conn: &mut DbConnection,
    title: i32,
    review_id: i32,
) -> QueryResult<Option<Review>> {
    use crate::schema::reviews::dsl::{id, reviews, title_id};
    reviews
        .filter(title_id.eq(title))
        .filter(id.eq(review_id))
        .select(Review::as_select())
        .first(conn)
        .await
        .optional()
}

/// List reviews for a title, newest first.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn list_reviews(
    conn: &mut DbConnection,
    title: i32,
    limit: i64,
    offset: i64,
) -> QueryResult<Vec<Review>> {
    use crate::schema::reviews::dsl::{pub_date, reviews, title_id};
    reviews
        .filter(title_id.eq(title))
        .order(pub_date.desc())
        .limit(limit)
        .offset(offset)
        .select(Review::as_select())
        .load(conn)
        .await
}

/// Count reviews for a title.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn count_reviews(conn: &mut DbConnection, title: i32) -> QueryResult<i64> {
    use crate::schema::reviews::dsl::{reviews, title_id};
    reviews
        .filter(title_id.eq(title))
        .count()
        .get_result(conn)
        .await
}

/// Apply a partial update to a review and return the stored row.
///
/// # Errors
/// Returns any error produced by the update query.
pub async fn update_review(
    conn: &mut DbConnection,
    review_id: i32,
    changes: &ReviewChanges,
) -> QueryResult<Review> {
    use crate::schema::reviews::dsl::{id, reviews};
    diesel::update(reviews.filter(id.eq(review_id)))
        .set(changes)
        .returning(Review::as_returning())
        .get_result(conn)
        .await
}

/// Delete a review; its comments go with it via the storage-level cascade.
///
/// # Errors
/// Returns any error produced by the deletion query.
pub async fn delete_review(conn: &mut DbConnection, review_id: i32) -> QueryResult<usize> {
    use crate::schema::reviews::dsl::{id, reviews};
    diesel::delete(reviews.filter(id.eq(review_id)))
        .execute(conn)
        .await
}

/// Load the scores of every review attached to any of `title_ids`.
///
/// Feeds the derived rating; see
/// [`mean_rating`](crate::db::titles::mean_rating).
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn scores_for_titles(
    conn: &mut DbConnection,
    title_ids: &[i32],
) -> QueryResult<Vec<(i32, i32)>> {
    use crate::schema::reviews::dsl::{reviews, score, title_id};
    reviews
        .filter(title_id.eq_any(title_ids))
        .select((title_id, score))
        .load(conn)
        .await
}
