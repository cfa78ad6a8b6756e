//! Comment queries.

use diesel::{prelude::*, result::QueryResult};
use diesel_async::RunQueryDsl;

use super::connection::DbConnection;
use crate::models::{Comment, NewComment};

/// Insert a comment and return the stored row.
///
/// # Errors
/// Returns any error produced by the insertion query.
pub async fn create_comment(
    conn: &mut DbConnection,
    comment: &NewComment<'_>,
) -> QueryResult<Comment> {
    use crate::schema::comments::dsl::comments;
    diesel::insert_into(comments)
        .values(comment)
        .returning(Comment::as_returning())
        .get_result(conn)
        .await
}

/// Look up a comment by id, scoped to its parent review.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn get_comment(
    conn: &mut DbConnection,
    review: i32,
    comment_id: i32,
) -> QueryResult<Option<Comment>> {
    use crate::schema::comments::dsl::{comments, id, review_id};
    comments
        .filter(review_id.eq(review))
        .filter(id.eq(comment_id))
        .select(Comment::as_select())
        .first(conn)
        .await
        .optional()
}

/// List comments on a review, newest first.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn list_comments(
    conn: &mut DbConnection,
    review: i32,
    limit: i64,
    offset: i64,
) -> QueryResult<Vec<Comment>> {
    use crate::schema::comments::dsl::{comments, pub_date, review_id};
    comments
        .filter(review_id.eq(review))
        .order(pub_date.desc())
        .limit(limit)
        .offset(offset)
        .select(Comment::as_select())
        .load(conn)
        .await
}

/// Count comments on a review.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn count_comments(conn: &mut DbConnection, review: i32) -> QueryResult<i64> {
    use crate::schema::comments::dsl::{comments, review_id};
    comments
        .filter(review_id.eq(review))
        .count()
        .get_result(conn)
        .await
}

/// Replace a comment's text and return the stored row.
///
/// # Errors
/// Returns any error produced by the update query.
pub async fn update_comment_text(
    conn: &mut DbConnection,
    comment_id: i32,
    new_text: &str,
) -> QueryResult<Comment> {
    use crate::schema::comments::dsl::{comments, id, text};
    diesel::update(comments.filter(id.eq(comment_id)))
        .set(text.eq(new_text))
        .returning(Comment::as_returning())
        .get_result(conn)
        .await
}

/// Delete a comment.
///
/// # Errors
/// Returns any error produced by the deletion query.
pub async fn delete_comment(conn: &mut DbConnection, comment_id: i32) -> QueryResult<usize> {
    use crate::schema::comments::dsl::{comments, id};
    diesel::delete(comments.filter(id.eq(comment_id)))
        .execute(conn)
        .await
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;

    use super::*;
    use crate::{
        db::{
            reviews::{create_review, delete_review},
            test_support::{new_user, test_conn},
            titles::create_title,
            users::create_user,
        },
        models::{NewReview, NewTitle},
    };

    async fn seed_review(conn: &mut DbConnection) -> (i32, i32) {
        let title = create_title(
            conn,
            &NewTitle {
                name: "Stalker",
                year: 1979,
                description: None,
                category_id: None,
            },
            &[],
        )
        .await
        .expect("insert title");
        let user = create_user(conn, &new_user("alice", "alice@example.com"))
            .await
            .expect("insert user");
        let review = create_review(
            conn,
            &NewReview {
                title_id: title.id,
                author_id: user.id,
                text: "slow and perfect",
                score: 10,
                pub_date: Utc::now().naive_utc(),
            },
        )
        .await
        .expect("insert review");
        (review.id, user.id)
    }

    #[rstest]
    #[tokio::test]
    async fn create_update_delete_round_trip() {
        let mut conn = test_conn().await;
        let (review_id, author_id) = seed_review(&mut conn).await;
        let comment = create_comment(
            &mut conn,
            &NewComment {
                review_id,
                author_id,
                text: "agreed",
                pub_date: Utc::now().naive_utc(),
            },
        )
        .await
        .expect("insert");

        let updated = update_comment_text(&mut conn, comment.id, "strongly agreed")
            .await
            .expect("update");
        assert_eq!(updated.text, "strongly agreed");

        assert_eq!(delete_comment(&mut conn, comment.id).await.expect("delete"), 1);
        assert_eq!(count_comments(&mut conn, review_id).await.expect("count"), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_review_cascades_to_comments() {
        let mut conn = test_conn().await;
        let (review_id, author_id) = seed_review(&mut conn).await;
        create_comment(
            &mut conn,
            &NewComment {
                review_id,
                author_id,
                text: "agreed",
                pub_date: Utc::now().naive_utc(),
            },
        )
        .await
        .expect("insert");
        delete_review(&mut conn, review_id).await.expect("delete");
        assert_eq!(count_comments(&mut conn, review_id).await.expect("count"), 0);
    }
}
