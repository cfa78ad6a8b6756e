//! Title queries, including genre links and the derived rating.

use diesel::{prelude::*, result::QueryResult};
use diesel_async::{AsyncConnection, RunQueryDsl, scoped_futures::ScopedFutureExt};

use super::connection::DbConnection;
use crate::models::{Genre, NewTitle, NewTitleGenre, Title, TitleChanges};

/// Filter set applied to title listings. Slugs are resolved to ids by the
/// caller before reaching this layer.
#[derive(Debug, Default)]
pub struct TitleQuery {
    /// Restrict to one category.
    pub category_id: Option<i32>,
    /// Restrict to titles linked to one genre.
    pub genre_id: Option<i32>,
    /// Name substring match.
    pub name: Option<String>,
    /// Exact year match.
    pub year: Option<i32>,
}

async fn replace_genre_links(
    conn: &mut DbConnection,
    title_id: i32,
    genre_ids: &[i32],
) -> QueryResult<()> {
    use crate::schema::title_genres::dsl as tg;
    diesel::delete(tg::title_genres.filter(tg::title_id.eq(Some(title_id))))
        .execute(conn)
        .await?;
    let rows: Vec<NewTitleGenre> = genre_ids
        .iter()
        .map(|gid| NewTitleGenre {
            title_id: Some(title_id),
            genre_id: Some(*gid),
        })
        .collect();
    // diesel-async's SQLite backend cannot express a multi-row VALUES
    // insert, so the links go in one row at a time (still inside the
    // caller's transaction).
    for row in &rows {
        diesel::insert_into(tg::title_genres)
            .values(row)
            .execute(conn)
            .await?;
    }
    Ok(())
}

/// Insert a title together with its genre links in one transaction.
///
/// # Errors
/// Returns any error produced by the transaction; a duplicate name raises
/// the unique-violation.
pub async fn create_title(
    conn: &mut DbConnection,
    title: &NewTitle<'_>,
    genre_ids: &[i32],
) -> QueryResult<Title> {
    conn.transaction(|conn| {
        async move {
            use crate::schema::titles::dsl::titles;
            let stored: Title = diesel::insert_into(titles)
                .values(title)
                .returning(Title::as_returning())
                .get_result(conn)
                .await?;
            replace_genre_links(conn, stored.id, genre_ids).await?;
            Ok(stored)
        }
        .scope_boxed()
    })
    .await
}

/// Apply a partial update, optionally replacing the genre links, in one
/// transaction.
///
/// # Errors
/// Returns any error produced by the transaction, including
/// [`diesel::result::Error::NotFound`] when the title does not exist.
pub async fn update_title(
    conn: &mut DbConnection,
    title_id: i32,
    changes: &TitleChanges,
    genre_ids: Option<&[i32]>,
) -> QueryResult<Title> {
    conn.transaction(|conn| {
        async move {
            use crate::schema::titles::dsl::{id, titles};
            let stored: Title = if changes.is_empty() {
                titles
                    .filter(id.eq(title_id))
                    .select(Title::as_select())
                    .first(conn)
                    .await?
            } else {
                diesel::update(titles.filter(id.eq(title_id)))
                    .set(changes)
                    .returning(Title::as_returning())
                    .get_result(conn)
                    .await?
            };
            if let Some(ids) = genre_ids {
                replace_genre_links(conn, stored.id, ids).await?;
            }
            Ok(stored)
        }
        .scope_boxed()
    })
    .await
}

/// Look up a title by id.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn get_title(conn: &mut DbConnection, title_id: i32) -> QueryResult<Option<Title>> {
    use crate::schema::titles::dsl::{id, titles};
    titles
        .filter(id.eq(title_id))
        .select(Title::as_select())
        .first(conn)
        .await
        .optional()
}

/// Delete a title; its reviews (and their comments) go with it via the
/// storage-level cascade.
///
/// # Errors
/// Returns any error produced by the deletion query.
pub async fn delete_title(conn: &mut DbConnection, title_id: i32) -> QueryResult<usize> {
    use crate::schema::titles::dsl::{id, titles};
    diesel::delete(titles.filter(id.eq(title_id)))
        .execute(conn)
        .await
}

/// Load every title matching `query`, ordered by name.
///
/// Pagination and rating-based ordering happen in the handler layer: the
/// rating is derived, not stored, so it cannot participate in the SQL
/// ordering.
///
/// # Errors
/// Returns any error produced by the underlying database queries.
pub async fn list_titles(conn: &mut DbConnection, query: &TitleQuery) -> QueryResult<Vec<Title>> {
    use crate::schema::titles::dsl as t;

    let genre_restricted: Option<Vec<i32>> = match query.genre_id {
        Some(gid) => {
            use crate::schema::title_genres::dsl as tg;
            let linked: Vec<Option<i32>> = tg::title_genres
                .filter(tg::genre_id.eq(Some(gid)))
                .select(tg::title_id)
                .load(conn)
                .await?;
            Some(linked.into_iter().flatten().collect())
        }
        None => None,
    };

    let mut q = t::titles.into_boxed();
    if let Some(ids) = genre_restricted {
        q = q.filter(t::id.eq_any(ids));
    }
    if let Some(cid) = query.category_id {
        q = q.filter(t::category_id.eq(Some(cid)));
    }
    if let Some(needle) = &query.name {
        q = q.filter(t::name.like(format!("%{needle}%")));
    }
    if let Some(year) = query.year {
        q = q.filter(t::year.eq(year));
    }
    q.order(t::name.asc())
        .select(Title::as_select())
        .load(conn)
        .await
}

/// Load the genres linked to each of `title_ids`, ordered by genre name.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn genres_for_titles(
    conn: &mut DbConnection,
    title_ids: &[i32],
) -> QueryResult<Vec<(i32, Genre)>> {
    use crate::schema::{genres::dsl as g, title_genres::dsl as tg};
    let ids: Vec<Option<i32>> = title_ids.iter().map(|id| Some(*id)).collect();
    let rows: Vec<(Option<i32>, Genre)> = tg::title_genres
        .inner_join(g::genres)
        .filter(tg::title_id.eq_any(ids))
        .order(g::name.asc())
        .select((tg::title_id, Genre::as_select()))
        .load(conn)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(tid, genre)| tid.map(|tid| (tid, genre)))
        .collect())
}

/// Arithmetic mean of review scores, rounded to the nearest integer;
/// `None` when there are no reviews.
#[must_use]
pub fn mean_rating(scores: &[i32]) -> Option<i32> {
    if scores.is_empty() {
        return None;
    }
    let sum: i64 = scores.iter().map(|s| i64::from(*s)).sum();
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let mean = (sum as f64 / scores.len() as f64).round() as i32;
    Some(mean)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{
        db::{
            categories::create_category,
            genres::create_genre,
            test_support::test_conn,
        },
        models::{NewCategory, NewGenre},
    };

    async fn seed_genres(conn: &mut DbConnection) -> Vec<i32> {
        let mut ids = Vec::new();
        for (name, slug) in [("Drama", "drama"), ("Comedy", "comedy")] {
            let genre = create_genre(conn, &NewGenre { name, slug })
                .await
                .expect("insert genre");
            ids.push(genre.id);
        }
        ids
    }

    #[rstest]
    #[case(&[8, 10], Some(9))]
    #[case(&[1], Some(1))]
    #[case(&[7, 8], Some(8))] // .5 rounds away from zero
    #[case(&[], None)]
    fn mean_rating_cases(#[case] scores: &[i32], #[case] expected: Option<i32>) {
        assert_eq!(mean_rating(scores), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn create_links_genres_transactionally() {
        let mut conn = test_conn().await;
        let genre_ids = seed_genres(&mut conn).await;
        let title = create_title(
            &mut conn,
            &NewTitle {
                name: "The Long Goodbye",
                year: 1973,
                description: None,
                category_id: None,
            },
            &genre_ids,
        )
        .await
        .expect("insert title");

        let linked = genres_for_titles(&mut conn, &[title.id]).await.expect("query");
        assert_eq!(linked.len(), 2);
        assert!(linked.iter().all(|(tid, _)| *tid == title.id));
    }

    #[rstest]
    #[tokio::test]
    async fn update_replaces_genre_links() {
        let mut conn = test_conn().await;
        let genre_ids = seed_genres(&mut conn).await;
        let title = create_title(
            &mut conn,
            &NewTitle {
                name: "Chinatown",
                year: 1974,
                description: None,
                category_id: None,
            },
            &genre_ids,
        )
        .await
        .expect("insert title");

        let kept = &genre_ids[..1];
        update_title(&mut conn, title.id, &TitleChanges::default(), Some(kept))
            .await
            .expect("update");
        let linked = genres_for_titles(&mut conn, &[title.id]).await.expect("query");
        assert_eq!(linked.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn filters_compose() {
        let mut conn = test_conn().await;
        let genre_ids = seed_genres(&mut conn).await;
        let cat = create_category(
            &mut conn,
            &NewCategory {
                name: "Movies",
                slug: "movies",
            },
        )
        .await
        .expect("insert category");

        create_title(
            &mut conn,
            &NewTitle {
                name: "Chinatown",
                year: 1974,
                description: None,
                category_id: Some(cat.id),
            },
            &genre_ids[..1],
        )
        .await
        .expect("insert");
        create_title(
            &mut conn,
            &NewTitle {
                name: "The Conversation",
                year: 1974,
                description: None,
                category_id: None,
            },
            &[],
        )
        .await
        .expect("insert");

        let by_year = list_titles(
            &mut conn,
            &TitleQuery {
                year: Some(1974),
                ..TitleQuery::default()
            },
        )
        .await
        .expect("list");
        assert_eq!(by_year.len(), 2);

        let by_cat = list_titles(
            &mut conn,
            &TitleQuery {
                category_id: Some(cat.id),
                ..TitleQuery::default()
            },
        )
        .await
        .expect("list");
        assert_eq!(by_cat.len(), 1);
        assert_eq!(by_cat[0].name, "Chinatown");

        let by_genre = list_titles(
            &mut conn,
            &TitleQuery {
                genre_id: Some(genre_ids[0]),
                ..TitleQuery::default()
            },
        )
        .await
        .expect("list");
        assert_eq!(by_genre.len(), 1);

        let by_name = list_titles(
            &mut conn,
            &TitleQuery {
                name: Some("Conver".to_owned()),
                ..TitleQuery::default()
            },
        )
        .await
        .expect("list");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "The Conversation");
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_category_nulls_out_titles() {
        let mut conn = test_conn().await;
        let cat = create_category(
            &mut conn,
            &NewCategory {
                name: "Movies",
                slug: "movies",
            },
        )
        .await
        .expect("insert category");
        let title = create_title(
            &mut conn,
            &NewTitle {
                name: "Chinatown",
                year: 1974,
                description: None,
                category_id: Some(cat.id),
            },
            &[],
        )
        .await
        .expect("insert");

        crate::db::categories::delete_category_by_slug(&mut conn, "movies")
            .await
            .expect("delete");
        let reloaded = get_title(&mut conn, title.id)
            .await
            .expect("query")
            .expect("present");
        assert_eq!(reloaded.category_id, None);
    }
}
