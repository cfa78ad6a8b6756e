//! Manage database connections and domain queries.
//!
//! This module tree exposes helpers for creating pooled Diesel connections,
//! running embedded migrations, and executing application queries grouped
//! by domain concerns.

mod categories;
mod comments;
mod connection;
mod genres;
mod migrations;
mod reviews;
mod titles;
mod users;

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(feature = "sqlite")]
pub use self::migrations::apply_migrations;
pub use self::{
    categories::{
        count_categories, create_category, delete_category_by_slug, get_categories_by_ids,
        get_category_by_slug, list_categories,
    },
    comments::{
        count_comments, create_comment, delete_comment, get_comment, list_comments,
        update_comment_text,
    },
    connection::{Backend, DbConnection, DbPool, MIGRATIONS, establish_connection, establish_pool},
    genres::{
        count_genres, create_genre, delete_genre_by_slug, get_genre_by_slug, get_genres_by_slugs,
        list_genres,
    },
    migrations::run_migrations,
    reviews::{
        count_reviews, create_review, delete_review, get_review, list_reviews, review_exists,
        scores_for_titles, update_review,
    },
    titles::{
        TitleQuery, create_title, delete_title, genres_for_titles, get_title, list_titles,
        mean_rating, update_title,
    },
    users::{
        count_users, create_user, delete_user_by_name, get_user_by_email, get_user_by_name,
        list_users, rotate_confirmation_secret, update_user, usernames_by_ids,
    },
};
