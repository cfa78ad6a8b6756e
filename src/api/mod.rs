//! HTTP surface: router, shared state, extractors, and per-resource
//! handlers.

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::{
    auth::{AuthKeys, Mailer},
    db::DbPool,
    error::Error,
};

mod auth;
mod categories;
mod comments;
mod extract;
mod genres;
mod pagination;
mod reviews;
mod titles;
mod users;

pub use extract::{CurrentUser, MaybeUser};
pub use pagination::{LimitOffsetQuery, Page, PageQuery};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Token and confirmation-code signing material.
    pub keys: Arc<AuthKeys>,
    /// Outbound mail transport.
    pub mailer: Arc<dyn Mailer>,
}

pub(crate) async fn acquire(
    pool: &DbPool,
) -> Result<diesel_async::pooled_connection::bb8::PooledConnection<'_, crate::db::DbConnection>, Error>
{
    pool.get().await.map_err(|e| Error::Pool(e.to_string()))
}

/// Build the versioned API router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/auth/signup", post(auth::signup))
        .route("/api/v1/auth/token", post(auth::token))
        .route("/api/v1/users", get(users::list).post(users::create))
        .route("/api/v1/users/me", get(users::me).patch(users::update_me))
        .route(
            "/api/v1/users/{username}",
            get(users::retrieve)
                .patch(users::update)
                .delete(users::destroy),
        )
        .route(
            "/api/v1/categories",
            get(categories::list).post(categories::create),
        )
        .route("/api/v1/categories/{slug}", delete(categories::destroy))
        .route("/api/v1/genres", get(genres::list).post(genres::create))
        .route("/api/v1/genres/{slug}", delete(genres::destroy))
        .route("/api/v1/titles", get(titles::list).post(titles::create))
        .route(
            "/api/v1/titles/{title_id}",
            get(titles::retrieve)
                .patch(titles::update)
                .delete(titles::destroy),
        )
        .route(
            "/api/v1/titles/{title_id}/reviews",
            get(reviews::list).post(reviews::create),
        )
        .route(
            "/api/v1/titles/{title_id}/reviews/{review_id}",
            get(reviews::retrieve)
                .patch(reviews::update)
                .delete(reviews::destroy),
        )
        .route(
            "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
            get(comments::list).post(comments::create),
        )
        .route(
            "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
            get(comments::retrieve)
                .patch(comments::update)
                .delete(comments::destroy),
        )
        .with_state(state)
}
