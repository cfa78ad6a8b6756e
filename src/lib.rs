//! reviewd: a review and rating service.
//!
//! Users sign up with an emailed confirmation code, exchange it for a
//! bearer token, and then review titles (one review per title, scored 1 to
//! 10) and comment on reviews. Titles carry a category, any number of
//! genres, and a rating derived from their review scores. A three-tier
//! role model (user, moderator, admin) gates the write surface.
//!
//! The crate is organised as a thin HTTP layer ([`api`]) over a Diesel
//! query layer ([`db`]), with policy decisions ([`policy`]) and field
//! validation ([`validate`]) factored out so they can be tested without a
//! server.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod policy;
pub mod schema;
pub mod validate;
