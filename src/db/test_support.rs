//! Shared fixtures for the query-module unit tests.

use diesel_async::{AsyncConnection, RunQueryDsl};

use super::{connection::DbConnection, migrations::apply_migrations};
use crate::models::{NewUser, Role};

/// Open an in-memory database with the schema applied and referential
/// actions enabled.
pub(crate) async fn test_conn() -> DbConnection {
    let mut conn = DbConnection::establish(":memory:")
        .await
        .expect("establish in-memory database");
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .await
        .expect("enable foreign keys");
    apply_migrations(&mut conn).await.expect("apply migrations");
    conn
}

/// A plain regular-role account fixture.
pub(crate) fn new_user<'a>(username: &'a str, email: &'a str) -> NewUser<'a> {
    NewUser {
        username,
        email,
        role: Role::User,
        bio: "",
        first_name: "",
        last_name: "",
        is_superuser: false,
        confirmation_secret: "test-secret",
    }
}
