//! User record queries.

use diesel::{prelude::*, result::QueryResult};
use diesel_async::RunQueryDsl;

use super::connection::DbConnection;
use crate::models::{NewUser, User, UserChanges};

/// Look up a user record by username.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn get_user_by_name(conn: &mut DbConnection, name: &str) -> QueryResult<Option<User>> {
    use crate::schema::users::dsl::{username, users};
    users
        .filter(username.eq(name))
        .select(User::as_select())
        .first(conn)
        .await
        .optional()
}

/// Look up a user record by email address.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn get_user_by_email(conn: &mut DbConnection, addr: &str) -> QueryResult<Option<User>> {
    use crate::schema::users::dsl::{email, users};
    users
        .filter(email.eq(addr))
        .select(User::as_select())
        .first(conn)
        .await
        .optional()
}

/// Resolve account ids to usernames, for serialising author fields.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn usernames_by_ids(
    conn: &mut DbConnection,
    ids: &[i32],
) -> QueryResult<Vec<(i32, String)>> {
    use crate::schema::users::dsl::{id, username, users};
    users
        .filter(id.eq_any(ids))
        .select((id, username))
        .load(conn)
        .await
}

/// Insert a new user record and return the stored row.
///
/// # Errors
/// Returns any error produced by the insertion query, including the
/// unique-violation raised for duplicate usernames or emails.
pub async fn create_user(conn: &mut DbConnection, user: &NewUser<'_>) -> QueryResult<User> {
    use crate::schema::users::dsl::users;
    diesel::insert_into(users)
        .values(user)
        .returning(User::as_returning())
        .get_result(conn)
        .await
}

/// Apply a partial update to a user and return the stored row.
///
/// # Errors
/// Returns any error produced by the update query.
pub async fn update_user(
    conn: &mut DbConnection,
    user_id: i32,
    changes: &UserChanges,
) -> QueryResult<User> {
    use crate::schema::users::dsl::{id, users};
    diesel::update(users.filter(id.eq(user_id)))
        .set(changes)
        .returning(User::as_returning())
        .get_result(conn)
        .await
}

/// Replace a user's confirmation secret, invalidating outstanding codes.
///
/// # Errors
/// Returns any error produced by the update query.
pub async fn rotate_confirmation_secret(
    conn: &mut DbConnection,
    user_id: i32,
    secret: &str,
) -> QueryResult<usize> {
    use crate::schema::users::dsl::{confirmation_secret, id, users};
    diesel::update(users.filter(id.eq(user_id)))
        .set(confirmation_secret.eq(secret))
        .execute(conn)
        .await
}

/// Delete a user by username; returns the number of rows removed.
///
/// # Errors
/// Returns any error produced by the deletion query.
pub async fn delete_user_by_name(conn: &mut DbConnection, name: &str) -> QueryResult<usize> {
    use crate::schema::users::dsl::{username, users};
    diesel::delete(users.filter(username.eq(name)))
        .execute(conn)
        .await
}

/// List users ordered by username, optionally filtered by a username
/// substring.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn list_users(
    conn: &mut DbConnection,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> QueryResult<Vec<User>> {
    use crate::schema::users::dsl::{username, users};
    let mut query = users.into_boxed();
    if let Some(needle) = search {
        query = query.filter(username.like(format!("%{needle}%")));
    }
    query
        .order(username.asc())
        .limit(limit)
        .offset(offset)
        .select(User::as_select())
        .load(conn)
        .await
}

/// Count users matching the optional username substring.
///
/// # Errors
/// Returns any error produced by the underlying database query.
pub async fn count_users(conn: &mut DbConnection, search: Option<&str>) -> QueryResult<i64> {
    use crate::schema::users::dsl::{username, users};
    let mut query = users.into_boxed();
    if let Some(needle) = search {
        query = query.filter(username.like(format!("%{needle}%")));
    }
    query.count().get_result(conn).await
}
