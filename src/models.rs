//! Record types backing the schema, plus the user role enum.

use chrono::NaiveDateTime;
use diesel::{
    backend::Backend,
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    prelude::*,
    serialize::{self, Output, ToSql},
    sql_types::Text,
};
use serde::{Deserialize, Serialize};

/// Access tier of a user account, stored as text.
///
/// Permission logic only ever needs simple conjunctions over these tiers,
/// so the role is a flat tagged value with derived predicates rather than
/// distinct identity types.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account; may post reviews and comments.
    #[default]
    User,
    /// May edit or delete any review or comment.
    Moderator,
    /// May manage catalog entities and user accounts.
    Admin,
}

impl Role {
    /// Stable textual form used in storage and payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    /// Parse the textual form; `None` for anything unrecognised.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "moderator" => Some(Self::Moderator),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl<DB> FromSql<Text, DB> for Role
where
    DB: Backend,
    String: FromSql<Text, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> deserialize::Result<Self> {
        let raw = String::from_sql(bytes)?;
        Self::parse(&raw).ok_or_else(|| format!("unknown role: {raw}").into())
    }
}

impl<DB> ToSql<Text, DB> for Role
where
    DB: Backend,
    str: ToSql<Text, DB>,
{
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, DB>) -> serialize::Result {
        self.as_str().to_sql(out)
    }
}

/// A registered account.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub bio: String,
    pub first_name: String,
    pub last_name: String,
    pub is_superuser: bool,
    pub confirmation_secret: String,
}

impl User {
    /// Admin-equivalent: the admin role or the superuser flag.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin || self.is_superuser
    }

    /// Moderator role only; admins are checked separately.
    #[must_use]
    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub role: Role,
    pub bio: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub is_superuser: bool,
    pub confirmation_secret: &'a str,
}

/// Partial update applied by PATCH handlers; `None` leaves a field alone.
#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::users)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub bio: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub confirmation_secret: Option<String>,
}

impl UserChanges {
    /// True when no field would change; Diesel rejects empty changesets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.bio.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.confirmation_secret.is_none()
    }
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = crate::schema::categories)]
pub struct Category {
    #[serde(skip)]
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::categories)]
pub struct NewCategory<'a> {
    pub name: &'a str,
    pub slug: &'a str,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = crate::schema::genres)]
pub struct Genre {
    #[serde(skip)]
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::genres)]
pub struct NewGenre<'a> {
    pub name: &'a str,
    pub slug: &'a str,
}

/// A reviewable work.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::titles)]
pub struct Title {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category_id: Option<i32>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::titles)]
pub struct NewTitle<'a> {
    pub name: &'a str,
    pub year: i32,
    pub description: Option<&'a str>,
    pub category_id: Option<i32>,
}

/// Partial title update; `category_id` uses a nested option so PATCH can
/// clear the category explicitly.
#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::titles)]
pub struct TitleChanges {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category_id: Option<Option<i32>>,
}

impl TitleChanges {
    /// True when no column would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.year.is_none()
            && self.description.is_none()
            && self.category_id.is_none()
    }
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::title_genres)]
pub struct TitleGenre {
    pub id: i32,
    pub title_id: Option<i32>,
    pub genre_id: Option<i32>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::title_genres)]
pub struct NewTitleGenre {
    pub title_id: Option<i32>,
    pub genre_id: Option<i32>,
}

/// A user's review of a title; one per (title, author) pair.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::reviews)]
pub struct Review {
    pub id: i32,
    pub title_id: i32,
    pub author_id: i32,
    pub text: String,
    pub score: i32,
    pub pub_date: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::reviews)]
pub struct NewReview<'a> {
    pub title_id: i32,
    pub author_id: i32,
    pub text: &'a str,
    pub score: i32,
    pub pub_date: NaiveDateTime,
}

/// Partial review update.
#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::reviews)]
pub struct ReviewChanges {
    pub text: Option<String>,
    pub score: Option<i32>,
}

impl ReviewChanges {
    /// True when no column would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.score.is_none()
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::comments)]
pub struct Comment {
    pub id: i32,
    pub review_id: i32,
    pub author_id: i32,
    pub text: String,
    pub pub_date: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::comments)]
pub struct NewComment<'a> {
    pub review_id: i32,
    pub author_id: i32,
    pub text: &'a str,
    pub pub_date: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Role;

    #[rstest]
    #[case("user", Some(Role::User))]
    #[case("moderator", Some(Role::Moderator))]
    #[case("admin", Some(Role::Admin))]
    #[case("superuser", None)]
    #[case("", None)]
    fn parses_roles(#[case] input: &str, #[case] expected: Option<Role>) {
        assert_eq!(Role::parse(input), expected);
    }

    #[rstest]
    fn role_round_trips_through_str() {
        for role in [Role::User, Role::Moderator, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }
}
