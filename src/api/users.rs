//! Account administration handlers and the self-service `me` endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::{AppState, Page, PageQuery, acquire, extract::CurrentUser};
use crate::{
    auth::fresh_secret,
    db,
    error::{Error, Result},
    models::{NewUser, Role, User, UserChanges},
    policy,
    validate::{validate_email, validate_person_name, validate_username},
};

/// Public representation of an account.
#[derive(Serialize)]
pub(super) struct UserOut {
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    bio: String,
    role: Role,
}

impl From<User> for UserOut {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            role: user.role,
        }
    }
}

#[derive(Deserialize)]
pub(super) struct CreateUserRequest {
    username: String,
    email: String,
    role: Option<String>,
    bio: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct UpdateUserRequest {
    username: Option<String>,
    email: Option<String>,
    role: Option<String>,
    bio: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

fn parse_role(value: &str) -> Result<Role> {
    Role::parse(value).ok_or_else(|| Error::invalid("role", "role must be user, moderator or admin"))
}

impl UpdateUserRequest {
    /// Validate the given fields and translate into a changeset. `role` is
    /// handled by the caller since only admin paths may change it.
    fn into_changes(self) -> Result<(UserChanges, Option<String>)> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(first_name) = &self.first_name {
            validate_person_name("first_name", first_name)?;
        }
        if let Some(last_name) = &self.last_name {
            validate_person_name("last_name", last_name)?;
        }
        let changes = UserChanges {
            username: self.username,
            email: self.email,
            role: None,
            bio: self.bio,
            first_name: self.first_name,
            last_name: self.last_name,
            confirmation_secret: None,
        };
        Ok((changes, self.role))
    }
}

/// `GET /users`: admin-only listing with an optional username search.
pub(super) async fn list(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<UserOut>>> {
    policy::admin_only(Some(&actor))?;
    let (limit, offset) = query.limit_offset();
    let search = query.search.as_deref();
    let mut conn = acquire(&state.pool).await?;
    let count = db::count_users(&mut conn, search).await?;
    let results = db::list_users(&mut conn, search, limit, offset)
        .await?
        .into_iter()
        .map(UserOut::from)
        .collect();
    Ok(Json(Page { count, results }))
}

/// `POST /users`: admin-only account creation without the signup flow.
pub(super) async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserOut>)> {
    policy::admin_only(Some(&actor))?;
    validate_username(&req.username)?;
    validate_email(&req.email)?;
    if let Some(first_name) = &req.first_name {
        validate_person_name("first_name", first_name)?;
    }
    if let Some(last_name) = &req.last_name {
        validate_person_name("last_name", last_name)?;
    }
    let role = match req.role.as_deref() {
        Some(value) => parse_role(value)?,
        None => Role::User,
    };
    let secret = fresh_secret();
    let mut conn = acquire(&state.pool).await?;
    let user = db::create_user(
        &mut conn,
        &NewUser {
            username: &req.username,
            email: &req.email,
            role,
            bio: req.bio.as_deref().unwrap_or(""),
            first_name: req.first_name.as_deref().unwrap_or(""),
            last_name: req.last_name.as_deref().unwrap_or(""),
            is_superuser: false,
            confirmation_secret: &secret,
        },
    )
    .await
    .map_err(|e| Error::from(e).or_conflict("username", "username or email already taken"))?;
    Ok((StatusCode::CREATED, Json(UserOut::from(user))))
}

/// `GET /users/me`: the caller's own account.
pub(super) async fn me(CurrentUser(actor): CurrentUser) -> Json<UserOut> {
    Json(UserOut::from(actor))
}

/// `PATCH /users/me`: self-service profile update; `role` is read-only here
/// regardless of who asks.
pub(super) async fn update_me(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserOut>> {
    policy::admin_only(Some(&actor))?;
    let (changes, _role_ignored) = req.into_changes()?;
    if changes.is_empty() {
        return Ok(Json(UserOut::from(actor)));
    }
    let mut conn = acquire(&state.pool).await?;
    let user = db::update_user(&mut conn, actor.id, &changes)
        .await
        .map_err(|e| Error::from(e).or_conflict("username", "username or email already taken"))?;
    Ok(Json(UserOut::from(user)))
}

/// `GET /users/{username}`: admin-only account lookup.
pub(super) async fn retrieve(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<UserOut>> {
    policy::admin_only(Some(&actor))?;
    let mut conn = acquire(&state.pool).await?;
    let user = db::get_user_by_name(&mut conn, &username)
        .await?
        .ok_or(Error::NotFound("user"))?;
    Ok(Json(UserOut::from(user)))
}

/// `PATCH /users/{username}`: admin-only update; may change the role.
pub(super) async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(username): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserOut>> {
    policy::admin_only(Some(&actor))?;
    let (mut changes, role) = req.into_changes()?;
    if let Some(value) = role.as_deref() {
        changes.role = Some(parse_role(value)?);
    }
    let mut conn = acquire(&state.pool).await?;
    let target = db::get_user_by_name(&mut conn, &username)
        .await?
        .ok_or(Error::NotFound("user"))?;
    if changes.is_empty() {
        return Ok(Json(UserOut::from(target)));
    }
    let user = db::update_user(&mut conn, target.id, &changes)
        .await
        .map_err(|e| Error::from(e).or_conflict("username", "username or email already taken"))?;
    Ok(Json(UserOut::from(user)))
}

/// `DELETE /users/{username}`: admin-only account removal.
pub(super) async fn destroy(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(username): Path<String>,
) -> Result<StatusCode> {
    policy::admin_only(Some(&actor))?;
    let mut conn = acquire(&state.pool).await?;
    let removed = db::delete_user_by_name(&mut conn, &username).await?;
    if removed == 0 {
        return Err(Error::NotFound("user"));
    }
    Ok(StatusCode::NO_CONTENT)
}
