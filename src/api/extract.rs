//! Identity extractors.
//!
//! The bearer token is stateless: verification checks the signature, then
//! the account row is reloaded so role changes and deletions take effect on
//! the next request rather than at token expiry.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use super::{AppState, acquire};
use crate::{db, error::Error, models::User};

/// Optional identity: `None` when no authorization header is present.
///
/// A header that is present but unverifiable rejects the request rather
/// than downgrading it to anonymous.
pub struct MaybeUser(pub Option<User>);

/// Required identity; rejects with 401 when absent.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Error> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(None));
        };
        let token = header
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(Error::Unauthenticated)?;
        let claims = state.keys.tokens.verify(token)?;
        let mut conn = acquire(&state.pool).await?;
        let user = db::get_user_by_name(&mut conn, &claims.sub)
            .await?
            .ok_or(Error::Unauthenticated)?;
        Ok(Self(Some(user)))
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Error> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        user.map(Self).ok_or(Error::Unauthenticated)
    }
}
