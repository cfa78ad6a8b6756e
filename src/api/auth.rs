//! Signup and token-exchange handlers.
//!
//! Signup is idempotent for a matching (username, email) pair so a user who
//! lost their code can simply sign up again. The confirmation code is
//! consumed on exchange by rotating the account's secret, which invalidates
//! every code issued before it.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{AppState, acquire};
use crate::{
    auth::fresh_secret,
    db,
    error::{Error, Result},
    models::{NewUser, Role, User},
    validate::{validate_email, validate_username},
};

#[derive(Deserialize)]
pub(super) struct SignupRequest {
    username: String,
    email: String,
}

#[derive(Deserialize)]
pub(super) struct TokenRequest {
    username: String,
    confirmation_code: String,
}

async fn get_or_create_account(state: &AppState, req: &SignupRequest) -> Result<User> {
    let mut conn = acquire(&state.pool).await?;
    let by_name = db::get_user_by_name(&mut conn, &req.username).await?;
    let by_email = db::get_user_by_email(&mut conn, &req.email).await?;
    match (by_name, by_email) {
        // Exact re-signup reuses the account and reissues a code.
        (Some(named), Some(mailed)) if named.id == mailed.id => Ok(named),
        (Some(_), _) => Err(Error::conflict("username", "username already taken")),
        (_, Some(_)) => Err(Error::conflict("email", "email already registered")),
        (None, None) => {
            let secret = fresh_secret();
            db::create_user(
                &mut conn,
                &NewUser {
                    username: &req.username,
                    email: &req.email,
                    role: Role::User,
                    bio: "",
                    first_name: "",
                    last_name: "",
                    is_superuser: false,
                    confirmation_secret: &secret,
                },
            )
            .await
            // Backstop for a racing signup with the same username or email.
            .map_err(|e| Error::from(e).or_conflict("username", "username or email already taken"))
        }
    }
}

/// `POST /auth/signup`: register (or re-register) and email a confirmation
/// code.
pub(super) async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<Value>> {
    validate_username(&req.username)?;
    validate_email(&req.email)?;
    let user = get_or_create_account(&state, &req).await?;
    let code = state.keys.codes.issue(&user);
    let body = format!("Your confirmation code is {code}");
    // Delivery failures are not surfaced: re-signing up issues a new code.
    if let Err(err) = state.mailer.send(&user.email, "Confirmation code", &body) {
        tracing::warn!(username = %user.username, error = %err, "confirmation mail failed");
    }
    Ok(Json(json!({
        "username": user.username,
        "email": user.email,
    })))
}

/// `POST /auth/token`: exchange a confirmation code for a bearer token.
pub(super) async fn token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<Value>> {
    validate_username(&req.username)?;
    let mut conn = acquire(&state.pool).await?;
    let user = db::get_user_by_name(&mut conn, &req.username)
        .await?
        .ok_or(Error::NotFound("user"))?;
    if !state.keys.codes.verify(&user, &req.confirmation_code) {
        return Err(Error::invalid(
            "confirmation_code",
            "confirmation_code not valid",
        ));
    }
    let token = state.keys.tokens.issue(&user)?;
    // Rotating the secret consumes the presented code.
    db::rotate_confirmation_secret(&mut conn, user.id, &fresh_secret()).await?;
    Ok(Json(json!({ "token": token })))
}
