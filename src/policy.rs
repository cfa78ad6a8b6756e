//! Role-derived permission predicates.
//!
//! Each predicate is a pure function of the requesting identity (or its
//! absence) and, for object-level checks, the target's author. Handlers
//! call the coarse check before touching the store and the object-level
//! check once the target row is loaded.
//!
//! Failure mapping: no identity at all is `Unauthenticated` (401); an
//! identity that lacks the required role or ownership is `Forbidden` (403).

use crate::{error::Error, models::User};

fn authenticated(actor: Option<&User>) -> Result<&User, Error> {
    actor.ok_or(Error::Unauthenticated)
}

/// Require any authenticated identity.
///
/// # Errors
/// [`Error::Unauthenticated`] when no identity is present.
pub fn require_authenticated(actor: Option<&User>) -> Result<(), Error> {
    authenticated(actor).map(|_| ())
}

/// Admin-only access; gates the user-management resource.
///
/// # Errors
/// [`Error::Unauthenticated`] without an identity, [`Error::Forbidden`]
/// for non-admins.
pub fn admin_only(actor: Option<&User>) -> Result<(), Error> {
    let user = authenticated(actor)?;
    if user.is_admin() {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

/// Catalog access: safe methods for everyone, unsafe methods for admins.
///
/// # Errors
/// See [`admin_only`] for the unsafe-method mapping.
pub fn admin_or_read_only(safe_method: bool, actor: Option<&User>) -> Result<(), Error> {
    if safe_method {
        Ok(())
    } else {
        admin_only(actor)
    }
}

/// List-level review/comment access: safe methods for everyone, creation
/// for any authenticated identity.
///
/// # Errors
/// [`Error::Unauthenticated`] when an unsafe method arrives without an
/// identity.
pub fn content_list(safe_method: bool, actor: Option<&User>) -> Result<(), Error> {
    if safe_method {
        Ok(())
    } else {
        require_authenticated(actor)
    }
}

/// Object-level review/comment access: mutation requires moderator, admin,
/// or authorship of the target.
///
/// # Errors
/// [`Error::Unauthenticated`] without an identity, [`Error::Forbidden`]
/// when the identity is neither privileged nor the author.
pub fn content_object(actor: Option<&User>, author_id: i32) -> Result<(), Error> {
    let user = authenticated(actor)?;
    if user.is_moderator() || user.is_admin() || user.id == author_id {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}
