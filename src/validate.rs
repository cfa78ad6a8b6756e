//! Pure field validators applied at object creation and wherever
//! user-supplied identifiers are parsed.

use chrono::{Datelike, Utc};

use crate::error::Error;

/// Maximum username length.
pub const USERNAME_MAX_LEN: usize = 150;
/// Maximum email length.
pub const EMAIL_MAX_LEN: usize = 254;
/// Maximum first/last name length.
pub const PERSON_NAME_MAX_LEN: usize = 150;
/// Maximum category/genre/title name length.
pub const NAME_MAX_LEN: usize = 256;
/// Maximum slug length.
pub const SLUG_MAX_LEN: usize = 50;
/// Lowest admissible review score.
pub const SCORE_MIN: i32 = 1;
/// Highest admissible review score.
pub const SCORE_MAX: i32 = 10;

/// The one username no account may claim; it addresses the self-profile
/// endpoint.
pub const RESERVED_USERNAME: &str = "me";

fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-')
}

/// Check a username for charset, length, and the reserved value.
///
/// # Errors
/// Returns [`Error::InvalidInput`] on any violation.
pub fn validate_username(username: &str) -> Result<(), Error> {
    if username.is_empty() || !username.chars().all(is_username_char) {
        return Err(Error::invalid(
            "username",
            "may contain only letters, digits and @/./+/-/_ characters",
        ));
    }
    if username.len() > USERNAME_MAX_LEN {
        return Err(Error::invalid(
            "username",
            format!("must be at most {USERNAME_MAX_LEN} characters"),
        ));
    }
    if username == RESERVED_USERNAME {
        return Err(Error::invalid("username", "invalid username"));
    }
    Ok(())
}

/// Check an email address for rough shape and length.
///
/// # Errors
/// Returns [`Error::InvalidInput`] on any violation.
pub fn validate_email(email: &str) -> Result<(), Error> {
    if email.len() > EMAIL_MAX_LEN {
        return Err(Error::invalid(
            "email",
            format!("must be at most {EMAIL_MAX_LEN} characters"),
        ));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::invalid("email", "enter a valid email address"))
    }
}

/// Check a category/genre/title display name.
///
/// # Errors
/// Returns [`Error::InvalidInput`] when empty or too long.
pub fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::invalid("name", "may not be blank"));
    }
    if name.len() > NAME_MAX_LEN {
        return Err(Error::invalid(
            "name",
            format!("must be at most {NAME_MAX_LEN} characters"),
        ));
    }
    Ok(())
}

/// Check a slug for charset and length.
///
/// # Errors
/// Returns [`Error::InvalidInput`] on any violation.
pub fn validate_slug(slug: &str) -> Result<(), Error> {
    let slug_char = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    if slug.is_empty() || !slug.chars().all(slug_char) {
        return Err(Error::invalid(
            "slug",
            "may contain only letters, digits, hyphens and underscores",
        ));
    }
    if slug.len() > SLUG_MAX_LEN {
        return Err(Error::invalid(
            "slug",
            format!("must be at most {SLUG_MAX_LEN} characters"),
        ));
    }
    Ok(())
}

/// Reject publication years beyond the current calendar year.
///
/// The boundary is evaluated against the clock at call time, never cached.
///
/// # Errors
/// Returns [`Error::InvalidInput`] for future or negative years.
pub fn validate_year(year: i32) -> Result<(), Error> {
    let current = Utc::now().year();
    if year > current {
        return Err(Error::invalid(
            "year",
            format!("may not be later than the current year {current}"),
        ));
    }
    if year < 0 {
        return Err(Error::invalid("year", "may not be negative"));
    }
    Ok(())
}

/// Reject scores outside the inclusive [`SCORE_MIN`]..[`SCORE_MAX`] band.
///
/// # Errors
/// Returns [`Error::InvalidInput`] for out-of-range scores.
pub fn validate_score(score: i32) -> Result<(), Error> {
    if (SCORE_MIN..=SCORE_MAX).contains(&score) {
        Ok(())
    } else {
        Err(Error::invalid(
            "score",
            format!("must be between {SCORE_MIN} and {SCORE_MAX}"),
        ))
    }
}

/// Require non-empty review/comment text.
///
/// # Errors
/// Returns [`Error::InvalidInput`] when the text is blank.
pub fn validate_text(text: &str) -> Result<(), Error> {
    if text.trim().is_empty() {
        Err(Error::invalid("text", "may not be blank"))
    } else {
        Ok(())
    }
}

/// Check an optional first/last name field.
///
/// # Errors
/// Returns [`Error::InvalidInput`] when the value is too long.
pub fn validate_person_name(field: &'static str, value: &str) -> Result<(), Error> {
    if value.len() > PERSON_NAME_MAX_LEN {
        Err(Error::invalid(
            field,
            format!("must be at most {PERSON_NAME_MAX_LEN} characters"),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Utc};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("alice")]
    #[case("a.b@c+d-e_f")]
    #[case("UPPER.lower.123")]
    fn accepts_valid_usernames(#[case] username: &str) {
        assert!(validate_username(username).is_ok());
    }

    #[rstest]
    #[case("me")]
    #[case("")]
    #[case("space name")]
    #[case("semi;colon")]
    #[case("ünïcode")]
    #[case("slash/name")]
    fn rejects_invalid_usernames(#[case] username: &str) {
        assert!(validate_username(username).is_err());
    }

    #[rstest]
    fn rejects_overlong_username() {
        let long = "a".repeat(USERNAME_MAX_LEN + 1);
        assert!(validate_username(&long).is_err());
        let at_limit = "a".repeat(USERNAME_MAX_LEN);
        assert!(validate_username(&at_limit).is_ok());
    }

    #[rstest]
    #[case("alice@example.com", true)]
    #[case("a@b.co", true)]
    #[case("missing-at.example.com", false)]
    #[case("@example.com", false)]
    #[case("alice@nodot", false)]
    #[case("alice@.com", false)]
    fn checks_email_shape(#[case] email: &str, #[case] ok: bool) {
        assert_eq!(validate_email(email).is_ok(), ok);
    }

    #[rstest]
    #[case("movies", true)]
    #[case("sci-fi_2", true)]
    #[case("bad slug", false)]
    #[case("", false)]
    fn checks_slugs(#[case] slug: &str, #[case] ok: bool) {
        assert_eq!(validate_slug(slug).is_ok(), ok);
    }

    #[rstest]
    fn current_year_is_admissible_but_next_is_not() {
        let current = Utc::now().year();
        assert!(validate_year(current).is_ok());
        assert!(validate_year(current - 100).is_ok());
        assert!(validate_year(current + 1).is_err());
    }

    #[rstest]
    #[case(1, true)]
    #[case(10, true)]
    #[case(0, false)]
    #[case(11, false)]
    #[case(-3, false)]
    fn checks_score_bounds(#[case] score: i32, #[case] ok: bool) {
        assert_eq!(validate_score(score).is_ok(), ok);
    }

    #[rstest]
    fn blank_text_is_rejected() {
        assert!(validate_text("").is_err());
        assert!(validate_text("   ").is_err());
        assert!(validate_text("worth reading").is_ok());
    }
}
