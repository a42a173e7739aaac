//! Input validation for API requests.
//!
//! Validators return `Err(message)`; handlers collect them with
//! `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

use crate::db::TrackSource;

lazy_static! {
    /// Loose email shape check: something@something.tld
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[^\s@]+@[^\s@]+\.[^\s@]+$"
    ).unwrap();
}

/// Treat empty and whitespace-only strings as absent.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Treat only empty strings as absent; the value is kept exactly as sent.
pub fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Require a field that is stored or matched as sent
pub fn require_given<'a>(value: &'a Option<String>, label: &str) -> Result<&'a str, String> {
    given(value).ok_or_else(|| format!("{} is required", label))
}

/// Require a non-empty field
pub fn require<'a>(value: &'a Option<String>, label: &str) -> Result<&'a str, String> {
    present(value).ok_or_else(|| format!("{} is required", label))
}

pub fn validate_email(email: &Option<String>) -> Result<String, String> {
    let email = require(email, "Email")?;
    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }
    Ok(email.to_lowercase())
}

pub fn validate_password(password: &Option<String>) -> Result<String, String> {
    // Not trimmed: leading and trailing spaces are part of a password
    match password.as_deref() {
        Some(p) if !p.is_empty() => {
            if p.len() > 1024 {
                Err("Password is too long".to_string())
            } else {
                Ok(p.to_string())
            }
        }
        _ => Err("Password is required".to_string()),
    }
}

pub fn validate_source(source: &Option<String>) -> Result<TrackSource, String> {
    let source = require(source, "Source")?;
    source
        .parse()
        .map_err(|_| "Source must be 'spotify' or 'jiosaavn'".to_string())
}

pub fn validate_playlist_name(name: &Option<String>) -> Result<String, String> {
    let name = require(name, "Playlist name")?;
    if name.len() > 200 {
        return Err("Playlist name is too long (max 200 characters)".to_string());
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(&s("Ana@Example.com")).unwrap(), "ana@example.com");
        assert_eq!(validate_email(&s("  me@mood.tune ")).unwrap(), "me@mood.tune");

        assert!(validate_email(&None).is_err());
        assert!(validate_email(&s("")).is_err());
        assert!(validate_email(&s("no-at-sign")).is_err());
        assert!(validate_email(&s("a@b")).is_err());
        assert!(validate_email(&s("a b@c.de")).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password(&s("hunter2")).is_ok());
        assert_eq!(validate_password(&s(" spaced ")).unwrap(), " spaced ");
        assert!(validate_password(&None).is_err());
        assert!(validate_password(&s("")).is_err());
    }

    #[test]
    fn test_validate_source() {
        assert_eq!(validate_source(&s("spotify")).unwrap(), TrackSource::Spotify);
        assert_eq!(validate_source(&s("JioSaavn")).unwrap(), TrackSource::Jiosaavn);
        assert!(validate_source(&s("youtube")).is_err());
        assert_eq!(validate_source(&None).unwrap_err(), "Source is required");
    }

    #[test]
    fn test_require_treats_blank_as_missing() {
        assert!(require(&s("   "), "Title").is_err());
        assert_eq!(require(&s(" x "), "Title").unwrap(), "x");
    }

    #[test]
    fn test_given_keeps_value_verbatim() {
        assert_eq!(given(&s(" id ")), Some(" id "));
        assert_eq!(given(&s("")), None);
        assert_eq!(given(&None), None);
        assert_eq!(require_given(&s(" x "), "Title").unwrap(), " x ");
        assert_eq!(require_given(&s(""), "Title").unwrap_err(), "Title is required");
    }

    #[test]
    fn test_validate_playlist_name() {
        assert!(validate_playlist_name(&s("Focus")).is_ok());
        assert!(validate_playlist_name(&None).is_err());
        assert!(validate_playlist_name(&s(&"x".repeat(201))).is_err());
    }
}
