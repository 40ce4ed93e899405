use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::util_resp::FailureResponse;

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn is_valid_email(string: &str) -> Result<(), String> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
        r#"^(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?|\[(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?|[a-z0-9-]*[a-z0-9]:(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21-\x5a\x53-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])+)\])$"#
    ).expect("email regex is valid")
    });
    match RE.is_match(string) {
        true => Ok(()),
        false => Err("Invalid email".to_string()),
    }
}

/// Emails are matched case-insensitively, so they are stored lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        ));
    }
    Ok(())
}

/// Accepts absolute `http`/`https` URLs only.
pub fn is_http_url(string: &str) -> bool {
    match Url::parse(string) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

/// Parses a numeric path segment, producing `Invalid <what> id` on failure.
pub fn parse_id(raw: &str, what: &str) -> Result<i32, FailureResponse> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| FailureResponse::BadRequest(format!("Invalid {what} id")))
}

/// Returns the trimmed string if it is non-empty.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
