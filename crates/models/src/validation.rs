//! Field-level checks shared by the entity validators.
//!
//! Every failure is a [`ModelError::Validation`] whose message starts with the
//! offending field name.

use crate::errors::ModelError;

pub const MAX_NAME_LEN: usize = 255;

/// Non-blank text of at most `max` characters.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::invalid(field, "must not be empty"));
    }
    if value.chars().count() > max {
        return Err(ModelError::invalid(field, format_args!("must be at most {max} characters")));
    }
    Ok(())
}

/// Absolute `http`/`https` URL with a host and no whitespace.
pub fn url(field: &str, value: &str) -> Result<(), ModelError> {
    let malformed = || ModelError::invalid(field, "must be an http(s) URL");
    if value.chars().any(char::is_whitespace) {
        return Err(malformed());
    }
    // the parser folds `https:///x` into `https://x/`; an empty authority is still malformed
    match value.split_once("://") {
        Some((_, rest)) if !rest.is_empty() && !rest.starts_with('/') => {}
        _ => return Err(malformed()),
    }
    let parsed = url::Url::parse(value).map_err(|_| malformed())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().map_or(true, str::is_empty) {
        return Err(malformed());
    }
    if value.len() > 2048 {
        return Err(ModelError::invalid(field, "must be at most 2048 characters"));
    }
    Ok(())
}

pub fn email(field: &str, value: &str) -> Result<(), ModelError> {
    required_text(field, value, MAX_NAME_LEN)?;
    let malformed = || ModelError::invalid(field, "must be a valid email address");
    let (local, domain) = value.split_once('@').ok_or_else(malformed)?;
    if local.is_empty()
        || domain.contains('@')
        || value.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(malformed());
    }
    Ok(())
}

pub fn non_negative(field: &str, value: f64) -> Result<(), ModelError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ModelError::invalid(field, "must be a number >= 0"));
    }
    Ok(())
}

/// Structured JSON only: objects and arrays are accepted, scalars are not.
pub fn json_document(field: &str, value: &serde_json::Value) -> Result<(), ModelError> {
    if value.is_object() || value.is_array() {
        Ok(())
    } else {
        Err(ModelError::invalid(field, "must be a JSON object or array"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_text_rejects_blank_and_long_values() {
        assert!(required_text("name", "Electronics", 255).is_ok());
        assert_eq!(
            required_text("name", "   ", 255),
            Err(ModelError::Validation("name must not be empty".into()))
        );
        let long = "x".repeat(256);
        let err = required_text("name", &long, 255).unwrap_err();
        assert!(err.to_string().starts_with("name must be at most 255"));
        // length counts characters, not bytes
        assert!(required_text("name", &"é".repeat(255), 255).is_ok());
    }

    #[test]
    fn url_requires_scheme_and_host() {
        assert!(url("image", "https://cdn.example.com/a.png").is_ok());
        assert!(url("image", "http://localhost:9000").is_ok());
        assert!(url("image", "ftp://example.com/a.png").is_err());
        assert!(url("image", "https://").is_err());
        assert!(url("image", "https:///path").is_err());
        assert!(url("image", "https://exa mple.com").is_err());
        assert!(url("image", "not a url").is_err());
        assert!(url("image", "http://exa<mple.com").is_err());
        assert!(url("image", "https://[::1").is_err());
        assert!(url("image", "http://a:notaport/").is_err());
        assert!(url("image", "https://[::1]:8443/img.png").is_ok());
    }

    #[test]
    fn email_shape() {
        assert!(email("email", "ada@example.com").is_ok());
        assert!(email("email", "ada@localhost").is_err());
        assert!(email("email", "@example.com").is_err());
        assert!(email("email", "ada@@example.com").is_err());
        assert!(email("email", "ada example@example.com").is_err());
        assert!(email("email", "").is_err());
    }

    #[test]
    fn numbers_and_json() {
        assert!(non_negative("price", 0.0).is_ok());
        assert!(non_negative("price", 299.99).is_ok());
        assert!(non_negative("price", -0.01).is_err());
        assert!(non_negative("price", f64::NAN).is_err());
        assert!(json_document("payload", &json!({"a": 1})).is_ok());
        assert!(json_document("payload", &json!([1, 2])).is_ok());
        assert!(json_document("payload", &json!("text")).is_err());
    }
}
