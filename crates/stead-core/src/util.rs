//! Small helpers shared across modules.

use crate::error::{Error, Result};

/// Current Unix timestamp in seconds.
pub fn unix_timestamp_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Validate a service base URL: trims whitespace, requires an http(s)
/// scheme, and drops any trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let base = raw.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(Error::InvalidInput("base URL must not be empty".into()));
    }
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(Error::InvalidInput(
            "base URL must include http:// or https://".into(),
        ));
    }
    Ok(base.to_string())
}

/// Truncate response text to a log-friendly length.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(160).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url("").is_err());
        assert!(normalize_base_url("   ").is_err());
        assert!(normalize_base_url("sites.example.com").is_err());
    }

    #[test]
    fn normalize_base_url_trims_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://sites.example.com/").unwrap(),
            "https://sites.example.com"
        );
        assert_eq!(
            normalize_base_url(" http://localhost:8080 ").unwrap(),
            "http://localhost:8080"
        );
    }

    #[test]
    fn compact_text_truncates_long_bodies() {
        let long = "x".repeat(500);
        assert_eq!(compact_text(&long).len(), 160);
        assert_eq!(compact_text("  short  "), "short");
    }
}
