use crate::storage::TOKEN_KEY;
use crate::time::{Duration, DEFAULT_SETTLE_WINDOW};

pub const DEFAULT_API_BASE: &str = "http://localhost:5000";
pub const API_BASE_ENV: &str = "NIRMAAN_API_BASE";

/// Client settings, resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend origin, no trailing slash.
    pub api_base: String,
    /// Debounce window for text-field validation.
    pub settle_window: Duration,
    pub request_timeout: Duration,
    pub token_key: &'static str,
}

impl ClientConfig {
    pub fn with_base(base: &str) -> Result<Self, String> {
        Ok(Self {
            api_base: normalize_base(base)?,
            settle_window: DEFAULT_SETTLE_WINDOW,
            request_timeout: Duration::from_secs(30),
            token_key: TOKEN_KEY,
        })
    }

    /// Explicit override first, then `NIRMAAN_API_BASE`, then the local dev backend.
    pub fn resolve(explicit: Option<&str>) -> Result<Self, String> {
        let env = std::env::var(API_BASE_ENV).ok();
        let base = explicit
            .map(str::to_string)
            .or(env.filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self::with_base(&base)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            settle_window: DEFAULT_SETTLE_WINDOW,
            request_timeout: Duration::from_secs(30),
            token_key: TOKEN_KEY,
        }
    }
}

fn normalize_base(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| format!("API base must be an http(s) URL: {raw:?}"))?;
    if rest.is_empty() {
        return Err(format!("API base has no host: {raw:?}"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_is_trimmed() {
        let cfg = ClientConfig::with_base(" https://nirmaan.example/ ").unwrap();
        assert_eq!(cfg.api_base, "https://nirmaan.example");
        assert_eq!(cfg.settle_window, Duration::from_millis(500));
        assert_eq!(cfg.token_key, "token");
    }

    #[test]
    fn base_requires_http_scheme_and_host() {
        assert!(ClientConfig::with_base("/api").is_err());
        assert!(ClientConfig::with_base("ftp://host").is_err());
        assert!(ClientConfig::with_base("http://").is_err());
    }

    #[test]
    fn explicit_override_wins() {
        let cfg = ClientConfig::resolve(Some("http://10.0.0.2:5000")).unwrap();
        assert_eq!(cfg.api_base, "http://10.0.0.2:5000");
    }

    #[test]
    fn default_points_at_local_backend() {
        assert_eq!(ClientConfig::default().api_base, DEFAULT_API_BASE);
    }
}
