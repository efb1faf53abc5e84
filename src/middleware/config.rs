use std::sync::Arc;
use std::time::Duration;

use axum_extra::extract::cookie::Key;
use url::Url;

use crate::api::ApiConfig;
use crate::error::Error;
use crate::token::{ExpiryValidator, TokenValidator};

/// Shared portal settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct PortalSettings {
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) session_ttl_minutes: i64,
    pub(crate) secure_cookies: bool,
}

impl PortalSettings {
    fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            session_cookie_name: "__shelf_session".into(),
            session_ttl_minutes: 24 * 60,
            secure_cookies: true,
        }
    }
}

/// Portal configuration.
///
/// The catalog API location is a constructor parameter; everything else has a
/// default. Use [`from_env()`](PortalConfig::from_env) for convention-based
/// setup, or [`new()`](PortalConfig::new) with `with_*` methods.
pub struct PortalConfig {
    pub(crate) api: ApiConfig,
    pub(crate) validator: Arc<dyn TokenValidator>,
    pub(crate) settings: PortalSettings,
}

impl PortalConfig {
    #[must_use]
    pub fn new(api: ApiConfig) -> Self {
        Self {
            api,
            validator: Arc::new(ExpiryValidator),
            settings: PortalSettings::defaults(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `API_BASE_URL`: catalog API base URL (must be a valid URL)
    ///
    /// # Optional env vars
    /// - `API_TIMEOUT_SECS`: per-request timeout towards the API (default 30)
    /// - `COOKIE_KEY`: cookie encryption key bytes (at least 64)
    /// - `DEV_MODE`: `"1"` or `"true"` disables secure cookies
    /// - `SESSION_COOKIE_NAME`: session cookie name
    /// - `SESSION_TTL_MINUTES`: session cookie lifetime
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required variable is missing or a value is invalid.
    pub fn from_env() -> Result<Self, Error> {
        let base_url_str = std::env::var("API_BASE_URL")
            .map_err(|_| Error::Config("API_BASE_URL is required".into()))?;
        let base_url: Url = base_url_str
            .parse()
            .map_err(|e| Error::Config(format!("API_BASE_URL: {e}")))?;

        let mut api = ApiConfig::new(base_url);
        if let Ok(secs) = std::env::var("API_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| Error::Config(format!("API_TIMEOUT_SECS: {e}")))?;
            api = api.with_timeout(Duration::from_secs(secs));
        }

        let dev_mode = matches!(std::env::var("DEV_MODE").as_deref(), Ok("1") | Ok("true"));

        let cookie_key = match std::env::var("COOKIE_KEY") {
            Ok(k) => Key::try_from(k.as_bytes()).map_err(|_| {
                Error::Config(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?,
            Err(_) => {
                tracing::warn!("COOKIE_KEY not set; sessions will not survive a restart");
                Key::generate()
            }
        };

        let mut config = Self::new(api)
            .with_cookie_key(cookie_key)
            .with_secure_cookies(!dev_mode);

        if let Ok(name) = std::env::var("SESSION_COOKIE_NAME") {
            config = config.with_session_cookie_name(name);
        }
        if let Ok(minutes) = std::env::var("SESSION_TTL_MINUTES") {
            let minutes: i64 = minutes
                .parse()
                .map_err(|e| Error::Config(format!("SESSION_TTL_MINUTES: {e}")))?;
            config = config.with_session_ttl_minutes(minutes);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_session_ttl_minutes(mut self, minutes: i64) -> Self {
        self.settings.session_ttl_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    /// Replace the token check run by the authorization gate
    /// (default: [`ExpiryValidator`]).
    #[must_use]
    pub fn with_token_validator(mut self, validator: impl TokenValidator) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    #[must_use]
    pub fn api(&self) -> &ApiConfig {
        &self.api
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_secure() {
        let config = PortalConfig::new(ApiConfig::new("http://localhost:5000".parse().unwrap()));
        assert!(config.settings.secure_cookies);
        assert_eq!(config.settings.session_cookie_name, "__shelf_session");
        assert_eq!(config.settings.session_ttl_minutes, 1440);
    }

    #[test]
    fn test_overrides_apply() {
        let config = PortalConfig::new(ApiConfig::new("http://localhost:5000".parse().unwrap()))
            .with_session_cookie_name("sid")
            .with_session_ttl_minutes(30)
            .with_secure_cookies(false);
        assert_eq!(config.settings.session_cookie_name, "sid");
        assert_eq!(config.settings.session_ttl_minutes, 30);
        assert!(!config.settings.secure_cookies);
    }
}
