//! Client configuration sourced from the environment.
//!
//! # Design
//! - The base URL is resolved once, at construction, and never changes afterwards.
//! - The session persistence strategy is a deployment choice, not a call-site one.
//! - No timeout is installed unless one is configured explicitly.

use std::env;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Production backend used when `DDI_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://dunkin-demand-intelligence.onrender.com/api/v1";

/// Environment variable overriding the backend base URL.
pub const ENV_API_URL: &str = "DDI_API_URL";
/// Environment variable holding an optional request timeout in seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "DDI_HTTP_TIMEOUT_SECS";
/// Environment variable selecting the session persistence strategy.
pub const ENV_SESSION_MODE: &str = "DDI_SESSION_MODE";
/// Environment variable overriding the durable session file location.
pub const ENV_SESSION_FILE: &str = "DDI_SESSION_FILE";

/// How the session credential survives between client instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionMode {
    /// Token and user record are written to a file and restored by the next process.
    #[default]
    Durable,
    /// Server-set cookie plus an in-memory user record, gone when the client is dropped.
    Ephemeral,
}

impl SessionMode {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Durable => "durable",
            Self::Ephemeral => "ephemeral",
        }
    }

    /// Whether requests should carry the cookie jar.
    #[must_use]
    pub const fn uses_cookies(self) -> bool {
        matches!(self, Self::Ephemeral)
    }
}

impl Display for SessionMode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for SessionMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "durable" | "token" => Ok(Self::Durable),
            "ephemeral" | "session" | "cookie" => Ok(Self::Ephemeral),
            _ => Err(ConfigError::InvalidSessionMode {
                value: value.to_string(),
            }),
        }
    }
}

/// Settings used to construct an [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root address every endpoint path is appended to.
    pub base_url: Url,
    /// Optional per-request timeout.
    pub timeout: Option<Duration>,
    /// Session persistence strategy.
    pub session_mode: SessionMode,
    /// Explicit location of the durable session file.
    pub session_file: Option<PathBuf>,
    /// Identifier sent as `x-request-id` on every request.
    pub request_id: Option<String>,
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with every other setting defaulted.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: None,
            session_mode: SessionMode::Durable,
            session_file: None,
            request_id: None,
        }
    }

    /// Configuration pointing at the production backend.
    ///
    /// # Errors
    ///
    /// Returns an error only if [`DEFAULT_API_URL`] fails to parse.
    pub fn production() -> Result<Self, ConfigError> {
        Ok(Self::new(parse_base_url(DEFAULT_API_URL)?))
    }

    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for unset keys.
    ///
    /// # Errors
    ///
    /// Returns an error when a value is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_url = parse_base_url(present(ENV_API_URL).as_deref().unwrap_or(DEFAULT_API_URL))?;
        let timeout = present(ENV_HTTP_TIMEOUT_SECS)
            .map(|value| parse_timeout(&value))
            .transpose()?;
        let session_mode = present(ENV_SESSION_MODE)
            .map(|value| value.parse::<SessionMode>())
            .transpose()?
            .unwrap_or_default();
        let session_file = present(ENV_SESSION_FILE).map(PathBuf::from);

        Ok(Self {
            base_url,
            timeout,
            session_mode,
            session_file,
            request_id: None,
        })
    }

    /// Base URL without a trailing slash, ready for endpoint concatenation.
    #[must_use]
    pub fn base_url_str(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}

/// Parse and validate a backend base URL.
///
/// # Errors
///
/// Returns an error when the input is not an absolute `http`/`https` URL or
/// carries a query or fragment.
pub fn parse_base_url(input: &str) -> Result<Url, ConfigError> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed).map_err(|err| ConfigError::InvalidBaseUrl {
        value: trimmed.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            value: trimmed.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidBaseUrl {
            value: trimmed.to_string(),
            reason: "query strings and fragments are not allowed".to_string(),
        });
    }
    Ok(url)
}

/// Parse a timeout expressed in whole seconds.
///
/// # Errors
///
/// Returns an error for non-numeric or zero values.
pub fn parse_timeout(input: &str) -> Result<Duration, ConfigError> {
    match input.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout {
            value: input.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() -> Result<(), ConfigError> {
        let config = ClientConfig::from_lookup(lookup_from(&[]))?;
        assert_eq!(config.base_url_str(), DEFAULT_API_URL);
        assert_eq!(config.session_mode, SessionMode::Durable);
        assert!(config.timeout.is_none());
        assert!(config.session_file.is_none());
        Ok(())
    }

    #[test]
    fn environment_overrides_are_applied() -> Result<(), ConfigError> {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (ENV_API_URL, "http://localhost:5000/api/v1/"),
            (ENV_HTTP_TIMEOUT_SECS, "15"),
            (ENV_SESSION_MODE, "Ephemeral"),
            (ENV_SESSION_FILE, "/tmp/ddi-session.json"),
        ]))?;
        assert_eq!(config.base_url_str(), "http://localhost:5000/api/v1");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.session_mode, SessionMode::Ephemeral);
        assert_eq!(
            config.session_file,
            Some(PathBuf::from("/tmp/ddi-session.json"))
        );
        Ok(())
    }

    #[test]
    fn blank_values_fall_back_to_defaults() -> Result<(), ConfigError> {
        let config = ClientConfig::from_lookup(lookup_from(&[(ENV_API_URL, "   ")]))?;
        assert_eq!(config.base_url_str(), DEFAULT_API_URL);
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup_from(&[(ENV_API_URL, "ftp://example.com")])),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup_from(&[(ENV_HTTP_TIMEOUT_SECS, "0")])),
            Err(ConfigError::InvalidTimeout { .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup_from(&[(ENV_SESSION_MODE, "forever")])),
            Err(ConfigError::InvalidSessionMode { .. })
        ));
    }

    #[test]
    fn base_url_rejects_query_strings() {
        assert!(parse_base_url("https://example.com/api?x=1").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn session_mode_aliases_parse() -> Result<(), ConfigError> {
        assert_eq!("cookie".parse::<SessionMode>()?, SessionMode::Ephemeral);
        assert_eq!("token".parse::<SessionMode>()?, SessionMode::Durable);
        assert!(SessionMode::Ephemeral.uses_cookies());
        assert!(!SessionMode::Durable.uses_cookies());
        Ok(())
    }
}
