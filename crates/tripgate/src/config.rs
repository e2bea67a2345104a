//! Client configuration.

use serde::{Deserialize, Serialize};
use tripgate_session::SessionConfig;

use crate::TripgateError;

/// Everything needed to build a [`TripgateClient`](crate::TripgateClient).
///
/// Serde-derived so apps can load it from whatever config file they
/// already have. Missing fields fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the marketplace API, e.g. `https://api.tripgate.io/v1`.
    pub api_base: String,

    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:4000/api".to_owned(),
            session: SessionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Checks the settings that would otherwise fail on first use.
    ///
    /// # Errors
    /// Returns [`TripgateError::Config`] naming the bad setting.
    pub fn validate(&self) -> Result<(), TripgateError> {
        let base = self.api_base.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(TripgateError::Config(format!(
                "api_base must be an http(s) URL, got {base:?}"
            )));
        }
        validate_session(&self.session)
    }
}

/// The two storage keys must be set and distinct, or one would
/// overwrite the other.
pub(crate) fn validate_session(session: &SessionConfig) -> Result<(), TripgateError> {
    if session.record_key.is_empty() || session.token_key.is_empty() {
        return Err(TripgateError::Config("storage keys must not be empty".into()));
    }
    if session.record_key == session.token_key {
        return Err(TripgateError::Config(
            "record_key and token_key must differ".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default_is_valid() {
        assert_eq!(ClientConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_client_config_partial_json_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{ "api_base": "https://api.tripgate.io" }"#).unwrap();
        assert_eq!(config.api_base, "https://api.tripgate.io");
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_validate_rejects_non_http_base() {
        let config = ClientConfig {
            api_base: "ftp://files".into(),
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(TripgateError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_shared_storage_key() {
        let config = ClientConfig {
            session: SessionConfig {
                token_key: "tripgate.session".into(),
                ..SessionConfig::default()
            },
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
