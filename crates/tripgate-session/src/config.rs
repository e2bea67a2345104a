//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the session layer.
///
/// Override individual fields with struct update syntax:
///
/// ```rust
/// use std::time::Duration;
/// use tripgate_session::SessionConfig;
///
/// let config = SessionConfig {
///     logout_timeout: Duration::from_secs(1),
///     ..SessionConfig::default()
/// };
/// assert_eq!(config.token_key, "token");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Storage key for the full serialized principal.
    pub record_key: String,

    /// Storage key for the bare session token. Request interceptors read
    /// the token from here without parsing the whole record.
    pub token_key: String,

    /// How long logout waits for the server before giving up. The local
    /// session is already gone by then either way.
    pub logout_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            record_key: "tripgate.session".to_owned(),
            token_key: "token".to_owned(),
            logout_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.record_key, "tripgate.session");
        assert_eq!(config.token_key, "token");
        assert_eq!(config.logout_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_session_config_deserializes_from_json() {
        let config: SessionConfig = serde_json::from_str(
            r#"{
                "record_key": "app.user",
                "token_key": "auth_token",
                "logout_timeout": { "secs": 2, "nanos": 0 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.record_key, "app.user");
        assert_eq!(config.logout_timeout, Duration::from_secs(2));
    }
}
