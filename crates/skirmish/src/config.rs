//! Server configuration.

use serde::{Deserialize, Serialize};

/// Listener and seat table settings.
///
/// Operator-only data (host name, ban list) lives in
/// [`LocalSettings`](skirmish_session::LocalSettings) instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// Number of seats, host included. Default: 7.
    pub slot_count: usize,
}

impl ServerConfig {
    pub const DEFAULT_SLOT_COUNT: usize = 7;
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            slot_count: Self::DEFAULT_SLOT_COUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.slot_count, 7);
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_server_config_partial_json_fills_defaults() {
        let config: ServerConfig = serde_json::from_str(r#"{"slot_count": 4}"#).unwrap();
        assert_eq!(config.slot_count, 4);
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }
}
