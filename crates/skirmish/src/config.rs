//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use skirmish_room::RoomConfig;

use crate::SkirmishError;

/// Environment variable holding the listen address.
pub const BIND_VAR: &str = "SKIRMISH_BIND";

/// Environment variable overriding the round time limit, in seconds.
pub const ROUND_SECS_VAR: &str = "SKIRMISH_ROUND_SECS";

/// Everything needed to start a server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// Settings applied to every room.
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Result<Self, SkirmishError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`. Unset variables keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SkirmishError> {
        let mut config = Self::default();

        if let Some(addr) = lookup(BIND_VAR) {
            config.bind_addr = addr;
        }

        if let Some(raw) = lookup(ROUND_SECS_VAR) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| SkirmishError::Config(format!("{ROUND_SECS_VAR}={raw:?} is not a number")))?;
            if secs == 0 {
                return Err(SkirmishError::Config(format!(
                    "{ROUND_SECS_VAR} must be at least 1"
                )));
            }
            config.room.round_time_limit = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.room.round_time_limit, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = ServerConfig::from_lookup(lookup(&[
            (BIND_VAR, "127.0.0.1:9000"),
            (ROUND_SECS_VAR, " 15 "),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.room.round_time_limit, Duration::from_secs(15));
    }

    #[test]
    fn test_bad_round_secs_is_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[(ROUND_SECS_VAR, "soon")])).unwrap_err();
        assert!(matches!(err, SkirmishError::Config(_)));

        let err = ServerConfig::from_lookup(lookup(&[(ROUND_SECS_VAR, "0")])).unwrap_err();
        assert!(matches!(err, SkirmishError::Config(_)));
    }
}
