use std::{env, net::SocketAddr};

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.bandmate.app";

/// Behavior when an operation requires auth but no token is configured.
///
/// `Open` sends the request without an `Authorization` header and lets the
/// backend decide; `Strict` fails the call before any request goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPolicy {
    #[default]
    Open,
    Strict,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub auth_token: Option<String>,
    pub auth_policy: AuthPolicy,
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid u16")]
    InvalidPort,
    #[error("BANDMATE_AUTH_POLICY must be one of: open, strict")]
    InvalidAuthPolicy,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = env::var("BANDMATE_API_URL")
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let auth_token = env::var("BANDMATE_AUTH_TOKEN")
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let auth_policy = env::var("BANDMATE_AUTH_POLICY")
            .ok()
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .map(|value| match value.as_str() {
                "open" => Ok(AuthPolicy::Open),
                "strict" => Ok(AuthPolicy::Strict),
                _ => Err(ConfigError::InvalidAuthPolicy),
            })
            .transpose()?
            .unwrap_or_default();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);

        let config = Self {
            api_url,
            auth_token,
            auth_policy,
            bind_addr,
            port,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Process environment is shared across the test harness threads.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_guard() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn parse_defaults() {
        let _env = env_guard();
        env::remove_var("BANDMATE_API_URL");
        env::remove_var("BANDMATE_AUTH_TOKEN");
        env::remove_var("BANDMATE_AUTH_POLICY");
        env::remove_var("BIND_ADDR");
        env::remove_var("PORT");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.auth_token, None);
        assert_eq!(config.auth_policy, AuthPolicy::Open);
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn api_url_trailing_slash_is_trimmed() {
        let _env = env_guard();
        env::set_var("BANDMATE_API_URL", "https://backend.example/");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.api_url, "https://backend.example");

        env::remove_var("BANDMATE_API_URL");
    }

    #[test]
    fn blank_auth_token_is_treated_as_absent() {
        let _env = env_guard();
        env::set_var("BANDMATE_AUTH_TOKEN", "   ");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.auth_token, None);

        env::remove_var("BANDMATE_AUTH_TOKEN");
    }

    #[test]
    fn strict_auth_policy_parses() {
        let _env = env_guard();
        env::set_var("BANDMATE_AUTH_POLICY", "strict");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.auth_policy, AuthPolicy::Strict);

        env::remove_var("BANDMATE_AUTH_POLICY");
    }

    #[test]
    fn unknown_auth_policy_fails() {
        let _env = env_guard();
        env::set_var("BANDMATE_AUTH_POLICY", "lenient");

        let err = Config::from_env().expect_err("expected invalid policy error");
        assert!(matches!(err, ConfigError::InvalidAuthPolicy));

        env::remove_var("BANDMATE_AUTH_POLICY");
    }

    #[test]
    fn invalid_port_fails() {
        let _env = env_guard();
        env::set_var("PORT", "not-a-port");

        let err = Config::from_env().expect_err("expected invalid port error");
        assert!(matches!(err, ConfigError::InvalidPort));

        env::remove_var("PORT");
    }
}
