use std::env;
use std::time::Duration;

/// Server settings read from environment variables, with a default for every
/// unset value.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// PORT, default 8080.
    pub port: u16,
    /// REDIS_URL, default redis://127.0.0.1:6379.
    pub redis_url: String,
    /// LOG_LEVEL, default "info".
    pub log_level: String,
    /// CORS_ORIGINS, comma-separated, default "*".
    pub cors_origins: Vec<String>,
    /// BALANCE_FILE, default data/balance.toml.
    pub balance_file: String,
    /// WS_PING_INTERVAL_SECS, default 15.
    pub ping_interval: Duration,
    /// WS_PONG_TIMEOUT_SECS, default 10.
    pub pong_timeout: Duration,
    /// RECONNECT_WINDOW_SECS, default 60.
    pub reconnect_window: Duration,
    /// ROOM_TTL_SECS, default 300.
    pub room_ttl: Duration,
    /// SHUTDOWN_DRAIN_TIMEOUT_SECS, default 5.
    pub shutdown_drain_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        ServerConfig {
            port: env_parse("PORT", 8080),
            redis_url: env_or("REDIS_URL", "redis://127.0.0.1:6379"),
            log_level: env_or("LOG_LEVEL", "info"),
            cors_origins: env_or("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            balance_file: env_or("BALANCE_FILE", "data/balance.toml"),
            ping_interval: env_secs("WS_PING_INTERVAL_SECS", 15),
            pong_timeout: env_secs("WS_PONG_TIMEOUT_SECS", 10),
            reconnect_window: env_secs("RECONNECT_WINDOW_SECS", 60),
            room_ttl: env_secs("ROOM_TTL_SECS", 300),
            shutdown_drain_timeout: env_secs("SHUTDOWN_DRAIN_TIMEOUT_SECS", 5),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(env_parse(key, default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let cfg = ServerConfig::from_env();
        assert!(cfg.port > 0);
        assert!(!cfg.balance_file.is_empty());
        assert!(!cfg.cors_origins.is_empty());
        assert!(cfg.reconnect_window >= Duration::from_secs(1));
        assert!(cfg.shutdown_drain_timeout >= Duration::from_secs(1));
    }
}
