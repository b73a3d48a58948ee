use once_cell::sync::Lazy;
use std::{env, time::Duration};

/// Holds all tunables, read-once from ENV with fallbacks.
pub struct Settings {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
}

impl Settings {
    fn from_env() -> Self {
        // optionally load .env
        let _ = dotenvy::dotenv();

        // helper to parse seconds into Duration
        fn parse_secs(var: &str, default_secs: u64) -> Duration {
            env::var(var)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or_else(|| Duration::from_secs(default_secs))
        }

        // helper to parse millis into Duration
        fn parse_millis(var: &str, default_ms: u64) -> Duration {
            env::var(var)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or_else(|| Duration::from_millis(default_ms))
        }

        Settings {
            poll_interval: parse_secs("TABLET_POLL_INTERVAL_SECS", 10),
            settle_delay: parse_millis("TABLET_SETTLE_DELAY_MS", 300),
        }
    }
}

/// Global settings instance
pub static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);
