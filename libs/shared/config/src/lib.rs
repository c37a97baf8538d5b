use std::env;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_STORAGE_DIR: &str = ".booking-data";
pub const DEFAULT_APPOINTMENTS_KEY: &str = "appointments";
pub const DEFAULT_REQUEST_SUMMARY_KEY: &str = "booking_request_summary";
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;
pub const DEFAULT_MATCH_LATENCY_MS: u64 = 800;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_dir: PathBuf,
    pub appointments_key: String,
    pub request_summary_key: String,
    pub suggestion_limit: usize,
    pub match_latency_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            appointments_key: DEFAULT_APPOINTMENTS_KEY.to_string(),
            request_summary_key: DEFAULT_REQUEST_SUMMARY_KEY.to_string(),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            match_latency_ms: DEFAULT_MATCH_LATENCY_MS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            storage_dir: env::var("BOOKING_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("BOOKING_STORAGE_DIR not set, using {}", DEFAULT_STORAGE_DIR);
                    PathBuf::from(DEFAULT_STORAGE_DIR)
                }),
            appointments_key: env::var("BOOKING_APPOINTMENTS_KEY")
                .unwrap_or_else(|_| DEFAULT_APPOINTMENTS_KEY.to_string()),
            request_summary_key: env::var("BOOKING_REQUEST_SUMMARY_KEY")
                .unwrap_or_else(|_| DEFAULT_REQUEST_SUMMARY_KEY.to_string()),
            suggestion_limit: parse_or_default("BOOKING_SUGGESTION_LIMIT", DEFAULT_SUGGESTION_LIMIT),
            match_latency_ms: parse_or_default("BOOKING_MATCH_LATENCY_MS", DEFAULT_MATCH_LATENCY_MS),
        };

        if !config.is_configured() {
            warn!("Booking engine not fully configured - falling back to defaults");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.appointments_key.is_empty()
            && !self.request_summary_key.is_empty()
            && self.appointments_key != self.request_summary_key
            && self.suggestion_limit > 0
    }

    /// Config for tests: defaults with a throwaway storage directory and no latency.
    pub fn for_tests(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            match_latency_ms: 0,
            ..Self::default()
        }
    }
}

fn parse_or_default<T: std::str::FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
