use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        api_url: get_env_or_default("SIFT_API_URL", "http://localhost:8000"),
        renderer: get_env_or_default("SIFT_RENDERER", "structured"),
        timeout: get_env("SIFT_TIMEOUT_SECS").and_then(|raw| parse_timeout(&raw)),
        bind_addr: get_env_or_default("SIFT_BIND_ADDR", "127.0.0.1:3000"),
    }
});

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the research service; the endpoint path is fixed.
    pub api_url: String,
    pub renderer: String,
    /// `None` leaves timeouts to the transport.
    pub timeout: Option<Duration>,
    pub bind_addr: String,
}

fn get_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_env(key).unwrap_or_else(|| default.to_string())
}

pub fn parse_timeout(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            tracing::warn!("ignoring invalid SIFT_TIMEOUT_SECS value: {raw:?}");
            None
        }
    }
}
