//! Env-driven configuration for the service and library.
//!
//! Values are read from the process environment; `dotenv` is loaded on demand
//! by the binaries. Defaults are provided for convenience during development.
use std::env;
use std::time::Duration;

use crate::prodia::retry::RetryPolicy;

pub const DEFAULT_PRODIA_URL: &str = "https://inference.prodia.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub prodia_token: Option<String>,
    pub prodia_url: String,
    pub static_drive_path: String,
    pub public_base_url: Option<String>,
    pub api_host: String,
    pub api_port: String,
    pub retry_attempts: u32,
    pub retry_step_ms: u64,
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> Result<Self, env::VarError> {
        Ok(Config {
            prodia_token: non_empty(env::var("PRODIA_TOKEN").ok()),
            prodia_url: env::var("PRODIA_URL").unwrap_or_else(|_| DEFAULT_PRODIA_URL.to_string()),
            static_drive_path: env::var("STATIC_DRIVE_PATH").unwrap_or_else(|_| "./static".to_string()),
            public_base_url: non_empty(env::var("PUBLIC_BASE_URL").ok()),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            api_port: env::var("API_PORT").unwrap_or_else(|_| "8190".to_string()),
            retry_attempts: parse_or("PRODIA_RETRY_ATTEMPTS", 3),
            retry_step_ms: parse_or("PRODIA_RETRY_STEP_MS", 1000),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::linear(self.retry_attempts, Duration::from_millis(self.retry_step_ms))
    }

    /// Print the effective variables. The token is never echoed, only whether it is set.
    pub fn print_env_vars() {
        let token_state = match env::var("PRODIA_TOKEN") {
            Ok(t) if !t.trim().is_empty() => "<set>",
            _ => "<unset>",
        };
        println!("PRODIA_TOKEN: {}", token_state);
        for key in [
            "PRODIA_URL",
            "STATIC_DRIVE_PATH",
            "PUBLIC_BASE_URL",
            "API_HOST",
            "API_PORT",
            "PRODIA_RETRY_ATTEMPTS",
            "PRODIA_RETRY_STEP_MS",
        ] {
            println!("{}: {}", key, env::var(key).unwrap_or_else(|_| "<unset>".to_string()));
        }
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} '{}', falling back to default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
