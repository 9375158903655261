// src/config.rs
//! Process configuration, read from the environment (`.env` is loaded by the binary).

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

// --- env defaults & names ---
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
pub const DEFAULT_MODEL_PATH: &str = "model.pkl";

pub const ENV_PORT: &str = "PORT";
pub const ENV_HOST: &str = "HOST";
pub const ENV_DEBUG: &str = "FLASK_DEBUG";
pub const ENV_MODEL_PATH: &str = "MODEL_PATH";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Verbose logging and stack traces in 500 responses.
    pub debug: bool,
    /// Declared for parity with deployments that ship a model file. Never read.
    pub model_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
            debug: true,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (env, map in tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: parse_env(lookup(ENV_HOST)).unwrap_or(defaults.host),
            port: parse_env(lookup(ENV_PORT)).unwrap_or(defaults.port),
            debug: lookup(ENV_DEBUG)
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.debug),
            model_path: lookup(ENV_MODEL_PATH)
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|s| s.trim().parse::<T>().ok())
}

/// Same truthy set the service has always accepted for its debug switch.
fn parse_flag(raw: &str) -> bool {
    matches!(raw, "1" | "true" | "True")
}
