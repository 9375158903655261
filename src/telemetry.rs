// src/telemetry.rs
//! Tracing setup and log-safe helpers.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

fn default_filter(debug: bool) -> &'static str {
    if debug {
        "hatex=debug,tower_http=debug,info"
    } else {
        "hatex=info,warn"
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the debug-based default;
/// `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    // try_init: a second call (tests, embedding) keeps the first subscriber.
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

/// Short, stable id for a piece of text. Raw user text never goes to the logs.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("I hate you");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("I hate you"));
        assert_ne!(a, anon_hash("i hate you"));
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn debug_filter_is_louder() {
        assert!(default_filter(true).contains("hatex=debug"));
        assert!(default_filter(false).contains("hatex=info"));
    }
}
