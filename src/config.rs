// Immutable, env-var driven configuration loaded once at startup. Mirrors
// the teacher's `FeatureFlags::load()` shape, minus the on-disk file tier
// (no policy file format is specified for this crate, so env-only).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoreConfig {
    pub live_pricing_enabled: bool,
    pub pricing_fallback_to_static: bool,
    pub aws_pricing_enabled: bool,
    pub gcp_pricing_enabled: bool,
    pub gcp_pricing_api_key: Option<String>,
    pub azure_pricing_enabled: bool,
    pub pricing_concurrency_limit: usize,
    pub pricing_timeout_secs: u64,
    pub pricing_max_retries: u32,
    pub cache_default_ttl_secs: u64,
    pub database_url: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            live_pricing_enabled: false,
            pricing_fallback_to_static: true,
            aws_pricing_enabled: false,
            gcp_pricing_enabled: false,
            gcp_pricing_api_key: None,
            azure_pricing_enabled: false,
            pricing_concurrency_limit: 8,
            pricing_timeout_secs: 5,
            pricing_max_retries: 2,
            cache_default_ttl_secs: 3600,
            database_url: None,
        }
    }
}

impl CoreConfig {
    /// Loads configuration from the process environment, per the closed,
    /// enumerated variable table. Unset booleans default to `false`
    /// (except `pricing_fallback_to_static`, which defaults to `true`);
    /// malformed numeric overrides fall back to the default rather than
    /// failing startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            live_pricing_enabled: env_bool("LIVE_PRICING_ENABLED", defaults.live_pricing_enabled),
            pricing_fallback_to_static: env_bool(
                "PRICING_FALLBACK_TO_STATIC",
                defaults.pricing_fallback_to_static,
            ),
            aws_pricing_enabled: env_bool("AWS_PRICING_ENABLED", defaults.aws_pricing_enabled),
            gcp_pricing_enabled: env_bool("GCP_PRICING_ENABLED", defaults.gcp_pricing_enabled),
            gcp_pricing_api_key: std::env::var("GCP_PRICING_API_KEY").ok(),
            azure_pricing_enabled: env_bool(
                "AZURE_PRICING_ENABLED",
                defaults.azure_pricing_enabled,
            ),
            pricing_concurrency_limit: env_parsed(
                "PRICING_CONCURRENCY_LIMIT",
                defaults.pricing_concurrency_limit,
            ),
            pricing_timeout_secs: env_parsed(
                "PRICING_TIMEOUT_SECS",
                defaults.pricing_timeout_secs,
            ),
            pricing_max_retries: env_parsed(
                "PRICING_MAX_RETRIES",
                defaults.pricing_max_retries,
            ),
            cache_default_ttl_secs: env_parsed(
                "CACHE_DEFAULT_TTL_SECS",
                defaults.cache_default_ttl_secs,
            ),
            database_url: std::env::var("DATABASE_URL").ok(),
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let cfg = CoreConfig::default();
        assert!(!cfg.live_pricing_enabled);
        assert!(cfg.pricing_fallback_to_static);
        assert_eq!(cfg.pricing_concurrency_limit, 8);
    }
}
