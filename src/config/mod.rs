//! # Configuration
//!
//! Environment-variable driven configuration, read once at process startup
//! into an immutable [`Config`]. There is no mutable global configuration
//! state; every component that needs a threshold or concurrency bound is
//! handed a `Config` (or a narrower sub-struct) at construction.
//!
//! An optional `deptrust.toml` file can override the policy thresholds;
//! environment variables always take precedence over the file, which in turn
//! takes precedence over the built-in defaults below.

use std::env;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

fn cpu_parallel_default() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(1, 32)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_f64(key: &str, default: f64) -> Result<f64, ConfigError> {
    match env_string_opt(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: key.to_string(),
            value: raw,
            reason: e.to_string(),
        }),
    }
}

fn env_usize(key: &str, default: usize) -> Result<usize, ConfigError> {
    match env_string_opt(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<usize>().map_err(|e| ConfigError::InvalidEnvVar {
            var: key.to_string(),
            value: raw,
            reason: e.to_string(),
        }),
    }
}

fn env_i64(key: &str, default: i64) -> Result<i64, ConfigError> {
    match env_string_opt(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<i64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: key.to_string(),
            value: raw,
            reason: e.to_string(),
        }),
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool, ConfigError> {
    match env_string_opt(key) {
        None => Ok(default),
        Some(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidEnvVar {
                var: key.to_string(),
                value: raw,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}

/// Thresholds consumed by the trust policy engine. Overridable via
/// `deptrust.toml`'s `[policy]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PolicyThresholds {
    pub abandonment_threshold_days: i64,
    pub churn_high: u64,
    pub churn_medium: u64,
    pub bus_factor_zero: u64,
    pub bus_factor_one: u64,
    pub low_maturity_threshold: u64,
    pub typosquat_max_distance: usize,
}

impl Default for PolicyThresholds {
    fn default() -> Self {
        Self {
            abandonment_threshold_days: 540,
            churn_high: 10,
            churn_medium: 5,
            bus_factor_zero: 0,
            bus_factor_one: 1,
            low_maturity_threshold: 3,
            typosquat_max_distance: 2,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    policy: PolicyThresholdsFile,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PolicyThresholdsFile {
    abandonment_threshold_days: Option<i64>,
    churn_high: Option<u64>,
    churn_medium: Option<u64>,
    low_maturity_threshold: Option<u64>,
    typosquat_max_distance: Option<usize>,
}

/// The crate's immutable, process-wide configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub http_timeout_secs: f64,
    pub http_retries: u32,

    pub osv_batch_size: usize,
    pub osv_max_concurrency: usize,
    pub osv_cache_size: usize,
    pub disable_osv: bool,
    pub osv_endpoint: String,

    pub github_max_concurrency: usize,
    pub github_token: Option<String>,
    pub disable_github_advisories: bool,
    pub github_graphql_endpoint: String,

    pub gomod_concurrency: usize,
    pub policy_concurrency: usize,

    pub policy: PolicyThresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_timeout_secs: 5.0,
            http_retries: 2,
            osv_batch_size: 18,
            osv_max_concurrency: 4,
            osv_cache_size: 512,
            disable_osv: false,
            osv_endpoint: "https://api.osv.dev/v1/querybatch".to_string(),
            github_max_concurrency: 6,
            github_token: None,
            disable_github_advisories: false,
            github_graphql_endpoint: "https://api.github.com/graphql".to_string(),
            gomod_concurrency: 5,
            policy_concurrency: cpu_parallel_default(),
            policy: PolicyThresholds::default(),
        }
    }
}

impl Config {
    /// Load configuration from an optional `deptrust.toml` file overlaid with
    /// environment variables (env wins on every field).
    pub fn load(config_path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut policy = PolicyThresholds::default();

        if let Some(path) = config_path {
            if path.exists() {
                let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                    path: path.display().to_string(),
                    source: e,
                })?;
                let file_config: FileConfig =
                    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                        path: path.display().to_string(),
                        source: e,
                    })?;
                if let Some(v) = file_config.policy.abandonment_threshold_days {
                    policy.abandonment_threshold_days = v;
                }
                if let Some(v) = file_config.policy.churn_high {
                    policy.churn_high = v;
                }
                if let Some(v) = file_config.policy.churn_medium {
                    policy.churn_medium = v;
                }
                if let Some(v) = file_config.policy.low_maturity_threshold {
                    policy.low_maturity_threshold = v;
                }
                if let Some(v) = file_config.policy.typosquat_max_distance {
                    policy.typosquat_max_distance = v;
                }
            }
        }

        policy.abandonment_threshold_days =
            env_i64("DEPTRUST_ABANDONMENT_THRESHOLD_DAYS", policy.abandonment_threshold_days)?;
        policy.churn_high = env_usize("DEPTRUST_CHURN_HIGH", policy.churn_high as usize)? as u64;
        policy.churn_medium = env_usize("DEPTRUST_CHURN_MEDIUM", policy.churn_medium as usize)? as u64;
        policy.low_maturity_threshold =
            env_usize("DEPTRUST_LOW_MATURITY_THRESHOLD", policy.low_maturity_threshold as usize)? as u64;
        policy.typosquat_max_distance =
            env_usize("DEPTRUST_TYPOSQUAT_MAX_DISTANCE", policy.typosquat_max_distance)?;

        let github_token = env_string_opt("DEPTRUST_GITHUB_TOKEN").or_else(|| env_string_opt("GITHUB_TOKEN"));

        Ok(Config {
            http_timeout_secs: env_f64("DEPTRUST_HTTP_TIMEOUT", 5.0)?,
            http_retries: env_usize("DEPTRUST_HTTP_RETRIES", 2)? as u32,
            osv_batch_size: env_usize("DEPTRUST_OSV_BATCH_SIZE", 18)?,
            osv_max_concurrency: env_usize("DEPTRUST_OSV_MAX_CONCURRENCY", 4)?,
            osv_cache_size: env_usize("DEPTRUST_OSV_CACHE_SIZE", 512)?,
            disable_osv: env_bool("DEPTRUST_DISABLE_OSV", false)?,
            osv_endpoint: env_string_opt("DEPTRUST_OSV_ENDPOINT")
                .unwrap_or_else(|| "https://api.osv.dev/v1/querybatch".to_string()),
            github_max_concurrency: env_usize("DEPTRUST_GITHUB_MAX_CONCURRENCY", 6)?,
            github_token,
            disable_github_advisories: env_bool("DEPTRUST_DISABLE_GITHUB_ADVISORIES", false)?,
            github_graphql_endpoint: env_string_opt("DEPTRUST_GITHUB_GRAPHQL_ENDPOINT")
                .unwrap_or_else(|| "https://api.github.com/graphql".to_string()),
            gomod_concurrency: env_usize("DEPTRUST_GOMOD_CONCURRENCY", 5)?,
            policy_concurrency: env_usize("DEPTRUST_POLICY_CONCURRENCY", cpu_parallel_default())?,
            policy,
        })
    }

    pub fn load_or_default() -> Config {
        Config::load(None).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_shipped_values() {
        let config = Config::default();
        assert_eq!(config.http_timeout_secs, 5.0);
        assert_eq!(config.osv_batch_size, 18);
        assert_eq!(config.osv_max_concurrency, 4);
        assert_eq!(config.osv_cache_size, 512);
        assert_eq!(config.github_max_concurrency, 6);
        assert_eq!(config.gomod_concurrency, 5);
        assert_eq!(config.osv_endpoint, "https://api.osv.dev/v1/querybatch");
        assert_eq!(config.github_graphql_endpoint, "https://api.github.com/graphql");
        assert_eq!(config.policy.abandonment_threshold_days, 540);
        assert_eq!(config.policy.churn_high, 10);
        assert_eq!(config.policy.churn_medium, 5);
        assert_eq!(config.policy.low_maturity_threshold, 3);
        assert_eq!(config.policy.typosquat_max_distance, 2);
    }

    #[test]
    fn policy_concurrency_is_at_least_one_and_capped() {
        let config = Config::default();
        assert!(config.policy_concurrency >= 1);
        assert!(config.policy_concurrency <= 32);
    }

    #[test]
    fn invalid_env_var_is_a_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("DEPTRUST_HTTP_TIMEOUT", "not-a-number");
        let result = Config::load(None);
        env::remove_var("DEPTRUST_HTTP_TIMEOUT");
        assert!(result.is_err());
    }

    #[test]
    fn env_overrides_file_and_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("DEPTRUST_OSV_BATCH_SIZE", "42");
        let config = Config::load(None).unwrap();
        env::remove_var("DEPTRUST_OSV_BATCH_SIZE");
        assert_eq!(config.osv_batch_size, 42);
    }

    #[test]
    fn github_token_falls_back_to_bare_env_var() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("DEPTRUST_GITHUB_TOKEN");
        env::set_var("GITHUB_TOKEN", "ghp_test");
        let config = Config::load(None).unwrap();
        env::remove_var("GITHUB_TOKEN");
        assert_eq!(config.github_token.as_deref(), Some("ghp_test"));
    }
}
