//! Environment variable configuration
//!
//! Provides environment variable overrides for runner configuration.

use anyhow::Result;
use std::env;

use super::{LoopFlavor, RunnerConfig, TimeoutPolicy};

/// Environment variable prefix
const ENV_PREFIX: &str = "AIO_TESTING";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Timeout from AIO_TESTING_TIMEOUT_MS (0 = unbounded)
    pub timeout_ms: Option<u64>,
    /// Grace period from AIO_TESTING_GRACE_MS
    pub grace_ms: Option<u64>,
    /// Settle period from AIO_TESTING_SETTLE_MS
    pub settle_ms: Option<u64>,
    /// Timeout policy from AIO_TESTING_TIMEOUT_POLICY
    pub timeout_policy: Option<String>,
    /// Loop flavor from AIO_TESTING_LOOP
    pub loop_flavor: Option<String>,
    /// Worker threads from AIO_TESTING_WORKERS
    pub workers: Option<usize>,
    /// Config file from AIO_TESTING_CONFIG
    pub config_file: Option<String>,
    /// Log level from AIO_TESTING_LOG
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            timeout_ms: get_env_parse("TIMEOUT_MS"),
            grace_ms: get_env_parse("GRACE_MS"),
            settle_ms: get_env_parse("SETTLE_MS"),
            timeout_policy: get_env("TIMEOUT_POLICY"),
            loop_flavor: get_env("LOOP"),
            workers: get_env_parse("WORKERS"),
            config_file: get_env("CONFIG"),
            log_level: get_env("LOG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.timeout_ms.is_some()
            || self.grace_ms.is_some()
            || self.settle_ms.is_some()
            || self.timeout_policy.is_some()
            || self.loop_flavor.is_some()
            || self.workers.is_some()
            || self.config_file.is_some()
            || self.log_level.is_some()
    }

    /// Override fields of `config` with whatever is set in the environment
    pub fn apply(&self, config: &mut RunnerConfig) -> Result<()> {
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = (ms > 0).then_some(ms);
        }
        if let Some(ms) = self.grace_ms {
            config.grace_period_ms = ms;
        }
        if let Some(ms) = self.settle_ms {
            config.settle_ms = ms;
        }
        if let Some(policy) = &self.timeout_policy {
            config.timeout_policy = TimeoutPolicy::from_str(policy).ok_or_else(|| {
                anyhow::anyhow!("Unknown timeout policy in {ENV_PREFIX}_TIMEOUT_POLICY: {policy}")
            })?;
        }
        if let Some(flavor) = &self.loop_flavor {
            config.loop_flavor = LoopFlavor::from_str(flavor).ok_or_else(|| {
                anyhow::anyhow!("Unknown loop flavor in {ENV_PREFIX}_LOOP: {flavor}")
            })?;
        }
        if let Some(workers) = self.workers {
            config.worker_threads = workers;
        }
        Ok(())
    }

    /// Get log level with fallback
    pub fn log_level_or(&self, default: &str) -> String {
        self.log_level.clone().unwrap_or_else(|| default.to_string())
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_TIMEOUT_MS:      {:?}", ENV_PREFIX, self.timeout_ms);
        println!("  {}_GRACE_MS:        {:?}", ENV_PREFIX, self.grace_ms);
        println!("  {}_SETTLE_MS:       {:?}", ENV_PREFIX, self.settle_ms);
        println!("  {}_TIMEOUT_POLICY:  {:?}", ENV_PREFIX, self.timeout_policy);
        println!("  {}_LOOP:            {:?}", ENV_PREFIX, self.loop_flavor);
        println!("  {}_WORKERS:         {:?}", ENV_PREFIX, self.workers);
        println!("  {}_CONFIG:          {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_LOG:             {:?}", ENV_PREFIX, self.log_level);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_TIMEOUT_MS"), ms.to_string()));
        self
    }

    pub fn grace_ms(mut self, ms: u64) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_GRACE_MS"), ms.to_string()));
        self
    }

    pub fn settle_ms(mut self, ms: u64) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_SETTLE_MS"), ms.to_string()));
        self
    }

    pub fn timeout_policy(mut self, policy: impl Into<String>) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_TIMEOUT_POLICY"), policy.into()));
        self
    }

    pub fn loop_flavor(mut self, flavor: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_LOOP"), flavor.into()));
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_WORKERS"), workers.to_string()));
        self
    }

    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_CONFIG"), path.into()));
        self
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all AIO_TESTING environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_TIMEOUT_MS      Invocation timeout in milliseconds (0 = unbounded)");
    println!("  {ENV_PREFIX}_GRACE_MS        Cancellation/shutdown grace period in milliseconds");
    println!("  {ENV_PREFIX}_SETTLE_MS       Extra loop time after the invocation finishes");
    println!("  {ENV_PREFIX}_TIMEOUT_POLICY  report | fail");
    println!("  {ENV_PREFIX}_LOOP            current-thread | paused | multi-thread");
    println!("  {ENV_PREFIX}_WORKERS         Worker threads for the multi-thread loop");
    println!("  {ENV_PREFIX}_CONFIG          Path to configuration file");
    println!("  {ENV_PREFIX}_LOG             Log level (trace, debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_TIMEOUT_MS=500");
    println!("  export {ENV_PREFIX}_LOOP=multi-thread");
    println!("  aio-testing check");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(config.timeout_ms.is_none());
        assert!(!config.has_any());
        assert_eq!(config.log_level_or("info"), "info");
    }

    #[test]
    fn test_env_builder() {
        let _guard = EnvBuilder::new()
            .grace_ms(75)
            .settle_ms(5)
            .workers(3)
            .apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.grace_ms, Some(75));
        assert_eq!(config.settle_ms, Some(5));
        assert_eq!(config.workers, Some(3));
    }

    #[test]
    fn test_apply_overrides() {
        let env = EnvConfig {
            timeout_ms: Some(250),
            timeout_policy: Some("fail".to_string()),
            loop_flavor: Some("multi-thread".to_string()),
            ..Default::default()
        };

        let mut config = RunnerConfig::default();
        env.apply(&mut config).unwrap();
        assert_eq!(config.timeout_ms, Some(250));
        assert_eq!(config.timeout_policy, TimeoutPolicy::Fail);
        assert_eq!(config.loop_flavor, LoopFlavor::MultiThread);
    }

    #[test]
    fn test_zero_timeout_means_unbounded() {
        let env = EnvConfig {
            timeout_ms: Some(0),
            ..Default::default()
        };

        let mut config = RunnerConfig {
            timeout_ms: Some(100),
            ..Default::default()
        };
        env.apply(&mut config).unwrap();
        assert_eq!(config.timeout_ms, None);
    }

    #[test]
    fn test_apply_rejects_unknown_flavor() {
        let env = EnvConfig {
            loop_flavor: Some("green-threads".to_string()),
            ..Default::default()
        };

        let mut config = RunnerConfig::default();
        assert!(env.apply(&mut config).is_err());
    }
}
