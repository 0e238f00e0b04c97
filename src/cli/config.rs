//! Configuration management module
//!
//! The environment is read once, here, and the result is passed down
//! explicitly. Command-line flags take precedence over environment values.

use crate::cli::args::Cli;
use crate::common::ValidationUtils;
use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::reference::DEFAULT_REGISTRY;
use crate::registry::{DockerKeychain, RegistryClient};
use crate::registry::client::DEFAULT_TIMEOUT_SECS;
use crate::resolver::ResolverConfig;
use std::path::PathBuf;

/// Repository that holds signatures instead of the image's own repository
pub const REPOSITORY_OVERRIDE_ENV: &str = "COSIGN_REPOSITORY";
pub const DEFAULT_REGISTRY_ENV: &str = "SIGREF_DEFAULT_REGISTRY";
pub const TIMEOUT_ENV: &str = "SIGREF_TIMEOUT";
pub const VERBOSE_ENV: &str = "SIGREF_VERBOSE";
pub const SKIP_TLS_ENV: &str = "SIGREF_SKIP_TLS";
/// Directory holding the Docker CLI `config.json`
pub const DOCKER_CONFIG_ENV: &str = "DOCKER_CONFIG";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub repository_override: Option<String>,
    pub default_registry: String,
    pub docker_config: Option<PathBuf>,
    pub timeout: u64,
    pub verbose: bool,
    pub quiet: bool,
    pub skip_tls: bool,
    pub insecure: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            repository_override: None,
            default_registry: DEFAULT_REGISTRY.to_string(),
            docker_config: None,
            timeout: DEFAULT_TIMEOUT_SECS,
            verbose: false,
            quiet: false,
            skip_tls: false,
            insecure: false,
        }
    }
}

impl AppConfig {
    /// Create config from the process environment and defaults
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup(REPOSITORY_OVERRIDE_ENV) {
            config.repository_override = Some(val.trim().to_string()).filter(|v| !v.is_empty());
        }
        if let Some(val) = lookup(DEFAULT_REGISTRY_ENV).filter(|v| !v.trim().is_empty()) {
            config.default_registry = val.trim().to_string();
        }
        if let Some(val) = lookup(DOCKER_CONFIG_ENV).filter(|v| !v.is_empty()) {
            config.docker_config = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup(TIMEOUT_ENV) {
            config.timeout = val.trim().parse().map_err(|_| {
                RegistryError::Config(format!("{} must be a number of seconds, got '{}'", TIMEOUT_ENV, val))
            })?;
        }
        if let Some(val) = lookup(VERBOSE_ENV) {
            config.verbose = is_truthy(&val);
        }
        if let Some(val) = lookup(SKIP_TLS_ENV) {
            config.skip_tls = is_truthy(&val);
        }

        Ok(config)
    }

    /// Apply command-line flags on top of the environment
    pub fn merge_args(mut self, cli: &Cli) -> Self {
        if cli.quiet {
            self.quiet = true;
            self.verbose = false;
        }
        if cli.verbose {
            self.verbose = true;
        }
        if cli.skip_tls {
            self.skip_tls = true;
        }
        if cli.insecure {
            self.insecure = true;
        }
        if let Some(timeout) = cli.timeout {
            self.timeout = timeout;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout == 0 {
            return Err(RegistryError::Config(
                "timeout must be greater than 0".to_string(),
            ));
        }
        ValidationUtils::validate_registry_host(&self.default_registry).map_err(|e| {
            RegistryError::Config(format!("{} is invalid: {}", DEFAULT_REGISTRY_ENV, e))
        })?;
        Ok(())
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        let config = ResolverConfig::default().with_default_registry(self.default_registry.clone());
        match &self.repository_override {
            Some(repository) => config.with_repository_override(repository.clone()),
            None => config,
        }
    }

    pub fn keychain(&self) -> DockerKeychain {
        DockerKeychain::default_location(self.docker_config.as_deref())
    }

    pub fn registry_client(&self) -> Result<RegistryClient> {
        RegistryClient::builder()
            .with_timeout(self.timeout)
            .with_skip_tls(self.skip_tls)
            .with_insecure(self.insecure)
            .build()
    }

    pub fn logger(&self) -> Logger {
        if self.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(self.verbose)
        }
    }
}

fn is_truthy(val: &str) -> bool {
    matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_env_with(env(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.resolver_config(), ResolverConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_repository_override_from_env() {
        let config = AppConfig::from_env_with(env(&[(REPOSITORY_OVERRIDE_ENV, "gcr.io/sigs")])).unwrap();
        assert_eq!(config.repository_override.as_deref(), Some("gcr.io/sigs"));
        assert_eq!(
            config.resolver_config().repository_override.as_deref(),
            Some("gcr.io/sigs")
        );

        let config = AppConfig::from_env_with(env(&[(REPOSITORY_OVERRIDE_ENV, "  ")])).unwrap();
        assert_eq!(config.repository_override, None);
    }

    #[test]
    fn test_env_values() {
        let config = AppConfig::from_env_with(env(&[
            (DEFAULT_REGISTRY_ENV, "registry.internal:5000"),
            (TIMEOUT_ENV, "15"),
            (VERBOSE_ENV, "true"),
            (SKIP_TLS_ENV, "1"),
            (DOCKER_CONFIG_ENV, "/tmp/docker"),
        ]))
        .unwrap();
        assert_eq!(config.default_registry, "registry.internal:5000");
        assert_eq!(config.timeout, 15);
        assert!(config.verbose);
        assert!(config.skip_tls);
        assert_eq!(config.docker_config, Some(PathBuf::from("/tmp/docker")));
        assert_eq!(config.resolver_config().default_registry, "registry.internal:5000");
    }

    #[test]
    fn test_invalid_env_values() {
        let err = AppConfig::from_env_with(env(&[(TIMEOUT_ENV, "soon")])).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));

        let config = AppConfig::from_env_with(env(&[(DEFAULT_REGISTRY_ENV, "bad_host")])).unwrap();
        assert!(matches!(config.validate(), Err(RegistryError::Config(_))));
    }

    #[test]
    fn test_flags_override_env() {
        let cli = Cli::try_parse_from(["sigref", "--timeout", "5", "-q", "clean", "app"]).unwrap();
        let config = AppConfig::from_env_with(env(&[(TIMEOUT_ENV, "30"), (VERBOSE_ENV, "1")]))
            .unwrap()
            .merge_args(&cli);
        assert_eq!(config.timeout, 5);
        assert!(config.quiet);
        assert!(!config.verbose);
        assert!(config.logger().quiet);

        let cli = Cli::try_parse_from(["sigref", "--timeout", "0", "clean", "app"]).unwrap();
        let config = AppConfig::default().merge_args(&cli);
        assert!(matches!(config.validate(), Err(RegistryError::Config(_))));
    }
}
