//! Read-only Docker keychain.
//!
//! Looks credentials up in the Docker CLI configuration file,
//! `$DOCKER_CONFIG/config.json` or `~/.docker/config.json`. Credential
//! helpers (`credsStore`, `credHelpers`) are not executed; registries served
//! by a helper are accessed anonymously.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::common::{CredentialProvider, Credentials};
use crate::error::{RegistryError, Result};
use crate::reference::Registry;

/// Hostnames that all mean Docker Hub in a config file.
const DOCKER_HUB_KEYS: &[&str] = &["index.docker.io", "docker.io", "registry-1.docker.io"];

/// Single `auths` entry.
#[derive(Debug, Default, Deserialize)]
struct AuthEntry {
    #[serde(default)]
    auth: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default, rename = "registrytoken")]
    registry_token: Option<String>,
    #[serde(default, rename = "identitytoken")]
    identity_token: Option<String>,
}

/// Docker CLI config file format (only the fields we read).
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
    #[serde(default, rename = "credsStore")]
    creds_store: Option<String>,
    #[serde(default, rename = "credHelpers")]
    cred_helpers: HashMap<String, String>,
}

/// Credential lookup backed by the Docker CLI config file.
#[derive(Debug, Clone)]
pub struct DockerKeychain {
    path: Option<PathBuf>,
}

impl DockerKeychain {
    /// Keychain at the standard location. `docker_config` is the value of
    /// `DOCKER_CONFIG`, read by the caller.
    pub fn default_location(docker_config: Option<&Path>) -> Self {
        let path = match docker_config {
            Some(dir) => Some(dir.join("config.json")),
            None => dirs::home_dir().map(|home| home.join(".docker").join("config.json")),
        };
        Self { path }
    }

    /// Keychain backed by a specific config file.
    pub fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load the config file. Returns empty if not found.
    async fn load(&self) -> Result<ConfigFile> {
        let Some(path) = self.path.as_deref() else {
            return Ok(ConfigFile::default());
        };
        let data = match tokio::fs::read_to_string(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ConfigFile::default()),
            Err(e) => {
                return Err(RegistryError::Config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        if data.trim().is_empty() {
            return Ok(ConfigFile::default());
        }
        serde_json::from_str(&data).map_err(|e| {
            RegistryError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

#[async_trait]
impl CredentialProvider for DockerKeychain {
    async fn credentials_for(&self, registry: &Registry) -> Result<Credentials> {
        let file = self.load().await?;

        // Several keys can name the same registry; the best-ranked one wins,
        // ties broken by key so the choice never depends on map order.
        let Some((_, key, entry)) = file
            .auths
            .iter()
            .filter_map(|(key, entry)| key_rank(key, registry).map(|rank| (rank, key, entry)))
            .min_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)))
        else {
            if file.creds_store.is_some() || !file.cred_helpers.is_empty() {
                warn!(
                    "No stored credentials for {}; credential helpers are not supported, using anonymous access",
                    registry
                );
            }
            debug!("No credentials configured for {}", registry);
            return Ok(Credentials::Anonymous);
        };

        debug!("Using credentials from config entry '{}'", key);
        entry_credentials(key, entry)
    }
}

fn entry_credentials(key: &str, entry: &AuthEntry) -> Result<Credentials> {
    if let Some(token) = entry.registry_token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(Credentials::Bearer(token.to_string()));
    }

    if let Some(encoded) = entry.auth.as_deref().filter(|a| !a.is_empty()) {
        let decoded = STANDARD.decode(encoded.trim()).map_err(|e| {
            RegistryError::Config(format!("Invalid base64 auth for '{}': {}", key, e))
        })?;
        let decoded = String::from_utf8(decoded).map_err(|e| {
            RegistryError::Config(format!("Auth for '{}' is not UTF-8: {}", key, e))
        })?;
        let (username, password) = decoded.split_once(':').ok_or_else(|| {
            RegistryError::Config(format!("Auth for '{}' is not of the form user:password", key))
        })?;
        return Ok(Credentials::Basic {
            username: username.to_string(),
            password: password.to_string(),
        });
    }

    if let (Some(username), Some(password)) = (&entry.username, &entry.password) {
        return Ok(Credentials::Basic {
            username: username.clone(),
            password: password.clone(),
        });
    }

    if entry.identity_token.is_some() {
        warn!("Identity tokens are not supported (entry '{}'), using anonymous access", key);
    }
    Ok(Credentials::Anonymous)
}

/// Priority of a config key for `registry`, lower is better. `None` when the
/// key names another registry.
///
/// Config keys may be bare hosts or URLs (`https://index.docker.io/v1/`).
/// Docker Hub aliases rank in [`DOCKER_HUB_KEYS`] order.
fn key_rank(key: &str, registry: &Registry) -> Option<usize> {
    let host = key
        .strip_prefix("https://")
        .or_else(|| key.strip_prefix("http://"))
        .unwrap_or(key);
    let host = host.split('/').next().unwrap_or_default();

    if registry.is_docker_hub() {
        DOCKER_HUB_KEYS.iter().position(|alias| *alias == host)
    } else {
        (host == registry.as_str()).then_some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn keychain_with(contents: &str) -> (TempDir, DockerKeychain) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, DockerKeychain::new(path))
    }

    fn registry(host: &str) -> Registry {
        Registry::new(host).unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_is_anonymous() {
        let dir = TempDir::new().unwrap();
        let keychain = DockerKeychain::new(dir.path().join("missing.json"));
        assert_eq!(
            keychain.credentials_for(&registry("gcr.io")).await.unwrap(),
            Credentials::Anonymous
        );
    }

    #[tokio::test]
    async fn test_base64_auth_entry() {
        // "alice:s3cr:et"
        let (_dir, keychain) = keychain_with(r#"{"auths":{"gcr.io":{"auth":"YWxpY2U6czNjcjpldA=="}}}"#);
        assert_eq!(
            keychain.credentials_for(&registry("gcr.io")).await.unwrap(),
            Credentials::Basic {
                username: "alice".to_string(),
                password: "s3cr:et".to_string(),
            }
        );
        assert_eq!(
            keychain.credentials_for(&registry("ghcr.io")).await.unwrap(),
            Credentials::Anonymous
        );
    }

    #[tokio::test]
    async fn test_docker_hub_url_key() {
        let (_dir, keychain) = keychain_with(
            r#"{"auths":{"https://index.docker.io/v1/":{"username":"bob","password":"pw"}}}"#,
        );
        assert_eq!(
            keychain.credentials_for(&registry("docker.io")).await.unwrap(),
            Credentials::Basic {
                username: "bob".to_string(),
                password: "pw".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_registry_token_and_port() {
        let (_dir, keychain) =
            keychain_with(r#"{"auths":{"http://localhost:5000":{"registrytoken":"tok"}}}"#);
        assert_eq!(
            keychain.credentials_for(&registry("localhost:5000")).await.unwrap(),
            Credentials::Bearer("tok".to_string())
        );
    }

    #[tokio::test]
    async fn test_helper_only_config_is_anonymous() {
        let (_dir, keychain) = keychain_with(r#"{"credsStore":"desktop","auths":{}}"#);
        assert_eq!(
            keychain.credentials_for(&registry("gcr.io")).await.unwrap(),
            Credentials::Anonymous
        );
    }

    #[tokio::test]
    async fn test_malformed_config() {
        let (_dir, keychain) = keychain_with("{not json");
        assert!(matches!(
            keychain.credentials_for(&registry("gcr.io")).await,
            Err(RegistryError::Config(_))
        ));

        let (_dir, keychain) = keychain_with(r#"{"auths":{"gcr.io":{"auth":"!!!"}}}"#);
        assert!(matches!(
            keychain.credentials_for(&registry("gcr.io")).await,
            Err(RegistryError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_docker_hub_key_choice_is_stable() {
        let (_dir, keychain) = keychain_with(
            r#"{"auths":{
                "docker.io":{"username":"short","password":"a"},
                "https://index.docker.io/v1/":{"username":"canonical","password":"b"},
                "registry-1.docker.io":{"username":"mirror","password":"c"}
            }}"#,
        );
        for _ in 0..8 {
            assert_eq!(
                keychain.credentials_for(&registry("index.docker.io")).await.unwrap(),
                Credentials::Basic {
                    username: "canonical".to_string(),
                    password: "b".to_string(),
                }
            );
        }
    }

    #[tokio::test]
    async fn test_same_host_keys_break_ties_by_key() {
        let (_dir, keychain) = keychain_with(
            r#"{"auths":{
                "https://gcr.io":{"username":"url","password":"a"},
                "gcr.io":{"username":"bare","password":"b"}
            }}"#,
        );
        assert_eq!(
            keychain.credentials_for(&registry("gcr.io")).await.unwrap(),
            Credentials::Basic {
                username: "bare".to_string(),
                password: "b".to_string(),
            }
        );
    }

    #[test]
    fn test_default_location_honors_docker_config() {
        let keychain = DockerKeychain::default_location(Some(Path::new("/etc/docker-cfg")));
        assert_eq!(keychain.path(), Some(Path::new("/etc/docker-cfg/config.json")));
    }
}
