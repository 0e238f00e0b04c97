//! Registry reference parsing.
//!
//! Parses image references like `gcr.io/project/app:v1` or
//! `ghcr.io/org/app@sha256:...` into registry, repository and locator.
//! Every value in this module is validated on construction, so a
//! [`Reference`] is always syntactically valid.

use crate::common::ValidationUtils;
use crate::digest::Digest;
use crate::error::{RegistryError, Result};
use std::fmt;
use std::str::FromStr;

/// Registry used when a reference carries no host.
pub const DEFAULT_REGISTRY: &str = "index.docker.io";

/// Short name users type for Docker Hub.
const DOCKER_HUB_ALIAS: &str = "docker.io";

/// Namespace Docker Hub applies to single-segment repositories.
const OFFICIAL_NAMESPACE: &str = "library";

/// Tag used when a reference carries neither tag nor digest.
pub const DEFAULT_TAG: &str = "latest";

/// Registry host, e.g. `gcr.io` or `localhost:5000`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Registry(String);

impl Registry {
    pub fn new(host: &str) -> Result<Self> {
        ValidationUtils::validate_registry_host(host).map_err(RegistryError::InvalidReference)?;
        if host == DOCKER_HUB_ALIAS {
            return Ok(Self(DEFAULT_REGISTRY.to_string()));
        }
        Ok(Self(host.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_docker_hub(&self) -> bool {
        self.0 == DEFAULT_REGISTRY
    }

    /// Hosts that are conventionally served over plain HTTP.
    pub fn is_local(&self) -> bool {
        let host = match self.0.strip_prefix('[') {
            Some(rest) => rest.split(']').next().unwrap_or_default(),
            None => self.0.split(':').next().unwrap_or_default(),
        };
        host == "localhost" || host == "127.0.0.1" || host == "::1" || host.ends_with(".local")
    }

    /// URL scheme used to reach the registry API.
    pub fn scheme(&self, insecure: bool) -> &'static str {
        if insecure || self.is_local() { "http" } else { "https" }
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Repository inside a registry, e.g. `gcr.io` + `project/team/app`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    registry: Registry,
    path: String,
}

impl Repository {
    /// Build a repository from a registry and a `/`-separated path.
    ///
    /// On Docker Hub a single-segment path gains the implicit `library/`
    /// namespace, so `nginx` and `library/nginx` name the same repository.
    pub fn new(registry: Registry, path: &str) -> Result<Self> {
        ValidationUtils::validate_repository(path).map_err(RegistryError::InvalidReference)?;

        let path = if registry.is_docker_hub() && !path.contains('/') {
            format!("{}/{}", OFFICIAL_NAMESPACE, path)
        } else {
            path.to_string()
        };

        Ok(Self { registry, path })
    }

    /// Parse `[host/]path`, falling back to `default_registry` when no host is present.
    pub fn parse_with_default(name: &str, default_registry: &str) -> Result<Self> {
        let (registry, path) = split_registry(name, default_registry)?;
        Self::new(registry, path)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/')
    }

    pub fn tag(&self, tag: &str) -> Result<Reference> {
        ValidationUtils::validate_tag(tag).map_err(RegistryError::InvalidReference)?;
        Ok(Reference {
            repository: self.clone(),
            locator: Locator::Tag(tag.to_string()),
        })
    }

    pub fn digest(&self, digest: Digest) -> Reference {
        Reference {
            repository: self.clone(),
            locator: Locator::Digest(digest),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.path)
    }
}

/// Tag or digest part of a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Tag(String),
    Digest(Digest),
}

impl Locator {
    /// String used in registry API paths (`/v2/<name>/manifests/<identifier>`).
    pub fn identifier(&self) -> String {
        match self {
            Locator::Tag(tag) => tag.clone(),
            Locator::Digest(digest) => digest.to_string(),
        }
    }
}

/// Fully-qualified registry reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    repository: Repository,
    locator: Locator,
}

impl Reference {
    /// Parse an image reference using [`DEFAULT_REGISTRY`] for unqualified names.
    pub fn parse(reference: &str) -> Result<Self> {
        Self::parse_with_default(reference, DEFAULT_REGISTRY)
    }

    /// Parse an image reference.
    ///
    /// Supports formats:
    /// - `nginx` → index.docker.io/library/nginx:latest
    /// - `user/app:1.0` → index.docker.io/user/app:1.0
    /// - `gcr.io/org/app` → gcr.io/org/app:latest
    /// - `localhost:5000/app@sha256:...` → digest reference
    ///
    /// When both a tag and a digest are present the digest wins.
    pub fn parse_with_default(reference: &str, default_registry: &str) -> Result<Self> {
        if reference.is_empty() {
            return Err(RegistryError::InvalidReference("empty image reference".to_string()));
        }

        let (name_tag, digest) = match reference.split_once('@') {
            Some((name_tag, digest)) => {
                let digest = digest.parse::<Digest>().map_err(|e| {
                    RegistryError::InvalidReference(format!("'{}': {}", reference, e))
                })?;
                (name_tag, Some(digest))
            }
            None => (reference, None),
        };

        // A ':' after the last '/' separates the tag; earlier ones belong to a port.
        let last_slash = name_tag.rfind('/').map_or(0, |pos| pos + 1);
        let (name, tag) = match name_tag[last_slash..].rfind(':') {
            Some(pos) => {
                let split = last_slash + pos;
                (&name_tag[..split], Some(&name_tag[split + 1..]))
            }
            None => (name_tag, None),
        };

        let repository = Repository::parse_with_default(name, default_registry).map_err(|e| {
            RegistryError::InvalidReference(format!("'{}': {}", reference, detail(&e)))
        })?;

        if let Some(tag) = tag {
            ValidationUtils::validate_tag(tag).map_err(|e| {
                RegistryError::InvalidReference(format!("'{}': {}", reference, e))
            })?;
        }

        match (digest, tag) {
            (Some(digest), _) => Ok(repository.digest(digest)),
            (None, Some(tag)) => repository.tag(tag),
            (None, None) => repository.tag(DEFAULT_TAG),
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn registry(&self) -> &Registry {
        self.repository.registry()
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.locator {
            Locator::Tag(tag) => Some(tag),
            Locator::Digest(_) => None,
        }
    }

    pub fn digest(&self) -> Option<&Digest> {
        match &self.locator {
            Locator::Tag(_) => None,
            Locator::Digest(digest) => Some(digest),
        }
    }

    pub fn identifier(&self) -> String {
        self.locator.identifier()
    }
}

impl FromStr for Reference {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.locator {
            Locator::Tag(tag) => write!(f, "{}:{}", self.repository, tag),
            Locator::Digest(digest) => write!(f, "{}@{}", self.repository, digest),
        }
    }
}

/// Split `host/path` into registry and path. The first component is a host
/// when it contains '.' or ':' or is `localhost`.
pub(crate) fn split_registry<'a>(name: &'a str, default_registry: &str) -> Result<(Registry, &'a str)> {
    if let Some((first, rest)) = name.split_once('/') {
        if first.contains('.') || first.contains(':') || first == "localhost" {
            return Ok((Registry::new(first)?, rest));
        }
    }
    Ok((Registry::new(default_registry)?, name))
}

fn detail(err: &RegistryError) -> String {
    match err {
        RegistryError::InvalidReference(msg) => msg.clone(),
        other => other.to_string(),
    }
}
