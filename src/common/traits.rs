//! Collaborator interfaces consumed by the clean workflow
//!
//! The workflow only depends on these traits. `RegistryClient` and
//! `DockerKeychain` are the production implementations; tests plug in
//! in-memory doubles.

use crate::digest::Descriptor;
use crate::error::Result;
use crate::reference::{Reference, Registry};
use async_trait::async_trait;

/// Credentials presented to a registry
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    #[default]
    Anonymous,
    Basic { username: String, password: String },
    Bearer(String),
}

impl Credentials {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Credentials::Anonymous)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Anonymous => write!(f, "Anonymous"),
            Credentials::Basic { username, .. } => {
                write!(f, "Basic {{ username: {:?}, password: <redacted> }}", username)
            }
            Credentials::Bearer(_) => write!(f, "Bearer(<redacted>)"),
        }
    }
}

/// Read-only lookup of the descriptor an image reference points at
#[async_trait]
pub trait DescriptorFetcher: Send + Sync {
    async fn fetch_descriptor(
        &self,
        reference: &Reference,
        credentials: &Credentials,
    ) -> Result<Descriptor>;
}

/// Removal of the object a reference points at
#[async_trait]
pub trait ObjectDeleter: Send + Sync {
    async fn delete_object(&self, reference: &Reference, credentials: &Credentials) -> Result<()>;
}

/// Ambient credential resolution
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credentials_for(&self, registry: &Registry) -> Result<Credentials>;
}

/// Provider that always answers anonymously
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousCredentials;

#[async_trait]
impl CredentialProvider for AnonymousCredentials {
    async fn credentials_for(&self, _registry: &Registry) -> Result<Credentials> {
        Ok(Credentials::Anonymous)
    }
}
