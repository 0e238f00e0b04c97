//! Registry HTTP API v2 client
//!
//! Implements the two registry calls the clean workflow needs:
//! - Manifest lookup (GET /v2/{name}/manifests/{reference}) producing a descriptor
//! - Manifest deletion (DELETE /v2/{name}/manifests/{reference})
//!
//! Each call is self-contained: tokens obtained for one request are not
//! reused for the next.

use crate::common::{Credentials, DescriptorFetcher, ObjectDeleter};
use crate::digest::{Descriptor, Digest};
use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler};
use crate::error::{RegistryError, Result};
use crate::reference::Reference;
use crate::registry::auth::{Auth, AuthChallenge, repository_scope};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, trace};

/// Accept all standard manifest types per OCI/Docker Registry v2 specs
pub const MANIFEST_ACCEPT: &str = "application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json, \
     application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json";

const DOCKER_CONTENT_DIGEST: &str = "Docker-Content-Digest";

/// Token actions requested for lookups
const PULL_ACTIONS: &str = "pull";

/// Token actions requested for deletion
const DELETE_ACTIONS: &str = "*";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct RegistryClientBuilder {
    timeout: Duration,
    skip_tls: bool,
    insecure: bool,
}

impl Default for RegistryClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryClientBuilder {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            skip_tls: false,
            insecure: false,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = Duration::from_secs(timeout_secs);
        self
    }

    /// Accept invalid TLS certificates
    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    /// Talk plain HTTP to every registry
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        let client = Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.skip_tls)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(RegistryClient {
            auth: Auth::new(client.clone()),
            client,
            insecure: self.insecure,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    auth: Auth,
    insecure: bool,
}

impl RegistryClient {
    pub fn builder() -> RegistryClientBuilder {
        RegistryClientBuilder::new()
    }

    /// API endpoint of the manifest a reference points at
    pub fn manifest_url(&self, reference: &Reference) -> String {
        let registry = reference.registry();
        format!(
            "{}://{}/v2/{}/manifests/{}",
            registry.scheme(self.insecure),
            registry,
            reference.repository().path(),
            reference.identifier()
        )
    }

    /// Send a request, answering one `401` challenge if the registry issues it.
    async fn send_with_auth<F>(
        &self,
        build: F,
        reference: &Reference,
        actions: &str,
        credentials: &Credentials,
        operation: &str,
    ) -> Result<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut request = build();
        if let Credentials::Bearer(token) = credentials {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, operation))?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|h| h.to_str().ok())
            .and_then(AuthChallenge::parse);
        trace!("Auth challenge for {}: {:?}", operation, challenge);

        let retry = match challenge {
            Some(AuthChallenge::Bearer { realm, service, .. }) => {
                let scope = repository_scope(reference.repository().path(), actions);
                let token = self
                    .auth
                    .request_token(&realm, service.as_deref(), &scope, credentials)
                    .await?;
                debug!("Obtained token for scope {}", scope);
                build().bearer_auth(token)
            }
            Some(AuthChallenge::Basic) => match credentials {
                Credentials::Basic { username, password } => {
                    build().basic_auth(username, Some(password))
                }
                _ => {
                    return Err(RegistryError::Auth(format!(
                        "{} requires basic credentials for {}",
                        operation,
                        reference.registry()
                    )));
                }
            },
            None => {
                return Err(RegistryError::Auth(format!(
                    "{} was rejected by {} without a supported challenge",
                    operation,
                    reference.registry()
                )));
            }
        };

        retry
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, operation))
    }
}

#[async_trait]
impl DescriptorFetcher for RegistryClient {
    async fn fetch_descriptor(
        &self,
        reference: &Reference,
        credentials: &Credentials,
    ) -> Result<Descriptor> {
        let url = self.manifest_url(reference);
        let operation = format!("manifest fetch for {}", reference);
        debug!("GET {}", url);

        let response = self
            .send_with_auth(
                || self.client.get(&url).header(ACCEPT, MANIFEST_ACCEPT),
                reference,
                PULL_ACTIONS,
                credentials,
                &operation,
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(HttpErrorHandler::handle_registry_error(status, &error_text, &operation));
        }

        let header_digest = response
            .headers()
            .get(DOCKER_CONTENT_DIGEST)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.parse::<Digest>().ok());
        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty());

        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, &operation))?;

        let digest = descriptor_digest(reference, header_digest, &body)?;
        debug!("Resolved {} to {} ({} bytes)", reference, digest, body.len());

        let mut descriptor = Descriptor::new(digest).with_size(body.len() as u64);
        if let Some(media_type) = media_type {
            descriptor = descriptor.with_media_type(media_type);
        }
        Ok(descriptor)
    }
}

#[async_trait]
impl ObjectDeleter for RegistryClient {
    async fn delete_object(&self, reference: &Reference, credentials: &Credentials) -> Result<()> {
        let url = self.manifest_url(reference);
        let operation = format!("delete of {}", reference);
        debug!("DELETE {}", url);

        let response = self
            .send_with_auth(
                || self.client.delete(&url),
                reference,
                DELETE_ACTIONS,
                credentials,
                &operation,
            )
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!("Deleted {} (status {})", reference, status);
            return Ok(());
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        Err(HttpErrorHandler::handle_registry_error(status, &error_text, &operation))
    }
}

/// Pick the digest of a fetched manifest.
///
/// A digest reference names its own digest and the body must hash to it.
/// Otherwise the registry's `Docker-Content-Digest` header is trusted, and
/// the body is hashed when the header is missing.
fn descriptor_digest(reference: &Reference, header: Option<Digest>, body: &[u8]) -> Result<Digest> {
    if let Some(expected) = reference.digest() {
        if expected.matches(body) == Some(false) {
            return Err(RegistryError::Registry(format!(
                "manifest for {} does not match its digest (got {})",
                reference,
                Digest::sha256_of(body)
            )));
        }
        return Ok(expected.clone());
    }

    Ok(header.unwrap_or_else(|| Digest::sha256_of(body)))
}
