//! Signature cleanup workflow
//!
//! Given an image identifier, locate the signature object stored for it and
//! delete that object:
//!
//! ```text
//! Parsed -> DescriptorFetched -> DestinationResolved -> Announced -> Deleted
//! ```
//!
//! The first failing step ends the run with its error. Nothing is retried.

use crate::common::{CredentialProvider, Credentials, DescriptorFetcher, ObjectDeleter};
use crate::digest::Digest;
use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::reference::{Reference, Registry};
use crate::resolver::{ResolverConfig, resolve_destination, signature_tag_digest};
use tracing::debug;

/// Message printed while the signature object is being removed
pub const DELETING_MESSAGE: &str = "Deleting signature metadata";

/// Last step a clean run reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CleanState {
    Parsed,
    DescriptorFetched,
    DestinationResolved,
    /// Destination reported; a dry run stops here
    Announced,
    Deleted,
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanOutcome {
    /// Where the signature object lives (or lived)
    pub signature: Reference,
    pub state: CleanState,
}

impl CleanOutcome {
    pub fn deleted(&self) -> bool {
        self.state == CleanState::Deleted
    }
}

/// Drives one clean run against the given collaborators
pub struct Cleaner<F, D, C> {
    fetcher: F,
    deleter: D,
    credentials: C,
    config: ResolverConfig,
    logger: Logger,
    dry_run: bool,
}

impl<F, D, C> Cleaner<F, D, C>
where
    F: DescriptorFetcher,
    D: ObjectDeleter,
    C: CredentialProvider,
{
    pub fn new(fetcher: F, deleter: D, credentials: C, config: ResolverConfig, logger: Logger) -> Self {
        Self {
            fetcher,
            deleter,
            credentials,
            config,
            logger,
            dry_run: false,
        }
    }

    /// Resolve and report the signature location without deleting it
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn clean(&self, image: &str) -> Result<CleanOutcome> {
        let reference = Reference::parse_with_default(image, &self.config.default_registry)?;
        debug!("{:?}: {}", CleanState::Parsed, reference);

        let source_credentials = self.credentials_for(reference.registry()).await?;
        let descriptor = self
            .fetcher
            .fetch_descriptor(&reference, &source_credentials)
            .await?;
        debug!("{:?}: {} is {}", CleanState::DescriptorFetched, reference, descriptor.digest);
        self.logger.detail(&format!("Image digest: {}", descriptor.digest));

        let signature = resolve_destination(&reference, &descriptor, &self.config)?;
        ensure_signature_tag(&signature, &descriptor.digest)?;
        debug!("{:?}: {}", CleanState::DestinationResolved, signature);

        self.logger.output(&signature.to_string());

        if self.dry_run {
            debug!("{:?}: dry run, leaving {} in place", CleanState::Announced, signature);
            self.logger.info("Dry run mode - signature metadata not deleted");
            return Ok(CleanOutcome {
                signature,
                state: CleanState::Announced,
            });
        }

        self.logger.progress(DELETING_MESSAGE);
        debug!("{:?}: {}", CleanState::Announced, signature);

        let deleted = match self.credentials_for(signature.registry()).await {
            Ok(credentials) => self.deleter.delete_object(&signature, &credentials).await,
            Err(e) => Err(e),
        };
        if let Err(e) = deleted {
            self.logger.progress_failed();
            return Err(e);
        }
        self.logger.progress_done();
        debug!("{:?}: {}", CleanState::Deleted, signature);

        Ok(CleanOutcome {
            signature,
            state: CleanState::Deleted,
        })
    }
}

impl<F, D, C> Cleaner<F, D, C>
where
    C: CredentialProvider,
{
    async fn credentials_for(&self, registry: &Registry) -> Result<Credentials> {
        let credentials = self.credentials.credentials_for(registry).await?;
        if credentials.is_anonymous() {
            debug!("Accessing {} anonymously", registry);
        }
        Ok(credentials)
    }
}

/// Only tags that decode back to the image digest are ever deleted.
fn ensure_signature_tag(signature: &Reference, digest: &Digest) -> Result<()> {
    match signature.tag().and_then(signature_tag_digest) {
        Some(decoded) if &decoded == digest => Ok(()),
        _ => Err(RegistryError::InvalidDigest(format!(
            "{} is not the signature tag for {}",
            signature, digest
        ))),
    }
}

/// Process exit code for a finished run
pub fn exit_code(result: &Result<CleanOutcome>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
