//! Signature location resolution
//!
//! Signature objects are stored as a tag next to the image they sign (or in
//! an override repository). The tag is derived from the image digest, so the
//! location is computable from the image reference and its descriptor alone.
//! Everything here is pure: no I/O, no environment access.

use crate::common::ValidationUtils;
use crate::digest::{Descriptor, Digest};
use crate::error::{RegistryError, Result};
use crate::reference::{DEFAULT_REGISTRY, Reference, Repository, split_registry};

/// Suffix that marks a tag as holding a signature object.
pub const SIGNATURE_TAG_SUFFIX: &str = ".sig";

/// Inputs that change where signatures live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Repository that holds signature objects instead of the image's own.
    pub repository_override: Option<String>,
    /// Registry assumed for an override that names no host.
    pub default_registry: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            repository_override: None,
            default_registry: DEFAULT_REGISTRY.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Set the override. Empty or blank strings mean "no override".
    pub fn with_repository_override(mut self, repository: impl Into<String>) -> Self {
        let repository: String = repository.into();
        let repository = repository.trim();
        self.repository_override = (!repository.is_empty()).then(|| repository.to_string());
        self
    }

    pub fn with_default_registry(mut self, registry: impl Into<String>) -> Self {
        self.default_registry = registry.into();
        self
    }
}

/// Encode a digest as the tag a signature object is stored under:
/// `sha256:abc` becomes `sha256-abc.sig`.
///
/// This is the only place the encoding happens, for writers and for
/// lookups/deletions alike. Digests that cannot form a valid tag are
/// rejected rather than truncated. Algorithms containing `-` are rejected so
/// the first `-` of a tag always ends the algorithm, keeping the mapping
/// one-to-one.
pub fn encode_digest_as_tag(digest: &Digest) -> Result<String> {
    if digest.algorithm().contains('-') {
        return Err(RegistryError::InvalidDigest(format!(
            "algorithm '{}' contains '-' and cannot be encoded unambiguously",
            digest.algorithm()
        )));
    }

    let tag = format!("{}-{}{}", digest.algorithm(), digest.hex(), SIGNATURE_TAG_SUFFIX);
    ValidationUtils::validate_tag(&tag).map_err(|e| {
        RegistryError::InvalidDigest(format!("digest {} does not encode to a valid tag: {}", digest, e))
    })?;
    Ok(tag)
}

/// Recover the digest a signature tag was derived from.
pub fn signature_tag_digest(tag: &str) -> Option<Digest> {
    let encoded = tag.strip_suffix(SIGNATURE_TAG_SUFFIX)?;
    let (algorithm, hex) = encoded.split_once('-')?;
    let digest = Digest::new(algorithm, hex).ok()?;
    // Only tags this module could have produced count
    (encode_digest_as_tag(&digest).ok()?.as_str() == tag).then_some(digest)
}

/// Compute where the signature for `original` (whose content is `descriptor`) lives.
///
/// Without an override the signature sits in the image's own repository.
/// With one, the override replaces the registry and the first path segment of
/// the image repository; every later segment is kept beneath it:
///
/// ```text
/// gcr.io/test/image/sub + gcr.io/new  ->  gcr.io/new/image/sub
/// test/image            + newrepo     ->  index.docker.io/newrepo/image
/// ecr.aws/repo1         + ecr.aws/r2  ->  ecr.aws/r2
/// ```
pub fn resolve_destination(
    original: &Reference,
    descriptor: &Descriptor,
    config: &ResolverConfig,
) -> Result<Reference> {
    let tag = encode_digest_as_tag(&descriptor.digest)?;
    let repository = target_repository(original.repository(), config)?;

    repository.tag(&tag).map_err(|e| match e {
        RegistryError::InvalidReference(msg) => RegistryError::InvalidDigest(msg),
        other => other,
    })
}

fn target_repository(original: &Repository, config: &ResolverConfig) -> Result<Repository> {
    let Some(wanted) = config.repository_override.as_deref() else {
        return Ok(original.clone());
    };

    let (registry, path) = split_registry(wanted, &config.default_registry)
        .map_err(|e| as_override_error(wanted, e))?;
    // Validate the override on its own so errors point at it, not the splice.
    let base = Repository::new(registry.clone(), path).map_err(|e| as_override_error(wanted, e))?;

    let kept: Vec<&str> = original.segments().skip(1).collect();
    if kept.is_empty() {
        return Ok(base);
    }

    // Splice onto the path as written: `newrepo` + `image` is `newrepo/image`,
    // never `library/newrepo/image`.
    let spliced = format!("{}/{}", path, kept.join("/"));
    Repository::new(registry, &spliced).map_err(|e| as_override_error(wanted, e))
}

fn as_override_error(wanted: &str, err: RegistryError) -> RegistryError {
    match err {
        RegistryError::InvalidReference(msg) => {
            RegistryError::InvalidOverride(format!("'{}': {}", wanted, msg))
        }
        other => other,
    }
}
