//! Content digests and descriptors
//!
//! A [`Digest`] is an `(algorithm, encoded)` pair as it appears in registry
//! responses and image references (`sha256:e3b0...`). A [`Descriptor`] is the
//! metadata a registry returns for a manifest lookup.

use crate::common::ValidationUtils;
use crate::error::{RegistryError, Result};
use sha2::Digest as _;
use std::fmt;
use std::str::FromStr;

/// Algorithm used when a digest has to be computed locally
pub const SHA256: &str = "sha256";

/// Content digest: algorithm plus encoded value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: String,
    hex: String,
}

impl Digest {
    /// Build a digest from its parts, validating both against the OCI digest grammar
    pub fn new(algorithm: impl Into<String>, hex: impl Into<String>) -> Result<Self> {
        let algorithm = algorithm.into();
        let hex = hex.into();
        ValidationUtils::validate_algorithm(&algorithm).map_err(RegistryError::InvalidDigest)?;
        ValidationUtils::validate_encoded(&hex).map_err(RegistryError::InvalidDigest)?;
        Ok(Self { algorithm, hex })
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Compute the sha256 digest of raw content
    pub fn sha256_of(data: &[u8]) -> Self {
        let mut hasher = sha2::Sha256::new();
        hasher.update(data);
        Self {
            algorithm: SHA256.to_string(),
            hex: hex::encode(hasher.finalize()),
        }
    }

    /// Check that `data` hashes to this digest. Only sha256 can be verified locally.
    pub fn matches(&self, data: &[u8]) -> Option<bool> {
        (self.algorithm == SHA256).then(|| Self::sha256_of(data).hex == self.hex)
    }
}

impl FromStr for Digest {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        let (algorithm, hex) = s.split_once(':').ok_or_else(|| {
            RegistryError::InvalidDigest(format!("'{}' is not of the form algorithm:hex", s))
        })?;
        Self::new(algorithm, hex)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

/// Metadata identifying a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub digest: Digest,
    pub size: u64,
    pub media_type: Option<String>,
}

impl Descriptor {
    pub fn new(digest: Digest) -> Self {
        Self {
            digest,
            size: 0,
            media_type: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_parse_digest() {
        let digest: Digest = format!("sha256:{}", EMPTY_SHA256).parse().unwrap();
        assert_eq!(digest.algorithm(), "sha256");
        assert_eq!(digest.hex(), EMPTY_SHA256);
        assert_eq!(digest.to_string(), format!("sha256:{}", EMPTY_SHA256));
    }

    #[test]
    fn test_parse_invalid_digest() {
        assert!(matches!("sha256".parse::<Digest>(), Err(RegistryError::InvalidDigest(_))));
        assert!(matches!("sha256:".parse::<Digest>(), Err(RegistryError::InvalidDigest(_))));
        assert!(matches!(":abc".parse::<Digest>(), Err(RegistryError::InvalidDigest(_))));
        assert!(matches!("SHA256:abc".parse::<Digest>(), Err(RegistryError::InvalidDigest(_))));
        assert!(matches!("sha256:ab/c".parse::<Digest>(), Err(RegistryError::InvalidDigest(_))));
    }

    #[test]
    fn test_sha256_of_empty() {
        let digest = Digest::sha256_of(b"");
        assert_eq!(digest.hex(), EMPTY_SHA256);
        assert_eq!(digest.matches(b""), Some(true));
        assert_eq!(digest.matches(b"x"), Some(false));
    }

    #[test]
    fn test_matches_unknown_algorithm() {
        let digest = Digest::new("sha512", "abc").unwrap();
        assert_eq!(digest.matches(b"abc"), None);
    }

    #[test]
    fn test_descriptor_builder() {
        let descriptor = Descriptor::new(Digest::sha256_of(b"{}"))
            .with_size(2)
            .with_media_type("application/vnd.oci.image.manifest.v1+json");
        assert_eq!(descriptor.size, 2);
        assert_eq!(
            descriptor.media_type.as_deref(),
            Some("application/vnd.oci.image.manifest.v1+json")
        );
    }
}
