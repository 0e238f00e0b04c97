//! sigref library
//!
//! Resolves where the signature object of a container image is stored in an
//! OCI registry, and removes it. The resolver is pure; registry access goes
//! through the collaborator traits in [`common`].

pub mod clean;
pub mod cli;
pub mod common;
pub mod digest;
pub mod error;
pub mod logging;
pub mod reference;
pub mod registry;
pub mod resolver;

pub use clean::{CleanOutcome, CleanState, Cleaner};
pub use digest::{Descriptor, Digest};
pub use error::{RegistryError, Result};
pub use logging::Logger;
pub use reference::{Reference, Registry, Repository};
pub use resolver::{ResolverConfig, encode_digest_as_tag, resolve_destination};
