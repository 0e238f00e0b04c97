//! Common module - collaborator traits and shared grammar checks
//!
//! Nothing in here performs I/O. The traits describe what the clean workflow
//! needs from a registry, and the utilities hold the reference grammar used by
//! the parser and the resolver alike.

pub mod traits;
pub mod utils;

pub use traits::*;
pub use utils::*;
