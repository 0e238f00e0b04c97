//! Registry module for Docker registry interactions
//!
//! This module provides the concrete collaborators of the clean workflow: an
//! HTTP client for Docker Registry HTTP API v2 (manifest lookup and deletion,
//! with bearer-token challenge handling) and a read-only Docker keychain.

pub mod auth;
pub mod client;
pub mod credentials;

pub use auth::{Auth, AuthChallenge};
pub use client::{RegistryClient, RegistryClientBuilder};
pub use credentials::DockerKeychain;
