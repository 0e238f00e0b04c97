//! Authentication module for Docker registry access
//!
//! Registries answer unauthenticated requests with `401` and a
//! `WWW-Authenticate` challenge. Bearer challenges are exchanged for a token
//! at the advertised realm; Basic challenges are answered directly.

use crate::common::Credentials;
use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler};
use crate::error::{RegistryError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Parsed `WWW-Authenticate` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChallenge {
    Bearer {
        realm: String,
        service: Option<String>,
        scope: Option<String>,
    },
    Basic,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

impl AuthChallenge {
    /// Parse a challenge header such as
    /// `Bearer realm="https://auth.example.com/token",service="registry",scope="repository:a/b:pull,push"`.
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (scheme, params) = header.split_once(' ').unwrap_or((header, ""));

        if scheme.eq_ignore_ascii_case("basic") {
            return Some(AuthChallenge::Basic);
        }
        if !scheme.eq_ignore_ascii_case("bearer") {
            debug!("Unsupported auth scheme: {}", scheme);
            return None;
        }

        let mut params = parse_params(params);
        let realm = params.remove("realm")?;
        Some(AuthChallenge::Bearer {
            realm,
            service: params.remove("service"),
            scope: params.remove("scope"),
        })
    }
}

/// Split `key="value",key2=value2` pairs; quoted values may contain commas.
fn parse_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| *c == ',' || c.is_whitespace()) {
            chars.next();
        }

        let key: String = chars.by_ref().take_while(|c| *c != '=').collect();
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            break;
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    c => value.push(c),
                }
            }
        } else {
            while let Some(c) = chars.peek() {
                if *c == ',' {
                    break;
                }
                value.push(*c);
                chars.next();
            }
            value = value.trim().to_string();
        }

        params.insert(key, value);
    }

    params
}

#[derive(Debug, Clone)]
pub struct Auth {
    client: Client,
}

impl Auth {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Exchange credentials for a bearer token scoped to `scope`.
    pub async fn request_token(
        &self,
        realm: &str,
        service: Option<&str>,
        scope: &str,
        credentials: &Credentials,
    ) -> Result<String> {
        let url = token_url(realm, service, scope)?;
        debug!("Requesting token from: {}", url);

        let mut request = self.client.get(url);
        match credentials {
            Credentials::Basic { username, password } => {
                request = request.basic_auth(username, Some(password));
            }
            Credentials::Bearer(token) => {
                request = request.bearer_auth(token);
            }
            Credentials::Anonymous => {}
        }

        let response = request
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, "token request"))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(HttpErrorHandler::handle_auth_error(status, &error_text));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Auth(format!("Failed to parse token response: {}", e)))?;

        token_response
            .token
            .or(token_response.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RegistryError::Auth("Token endpoint returned no token".to_string()))
    }
}

/// Build the token endpoint URL for a repository scope
pub fn token_url(realm: &str, service: Option<&str>, scope: &str) -> Result<url::Url> {
    let mut url = url::Url::parse(realm)
        .map_err(|e| RegistryError::Auth(format!("Invalid token realm '{}': {}", realm, e)))?;
    {
        let mut query = url.query_pairs_mut();
        if let Some(service) = service.filter(|s| !s.is_empty()) {
            query.append_pair("service", service);
        }
        query.append_pair("scope", scope);
    }
    Ok(url)
}

/// Scope string for repository operations, e.g. `repository:team/app:pull`
pub fn repository_scope(repository: &str, actions: &str) -> String {
    format!("repository:{}:{}", repository, actions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer_challenge() {
        let challenge = AuthChallenge::parse(
            r#"Bearer realm="https://auth.docker.io/token",service="registry.docker.io",scope="repository:library/nginx:pull,push""#,
        )
        .unwrap();
        assert_eq!(
            challenge,
            AuthChallenge::Bearer {
                realm: "https://auth.docker.io/token".to_string(),
                service: Some("registry.docker.io".to_string()),
                scope: Some("repository:library/nginx:pull,push".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_bearer_challenge_unquoted_and_spaced() {
        let challenge =
            AuthChallenge::parse("bearer realm=https://gcr.io/v2/token, service=gcr.io").unwrap();
        assert_eq!(
            challenge,
            AuthChallenge::Bearer {
                realm: "https://gcr.io/v2/token".to_string(),
                service: Some("gcr.io".to_string()),
                scope: None,
            }
        );
    }

    #[test]
    fn test_parse_basic_and_unknown() {
        assert_eq!(AuthChallenge::parse(r#"Basic realm="Registry""#), Some(AuthChallenge::Basic));
        assert_eq!(AuthChallenge::parse("Negotiate"), None);
        assert_eq!(AuthChallenge::parse(r#"Bearer service="x""#), None);
    }

    #[test]
    fn test_token_url() {
        let url = token_url(
            "https://auth.docker.io/token",
            Some("registry.docker.io"),
            &repository_scope("library/nginx", "*"),
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://auth.docker.io/token?service=registry.docker.io&scope=repository%3Alibrary%2Fnginx%3A*"
        );
    }

    #[test]
    fn test_token_url_rejects_bad_realm() {
        assert!(matches!(token_url("not a url", None, "x"), Err(RegistryError::Auth(_))));
    }
}
