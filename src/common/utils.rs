//! Grammar checks shared by references, digests and repository overrides
//!
//! The rules follow the OCI distribution reference grammar:
//!
//! ```text
//! host      := domain-component ('.' domain-component)* (':' port)? | '[' ipv6 ']' (':' port)?
//! path      := segment ('/' segment)*
//! segment   := [a-z0-9]+ ((\.|_|__|-+) [a-z0-9]+)*
//! tag       := [A-Za-z0-9_] [A-Za-z0-9_.-]{0,127}
//! digest    := algorithm ':' encoded
//! algorithm := [a-z0-9]+ ([+._-] [a-z0-9]+)*
//! encoded   := [A-Za-z0-9=_-]+
//! ```

/// Maximum length of a repository path, excluding the registry host
pub const MAX_REPOSITORY_LENGTH: usize = 255;

/// Maximum length of a tag
pub const MAX_TAG_LENGTH: usize = 128;

/// Validation utilities
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate a registry host, optionally carrying a port
    pub fn validate_registry_host(host: &str) -> Result<(), String> {
        if host.is_empty() {
            return Err("registry host cannot be empty".to_string());
        }

        let (name, port) = if let Some(rest) = host.strip_prefix('[') {
            let close = rest
                .find(']')
                .ok_or_else(|| format!("unterminated IPv6 literal in host '{}'", host))?;
            let literal = &rest[..close];
            if literal.is_empty() || !literal.chars().all(|c| c.is_ascii_hexdigit() || c == ':') {
                return Err(format!("invalid IPv6 literal in host '{}'", host));
            }
            match &rest[close + 1..] {
                "" => return Ok(()),
                tail => match tail.strip_prefix(':') {
                    Some(port) => (None, Some(port)),
                    None => return Err(format!("unexpected characters after IPv6 literal in '{}'", host)),
                },
            }
        } else {
            match host.rsplit_once(':') {
                Some((name, port)) => (Some(name), Some(port)),
                None => (Some(host), None),
            }
        };

        if let Some(port) = port {
            if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("invalid port in registry host '{}'", host));
            }
        }

        if let Some(name) = name {
            if name.is_empty() {
                return Err(format!("registry host '{}' has no name", host));
            }
            for component in name.split('.') {
                let valid = !component.is_empty()
                    && component.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                    && !component.starts_with('-')
                    && !component.ends_with('-');
                if !valid {
                    return Err(format!("invalid registry host '{}'", host));
                }
            }
        }

        Ok(())
    }

    /// Validate a repository path such as `project/team/image`
    pub fn validate_repository(repository: &str) -> Result<(), String> {
        if repository.is_empty() {
            return Err("repository cannot be empty".to_string());
        }

        if repository.len() > MAX_REPOSITORY_LENGTH {
            return Err(format!(
                "repository is {} characters long, the limit is {}",
                repository.len(),
                MAX_REPOSITORY_LENGTH
            ));
        }

        for segment in repository.split('/') {
            if !Self::is_valid_path_segment(segment) {
                return Err(format!(
                    "invalid path segment '{}' in repository '{}' (lowercase alphanumerics separated by '.', '_', '__' or '-')",
                    segment, repository
                ));
            }
        }

        Ok(())
    }

    /// Check one `/`-separated repository component
    pub fn is_valid_path_segment(segment: &str) -> bool {
        let bytes = segment.as_bytes();
        let is_alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();

        if bytes.is_empty() || !is_alnum(bytes[0]) || !is_alnum(bytes[bytes.len() - 1]) {
            return false;
        }

        let mut i = 0;
        while i < bytes.len() {
            if is_alnum(bytes[i]) {
                i += 1;
                continue;
            }
            let start = i;
            while i < bytes.len() && !is_alnum(bytes[i]) {
                i += 1;
            }
            let run = &segment[start..i];
            let valid_separator = run == "."
                || run == "_"
                || run == "__"
                || run.bytes().all(|b| b == b'-');
            if !valid_separator {
                return false;
            }
        }

        true
    }

    /// Validate a tag
    pub fn validate_tag(tag: &str) -> Result<(), String> {
        if tag.is_empty() {
            return Err("tag cannot be empty".to_string());
        }

        if tag.len() > MAX_TAG_LENGTH {
            return Err(format!(
                "tag is {} characters long, the limit is {}",
                tag.len(),
                MAX_TAG_LENGTH
            ));
        }

        let mut chars = tag.chars();
        let first_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
        if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')) {
            return Err(format!(
                "invalid tag '{}' (alphanumerics, '_', '.' and '-', not starting with '.' or '-')",
                tag
            ));
        }

        Ok(())
    }

    /// Validate a digest algorithm identifier such as `sha256`
    pub fn validate_algorithm(algorithm: &str) -> Result<(), String> {
        let valid = !algorithm.is_empty()
            && algorithm
                .split(['+', '.', '_', '-'])
                .all(|part| {
                    !part.is_empty()
                        && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                });
        if valid {
            Ok(())
        } else {
            Err(format!("invalid digest algorithm '{}'", algorithm))
        }
    }

    /// Validate the encoded (hex) portion of a digest
    pub fn validate_encoded(encoded: &str) -> Result<(), String> {
        let valid = !encoded.is_empty()
            && encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '=' | '_' | '-'));
        if valid {
            Ok(())
        } else {
            Err(format!("invalid digest value '{}'", encoded))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_registry_host() {
        assert!(ValidationUtils::validate_registry_host("gcr.io").is_ok());
        assert!(ValidationUtils::validate_registry_host("localhost:5000").is_ok());
        assert!(ValidationUtils::validate_registry_host("us-central1-docker.pkg.dev").is_ok());
        assert!(ValidationUtils::validate_registry_host("[::1]:5000").is_ok());
        assert!(ValidationUtils::validate_registry_host("[::1]").is_ok());
        assert!(ValidationUtils::validate_registry_host("").is_err());
        assert!(ValidationUtils::validate_registry_host("gcr..io").is_err());
        assert!(ValidationUtils::validate_registry_host("gcr.io:").is_err());
        assert!(ValidationUtils::validate_registry_host("gcr.io:abc").is_err());
        assert!(ValidationUtils::validate_registry_host("bad_host.io").is_err());
    }

    #[test]
    fn test_validate_repository() {
        assert!(ValidationUtils::validate_repository("valid/repo").is_ok());
        assert!(ValidationUtils::validate_repository("a/b/c/d").is_ok());
        assert!(ValidationUtils::validate_repository("my__repo/x.y/z--w").is_ok());
        assert!(ValidationUtils::validate_repository("").is_err());
        assert!(ValidationUtils::validate_repository("//invalid").is_err());
        assert!(ValidationUtils::validate_repository("/invalid").is_err());
        assert!(ValidationUtils::validate_repository("invalid/").is_err());
        assert!(ValidationUtils::validate_repository("Upper/case").is_err());
        assert!(ValidationUtils::validate_repository("a___b").is_err());
        assert!(ValidationUtils::validate_repository("a._b").is_err());
        assert!(ValidationUtils::validate_repository(&"a".repeat(256)).is_err());
    }

    #[test]
    fn test_validate_tag() {
        assert!(ValidationUtils::validate_tag("latest").is_ok());
        assert!(ValidationUtils::validate_tag("sha256-abc.sig").is_ok());
        assert!(ValidationUtils::validate_tag("_private").is_ok());
        assert!(ValidationUtils::validate_tag(&"a".repeat(128)).is_ok());
        assert!(ValidationUtils::validate_tag(&"a".repeat(129)).is_err());
        assert!(ValidationUtils::validate_tag(".hidden").is_err());
        assert!(ValidationUtils::validate_tag("-dash").is_err());
        assert!(ValidationUtils::validate_tag("a+b").is_err());
        assert!(ValidationUtils::validate_tag("").is_err());
    }

    #[test]
    fn test_validate_digest_parts() {
        assert!(ValidationUtils::validate_algorithm("sha256").is_ok());
        assert!(ValidationUtils::validate_algorithm("multihash+base58").is_ok());
        assert!(ValidationUtils::validate_algorithm("SHA256").is_err());
        assert!(ValidationUtils::validate_algorithm("sha256+").is_err());
        assert!(ValidationUtils::validate_encoded("digest").is_ok());
        assert!(ValidationUtils::validate_encoded("abc=").is_ok());
        assert!(ValidationUtils::validate_encoded("").is_err());
        assert!(ValidationUtils::validate_encoded("ab:c").is_err());
    }
}
