//! Credential handle resolution.

use thiserror::Error;

/// Errors resolving a credential handle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("credential is empty")]
    Empty,
}

/// Turns an opaque credential handle into a usable secret.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, handle: &str) -> Result<String, CredentialError>;
}

/// Resolves `env:NAME` handles from the process environment; any other
/// handle is the secret itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigCredentialResolver;

impl CredentialResolver for ConfigCredentialResolver {
    fn resolve(&self, handle: &str) -> Result<String, CredentialError> {
        let secret = match handle.strip_prefix("env:") {
            Some(var) => {
                let var = var.trim();
                std::env::var(var).map_err(|_| CredentialError::MissingEnv(var.to_string()))?
            }
            None => handle.to_string(),
        };

        if secret.is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(secret)
    }
}

/// Mask a secret for display: short secrets are fully starred, longer ones
/// keep their first and last four characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_handle() {
        let resolver = ConfigCredentialResolver;
        assert_eq!(resolver.resolve("abc123").unwrap(), "abc123");
    }

    #[test]
    fn test_env_handle() {
        std::env::set_var("SEARCHARR_TEST_CRED_PRESENT", "from-env");
        let resolver = ConfigCredentialResolver;
        assert_eq!(
            resolver.resolve("env:SEARCHARR_TEST_CRED_PRESENT").unwrap(),
            "from-env"
        );
    }

    #[test]
    fn test_missing_env_handle() {
        let resolver = ConfigCredentialResolver;
        let err = resolver
            .resolve("env:SEARCHARR_TEST_CRED_DEFINITELY_MISSING")
            .unwrap_err();
        assert_eq!(
            err,
            CredentialError::MissingEnv("SEARCHARR_TEST_CRED_DEFINITELY_MISSING".to_string())
        );
    }

    #[test]
    fn test_empty_handle() {
        let resolver = ConfigCredentialResolver;
        assert_eq!(resolver.resolve(""), Err(CredentialError::Empty));
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("short"), "*****");
        assert_eq!(mask_secret("12345678"), "********");
        assert_eq!(mask_secret("abcdefghijkl"), "abcd...ijkl");
        assert_eq!(mask_secret(""), "");
    }
}
