//! Credential verification backends
//!
//! Exactly one backend is chosen at startup, in priority order:
//! 1. A directly supplied secret ([`StaticSecret`])
//! 2. The account's crypt(3) hash from the passwd/shadow database ([`HashedSecret`])
//! 3. An external authentication service ([`ExternalAuthenticator`])

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::error::{LockError, Result};

/// A source of truth for whether a candidate secret is correct
pub trait CredentialBackend {
    /// Check a candidate; `Err` means the backend itself failed
    fn verify(&self, candidate: &[u8]) -> Result<bool>;

    /// Short backend name for logging
    fn name(&self) -> &'static str;
}

/// Pluggable authentication service (helper program, PAM bridge, ...)
pub trait ExternalAuthenticator {
    fn authenticate(&self, candidate: &[u8]) -> Result<bool>;
}

/// Reference secret held in memory as a SHA-256 digest
///
/// Both sides are digested before a constant-time comparison, so the time
/// taken does not depend on where or whether the lengths differ.
pub struct StaticSecret {
    digest: Zeroizing<[u8; 32]>,
}

impl StaticSecret {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            digest: Zeroizing::new(Sha256::digest(secret).into()),
        }
    }
}

impl CredentialBackend for StaticSecret {
    fn verify(&self, candidate: &[u8]) -> Result<bool> {
        let candidate: Zeroizing<[u8; 32]> = Zeroizing::new(Sha256::digest(candidate).into());
        Ok(candidate[..].ct_eq(&self.digest[..]).into())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// crypt(3) hash from the operating system's account database
pub struct HashedSecret {
    hash: Zeroizing<String>,
}

impl HashedSecret {
    /// Wrap a stored hash; locked or empty entries are rejected
    pub fn new(hash: impl Into<String>) -> Result<Self> {
        let hash = Zeroizing::new(hash.into());
        if hash.is_empty() || hash.starts_with('!') || hash.starts_with('*') {
            return Err(LockError::Credential(
                "account has no usable password hash".to_string(),
            ));
        }
        Ok(Self { hash })
    }
}

impl CredentialBackend for HashedSecret {
    fn verify(&self, candidate: &[u8]) -> Result<bool> {
        Ok(pwhash::unix::verify(candidate, self.hash.as_str()))
    }

    fn name(&self) -> &'static str {
        "account-hash"
    }
}

struct External(Box<dyn ExternalAuthenticator>);

impl CredentialBackend for External {
    fn verify(&self, candidate: &[u8]) -> Result<bool> {
        self.0.authenticate(candidate)
    }

    fn name(&self) -> &'static str {
        "external"
    }
}

/// Verifies candidate secrets against the backend resolved at startup
///
/// Verification never touches the attempt counter or the secret buffer.
pub struct CredentialVerifier {
    backend: Box<dyn CredentialBackend>,
}

impl CredentialVerifier {
    pub fn new(backend: Box<dyn CredentialBackend>) -> Self {
        Self { backend }
    }

    /// Pick the highest-priority backend that is available
    ///
    /// An empty override secret counts as absent. `account_hash` is only
    /// consulted when no override is given. A failed account lookup is fatal
    /// only when there is no external authenticator to fall back to.
    pub fn resolve<F>(
        override_secret: Option<&[u8]>,
        account_hash: F,
        external: Option<Box<dyn ExternalAuthenticator>>,
    ) -> Result<Self>
    where
        F: FnOnce() -> Result<Option<String>>,
    {
        let backend: Box<dyn CredentialBackend> = match override_secret {
            Some(secret) if !secret.is_empty() => Box::new(StaticSecret::new(secret)),
            _ => {
                let hash = match account_hash() {
                    Ok(hash) => hash,
                    Err(e) if external.is_some() => {
                        warn!("Account lookup failed, using external authenticator: {}", e);
                        None
                    }
                    Err(e) => return Err(e),
                };
                Self::from_account(hash, external)?
            }
        };

        info!("Using {} credential backend", backend.name());
        Ok(Self { backend })
    }

    fn from_account(
        hash: Option<String>,
        external: Option<Box<dyn ExternalAuthenticator>>,
    ) -> Result<Box<dyn CredentialBackend>> {
        let backend: Box<dyn CredentialBackend> = match (hash, external) {
            (Some(hash), _) => Box::new(HashedSecret::new(hash)?),
            (None, Some(external)) => Box::new(External(external)),
            (None, None) => {
                return Err(LockError::Credential(
                    "no credential source available".to_string(),
                ))
            }
        };
        Ok(backend)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Whether `candidate` matches; backend failures count as a mismatch
    pub fn verify(&self, candidate: &[u8]) -> bool {
        match self.backend.verify(candidate) {
            Ok(matched) => matched,
            Err(e) => {
                warn!("Credential backend {} failed: {}", self.backend.name(), e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(bool);

    impl ExternalAuthenticator for Fixed {
        fn authenticate(&self, _candidate: &[u8]) -> Result<bool> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl ExternalAuthenticator for Broken {
        fn authenticate(&self, _candidate: &[u8]) -> Result<bool> {
            Err(LockError::Verification("helper crashed".to_string()))
        }
    }

    #[test]
    fn test_static_secret() {
        let secret = StaticSecret::new(b"hunter2");
        assert!(secret.verify(b"hunter2").unwrap());
        assert!(!secret.verify(b"hunter3").unwrap());
        assert!(!secret.verify(b"hunter").unwrap());
        assert!(!secret.verify(b"").unwrap());
    }

    #[test]
    fn test_hashed_secret_roundtrip() {
        let hash = pwhash::sha512_crypt::hash("secret").unwrap();
        let hashed = HashedSecret::new(hash).unwrap();
        assert!(hashed.verify(b"secret").unwrap());
        assert!(!hashed.verify(b"Secret").unwrap());
    }

    #[test]
    fn test_hashed_secret_rejects_locked_accounts() {
        assert!(HashedSecret::new("!").is_err());
        assert!(HashedSecret::new("*").is_err());
        assert!(HashedSecret::new("").is_err());
    }

    #[test]
    fn test_override_takes_precedence() {
        let verifier = CredentialVerifier::resolve(
            Some(&b"override"[..]),
            || panic!("account database must not be consulted"),
            None,
        )
        .unwrap();

        assert_eq!(verifier.backend_name(), "static");
        assert!(verifier.verify(b"override"));
    }

    #[test]
    fn test_empty_override_falls_back_to_account() {
        let hash = pwhash::sha512_crypt::hash("secret").unwrap();
        let verifier = CredentialVerifier::resolve(Some(&b""[..]), || Ok(Some(hash)), None).unwrap();
        assert_eq!(verifier.backend_name(), "account-hash");
        assert!(verifier.verify(b"secret"));
    }

    #[test]
    fn test_external_used_without_account_hash() {
        let verifier = CredentialVerifier::resolve(
            None,
            || Ok(None),
            Some(Box::new(Fixed(true)) as Box<dyn ExternalAuthenticator>),
        )
        .unwrap();
        assert_eq!(verifier.backend_name(), "external");
        assert!(verifier.verify(b"anything"));
    }

    #[test]
    fn test_unreadable_account_falls_back_to_external() {
        let verifier = CredentialVerifier::resolve(
            None,
            || Err(LockError::Credential("cannot read /etc/shadow".to_string())),
            Some(Box::new(Fixed(true)) as Box<dyn ExternalAuthenticator>),
        )
        .unwrap();
        assert_eq!(verifier.backend_name(), "external");
        assert!(verifier.verify(b"anything"));
    }

    #[test]
    fn test_unreadable_account_without_external_is_fatal() {
        let result = CredentialVerifier::resolve(
            None,
            || Err(LockError::Credential("cannot read /etc/shadow".to_string())),
            None,
        );
        assert!(matches!(result, Err(LockError::Credential(_))));
    }

    #[test]
    fn test_no_source_is_an_error() {
        let result = CredentialVerifier::resolve(None, || Ok(None), None);
        assert!(matches!(result, Err(LockError::Credential(_))));
    }

    #[test]
    fn test_backend_failure_is_a_mismatch() {
        let verifier = CredentialVerifier::new(Box::new(External(Box::new(Broken))));
        assert!(!verifier.verify(b"anything"));
    }
}
