//! Credential lookup.
//!
//! A [`CredentialProvider`] resolves an access key ID to the full
//! [`Credential`], including the owner label that ends up in
//! `LastModifiedUser`.

use std::collections::HashMap;
use std::fmt;

use crate::error::AuthError;

/// A configured access key with its secret and owner label.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_key: String,
    /// Human-readable owner of the key.
    pub owner: String,
}

impl Credential {
    /// Create a credential.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_key: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_key: secret_key.into(),
            owner: owner.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"[REDACTED]")
            .field("owner", &self.owner)
            .finish()
    }
}

/// Trait for looking up credentials by access key ID.
pub trait CredentialProvider: Send + Sync {
    /// Retrieve the credential for the given access key ID.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidAccessKeyId`] if the key is not recognized.
    fn lookup(&self, access_key_id: &str) -> Result<Credential, AuthError>;
}

/// In-memory credential provider built from the configuration file.
///
/// # Examples
///
/// ```
/// use homessm_auth::credentials::{Credential, CredentialProvider, StaticCredentialProvider};
///
/// let provider = StaticCredentialProvider::new(vec![Credential::new("AKIDHOME", "secret", "bob")]);
/// let cred = provider.lookup("AKIDHOME").unwrap();
/// assert_eq!(cred.owner, "bob");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    credentials: HashMap<String, Credential>,
}

impl StaticCredentialProvider {
    /// Build a provider from a list of credentials. Later duplicates win.
    pub fn new(credentials: impl IntoIterator<Item = Credential>) -> Self {
        Self {
            credentials: credentials
                .into_iter()
                .map(|c| (c.access_key_id.clone(), c))
                .collect(),
        }
    }

    /// Number of configured credentials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Whether no credentials are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn lookup(&self, access_key_id: &str) -> Result<Credential, AuthError> {
        self.credentials
            .get(access_key_id)
            .cloned()
            .ok_or_else(|| AuthError::InvalidAccessKeyId(access_key_id.to_owned()))
    }
}
