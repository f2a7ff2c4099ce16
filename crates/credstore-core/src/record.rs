use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// An access-key identifier and its secret. Both fields are wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CredentialRecord {
    /// Opaque identifier, stored verbatim.
    pub access_key_id: String,
    /// Confidential component; only ever persisted encrypted.
    pub secret_key: String,
}

impl CredentialRecord {
    pub fn new(access_key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}
