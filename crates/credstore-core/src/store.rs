use thiserror::Error;

use crate::{
    cipher::{CipherError, ContainerCipher},
    record::CredentialRecord,
    storage::{AccessMode, BackendError, LocationHandle, StorageBackend, StorageLocation},
};

/// Field holding the access-key identifier, stored verbatim.
pub const ACCESS_KEY_ID_FIELD: &str = "AwsAccessKeyId";
/// Field holding the encrypted secret.
pub const SECRET_KEY_FIELD: &str = "AwsSecretAccessKey";

/// Failures surfaced by [`CredentialStore`].
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    /// The location could not be created or opened, or a field read/write failed.
    #[error("storage unavailable at {location}: {reason}")]
    StorageUnavailable { location: String, reason: String },
    /// Nothing has been saved at the location.
    #[error("no credentials stored at {location}")]
    NotFound { location: String },
    /// The record exists but its secret field is absent or blank.
    #[error("stored credentials at {location} have no secret")]
    MissingSecret { location: String },
    /// Propagated from the cipher: wrong container or altered ciphertext.
    #[error(transparent)]
    DecryptionFailed(CipherError),
    /// The cipher refused to encrypt the secret.
    #[error("failed to encrypt secret: {0}")]
    Encryption(CipherError),
}

/// Saves and loads a [`CredentialRecord`] at one storage location, keeping
/// the secret encrypted under a caller-named container.
///
/// The store holds no state between calls. Each `save`/`load` opens a
/// single handle on the location and drops it before returning. Two
/// fields are written per `save`, with no atomicity across them.
pub struct CredentialStore<B, C> {
    backend: B,
    cipher: C,
    location: StorageLocation,
}

impl<B: StorageBackend, C: ContainerCipher> CredentialStore<B, C> {
    /// Bind a store to `location`. Touches neither backend nor cipher.
    pub fn new(backend: B, cipher: C, location: StorageLocation) -> Self {
        Self {
            backend,
            cipher,
            location,
        }
    }

    /// Bind a store to [`crate::storage::DEFAULT_LOCATION`].
    pub fn with_default_location(backend: B, cipher: C) -> Self {
        Self::new(backend, cipher, StorageLocation::default())
    }

    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Encrypt the secret under `container` and write both fields,
    /// creating the location on first use. Last write wins.
    pub fn save(
        &self,
        container: &str,
        record: &CredentialRecord,
    ) -> Result<(), CredentialStoreError> {
        let ciphertext = self
            .cipher
            .encrypt(container, &record.secret_key)
            .map_err(CredentialStoreError::Encryption)?;

        self.create_if_missing()?;

        let mut handle = self
            .backend
            .open(&self.location, AccessMode::Write)
            .map_err(|err| self.unavailable(err))?
            .ok_or_else(|| CredentialStoreError::StorageUnavailable {
                location: self.location.to_string(),
                reason: "location missing after create".to_string(),
            })?;

        handle
            .set_field(ACCESS_KEY_ID_FIELD, &record.access_key_id)
            .map_err(|err| self.unavailable(err))?;
        handle
            .set_field(SECRET_KEY_FIELD, &ciphertext)
            .map_err(|err| self.unavailable(err))?;
        Ok(())
    }

    /// Read both fields and decrypt the secret under `container`.
    ///
    /// A blank or absent secret fails with `MissingSecret` before the
    /// cipher is consulted. An absent identifier reads as an empty string.
    pub fn load(&self, container: &str) -> Result<CredentialRecord, CredentialStoreError> {
        let handle = self
            .backend
            .open(&self.location, AccessMode::Read)
            .map_err(|err| self.unavailable(err))?
            .ok_or_else(|| CredentialStoreError::NotFound {
                location: self.location.to_string(),
            })?;

        let access_key_id = handle
            .get_field(ACCESS_KEY_ID_FIELD)
            .map_err(|err| self.unavailable(err))?
            .unwrap_or_default();

        let ciphertext = match handle
            .get_field(SECRET_KEY_FIELD)
            .map_err(|err| self.unavailable(err))?
        {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                return Err(CredentialStoreError::MissingSecret {
                    location: self.location.to_string(),
                })
            }
        };
        drop(handle);

        let secret_key = self
            .cipher
            .decrypt(container, &ciphertext)
            .map_err(CredentialStoreError::DecryptionFailed)?;

        Ok(CredentialRecord {
            access_key_id,
            secret_key,
        })
    }

    fn create_if_missing(&self) -> Result<(), CredentialStoreError> {
        let exists = self
            .backend
            .exists(&self.location)
            .map_err(|err| self.unavailable(err))?;
        if !exists {
            self.backend
                .create(&self.location)
                .map_err(|err| self.unavailable(err))?;
        }
        Ok(())
    }

    fn unavailable(&self, err: BackendError) -> CredentialStoreError {
        CredentialStoreError::StorageUnavailable {
            location: self.location.to_string(),
            reason: err.to_string(),
        }
    }
}
