use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use credstore_core::cipher::{CipherError, ContainerCipher};
use hkdf::Hkdf;
use sha2::Sha256;
use tracing::instrument;
use zeroize::Zeroizing;

use crate::key_provider::KeyProvider;

const FORMAT_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KDF_INFO_PREFIX: &[u8] = b"credstore-container-v1/";

/// AES-256-GCM cipher whose key is derived per container.
///
/// Each container gets `HKDF-SHA256(master, info = prefix || container)`,
/// and the container name is also bound as associated data, so ciphertext
/// only opens under the container it was sealed for. Output is base64 of
/// `version || nonce || ciphertext+tag`; every call uses a fresh nonce.
pub struct AesGcmContainerCipher<P: KeyProvider> {
    key_provider: P,
}

impl<P: KeyProvider> AesGcmContainerCipher<P> {
    pub fn new(key_provider: P) -> Self {
        Self { key_provider }
    }

    fn cipher_for(&self, container: &str) -> Result<Aes256Gcm, CipherError> {
        if container.trim().is_empty() {
            return Err(CipherError::InvalidContainer {
                container: container.to_string(),
            });
        }

        let master = self
            .key_provider
            .get_or_create()
            .map_err(|e| CipherError::KeyUnavailable {
                reason: e.to_string(),
            })?;

        let mut key = Zeroizing::new([0u8; 32]);
        Hkdf::<Sha256>::new(None, &master.bytes)
            .expand_multi_info(&[KDF_INFO_PREFIX, container.as_bytes()], &mut key[..])
            .map_err(|e| CipherError::KeyUnavailable {
                reason: format!("key derivation failed: {e}"),
            })?;

        Aes256Gcm::new_from_slice(&key[..]).map_err(|e| CipherError::KeyUnavailable {
            reason: format!("cipher init failed: {e}"),
        })
    }
}

impl<P: KeyProvider> ContainerCipher for AesGcmContainerCipher<P> {
    #[instrument(skip_all)]
    fn encrypt(&self, container: &str, plaintext: &str) -> Result<String, CipherError> {
        let cipher = self.cipher_for(container)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: container.as_bytes(),
                },
            )
            .map_err(|e| CipherError::Encryption {
                reason: e.to_string(),
            })?;

        let mut blob = Vec::with_capacity(1 + NONCE_LEN + sealed.len());
        blob.push(FORMAT_VERSION);
        blob.extend_from_slice(nonce.as_slice());
        blob.extend_from_slice(&sealed);
        Ok(STANDARD.encode(blob))
    }

    #[instrument(skip_all)]
    fn decrypt(&self, container: &str, ciphertext: &str) -> Result<String, CipherError> {
        let cipher = self.cipher_for(container)?;

        let blob = STANDARD
            .decode(ciphertext)
            .map_err(|_| CipherError::DecryptionFailed)?;
        if blob.len() < 1 + NONCE_LEN + TAG_LEN || blob[0] != FORMAT_VERSION {
            return Err(CipherError::DecryptionFailed);
        }
        let (nonce, sealed) = blob[1..].split_at(NONCE_LEN);

        let plaintext = Zeroizing::new(
            cipher
                .decrypt(
                    Nonce::from_slice(nonce),
                    Payload {
                        msg: sealed,
                        aad: container.as_bytes(),
                    },
                )
                .map_err(|_| CipherError::DecryptionFailed)?,
        );

        std::str::from_utf8(&plaintext)
            .map(str::to_owned)
            .map_err(|_| CipherError::DecryptionFailed)
    }
}
