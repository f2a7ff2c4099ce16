use thiserror::Error;

/// Errors produced by container-scoped ciphers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The container name cannot scope key material (e.g. empty).
    #[error("invalid container name: {container:?}")]
    InvalidContainer { container: String },
    /// Master key material could not be obtained.
    #[error("key material unavailable: {reason}")]
    KeyUnavailable { reason: String },
    #[error("encryption failed: {reason}")]
    Encryption { reason: String },
    /// Wrong container, altered ciphertext, or malformed input.
    #[error("decryption failed")]
    DecryptionFailed,
}

/// Encrypts secrets under a named container. Ciphertext produced for one
/// container must fail to decrypt under any other.
pub trait ContainerCipher {
    fn encrypt(&self, container: &str, plaintext: &str) -> Result<String, CipherError>;

    fn decrypt(&self, container: &str, ciphertext: &str) -> Result<String, CipherError>;
}

impl<C: ContainerCipher + ?Sized> ContainerCipher for &C {
    fn encrypt(&self, container: &str, plaintext: &str) -> Result<String, CipherError> {
        (**self).encrypt(container, plaintext)
    }

    fn decrypt(&self, container: &str, ciphertext: &str) -> Result<String, CipherError> {
        (**self).decrypt(container, ciphertext)
    }
}

/// Deterministic cipher for tests. The container name is embedded in the
/// output and checked on decrypt; the secret is XOR-masked.
/// Not cryptographically secure.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaskingCipher;

const MASK_PREFIX: &str = "masked";
const MASK_BYTE: u8 = 0xA5;

impl ContainerCipher for MaskingCipher {
    fn encrypt(&self, container: &str, plaintext: &str) -> Result<String, CipherError> {
        require_container(container)?;
        Ok(format!(
            "{MASK_PREFIX}:{}:{}",
            hex::encode(container),
            hex::encode(mask(plaintext.as_bytes()))
        ))
    }

    fn decrypt(&self, container: &str, ciphertext: &str) -> Result<String, CipherError> {
        require_container(container)?;
        let mut parts = ciphertext.splitn(3, ':');
        let (Some(MASK_PREFIX), Some(scope), Some(body)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CipherError::DecryptionFailed);
        };
        if scope != hex::encode(container) {
            return Err(CipherError::DecryptionFailed);
        }
        let masked = hex::decode(body).map_err(|_| CipherError::DecryptionFailed)?;
        String::from_utf8(mask(&masked)).map_err(|_| CipherError::DecryptionFailed)
    }
}

fn require_container(container: &str) -> Result<(), CipherError> {
    if container.trim().is_empty() {
        return Err(CipherError::InvalidContainer {
            container: container.to_string(),
        });
    }
    Ok(())
}

fn mask(input: &[u8]) -> Vec<u8> {
    input.iter().map(|b| b ^ MASK_BYTE).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_under_same_container() {
        let cipher = MaskingCipher;
        let ciphertext = cipher.encrypt("build", "s3cr3t").expect("encrypt");

        assert!(!ciphertext.contains("s3cr3t"));
        assert_eq!(cipher.decrypt("build", &ciphertext).expect("decrypt"), "s3cr3t");
    }

    #[test]
    fn rejects_foreign_container_and_tampering() {
        let cipher = MaskingCipher;
        let ciphertext = cipher.encrypt("build", "s3cr3t").expect("encrypt");

        assert_eq!(
            cipher.decrypt("deploy", &ciphertext),
            Err(CipherError::DecryptionFailed)
        );
        assert_eq!(
            cipher.decrypt("build", &format!("{ciphertext}z")),
            Err(CipherError::DecryptionFailed)
        );
        assert_eq!(
            cipher.decrypt("build", "plain-text"),
            Err(CipherError::DecryptionFailed)
        );
    }

    #[test]
    fn output_is_prefixed_hex_of_container_and_masked_secret() {
        let ciphertext = MaskingCipher.encrypt("ab", "a").expect("encrypt");
        assert_eq!(ciphertext, "masked:6162:c4");
    }

    #[test]
    fn rejects_non_hex_body() {
        for body in ["masked:6275696c64:0g", "masked:6275696c64:abc", "masked:6275696c64:é0"] {
            assert_eq!(
                MaskingCipher.decrypt("build", body),
                Err(CipherError::DecryptionFailed),
                "body {body:?}"
            );
        }
    }

    #[test]
    fn rejects_empty_container() {
        let err = MaskingCipher
            .encrypt("", "s3cr3t")
            .expect_err("empty container must be rejected");
        assert!(matches!(err, CipherError::InvalidContainer { .. }));
    }
}
