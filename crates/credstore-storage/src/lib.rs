//! Concrete implementations of the credstore ports.
//! A file-backed hierarchical field store, and an AES-GCM container cipher
//! whose master key comes from the OS keyring (or a test double).

pub mod aes_cipher;
pub mod file_backend;
pub mod key_provider;
