use std::path::PathBuf;

use crate::config::Config;
use color_eyre::Result;
use credstore_core::{CredentialStore, StorageLocation};
use credstore_storage::{
    aes_cipher::AesGcmContainerCipher,
    file_backend::FileBackend,
    key_provider::{KeyringProvider, DEFAULT_KEYRING_ACCOUNT, DEFAULT_KEYRING_SERVICE},
};
use dirs::data_dir;
use tracing::debug;

pub type ProductionCipher = AesGcmContainerCipher<KeyringProvider>;
pub type ProductionStore = CredentialStore<FileBackend, ProductionCipher>;

/// Resolve the default data directory for credstore.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("credstore"))
}

/// File backend rooted at the configured data dir (or the platform default).
pub fn backend_from_config(config: &Config) -> Result<FileBackend> {
    let root = match &config.data_dir {
        Some(root) => root.clone(),
        None => default_data_dir()?,
    };
    debug!(?root, "initializing file backend");
    Ok(FileBackend::new(root))
}

/// Cipher keyed from the OS keychain entry named in the config.
pub fn cipher_from_config(config: &Config) -> ProductionCipher {
    let keyring = config.keyring.clone().unwrap_or_default();
    let provider = KeyringProvider::new(
        keyring
            .service
            .unwrap_or_else(|| DEFAULT_KEYRING_SERVICE.to_string()),
        keyring
            .account
            .unwrap_or_else(|| DEFAULT_KEYRING_ACCOUNT.to_string()),
    );
    AesGcmContainerCipher::new(provider)
}

/// Location from the flag, then the config, then the built-in default.
pub fn resolve_location(config: &Config, flag: Option<&str>) -> StorageLocation {
    flag.or(config.location.as_deref())
        .map(StorageLocation::new)
        .unwrap_or_default()
}

/// Build the production store bound to the resolved location.
pub fn store_from_config(config: &Config, location: Option<&str>) -> Result<ProductionStore> {
    let location = resolve_location(config, location);
    debug!(%location, "binding credential store");
    Ok(CredentialStore::new(
        backend_from_config(config)?,
        cipher_from_config(config),
        location,
    ))
}
