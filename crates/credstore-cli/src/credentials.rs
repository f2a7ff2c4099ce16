use std::io::BufRead;

use color_eyre::{eyre::eyre, Result};
use credstore_core::{
    CipherError, ContainerCipher, CredentialRecord, CredentialStore, CredentialStoreError,
    StorageBackend, StorageLocation,
};
use credstore_storage::file_backend::FileBackend;

use crate::config::Config;

pub const SECRET_ENV: &str = "CREDSTORE_SECRET_KEY";
const HEALTH_LOCATION: &str = "credstore-health";
const HEALTH_CONTAINER: &str = "credstore.health";
const REDACTED: &str = "********";

/// Container from the flag, falling back to the config.
pub fn resolve_container(config: &Config, flag: Option<String>) -> Result<String> {
    flag.or_else(|| config.container.clone())
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| eyre!("no container given; pass --container or set `container` in config"))
}

/// Secret from the environment if set, otherwise the first line of `input`.
pub fn read_secret(env_value: Option<String>, mut input: impl BufRead) -> Result<String> {
    let secret = match env_value {
        Some(value) => value,
        None => {
            let mut line = String::new();
            input.read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if secret.trim().is_empty() {
        color_eyre::eyre::bail!("secret key must not be empty");
    }
    Ok(secret)
}

pub fn save<B: StorageBackend, C: ContainerCipher>(
    store: &CredentialStore<B, C>,
    container: &str,
    record: &CredentialRecord,
) -> Result<()> {
    store.save(container, record)?;
    println!(
        "Saved credentials for {} at {}",
        record.access_key_id,
        store.location()
    );
    Ok(())
}

pub fn load<B: StorageBackend, C: ContainerCipher>(
    store: &CredentialStore<B, C>,
    container: &str,
    reveal: bool,
) -> Result<()> {
    let record = store.load(container).map_err(explain)?;
    println!("{}", render(&record, reveal));
    Ok(())
}

/// Text printed by `load`; the secret stays hidden unless `reveal` is set.
pub fn render(record: &CredentialRecord, reveal: bool) -> String {
    let secret = if reveal {
        record.secret_key.as_str()
    } else {
        REDACTED
    };
    format!(
        "access_key_id: {}\nsecret_key: {secret}",
        record.access_key_id
    )
}

/// Save and load a probe record under `backend`, then remove the probe.
pub fn run_store_health<C: ContainerCipher>(backend: &FileBackend, cipher: C) -> Result<()> {
    let location = StorageLocation::new(HEALTH_LOCATION);
    let store = CredentialStore::new(backend.clone(), cipher, location.clone());
    let probe = CredentialRecord::new("health-probe", "ok");

    let outcome = store
        .save(HEALTH_CONTAINER, &probe)
        .and_then(|_| store.load(HEALTH_CONTAINER));
    backend
        .remove(&location)
        .map_err(|e| eyre!(e.to_string()))?;

    if outcome? != probe {
        color_eyre::eyre::bail!("storage round-trip failed");
    }
    Ok(())
}

fn explain(err: CredentialStoreError) -> color_eyre::Report {
    match err {
        CredentialStoreError::NotFound { location } => {
            eyre!("no credentials saved at {location}; run `credstore save` first")
        }
        CredentialStoreError::MissingSecret { location } => {
            eyre!("credentials at {location} have no secret; save them again")
        }
        CredentialStoreError::DecryptionFailed(CipherError::DecryptionFailed) => {
            eyre!("could not decrypt the stored secret; check the container name")
        }
        other => other.into(),
    }
}
