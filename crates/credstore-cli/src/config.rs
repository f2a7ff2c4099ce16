use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use credstore_core::storage::DEFAULT_LOCATION;
use credstore_storage::key_provider::{DEFAULT_KEYRING_ACCOUNT, DEFAULT_KEYRING_SERVICE};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

/// User-level configuration loaded from `~/.config/credstore/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Override for the data directory backing the file store.
    pub data_dir: Option<PathBuf>,
    /// Storage location used when `--location` is not given.
    pub location: Option<String>,
    /// Container used when `--container` is not given.
    pub container: Option<String>,
    /// Where the master key lives in the OS keyring.
    pub keyring: Option<KeyringConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct KeyringConfig {
    pub service: Option<String>,
    pub account: Option<String>,
}

impl Config {
    /// Fill unset location and keyring entries with the built-in defaults.
    pub fn with_defaults(mut self) -> Self {
        self.location
            .get_or_insert_with(|| DEFAULT_LOCATION.to_string());
        let keyring = self.keyring.get_or_insert_with(KeyringConfig::default);
        keyring
            .service
            .get_or_insert_with(|| DEFAULT_KEYRING_SERVICE.to_string());
        keyring
            .account
            .get_or_insert_with(|| DEFAULT_KEYRING_ACCOUNT.to_string());
        self
    }
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("credstore").join("config.toml"))
}

/// Write the config, with defaults filled in, to the default path unless a
/// file is already there.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    write_if_missing(config, &default_path()?)
}

fn write_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(&config.clone().with_defaults())?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_default_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_from_path(dir.path().join("config.toml")).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn returns_default_when_blank() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "\n  \n").expect("write");
        assert_eq!(load_from_path(&path).expect("load"), Config::default());
    }

    #[test]
    fn parses_custom_config() {
        let contents = r#"
            data_dir = "/tmp/credstore-data"
            location = "Software/SnowCode/S3BuildPublisher"
            container = "S3BuildPublisher"
            [keyring]
            service = "credstore-ci"
            account = "master"
        "#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write temp config");

        let cfg = load_from_path(&path).expect("load");
        assert_eq!(
            cfg,
            Config {
                data_dir: Some(PathBuf::from("/tmp/credstore-data")),
                location: Some("Software/SnowCode/S3BuildPublisher".into()),
                container: Some("S3BuildPublisher".into()),
                keyring: Some(KeyringConfig {
                    service: Some("credstore-ci".into()),
                    account: Some("master".into()),
                }),
            }
        );
    }

    #[test]
    fn write_creates_file_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            container: Some("build".into()),
            ..Config::default()
        };

        write_if_missing(&cfg, &path).expect("write should succeed");
        let other = Config {
            container: Some("other".into()),
            ..Config::default()
        };
        let second = write_if_missing(&other, &path).expect("second write ok");
        assert_eq!(second, path);
        assert_eq!(load_from_path(&path).expect("load"), cfg.with_defaults());
    }

    #[test]
    fn init_writes_builtin_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        write_if_missing(&Config::default(), &path).expect("write should succeed");

        let body = fs::read_to_string(&path).expect("read");
        assert!(body.contains(DEFAULT_LOCATION));
        assert_eq!(
            load_from_path(&path).expect("load"),
            Config {
                data_dir: None,
                location: Some(DEFAULT_LOCATION.into()),
                container: None,
                keyring: Some(KeyringConfig {
                    service: Some(DEFAULT_KEYRING_SERVICE.into()),
                    account: Some(DEFAULT_KEYRING_ACCOUNT.into()),
                }),
            }
        );
    }

    #[test]
    fn defaults_do_not_override_user_values() {
        let cfg = Config {
            location: Some("Software/Acme".into()),
            keyring: Some(KeyringConfig {
                service: Some("acme".into()),
                account: None,
            }),
            ..Config::default()
        }
        .with_defaults();

        assert_eq!(cfg.location.as_deref(), Some("Software/Acme"));
        let keyring = cfg.keyring.expect("keyring");
        assert_eq!(keyring.service.as_deref(), Some("acme"));
        assert_eq!(keyring.account.as_deref(), Some(DEFAULT_KEYRING_ACCOUNT));
    }
}
