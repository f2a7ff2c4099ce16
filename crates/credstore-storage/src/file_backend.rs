use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use credstore_core::storage::{
    AccessMode, BackendError, LocationHandle, StorageBackend, StorageLocation,
};
use tempfile::NamedTempFile;
use tracing::instrument;

/// Name of the per-location document holding its fields.
pub const FIELDS_FILE: &str = "fields.json";

type Fields = BTreeMap<String, String>;

/// Hierarchical field store on the local filesystem.
///
/// A location `a/b/c` is the directory `root/a/b/c`; its fields live in a
/// JSON object in `fields.json`. Each field write replaces the document
/// atomically, but the two writes of a `save` are independent.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Delete a location, its fields and any nested locations (idempotent).
    #[instrument(skip_all, fields(location = %location))]
    pub fn remove(&self, location: &StorageLocation) -> Result<(), BackendError> {
        let dir = self.dir_for(location)?;
        match fs::remove_dir_all(dir) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_err(err)),
        }
    }

    fn dir_for(&self, location: &StorageLocation) -> Result<PathBuf, BackendError> {
        let segments = location.segments();
        if segments.is_empty() || segments.iter().any(|s| !is_safe_segment(s)) {
            return Err(BackendError::InvalidLocation {
                location: location.to_string(),
            });
        }
        Ok(segments
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment)))
    }
}

impl StorageBackend for FileBackend {
    type Handle = FileHandle;

    #[instrument(skip_all, fields(location = %location))]
    fn exists(&self, location: &StorageLocation) -> Result<bool, BackendError> {
        Ok(self.dir_for(location)?.is_dir())
    }

    #[instrument(skip_all, fields(location = %location))]
    fn create(&self, location: &StorageLocation) -> Result<(), BackendError> {
        fs::create_dir_all(self.dir_for(location)?).map_err(storage_err)
    }

    #[instrument(skip_all, fields(location = %location, mode = ?mode))]
    fn open(
        &self,
        location: &StorageLocation,
        mode: AccessMode,
    ) -> Result<Option<FileHandle>, BackendError> {
        let dir = self.dir_for(location)?;
        if !dir.is_dir() {
            return Ok(None);
        }
        let path = dir.join(FIELDS_FILE);
        let fields = read_fields(&path)?;
        Ok(Some(FileHandle {
            path,
            location: location.clone(),
            mode,
            fields,
        }))
    }
}

/// Open location. Reads see the fields as of `open` plus this handle's writes.
#[derive(Debug)]
pub struct FileHandle {
    path: PathBuf,
    location: StorageLocation,
    mode: AccessMode,
    fields: Fields,
}

impl LocationHandle for FileHandle {
    fn get_field(&self, name: &str) -> Result<Option<String>, BackendError> {
        Ok(self.fields.get(name).cloned())
    }

    #[instrument(skip_all, fields(location = %self.location, name = %name))]
    fn set_field(&mut self, name: &str, value: &str) -> Result<(), BackendError> {
        if self.mode == AccessMode::Read {
            return Err(BackendError::ReadOnly {
                location: self.location.to_string(),
            });
        }
        self.fields.insert(name.to_string(), value.to_string());
        write_fields(&self.path, &self.fields)
    }
}

fn is_safe_segment(segment: &str) -> bool {
    segment != "."
        && segment != ".."
        && !segment
            .chars()
            .any(|c| c == ':' || c == '\0' || c.is_control())
}

fn write_fields(path: &Path, fields: &Fields) -> Result<(), BackendError> {
    let parent = path.parent().ok_or_else(|| BackendError::Storage {
        reason: "invalid storage path".to_string(),
    })?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(storage_err)?;
    let json = serde_json::to_vec_pretty(fields).map_err(storage_err)?;
    tmp.write_all(&json).map_err(storage_err)?;
    tmp.flush().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;
    Ok(())
}

fn read_fields(path: &Path) -> Result<Fields, BackendError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Fields::new()),
        Err(err) => return Err(storage_err(err)),
    };

    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(storage_err)?;
    if buf.iter().all(u8::is_ascii_whitespace) {
        return Ok(Fields::new());
    }
    serde_json::from_slice(&buf).map_err(storage_err)
}

fn storage_err<E: ToString>(err: E) -> BackendError {
    BackendError::Storage {
        reason: err.to_string(),
    }
}
