//! Storage port: a hierarchical, string-keyed field store addressed by
//! [`StorageLocation`].

mod backend;
mod memory;

pub use backend::{
    AccessMode, BackendError, LocationHandle, StorageBackend, StorageLocation, DEFAULT_LOCATION,
};
pub use memory::{InMemoryBackend, InMemoryHandle};
