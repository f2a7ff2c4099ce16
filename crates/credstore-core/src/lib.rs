//! Core abstractions for credstore: the credential record, the storage and
//! cipher ports, and the store that ties them together.
//! This crate performs no I/O of its own and never logs; backends and
//! ciphers are injected by the caller.

pub mod cipher;
pub mod record;
pub mod storage;
pub mod store;

pub use cipher::{CipherError, ContainerCipher};
pub use record::CredentialRecord;
pub use storage::{AccessMode, BackendError, LocationHandle, StorageBackend, StorageLocation};
pub use store::{CredentialStore, CredentialStoreError};
