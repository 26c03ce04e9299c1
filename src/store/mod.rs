pub mod file;
pub mod memory;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::store::file::FileStore;
use crate::store::memory::MemoryStore;

const AVAILABILITY_KEY_PREFIX: &str = "availability-";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to access store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in store file {path} at line {line}, column {column}")]
    Json {
        path: PathBuf,
        line: usize,
        column: usize,
    },
    #[error("unsupported store file version {found}; expected version {expected}")]
    Version { found: u32, expected: u32 },
    #[error("value for key '{0}' is not valid UTF-8")]
    NotUtf8(String),
}

/// Process-wide keyed persistence, the equivalent of a browser's local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct UserId(String);

impl UserId {
    /// A missing or blank identifier counts as absent.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let trimmed = raw?.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owns the key namespace so callers never build storage keys themselves.
pub struct AvailabilityStore {
    backend: Box<dyn KeyValueStore>,
}

impl AvailabilityStore {
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::default()))
    }

    pub fn key_for(user: &UserId) -> String {
        format!("{AVAILABILITY_KEY_PREFIX}{user}")
    }

    pub fn read(&self, user: &UserId) -> Result<Option<Vec<u8>>, StoreError> {
        self.backend.get(&Self::key_for(user))
    }

    pub fn write(&mut self, user: &UserId, payload: &[u8]) -> Result<(), StoreError> {
        self.backend.set(&Self::key_for(user), payload)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StoreKind {
    Auto,
    Memory,
    File,
}

pub struct SelectedStore {
    pub store: AvailabilityStore,
    pub label: &'static str,
    pub fallback_reason: Option<String>,
}

pub fn select_store(kind: StoreKind, path: PathBuf) -> anyhow::Result<SelectedStore> {
    match kind {
        StoreKind::Memory => Ok(SelectedStore {
            store: AvailabilityStore::in_memory(),
            label: "MEMORY",
            fallback_reason: None,
        }),
        StoreKind::File => {
            let file = open_file_store(path)
                .map_err(|err| anyhow::anyhow!("file store unavailable: {err}"))?;
            Ok(SelectedStore {
                store: AvailabilityStore::new(Box::new(file)),
                label: "FILE",
                fallback_reason: None,
            })
        }
        StoreKind::Auto => match open_file_store(path) {
            Ok(file) => Ok(SelectedStore {
                store: AvailabilityStore::new(Box::new(file)),
                label: "FILE",
                fallback_reason: None,
            }),
            Err(err) => {
                tracing::warn!(error = %err, "file store unavailable, falling back to memory");
                Ok(SelectedStore {
                    store: AvailabilityStore::in_memory(),
                    label: "MEMORY",
                    fallback_reason: Some(format!(
                        "File store not usable, changes will not outlive this session: {err}"
                    )),
                })
            }
        },
    }
}

fn open_file_store(path: PathBuf) -> Result<FileStore, StoreError> {
    let file = FileStore::open(path)?;
    tracing::debug!(path = %file.path().display(), "file store opened");
    Ok(file)
}
