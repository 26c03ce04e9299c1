use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::store::{KeyValueStore, StoreError};

const STORE_FILE_VERSION: u32 = 1;

/// JSON document on disk holding every key. The whole file is rewritten on each `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens `path`, treating a missing file as an empty store.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.is_dir()
        {
            return Err(StoreError::Io {
                source: io::Error::new(ErrorKind::NotFound, "parent directory does not exist"),
                path,
            });
        }

        let entries = match fs::read_to_string(&path) {
            Ok(content) => parse_store_text(&path, &content)?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "opened file store");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).map(|value| value.clone().into_bytes()))
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let text =
            String::from_utf8(value.to_vec()).map_err(|_| StoreError::NotUtf8(key.to_string()))?;
        let mut entries = self.entries.clone();
        entries.insert(key.to_string(), text);
        write_store_file(&self.path, entries.clone())?;
        self.entries = entries;
        Ok(())
    }
}

fn parse_store_text(path: &Path, content: &str) -> Result<BTreeMap<String, String>, StoreError> {
    let raw = serde_json::from_str::<StoreFile>(content).map_err(|err| StoreError::Json {
        path: path.to_path_buf(),
        line: err.line(),
        column: err.column(),
    })?;
    if raw.version != STORE_FILE_VERSION {
        return Err(StoreError::Version {
            found: raw.version,
            expected: STORE_FILE_VERSION,
        });
    }
    Ok(raw.entries)
}

fn write_store_file(path: &Path, entries: BTreeMap<String, String>) -> Result<(), StoreError> {
    let payload = StoreFile {
        version: STORE_FILE_VERSION,
        entries,
    };
    let text = serde_json::to_string_pretty(&payload).map_err(|err| StoreError::Json {
        path: path.to_path_buf(),
        line: err.line(),
        column: err.column(),
    })?;
    let staging = staging_path(path);
    fs::write(&staging, format!("{text}\n")).map_err(|source| StoreError::Io {
        path: staging.clone(),
        source,
    })?;
    // atomic replace: readers see the old document or the new one
    fs::rename(&staging, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
