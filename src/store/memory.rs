use std::collections::HashMap;

use crate::store::{KeyValueStore, StoreError};

/// Session-only store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_previous_value() {
        let mut store = MemoryStore::default();
        store.set("k", b"first").expect("set");
        store.set("k", b"second").expect("set");
        assert_eq!(store.get("k").expect("get"), Some(b"second".to_vec()));
        assert_eq!(store.get("missing").expect("get"), None);
    }
}
