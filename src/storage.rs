/// Key-value persistence in the shape of chrome.storage.local
///
/// Values are whole JSON documents per key: callers load a key, change it
/// and write all of it back. Nothing here merges partial updates.
use std::cell::RefCell;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::Result;

pub const SHORTCUTS_KEY: &str = "shortcuts";
pub const RAM_SAVER_ENABLED_KEY: &str = "ramSaverEnabled";
pub const INACTIVE_TIMEOUT_KEY: &str = "inactiveTimeout";
pub const WHITELISTED_DOMAINS_KEY: &str = "whitelistedDomains";
pub const TAB_LAST_ACTIVE_KEY: &str = "tabLastActive";
pub const LAST_CLOUD_SYNC_KEY: &str = "lastCloudSync";
pub const AUTH_USER_KEY: &str = "authUser";
pub const GOOGLE_TOKEN_KEY: &str = "googleToken";
pub const FIREBASE_TOKEN_KEY: &str = "firebaseToken";

/// Async record store; `get` returns only the keys that exist
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;
    async fn set(&self, record: Map<String, Value>) -> Result<()>;
    async fn remove(&self, keys: &[&str]) -> Result<()>;
}

/// Read a single key, falling back to the default when it is absent or malformed
pub async fn read_or_default<S, T>(store: &S, key: &str) -> Result<T>
where
    S: KeyValueStore,
    T: DeserializeOwned + Default,
{
    let mut record = store.get(&[key]).await?;
    Ok(record
        .remove(key)
        .map(|value| decode_or_default(key, value))
        .unwrap_or_default())
}

/// Decode a stored value; a malformed record is logged and replaced by the default
pub fn decode_or_default<T: DeserializeOwned + Default>(key: &str, value: Value) -> T {
    if value.is_null() {
        return T::default();
    }
    serde_json::from_value(value).unwrap_or_else(|e| {
        log::warn!("Ignoring malformed '{}' record: {}", key, e);
        T::default()
    })
}

pub async fn write<S, T>(store: &S, key: &str, value: &T) -> Result<()>
where
    S: KeyValueStore,
    T: Serialize + ?Sized,
{
    let mut record = Map::new();
    record.insert(key.to_string(), serde_json::to_value(value)?);
    store.set(record).await
}

/// In-memory store, used by tests and as a stand-in when no host storage exists
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RefCell<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn with_record(record: Value) -> Self {
        let data = match record {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        MemoryStore {
            data: RefCell::new(data),
        }
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.data.borrow().clone()
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.data.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let data = self.data.borrow();
        Ok(keys
            .iter()
            .filter_map(|key| data.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect())
    }

    async fn set(&self, record: Map<String, Value>) -> Result<()> {
        self.data.borrow_mut().extend(record);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut data = self.data.borrow_mut();
        for key in keys {
            data.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tab_data::Shortcut;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_returns_only_present_keys() {
        let store = MemoryStore::with_record(json!({"a": 1, "b": true}));

        let record = store.get(&["a", "missing"]).await.unwrap();

        assert_eq!(record.len(), 1);
        assert_eq!(record.get("a"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_set_overwrites_whole_value() {
        let store = MemoryStore::with_record(json!({"list": [1, 2, 3]}));

        write(&store, "list", &vec![9]).await.unwrap();

        assert_eq!(store.value("list"), Some(json!([9])));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryStore::with_record(json!({"a": 1, "b": 2}));

        store.remove(&["a"]).await.unwrap();

        assert_eq!(store.value("a"), None);
        assert_eq!(store.value("b"), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_read_or_default_missing_and_malformed() {
        let store = MemoryStore::with_record(json!({
            SHORTCUTS_KEY: "definitely not a list",
        }));

        let shortcuts: Vec<Shortcut> = read_or_default(&store, SHORTCUTS_KEY).await.unwrap();
        assert!(shortcuts.is_empty());

        let missing: Vec<String> = read_or_default(&store, WHITELISTED_DOMAINS_KEY).await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_read_or_default_valid() {
        let store = MemoryStore::with_record(json!({
            SHORTCUTS_KEY: [{"id": "1", "name": "Rust", "url": "https://rust-lang.org"}],
        }));

        let shortcuts: Vec<Shortcut> = read_or_default(&store, SHORTCUTS_KEY).await.unwrap();

        assert_eq!(shortcuts.len(), 1);
        assert_eq!(shortcuts[0].name, "Rust");
    }
}
