/// RAM saver settings: feature toggle, idle timeout and domain whitelist
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::clock::MINUTE_MS;
use crate::domain::normalize_domain;
use crate::error::Result;
use crate::storage::{
    INACTIVE_TIMEOUT_KEY, KeyValueStore, RAM_SAVER_ENABLED_KEY, WHITELISTED_DOMAINS_KEY,
    decode_or_default,
};

pub const DEFAULT_TIMEOUT_MINUTES: u32 = 30;
pub const MIN_TIMEOUT_MINUTES: u32 = 1;
pub const MAX_TIMEOUT_MINUTES: u32 = 120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub enabled: bool,
    pub timeout_minutes: u32,
    pub whitelist: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            enabled: true,
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            whitelist: Vec::new(),
        }
    }
}

impl Settings {
    pub fn timeout_ms(&self) -> i64 {
        i64::from(self.timeout_minutes.max(MIN_TIMEOUT_MINUTES)) * MINUTE_MS
    }

    /// Build from a storage record; missing or malformed keys take their defaults
    pub fn from_record(record: &Map<String, Value>) -> Settings {
        let defaults = Settings::default();

        let enabled = record
            .get(RAM_SAVER_ENABLED_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(defaults.enabled);

        // A stored 0 reads as "unset", anything else is clamped up to the minimum
        let timeout_minutes = match record.get(INACTIVE_TIMEOUT_KEY).and_then(Value::as_f64) {
            Some(minutes) if minutes >= 1.0 => minutes.min(f64::from(u32::MAX)) as u32,
            Some(minutes) if minutes > 0.0 => MIN_TIMEOUT_MINUTES,
            _ => defaults.timeout_minutes,
        };

        let whitelist = record
            .get(WHITELISTED_DOMAINS_KEY)
            .cloned()
            .map(|value| decode_or_default::<Vec<String>>(WHITELISTED_DOMAINS_KEY, value))
            .unwrap_or(defaults.whitelist);

        Settings {
            enabled,
            timeout_minutes,
            whitelist,
        }
    }

    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert(RAM_SAVER_ENABLED_KEY.to_string(), json!(self.enabled));
        record.insert(INACTIVE_TIMEOUT_KEY.to_string(), json!(self.timeout_minutes));
        record.insert(WHITELISTED_DOMAINS_KEY.to_string(), json!(self.whitelist));
        record
    }
}

const SETTINGS_KEYS: [&str; 3] = [
    RAM_SAVER_ENABLED_KEY,
    INACTIVE_TIMEOUT_KEY,
    WHITELISTED_DOMAINS_KEY,
];

/// Settings persisted in the extension's key-value store
///
/// Every mutation is written back immediately.
pub struct SettingsStore<'a, S> {
    store: &'a S,
}

impl<'a, S: KeyValueStore> SettingsStore<'a, S> {
    pub fn new(store: &'a S) -> Self {
        SettingsStore { store }
    }

    pub async fn load(&self) -> Result<Settings> {
        let record = self.store.get(&SETTINGS_KEYS).await?;
        Ok(Settings::from_record(&record))
    }

    /// Write defaults for keys that have never been set; existing values are kept
    pub async fn apply_defaults(&self) -> Result<()> {
        let existing = self.store.get(&SETTINGS_KEYS).await?;
        let defaults: Map<String, Value> = Settings::default()
            .to_record()
            .into_iter()
            .filter(|(key, _)| !existing.contains_key(key))
            .collect();

        if !defaults.is_empty() {
            log::info!("Writing default settings for {:?}", defaults.keys().collect::<Vec<_>>());
            self.store.set(defaults).await?;
        }
        Ok(())
    }

    pub async fn replace(&self, settings: &Settings) -> Result<()> {
        self.store.set(settings.to_record()).await
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        let mut record = Map::new();
        record.insert(RAM_SAVER_ENABLED_KEY.to_string(), json!(enabled));
        self.store.set(record).await
    }

    /// Store the timeout, clamped to at least one minute; returns the stored value
    pub async fn set_timeout_minutes(&self, minutes: u32) -> Result<u32> {
        let minutes = minutes.max(MIN_TIMEOUT_MINUTES);
        let mut record = Map::new();
        record.insert(INACTIVE_TIMEOUT_KEY.to_string(), json!(minutes));
        self.store.set(record).await?;
        Ok(minutes)
    }

    /// Add a domain after normalizing it; returns false for empty input or duplicates
    pub async fn add_whitelist_domain(&self, input: &str) -> Result<bool> {
        let Some(domain) = normalize_domain(input) else {
            return Ok(false);
        };

        let mut settings = self.load().await?;
        if settings.whitelist.contains(&domain) {
            return Ok(false);
        }

        settings.whitelist.push(domain);
        self.write_whitelist(&settings.whitelist).await?;
        Ok(true)
    }

    pub async fn remove_whitelist_domain(&self, domain: &str) -> Result<bool> {
        let mut settings = self.load().await?;
        let original_len = settings.whitelist.len();
        settings.whitelist.retain(|d| d != domain);

        if settings.whitelist.len() == original_len {
            return Ok(false);
        }
        self.write_whitelist(&settings.whitelist).await?;
        Ok(true)
    }

    async fn write_whitelist(&self, whitelist: &[String]) -> Result<()> {
        let mut record = Map::new();
        record.insert(WHITELISTED_DOMAINS_KEY.to_string(), json!(whitelist));
        self.store.set(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_defaults_on_empty_store() {
        let store = MemoryStore::new();

        let settings = SettingsStore::new(&store).load().await.unwrap();

        assert!(settings.enabled);
        assert_eq!(settings.timeout_minutes, 30);
        assert!(settings.whitelist.is_empty());
        assert_eq!(settings.timeout_ms(), 30 * 60 * 1000);
    }

    #[tokio::test]
    async fn test_malformed_values_fall_back() {
        let store = MemoryStore::with_record(json!({
            RAM_SAVER_ENABLED_KEY: "yes",
            INACTIVE_TIMEOUT_KEY: 0,
            WHITELISTED_DOMAINS_KEY: 42,
        }));

        let settings = SettingsStore::new(&store).load().await.unwrap();

        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_apply_defaults_keeps_existing_values() {
        let store = MemoryStore::with_record(json!({ RAM_SAVER_ENABLED_KEY: false }));
        let settings = SettingsStore::new(&store);

        settings.apply_defaults().await.unwrap();

        assert_eq!(store.value(RAM_SAVER_ENABLED_KEY), Some(json!(false)));
        assert_eq!(store.value(INACTIVE_TIMEOUT_KEY), Some(json!(30)));
        assert_eq!(store.value(WHITELISTED_DOMAINS_KEY), Some(json!([])));
    }

    #[tokio::test]
    async fn test_timeout_is_clamped() {
        let store = MemoryStore::new();
        let settings = SettingsStore::new(&store);

        assert_eq!(settings.set_timeout_minutes(0).await.unwrap(), 1);
        assert_eq!(settings.load().await.unwrap().timeout_minutes, 1);

        settings.set_timeout_minutes(45).await.unwrap();
        assert_eq!(settings.load().await.unwrap().timeout_minutes, 45);
    }

    #[tokio::test]
    async fn test_whitelist_add_normalizes_and_dedupes() {
        let store = MemoryStore::new();
        let settings = SettingsStore::new(&store);

        assert!(settings.add_whitelist_domain("https://Docs.Rust-Lang.org/std/").await.unwrap());
        assert!(!settings.add_whitelist_domain("docs.rust-lang.org").await.unwrap());
        assert!(!settings.add_whitelist_domain("   ").await.unwrap());
        assert!(settings.add_whitelist_domain("github.com").await.unwrap());

        let loaded = settings.load().await.unwrap();
        assert_eq!(loaded.whitelist, vec!["docs.rust-lang.org", "github.com"]);
    }

    #[tokio::test]
    async fn test_whitelist_remove() {
        let store = MemoryStore::with_record(json!({
            WHITELISTED_DOMAINS_KEY: ["a.com", "b.com"],
        }));
        let settings = SettingsStore::new(&store);

        assert!(settings.remove_whitelist_domain("a.com").await.unwrap());
        assert!(!settings.remove_whitelist_domain("zzz.com").await.unwrap());
        assert_eq!(store.value(WHITELISTED_DOMAINS_KEY), Some(json!(["b.com"])));
    }

    #[tokio::test]
    async fn test_toggle_and_replace() {
        let store = MemoryStore::new();
        let settings = SettingsStore::new(&store);

        settings.set_enabled(false).await.unwrap();
        assert!(!settings.load().await.unwrap().enabled);

        let replacement = Settings {
            enabled: true,
            timeout_minutes: 90,
            whitelist: vec!["example.com".to_string()],
        };
        settings.replace(&replacement).await.unwrap();
        assert_eq!(settings.load().await.unwrap(), replacement);
    }
}
