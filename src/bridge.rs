/// chrome.* bindings: JS bridge functions wrapped in the host traits

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;

use crate::config::FirebaseConfig;
use crate::error::{ExtensionError, Result};
use crate::host::{AlarmHost, IdentityHost, TabHost};
use crate::storage::KeyValueStore;
use crate::tab_data::TabInfo;

// Import JS bridge functions
mod js {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen(module = "/bridge.js")]
    extern "C" {
        #[wasm_bindgen(catch)]
        pub async fn storageGet(keys: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn storageSet(record: JsValue) -> Result<(), JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn storageRemove(keys: JsValue) -> Result<(), JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn queryAllTabs() -> Result<JsValue, JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn closeTab(tab_id: i32) -> Result<(), JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn createTab(url: &str) -> Result<(), JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn createAlarm(name: &str, period_minutes: f64) -> Result<(), JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn getAuthToken(interactive: bool) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn removeCachedAuthToken(token: &str) -> Result<(), JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn loadFirebaseConfig() -> Result<JsValue, JsValue>;
    }
}

fn host_error(context: &str, e: JsValue) -> ExtensionError {
    ExtensionError::Host(format!("{}: {:?}", context, e))
}

/// Plain objects rather than JS Maps, so chrome.storage can persist the result
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| ExtensionError::Host(format!("Failed to serialize: {:?}", e)))
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| ExtensionError::Host(format!("Failed to parse: {:?}", e)))
}

/// chrome.storage.local
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeStorage;

impl KeyValueStore for ChromeStorage {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let result = js::storageGet(to_js(keys)?)
            .await
            .map_err(|e| host_error("Failed to get storage", e))?;

        if result.is_null() || result.is_undefined() {
            return Ok(Map::new());
        }
        from_js(result)
    }

    async fn set(&self, record: Map<String, Value>) -> Result<()> {
        js::storageSet(to_js(&record)?)
            .await
            .map_err(|e| host_error("Failed to save storage", e))
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        js::storageRemove(to_js(keys)?)
            .await
            .map_err(|e| host_error("Failed to remove storage keys", e))
    }
}

/// chrome.tabs and chrome.alarms
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeHost;

impl TabHost for ChromeHost {
    async fn query_all_tabs(&self) -> Result<Vec<TabInfo>> {
        let tabs_js = js::queryAllTabs()
            .await
            .map_err(|e| host_error("Failed to get tabs", e))?;
        from_js(tabs_js)
    }

    async fn close_tab(&self, tab_id: i32) -> Result<()> {
        js::closeTab(tab_id)
            .await
            .map_err(|e| host_error("Close failed", e))
    }

    async fn create_tab(&self, url: &str) -> Result<()> {
        js::createTab(url)
            .await
            .map_err(|e| host_error("Failed to open tab", e))
    }
}

impl AlarmHost for ChromeHost {
    async fn create_periodic(&self, name: &str, period_minutes: f64) -> Result<()> {
        js::createAlarm(name, period_minutes)
            .await
            .map_err(|e| host_error("Failed to create alarm", e))
    }
}

/// chrome.identity
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeIdentity;

impl IdentityHost for ChromeIdentity {
    async fn get_auth_token(&self, interactive: bool) -> Result<String> {
        let token = js::getAuthToken(interactive)
            .await
            .map_err(|e| ExtensionError::Identity(format!("{:?}", e)))?;
        token
            .as_string()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExtensionError::Identity("Failed to get auth token".to_string()))
    }

    async fn remove_cached_token(&self, token: &str) -> Result<()> {
        js::removeCachedAuthToken(token)
            .await
            .map_err(|e| host_error("Failed to remove cached token", e))
    }
}

/// Packaged firebase-config.json; None when absent or still the example
pub async fn firebase_config() -> Option<FirebaseConfig> {
    let raw = match js::loadFirebaseConfig().await {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("No Firebase config, cloud sync disabled: {:?}", e);
            return None;
        }
    };

    from_js::<Value>(raw)
        .and_then(FirebaseConfig::from_json)
        .map_err(|e| log::warn!("Cloud sync disabled: {}", e))
        .ok()
}
