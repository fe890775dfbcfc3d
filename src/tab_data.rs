/// Data structures shared between the background worker, the UI and sync
use serde::{Deserialize, Serialize};

/// Information about a browser tab, as reported by chrome.tabs.query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabInfo {
    pub id: i32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub active: bool,
}

impl TabInfo {
    pub fn new(id: i32, url: String, title: String, pinned: bool, active: bool) -> TabInfo {
        TabInfo {
            id,
            url,
            title,
            pinned,
            active,
        }
    }
}

/// A link shortcut on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shortcut {
    pub id: String,
    pub name: String,
    pub url: String,
}
