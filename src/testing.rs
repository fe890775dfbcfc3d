/// In-memory host fakes for unit tests
use std::cell::RefCell;
use std::collections::HashSet;

use crate::error::{ExtensionError, Result};
use crate::host::{AlarmHost, IdentityHost, TabHost};
use crate::tab_data::TabInfo;

pub fn tab(id: i32, url: &str) -> TabInfo {
    TabInfo::new(id, url.to_string(), format!("Tab {}", id), false, false)
}

pub fn pinned_tab(id: i32, url: &str) -> TabInfo {
    TabInfo { pinned: true, ..tab(id, url) }
}

pub fn active_tab(id: i32, url: &str) -> TabInfo {
    TabInfo { active: true, ..tab(id, url) }
}

#[derive(Default)]
pub struct FakeHost {
    tabs: RefCell<Vec<TabInfo>>,
    pub closed: RefCell<Vec<i32>>,
    pub created: RefCell<Vec<String>>,
    pub alarms: RefCell<Vec<(String, f64)>>,
    failing: RefCell<HashSet<i32>>,
}

impl FakeHost {
    pub fn with_tabs(tabs: Vec<TabInfo>) -> Self {
        FakeHost {
            tabs: RefCell::new(tabs),
            ..FakeHost::default()
        }
    }

    /// Closing this tab will fail as if it vanished mid-sweep
    pub fn fail_close(&self, tab_id: i32) {
        self.failing.borrow_mut().insert(tab_id);
    }

    /// Ids of the tabs still open
    pub fn open_ids(&self) -> Vec<i32> {
        self.tabs.borrow().iter().map(|t| t.id).collect()
    }
}

impl TabHost for FakeHost {
    async fn query_all_tabs(&self) -> Result<Vec<TabInfo>> {
        Ok(self.tabs.borrow().clone())
    }

    async fn close_tab(&self, tab_id: i32) -> Result<()> {
        if self.failing.borrow().contains(&tab_id) {
            return Err(ExtensionError::Host(format!("No tab with id: {}.", tab_id)));
        }
        self.tabs.borrow_mut().retain(|t| t.id != tab_id);
        self.closed.borrow_mut().push(tab_id);
        Ok(())
    }

    async fn create_tab(&self, url: &str) -> Result<()> {
        self.created.borrow_mut().push(url.to_string());
        Ok(())
    }
}

impl AlarmHost for FakeHost {
    async fn create_periodic(&self, name: &str, period_minutes: f64) -> Result<()> {
        self.alarms.borrow_mut().push((name.to_string(), period_minutes));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeIdentity {
    pub token: Option<String>,
    pub removed: RefCell<Vec<String>>,
}

impl IdentityHost for FakeIdentity {
    async fn get_auth_token(&self, _interactive: bool) -> Result<String> {
        self.token
            .clone()
            .ok_or_else(|| ExtensionError::Identity("The user did not approve access.".to_string()))
    }

    async fn remove_cached_token(&self, token: &str) -> Result<()> {
        self.removed.borrow_mut().push(token.to_string());
        Ok(())
    }
}
