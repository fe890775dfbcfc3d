/// Browser capabilities the extension consumes, implemented over chrome.* in `bridge`
use crate::error::Result;
use crate::tab_data::TabInfo;

#[allow(async_fn_in_trait)]
pub trait TabHost {
    async fn query_all_tabs(&self) -> Result<Vec<TabInfo>>;

    /// Fails when the tab is already gone
    async fn close_tab(&self, tab_id: i32) -> Result<()>;

    async fn create_tab(&self, url: &str) -> Result<()>;
}

#[allow(async_fn_in_trait)]
pub trait AlarmHost {
    /// Register (or re-register) a named repeating alarm
    async fn create_periodic(&self, name: &str, period_minutes: f64) -> Result<()>;
}

/// OAuth token access through chrome.identity
#[allow(async_fn_in_trait)]
pub trait IdentityHost {
    async fn get_auth_token(&self, interactive: bool) -> Result<String>;

    async fn remove_cached_token(&self, token: &str) -> Result<()>;
}
