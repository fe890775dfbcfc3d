/// Quick Link Shortcuts - Chrome Extension for link shortcuts and idle tab cleanup
/// Built with Rust + WASM + Yew

pub mod auth;
pub mod background;
pub mod bridge;
pub mod clock;
pub mod cloud;
pub mod config;
pub mod domain;
pub mod error;
pub mod host;
pub mod ledger;
pub mod settings;
pub mod shortcuts;
pub mod storage;
pub mod sweeper;
pub mod sync;
pub mod tab_data;
pub mod ui;

#[cfg(test)]
mod testing;

use wasm_bindgen::prelude::*;

use crate::background::{BackgroundEvent, BackgroundService};
use crate::bridge::{ChromeHost, ChromeStorage, from_js};
use crate::clock::SystemClock;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Re-export the whitelist matcher for JavaScript access
#[wasm_bindgen]
pub fn is_whitelisted(url: &str, whitelist: Vec<String>) -> bool {
    domain::is_whitelisted(url, &whitelist)
}

// Entry point for every chrome.* event the service worker listens to
#[wasm_bindgen]
pub async fn dispatch_background_event(event: JsValue) -> Result<(), JsValue> {
    let event: BackgroundEvent = from_js(event).map_err(|e| JsValue::from_str(&e.to_string()))?;
    log::debug!("Background event: {:?}", event);

    BackgroundService::new(&ChromeStorage, &ChromeHost, &SystemClock)
        .handle(event)
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Start the Yew app for the new tab page
#[wasm_bindgen]
pub fn start_newtab() {
    yew::Renderer::<ui::newtab::NewTab>::new().render();
}
