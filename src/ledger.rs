/// Tab activity ledger: last-active time per tab, persisted under `tabLastActive`
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{KeyValueStore, TAB_LAST_ACTIVE_KEY, read_or_default, write};

/// Tab id → last-active time in epoch milliseconds
///
/// Serializes as a JSON object with decimal string keys, which is what
/// chrome.storage round-trips.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: HashMap<i32, i64>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    /// A ledger with every given tab stamped at `now`
    pub fn seeded(tab_ids: impl IntoIterator<Item = i32>, now: i64) -> Self {
        Ledger {
            entries: tab_ids.into_iter().map(|id| (id, now)).collect(),
        }
    }

    pub fn touch(&mut self, tab_id: i32, now: i64) {
        self.entries.insert(tab_id, now);
    }

    pub fn remove(&mut self, tab_id: i32) -> Option<i64> {
        self.entries.remove(&tab_id)
    }

    pub fn get(&self, tab_id: i32) -> Option<i64> {
        self.entries.get(&tab_id).copied()
    }

    /// Drop entries whose tab is not in `open_ids`
    pub fn retain_open(&mut self, open_ids: &[i32]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| open_ids.contains(id));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Persisted ledger operations
///
/// Each call loads the whole map, changes it and stores the whole map.
/// Two interleaved calls can lose an update; the host delivers events one
/// at a time so the last write wins.
pub struct ActivityLedger<'a, S> {
    store: &'a S,
}

impl<'a, S: KeyValueStore> ActivityLedger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        ActivityLedger { store }
    }

    pub async fn load(&self) -> Result<Ledger> {
        read_or_default(self.store, TAB_LAST_ACTIVE_KEY).await
    }

    pub async fn save(&self, ledger: &Ledger) -> Result<()> {
        write(self.store, TAB_LAST_ACTIVE_KEY, ledger).await
    }

    pub async fn touch(&self, tab_id: i32, now: i64) -> Result<()> {
        let mut ledger = self.load().await?;
        ledger.touch(tab_id, now);
        self.save(&ledger).await
    }

    pub async fn remove(&self, tab_id: i32) -> Result<()> {
        let mut ledger = self.load().await?;
        ledger.remove(tab_id);
        self.save(&ledger).await
    }

    /// Replace the ledger with every given tab stamped at `now`
    pub async fn bulk_init(&self, tab_ids: &[i32], now: i64) -> Result<()> {
        let ledger = Ledger::seeded(tab_ids.iter().copied(), now);
        self.save(&ledger).await?;
        log::info!("Initialized tracking for {} tabs", tab_ids.len());
        Ok(())
    }

    pub async fn get(&self, tab_id: i32) -> Result<Option<i64>> {
        Ok(self.load().await?.get(tab_id))
    }

    /// Number of tracked tabs, shown in the popup
    pub async fn tracked_count(&self) -> Result<usize> {
        Ok(self.load().await?.len())
    }
}
