/// Cloud sync of shortcuts and settings
///
/// Precedence is one-directional: whatever the cloud holds wins, and local
/// data is only uploaded when the cloud has nothing. There is no field-level
/// merge, so two devices editing at once will lose one side's changes.
use std::cell::Cell;

use crate::clock::{Clock, iso_timestamp};
use crate::error::Result;
use crate::settings::{Settings, SettingsStore};
use crate::shortcuts::ShortcutList;
use crate::storage::{KeyValueStore, LAST_CLOUD_SYNC_KEY, SHORTCUTS_KEY, write};
use crate::tab_data::Shortcut;

/// The signed-in user's documents in the remote store
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Empty when the remote has no shortcuts document
    async fn load_shortcuts(&self) -> Result<Vec<Shortcut>>;

    /// None when the remote has no settings document
    async fn load_settings(&self) -> Result<Option<Settings>>;

    async fn save_shortcuts(&self, shortcuts: &[Shortcut]) -> Result<()>;

    async fn save_settings(&self, settings: &Settings) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Downloaded,
    Uploaded,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another full sync was running; this request was dropped
    AlreadyRunning,
    Completed {
        shortcuts: Direction,
        settings: Direction,
        synced_at: String,
    },
}

/// Coarse status shown next to the account in the popup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Synced,
    Failed,
}

impl SyncStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "",
            SyncStatus::Syncing => "Syncing...",
            SyncStatus::Synced => "Synced",
            SyncStatus::Failed => "Sync failed",
        }
    }

    pub fn from_result<T>(result: &Result<T>) -> Self {
        if result.is_ok() {
            SyncStatus::Synced
        } else {
            SyncStatus::Failed
        }
    }

    /// Status after a cloud call that only runs when signed in; None means it
    /// was skipped
    pub fn after_attempt<T>(attempt: Option<&Result<T>>) -> Self {
        attempt.map_or(SyncStatus::Idle, SyncStatus::from_result)
    }
}

struct RunningGuard<'a>(&'a Cell<bool>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

#[derive(Debug, Default)]
pub struct SyncReconciler {
    in_progress: Cell<bool>,
}

impl SyncReconciler {
    pub fn new() -> Self {
        SyncReconciler::default()
    }

    pub fn is_syncing(&self) -> bool {
        self.in_progress.get()
    }

    /// Reconcile local and remote state; run on sign-in
    ///
    /// Algorithm:
    /// 1. Fetch remote shortcuts and settings (a failed fetch aborts the run)
    /// 2. Non-empty remote shortcuts replace local ones; otherwise non-empty
    ///    local shortcuts are uploaded
    /// 3. Remote settings replace local ones; otherwise local settings are uploaded
    /// 4. Record the completion time under `lastCloudSync`
    pub async fn full_sync<S, R, C>(&self, store: &S, remote: &R, clock: &C) -> Result<SyncOutcome>
    where
        S: KeyValueStore,
        R: RemoteStore,
        C: Clock,
    {
        if self.in_progress.replace(true) {
            log::info!("Already syncing, skipping");
            return Ok(SyncOutcome::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.in_progress);
        log::info!("Starting full sync...");

        let cloud_shortcuts = remote.load_shortcuts().await?;
        let cloud_settings = remote.load_settings().await?;

        let local_shortcuts = ShortcutList::load(store).await?;
        let settings_store = SettingsStore::new(store);

        let shortcuts = if !cloud_shortcuts.is_empty() {
            write(store, SHORTCUTS_KEY, &cloud_shortcuts).await?;
            log::info!("Synced shortcuts from cloud");
            Direction::Downloaded
        } else if !local_shortcuts.is_empty() {
            remote.save_shortcuts(&local_shortcuts.items).await?;
            Direction::Uploaded
        } else {
            Direction::Unchanged
        };

        let settings = match cloud_settings {
            Some(cloud) => {
                settings_store.replace(&cloud).await?;
                log::info!("Synced settings from cloud");
                Direction::Downloaded
            }
            None => {
                let local = settings_store.load().await?;
                remote.save_settings(&local).await?;
                Direction::Uploaded
            }
        };

        let synced_at = iso_timestamp(clock.now_ms());
        write(store, LAST_CLOUD_SYNC_KEY, &synced_at).await?;
        log::info!("Full sync completed");

        Ok(SyncOutcome::Completed {
            shortcuts,
            settings,
            synced_at,
        })
    }

    /// Push local state after a local save
    ///
    /// Shortcuts are pushed whenever the key exists, including an empty
    /// list, so deleting the last shortcut propagates.
    pub async fn upload<S, R>(&self, store: &S, remote: &R) -> Result<()>
    where
        S: KeyValueStore,
        R: RemoteStore,
    {
        let record = store.get(&[SHORTCUTS_KEY]).await?;
        if record.contains_key(SHORTCUTS_KEY) {
            let shortcuts = ShortcutList::load(store).await?;
            remote.save_shortcuts(&shortcuts.items).await?;
        }

        let settings = SettingsStore::new(store).load().await?;
        remote.save_settings(&settings).await
    }
}
