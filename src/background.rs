/// Background service worker: host events dispatched into the ledger and sweeper
use serde::Deserialize;

use crate::clock::Clock;
use crate::config::{
    NEW_TAB_PAGE, OPEN_FULL_PAGE_COMMAND, SWEEP_ALARM_NAME, SWEEP_PERIOD_MINUTES,
};
use crate::error::Result;
use crate::host::{AlarmHost, TabHost};
use crate::ledger::ActivityLedger;
use crate::settings::SettingsStore;
use crate::storage::KeyValueStore;
use crate::sweeper::{SweepOutcome, sweep};
use crate::tab_data::TabInfo;

/// Events the JS bridge forwards from chrome.* listeners
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BackgroundEvent {
    Installed,
    Startup,
    TabActivated { tab_id: i32 },
    TabUpdated { tab_id: i32, status: Option<String> },
    TabCreated { tab: TabInfo },
    TabRemoved { tab_id: i32 },
    Alarm { name: String },
    Command { name: String },
}

pub struct BackgroundService<'a, S, H, C> {
    store: &'a S,
    host: &'a H,
    clock: &'a C,
}

impl<'a, S, H, C> BackgroundService<'a, S, H, C>
where
    S: KeyValueStore,
    H: TabHost + AlarmHost,
    C: Clock,
{
    pub fn new(store: &'a S, host: &'a H, clock: &'a C) -> Self {
        BackgroundService { store, host, clock }
    }

    fn ledger(&self) -> ActivityLedger<'a, S> {
        ActivityLedger::new(self.store)
    }

    pub async fn handle(&self, event: BackgroundEvent) -> Result<()> {
        let now = self.clock.now_ms();

        match event {
            BackgroundEvent::Installed => {
                SettingsStore::new(self.store).apply_defaults().await?;
                self.start_tracking().await?;
            }
            BackgroundEvent::Startup => self.start_tracking().await?,
            BackgroundEvent::TabActivated { tab_id } => self.ledger().touch(tab_id, now).await?,
            BackgroundEvent::TabUpdated { tab_id, status } => {
                if status.as_deref() == Some("complete") {
                    self.ledger().touch(tab_id, now).await?;
                }
            }
            BackgroundEvent::TabCreated { tab } => self.ledger().touch(tab.id, now).await?,
            BackgroundEvent::TabRemoved { tab_id } => self.ledger().remove(tab_id).await?,
            BackgroundEvent::Alarm { name } => {
                if name == SWEEP_ALARM_NAME {
                    self.run_sweep().await?;
                }
            }
            BackgroundEvent::Command { name } => {
                if name == OPEN_FULL_PAGE_COMMAND {
                    self.host.create_tab(NEW_TAB_PAGE).await?;
                }
            }
        }
        Ok(())
    }

    /// Stamp every open tab and (re)register the sweep alarm
    async fn start_tracking(&self) -> Result<()> {
        let tabs = self.host.query_all_tabs().await?;
        let ids: Vec<i32> = tabs.iter().map(|t| t.id).collect();
        self.ledger().bulk_init(&ids, self.clock.now_ms()).await?;
        self.host
            .create_periodic(SWEEP_ALARM_NAME, SWEEP_PERIOD_MINUTES)
            .await
    }

    async fn run_sweep(&self) -> Result<SweepOutcome> {
        let outcome = sweep(self.store, self.host, self.clock).await?;
        if let SweepOutcome::Swept(report) = &outcome {
            if !report.failed.is_empty() {
                log::debug!("Sweep left {} tab(s) it could not close", report.failed.len());
            }
        }
        Ok(outcome)
    }
}
