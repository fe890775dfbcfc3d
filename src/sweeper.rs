/// RAM saver sweep: close tabs that have been idle longer than the configured timeout
use crate::clock::{Clock, MINUTE_MS};
use crate::domain::{is_internal_url, is_whitelisted};
use crate::error::Result;
use crate::host::TabHost;
use crate::ledger::{ActivityLedger, Ledger};
use crate::settings::SettingsStore;
use crate::storage::KeyValueStore;
use crate::tab_data::TabInfo;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub closed: Vec<i32>,
    /// Tabs that were due but could not be closed (usually already gone)
    pub failed: Vec<i32>,
    pub skipped_pinned: usize,
    pub skipped_internal: usize,
    pub skipped_whitelisted: usize,
    pub skipped_active: usize,
    /// Stale ledger entries for tabs that no longer exist
    pub pruned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    Disabled,
    /// Ledger was empty: every open tab was stamped and nothing closed
    Seeded { tracked: usize },
    Swept(SweepReport),
}

enum Verdict {
    Pinned,
    Internal,
    Whitelisted,
    Active,
    Idle(i64),
}

fn classify(tab: &TabInfo, whitelist: &[String], ledger: &Ledger, now: i64) -> Verdict {
    if tab.pinned {
        return Verdict::Pinned;
    }
    if is_internal_url(&tab.url) {
        return Verdict::Internal;
    }
    if is_whitelisted(&tab.url, whitelist) {
        return Verdict::Whitelisted;
    }
    if tab.active {
        return Verdict::Active;
    }
    // A tab without an entry is treated as just seen
    let last_active = ledger.get(tab.id).unwrap_or(now);
    Verdict::Idle(now.saturating_sub(last_active))
}

/// Run one sweep
///
/// Algorithm:
/// 1. Bail out if the feature is disabled
/// 2. Load settings, ledger and all open tabs
/// 3. Empty ledger with open tabs → seed it and close nothing this tick
/// 4. Per tab: skip pinned, internal pages, whitelisted hosts and the
///    active tab of each window (its timestamp is refreshed); close tabs
///    idle strictly longer than the timeout
/// 5. Persist the ledger once
///
/// A failed close is logged and the loop keeps going.
pub async fn sweep<S, T, C>(store: &S, tabs: &T, clock: &C) -> Result<SweepOutcome>
where
    S: KeyValueStore,
    T: TabHost,
    C: Clock,
{
    let settings = SettingsStore::new(store).load().await?;
    if !settings.enabled {
        log::debug!("RAM saver is disabled");
        return Ok(SweepOutcome::Disabled);
    }

    let ledger_store = ActivityLedger::new(store);
    let mut ledger = ledger_store.load().await?;
    let timeout_ms = settings.timeout_ms();
    let now = clock.now_ms();
    let open_tabs = tabs.query_all_tabs().await?;

    if ledger.is_empty() && !open_tabs.is_empty() {
        log::info!("Ledger is empty, seeding {} tabs before closing anything", open_tabs.len());
        let ids: Vec<i32> = open_tabs.iter().map(|t| t.id).collect();
        ledger_store.bulk_init(&ids, now).await?;
        return Ok(SweepOutcome::Seeded { tracked: ids.len() });
    }

    let mut report = SweepReport::default();

    for tab in &open_tabs {
        match classify(tab, &settings.whitelist, &ledger, now) {
            Verdict::Pinned => report.skipped_pinned += 1,
            Verdict::Internal => report.skipped_internal += 1,
            Verdict::Whitelisted => report.skipped_whitelisted += 1,
            Verdict::Active => {
                ledger.touch(tab.id, now);
                report.skipped_active += 1;
            }
            Verdict::Idle(idle_ms) if idle_ms > timeout_ms => {
                log::info!(
                    "Closing inactive tab ({} min): {}",
                    idle_ms / MINUTE_MS,
                    tab.title
                );
                match tabs.close_tab(tab.id).await {
                    Ok(()) => {
                        ledger.remove(tab.id);
                        report.closed.push(tab.id);
                    }
                    Err(e) => {
                        log::warn!("Failed to close tab {}: {}", tab.id, e);
                        report.failed.push(tab.id);
                    }
                }
            }
            Verdict::Idle(_) => {
                if ledger.get(tab.id).is_none() {
                    ledger.touch(tab.id, now);
                }
            }
        }
    }

    let still_open: Vec<i32> = open_tabs
        .iter()
        .map(|t| t.id)
        .filter(|id| !report.closed.contains(id))
        .collect();
    report.pruned = ledger.retain_open(&still_open);

    if !report.closed.is_empty() {
        log::info!("Closed {} inactive tab(s)", report.closed.len());
    }

    ledger_store.save(&ledger).await?;
    Ok(SweepOutcome::Swept(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::{
        INACTIVE_TIMEOUT_KEY, MemoryStore, RAM_SAVER_ENABLED_KEY, TAB_LAST_ACTIVE_KEY,
        WHITELISTED_DOMAINS_KEY,
    };
    use crate::testing::{FakeHost, active_tab, pinned_tab, tab};
    use serde_json::{Value, json};

    const NOW: i64 = 1_700_000_000_000;

    fn minutes_ago(minutes: i64) -> i64 {
        NOW - minutes * MINUTE_MS
    }

    fn store_with(ledger: Value, whitelist: Value) -> MemoryStore {
        MemoryStore::with_record(json!({
            RAM_SAVER_ENABLED_KEY: true,
            INACTIVE_TIMEOUT_KEY: 30,
            WHITELISTED_DOMAINS_KEY: whitelist,
            TAB_LAST_ACTIVE_KEY: ledger,
        }))
    }

    fn swept(outcome: SweepOutcome) -> SweepReport {
        match outcome {
            SweepOutcome::Swept(report) => report,
            other => panic!("expected a sweep, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concrete_scenario() {
        let store = store_with(
            json!({
                "1": minutes_ago(40),
                "2": minutes_ago(10),
                "3": minutes_ago(999),
                "4": minutes_ago(999),
            }),
            json!(["example.com"]),
        );
        let host = FakeHost::with_tabs(vec![
            tab(1, "https://a.test/"),
            tab(2, "https://b.test/"),
            pinned_tab(3, "https://c.test/"),
            tab(4, "https://sub.example.com"),
        ]);
        let clock = FixedClock::new(NOW);

        let report = swept(sweep(&store, &host, &clock).await.unwrap());

        assert_eq!(report.closed, vec![1]);
        assert_eq!(*host.closed.borrow(), vec![1]);
        assert_eq!(report.skipped_pinned, 1);
        assert_eq!(report.skipped_whitelisted, 1);

        let ledger = ActivityLedger::new(&store).load().await.unwrap();
        assert_eq!(ledger.get(1), None);
        assert_eq!(ledger.get(2), Some(minutes_ago(10)));
    }

    #[tokio::test]
    async fn test_disabled_is_a_no_op() {
        let ledger = json!({"1": minutes_ago(500)});
        let store = store_with(ledger.clone(), json!([]));
        store
            .set(serde_json::Map::from_iter([(RAM_SAVER_ENABLED_KEY.to_string(), json!(false))]))
            .await
            .unwrap();
        let host = FakeHost::with_tabs(vec![tab(1, "https://a.test")]);

        let outcome = sweep(&store, &host, &FixedClock::new(NOW)).await.unwrap();

        assert_eq!(outcome, SweepOutcome::Disabled);
        assert!(host.closed.borrow().is_empty());
        assert_eq!(store.value(TAB_LAST_ACTIVE_KEY), Some(ledger));
    }

    #[tokio::test]
    async fn test_active_tab_is_refreshed_not_closed() {
        let store = store_with(json!({"1": minutes_ago(500), "2": minutes_ago(500)}), json!([]));
        let host = FakeHost::with_tabs(vec![
            active_tab(1, "https://a.test"),
            tab(2, "https://b.test"),
        ]);

        let report = swept(sweep(&store, &host, &FixedClock::new(NOW)).await.unwrap());

        assert_eq!(report.closed, vec![2]);
        assert_eq!(report.skipped_active, 1);
        let ledger = ActivityLedger::new(&store).load().await.unwrap();
        assert_eq!(ledger.get(1), Some(NOW));
    }

    #[tokio::test]
    async fn test_timeout_boundary_is_exclusive() {
        let store = store_with(json!({"1": minutes_ago(30), "2": minutes_ago(30) - 1}), json!([]));
        let host = FakeHost::with_tabs(vec![tab(1, "https://a.test"), tab(2, "https://b.test")]);

        let report = swept(sweep(&store, &host, &FixedClock::new(NOW)).await.unwrap());

        assert_eq!(report.closed, vec![2]);
    }

    #[tokio::test]
    async fn test_internal_pages_are_never_closed() {
        let store = store_with(json!({"1": minutes_ago(500), "2": minutes_ago(500)}), json!([]));
        let host = FakeHost::with_tabs(vec![
            tab(1, "chrome://extensions"),
            tab(2, "chrome-extension://abcdef/newtab.html"),
        ]);

        let report = swept(sweep(&store, &host, &FixedClock::new(NOW)).await.unwrap());

        assert!(report.closed.is_empty());
        assert_eq!(report.skipped_internal, 2);
    }

    #[tokio::test]
    async fn test_cold_start_seeds_and_closes_nothing() {
        let store = store_with(json!({}), json!([]));
        let host = FakeHost::with_tabs(vec![tab(1, "https://a.test"), tab(2, "https://b.test")]);

        let outcome = sweep(&store, &host, &FixedClock::new(NOW)).await.unwrap();

        assert_eq!(outcome, SweepOutcome::Seeded { tracked: 2 });
        assert!(host.closed.borrow().is_empty());
        let ledger = ActivityLedger::new(&store).load().await.unwrap();
        assert_eq!(ledger.get(1), Some(NOW));
        assert_eq!(ledger.get(2), Some(NOW));
    }

    #[tokio::test]
    async fn test_missing_entry_gets_grace() {
        let store = store_with(json!({"1": minutes_ago(5)}), json!([]));
        let host = FakeHost::with_tabs(vec![tab(1, "https://a.test"), tab(2, "https://b.test")]);
        let clock = FixedClock::new(NOW);

        let report = swept(sweep(&store, &host, &clock).await.unwrap());
        assert!(report.closed.is_empty());

        // Grace starts counting from the first sweep that saw the tab
        clock.advance_minutes(31);
        let report = swept(sweep(&store, &host, &clock).await.unwrap());
        assert_eq!(report.closed, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_close_failure_does_not_abort_sweep() {
        let store = store_with(json!({"1": minutes_ago(60), "2": minutes_ago(60)}), json!([]));
        let host = FakeHost::with_tabs(vec![tab(1, "https://a.test"), tab(2, "https://b.test")]);
        host.fail_close(1);

        let report = swept(sweep(&store, &host, &FixedClock::new(NOW)).await.unwrap());

        assert_eq!(report.failed, vec![1]);
        assert_eq!(report.closed, vec![2]);
        let ledger = ActivityLedger::new(&store).load().await.unwrap();
        assert_eq!(ledger.get(1), Some(minutes_ago(60)));
        assert_eq!(ledger.get(2), None);
    }

    #[tokio::test]
    async fn test_stale_entries_are_pruned() {
        let store = store_with(json!({"1": minutes_ago(1), "77": minutes_ago(1)}), json!([]));
        let host = FakeHost::with_tabs(vec![tab(1, "https://a.test")]);

        let report = swept(sweep(&store, &host, &FixedClock::new(NOW)).await.unwrap());

        assert_eq!(report.pruned, 1);
        assert_eq!(store.value(TAB_LAST_ACTIVE_KEY), Some(json!({"1": minutes_ago(1)})));
    }

    #[tokio::test]
    async fn test_second_pass_closes_nothing_new() {
        let store = store_with(
            json!({"1": minutes_ago(45), "2": minutes_ago(90), "3": minutes_ago(2)}),
            json!([]),
        );
        let host = FakeHost::with_tabs(vec![
            tab(1, "https://a.test"),
            tab(2, "https://b.test"),
            tab(3, "https://c.test"),
        ]);
        let clock = FixedClock::new(NOW);

        let first = swept(sweep(&store, &host, &clock).await.unwrap());
        let second = swept(sweep(&store, &host, &clock).await.unwrap());

        assert_eq!(first.closed, vec![1, 2]);
        assert!(second.closed.is_empty());
        assert_eq!(host.open_ids(), vec![3]);
    }

    #[tokio::test]
    async fn test_out_of_range_timestamps_do_not_overflow() {
        let store = store_with(json!({"1": i64::MIN, "2": i64::MAX}), json!([]));
        let host = FakeHost::with_tabs(vec![tab(1, "https://a.test/"), tab(2, "https://b.test/")]);
        let clock = FixedClock::new(NOW);

        let report = swept(sweep(&store, &host, &clock).await.unwrap());

        assert_eq!(report.closed, vec![1]);
        assert_eq!(host.open_ids(), vec![2]);
    }
}
