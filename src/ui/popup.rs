/// Popup UI: shortcuts, RAM saver settings and the account panel

use std::rc::Rc;

use patternfly_yew::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::auth::{AuthManager, AuthSession};
use crate::bridge::{self, ChromeIdentity, ChromeStorage};
use crate::clock::SystemClock;
use crate::cloud::google::GoogleAccounts;
use crate::config::{FirebaseConfig, NEW_TAB_PAGE};
use crate::error::Result;
use crate::ledger::ActivityLedger;
use crate::settings::{MAX_TIMEOUT_MINUTES, MIN_TIMEOUT_MINUTES, Settings, SettingsStore};
use crate::shortcuts::ShortcutList;
use crate::sync::{SyncOutcome, SyncReconciler, SyncStatus};
use crate::ui::components::{DomainTag, ShortcutEditor, ShortcutTile};
use crate::ui::{open_url, persist_shortcuts, run_full_sync, upload_if_signed_in};

const TRACKED_REFRESH_MS: i32 = 2000;

pub fn timeout_label(minutes: u32) -> String {
    format!("{} min", minutes)
}

/// Slider value as minutes, clamped to the slider's range
pub fn parse_timeout(value: &str) -> Option<u32> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .map(|m| m.clamp(MIN_TIMEOUT_MINUTES, MAX_TIMEOUT_MINUTES))
}

#[derive(Clone, PartialEq)]
enum AppState {
    Idle,
    Loading(String),
    Error(String),
}

#[derive(Clone, PartialEq)]
enum Editing {
    None,
    New,
    Existing(String),
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| AppState::Loading("Loading...".to_string()));
    let shortcuts = use_state(ShortcutList::default);
    let editing = use_state(|| Editing::None);
    let settings = use_state(Settings::default);
    let timeout_display = use_state(|| settings.timeout_minutes);
    let tracked = use_state(|| 0usize);
    let whitelist_input = use_state(String::new);
    let cloud = use_state(|| None::<FirebaseConfig>);
    let session = use_state(|| None::<AuthSession>);
    let sync_status = use_state(SyncStatus::default);
    let reconciler = use_memo((), |_| SyncReconciler::new());

    // Load local state, then restore the session and sync
    {
        let state = state.clone();
        let shortcuts = shortcuts.clone();
        let settings = settings.clone();
        let timeout_display = timeout_display.clone();
        let tracked = tracked.clone();
        let cloud = cloud.clone();
        let session = session.clone();
        let sync_status = sync_status.clone();
        let reconciler = reconciler.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                match load_local().await {
                    Ok((list, loaded, count)) => {
                        shortcuts.set(list);
                        timeout_display.set(loaded.timeout_minutes);
                        settings.set(loaded);
                        tracked.set(count);
                        state.set(AppState::Idle);
                    }
                    Err(e) => {
                        state.set(AppState::Error(format!("Failed to load: {}", e)));
                        return;
                    }
                }

                let Some(config) = bridge::firebase_config().await else {
                    return;
                };
                cloud.set(Some(config.clone()));

                let accounts = GoogleAccounts::new(config.clone());
                match AuthManager::new(&ChromeStorage, &ChromeIdentity, &accounts).restore().await {
                    Ok(Some(restored)) => {
                        session.set(Some(restored));
                        sync_and_reload(reconciler, session, shortcuts, settings, sync_status).await;
                    }
                    Ok(None) => {}
                    Err(e) => log::warn!("Could not restore session: {}", e),
                }
            });
            || ()
        });
    }

    // Keep the tracked-tab counter live while the popup is open
    {
        let tracked = tracked.clone();
        use_effect_with((), move |_| {
            let tick = Closure::wrap(Box::new(move || {
                let tracked = tracked.clone();
                spawn_local(async move {
                    if let Ok(count) = ActivityLedger::new(&ChromeStorage).tracked_count().await {
                        tracked.set(count);
                    }
                });
            }) as Box<dyn Fn()>);

            let handle = web_sys::window().and_then(|window| {
                window
                    .set_interval_with_callback_and_timeout_and_arguments_0(
                        tick.as_ref().unchecked_ref(),
                        TRACKED_REFRESH_MS,
                    )
                    .ok()
            });

            move || {
                if let (Some(window), Some(handle)) = (web_sys::window(), handle) {
                    window.clear_interval_with_handle(handle);
                }
                drop(tick);
            }
        });
    }

    // Shortcut mutations: update the view, then save and upload
    let commit = {
        let shortcuts = shortcuts.clone();
        let state = state.clone();
        let session = session.clone();
        let sync_status = sync_status.clone();
        move |list: ShortcutList| {
            shortcuts.set(list.clone());
            let state = state.clone();
            let session = session.clone();
            let sync_status = sync_status.clone();
            spawn_local(async move {
                match persist_shortcuts(&list).await {
                    Ok(()) => upload_with_status(session, sync_status).await,
                    Err(e) => state.set(AppState::Error(format!("Failed to save: {}", e))),
                }
            });
        }
    };

    let on_save_shortcut = {
        let shortcuts = shortcuts.clone();
        let editing = editing.clone();
        let commit = commit.clone();
        Callback::from(move |(name, url): (String, String)| {
            let mut list = (*shortcuts).clone();
            match &*editing {
                Editing::Existing(id) => {
                    list.update(id, &name, &url);
                }
                Editing::New => {
                    list.add(&name, &url);
                }
                Editing::None => return,
            }
            commit(list);
            editing.set(Editing::None);
        })
    };

    let on_delete_shortcut = {
        let shortcuts = shortcuts.clone();
        Callback::from(move |id: String| {
            let mut list = (*shortcuts).clone();
            if list.remove(&id) {
                commit(list);
            }
        })
    };

    let on_edit_shortcut = {
        let editing = editing.clone();
        Callback::from(move |id: String| editing.set(Editing::Existing(id)))
    };

    let on_add_shortcut = {
        let editing = editing.clone();
        Callback::from(move |_: MouseEvent| editing.set(Editing::New))
    };

    let on_cancel_edit = {
        let editing = editing.clone();
        Callback::from(move |_: ()| editing.set(Editing::None))
    };

    let on_open_full_page = Callback::from(|_: MouseEvent| open_url(NEW_TAB_PAGE.to_string()));

    // RAM saver toggle
    let on_toggle = {
        let settings = settings.clone();
        let state = state.clone();
        let session = session.clone();
        let sync_status = sync_status.clone();
        Callback::from(move |e: Event| {
            let Some(input) = e.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let enabled = input.checked();
            let settings = settings.clone();
            let state = state.clone();
            let session = session.clone();
            let sync_status = sync_status.clone();
            spawn_local(async move {
                match SettingsStore::new(&ChromeStorage).set_enabled(enabled).await {
                    Ok(()) => {
                        settings.set(Settings { enabled, ..(*settings).clone() });
                        upload_with_status(session, sync_status).await;
                    }
                    Err(e) => state.set(AppState::Error(format!("Failed to save: {}", e))),
                }
            });
        })
    };

    // Slider: label follows while dragging, value is saved on release
    let on_timeout_input = {
        let timeout_display = timeout_display.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(minutes) = e
                .target_dyn_into::<HtmlInputElement>()
                .and_then(|input| parse_timeout(&input.value()))
            {
                timeout_display.set(minutes);
            }
        })
    };

    let on_timeout_change = {
        let settings = settings.clone();
        let timeout_display = timeout_display.clone();
        let state = state.clone();
        let session = session.clone();
        let sync_status = sync_status.clone();
        Callback::from(move |e: Event| {
            let Some(minutes) = e
                .target_dyn_into::<HtmlInputElement>()
                .and_then(|input| parse_timeout(&input.value()))
            else {
                return;
            };
            let settings = settings.clone();
            let timeout_display = timeout_display.clone();
            let state = state.clone();
            let session = session.clone();
            let sync_status = sync_status.clone();
            spawn_local(async move {
                match SettingsStore::new(&ChromeStorage).set_timeout_minutes(minutes).await {
                    Ok(saved) => {
                        timeout_display.set(saved);
                        settings.set(Settings { timeout_minutes: saved, ..(*settings).clone() });
                        upload_with_status(session, sync_status).await;
                    }
                    Err(e) => state.set(AppState::Error(format!("Failed to save: {}", e))),
                }
            });
        })
    };

    let on_whitelist_input = {
        let whitelist_input = whitelist_input.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                whitelist_input.set(input.value());
            }
        })
    };

    let add_domain = {
        let whitelist_input = whitelist_input.clone();
        let settings = settings.clone();
        let state = state.clone();
        let session = session.clone();
        let sync_status = sync_status.clone();
        move || {
            let entry = (*whitelist_input).clone();
            let whitelist_input = whitelist_input.clone();
            let settings = settings.clone();
            let state = state.clone();
            let session = session.clone();
            let sync_status = sync_status.clone();
            spawn_local(async move {
                let store = SettingsStore::new(&ChromeStorage);
                match store.add_whitelist_domain(&entry).await {
                    Ok(true) => {
                        whitelist_input.set(String::new());
                        if let Ok(loaded) = store.load().await {
                            settings.set(loaded);
                        }
                        upload_with_status(session, sync_status).await;
                    }
                    Ok(false) => {}
                    Err(e) => state.set(AppState::Error(format!("Failed to save: {}", e))),
                }
            });
        }
    };

    let on_add_domain_click = {
        let add_domain = add_domain.clone();
        Callback::from(move |_: MouseEvent| add_domain())
    };

    let on_whitelist_keydown = Callback::from(move |e: KeyboardEvent| {
        if e.key() == "Enter" {
            add_domain();
        }
    });

    let on_remove_domain = {
        let settings = settings.clone();
        let state = state.clone();
        let session = session.clone();
        let sync_status = sync_status.clone();
        Callback::from(move |domain: String| {
            let settings = settings.clone();
            let state = state.clone();
            let session = session.clone();
            let sync_status = sync_status.clone();
            spawn_local(async move {
                let store = SettingsStore::new(&ChromeStorage);
                match store.remove_whitelist_domain(&domain).await {
                    Ok(true) => {
                        if let Ok(loaded) = store.load().await {
                            settings.set(loaded);
                        }
                        upload_with_status(session, sync_status).await;
                    }
                    Ok(false) => {}
                    Err(e) => state.set(AppState::Error(format!("Failed to save: {}", e))),
                }
            });
        })
    };

    let on_sign_in = {
        let state = state.clone();
        let cloud = cloud.clone();
        let session = session.clone();
        let shortcuts = shortcuts.clone();
        let settings = settings.clone();
        let sync_status = sync_status.clone();
        let reconciler = reconciler.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(config) = (*cloud).clone() else {
                return;
            };
            let state = state.clone();
            let session = session.clone();
            let shortcuts = shortcuts.clone();
            let settings = settings.clone();
            let sync_status = sync_status.clone();
            let reconciler = reconciler.clone();

            state.set(AppState::Loading("Signing in...".to_string()));
            spawn_local(async move {
                let accounts = GoogleAccounts::new(config.clone());
                match AuthManager::new(&ChromeStorage, &ChromeIdentity, &accounts)
                    .sign_in(&SystemClock)
                    .await
                {
                    Ok(signed_in) => {
                        state.set(AppState::Idle);
                        session.set(Some(signed_in));
                        sync_and_reload(reconciler, session, shortcuts, settings, sync_status).await;
                    }
                    Err(e) => {
                        log::error!("Sign in error: {}", e);
                        state.set(AppState::Error(format!("Sign in failed: {}", e)));
                    }
                }
            });
        })
    };

    let on_sign_out = {
        let state = state.clone();
        let cloud = cloud.clone();
        let session = session.clone();
        let sync_status = sync_status.clone();
        Callback::from(move |_: MouseEvent| {
            let (Some(config), Some(current)) = ((*cloud).clone(), (*session).clone()) else {
                return;
            };
            let state = state.clone();
            let session = session.clone();
            let sync_status = sync_status.clone();
            spawn_local(async move {
                let accounts = GoogleAccounts::new(config);
                match AuthManager::new(&ChromeStorage, &ChromeIdentity, &accounts)
                    .sign_out(&current)
                    .await
                {
                    Ok(()) => {
                        session.set(None);
                        sync_status.set(SyncStatus::Idle);
                    }
                    Err(e) => state.set(AppState::Error(format!("Sign out failed: {}", e))),
                }
            });
        })
    };

    let is_busy = matches!(*state, AppState::Loading(_));

    let editor = match &*editing {
        Editing::None => html! {},
        Editing::New => html! {
            <ShortcutEditor key="new" on_save={on_save_shortcut} on_cancel={on_cancel_edit} />
        },
        Editing::Existing(id) => match shortcuts.get(id) {
            Some(shortcut) => html! {
                <ShortcutEditor
                    key={shortcut.id.clone()}
                    name={shortcut.name.clone()}
                    url={shortcut.url.clone()}
                    on_save={on_save_shortcut}
                    on_cancel={on_cancel_edit}
                />
            },
            None => html! {},
        },
    };

    let account = match ((*cloud).as_ref(), (*session).as_ref()) {
        (None, _) => html! {
            <p class="account-note">{"Cloud sync is not configured"}</p>
        },
        (Some(_), None) => html! {
            <Button onclick={on_sign_in} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                {"Sign in with Google"}
            </Button>
        },
        (Some(_), Some(current)) => html! {
            <div class="account">
                if let Some(photo) = current.user.photo_url.clone() {
                    <img class="account-avatar" src={photo} alt="" />
                }
                <div class="account-details">
                    <span class="account-name">
                        {current.user.display_name.clone().unwrap_or_else(|| "User".to_string())}
                    </span>
                    <span class="account-email">{&current.user.email}</span>
                    <span class="sync-status">{sync_status.label()}</span>
                </div>
                <Button onclick={on_sign_out} variant={ButtonVariant::Link}>{"Sign out"}</Button>
            </div>
        },
    };

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"Quick Link Shortcuts"}</h1>

            // Status display
            {match &*state {
                AppState::Loading(msg) => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{msg}</p>
                    </div>
                },
                AppState::Error(err) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                            {err.clone()}
                        </Alert>
                    </div>
                },
                AppState::Idle => html! {}
            }}

            <section class="shortcuts-section">
                <div class="shortcut-grid">
                    {for shortcuts.items.iter().enumerate().map(|(index, shortcut)| html! {
                        <ShortcutTile
                            key={shortcut.id.clone()}
                            shortcut={shortcut.clone()}
                            index={index}
                            on_open={Callback::from(open_url)}
                            on_edit={on_edit_shortcut.clone()}
                            on_delete={on_delete_shortcut.clone()}
                        />
                    })}
                    <button class="shortcut-tile add-tile" onclick={on_add_shortcut}>{"+"}</button>
                </div>
                {editor}
                <Button onclick={on_open_full_page} variant={ButtonVariant::Secondary} block={true}>
                    {"Open full page"}
                </Button>
            </section>

            <section class="ram-saver">
                <label class="ram-saver-toggle">
                    <input type="checkbox" checked={settings.enabled} onchange={on_toggle} />
                    {" RAM Saver"}
                </label>

                <div class={if settings.enabled { "ram-saver-settings" } else { "ram-saver-settings disabled" }}>
                    <label class="timeout-label">
                        {"Close tabs inactive for "}
                        <strong>{timeout_label(*timeout_display)}</strong>
                    </label>
                    <input
                        type="range"
                        min={MIN_TIMEOUT_MINUTES.to_string()}
                        max={MAX_TIMEOUT_MINUTES.to_string()}
                        value={timeout_display.to_string()}
                        oninput={on_timeout_input}
                        onchange={on_timeout_change}
                    />
                    <p class="tracked-count">{format!("Tracking {} tabs", *tracked)}</p>

                    <div class="whitelist">
                        <h2 class="stats-title">{"Protected domains"}</h2>
                        <div class="whitelist-tags">
                            if settings.whitelist.is_empty() {
                                <span class="whitelist-empty">{"No protected domains"}</span>
                            }
                            {for settings.whitelist.iter().map(|domain| html! {
                                <DomainTag key={domain.clone()} domain={domain.clone()} on_remove={on_remove_domain.clone()} />
                            })}
                        </div>
                        <div class="whitelist-input-row">
                            <input
                                class="pf-v5-c-form-control"
                                type="text"
                                placeholder="example.com"
                                value={(*whitelist_input).clone()}
                                oninput={on_whitelist_input}
                                onkeydown={on_whitelist_keydown}
                            />
                            <Button onclick={on_add_domain_click} variant={ButtonVariant::Secondary}>{"Add"}</Button>
                        </div>
                    </div>
                </div>
            </section>

            <section class="account-section">
                {account}
            </section>

            <p class="footer-popup">
                {"Quick Link Shortcuts v0.1.0"}
            </p>
        </div>
    }
}

// Helper functions

async fn load_local() -> Result<(ShortcutList, Settings, usize)> {
    let shortcuts = ShortcutList::load(&ChromeStorage).await?;
    let settings = SettingsStore::new(&ChromeStorage).load().await?;
    let tracked = ActivityLedger::new(&ChromeStorage).tracked_count().await?;
    Ok((shortcuts, settings, tracked))
}

/// Full sync, then reload whatever the cloud may have replaced
async fn sync_and_reload(
    reconciler: Rc<SyncReconciler>,
    session: UseStateHandle<Option<AuthSession>>,
    shortcuts: UseStateHandle<ShortcutList>,
    settings: UseStateHandle<Settings>,
    sync_status: UseStateHandle<SyncStatus>,
) {
    sync_status.set(SyncStatus::Syncing);
    let result = run_full_sync(&reconciler).await;

    match &result {
        Some(Ok(SyncOutcome::AlreadyRunning)) => return,
        Some(Ok(SyncOutcome::Completed { .. })) | None => {}
        Some(Err(e)) => log::error!("Initial sync error: {}", e),
    }
    settle_sync(&session, &sync_status, result.as_ref());

    if let Ok((list, loaded, _)) = load_local().await {
        shortcuts.set(list);
        settings.set(loaded);
    }
}

/// Push local changes to the cloud and show how it went
async fn upload_with_status(
    session: UseStateHandle<Option<AuthSession>>,
    sync_status: UseStateHandle<SyncStatus>,
) {
    sync_status.set(SyncStatus::Syncing);
    let result = upload_if_signed_in().await;
    settle_sync(&session, &sync_status, result.as_ref());
}

/// A skipped or refused call means the stored session is gone
fn settle_sync<T>(
    session: &UseStateHandle<Option<AuthSession>>,
    sync_status: &UseStateHandle<SyncStatus>,
    attempt: Option<&Result<T>>,
) {
    if session_ended(attempt) {
        session.set(None);
    }
    sync_status.set(SyncStatus::after_attempt(attempt));
}

fn session_ended<T>(attempt: Option<&Result<T>>) -> bool {
    match attempt {
        None => true,
        Some(Err(e)) => e.is_unauthorized(),
        Some(Ok(_)) => false,
    }
}
