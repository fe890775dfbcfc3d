/// UI module exports and the storage/cloud glue both pages share
pub mod components;
pub mod newtab;
pub mod popup;

use crate::auth::{AuthManager, AuthSession};
use crate::bridge::{self, ChromeIdentity, ChromeStorage};
use crate::clock::SystemClock;
use crate::cloud::firestore::FirestoreRemote;
use crate::cloud::google::GoogleAccounts;
use crate::config::FirebaseConfig;
use crate::error::Result;
use crate::shortcuts::ShortcutList;
use crate::sync::{SyncOutcome, SyncReconciler};

/// Save the list locally; the cloud copy is pushed separately
pub async fn persist_shortcuts(list: &ShortcutList) -> Result<()> {
    list.save(&ChromeStorage).await
}

/// Run a cloud call with the stored session, refreshing an expired Firebase
/// token once; None when sync is not configured or nobody is signed in
async fn with_session<T>(
    op: impl AsyncFn(&FirebaseConfig, &AuthSession) -> Result<T>,
) -> Option<Result<T>> {
    let config = bridge::firebase_config().await?;
    let accounts = GoogleAccounts::new(config.clone());
    let auth = AuthManager::new(&ChromeStorage, &ChromeIdentity, &accounts);

    let session = match auth.current_session().await {
        Ok(Some(session)) => session,
        Ok(None) => return None,
        Err(e) => return Some(Err(e)),
    };

    Some(
        auth.authorized(&session, async |session: &AuthSession| {
            op(&config, session).await
        })
        .await,
    )
}

/// Push local shortcuts and settings when signed in
///
/// The local write has already happened, so a failure here only changes
/// the sync status.
pub async fn upload_if_signed_in() -> Option<Result<()>> {
    let result = with_session(async |config: &FirebaseConfig, session: &AuthSession| {
        let remote = remote_for(config, session);
        SyncReconciler::new().upload(&ChromeStorage, &remote).await
    })
    .await;

    if let Some(Err(e)) = &result {
        log::error!("Error saving to cloud: {}", e);
    }
    result
}

pub async fn run_full_sync(reconciler: &SyncReconciler) -> Option<Result<SyncOutcome>> {
    with_session(async |config: &FirebaseConfig, session: &AuthSession| {
        let remote = remote_for(config, session);
        reconciler.full_sync(&ChromeStorage, &remote, &SystemClock).await
    })
    .await
}

fn remote_for(config: &FirebaseConfig, session: &AuthSession) -> FirestoreRemote<SystemClock> {
    FirestoreRemote::new(config, &session.user, &session.firebase_token, SystemClock)
}

/// Open a shortcut in a new tab
pub fn open_url(url: String) {
    wasm_bindgen_futures::spawn_local(async move {
        use crate::host::TabHost;
        if let Err(e) = bridge::ChromeHost.create_tab(&url).await {
            log::error!("Failed to open {}: {}", url, e);
        }
    });
}
