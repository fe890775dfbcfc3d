/// Google sign-in session: restore, sign in, sign out
///
/// The Google access token comes from chrome.identity and is exchanged for a
/// Firebase ID token, which is what Firestore requests are authorized with.
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};

use crate::clock::Clock;
use crate::error::{ExtensionError, Result};
use crate::host::IdentityHost;
use crate::storage::{
    AUTH_USER_KEY, FIREBASE_TOKEN_KEY, GOOGLE_TOKEN_KEY, KeyValueStore, decode_or_default,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub user: AuthUser,
    pub google_token: String,
    pub firebase_token: String,
}

/// Google userinfo response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserInfo {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Result of exchanging a Google token with Firebase
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityToken {
    pub id_token: String,
    pub local_id: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Remote account endpoints
#[allow(async_fn_in_trait)]
pub trait AccountApi {
    async fn fetch_user_info(&self, access_token: &str) -> Result<UserInfo>;

    /// Check the token; Ok(false) means the provider rejected it
    async fn validate_token(&self, access_token: &str) -> Result<bool>;

    async fn exchange_for_identity_token(&self, access_token: &str) -> Result<IdentityToken>;

    /// Create or refresh the user's profile document
    async fn record_login(&self, session: &AuthSession, now_ms: i64) -> Result<()>;
}

pub struct AuthManager<'a, S, I, A> {
    store: &'a S,
    identity: &'a I,
    accounts: &'a A,
}

impl<'a, S, I, A> AuthManager<'a, S, I, A>
where
    S: KeyValueStore,
    I: IdentityHost,
    A: AccountApi,
{
    pub fn new(store: &'a S, identity: &'a I, accounts: &'a A) -> Self {
        AuthManager {
            store,
            identity,
            accounts,
        }
    }

    /// Stored session, without contacting any provider
    pub async fn current_session(&self) -> Result<Option<AuthSession>> {
        let mut record = self
            .store
            .get(&[AUTH_USER_KEY, GOOGLE_TOKEN_KEY, FIREBASE_TOKEN_KEY])
            .await?;

        let user: Option<AuthUser> = record
            .remove(AUTH_USER_KEY)
            .and_then(|value| decode_or_default(AUTH_USER_KEY, value));
        let google_token = record
            .remove(GOOGLE_TOKEN_KEY)
            .and_then(|value| value.as_str().map(str::to_string));
        let firebase_token = record
            .remove(FIREBASE_TOKEN_KEY)
            .and_then(|value| value.as_str().map(str::to_string));

        Ok(match (user, google_token, firebase_token) {
            (Some(user), Some(google_token), Some(firebase_token)) => Some(AuthSession {
                user,
                google_token,
                firebase_token,
            }),
            _ => None,
        })
    }

    /// Load the stored session, check the Google token is still accepted and
    /// trade it for a fresh Firebase ID token
    ///
    /// Firebase ID tokens expire after an hour, so the stored one is never
    /// reused across browser sessions. A rejected token signs the user out. If
    /// the provider cannot be reached the stored session is kept and the next
    /// cloud call gets another chance to refresh it.
    pub async fn restore(&self) -> Result<Option<AuthSession>> {
        let Some(session) = self.current_session().await? else {
            return Ok(None);
        };

        match self.accounts.validate_token(&session.google_token).await {
            Ok(true) => {}
            Ok(false) => {
                log::info!("Stored token was rejected, signing out");
                self.sign_out(&session).await?;
                return Ok(None);
            }
            Err(e) => {
                log::warn!("Could not validate stored token: {}", e);
                return Ok(Some(session));
            }
        }

        match self.refresh_identity(&session).await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(e) if e.is_unauthorized() => {
                log::info!("Token exchange was refused, signing out");
                self.sign_out(&session).await?;
                Ok(None)
            }
            Err(e) => {
                log::warn!("Could not refresh Firebase token: {}", e);
                Ok(Some(session))
            }
        }
    }

    /// Exchange the Google token for a new Firebase ID token and store it
    ///
    /// chrome.identity is asked for its cached token first since it renews
    /// expired access tokens silently.
    pub async fn refresh_identity(&self, session: &AuthSession) -> Result<AuthSession> {
        let google_token = match self.identity.get_auth_token(false).await {
            Ok(token) if !token.is_empty() => token,
            _ => session.google_token.clone(),
        };
        let identity = self.accounts.exchange_for_identity_token(&google_token).await?;

        let fresh = AuthSession {
            user: AuthUser {
                uid: identity.local_id,
                ..session.user.clone()
            },
            google_token,
            firebase_token: identity.id_token,
        };
        self.persist(&fresh).await?;
        log::debug!("Refreshed Firebase token for {}", fresh.user.email);
        Ok(fresh)
    }

    /// Run a cloud call, refreshing the Firebase token once if it is refused
    ///
    /// A second refusal, or a refused exchange, signs the user out and the
    /// `Unauthorized` error is returned.
    pub async fn authorized<T, F>(&self, session: &AuthSession, op: F) -> Result<T>
    where
        F: AsyncFn(&AuthSession) -> Result<T>,
    {
        match op(session).await {
            Err(e) if e.is_unauthorized() => {}
            other => return other,
        }

        log::info!("Firebase token was refused, refreshing");
        let fresh = match self.refresh_identity(session).await {
            Ok(fresh) => fresh,
            Err(e) => {
                if e.is_unauthorized() {
                    self.sign_out(session).await?;
                }
                return Err(e);
            }
        };

        let result = op(&fresh).await;
        if matches!(&result, Err(e) if e.is_unauthorized()) {
            log::info!("Refreshed token was refused too, signing out");
            self.sign_out(&fresh).await?;
        }
        result
    }

    pub async fn sign_in<C: Clock>(&self, clock: &C) -> Result<AuthSession> {
        let google_token = self.identity.get_auth_token(true).await?;
        if google_token.is_empty() {
            return Err(ExtensionError::Identity("Failed to get auth token".to_string()));
        }

        let info = self.accounts.fetch_user_info(&google_token).await?;
        let identity = self.accounts.exchange_for_identity_token(&google_token).await?;

        let session = AuthSession {
            user: AuthUser {
                uid: identity.local_id,
                email: info.email,
                display_name: info.name,
                photo_url: info.picture,
            },
            google_token,
            firebase_token: identity.id_token,
        };

        self.persist(&session).await?;

        if let Err(e) = self.accounts.record_login(&session, clock.now_ms()).await {
            log::error!("Error creating user document: {}", e);
        }

        log::info!("Signed in: {}", session.user.email);
        Ok(session)
    }

    pub async fn sign_out(&self, session: &AuthSession) -> Result<()> {
        if let Err(e) = self.identity.remove_cached_token(&session.google_token).await {
            log::warn!("Failed to drop cached token: {}", e);
        }

        self.store
            .remove(&[AUTH_USER_KEY, GOOGLE_TOKEN_KEY, FIREBASE_TOKEN_KEY])
            .await?;
        log::info!("Signed out");
        Ok(())
    }

    async fn persist(&self, session: &AuthSession) -> Result<()> {
        let mut record = Map::new();
        record.insert(AUTH_USER_KEY.to_string(), serde_json::to_value(&session.user)?);
        record.insert(GOOGLE_TOKEN_KEY.to_string(), json!(session.google_token));
        record.insert(FIREBASE_TOKEN_KEY.to_string(), json!(session.firebase_token));
        self.store.set(record).await
    }
}
