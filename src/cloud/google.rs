/// Google account endpoints and the Firebase token exchange
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::auth::{AccountApi, AuthSession, IdentityToken, UserInfo};
use crate::clock::iso_timestamp;
use crate::cloud::firestore::{FirestoreClient, check_status};
use crate::config::FirebaseConfig;
use crate::error::Result;

const USER_INFO_URL: &str = "https://www.googleapis.com/oauth2/v1/userinfo?alt=json";
const TOKEN_INFO_URL: &str = "https://www.googleapis.com/oauth2/v1/tokeninfo";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpRequest {
    post_body: String,
    request_uri: &'static str,
    return_idp_credential: bool,
    return_secure_token: bool,
}

impl SignInWithIdpRequest {
    fn google(access_token: &str) -> Self {
        SignInWithIdpRequest {
            post_body: format!("access_token={}&providerId=google.com", access_token),
            request_uri: "http://localhost",
            return_idp_credential: true,
            return_secure_token: true,
        }
    }
}

/// Whether a tokeninfo status means the token itself was refused
fn is_rejected_token(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    )
}

pub struct GoogleAccounts {
    http: Client,
    config: FirebaseConfig,
}

impl GoogleAccounts {
    pub fn new(config: FirebaseConfig) -> Self {
        GoogleAccounts {
            http: Client::new(),
            config,
        }
    }
}

impl AccountApi for GoogleAccounts {
    async fn fetch_user_info(&self, access_token: &str) -> Result<UserInfo> {
        let response = self
            .http
            .get(USER_INFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<UserInfo>().await?)
    }

    async fn validate_token(&self, access_token: &str) -> Result<bool> {
        let response = self
            .http
            .get(TOKEN_INFO_URL)
            .query(&[("access_token", access_token)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if is_rejected_token(status) {
            return Ok(false);
        }
        check_status(response).await.map(|_| true)
    }

    async fn exchange_for_identity_token(&self, access_token: &str) -> Result<IdentityToken> {
        let response = self
            .http
            .post(self.config.sign_in_with_idp_url())
            .json(&SignInWithIdpRequest::google(access_token))
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<IdentityToken>().await?)
    }

    async fn record_login(&self, session: &AuthSession, now_ms: i64) -> Result<()> {
        FirestoreClient::new(&self.config, &session.firebase_token)
            .upsert_user(&session.user, &iso_timestamp(now_ms))
            .await
    }
}
