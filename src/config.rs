/// Extension constants and the Firebase project configuration
use serde::Deserialize;

use crate::error::{ExtensionError, Result};

pub const SWEEP_ALARM_NAME: &str = "checkInactiveTabs";
pub const SWEEP_PERIOD_MINUTES: f64 = 1.0;
pub const OPEN_FULL_PAGE_COMMAND: &str = "open-full-page";
pub const NEW_TAB_PAGE: &str = "newtab.html";

const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";
const IDENTITY_TOOLKIT_API: &str = "https://identitytoolkit.googleapis.com/v1";

/// Contents of the packaged `firebase-config.json`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    #[serde(default)]
    pub auth_domain: Option<String>,
    #[serde(default)]
    pub storage_bucket: Option<String>,
    #[serde(default)]
    pub messaging_sender_id: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
}

impl FirebaseConfig {
    /// Parse and validate; the example file's placeholders are rejected
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let config: FirebaseConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [("apiKey", &self.api_key), ("projectId", &self.project_id)] {
            if value.trim().is_empty() {
                return Err(ExtensionError::Config(format!("{} is empty", field)));
            }
            if value.starts_with("YOUR_") {
                return Err(ExtensionError::Config(format!("{} is still a placeholder", field)));
            }
        }
        Ok(())
    }

    pub fn firestore_base_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            FIRESTORE_API, self.project_id
        )
    }

    pub fn sign_in_with_idp_url(&self) -> String {
        format!("{}/accounts:signInWithIdp?key={}", IDENTITY_TOOLKIT_API, self.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_config() {
        let config = FirebaseConfig::from_json(json!({
            "apiKey": "AIzaTest",
            "projectId": "ictrl-demo",
            "authDomain": "ictrl-demo.firebaseapp.com",
        }))
        .unwrap();

        assert_eq!(
            config.firestore_base_url(),
            "https://firestore.googleapis.com/v1/projects/ictrl-demo/databases/(default)/documents"
        );
        assert_eq!(
            config.sign_in_with_idp_url(),
            "https://identitytoolkit.googleapis.com/v1/accounts:signInWithIdp?key=AIzaTest"
        );
        assert_eq!(config.app_id, None);
    }

    #[test]
    fn test_placeholder_config_is_rejected() {
        let err = FirebaseConfig::from_json(json!({
            "apiKey": "YOUR_FIREBASE_API_KEY",
            "projectId": "YOUR_PROJECT_ID",
        }))
        .unwrap_err();

        assert!(matches!(err, ExtensionError::Config(_)));
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        assert!(FirebaseConfig::from_json(json!({"apiKey": "k"})).is_err());
        assert!(FirebaseConfig::from_json(json!({"apiKey": " ", "projectId": "p"})).is_err());
    }
}
