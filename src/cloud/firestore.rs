/// Firestore REST documents: typed value encoding and a small document client
use std::collections::BTreeMap;

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::clock::{Clock, iso_timestamp};
use crate::config::FirebaseConfig;
use crate::error::{ExtensionError, Result};
use crate::settings::{DEFAULT_TIMEOUT_MINUTES, Settings};
use crate::sync::RemoteStore;
use crate::tab_data::Shortcut;

/// A Firestore typed value, e.g. `{"stringValue": "abc"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldValue {
    NullValue(()),
    BooleanValue(bool),
    /// int64 travels as a decimal string
    #[serde(with = "int64_string")]
    IntegerValue(i64),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

pub type Fields = BTreeMap<String, FieldValue>;

impl FieldValue {
    pub fn string(value: impl Into<String>) -> Self {
        FieldValue::StringValue(value.into())
    }

    pub fn array(values: Vec<FieldValue>) -> Self {
        FieldValue::ArrayValue(ArrayValue { values })
    }

    pub fn map(fields: Fields) -> Self {
        FieldValue::MapValue(MapValue { fields })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::StringValue(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::BooleanValue(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::IntegerValue(i) => Some(*i),
            FieldValue::DoubleValue(d) => Some(*d as i64),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::ArrayValue(array) => Some(&array.values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            FieldValue::MapValue(map) => Some(&map.fields),
            _ => None,
        }
    }
}

mod int64_string {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text.parse().map_err(D::Error::custom),
            Raw::Number(n) => Ok(n),
        }
    }
}

/// A document as returned by GET; field values are decoded on access so a
/// field type this crate doesn't model only hides that one field
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Option<BTreeMap<String, Value>>,
}

impl Document {
    pub fn has_fields(&self) -> bool {
        self.fields.is_some()
    }

    pub fn field(&self, name: &str) -> Option<FieldValue> {
        let raw = self.fields.as_ref()?.get(name)?;
        serde_json::from_value(raw.clone()).ok()
    }
}

pub fn shortcuts_path(uid: &str) -> String {
    format!("users/{}/data/shortcuts", uid)
}

pub fn settings_path(uid: &str) -> String {
    format!("users/{}/data/settings", uid)
}

pub fn user_path(uid: &str) -> String {
    format!("users/{}", uid)
}

pub fn encode_shortcuts(shortcuts: &[Shortcut], updated_at: &str) -> Fields {
    let items = shortcuts
        .iter()
        .map(|s| {
            FieldValue::map(Fields::from([
                ("id".to_string(), FieldValue::string(&s.id)),
                ("name".to_string(), FieldValue::string(&s.name)),
                ("url".to_string(), FieldValue::string(&s.url)),
            ]))
        })
        .collect();

    Fields::from([
        ("items".to_string(), FieldValue::array(items)),
        ("updatedAt".to_string(), FieldValue::TimestampValue(updated_at.to_string())),
    ])
}

/// Items missing id, name or url are skipped
pub fn decode_shortcuts(document: &Document) -> Vec<Shortcut> {
    let Some(items) = document.field("items") else {
        return Vec::new();
    };

    items
        .as_array()
        .unwrap_or_default()
        .iter()
        .filter_map(|item| {
            let fields = item.as_map()?;
            let text = |name: &str| fields.get(name).and_then(FieldValue::as_str).map(str::to_string);
            let shortcut = Shortcut {
                id: text("id")?,
                name: text("name")?,
                url: text("url")?,
            };
            Some(shortcut)
        })
        .collect()
}

pub fn encode_settings(settings: &Settings, updated_at: &str) -> Fields {
    let whitelist = settings
        .whitelist
        .iter()
        .map(FieldValue::string)
        .collect();

    Fields::from([
        ("ramSaverEnabled".to_string(), FieldValue::BooleanValue(settings.enabled)),
        ("inactiveTimeout".to_string(), FieldValue::IntegerValue(i64::from(settings.timeout_minutes))),
        ("whitelistedDomains".to_string(), FieldValue::array(whitelist)),
        ("updatedAt".to_string(), FieldValue::TimestampValue(updated_at.to_string())),
    ])
}

/// None when the document has no fields at all; individual gaps take defaults
pub fn decode_settings(document: &Document) -> Option<Settings> {
    if !document.has_fields() {
        return None;
    }

    let defaults = Settings::default();
    let enabled = document
        .field("ramSaverEnabled")
        .and_then(|v| v.as_bool())
        .unwrap_or(defaults.enabled);
    let timeout_minutes = document
        .field("inactiveTimeout")
        .and_then(|v| v.as_i64())
        .filter(|minutes| *minutes >= 1)
        .map(|minutes| u32::try_from(minutes).unwrap_or(u32::MAX))
        .unwrap_or(DEFAULT_TIMEOUT_MINUTES);
    let whitelist = document
        .field("whitelistedDomains")
        .and_then(|v| {
            v.as_array()
                .map(|values| {
                    values
                        .iter()
                        .filter_map(|d| d.as_str().map(str::to_string))
                        .collect::<Vec<String>>()
                })
        })
        .unwrap_or(defaults.whitelist);

    Some(Settings {
        enabled,
        timeout_minutes,
        whitelist,
    })
}

pub fn encode_new_user(user: &AuthUser, now: &str) -> Fields {
    Fields::from([
        ("email".to_string(), FieldValue::string(&user.email)),
        ("displayName".to_string(), FieldValue::string(user.display_name.clone().unwrap_or_default())),
        ("photoURL".to_string(), FieldValue::string(user.photo_url.clone().unwrap_or_default())),
        ("createdAt".to_string(), FieldValue::TimestampValue(now.to_string())),
        ("lastLogin".to_string(), FieldValue::TimestampValue(now.to_string())),
    ])
}

#[derive(Serialize)]
struct PatchBody<'a> {
    fields: &'a Fields,
}

/// Document reads and writes for one signed-in user
pub struct FirestoreClient {
    http: Client,
    base_url: String,
    id_token: String,
}

impl FirestoreClient {
    pub fn new(config: &FirebaseConfig, id_token: &str) -> Self {
        FirestoreClient {
            http: Client::new(),
            base_url: config.firestore_base_url(),
            id_token: id_token.to_string(),
        }
    }

    fn document_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Ok(None) when the document does not exist
    pub async fn get_document(&self, path: &str) -> Result<Option<Document>> {
        let response = self
            .http
            .get(self.document_url(path))
            .bearer_auth(&self.id_token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;
        Ok(Some(response.json::<Document>().await?))
    }

    /// PATCH the document, creating it if needed; with a non-empty mask only
    /// those fields are touched
    pub async fn patch_document(&self, path: &str, fields: &Fields, update_mask: &[&str]) -> Result<()> {
        let query: Vec<(&str, &str)> = update_mask
            .iter()
            .map(|field| ("updateMask.fieldPaths", *field))
            .collect();

        let response = self
            .http
            .patch(self.document_url(path))
            .query(&query)
            .bearer_auth(&self.id_token)
            .json(&PatchBody { fields })
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    /// Create the profile document on first login, otherwise bump lastLogin
    pub async fn upsert_user(&self, user: &AuthUser, now: &str) -> Result<()> {
        let path = user_path(&user.uid);
        match self.get_document(&path).await? {
            None => {
                self.patch_document(&path, &encode_new_user(user, now), &[]).await?;
                log::info!("Created user document");
            }
            Some(_) => {
                let fields = Fields::from([(
                    "lastLogin".to_string(),
                    FieldValue::TimestampValue(now.to_string()),
                )]);
                self.patch_document(&path, &fields, &["lastLogin"]).await?;
            }
        }
        Ok(())
    }
}

/// Map an HTTP status onto the error taxonomy
pub fn status_error(status: u16, message: String) -> Option<ExtensionError> {
    match status {
        200..=299 => None,
        401 | 403 => Some(ExtensionError::Unauthorized),
        _ => Some(ExtensionError::Remote { status, message }),
    }
}

pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status().as_u16();
    if response.status().is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(status_error(status, message).unwrap_or(ExtensionError::Remote {
        status,
        message: String::new(),
    }))
}

/// The signed-in user's shortcuts and settings documents
pub struct FirestoreRemote<C> {
    client: FirestoreClient,
    uid: String,
    clock: C,
}

impl<C: Clock> FirestoreRemote<C> {
    pub fn new(config: &FirebaseConfig, user: &AuthUser, id_token: &str, clock: C) -> Self {
        FirestoreRemote {
            client: FirestoreClient::new(config, id_token),
            uid: user.uid.clone(),
            clock,
        }
    }

    fn now(&self) -> String {
        iso_timestamp(self.clock.now_ms())
    }
}

impl<C: Clock> RemoteStore for FirestoreRemote<C> {
    async fn load_shortcuts(&self) -> Result<Vec<Shortcut>> {
        let document = self.client.get_document(&shortcuts_path(&self.uid)).await?;
        let shortcuts = document.as_ref().map(decode_shortcuts).unwrap_or_default();
        log::info!("Loaded {} shortcuts from cloud", shortcuts.len());
        Ok(shortcuts)
    }

    async fn load_settings(&self) -> Result<Option<Settings>> {
        let document = self.client.get_document(&settings_path(&self.uid)).await?;
        Ok(document.as_ref().and_then(decode_settings))
    }

    async fn save_shortcuts(&self, shortcuts: &[Shortcut]) -> Result<()> {
        let fields = encode_shortcuts(shortcuts, &self.now());
        self.client.patch_document(&shortcuts_path(&self.uid), &fields, &[]).await?;
        log::info!("Shortcuts saved to cloud");
        Ok(())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let fields = encode_settings(settings, &self.now());
        self.client.patch_document(&settings_path(&self.uid), &fields, &[]).await?;
        log::info!("Settings saved to cloud");
        Ok(())
    }
}
