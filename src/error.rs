/// Error type shared by the background worker, sync and auth code
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtensionError {
    /// A chrome.* call rejected or the bridge returned something unusable
    #[error("host call failed: {0}")]
    Host(String),

    #[error("malformed value: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned {status}: {message}")]
    Remote { status: u16, message: String },

    /// The remote rejected the credential (401/403)
    #[error("credential rejected")]
    Unauthorized,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("identity error: {0}")]
    Identity(String),
}

impl ExtensionError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ExtensionError::Unauthorized)
    }
}

pub type Result<T> = std::result::Result<T, ExtensionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ExtensionError::Remote {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "remote returned 500: boom");
        assert_eq!(ExtensionError::Unauthorized.to_string(), "credential rejected");
    }

    #[test]
    fn test_serde_error_converts() {
        let parse: std::result::Result<i32, _> = serde_json::from_str("nope");
        let err: ExtensionError = parse.unwrap_err().into();
        assert!(matches!(err, ExtensionError::Serde(_)));
        assert!(!err.is_unauthorized());
    }
}
