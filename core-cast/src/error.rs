use bridge_traits::{BridgeError, ProviderStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a Cast SDK status code.
///
/// Hosts map these to their own user-facing strings; the core never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorCategory {
    AuthenticationFailed,
    InvalidRequest,
    Cancelled,
    NotAllowed,
    ApplicationNotFound,
    ApplicationNotRunning,
    MessageTooLarge,
    SendBufferFull,
    Network,
    Internal,
    Timeout,
    Unknown,
}

impl ProviderErrorCategory {
    /// Classify a `CastStatusCodes` / `CommonStatusCodes` value.
    pub fn from_code(code: i32) -> Self {
        match code {
            2000 => Self::AuthenticationFailed,
            2001 => Self::InvalidRequest,
            2002 => Self::Cancelled,
            2003 => Self::NotAllowed,
            2004 | 2475 => Self::ApplicationNotFound,
            2005 => Self::ApplicationNotRunning,
            2006 => Self::MessageTooLarge,
            2007 => Self::SendBufferFull,
            7 => Self::Network,
            8 => Self::Internal,
            15 => Self::Timeout,
            _ => Self::Unknown,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CastError {
    #[error("No active cast session")]
    NoActiveSession,

    #[error("Provider rejected the request with code {code} ({category:?}){}", detail(.description))]
    Provider {
        code: i32,
        category: ProviderErrorCategory,
        description: Option<String>,
    },

    #[error("Request was superseded by a newer request or session")]
    SessionReplaced,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Host bridge error: {0}")]
    Bridge(String),
}

impl CastError {
    /// Wrap a failed provider status.
    pub fn provider(status: ProviderStatus) -> Self {
        CastError::Provider {
            code: status.code,
            category: ProviderErrorCategory::from_code(status.code),
            description: status.description,
        }
    }

    /// Category of a provider rejection, `None` for core-side errors.
    pub fn category(&self) -> Option<ProviderErrorCategory> {
        match self {
            CastError::Provider { category, .. } => Some(*category),
            _ => None,
        }
    }
}

impl From<BridgeError> for CastError {
    fn from(err: BridgeError) -> Self {
        CastError::Bridge(err.to_string())
    }
}

fn detail(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, CastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(
            ProviderErrorCategory::from_code(2475),
            ProviderErrorCategory::ApplicationNotFound
        );
        assert_eq!(
            ProviderErrorCategory::from_code(2004),
            ProviderErrorCategory::ApplicationNotFound
        );
        assert_eq!(
            ProviderErrorCategory::from_code(15),
            ProviderErrorCategory::Timeout
        );
        assert_eq!(
            ProviderErrorCategory::from_code(2100),
            ProviderErrorCategory::Unknown
        );
    }

    #[test]
    fn test_provider_error_keeps_raw_status() {
        let err = CastError::provider(ProviderStatus::failure(2007, "buffer full"));

        assert_eq!(err.category(), Some(ProviderErrorCategory::SendBufferFull));
        assert_eq!(
            err.to_string(),
            "Provider rejected the request with code 2007 (SendBufferFull): buffer full"
        );
        assert_eq!(CastError::NoActiveSession.category(), None);
    }

    #[test]
    fn test_provider_error_without_description() {
        let err = CastError::provider(ProviderStatus {
            code: 7,
            description: None,
        });

        assert_eq!(
            err.to_string(),
            "Provider rejected the request with code 7 (Network)"
        );
    }
}
