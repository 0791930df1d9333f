use bridge_traits::BridgeError;
use core_cast::CastError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service not initialized: call initialize() first")]
    NotInitialized,

    #[error(transparent)]
    Cast(#[from] CastError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Host bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl ServiceError {
    /// Provider status code when the receiver or SDK rejected the call.
    pub fn provider_code(&self) -> Option<i32> {
        match self {
            ServiceError::Cast(CastError::Provider { code, .. }) => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::ProviderStatus;

    #[test]
    fn test_provider_code() {
        let err: ServiceError =
            CastError::provider(ProviderStatus::failure(2475, "no such app")).into();
        assert_eq!(err.provider_code(), Some(2475));
        assert_eq!(ServiceError::NotInitialized.provider_code(), None);
    }

    #[test]
    fn test_cast_errors_render_transparently() {
        let err: ServiceError = CastError::NoActiveSession.into();
        assert_eq!(err.to_string(), "No active cast session");
    }
}
