use async_trait::async_trait;

use super::types::ErrorCategory;

/// Tagged failure taxonomy for the external vision endpoint. Categories are
/// assigned where the response is parsed, from status codes and structured
/// response fields.
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("invalid API credential: {0}")]
    Credential(String),
    #[error("content blocked by safety filter: {0}")]
    ContentBlocked(String),
    #[error("unsupported image payload: {0}")]
    InvalidImage(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error("API failure: {0}")]
    Api(String),
}

impl ProviderError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProviderError::Credential(_) => ErrorCategory::Credential,
            ProviderError::ContentBlocked(_) => ErrorCategory::ContentBlocked,
            ProviderError::InvalidImage(_) => ErrorCategory::InvalidImage,
            ProviderError::Network(_) | ProviderError::Api(_) => ErrorCategory::Unexpected,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            ProviderError::Credential(message)
            | ProviderError::ContentBlocked(message)
            | ProviderError::InvalidImage(message)
            | ProviderError::Network(message)
            | ProviderError::Api(message) => message,
        }
    }
}

/// Multimodal completion endpoint taking a text prompt plus a base64 JPEG
/// payload and returning free text.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    async fn describe(&self, prompt: &str, jpeg_b64: &str) -> Result<String, ProviderError>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;

    /// Model identifier
    fn model_name(&self) -> &str;
}
