use thiserror::Error;

/// Error type for signing key provisioning and loading.
#[derive(Debug, Clone, Error)]
pub enum KeyError {
    #[error("Failed to generate key pair: {0}")]
    GenerationFailed(String),

    #[error("Failed to write key material: {0}")]
    WriteFailed(String),

    #[error("Key material unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),
}
