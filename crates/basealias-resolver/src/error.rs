//! Client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Core(#[from] basealias_core::Error),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned status {status}: {message}")]
    Gateway { status: u16, message: String },

    #[error("RPC error: {0}")]
    Rpc(String),
}

impl From<basealias_verifier::VerifyError> for ClientError {
    fn from(err: basealias_verifier::VerifyError) -> Self {
        ClientError::Core(err.into())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
