use models::errors::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("model error: {0}")]
    Model(ModelError),
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation(msg) => Self::Validation(msg),
            other => Self::Model(other),
        }
    }
}

impl ServiceError {
    /// Message to show the client when the request itself was at fault.
    pub fn client_message(&self) -> Option<&str> {
        match self {
            Self::Validation(msg) => Some(msg),
            Self::Model(_) => None,
        }
    }
}
