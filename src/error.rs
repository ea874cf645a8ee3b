use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnricherError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed resource identifier: {0}")]
    MalformedIdentifier(String),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Missing field in response: {0}")]
    MissingField(&'static str),

    #[error("Resource store error: {0}")]
    Store(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl EnricherError {
    /// Errors caused by the inbound message itself; redelivery cannot fix them.
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            Self::MalformedIdentifier(_) | Self::UnknownResourceType(_) | Self::InvalidPayload(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EnricherError>;
