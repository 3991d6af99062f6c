use thiserror::Error;

pub type TagResult<T> = Result<T, TagError>;

#[derive(Error, Debug)]
pub enum TagError {
    #[error("Unknown condition plugin: {0}")]
    UnknownCondition(String),

    #[error("Unknown event plugin: {0}")]
    UnknownEvent(String),

    #[error("Invalid container configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid event definition: {0}")]
    InvalidEventDefinition(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
