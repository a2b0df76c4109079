use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubFitError {
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Manifest mismatch: {0}")]
    ManifestMismatch(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SubFitError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse { line, message: message.into() }
    }

    /// Whether the whole run must stop. Manifest problems only abort the apply step.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ManifestMismatch(_))
    }
}

pub type Result<T> = std::result::Result<T, SubFitError>;
