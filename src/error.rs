use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredgenError {
    #[error("Template invalid: {0}")]
    TemplateInvalid(String),

    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    #[error("Template body is not valid JSON after rendering (line {line}, column {column}): {message}")]
    TemplateRenderFailure {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Rendered body must be a JSON object, got {0}")]
    BodyNotObject(&'static str),

    #[error("Template file not found: {0}")]
    TemplateNotFound(String),

    #[error("Preset '{0}' not found")]
    PresetNotFound(String),

    #[error("Duplicate template key: {0}")]
    DuplicateTemplateKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CredgenError {
    /// Wraps a JSON diagnostic raised while parsing an interpolated body.
    pub fn render_failure(err: serde_json::Error) -> Self {
        CredgenError::TemplateRenderFailure {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CredgenError>;
