use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweetCatError {
    #[error("Parse failure in {field}: {message}")]
    Parse { field: String, message: String },

    #[error("Lookup failed ({service}): {message}")]
    Lookup { service: String, message: String },

    #[error("No candidates to match against")]
    NoCandidates,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SweetCatError {
    pub fn parse(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn lookup(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lookup {
            service: service.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SweetCatError>;
