use thiserror::Error;

#[derive(Error, Debug)]
pub enum SortError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Invalid category '{name}': {reason}")]
    InvalidCategory { name: String, reason: String },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Unknown enchantment: {0}")]
    UnknownEnchantment(String),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Include cycle: {}", .path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SortError {
    pub fn invalid_category(name: &str, reason: impl Into<String>) -> Self {
        SortError::InvalidCategory {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SortError>;
