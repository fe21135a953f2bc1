//! Construction-time failures.
//!
//! Only building an [`Engine`](crate::Engine) can fail. Classifying a line never
//! does: a catalog without a matching pattern reports the family
//! [`OTHER`](crate::OTHER).

use crate::Category;
use std::path::PathBuf;

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Why a configuration could not be turned into an engine.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{category}[{index}]: missing `regex`")]
    MissingRegex { category: Category, index: usize },

    #[error("{category}[{index}]: `{field}` must be a scalar value")]
    InvalidValue { category: Category, index: usize, field: String },

    #[error("{category}[{index}]: invalid regex: {source}")]
    InvalidRegex {
        category: Category,
        index: usize,
        #[source]
        source: regex::Error,
    },
}

impl ConfigError {
    /// Category of the offending rule, when the error points at one.
    pub fn category(&self) -> Option<Category> {
        match self {
            ConfigError::MissingRegex { category, .. }
            | ConfigError::InvalidValue { category, .. }
            | ConfigError::InvalidRegex { category, .. } => Some(*category),
            ConfigError::Io { .. } | ConfigError::Parse(_) => None,
        }
    }
}
