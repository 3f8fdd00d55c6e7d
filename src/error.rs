//! Error types for the schematic engine and its file-backed data provider.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchematicError {
    /// A component violates the shape the column arithmetic depends on.
    #[error("invalid component data at index {index}: {message}")]
    InvalidComponentData { index: usize, message: String },

    /// The requested bin window is empty or misses the loaded data entirely.
    #[error("bin window [{begin}, {end}] is out of range: {message}")]
    LayoutRange {
        begin: i64,
        end: i64,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("chunk error: {message}")]
    Chunk { message: String },
}

pub type Result<T> = std::result::Result<T, SchematicError>;

impl SchematicError {
    pub fn invalid_component(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidComponentData {
            index,
            message: message.into(),
        }
    }

    pub fn layout_range(begin: i64, end: i64, message: impl Into<String>) -> Self {
        Self::LayoutRange {
            begin,
            end,
            message: message.into(),
        }
    }

    pub fn chunk(message: impl Into<String>) -> Self {
        Self::Chunk {
            message: message.into(),
        }
    }
}
