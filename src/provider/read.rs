use std::fs;
use std::path::Path;

use crate::error::{Result, SchematicError};

pub(super) fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| SchematicError::File {
        path: path.to_path_buf(),
        source,
    })
}

pub(super) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = read_text(path)?;
    serde_json::from_str(&raw).map_err(|source| SchematicError::Json {
        path: path.to_path_buf(),
        source,
    })
}
