//! Reading and writing documents on disk

use crate::codec;
use crate::error::{DocumentError, Result};
use crate::model::SceneDocument;
use std::fs;
use std::path::Path;
use tracing::info;

/// Load a document from `path`.
///
/// Nothing is returned unless the whole file parses and validates.
pub fn load(path: impl AsRef<Path>) -> Result<SceneDocument> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document = codec::from_json_slice(&bytes)?;
    info!(path = %path.display(), frames = document.len(), "loaded scene document");
    Ok(document)
}

/// Write `document` to `path`, replacing any previous content
pub fn save(document: &SceneDocument, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = codec::to_json_vec(document)?;
    fs::write(path, bytes).map_err(|source| DocumentError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), frames = document.len(), "saved scene document");
    Ok(())
}
