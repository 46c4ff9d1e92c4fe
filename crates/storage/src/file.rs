//! Saving and loading distributions on disk.

use std::fs;
use std::path::Path;

use dicedist_eval::Distribution;

use crate::codec;
use crate::error::StorageError;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `distribution` to `path` as JSON, replacing any existing file.
pub fn save(distribution: &Distribution, path: &Path) -> Result<(), StorageError> {
    let text = codec::to_json(distribution)?;
    fs::write(path, text + "\n").map_err(io_error(path))?;
    tracing::debug!(path = %path.display(), entries = distribution.len(), "saved distribution");
    Ok(())
}

/// Read a distribution previously written by [`save`].
pub fn load(path: &Path) -> Result<Distribution, StorageError> {
    let text = fs::read_to_string(path).map_err(io_error(path))?;
    let distribution = codec::from_json(&text)?;
    tracing::debug!(path = %path.display(), entries = distribution.len(), "loaded distribution");
    Ok(distribution)
}

/// Load every file in order.
pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Distribution>, StorageError> {
    paths.iter().map(|p| load(p.as_ref())).collect()
}
