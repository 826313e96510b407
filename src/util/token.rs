//! Auth token persistence between runs

use std::io;
use std::path::Path;

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Failed to write token to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Read a previously saved token. Missing or empty files yield `None`.
pub fn load(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(raw) => {
            let token = raw.trim();
            (!token.is_empty()).then(|| token.to_string())
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No saved token");
            None
        }
    }
}

pub fn save(path: &Path, token: &str) -> Result<(), TokenError> {
    std::fs::write(path, token).map_err(|source| TokenError::Write {
        path: path.display().to_string(),
        source,
    })
}
