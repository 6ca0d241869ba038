//! Loading `.kmf` files from disk
//!
//! Access problems are reported before any bytes are decoded, so callers can
//! tell a missing or unreadable file apart from a corrupt one.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::formats::{DecodeError, KMF_EXTENSION, KmfFile, MAX_TOTAL_SIZE, decode};

/// Reasons a `.kmf` file could not be imported
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("not a .{KMF_EXTENSION} file: {0}")]
    InvalidExtension(String),

    #[error("no read permission: {0}")]
    UnauthorizedRead(String),

    #[error("file is locked by another process: {0}")]
    FileLocked(String),

    #[error("file is empty: {0}")]
    FileEmpty(String),

    #[error("failed to read {path}: {source}")]
    UnknownRead {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Read and decode a `.kmf` file
pub fn import_kmf(path: &Path) -> Result<KmfFile, ImportError> {
    let shown = path.display().to_string();

    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ImportError::FileNotFound(shown));
        }
        Err(e) => return Err(open_error(shown, e)),
    };

    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(KMF_EXTENSION));
    if !metadata.is_file() || !has_extension {
        return Err(ImportError::InvalidExtension(shown));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o444 == 0 {
            return Err(ImportError::UnauthorizedRead(shown));
        }
    }

    let bytes = {
        let mut file = File::open(path).map_err(|e| open_error(shown.clone(), e))?;
        let mut bytes = Vec::new();
        // One byte past the limit is enough for the decoder to reject the size
        file.by_ref()
            .take(MAX_TOTAL_SIZE as u64 + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| open_error(shown.clone(), e))?;
        bytes
    };

    if bytes.is_empty() {
        return Err(ImportError::FileEmpty(shown));
    }

    tracing::debug!("Read {} bytes from {}", bytes.len(), shown);
    Ok(decode(&bytes)?)
}

fn open_error(path: String, e: io::Error) -> ImportError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => ImportError::UnauthorizedRead(path),
        io::ErrorKind::ResourceBusy | io::ErrorKind::ExecutableFileBusy => {
            ImportError::FileLocked(path)
        }
        _ => ImportError::UnknownRead { path, source: e },
    }
}
