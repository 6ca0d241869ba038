//! Input and output path checks for single-model export

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

use kmf_common::formats::KMF_EXTENSION;

use crate::mesh::SourceFormat;

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("input path '{}' does not exist", .0.display())]
    InputMissing(PathBuf),

    #[error("input path '{}' is not a regular file", .0.display())]
    InputNotFile(PathBuf),

    #[error("input path '{}' extension '{ext}' is not allowed (use .gltf, .glb or .obj)", .path.display())]
    InputExtension { path: PathBuf, ext: String },

    #[error("insufficient read permissions for input path '{}'", .0.display())]
    InputUnreadable(PathBuf),

    #[error("output path '{}' already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("output path '{}' extension '{ext}' is not allowed (use .{KMF_EXTENSION})", .path.display())]
    OutputExtension { path: PathBuf, ext: String },

    #[error("output directory '{}' does not exist", .0.display())]
    OutputParentMissing(PathBuf),

    #[error("insufficient write permissions for output directory '{}'", .0.display())]
    OutputUnwritable(PathBuf),

    #[error("failed to inspect '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(unix)]
fn mode_allows(metadata: &Metadata, mask: u32) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & mask != 0
}

#[cfg(not(unix))]
fn mode_allows(metadata: &Metadata, mask: u32) -> bool {
    // Only the read-only attribute is available; reading is always allowed
    mask & 0o222 == 0 || !metadata.permissions().readonly()
}

/// Check that `input` is an existing, readable scene file of a supported format
pub fn validate_input(input: &Path) -> Result<SourceFormat, PathError> {
    let metadata = match std::fs::metadata(input) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(PathError::InputMissing(input.to_path_buf()));
        }
        Err(source) => {
            return Err(PathError::Io {
                path: input.to_path_buf(),
                source,
            });
        }
    };

    if !metadata.is_file() {
        return Err(PathError::InputNotFile(input.to_path_buf()));
    }

    let Some(format) = SourceFormat::from_path(input) else {
        return Err(PathError::InputExtension {
            path: input.to_path_buf(),
            ext: extension_of(input),
        });
    };

    if !mode_allows(&metadata, 0o444) {
        return Err(PathError::InputUnreadable(input.to_path_buf()));
    }

    Ok(format)
}

/// Check that `output` is a new `.kmf` path inside a writable directory
pub fn validate_output(output: &Path) -> Result<(), PathError> {
    // symlink_metadata so a dangling link still counts as existing
    if std::fs::symlink_metadata(output).is_ok() {
        return Err(PathError::OutputExists(output.to_path_buf()));
    }

    let ext_ok = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(KMF_EXTENSION));
    if !ext_ok {
        return Err(PathError::OutputExtension {
            path: output.to_path_buf(),
            ext: extension_of(output),
        });
    }

    let parent = output_dir(output);
    let metadata = match std::fs::metadata(parent) {
        Ok(m) if m.is_dir() => m,
        Ok(_) => return Err(PathError::OutputParentMissing(parent.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(PathError::OutputParentMissing(parent.to_path_buf()));
        }
        Err(source) => {
            return Err(PathError::Io {
                path: parent.to_path_buf(),
                source,
            });
        }
    };

    if !mode_allows(&metadata, 0o222) {
        return Err(PathError::OutputUnwritable(parent.to_path_buf()));
    }

    Ok(())
}

/// Directory an output file lands in; bare file names resolve to the current directory
pub fn output_dir(output: &Path) -> &Path {
    match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
