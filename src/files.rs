//! Small filesystem helpers: base64 file encoding, random file names,
//! existence checks and self-cleaning temporary directories.

use std::io;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::prelude::BASE64_STANDARD;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from filesystem helpers.
#[derive(Debug, Error)]
pub enum FileError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Existence could not be determined (permissions, broken mount, ...).
    #[error("error checking if path exists: {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The path does not exist.
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    /// A temporary directory could not be created.
    #[error("failed to create temp dir with prefix '{prefix}': {source}")]
    CreateTempDir {
        prefix: String,
        #[source]
        source: io::Error,
    },

    /// A temporary directory could not be removed.
    #[error("failed to remove temp dir {path}: {source}")]
    RemoveTempDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    fn read(path: &Path, source: io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    fn stat(path: &Path, source: io::Error) -> Self {
        Self::Stat {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns true for [`FileError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Reads the whole file and returns its contents as standard base64.
///
/// # Errors
///
/// Returns [`FileError::Read`] if the file cannot be opened or read.
pub fn file_to_base64(path: impl AsRef<Path>) -> Result<String, FileError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| FileError::read(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Encoded file as base64");
    Ok(BASE64_STANDARD.encode(bytes))
}

/// Returns a fresh UUID v4 followed by `extension` (e.g. `".png"`).
///
/// The extension is appended as given, so include the dot.
#[must_use]
pub fn random_filename(extension: &str) -> String {
    format!("{}{extension}", uuid::Uuid::new_v4())
}

/// Returns whether `path` exists. A missing path is `Ok(false)`.
///
/// # Errors
///
/// Returns [`FileError::Stat`] for any failure other than "not found".
pub fn path_exists(path: impl AsRef<Path>) -> Result<bool, FileError> {
    let path = path.as_ref();
    match std::fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FileError::stat(path, e)),
    }
}

/// Like [`path_exists`], but a missing path is an error.
///
/// # Errors
///
/// Returns [`FileError::NotFound`] if the path does not exist, or
/// [`FileError::Stat`] if the check itself failed.
pub fn validate_path_exists(path: impl AsRef<Path>) -> Result<(), FileError> {
    let path = path.as_ref();
    if path_exists(path)? {
        Ok(())
    } else {
        Err(FileError::NotFound {
            path: path.to_path_buf(),
        })
    }
}

/// A directory under the system temp dir, removed by [`cleanup`](Self::cleanup)
/// or, best-effort, on drop.
#[derive(Debug)]
pub struct TempDir {
    inner: tempfile::TempDir,
}

impl TempDir {
    /// Path of the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Removes the directory and everything in it.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::RemoveTempDir`] if removal failed.
    pub fn cleanup(self) -> Result<(), FileError> {
        let path = self.inner.path().to_path_buf();
        self.inner.close().map_err(|source| {
            warn!(path = %path.display(), error = %source, "Failed to remove temp dir");
            FileError::RemoveTempDir { path, source }
        })
    }
}

impl AsRef<Path> for TempDir {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

/// Creates a new uniquely named directory whose name starts with `prefix`.
///
/// # Errors
///
/// Returns [`FileError::CreateTempDir`] if the directory cannot be created.
pub fn create_temp_dir(prefix: &str) -> Result<TempDir, FileError> {
    let inner = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .map_err(|source| FileError::CreateTempDir {
            prefix: prefix.to_string(),
            source,
        })?;
    debug!(path = %inner.path().display(), "Created temp dir");
    Ok(TempDir { inner })
}

/// Formats already-encoded base64 data as a `data:` URI.
#[must_use]
pub fn base64_data_uri(base64_data: &str, content_type: &str) -> String {
    format!("data:{content_type};base64,{base64_data}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_file_to_base64_encodes_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello world").unwrap();

        assert_eq!(file_to_base64(&path).unwrap(), "aGVsbG8gd29ybGQ=");
    }

    #[test]
    fn test_file_to_base64_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        assert_eq!(file_to_base64(&path).unwrap(), "");
    }

    #[test]
    fn test_file_to_base64_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bin");

        let err = file_to_base64(&path).unwrap_err();
        assert!(matches!(err, FileError::Read { .. }));
        assert!(err.to_string().contains("missing.bin"));
    }

    #[test]
    fn test_random_filename_has_uuid_and_extension() {
        let name = random_filename(".png");
        let (stem, ext) = name.split_at(name.len() - 4);

        assert_eq!(ext, ".png");
        assert!(uuid::Uuid::parse_str(stem).is_ok(), "got: {name}");
        assert_ne!(random_filename(".png"), name);
    }

    #[test]
    fn test_random_filename_without_extension() {
        let name = random_filename("");
        assert_eq!(name.len(), 36);
    }

    #[test]
    fn test_path_exists() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("present");
        std::fs::write(&file, b"x").unwrap();

        assert!(path_exists(&file).unwrap());
        assert!(path_exists(dir.path()).unwrap());
        assert!(!path_exists(dir.path().join("absent")).unwrap());
    }

    #[test]
    fn test_validate_path_exists() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_path_exists(dir.path()).is_ok());

        let err = validate_path_exists(dir.path().join("nope")).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_create_temp_dir_and_cleanup() {
        let temp = create_temp_dir("utilkit-test-").unwrap();
        let path = temp.path().to_path_buf();

        assert!(path.is_dir());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("utilkit-test-"), "got: {name}");

        std::fs::write(path.join("inner.txt"), b"data").unwrap();
        temp.cleanup().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_dir_removed_on_drop() {
        let path = {
            let temp = create_temp_dir("utilkit-drop-").unwrap();
            temp.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_base64_data_uri() {
        assert_eq!(
            base64_data_uri("aGVsbG8=", "image/png"),
            "data:image/png;base64,aGVsbG8="
        );
    }
}
