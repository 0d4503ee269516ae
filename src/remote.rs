//! Publishing source files to a remote archive.
//!
//! The archive is a trait so a document-library client can be plugged in; [`DirectoryArchive`]
//! is the local implementation used for shared folders and tests.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IngestError, IngestResult};

/// A flat, name-addressed file store.
pub trait RemoteArchive {
    /// Whether a file called `name` is already stored.
    fn exists(&self, name: &str) -> IngestResult<bool>;

    /// Store `bytes` as `name`, replacing any previous content.
    fn upload(&self, name: &str, bytes: &[u8]) -> IngestResult<()>;
}

/// Outcome of [`publish_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub remote_name: String,
    pub bytes: usize,
    /// An existing remote file was overwritten.
    pub replaced: bool,
}

/// Upload the file at `path` to `archive`.
///
/// `dest_name` defaults to the local file name. An existing remote file is only replaced when
/// `overwrite` is set; otherwise the call fails with `NameCollision` and nothing is uploaded.
pub fn publish_file<A: RemoteArchive + ?Sized>(
    archive: &A,
    path: impl AsRef<Path>,
    dest_name: Option<&str>,
    overwrite: bool,
) -> IngestResult<PublishReport> {
    let path = path.as_ref();
    let remote_name = match dest_name {
        Some(name) => name.trim().to_string(),
        None => path
            .file_name()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    };
    if remote_name.is_empty() {
        return Err(IngestError::invalid_input(format!(
            "no remote name for {}",
            path.display()
        )));
    }

    let replaced = archive.exists(&remote_name)?;
    if replaced && !overwrite {
        return Err(IngestError::NameCollision { name: remote_name });
    }

    let bytes = fs::read(path)?;
    archive.upload(&remote_name, &bytes)?;
    log::info!("published {} as '{remote_name}' ({} byte(s))", path.display(), bytes.len());

    Ok(PublishReport {
        remote_name,
        bytes: bytes.len(),
        replaced,
    })
}

/// An archive backed by a local directory.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    /// Use `root` as the archive; it must already exist.
    pub fn new(root: impl Into<PathBuf>) -> IngestResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(IngestError::Remote {
                message: format!("archive directory {} does not exist", root.display()),
            });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry(&self, name: &str) -> IngestResult<PathBuf> {
        let plain = Path::new(name)
            .file_name()
            .is_some_and(|f| f == std::ffi::OsStr::new(name));
        if !plain {
            return Err(IngestError::Remote {
                message: format!("'{name}' is not a plain file name"),
            });
        }
        Ok(self.root.join(name))
    }
}

impl RemoteArchive for DirectoryArchive {
    fn exists(&self, name: &str) -> IngestResult<bool> {
        Ok(self.entry(name)?.is_file())
    }

    fn upload(&self, name: &str, bytes: &[u8]) -> IngestResult<()> {
        let target = self.entry(name)?;
        fs::write(&target, bytes).map_err(|e| IngestError::Remote {
            message: format!("upload to {} failed: {e}", target.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_names_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let archive = DirectoryArchive::new(dir.path()).unwrap();
        assert!(archive.upload("../escape.txt", b"x").is_err());
        assert!(archive.exists("a/b.txt").is_err());
    }

    #[test]
    fn missing_root_is_a_remote_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DirectoryArchive::new(dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, IngestError::Remote { .. }));
    }
}
