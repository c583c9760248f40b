//! Cloud file link (CFL) codec
//!
//! A CFL is the local placeholder left behind after an upload: a UTF-8 text
//! file whose single required line is `"%cfl:" + <remote posix path>`. The
//! format is persisted and must stay byte-stable across versions.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{FcloudError, FcloudResult};
use crate::path::RemotePath;

/// Required first-line prefix of every valid CFL.
pub const CFL_PREFIX: &str = "%cfl:";

/// Reads and writes CFL placeholder files with a configured extension.
#[derive(Debug, Clone)]
pub struct LinkCodec {
    extension: String,
}

impl LinkCodec {
    pub fn new(extension: impl Into<String>) -> Self {
        Self { extension: extension.into() }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The CFL path for a local file: the file's own path with the link
    /// extension appended.
    pub fn link_path(&self, base: &Path) -> PathBuf {
        let mut raw: OsString = base.as_os_str().to_os_string();
        raw.push(&self.extension);
        PathBuf::from(raw)
    }

    /// Whether `path` carries the configured link extension.
    pub fn is_link(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(&self.extension))
            .unwrap_or(false)
    }

    /// The original path a CFL stands in for, by stripping the extension.
    /// `None` when `path` does not end with the extension.
    pub fn strip_extension(&self, path: &Path) -> Option<PathBuf> {
        let name = path.file_name()?.to_str()?;
        let stripped = name.strip_suffix(&self.extension)?;
        if stripped.is_empty() {
            return None;
        }
        Some(path.with_file_name(stripped))
    }

    /// Create a CFL for `base` pointing at `remote`.
    ///
    /// With `keep_original` false the original file is renamed to the link
    /// path first, so its content is replaced by the placeholder line; with
    /// `keep_original` true (near mode) the original stays and a new link
    /// file is created alongside it.
    pub async fn write(
        &self,
        base: &Path,
        remote: &RemotePath,
        keep_original: bool,
    ) -> FcloudResult<PathBuf> {
        let link = self.link_path(base);
        let line = format!("{CFL_PREFIX}{remote}");

        if keep_original {
            if fs::try_exists(&link)
                .await
                .map_err(|e| FcloudError::from_io(e, &link))?
            {
                return Err(FcloudError::FileConflict(link.display().to_string()));
            }
        } else {
            fs::rename(base, &link)
                .await
                .map_err(|e| FcloudError::from_io(e, base))?;
        }

        fs::write(&link, line.as_bytes())
            .await
            .map_err(|e| FcloudError::from_io(e, &link))?;
        Ok(link)
    }

    /// Read and validate a CFL, returning the remote path it records.
    ///
    /// Only the first line is inspected; anything without the `%cfl:` prefix
    /// is rejected rather than returned as garbage.
    pub async fn read(&self, link: &Path) -> FcloudResult<RemotePath> {
        let content = fs::read_to_string(link).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FcloudError::LinkNotFound(link.display().to_string())
            } else {
                FcloudError::from_io(e, link)
            }
        })?;

        let first_line = content.lines().next().unwrap_or("");
        match first_line.strip_prefix(CFL_PREFIX) {
            Some(rest) => Ok(RemotePath::new(rest)),
            None => Err(FcloudError::InvalidLink(link.display().to_string())),
        }
    }

    /// Delete a CFL file.
    pub async fn delete(&self, link: &Path) -> FcloudResult<()> {
        fs::remove_file(link).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FcloudError::LinkNotFound(link.display().to_string())
            } else {
                FcloudError::from_io(e, link)
            }
        })
    }
}
