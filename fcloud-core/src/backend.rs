//! Storage backend trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;

use crate::error::FcloudResult;
use crate::path::RemotePath;

/// Default transfer chunk size (4 MiB). Uploads stream in chunks of this
/// size so peak memory stays bounded regardless of file size.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// One entry of a remote directory listing.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    pub name: String,
    /// Absent for directories.
    pub size: Option<u64>,
    pub is_directory: bool,
    /// Absent for directories or providers that do not report it.
    pub modified: Option<DateTime<Utc>>,
}

/// Metadata for a single remote file, as returned by `stat`.
#[derive(Debug, Clone)]
pub struct FileStat {
    pub path: RemotePath,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub content_hash: Option<String>,
    /// Provider-specific extras (revision ids, media info, ...).
    pub extra: HashMap<String, String>,
}

/// Capability interface a cloud provider implements.
///
/// Implementations translate every provider-native failure into the
/// `FcloudError` taxonomy; nothing provider-specific leaks past this trait.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Provider identifier, e.g. "dropbox".
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    /// Upload a local file to `remote`, streaming in chunks. Returns the
    /// name actually used: normally the one given, but a provider may report
    /// a different final name when a server-side rename absorbed a race.
    async fn upload(&self, local: &Path, remote: &RemotePath) -> FcloudResult<String>;

    /// Download the remote file to `local`, overwriting it.
    async fn download(&self, remote: &RemotePath, local: &Path) -> FcloudResult<()>;

    /// List a remote directory. A missing path is `RemoteNotFound`.
    async fn list(&self, remote: &RemotePath) -> FcloudResult<Vec<RemoteEntry>>;

    /// Delete the remote file.
    async fn remove(&self, remote: &RemotePath) -> FcloudResult<()>;

    /// Metadata for a single remote file.
    async fn stat(&self, remote: &RemotePath) -> FcloudResult<FileStat>;
}
