//! Sync engine
//!
//! Orchestrates add/get/info/remove/files over a `StorageBackend`, recursing
//! over directory trees and delegating placeholder I/O to the link codec.
//! Every operation is a self-contained request: no state survives between
//! invocations, and there is no rollback. Within a directory recursion a
//! single file's failure is suppressed so siblings continue; the overall
//! operation is best-effort and can leave a tree partially synced.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::backend::{FileStat, RemoteEntry, StorageBackend};
use crate::config::Config;
use crate::error::{FcloudError, FcloudResult};
use crate::link::LinkCodec;
use crate::naming;
use crate::path::RemotePath;

/// Options for `add`.
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Keep the original file and create the link alongside it.
    pub near: bool,
    /// Remote name override; defaults to the local base name.
    pub filename: Option<String>,
    /// Target remote folder; defaults to the configured main folder.
    pub remote_folder: Option<RemotePath>,
}

/// Options for `get`.
#[derive(Debug, Clone)]
pub struct GetOptions {
    /// Download to a sibling path, leaving the link file untouched.
    pub near: bool,
    /// Delete the remote copy after a successful download. Near mode forces
    /// this off: the link must stay valid for future downloads.
    pub remove_after: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self { near: false, remove_after: true }
    }
}

/// A suppressed per-file failure inside a directory recursion.
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: FcloudError,
}

/// Outcome of one operation: how many files were handled, how many were
/// skipped as no-ops, and which ones failed (directory recursions only;
/// a single-file failure surfaces as `Err` instead).
#[derive(Debug, Default)]
pub struct SyncReport {
    pub processed: usize,
    pub skipped: usize,
    pub failures: Vec<Failure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

enum AddOutcome {
    Uploaded(RemotePath),
    SkippedLink,
}

/// The engine owns the CFL lifecycle; the backend owns remote objects.
pub struct SyncEngine {
    backend: Arc<dyn StorageBackend>,
    codec: LinkCodec,
    main_folder: RemotePath,
}

impl SyncEngine {
    pub fn new(backend: Arc<dyn StorageBackend>, config: &Config) -> Self {
        Self {
            backend,
            codec: LinkCodec::new(&config.cfl_extension),
            main_folder: config.main_folder.clone(),
        }
    }

    pub fn codec(&self) -> &LinkCodec {
        &self.codec
    }

    pub fn main_folder(&self) -> &RemotePath {
        &self.main_folder
    }

    /// Upload a file, or every regular file under a directory, leaving a CFL
    /// placeholder for each uploaded file.
    pub async fn add(&self, path: &Path, options: &AddOptions) -> FcloudResult<SyncReport> {
        if path.is_dir() {
            if options.near {
                return Err(FcloudError::NearWithDirectory);
            }
            let folder = self.resolve_folder(options.remote_folder.as_ref());
            let per_file = AddOptions {
                near: false,
                filename: None,
                remote_folder: Some(folder),
            };

            let mut report = SyncReport::default();
            for file in collect_files(path)? {
                match self.add_file(&file, &per_file).await {
                    Ok(AddOutcome::Uploaded(remote)) => {
                        debug!(local = %file.display(), %remote, "uploaded");
                        report.processed += 1;
                    }
                    Ok(AddOutcome::SkippedLink) => report.skipped += 1,
                    Err(error) => {
                        warn!(local = %file.display(), %error, "upload failed, continuing");
                        report.failures.push(Failure { path: file, error });
                    }
                }
            }
            return Ok(report);
        }

        let mut report = SyncReport::default();
        match self.add_file(path, options).await? {
            AddOutcome::Uploaded(remote) => {
                debug!(local = %path.display(), %remote, "uploaded");
                report.processed = 1;
            }
            AddOutcome::SkippedLink => report.skipped = 1,
        }
        Ok(report)
    }

    async fn add_file(&self, path: &Path, options: &AddOptions) -> FcloudResult<AddOutcome> {
        if !path.is_file() {
            return Err(FcloudError::FileNotFound(path.display().to_string()));
        }
        // A link file is never re-uploaded.
        if self.codec.is_link(path) {
            return Ok(AddOutcome::SkippedLink);
        }

        let folder = self.resolve_folder(options.remote_folder.as_ref());
        let desired = match &options.filename {
            Some(name) => name.clone(),
            None => path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .ok_or_else(|| FcloudError::InvalidArgument(path.display().to_string()))?,
        };

        // A folder that does not exist yet simply has no names to collide
        // with; the provider creates it on upload.
        let existing: Vec<String> = match self.backend.list(&folder).await {
            Ok(entries) => entries.into_iter().map(|e| e.name).collect(),
            Err(FcloudError::RemoteNotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        let final_name = naming::resolve(&desired, &existing);

        // The backend may still report a different final name if the remote
        // folder changed between the listing and the upload.
        let actual_name = self.backend.upload(path, &folder.join(&final_name)).await?;
        let remote = folder.join(&actual_name);
        self.codec.write(path, &remote, options.near).await?;
        Ok(AddOutcome::Uploaded(remote))
    }

    /// Download the file a CFL points at, or every CFL under a directory.
    pub async fn get(&self, path: &Path, options: &GetOptions) -> FcloudResult<SyncReport> {
        if path.is_dir() {
            let mut report = SyncReport::default();
            for file in collect_files(path)? {
                if !self.codec.is_link(&file) {
                    continue;
                }
                match self.get_file(&file, options).await {
                    Ok(()) => report.processed += 1,
                    Err(error) => {
                        warn!(link = %file.display(), %error, "download failed, continuing");
                        report.failures.push(Failure { path: file, error });
                    }
                }
            }
            return Ok(report);
        }

        self.get_file(path, options).await?;
        Ok(SyncReport { processed: 1, ..Default::default() })
    }

    async fn get_file(&self, link: &Path, options: &GetOptions) -> FcloudResult<()> {
        if !link.is_file() {
            return Err(FcloudError::LinkNotFound(link.display().to_string()));
        }
        let remote = self.codec.read(link).await?;
        debug!(link = %link.display(), %remote, "downloading");

        if options.near {
            let target = self.codec.strip_extension(link).ok_or_else(|| {
                FcloudError::InvalidArgument(format!(
                    "{} does not carry the {} extension",
                    link.display(),
                    self.codec.extension()
                ))
            })?;
            self.backend.download(&remote, &target).await?;
            // Near mode never deletes the remote copy: the link stays valid.
            return Ok(());
        }

        self.backend.download(&remote, link).await?;
        if let Some(original) = self.codec.strip_extension(link) {
            fs::rename(link, &original)
                .await
                .map_err(|e| FcloudError::from_io(e, link))?;
        }
        if options.remove_after {
            self.backend.remove(&remote).await?;
        }
        Ok(())
    }

    /// Metadata of the remote file a CFL points at.
    pub async fn info(&self, link: &Path) -> FcloudResult<FileStat> {
        let remote = self.codec.read(link).await?;
        self.backend.stat(&remote).await
    }

    /// Delete the remote file a CFL points at, or every one under a
    /// directory. Unless `only_in_cloud`, the local link is deleted too.
    pub async fn remove(&self, path: &Path, only_in_cloud: bool) -> FcloudResult<SyncReport> {
        if path.is_dir() {
            let mut report = SyncReport::default();
            for file in collect_files(path)? {
                match self.remove_file(&file, only_in_cloud).await {
                    Ok(()) => report.processed += 1,
                    Err(error) => {
                        warn!(link = %file.display(), %error, "remove failed, continuing");
                        report.failures.push(Failure { path: file, error });
                    }
                }
            }
            return Ok(report);
        }

        self.remove_file(path, only_in_cloud).await?;
        Ok(SyncReport { processed: 1, ..Default::default() })
    }

    async fn remove_file(&self, link: &Path, only_in_cloud: bool) -> FcloudResult<()> {
        if !link.is_file() {
            return Err(FcloudError::LinkNotFound(link.display().to_string()));
        }
        let remote = self.codec.read(link).await?;
        debug!(link = %link.display(), %remote, "removing remote file");
        self.backend.remove(&remote).await?;
        if !only_in_cloud {
            self.codec.delete(link).await?;
        }
        Ok(())
    }

    /// List a remote folder (default: the configured main folder).
    pub async fn files(
        &self,
        remote_folder: Option<&RemotePath>,
        only_files: bool,
    ) -> FcloudResult<Vec<RemoteEntry>> {
        let folder = self.resolve_folder(remote_folder);
        let mut entries = self.backend.list(&folder).await?;
        if only_files {
            entries.retain(|e| !e.is_directory);
        }
        Ok(entries)
    }

    fn resolve_folder(&self, explicit: Option<&RemotePath>) -> RemotePath {
        explicit.cloned().unwrap_or_else(|| self.main_folder.clone())
    }
}

/// All regular files under `root`, depth-first in lexicographic order, so
/// repeated runs on an unchanged tree visit files identically.
fn collect_files(root: &Path) -> FcloudResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => FcloudError::from(io),
            None => FcloudError::UnknownIo(root.display().to_string()),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory backend: remote path string -> content.
    #[derive(Default)]
    struct MockBackend {
        files: Mutex<BTreeMap<String, Vec<u8>>>,
        fail_upload_of: Mutex<Option<String>>,
    }

    impl MockBackend {
        fn contents(&self) -> BTreeMap<String, Vec<u8>> {
            self.files.lock().unwrap().clone()
        }

        fn seed(&self, remote: &str, content: &[u8]) {
            self.files.lock().unwrap().insert(remote.to_string(), content.to_vec());
        }

        fn fail_upload_of(&self, name: &str) {
            *self.fail_upload_of.lock().unwrap() = Some(name.to_string());
        }
    }

    #[async_trait]
    impl StorageBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        fn display_name(&self) -> &str {
            "Mock"
        }

        async fn upload(&self, local: &Path, remote: &RemotePath) -> FcloudResult<String> {
            let poisoned = self.fail_upload_of.lock().unwrap().clone();
            if poisoned.as_deref() == remote.name() {
                return Err(FcloudError::Connection("simulated outage".into()));
            }
            let data = fs::read(local)
                .await
                .map_err(|e| FcloudError::from_io(e, local))?;
            self.files
                .lock()
                .unwrap()
                .insert(remote.to_path_string(), data);
            Ok(remote.name().unwrap().to_string())
        }

        async fn download(&self, remote: &RemotePath, local: &Path) -> FcloudResult<()> {
            let data = {
                let files = self.files.lock().unwrap();
                files
                    .get(&remote.to_path_string())
                    .cloned()
                    .ok_or_else(|| FcloudError::RemoteNotFound(remote.to_path_string()))?
            };
            fs::write(local, data)
                .await
                .map_err(|e| FcloudError::from_io(e, local))
        }

        async fn list(&self, remote: &RemotePath) -> FcloudResult<Vec<RemoteEntry>> {
            let prefix = match remote.is_root() {
                true => "/".to_string(),
                false => format!("{}/", remote.to_path_string()),
            };
            let files = self.files.lock().unwrap();
            let mut entries = Vec::new();
            let mut seen_dirs = Vec::new();
            for (path, data) in files.iter() {
                let Some(rest) = path.strip_prefix(&prefix) else { continue };
                match rest.split_once('/') {
                    None => entries.push(RemoteEntry {
                        name: rest.to_string(),
                        size: Some(data.len() as u64),
                        is_directory: false,
                        modified: None,
                    }),
                    Some((dir, _)) => {
                        if !seen_dirs.iter().any(|d| d == dir) {
                            seen_dirs.push(dir.to_string());
                            entries.push(RemoteEntry {
                                name: dir.to_string(),
                                size: None,
                                is_directory: true,
                                modified: None,
                            });
                        }
                    }
                }
            }
            if entries.is_empty() && !remote.is_root() {
                return Err(FcloudError::RemoteNotFound(remote.to_path_string()));
            }
            Ok(entries)
        }

        async fn remove(&self, remote: &RemotePath) -> FcloudResult<()> {
            self.files
                .lock()
                .unwrap()
                .remove(&remote.to_path_string())
                .map(|_| ())
                .ok_or_else(|| FcloudError::RemoteNotFound(remote.to_path_string()))
        }

        async fn stat(&self, remote: &RemotePath) -> FcloudResult<FileStat> {
            let files = self.files.lock().unwrap();
            let data = files
                .get(&remote.to_path_string())
                .ok_or_else(|| FcloudError::RemoteNotFound(remote.to_path_string()))?;
            Ok(FileStat {
                path: remote.clone(),
                size: data.len() as u64,
                modified: None,
                content_hash: Some(format!("len-{}", data.len())),
                extra: Default::default(),
            })
        }
    }

    fn engine() -> (Arc<MockBackend>, SyncEngine) {
        let backend = Arc::new(MockBackend::default());
        let config = Config::new(RemotePath::new("/main"), ".cfl");
        let engine = SyncEngine::new(backend.clone(), &config);
        (backend, engine)
    }

    async fn write_tree(root: &Path, files: &[(&str, &str)]) {
        for (rel, content) in files {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).await.unwrap();
            fs::write(&path, content).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_add_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, engine) = engine();
        write_tree(dir.path(), &[("report.txt", "hello")]).await;

        let report = engine
            .add(&dir.path().join("report.txt"), &AddOptions::default())
            .await
            .unwrap();

        assert_eq!(report.processed, 1);
        assert!(!dir.path().join("report.txt").exists());
        let link = dir.path().join("report.txt.cfl");
        assert_eq!(
            fs::read_to_string(&link).await.unwrap(),
            "%cfl:/main/report.txt"
        );
        assert_eq!(backend.contents().get("/main/report.txt").unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_add_with_filename_and_remote_folder() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, engine) = engine();
        write_tree(dir.path(), &[("report.txt", "hello")]).await;

        let options = AddOptions {
            filename: Some("renamed.txt".into()),
            remote_folder: Some(RemotePath::new("/elsewhere")),
            ..Default::default()
        };
        engine.add(&dir.path().join("report.txt"), &options).await.unwrap();

        assert!(backend.contents().contains_key("/elsewhere/renamed.txt"));
        assert_eq!(
            fs::read_to_string(dir.path().join("report.txt.cfl")).await.unwrap(),
            "%cfl:/elsewhere/renamed.txt"
        );
    }

    #[tokio::test]
    async fn test_add_near_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let (_, engine) = engine();
        write_tree(dir.path(), &[("report.txt", "hello")]).await;

        let options = AddOptions { near: true, ..Default::default() };
        engine.add(&dir.path().join("report.txt"), &options).await.unwrap();

        assert!(dir.path().join("report.txt").exists());
        assert!(dir.path().join("report.txt.cfl").exists());
    }

    #[tokio::test]
    async fn test_add_near_with_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (_, engine) = engine();

        let options = AddOptions { near: true, ..Default::default() };
        let err = engine.add(dir.path(), &options).await.unwrap_err();
        assert!(matches!(err, FcloudError::NearWithDirectory));
    }

    #[tokio::test]
    async fn test_add_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (_, engine) = engine();

        let err = engine
            .add(&dir.path().join("ghost.txt"), &AddOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FcloudError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_add_link_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, engine) = engine();
        write_tree(dir.path(), &[("report.txt.cfl", "%cfl:/main/report.txt")]).await;

        let report = engine
            .add(&dir.path().join("report.txt.cfl"), &AddOptions::default())
            .await
            .unwrap();

        assert_eq!(report.processed, 0);
        assert_eq!(report.skipped, 1);
        assert!(backend.contents().is_empty());
    }

    #[tokio::test]
    async fn test_add_resolves_remote_collision() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, engine) = engine();
        backend.seed("/main/report.txt", b"older");
        backend.seed("/main/report.txt (1)", b"old");
        write_tree(dir.path(), &[("report.txt", "new")]).await;

        engine
            .add(&dir.path().join("report.txt"), &AddOptions::default())
            .await
            .unwrap();

        assert_eq!(backend.contents().get("/main/report.txt (2)").unwrap(), b"new");
        assert_eq!(
            fs::read_to_string(dir.path().join("report.txt.cfl")).await.unwrap(),
            "%cfl:/main/report.txt (2)"
        );
    }

    #[tokio::test]
    async fn test_directory_add_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, engine) = engine();
        let tree = [
            ("homework.txt", "do the dishes"),
            ("russian/my_plane.docx", "wings"),
            ("russian/grammar/lesson.mp4", "cases"),
        ];
        write_tree(dir.path(), &tree).await;

        let report = engine.add(dir.path(), &AddOptions::default()).await.unwrap();
        assert_eq!(report.processed, 3);
        assert!(report.is_clean());

        for (rel, _) in &tree {
            assert!(!dir.path().join(rel).exists());
            let mut link = dir.path().join(rel).into_os_string();
            link.push(".cfl");
            assert!(PathBuf::from(link).exists());
        }
        // Directory uploads land flat in the target folder.
        assert_eq!(backend.contents().len(), 3);
        assert!(backend.contents().contains_key("/main/homework.txt"));
        assert!(backend.contents().contains_key("/main/my_plane.docx"));
        assert!(backend.contents().contains_key("/main/lesson.mp4"));

        let report = engine.get(dir.path(), &GetOptions::default()).await.unwrap();
        assert_eq!(report.processed, 3);
        assert!(report.is_clean());

        for (rel, content) in &tree {
            assert_eq!(
                fs::read_to_string(dir.path().join(rel)).await.unwrap(),
                *content
            );
        }
        // Default remove_after deleted the remote copies.
        assert!(backend.contents().is_empty());
    }

    #[tokio::test]
    async fn test_directory_add_suppresses_single_failures() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, engine) = engine();
        write_tree(
            dir.path(),
            &[("a.txt", "a"), ("b.txt", "b"), ("c.txt", "c")],
        )
        .await;
        backend.fail_upload_of("b.txt");

        let report = engine.add(dir.path(), &AddOptions::default()).await.unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("b.txt"));
        assert!(matches!(report.failures[0].error, FcloudError::Connection(_)));
        assert!(backend.contents().contains_key("/main/a.txt"));
        assert!(backend.contents().contains_key("/main/c.txt"));
        // The failed file keeps its original form, no link is left behind.
        assert!(dir.path().join("b.txt").exists());
        assert!(!dir.path().join("b.txt.cfl").exists());
    }

    #[tokio::test]
    async fn test_get_restores_original_name() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, engine) = engine();
        backend.seed("/main/report.txt", b"hello");
        write_tree(dir.path(), &[("report.txt.cfl", "%cfl:/main/report.txt")]).await;

        engine
            .get(&dir.path().join("report.txt.cfl"), &GetOptions::default())
            .await
            .unwrap();

        assert!(!dir.path().join("report.txt.cfl").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("report.txt")).await.unwrap(),
            "hello"
        );
        assert!(backend.contents().is_empty());
    }

    #[tokio::test]
    async fn test_get_keep_remote() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, engine) = engine();
        backend.seed("/main/report.txt", b"hello");
        write_tree(dir.path(), &[("report.txt.cfl", "%cfl:/main/report.txt")]).await;

        let options = GetOptions { near: false, remove_after: false };
        engine.get(&dir.path().join("report.txt.cfl"), &options).await.unwrap();

        assert!(backend.contents().contains_key("/main/report.txt"));
    }

    #[tokio::test]
    async fn test_get_near_leaves_link_and_remote() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, engine) = engine();
        backend.seed("/main/report.txt", b"hello");
        write_tree(dir.path(), &[("report.txt.cfl", "%cfl:/main/report.txt")]).await;

        // remove_after is explicitly requested but near mode overrides it.
        let options = GetOptions { near: true, remove_after: true };
        engine.get(&dir.path().join("report.txt.cfl"), &options).await.unwrap();

        assert!(dir.path().join("report.txt.cfl").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("report.txt")).await.unwrap(),
            "hello"
        );
        assert!(backend.contents().contains_key("/main/report.txt"));
    }

    #[tokio::test]
    async fn test_get_missing_link_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (_, engine) = engine();

        let err = engine
            .get(&dir.path().join("ghost.cfl"), &GetOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FcloudError::LinkNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_invalid_link_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (_, engine) = engine();
        write_tree(dir.path(), &[("broken.cfl", "just some text")]).await;

        let err = engine
            .get(&dir.path().join("broken.cfl"), &GetOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FcloudError::InvalidLink(_)));
    }

    #[tokio::test]
    async fn test_remove_deletes_both_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, engine) = engine();
        backend.seed("/main/report.txt", b"hello");
        write_tree(dir.path(), &[("report.txt.cfl", "%cfl:/main/report.txt")]).await;

        engine
            .remove(&dir.path().join("report.txt.cfl"), false)
            .await
            .unwrap();

        assert!(backend.contents().is_empty());
        assert!(!dir.path().join("report.txt.cfl").exists());
    }

    #[tokio::test]
    async fn test_remove_only_in_cloud_keeps_link() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, engine) = engine();
        backend.seed("/main/report.txt", b"hello");
        write_tree(dir.path(), &[("report.txt.cfl", "%cfl:/main/report.txt")]).await;

        engine
            .remove(&dir.path().join("report.txt.cfl"), true)
            .await
            .unwrap();

        assert!(backend.contents().is_empty());
        assert!(dir.path().join("report.txt.cfl").exists());
    }

    #[tokio::test]
    async fn test_remove_directory_suppresses_non_links() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, engine) = engine();
        backend.seed("/main/a.txt", b"a");
        write_tree(
            dir.path(),
            &[("a.txt.cfl", "%cfl:/main/a.txt"), ("notes.md", "not a link")],
        )
        .await;

        let report = engine.remove(dir.path(), false).await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, FcloudError::InvalidLink(_)));
        assert!(backend.contents().is_empty());
        assert!(!dir.path().join("a.txt.cfl").exists());
        assert!(dir.path().join("notes.md").exists());
    }

    #[tokio::test]
    async fn test_info() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, engine) = engine();
        backend.seed("/main/report.txt", b"hello");
        write_tree(dir.path(), &[("report.txt.cfl", "%cfl:/main/report.txt")]).await;

        let stat = engine.info(&dir.path().join("report.txt.cfl")).await.unwrap();
        assert_eq!(stat.path.to_path_string(), "/main/report.txt");
        assert_eq!(stat.size, 5);
        assert_eq!(stat.content_hash.as_deref(), Some("len-5"));
    }

    #[tokio::test]
    async fn test_files_listing() {
        let (backend, engine) = engine();
        backend.seed("/main/report.txt", b"hello");
        backend.seed("/main/photos/cat.jpg", b"meow");

        let all = engine.files(None, false).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|e| e.name == "photos" && e.is_directory));

        let only_files = engine.files(None, true).await.unwrap();
        assert_eq!(only_files.len(), 1);
        assert_eq!(only_files[0].name, "report.txt");
        assert_eq!(only_files[0].size, Some(5));
    }

    #[tokio::test]
    async fn test_files_missing_folder_fails() {
        let (_, engine) = engine();
        let err = engine
            .files(Some(&RemotePath::new("/nowhere")), false)
            .await
            .unwrap_err();
        assert!(matches!(err, FcloudError::RemoteNotFound(_)));
    }
}
