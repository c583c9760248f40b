//! Dropbox storage backend
//!
//! Dropbox API v2 over HTTPS. Authentication uses a long-lived refresh token
//! exchanged for a short-lived access token at connect time; uploads go
//! through chunked upload sessions so memory stays bounded for large files.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fcloud_core::{FcloudError, FcloudResult, FileStat, RemoteEntry, RemotePath, StorageBackend};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;

const TOKEN_URL: &str = "https://api.dropboxapi.com/oauth2/token";
const API_URL: &str = "https://api.dropboxapi.com/2";
const CONTENT_URL: &str = "https://content.dropboxapi.com/2";

/// Dropbox auth payload from the config file.
#[derive(Debug, Clone)]
pub struct DropboxAuth {
    pub refresh_token: String,
    pub app_key: String,
    pub app_secret: String,
}

/// Dropbox storage backend
pub struct DropboxBackend {
    http: Client,
    access_token: String,
    chunk_size: usize,
}

impl DropboxBackend {
    /// Exchange the refresh token for an access token and return a ready
    /// backend. An invalid token surfaces as `Auth` here, not later.
    pub async fn connect(auth: DropboxAuth, chunk_size: usize) -> FcloudResult<Self> {
        let http = Client::new();

        let response = http
            .post(TOKEN_URL)
            .basic_auth(&auth.app_key, Some(&auth.app_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", &auth.refresh_token),
            ])
            .send()
            .await
            .map_err(net_err)?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FcloudError::Auth(format!("token exchange failed: {detail}")));
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| FcloudError::Auth(e.to_string()))?;

        Ok(Self {
            http,
            access_token: token.access_token,
            chunk_size,
        })
    }

    /// RPC-style endpoint: JSON in, JSON out.
    async fn api_request<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: impl Serialize,
    ) -> FcloudResult<T> {
        let url = format!("{API_URL}/{endpoint}");
        debug!(%url, "dropbox api request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(net_err)?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| backend_err(e.to_string()))
    }

    /// Content endpoint: arguments in the `Dropbox-API-Arg` header, raw
    /// bytes in the body.
    async fn content_request(
        &self,
        endpoint: &str,
        arg: impl Serialize,
        body: Vec<u8>,
    ) -> FcloudResult<Response> {
        let url = format!("{CONTENT_URL}/{endpoint}");
        let arg = serde_json::to_string(&arg).map_err(|e| backend_err(e.to_string()))?;

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("Dropbox-API-Arg", arg)
            .header("Content-Type", "application/octet-stream")
            .body(body)
            .send()
            .await
            .map_err(net_err)?;

        check_status(response).await
    }
}

/// One chunked upload session. Owned for exactly one upload call: it must
/// be finished (or dropped, leaving the session orphaned server-side)
/// before `upload` returns.
struct UploadSession<'a> {
    backend: &'a DropboxBackend,
    session_id: String,
    offset: u64,
}

#[derive(Serialize)]
struct SessionCursor<'a> {
    session_id: &'a str,
    offset: u64,
}

impl<'a> UploadSession<'a> {
    async fn start(backend: &'a DropboxBackend) -> FcloudResult<UploadSession<'a>> {
        #[derive(Serialize)]
        struct StartArg {
            close: bool,
        }

        #[derive(Deserialize)]
        struct StartResult {
            session_id: String,
        }

        let response = backend
            .content_request("files/upload_session/start", StartArg { close: false }, Vec::new())
            .await?;
        let result: StartResult = response
            .json()
            .await
            .map_err(|e| backend_err(e.to_string()))?;

        Ok(UploadSession { backend, session_id: result.session_id, offset: 0 })
    }

    async fn append(&mut self, chunk: Vec<u8>) -> FcloudResult<()> {
        #[derive(Serialize)]
        struct AppendArg<'a> {
            cursor: SessionCursor<'a>,
            close: bool,
        }

        let len = chunk.len() as u64;
        self.backend
            .content_request(
                "files/upload_session/append_v2",
                AppendArg {
                    cursor: SessionCursor { session_id: &self.session_id, offset: self.offset },
                    close: false,
                },
                chunk,
            )
            .await?;
        self.offset += len;
        Ok(())
    }

    async fn finish(self, dest: &RemotePath) -> FcloudResult<DropboxMetadata> {
        #[derive(Serialize)]
        struct CommitInfo {
            path: String,
            mode: &'static str,
            autorename: bool,
            mute: bool,
        }

        #[derive(Serialize)]
        struct FinishArg<'a> {
            cursor: SessionCursor<'a>,
            commit: CommitInfo,
        }

        let response = self
            .backend
            .content_request(
                "files/upload_session/finish",
                FinishArg {
                    cursor: SessionCursor { session_id: &self.session_id, offset: self.offset },
                    // autorename lets the server absorb a race on the name;
                    // the actual name is reported back to the caller.
                    commit: CommitInfo {
                        path: dest.to_path_string(),
                        mode: "add",
                        autorename: true,
                        mute: true,
                    },
                },
                Vec::new(),
            )
            .await?;

        response
            .json()
            .await
            .map_err(|e| backend_err(e.to_string()))
    }
}

/// Dropbox metadata DTO shared by list/stat/upload responses.
#[derive(Debug, Deserialize)]
struct DropboxMetadata {
    #[serde(rename = ".tag", default)]
    tag: Option<String>,
    name: String,
    path_display: Option<String>,
    size: Option<u64>,
    server_modified: Option<String>,
    rev: Option<String>,
    content_hash: Option<String>,
}

impl DropboxMetadata {
    fn is_directory(&self) -> bool {
        self.tag.as_deref() == Some("folder")
    }

    fn modified(&self) -> Option<DateTime<Utc>> {
        self.server_modified
            .as_deref()
            .and_then(|m| DateTime::parse_from_rfc3339(m).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn to_entry(&self) -> RemoteEntry {
        RemoteEntry {
            name: self.name.clone(),
            size: if self.is_directory() { None } else { self.size },
            is_directory: self.is_directory(),
            modified: if self.is_directory() { None } else { self.modified() },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListFolderResponse {
    entries: Vec<DropboxMetadata>,
    cursor: String,
    has_more: bool,
}

/// Dropbox addresses its root as "", not "/".
fn to_dropbox_path(remote: &RemotePath) -> String {
    if remote.is_root() {
        String::new()
    } else {
        remote.to_path_string()
    }
}

fn net_err(err: reqwest::Error) -> FcloudError {
    if err.is_connect() || err.is_timeout() {
        FcloudError::Connection(err.to_string())
    } else {
        backend_err(err.to_string())
    }
}

fn backend_err(message: String) -> FcloudError {
    FcloudError::UnknownBackend { provider: "dropbox".into(), message }
}

/// Translate an HTTP failure into the shared taxonomy. Dropbox reports
/// path-level failures as 409 with an `error_summary` field.
fn translate_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> FcloudError {
    match status {
        StatusCode::UNAUTHORIZED => FcloudError::Auth(body.to_string()),
        StatusCode::FORBIDDEN => FcloudError::PermissionDenied(body.to_string()),
        StatusCode::BAD_REQUEST => FcloudError::InvalidArgument(body.to_string()),
        StatusCode::TOO_MANY_REQUESTS => FcloudError::RateLimited { retry_after_secs: retry_after },
        StatusCode::CONFLICT => {
            #[derive(Deserialize)]
            struct ApiError {
                error_summary: String,
            }
            match serde_json::from_str::<ApiError>(body) {
                Ok(e) if e.error_summary.contains("not_found") => {
                    FcloudError::RemoteNotFound(e.error_summary)
                }
                Ok(e) => backend_err(e.error_summary),
                Err(_) => backend_err(body.to_string()),
            }
        }
        _ => backend_err(format!("{status}: {body}")),
    }
}

async fn check_status(response: Response) -> FcloudResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    let body = response.text().await.unwrap_or_default();
    Err(translate_error(status, retry_after, &body))
}

#[async_trait]
impl StorageBackend for DropboxBackend {
    fn name(&self) -> &str {
        "dropbox"
    }

    fn display_name(&self) -> &str {
        "Dropbox"
    }

    async fn upload(&self, local: &Path, remote: &RemotePath) -> FcloudResult<String> {
        let mut file = fs::File::open(local)
            .await
            .map_err(|e| FcloudError::from_io(e, local))?;

        let mut session = UploadSession::start(self).await?;
        let mut buffer = vec![0u8; self.chunk_size];
        loop {
            let n = file
                .read(&mut buffer)
                .await
                .map_err(|e| FcloudError::from_io(e, local))?;
            if n == 0 {
                break;
            }
            session.append(buffer[..n].to_vec()).await?;
        }

        let metadata = session.finish(remote).await?;
        Ok(metadata.name)
    }

    async fn download(&self, remote: &RemotePath, local: &Path) -> FcloudResult<()> {
        #[derive(Serialize)]
        struct DownloadArg {
            path: String,
        }

        let mut response = self
            .content_request(
                "files/download",
                DownloadArg { path: to_dropbox_path(remote) },
                Vec::new(),
            )
            .await?;

        let mut file = fs::File::create(local)
            .await
            .map_err(|e| FcloudError::from_io(e, local))?;
        while let Some(chunk) = response.chunk().await.map_err(net_err)? {
            file.write_all(&chunk)
                .await
                .map_err(|e| FcloudError::from_io(e, local))?;
        }
        file.flush()
            .await
            .map_err(|e| FcloudError::from_io(e, local))?;
        Ok(())
    }

    async fn list(&self, remote: &RemotePath) -> FcloudResult<Vec<RemoteEntry>> {
        #[derive(Serialize)]
        struct ListFolderArg {
            path: String,
            recursive: bool,
            include_deleted: bool,
        }

        let result: ListFolderResponse = self
            .api_request(
                "files/list_folder",
                ListFolderArg {
                    path: to_dropbox_path(remote),
                    recursive: false,
                    include_deleted: false,
                },
            )
            .await?;

        let mut entries: Vec<RemoteEntry> = result.entries.iter().map(|m| m.to_entry()).collect();

        let mut cursor = result.cursor;
        let mut has_more = result.has_more;
        while has_more {
            #[derive(Serialize)]
            struct ContinueArg<'a> {
                cursor: &'a str,
            }

            let next: ListFolderResponse = self
                .api_request("files/list_folder/continue", ContinueArg { cursor: &cursor })
                .await?;
            entries.extend(next.entries.iter().map(|m| m.to_entry()));
            cursor = next.cursor;
            has_more = next.has_more;
        }

        Ok(entries)
    }

    async fn remove(&self, remote: &RemotePath) -> FcloudResult<()> {
        #[derive(Serialize)]
        struct DeleteArg {
            path: String,
        }

        let _: serde_json::Value = self
            .api_request("files/delete_v2", DeleteArg { path: to_dropbox_path(remote) })
            .await?;
        Ok(())
    }

    async fn stat(&self, remote: &RemotePath) -> FcloudResult<FileStat> {
        #[derive(Serialize)]
        struct GetMetadataArg {
            path: String,
        }

        let metadata: DropboxMetadata = self
            .api_request("files/get_metadata", GetMetadataArg { path: to_dropbox_path(remote) })
            .await?;

        let mut extra = std::collections::HashMap::new();
        if let Some(rev) = &metadata.rev {
            extra.insert("rev".to_string(), rev.clone());
        }

        Ok(FileStat {
            path: metadata
                .path_display
                .as_deref()
                .map(RemotePath::new)
                .unwrap_or_else(|| remote.clone()),
            size: metadata.size.unwrap_or(0),
            modified: metadata.modified(),
            content_hash: metadata.content_hash.clone(),
            extra,
        })
    }
}
