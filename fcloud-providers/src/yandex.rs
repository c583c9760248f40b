//! Yandex Disk storage backend
//!
//! REST API (cloud-api.yandex.net). Transfers are two-step: the API hands
//! out a one-shot `href` and the content moves over plain GET/PUT. Auth is
//! a fixed OAuth token sent with every request.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use fcloud_core::{FcloudError, FcloudResult, FileStat, RemoteEntry, RemotePath, StorageBackend};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;

const API_URL: &str = "https://cloud-api.yandex.net/v1/disk";
const LIST_PAGE_SIZE: u64 = 200;

/// Yandex Disk auth payload from the config file.
#[derive(Debug, Clone)]
pub struct YandexAuth {
    pub token: String,
}

/// Yandex Disk storage backend
pub struct YandexBackend {
    http: Client,
    token: String,
    chunk_size: usize,
}

/// `{"href": ...}` wrapper the API returns for uploads and downloads.
#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

#[derive(Debug, Deserialize)]
struct Resource {
    name: String,
    path: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    size: Option<u64>,
    modified: Option<String>,
    md5: Option<String>,
    #[serde(rename = "_embedded")]
    embedded: Option<Embedded>,
}

#[derive(Debug, Deserialize)]
struct Embedded {
    items: Vec<Resource>,
    total: u64,
    offset: u64,
}

impl Resource {
    fn is_directory(&self) -> bool {
        self.kind == "dir"
    }

    fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
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

/// The API spells paths `disk:/...`; strip that scheme when echoing back.
fn from_disk_path(path: &str) -> RemotePath {
    RemotePath::new(path.strip_prefix("disk:").unwrap_or(path))
}

fn net_err(err: reqwest::Error) -> FcloudError {
    if err.is_connect() || err.is_timeout() {
        FcloudError::Connection(err.to_string())
    } else {
        backend_err(err.to_string())
    }
}

fn backend_err(message: String) -> FcloudError {
    FcloudError::UnknownBackend { provider: "yandex".into(), message }
}

/// Translate an HTTP failure into the shared taxonomy. A 409 with
/// `DiskPathDoesntExistsError` means a missing parent folder.
fn translate_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> FcloudError {
    #[derive(Deserialize)]
    struct ApiError {
        error: String,
        #[serde(default)]
        message: String,
    }
    let api: Option<ApiError> = serde_json::from_str(body).ok();

    match status {
        StatusCode::UNAUTHORIZED => FcloudError::Auth(body.to_string()),
        StatusCode::FORBIDDEN => FcloudError::PermissionDenied(body.to_string()),
        StatusCode::BAD_REQUEST => FcloudError::InvalidArgument(body.to_string()),
        StatusCode::NOT_FOUND => {
            FcloudError::RemoteNotFound(api.map(|e| e.message).unwrap_or_else(|| body.to_string()))
        }
        StatusCode::TOO_MANY_REQUESTS => FcloudError::RateLimited { retry_after_secs: retry_after },
        StatusCode::CONFLICT => match api {
            Some(e) if e.error == "DiskPathDoesntExistsError" => FcloudError::RemoteNotFound(e.message),
            Some(e) => backend_err(format!("{}: {}", e.error, e.message)),
            None => backend_err(body.to_string()),
        },
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

impl YandexBackend {
    pub fn new(auth: YandexAuth, chunk_size: usize) -> Self {
        Self {
            http: Client::new(),
            token: auth.token,
            chunk_size,
        }
    }

    async fn api_get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> FcloudResult<T> {
        let url = format!("{API_URL}{endpoint}");
        debug!(%url, "yandex api request");

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("OAuth {}", self.token))
            .query(query)
            .send()
            .await
            .map_err(net_err)?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| backend_err(e.to_string()))
    }

    /// Create the folder and any missing ancestors. Already-existing
    /// folders are not an error.
    async fn ensure_folder(&self, folder: &RemotePath) -> FcloudResult<()> {
        let mut prefix = RemotePath::root();
        for segment in folder.segments() {
            prefix = prefix.join(segment);
            let response = self
                .http
                .put(format!("{API_URL}/resources"))
                .header("Authorization", format!("OAuth {}", self.token))
                .query(&[("path", prefix.to_path_string())])
                .send()
                .await
                .map_err(net_err)?;

            if response.status() == StatusCode::CONFLICT {
                continue;
            }
            check_status(response).await?;
        }
        Ok(())
    }

    async fn upload_href(&self, remote: &RemotePath) -> FcloudResult<Link> {
        self.api_get(
            "/resources/upload",
            &[
                ("path", remote.to_path_string()),
                ("overwrite", "false".to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl StorageBackend for YandexBackend {
    fn name(&self) -> &str {
        "yandex"
    }

    fn display_name(&self) -> &str {
        "Yandex Disk"
    }

    async fn upload(&self, local: &Path, remote: &RemotePath) -> FcloudResult<String> {
        // A missing target folder is created once, then the href request is
        // retried; any second failure is final.
        let link = match self.upload_href(remote).await {
            Ok(link) => link,
            Err(FcloudError::RemoteNotFound(_)) => {
                if let Some(parent) = remote.parent() {
                    self.ensure_folder(&parent).await?;
                }
                self.upload_href(remote).await?
            }
            Err(e) => return Err(e),
        };

        let file = fs::File::open(local)
            .await
            .map_err(|e| FcloudError::from_io(e, local))?;
        let stream = chunked_stream(file, self.chunk_size);

        let response = self
            .http
            .put(&link.href)
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await
            .map_err(net_err)?;
        check_status(response).await?;

        Ok(remote
            .name()
            .map(str::to_string)
            .unwrap_or_default())
    }

    async fn download(&self, remote: &RemotePath, local: &Path) -> FcloudResult<()> {
        let link: Link = self
            .api_get("/resources/download", &[("path", remote.to_path_string())])
            .await?;

        let response = self.http.get(&link.href).send().await.map_err(net_err)?;
        let mut response = check_status(response).await?;

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
        let mut entries = Vec::new();
        let mut offset = 0u64;

        loop {
            let resource: Resource = self
                .api_get(
                    "/resources",
                    &[
                        ("path", remote.to_path_string()),
                        ("limit", LIST_PAGE_SIZE.to_string()),
                        ("offset", offset.to_string()),
                    ],
                )
                .await?;

            let Some(embedded) = resource.embedded else {
                // Listing a file path: a single non-directory entry.
                entries.push(resource.to_entry());
                break;
            };

            let fetched = embedded.items.len() as u64;
            entries.extend(embedded.items.iter().map(|r| r.to_entry()));
            offset = embedded.offset + fetched;
            if offset >= embedded.total || fetched == 0 {
                break;
            }
        }

        Ok(entries)
    }

    async fn remove(&self, remote: &RemotePath) -> FcloudResult<()> {
        let response = self
            .http
            .delete(format!("{API_URL}/resources"))
            .header("Authorization", format!("OAuth {}", self.token))
            .query(&[
                ("path", remote.to_path_string()),
                ("permanently", "true".to_string()),
            ])
            .send()
            .await
            .map_err(net_err)?;

        // 204 = deleted, 202 = queued server-side; both count as done.
        check_status(response).await?;
        Ok(())
    }

    async fn stat(&self, remote: &RemotePath) -> FcloudResult<FileStat> {
        let resource: Resource = self
            .api_get("/resources", &[("path", remote.to_path_string())])
            .await?;

        Ok(FileStat {
            path: resource
                .path
                .as_deref()
                .map(from_disk_path)
                .unwrap_or_else(|| remote.clone()),
            size: resource.size.unwrap_or(0),
            modified: resource.modified(),
            content_hash: resource.md5.clone(),
            extra: Default::default(),
        })
    }
}

/// Stream a file as fixed-size chunks for a request body.
fn chunked_stream(
    file: fs::File,
    chunk_size: usize,
) -> impl futures::Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    futures::stream::unfold(file, move |mut file| async move {
        let mut buffer = vec![0u8; chunk_size];
        match file.read(&mut buffer).await {
            Ok(0) => None,
            Ok(n) => {
                buffer.truncate(n);
                Some((Ok(Bytes::from(buffer)), file))
            }
            Err(e) => Some((Err(e), file)),
        }
    })
}
