//! Cloud storage backends for fcloud
//!
//! Each provider implements `StorageBackend` and translates its native
//! failures into the shared error taxonomy before they leave this crate.

pub mod dropbox;
pub mod yandex;

pub use dropbox::{DropboxAuth, DropboxBackend};
pub use yandex::{YandexAuth, YandexBackend};

use std::sync::Arc;

use fcloud_core::{FcloudResult, StorageBackend};

/// Provider names accepted in the configuration.
pub const AVAILABLE_PROVIDERS: &[&str] = &["dropbox", "yandex"];

/// Auth payload for one provider, as loaded from the config file.
#[derive(Debug, Clone)]
pub enum ProviderAuth {
    Dropbox(DropboxAuth),
    Yandex(YandexAuth),
}

/// Construct an authenticated backend for the configured provider.
///
/// Each invocation opens a fresh handle; nothing is cached across runs.
pub async fn connect(
    auth: ProviderAuth,
    chunk_size: usize,
) -> FcloudResult<Arc<dyn StorageBackend>> {
    match auth {
        ProviderAuth::Dropbox(auth) => {
            Ok(Arc::new(DropboxBackend::connect(auth, chunk_size).await?))
        }
        ProviderAuth::Yandex(auth) => Ok(Arc::new(YandexBackend::new(auth, chunk_size))),
    }
}
