//! fcloud core
//!
//! Link-file indirection and synchronization engine: offload local files to
//! a cloud-storage account, leaving a small local placeholder (a cloud file
//! link, CFL) that records where the content now lives.

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod link;
pub mod naming;
pub mod path;

pub use backend::{FileStat, RemoteEntry, StorageBackend};
pub use config::Config;
pub use engine::{SyncEngine, SyncReport};
pub use error::{FcloudError, FcloudResult};
pub use link::LinkCodec;
pub use path::RemotePath;
