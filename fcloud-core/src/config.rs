//! Engine configuration value object

use crate::backend::DEFAULT_CHUNK_SIZE;
use crate::path::RemotePath;

/// Default extension for link files.
pub const DEFAULT_CFL_EXTENSION: &str = ".cfl";

/// Validated configuration handed to the sync engine.
///
/// Config parsing and validation happen in the CLI; the engine only ever
/// sees this value object, constructed once per invocation. There is no
/// ambient or global config lookup inside core logic.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default remote root under which files are stored.
    pub main_folder: RemotePath,
    /// Extension appended to placeholder files, including the leading dot.
    pub cfl_extension: String,
    /// Transfer chunk size in bytes.
    pub chunk_size: usize,
}

impl Config {
    pub fn new(main_folder: RemotePath, cfl_extension: impl Into<String>) -> Self {
        Self {
            main_folder,
            cfl_extension: cfl_extension.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(RemotePath::new("/fcloud"), DEFAULT_CFL_EXTENSION)
    }
}
