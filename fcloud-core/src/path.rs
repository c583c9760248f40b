//! Remote path abstraction

use serde::{Deserialize, Serialize};
use std::fmt;

/// POSIX-style absolute path in the provider's namespace.
///
/// Remote paths are opaque to the engine beyond joining and splitting; the
/// rendered form always carries a leading slash so the persisted CFL format
/// stays byte-stable regardless of how the path was written in the config.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RemotePath {
    segments: Vec<String>,
}

impl RemotePath {
    pub fn new(path: impl AsRef<str>) -> Self {
        let segments = path
            .as_ref()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Self { segments }
    }

    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    pub fn join(&self, name: impl AsRef<str>) -> Self {
        let mut segments = self.segments.clone();
        for part in name.as_ref().split('/').filter(|s| !s.is_empty()) {
            segments.push(part.to_string());
        }
        Self { segments }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            let mut segments = self.segments.clone();
            segments.pop();
            Some(Self { segments })
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn to_path_string(&self) -> String {
        if self.segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", self.segments.join("/"))
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}

impl From<String> for RemotePath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<RemotePath> for String {
    fn from(p: RemotePath) -> Self {
        p.to_path_string()
    }
}

impl std::str::FromStr for RemotePath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let path = RemotePath::new("/main/folder");
        assert_eq!(path.segments(), ["main", "folder"]);
    }

    #[test]
    fn test_new_handles_empty_segments() {
        let path = RemotePath::new("//main//folder//");
        assert_eq!(path.segments(), ["main", "folder"]);
    }

    #[test]
    fn test_missing_leading_slash_is_normalized() {
        assert_eq!(RemotePath::new("main/folder"), RemotePath::new("/main/folder"));
    }

    #[test]
    fn test_root() {
        let root = RemotePath::root();
        assert!(root.is_root());
        assert_eq!(root.to_path_string(), "/");
        assert!(root.parent().is_none());
        assert!(root.name().is_none());
    }

    #[test]
    fn test_join() {
        let folder = RemotePath::new("/main");
        assert_eq!(folder.join("film.mp4").to_path_string(), "/main/film.mp4");
        assert_eq!(folder.join("a/b").to_path_string(), "/main/a/b");
    }

    #[test]
    fn test_parent_and_name() {
        let path = RemotePath::new("/main/folder/film.mp4");
        assert_eq!(path.name(), Some("film.mp4"));
        assert_eq!(path.parent().unwrap().to_path_string(), "/main/folder");
    }

    #[test]
    fn test_display() {
        let path = RemotePath::new("/docs/report.txt");
        assert_eq!(format!("{}", path), "/docs/report.txt");
    }

    #[test]
    fn test_from_str() {
        let path: RemotePath = "/main/folder".parse().unwrap();
        assert_eq!(path, RemotePath::new("/main/folder"));
    }
}
