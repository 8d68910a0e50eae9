//! Source roots: base locations that asset names are resolved against.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use eon_common::{EonError, EonResult};
use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A base location for retrieval: an HTTP(S) URL or a local directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceRoot {
    Http(Url),
    Directory(PathBuf),
}

impl SourceRoot {
    /// `http://` and `https://` locations are URLs; anything else is a path.
    pub fn parse(location: &str) -> EonResult<Self> {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed).map_err(|e| {
                EonError::Transport(format!("Invalid source URL {}: {}", trimmed, e))
            })?;
            Ok(SourceRoot::Http(url))
        } else if trimmed.is_empty() {
            Err(EonError::Transport("Empty source location".to_string()))
        } else {
            Ok(SourceRoot::Directory(PathBuf::from(trimmed)))
        }
    }

    pub fn directory(path: impl AsRef<Path>) -> Self {
        SourceRoot::Directory(path.as_ref().to_path_buf())
    }

    /// Append one or more `/`-separated path segments.
    ///
    /// URL segments are percent-encoded as needed and an existing trailing
    /// slash does not produce an empty segment.
    pub fn join(&self, relative: &str) -> SourceRoot {
        let parts = relative.split('/').filter(|p| !p.is_empty());
        match self {
            SourceRoot::Http(url) => {
                let mut url = url.clone();
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.pop_if_empty();
                    segments.extend(parts);
                }
                SourceRoot::Http(url)
            }
            SourceRoot::Directory(path) => {
                let mut path = path.clone();
                path.extend(parts);
                SourceRoot::Directory(path)
            }
        }
    }

    pub fn is_http(&self) -> bool {
        matches!(self, SourceRoot::Http(_))
    }
}

impl fmt::Display for SourceRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRoot::Http(url) => f.write_str(url.as_str()),
            SourceRoot::Directory(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for SourceRoot {
    type Err = EonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceRoot::parse(s)
    }
}

impl Serialize for SourceRoot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SourceRoot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SourceRoot::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert!(SourceRoot::parse("https://example.org/data/").unwrap().is_http());
        assert!(!SourceRoot::parse("./local").unwrap().is_http());
        assert!(SourceRoot::parse("   ").is_err());
        assert!(SourceRoot::parse("http://[bad").is_err());
    }

    #[test]
    fn test_join_url_with_and_without_trailing_slash() {
        let with = SourceRoot::parse("https://example.org/eon/").unwrap();
        let without = SourceRoot::parse("https://example.org/eon").unwrap();
        assert_eq!(
            with.join("20240101").join("moves-20240101.csv.gz").to_string(),
            "https://example.org/eon/20240101/moves-20240101.csv.gz"
        );
        assert_eq!(with.join("20240101"), without.join("20240101"));
    }

    #[test]
    fn test_join_multi_segment() {
        let root = SourceRoot::parse("https://example.org/data/").unwrap();
        assert_eq!(
            root.join("20240101/00123456").to_string(),
            "https://example.org/data/20240101/00123456"
        );
    }

    #[test]
    fn test_join_directory() {
        let root = SourceRoot::directory("/tmp/local");
        assert_eq!(
            root.join("20240101").join("fp-20240101.ecsv"),
            SourceRoot::Directory(PathBuf::from("/tmp/local/20240101/fp-20240101.ecsv"))
        );
    }
}
