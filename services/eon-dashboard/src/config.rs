//! Dashboard configuration, loaded from an optional YAML file.

use std::path::Path;

use anyhow::{Context, Result};
use eon_fetch::{FetchConfig, SourceRoot};
use eon_ingest::registry::DEFAULT_STALE_AFTER_DAYS;
use eon_ingest::resolver::{DEFAULT_DATA_ROOT, DEFAULT_EON_ROOT, DEFAULT_LOCAL_ROOT};
use eon_ingest::SourceRoots;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Curated end-of-night mirror
    pub eon_root: String,
    /// Raw data tree
    pub data_root: String,
    /// Root for `--local` nights (URL or directory)
    pub local_root: String,
    /// Night registry file name, relative to `eon_root`
    pub registry: String,
    pub fetch: FetchConfig,
    pub stale_after_days: f64,
    pub status_port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            eon_root: DEFAULT_EON_ROOT.to_string(),
            data_root: DEFAULT_DATA_ROOT.to_string(),
            local_root: DEFAULT_LOCAL_ROOT.to_string(),
            registry: "assets.json".to_string(),
            fetch: FetchConfig::default(),
            stale_after_days: DEFAULT_STALE_AFTER_DAYS,
            status_port: 8090,
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: DashboardConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "Loaded dashboard config");
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                info!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn source_roots(&self) -> Result<SourceRoots> {
        let parse = |name: &str, location: &str| {
            SourceRoot::parse(location).with_context(|| format!("Invalid {}: {}", name, location))
        };
        Ok(SourceRoots {
            eon_root: parse("eon_root", &self.eon_root)?,
            data_root: parse("data_root", &self.data_root)?,
            local_root: parse("local_root", &self.local_root)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data_root: https://mirror.test/data/\nfetch:\n  request_timeout_secs: 5").unwrap();

        let config = DashboardConfig::load(file.path()).unwrap();
        assert_eq!(config.data_root, "https://mirror.test/data/");
        assert_eq!(config.fetch.request_timeout_secs, 5);
        assert_eq!(config.fetch.connect_timeout_secs, 10);
        assert_eq!(config.eon_root, DEFAULT_EON_ROOT);
        assert_eq!(config.stale_after_days, 1.5);
    }

    #[test]
    fn test_source_roots() {
        let config = DashboardConfig::default();
        let roots = config.source_roots().unwrap();
        assert!(roots.eon_root.is_http());
        assert!(!roots.local_root.is_http());
    }

    #[test]
    fn test_invalid_root_is_reported() {
        let config = DashboardConfig {
            eon_root: "https://[broken".into(),
            ..DashboardConfig::default()
        };
        let err = config.source_roots().unwrap_err();
        assert!(err.to_string().contains("eon_root"));
    }

    #[test]
    fn test_missing_file() {
        assert!(DashboardConfig::load(Path::new("/nonexistent/dashboard.yaml")).is_err());
    }

    #[test]
    fn test_shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/dashboard.yaml");
        let config = DashboardConfig::load(&path).unwrap();
        assert_eq!(config, DashboardConfig::default());
    }
}
