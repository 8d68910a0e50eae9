//! Candidate source resolution for a night.

use eon_common::{ExposureId, Night};
use eon_fetch::SourceRoot;
use serde::Serialize;

use crate::registry::NightRegistry;

/// Curated end-of-night products, one directory per night.
pub const DEFAULT_EON_ROOT: &str = "https://data.desi.lbl.gov/desi/engineering/focalplane/endofnight/";

/// Raw spectroscopic data, `<night>/<expid>/` per exposure.
pub const DEFAULT_DATA_ROOT: &str = "https://data.desi.lbl.gov/desi/spectro/data/";

/// Hand-assembled nights for local mode.
pub const DEFAULT_LOCAL_ROOT: &str = "./local";

/// The three base locations sources are resolved against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRoots {
    pub eon_root: SourceRoot,
    pub data_root: SourceRoot,
    pub local_root: SourceRoot,
}

impl SourceRoots {
    /// Link to a night's raw data directory.
    pub fn data_url(&self, night: &Night) -> String {
        format!("{}/", self.data_root.join(night.as_str()))
    }
}

/// Ordered candidate locations for `night`. Never empty.
///
/// - local mode: `local_root/<night>` only
/// - explicit exposure: `data_root/<night>/<expid>` only
/// - otherwise `eon_root/<night>`, followed by `data_root/<night>/<expid>`
///   when the registry lists a valid curated exposure
pub fn resolve_sources(
    night: &Night,
    exposure_override: Option<&ExposureId>,
    local: bool,
    registry: &NightRegistry,
    roots: &SourceRoots,
) -> Vec<SourceRoot> {
    if local {
        return vec![roots.local_root.join(night.as_str())];
    }

    let night_data = roots.data_root.join(night.as_str());
    if let Some(expid) = exposure_override {
        return vec![night_data.join(expid.as_str())];
    }

    let mut sources = vec![roots.eon_root.join(night.as_str())];
    if let Some(curated) = registry.get(night).and_then(|entry| entry.curated()) {
        sources.push(night_data.join(curated.as_str()));
    }
    sources
}

/// `Looking for {night} assets in [ a , b ]`
pub fn sources_message(night: &Night, sources: &[SourceRoot]) -> String {
    let list = sources
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" , ");
    format!("Looking for {} assets in [ {} ]", night, list)
}
