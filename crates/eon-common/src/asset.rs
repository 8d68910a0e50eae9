//! The six per-night assets and their naming conventions.

use std::fmt;

use serde::Serialize;

use crate::night::Night;

/// One of the per-night diagnostic assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Positioner moves, gzip-compressed CSV
    Moves,
    /// Positioner hardware tables, gzip-compressed CSV
    HwTables,
    /// Focal-plane summary, Enhanced CSV
    Summary,
    /// Calibration updates, plain CSV
    Calib,
    /// Front-illuminated FVC image
    FrontImage,
    /// Back-illuminated FVC image
    BackImage,
}

/// All assets in launch order.
pub const ALL_ASSETS: [AssetKind; 6] = [
    AssetKind::Moves,
    AssetKind::HwTables,
    AssetKind::Summary,
    AssetKind::Calib,
    AssetKind::FrontImage,
    AssetKind::BackImage,
];

impl AssetKind {
    /// File name of this asset relative to a night's source root.
    pub fn file_name(&self, night: &Night) -> String {
        match self {
            AssetKind::Moves => format!("moves-{}.csv.gz", night),
            AssetKind::HwTables => format!("hwtables-{}.csv.gz", night),
            AssetKind::Summary => format!("fp-{}.ecsv", night),
            AssetKind::Calib => format!("calib-{}.csv", night),
            AssetKind::FrontImage => format!("fvc-front-{}.jpg", night),
            AssetKind::BackImage => format!("fvc-back-{}.jpg", night),
        }
    }

    /// Key under which the decoded value is published.
    pub fn publish_key(&self) -> &'static str {
        match self {
            AssetKind::Moves => "theMoves",
            AssetKind::HwTables => "theHWTables",
            AssetKind::Summary => "theSummary",
            AssetKind::Calib => "theCalib",
            AssetKind::FrontImage => "theFront",
            AssetKind::BackImage => "theBack",
        }
    }

    /// Inverse of [`AssetKind::publish_key`].
    pub fn from_publish_key(key: &str) -> Option<Self> {
        ALL_ASSETS.iter().copied().find(|a| a.publish_key() == key)
    }

    /// Human-readable label used in status messages.
    pub fn label(&self) -> &'static str {
        match self {
            AssetKind::Moves => "moves",
            AssetKind::HwTables => "hwtables",
            AssetKind::Summary => "summary",
            AssetKind::Calib => "calibration updates",
            AssetKind::FrontImage => "front-illuminated image",
            AssetKind::BackImage => "back-illuminated image",
        }
    }

    /// Short identifier, matching the serialized form.
    pub fn slug(&self) -> &'static str {
        match self {
            AssetKind::Moves => "moves",
            AssetKind::HwTables => "hw_tables",
            AssetKind::Summary => "summary",
            AssetKind::Calib => "calib",
            AssetKind::FrontImage => "front_image",
            AssetKind::BackImage => "back_image",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        let night = Night::parse("20240315").unwrap();
        assert_eq!(AssetKind::Moves.file_name(&night), "moves-20240315.csv.gz");
        assert_eq!(AssetKind::Summary.file_name(&night), "fp-20240315.ecsv");
        assert_eq!(AssetKind::BackImage.file_name(&night), "fvc-back-20240315.jpg");
    }

    #[test]
    fn test_publish_keys_round_trip() {
        for asset in ALL_ASSETS {
            assert_eq!(AssetKind::from_publish_key(asset.publish_key()), Some(asset));
        }
        assert_eq!(AssetKind::from_publish_key("theNothing"), None);
    }
}
