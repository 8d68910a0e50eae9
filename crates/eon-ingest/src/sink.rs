//! The host side of ingestion: where decoded assets and status lines go.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use eon_common::AssetKind;
use eon_decode::{Grouped, ImageHandle, ScientificTable, SummaryMeta};
use serde::{Serialize, Serializer};

/// Severity of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

/// Named place a status line is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusSlot {
    /// Night-level advice and validation errors
    Summary,
    Title,
    DataUrl,
    /// Candidate source list
    Sources,
    /// Registry generation time
    Registry,
    /// Per-asset load progress
    Asset(AssetKind),
    SetupInfo,
    ParkInfo,
    IndexInfo,
    SnapshotInfo,
}

impl StatusSlot {
    pub fn name(&self) -> String {
        match self {
            StatusSlot::Summary => "summary".into(),
            StatusSlot::Title => "title".into(),
            StatusSlot::DataUrl => "data_url".into(),
            StatusSlot::Sources => "sources".into(),
            StatusSlot::Registry => "registry".into(),
            StatusSlot::Asset(kind) => format!("load_{}", kind.slug()),
            StatusSlot::SetupInfo => "setup_info".into(),
            StatusSlot::ParkInfo => "park_info".into(),
            StatusSlot::IndexInfo => "index_info".into(),
            StatusSlot::SnapshotInfo => "snapshot_info".into(),
        }
    }
}

impl fmt::Display for StatusSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for StatusSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

/// A status line as last reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

/// A decoded asset ready for the visualization layer.
#[derive(Debug, Clone)]
pub enum AssetValue {
    Grouped(Arc<Grouped>),
    ScientificTable(Arc<ScientificTable>),
    Image(Arc<ImageHandle>),
}

impl AssetValue {
    pub fn as_grouped(&self) -> Option<&Grouped> {
        match self {
            AssetValue::Grouped(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&ScientificTable> {
        match self {
            AssetValue::ScientificTable(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageHandle> {
        match self {
            AssetValue::Image(i) => Some(i),
            _ => None,
        }
    }

    /// Compact description for status APIs.
    pub fn summary(&self) -> AssetSummary {
        match self {
            AssetValue::Grouped(g) => AssetSummary::Grouped {
                groups: g.len(),
                rows: g.row_count(),
            },
            AssetValue::ScientificTable(t) => AssetSummary::ScientificTable {
                version: t.version,
                rows: t.rows.len(),
                columns: t.rows.columns().to_vec(),
                meta: t.summary_meta(),
            },
            AssetValue::Image(i) => AssetSummary::Image(i.as_ref().clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetSummary {
    Grouped {
        groups: usize,
        rows: usize,
    },
    ScientificTable {
        version: f64,
        rows: usize,
        columns: Vec<String>,
        meta: Option<SummaryMeta>,
    },
    Image(ImageHandle),
}

/// Receives everything a night load produces.
///
/// Implementations are shared between concurrent pipelines and must be
/// cheap: no I/O while holding internal locks.
pub trait AssetSink: Send + Sync {
    fn report_status(&self, slot: StatusSlot, level: StatusLevel, text: &str);

    /// Publish under one of the fixed asset keys (`theMoves`, `theSummary`, ...).
    fn publish(&self, key: &str, value: AssetValue);

    /// Forget everything published for the previous night.
    fn reset_prior_state(&self);
}

#[derive(Debug, Default)]
struct MemoryState {
    status: BTreeMap<StatusSlot, StatusMessage>,
    published: BTreeMap<String, AssetValue>,
    history: Vec<(StatusSlot, StatusMessage)>,
    resets: usize,
}

/// In-memory sink for headless use and tests. Keeps the latest line per
/// slot plus the full history.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<MemoryState>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self, slot: StatusSlot) -> Option<StatusMessage> {
        self.lock().status.get(&slot).cloned()
    }

    pub fn all_status(&self) -> BTreeMap<StatusSlot, StatusMessage> {
        self.lock().status.clone()
    }

    pub fn published(&self, key: &str) -> Option<AssetValue> {
        self.lock().published.get(key).cloned()
    }

    pub fn published_keys(&self) -> Vec<String> {
        self.lock().published.keys().cloned().collect()
    }

    /// Every status line ever reported, oldest first.
    pub fn history(&self) -> Vec<(StatusSlot, StatusMessage)> {
        self.lock().history.clone()
    }

    pub fn reset_count(&self) -> usize {
        self.lock().resets
    }
}

impl AssetSink for MemorySink {
    fn report_status(&self, slot: StatusSlot, level: StatusLevel, text: &str) {
        let message = StatusMessage {
            level,
            text: text.to_string(),
        };
        let mut state = self.lock();
        state.history.push((slot, message.clone()));
        state.status.insert(slot, message);
    }

    fn publish(&self, key: &str, value: AssetValue) {
        self.lock().published.insert(key.to_string(), value);
    }

    fn reset_prior_state(&self) {
        let mut state = self.lock();
        state.published.clear();
        state.status.clear();
        state.resets += 1;
    }
}
