//! In-process host for a dashboard session.
//!
//! Plays the role of the page: every status slot keeps its latest line and
//! every asset key its latest published value, ready for the status API.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use eon_ingest::sink::AssetSummary;
use eon_ingest::{AssetSink, AssetValue, StatusLevel, StatusSlot};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// One status slot as shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct SlotStatus {
    pub slot: StatusSlot,
    pub level: StatusLevel,
    pub text: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct HostState {
    slots: BTreeMap<StatusSlot, SlotStatus>,
    published: BTreeMap<String, (AssetValue, DateTime<Utc>)>,
    resets: u64,
}

#[derive(Debug, Default)]
pub struct DashboardState {
    inner: RwLock<HostState>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HostState> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HostState> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All non-empty status lines, in slot order.
    pub fn slots(&self) -> Vec<SlotStatus> {
        self.read()
            .slots
            .values()
            .filter(|s| !s.text.is_empty())
            .cloned()
            .collect()
    }

    pub fn slot(&self, slot: StatusSlot) -> Option<SlotStatus> {
        self.read().slots.get(&slot).cloned()
    }

    pub fn published_keys(&self) -> Vec<String> {
        self.read().published.keys().cloned().collect()
    }

    pub fn asset_summary(&self, key: &str) -> Option<(AssetSummary, DateTime<Utc>)> {
        self.read()
            .published
            .get(key)
            .map(|(value, at)| (value.summary(), *at))
    }

    /// Number of night selections that reset the page.
    pub fn resets(&self) -> u64 {
        self.read().resets
    }
}

impl AssetSink for DashboardState {
    fn report_status(&self, slot: StatusSlot, level: StatusLevel, text: &str) {
        // Mirror the page into the service log.
        match level {
            StatusLevel::Info if !text.is_empty() => info!(slot = %slot, "{}", text),
            StatusLevel::Info => {}
            StatusLevel::Warn => warn!(slot = %slot, "{}", text),
            StatusLevel::Error => error!(slot = %slot, "{}", text),
        }
        self.write().slots.insert(
            slot,
            SlotStatus {
                slot,
                level,
                text: text.to_string(),
                updated_at: Utc::now(),
            },
        );
    }

    fn publish(&self, key: &str, value: AssetValue) {
        debug!(key = key, "Published asset");
        self.write()
            .published
            .insert(key.to_string(), (value, Utc::now()));
    }

    fn reset_prior_state(&self) {
        let mut state = self.write();
        state.published.clear();
        // The registry line describes the registry, not the night.
        state.slots.retain(|slot, _| *slot == StatusSlot::Registry);
        state.resets += 1;
    }
}
