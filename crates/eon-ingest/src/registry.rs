//! The night registry: which nights have exposures and which are curated.
//!
//! Published nightly as JSON next to the end-of-night products:
//!
//! ```json
//! { "rundate": "2024-01-03T12:00:00Z",
//!   "nights": { "20240101": { "expids": [123450, "123456"], "EON": 123456 } } }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use eon_common::{parse_timestamp, EonResult, ExposureId, Night};
use eon_decode::decode_utf8;
use eon_fetch::{RetrievalPipeline, SourceRoot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Registry age after which its status is reported as a warning.
pub const DEFAULT_STALE_AFTER_DAYS: f64 = 1.5;

/// Calendar classification of a night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NightAvailability {
    /// No exposures were taken
    NoData,
    /// A curated end-of-night exposure exists
    Available,
    /// Exposures exist but nothing was curated
    Missing,
}

/// Registry facts about one night.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NightEntry {
    pub exposure_ids: Vec<String>,
    /// Curated end-of-night exposure as listed, not yet validated
    pub curated_exposure_id: Option<String>,
}

impl NightEntry {
    pub fn exposure_count(&self) -> usize {
        self.exposure_ids.len()
    }

    pub fn is_curated(&self) -> bool {
        self.curated_exposure_id.is_some()
    }

    /// The curated exposure, if it is a valid exposure id.
    pub fn curated(&self) -> Option<ExposureId> {
        self.curated_exposure_id
            .as_deref()
            .and_then(|raw| ExposureId::parse(raw).ok())
    }

    pub fn availability(&self) -> NightAvailability {
        if self.exposure_ids.is_empty() {
            NightAvailability::NoData
        } else if self.is_curated() {
            NightAvailability::Available
        } else {
            NightAvailability::Missing
        }
    }
}

/// How recently the registry was generated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryStatus {
    pub rundate: String,
    pub age_days: f64,
    pub stale: bool,
}

impl RegistryStatus {
    pub fn message(&self) -> String {
        format!(
            "Endofnight script ran at {} ({:.1} days ago)",
            self.rundate, self.age_days
        )
    }
}

#[derive(Deserialize)]
struct RawRegistry {
    #[serde(default)]
    rundate: Option<String>,
    #[serde(default)]
    nights: BTreeMap<String, RawNight>,
}

#[derive(Deserialize)]
struct RawNight {
    #[serde(default)]
    expids: Vec<Value>,
    #[serde(rename = "EON", default)]
    eon: Value,
}

/// Read-only index of nights.
#[derive(Debug, Clone, Default)]
pub struct NightRegistry {
    rundate: Option<String>,
    nights: BTreeMap<Night, NightEntry>,
}

impl NightRegistry {
    pub fn from_json(text: &str) -> EonResult<Self> {
        let raw: RawRegistry = serde_json::from_str(text)?;
        let mut nights = BTreeMap::new();
        for (key, entry) in raw.nights {
            let night = match Night::parse(&key) {
                Ok(night) => night,
                Err(_) => {
                    warn!(night = %key, "Skipping invalid night in registry");
                    continue;
                }
            };
            nights.insert(
                night,
                NightEntry {
                    exposure_ids: entry.expids.iter().filter_map(id_text).collect(),
                    curated_exposure_id: curated_text(&entry.eon),
                },
            );
        }
        Ok(Self {
            rundate: raw.rundate,
            nights,
        })
    }

    /// Fetch `name` from `root` and parse it.
    ///
    /// The dashboard works without a registry, so any failure yields an
    /// empty registry and a warning.
    #[instrument(skip(pipeline, root), fields(root = %root))]
    pub async fn load(pipeline: &RetrievalPipeline, root: &SourceRoot, name: &str) -> Self {
        let fetched = pipeline
            .fetch_named_asset(std::slice::from_ref(root), name, |location| {
                debug!(location = %location, "Loading night registry")
            })
            .await;
        let parsed = fetched.and_then(|raw| Self::from_json(&decode_utf8(&raw.body)?));

        match parsed {
            Ok(registry) => {
                info!(
                    nights = registry.len(),
                    rundate = ?registry.rundate,
                    "Loaded night registry"
                );
                registry
            }
            Err(e) => {
                warn!(error = %e, "Unable to load night registry");
                Self::default()
            }
        }
    }

    pub fn get(&self, night: &Night) -> Option<&NightEntry> {
        self.nights.get(night)
    }

    /// Nights in ascending order.
    pub fn nights(&self) -> impl Iterator<Item = (&Night, &NightEntry)> {
        self.nights.iter()
    }

    pub fn len(&self) -> usize {
        self.nights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nights.is_empty()
    }

    /// The most recent listed night.
    pub fn default_night(&self) -> Option<&Night> {
        self.nights.keys().next_back()
    }

    /// `None` for nights the registry does not list.
    pub fn availability(&self, night: &Night) -> Option<NightAvailability> {
        self.get(night).map(NightEntry::availability)
    }

    pub fn rundate(&self) -> Option<&str> {
        self.rundate.as_deref()
    }

    /// Age of the registry at `now`; `None` without a parseable rundate.
    pub fn status(&self, now: DateTime<Utc>, stale_after_days: f64) -> Option<RegistryStatus> {
        let rundate = self.rundate.as_ref()?;
        let generated = parse_timestamp(rundate).ok()?;
        let age_days = (now - generated).num_milliseconds() as f64 / 86_400_000.0;
        Some(RegistryStatus {
            rundate: rundate.clone(),
            age_days,
            stale: age_days > stale_after_days,
        })
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Null, zero and empty strings all mean "not curated".
fn curated_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Bool(_) => None,
        other => id_text(other),
    }
}
