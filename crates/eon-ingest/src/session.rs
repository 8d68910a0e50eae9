//! Night selection: validation, source resolution and the six asset pipelines.
//!
//! Selecting a night while an earlier selection is still loading does not
//! cancel the earlier pipelines. Each selection takes a new generation
//! number instead; status lines and published values from an older
//! generation are dropped at the sink boundary, so a slow response for one
//! night can never overwrite the assets of a newer one.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, Utc};
use eon_common::{
    local_display_time, AssetKind, EonError, EonResult, ErrorKind, ExposureId, Night, ALL_ASSETS,
};
use eon_decode::{
    CompressedTableDecoder, Decoder, PlainTableDecoder, RawAsset,
    ScientificTableDecoder, SummaryMeta,
};
use eon_fetch::{RetrievalPipeline, SourceRoot};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::registry::{NightAvailability, NightRegistry, RegistryStatus, DEFAULT_STALE_AFTER_DAYS};
use crate::resolver::{resolve_sources, sources_message, SourceRoots};
use crate::sink::{AssetSink, AssetValue, StatusLevel, StatusSlot};

/// Optional inputs to [`Session::set_night`].
#[derive(Debug, Clone, Default)]
pub struct SetNightOptions {
    /// Load from this exposure's raw-data directory instead of the curated mirror
    pub exposure_id_override: Option<String>,
    /// Load from the local root
    pub local: bool,
}

/// Lifecycle of one asset within one night selection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AssetLoadResult {
    Pending,
    Loading {
        source: String,
    },
    Success {
        #[serde(skip)]
        value: AssetValue,
        elapsed_ms: u64,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl AssetLoadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AssetLoadResult::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AssetLoadResult::Error { .. })
    }

    pub fn value(&self) -> Option<&AssetValue> {
        match self {
            AssetLoadResult::Success { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Outcome of one [`Session::set_night`] call once every pipeline settled.
#[derive(Debug, Clone, Serialize)]
pub struct NightReport {
    pub night: Night,
    pub generation: u64,
    pub sources: Vec<String>,
    pub assets: BTreeMap<AssetKind, AssetLoadResult>,
    /// A newer selection started before this one finished
    pub superseded: bool,
}

impl NightReport {
    pub fn result(&self, kind: AssetKind) -> Option<&AssetLoadResult> {
        self.assets.get(&kind)
    }

    pub fn succeeded(&self) -> usize {
        self.assets.values().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.assets.values().filter(|r| r.is_error()).count()
    }
}

#[derive(Debug, Default)]
struct SessionState {
    generation: u64,
    night: Option<Night>,
    assets: BTreeMap<AssetKind, AssetLoadResult>,
}

/// Dashboard session: the registry, the source roots and the host sink.
///
/// `Session` is `Send + Sync`; share it behind an `Arc` to select nights
/// from several tasks.
pub struct Session {
    pipeline: RetrievalPipeline,
    roots: SourceRoots,
    registry: Arc<NightRegistry>,
    sink: Arc<dyn AssetSink>,
    stale_after_days: f64,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(
        pipeline: RetrievalPipeline,
        roots: SourceRoots,
        registry: NightRegistry,
        sink: Arc<dyn AssetSink>,
    ) -> Self {
        Self {
            pipeline,
            roots,
            registry: Arc::new(registry),
            sink,
            stale_after_days: DEFAULT_STALE_AFTER_DAYS,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn with_stale_after_days(mut self, days: f64) -> Self {
        self.stale_after_days = days;
        self
    }

    pub fn registry(&self) -> &NightRegistry {
        &self.registry
    }

    pub fn roots(&self) -> &SourceRoots {
        &self.roots
    }

    /// The most recent night in the registry.
    pub fn default_night(&self) -> Option<Night> {
        self.registry.default_night().cloned()
    }

    pub fn availability(&self, night: &Night) -> Option<NightAvailability> {
        self.registry.availability(night)
    }

    /// The night of the latest selection, if any.
    pub fn current_night(&self) -> Option<Night> {
        self.lock_state().night.clone()
    }

    /// Per-asset lifecycle of the latest selection.
    pub fn asset_states(&self) -> BTreeMap<AssetKind, AssetLoadResult> {
        self.lock_state().assets.clone()
    }

    pub fn registry_status(&self, now: DateTime<Utc>) -> Option<RegistryStatus> {
        self.registry.status(now, self.stale_after_days)
    }

    /// Report the registry age to the `Registry` slot.
    pub fn report_registry_status(&self, now: DateTime<Utc>) -> Option<RegistryStatus> {
        let status = self.registry_status(now)?;
        let level = if status.stale {
            StatusLevel::Warn
        } else {
            StatusLevel::Info
        };
        self.sink
            .report_status(StatusSlot::Registry, level, &status.message());
        Some(status)
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Select `night` and load its six assets.
    ///
    /// Invalid input is reported to the `Summary` slot and returned without
    /// touching the network or the previously published assets. Otherwise
    /// every asset is loaded concurrently and failures stay local to their
    /// asset: the returned report always covers all six.
    #[instrument(skip(self, options), fields(local = options.local))]
    pub async fn set_night(&self, night: &str, options: SetNightOptions) -> EonResult<NightReport> {
        let (night, exposure) = match validate(night, options.exposure_id_override.as_deref()) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "Rejected night selection");
                self.sink
                    .report_status(StatusSlot::Summary, StatusLevel::Error, &e.to_string());
                return Err(e);
            }
        };

        let generation = self.begin(&night);
        let current = Generation {
            session: self,
            id: generation,
        };
        info!(night = %night, generation = generation, "Selecting night");

        current.report(
            StatusSlot::Title,
            StatusLevel::Info,
            &format!("{} Focalplane End-of-Night Summary", night),
        );
        current.report(
            StatusSlot::DataUrl,
            StatusLevel::Info,
            &format!("{} raw data at {}", night, self.roots.data_url(&night)),
        );

        if !options.local {
            match self.registry.get(&night).filter(|entry| entry.is_curated()) {
                Some(entry) => current.report(
                    StatusSlot::Summary,
                    StatusLevel::Info,
                    &format!("{} has {} positioning exposures", night, entry.exposure_count()),
                ),
                None => current.report(
                    StatusSlot::Summary,
                    StatusLevel::Warn,
                    &format!("{} is not listed in the assets", night),
                ),
            }
        }

        let sources = resolve_sources(
            &night,
            exposure.as_ref(),
            options.local,
            &self.registry,
            &self.roots,
        );
        let message = sources_message(&night, &sources);
        info!(night = %night, candidates = sources.len(), "{}", message);
        current.report(StatusSlot::Sources, StatusLevel::Info, &message);

        current.report(StatusSlot::SetupInfo, StatusLevel::Warn, "Looking up metadata...");
        for slot in [
            StatusSlot::ParkInfo,
            StatusSlot::IndexInfo,
            StatusSlot::SnapshotInfo,
        ] {
            current.report(slot, StatusLevel::Info, "");
        }

        let start = Instant::now();
        let (moves, hwtables, summary, calib, front, back) = futures::join!(
            self.load_asset(&current, &sources, &night, AssetKind::Moves, start),
            self.load_asset(&current, &sources, &night, AssetKind::HwTables, start),
            self.load_asset(&current, &sources, &night, AssetKind::Summary, start),
            self.load_asset(&current, &sources, &night, AssetKind::Calib, start),
            self.load_asset(&current, &sources, &night, AssetKind::FrontImage, start),
            self.load_asset(&current, &sources, &night, AssetKind::BackImage, start),
        );

        let assets: BTreeMap<AssetKind, AssetLoadResult> = ALL_ASSETS
            .into_iter()
            .zip([moves, hwtables, summary, calib, front, back])
            .collect();

        let report = NightReport {
            night,
            generation,
            sources: sources.iter().map(ToString::to_string).collect(),
            assets,
            superseded: !current.is_current(),
        };
        info!(
            night = %report.night,
            succeeded = report.succeeded(),
            failed = report.failed(),
            superseded = report.superseded,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "All assets settled"
        );
        Ok(report)
    }

    /// Start a new generation and clear the previous night's state.
    fn begin(&self, night: &Night) -> u64 {
        let mut state = self.lock_state();
        state.generation += 1;
        state.night = Some(night.clone());
        state.assets = ALL_ASSETS
            .into_iter()
            .map(|kind| (kind, AssetLoadResult::Pending))
            .collect();
        // Reset under the lock so no older generation can publish in between.
        self.sink.reset_prior_state();
        state.generation
    }

    async fn load_asset(
        &self,
        current: &Generation<'_>,
        sources: &[SourceRoot],
        night: &Night,
        kind: AssetKind,
        start: Instant,
    ) -> AssetLoadResult {
        let name = kind.file_name(night);
        let label = kind.label();
        let slot = StatusSlot::Asset(kind);

        let on_attempt = |location: &SourceRoot| {
            current.set_state(kind, AssetLoadResult::Loading {
                source: location.to_string(),
            });
            current.report(
                slot,
                StatusLevel::Warn,
                &format!("Loading {} from {}...", label, location),
            );
        };

        let loaded = match table_decoder(kind) {
            Some(decode) => match self.pipeline.fetch_named_asset(sources, &name, on_attempt).await {
                Ok(raw) => decode(&raw),
                Err(e) => Err(e),
            },
            None => self
                .pipeline
                .load_image_asset(sources, &name, on_attempt)
                .await
                .map(|image| AssetValue::Image(Arc::new(image))),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let result = match loaded {
            Ok(value) => {
                if let Some(table) = value.as_table() {
                    // Without a meta block every line reads "unknown".
                    report_summary_meta(current, &table.summary_meta().unwrap_or_default());
                }
                current.publish(kind.publish_key(), value.clone());
                current.report(
                    slot,
                    StatusLevel::Info,
                    &format!("Loaded {} in {}ms", label, elapsed_ms),
                );
                AssetLoadResult::Success { value, elapsed_ms }
            }
            Err(e) => {
                warn!(asset = %label, error = %e, "Asset failed to load");
                current.report(
                    slot,
                    StatusLevel::Error,
                    &format!("Failed to load {}: {}", label, e),
                );
                e.into()
            }
        };
        current.set_state(kind, result.clone());
        result
    }
}

fn validate(night: &str, exposure: Option<&str>) -> EonResult<(Night, Option<ExposureId>)> {
    let night = Night::parse(night)?;
    let exposure = exposure.map(ExposureId::parse).transpose()?;
    Ok((night, exposure))
}

type TableDecode = fn(&RawAsset) -> EonResult<AssetValue>;

/// Decoder for the tabular assets; `None` for images, which are validated
/// by the retrieval pipeline itself.
fn table_decoder(kind: AssetKind) -> Option<TableDecode> {
    let decode: TableDecode = match kind {
        AssetKind::Moves => decode_moves,
        AssetKind::HwTables => decode_hwtables,
        AssetKind::Summary => decode_summary,
        AssetKind::Calib => decode_calib,
        AssetKind::FrontImage | AssetKind::BackImage => return None,
    };
    Some(decode)
}

fn decode_moves(raw: &RawAsset) -> EonResult<AssetValue> {
    let grouped = CompressedTableDecoder::grouped_by(["location"]).decode(raw)?;
    Ok(AssetValue::Grouped(Arc::new(grouped)))
}

fn decode_hwtables(raw: &RawAsset) -> EonResult<AssetValue> {
    let grouped =
        CompressedTableDecoder::grouped_by(["posid", "exposure_id", "exp_iter"]).decode(raw)?;
    Ok(AssetValue::Grouped(Arc::new(grouped)))
}

fn decode_calib(raw: &RawAsset) -> EonResult<AssetValue> {
    let grouped = PlainTableDecoder::grouped_by(["location"]).decode(raw)?;
    Ok(AssetValue::Grouped(Arc::new(grouped)))
}

fn decode_summary(raw: &RawAsset) -> EonResult<AssetValue> {
    let table = ScientificTableDecoder::new().decode(raw)?;
    Ok(AssetValue::ScientificTable(Arc::new(table)))
}

fn report_summary_meta(current: &Generation<'_>, meta: &SummaryMeta) {
    let or_unknown = |value: &Option<String>| value.clone().unwrap_or_else(|| "unknown".into());
    let clock = |value: &Option<String>| match value {
        Some(time) => local_display_time(time).unwrap_or_else(|_| time.clone()),
        None => "unknown".into(),
    };

    current.report(
        StatusSlot::SetupInfo,
        StatusLevel::Info,
        &format!(
            "FP setup is expid {} at {}",
            or_unknown(&meta.setup_id),
            clock(&meta.setup_time)
        ),
    );
    current.report(
        StatusSlot::ParkInfo,
        StatusLevel::Info,
        &format!(
            "End-night park is expid {} at {}",
            or_unknown(&meta.park_id),
            clock(&meta.park_time)
        ),
    );
    current.report(
        StatusSlot::IndexInfo,
        StatusLevel::Info,
        &format!("Using index table {}", or_unknown(&meta.index_name)),
    );
    current.report(
        StatusSlot::SnapshotInfo,
        StatusLevel::Info,
        &format!("Using offline snapshot {}", or_unknown(&meta.snapshot)),
    );
}

/// Write access to the sink for one generation; stale writes are dropped.
struct Generation<'a> {
    session: &'a Session,
    id: u64,
}

impl Generation<'_> {
    fn is_current(&self) -> bool {
        self.session.lock_state().generation == self.id
    }

    fn report(&self, slot: StatusSlot, level: StatusLevel, text: &str) {
        let state = self.session.lock_state();
        if state.generation != self.id {
            debug!(generation = self.id, slot = %slot, "Dropping stale status");
            return;
        }
        self.session.sink.report_status(slot, level, text);
    }

    fn publish(&self, key: &str, value: AssetValue) {
        let state = self.session.lock_state();
        if state.generation != self.id {
            debug!(generation = self.id, key = key, "Dropping stale asset");
            return;
        }
        self.session.sink.publish(key, value);
    }

    fn set_state(&self, kind: AssetKind, result: AssetLoadResult) {
        let mut state = self.session.lock_state();
        if state.generation == self.id {
            state.assets.insert(kind, result);
        }
    }
}

impl From<EonError> for AssetLoadResult {
    fn from(err: EonError) -> Self {
        AssetLoadResult::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
