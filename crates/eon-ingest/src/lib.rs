//! Night asset resolution and ingestion.
//!
//! # Flow
//!
//! ```text
//! Session::set_night
//!   -> validate night / exposure override
//!   -> resolve candidate sources (resolver)
//!   -> six concurrent pipelines: fetch (eon-fetch) -> decode (eon-decode)
//!   -> AssetSink::publish / AssetSink::report_status
//! ```
//!
//! The [`NightRegistry`] supplies curated exposure ids and per-night exposure
//! counts; the [`AssetSink`] is whatever hosts the dashboard.

pub mod registry;
pub mod resolver;
pub mod session;
pub mod sink;

pub use registry::{NightAvailability, NightEntry, NightRegistry, RegistryStatus};
pub use resolver::{resolve_sources, sources_message, SourceRoots};
pub use session::{AssetLoadResult, NightReport, Session, SetNightOptions};
pub use sink::{AssetSink, AssetValue, MemorySink, StatusLevel, StatusMessage, StatusSlot};
