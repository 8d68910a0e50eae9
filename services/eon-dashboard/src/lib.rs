//! Focal-plane end-of-night dashboard service library.
//!
//! Hosts an ingestion [`Session`](eon_ingest::Session) headlessly: decoded
//! assets and status lines land in [`state::DashboardState`] and are served
//! as JSON by the status API in [`server`].

pub mod config;
pub mod server;
pub mod state;
