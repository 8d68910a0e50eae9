//! Retrieval of per-night assets from an ordered list of candidate sources.
//!
//! A source is either an HTTP(S) base URL or a local directory. Candidates
//! are tried strictly in order and the first successful response wins; every
//! failed attempt is logged and the next candidate is tried.

pub mod config;
pub mod pipeline;
pub mod source;
pub mod status;
pub mod transport;

pub use config::FetchConfig;
pub use pipeline::RetrievalPipeline;
pub use source::SourceRoot;
pub use status::{classify_http_status, http_status_error, is_success};
pub use transport::{AssetTransport, FetchResponse, HttpTransport};
