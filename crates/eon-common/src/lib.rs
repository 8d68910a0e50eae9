//! Common types shared across the end-of-night dashboard crates.

pub mod asset;
pub mod error;
pub mod night;
pub mod time;

pub use asset::{AssetKind, ALL_ASSETS};
pub use error::{EonError, EonResult, ErrorKind, FormatError};
pub use night::{ExposureId, Night};
pub use time::{local_display_time, parse_timestamp, LOCAL_OFFSET_HOURS};
