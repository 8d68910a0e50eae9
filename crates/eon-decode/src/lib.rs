//! Decoders for end-of-night assets.
//!
//! # Architecture
//!
//! Every decoder turns a retrieved [`RawAsset`] into a structured value:
//!
//! - [`CompressedTableDecoder`] - gzip + CSV with per-cell type inference
//! - [`PlainTableDecoder`] - CSV with per-cell type inference
//! - [`ScientificTableDecoder`] - Enhanced CSV (YAML metadata + delimited body)
//! - [`ImageDecoder`] - FVC images, sniffed and measured but not rasterized
//!
//! Tables may be grouped into nested, insertion-ordered maps keyed by one or
//! more columns (see [`group`]).

pub mod compressed;
pub mod dsv;
pub mod ecsv;
pub mod group;
pub mod fvc;
pub mod table;
pub mod value;

use eon_common::EonResult;

pub use compressed::{decode_utf8, decompress_gzip, CompressedTableDecoder, PlainTableDecoder};
pub use dsv::parse_dsv;
pub use ecsv::{ColumnSpec, EcsvHeader, ScientificTable, ScientificTableDecoder, SummaryMeta};
pub use group::{group_by, GroupKey, GroupMap, Grouped};
pub use fvc::{ImageDecoder, ImageHandle};
pub use table::{DecodedTable, Row};
pub use value::{infer_cell, CellValue};

/// A retrieved payload together with the location it came from.
#[derive(Debug, Clone)]
pub struct RawAsset {
    /// Location the payload was retrieved from
    pub source: String,
    /// Undecoded payload
    pub body: bytes::Bytes,
}

impl RawAsset {
    pub fn new(source: impl Into<String>, body: impl Into<bytes::Bytes>) -> Self {
        Self {
            source: source.into(),
            body: body.into(),
        }
    }
}

/// A format-specific transform from a raw payload to structured data.
pub trait Decoder {
    type Output;

    fn decode(&self, asset: &RawAsset) -> EonResult<Self::Output>;
}
