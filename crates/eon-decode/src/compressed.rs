//! CSV table decoders, with and without gzip compression.

use std::io::Read;

use bytes::Bytes;
use eon_common::{EonResult, FormatError};
use tracing::debug;

use crate::dsv::parse_dsv;
use crate::group::{group_by, Grouped};
use crate::{Decoder, RawAsset};

/// Decompress a single gzip stream.
pub fn decompress_gzip(data: &[u8]) -> EonResult<Bytes> {
    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| FormatError::Decompression(e.to_string()))?;
    Ok(Bytes::from(decompressed))
}

/// Decode a payload as UTF-8 text.
pub fn decode_utf8(data: &[u8]) -> EonResult<String> {
    String::from_utf8(data.to_vec())
        .map_err(|e| FormatError::Encoding(e.to_string()).into())
}

/// gzip-compressed CSV, optionally grouped by key columns.
#[derive(Debug, Clone, Default)]
pub struct CompressedTableDecoder {
    group_by: Vec<String>,
}

impl CompressedTableDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group decoded rows by these columns, outermost first.
    pub fn grouped_by<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_by: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Decoder for CompressedTableDecoder {
    type Output = Grouped;

    fn decode(&self, asset: &RawAsset) -> EonResult<Grouped> {
        let raw = decompress_gzip(&asset.body)?;
        debug!(
            source = %asset.source,
            compressed = asset.body.len(),
            decompressed = raw.len(),
            "Decompressed table"
        );
        let text = decode_utf8(&raw)?;
        let table = parse_dsv(&text, ',');
        Ok(group_by(&table, &self.group_by))
    }
}

/// Uncompressed CSV, optionally grouped by key columns.
#[derive(Debug, Clone, Default)]
pub struct PlainTableDecoder {
    group_by: Vec<String>,
}

impl PlainTableDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grouped_by<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_by: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Decoder for PlainTableDecoder {
    type Output = Grouped;

    fn decode(&self, asset: &RawAsset) -> EonResult<Grouped> {
        let text = decode_utf8(&asset.body)?;
        let table = parse_dsv(&text, ',');
        Ok(group_by(&table, &self.group_by))
    }
}
