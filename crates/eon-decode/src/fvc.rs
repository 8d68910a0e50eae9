//! Fibre View Camera images.
//!
//! Images are handed to the visualization layer as-is; decoding only sniffs
//! the format and reads the dimensions so a corrupt payload fails early.

use std::io::Cursor;

use bytes::Bytes;
use eon_common::{EonResult, FormatError};
use image::ImageFormat;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::{Decoder, RawAsset};

/// A validated, still-encoded image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHandle {
    pub source: String,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Bytes,
}

impl ImageHandle {
    pub fn mime_type(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Tiff => "image/tiff",
            _ => "application/octet-stream",
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Pixel data is left out; clients fetch the image from `source`.
impl Serialize for ImageHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ImageHandle", 5)?;
        s.serialize_field("source", &self.source)?;
        s.serialize_field("mime_type", self.mime_type())?;
        s.serialize_field("width", &self.width)?;
        s.serialize_field("height", &self.height)?;
        s.serialize_field("size_bytes", &self.bytes.len())?;
        s.end()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl ImageDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for ImageDecoder {
    type Output = ImageHandle;

    fn decode(&self, asset: &RawAsset) -> EonResult<ImageHandle> {
        let reader = image::io::Reader::new(Cursor::new(asset.body.as_ref()))
            .with_guessed_format()
            .map_err(|e| FormatError::Image(e.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| FormatError::Image("unrecognized image format".into()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| FormatError::Image(e.to_string()))?;

        Ok(ImageHandle {
            source: asset.source.clone(),
            format,
            width,
            height,
            bytes: asset.body.clone(),
        })
    }
}
