//! Generators for binary test payloads.

use std::io::{Cursor, Write};

use flate2::write::GzEncoder;
use flate2::Compression;
use image::{ImageOutputFormat, Rgb, RgbImage};

use crate::fixtures::{calib_csv, hwtables_csv, moves_csv, summary_ecsv};

/// gzip-compress `data` into a single member stream.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .expect("Writing to an in-memory encoder cannot fail");
    encoder
        .finish()
        .expect("Finishing an in-memory encoder cannot fail")
}

/// A JPEG of the given size with a vertical gradient, so the encoder has
/// something other than a flat colour to compress.
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |_, y| {
        let level = ((y * 255) / height.max(1)) as u8;
        Rgb([level, level, 255 - level])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Jpeg(85))
        .expect("Encoding an in-memory JPEG cannot fail");
    out.into_inner()
}

/// All six assets of `night`, as `(file name, payload)` pairs.
///
/// Names follow the nightly product layout:
/// `moves-`, `hwtables-` (`.csv.gz`), `fp-` (`.ecsv`), `calib-` (`.csv`),
/// `fvc-front-` and `fvc-back-` (`.jpg`).
pub fn night_assets(night: &str) -> Vec<(String, Vec<u8>)> {
    vec![
        (
            format!("moves-{}.csv.gz", night),
            gzip(moves_csv(night).as_bytes()),
        ),
        (
            format!("hwtables-{}.csv.gz", night),
            gzip(hwtables_csv(night).as_bytes()),
        ),
        (format!("fp-{}.ecsv", night), summary_ecsv(night).into_bytes()),
        (format!("calib-{}.csv", night), calib_csv(night).into_bytes()),
        (format!("fvc-front-{}.jpg", night), jpeg(32, 24)),
        (format!("fvc-back-{}.jpg", night), jpeg(24, 32)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_gzip_round_trip() {
        let packed = gzip(b"location\n1\n");
        let mut out = String::new();
        flate2::read::GzDecoder::new(packed.as_slice())
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "location\n1\n");
    }

    #[test]
    fn test_jpeg_has_soi_marker() {
        let data = jpeg(8, 8);
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_night_assets_names() {
        let names: Vec<String> = night_assets("20240101").into_iter().map(|(n, _)| n).collect();
        assert_eq!(names.len(), 6);
        assert!(names.contains(&"fp-20240101.ecsv".to_string()));
        assert!(names.contains(&"fvc-back-20240101.jpg".to_string()));
    }
}
