//! EXIF metadata extraction for captured photographs.
//!
//! Recovers the GPS position and capture time embedded by the camera.
//! Extraction never fails: any missing, truncated or malformed directory
//! degrades to an empty [`ExtractedMetadata`].

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::io::Cursor;
use tracing::{debug, trace};

use crate::gps::{self, Axis, DmsTriple, Hemisphere, Rational};
use crate::models::{ExtractedMetadata, GeoPoint};

/// Marker preceding the TIFF payload in JPEG APP1 segments.
const EXIF_MARKER: &[u8] = b"Exif\0\0";

/// Fixed EXIF date layout.
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Containers kamadak-exif can read directly.
const SUPPORTED_CONTAINERS: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/tiff",
    "image/webp",
    "image/heif",
    "image/avif",
];

/// Where the metadata directory lives in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Locator {
    /// A recognized image container.
    Container,
    /// A bare TIFF payload starting at the given offset.
    RawTiff(usize),
}

/// Extract GPS and capture time from raw image bytes.
pub fn extract_metadata(data: &[u8]) -> ExtractedMetadata {
    let Some(locator) = locate(data) else {
        trace!(subsystem = "exif", op = "extract", image_len = data.len(), "No metadata directory");
        return ExtractedMetadata::default();
    };

    let Some(exif) = read_directory(data, locator) else {
        return ExtractedMetadata::default();
    };

    let metadata = ExtractedMetadata {
        gps_point: extract_point(&exif),
        capture_timestamp: extract_datetime(&exif),
    };
    debug!(
        subsystem = "exif",
        op = "extract",
        has_gps = metadata.gps_point.is_some(),
        has_time = metadata.capture_timestamp.is_some(),
        "Metadata extracted"
    );
    metadata
}

fn locate(data: &[u8]) -> Option<Locator> {
    if data.len() < 8 {
        return None;
    }
    if is_tiff_header(data) {
        return Some(Locator::RawTiff(0));
    }
    if let Some(kind) = infer::get(data) {
        if SUPPORTED_CONTAINERS.contains(&kind.mime_type()) {
            return Some(Locator::Container);
        }
    }
    find_marker(data).map(Locator::RawTiff)
}

fn is_tiff_header(data: &[u8]) -> bool {
    data.starts_with(b"II*\0") || data.starts_with(b"MM\0*")
}

/// Offset of the TIFF payload following an embedded `Exif\0\0` marker.
fn find_marker(data: &[u8]) -> Option<usize> {
    data.windows(EXIF_MARKER.len())
        .position(|w| w == EXIF_MARKER)
        .map(|pos| pos + EXIF_MARKER.len())
        .filter(|&start| start < data.len())
}

fn reader() -> exif::Reader {
    let mut reader = exif::Reader::new();
    reader.continue_on_error(true);
    reader
}

fn read_directory(data: &[u8], locator: Locator) -> Option<exif::Exif> {
    match locator {
        Locator::RawTiff(offset) => read_raw(&data[offset..]),
        Locator::Container => {
            let mut cursor = Cursor::new(data);
            match reader()
                .read_from_container(&mut cursor)
                .or_else(|e| e.distill_partial_result(|_| {}))
            {
                Ok(exif) => Some(exif),
                Err(e) => {
                    trace!(subsystem = "exif", op = "read_container", error = %e, "Container parse failed");
                    find_marker(data).and_then(|offset| read_raw(&data[offset..]))
                }
            }
        }
    }
}

fn read_raw(payload: &[u8]) -> Option<exif::Exif> {
    reader()
        .read_raw(payload.to_vec())
        .or_else(|e| e.distill_partial_result(|_| {}))
        .map_err(|e| trace!(subsystem = "exif", op = "read_raw", error = %e, "Raw TIFF parse failed"))
        .ok()
}

fn extract_point(exif: &exif::Exif) -> Option<GeoPoint> {
    let latitude = extract_axis(exif, exif::Tag::GPSLatitude, exif::Tag::GPSLatitudeRef, Axis::Latitude)?;
    let longitude = extract_axis(
        exif,
        exif::Tag::GPSLongitude,
        exif::Tag::GPSLongitudeRef,
        Axis::Longitude,
    )?;
    match GeoPoint::new(latitude, longitude) {
        Ok(point) => Some(point),
        Err(e) => {
            debug!(subsystem = "exif", op = "extract_gps", error = %e, "Discarding out-of-range GPS");
            None
        }
    }
}

fn extract_axis(exif: &exif::Exif, value_tag: exif::Tag, ref_tag: exif::Tag, axis: Axis) -> Option<f64> {
    let field = exif.get_field(value_tag, exif::In::PRIMARY)?;
    let triple = match &field.value {
        exif::Value::Rational(r) if r.len() >= 3 => DmsTriple::new(
            Rational::new(r[0].num, r[0].denom),
            Rational::new(r[1].num, r[1].denom),
            Rational::new(r[2].num, r[2].denom),
        ),
        _ => return None,
    };

    let reference = ascii_value(exif, ref_tag)?;
    let hemisphere = Hemisphere::from_ref(&reference).filter(|h| h.axis() == axis)?;

    match gps::from_dms(&triple, hemisphere) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(subsystem = "exif", op = "extract_gps", error = %e, "Discarding malformed GPS");
            None
        }
    }
}

/// Capture time: DateTimeOriginal > DateTimeDigitized > DateTime.
fn extract_datetime(exif: &exif::Exif) -> Option<DateTime<Utc>> {
    [
        exif::Tag::DateTimeOriginal,
        exif::Tag::DateTimeDigitized,
        exif::Tag::DateTime,
    ]
    .into_iter()
    .filter_map(|tag| ascii_value(exif, tag))
    .find_map(|raw| parse_exif_datetime(&raw))
}

fn ascii_value(exif: &exif::Exif, tag: exif::Tag) -> Option<String> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    match &field.value {
        exif::Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// Parse the `YYYY:MM:DD HH:MM:SS` layout, tolerating trailing NULs.
pub fn parse_exif_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let cleaned = raw.trim_end_matches('\0').trim();
    NaiveDateTime::parse_from_str(cleaned, EXIF_DATETIME_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
