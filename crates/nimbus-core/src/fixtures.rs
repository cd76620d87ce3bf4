//! In-memory EXIF builders for tests.
//!
//! Produces minimal little-endian TIFF directories and wraps them in a JPEG
//! APP1 segment, so tests never depend on binary files on disk.

use crate::gps::{self, Axis, Rational};

const TYPE_ASCII: u16 = 2;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;

const TAG_DATE_TIME: u16 = 0x0132;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_GPS_IFD: u16 = 0x8825;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
const TAG_DATE_TIME_DIGITIZED: u16 = 0x9004;
const TAG_GPS_LAT_REF: u16 = 0x0001;
const TAG_GPS_LAT: u16 = 0x0002;
const TAG_GPS_LON_REF: u16 = 0x0003;
const TAG_GPS_LON: u16 = 0x0004;

/// Raw GPS tag values, written exactly as given.
#[derive(Debug, Clone)]
pub struct GpsFixture {
    pub lat_ref: String,
    pub lat: [Rational; 3],
    pub lon_ref: String,
    pub lon: [Rational; 3],
}

impl GpsFixture {
    /// Encode signed decimal coordinates the way a camera would.
    pub fn from_decimal(latitude: f64, longitude: f64) -> Self {
        let (lat, lat_ref) = gps::encode(latitude, Axis::Latitude);
        let (lon, lon_ref) = gps::encode(longitude, Axis::Longitude);
        Self {
            lat_ref: lat_ref.as_ref_str().to_string(),
            lat: [lat.degrees, lat.minutes, lat.seconds],
            lon_ref: lon_ref.as_ref_str().to_string(),
            lon: [lon.degrees, lon.minutes, lon.seconds],
        }
    }
}

/// Builder for an EXIF payload.
#[derive(Debug, Clone, Default)]
pub struct ExifFixture {
    pub date_time: Option<String>,
    pub date_time_original: Option<String>,
    pub date_time_digitized: Option<String>,
    pub gps: Option<GpsFixture>,
}

struct Entry {
    tag: u16,
    kind: u16,
    count: u32,
    data: Vec<u8>,
}

impl Entry {
    fn ascii(tag: u16, value: &str) -> Self {
        let mut data = value.as_bytes().to_vec();
        data.push(0);
        Self {
            tag,
            kind: TYPE_ASCII,
            count: data.len() as u32,
            data,
        }
    }

    fn long(tag: u16, value: u32) -> Self {
        Self {
            tag,
            kind: TYPE_LONG,
            count: 1,
            data: value.to_le_bytes().to_vec(),
        }
    }

    fn rationals(tag: u16, values: &[Rational]) -> Self {
        let mut data = Vec::with_capacity(values.len() * 8);
        for r in values {
            data.extend_from_slice(&r.num.to_le_bytes());
            data.extend_from_slice(&r.denom.to_le_bytes());
        }
        Self {
            tag,
            kind: TYPE_RATIONAL,
            count: values.len() as u32,
            data,
        }
    }

    fn external_len(&self) -> u32 {
        if self.data.len() <= 4 {
            0
        } else {
            (self.data.len() + self.data.len() % 2) as u32
        }
    }
}

fn block_len(entries: &[Entry]) -> u32 {
    2 + 12 * entries.len() as u32 + 4 + entries.iter().map(Entry::external_len).sum::<u32>()
}

fn write_ifd(out: &mut Vec<u8>, start: u32, entries: &[Entry]) {
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    let mut data_offset = start + 2 + 12 * entries.len() as u32 + 4;
    let mut data = Vec::new();
    for entry in entries {
        out.extend_from_slice(&entry.tag.to_le_bytes());
        out.extend_from_slice(&entry.kind.to_le_bytes());
        out.extend_from_slice(&entry.count.to_le_bytes());
        if entry.data.len() <= 4 {
            let mut inline = entry.data.clone();
            inline.resize(4, 0);
            out.extend_from_slice(&inline);
        } else {
            out.extend_from_slice(&data_offset.to_le_bytes());
            data.extend_from_slice(&entry.data);
            if entry.data.len() % 2 == 1 {
                data.push(0);
            }
            data_offset += entry.external_len();
        }
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&data);
}

impl ExifFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_time(mut self, value: &str) -> Self {
        self.date_time = Some(value.to_string());
        self
    }

    pub fn with_date_time_original(mut self, value: &str) -> Self {
        self.date_time_original = Some(value.to_string());
        self
    }

    pub fn with_date_time_digitized(mut self, value: &str) -> Self {
        self.date_time_digitized = Some(value.to_string());
        self
    }

    pub fn with_gps(mut self, latitude: f64, longitude: f64) -> Self {
        self.gps = Some(GpsFixture::from_decimal(latitude, longitude));
        self
    }

    pub fn with_raw_gps(mut self, gps: GpsFixture) -> Self {
        self.gps = Some(gps);
        self
    }

    /// Little-endian TIFF payload (what follows `Exif\0\0` in a JPEG).
    pub fn tiff(&self) -> Vec<u8> {
        let mut exif_entries = Vec::new();
        if let Some(v) = &self.date_time_original {
            exif_entries.push(Entry::ascii(TAG_DATE_TIME_ORIGINAL, v));
        }
        if let Some(v) = &self.date_time_digitized {
            exif_entries.push(Entry::ascii(TAG_DATE_TIME_DIGITIZED, v));
        }

        let gps_entries: Vec<Entry> = match &self.gps {
            Some(g) => vec![
                Entry::ascii(TAG_GPS_LAT_REF, &g.lat_ref),
                Entry::rationals(TAG_GPS_LAT, &g.lat),
                Entry::ascii(TAG_GPS_LON_REF, &g.lon_ref),
                Entry::rationals(TAG_GPS_LON, &g.lon),
            ],
            None => Vec::new(),
        };

        let mut ifd0 = Vec::new();
        if let Some(v) = &self.date_time {
            ifd0.push(Entry::ascii(TAG_DATE_TIME, v));
        }
        if !exif_entries.is_empty() {
            ifd0.push(Entry::long(TAG_EXIF_IFD, 0));
        }
        if !gps_entries.is_empty() {
            ifd0.push(Entry::long(TAG_GPS_IFD, 0));
        }

        // Pointer entries are inline, so sizes are known before their values.
        let ifd0_start = 8u32;
        let exif_start = ifd0_start + block_len(&ifd0);
        let gps_start = exif_start
            + if exif_entries.is_empty() {
                0
            } else {
                block_len(&exif_entries)
            };
        for entry in ifd0.iter_mut() {
            match entry.tag {
                TAG_EXIF_IFD => entry.data = exif_start.to_le_bytes().to_vec(),
                TAG_GPS_IFD => entry.data = gps_start.to_le_bytes().to_vec(),
                _ => {}
            }
        }

        let mut out = Vec::new();
        out.extend_from_slice(b"II");
        out.extend_from_slice(&42u16.to_le_bytes());
        out.extend_from_slice(&ifd0_start.to_le_bytes());
        write_ifd(&mut out, ifd0_start, &ifd0);
        if !exif_entries.is_empty() {
            write_ifd(&mut out, exif_start, &exif_entries);
        }
        if !gps_entries.is_empty() {
            write_ifd(&mut out, gps_start, &gps_entries);
        }
        out
    }

    /// A minimal JPEG carrying the payload in an APP1 segment.
    pub fn jpeg(&self) -> Vec<u8> {
        let tiff = self.tiff();
        let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
        let segment_len = (2 + 6 + tiff.len()) as u16;
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(b"Exif\0\0");
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    }
}

/// A JPEG with a JFIF header and no metadata.
pub fn plain_jpeg() -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    out.extend_from_slice(b"JFIF\0");
    out.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiff_header_and_ifd_count() {
        let tiff = ExifFixture::new().with_date_time("2024:01:02 03:04:05").tiff();
        assert_eq!(&tiff[0..4], b"II*\0");
        assert_eq!(u32::from_le_bytes([tiff[4], tiff[5], tiff[6], tiff[7]]), 8);
        assert_eq!(u16::from_le_bytes([tiff[8], tiff[9]]), 1);
    }

    #[test]
    fn test_jpeg_wraps_payload() {
        let jpeg = ExifFixture::new().with_gps(1.0, 2.0).jpeg();
        assert_eq!(&jpeg[0..4], &[0xFF, 0xD8, 0xFF, 0xE1]);
        assert_eq!(&jpeg[6..12], b"Exif\0\0");
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_plain_jpeg_is_jpeg() {
        assert_eq!(infer::get(&plain_jpeg()).map(|t| t.mime_type()), Some("image/jpeg"));
    }
}
