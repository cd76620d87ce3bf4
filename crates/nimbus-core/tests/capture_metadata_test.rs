/// Integration tests for capture validation plus EXIF extraction, exercised
/// through the public crate API the way the pipeline uses it.
use chrono::{Datelike, Timelike};
use nimbus_core::fixtures::{plain_jpeg, ExifFixture};
use nimbus_core::gps::{self, Axis};
use nimbus_core::{
    extract_metadata, validate_capture, defaults, CloudFeatures, GenerationResult, RawCapture,
    StylePersona,
};

#[test]
fn test_tagged_jpeg_validates_and_extracts() {
    let bytes = ExifFixture::new()
        .with_gps(31.2304, 121.4737)
        .with_date_time_original("2025:03:08 07:45:00")
        .jpeg();
    let capture = RawCapture::new(bytes, Some("image/jpeg"));

    validate_capture(&capture, defaults::MAX_IMAGE_BYTES).expect("valid capture");
    let meta = extract_metadata(capture.bytes());

    let point = meta.gps_point.expect("gps");
    assert!((point.latitude() - 31.2304).abs() < 1e-4);
    assert!((point.longitude() - 121.4737).abs() < 1e-4);

    let ts = meta.capture_timestamp.expect("time");
    assert_eq!((ts.month(), ts.day(), ts.hour()), (3, 8, 7));
}

#[test]
fn test_untagged_jpeg_extracts_nothing() {
    let capture = RawCapture::new(plain_jpeg(), None);
    validate_capture(&capture, defaults::MAX_IMAGE_BYTES).expect("sniffed as jpeg");
    assert!(extract_metadata(capture.bytes()).is_empty());
}

#[test]
fn test_fixture_coordinates_match_codec() {
    // The fixture writes exactly what the codec encodes.
    for (lat, lon) in [(0.0, 0.0), (-45.123456, 170.987654), (89.9999, -179.9999)] {
        let meta = extract_metadata(&ExifFixture::new().with_gps(lat, lon).jpeg());
        let point = meta.gps_point.expect("gps");
        let (triple, hemi) = gps::encode(lat, Axis::Latitude);
        let expected = gps::from_dms(&triple, hemi).unwrap();
        assert!((point.latitude() - expected).abs() < 1e-9);
        assert!((point.longitude() - lon).abs() < 1e-4);
    }
}

#[test]
fn test_every_persona_fallback_is_usable() {
    for persona in StylePersona::ALL {
        let result = GenerationResult::fallback(persona, CloudFeatures::typical());
        assert!(!result.name().is_empty());
        assert!(!result.description().is_empty());
        assert!(result.origin().is_fallback());
        assert_eq!(result.persona(), persona);
    }
}
