//! Capture validation: the only stage allowed to reject a submission.
//!
//! Checks, in order:
//! 1. Non-empty buffer
//! 2. Size limit
//! 3. Declared content type is `image/*`, or sniffed as an image when undeclared
//! 4. Magic bytes do not identify an executable

use tracing::debug;

use crate::defaults::IMAGE_CONTENT_PREFIX;
use crate::error::{Error, Result};
use crate::models::RawCapture;

/// Detect a MIME type from magic bytes.
pub fn sniff_content_type(data: &[u8]) -> Option<&'static str> {
    infer::get(data).map(|kind| kind.mime_type())
}

/// Whether a MIME string names an image type.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with(IMAGE_CONTENT_PREFIX)
}

/// Validate a capture before any processing.
pub fn validate_capture(capture: &RawCapture, max_bytes: usize) -> Result<()> {
    if capture.is_empty() {
        return Err(Error::InvalidInput("image is empty".to_string()));
    }
    if capture.len() > max_bytes {
        return Err(Error::InvalidInput(format!(
            "image is {} bytes, limit is {} bytes",
            capture.len(),
            max_bytes
        )));
    }

    let sniffed = sniff_content_type(capture.bytes());
    match capture.content_type() {
        Some(declared) if !is_image_mime(declared) => {
            return Err(Error::InvalidInput(format!(
                "content type '{}' is not an image",
                declared
            )));
        }
        Some(_) => {}
        None => {
            if !sniffed.map(is_image_mime).unwrap_or(false) {
                return Err(Error::InvalidInput(
                    "content type missing and bytes are not a recognized image".to_string(),
                ));
            }
        }
    }

    if infer::is_app(capture.bytes()) {
        return Err(Error::InvalidInput(format!(
            "executable content ({}) declared as image",
            sniffed.unwrap_or("unknown")
        )));
    }

    debug!(
        subsystem = "pipeline",
        op = "validate",
        image_len = capture.len(),
        declared = capture.content_type().unwrap_or("none"),
        sniffed = sniffed.unwrap_or("unknown"),
        "Capture accepted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::MAX_IMAGE_BYTES;
    use crate::fixtures::plain_jpeg;

    #[test]
    fn test_accepts_declared_image() {
        let capture = RawCapture::new(plain_jpeg(), Some("image/jpeg"));
        assert!(validate_capture(&capture, MAX_IMAGE_BYTES).is_ok());
    }

    #[test]
    fn test_declared_image_is_trusted_without_magic() {
        let capture = RawCapture::new(b"opaque bytes".to_vec(), Some("IMAGE/HEIC"));
        assert!(validate_capture(&capture, MAX_IMAGE_BYTES).is_ok());
    }

    #[test]
    fn test_rejects_empty() {
        let capture = RawCapture::new(Vec::new(), Some("image/jpeg"));
        let err = validate_capture(&capture, MAX_IMAGE_BYTES).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_rejects_oversized() {
        let capture = RawCapture::new(vec![0u8; 101], Some("image/png"));
        assert!(validate_capture(&capture, 100).is_err());
        let at_limit = RawCapture::new(vec![0u8; 100], Some("image/png"));
        assert!(validate_capture(&at_limit, 100).is_ok());
    }

    #[test]
    fn test_rejects_non_image_content_type() {
        let capture = RawCapture::new(plain_jpeg(), Some("application/pdf"));
        let err = validate_capture(&capture, MAX_IMAGE_BYTES).unwrap_err();
        assert!(err.to_string().contains("application/pdf"));
    }

    #[test]
    fn test_undeclared_content_type_is_sniffed() {
        let jpeg = RawCapture::new(plain_jpeg(), None);
        assert!(validate_capture(&jpeg, MAX_IMAGE_BYTES).is_ok());

        let text = RawCapture::new(b"just some text".to_vec(), None);
        assert!(validate_capture(&text, MAX_IMAGE_BYTES).is_err());
    }

    #[test]
    fn test_rejects_executable_declared_as_image() {
        let mut elf = vec![0x7F, b'E', b'L', b'F', 2, 1, 1, 0];
        elf.resize(64, 0);
        let capture = RawCapture::new(elf, Some("image/png"));
        assert!(validate_capture(&capture, MAX_IMAGE_BYTES).is_err());
    }

    #[test]
    fn test_is_image_mime() {
        assert!(is_image_mime("image/webp"));
        assert!(is_image_mime(" Image/JPEG"));
        assert!(!is_image_mime("text/plain"));
    }
}
