//! QR code reading.
//!
//! A frame image holds two codes, so reading always returns every code
//! found rather than the first one.

use std::path::Path;

use image::DynamicImage;
use rqrr::PreparedImage;
use tracing::trace;

use super::QrError;

/// Reads every QR code in an image and returns their string contents.
///
/// Codes that are detected but fail to decode are skipped.
///
/// # Errors
/// [`QrError::NoQrCodeFound`] if nothing looks like a code, or
/// [`QrError::QrReadError`] if codes were found but none decoded.
pub fn read_packets(image: &DynamicImage) -> Result<Vec<String>, QrError> {
    let gray = image.to_luma8();
    let mut prepared = PreparedImage::prepare(gray);
    let grids = prepared.detect_grids();

    if grids.is_empty() {
        return Err(QrError::NoQrCodeFound);
    }

    let mut results = Vec::with_capacity(grids.len());
    for grid in &grids {
        match grid.decode() {
            Ok((_, content)) => results.push(content),
            Err(e) => trace!(error = ?e, "Skipping undecodable grid"),
        }
    }

    if results.is_empty() {
        return Err(QrError::QrReadError(format!(
            "Found {} QR codes but failed to decode any",
            grids.len()
        )));
    }

    Ok(results)
}

/// Reads every QR code in an image file.
pub fn read_packets_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, QrError> {
    let image = image::open(path).map_err(|e| QrError::QrReadError(e.to_string()))?;
    read_packets(&image)
}

#[cfg(test)]
mod tests {
    use super::super::generator::{render_frame, render_packet, QrConfig};
    use super::*;
    use crate::encoder::StreamEncoder;
    use crate::protocol::{parse_packet, Tier};
    use crate::transform::Transform;

    #[test]
    fn test_read_packet_roundtrip() {
        let packet = "\u{1}\u{0}\u{0}\u{9}hello world";
        let image = render_packet(packet, Tier::M, &QrConfig::default())
            .unwrap()
            .into_image()
            .unwrap();

        assert_eq!(read_packets(&image).unwrap(), vec![packet.to_string()]);
    }

    #[test]
    fn test_read_frame_returns_both_codes() {
        let enc = StreamEncoder::new(&"frame test ".repeat(40), Tier::Q, Transform::Plain).unwrap();
        let frame = enc.frame(1);
        let image = render_frame(&frame, Tier::Q, &QrConfig::default())
            .unwrap()
            .into_image()
            .unwrap();

        let mut read = read_packets(&image).unwrap();
        let mut expected: Vec<String> = frame.packets().map(str::to_string).collect();
        read.sort();
        expected.sort();
        assert_eq!(read, expected);

        for packet in &read {
            assert!(parse_packet(packet).is_ok());
        }
    }

    #[test]
    fn test_blank_image_has_no_code() {
        let blank = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(
            200,
            200,
            image::Luma([255u8]),
        ));
        assert!(matches!(read_packets(&blank), Err(QrError::NoQrCodeFound)));
    }
}
