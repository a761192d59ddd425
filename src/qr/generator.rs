//! QR code rendering for packets and frames.
//!
//! Packets are encoded as-is (their header characters are arbitrary code
//! points, so no alphanumeric re-encoding is possible). A frame renders as
//! its two codes side by side.

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use thiserror::Error;

use crate::encoder::Frame;
use crate::protocol::Tier;

/// Errors that can occur during QR code operations.
#[derive(Error, Debug)]
pub enum QrError {
    #[error("QR code generation failed: {0}")]
    QrGenerationError(String),

    #[error("Frame has no packets to render")]
    EmptyFrame,

    #[error("Image save error: {0}")]
    ImageSaveError(String),

    #[error("QR code read error: {0}")]
    QrReadError(String),

    #[error("No QR code found in image")]
    NoQrCodeFound,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Output format for QR codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrFormat {
    /// PNG image (default)
    #[default]
    Png,
    /// SVG vector image
    Svg,
    /// ASCII art (for terminal display)
    Ascii,
}

impl QrFormat {
    /// File extension for saved output.
    pub fn extension(self) -> &'static str {
        match self {
            QrFormat::Png => "png",
            QrFormat::Svg => "svg",
            QrFormat::Ascii => "txt",
        }
    }
}

impl std::str::FromStr for QrFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(QrFormat::Png),
            "svg" => Ok(QrFormat::Svg),
            "ascii" | "txt" => Ok(QrFormat::Ascii),
            _ => Err(format!("Unknown format: {}. Use: png, svg, or ascii", s)),
        }
    }
}

/// Configuration for QR code rendering.
#[derive(Debug, Clone)]
pub struct QrConfig {
    /// Module size in pixels (default: 8)
    pub module_size: u32,
    /// Quiet zone size in modules (default: 4, 0 disables it)
    pub quiet_zone: u32,
    /// Output format
    pub format: QrFormat,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            module_size: 8,
            quiet_zone: 4,
            format: QrFormat::Png,
        }
    }
}

/// Output from QR code rendering.
pub enum QrOutput {
    /// PNG/image output
    Image(DynamicImage),
    /// SVG string output
    Svg(String),
    /// ASCII art output
    Ascii(String),
}

impl QrOutput {
    /// Returns true if this is an image output.
    pub fn is_image(&self) -> bool {
        matches!(self, QrOutput::Image(_))
    }

    /// Returns the image if this is an image output.
    pub fn into_image(self) -> Option<DynamicImage> {
        match self {
            QrOutput::Image(img) => Some(img),
            _ => None,
        }
    }

    /// Returns the string content (for SVG or ASCII).
    pub fn as_string(&self) -> Option<&str> {
        match self {
            QrOutput::Svg(s) | QrOutput::Ascii(s) => Some(s),
            _ => None,
        }
    }

    /// Writes the output to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), QrError> {
        let path = path.as_ref();
        match self {
            QrOutput::Image(img) => img
                .save(path)
                .map_err(|e| QrError::ImageSaveError(e.to_string())),
            QrOutput::Svg(s) | QrOutput::Ascii(s) => Ok(std::fs::write(path, s)?),
        }
    }
}

/// Maps a tier onto the QR error-correction level.
pub fn ec_level(tier: Tier) -> EcLevel {
    match tier {
        Tier::L => EcLevel::L,
        Tier::M => EcLevel::M,
        Tier::Q => EcLevel::Q,
        Tier::H => EcLevel::H,
    }
}

fn build_code(packet: &str, tier: Tier) -> Result<QrCode, QrError> {
    QrCode::with_error_correction_level(packet.as_bytes(), ec_level(tier))
        .map_err(|e| QrError::QrGenerationError(e.to_string()))
}

fn to_image(code: &QrCode, config: &QrConfig) -> GrayImage {
    code.render::<Luma<u8>>()
        .quiet_zone(config.quiet_zone > 0)
        .module_dimensions(config.module_size, config.module_size)
        .build()
}

/// Renders an SVG document along with its side length in pixels.
fn to_svg(code: &QrCode, config: &QrConfig) -> (String, u32) {
    let quiet = if config.quiet_zone > 0 { 8 } else { 0 };
    let side = (code.width() as u32 + quiet) * config.module_size;
    let doc = code
        .render::<svg::Color>()
        .quiet_zone(config.quiet_zone > 0)
        .module_dimensions(config.module_size, config.module_size)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();
    (doc, side)
}

fn to_ascii(code: &QrCode, config: &QrConfig) -> String {
    code.render::<char>()
        .quiet_zone(config.quiet_zone > 0)
        .module_dimensions(2, 1)
        .build()
}

/// Renders a single packet as one QR code.
pub fn render_packet(packet: &str, tier: Tier, config: &QrConfig) -> Result<QrOutput, QrError> {
    let code = build_code(packet, tier)?;
    Ok(match config.format {
        QrFormat::Png => QrOutput::Image(DynamicImage::ImageLuma8(to_image(&code, config))),
        QrFormat::Svg => QrOutput::Svg(to_svg(&code, config).0),
        QrFormat::Ascii => QrOutput::Ascii(to_ascii(&code, config)),
    })
}

/// Renders a frame as its left and right codes side by side.
///
/// A side without a packet is left out.
pub fn render_frame(frame: &Frame, tier: Tier, config: &QrConfig) -> Result<QrOutput, QrError> {
    let codes = frame
        .packets()
        .map(|packet| build_code(packet, tier))
        .collect::<Result<Vec<_>, _>>()?;
    if codes.is_empty() {
        return Err(QrError::EmptyFrame);
    }

    let gap = config.quiet_zone.max(1) * config.module_size;

    Ok(match config.format {
        QrFormat::Png => {
            let images: Vec<GrayImage> = codes.iter().map(|c| to_image(c, config)).collect();
            QrOutput::Image(DynamicImage::ImageLuma8(side_by_side(&images, gap)))
        }
        QrFormat::Svg => {
            let docs: Vec<(String, u32)> = codes.iter().map(|c| to_svg(c, config)).collect();
            QrOutput::Svg(svg_side_by_side(&docs, gap))
        }
        QrFormat::Ascii => {
            let blocks: Vec<String> = codes.iter().map(|c| to_ascii(c, config)).collect();
            QrOutput::Ascii(ascii_side_by_side(&blocks, 4))
        }
    })
}

fn side_by_side(images: &[GrayImage], gap: u32) -> GrayImage {
    let width = images.iter().map(|i| i.width()).sum::<u32>()
        + gap * (images.len() as u32).saturating_sub(1);
    let height = images.iter().map(|i| i.height()).max().unwrap_or(0);

    let mut canvas = GrayImage::from_pixel(width, height, Luma([255u8]));
    let mut x = 0i64;
    for img in images {
        image::imageops::replace(&mut canvas, img, x, 0);
        x += i64::from(img.width() + gap);
    }
    canvas
}

fn svg_side_by_side(docs: &[(String, u32)], gap: u32) -> String {
    let width = docs.iter().map(|(_, w)| *w).sum::<u32>()
        + gap * (docs.len() as u32).saturating_sub(1);
    let height = docs.iter().map(|(_, w)| *w).max().unwrap_or(0);

    let mut out = format!(
        "<?xml version=\"1.0\" standalone=\"yes\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" shape-rendering=\"crispEdges\">\n<rect x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" fill=\"#ffffff\"/>\n",
        w = width,
        h = height
    );
    let mut x = 0;
    for (doc, side) in docs {
        // Drop the XML prolog and position the nested document.
        let body = doc.find("<svg").map(|i| &doc[i..]).unwrap_or(doc);
        out.push_str(&body.replacen("<svg", &format!("<svg x=\"{}\" y=\"0\"", x), 1));
        out.push('\n');
        x += side + gap;
    }
    out.push_str("</svg>\n");
    out
}

fn ascii_side_by_side(blocks: &[String], gap: usize) -> String {
    let columns: Vec<Vec<&str>> = blocks.iter().map(|b| b.lines().collect()).collect();
    let widths: Vec<usize> = columns
        .iter()
        .map(|lines| lines.iter().map(|l| l.chars().count()).max().unwrap_or(0))
        .collect();
    let rows = columns.iter().map(Vec::len).max().unwrap_or(0);

    let mut out = String::new();
    for row in 0..rows {
        for (i, lines) in columns.iter().enumerate() {
            let line = lines.get(row).copied().unwrap_or("");
            let gap = if i + 1 < columns.len() { gap } else { 0 };
            let pad = widths[i] - line.chars().count() + gap;
            out.push_str(line);
            out.extend(std::iter::repeat(' ').take(pad));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::StreamEncoder;
    use crate::transform::Transform;

    fn sample_frame() -> (StreamEncoder, Frame) {
        let enc = StreamEncoder::new(&"frame data ".repeat(30), Tier::M, Transform::Plain).unwrap();
        let frame = enc.frame(0);
        (enc, frame)
    }

    #[test]
    fn test_render_packet_png() {
        let output = render_packet("\u{1}\u{0}\u{0}\u{6}hi", Tier::M, &QrConfig::default()).unwrap();
        assert!(output.is_image());
    }

    #[test]
    fn test_render_packet_ascii() {
        let config = QrConfig {
            format: QrFormat::Ascii,
            ..Default::default()
        };
        let output = render_packet("\u{1}\u{0}\u{0}\u{6}hi", Tier::L, &config).unwrap();
        let ascii = output.as_string().unwrap();
        assert!(ascii.contains('█'));
    }

    #[test]
    fn test_render_frame_png_is_wider_than_tall() {
        let (_, frame) = sample_frame();
        let img = render_frame(&frame, Tier::M, &QrConfig::default())
            .unwrap()
            .into_image()
            .unwrap();
        assert!(img.width() > img.height());
    }

    #[test]
    fn test_render_frame_svg() {
        let (_, frame) = sample_frame();
        let config = QrConfig {
            format: QrFormat::Svg,
            ..Default::default()
        };
        let output = render_frame(&frame, Tier::M, &config).unwrap();
        let svg = output.as_string().unwrap();
        assert_eq!(svg.matches("<svg").count(), 3);
        assert_eq!(svg.matches("<?xml").count(), 1);
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_render_frame_ascii_rows_align() {
        let (_, frame) = sample_frame();
        let config = QrConfig {
            format: QrFormat::Ascii,
            ..Default::default()
        };
        let output = render_frame(&frame, Tier::M, &config).unwrap();
        let widths: Vec<usize> = output
            .as_string()
            .unwrap()
            .lines()
            .map(|l| l.chars().count())
            .collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_empty_frame() {
        let frame = Frame {
            index: 0,
            left: None,
            right: None,
        };
        assert!(matches!(
            render_frame(&frame, Tier::M, &QrConfig::default()),
            Err(QrError::EmptyFrame)
        ));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("SVG".parse::<QrFormat>().unwrap(), QrFormat::Svg);
        assert_eq!("txt".parse::<QrFormat>().unwrap(), QrFormat::Ascii);
        assert!("gif".parse::<QrFormat>().is_err());
        assert_eq!(QrFormat::Ascii.extension(), "txt");
    }
}
