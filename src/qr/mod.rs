//! QR code rendering and reading for stream frames.

mod generator;
mod reader;

pub use generator::{ec_level, render_frame, render_packet, QrConfig, QrError, QrFormat, QrOutput};
pub use reader::{read_packets, read_packets_from_file};
