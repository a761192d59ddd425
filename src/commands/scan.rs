//! Scan command: reassemble a payload from captured frame images.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::debug;

use duoqr::config::Config;
use duoqr::qr::read_packets_from_file;
use duoqr::{CompletionError, DecodeEvent, DecoderConfig, DecoderSession, TransformError};

use super::CommandExecutor;

/// Image extensions picked up when scanning a directory.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Rebuild a payload from frame images (files or directories, any order).
///
/// Every QR code found in every image is fed to the decoder; unrelated or
/// unreadable codes are skipped.
#[derive(Args, Debug)]
pub struct ScanCommand {
    /// Image files or directories of images
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Write the payload to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Passphrase for encrypted payloads
    #[arg(short, long)]
    pub passphrase: Option<String>,
}

impl CommandExecutor for ScanCommand {
    fn execute(&self, _config: &Config) -> Result<()> {
        let images = collect_images(&self.inputs)?;
        if images.is_empty() {
            bail!("No images found");
        }

        let mut session = DecoderSession::with_config(DecoderConfig {
            passphrase: self.passphrase.clone(),
        });

        for image in &images {
            let packets = match read_packets_from_file(image) {
                Ok(packets) => packets,
                Err(e) => {
                    debug!(image = %image.display(), error = %e, "No packets in image");
                    continue;
                }
            };

            for packet in packets {
                match session.handle_packet(&packet) {
                    Some(DecodeEvent::Progress(p)) => {
                        eprintln!("  {}/{} chunks ({} missing)", p.received, p.total, p.missing);
                    }
                    Some(DecodeEvent::Complete(decoded)) => {
                        eprintln!("Complete: {} ({} bytes)", decoded.mime_type, decoded.payload.len());
                        return self.write_payload(&decoded.payload);
                    }
                    Some(DecodeEvent::CompletionFailed { reason, .. }) => {
                        eprintln!("  All chunks received but unwrap failed: {}", reason);
                    }
                    None => {}
                }
            }
        }

        if let Some(CompletionError::Transform(TransformError::MissingPassphrase(_))) =
            session.last_completion_error()
        {
            bail!("Payload is encrypted; rerun with --passphrase");
        }
        if let Some(e) = session.last_completion_error() {
            bail!("All chunks received but the payload could not be unwrapped: {}", e);
        }
        match session.total() {
            Some(total) => bail!(
                "Incomplete stream: {}/{} chunks, missing {:?}",
                session.received_count(),
                total,
                session.missing_indices()
            ),
            None => bail!("No stream packets found in {} images", images.len()),
        }
    }
}

impl ScanCommand {
    fn write_payload(&self, payload: &str) -> Result<()> {
        match &self.output {
            Some(path) => {
                std::fs::write(path, payload)
                    .with_context(|| format!("Failed to write to {}", path.display()))?;
                eprintln!("Payload written to: {}", path.display());
            }
            None => print!("{}", payload),
        }
        Ok(())
    }
}

/// Expands directories into their image files, keeping explicit files as-is.
fn collect_images(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(input)
                .with_context(|| format!("Failed to read {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| is_image(path))
                .collect();
            entries.sort();
            images.extend(entries);
        } else {
            images.push(input.clone());
        }
    }
    Ok(images)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
