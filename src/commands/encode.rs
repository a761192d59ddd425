//! Encode command: write one image per frame of a full cycle.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use duoqr::config::Config;
use duoqr::{render_frame, QrFormat, StreamEncoder};

use super::{read_payload, resolve_tier, resolve_transform, CommandExecutor};

/// Render every frame of the stream to files.
///
/// Frames are written as frame-0000.png, frame-0001.png, ... in the output
/// directory. Playing them in a loop reproduces the animation.
#[derive(Args, Debug)]
pub struct EncodeCommand {
    /// Payload file (reads stdin if not provided)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory for frame files
    #[arg(short, long)]
    pub output: PathBuf,

    /// Error-correction tier: L, M, Q or H
    #[arg(short, long)]
    pub tier: Option<String>,

    /// Output format: png, svg, or ascii
    #[arg(short, long)]
    pub format: Option<String>,

    /// Payload transform: plain, gzip, or gzip-aead
    #[arg(long)]
    pub transform: Option<String>,

    /// Passphrase for gzip-aead (prompted if omitted)
    #[arg(short, long)]
    pub passphrase: Option<String>,
}

impl CommandExecutor for EncodeCommand {
    fn execute(&self, config: &Config) -> Result<()> {
        let payload = read_payload(self.input.as_deref())?;
        let tier = resolve_tier(self.tier.as_deref(), config)?;
        let transform = resolve_transform(
            self.transform.as_deref(),
            self.passphrase.as_deref(),
            config,
        )?;

        let mut qr_config = config.qr_config()?;
        if let Some(format) = &self.format {
            qr_config.format = format.parse::<QrFormat>().map_err(anyhow::Error::msg)?;
        }

        let encoder = StreamEncoder::new(&payload, tier, transform)
            .with_context(|| format!("Cannot stream this payload at tier {}", tier))?;

        std::fs::create_dir_all(&self.output)
            .with_context(|| format!("Failed to create {}", self.output.display()))?;

        for frame in encoder.frames() {
            let path = self.output.join(format!(
                "frame-{:04}.{}",
                frame.index,
                qr_config.format.extension()
            ));
            render_frame(&frame, tier, &qr_config)
                .and_then(|output| output.save(&path))
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        println!("Frames written: {}", self.output.display());
        println!("  Payload: {} bytes", payload.len());
        println!("  Transform: {}", encoder.mime_type());
        println!("  Tier: {} ({} bytes per code)", tier, tier.max_byte_content());
        println!("  Chunks: {}", encoder.chunk_count());
        println!("  Frames per cycle: {}", encoder.chunk_count());

        Ok(())
    }
}
