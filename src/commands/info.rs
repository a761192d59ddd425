//! Chunk plan overview per tier.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use duoqr::config::Config;
use duoqr::player::FrameRate;
use duoqr::protocol::chunk_size_for;
use duoqr::{StreamEncoder, Tier};

use super::{read_payload, resolve_transform, CommandExecutor};

/// Show how a payload would be chunked at every tier.
#[derive(Args, Debug)]
pub struct InfoCommand {
    /// Payload file (reads stdin if not provided)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Payload transform: plain, gzip, or gzip-aead
    #[arg(long)]
    pub transform: Option<String>,

    /// Passphrase for gzip-aead (prompted if omitted)
    #[arg(short, long)]
    pub passphrase: Option<String>,
}

impl CommandExecutor for InfoCommand {
    fn execute(&self, config: &Config) -> Result<()> {
        let payload = read_payload(self.input.as_deref())?;
        let transform = resolve_transform(
            self.transform.as_deref(),
            self.passphrase.as_deref(),
            config,
        )?;
        let rate = FrameRate::new(config.stream.fps);

        println!("Stream Plan");
        println!("===========");
        println!("  Payload: {} bytes", payload.len());
        println!("  Transform: {}", transform.mime_type());
        println!("  Frame rate: {} fps", rate.fps());
        println!();
        println!("  Tier  Bytes/code  Chunk bytes  Chunks  Cycle");

        for tier in Tier::ALL {
            let capacity = tier.max_byte_content();
            match StreamEncoder::new(&payload, tier, transform.clone()) {
                Ok(encoder) => {
                    let cycle = rate.interval() * encoder.chunk_count() as u32;
                    println!(
                        "  {:<4}  {:>10}  {:>11}  {:>6}  {:.1}s",
                        tier,
                        capacity,
                        chunk_size_for(capacity),
                        encoder.chunk_count(),
                        cycle.as_secs_f64()
                    );
                }
                Err(e) => println!("  {:<4}  {:>10}  unavailable: {}", tier, capacity, e),
            }
        }

        Ok(())
    }
}
