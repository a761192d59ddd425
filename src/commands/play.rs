//! Terminal player: animates the frame pairs as ASCII QR codes.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    terminal::{Clear, ClearType},
};

use duoqr::config::Config;
use duoqr::{render_frame, FrameRate, Player, QrConfig, QrFormat, StreamEncoder};

use super::{read_payload, resolve_tier, resolve_transform, CommandExecutor};

/// Animate the stream in the terminal until Ctrl-C.
#[derive(Args, Debug)]
pub struct PlayCommand {
    /// Payload file (reads stdin if not provided)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Error-correction tier: L, M, Q or H
    #[arg(short, long)]
    pub tier: Option<String>,

    /// Frames per second (clamped to 1-20)
    #[arg(long)]
    pub fps: Option<u32>,

    /// Stop after this many full cycles
    #[arg(long)]
    pub cycles: Option<usize>,

    /// Payload transform: plain, gzip, or gzip-aead
    #[arg(long)]
    pub transform: Option<String>,

    /// Passphrase for gzip-aead (prompted if omitted)
    #[arg(short, long)]
    pub passphrase: Option<String>,
}

impl CommandExecutor for PlayCommand {
    fn execute(&self, config: &Config) -> Result<()> {
        let payload = read_payload(self.input.as_deref())?;
        let tier = resolve_tier(self.tier.as_deref(), config)?;
        let transform = resolve_transform(
            self.transform.as_deref(),
            self.passphrase.as_deref(),
            config,
        )?;
        let rate = FrameRate::new(self.fps.unwrap_or(config.stream.fps));

        let encoder = StreamEncoder::new(&payload, tier, transform)
            .with_context(|| format!("Cannot stream this payload at tier {}", tier))?;
        let total = encoder.chunk_count();
        let mut player = Player::new(encoder, rate);

        let qr_config = QrConfig {
            format: QrFormat::Ascii,
            quiet_zone: config.render.quiet_zone,
            ..Default::default()
        };

        let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
        let mut stdout = io::stdout();
        execute!(stdout, Hide)?;

        let result = runtime.block_on(async {
            let playback = player.run(self.cycles, |frame| -> Result<()> {
                let art = render_frame(frame, tier, &qr_config)?;
                execute!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;
                write!(stdout, "{}", art.as_string().unwrap_or_default())?;
                let indices: Vec<String> = [&frame.left, &frame.right]
                    .iter()
                    .filter_map(|side| side.as_ref())
                    .map(|code| format!("{},{}", code.indices.0, code.indices.1))
                    .collect();
                writeln!(
                    stdout,
                    "frame {}/{}  chunks [{}]  tier {}  {} fps  (Ctrl-C to stop)",
                    frame.index + 1,
                    total,
                    indices.join(" | "),
                    tier,
                    rate.fps()
                )?;
                stdout.flush()?;
                Ok(())
            });

            tokio::select! {
                shown = playback => shown.map(Some),
                _ = tokio::signal::ctrl_c() => Ok(None),
            }
        });

        execute!(io::stdout(), Show)?;

        match result? {
            Some(shown) => eprintln!("Played {} frames", shown),
            None => eprintln!("Stopped"),
        }
        Ok(())
    }
}
