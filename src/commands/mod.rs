//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor` trait.

mod encode;
mod info;
mod play;
mod scan;

pub use encode::EncodeCommand;
pub use info::InfoCommand;
pub use play::PlayCommand;
pub use scan::ScanCommand;

use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{Context, Result};

use duoqr::config::Config;
use duoqr::{Tier, Transform};

/// Trait for command execution - Strategy pattern.
///
/// Each command struct holds its parsed arguments and implements
/// this trait to define its execution logic.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments and the loaded config.
    fn execute(&self, config: &Config) -> Result<()>;
}

/// Reads the payload from a file, or from stdin when no file is given.
fn read_payload(input: Option<&Path>) -> Result<String> {
    let payload = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload from {}", path.display()))?,
        None => {
            if io::stdin().is_terminal() {
                eprintln!("Reading payload from stdin (Ctrl+D to finish):");
            }
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read payload from stdin")?;
            buffer
        }
    };

    if payload.is_empty() {
        anyhow::bail!("Payload cannot be empty");
    }
    Ok(payload)
}

/// Picks the tier from the flag, falling back to config.
fn resolve_tier(flag: Option<&str>, config: &Config) -> Result<Tier> {
    match flag {
        Some(name) => name.parse::<Tier>().map_err(anyhow::Error::msg),
        None => Ok(config.stream.tier),
    }
}

/// Builds the transform, prompting for a passphrase if one is needed.
fn resolve_transform(flag: Option<&str>, passphrase: Option<&str>, config: &Config) -> Result<Transform> {
    let name = flag.unwrap_or(&config.stream.transform);
    let needs_passphrase = matches!(name.trim().to_lowercase().as_str(), "gzip-aead" | "aead");

    let prompted;
    let passphrase = match passphrase {
        Some(p) => Some(p),
        None if needs_passphrase => {
            prompted = prompt_passphrase("Passphrase: ")?;
            Some(prompted.as_str())
        }
        None => None,
    };

    Ok(Transform::from_name(name, passphrase)?)
}

/// Prompt for a passphrase (input hidden).
fn prompt_passphrase(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("Failed to read passphrase")
}
