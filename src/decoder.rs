//! Receiver side: scanned strings back to the original payload.
//!
//! A [`DecoderSession`] is fed every string the camera decodes. Most of them
//! are noise (half-visible codes, unrelated QR codes, codes from another
//! stream) and are dropped without any event. Valid packets fill a sparse
//! chunk map for the stream whose chunk count was seen first; once every
//! index is present the envelope is reassembled and unwrapped.
//!
//! ```text
//!  Empty --first valid packet--> Accumulating --all chunks + unwrap ok--> Complete
//!    ^                               |   ^                                  |
//!    |                               +---+ unwrap failed                    |
//!    +------------------------------ reset() -------------------------------+
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::envelope::{Envelope, EnvelopeError};
use crate::protocol::parse_packet;
use crate::transform::{Transform, TransformError};

/// Reasons a fully received stream could not be unwrapped.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Chunk {0} is missing")]
    MissingChunk(usize),

    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No packet accepted yet.
    Empty,
    /// Total locked, chunks still missing (or unwrap failed).
    Accumulating,
    /// Payload available; further packets are ignored.
    Complete,
}

/// Reassembly progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub received: usize,
    pub total: usize,
    pub missing: usize,
}

/// The reconstructed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    /// Transform label carried by the envelope.
    pub mime_type: String,
    /// Original payload text.
    pub payload: String,
}

/// What an accepted packet changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// At least one new chunk was stored.
    Progress(Progress),
    /// The stream is complete. Emitted once per session.
    Complete(DecodedPayload),
    /// Every chunk is present but the envelope could not be unwrapped. The
    /// session stays open.
    CompletionFailed { progress: Progress, reason: String },
}

/// Configuration for the decoder.
#[derive(Clone, Default)]
pub struct DecoderConfig {
    /// Passphrase for encrypted payloads.
    pub passphrase: Option<String>,
}

impl fmt::Debug for DecoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderConfig")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Reassembly state for one stream.
#[derive(Debug, Default)]
pub struct DecoderSession {
    config: DecoderConfig,
    total: Option<usize>,
    chunks: HashMap<usize, String>,
    received: usize,
    missing: usize,
    result: Option<DecodedPayload>,
    last_error: Option<CompletionError>,
    rejected: u64,
}

impl DecoderSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        if self.result.is_some() {
            SessionState::Complete
        } else if self.total.is_some() {
            SessionState::Accumulating
        } else {
            SessionState::Empty
        }
    }

    /// Locked chunk count, if a session exists.
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    /// Distinct chunks stored so far.
    pub fn received_count(&self) -> usize {
        self.received
    }

    /// Indices in `[0, total)` not yet stored.
    pub fn missing_count(&self) -> usize {
        self.missing
    }

    /// Progress of the current session.
    pub fn progress(&self) -> Option<Progress> {
        self.total.map(|total| Progress {
            received: self.received,
            total,
            missing: self.missing,
        })
    }

    /// Missing indices in ascending order.
    pub fn missing_indices(&self) -> Vec<usize> {
        match self.total {
            Some(total) => (0..total).filter(|i| !self.chunks.contains_key(i)).collect(),
            None => Vec::new(),
        }
    }

    /// The payload once complete.
    pub fn result(&self) -> Option<&DecodedPayload> {
        self.result.as_ref()
    }

    /// Why the most recent completion attempt failed.
    pub fn last_completion_error(&self) -> Option<&CompletionError> {
        self.last_error.as_ref()
    }

    /// Number of scanned strings discarded so far.
    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }

    /// Feeds one scanned string.
    ///
    /// Returns `None` for anything that did not change the session: noise,
    /// packets of another stream, duplicates, or packets after completion.
    pub fn handle_packet(&mut self, raw: &str) -> Option<DecodeEvent> {
        if self.result.is_some() {
            trace!("Session complete, ignoring scan");
            return None;
        }

        let packet = match parse_packet(raw) {
            Ok(packet) => packet,
            Err(e) => {
                self.rejected += 1;
                trace!(error = %e, "Discarding scan");
                return None;
            }
        };

        let total = usize::from(packet.total);
        match self.total {
            None => {
                debug!(total, "Locked new session");
                self.total = Some(total);
                self.missing = total;
            }
            Some(locked) if locked != total => {
                self.rejected += 1;
                debug!(locked, got = total, "Discarding packet from another stream");
                return None;
            }
            Some(_) => {}
        }

        let stored_first = self.store(usize::from(packet.first_index), packet.first_chunk);
        let stored_second = self.store(usize::from(packet.second_index), packet.second_chunk);
        if !stored_first && !stored_second {
            return None;
        }

        self.missing = (0..total).filter(|i| !self.chunks.contains_key(i)).count();
        let progress = Progress {
            received: self.received,
            total,
            missing: self.missing,
        };
        debug!(received = progress.received, total, "Stored chunks");

        if self.received < total {
            return Some(DecodeEvent::Progress(progress));
        }

        match self.complete(total) {
            Ok(decoded) => {
                info!(
                    mime_type = %decoded.mime_type,
                    bytes = decoded.payload.len(),
                    "Stream complete"
                );
                self.last_error = None;
                self.result = Some(decoded.clone());
                Some(DecodeEvent::Complete(decoded))
            }
            Err(e) => {
                warn!(error = %e, "All chunks present but unwrap failed");
                let reason = e.to_string();
                self.last_error = Some(e);
                Some(DecodeEvent::CompletionFailed { progress, reason })
            }
        }
    }

    /// First writer wins: an occupied index is never overwritten.
    fn store(&mut self, index: usize, chunk: String) -> bool {
        if self.chunks.contains_key(&index) {
            return false;
        }
        self.chunks.insert(index, chunk);
        self.received += 1;
        true
    }

    fn complete(&self, total: usize) -> Result<DecodedPayload, CompletionError> {
        let mut text = String::new();
        for index in 0..total {
            let chunk = self
                .chunks
                .get(&index)
                .ok_or(CompletionError::MissingChunk(index))?;
            text.push_str(chunk);
        }

        let envelope = Envelope::from_json(&text)?;
        let bytes = envelope.decode_data()?;
        let transform = Transform::from_mime(&envelope.mime_type, self.config.passphrase.as_deref())?;
        let payload = transform.reverse(&bytes)?;

        Ok(DecodedPayload {
            mime_type: envelope.mime_type,
            payload,
        })
    }

    /// Drops all session state. Safe in any state.
    pub fn reset(&mut self) {
        debug!("Session reset");
        self.total = None;
        self.chunks.clear();
        self.received = 0;
        self.missing = 0;
        self.result = None;
        self.last_error = None;
        self.rejected = 0;
    }
}

/// Thread-safe handle around a [`DecoderSession`].
///
/// Each call runs entirely under one lock, so the insert-if-vacant and
/// complete-once sequences of concurrent scan callbacks never interleave.
#[derive(Debug, Clone, Default)]
pub struct SharedDecoder {
    inner: Arc<Mutex<DecoderSession>>,
}

impl SharedDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DecoderSession::with_config(config))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DecoderSession> {
        // A panic elsewhere cannot leave the map half-written, so keep going.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn handle_packet(&self, raw: &str) -> Option<DecodeEvent> {
        self.lock().handle_packet(raw)
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn state(&self) -> SessionState {
        self.lock().state()
    }

    pub fn progress(&self) -> Option<Progress> {
        self.lock().progress()
    }

    pub fn result(&self) -> Option<DecodedPayload> {
        self.lock().result().cloned()
    }
}
