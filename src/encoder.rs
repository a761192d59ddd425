//! Sender side: payload to scheduled QR packets.
//!
//! This module orchestrates the encoding process:
//! 1. Apply the payload transform (plain, gzip, gzip + AEAD)
//! 2. Wrap the bytes in a base64 JSON envelope
//! 3. Chunk the envelope for the tier's per-code capacity
//! 4. For each animation frame, pick four chunks and pack them into two packets
//!
//! Steps 1–3 run once per configuration and are cached; step 4 is a pure
//! function of the frame index.

use thiserror::Error;
use tracing::{debug, info};

use crate::envelope::{Envelope, EnvelopeError};
use crate::protocol::{
    build_packet, chunk_envelope, FrameSlots, Schedule, Tier, MAX_CHUNKS, MAX_CHUNK_UNITS,
};
use crate::transform::{Transform, TransformError};

/// Errors that can occur while preparing a stream.
#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("Capacity of {capacity} bytes per code leaves no room for chunk data")]
    CapacityTooSmall { capacity: usize },

    #[error("Payload needs {chunks} chunks, the header can address at most {max}")]
    TooManyChunks { chunks: usize, max: usize },

    #[error("Chunk of {units} UTF-16 units exceeds the addressable {max}; lower the capacity")]
    ChunkTooLong { units: usize, max: usize },

    #[error("Transform error: {0}")]
    TransformError(#[from] TransformError),

    #[error("Envelope error: {0}")]
    EnvelopeError(#[from] EnvelopeError),
}

/// Per-code capacity source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// Use the tier's table value.
    Tier(Tier),
    /// Explicit byte budget per code, e.g. for denser QR versions.
    Bytes(usize),
}

impl Capacity {
    /// Bytes one code may carry.
    pub fn bytes(self) -> usize {
        match self {
            Capacity::Tier(tier) => tier.max_byte_content(),
            Capacity::Bytes(n) => n,
        }
    }
}

impl From<Tier> for Capacity {
    fn from(tier: Tier) -> Self {
        Capacity::Tier(tier)
    }
}

/// One QR code within a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    /// Chunk indices embedded in this code.
    pub indices: (usize, usize),
    /// Packet string to render.
    pub packet: String,
}

/// One animation frame: a left and a right code.
///
/// A side is `None` when its packet could not be built; the renderer skips
/// that code for the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame index within the cycle.
    pub index: usize,
    pub left: Option<Code>,
    pub right: Option<Code>,
}

impl Frame {
    /// Packets of this frame, left first.
    pub fn packets(&self) -> impl Iterator<Item = &str> {
        self.left
            .iter()
            .chain(self.right.iter())
            .map(|code| code.packet.as_str())
    }
}

/// Chunk list plus animation position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderState {
    /// Chunks of the serialized envelope.
    pub chunks: Vec<String>,
    /// Current frame, always `< chunks.len()`.
    pub frame_index: usize,
}

/// Inputs that determine the chunk list.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    payload: String,
    capacity: Capacity,
    transform: Transform,
}

/// Streams a payload as a rotating sequence of packet pairs.
///
/// Any configuration change rebuilds the chunk list and rewinds to frame 0
/// in a single call; on error the previous configuration stays in place.
#[derive(Debug, Clone)]
pub struct StreamEncoder {
    key: CacheKey,
    state: EncoderState,
    schedule: Schedule,
}

impl StreamEncoder {
    /// Prepares `payload` for transmission.
    ///
    /// # Errors
    /// Fails with [`EncoderError::CapacityTooSmall`] if the capacity yields no
    /// chunks; nothing must be rendered in that case.
    pub fn new(
        payload: &str,
        capacity: impl Into<Capacity>,
        transform: Transform,
    ) -> Result<Self, EncoderError> {
        let key = CacheKey {
            payload: payload.to_string(),
            capacity: capacity.into(),
            transform,
        };
        let chunks = build_chunks(&key)?;
        let schedule = Schedule::new(chunks.len());

        Ok(Self {
            key,
            state: EncoderState {
                chunks,
                frame_index: 0,
            },
            schedule,
        })
    }

    /// Replaces the payload.
    pub fn set_payload(&mut self, payload: &str) -> Result<(), EncoderError> {
        let key = CacheKey {
            payload: payload.to_string(),
            ..self.key.clone()
        };
        self.reconfigure(key)
    }

    /// Replaces the per-code capacity.
    pub fn set_capacity(&mut self, capacity: impl Into<Capacity>) -> Result<(), EncoderError> {
        let key = CacheKey {
            capacity: capacity.into(),
            ..self.key.clone()
        };
        self.reconfigure(key)
    }

    /// Replaces the payload transform.
    pub fn set_transform(&mut self, transform: Transform) -> Result<(), EncoderError> {
        let key = CacheKey {
            transform,
            ..self.key.clone()
        };
        self.reconfigure(key)
    }

    fn reconfigure(&mut self, key: CacheKey) -> Result<(), EncoderError> {
        if key == self.key {
            return Ok(());
        }

        let chunks = build_chunks(&key)?;
        self.schedule = Schedule::new(chunks.len());
        self.state = EncoderState {
            chunks,
            frame_index: 0,
        };
        self.key = key;
        Ok(())
    }

    /// Chunks of the current envelope.
    pub fn chunks(&self) -> &[String] {
        &self.state.chunks
    }

    /// Number of chunks, which is also the frame count of one cycle.
    pub fn chunk_count(&self) -> usize {
        self.state.chunks.len()
    }

    /// Current animation position.
    pub fn frame_index(&self) -> usize {
        self.state.frame_index
    }

    /// Snapshot of the chunk list and position.
    pub fn state(&self) -> &EncoderState {
        &self.state
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn capacity(&self) -> Capacity {
        self.key.capacity
    }

    pub fn mime_type(&self) -> &str {
        self.key.transform.mime_type()
    }

    /// Builds frame `index` (taken modulo the cycle length).
    pub fn frame(&self, index: usize) -> Frame {
        let index = match self.chunk_count() {
            0 => 0,
            n => index % n,
        };
        let slots = self.schedule.slots(index);

        Frame {
            index,
            left: slots.and_then(|s| self.code(s.left)),
            right: slots.and_then(|s| self.code(s.right)),
        }
    }

    fn code(&self, indices: (usize, usize)) -> Option<Code> {
        build_packet(&self.state.chunks, indices.0, indices.1).map(|packet| Code { indices, packet })
    }

    /// Frame at the current position, without advancing.
    pub fn current_frame(&self) -> Frame {
        self.frame(self.state.frame_index)
    }

    /// Returns the current frame and advances one tick.
    pub fn tick(&mut self) -> Frame {
        let frame = self.current_frame();
        self.state.frame_index = self.schedule.next_frame(self.state.frame_index);
        frame
    }

    /// Rewinds to frame 0.
    pub fn rewind(&mut self) {
        self.state.frame_index = 0;
    }

    /// One full cycle of frames starting at frame 0.
    ///
    /// The iterator is lazy and finite; call again to restart.
    pub fn frames(&self) -> Frames<'_> {
        Frames {
            encoder: self,
            next: 0,
        }
    }

    /// Slot layout of frame `index`, if any chunks exist.
    pub fn slots(&self, index: usize) -> Option<FrameSlots> {
        self.schedule.slots(index)
    }
}

/// Iterator over one cycle of frames.
pub struct Frames<'a> {
    encoder: &'a StreamEncoder,
    next: usize,
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.next >= self.encoder.chunk_count() {
            return None;
        }
        let frame = self.encoder.frame(self.next);
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.encoder.chunk_count().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Frames<'_> {}

fn build_chunks(key: &CacheKey) -> Result<Vec<String>, EncoderError> {
    let bytes = key.transform.apply(&key.payload)?;
    let envelope = Envelope::wrap(&bytes, key.transform.mime_type()).to_json()?;

    let capacity = key.capacity.bytes();
    let chunks = chunk_envelope(&envelope, capacity);

    if chunks.is_empty() {
        return Err(EncoderError::CapacityTooSmall { capacity });
    }
    if chunks.len() > MAX_CHUNKS {
        return Err(EncoderError::TooManyChunks {
            chunks: chunks.len(),
            max: MAX_CHUNKS,
        });
    }
    // The second chunk's offset must fit in one header character.
    if let Some(units) = chunks
        .iter()
        .map(|chunk| chunk.encode_utf16().count())
        .find(|&units| units > MAX_CHUNK_UNITS)
    {
        return Err(EncoderError::ChunkTooLong {
            units,
            max: MAX_CHUNK_UNITS,
        });
    }

    info!(
        payload_bytes = key.payload.len(),
        envelope_bytes = envelope.len(),
        chunks = chunks.len(),
        capacity,
        mime_type = key.transform.mime_type(),
        "Prepared chunk plan"
    );
    debug!(offset = chunks.len() / 4, "Frame schedule spacing");

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{parse_packet, HEADER_OVERHEAD};

    fn encoder(payload: &str, tier: Tier) -> StreamEncoder {
        StreamEncoder::new(payload, tier, Transform::Plain).unwrap()
    }

    #[test]
    fn test_chunks_rebuild_envelope() {
        let enc = encoder("Hello, 世界!", Tier::H);
        let envelope = Envelope::from_json(&enc.chunks().concat()).unwrap();
        assert_eq!(envelope.mime_type, "text/plain");
        assert_eq!(envelope.decode_data().unwrap(), "Hello, 世界!".as_bytes());
    }

    #[test]
    fn test_capacity_too_small() {
        let err = StreamEncoder::new("x", Capacity::Bytes(HEADER_OVERHEAD), Transform::Plain)
            .unwrap_err();
        assert!(matches!(err, EncoderError::CapacityTooSmall { capacity: 12 }));
    }

    #[test]
    fn test_oversized_chunk_rejected() {
        let err = StreamEncoder::new(&"y".repeat(100_000), Capacity::Bytes(400_000), Transform::Plain)
            .unwrap_err();
        assert!(matches!(
            err,
            EncoderError::ChunkTooLong { max: MAX_CHUNK_UNITS, .. }
        ));
    }

    #[test]
    fn test_largest_chunks_still_packed() {
        let capacity = Capacity::Bytes(HEADER_OVERHEAD + 2 * MAX_CHUNK_UNITS);
        let enc = StreamEncoder::new(&"y".repeat(100_000), capacity, Transform::Plain).unwrap();
        assert!(enc.chunk_count() > 1);
        for frame in enc.frames() {
            assert!(frame.left.is_some() && frame.right.is_some());
        }
    }

    #[test]
    fn test_frames_cycle_is_finite_and_restartable() {
        let enc = encoder(&"record ".repeat(40), Tier::H);
        let n = enc.chunk_count();
        assert!(n > 4);

        let first: Vec<Frame> = enc.frames().collect();
        let second: Vec<Frame> = enc.frames().collect();
        assert_eq!(first.len(), n);
        assert_eq!(first, second);
        assert_eq!(enc.frames().len(), n);
    }

    #[test]
    fn test_frame_packets_match_schedule() {
        let enc = encoder(&"abcdefgh".repeat(30), Tier::Q);
        let frame = enc.frame(2);
        let slots = enc.slots(2).unwrap();

        let left = parse_packet(&frame.left.as_ref().unwrap().packet).unwrap();
        let right = parse_packet(&frame.right.as_ref().unwrap().packet).unwrap();

        assert_eq!(usize::from(left.first_index), slots.left.0);
        assert_eq!(usize::from(left.second_index), slots.left.1);
        assert_eq!(usize::from(right.first_index), slots.right.0);
        assert_eq!(usize::from(right.second_index), slots.right.1);
        assert_eq!(usize::from(left.total), enc.chunk_count());
    }

    #[test]
    fn test_packets_fit_capacity() {
        let payload = "Ünïcødé 😀 données médicales ".repeat(25);
        for tier in Tier::ALL {
            let enc = encoder(&payload, tier);
            for frame in enc.frames() {
                for packet in frame.packets() {
                    assert!(packet.len() <= tier.max_byte_content());
                }
            }
        }
    }

    #[test]
    fn test_tick_wraps() {
        let mut enc = encoder("short", Tier::L);
        assert_eq!(enc.chunk_count(), 1);
        assert_eq!(enc.tick().index, 0);
        assert_eq!(enc.tick().index, 0);

        let mut enc = encoder(&"z".repeat(200), Tier::H);
        let n = enc.chunk_count();
        for expected in 0..n {
            assert_eq!(enc.tick().index, expected);
        }
        assert_eq!(enc.frame_index(), 0);
    }

    #[test]
    fn test_reconfigure_resets_frame_index() {
        let mut enc = encoder(&"z".repeat(200), Tier::H);
        enc.tick();
        enc.tick();
        assert_eq!(enc.frame_index(), 2);

        enc.set_capacity(Tier::L).unwrap();
        assert_eq!(enc.frame_index(), 0);
        assert_eq!(enc.capacity(), Capacity::Tier(Tier::L));
    }

    #[test]
    fn test_unchanged_config_keeps_position() {
        let payload = "z".repeat(200);
        let mut enc = encoder(&payload, Tier::H);
        enc.tick();
        enc.set_payload(&payload).unwrap();
        assert_eq!(enc.frame_index(), 1);
    }

    #[test]
    fn test_failed_reconfigure_keeps_old_state() {
        let mut enc = encoder("keep me", Tier::M);
        let before = enc.chunks().to_vec();

        assert!(enc.set_capacity(Capacity::Bytes(5)).is_err());
        assert_eq!(enc.chunks(), before.as_slice());
        assert_eq!(enc.capacity(), Capacity::Tier(Tier::M));
    }

    #[test]
    fn test_transform_changes_mime() {
        let mut enc = encoder("payload", Tier::M);
        enc.set_transform(Transform::Gzip).unwrap();
        assert_eq!(enc.mime_type(), "application/gzip");
        let envelope = Envelope::from_json(&enc.chunks().concat()).unwrap();
        assert_eq!(envelope.mime_type, "application/gzip");
    }
}
