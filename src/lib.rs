//! # duoqr - Screen-to-camera transfer over animated QR code pairs
//!
//! duoqr moves an arbitrarily large text payload from a screen to a camera
//! with no network link: the payload is split into chunks, two chunks are
//! packed into each QR code, and two codes are shown per animation frame.
//! The receiver feeds every scan into a reassembly session and gets the
//! payload back once every chunk has been seen, in any order.
//!
//! ## Overview
//!
//! - **Envelope**: the payload (optionally gzip / gzip + AEAD) is base64
//!   encoded into `{"data": ..., "mimeType": ...}`
//! - **Chunking**: the envelope is cut on UTF-8 boundaries to fit the
//!   error-correction tier's per-code byte budget
//! - **Packets**: four header characters (chunk count, two indices, offset of
//!   the second chunk) followed by two chunks, no delimiters
//! - **Scheduling**: each frame shows four chunks a quarter of the stream
//!   apart, so missed camera frames are covered by later pairings
//! - **Reassembly**: no back-channel; noise is dropped silently, duplicates
//!   are idempotent, the first stream seen locks the session
//!
//! ## Example Usage
//!
//! ```rust
//! use duoqr::{DecodeEvent, DecoderSession, StreamEncoder, Tier, Transform};
//!
//! let encoder = StreamEncoder::new("Hello, 世界!", Tier::H, Transform::Plain).unwrap();
//!
//! let mut session = DecoderSession::new();
//! let mut done = None;
//! for frame in encoder.frames() {
//!     for packet in frame.packets() {
//!         if let Some(DecodeEvent::Complete(payload)) = session.handle_packet(packet) {
//!             done = Some(payload);
//!         }
//!     }
//! }
//!
//! assert_eq!(done.unwrap().payload, "Hello, 世界!");
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: tiers, chunker, packet codec, frame scheduler
//! - [`envelope`]: JSON/base64 envelope
//! - [`transform`]: payload transforms named by the envelope's mime label
//! - [`encoder`]: cached chunk plan and frame generation
//! - [`decoder`]: reassembly state machine
//! - [`player`]: frame-rate driven playback
//! - [`qr`]: QR rendering and reading
//! - [`config`], [`logging`]: ambient setup for the CLI

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod envelope;
pub mod logging;
pub mod player;
pub mod protocol;
pub mod qr;
pub mod transform;

// Re-export commonly used types at the crate root
pub use decoder::{
    CompletionError, DecodeEvent, DecodedPayload, DecoderConfig, DecoderSession, Progress,
    SessionState, SharedDecoder,
};
pub use encoder::{Capacity, Code, EncoderError, EncoderState, Frame, StreamEncoder};
pub use envelope::{Envelope, EnvelopeError};
pub use player::{FrameRate, Player};
pub use protocol::{Packet, PacketError, Tier};
pub use qr::{read_packets, render_frame, QrConfig, QrError, QrFormat};
pub use transform::{Transform, TransformError};
