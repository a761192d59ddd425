//! The dual-QR wire protocol.
//!
//! A payload envelope is split into byte-bounded chunks ([`chunk`]), two
//! chunks are packed behind a four-character header into one QR packet
//! ([`packet`]), and each animation frame shows two packets chosen by the
//! frame scheduler ([`schedule`]). Per-code capacity comes from the
//! error-correction [`tier`] table.

pub mod chunk;
pub mod packet;
pub mod schedule;
pub mod tier;

pub use chunk::{chunk_envelope, chunk_size_for};
pub use packet::{build_packet, parse_packet, Packet, PacketError};
pub use schedule::{FrameSlots, Schedule};
pub use tier::Tier;

/// Number of header characters at the start of every packet.
pub const HEADER_LEN: usize = 4;

/// Bytes reserved for the header when sizing chunks.
///
/// Each header character is a single code point below `0x10000`, which is at
/// most three bytes of UTF-8.
pub const HEADER_OVERHEAD: usize = HEADER_LEN * 3;

/// Largest chunk count the header can carry.
///
/// Header values are `char`s, so the UTF-16 surrogate range is unusable.
pub const MAX_CHUNKS: usize = 0xD7FF;

/// Longest first chunk, in UTF-16 units, whose end offset still fits in a
/// header character.
pub const MAX_CHUNK_UNITS: usize = MAX_CHUNKS - HEADER_LEN;
