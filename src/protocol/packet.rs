//! Packet layout: four header characters followed by two chunks.
//!
//! ```text
//! [N][first][second][start] first_chunk second_chunk
//!                     |                 ^
//!                     +-----------------+ UTF-16 offset from packet start
//! ```
//!
//! Each header field is one character whose code point is the value. Offsets
//! and lengths are counted in UTF-16 code units so packets stay compatible
//! with scanners that hand back JavaScript-style strings.

use thiserror::Error;

use super::HEADER_LEN;

/// Reasons a scanned string is not a valid packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Packet too short: {len} code units, header needs 4")]
    TooShort { len: usize },

    #[error("Packet declares zero chunks")]
    ZeroTotal,

    #[error("Chunk index {index} out of range for {total} chunks")]
    IndexOutOfRange { index: u16, total: u16 },

    #[error("Second chunk offset {offset} outside [4, {len}]")]
    BadOffset { offset: usize, len: usize },

    #[error("Chunk boundary splits a surrogate pair")]
    SplitSurrogate,
}

/// A decoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Total chunk count of the stream.
    pub total: u16,
    /// Index of the first embedded chunk.
    pub first_index: u16,
    /// Index of the second embedded chunk.
    pub second_index: u16,
    /// Text of the first embedded chunk.
    pub first_chunk: String,
    /// Text of the second embedded chunk.
    pub second_chunk: String,
}

impl Packet {
    /// Offset of the second chunk, counted from the start of the packet.
    pub fn second_start(&self) -> usize {
        HEADER_LEN + self.first_chunk.encode_utf16().count()
    }

    /// Serializes the packet into the string carried by one QR code.
    ///
    /// Returns `None` if a header value cannot be expressed as a single
    /// character.
    pub fn to_wire(&self) -> Option<String> {
        let second_start = u16::try_from(self.second_start()).ok()?;

        let mut out = String::with_capacity(
            HEADER_LEN * 3 + self.first_chunk.len() + self.second_chunk.len(),
        );
        for value in [self.total, self.first_index, self.second_index, second_start] {
            out.push(char::from_u32(u32::from(value))?);
        }
        out.push_str(&self.first_chunk);
        out.push_str(&self.second_chunk);
        Some(out)
    }
}

/// Builds the packet string carrying `chunks[first]` and `chunks[second]`.
///
/// The two indices may be equal. Returns `None` when either index is out of
/// range or a header value does not fit; the caller skips that code for the
/// frame.
pub fn build_packet(chunks: &[String], first: usize, second: usize) -> Option<String> {
    let first_chunk = chunks.get(first)?;
    let second_chunk = chunks.get(second)?;

    Packet {
        total: u16::try_from(chunks.len()).ok()?,
        first_index: u16::try_from(first).ok()?,
        second_index: u16::try_from(second).ok()?,
        first_chunk: first_chunk.clone(),
        second_chunk: second_chunk.clone(),
    }
    .to_wire()
}

/// Parses a scanned string into a [`Packet`].
pub fn parse_packet(raw: &str) -> Result<Packet, PacketError> {
    let units: Vec<u16> = raw.encode_utf16().collect();
    if units.len() < HEADER_LEN {
        return Err(PacketError::TooShort { len: units.len() });
    }

    let total = units[0];
    let first_index = units[1];
    let second_index = units[2];
    let offset = usize::from(units[3]);

    if total == 0 {
        return Err(PacketError::ZeroTotal);
    }
    for index in [first_index, second_index] {
        if index >= total {
            return Err(PacketError::IndexOutOfRange { index, total });
        }
    }
    if offset < HEADER_LEN || offset > units.len() {
        return Err(PacketError::BadOffset {
            offset,
            len: units.len(),
        });
    }

    let first_chunk =
        String::from_utf16(&units[HEADER_LEN..offset]).map_err(|_| PacketError::SplitSurrogate)?;
    let second_chunk =
        String::from_utf16(&units[offset..]).map_err(|_| PacketError::SplitSurrogate)?;

    Ok(Packet {
        total,
        first_index,
        second_index,
        first_chunk,
        second_chunk,
    })
}
