//! UTF-8 safe chunking of a serialized envelope.
//!
//! Chunks are measured in bytes so multi-byte characters count fully
//! against QR capacity, and boundaries are pulled back onto code-point
//! starts so no character is split between two chunks.

use super::HEADER_OVERHEAD;

/// Returns the per-chunk byte budget for a QR symbol capacity.
///
/// Every packet carries two chunks behind the header, so the budget is half
/// of what remains after [`HEADER_OVERHEAD`]. Zero means the capacity is too
/// small to chunk anything.
pub fn chunk_size_for(max_byte_content: usize) -> usize {
    max_byte_content.saturating_sub(HEADER_OVERHEAD) / 2
}

/// Splits `text` into the fewest chunks of at most `chunk_size_for(max_byte_content)`
/// bytes each.
///
/// Returns an empty list when the capacity leaves no room for chunk data;
/// callers must treat that as a configuration error.
///
/// If the budget is narrower than a single character the window is forced
/// forward by one byte. That chunk is then decoded lossily and the
/// concatenation no longer matches the input; any budget of four bytes or
/// more never hits this path.
pub fn chunk_envelope(text: &str, max_byte_content: usize) -> Vec<String> {
    let chunk_size = chunk_size_for(max_byte_content);
    if chunk_size == 0 {
        return Vec::new();
    }

    let bytes = text.as_bytes();
    let mut chunks = Vec::with_capacity(bytes.len().div_ceil(chunk_size));
    let mut start = 0;

    while start < bytes.len() {
        let mut end = (start + chunk_size).min(bytes.len());

        while end > start && end < bytes.len() && is_continuation(bytes[end]) {
            end -= 1;
        }
        if end <= start {
            end = start + 1;
        }

        chunks.push(String::from_utf8_lossy(&bytes[start..end]).into_owned());
        start = end;
    }

    chunks
}

/// UTF-8 continuation bytes look like `10xx_xxxx`.
fn is_continuation(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Tier;

    /// Capacity that yields the given chunk size.
    fn capacity_for(chunk_size: usize) -> usize {
        HEADER_OVERHEAD + chunk_size * 2
    }

    #[test]
    fn test_chunk_size_per_tier() {
        assert_eq!(chunk_size_for(Tier::L.max_byte_content()), 119);
        assert_eq!(chunk_size_for(Tier::M.max_byte_content()), 100);
        assert_eq!(chunk_size_for(Tier::Q.max_byte_content()), 38);
        assert_eq!(chunk_size_for(Tier::H.max_byte_content()), 28);
    }

    #[test]
    fn test_degenerate_capacity_yields_no_chunks() {
        assert!(chunk_envelope("anything", HEADER_OVERHEAD).is_empty());
        assert!(chunk_envelope("anything", HEADER_OVERHEAD + 1).is_empty());
        assert!(chunk_envelope("anything", 0).is_empty());
    }

    #[test]
    fn test_ascii_exact_windows() {
        let chunks = chunk_envelope("abcdefghij", capacity_for(4));
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_does_not_split_cjk() {
        let chunks = chunk_envelope("Hello, 世界!", capacity_for(4));
        assert_eq!(chunks, vec!["Hell", "o, ", "世", "界!"]);
    }

    #[test]
    fn test_emoji_boundaries() {
        let text = "a😀b😀😀cd😀";
        for size in 4..12 {
            let chunks = chunk_envelope(text, capacity_for(size));
            assert_eq!(chunks.concat(), text, "chunk size {}", size);
            for chunk in &chunks {
                assert!(chunk.len() <= size);
                assert!(!chunk.contains('\u{FFFD}'));
            }
        }
    }

    #[test]
    fn test_boundaries_land_on_char_starts() {
        let text = "ÅßÇ—ñ漢字😀x".repeat(7);
        let chunks = chunk_envelope(&text, capacity_for(5));
        let mut offset = 0;
        for chunk in &chunks {
            offset += chunk.len();
            assert!(text.is_char_boundary(offset));
        }
        assert_eq!(offset, text.len());
    }

    #[test]
    fn test_narrow_window_forces_progress() {
        // A two-byte budget cannot hold a four-byte emoji; the window is
        // pushed forward and the pieces come out lossy instead of looping.
        let chunks = chunk_envelope("😀", capacity_for(2));
        assert_eq!(chunks.len(), 3);
        assert_ne!(chunks.concat(), "😀");
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_envelope("", Tier::H.max_byte_content()).is_empty());
    }
}
