//! UTF-16LE string helpers.
//!
//! XBF stores every string as little-endian UTF-16 code units, with lengths
//! counted in code units rather than bytes.

/// Decode little-endian UTF-16 bytes into a `String`.
///
/// A trailing odd byte is ignored and unpaired surrogates become U+FFFD.
pub fn decode_le(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Encode a string as little-endian UTF-16 bytes.
pub fn encode_le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Number of UTF-16 code units needed to encode `s`.
pub fn code_units(s: &str) -> usize {
    s.encode_utf16().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_bmp_uses_two_units() {
        let s = "a\u{1F600}";
        assert_eq!(code_units(s), 3);
        assert_eq!(decode_le(&encode_le(s)), s);
    }

    #[test]
    fn test_unpaired_surrogate_is_replaced() {
        // 0xD800 alone followed by 'x'
        let bytes = [0x00, 0xD8, b'x', 0x00];
        assert_eq!(decode_le(&bytes), "\u{FFFD}x");
    }
}
