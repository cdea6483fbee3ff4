//! The `codec` module holds the low-level hex-string helpers shared by record
//! parsing and generation: byte/hex conversion, the two's-complement record
//! checksum, in-place checksum patching of a generated line, and the optional
//! 16-bit endian swap applied to record payloads.

use crate::error::IhexErrorKind;

/// Decode a hex digit string (even length) into bytes.
///
/// # Errors
/// Returns [`IhexErrorKind::MalformedHex`] if the string has odd length or
/// contains non-hex characters.
///
/// # Examples
/// ```
/// use ihexio::codec::hex_to_bytes;
///
/// assert_eq!(hex_to_bytes("DEAD").unwrap(), vec![0xDE, 0xAD]);
/// assert!(hex_to_bytes("DEA").is_err());
/// ```
pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>, IhexErrorKind> {
    if !s.is_ascii() || s.len() % 2 != 0 {
        return Err(IhexErrorKind::MalformedHex);
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| IhexErrorKind::MalformedHex))
        .collect()
}

/// Encode bytes as an uppercase hex digit string.
#[must_use]
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Two's-complement (mod 256) checksum over a hex digit string.
///
/// # Errors
/// Returns [`IhexErrorKind::MalformedHex`] if the string cannot be decoded.
///
/// # Examples
/// ```
/// use ihexio::codec::checksum;
///
/// // Canonical record `:0300300002337A1E`, checksum byte 0x1E
/// assert_eq!(checksum("0300300002337A").unwrap(), 0x1E);
/// ```
#[allow(clippy::cast_possible_truncation)]
pub fn checksum(hex_digits: &str) -> Result<u8, IhexErrorKind> {
    let bytes = hex_to_bytes(hex_digits)?;
    let sum: usize = bytes.iter().map(|&b| b as usize).sum();
    Ok(((0x100 - (sum & 0xFF)) & 0xFF) as u8)
}

/// Recompute the checksum of a generated record line and replace its trailing
/// two hex chars. The line is expected to carry a placeholder checksum.
///
/// # Errors
/// - [`IhexErrorKind::MissingStartCode`] / [`IhexErrorKind::RecordTooShort`]
///   if the line is not shaped like a record.
/// - [`IhexErrorKind::ChecksumPatchLength`] if the patched line's length
///   differs from the input (invariant check, unreachable for well-formed
///   generation).
pub fn patch_checksum(line: &str) -> Result<String, IhexErrorKind> {
    if !line.starts_with(':') {
        return Err(IhexErrorKind::MissingStartCode);
    }
    if line.len() < 3 {
        return Err(IhexErrorKind::RecordTooShort);
    }

    let body = &line[1..line.len() - 2];
    let csum = checksum(body)?;
    let patched = format!(":{body}{csum:02X}");

    if patched.len() != line.len() {
        return Err(IhexErrorKind::ChecksumPatchLength {
            before: line.len(),
            after: patched.len(),
        });
    }
    Ok(patched)
}

/// Swap byte order within each 4-hex-char (2-byte) group of a hex string.
/// Applying it twice returns the original string.
///
/// # Errors
/// Returns [`IhexErrorKind::InsufficientDataForEndianSwap`] if the string
/// length is not an exact multiple of 4.
pub fn swap_endian_hex(block: &str) -> Result<String, IhexErrorKind> {
    if !block.is_ascii() {
        return Err(IhexErrorKind::MalformedHex);
    }
    if block.len() % 4 != 0 {
        return Err(IhexErrorKind::InsufficientDataForEndianSwap(block.len()));
    }

    let mut swapped = Vec::with_capacity(block.len());
    for group in block.as_bytes().chunks(4) {
        swapped.extend_from_slice(&[group[2], group[3], group[0], group[1]]);
    }
    // Input is ASCII and only reordered
    String::from_utf8(swapped).map_err(|_| IhexErrorKind::MalformedHex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_bytes_valid() {
        assert_eq!(hex_to_bytes("").unwrap(), Vec::<u8>::new());
        assert_eq!(hex_to_bytes("00").unwrap(), vec![0x00]);
        assert_eq!(hex_to_bytes("0aFf").unwrap(), vec![0x0A, 0xFF]);
        assert_eq!(
            hex_to_bytes("0300300002337A").unwrap(),
            vec![0x03, 0x00, 0x30, 0x00, 0x02, 0x33, 0x7A]
        );
    }

    #[test]
    fn test_hex_to_bytes_invalid() {
        assert_eq!(hex_to_bytes("0"), Err(IhexErrorKind::MalformedHex));
        assert_eq!(hex_to_bytes("0Z"), Err(IhexErrorKind::MalformedHex));
        assert_eq!(hex_to_bytes("ABC"), Err(IhexErrorKind::MalformedHex));
    }

    #[test]
    fn test_bytes_to_hex_uppercase() {
        assert_eq!(bytes_to_hex(&[0xDE, 0xAD, 0x01]), "DEAD01");
        assert_eq!(bytes_to_hex(&[]), "");
    }

    #[test]
    fn test_checksum_known_records() {
        // Each tuple = (record body without ':' and checksum, expected checksum)
        let cases = [
            ("0300300002337A", 0x1E),
            ("10010000214601360121470136007EFE09D21901", 0x40),
            ("00000001", 0xFF),
            ("020000021200", 0xEA),
            ("020000040003", 0xF7),
        ];

        for (body, expected) in cases {
            assert_eq!(checksum(body).unwrap(), expected);
        }
    }

    #[test]
    fn test_checksum_all_zero() {
        assert_eq!(checksum("0000").unwrap(), 0x00);
    }

    #[test]
    fn test_patch_checksum_replaces_placeholder() {
        // Arrange
        let line = ":0300300002337AFF";

        // Act
        let patched = patch_checksum(line).unwrap();

        // Assert
        assert_eq!(patched, ":0300300002337A1E");
    }

    #[test]
    fn test_patch_checksum_keeps_valid_line() {
        let line = ":00000001FF";
        assert_eq!(patch_checksum(line).unwrap(), line);
    }

    #[test]
    fn test_patch_checksum_rejects_bad_shape() {
        assert_eq!(
            patch_checksum("0300300002337AFF"),
            Err(IhexErrorKind::MissingStartCode)
        );
        assert_eq!(patch_checksum(":0"), Err(IhexErrorKind::RecordTooShort));
    }

    #[test]
    fn test_swap_endian_hex_swaps_groups() {
        assert_eq!(swap_endian_hex("AABB").unwrap(), "BBAA");
        assert_eq!(swap_endian_hex("AABBCCDD").unwrap(), "CCDDAABB");
        assert_eq!(swap_endian_hex("").unwrap(), "");
    }

    #[test]
    fn test_swap_endian_hex_is_involution() {
        let input = "0123456789ABCDEF";
        let once = swap_endian_hex(input).unwrap();
        let twice = swap_endian_hex(&once).unwrap();
        assert_eq!(twice, input);
    }

    #[test]
    fn test_swap_endian_hex_rejects_unaligned() {
        assert_eq!(
            swap_endian_hex("AABBCC"),
            Err(IhexErrorKind::InsufficientDataForEndianSwap(6))
        );
        assert_eq!(
            swap_endian_hex("AB"),
            Err(IhexErrorKind::InsufficientDataForEndianSwap(2))
        );
    }
}
