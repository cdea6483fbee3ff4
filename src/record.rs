//! The `record` module defines [`Record`] and [`RecordType`], the decoded form of
//! one physical line of an Intel HEX file, plus the line-generation helpers used
//! when re-encoding memory regions.

use crate::codec;
use crate::error::IhexErrorKind;

mod layout {
    use std::ops::Range;
    pub const COUNT_RANGE: Range<usize> = 1..3;
    pub const ADDR_RANGE: Range<usize> = 3..7;
    pub const TYPE_RANGE: Range<usize> = 7..9;
    /// ':' + count (2) + address (4) + type (2)
    pub const HEADER_CHARS: usize = 9;
    pub const CHARS_PER_BYTE: usize = 2;
}

/// The terminating end-of-file sentinel line.
pub const EOF_RECORD: &str = ":00000001FF";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    Data = 0x00,
    EndOfFile = 0x01,
    ExtendedSegmentAddress = 0x02,
    StartSegmentAddress = 0x03,
    ExtendedLinearAddress = 0x04,
    StartLinearAddress = 0x05,
}

impl RecordType {
    fn from_code(code: u8) -> Result<Self, IhexErrorKind> {
        match code {
            0x00 => Ok(Self::Data),
            0x01 => Ok(Self::EndOfFile),
            0x02 => Ok(Self::ExtendedSegmentAddress),
            0x03 => Ok(Self::StartSegmentAddress),
            0x04 => Ok(Self::ExtendedLinearAddress),
            0x05 => Ok(Self::StartLinearAddress),
            _ => Err(IhexErrorKind::InvalidRecordType(code)),
        }
    }
}

/// One decoded record line: byte count, 16-bit address field, type, payload
/// bytes and the stored checksum byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub data_count: u8,
    pub address: u16,
    pub rtype: RecordType,
    pub data: Vec<u8>,
    pub checksum: u8,
}

impl Record {
    /// Parse one line (no trailing newline) into a [`Record`].
    ///
    /// When `swap_endian` is set, the payload hex digits are byte-swapped in
    /// 16-bit groups before decoding. When `verify_checksum` is set, the
    /// checksum is recomputed over the header and payload characters as they
    /// appear on the line (pre-swap) and compared against the stored byte.
    ///
    /// # Errors
    /// Returns the [`IhexErrorKind`] describing the structural defect; the
    /// caller is expected to wrap it with the source line number.
    ///
    /// # Examples
    /// ```
    /// use ihexio::{Record, RecordType};
    ///
    /// let rec = Record::parse(":0300300002337A1E", false, true).unwrap();
    /// assert_eq!(rec.rtype, RecordType::Data);
    /// assert_eq!(rec.address, 0x0030);
    /// assert_eq!(rec.data, vec![0x02, 0x33, 0x7A]);
    /// ```
    pub fn parse(
        line: &str,
        swap_endian: bool,
        verify_checksum: bool,
    ) -> Result<Self, IhexErrorKind> {
        if line.len() < layout::HEADER_CHARS {
            return Err(IhexErrorKind::RecordTooShort);
        }
        if !line.starts_with(':') {
            return Err(IhexErrorKind::MissingStartCode);
        }
        if !line.is_ascii() {
            return Err(IhexErrorKind::MalformedHex);
        }

        let data_count = u8::from_str_radix(&line[layout::COUNT_RANGE], 16)
            .map_err(|_| IhexErrorKind::MalformedHex)?;
        let address = u16::from_str_radix(&line[layout::ADDR_RANGE], 16)
            .map_err(|_| IhexErrorKind::MalformedHex)?;
        let type_code = u8::from_str_radix(&line[layout::TYPE_RANGE], 16)
            .map_err(|_| IhexErrorKind::MalformedHex)?;
        let rtype = RecordType::from_code(type_code)?;

        let data_end = layout::HEADER_CHARS + data_count as usize * layout::CHARS_PER_BYTE;
        let record_end = data_end + layout::CHARS_PER_BYTE;
        if line.len() < record_end {
            return Err(IhexErrorKind::InvalidPayloadLength {
                expected: data_count as usize,
                actual: line.len().saturating_sub(layout::HEADER_CHARS) / layout::CHARS_PER_BYTE,
            });
        }

        let payload_hex = &line[layout::HEADER_CHARS..data_end];
        let data = if swap_endian {
            codec::hex_to_bytes(&codec::swap_endian_hex(payload_hex)?)?
        } else {
            codec::hex_to_bytes(payload_hex)?
        };

        let checksum = u8::from_str_radix(&line[data_end..record_end], 16)
            .map_err(|_| IhexErrorKind::MalformedHex)?;

        if verify_checksum {
            // Checksum covers the hex digits as written, before any endian swap
            let computed = codec::checksum(&line[1..data_end])?;
            if computed != checksum {
                return Err(IhexErrorKind::ChecksumMismatch {
                    computed,
                    stored: checksum,
                });
            }
        }

        Ok(Self {
            data_count,
            address,
            rtype,
            data,
            checksum,
        })
    }

    /// Build a DATA record line for `data` at the 16-bit `address`. The line is
    /// formatted with a placeholder checksum and patched afterwards.
    ///
    /// # Errors
    /// Returns an error if `data` exceeds 255 bytes.
    #[allow(clippy::cast_possible_truncation)]
    pub fn emit_data(address: u16, data: &[u8]) -> Result<String, IhexErrorKind> {
        if data.len() > usize::from(u8::MAX) {
            return Err(IhexErrorKind::InvalidPayloadLength {
                expected: usize::from(u8::MAX),
                actual: data.len(),
            });
        }
        let line = format!(
            ":{:02X}{:04X}00{}FF",
            data.len() as u8,
            address,
            codec::bytes_to_hex(data)
        );
        codec::patch_checksum(&line)
    }

    /// Build an ELA record line carrying the high 16 bits of the offset.
    ///
    /// # Errors
    /// Returns an error if checksum patching fails (unreachable for this shape).
    pub fn emit_extended_linear(high_offset: u16) -> Result<String, IhexErrorKind> {
        codec::patch_checksum(&format!(":02000004{high_offset:04X}FF"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns valid instances of Record
    fn get_valid_struct_records() -> [Record; 5] {
        [
            Record {
                data_count: 0x10,
                address: 0x0100,
                rtype: RecordType::Data,
                data: vec![
                    0x21, 0x46, 0x01, 0x36, 0x01, 0x21, 0x47, 0x01, 0x36, 0x00, 0x7E, 0xFE, 0x09,
                    0xD2, 0x19, 0x01,
                ],
                checksum: 0x40,
            },
            Record {
                data_count: 0x03,
                address: 0x0030,
                rtype: RecordType::Data,
                data: vec![0x02, 0x33, 0x7A],
                checksum: 0x1E,
            },
            Record {
                data_count: 0x00,
                address: 0x0000,
                rtype: RecordType::EndOfFile,
                data: vec![],
                checksum: 0xFF,
            },
            Record {
                data_count: 0x02,
                address: 0x0000,
                rtype: RecordType::ExtendedSegmentAddress,
                data: vec![0x12, 0x00],
                checksum: 0xEA,
            },
            Record {
                data_count: 0x02,
                address: 0x0000,
                rtype: RecordType::ExtendedLinearAddress,
                data: vec![0x00, 0x03],
                checksum: 0xF7,
            },
        ]
    }

    /// Returns valid record strings
    fn get_valid_str_records() -> [&'static str; 5] {
        [
            ":10010000214601360121470136007EFE09D2190140",
            ":0300300002337A1E",
            ":00000001FF",
            ":020000021200EA",
            ":020000040003F7",
        ]
    }

    /// Returns invalid record strings and corresponding errors
    fn get_invalid_str_records() -> [(&'static str, IhexErrorKind); 7] {
        [
            // Removed ':' from record str
            ("00000001FF", IhexErrorKind::MissingStartCode),
            // Shorter than the 9-char header
            (":0000FF", IhexErrorKind::RecordTooShort),
            // Count byte says 16 data bytes, line carries 3 (incl. checksum)
            (
                ":100000000000FF",
                IhexErrorKind::InvalidPayloadLength {
                    expected: 16,
                    actual: 3,
                },
            ),
            // Char 'Z' is not a hex digit
            (":0000000ZFF", IhexErrorKind::MalformedHex),
            // Record type 0x06 does not exist
            (":00000006FA", IhexErrorKind::InvalidRecordType(0x06)),
            // Checksum should be 0xF0
            (
                ":1000000000000000000000000000000000000000AA",
                IhexErrorKind::ChecksumMismatch {
                    computed: 0xF0,
                    stored: 0xAA,
                },
            ),
            // Correct shape, corrupted checksum on the canonical record
            (
                ":0300300002337A1F",
                IhexErrorKind::ChecksumMismatch {
                    computed: 0x1E,
                    stored: 0x1F,
                },
            ),
        ]
    }

    #[test]
    fn test_parse_valid_records() {
        let records = get_valid_str_records();
        let expected_records = get_valid_struct_records();
        for (rec_str, rec) in records.iter().zip(expected_records.iter()) {
            assert_eq!(Record::parse(rec_str, false, true).unwrap(), *rec);
        }
    }

    #[test]
    fn test_parse_invalid_records() {
        let records_and_errors = get_invalid_str_records();
        for (record, expected_error) in records_and_errors {
            assert_eq!(
                Record::parse(record, false, true).unwrap_err(),
                expected_error
            );
        }
    }

    #[test]
    fn test_parse_skips_checksum_verification_when_disabled() {
        // Stored checksum is wrong but verification is off
        let rec = Record::parse(":0300300002337A00", false, false).unwrap();
        assert_eq!(rec.checksum, 0x00);
        assert_eq!(rec.data, vec![0x02, 0x33, 0x7A]);
    }

    #[test]
    fn test_parse_ignores_trailing_characters() {
        // Anything after the checksum pair is outside the record
        let rec = Record::parse(":0300300002337A1E  ", false, true).unwrap();
        assert_eq!(rec.data_count, 3);
    }

    #[test]
    fn test_parse_with_endian_swap() {
        // Payload AABBCCDD byte-swaps to BBAADDCC; checksum is over the
        // original digits
        let line = codec::patch_checksum(":04001000AABBCCDDFF").unwrap();
        let rec = Record::parse(&line, true, true).unwrap();
        assert_eq!(rec.data, vec![0xBB, 0xAA, 0xDD, 0xCC]);
    }

    #[test]
    fn test_parse_endian_swap_rejects_unaligned_payload() {
        let line = codec::patch_checksum(":0300300002337AFF").unwrap();
        assert_eq!(
            Record::parse(&line, true, true).unwrap_err(),
            IhexErrorKind::InsufficientDataForEndianSwap(6)
        );
    }

    #[test]
    fn test_emit_data_record() {
        // Arrange
        let data = [0x02, 0x33, 0x7A];

        // Act
        let line = Record::emit_data(0x0030, &data).unwrap();

        // Assert
        assert_eq!(line, ":0300300002337A1E");
    }

    #[test]
    fn test_emit_data_record_roundtrips() {
        let data: Vec<u8> = (0..=0xFF).map(|b| b as u8).take(16).collect();
        let line = Record::emit_data(0x1234, &data).unwrap();
        let rec = Record::parse(&line, false, true).unwrap();
        assert_eq!(rec.address, 0x1234);
        assert_eq!(rec.data, data);
    }

    #[test]
    fn test_emit_data_record_too_long() {
        let data = vec![0u8; 256];
        assert_eq!(
            Record::emit_data(0, &data).unwrap_err(),
            IhexErrorKind::InvalidPayloadLength {
                expected: 255,
                actual: 256,
            }
        );
    }

    #[test]
    fn test_emit_extended_linear_record() {
        assert_eq!(
            Record::emit_extended_linear(0x0003).unwrap(),
            ":020000040003F7"
        );
        assert_eq!(
            Record::emit_extended_linear(0x0000).unwrap(),
            ":020000040000FA"
        );
    }
}
