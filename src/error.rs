//! The `error` module defines the [`IhexError`] enum that describes the errors that
//! can occur when parsing, regenerating, or exporting Intel HEX documents.
//! It carries three pieces of information:
//! 1. In which phase the error occurred, e.g., record parsing or record generation.
//! 2. What kind of error was encountered (via [`IhexErrorKind`]).
//! 3. The 1-based line number of the source file, when the phase has one.
//!
//! [`ToolError`] covers the external command-line toolchain wrapper and is kept
//! separate so that codec errors stay comparable with `PartialEq`.

use std::error::Error;
use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum IhexError {
    ParseRecordError(IhexErrorKind, usize),
    BuildRegionError(IhexErrorKind),
    CreateRecordError(IhexErrorKind),
    ExportError(IhexErrorKind),
}

impl fmt::Display for IhexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseRecordError(base_err, line) => {
                write!(
                    f,
                    "Error encountered during record parsing at line #{line} of the hex file:\n{base_err}",
                )
            }
            Self::BuildRegionError(base_err) => {
                write!(
                    f,
                    "Error encountered while building memory regions:\n{base_err}",
                )
            }
            Self::CreateRecordError(base_err) => {
                write!(
                    f,
                    "Error encountered during generation of hex records:\n{base_err}",
                )
            }
            Self::ExportError(base_err) => {
                write!(f, "Error encountered during document export:\n{base_err}",)
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum IhexErrorKind {
    /// Record does not begin with a ':'
    MissingStartCode,
    /// Record is shorter than the 9-character header
    RecordTooShort,
    /// Hex digit string is odd-length or contains non-hex characters
    MalformedHex,
    /// Record type code is outside the 0x00..=0x05 range
    InvalidRecordType(u8),
    /// Payload is shorter or longer than the record's byte count allows
    InvalidPayloadLength { expected: usize, actual: usize },
    /// Stored checksum does not match the one computed over the record
    ChecksumMismatch { computed: u8, stored: u8 },
    /// Finalized region's data length disagrees with its address range
    RegionLengthMismatch { expected: u64, actual: usize },
    /// Endian swap requested on a hex string that is not a multiple of 4 chars
    InsufficientDataForEndianSwap(usize),
    /// Re-checksummed record line changed length
    ChecksumPatchLength { before: usize, after: usize },
    /// Output file extension is not in the format-inference table
    UnknownOutputExtension(String),
    /// Source yielded no records at all
    NoValidRecords,
}

impl fmt::Display for IhexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStartCode => {
                write!(f, "Missing start code ':'")
            }
            Self::RecordTooShort => {
                write!(f, "Record too short")
            }
            Self::MalformedHex => {
                write!(f, "Malformed hex digit string")
            }
            Self::InvalidRecordType(code) => {
                write!(f, "Invalid record type code: 0x{code:02X}")
            }
            Self::InvalidPayloadLength { expected, actual } => {
                write!(f, "Expected payload of {expected} bytes, found {actual}")
            }
            Self::ChecksumMismatch { computed, stored } => {
                write!(
                    f,
                    "Invalid record checksum - computed: 0x{computed:02X}, found: 0x{stored:02X}"
                )
            }
            Self::RegionLengthMismatch { expected, actual } => {
                write!(
                    f,
                    "Memory region address range covers {expected} bytes but holds {actual}"
                )
            }
            Self::InsufficientDataForEndianSwap(len) => {
                write!(
                    f,
                    "Endian swap requires a multiple of 4 hex chars, found {len}"
                )
            }
            Self::ChecksumPatchLength { before, after } => {
                write!(
                    f,
                    "Record line changed length while patching checksum: {before} -> {after}"
                )
            }
            Self::UnknownOutputExtension(ext) => {
                write!(f, "Unknown output file extension: '{ext}'")
            }
            Self::NoValidRecords => {
                write!(f, "No valid record found in the source")
            }
        }
    }
}

impl Error for IhexError {}
impl Error for IhexErrorKind {}

/// Errors from the external command-line toolchain wrapper.
#[derive(Debug)]
pub enum ToolError {
    /// The named executable could not be located
    NotFound(String),
    /// The tool did not exit within the configured timeout and was killed
    Timeout(String, u64),
    /// Spawning or waiting on the process failed
    Io(std::io::Error),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(tool) => {
                write!(f, "{tool} - cmdline tool not found")
            }
            Self::Timeout(tool, secs) => {
                write!(f, "{tool} did not exit within {secs}s and was killed")
            }
            Self::Io(err) => {
                write!(f, "cmdline tool execution failed: {err}")
            }
        }
    }
}

impl Error for ToolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
