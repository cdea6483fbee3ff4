//! # `ihexio`
//!
//! `ihexio` is a Rust library for parsing, validating, and re-encoding Intel HEX
//! files.
//!
//! The library provides:
//! - A record parser over the six standard record kinds (via [`Record`]).
//! - Gap-driven reconstruction of contiguous memory regions with full
//!   extended segment/linear address bookkeeping (via [`Document`]).
//! - Serialization back to hex records or to a flat binary image.
//! - Pattern search across region data and a wrapper for external ELF
//!   toolchain binaries (via [`ElfToolchain`]).
//!
//! ## Example
//!
//! ```
//! use ihexio::Document;
//!
//! let mut doc = Document::new();
//! doc.parse(":0300300002337A1E\n:00000001FF\n").unwrap();
//! assert_eq!(doc.regions()[0].data, vec![0x02, 0x33, 0x7A]);
//! ```

pub mod codec;
mod document;
mod error;
mod record;
mod region;
mod search;
mod tools;

// Public APIs
pub use document::{Document, DocumentConfig, generate_records};
pub use error::{IhexError, IhexErrorKind, ToolError};
pub use record::{EOF_RECORD, Record, RecordType};
pub use region::MemoryRegion;
pub use search::{SearchType, search};
pub use tools::ElfToolchain;
