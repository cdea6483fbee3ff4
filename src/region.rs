//! The `region` module defines [`MemoryRegion`], a contiguous address range with
//! its backing bytes, and [`RegionFold`], the accumulator that turns an ordered
//! record list into a gap-separated region list.
//!
//! The extended-address bookkeeping (ESA/ELA offsets and their interaction in
//! mixed files) lives entirely in the fold, which keeps the transition function
//! testable without a full document.

use crate::error::IhexErrorKind;
use crate::record::{Record, RecordType};

/// A contiguous address range `[start, end)` and its backing bytes.
/// Invariant: `end - start == data.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    pub start: u64,
    pub end: u64,
    pub data: Vec<u8>,
}

impl MemoryRegion {
    /// Number of bytes covered by the region.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.end - self.start
    }

    /// Whether `address` falls inside the region.
    #[must_use]
    pub const fn contains(&self, address: u64) -> bool {
        address >= self.start && address < self.end
    }
}

#[derive(Debug)]
struct OpenRegion {
    start: u64,
    end: u64,
    data: Vec<u8>,
}

/// Sequential fold over parsed records producing the region list.
///
/// State: the extended address base (`offset`), whether the previous record was
/// an ELA (`ela_armed`, which makes a following ESA additive instead of
/// absolute), and the region currently being grown.
#[derive(Debug, Default)]
pub(crate) struct RegionFold {
    offset: u64,
    ela_armed: bool,
    open: Option<OpenRegion>,
    regions: Vec<MemoryRegion>,
}

impl RegionFold {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed one record into the fold. Returns `false` once an EOF record ends
    /// the stream; any records after it must be ignored by the caller.
    pub(crate) fn step(&mut self, record: &Record) -> Result<bool, IhexErrorKind> {
        match record.rtype {
            RecordType::Data => {
                let abs = self.offset + u64::from(record.address);

                // Address gap closes the running region and opens a new one
                if self.open.as_ref().is_some_and(|open| abs != open.end) {
                    self.close_open()?;
                }

                let open = self.open.get_or_insert_with(|| OpenRegion {
                    start: abs,
                    end: abs,
                    data: Vec::new(),
                });
                open.end = abs + u64::from(record.data_count);
                open.data.extend_from_slice(&record.data);
                Ok(true)
            }
            RecordType::EndOfFile => Ok(false),
            RecordType::ExtendedSegmentAddress => {
                let segment = be16(&record.data)? * 16;
                if self.ela_armed {
                    // ESA directly after an ELA adds the segment to the linear
                    // base instead of replacing it (mixed-addressing files)
                    self.offset += segment;
                    self.ela_armed = false;
                } else {
                    self.offset = segment;
                }
                Ok(true)
            }
            RecordType::ExtendedLinearAddress => {
                self.offset = be16(&record.data)? << 16;
                self.ela_armed = true;
                Ok(true)
            }
            // Start-address records carry no memory content
            RecordType::StartSegmentAddress | RecordType::StartLinearAddress => Ok(true),
        }
    }

    /// Finalize the fold, closing the in-progress region if one exists.
    pub(crate) fn finish(mut self) -> Result<Vec<MemoryRegion>, IhexErrorKind> {
        self.close_open()?;
        Ok(self.regions)
    }

    fn close_open(&mut self) -> Result<(), IhexErrorKind> {
        if let Some(open) = self.open.take() {
            let expected = open.end - open.start;
            if open.data.len() as u64 != expected {
                return Err(IhexErrorKind::RegionLengthMismatch {
                    expected,
                    actual: open.data.len(),
                });
            }
            self.regions.push(MemoryRegion {
                start: open.start,
                end: open.end,
                data: open.data,
            });
        }
        Ok(())
    }
}

fn be16(data: &[u8]) -> Result<u64, IhexErrorKind> {
    match data {
        [hi, lo, ..] => Ok(u64::from(u16::from_be_bytes([*hi, *lo]))),
        _ => Err(IhexErrorKind::InvalidPayloadLength {
            expected: 2,
            actual: data.len(),
        }),
    }
}
