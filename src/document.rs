//! The `document` module provides [`Document`], the high-level API for one
//! logical Intel HEX image.
//!
//! A document owns the record list exactly as parsed (insertion order = file
//! order) and the list of memory regions derived from it. Both are rebuilt
//! wholesale on every parse. Serialization back to hex records or to a flat
//! binary image reads only the region list; the record-generation policy
//! re-emits extended-address records where needed to keep the output minimal.

use crate::error::{IhexError, IhexErrorKind};
use crate::record::{EOF_RECORD, Record, RecordType};
use crate::region::{MemoryRegion, RegionFold};
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Per-document configuration, passed at construction. No process-wide state:
/// documents with different settings coexist safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Byte-swap each 16-bit group of record payloads while parsing
    pub swap_endian: bool,
    /// Verify the checksum byte of every parsed record
    pub verify_checksum: bool,
    /// Maximum payload bytes per generated data record
    pub bytes_per_record: u8,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            swap_endian: false,
            verify_checksum: true,
            bytes_per_record: 16,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Path the document was loaded from, if any
    pub source: PathBuf,
    config: DocumentConfig,
    records: Vec<Record>,
    regions: Vec<MemoryRegion>,
}

impl Document {
    /// Creates an empty `Document` with default configuration.
    ///
    /// # Examples
    /// ```
    /// use ihexio::Document;
    ///
    /// let doc = Document::new();
    /// assert_eq!(doc.data_len(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty `Document` with the provided configuration.
    #[must_use]
    pub fn with_config(config: DocumentConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates a `Document` and fills it from the provided hex file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    ///
    /// # Examples
    /// ```
    /// use ihexio::Document;
    ///
    /// let doc = Document::from_hex_file("tests/fixtures/basic.hex").unwrap();
    /// assert_eq!(doc.data_len(), 64);
    /// ```
    pub fn from_hex_file<P: AsRef<Path>>(filepath: P) -> Result<Self, Box<dyn Error>> {
        let mut doc = Self::new();
        doc.load_hex_file(filepath)?;
        Ok(doc)
    }

    /// Fills the `Document` from the provided hex file, replacing its contents.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_hex_file<P: AsRef<Path>>(&mut self, filepath: P) -> Result<(), Box<dyn Error>> {
        let text = std::fs::read_to_string(&filepath)?;
        self.source = filepath.as_ref().to_path_buf();
        self.parse(&text)?;
        Ok(())
    }

    /// Parse a raw hex record stream, replacing the document's record and
    /// region lists.
    ///
    /// Records after an EOF record are ignored. A failed parse leaves the
    /// document cleared; callers must treat it as invalid.
    ///
    /// # Errors
    /// - [`IhexError::ParseRecordError`] with the 1-based line number for any
    ///   structural defect or checksum mismatch.
    /// - [`IhexError::BuildRegionError`] if the stream held no records or the
    ///   region bookkeeping invariant is violated.
    ///
    /// # Examples
    /// ```
    /// use ihexio::Document;
    ///
    /// let mut doc = Document::new();
    /// doc.parse(":0300300002337A1E\n:00000001FF\n").unwrap();
    /// assert_eq!(doc.regions()[0].start, 0x0030);
    /// ```
    pub fn parse(&mut self, text: &str) -> Result<(), IhexError> {
        self.records.clear();
        self.regions.clear();

        for (index, raw_line) in text.split('\n').enumerate() {
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            if line.trim().is_empty() {
                continue;
            }

            let record = Record::parse(line, self.config.swap_endian, self.config.verify_checksum)
                .map_err(|kind| IhexError::ParseRecordError(kind, index + 1))?;

            let is_eof = record.rtype == RecordType::EndOfFile;
            self.records.push(record);
            if is_eof {
                break;
            }
        }

        if self.records.is_empty() {
            return Err(IhexError::BuildRegionError(IhexErrorKind::NoValidRecords));
        }

        let mut fold = RegionFold::new();
        for record in &self.records {
            if !fold.step(record).map_err(IhexError::BuildRegionError)? {
                break;
            }
        }
        self.regions = fold.finish().map_err(IhexError::BuildRegionError)?;

        Ok(())
    }

    /// The derived memory regions, ascending and gap-separated.
    #[must_use]
    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    /// The records exactly as parsed, in file order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Total number of data bytes across all regions.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.regions.iter().map(|r| r.data.len()).sum()
    }

    /// All region bytes concatenated in region order. Address information is
    /// lost in this form; gaps are not filled.
    #[must_use]
    pub fn raw_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.data_len());
        for region in &self.regions {
            data.extend_from_slice(&region.data);
        }
        data
    }

    /// Re-encode the region list into hex record lines.
    ///
    /// Extended linear address records are emitted whenever a chunk's absolute
    /// offset leaves the 16-bit range, and an ELA reset record guards regions
    /// that drop back into the 16-bit range after one. The terminating EOF
    /// record is always appended.
    ///
    /// # Errors
    /// Returns [`IhexError::CreateRecordError`] if record generation fails.
    pub fn to_hex_records(&self) -> Result<Vec<String>, IhexError> {
        let mut lines = Vec::new();
        let mut using_extended = false;
        let mut prev_end: u64 = 0;

        for (index, region) in self.regions.iter().enumerate() {
            if region.start > 0xFFFF {
                using_extended = true;
            }
            // A stale extended offset must not leak into a region that fits
            // back within 16 bits
            let reset_ela = using_extended
                && index > 0
                && region.start <= 0xFFFF
                && region.start != prev_end;
            let is_last = index + 1 == self.regions.len();

            let records = generate_records(
                &region.data,
                region.start,
                reset_ela,
                is_last,
                self.config.bytes_per_record,
            )
            .map_err(IhexError::CreateRecordError)?;
            lines.extend(records);
            prev_end = region.end;
        }

        // An empty document still serializes to a valid stream
        if self.regions.is_empty() {
            lines.push(String::from(EOF_RECORD));
        }

        Ok(lines)
    }

    /// Writes the document as an Intel HEX file at the specified path.
    ///
    /// # Errors
    /// Returns an error if record generation or writing fails.
    pub fn write_hex<P: AsRef<Path>>(&self, filepath: P) -> Result<(), Box<dyn Error>> {
        let mut writer = open_output(filepath.as_ref())?;
        for line in self.to_hex_records()? {
            writeln!(writer, "{line}")?;
        }
        Ok(())
    }

    /// Writes the document as a flat binary image at the specified path:
    /// region bytes concatenated, no gap fill, no address metadata.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write_bin<P: AsRef<Path>>(&self, filepath: P) -> Result<(), Box<dyn Error>> {
        let mut writer = open_output(filepath.as_ref())?;
        for region in &self.regions {
            writer.write_all(&region.data)?;
        }
        Ok(())
    }

    /// Writes the document in the format inferred from the target extension
    /// (case-insensitive): `hex`/`ihex` as records, `bin` as a flat image.
    ///
    /// # Errors
    /// Returns [`IhexError::ExportError`] with
    /// [`IhexErrorKind::UnknownOutputExtension`] for any other extension.
    pub fn save<P: AsRef<Path>>(&self, filepath: P) -> Result<(), Box<dyn Error>> {
        let path = filepath.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "hex" | "ihex" => self.write_hex(path),
            "bin" => self.write_bin(path),
            _ => Err(Box::new(IhexError::ExportError(
                IhexErrorKind::UnknownOutputExtension(ext),
            ))),
        }
    }
}

/// Encode one run of contiguous bytes starting at `start_address` into data
/// records, inserting ELA records whenever the working offset exceeds the
/// 16-bit range. `reset_ela_offset` prepends an ELA record pointing back to 0;
/// `append_eof` terminates the output with the EOF sentinel.
///
/// # Errors
/// Returns an error if `bytes_per_record` is 0 or a record line cannot be
/// built.
#[allow(clippy::cast_possible_truncation)]
pub fn generate_records(
    data: &[u8],
    start_address: u64,
    reset_ela_offset: bool,
    append_eof: bool,
    bytes_per_record: u8,
) -> Result<Vec<String>, IhexErrorKind> {
    if bytes_per_record == 0 {
        return Err(IhexErrorKind::InvalidPayloadLength {
            expected: 1,
            actual: 0,
        });
    }

    let mut records = Vec::new();

    if reset_ela_offset {
        records.push(Record::emit_extended_linear(0)?);
    }

    let mut offset = start_address;
    for chunk in data.chunks(usize::from(bytes_per_record)) {
        if offset > 0xFFFF {
            records.push(Record::emit_extended_linear((offset >> 16) as u16)?);
            offset &= 0xFFFF;
        }
        records.push(Record::emit_data(offset as u16, chunk)?);
        offset += chunk.len() as u64;
    }

    if append_eof {
        records.push(String::from(EOF_RECORD));
    }

    Ok(records)
}

fn open_output(path: &Path) -> Result<std::io::BufWriter<std::fs::File>, Box<dyn Error>> {
    // Ensure the parent directory exists
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    Ok(std::io::BufWriter::new(file))
}
