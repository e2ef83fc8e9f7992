//! Artifact bytes → validated, zero-copy views.
//!
//! Checks run in a fixed order and stop at the first failure:
//! length, magic, major version, header size, total length, payload CRC,
//! table sizes, each offset, codepoint ordering. Views borrow the input
//! buffer; nothing is copied.

use crate::consts::{Flags, CODEPOINT_BYTES, HEADER_SIZE, MAGIC, SLOT_SIZE, VERSION_MAJOR};
use crate::errors::{CodeTable, DictError, OffsetField, Result};
use crate::header::{Header, Layout};
use crate::slot;
use crate::utils::{crc32, u32_at};
use tracing::{debug, trace};

/// Little-endian u32 array read in place (no alignment requirement).
#[derive(Debug, Clone, Copy)]
pub struct U32Table<'a> {
    bytes: &'a [u8],
}

impl<'a> U32Table<'a> {
    fn new(bytes: &'a [u8]) -> Self { Self { bytes } }

    pub fn len(&self) -> usize { self.bytes.len() / CODEPOINT_BYTES }
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }
    pub fn as_bytes(&self) -> &'a [u8] { self.bytes }

    pub fn get(&self, index: usize) -> Option<u32> {
        (index < self.len()).then(|| u32_at(self.bytes, index * CODEPOINT_BYTES))
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + 'a {
        self.bytes.chunks_exact(CODEPOINT_BYTES).map(|w| u32_at(w, 0))
    }

    /// Index of `target` in an ascending table.
    pub fn binary_search(&self, target: u32) -> Option<usize> {
        let (mut lo, mut hi) = (0usize, self.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let v = u32_at(self.bytes, mid * CODEPOINT_BYTES);
            match v.cmp(&target) {
                std::cmp::Ordering::Equal => return Some(mid),
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }
        None
    }
}

/// Fixed 6-byte code slots. Slot contents are validated on each read.
#[derive(Debug, Clone, Copy)]
pub struct SlotTable<'a> {
    bytes: &'a [u8],
    table: CodeTable,
}

impl<'a> SlotTable<'a> {
    fn new(bytes: &'a [u8], table: CodeTable) -> Self { Self { bytes, table } }

    pub fn len(&self) -> usize { self.bytes.len() / SLOT_SIZE }
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }
    pub fn as_bytes(&self) -> &'a [u8] { self.bytes }
    pub fn table(&self) -> CodeTable { self.table }

    pub fn slot(&self, index: usize) -> Option<&'a [u8]> {
        let start = index.checked_mul(SLOT_SIZE)?;
        self.bytes.get(start..start.checked_add(SLOT_SIZE)?)
    }

    pub fn code(&self, index: usize) -> Result<String> {
        let raw = self.slot(index).ok_or_else(|| DictError::CorruptSlot {
            table: self.table,
            index,
            reason: "index out of range".to_string(),
        })?;
        slot::unpack(raw).map_err(|fault| DictError::CorruptSlot {
            table: self.table,
            index,
            reason: fault.to_string(),
        })
    }
}

/// Validated artifact. Every table aliases the buffer passed to [`decode`].
#[derive(Debug, Clone, Copy)]
pub struct DecodedView<'a> {
    header: Header,
    codepoints: U32Table<'a>,
    primary: SlotTable<'a>,
    secondary: Option<SlotTable<'a>>,
    frequency: Option<U32Table<'a>>,
}

impl<'a> DecodedView<'a> {
    pub fn header(&self) -> &Header { &self.header }
    pub fn flags(&self) -> Flags { self.header.flags }
    pub fn entry_count(&self) -> usize { self.codepoints.len() }
    pub fn codepoints(&self) -> U32Table<'a> { self.codepoints }
    pub fn primary_table(&self) -> SlotTable<'a> { self.primary }
    pub fn secondary_table(&self) -> Option<SlotTable<'a>> { self.secondary }
    pub fn frequency(&self) -> Option<U32Table<'a>> { self.frequency }
}

fn check_offset(field: OffsetField, expected: u64, found: u32) -> Result<()> {
    if expected == found as u64 {
        return Ok(());
    }
    Err(DictError::InvalidOffset {
        field,
        expected: u32::try_from(expected).unwrap_or(u32::MAX),
        found,
    })
}

fn table(bytes: &[u8], offset: u64, len: u64) -> &[u8] {
    &bytes[offset as usize..(offset + len) as usize]
}

/// Validate `bytes` and expose its tables without copying.
pub fn decode(bytes: &[u8]) -> Result<DecodedView<'_>> {
    if bytes.len() < HEADER_SIZE {
        return Err(DictError::TruncatedHeader { len: bytes.len() });
    }

    if &bytes[..MAGIC.len()] != MAGIC {
        let mut found = [0u8; 8];
        found.copy_from_slice(&bytes[..MAGIC.len()]);
        return Err(DictError::InvalidMagic { found });
    }

    let header = Header::parse(bytes)?;
    trace!(?header, "parsed dictionary header");

    if header.version_major != VERSION_MAJOR {
        return Err(DictError::UnsupportedVersion {
            major: header.version_major,
            minor: header.version_minor,
        });
    }

    if header.header_size as usize != HEADER_SIZE {
        return Err(DictError::InvalidHeaderSize(header.header_size));
    }

    let declared = header.header_size as u64 + header.payload_bytes as u64;
    if bytes.len() as u64 != declared {
        return Err(DictError::PayloadSizeMismatch { declared, actual: bytes.len() });
    }

    let payload = &bytes[HEADER_SIZE..];
    let actual_crc = crc32(payload);
    if actual_crc != header.payload_crc32 {
        return Err(DictError::Integrity { expected: header.payload_crc32, actual: actual_crc });
    }

    let layout = Layout::compute(header.entry_count as u64, header.flags);
    if layout.payload_bytes() != header.payload_bytes as u64 {
        return Err(DictError::LayoutMismatch {
            expected: layout.payload_bytes(),
            declared: header.payload_bytes,
        });
    }

    check_offset(OffsetField::Codepoints, layout.codepoints_offset, header.codepoints_offset)?;
    check_offset(OffsetField::Primary, layout.primary_offset, header.primary_offset)?;
    check_offset(OffsetField::Secondary, layout.secondary_offset, header.secondary_offset)?;
    check_offset(OffsetField::Frequency, layout.frequency_offset, header.frequency_offset)?;

    let codepoints = U32Table::new(table(bytes, layout.codepoints_offset, layout.codepoints_bytes));
    let mut prev: Option<u32> = None;
    for (index, cp) in codepoints.iter().enumerate() {
        if prev.is_some_and(|p| cp <= p) {
            return Err(DictError::UnsortedTable { index });
        }
        prev = Some(cp);
    }

    let primary = SlotTable::new(table(bytes, layout.primary_offset, layout.primary_bytes), CodeTable::Primary);
    let secondary = header.flags.has_secondary().then(|| {
        SlotTable::new(table(bytes, layout.secondary_offset, layout.secondary_bytes), CodeTable::Secondary)
    });
    let frequency = header
        .flags
        .has_frequency()
        .then(|| U32Table::new(table(bytes, layout.frequency_offset, layout.frequency_bytes)));

    debug!(
        entries = header.entry_count,
        major = header.version_major,
        minor = header.version_minor,
        secondary = secondary.is_some(),
        frequency = frequency.is_some(),
        "decoded dictionary artifact"
    );
    Ok(DecodedView { header, codepoints, primary, secondary, frequency })
}
