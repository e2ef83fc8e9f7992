//! Entry set → artifact bytes.
//!
//! Every code is packed before the buffer is assembled, so the encoder either
//! fails without output or returns a complete, checksummed artifact.

use crate::code::{canonical_code, derive_secondary};
use crate::consts::{Flags, HEADER_SIZE, VERSION_MAJOR, VERSION_MINOR};
use crate::errors::{CodeTable, DictError, Result};
use crate::header::{Header, Layout};
use crate::normalize::EntrySet;
use crate::slot::{self, Slot};
use crate::utils::{crc32, write_u32};
use std::collections::HashMap;
use std::io::Write;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// `None` materializes the secondary table only when some entry's
    /// secondary code differs from the derived one. `Some(false)` drops the
    /// table unconditionally, custom secondary codes included.
    pub include_secondary_table: Option<bool>,
    /// Rank per character; an empty or missing map omits the frequency table.
    /// Characters without a rank are stored as 0.
    pub frequency_by_char: Option<HashMap<char, u32>>,
    pub source_hash: u32,
    /// Epoch seconds, supplied by the caller.
    pub build_timestamp: u32,
}

impl EncodeOptions {
    pub fn new(build_timestamp: u32) -> Self {
        Self { include_secondary_table: None, frequency_by_char: None, source_hash: 0, build_timestamp }
    }

    pub fn secondary_table(mut self, include: bool) -> Self {
        self.include_secondary_table = Some(include);
        self
    }

    pub fn frequency(mut self, ranks: HashMap<char, u32>) -> Self {
        self.frequency_by_char = Some(ranks);
        self
    }

    pub fn source_hash(mut self, hash: u32) -> Self {
        self.source_hash = hash;
        self
    }
}

struct PackedEntry {
    codepoint: u32,
    primary: Slot,
    secondary: Slot,
    custom_secondary: bool,
}

fn pack_code(raw: &str, table: CodeTable, index: usize) -> Result<(String, Slot)> {
    let code = canonical_code(raw);
    let packed = slot::pack(&code).ok_or(DictError::InvalidCode { table, index })?;
    Ok((code, packed))
}

fn pack_entries(entries: &EntrySet) -> Result<Vec<PackedEntry>> {
    entries
        .iter()
        .enumerate()
        .map(|(index, e)| {
            if char::from_u32(e.codepoint).is_none() {
                return Err(DictError::InvalidCodepoint { index, codepoint: e.codepoint });
            }
            let (primary_code, primary) = pack_code(&e.primary, CodeTable::Primary, index)?;
            let (secondary_code, secondary) = pack_code(&e.secondary, CodeTable::Secondary, index)?;
            Ok(PackedEntry {
                codepoint: e.codepoint,
                primary,
                secondary,
                custom_secondary: secondary_code != derive_secondary(&primary_code),
            })
        })
        .collect()
}

/// Serialize `entries` into one immutable artifact buffer.
pub fn encode(entries: &EntrySet, options: &EncodeOptions) -> Result<Vec<u8>> {
    if entries.is_empty() {
        return Err(DictError::EmptyDictionary);
    }
    let packed = pack_entries(entries)?;

    let include_secondary = options
        .include_secondary_table
        .unwrap_or_else(|| packed.iter().any(|p| p.custom_secondary));
    let ranks = options.frequency_by_char.as_ref().filter(|m| !m.is_empty());

    let mut flags = Flags::empty();
    if include_secondary {
        flags |= Flags::HAS_SECONDARY;
    } else {
        flags |= Flags::SECONDARY_DERIVED;
    }
    if ranks.is_some() {
        flags |= Flags::HAS_FREQUENCY;
    }

    let layout = Layout::compute(packed.len() as u64, flags);
    let (Ok(entry_count), Ok(payload_bytes), Ok(_)) = (
        u32::try_from(packed.len()),
        u32::try_from(layout.payload_bytes()),
        u32::try_from(layout.total_bytes()),
    ) else {
        return Err(DictError::TooLarge { entries: packed.len() });
    };

    let mut buf = Vec::with_capacity(layout.total_bytes() as usize);
    buf.extend_from_slice(&[0u8; HEADER_SIZE]); // header written last

    for p in &packed {
        write_u32(&mut buf, p.codepoint)?;
    }
    for p in &packed {
        buf.write_all(&p.primary)?;
    }
    if include_secondary {
        for p in &packed {
            buf.write_all(&p.secondary)?;
        }
    }
    if let Some(ranks) = ranks {
        for p in &packed {
            let rank = char::from_u32(p.codepoint).and_then(|c| ranks.get(&c)).copied().unwrap_or(0);
            write_u32(&mut buf, rank)?;
        }
    }
    debug_assert_eq!(buf.len() as u64, layout.total_bytes());

    let header = Header {
        version_major: VERSION_MAJOR,
        version_minor: VERSION_MINOR,
        flags,
        entry_count,
        header_size: HEADER_SIZE as u32,
        codepoints_offset: layout.codepoints_offset as u32,
        primary_offset: layout.primary_offset as u32,
        secondary_offset: layout.secondary_offset as u32,
        frequency_offset: layout.frequency_offset as u32,
        payload_bytes,
        payload_crc32: crc32(&buf[HEADER_SIZE..]),
        source_hash: options.source_hash,
        build_timestamp: options.build_timestamp,
    };
    buf[..HEADER_SIZE].copy_from_slice(&header.to_bytes());

    debug!(
        entries = entry_count,
        bytes = buf.len(),
        flags = flags.bits(),
        crc = header.payload_crc32,
        "encoded dictionary artifact"
    );
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Entry;

    fn sample() -> EntrySet {
        EntrySet::from_entries(vec![
            Entry::new('日', "A", "A"),
            Entry::new('月', "B", "B"),
            Entry::new('你', "ONF", "OF"),
        ])
    }

    #[test]
    fn empty_set_fails() {
        let err = encode(&EntrySet::default(), &EncodeOptions::new(0)).unwrap_err();
        assert!(matches!(err, DictError::EmptyDictionary));
    }

    #[test]
    fn invalid_primary_names_table() {
        let set = EntrySet::from_entries(vec![Entry::new('日', "123", "A")]);
        let err = encode(&set, &EncodeOptions::new(0)).unwrap_err();
        assert!(matches!(err, DictError::InvalidCode { table: CodeTable::Primary, index: 0 }));
    }

    #[test]
    fn invalid_secondary_names_table() {
        let set = EntrySet::from_entries(vec![Entry::new('日', "A", "A"), Entry::new('月', "B", "TOOLONG")]);
        let err = encode(&set, &EncodeOptions::new(0)).unwrap_err();
        assert!(matches!(err, DictError::InvalidCode { table: CodeTable::Secondary, index: 1 }));
    }

    #[test]
    fn non_scalar_codepoint_rejected() {
        let surrogate = Entry { codepoint: 0xD800, primary: "A".into(), secondary: "A".into() };
        let set = EntrySet::from_entries(vec![Entry::new('日', "A", "A"), surrogate]);
        let err = encode(&set, &EncodeOptions::new(0)).unwrap_err();
        assert!(matches!(err, DictError::InvalidCodepoint { index: 1, codepoint: 0xD800 }));
    }

    #[test]
    fn auto_omits_secondary_when_derivable() {
        let bytes = encode(&sample(), &EncodeOptions::new(0)).unwrap();
        let flags = Flags::from_bits_retain(u32::from_le_bytes(bytes[12..16].try_into().unwrap()));
        assert_eq!(flags, Flags::SECONDARY_DERIVED);
        assert_eq!(bytes.len(), 64 + 3 * 4 + 3 * 6);
    }

    #[test]
    fn auto_keeps_secondary_when_custom() {
        let set = EntrySet::from_entries(vec![Entry::new('你', "ONF", "ON")]);
        let bytes = encode(&set, &EncodeOptions::new(0)).unwrap();
        let flags = Flags::from_bits_retain(u32::from_le_bytes(bytes[12..16].try_into().unwrap()));
        assert_eq!(flags, Flags::HAS_SECONDARY);
        assert_eq!(bytes.len(), 64 + 4 + 6 + 6);
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let opts = EncodeOptions::new(1_700_000_000).source_hash(0xABCD);
        assert_eq!(encode(&sample(), &opts).unwrap(), encode(&sample(), &opts).unwrap());
    }

    #[test]
    fn payload_layout_is_packed() {
        let ranks = HashMap::from([('日', 1), ('月', 2), ('你', 3)]);
        let bytes = encode(&sample(), &EncodeOptions::new(42).secondary_table(true).frequency(ranks)).unwrap();
        // codepoints ascending: 你 U+4F60, 日 U+65E5, 月 U+6708
        assert_eq!(&bytes[64..68], &0x4F60u32.to_le_bytes());
        assert_eq!(&bytes[76..82], &[3, 14, 13, 5, 0xFF, 0xFF]);
        assert_eq!(&bytes[94..100], &[2, 14, 5, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&bytes[112..116], &3u32.to_le_bytes());
        assert_eq!(u32::from_le_bytes(bytes[44..48].try_into().unwrap()), crc32(&bytes[64..]));
        assert_eq!(u32::from_le_bytes(bytes[52..56].try_into().unwrap()), 42);
    }
}
