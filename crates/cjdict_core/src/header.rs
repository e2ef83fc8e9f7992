//! Artifact header and table layout.
//!
//! Header (LE, 64 bytes):
//!   magic[8]        = "CJDICTV2"
//!   ver_major[2]    = 2
//!   ver_minor[2]    = 0
//!   flags[4]        = Flags
//!   entry_count[4]
//!   header_size[4]  = 64
//!   cp_off[4]       = codepoints table
//!   primary_off[4]  = primary slots
//!   second_off[4]   = secondary slots (0 if absent)
//!   freq_off[4]     = frequency ranks (0 if absent)
//!   payload_len[4]  = bytes after the header
//!   payload_crc[4]  = CRC-32 of the payload
//!   source_hash[4]
//!   build_ts[4]     = epoch seconds
//!   rsv[8]          = 0
//!
//! Payload: codepoints (4n) | primary (6n) | [secondary (6n)] | [frequency (4n)],
//! packed with no gaps in that order.

use crate::consts::{Flags, CODEPOINT_BYTES, FREQUENCY_BYTES, HEADER_SIZE, MAGIC, SLOT_SIZE};
use crate::errors::{DictError, Result};
use crate::utils::{read_u16, read_u32};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version_major: u16,
    pub version_minor: u16,
    pub flags: Flags,
    pub entry_count: u32,
    pub header_size: u32,
    pub codepoints_offset: u32,
    pub primary_offset: u32,
    pub secondary_offset: u32,
    pub frequency_offset: u32,
    pub payload_bytes: u32,
    pub payload_crc32: u32,
    pub source_hash: u32,
    pub build_timestamp: u32,
}

impl Header {
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut hdr = Vec::with_capacity(HEADER_SIZE);
        hdr.extend_from_slice(MAGIC);
        hdr.extend_from_slice(&self.version_major.to_le_bytes());
        hdr.extend_from_slice(&self.version_minor.to_le_bytes());
        hdr.extend_from_slice(&self.flags.bits().to_le_bytes());
        hdr.extend_from_slice(&self.entry_count.to_le_bytes());
        hdr.extend_from_slice(&self.header_size.to_le_bytes());
        hdr.extend_from_slice(&self.codepoints_offset.to_le_bytes());
        hdr.extend_from_slice(&self.primary_offset.to_le_bytes());
        hdr.extend_from_slice(&self.secondary_offset.to_le_bytes());
        hdr.extend_from_slice(&self.frequency_offset.to_le_bytes());
        hdr.extend_from_slice(&self.payload_bytes.to_le_bytes());
        hdr.extend_from_slice(&self.payload_crc32.to_le_bytes());
        hdr.extend_from_slice(&self.source_hash.to_le_bytes());
        hdr.extend_from_slice(&self.build_timestamp.to_le_bytes());
        hdr.resize(HEADER_SIZE, 0); // reserved
        let mut out = [0u8; HEADER_SIZE];
        out.copy_from_slice(&hdr);
        out
    }

    /// Read the fields after the magic. Only the length is checked here.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(DictError::TruncatedHeader { len: bytes.len() });
        }
        Ok(Self::read_fields(&mut Cursor::new(&bytes[8..HEADER_SIZE]))?)
    }

    fn read_fields(r: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        Ok(Self {
            version_major: read_u16(r)?,
            version_minor: read_u16(r)?,
            flags: Flags::from_bits_retain(read_u32(r)?),
            entry_count: read_u32(r)?,
            header_size: read_u32(r)?,
            codepoints_offset: read_u32(r)?,
            primary_offset: read_u32(r)?,
            secondary_offset: read_u32(r)?,
            frequency_offset: read_u32(r)?,
            payload_bytes: read_u32(r)?,
            payload_crc32: read_u32(r)?,
            source_hash: read_u32(r)?,
            build_timestamp: read_u32(r)?,
        })
    }
}

/// Table sizes and offsets implied by `entry_count` and `flags`. Computed in
/// u64 so a hostile header cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub codepoints_offset: u64,
    pub codepoints_bytes: u64,
    pub primary_offset: u64,
    pub primary_bytes: u64,
    /// 0 when absent
    pub secondary_offset: u64,
    pub secondary_bytes: u64,
    /// 0 when absent
    pub frequency_offset: u64,
    pub frequency_bytes: u64,
}

impl Layout {
    pub fn compute(entry_count: u64, flags: Flags) -> Self {
        let codepoints_offset = HEADER_SIZE as u64;
        let codepoints_bytes = entry_count * CODEPOINT_BYTES as u64;
        let primary_offset = codepoints_offset + codepoints_bytes;
        let primary_bytes = entry_count * SLOT_SIZE as u64;
        let mut cursor = primary_offset + primary_bytes;

        let secondary_bytes = if flags.has_secondary() { entry_count * SLOT_SIZE as u64 } else { 0 };
        let secondary_offset = if flags.has_secondary() { cursor } else { 0 };
        cursor += secondary_bytes;

        let frequency_bytes = if flags.has_frequency() { entry_count * FREQUENCY_BYTES as u64 } else { 0 };
        let frequency_offset = if flags.has_frequency() { cursor } else { 0 };

        Self {
            codepoints_offset,
            codepoints_bytes,
            primary_offset,
            primary_bytes,
            secondary_offset,
            secondary_bytes,
            frequency_offset,
            frequency_bytes,
        }
    }

    pub fn payload_bytes(&self) -> u64 {
        self.codepoints_bytes + self.primary_bytes + self.secondary_bytes + self.frequency_bytes
    }

    pub fn total_bytes(&self) -> u64 { HEADER_SIZE as u64 + self.payload_bytes() }
}
