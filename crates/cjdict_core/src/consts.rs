// crates/cjdict_core/src/consts.rs

use bitflags::bitflags;

pub const MAGIC: &[u8; 8] = b"CJDICTV2";
pub const VERSION_MAJOR: u16 = 2;
pub const VERSION_MINOR: u16 = 0;

pub const HEADER_SIZE: usize = 64;

/// One code slot: `[len][idx0..idx4]`, unused tail bytes are `SLOT_UNSET`.
pub const SLOT_SIZE: usize = 6;
pub const SLOT_UNSET: u8 = 0xFF;
pub const CODE_MAX_LEN: usize = 5;
pub const ALPHABET_LEN: u8 = 26;

pub const CODEPOINT_BYTES: usize = 4;
pub const FREQUENCY_BYTES: usize = 4;

bitflags! {
    /// Header flag word (offset 12).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Secondary-code slot table is materialized.
        const HAS_SECONDARY = 1;
        /// Frequency rank table is present.
        const HAS_FREQUENCY = 1 << 1;
        /// Secondary table absent, readers derive it from the primary code.
        const SECONDARY_DERIVED = 1 << 2;
    }
}

impl Flags {
    pub fn has_secondary(self) -> bool { self.contains(Flags::HAS_SECONDARY) }
    pub fn has_frequency(self) -> bool { self.contains(Flags::HAS_FREQUENCY) }
    pub fn secondary_derived(self) -> bool { self.contains(Flags::SECONDARY_DERIVED) }
}

const _: () = { assert!(1 + CODE_MAX_LEN == SLOT_SIZE); };
const _: () = { assert!(MAGIC.len() == 8); };
