//! Fixed 6-byte code slots.
//!
//! ```text
//!   byte 0      code length L (1..=5)
//!   bytes 1..=L letter index (letter - 'A', 0..=25)
//!   rest        0xFF
//! ```

use crate::code::is_valid_code;
use crate::consts::{ALPHABET_LEN, CODE_MAX_LEN, SLOT_SIZE, SLOT_UNSET};

pub type Slot = [u8; SLOT_SIZE];

/// Pack a validated code. `None` when the code is outside `[A-Z]{1,5}`.
pub fn pack(code: &str) -> Option<Slot> {
    if !is_valid_code(code) {
        return None;
    }
    let mut slot = [SLOT_UNSET; SLOT_SIZE];
    slot[0] = code.len() as u8;
    for (i, b) in code.bytes().enumerate() {
        slot[i + 1] = b - b'A';
    }
    Some(slot)
}

/// Why a slot could not be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotFault {
    Length(u8),
    Letter { position: usize, value: u8 },
}

impl std::fmt::Display for SlotFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotFault::Length(len) => write!(f, "length byte {len} outside 1..{CODE_MAX_LEN}"),
            SlotFault::Letter { position, value } => {
                write!(f, "letter index {value} at position {position} outside 0..25")
            }
        }
    }
}

/// Unpack one slot, checking the length byte and every letter index it covers.
pub fn unpack(slot: &[u8]) -> Result<String, SlotFault> {
    let len = slot[0];
    if len == 0 || len as usize > CODE_MAX_LEN {
        return Err(SlotFault::Length(len));
    }
    let mut code = String::with_capacity(len as usize);
    for (position, &value) in slot[1..=len as usize].iter().enumerate() {
        if value >= ALPHABET_LEN {
            return Err(SlotFault::Letter { position, value });
        }
        code.push(char::from(b'A' + value));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_with_sentinel_tail() {
        assert_eq!(pack("ONF"), Some([3, 14, 13, 5, 0xFF, 0xFF]));
        assert_eq!(pack("ZZZZZ"), Some([5, 25, 25, 25, 25, 25]));
        assert_eq!(pack("A"), Some([1, 0, 0xFF, 0xFF, 0xFF, 0xFF]));
        assert_eq!(pack("123"), None);
        assert_eq!(pack(""), None);
    }

    #[test]
    fn unpack_reads_back() {
        assert_eq!(unpack(&[3, 7, 16, 8, 0xFF, 0xFF]).unwrap(), "HQI");
    }

    #[test]
    fn unpack_rejects_bad_contents() {
        assert_eq!(unpack(&[0, 0, 0, 0, 0, 0]), Err(SlotFault::Length(0)));
        assert_eq!(unpack(&[6, 0, 0, 0, 0, 0]), Err(SlotFault::Length(6)));
        assert_eq!(
            unpack(&[2, 0, 26, 0xFF, 0xFF, 0xFF]),
            Err(SlotFault::Letter { position: 1, value: 26 })
        );
        // sentinel inside the covered range is a bad letter, not padding
        assert_eq!(
            unpack(&[2, 0, 0xFF, 0xFF, 0xFF, 0xFF]),
            Err(SlotFault::Letter { position: 1, value: 0xFF })
        );
    }
}
