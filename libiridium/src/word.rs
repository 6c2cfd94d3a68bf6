//! The Iridium machine word and the bit slices the assembler hands around.
//!
//! Memory is 65536 16-bit words, addressed 0..=65535 by word offset. A full
//! 16-bit value splits into a high 10-bit half and a low 6-bit half:
//! ____________________________________
//! |       high 10        |  low 6    |
//! ------------------------------------
//! LUI loads the high half (shifted up by 6), and an add of the low half
//! reconstructs the original value exactly, because the low 6 bits are zero
//! after LUI and the add can never carry.

pub type Word = u16;

pub const MEM_WORDS: usize = 65536;

pub const LOW6_MASK: u16 = 0x3F;
pub const HIGH10_MASK: u16 = 0x3FF;

pub fn low6(value: u16) -> u16 {
    value & LOW6_MASK
}

pub fn high10(value: u16) -> u16 {
    (value >> 6) & HIGH10_MASK
}

/// Sign-extend a 7-bit two's-complement field to i16.
pub fn sign_extend7(field: u16) -> i16 {
    let field = field & 0x7F;
    if field & 0x40 != 0 {
        (field | 0xFF80) as i16
    } else {
        field as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slices() {
        assert_eq!(low6(0xFFFF), 0x3F);
        assert_eq!(high10(0xFFFF), 0x3FF);
        assert_eq!(low6(0x0ABC), 0x3C);
        assert_eq!(high10(0x0ABC), 0x2A);
        assert_eq!(low6(0), 0);
        assert_eq!(high10(0), 0);
    }

    #[test]
    fn test_halves_reconstruct() {
        for value in [0u16, 1, 63, 64, 0x0ABC, 0x7FFF, 0x8000, 0xFFFF] {
            assert_eq!((high10(value) << 6) + low6(value), value);
        }
    }

    #[test]
    fn test_sign_extend7() {
        assert_eq!(sign_extend7(0), 0);
        assert_eq!(sign_extend7(63), 63);
        assert_eq!(sign_extend7(0x7F), -1);
        assert_eq!(sign_extend7(0x40), -64);
    }
}
