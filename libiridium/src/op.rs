//! The Iridium instruction set: 8 opcodes over three fixed 16-bit layouts.
//!
//! RRR: opcode[15:13] ra[12:10] rb[9:7] rc[6:4] 0000
//! RRI: opcode[15:13] ra[12:10] rb[9:7] imm7[6:0]   (two's complement)
//! RI:  opcode[15:13] ra[12:10] imm10[9:0]          (unsigned)

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;
use strum_macros::{Display, EnumString};

use crate::word::sign_extend7;

pub const IMM7_MIN: i32 = -64;
pub const IMM7_MAX: i32 = 63;
pub const IMM10_MIN: i32 = 0;
pub const IMM10_MAX: i32 = 1023;
pub const IMM6_MIN: i32 = 0;
pub const IMM6_MAX: i32 = 63;
pub const IMM16_MIN: i32 = -32768;
pub const IMM16_MAX: i32 = 32767;

/// `Zero` reads as constant 0 and may never be written by an instruction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive, EnumString, Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum Register {
    Zero = 0,
    R0 = 1,
    R1 = 2,
    R2 = 3,
    R3 = 4,
    R4 = 5,
    R5 = 6,
    R6 = 7,
}

impl Register {
    pub fn writable(self) -> bool {
        self != Register::Zero
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive, EnumString, Display,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RrrOp {
    Add = 0b000,
    Nand = 0b010,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive, EnumString, Display,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RriOp {
    Addi = 0b001,
    Sw = 0b100,
    Lw = 0b101,
    Beq = 0b110,
    Jal = 0b111,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive, EnumString, Display,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RiOp {
    Lui = 0b011,
}

/// A fully resolved instruction, one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Rrr {
        op: RrrOp,
        ra: Register,
        rb: Register,
        rc: Register,
    },
    Rri {
        op: RriOp,
        ra: Register,
        rb: Register,
        /// -64..=63
        imm: i8,
    },
    Ri {
        op: RiOp,
        ra: Register,
        /// 0..=1023
        imm: u16,
    },
}

impl Op {
    pub fn encode(&self) -> u16 {
        match *self {
            Op::Rrr { op, ra, rb, rc } => {
                (op as u16) << 13 | (ra as u16) << 10 | (rb as u16) << 7 | (rc as u16) << 4
            }
            Op::Rri { op, ra, rb, imm } => {
                debug_assert!(IMM7_MIN <= imm as i32 && imm as i32 <= IMM7_MAX);
                (op as u16) << 13 | (ra as u16) << 10 | (rb as u16) << 7 | (imm as u16 & 0x7F)
            }
            Op::Ri { op, ra, imm } => {
                debug_assert!(imm as i32 <= IMM10_MAX);
                (op as u16) << 13 | (ra as u16) << 10 | (imm & 0x3FF)
            }
        }
    }

    pub fn decode(word: u16) -> Op {
        let opcode = word >> 13;
        let ra = register_field(word >> 10);
        match opcode {
            0b000 | 0b010 => Op::Rrr {
                // Covered by the match arm
                op: RrrOp::from_u16(opcode).unwrap(),
                ra,
                rb: register_field(word >> 7),
                rc: register_field(word >> 4),
            },
            0b011 => Op::Ri {
                op: RiOp::Lui,
                ra,
                imm: word & 0x3FF,
            },
            _ => Op::Rri {
                op: RriOp::from_u16(opcode).unwrap(),
                ra,
                rb: register_field(word >> 7),
                imm: sign_extend7(word) as i8,
            },
        }
    }
}

fn register_field(bits: u16) -> Register {
    match Register::from_u16(bits & 0x7) {
        Some(r) => r,
        // All 3-bit values are register numbers
        None => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_register_names() {
        assert_eq!(Register::from_str("zero").unwrap(), Register::Zero);
        assert_eq!(Register::from_str("r0").unwrap(), Register::R0);
        assert_eq!(Register::from_str("r6").unwrap(), Register::R6);
        assert!(Register::from_str("r7").is_err());
        assert!(Register::from_str("sp").is_err());
        assert!(!Register::Zero.writable());
        assert!(Register::R3.writable());
    }

    #[test]
    fn test_mnemonic_lookup() {
        assert_eq!(RrrOp::from_str("ADD").unwrap(), RrrOp::Add);
        assert_eq!(RriOp::from_str("BEQ").unwrap(), RriOp::Beq);
        assert_eq!(RiOp::from_str("LUI").unwrap(), RiOp::Lui);
        assert!(RrrOp::from_str("add").is_err());
    }

    #[test]
    fn test_rrr_layout() {
        let op = Op::Rrr {
            op: RrrOp::Nand,
            ra: Register::R0,
            rb: Register::R6,
            rc: Register::Zero,
        };
        // 010 001 111 000 0000
        assert_eq!(op.encode(), 0b010_001_111_000_0000);
        assert_eq!(Op::decode(op.encode()), op);
    }

    #[test]
    fn test_rri_layout() {
        let op = Op::Rri {
            op: RriOp::Addi,
            ra: Register::R1,
            rb: Register::Zero,
            imm: -1,
        };
        assert_eq!(op.encode(), 0b001_010_000_1111111);
        assert_eq!(Op::decode(op.encode()), op);
    }

    #[test]
    fn test_ri_layout() {
        let op = Op::Ri {
            op: RiOp::Lui,
            ra: Register::R0,
            imm: 1023,
        };
        assert_eq!(op.encode(), 0b011_001_1111111111);
        assert_eq!(Op::decode(op.encode()), op);
    }

    #[test]
    fn test_imm7_round_trip() {
        for v in IMM7_MIN..=IMM7_MAX {
            let op = Op::Rri {
                op: RriOp::Beq,
                ra: Register::R2,
                rb: Register::R3,
                imm: v as i8,
            };
            let Op::Rri { imm, .. } = Op::decode(op.encode()) else {
                panic!("decoded to a different format");
            };
            assert_eq!(imm as i32, v);
        }
    }

    #[test]
    fn test_all_opcodes_decode() {
        for opcode in 0..8u16 {
            let word = opcode << 13;
            let decoded = Op::decode(word);
            assert_eq!(decoded.encode() >> 13, opcode);
        }
    }
}
