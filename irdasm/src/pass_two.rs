//! Stages 5 and 6: substitute label addresses into their consuming fields,
//! then pack each word. Resolution is a pure lookup against the completed
//! symbol table - no label's value depends on another label, so a single
//! walk in any order suffices; the first failure aborts.
//!
//! Addresses in RRI fields are absolute (this ISA's pseudo-direct addressing
//! convention), so a full-address substitution must genuinely fit the 7-bit
//! field; nothing is truncated silently.

use thiserror::Error;

use libiridium::op::{Op, IMM10_MAX, IMM10_MIN, IMM7_MAX, IMM7_MIN};
use libiridium::word::{high10, low6};

use crate::diag::Diagnostic;
use crate::expand::{FieldRef, ProgramWord, Slice, WordData};
use crate::pass_one::Labels;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("undefined label {0}")]
    UndefinedLabel(String),
    #[error("label {name} is at address {address}, which does not fit in {min}..{max}")]
    AddressOutOfRange {
        name: String,
        address: u16,
        min: i32,
        max: i32,
    },
}

/// Width of the field a full-address substitution must fit.
#[derive(Debug, Clone, Copy)]
enum FieldWidth {
    Imm7,
    Imm10,
    Word,
}

impl FieldWidth {
    fn bounds(self) -> (i32, i32) {
        match self {
            FieldWidth::Imm7 => (IMM7_MIN, IMM7_MAX),
            FieldWidth::Imm10 => (IMM10_MIN, IMM10_MAX),
            FieldWidth::Word => (0, 0xFFFF),
        }
    }
}

fn resolve(field: &FieldRef, labels: &Labels, width: FieldWidth) -> Result<i32, ResolutionError> {
    match field {
        FieldRef::Value(v) => Ok(*v),
        FieldRef::Label { name, slice } => {
            let address = labels.get(name)?;
            match slice {
                Slice::Low6 => Ok(low6(address) as i32),
                Slice::High10 => Ok(high10(address) as i32),
                Slice::Full => {
                    let (min, max) = width.bounds();
                    let value = address as i32;
                    if value < min || value > max {
                        Err(ResolutionError::AddressOutOfRange {
                            name: name.clone(),
                            address,
                            min,
                            max,
                        })
                    } else {
                        Ok(value)
                    }
                }
            }
        }
    }
}

fn encode_word(word: &ProgramWord, labels: &Labels) -> Result<u16, ResolutionError> {
    Ok(match word.data {
        WordData::Rrr { op, ra, rb, rc } => Op::Rrr { op, ra, rb, rc }.encode(),
        WordData::Rri {
            op,
            ra,
            rb,
            ref imm,
        } => {
            let imm = resolve(imm, labels, FieldWidth::Imm7)?;
            Op::Rri {
                op,
                ra,
                rb,
                imm: imm as i8,
            }
            .encode()
        }
        WordData::Ri { op, ra, ref imm } => {
            let imm = resolve(imm, labels, FieldWidth::Imm10)?;
            Op::Ri {
                op,
                ra,
                imm: imm as u16,
            }
            .encode()
        }
        WordData::Fill(ref value) => {
            let value = resolve(value, labels, FieldWidth::Word)?;
            // Two's complement for negatives; label addresses pass through.
            (value & 0xFFFF) as u16
        }
    })
}

pub fn pass_two(words: &[ProgramWord], labels: &Labels) -> Result<Vec<u16>, Diagnostic> {
    words
        .iter()
        .map(|word| encode_word(word, labels).map_err(|e| Diagnostic::new(word.line_no, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::expand;
    use crate::parser::parse_program;
    use crate::pass_one::pass_one;
    use crate::validate::validate_program;
    use libiridium::op::{Register, RiOp, RriOp};

    fn assemble(source: &str) -> Result<Vec<u16>, Diagnostic> {
        let words = expand(validate_program(parse_program(source).unwrap()).unwrap());
        let labels = pass_one(&words)?;
        pass_two(&words, &labels)
    }

    #[test]
    fn test_full_slice_in_beq() {
        let image = assemble("loop: NOP\nBEQ $r0, $zero, @loop").unwrap();
        assert_eq!(
            Op::decode(image[1]),
            Op::Rri {
                op: RriOp::Beq,
                ra: Register::R0,
                rb: Register::Zero,
                imm: 0,
            }
        );
    }

    #[test]
    fn test_movi_label_slices_reconstruct_address() {
        // Pad the target past 63 so both halves are non-trivial.
        let mut source = String::new();
        for _ in 0..70 {
            source.push_str("NOP\n");
        }
        source.push_str("spot: .fill 5\nMOVI $r0, @spot\n");
        let image = assemble(&source).unwrap();

        let Op::Ri { op: RiOp::Lui, imm: high, .. } = Op::decode(image[71]) else {
            panic!("expected LUI");
        };
        let Op::Rri { op: RriOp::Addi, imm: low, .. } = Op::decode(image[72]) else {
            panic!("expected ADDI");
        };
        assert_eq!((high << 6) + low as u16, 70);
    }

    #[test]
    fn test_fill_label_is_full_address() {
        let image = assemble("ptr: .fill @ptr\n").unwrap();
        assert_eq!(image[0], 0);

        let image = assemble("NOP\nNOP\nptr: .fill @ptr\n").unwrap();
        assert_eq!(image[2], 2);
    }

    #[test]
    fn test_negative_fill_is_twos_complement() {
        let image = assemble(".fill -1\n.fill -32768").unwrap();
        assert_eq!(image[0], 0xFFFF);
        assert_eq!(image[1], 0x8000);
    }

    #[test]
    fn test_undefined_label_aborts() {
        let err = assemble("BEQ $r0, $r0, @nowhere").unwrap_err();
        assert_eq!(err.line_no, 1);
        assert!(matches!(
            err.error,
            crate::AsmError::Resolution(ResolutionError::UndefinedLabel(ref name))
                if name == "nowhere"
        ));
    }

    #[test]
    fn test_address_too_far_for_imm7() {
        let mut source = String::new();
        source.push_str("LW $r0, $zero, @far\n");
        for _ in 0..64 {
            source.push_str("NOP\n");
        }
        source.push_str("far: .fill 9\n");
        let err = assemble(&source).unwrap_err();
        assert_eq!(err.line_no, 1);
        assert!(matches!(
            err.error,
            crate::AsmError::Resolution(ResolutionError::AddressOutOfRange {
                address: 65,
                max: 63,
                ..
            })
        ));
    }

    #[test]
    fn test_lui_full_label_must_fit_imm10() {
        let image = assemble("LUI $r0, @spot\nspot: .fill 1").unwrap();
        assert_eq!(
            Op::decode(image[0]),
            Op::Ri {
                op: RiOp::Lui,
                ra: Register::R0,
                imm: 1,
            }
        );
    }
}
