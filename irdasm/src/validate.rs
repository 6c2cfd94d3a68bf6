//! Stage 2: shape- and range-check every parsed line, producing one tagged
//! `Statement` per instruction class. Errors are collected across the whole
//! program and reported in batch; a single bad line never hides the rest.

use std::str::FromStr;

use num_traits::FromPrimitive;
use thiserror::Error;

use libiridium::op::{
    Register, RiOp, RriOp, RrrOp, IMM10_MAX, IMM10_MIN, IMM16_MAX, IMM16_MIN, IMM6_MAX, IMM6_MIN,
    IMM7_MAX, IMM7_MIN,
};
use libiridium::syscall::Syscall;

use crate::diag::Diagnostic;
use crate::parser::{Operand, ParsedLine, ParserLine, ProgramLine};
use crate::AssembleError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown mnemonic {0}")]
    UnknownMnemonic(String),
    #[error("expected {} operand(s), got {got}", operand_range(.min, .max))]
    WrongOperandCount { min: usize, max: usize, got: usize },
    #[error("operand {position} must be {expected}")]
    OperandKindMismatch {
        position: usize,
        expected: &'static str,
    },
    #[error("immediate {got} out of range {min}..{max}")]
    ImmediateOutOfRange { got: i32, min: i32, max: i32 },
    #[error("invalid register ${0}")]
    InvalidRegister(String),
    #[error("register $zero is read-only")]
    ReadOnlyRegisterWrite,
    #[error("unknown syscall {0}")]
    UnknownSyscall(String),
    #[error(".space size {size} is smaller than its {elements} initializer(s)")]
    SpaceSizeTooSmall { size: usize, elements: usize },
    #[error("duplicate label {0}")]
    DuplicateLabel(String),
    #[error("program is {words} words, larger than the 65536-word memory")]
    ProgramTooLarge { words: usize },
}

/// An immediate-bearing field: either a checked number or a label reference
/// whose value arrives in pass two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImmValue {
    Number(i32),
    Label(String),
}

/// One validated line, tagged by instruction class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
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
        imm: ImmValue,
    },
    Ri {
        op: RiOp,
        ra: Register,
        imm: ImmValue,
    },
    Nop,
    Lli {
        ra: Register,
        imm: u16,
    },
    Movi {
        ra: Register,
        imm: ImmValue,
    },
    Fill {
        value: ImmValue,
    },
    Space {
        size: usize,
        init: Vec<i32>,
    },
    Text {
        text: String,
    },
    Syscall {
        call: Syscall,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub line_no: usize,
    pub label: Option<String>,
    pub stmt: Statement,
}

fn operand_range(min: &usize, max: &usize) -> String {
    if min == max {
        min.to_string()
    } else {
        format!("{min} to {max}")
    }
}

fn check_range(got: i32, min: i32, max: i32) -> Result<i32, ValidationError> {
    if got < min || got > max {
        Err(ValidationError::ImmediateOutOfRange { got, min, max })
    } else {
        Ok(got)
    }
}

fn register(operand: &Operand, position: usize) -> Result<Register, ValidationError> {
    match operand {
        Operand::Register(name) => Register::from_str(name)
            .map_err(|_| ValidationError::InvalidRegister(name.clone())),
        _ => Err(ValidationError::OperandKindMismatch {
            position,
            expected: "a register",
        }),
    }
}

/// A register in a write position. `$zero` never qualifies.
fn dest_register(operand: &Operand, position: usize) -> Result<Register, ValidationError> {
    let reg = register(operand, position)?;
    if !reg.writable() {
        return Err(ValidationError::ReadOnlyRegisterWrite);
    }
    Ok(reg)
}

fn imm_or_label(
    operand: &Operand,
    position: usize,
    min: i32,
    max: i32,
) -> Result<ImmValue, ValidationError> {
    match operand {
        Operand::Number(v) => Ok(ImmValue::Number(check_range(*v, min, max)?)),
        Operand::LabelRef(name) => Ok(ImmValue::Label(name.clone())),
        _ => Err(ValidationError::OperandKindMismatch {
            position,
            expected: "an immediate or @label",
        }),
    }
}

fn ascii_char(c: char, position: usize) -> Result<i32, ValidationError> {
    if c.is_ascii() {
        Ok(c as i32)
    } else {
        Err(ValidationError::OperandKindMismatch {
            position,
            expected: "an ASCII character",
        })
    }
}

fn expect_operands(line: &ParsedLine, expected: usize) -> Result<(), ValidationError> {
    if line.operands.len() != expected {
        return Err(ValidationError::WrongOperandCount {
            min: expected,
            max: expected,
            got: line.operands.len(),
        });
    }
    Ok(())
}

fn classify(line: &ParsedLine) -> Result<Statement, ValidationError> {
    let ops = &line.operands;
    match line.mnemonic.as_str() {
        "ADD" | "NAND" => {
            expect_operands(line, 3)?;
            Ok(Statement::Rrr {
                // Covered by the match arm
                op: RrrOp::from_str(&line.mnemonic).unwrap(),
                ra: dest_register(&ops[0], 1)?,
                rb: register(&ops[1], 2)?,
                rc: register(&ops[2], 3)?,
            })
        }
        "ADDI" | "SW" | "LW" | "BEQ" | "JAL" => {
            expect_operands(line, 3)?;
            let op = RriOp::from_str(&line.mnemonic).unwrap();
            // SW stores ra and BEQ compares it; everything else writes it.
            let ra = match op {
                RriOp::Sw | RriOp::Beq => register(&ops[0], 1)?,
                _ => dest_register(&ops[0], 1)?,
            };
            Ok(Statement::Rri {
                op,
                ra,
                rb: register(&ops[1], 2)?,
                imm: imm_or_label(&ops[2], 3, IMM7_MIN, IMM7_MAX)?,
            })
        }
        "LUI" => {
            expect_operands(line, 2)?;
            Ok(Statement::Ri {
                op: RiOp::Lui,
                ra: dest_register(&ops[0], 1)?,
                imm: imm_or_label(&ops[1], 2, IMM10_MIN, IMM10_MAX)?,
            })
        }
        "NOP" => {
            expect_operands(line, 0)?;
            Ok(Statement::Nop)
        }
        "LLI" => {
            expect_operands(line, 2)?;
            let ra = dest_register(&ops[0], 1)?;
            let imm = match &ops[1] {
                Operand::Number(v) => check_range(*v, IMM6_MIN, IMM6_MAX)?,
                _ => {
                    return Err(ValidationError::OperandKindMismatch {
                        position: 2,
                        expected: "an immediate",
                    })
                }
            };
            Ok(Statement::Lli {
                ra,
                imm: imm as u16,
            })
        }
        "MOVI" => {
            expect_operands(line, 2)?;
            Ok(Statement::Movi {
                ra: dest_register(&ops[0], 1)?,
                imm: imm_or_label(&ops[1], 2, IMM16_MIN, IMM16_MAX)?,
            })
        }
        ".fill" => {
            expect_operands(line, 1)?;
            let value = match &ops[0] {
                Operand::Number(v) => ImmValue::Number(check_range(*v, IMM16_MIN, IMM16_MAX)?),
                Operand::LabelRef(name) => ImmValue::Label(name.clone()),
                Operand::Char(c) => ImmValue::Number(ascii_char(*c, 1)?),
                _ => {
                    return Err(ValidationError::OperandKindMismatch {
                        position: 1,
                        expected: "an immediate, @label, or character",
                    })
                }
            };
            Ok(Statement::Fill { value })
        }
        ".space" => {
            if ops.is_empty() || ops.len() > 2 {
                return Err(ValidationError::WrongOperandCount {
                    min: 1,
                    max: 2,
                    got: ops.len(),
                });
            }
            let size = match &ops[0] {
                Operand::Number(v) => check_range(*v, 0, IMM16_MAX)? as usize,
                _ => {
                    return Err(ValidationError::OperandKindMismatch {
                        position: 1,
                        expected: "a size immediate",
                    })
                }
            };
            let init = match ops.get(1) {
                None => Vec::new(),
                Some(Operand::List(elems)) => {
                    let mut init = Vec::with_capacity(elems.len());
                    for elem in elems {
                        let v = match elem {
                            Operand::Number(v) => check_range(*v, IMM16_MIN, IMM16_MAX)?,
                            Operand::Char(c) => ascii_char(*c, 2)?,
                            _ => {
                                return Err(ValidationError::OperandKindMismatch {
                                    position: 2,
                                    expected: "a list of immediates or characters",
                                })
                            }
                        };
                        init.push(v);
                    }
                    init
                }
                Some(_) => {
                    return Err(ValidationError::OperandKindMismatch {
                        position: 2,
                        expected: "a bracketed initializer list",
                    })
                }
            };
            if size < init.len() {
                return Err(ValidationError::SpaceSizeTooSmall {
                    size,
                    elements: init.len(),
                });
            }
            Ok(Statement::Space { size, init })
        }
        ".text" => {
            expect_operands(line, 1)?;
            match &ops[0] {
                Operand::Str(s) if s.is_ascii() => Ok(Statement::Text { text: s.clone() }),
                _ => Err(ValidationError::OperandKindMismatch {
                    position: 1,
                    expected: "a quoted ASCII string",
                }),
            }
        }
        "syscall" => {
            expect_operands(line, 1)?;
            let call = match &ops[0] {
                Operand::Number(v) => Syscall::from_i32(*v)
                    .ok_or_else(|| ValidationError::UnknownSyscall(v.to_string()))?,
                Operand::Symbol(name) => Syscall::from_str(name)
                    .map_err(|_| ValidationError::UnknownSyscall(name.clone()))?,
                _ => {
                    return Err(ValidationError::OperandKindMismatch {
                        position: 1,
                        expected: "a syscall code or name",
                    })
                }
            };
            Ok(Statement::Syscall { call })
        }
        other => Err(ValidationError::UnknownMnemonic(other.to_string())),
    }
}

/// Validate every parsed line; comments and empty lines drop out here.
pub fn validate_program(lines: Vec<ParserLine>) -> Result<Vec<SourceLine>, AssembleError> {
    let mut validated = Vec::new();
    let mut diagnostics = Vec::new();

    for line in lines {
        let ProgramLine::Assembly(ref parsed) = line.data else {
            continue;
        };
        match classify(parsed) {
            Ok(stmt) => validated.push(SourceLine {
                line_no: line.line_no,
                label: parsed.label.clone(),
                stmt,
            }),
            Err(e) => diagnostics.push(Diagnostic::new(line.line_no, e)),
        }
    }

    if diagnostics.is_empty() {
        Ok(validated)
    } else {
        Err(AssembleError { diagnostics })
    }
}
