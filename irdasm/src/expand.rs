//! Stage 3: rewrite pseudo-instructions so every surviving line is exactly
//! one memory word. Word count is final after this stage, which is what lets
//! pass one assign addresses in a single walk.
//!
//! Label references can't be resolved yet, so each one is tagged with the
//! slice of the address its field will consume: the full address, the low 6
//! bits (the LLI half of MOVI), or the high 10 bits (the LUI half).

use libiridium::op::{Register, RiOp, RriOp, RrrOp};
use libiridium::syscall::{Syscall, SAVE_AREA};
use libiridium::word::{high10, low6};

use crate::validate::{ImmValue, SourceLine, Statement};

/// Every syscall expands to this many words: six saves, a two-word MOVI of
/// the handler entry, the JAL, six restores.
pub const SYSCALL_WORDS: usize = 15;

/// Saved (and restored) around a syscall, in this order. `$r6` carries the
/// argument/return value and is left alone.
const SAVED: [Register; 6] = [
    Register::R0,
    Register::R1,
    Register::R2,
    Register::R3,
    Register::R4,
    Register::R5,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slice {
    Full,
    Low6,
    High10,
}

/// An instruction field value: a number, or a label still to be looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    Value(i32),
    Label { name: String, slice: Slice },
}

impl FieldRef {
    fn from_imm(imm: ImmValue, slice: Slice) -> FieldRef {
        match imm {
            ImmValue::Number(v) => FieldRef::Value(v),
            ImmValue::Label(name) => FieldRef::Label { name, slice },
        }
    }
}

/// One memory word, possibly still carrying unresolved label fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordData {
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
        imm: FieldRef,
    },
    Ri {
        op: RiOp,
        ra: Register,
        imm: FieldRef,
    },
    /// A raw data word (`.fill` and everything that lowers to it).
    Fill(FieldRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramWord {
    pub line_no: usize,
    pub label: Option<String>,
    pub data: WordData,
}

fn movi_words(ra: Register, imm: ImmValue) -> Vec<WordData> {
    let (high, low) = match imm {
        ImmValue::Number(v) => {
            let bits = v as i16 as u16;
            (
                FieldRef::Value(high10(bits) as i32),
                FieldRef::Value(low6(bits) as i32),
            )
        }
        ImmValue::Label(name) => (
            FieldRef::Label {
                name: name.clone(),
                slice: Slice::High10,
            },
            FieldRef::Label {
                name,
                slice: Slice::Low6,
            },
        ),
    };

    vec![
        WordData::Ri {
            op: RiOp::Lui,
            ra,
            imm: high,
        },
        // The low 6 bits are zero after LUI, so the add ORs them in.
        WordData::Rri {
            op: RriOp::Addi,
            ra,
            rb: ra,
            imm: low,
        },
    ]
}

fn syscall_words(call: Syscall) -> Vec<WordData> {
    let mut words = Vec::with_capacity(SYSCALL_WORDS);

    for (n, reg) in SAVED.iter().enumerate() {
        words.push(WordData::Rri {
            op: RriOp::Sw,
            ra: *reg,
            rb: Register::Zero,
            imm: FieldRef::Value((SAVE_AREA + n as u16) as i32),
        });
    }

    // $r5 is already saved, so it can hold the handler entry address and
    // then the link. The handler returns through $r5.
    let entry = call.entry();
    words.push(WordData::Ri {
        op: RiOp::Lui,
        ra: Register::R5,
        imm: FieldRef::Value(high10(entry) as i32),
    });
    words.push(WordData::Rri {
        op: RriOp::Addi,
        ra: Register::R5,
        rb: Register::R5,
        imm: FieldRef::Value(low6(entry) as i32),
    });
    words.push(WordData::Rri {
        op: RriOp::Jal,
        ra: Register::R5,
        rb: Register::R5,
        imm: FieldRef::Value(0),
    });

    for (n, reg) in SAVED.iter().enumerate() {
        words.push(WordData::Rri {
            op: RriOp::Lw,
            ra: *reg,
            rb: Register::Zero,
            imm: FieldRef::Value((SAVE_AREA + n as u16) as i32),
        });
    }

    words
}

fn expand_statement(stmt: Statement) -> Vec<WordData> {
    match stmt {
        Statement::Rrr { op, ra, rb, rc } => vec![WordData::Rrr { op, ra, rb, rc }],
        Statement::Rri { op, ra, rb, imm } => vec![WordData::Rri {
            op,
            ra,
            rb,
            imm: FieldRef::from_imm(imm, Slice::Full),
        }],
        Statement::Ri { op, ra, imm } => vec![WordData::Ri {
            op,
            ra,
            imm: FieldRef::from_imm(imm, Slice::Full),
        }],
        Statement::Nop => vec![WordData::Rrr {
            op: RrrOp::Add,
            ra: Register::Zero,
            rb: Register::Zero,
            rc: Register::Zero,
        }],
        Statement::Lli { ra, imm } => vec![WordData::Rri {
            op: RriOp::Addi,
            ra,
            rb: ra,
            imm: FieldRef::Value(imm as i32),
        }],
        Statement::Movi { ra, imm } => movi_words(ra, imm),
        Statement::Fill { value } => vec![WordData::Fill(FieldRef::from_imm(value, Slice::Full))],
        Statement::Space { size, init } => (0..size)
            .map(|i| WordData::Fill(FieldRef::Value(init.get(i).copied().unwrap_or(0))))
            .collect(),
        Statement::Text { text } => text
            .bytes()
            .map(|b| WordData::Fill(FieldRef::Value(b as i32)))
            .chain([WordData::Fill(FieldRef::Value(0))])
            .collect(),
        Statement::Syscall { call } => syscall_words(call),
    }
}

/// Expand every statement. Infallible: all range and shape errors were
/// caught in validation. A line's label lands on its first emitted word.
pub fn expand(lines: Vec<SourceLine>) -> Vec<ProgramWord> {
    let mut words = Vec::new();

    for line in lines {
        let mut label = line.label;
        for data in expand_statement(line.stmt) {
            words.push(ProgramWord {
                line_no: line.line_no,
                label: label.take(),
                data,
            });
        }
    }

    words
}
