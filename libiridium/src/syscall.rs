//! The OS/interrupt contract the assembler emits calls against.
//!
//! The handler itself lives outside the assembler. Each syscall code has a
//! fixed entry at `HANDLER_BASE + code`. The caller saves `$r0..$r5` to the
//! save area first; `$r6` is the single argument/return register and is left
//! alone. The link address travels in `$r5`.

use num_derive::{FromPrimitive, ToPrimitive};
use strum_macros::{Display, EnumString};

/// Word address of the interrupt handler dispatch area.
pub const HANDLER_BASE: u16 = 0xFE00;

/// Word address of the six-word register save area. Kept below 64 so every
/// save and restore reaches it as `$zero + imm7`.
pub const SAVE_AREA: u16 = 0x0020;

/// `$r0..$r5` are saved around a syscall.
pub const SAVED_REGISTERS: u16 = 6;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum Syscall {
    PrintChar = 0,
    PrintStr = 1,
    PrintInt = 2,
    PrintHex = 3,
    InputInt = 4,
    InputChar = 5,
    Halt = 6,
    Error = 7,
}

impl Syscall {
    /// The handler entry address for this code.
    pub fn entry(self) -> u16 {
        HANDLER_BASE + self as u16
    }
}
