//! The Iridium ISA: a 16-bit, 8-instruction RISC machine with a 64K-word
//! memory. This crate holds the machine model shared by the assembler and
//! anything else that speaks Iridium words; it contains no assembler logic.

pub mod op;
pub mod syscall;
pub mod word;
