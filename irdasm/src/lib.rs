//! Assembler for the Iridium 16-bit, 8-instruction RISC machine.
//!
//! Six strictly sequential stages: parse, validate, expand pseudo
//! instructions, build the symbol table, resolve labels, encode. Each stage
//! finishes over the whole program before the next starts, because address
//! assignment needs the final word count and resolution needs the complete
//! table. The run either yields a complete word image or an error batch -
//! never a partial binary.

use log::debug;

pub mod diag;
pub mod expand;
pub mod parser;
pub mod pass_one;
pub mod pass_two;
pub mod validate;

pub use diag::{AsmError, AssembleError, Diagnostic};

/// Assemble Iridium source text into a word image loadable at address 0.
///
/// # Errors
///
/// Parse and validation problems are collected across the whole program and
/// returned together; duplicate or undefined labels abort on first sight.
pub fn assemble_program(source: &str) -> Result<Vec<u16>, AssembleError> {
    let parsed = parser::parse_program(source)?;
    debug!("parsed {} lines", parsed.len());

    let validated = validate::validate_program(parsed)?;
    debug!("validated {} statements", validated.len());

    let words = expand::expand(validated);
    debug!("expanded to {} words", words.len());

    let labels = pass_one::pass_one(&words)?;
    debug!("symbol table holds {} labels", labels.len());

    let image = pass_two::pass_two(&words, &labels)?;
    debug!("encoded {} words", image.len());

    Ok(image)
}
