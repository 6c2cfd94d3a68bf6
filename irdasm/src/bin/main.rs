use anyhow::Result;
use irdasm::assemble_program;
use std::{env, fs};

fn main() -> Result<()> {
    env_logger::init();

    let input: String = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::Error::msg("Need an input filename"))?;
    let output: String = env::args()
        .nth(2)
        .ok_or_else(|| anyhow::Error::msg("Need an output filename"))?;

    let source = fs::read_to_string(&input)?;

    let image = match assemble_program(&source) {
        Ok(image) => image,
        Err(e) => {
            for diagnostic in &e.diagnostics {
                eprintln!("{}", diagnostic);
            }
            return Err(e.into());
        }
    };

    // One big-endian byte pair per word, starting at address 0.
    let mut bytes = Vec::with_capacity(image.len() * 2);
    for word in &image {
        bytes.extend_from_slice(&word.to_be_bytes());
    }
    fs::write(&output, bytes)?;

    println!("Assembled {} --> {} ({} words)", input, output, image.len());

    Ok(())
}
