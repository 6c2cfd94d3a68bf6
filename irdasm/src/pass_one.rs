//! Stage 4: assign addresses and build the symbol table. After expansion
//! every line is one word, so the address of word *i* is just *i*; the image
//! loads at 0. Duplicate labels abort the run - later lines can't be
//! resolved sensibly once a name is ambiguous.

use std::collections::HashMap;

use libiridium::word::MEM_WORDS;

use crate::diag::Diagnostic;
use crate::expand::ProgramWord;
use crate::pass_two::ResolutionError;
use crate::validate::ValidationError;

#[derive(Debug, Clone, Default)]
pub struct Labels {
    labels: HashMap<String, u16>,
}

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, address: u16) -> Result<(), ValidationError> {
        if self.labels.contains_key(name) {
            return Err(ValidationError::DuplicateLabel(name.to_string()));
        }
        self.labels.insert(name.to_string(), address);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<u16, ResolutionError> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| ResolutionError::UndefinedLabel(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

pub fn pass_one(words: &[ProgramWord]) -> Result<Labels, Diagnostic> {
    if words.len() > MEM_WORDS {
        let first_overflow = &words[MEM_WORDS];
        return Err(Diagnostic::new(
            first_overflow.line_no,
            ValidationError::ProgramTooLarge { words: words.len() },
        ));
    }

    let mut labels = Labels::new();

    for (address, word) in words.iter().enumerate() {
        if let Some(ref label) = word.label {
            labels
                .add(label, address as u16)
                .map_err(|e| Diagnostic::new(word.line_no, e))?;
        }
    }

    Ok(labels)
}
