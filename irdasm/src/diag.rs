use thiserror::Error;

use crate::parser::ParseError;
use crate::pass_two::ResolutionError;
use crate::validate::ValidationError;

/// Any error the pipeline can attribute to a source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// One structured error, pinned to its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_no}: {error}")]
pub struct Diagnostic {
    pub line_no: usize,
    pub error: AsmError,
}

impl Diagnostic {
    pub fn new(line_no: usize, error: impl Into<AsmError>) -> Self {
        Diagnostic {
            line_no,
            error: error.into(),
        }
    }
}

/// The pipeline either produces a complete image or this. The parser and
/// validator batch every line's errors; later stages abort on the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("assembly failed with {} error(s)", .diagnostics.len())]
pub struct AssembleError {
    pub diagnostics: Vec<Diagnostic>,
}

impl From<Diagnostic> for AssembleError {
    fn from(diagnostic: Diagnostic) -> Self {
        AssembleError {
            diagnostics: vec![diagnostic],
        }
    }
}
