//! Stage 1: one raw text line in, one structured line out.
//!
//! The parser only cares about line shape. Whether a mnemonic exists, whether
//! `$r9` is a real register, whether an immediate fits its field - all of
//! that is the validator's problem. Comments are kept on the parsed line and
//! dropped after validation; nothing downstream reads them.

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::{alpha1, anychar, char, digit1, hex_digit1, space0},
    combinator::{all_consuming, map, map_res, opt, recognize, rest},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use thiserror::Error;

use crate::diag::Diagnostic;
use crate::AssembleError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed line: {0}")]
    MalformedLine(String),
}

/// An operand token. Shapes only; kinds are checked in validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `$name`, register name kept raw
    Register(String),
    Number(i32),
    /// `@name`
    LabelRef(String),
    /// `'c'`
    Char(char),
    /// `"text"`
    Str(String),
    /// `[a, b, c]`
    List(Vec<Operand>),
    /// a bare identifier, e.g. a symbolic syscall name
    Symbol(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub label: Option<String>,
    pub mnemonic: String,
    pub operands: Vec<Operand>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramLine {
    Assembly(ParsedLine),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserLine {
    pub data: ProgramLine,
    pub line_no: usize,
}

/// Letters first, then letters/digits/underscores (`my_data`, `print_int`).
fn identifier(i: &str) -> IResult<&str, &str> {
    recognize(pair(
        alpha1,
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(i)
}

/// Real mnemonics are upper-case words; pseudo directives start with a dot.
fn mnemonic(i: &str) -> IResult<&str, &str> {
    recognize(pair(opt(char('.')), alpha1))(i)
}

fn register(i: &str) -> IResult<&str, Operand> {
    map(
        preceded(char('$'), take_while1(|c: char| c.is_ascii_alphanumeric())),
        |name: &str| Operand::Register(name.to_string()),
    )(i)
}

fn label_ref(i: &str) -> IResult<&str, Operand> {
    map(preceded(char('@'), identifier), |name: &str| {
        Operand::LabelRef(name.to_string())
    })(i)
}

/// Decimal, `0x` hex, or `0b` binary, optional sign, leading zeros fine.
fn number(i: &str) -> IResult<&str, Operand> {
    map_res(
        tuple((
            opt(alt((char('+'), char('-')))),
            alt((
                preceded(
                    tag_no_case("0x"),
                    map_res(hex_digit1, |d: &str| i64::from_str_radix(d, 16)),
                ),
                preceded(
                    tag_no_case("0b"),
                    map_res(take_while1(|c| c == '0' || c == '1'), |d: &str| {
                        i64::from_str_radix(d, 2)
                    }),
                ),
                map_res(digit1, |d: &str| d.parse::<i64>()),
            )),
        )),
        |(sign, magnitude)| {
            let value = if sign == Some('-') {
                -magnitude
            } else {
                magnitude
            };
            i32::try_from(value).map(Operand::Number)
        },
    )(i)
}

fn char_literal(i: &str) -> IResult<&str, Operand> {
    map(delimited(char('\''), anychar, char('\'')), Operand::Char)(i)
}

fn string_literal(i: &str) -> IResult<&str, Operand> {
    map(
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        |s: &str| Operand::Str(s.to_string()),
    )(i)
}

/// Operands are separated by commas and/or horizontal whitespace.
fn separator(i: &str) -> IResult<&str, &str> {
    take_while1(|c| c == ',' || c == ' ' || c == '\t')(i)
}

fn list(i: &str) -> IResult<&str, Operand> {
    map(
        delimited(
            pair(char('['), space0),
            separated_list0(separator, operand),
            pair(space0, char(']')),
        ),
        Operand::List,
    )(i)
}

fn symbol(i: &str) -> IResult<&str, Operand> {
    map(identifier, |name: &str| Operand::Symbol(name.to_string()))(i)
}

fn operand(i: &str) -> IResult<&str, Operand> {
    alt((
        register,
        number,
        label_ref,
        char_literal,
        string_literal,
        list,
        symbol,
    ))(i)
}

fn comment(i: &str) -> IResult<&str, &str> {
    preceded(char('#'), rest)(i)
}

pub fn asm_line(i: &str) -> IResult<&str, ParsedLine> {
    let (i, (label, _, mnemonic, operands, _, comment)) = tuple((
        opt(terminated(identifier, char(':'))),
        space0,
        mnemonic,
        many0(preceded(separator, operand)),
        space0,
        opt(comment),
    ))(i)?;

    Ok((
        i,
        ParsedLine {
            label: label.map(str::to_string),
            mnemonic: mnemonic.to_string(),
            operands,
            comment: comment.map(str::to_string),
        },
    ))
}

pub fn parse_line(i: &str) -> Result<ProgramLine, ParseError> {
    let trimmed = i.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(ProgramLine::Empty);
    }

    let (_, parsed) = all_consuming(asm_line)(trimmed)
        .map_err(|_| ParseError::MalformedLine(trimmed.to_string()))?;

    Ok(ProgramLine::Assembly(parsed))
}

/// Parse every source line, collecting all malformed lines before failing.
pub fn parse_program(program: &str) -> Result<Vec<ParserLine>, AssembleError> {
    let mut lines = Vec::new();
    let mut diagnostics = Vec::new();

    for (idx, text) in program.lines().enumerate() {
        let line_no = idx + 1;
        match parse_line(text) {
            Ok(data) => lines.push(ParserLine { data, line_no }),
            Err(e) => diagnostics.push(Diagnostic::new(line_no, e)),
        }
    }

    if diagnostics.is_empty() {
        Ok(lines)
    } else {
        Err(AssembleError { diagnostics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(i: &str) -> ParsedLine {
        match parse_line(i).unwrap() {
            ProgramLine::Assembly(line) => line,
            ProgramLine::Empty => panic!("expected an assembly line for {i:?}"),
        }
    }

    #[test]
    fn test_plain_instruction() {
        let line = parsed("ADD $r0, $r1, $r2");
        assert_eq!(line.label, None);
        assert_eq!(line.mnemonic, "ADD");
        assert_eq!(
            line.operands,
            vec![
                Operand::Register("r0".into()),
                Operand::Register("r1".into()),
                Operand::Register("r2".into()),
            ]
        );
    }

    #[test]
    fn test_space_separated_operands() {
        // The original source format uses bare spaces between operands.
        let line = parsed("ADDI $r0 $r0 5");
        assert_eq!(line.operands.len(), 3);
        assert_eq!(line.operands[2], Operand::Number(5));
    }

    #[test]
    fn test_label_and_comment() {
        let line = parsed("  loop:  BEQ $r0, $zero, @done   # spin until zero");
        assert_eq!(line.label.as_deref(), Some("loop"));
        assert_eq!(line.mnemonic, "BEQ");
        assert_eq!(line.operands[2], Operand::LabelRef("done".into()));
        assert_eq!(line.comment.as_deref(), Some(" spin until zero"));
    }

    #[test]
    fn test_empty_and_comment_only_lines() {
        assert_eq!(parse_line("").unwrap(), ProgramLine::Empty);
        assert_eq!(parse_line("   \t ").unwrap(), ProgramLine::Empty);
        assert_eq!(parse_line("# just a note").unwrap(), ProgramLine::Empty);
    }

    #[test]
    fn test_number_radixes() {
        assert_eq!(parsed(".fill 0x0ABC").operands[0], Operand::Number(0x0ABC));
        assert_eq!(parsed(".fill 0b1010").operands[0], Operand::Number(10));
        assert_eq!(parsed(".fill -64").operands[0], Operand::Number(-64));
        assert_eq!(parsed(".fill +7").operands[0], Operand::Number(7));
        assert_eq!(parsed(".fill 007").operands[0], Operand::Number(7));
    }

    #[test]
    fn test_char_string_and_list() {
        assert_eq!(parsed(".fill 'A'").operands[0], Operand::Char('A'));
        assert_eq!(
            parsed(".text \"hi there\"").operands[0],
            Operand::Str("hi there".into())
        );
        assert_eq!(
            parsed(".space 4 [1, 'a', 0x2]").operands[1],
            Operand::List(vec![
                Operand::Number(1),
                Operand::Char('a'),
                Operand::Number(2),
            ])
        );
    }

    #[test]
    fn test_symbolic_syscall_operand() {
        let line = parsed("syscall print_int");
        assert_eq!(line.mnemonic, "syscall");
        assert_eq!(line.operands[0], Operand::Symbol("print_int".into()));
    }

    #[test]
    fn test_underscored_label() {
        let line = parsed("my_data: .fill 0x0ABC");
        assert_eq!(line.label.as_deref(), Some("my_data"));
        assert_eq!(line.mnemonic, ".fill");
    }

    #[test]
    fn test_malformed_lines() {
        assert!(parse_line("1234").is_err());
        assert!(parse_line("two: labels: NOP").is_err());
        assert!(parse_line("only:").is_err());
        assert!(parse_line("ADD $r0 $r1 $r2 trailing ] junk [").is_err());
    }

    #[test]
    fn test_parse_program_numbers_lines() {
        let lines = parse_program("NOP\n\n  # comment\nNOP\n").unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1],
            ParserLine {
                data: ProgramLine::Empty,
                line_no: 2,
            }
        );
        assert_eq!(
            lines[2],
            ParserLine {
                data: ProgramLine::Empty,
                line_no: 3,
            }
        );
        assert_eq!(lines[3].line_no, 4);
    }

    #[test]
    fn test_parse_program_batches_errors() {
        let source = "NOP\n????\nNOP\n!!!!\n";
        let err = parse_program(source).unwrap_err();
        assert_eq!(err.diagnostics.len(), 2);
        assert_eq!(err.diagnostics[0].line_no, 2);
        assert_eq!(err.diagnostics[1].line_no, 4);
    }
}
