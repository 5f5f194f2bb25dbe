//! Loader for `.ls8` program files:
//!
//! ```text
//! # print8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```
//!
//! Everything after `#` is a comment. Every other token is one byte written
//! as exactly eight binary digits.

use std::borrow::Cow;
use std::error;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::{fmt, str::Lines};

use color_eyre::eyre::{eyre, WrapErr};

use super::Byte;

/// Number of digits of a byte literal
const LITERAL_DIGITS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidLiteral,
    InvalidNumber { radix: u32 },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidLiteral => f.write_str("invalid literal"),
            ParseErrorKind::InvalidNumber { radix } => {
                write!(f, "failed to parse number with radix `{}`", radix)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: ParseErrorKind,
    context: Option<Cow<'static, str>>,
    line_nr: usize,
}

impl ParseError {
    fn new<C, S>(kind: ParseErrorKind, context: C, line_nr: usize) -> Self
    where
        C: Into<Option<S>>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            kind,
            context: context.into().map(|inner| inner.into()),
            line_nr,
        }
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    pub fn line_nr(&self) -> usize {
        self.line_nr
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(
                f,
                "error [ln: {}]: {} - {}",
                self.line_nr, self.kind, context
            )
        } else {
            write!(f, "error [ln: {}]: {}", self.line_nr, self.kind)
        }
    }
}

impl error::Error for ParseError {}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// A program as the byte sequence that gets loaded at address 0
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Program {
    bytes: Vec<Byte>,
}

impl Program {
    pub fn bytes(&self) -> &[Byte] {
        &self.bytes
    }

    /// Reads and parses a program file
    pub fn from_file<P: AsRef<Path>>(path: P) -> color_eyre::eyre::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read program `{}`", path.display()))?;

        Self::from_str(&data).map_err(|errors| {
            eyre!(
                "Failed to parse program `{}`: {} error(s), first: {}",
                path.display(),
                errors.len(),
                errors[0]
            )
        })
    }
}

impl FromStr for Program {
    type Err = Vec<ParseError>;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Parser::new(data).parse()
    }
}

#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Lines<'a>,
    line_nr: usize,
    bytes: Vec<Byte>,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for `data`
    pub fn new(data: &'a str) -> Self {
        Self {
            lines: data.lines(),
            line_nr: 0,
            bytes: Vec::new(),
        }
    }

    /// Consumes `self` and tries to parse all of the data.
    ///
    /// # Errors
    ///
    /// All errors which may occur are collected and returned at the end.
    pub fn parse(mut self) -> Result<Program, Vec<ParseError>> {
        let mut errors = Vec::new();

        while let Some(res) = self.parse_next_line() {
            if let Err(line_errors) = res {
                for err in line_errors {
                    log::error!("{}", err);
                    errors.push(err);
                }
            }
        }

        if errors.is_empty() {
            log::debug!("Parsed program of {} bytes", self.bytes.len());
            Ok(Program { bytes: self.bytes })
        } else {
            Err(errors)
        }
    }

    /// Tries to parse the next line. Returns `None` once all lines are
    /// consumed.
    fn parse_next_line(&mut self) -> Option<Result<(), Vec<ParseError>>> {
        let line = self.lines.next()?;
        self.line_nr += 1;

        let code = match line.find('#') {
            Some(start) => &line[..start],
            None => line,
        };

        let errors = code
            .split_whitespace()
            .filter_map(|token| self.parse_literal(token).err())
            .collect::<Vec<_>>();

        if errors.is_empty() {
            Some(Ok(()))
        } else {
            Some(Err(errors))
        }
    }

    /// Tries to parse `token` as a byte literal and appends it.
    ///
    /// # Examples
    ///
    /// - `10000010`
    /// - `00000001`
    fn parse_literal(&mut self, token: &str) -> Result<()> {
        if token.len() != LITERAL_DIGITS {
            return Err(ParseError::new(
                ParseErrorKind::InvalidLiteral,
                format!("`{}` is not {} binary digits", token, LITERAL_DIGITS),
                self.line_nr,
            ));
        }

        // only `0` and `1`, no sign
        let byte = token
            .bytes()
            .try_fold(0, |acc: Byte, digit| match digit {
                b'0' => Some(acc << 1),
                b'1' => Some(acc << 1 | 1),
                _ => None,
            })
            .ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::InvalidNumber { radix: 2 },
                    format!("`{}`", token),
                    self.line_nr,
                )
            })?;

        self.bytes.push(byte);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::processor::Instruction;

    use super::*;
    use color_eyre::Result;

    #[test]
    fn parse_print8() -> Result<()> {
        let data = r#"
            # print8.ls8
            10000010 # LDI R0,8
            00000000
            00001000
            01000111 # PRN R0
            00000000
            00000001 # HLT
        "#;

        let program = Program::from_str(data).unwrap();

        assert_eq!(
            program.bytes(),
            &[
                Byte::from(Instruction::LDI),
                0,
                8,
                Byte::from(Instruction::PRN),
                0,
                Byte::from(Instruction::HLT)
            ]
        );

        Ok(())
    }

    #[test]
    fn parse_several_literals_per_line() -> Result<()> {
        let program = Program::from_str("10100010 00000000 00000001\n00000001").unwrap();

        assert_eq!(program.bytes(), &[0b1010_0010, 0, 1, 1]);

        Ok(())
    }

    #[test]
    fn parse_empty() -> Result<()> {
        let program = Program::from_str("\n# nothing here\n   \n").unwrap();

        assert!(program.bytes().is_empty());

        Ok(())
    }

    #[test]
    fn parse_collects_all_errors() -> Result<()> {
        let data = "10000010\n1000001 # too short\n00000000\n10000012\n";

        let errors = Program::from_str(data).unwrap_err();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].kind(), ParseErrorKind::InvalidLiteral);
        assert_eq!(errors[0].line_nr(), 2);
        assert_eq!(errors[1].kind(), ParseErrorKind::InvalidNumber { radix: 2 });
        assert_eq!(errors[1].line_nr(), 4);
        assert_eq!(
            errors[1].to_string(),
            "error [ln: 4]: failed to parse number with radix `2` - `10000012`"
        );

        Ok(())
    }

    #[test]
    fn parse_rejects_signed_literal() -> Result<()> {
        let errors = Program::from_str("+1000001\n-0000001\n").unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|err| err.kind() == ParseErrorKind::InvalidNumber { radix: 2 }));

        Ok(())
    }

    #[test]
    fn parse_program_files() -> Result<()> {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/programs/mult.ls8");
        let program = Program::from_file(path)?;

        assert_eq!(
            program.bytes(),
            &[
                0b1000_0010,
                0,
                8,
                0b1000_0010,
                1,
                9,
                0b1010_0010,
                0,
                1,
                0b0100_0111,
                0,
                0b0000_0001
            ]
        );

        Ok(())
    }

    #[test]
    fn parse_missing_file() -> Result<()> {
        assert!(Program::from_file("does/not/exist.ls8").is_err());

        Ok(())
    }
}
