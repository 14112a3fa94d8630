//! Loader for LS-8 program text:
//!
//! ```text
//! # print8.ls8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```

use std::borrow::Cow;
use std::error;
use std::fs;
use std::path::Path;
use std::str::{FromStr, Lines};
use std::fmt;

use crate::error::LoadError;

use super::{Byte, MEMORY_SIZE};

macro_rules! propagate {
    ( $res:expr ) => {
        match $res {
            Ok(value) => value,
            Err(err) => return Some(Err(err)),
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The token contains something other than binary digits
    InvalidLiteral,
    /// The token is binary but does not fit into a byte
    LiteralOutOfRange,
    /// The program does not fit into memory
    ProgramTooLarge { size: usize },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidLiteral => f.write_str("not a binary literal"),
            ParseErrorKind::LiteralOutOfRange => f.write_str("literal does not fit into 8 bits"),
            ParseErrorKind::ProgramTooLarge { size } => {
                write!(f, "program exceeds memory of {} bytes", size)
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

    fn without_context(kind: ParseErrorKind, line_nr: usize) -> Self {
        Self {
            kind,
            context: None,
            line_nr,
        }
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// 1-based line of the offending token
    pub fn line_nr(&self) -> usize {
        self.line_nr
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "line {}: {} - `{}`", self.line_nr, self.kind, context)
        } else {
            write!(f, "line {}: {}", self.line_nr, self.kind)
        }
    }
}

impl error::Error for ParseError {}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// A program image, ready to be copied into memory starting at address 0
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Program {
    bytes: Vec<Byte>,
}

impl Program {
    pub fn new(bytes: Vec<Byte>) -> Self {
        Self { bytes }
    }

    /// Reads and parses the program at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or if any line is malformed; the
    /// error names the file and every offending line.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let program = data.parse::<Program>().map_err(|errors| LoadError::Parse {
            path: path.to_path_buf(),
            errors,
        })?;

        log::info!("Loaded {} bytes from {}", program.len(), path.display());

        Ok(program)
    }

    pub fn as_bytes(&self) -> &[Byte] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl FromStr for Program {
    type Err = Vec<ParseError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::new(s, MEMORY_SIZE).parse()
    }
}

#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Lines<'a>,
    line_nr: usize,
    capacity: usize,
    bytes: Vec<Byte>,
    overflowed: bool,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for `data` which will refuse programs longer than `capacity` bytes.
    pub fn new(data: &'a str, capacity: usize) -> Self {
        Self {
            lines: data.lines(),
            line_nr: 0,
            capacity,
            bytes: Vec::new(),
            overflowed: false,
        }
    }

    /// Consumes `self` and tries to parse all of the data into a program.
    ///
    /// # Errors
    ///
    /// All errors which may occur are collected and returned at the end.
    pub fn parse(mut self) -> Result<Program, Vec<ParseError>> {
        let mut errors = Vec::new();

        while let Some(res) = self.parse_next_line() {
            if let Err(err) = res {
                log::error!("{}", err);
                errors.push(err);
            }
        }

        if errors.is_empty() {
            Ok(Program::new(self.bytes))
        } else {
            Err(errors)
        }
    }

    /// Tries to parse the next line. Each byte should be located on its own
    /// line, optionally followed by a `#` comment.
    fn parse_next_line(&mut self) -> Option<Result<()>> {
        let line = self.lines.next()?;
        self.line_nr += 1;

        let token = match line.split_once('#') {
            Some((code, _comment)) => code,
            None => line,
        }
        .trim();

        if token.is_empty() {
            // Comment or empty line; skip
            return Some(Ok(()));
        }

        let byte = propagate!(self.parse_literal(token));
        Some(self.write_byte(byte))
    }

    /// Tries to parse `token` as a binary literal of 1-8 digits such as `10000010`.
    fn parse_literal(&self, token: &str) -> Result<Byte> {
        if !token.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(ParseError::new(
                ParseErrorKind::InvalidLiteral,
                token.to_owned(),
                self.line_nr,
            ));
        }

        if token.len() > 8 {
            return Err(ParseError::new(
                ParseErrorKind::LiteralOutOfRange,
                token.to_owned(),
                self.line_nr,
            ));
        }

        Byte::from_str_radix(token, 2).map_err(|_| {
            ParseError::new(ParseErrorKind::InvalidLiteral, token.to_owned(), self.line_nr)
        })
    }

    /// Appends `byte` to the program.
    ///
    /// # Errors
    ///
    /// This will return an error for the first byte that no longer fits into
    /// memory. Every byte after it is dropped without another error.
    fn write_byte(&mut self, byte: Byte) -> Result<()> {
        if self.overflowed {
            return Ok(());
        }

        if self.bytes.len() >= self.capacity {
            self.overflowed = true;
            return Err(ParseError::without_context(
                ParseErrorKind::ProgramTooLarge {
                    size: self.capacity,
                },
                self.line_nr,
            ));
        }

        log::trace!(
            "[{}] 0x{:02X} = {:08b}",
            self.line_nr,
            self.bytes.len(),
            byte
        );
        self.bytes.push(byte);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Instruction;
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
            program.as_bytes(),
            &[
                Instruction::LDI as Byte,
                0,
                8,
                Instruction::PRN as Byte,
                0,
                Instruction::HLT as Byte
            ]
        );

        Ok(())
    }

    #[test]
    fn parse_short_literals() -> Result<()> {
        let program = Program::from_str("1\n\n  101  \n#only a comment\n0").unwrap();

        assert_eq!(program.as_bytes(), &[1, 5, 0]);

        Ok(())
    }

    #[test]
    fn parse_empty() -> Result<()> {
        let program = Program::from_str("# nothing here\n\n").unwrap();

        assert!(program.is_empty());

        Ok(())
    }

    #[test]
    fn parse_collects_all_errors() -> Result<()> {
        let data = "10000010\n0000000x\n00001000\n100000000\nLDI # LDI R0";

        let errors = Program::from_str(data).unwrap_err();

        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].kind(), ParseErrorKind::InvalidLiteral);
        assert_eq!(errors[0].line_nr(), 2);
        assert_eq!(errors[0].context(), Some("0000000x"));
        assert_eq!(errors[1].kind(), ParseErrorKind::LiteralOutOfRange);
        assert_eq!(errors[1].line_nr(), 4);
        assert_eq!(errors[2].context(), Some("LDI"));
        assert_eq!(errors[2].to_string(), "line 5: not a binary literal - `LDI`");

        Ok(())
    }

    #[test]
    fn parse_rejects_signs() -> Result<()> {
        let errors = Program::from_str("+101").unwrap_err();

        assert_eq!(errors[0].kind(), ParseErrorKind::InvalidLiteral);

        Ok(())
    }

    #[test]
    fn parse_too_large() -> Result<()> {
        let errors = Parser::new("1\n1\n1", 2).parse().unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ParseErrorKind::ProgramTooLarge { size: 2 });
        assert_eq!(errors[0].line_nr(), 3);
        assert_eq!(errors[0].context(), None);
        assert_eq!(errors[0].to_string(), "line 3: program exceeds memory of 2 bytes");

        Ok(())
    }

    #[test]
    fn parse_too_large_reports_once() -> Result<()> {
        let data = "1\n".repeat(MEMORY_SIZE + 100);

        let errors = Program::from_str(&data).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].kind(),
            ParseErrorKind::ProgramTooLarge { size: MEMORY_SIZE }
        );
        assert_eq!(errors[0].line_nr(), MEMORY_SIZE + 1);

        Ok(())
    }

    #[test]
    fn parse_too_large_still_reports_bad_literals() -> Result<()> {
        let errors = Parser::new("1\n1\n1\n1\n12", 2).parse().unwrap_err();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[1].kind(), ParseErrorKind::InvalidLiteral);
        assert_eq!(errors[1].line_nr(), 5);

        Ok(())
    }

    #[test]
    fn parse_rejects_long_literals() -> Result<()> {
        let errors = Program::from_str("00000001\n000000001").unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ParseErrorKind::LiteralOutOfRange);
        assert_eq!(errors[0].line_nr(), 2);
        assert_eq!(errors[0].context(), Some("000000001"));

        Ok(())
    }

    #[test]
    fn load_missing_file() -> Result<()> {
        let err = Program::from_file("does/not/exist.ls8").unwrap_err();

        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("does/not/exist.ls8"));

        Ok(())
    }
}
