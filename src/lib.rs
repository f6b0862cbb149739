//! # 8086 Assembler
//!
//! A single-pass assembler for a restricted dialect of 16-bit x86 (8086)
//! assembly (spec.md §1-2).
//!
//! ## Pipeline
//!
//! Each source line is processed independently through three stages:
//!
//! 1. **Lexer** ([`lexer::tokenize_line`]) - classifies the line into tokens.
//! 2. **Parser** ([`parser::parse_line`]) - validates the grammar and builds
//!    a typed [`parser::ast::Instruction`].
//! 3. **Encoder** ([`encoder::encode`]) - emits the instruction's raw bytes.
//!
//! The first error at any stage aborts the whole assembly; there is no
//! recovery and no multi-pass resolution, since this dialect has no labels.

pub mod encoder;
pub mod error;
pub mod lexer;
pub mod parser;

use std::io::{BufRead, Write};

use error::{AsmError, ErrorKind};

/// The mandatory first line of every source file.
const BITS_DECLARATION: &str = "bits 16";

/// Matches the original implementation's line buffer: 254 printable
/// characters plus the trailing newline.
const MAX_LINE_LEN: usize = 254;

/// Assembles a complete source file, writing machine code bytes to `output`
/// as each line is encoded. Stops at the first error on any line.
pub fn assemble<R: BufRead, W: Write>(mut input: R, output: &mut W) -> Result<(), AsmError> {
    let mut header = String::new();
    input
        .read_line(&mut header)
        .map_err(|e| AsmError::new(ErrorKind::Io, e.to_string(), 1))?;

    // `.lines()` strips the newline from a file's final, unterminated line
    // the same as from a properly terminated one, which would let a file
    // missing the trailing newline after "bits 16" slip through. Check the
    // raw bytes here, before any newline stripping happens.
    let trimmed = header.trim_end_matches(|c| c == '\r' || c == '\n');
    if !header.ends_with('\n') || trimmed != BITS_DECLARATION {
        return Err(AsmError::new(
            ErrorKind::BadHeader,
            "expected declaration 'bits 16' on line 1",
            1,
        ));
    }

    for (index, raw) in input.lines().enumerate() {
        let line_no = index + 2;
        let text = raw.map_err(|e| AsmError::new(ErrorKind::Io, e.to_string(), line_no))?;

        if text.len() > MAX_LINE_LEN {
            return Err(AsmError::new(
                ErrorKind::LineTooLong,
                format!("line {line_no} too long (max {MAX_LINE_LEN} characters)"),
                line_no,
            ));
        }

        let tokens = lexer::tokenize_line(&text, line_no);
        if tokens.is_empty() {
            continue;
        }

        let inst = parser::parse_line(&tokens, line_no)?;

        let mut buffer = [0u8; 6];
        let len = encoder::encode(&inst, &mut buffer, line_no)?;

        output
            .write_all(&buffer[..len])
            .map_err(|e| AsmError::new(ErrorKind::Io, e.to_string(), line_no))?;
    }

    Ok(())
}
