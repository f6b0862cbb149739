//! # Scanner
//!
//! Converts one line of 8086 assembly source into an ordered sequence of
//! tokens (spec.md §4.1).
//!
//! ## Classification rules
//!
//! - Whitespace is skipped.
//! - `+ - [ ] ,` each become a single punctuation token.
//! - `;` ends the line: everything from it to the end of the line is
//!   discarded as a comment and no further tokens are produced.
//! - A maximal run of decimal digits becomes a number token. The sign is
//!   never part of the digit run — a leading `+`/`-` is its own token.
//! - A maximal run of alphabetic characters is lowercased and looked up in
//!   the fixed keyword table (mnemonics, size keywords, register names);
//!   anything that doesn't match becomes a bad token.
//! - Any other single character becomes a bad token.
//!
//! The scanner never fails in this implementation: the only scanner-level
//! failure the spec describes is allocation failure, which in safe Rust
//! aborts the process rather than surfacing as a recoverable error, so
//! `tokenize_line` returns a plain `Vec<Token>` rather than a `Result`.
//! Unrecognized characters become [`TokenKind::Bad`] tokens for the parser
//! to diagnose, exactly as spec.md describes.

pub mod cursor;
pub mod token;

#[cfg(test)]
mod tests;

use cursor::Cursor;
use token::{classify_identifier, Token, TokenKind};

pub fn tokenize_line(line: &str, line_no: usize) -> Vec<Token> {
    let mut cursor = Cursor::new(line);
    let mut tokens = Vec::new();

    while !cursor.is_at_end() {
        let ch = cursor.peek().unwrap();

        match ch {
            ' ' | '\t' | '\r' => {
                cursor.advance();
            }
            ';' => break,
            '+' => tokens.push(punct(&mut cursor, TokenKind::Plus, "+", line_no)),
            '-' => tokens.push(punct(&mut cursor, TokenKind::Minus, "-", line_no)),
            '[' => tokens.push(punct(&mut cursor, TokenKind::LBracket, "[", line_no)),
            ']' => tokens.push(punct(&mut cursor, TokenKind::RBracket, "]", line_no)),
            ',' => tokens.push(punct(&mut cursor, TokenKind::Comma, ",", line_no)),
            c if c.is_ascii_digit() => tokens.push(lex_number(&mut cursor, line_no)),
            c if c.is_ascii_alphabetic() => tokens.push(lex_identifier(&mut cursor, line_no)),
            _ => tokens.push(lex_bad_char(&mut cursor, line_no)),
        }
    }

    tokens
}

fn punct(cursor: &mut Cursor, kind: TokenKind, lexeme: &str, line: usize) -> Token {
    cursor.advance();
    Token {
        kind,
        lexeme: lexeme.to_string(),
        line,
    }
}

fn lex_number(cursor: &mut Cursor, line: usize) -> Token {
    let mut digits = String::new();
    while matches!(cursor.peek(), Some(c) if c.is_ascii_digit()) {
        digits.push(cursor.advance().unwrap());
    }
    // A digit run this long can only ever be out of range; saturate rather
    // than panic so the parser's range check is the single source of truth
    // for "value exceeds valid range" diagnostics.
    let value = digits.parse::<i64>().unwrap_or(i64::MAX);
    Token {
        kind: TokenKind::Number(value),
        lexeme: digits,
        line,
    }
}

fn lex_identifier(cursor: &mut Cursor, line: usize) -> Token {
    let mut raw = String::new();
    while matches!(cursor.peek(), Some(c) if c.is_ascii_alphabetic()) {
        raw.push(cursor.advance().unwrap());
    }
    let lower = raw.to_ascii_lowercase();
    let kind = classify_identifier(&lower);
    Token {
        kind,
        lexeme: lower,
        line,
    }
}

fn lex_bad_char(cursor: &mut Cursor, line: usize) -> Token {
    let ch = cursor.advance().unwrap();
    Token {
        kind: TokenKind::Bad,
        lexeme: ch.to_string(),
        line,
    }
}
