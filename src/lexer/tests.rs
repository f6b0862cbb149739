use crate::lexer::token::{Mnemonic, RegisterInfo, Size, TokenKind};
use crate::lexer::tokenize_line;

fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize_line(input, 1).into_iter().map(|t| t.kind).collect()
}

#[test]
fn empty_line() {
    assert_eq!(kinds(""), vec![]);
}

#[test]
fn whitespace_only() {
    assert_eq!(kinds("   \t  "), vec![]);
}

#[test]
fn comment_discards_rest_of_line() {
    assert_eq!(kinds("mov ax, bx ; move it"), kinds("mov ax, bx"));
    assert_eq!(kinds("; only a comment"), vec![]);
}

#[test]
fn mnemonics() {
    assert_eq!(
        kinds("mov add sub cmp"),
        vec![
            TokenKind::Mnemonic(Mnemonic::Mov),
            TokenKind::Mnemonic(Mnemonic::Add),
            TokenKind::Mnemonic(Mnemonic::Sub),
            TokenKind::Mnemonic(Mnemonic::Cmp),
        ]
    );
}

#[test]
fn case_insensitive_mnemonics_and_registers() {
    assert_eq!(kinds("MOV AX, BX"), kinds("mov ax, bx"));
    assert_eq!(kinds("Mov Ax, Bx"), kinds("mov ax, bx"));
}

#[test]
fn all_byte_registers() {
    assert_eq!(
        kinds("al cl dl bl ah ch dh bh"),
        vec![
            TokenKind::Register(RegisterInfo { code: 0, size: Size::Byte }),
            TokenKind::Register(RegisterInfo { code: 1, size: Size::Byte }),
            TokenKind::Register(RegisterInfo { code: 2, size: Size::Byte }),
            TokenKind::Register(RegisterInfo { code: 3, size: Size::Byte }),
            TokenKind::Register(RegisterInfo { code: 4, size: Size::Byte }),
            TokenKind::Register(RegisterInfo { code: 5, size: Size::Byte }),
            TokenKind::Register(RegisterInfo { code: 6, size: Size::Byte }),
            TokenKind::Register(RegisterInfo { code: 7, size: Size::Byte }),
        ]
    );
}

#[test]
fn all_word_registers() {
    assert_eq!(
        kinds("ax cx dx bx sp bp si di"),
        vec![
            TokenKind::Register(RegisterInfo { code: 0, size: Size::Word }),
            TokenKind::Register(RegisterInfo { code: 1, size: Size::Word }),
            TokenKind::Register(RegisterInfo { code: 2, size: Size::Word }),
            TokenKind::Register(RegisterInfo { code: 3, size: Size::Word }),
            TokenKind::Register(RegisterInfo { code: 4, size: Size::Word }),
            TokenKind::Register(RegisterInfo { code: 5, size: Size::Word }),
            TokenKind::Register(RegisterInfo { code: 6, size: Size::Word }),
            TokenKind::Register(RegisterInfo { code: 7, size: Size::Word }),
        ]
    );
}

#[test]
fn size_keywords() {
    assert_eq!(kinds("byte word"), vec![TokenKind::Size(Size::Byte), TokenKind::Size(Size::Word)]);
}

#[test]
fn punctuation() {
    assert_eq!(
        kinds("+-[],"),
        vec![
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::Comma,
        ]
    );
}

#[test]
fn number_run() {
    assert_eq!(kinds("4660"), vec![TokenKind::Number(4660)]);
}

#[test]
fn sign_is_a_separate_token_from_the_number() {
    assert_eq!(kinds("-1"), vec![TokenKind::Minus, TokenKind::Number(1)]);
    assert_eq!(kinds("+1"), vec![TokenKind::Plus, TokenKind::Number(1)]);
}

#[test]
fn unknown_identifier_is_bad() {
    assert_eq!(kinds("foo"), vec![TokenKind::Bad]);
}

#[test]
fn unknown_character_is_bad() {
    assert_eq!(kinds("@"), vec![TokenKind::Bad]);
    assert_eq!(kinds("$"), vec![TokenKind::Bad]);
}

#[test]
fn memory_operand_tokens() {
    assert_eq!(
        kinds("[bx+si+4]"),
        vec![
            TokenKind::LBracket,
            TokenKind::Register(RegisterInfo { code: 3, size: Size::Word }),
            TokenKind::Plus,
            TokenKind::Register(RegisterInfo { code: 6, size: Size::Word }),
            TokenKind::Plus,
            TokenKind::Number(4),
            TokenKind::RBracket,
        ]
    );
}

#[test]
fn full_instruction_line() {
    assert_eq!(
        kinds("mov ax, [bp]"),
        vec![
            TokenKind::Mnemonic(Mnemonic::Mov),
            TokenKind::Register(RegisterInfo { code: 0, size: Size::Word }),
            TokenKind::Comma,
            TokenKind::LBracket,
            TokenKind::Register(RegisterInfo { code: 5, size: Size::Word }),
            TokenKind::RBracket,
        ]
    );
}

// *Scanner totality*: every lexeme, re-scanned alone, reproduces its own
// token kind.
#[test]
fn every_lexeme_reproduces_its_own_kind_when_rescanned_alone() {
    let tokens = tokenize_line("mov byte [bx+si-100], 42", 1);
    for tok in &tokens {
        let rescanned = tokenize_line(&tok.lexeme, 1);
        assert_eq!(rescanned.len(), 1, "lexeme {:?} did not rescan to one token", tok.lexeme);
        assert_eq!(rescanned[0].kind, tok.kind);
    }
}

// *Case insensitivity*: scanning a line and its uppercase counterpart
// produce identical kinds and lowercase lexemes.
#[test]
fn case_insensitivity_property() {
    let lower = "mov word [bx+di+8], 1000";
    let upper = lower.to_ascii_uppercase();
    let lower_tokens = tokenize_line(lower, 1);
    let upper_tokens = tokenize_line(&upper, 1);
    assert_eq!(lower_tokens.len(), upper_tokens.len());
    for (l, u) in lower_tokens.iter().zip(upper_tokens.iter()) {
        assert_eq!(l.kind, u.kind);
        assert_eq!(l.lexeme.to_ascii_lowercase(), u.lexeme);
    }
}
