//! # Parser / Validator
//!
//! Consumes a token sequence for one line and produces a typed
//! [`ast::Instruction`] or a diagnostic (spec.md §4.2).
//!
//! Parsing happens in three passes: structural validation (a single
//! left-to-right scan that rejects grammatically malformed lines), per-operand
//! semantic parsing (interpreting each operand span as a register, immediate,
//! or memory expression), and size reconciliation (resolving any operand
//! whose size is still unknown, and rejecting the line if it can't be).

pub mod ast;


use crate::error::{AsmError, ErrorKind};
use crate::lexer::token::{Mnemonic as TokMnemonic, Size, Token, TokenKind};
use ast::{
    BaseRegister, DisplacementWidth, IndexRegister, Instruction, MemoryOperand, Mnemonic, Operand,
    OperandValue,
};

pub fn parse_line(tokens: &[Token], line: usize) -> Result<Instruction, AsmError> {
    let (operand_count, comma_index) = validate_syntax(tokens, line)?;

    let mnemonic = match tokens[0].kind {
        TokenKind::Mnemonic(TokMnemonic::Mov) => Mnemonic::Mov,
        TokenKind::Mnemonic(TokMnemonic::Add) => Mnemonic::Add,
        TokenKind::Mnemonic(TokMnemonic::Sub) => Mnemonic::Sub,
        TokenKind::Mnemonic(TokMnemonic::Cmp) => Mnemonic::Cmp,
        _ => unreachable!("validate_syntax guarantees the first token is a mnemonic"),
    };

    if operand_count != 2 {
        return Err(AsmError::new(
            ErrorKind::WrongOperandCount,
            format!(
                "'{}' instruction requires exactly two operands",
                mnemonic_name(mnemonic)
            ),
            line,
        ));
    }

    let comma_index = comma_index.expect("exactly two operands implies exactly one comma");
    let op1_tokens = &tokens[1..comma_index];
    let op2_tokens = &tokens[comma_index + 1..];

    let mut op1 = parse_operand(op1_tokens, line)?;
    let mut op2 = parse_operand(op2_tokens, line)?;

    reconcile_sizes(&mut op1, &mut op2, line)?;

    Ok(Instruction { mnemonic, op1, op2 })
}

fn mnemonic_name(m: Mnemonic) -> &'static str {
    match m {
        Mnemonic::Mov => "mov",
        Mnemonic::Add => "add",
        Mnemonic::Sub => "sub",
        Mnemonic::Cmp => "cmp",
    }
}

fn size_word(size: Size) -> &'static str {
    match size {
        Size::Byte => "byte",
        Size::Word => "word",
        Size::Unspecified => "unspecified",
    }
}

/// A single left-to-right pass enforcing the grammar rules of spec.md §4.2.
/// Returns the total operand count and the index of the sole comma, when a
/// two-operand line was supplied.
fn validate_syntax(tokens: &[Token], line: usize) -> Result<(u8, Option<usize>), AsmError> {
    for t in tokens {
        if t.kind == TokenKind::Bad {
            return Err(AsmError::new(
                ErrorKind::BadToken,
                format!("invalid token '{}'", t.lexeme),
                line,
            ));
        }
    }

    if !matches!(tokens.first().map(|t| &t.kind), Some(TokenKind::Mnemonic(_))) {
        return Err(AsmError::new(
            ErrorKind::MissingMnemonic,
            "first token should be a valid mnemonic",
            line,
        ));
    }

    let mut bracket_depth: i32 = 0;
    let mut mem_op_start = 0usize;
    let mut mnems = 0u32;
    let mut commas = 0u32;
    let mut comma_index = None;
    let mut mem_ops = 0u32;
    let mut imm_ops = 0u32;
    let mut reg_ops = 0u32;
    let mut regs_in = 0u32;

    for i in 0..tokens.len() {
        let prev = if i > 0 { Some(&tokens[i - 1].kind) } else { None };
        let next = tokens.get(i + 1).map(|t| &t.kind);

        match &tokens[i].kind {
            TokenKind::Mnemonic(_) => mnems += 1,
            TokenKind::Comma => {
                if next.is_none() {
                    return Err(AsmError::new(
                        ErrorKind::DanglingComma,
                        "unexpected end of input after ','",
                        line,
                    ));
                }
                if bracket_depth > 0 {
                    return Err(AsmError::new(
                        ErrorKind::CommaInsideBrackets,
                        "',' not allowed inside the memory operand",
                        line,
                    ));
                }
                if commas == 1 {
                    return Err(AsmError::new(
                        ErrorKind::MultipleCommas,
                        "expected exactly one ','",
                        line,
                    ));
                }
                if !prev.map(|p| p.is_operand_final()).unwrap_or(false) {
                    return Err(AsmError::new(
                        ErrorKind::MisplacedComma,
                        "',' must be between two operands",
                        line,
                    ));
                }
                comma_index = Some(i);
                commas += 1;
            }
            TokenKind::LBracket => {
                if bracket_depth == 1 {
                    return Err(AsmError::new(
                        ErrorKind::NestedBracket,
                        "nested '[' is not allowed",
                        line,
                    ));
                }
                mem_op_start = i;
                bracket_depth += 1;
            }
            TokenKind::RBracket => {
                if bracket_depth == 0 {
                    return Err(AsmError::new(
                        ErrorKind::UnmatchedCloseBracket,
                        "closing ']' without an opening '['",
                        line,
                    ));
                }
                bracket_depth -= 1;
                mem_ops += 1;
            }
            TokenKind::Size(_) => {
                if next.is_none() {
                    return Err(AsmError::new(
                        ErrorKind::SizeKeywordMisplaced,
                        format!("unexpected end of input after '{}'", tokens[i].lexeme),
                        line,
                    ));
                }
                if bracket_depth > 0 {
                    return Err(AsmError::new(
                        ErrorKind::SizeKeywordMisplaced,
                        "size specifier not allowed inside the memory operand",
                        line,
                    ));
                }
                let ok = matches!(
                    next,
                    Some(TokenKind::Number(_))
                        | Some(TokenKind::Register(_))
                        | Some(TokenKind::Plus)
                        | Some(TokenKind::Minus)
                );
                if !ok {
                    return Err(AsmError::new(
                        ErrorKind::SizeKeywordMisplaced,
                        "size specifier must be followed by an immediate or a register",
                        line,
                    ));
                }
            }
            TokenKind::Number(_) => {
                if bracket_depth > 0 {
                    let ok = matches!(
                        next,
                        Some(TokenKind::RBracket) | Some(TokenKind::Plus) | Some(TokenKind::Minus)
                    );
                    if !ok {
                        return Err(AsmError::new(
                            ErrorKind::NumberInBracketMisplaced,
                            "number inside memory operand must be followed by '+' or '-' or closing ']'",
                            line,
                        ));
                    }
                } else {
                    imm_ops += 1;
                }
            }
            TokenKind::Plus | TokenKind::Minus => {
                let is_minus = matches!(tokens[i].kind, TokenKind::Minus);
                if bracket_depth > 0 {
                    if is_minus {
                        if !matches!(next, Some(TokenKind::Number(_))) {
                            return Err(AsmError::new(
                                ErrorKind::SignMisplaced,
                                "'-' symbol inside the memory operand must be followed by a number",
                                line,
                            ));
                        }
                    } else if !matches!(next, Some(TokenKind::Number(_)) | Some(TokenKind::Register(_)))
                    {
                        return Err(AsmError::new(
                            ErrorKind::SignMisplaced,
                            "'+' symbol inside the memory operand must be followed by a number or a register",
                            line,
                        ));
                    }
                } else if !matches!(next, Some(TokenKind::Number(_))) {
                    return Err(AsmError::new(
                        ErrorKind::SignMisplaced,
                        "sign symbols outside the memory operand must be followed by a number",
                        line,
                    ));
                }
            }
            TokenKind::Register(_) => {
                if bracket_depth > 0 {
                    regs_in += 1;
                } else {
                    reg_ops += 1;
                }
            }
            TokenKind::Eof | TokenKind::Bad | TokenKind::Comment => {}
        }
    }

    if mnems > 1 {
        return Err(AsmError::new(
            ErrorKind::MultipleMnemonics,
            "expected exactly one mnemonic",
            line,
        ));
    }
    if bracket_depth == 1 {
        return Err(AsmError::new(
            ErrorKind::UnmatchedOpenBracket,
            "opening '[' without a matching ']'",
            line,
        ));
    }

    let operand_count = mem_ops + reg_ops + imm_ops;
    if operand_count > 2 {
        return Err(AsmError::new(
            ErrorKind::TooManyOperands,
            "too many operands (maximum 2 allowed)",
            line,
        ));
    }
    if operand_count == 2 && commas != 1 {
        return Err(AsmError::new(
            ErrorKind::MissingCommaBetweenOperands,
            "operands must be separated by a ','",
            line,
        ));
    }
    if mem_ops > 1 {
        return Err(AsmError::new(
            ErrorKind::TooManyMemoryOperands,
            "expected exactly one memory operand",
            line,
        ));
    }
    if mem_ops == 1
        && matches!(
            tokens.get(mem_op_start + 1).map(|t| &t.kind),
            Some(TokenKind::RBracket)
        )
    {
        return Err(AsmError::new(
            ErrorKind::EmptyMemoryOperand,
            "empty memory operand",
            line,
        ));
    }
    if imm_ops > 1 {
        return Err(AsmError::new(
            ErrorKind::TooManyImmediates,
            "expected exactly one immediate operand",
            line,
        ));
    }
    if imm_ops == 1 && !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Number(_))) {
        return Err(AsmError::new(
            ErrorKind::ImmediateNotLast,
            "immediate must be the second operand",
            line,
        ));
    }
    if regs_in > 2 {
        return Err(AsmError::new(
            ErrorKind::TooManyRegistersInMemory,
            "too many registers in the memory operand",
            line,
        ));
    }
    if regs_in == 2 {
        let shape_ok = matches!(
            tokens.get(mem_op_start + 1).map(|t| &t.kind),
            Some(TokenKind::Register(_))
        ) && matches!(
            tokens.get(mem_op_start + 2).map(|t| &t.kind),
            Some(TokenKind::Plus)
        ) && matches!(
            tokens.get(mem_op_start + 3).map(|t| &t.kind),
            Some(TokenKind::Register(_))
        );
        if !shape_ok {
            return Err(AsmError::new(
                ErrorKind::MalformedMemoryShape,
                "expected '[reg+reg...]' pattern in memory operand",
                line,
            ));
        }
        let after = tokens.get(mem_op_start + 4).map(|t| &t.kind);
        if !matches!(
            after,
            Some(TokenKind::Plus) | Some(TokenKind::Minus) | Some(TokenKind::RBracket)
        ) {
            return Err(AsmError::new(
                ErrorKind::MalformedMemoryShape,
                "invalid token after '[reg+reg' in memory operand",
                line,
            ));
        }
    } else if regs_in == 1 {
        let shape_ok = matches!(
            tokens.get(mem_op_start + 1).map(|t| &t.kind),
            Some(TokenKind::Register(_))
        );
        if !shape_ok {
            return Err(AsmError::new(
                ErrorKind::MalformedMemoryShape,
                "expected register immediately after '[' in memory operand",
                line,
            ));
        }
        let after = tokens.get(mem_op_start + 2).map(|t| &t.kind);
        if !matches!(
            after,
            Some(TokenKind::Plus) | Some(TokenKind::Minus) | Some(TokenKind::RBracket)
        ) {
            return Err(AsmError::new(
                ErrorKind::MalformedMemoryShape,
                "invalid token after '[reg' in memory operand",
                line,
            ));
        }
    }

    Ok((operand_count as u8, comma_index))
}

fn parse_operand(tokens: &[Token], line: usize) -> Result<Operand, AsmError> {
    let mut has_explicit_size = false;
    let mut explicit_size = Size::Unspecified;
    let mut idx = 0;

    if tokens.len() > 1 {
        if let TokenKind::Size(sz) = tokens[0].kind {
            has_explicit_size = true;
            explicit_size = sz;
            idx = 1;
        }
    }

    let rest = &tokens[idx..];
    let tok0 = rest.first().map(|t| &t.kind);
    let tok1_num = rest.get(1).and_then(|t| match t.kind {
        TokenKind::Number(n) => Some(n),
        _ => None,
    });

    let (value, resolved_size) = match tok0 {
        Some(TokenKind::Number(n)) => parse_immediate(*n, 1, has_explicit_size, explicit_size, line)?,
        Some(TokenKind::Plus) if tok1_num.is_some() => {
            parse_immediate(tok1_num.unwrap(), 1, has_explicit_size, explicit_size, line)?
        }
        Some(TokenKind::Minus) if tok1_num.is_some() => {
            parse_immediate(tok1_num.unwrap(), -1, has_explicit_size, explicit_size, line)?
        }
        Some(TokenKind::Register(info)) => (OperandValue::Register { code: info.code }, info.size),
        Some(TokenKind::LBracket) => parse_memory(rest, has_explicit_size, explicit_size, line)?,
        _ => unreachable!("structural validation guarantees a valid operand shape"),
    };

    Ok(Operand {
        value,
        size: resolved_size,
        has_explicit_size,
        explicit_size,
    })
}

fn parse_immediate(
    raw: i64,
    sign: i64,
    has_explicit_size: bool,
    explicit_size: Size,
    line: usize,
) -> Result<(OperandValue, Size), AsmError> {
    let val = raw.saturating_mul(sign);
    if !(-65536..=65535).contains(&val) {
        return Err(AsmError::new(
            ErrorKind::ValueOutOfRange,
            "immediate value exceeds valid range (-65536 to 65535)",
            line,
        ));
    }
    if has_explicit_size && explicit_size == Size::Byte && !(-256..=255).contains(&val) {
        return Err(AsmError::new(
            ErrorKind::ValueOutOfRange,
            "immediate value does not fit in a byte (-256 to 255)",
            line,
        ));
    }
    let size = if has_explicit_size {
        explicit_size
    } else {
        Size::Unspecified
    };
    Ok((OperandValue::Immediate { value: val as u16 }, size))
}

fn parse_memory(
    tokens: &[Token],
    has_explicit_size: bool,
    explicit_size: Size,
    line: usize,
) -> Result<(OperandValue, Size), AsmError> {
    let inner = &tokens[1..tokens.len() - 1];

    let mut base: Option<BaseRegister> = None;
    let mut index: Option<IndexRegister> = None;
    let mut sign: i64 = 1;
    let mut disp_total: i64 = 0;

    for tok in inner {
        match &tok.kind {
            TokenKind::Register(info) => {
                if base.is_none() {
                    base = Some(base_register(info.code, info.size).ok_or_else(|| {
                        AsmError::new(
                            ErrorKind::InvalidBaseRegister,
                            format!("invalid base register '{}' in the memory operand", tok.lexeme),
                            line,
                        )
                    })?);
                } else if index.is_none() {
                    let b = base.unwrap();
                    if !matches!(b, BaseRegister::Bx | BaseRegister::Bp) {
                        return Err(AsmError::new(
                            ErrorKind::IndexRequiresBxOrBp,
                            format!(
                                "base register '{}' cannot be combined with an index register",
                                base_name(b)
                            ),
                            line,
                        ));
                    }
                    index = Some(index_register(info.code, info.size).ok_or_else(|| {
                        AsmError::new(
                            ErrorKind::InvalidIndexRegister,
                            format!("invalid index register '{}' in the memory operand", tok.lexeme),
                            line,
                        )
                    })?);
                }
            }
            TokenKind::Plus => sign = 1,
            TokenKind::Minus => sign = -1,
            TokenKind::Number(n) => {
                let n = *n;
                if base.is_none() {
                    if !(-65536..=65535).contains(&n) {
                        return Err(AsmError::new(
                            ErrorKind::ValueOutOfRange,
                            "number inside the memory operand exceeds valid range (-65536 to 65535)",
                            line,
                        ));
                    }
                    disp_total += sign * n;
                    if !(-65536..=65535).contains(&disp_total) {
                        return Err(AsmError::new(
                            ErrorKind::ValueOutOfRange,
                            "numbers inside the memory operand exceed valid range (-65536 to 65535)",
                            line,
                        ));
                    }
                } else {
                    if !(-32768..=32767).contains(&n) {
                        return Err(AsmError::new(
                            ErrorKind::ValueOutOfRange,
                            "number inside the memory operand exceeds valid range (-32768 to 32767)",
                            line,
                        ));
                    }
                    disp_total += sign * n;
                    if !(-32768..=32767).contains(&disp_total) {
                        return Err(AsmError::new(
                            ErrorKind::ValueOutOfRange,
                            "numbers inside the memory operand exceed valid range (-32768 to 32767)",
                            line,
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    let (rm_code, disp_width) = match base {
        None => (0x06, DisplacementWidth::Word),
        Some(b) => {
            let rm = effective_address_code(b, index);
            // [bp] with a zero displacement can't use MOD=00 — that slot is
            // reserved for direct addressing — so it's forced to MOD=01.
            let width = if disp_total == 0 && !matches!(b, BaseRegister::Bp) {
                DisplacementWidth::None
            } else if (-128..=127).contains(&disp_total) {
                DisplacementWidth::Byte
            } else {
                DisplacementWidth::Word
            };
            (rm, width)
        }
    };

    let memory = MemoryOperand {
        base,
        index,
        displacement: disp_total as i32,
        rm_code,
        disp_width,
    };

    let size = if has_explicit_size {
        explicit_size
    } else {
        Size::Unspecified
    };
    Ok((OperandValue::Memory(memory), size))
}

fn base_register(code: u8, size: Size) -> Option<BaseRegister> {
    if size != Size::Word {
        return None;
    }
    match code {
        3 => Some(BaseRegister::Bx),
        5 => Some(BaseRegister::Bp),
        6 => Some(BaseRegister::Si),
        7 => Some(BaseRegister::Di),
        _ => None,
    }
}

fn index_register(code: u8, size: Size) -> Option<IndexRegister> {
    if size != Size::Word {
        return None;
    }
    match code {
        6 => Some(IndexRegister::Si),
        7 => Some(IndexRegister::Di),
        _ => None,
    }
}

fn base_name(b: BaseRegister) -> &'static str {
    match b {
        BaseRegister::Bx => "bx",
        BaseRegister::Bp => "bp",
        BaseRegister::Si => "si",
        BaseRegister::Di => "di",
    }
}

fn effective_address_code(base: BaseRegister, index: Option<IndexRegister>) -> u8 {
    match (base, index) {
        (BaseRegister::Bx, Some(IndexRegister::Si)) => 0x00,
        (BaseRegister::Bx, Some(IndexRegister::Di)) => 0x01,
        (BaseRegister::Bp, Some(IndexRegister::Si)) => 0x02,
        (BaseRegister::Bp, Some(IndexRegister::Di)) => 0x03,
        (BaseRegister::Si, None) => 0x04,
        (BaseRegister::Di, None) => 0x05,
        (BaseRegister::Bp, None) => 0x06,
        (BaseRegister::Bx, None) => 0x07,
        _ => unreachable!("an index register always implies a bx/bp base"),
    }
}

/// Resolves any operand whose size is still unknown after individual
/// parsing, then rejects the line if a size remains unknown or the two
/// operands disagree (spec.md §4.2, "size reconciliation").
fn reconcile_sizes(op1: &mut Operand, op2: &mut Operand, line: usize) -> Result<(), AsmError> {
    if op1.size == Size::Unspecified && op2.size != Size::Unspecified {
        op1.size = op2.size;
    } else if op2.size == Size::Unspecified && op1.size != Size::Unspecified {
        op2.size = op1.size;
    }

    if op1.size == Size::Unspecified && op2.size == Size::Unspecified {
        return Err(AsmError::new(
            ErrorKind::SizeNotSpecified,
            "operation size not specified",
            line,
        ));
    }

    if op1.size != op2.size {
        return Err(AsmError::new(
            ErrorKind::SizeMismatch,
            "operand sizes do not match",
            line,
        ));
    }

    for op in [op1, op2] {
        if op.has_explicit_size && op.size != op.explicit_size {
            return Err(AsmError::new(
                ErrorKind::ExplicitSizeMismatch,
                format!(
                    "operand size ({}) does not match specified size ({})",
                    size_word(op.size),
                    size_word(op.explicit_size)
                ),
                line,
            ));
        }
    }

    Ok(())
}
