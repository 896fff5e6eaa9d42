// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use crate::assembly::{Instruction, Keyword, OperandType};
use crate::diagnostic::{Diagnosis, Expected};
use crate::reporter::Report;
use crate::source::Span;
use crate::token::{Token, TokenAnnotation, TokenType};

// ============================================================================
// Line output
// ============================================================================

/// The outcome of dispatching one finished line: the tokens to append
/// to the current segment's stream, plus any reports raised.  A fatal
/// report halts the parse.
#[derive(Default)]
pub(crate) struct LineOutput {
    pub tokens: Vec<Token>,
    pub reports: Vec<Report>,
    pub fatal: Option<Report>,
}

/// Dispatch a finished line on the type of its first token.
pub(crate) fn parse_line(pending: Vec<Token>) -> LineOutput {
    let mut output = LineOutput::default();
    let Some(head) = pending.first() else {
        return output;
    };
    match head.kind {
        TokenType::Mnemonic => match resolve_mnemonic(&pending) {
            Ok(tokens) => output.tokens = tokens,
            Err(report) => output.reports.push(report),
        },
        TokenType::Instruction => {
            let TokenAnnotation::Instruction(instruction) = head.annotation else {
                output.fatal = Some(Report::fatal(
                    head.span,
                    Diagnosis::UnexpectedTokenBeganLine { given: head.kind },
                ));
                return output;
            };
            match bind_operands(instruction, &pending) {
                Ok(tokens) => output.tokens = tokens,
                Err(report) => output.reports.push(report),
            }
        }
        TokenType::Keyword => parse_keyword_line(&pending, &mut output),
        TokenType::DataType => match parse_data_line(&pending) {
            Ok(tokens) => output.tokens = tokens,
            Err(report) => output.reports.push(report),
        },
        _ => {
            // The transition table cannot legally accumulate a line
            // headed by anything else.
            output.fatal = Some(Report::fatal(
                head.span,
                Diagnosis::UnexpectedTokenBeganLine { given: head.kind },
            ));
        }
    }
    output
}

// ============================================================================
// Mnemonic resolution
// ============================================================================

/// Select a concrete instruction for a mnemonic line by trying each
/// overload in turn; the first that binds the whole tail wins.  The
/// overload list is ordered so that the narrowest opcode is chosen.
fn resolve_mnemonic(pending: &[Token]) -> Result<Vec<Token>, Report> {
    let head = &pending[0];
    let TokenAnnotation::Mnemonic(mnemonic) = head.annotation else {
        return Err(Report::fatal(
            head.span,
            Diagnosis::UnexpectedTokenBeganLine { given: head.kind },
        ));
    };
    for overload in mnemonic.overloads() {
        if let Ok(tokens) = bind_operands(overload.instruction, pending) {
            return Ok(tokens);
        }
    }
    let span = Span::join(pending[0].span, pending[pending.len() - 1].span);
    Err(Report::error(span, Diagnosis::InvalidMnemonicOperands { mnemonic }))
}

/// Bind the tail of a line against an instruction's operand shape.  On
/// success the output is a fresh instruction token followed by the
/// bound operands in order.
fn bind_operands(instruction: Instruction, pending: &[Token]) -> Result<Vec<Token>, Report> {
    let head = &pending[0];
    let operands = &pending[1..];
    let shapes = instruction.operands();
    //
    let mut out = Vec::with_capacity(pending.len());
    let mut insn_token = Token::new(TokenType::Instruction, head.span);
    insn_token.annotation = TokenAnnotation::Instruction(instruction);
    out.push(insn_token);
    //
    let mut index = 0;
    for shape in shapes {
        if shape.variadic {
            // Repeat the shape until the line is exhausted.
            while index < operands.len() {
                for &operand_type in shape.types {
                    let token = take_operand(operand_type, operands, &mut index, head)?;
                    out.push(bind_operand(operand_type, token)?);
                }
            }
        } else {
            for &operand_type in shape.types {
                let token = take_operand(operand_type, operands, &mut index, head)?;
                out.push(bind_operand(operand_type, token)?);
            }
        }
    }
    // Anything left over means too many operands were supplied.
    if index < operands.len() {
        let span = Span::join(operands[index].span, operands[operands.len() - 1].span);
        return Err(Report::error(
            span,
            Diagnosis::UnexpectedOperand {
                encountered: Some(operands[index].kind),
                num_expected: shapes.len(),
                num_given: operands.len(),
            },
        ));
    }
    Ok(out)
}

fn take_operand<'a>(
    operand_type: OperandType,
    operands: &'a [Token],
    index: &mut usize,
    head: &Token,
) -> Result<&'a Token, Report> {
    let Some(token) = operands.get(*index) else {
        let span = match (operands.first(), operands.last()) {
            (Some(first), Some(last)) => Span::join(first.span, last.span),
            _ => head.span,
        };
        return Err(Report::error(span, Diagnosis::MissingOperand { operand: operand_type }));
    };
    *index += 1;
    Ok(token)
}

fn bind_operand(operand_type: OperandType, token: &Token) -> Result<Token, Report> {
    let mut token = token.clone();
    // An identifier bound against a branch offset is a label
    // reference.
    if token.kind == TokenType::Identifier && operand_type == OperandType::REL32 {
        token.kind = TokenType::LabelRef;
    }
    match check_operand_type(operand_type, &token) {
        Ok(()) => Ok(token),
        Err(diagnosis) => Err(Report::error(token.span, diagnosis)),
    }
}

/// Check one token against one operand expectation.  A value that
/// fits a narrow immediate also fits every wider one, so only the
/// integer width can reject a numeric token.
pub(crate) fn check_operand_type(
    operand_type: OperandType,
    token: &Token,
) -> Result<(), Diagnosis> {
    match operand_type {
        OperandType::IMM8 | OperandType::IMM16 | OperandType::IMM32 | OperandType::IMM64 => {
            if let Some(bits) = token.annotation.integer_bits() {
                let limit = match operand_type {
                    OperandType::IMM8 => 8,
                    OperandType::IMM16 => 16,
                    OperandType::IMM32 => 32,
                    _ => 64,
                };
                if bits > limit {
                    return Err(Diagnosis::LiteralValueSizeOverflow { operand: operand_type });
                }
            } else if !token.is(TokenType::Numeric) {
                return Err(Diagnosis::InvalidOperandType { operand: operand_type });
            }
            Ok(())
        }
        OperandType::REL32 => {
            if token.is(TokenType::LabelRef) {
                Ok(())
            } else {
                Err(Diagnosis::InvalidOperandType { operand: operand_type })
            }
        }
        OperandType::S32 => {
            if token.is(TokenType::String) {
                Ok(())
            } else {
                Err(Diagnosis::InvalidOperandType { operand: operand_type })
            }
        }
        // Reserved: no syntax currently binds variable indices.
        OperandType::LV8
        | OperandType::LV16
        | OperandType::LV32
        | OperandType::V16
        | OperandType::V32 => Err(Diagnosis::InvalidOperandType { operand: operand_type }),
    }
}

// ============================================================================
// Keyword lines
// ============================================================================

fn parse_keyword_line(pending: &[Token], output: &mut LineOutput) {
    let head = &pending[0];
    let TokenAnnotation::Keyword(keyword) = head.annotation else {
        output.fatal = Some(Report::fatal(
            head.span,
            Diagnosis::UnexpectedTokenBeganLine { given: head.kind },
        ));
        return;
    };
    match keyword {
        Keyword::Global => parse_global_keyword_line(pending, output),
        Keyword::Extern | Keyword::Import | Keyword::Include => {
            // Reserved keywords have no handler yet.
            output.reports.push(Report::error(head.span, Diagnosis::InvalidIdentifier));
        }
    }
}

/// `global IDENT+` re-types each argument as a label reference.
fn parse_global_keyword_line(pending: &[Token], output: &mut LineOutput) {
    let head = &pending[0];
    let args = &pending[1..];
    if args.is_empty() {
        output.reports.push(Report::error(
            head.span,
            Diagnosis::ExpectedToken {
                given: TokenType::EndOfLine,
                expected: Expected::Type(TokenType::Label),
            },
        ));
        return;
    }
    let mut tokens = vec![head.clone()];
    let mut ok = true;
    for arg in args {
        if arg.kind == TokenType::Identifier {
            let mut token = arg.clone();
            token.kind = TokenType::LabelRef;
            tokens.push(token);
        } else {
            ok = false;
            output.reports.push(Report::error(
                arg.span,
                Diagnosis::ExpectedToken {
                    given: arg.kind,
                    expected: Expected::Type(TokenType::Label),
                },
            ));
        }
    }
    if ok {
        output.tokens = tokens;
    }
}

// ============================================================================
// Data lines
// ============================================================================

/// `LABEL: DTYPE value[, …]` — the label was already defined when the
/// line began; here the declared type bounds each value.
fn parse_data_line(pending: &[Token]) -> Result<Vec<Token>, Report> {
    let head = &pending[0];
    let TokenAnnotation::DataType(data_type) = head.annotation else {
        return Err(Report::fatal(
            head.span,
            Diagnosis::UnexpectedTokenBeganLine { given: head.kind },
        ));
    };
    let operand_type = data_type.operand_type();
    let values = &pending[1..];
    if values.is_empty() {
        return Err(Report::error(head.span, Diagnosis::MissingOperand { operand: operand_type }));
    }
    let mut out = vec![head.clone()];
    for value in values {
        match check_operand_type(operand_type, value) {
            Ok(()) => out.push(value.clone()),
            Err(diagnosis) => return Err(Report::error(value.span, diagnosis)),
        }
    }
    Ok(out)
}
