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
use std::fmt;

use crate::assembly::{Mnemonic, OperandType};
use crate::source::{Source, Span};
use crate::token::TokenType;

// ============================================================================
// Expectations
// ============================================================================

/// A single token expectation: a bare type, or a type together with
/// the exact text required.
#[derive(Clone, Debug, PartialEq)]
pub enum AnyOfExpect {
    Type(TokenType),
    TypeAndText(TokenType, String),
}

impl AnyOfExpect {
    fn matches(&self, kind: TokenType, text: &str) -> bool {
        match self {
            AnyOfExpect::Type(t) => kind_matches(*t, kind),
            AnyOfExpect::TypeAndText(t, s) => kind_matches(*t, kind) && text == s,
        }
    }
}

impl fmt::Display for AnyOfExpect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AnyOfExpect::Type(t) => write!(f, "{t}"),
            AnyOfExpect::TypeAndText(_, s) => write!(f, "'{s}'"),
        }
    }
}

/// What the parser will accept as the next token.
#[derive(Clone, Debug, PartialEq)]
pub enum Expected {
    Type(TokenType),
    TypeAndText(TokenType, String),
    AnyOf(Vec<AnyOfExpect>),
}

/// An expected `Identifier` also accepts the refinements the
/// classifier may have already applied to an identifier lexeme.
fn kind_matches(expect: TokenType, kind: TokenType) -> bool {
    if expect == kind {
        return true;
    }
    expect == TokenType::Identifier
        && matches!(
            kind,
            TokenType::Keyword
                | TokenType::Mnemonic
                | TokenType::Instruction
                | TokenType::DataType
        )
}

impl Expected {
    pub fn matches(&self, kind: TokenType, text: &str) -> bool {
        match self {
            Expected::Type(t) => kind_matches(*t, kind),
            Expected::TypeAndText(t, s) => kind_matches(*t, kind) && text == s,
            Expected::AnyOf(items) => items.iter().any(|item| item.matches(kind, text)),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expected::Type(t) => write!(f, "{t}"),
            Expected::TypeAndText(_, s) => write!(f, "'{s}'"),
            Expected::AnyOf(items) => {
                write!(f, "one of: ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Diagnoses
// ============================================================================

/// What went wrong inside an invalid `\x` escape sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HexEscapeProblem {
    NoHexChars,
    OutOfRange,
}

/// A typed diagnosis.  Each variant carries just the data needed to
/// format its message.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnosis {
    /// A token sequence was parsed as a line when the type of the
    /// first token cannot be handled by the parser.
    UnexpectedTokenBeganLine { given: TokenType },
    /// The lexer encountered a sequence of characters that were
    /// unexpected at that point.
    UnexpectedLexeme,
    /// The parser encountered a token of the wrong type while
    /// expecting another one, or one of many.
    ExpectedToken { given: TokenType, expected: Expected },
    /// The parser is totally incapable of doing anything with this
    /// token here.
    UnexpectedToken { given: TokenType },
    /// A separator occurred in an invalid location.
    UnexpectedSeparator,
    /// A segment directive was not the first token on a line.
    UnexpectedSegmentAfterTokens,
    /// A label was not the first token on a line.
    UnexpectedLabelAfterTokens,
    /// More tokens provided than an instruction allows operands for.
    UnexpectedOperand { encountered: Option<TokenType>, num_expected: usize, num_given: usize },
    /// An identifier token could not be resolved to anything.
    InvalidIdentifier,
    /// The segment name is unrecognised.
    InvalidSegment,
    /// The wrong type of literal was passed for an operand.
    InvalidOperandType { operand: OperandType },
    /// No instruction for the mnemonic has a matching series of
    /// operands.
    InvalidMnemonicOperands { mnemonic: Mnemonic },
    /// Another operand was required but the parser ran out of tokens.
    MissingOperand { operand: OperandType },
    /// A literal value was supplied that exceeds the bit size of the
    /// accepted operand.
    LiteralValueSizeOverflow { operand: OperandType },
    /// A string literal contained an unknown escape sequence, e.g.
    /// `\z`.
    InvalidEscapeSequence,
    /// A string literal contained an invalid hex escape sequence.
    InvalidHexEscapeSequence { problem: HexEscapeProblem },
    /// A label was declared with a name that already exists; carries
    /// the span of the first definition.
    LabelRedefinition { original: Span },
    /// A label was referenced but never defined.
    UnresolvedLabelReference,
    /// A numeric literal could not be parsed, or cannot be
    /// represented at any supported width.
    InvalidNumericLiteral,
}

impl Diagnosis {
    /// The numeric code of this diagnosis.  Codes below 2000 indicate
    /// internal errors.
    pub fn code(&self) -> u32 {
        match self {
            Diagnosis::UnexpectedTokenBeganLine { .. } => 1000,
            Diagnosis::UnexpectedLexeme => 2000,
            Diagnosis::ExpectedToken { .. } => 2001,
            Diagnosis::UnexpectedToken { .. } => 2002,
            Diagnosis::UnexpectedSeparator => 2003,
            Diagnosis::UnexpectedSegmentAfterTokens => 2004,
            Diagnosis::UnexpectedLabelAfterTokens => 2005,
            Diagnosis::UnexpectedOperand { .. } => 2006,
            Diagnosis::InvalidIdentifier => 2010,
            Diagnosis::InvalidSegment => 2011,
            Diagnosis::InvalidOperandType { .. } => 2012,
            Diagnosis::InvalidMnemonicOperands { .. } => 2013,
            Diagnosis::MissingOperand { .. } => 2014,
            Diagnosis::LiteralValueSizeOverflow { .. } => 2015,
            Diagnosis::InvalidEscapeSequence => 2016,
            Diagnosis::InvalidHexEscapeSequence { .. } => 2017,
            Diagnosis::LabelRedefinition { .. } => 2018,
            Diagnosis::UnresolvedLabelReference => 2019,
            Diagnosis::InvalidNumericLiteral => 2020,
        }
    }

    /// The human name of this diagnosis.
    pub fn name(&self) -> &'static str {
        match self {
            Diagnosis::UnexpectedTokenBeganLine { .. } => {
                "(internal error) unexpected token began the line"
            }
            Diagnosis::UnexpectedLexeme => "unexpected lexeme",
            Diagnosis::ExpectedToken { .. } => "unexpected token",
            Diagnosis::UnexpectedToken { .. } => "unexpected token",
            Diagnosis::UnexpectedSeparator => "unexpected separator",
            Diagnosis::UnexpectedSegmentAfterTokens => "unexpected segment",
            Diagnosis::UnexpectedLabelAfterTokens => "unexpected label",
            Diagnosis::UnexpectedOperand { .. } => "unexpected operand",
            Diagnosis::InvalidIdentifier => "invalid identifier",
            Diagnosis::InvalidSegment => "invalid segment",
            Diagnosis::InvalidOperandType { .. } => "invalid operand type",
            Diagnosis::InvalidMnemonicOperands { .. } => "invalid operands for mnemonic",
            Diagnosis::MissingOperand { .. } => "too few operands",
            Diagnosis::LiteralValueSizeOverflow { .. } => "value exceeds operand size",
            Diagnosis::InvalidEscapeSequence => "invalid escape sequence",
            Diagnosis::InvalidHexEscapeSequence { .. } => "invalid hex escape sequence",
            Diagnosis::LabelRedefinition { .. } => "label redefinition",
            Diagnosis::UnresolvedLabelReference => "unresolved label reference",
            Diagnosis::InvalidNumericLiteral => "invalid numeric literal",
        }
    }

    /// Format the message for this diagnosis.  The source is consulted
    /// for messages which reference other locations.
    pub fn message(&self, source: &Source) -> String {
        match self {
            Diagnosis::UnexpectedTokenBeganLine { given } => {
                format!("{given} not expected at beginning of line")
            }
            Diagnosis::UnexpectedLexeme => "invalid sequence of characters".to_string(),
            Diagnosis::ExpectedToken { given, expected } => {
                format!("{given} encountered when expecting {expected}")
            }
            Diagnosis::UnexpectedToken { given } => format!("{given} not expected here"),
            Diagnosis::UnexpectedSeparator => "separator not valid here".to_string(),
            Diagnosis::UnexpectedSegmentAfterTokens => {
                "segment should be on its own line".to_string()
            }
            Diagnosis::UnexpectedLabelAfterTokens => {
                "label should be the first token of a line".to_string()
            }
            Diagnosis::UnexpectedOperand { encountered, num_expected, num_given } => {
                if let Some(TokenType::Instruction | TokenType::Mnemonic) = encountered {
                    return "unexpected instruction encountered, use ',' to separate multiple \
                            instructions on one line"
                        .to_string();
                }
                if *num_expected == 0 {
                    return format!("instruction takes no operands, {num_given} provided");
                }
                if *num_given > 1 {
                    let plural = if *num_expected == 1 { "operand" } else { "operands" };
                    return format!("expected {num_expected} {plural}, found {num_given}");
                }
                "unexpected additional operand".to_string()
            }
            Diagnosis::InvalidIdentifier => {
                "no definition found for this identifier (is a label missing?)".to_string()
            }
            Diagnosis::InvalidSegment => "segment not recognised".to_string(),
            Diagnosis::InvalidOperandType { operand } => format!("not a match for {operand}"),
            Diagnosis::InvalidMnemonicOperands { .. } => {
                "given operands could not resolve this mnemonic to any instruction".to_string()
            }
            Diagnosis::MissingOperand { operand } => {
                format!("missing an operand of type {operand}")
            }
            Diagnosis::LiteralValueSizeOverflow { operand } => {
                format!("value exceeds allowed size of {operand}")
            }
            Diagnosis::InvalidEscapeSequence => {
                "unknown escape sequence, character kept as-is".to_string()
            }
            Diagnosis::InvalidHexEscapeSequence { problem } => match problem {
                HexEscapeProblem::NoHexChars => {
                    "\\x must be followed by at least 1 hex digit".to_string()
                }
                HexEscapeProblem::OutOfRange => {
                    "too many hex digits - out of 32bit range".to_string()
                }
            },
            Diagnosis::LabelRedefinition { original } => {
                format!(
                    "label already defined on line {}",
                    source.line_number_by_offset(original.start)
                )
            }
            Diagnosis::UnresolvedLabelReference => {
                "no label with this name is defined".to_string()
            }
            Diagnosis::InvalidNumericLiteral => {
                "numeric literal cannot be represented".to_string()
            }
        }
    }
}
