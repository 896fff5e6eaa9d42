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
use crate::assembly::{DataType, Instruction, Keyword, Mnemonic, Segment};
use crate::diagnostic::{Diagnosis, HexEscapeProblem};
use crate::reporter::Report;
use crate::source::{Source, Span};
use crate::token::{Token, TokenAnnotation, TokenType};

// ============================================================================
// Classification
// ============================================================================

/// The outcome of classifying one raw lexeme.  A `None` token means
/// the lexeme was consumed by one of the attached reports.
pub(crate) struct Classified {
    pub token: Option<Token>,
    pub reports: Vec<Report>,
}

impl Classified {
    fn keep(token: Token) -> Self {
        Self { token: Some(token), reports: Vec::new() }
    }

    fn drop(report: Report) -> Self {
        Self { token: None, reports: vec![report] }
    }
}

/// Refine a raw lexeme into a typed token.  The current segment
/// steers identifier classification: the data-type vocabulary is only
/// consulted inside the Data segment.
pub(crate) fn classify(source: &Source, segment: Segment, token: Token) -> Classified {
    match token.kind {
        TokenType::Identifier => classify_identifier(source, segment, token),
        TokenType::Segment => classify_segment(source, token),
        TokenType::HexLiteral | TokenType::IntegerLiteral | TokenType::FloatLiteral => {
            classify_numeric(source, token)
        }
        TokenType::String => classify_string(source, token),
        TokenType::Label => classify_label(source, token),
        TokenType::Separator => classify_separator(source, token),
        _ => Classified::keep(token),
    }
}

fn classify_identifier(source: &Source, segment: Segment, mut token: Token) -> Classified {
    let name = token.text(source);
    if segment == Segment::Data {
        if let Some(data_type) = DataType::from_name(name) {
            token.kind = TokenType::DataType;
            token.annotation = TokenAnnotation::DataType(data_type);
            return Classified::keep(token);
        }
    }
    if let Some(keyword) = Keyword::from_name(name) {
        token.kind = TokenType::Keyword;
        token.annotation = TokenAnnotation::Keyword(keyword);
    } else if let Some(mnemonic) = Mnemonic::from_name(name) {
        token.kind = TokenType::Mnemonic;
        token.annotation = TokenAnnotation::Mnemonic(mnemonic);
    } else if let Some(instruction) = Instruction::from_name(name) {
        token.kind = TokenType::Instruction;
        token.annotation = TokenAnnotation::Instruction(instruction);
    } else {
        // Unresolved: retain the raw name, a possible label reference.
        let name = name.as_bytes().to_vec();
        token.annotation = TokenAnnotation::String(name);
    }
    Classified::keep(token)
}

fn classify_segment(source: &Source, mut token: Token) -> Classified {
    // Skip the leading '.'
    let name = &token.text(source)[1..];
    match Segment::from_name(name) {
        Some(segment) => {
            token.annotation = TokenAnnotation::Segment(segment);
            Classified::keep(token)
        }
        None => Classified::drop(Report::error(token.span, Diagnosis::InvalidSegment)),
    }
}

fn classify_separator(source: &Source, token: Token) -> Classified {
    if token.text(source) == "," {
        Classified::keep(token)
    } else {
        Classified::drop(Report::error(token.span, Diagnosis::UnexpectedSeparator))
    }
}

fn classify_label(source: &Source, mut token: Token) -> Classified {
    // Strip the trailing colon; the name is kept pending insertion
    // into the label store.
    let text = token.text(source);
    let name = text[..text.len() - 1].as_bytes().to_vec();
    token.annotation = TokenAnnotation::String(name);
    Classified::keep(token)
}

// ============================================================================
// Numeric literals
// ============================================================================

/// Coerce a parsed magnitude to the narrowest annotation that can
/// represent it.  The sign was stripped before parsing and is
/// reapplied here, after width selection.
fn resolve_integer_annotation(num: u64, negative: bool) -> TokenAnnotation {
    if !negative {
        if num <= i8::MAX as u64 {
            TokenAnnotation::I8(num as i8)
        } else if num <= u8::MAX as u64 {
            TokenAnnotation::U8(num as u8)
        } else if num <= i16::MAX as u64 {
            TokenAnnotation::I16(num as i16)
        } else if num <= u16::MAX as u64 {
            TokenAnnotation::U16(num as u16)
        } else if num <= i32::MAX as u64 {
            TokenAnnotation::I32(num as i32)
        } else if num <= u32::MAX as u64 {
            TokenAnnotation::U32(num as u32)
        } else if num <= i64::MAX as u64 {
            TokenAnnotation::I64(num as i64)
        } else {
            TokenAnnotation::U64(num)
        }
    } else {
        // A magnitude above 2^63-1 has no signed representation.
        if num > i64::MAX as u64 {
            return TokenAnnotation::None;
        }
        let value = -(num as i64);
        if num <= i8::MAX as u64 {
            TokenAnnotation::I8(value as i8)
        } else if num <= i16::MAX as u64 {
            TokenAnnotation::I16(value as i16)
        } else if num <= i32::MAX as u64 {
            TokenAnnotation::I32(value as i32)
        } else {
            TokenAnnotation::I64(value)
        }
    }
}

fn classify_numeric(source: &Source, mut token: Token) -> Classified {
    let text = token.text(source);
    let negative = text.starts_with('-');
    let literal = text.strip_prefix(['+', '-']).unwrap_or(text);
    //
    token.annotation = match token.kind {
        TokenType::HexLiteral => match u64::from_str_radix(&literal[2..], 16) {
            Ok(num) => resolve_integer_annotation(num, negative),
            Err(_) => TokenAnnotation::None,
        },
        TokenType::IntegerLiteral => match literal.parse::<u64>() {
            Ok(num) => resolve_integer_annotation(num, negative),
            Err(_) => TokenAnnotation::None,
        },
        _ => match text.parse::<f32>() {
            Ok(num) => TokenAnnotation::F32(num),
            Err(_) => TokenAnnotation::None,
        },
    };
    //
    let mut reports = Vec::new();
    if token.annotation == TokenAnnotation::None {
        reports.push(Report::error(token.span, Diagnosis::InvalidNumericLiteral));
    }
    token.kind = TokenType::Numeric;
    Classified { token: Some(token), reports }
}

// ============================================================================
// String literals
// ============================================================================

fn classify_string(source: &Source, mut token: Token) -> Classified {
    let text = token.text(source);
    // Just the stuff between the quotes.
    let body = &text[1..text.len() - 1];
    // Escapes resolve relative to the body's position in the source.
    let base = token.span.start + 1;
    let mut reports = Vec::new();
    let decoded = decode_string(body, base, &mut reports);
    token.annotation = TokenAnnotation::String(decoded);
    Classified { token: Some(token), reports }
}

/// Decode the body of a string literal, processing `\\ \r \n \t \"`
/// one-for-one plus `\xH…` hex sequences.  Unknown escapes keep their
/// character and warn.
fn decode_string(body: &str, base: usize, reports: &mut Vec<Report>) -> Vec<u8> {
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    //
    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' || i + 1 >= bytes.len() {
            out.push(b);
            i += 1;
            continue;
        }
        let escape_at = i;
        let c = bytes[i + 1];
        i += 2;
        match c {
            b'\\' => out.push(b'\\'),
            b'r' => out.push(b'\r'),
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'"' => out.push(b'"'),
            b'x' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_hexdigit() {
                    i += 1;
                }
                let run = &body[start..i];
                if run.is_empty() {
                    reports.push(Report::error(
                        Span::new(base + escape_at, base + i),
                        Diagnosis::InvalidHexEscapeSequence {
                            problem: HexEscapeProblem::NoHexChars,
                        },
                    ));
                } else {
                    // Emit what we can even when the sequence runs past
                    // the 32-bit range.
                    let digits = if run.len() > 8 {
                        reports.push(Report::error(
                            Span::new(base + start, base + i),
                            Diagnosis::InvalidHexEscapeSequence {
                                problem: HexEscapeProblem::OutOfRange,
                            },
                        ));
                        &run[..8]
                    } else {
                        run
                    };
                    let value = u32::from_str_radix(digits, 16).unwrap_or(0);
                    // An odd digit count rounds up to the next byte.
                    let length = (digits.len() + 1) / 2;
                    out.extend_from_slice(&value.to_le_bytes()[..length]);
                }
                // A backslash straight after the digits terminates the
                // sequence and is consumed with it.
                if i < bytes.len() && bytes[i] == b'\\' {
                    i += 1;
                }
            }
            _ => {
                reports.push(Report::warning(
                    Span::new(base + escape_at, base + escape_at + 2),
                    Diagnosis::InvalidEscapeSequence,
                ));
                out.push(c);
            }
        }
    }
    out
}
