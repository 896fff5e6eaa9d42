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
use crate::token::TokenType;

// ======================================================
// Rules
// ======================================================

/// Defines a very simple concept of a scanner which requires no
/// state.  A scanner reports the length of the lexeme it matched at
/// the start of the input, or zero for no match.
pub(crate) type Scanner = fn(&[u8]) -> usize;

/// A single lexical rule: the raw token type produced together with
/// the scanner recognising it.
pub(crate) struct LexRule {
    pub kind: TokenType,
    pub scanner: Scanner,
}

/// The set of rules used for lexing, tried in order of appearance.
pub(crate) static RULES: &[LexRule] = &[
    LexRule { kind: TokenType::EndOfLine, scanner: scan_newlines },
    LexRule { kind: TokenType::WhiteSpace, scanner: scan_comment },
    LexRule { kind: TokenType::WhiteSpace, scanner: scan_whitespace },
    LexRule { kind: TokenType::Separator, scanner: scan_separator },
    LexRule { kind: TokenType::Segment, scanner: scan_segment },
    LexRule { kind: TokenType::String, scanner: scan_string },
    LexRule { kind: TokenType::HexLiteral, scanner: scan_hex_literal },
    LexRule { kind: TokenType::IntegerLiteral, scanner: scan_integer_literal },
    LexRule { kind: TokenType::FloatLiteral, scanner: scan_float_literal },
    LexRule { kind: TokenType::Label, scanner: scan_label },
    LexRule { kind: TokenType::Identifier, scanner: scan_identifier },
];

/// Scan the next raw lexeme at the start of the input.  The first rule
/// returning a non-zero length wins; `None` indicates a lex failure.
pub(crate) fn scan(input: &[u8]) -> Option<(TokenType, usize)> {
    if input.is_empty() {
        return None;
    }
    for rule in RULES {
        let length = (rule.scanner)(input);
        if length > 0 {
            return Some((rule.kind, length));
        }
    }
    None
}

// ======================================================
// Scanners
// ======================================================

/// Helper which skips over bytes matching a given predicate.
fn skip<P>(input: &[u8], index: usize, pred: P) -> usize
where
    P: Fn(u8) -> bool,
{
    let mut i = index;
    // Continue matching
    while i < input.len() && pred(input[i]) {
        i += 1;
    }
    // Done
    i
}

fn is_word(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// Whether a word boundary exists at the given position, i.e. exactly
/// one of the adjacent bytes is a word byte.  Either end of the input
/// counts as a non-word side.
fn word_boundary(input: &[u8], at: usize) -> bool {
    let before = at > 0 && is_word(input[at - 1]);
    let after = at < input.len() && is_word(input[at]);
    before != after
}

/// A run of one or more newlines.
fn scan_newlines(input: &[u8]) -> usize {
    skip(input, 0, |b| b == b'\n')
}

/// A comment runs from `;` to the next newline, exclusive, or to the
/// end of the input.
fn scan_comment(input: &[u8]) -> usize {
    if input[0] == b';' {
        return skip(input, 1, |b| b != b'\n');
    }
    0
}

/// Whitespace other than newlines.
fn scan_whitespace(input: &[u8]) -> usize {
    skip(input, 0, |b| b != b'\n' && b.is_ascii_whitespace())
}

fn scan_separator(input: &[u8]) -> usize {
    match input[0] {
        b'=' | b':' | b',' => 1,
        _ => 0,
    }
}

/// A `.` followed by an identifier body.
fn scan_segment(input: &[u8]) -> usize {
    if input[0] == b'.' {
        let length = scan_identifier(&input[1..]);
        if length > 0 {
            return length + 1;
        }
    }
    0
}

/// An opening quote through to the closing unescaped quote; a
/// backslash escapes the byte that follows it.  An unterminated string
/// is a lex failure.
fn scan_string(input: &[u8]) -> usize {
    if input[0] != b'"' {
        return 0;
    }
    let mut i = 1;
    while i < input.len() {
        match input[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    0
}

/// `[+-]?0x[0-9A-Fa-f]+` followed by a word boundary.
fn scan_hex_literal(input: &[u8]) -> usize {
    let mut i = 0;
    if i < input.len() && (input[i] == b'+' || input[i] == b'-') {
        i += 1;
    }
    if input.len() < i + 2 || input[i] != b'0' || input[i + 1] != b'x' {
        return 0;
    }
    let end = skip(input, i + 2, |b| b.is_ascii_hexdigit());
    if end == i + 2 || !word_boundary(input, end) {
        return 0;
    }
    end
}

/// `[+-]?(0|[1-9][0-9]*)` followed by either the end of the input, or
/// a boundary byte which is not a dot (a dot hands over to the float
/// rule).
fn scan_integer_literal(input: &[u8]) -> usize {
    let mut i = 0;
    if i < input.len() && (input[i] == b'+' || input[i] == b'-') {
        i += 1;
    }
    let end = match input.get(i) {
        Some(b'0') => i + 1,
        Some(b'1'..=b'9') => skip(input, i, |b| b.is_ascii_digit()),
        _ => return 0,
    };
    match input.get(end) {
        None => end,
        Some(b'.') => 0,
        Some(b) if is_word(*b) => 0,
        Some(_) => end,
    }
}

/// `[+-]?(0|[1-9][0-9]*)\.[0-9]*([eE][+-]?[0-9]+)?` followed by a word
/// boundary.  An exponent without digits is not consumed.
fn scan_float_literal(input: &[u8]) -> usize {
    let mut i = 0;
    if i < input.len() && (input[i] == b'+' || input[i] == b'-') {
        i += 1;
    }
    match input.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => i = skip(input, i, |b| b.is_ascii_digit()),
        _ => return 0,
    }
    if input.get(i) != Some(&b'.') {
        return 0;
    }
    i += 1;
    i = skip(input, i, |b| b.is_ascii_digit());
    // Optional exponent; falls back to the plain fraction when the
    // trailing boundary fails.
    if let Some(b'e' | b'E') = input.get(i) {
        let mut j = i + 1;
        if let Some(b'+' | b'-') = input.get(j) {
            j += 1;
        }
        let k = skip(input, j, |b| b.is_ascii_digit());
        if k > j && word_boundary(input, k) {
            return k;
        }
    }
    if word_boundary(input, i) {
        i
    } else {
        0
    }
}

/// An identifier body immediately followed by `:` and then whitespace
/// or the end of the input.
fn scan_label(input: &[u8]) -> usize {
    let length = scan_identifier(input);
    if length > 0 && input.get(length) == Some(&b':') {
        match input.get(length + 1) {
            None => return length + 1,
            Some(b) if b.is_ascii_whitespace() => return length + 1,
            Some(_) => {}
        }
    }
    0
}

/// `[A-Za-z_][A-Za-z0-9_]*`.
fn scan_identifier(input: &[u8]) -> usize {
    if input.is_empty() || !(input[0].is_ascii_alphabetic() || input[0] == b'_') {
        return 0;
    }
    skip(input, 1, is_word)
}

// ======================================================
// Tests
// ======================================================
