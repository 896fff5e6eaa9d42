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

use crate::assembly::{DataType, Instruction, Keyword, Mnemonic, Segment};
use crate::source::{Source, Span};

// ============================================================================
// Token Types
// ============================================================================

/// A stable handle into the label store owned by the `ParseInfo`.
/// Handles survive later insertions, unlike references into a growable
/// array.
pub type LabelId = usize;

/// The type of a token.  The three literal subtypes are transient
/// during lexing; after classification every numeric token has type
/// `Numeric`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenType {
    EndOfLine,
    EndOfFile,
    WhiteSpace,
    Separator,
    Directive,
    Segment,
    String,
    Identifier,
    Keyword,
    Label,
    LabelRef,
    Mnemonic,
    Instruction,
    DataType,
    Numeric,
    HexLiteral,
    IntegerLiteral,
    FloatLiteral,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TokenType::EndOfLine => "end-of-line",
            TokenType::EndOfFile => "end-of-file",
            TokenType::WhiteSpace => "white space",
            TokenType::Separator => "separator",
            TokenType::Directive => "directive",
            TokenType::Segment => "segment",
            TokenType::String => "string literal",
            TokenType::Identifier => "identifier",
            TokenType::Keyword => "keyword",
            TokenType::Label => "label",
            TokenType::LabelRef => "label reference",
            TokenType::Mnemonic => "mnemonic",
            TokenType::Instruction => "instruction",
            TokenType::DataType => "data type",
            TokenType::Numeric => "numeric literal",
            TokenType::HexLiteral | TokenType::IntegerLiteral => "integer literal",
            TokenType::FloatLiteral => "floating-point literal",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Annotations
// ============================================================================

/// The classified value of a token.  Annotations carry only data; all
/// behaviour dispatches on the variant.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenAnnotation {
    None,
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    /// A decoded string literal, or the raw name of an identifier.
    /// Byte-based since hex escapes may produce non-UTF-8 bytes.
    String(Vec<u8>),
    /// A reference to a label, by stable handle.
    LabelRef(LabelId),
    /// The defining occurrence of a label, by stable handle.
    LabelDef(LabelId),
    Keyword(Keyword),
    Segment(Segment),
    Mnemonic(Mnemonic),
    Instruction(Instruction),
    DataType(DataType),
}

impl TokenAnnotation {
    /// The number of output bytes this annotation occupies when
    /// emitted.
    pub fn size(&self) -> usize {
        match self {
            TokenAnnotation::I8(_) | TokenAnnotation::U8(_) => 1,
            TokenAnnotation::I16(_) | TokenAnnotation::U16(_) => 2,
            TokenAnnotation::I32(_) | TokenAnnotation::U32(_) | TokenAnnotation::F32(_) => 4,
            TokenAnnotation::I64(_) | TokenAnnotation::U64(_) | TokenAnnotation::F64(_) => 8,
            TokenAnnotation::Instruction(_) => 1,
            TokenAnnotation::LabelRef(_) => 4,
            TokenAnnotation::String(bytes) => bytes.len(),
            _ => 0,
        }
    }

    /// The bit width of an integer annotation, or `None` for anything
    /// else (including floats).
    pub fn integer_bits(&self) -> Option<u32> {
        match self {
            TokenAnnotation::I8(_) | TokenAnnotation::U8(_) => Some(8),
            TokenAnnotation::I16(_) | TokenAnnotation::U16(_) => Some(16),
            TokenAnnotation::I32(_) | TokenAnnotation::U32(_) => Some(32),
            TokenAnnotation::I64(_) | TokenAnnotation::U64(_) => Some(64),
            _ => None,
        }
    }
}

// ============================================================================
// Token
// ============================================================================

/// A classified token: its type, the span of source text it covers,
/// and its annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenType,
    pub span: Span,
    pub annotation: TokenAnnotation,
}

impl Token {
    pub fn new(kind: TokenType, span: Span) -> Self {
        Self { kind, span, annotation: TokenAnnotation::None }
    }

    pub fn is(&self, kind: TokenType) -> bool {
        self.kind == kind
    }

    /// The source text this token covers.
    pub fn text<'a>(&self, source: &'a Source) -> &'a str {
        source.text(self.span)
    }

    /// The 1-based line number this token starts on.
    pub fn line_number(&self, source: &Source) -> usize {
        source.line_number_by_offset(self.span.start)
    }
}
