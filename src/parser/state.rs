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
use crate::assembly::Segment;
use crate::diagnostic::{AnyOfExpect, Expected};
use crate::token::{Token, TokenType};

// ============================================================================
// Line state
// ============================================================================

/// The state of the line assembler.  `Finish` sits between lines,
/// optionally constraining the next token; `Continue` accumulates the
/// tokens of the current line until a boundary flushes it.  The fatal
/// state is not represented here: a fatal report halts the parse
/// driver directly.
pub(crate) enum LineState {
    Finish { expected: Option<Expected> },
    Continue { pending: Vec<Token> },
}

impl LineState {
    pub fn start() -> Self {
        LineState::Finish { expected: None }
    }

    pub fn in_line(&self) -> bool {
        matches!(self, LineState::Continue { .. })
    }

    /// The type of the token heading the line being accumulated, if
    /// any.
    pub fn head(&self) -> Option<TokenType> {
        match self {
            LineState::Continue { pending } => pending.first().map(|t| t.kind),
            LineState::Finish { .. } => None,
        }
    }
}

/// The default expectation applied at the start of a line when no
/// explicit one is pending.
pub(crate) fn segment_expectations(segment: Segment) -> Expected {
    match segment {
        Segment::Header => Expected::AnyOf(vec![
            AnyOfExpect::Type(TokenType::EndOfFile),
            AnyOfExpect::Type(TokenType::EndOfLine),
            AnyOfExpect::Type(TokenType::Identifier),
            AnyOfExpect::Type(TokenType::Segment),
        ]),
        Segment::Code => Expected::AnyOf(vec![
            AnyOfExpect::Type(TokenType::EndOfFile),
            AnyOfExpect::Type(TokenType::EndOfLine),
            AnyOfExpect::Type(TokenType::Identifier),
            AnyOfExpect::Type(TokenType::Label),
            AnyOfExpect::Type(TokenType::Segment),
        ]),
        Segment::Data | Segment::String => Expected::AnyOf(vec![
            AnyOfExpect::Type(TokenType::EndOfFile),
            AnyOfExpect::Type(TokenType::EndOfLine),
            AnyOfExpect::Type(TokenType::Label),
            AnyOfExpect::Type(TokenType::Segment),
        ]),
    }
}
