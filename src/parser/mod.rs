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

// Token classification.
mod classifier;
// Lexical rules.
mod lexer;
// Line dispatch and mnemonic resolution.
mod line;
// The line-assembler state machine.
mod state;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::assembly::Segment;
use crate::diagnostic::{Diagnosis, Expected};
use crate::reporter::{Report, Reporter, Severity};
use crate::source::{Source, Span};
use crate::token::{LabelId, Token, TokenAnnotation, TokenType};

use classifier::Classified;
use state::LineState;

// ============================================================================
// Options
// ============================================================================

/// Configuration for a parse invocation.
pub struct Options {
    /// Receives every report produced; when unset and
    /// `error_reporting` holds, the default console renderer is
    /// installed.
    pub reporter: Reporter,
    pub error_reporting: bool,
    /// Suppresses errors that would otherwise prevent tokenization,
    /// allowing lexer-only assertions in tests.
    pub test_force_tokenization: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { reporter: Reporter::new(), error_reporting: true, test_force_tokenization: false }
    }
}

// ============================================================================
// Labels
// ============================================================================

/// A named source location, resolved to an output offset during
/// emission.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub name: String,
    /// Span of the defining token.
    pub span: Span,
    /// The segment the label was defined in.
    pub segment: Segment,
    /// Output offset; assigned exactly once, when the emitter reaches
    /// the defining token.
    pub offset: u32,
}

// ============================================================================
// Parse info
// ============================================================================

/// Everything the parse produced: per-segment token streams together
/// with the label store.  Tokens refer to labels by stable index, so
/// later insertions never invalidate existing annotations.
pub struct ParseInfo {
    pub source: Arc<Source>,
    /// Token streams indexed by `Segment::index()`.
    pub segments: [Vec<Token>; Segment::COUNT],
    pub labels: Vec<Label>,
    pub label_map: HashMap<String, LabelId>,
}

impl ParseInfo {
    fn new(source: Arc<Source>) -> Self {
        Self {
            source,
            segments: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
            labels: Vec::new(),
            label_map: HashMap::new(),
        }
    }

    /// The token stream of a given segment.
    pub fn tokens(&self, segment: Segment) -> &[Token] {
        &self.segments[segment.index()]
    }
}

// ============================================================================
// Result
// ============================================================================

/// The outcome of a parse: the `ParseInfo` plus every report raised.
pub struct ParseResult {
    pub info: ParseInfo,
    pub reports: Vec<Report>,
    pub num_warnings: usize,
    pub num_errors: usize,
    pub had_fatal: bool,
}

impl ParseResult {
    /// A parse is considered ok when it produced no errors.
    pub fn ok(&self) -> bool {
        self.num_errors == 0
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Parse a source unit into a `ParseInfo`, reporting diagnostics
/// along the way.  Parsing continues past errors where possible and
/// halts at the next safe point after a fatal report.
pub fn tokenize(options: &Options, source: Arc<Source>) -> ParseResult {
    Parser::new(options, source).run()
}

struct Parser<'a> {
    options: &'a Options,
    /// Default renderer, used when the caller supplied no sink.
    console: Option<Reporter>,
    source: Arc<Source>,
    info: ParseInfo,
    segment: Segment,
    /// A segment directive takes effect at the end of its line.
    pending_segment: Option<Segment>,
    state: LineState,
    /// Stream positions of label references seen before definition.
    unresolved: Vec<(Segment, usize)>,
    /// Name to positions in the unresolved list.
    unresolved_names: HashMap<String, Vec<usize>>,
    reports: Vec<Report>,
    num_warnings: usize,
    num_errors: usize,
    had_fatal: bool,
}

impl<'a> Parser<'a> {
    fn new(options: &'a Options, source: Arc<Source>) -> Self {
        let console = if !options.reporter.has_sink() && options.error_reporting {
            Some(Reporter::console())
        } else {
            None
        };
        Self {
            options,
            console,
            source: source.clone(),
            info: ParseInfo::new(source),
            segment: Segment::Header,
            pending_segment: None,
            state: LineState::start(),
            unresolved: Vec::new(),
            unresolved_names: HashMap::new(),
            reports: Vec::new(),
            num_warnings: 0,
            num_errors: 0,
            had_fatal: false,
        }
    }

    fn run(mut self) -> ParseResult {
        let code_len = self.source.len();
        let mut offset = 0;
        //
        while offset < code_len {
            let rest = &self.source.code().as_bytes()[offset..];
            let Some((kind, length)) = lexer::scan(rest) else {
                // Report the whole whitespace-delimited lexeme.
                let span = match self.source.get_token(offset) {
                    Ok(span) => span,
                    Err(_) => Span::new(offset, code_len),
                };
                self.emit(Report::fatal(span, Diagnosis::UnexpectedLexeme));
                break;
            };
            if kind != TokenType::WhiteSpace {
                self.step(Token::new(kind, Span::new(offset, offset + length)));
                if self.had_fatal {
                    break;
                }
            }
            offset += length;
        }
        // The end of input acts as a final line boundary.
        if !self.had_fatal {
            self.step(Token::new(TokenType::EndOfFile, Span::new(code_len, code_len)));
        }
        self.finish_unresolved();
        //
        ParseResult {
            info: self.info,
            reports: self.reports,
            num_warnings: self.num_warnings,
            num_errors: self.num_errors,
            had_fatal: self.had_fatal,
        }
    }

    /// Record a report, forward it to the active sink, and update the
    /// counters.
    fn emit(&mut self, report: Report) {
        let reporter = self.console.as_ref().unwrap_or(&self.options.reporter);
        reporter.report(&self.source, &report);
        match report.severity {
            Severity::Info => {}
            Severity::Warning => self.num_warnings += 1,
            Severity::Error => self.num_errors += 1,
            Severity::Fatal => {
                self.num_errors += 1;
                self.had_fatal = true;
            }
        }
        self.reports.push(report);
    }

    fn emit_all(&mut self, reports: Vec<Report>) {
        for report in reports {
            self.emit(report);
        }
    }

    /// Process one raw token: classify, verify any pending
    /// expectation, then transition the line state.
    fn step(&mut self, raw: Token) {
        // Line boundaries flush the pending line and bypass
        // expectation checks.
        if let TokenType::EndOfLine | TokenType::EndOfFile = raw.kind {
            self.flush(raw);
            return;
        }
        let Classified { token, reports } = classifier::classify(&self.source, self.segment, raw);
        self.emit_all(reports);
        let Some(token) = token else {
            // The lexeme was consumed by a classification error.
            return;
        };
        // Verify the token against the pending (or default)
        // expectation before it may enter a line.
        let effective = match &self.state {
            LineState::Finish { expected } if !self.options.test_force_tokenization => {
                Some(expected.clone().unwrap_or_else(|| state::segment_expectations(self.segment)))
            }
            _ => None,
        };
        if let Some(effective) = effective {
            if !effective.matches(token.kind, token.text(&self.source)) {
                // The offending token is discarded; the expectation
                // stands.
                self.emit(Report::error(
                    token.span,
                    Diagnosis::ExpectedToken { given: token.kind, expected: effective },
                ));
                return;
            }
        }
        self.transition(token);
    }

    fn transition(&mut self, token: Token) {
        match token.kind {
            TokenType::Segment => self.on_segment(token),
            TokenType::Label => self.on_label(token),
            TokenType::Keyword
            | TokenType::Mnemonic
            | TokenType::Instruction
            | TokenType::DataType => match &mut self.state {
                LineState::Continue { pending } => pending.push(token),
                LineState::Finish { .. } => {
                    self.state = LineState::Continue { pending: vec![token] };
                }
            },
            TokenType::Identifier | TokenType::Numeric | TokenType::String => {
                match &mut self.state {
                    LineState::Continue { pending } => pending.push(token),
                    LineState::Finish { .. } => self.on_line_misfit(token),
                }
            }
            TokenType::Separator => self.on_separator(token),
            _ => {
                self.emit(Report::fatal(
                    token.span,
                    Diagnosis::UnexpectedToken { given: token.kind },
                ));
            }
        }
    }

    /// A token which cannot begin a line arrived at the start of one.
    /// Under forced tokenization it is kept verbatim so the raw stream
    /// can be inspected.
    fn on_line_misfit(&mut self, token: Token) {
        let span = token.span;
        let kind = token.kind;
        self.push_token(token);
        if self.options.test_force_tokenization {
            return;
        }
        if kind == TokenType::Identifier {
            self.emit(Report::error(span, Diagnosis::InvalidIdentifier));
        } else {
            self.emit(Report::error(span, Diagnosis::UnexpectedToken { given: kind }));
        }
    }

    fn on_segment(&mut self, token: Token) {
        if self.state.in_line() {
            // Only the data segment treats a directive as an implicit
            // line boundary.
            if self.segment == Segment::Data {
                self.dispatch_pending();
                if self.had_fatal {
                    return;
                }
            } else {
                self.emit(Report::error(token.span, Diagnosis::UnexpectedSegmentAfterTokens));
                return;
            }
        }
        let TokenAnnotation::Segment(next) = token.annotation else {
            self.emit(Report::fatal(token.span, Diagnosis::UnexpectedToken { given: token.kind }));
            return;
        };
        // The directive itself belongs to the segment it closes; the
        // switch happens when its line ends.
        self.push_token(token);
        self.pending_segment = Some(next);
        self.state = LineState::Finish { expected: Some(Expected::Type(TokenType::EndOfLine)) };
    }

    fn on_label(&mut self, token: Token) {
        if self.state.in_line() {
            self.emit(Report::error(token.span, Diagnosis::UnexpectedLabelAfterTokens));
            return;
        }
        let text = token.text(&self.source);
        let name = text[..text.len() - 1].to_string();
        let span = token.span;
        let mut token = token;
        //
        match self.info.label_map.get(&name) {
            Some(&id) => {
                let original = self.info.labels[id].span;
                token.annotation = TokenAnnotation::LabelDef(id);
                self.push_token(token);
                self.emit(Report::error(span, Diagnosis::LabelRedefinition { original }));
            }
            None => {
                let id = self.info.labels.len();
                self.info.labels.push(Label {
                    name: name.clone(),
                    span,
                    segment: self.segment,
                    offset: 0,
                });
                self.info.label_map.insert(name.clone(), id);
                token.annotation = TokenAnnotation::LabelDef(id);
                self.push_token(token);
                // Patch every reference that was waiting on this name.
                if let Some(positions) = self.unresolved_names.remove(&name) {
                    for position in positions {
                        let (segment, index) = self.unresolved[position];
                        self.info.segments[segment.index()][index].annotation =
                            TokenAnnotation::LabelRef(id);
                    }
                }
            }
        }
        // A data declaration must follow its label on the same line.
        let expected = if self.segment == Segment::Data {
            Some(Expected::Type(TokenType::DataType))
        } else {
            None
        };
        self.state = LineState::Finish { expected };
    }

    fn on_separator(&mut self, _token: Token) {
        // Only "," survives classification.  Within a data
        // declaration it continues the value list; otherwise it closes
        // the current sub-line.
        if self.state.head() == Some(TokenType::DataType) {
            return;
        }
        if self.state.in_line() {
            self.dispatch_pending();
        }
        self.state = LineState::Finish { expected: None };
    }

    /// Close the current line at a boundary token, then record the
    /// boundary itself in the stream.
    fn flush(&mut self, boundary: Token) {
        if self.state.in_line() {
            self.dispatch_pending();
            if self.had_fatal {
                return;
            }
        }
        self.state = LineState::start();
        match boundary.kind {
            TokenType::EndOfFile => {
                self.push_token(boundary);
            }
            _ => {
                // Runs of blank lines collapse to a single marker.
                let stream = &self.info.segments[self.segment.index()];
                let keep = matches!(stream.last(), Some(last) if last.kind != TokenType::EndOfLine);
                if keep {
                    self.push_token(boundary);
                }
            }
        }
        if let Some(next) = self.pending_segment.take() {
            self.segment = next;
        }
    }

    /// Dispatch the accumulated line and append its output to the
    /// current stream.
    fn dispatch_pending(&mut self) {
        let pending = match std::mem::replace(&mut self.state, LineState::start()) {
            LineState::Continue { pending } => pending,
            LineState::Finish { .. } => return,
        };
        let output = line::parse_line(pending);
        self.emit_all(output.reports);
        if let Some(fatal) = output.fatal {
            self.emit(fatal);
            return;
        }
        for token in output.tokens {
            let unresolved_ref = token.kind == TokenType::LabelRef
                && matches!(token.annotation, TokenAnnotation::String(_));
            let index = self.push_token(token);
            if unresolved_ref {
                self.reference_label(self.segment, index);
            }
        }
    }

    fn push_token(&mut self, token: Token) -> usize {
        let stream = &mut self.info.segments[self.segment.index()];
        stream.push(token);
        stream.len() - 1
    }

    /// Bind a reference token to its label immediately when the name
    /// is known, or queue it for patching at definition time.
    fn reference_label(&mut self, segment: Segment, index: usize) {
        let name = self.info.segments[segment.index()][index].text(&self.source).to_string();
        match self.info.label_map.get(&name) {
            Some(&id) => {
                self.info.segments[segment.index()][index].annotation =
                    TokenAnnotation::LabelRef(id);
            }
            None => {
                let position = self.unresolved.len();
                self.unresolved.push((segment, index));
                self.unresolved_names.entry(name).or_default().push(position);
            }
        }
    }

    /// Report every reference that never found a definition, once per
    /// distinct name, anchored at its first occurrence.
    fn finish_unresolved(&mut self) {
        let mut seen = HashSet::new();
        let mut reports = Vec::new();
        for &(segment, index) in &self.unresolved {
            let token = &self.info.segments[segment.index()][index];
            if let TokenAnnotation::String(_) = token.annotation {
                let name = token.text(&self.source).to_string();
                if seen.insert(name) {
                    reports.push(Report::error(token.span, Diagnosis::UnresolvedLabelReference));
                }
            }
        }
        self.emit_all(reports);
    }
}
