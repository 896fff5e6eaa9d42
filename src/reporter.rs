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

use colored::{ColoredString, Colorize};

use crate::diagnostic::Diagnosis;
use crate::source::{Source, Span};

// ============================================================================
// Severity
// ============================================================================

/// The severity of a report.  `Fatal` terminates parsing at the next
/// safe point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Report
// ============================================================================

/// A single diagnostic report: a severity, the span of the offending
/// source text, and the diagnosis itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub severity: Severity,
    pub span: Span,
    pub diagnosis: Diagnosis,
}

impl Report {
    pub fn info(span: Span, diagnosis: Diagnosis) -> Report {
        Report { severity: Severity::Info, span, diagnosis }
    }

    pub fn warning(span: Span, diagnosis: Diagnosis) -> Report {
        Report { severity: Severity::Warning, span, diagnosis }
    }

    pub fn error(span: Span, diagnosis: Diagnosis) -> Report {
        Report { severity: Severity::Error, span, diagnosis }
    }

    pub fn fatal(span: Span, diagnosis: Diagnosis) -> Report {
        Report { severity: Severity::Fatal, span, diagnosis }
    }
}

// ============================================================================
// Reporter
// ============================================================================

/// The payload handed to a reporter sink.
pub struct ReportData<'a> {
    pub severity: Severity,
    pub source: &'a Source,
    pub report: &'a Report,
}

pub type ReporterFn = Box<dyn Fn(&ReportData)>;

/// A sink for reports.  A reporter without a sink swallows everything,
/// which is what test code wants.
pub struct Reporter {
    sink: Option<ReporterFn>,
}

impl Reporter {
    pub fn new() -> Self {
        Self { sink: None }
    }

    pub fn with_sink(sink: impl Fn(&ReportData) + 'static) -> Self {
        Self { sink: Some(Box::new(sink)) }
    }

    /// The default reporter: renders each report to standard output
    /// with the offending line underlined.
    pub fn console() -> Self {
        Self::with_sink(render_report)
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn report(&self, source: &Source, report: &Report) {
        if let Some(sink) = &self.sink {
            sink(&ReportData { severity: report.severity, source, report });
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Console renderer
// ============================================================================

fn paint(severity: Severity, text: &str) -> ColoredString {
    match severity {
        Severity::Error | Severity::Fatal => text.red(),
        Severity::Warning => text.yellow(),
        Severity::Info => text.cyan(),
    }
}

fn render_report(data: &ReportData) {
    let source = data.source;
    let report = data.report;
    let diagnosis = &report.diagnosis;
    let line = source.line_info(source.line_index_by_offset(report.span.start));
    let column = source.column_by_offset(report.span.start);
    let line_num = line.number.to_string();
    let gutter = " ".repeat(line_num.len());
    //
    let head = format!("{}[E{:04}]", report.severity, diagnosis.code());
    println!("{}{} {}", paint(report.severity, &head).bold(), ":".bold(), diagnosis.name().bold());
    println!("{} {} {}:{}:{}", gutter, "-->".blue(), source.name(), line.number, column);
    //
    let text = source.get_text(line.offset, line.length).unwrap_or("");
    println!("{} {}  {}", line_num.blue(), "|".blue(), text);
    // Underline the offending token, clamped to its line.
    let width = report
        .span
        .len()
        .min((line.offset + line.length).saturating_sub(report.span.start))
        .max(1);
    let padding = " ".repeat(column.saturating_sub(1));
    println!(
        "{} {}  {}{} {}",
        gutter,
        "|".blue(),
        padding,
        paint(report.severity, &"^".repeat(width)),
        paint(report.severity, &diagnosis.message(source))
    );
    println!();
}
