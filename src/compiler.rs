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
use crate::diagnostic::Diagnosis;
use crate::parser::ParseInfo;
use crate::reporter::{Report, Reporter};
use crate::token::{TokenAnnotation, TokenType};

// ============================================================================
// Binary output
// ============================================================================

/// A sink for emitted bytes.  Every multi-byte write is little-endian
/// regardless of host byte order.
pub trait BinaryOutput {
    fn write_bytes(&mut self, bytes: &[u8]);

    fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    fn write_i8(&mut self, value: i8) {
        self.write_bytes(&value.to_le_bytes());
    }

    fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    fn write_i16(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    fn write_i64(&mut self, value: i64) {
        self.write_bytes(&value.to_le_bytes());
    }

    fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    fn write_f64(&mut self, value: f64) {
        self.write_bytes(&value.to_le_bytes());
    }
}

impl BinaryOutput for Vec<u8> {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

// ============================================================================
// Options
// ============================================================================

/// Configuration for a compile invocation.
pub struct Options {
    pub reporter: Reporter,
    pub error_reporting: bool,
    /// Emits placeholder bytes instead of erroring on references the
    /// parse left unresolved.
    pub test_force_compilation: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { reporter: Reporter::new(), error_reporting: true, test_force_compilation: false }
    }
}

// ============================================================================
// Result
// ============================================================================

pub struct CompileResult {
    pub reports: Vec<Report>,
    pub num_errors: usize,
}

impl CompileResult {
    pub fn ok(&self) -> bool {
        self.num_errors == 0
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// Segments are emitted in a fixed order; the header never emits.
const EMIT_ORDER: [Segment; 2] = [Segment::Data, Segment::Code];

/// Emit the parsed token streams as a flat byte image.  The first
/// pass walks the segments assigning each label the output offset of
/// its defining token; the second pass writes the bytes, by which
/// point every reference resolves to a final offset.
pub fn compile(
    options: &Options,
    info: &mut ParseInfo,
    out: &mut dyn BinaryOutput,
) -> CompileResult {
    let console = if !options.reporter.has_sink() && options.error_reporting {
        Some(Reporter::console())
    } else {
        None
    };
    let mut result = CompileResult { reports: Vec::new(), num_errors: 0 };
    //
    // First pass: assign label offsets by size accounting alone.
    let mut offset: u32 = 0;
    for segment in EMIT_ORDER {
        for token in &info.segments[segment.index()] {
            match token.annotation {
                TokenAnnotation::LabelDef(id) => {
                    // Only the defining occurrence assigns the offset.
                    if info.labels[id].span == token.span {
                        info.labels[id].offset = offset;
                    }
                }
                _ => offset += token.annotation.size() as u32,
            }
        }
    }
    //
    // Second pass: write the bytes.
    for segment in EMIT_ORDER {
        for token in &info.segments[segment.index()] {
            match &token.annotation {
                TokenAnnotation::I8(value) => out.write_i8(*value),
                TokenAnnotation::U8(value) => out.write_u8(*value),
                TokenAnnotation::I16(value) => out.write_i16(*value),
                TokenAnnotation::U16(value) => out.write_u16(*value),
                TokenAnnotation::I32(value) => out.write_i32(*value),
                TokenAnnotation::U32(value) => out.write_u32(*value),
                TokenAnnotation::I64(value) => out.write_i64(*value),
                TokenAnnotation::U64(value) => out.write_u64(*value),
                TokenAnnotation::F32(value) => out.write_f32(*value),
                TokenAnnotation::F64(value) => out.write_f64(*value),
                TokenAnnotation::Instruction(instruction) => out.write_u8(instruction.opcode()),
                TokenAnnotation::LabelRef(id) => out.write_u32(info.labels[*id].offset),
                TokenAnnotation::String(bytes) => {
                    if token.kind == TokenType::LabelRef {
                        // The parse left this reference unresolved.
                        if options.test_force_compilation {
                            out.write_u32(0);
                        } else {
                            let report =
                                Report::error(token.span, Diagnosis::UnresolvedLabelReference);
                            let reporter = console.as_ref().unwrap_or(&options.reporter);
                            reporter.report(&info.source, &report);
                            result.num_errors += 1;
                            result.reports.push(report);
                        }
                    } else {
                        out.write_bytes(bytes);
                    }
                }
                TokenAnnotation::LabelDef(_)
                | TokenAnnotation::Keyword(_)
                | TokenAnnotation::Segment(_)
                | TokenAnnotation::Mnemonic(_)
                | TokenAnnotation::DataType(_)
                | TokenAnnotation::None => {}
            }
        }
    }
    result
}
