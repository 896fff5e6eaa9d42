/// Closed vocabularies of the assembly language: keywords, segments,
/// mnemonics, instructions (and their opcodes), data types, and the
/// operand-shape tables driving mnemonic resolution.
pub mod assembly;
/// The bytecode emitter.  Walks the parsed token streams per segment,
/// assigns label offsets, and writes the flat little-endian byte
/// image.
pub mod compiler;
/// Typed diagnostic codes with structured payloads, together with the
/// token expectations the parser checks between lines.
pub mod diagnostic;
/// The two-phase parser: lexical rules, the token classifier, the
/// line-assembler state machine, mnemonic resolution and the label
/// table.
pub mod parser;
/// Report severities and sinks, including the default console
/// renderer.
pub mod reporter;
/// Source indexing: byte offset to line/column lookup over an
/// immutable source unit.
pub mod source;
/// Tokens and their annotations.
pub mod token;
pub mod util;
