#![allow(dead_code)]
use std::sync::Arc;

use clasm::compiler;
use clasm::parser::{self, Options, ParseResult};
use clasm::source::Source;

/// Build parser options suitable for tests: reporting to stdout is
/// disabled as it would mess with test output.
pub fn parse_opts(force_tokenization: bool) -> Options {
    Options {
        error_reporting: false,
        test_force_tokenization: force_tokenization,
        ..Default::default()
    }
}

pub fn new_source(code: &str) -> Arc<Source> {
    Arc::new(Source::new("test", code).unwrap())
}

/// Parse a code string with full error checking enabled.
pub fn parse(code: &str) -> ParseResult {
    parser::tokenize(&parse_opts(false), new_source(code))
}

/// Parse a code string with forced tokenization, for assertions over
/// the raw token stream.
pub fn parse_forced(code: &str) -> ParseResult {
    parser::tokenize(&parse_opts(true), new_source(code))
}

/// Parse and compile a code string, asserting both stages succeed.
pub fn assemble(code: &str) -> Vec<u8> {
    let mut result = parse(code);
    assert!(result.ok(), "parse errors: {:?}", result.reports);
    compile(&mut result)
}

/// Compile an already-parsed result into its byte image.
pub fn compile(result: &mut ParseResult) -> Vec<u8> {
    let options =
        compiler::Options { error_reporting: false, ..Default::default() };
    let mut bytes: Vec<u8> = Vec::new();
    let compiled = compiler::compile(&options, &mut result.info, &mut bytes);
    assert!(compiled.ok(), "compile errors: {:?}", compiled.reports);
    bytes
}
