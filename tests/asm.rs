use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clasm::compiler;
use clasm::parser;
use clasm::source::Source;
use clasm::util::FromHexString;

pub static TESTS_DIR: &str = "tests/files";

// Include the programmatically generated test file.
include!(concat!(env!("OUT_DIR"), "/asm_tests.rs"));

/// Run a specific test by loading the assembly file out of the
/// reference tests directory, assembling it, and comparing the bytes
/// against the recorded hex image.
fn check(test: &str) {
    // Construct input files
    let asmfile = to_asmfile(test);
    let hexfile = to_hexfile(test);
    // Read the test file
    let asm = fs::read_to_string(asmfile).unwrap();
    let hex = fs::read_to_string(hexfile).unwrap();
    // Parse assembly into token streams
    let source = Arc::new(Source::new(test, &asm).unwrap());
    let options = parser::Options { error_reporting: false, ..Default::default() };
    let mut parsed = parser::tokenize(&options, source);
    assert!(parsed.ok(), "parse errors in {test}: {:?}", parsed.reports);
    // Translate token streams into bytes
    let copts = compiler::Options { error_reporting: false, ..Default::default() };
    let mut asm_bytes: Vec<u8> = Vec::new();
    let compiled = compiler::compile(&copts, &mut parsed.info, &mut asm_bytes);
    assert!(compiled.ok(), "compile errors in {test}: {:?}", compiled.reports);
    // Parse hex string into bytes
    let hex_bytes = hex.trim().from_hex_string().unwrap();
    // Check they match
    assert_eq!(asm_bytes, hex_bytes);
}

fn to_asmfile(test: &str) -> PathBuf {
    let mut path = PathBuf::from(TESTS_DIR);
    path.push(test.to_string());
    path.set_extension("asm");
    path
}

fn to_hexfile(test: &str) -> PathBuf {
    let mut path = PathBuf::from(TESTS_DIR);
    path.push(test.to_string());
    path.set_extension("hex");
    path
}
