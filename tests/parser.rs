use clasm::assembly::{DataType, Instruction, Mnemonic, OperandType, Segment};
use clasm::diagnostic::{AnyOfExpect, Diagnosis, Expected};
use clasm::source::Span;
use clasm::token::{TokenAnnotation, TokenType};

mod util;
use util::{parse, parse_forced};

fn header_expectations() -> Expected {
    Expected::AnyOf(vec![
        AnyOfExpect::Type(TokenType::EndOfFile),
        AnyOfExpect::Type(TokenType::EndOfLine),
        AnyOfExpect::Type(TokenType::Identifier),
        AnyOfExpect::Type(TokenType::Segment),
    ])
}

fn code_expectations() -> Expected {
    Expected::AnyOf(vec![
        AnyOfExpect::Type(TokenType::EndOfFile),
        AnyOfExpect::Type(TokenType::EndOfLine),
        AnyOfExpect::Type(TokenType::Identifier),
        AnyOfExpect::Type(TokenType::Label),
        AnyOfExpect::Type(TokenType::Segment),
    ])
}

fn data_expectations() -> Expected {
    Expected::AnyOf(vec![
        AnyOfExpect::Type(TokenType::EndOfFile),
        AnyOfExpect::Type(TokenType::EndOfLine),
        AnyOfExpect::Type(TokenType::Label),
        AnyOfExpect::Type(TokenType::Segment),
    ])
}

// ============================================================================
// Start-of-line expectations
// ============================================================================

#[test]
fn test_header_expects_identifier_or_segment() {
    let result = parse("\"string\"");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::ExpectedToken { given: TokenType::String, expected: header_expectations() }
    );
}

#[test]
fn test_code_expects_identifier_label_or_segment() {
    let result = parse(".code\n\"string\"");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::ExpectedToken { given: TokenType::String, expected: code_expectations() }
    );
}

#[test]
fn test_data_expects_label_or_segment() {
    let result = parse(".data\n\"string\"");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::ExpectedToken { given: TokenType::String, expected: data_expectations() }
    );
}

#[test]
fn test_data_rejects_instructions() {
    let result = parse(".data\nnop");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::ExpectedToken { given: TokenType::Instruction, expected: data_expectations() }
    );
}

// ============================================================================
// Segments
// ============================================================================

#[test]
fn test_segment_switching() {
    let result = parse(".data\n.code\nnop");
    assert!(result.ok(), "unexpected errors: {:?}", result.reports);
    // The directive belongs to the segment it closes.
    let header = result.info.tokens(Segment::Header);
    assert_eq!(header[0].annotation, TokenAnnotation::Segment(Segment::Data));
    let data = result.info.tokens(Segment::Data);
    assert_eq!(data[0].annotation, TokenAnnotation::Segment(Segment::Code));
    let code = result.info.tokens(Segment::Code);
    assert_eq!(code[0].annotation, TokenAnnotation::Instruction(Instruction::NOP));
}

#[test]
fn test_invalid_segment() {
    let result = parse(".bogus\n");
    assert_eq!(result.num_errors, 1);
    assert_eq!(result.reports[0].diagnosis, Diagnosis::InvalidSegment);
}

#[test]
fn test_expected_eol_after_segment() {
    let result = parse(".code 1");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::ExpectedToken {
            given: TokenType::Numeric,
            expected: Expected::Type(TokenType::EndOfLine),
        }
    );
}

#[test]
fn test_unexpected_segment_after_tokens() {
    let result = parse_forced("nop .code");
    assert_eq!(result.num_errors, 1);
    assert_eq!(result.reports[0].diagnosis, Diagnosis::UnexpectedSegmentAfterTokens);
}

// ============================================================================
// Every stream ends on a boundary token
// ============================================================================

#[test]
fn test_streams_end_with_boundary() {
    let result = parse(".data\nvalue: db 1\n.code\nnop\n");
    assert!(result.ok());
    for segment in [Segment::Header, Segment::Data, Segment::String, Segment::Code] {
        let tokens = result.info.tokens(segment);
        if let Some(last) = tokens.last() {
            assert!(
                last.kind == TokenType::EndOfLine || last.kind == TokenType::EndOfFile,
                "{segment:?} stream ends with {:?}",
                last.kind
            );
        }
    }
}

// ============================================================================
// Labels
// ============================================================================

#[test]
fn test_label_definition() {
    let result = parse(".code\nlabel: nop");
    assert!(result.ok(), "unexpected errors: {:?}", result.reports);
    let tokens = result.info.tokens(Segment::Code);
    assert_eq!(tokens[0].kind, TokenType::Label);
    assert_eq!(tokens[0].text(&result.info.source), "label:");
    assert_eq!(tokens[0].annotation, TokenAnnotation::LabelDef(0));
    //
    let id = result.info.label_map["label"];
    let label = &result.info.labels[id];
    assert_eq!(label.name, "label");
    assert_eq!(label.segment, Segment::Code);
    assert_eq!(label.span, tokens[0].span);
}

#[test]
fn test_label_reference() {
    let result = parse(".code\nlabel: jmp label");
    assert!(result.ok(), "unexpected errors: {:?}", result.reports);
    let tokens = result.info.tokens(Segment::Code);
    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[1].annotation, TokenAnnotation::Instruction(Instruction::JMPD));
    assert_eq!(tokens[2].kind, TokenType::LabelRef);
    assert_eq!(tokens[2].annotation, TokenAnnotation::LabelRef(0));
}

#[test]
fn test_label_forward_reference() {
    let result = parse(".code\njmp label\nlabel:");
    assert!(result.ok(), "unexpected errors: {:?}", result.reports);
    let tokens = result.info.tokens(Segment::Code);
    assert_eq!(tokens[1].kind, TokenType::LabelRef);
    assert_eq!(tokens[1].annotation, TokenAnnotation::LabelRef(0));
    assert_eq!(tokens[3].annotation, TokenAnnotation::LabelDef(0));
}

#[test]
fn test_label_redefinition() {
    let result = parse(".code\nfoo:\nfoo:\n");
    assert_eq!(result.num_errors, 1);
    // The report covers the second definition and references the
    // first.
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::LabelRedefinition { original: Span::new(6, 10) }
    );
    assert_eq!(result.info.source.text(result.reports[0].span), "foo:");
    assert_eq!(result.reports[0].span, Span::new(11, 15));
}

#[test]
fn test_unresolved_label_reference() {
    let result = parse(".code\njmp ghost");
    assert_eq!(result.num_errors, 1);
    assert_eq!(result.reports[0].diagnosis, Diagnosis::UnresolvedLabelReference);
    let tokens = result.info.tokens(Segment::Code);
    assert_eq!(tokens[1].kind, TokenType::LabelRef);
    assert_eq!(tokens[1].annotation, TokenAnnotation::String(b"ghost".to_vec()));
}

#[test]
fn test_unresolved_reported_once_per_name() {
    let result = parse(".code\njmp ghost\njmp ghost\ncall ghost");
    assert_eq!(result.num_errors, 1);
    assert_eq!(result.reports[0].diagnosis, Diagnosis::UnresolvedLabelReference);
}

#[test]
fn test_unexpected_label_after_tokens() {
    let result = parse_forced(".code\nnop label:");
    assert_eq!(result.num_errors, 1);
    assert_eq!(result.reports[0].diagnosis, Diagnosis::UnexpectedLabelAfterTokens);
}

// ============================================================================
// Mnemonic resolution
// ============================================================================

fn resolved_instruction(line: &str) -> TokenAnnotation {
    let result = parse(&format!(".code\n{line}"));
    assert!(result.ok(), "unexpected errors: {:?}", result.reports);
    result.info.tokens(Segment::Code)[0].annotation.clone()
}

#[test]
fn test_push_resolution_by_width() {
    assert_eq!(resolved_instruction("push"), TokenAnnotation::Instruction(Instruction::PUSHN));
    assert_eq!(
        resolved_instruction("push 0xFF"),
        TokenAnnotation::Instruction(Instruction::PUSHB)
    );
    assert_eq!(
        resolved_instruction("push 0xFFFF"),
        TokenAnnotation::Instruction(Instruction::PUSHW)
    );
    assert_eq!(
        resolved_instruction("push 0xFFFFFFFF"),
        TokenAnnotation::Instruction(Instruction::PUSHD)
    );
    assert_eq!(
        resolved_instruction("push 0xFFFFFFFFFF"),
        TokenAnnotation::Instruction(Instruction::PUSHQ)
    );
}

#[test]
fn test_negative_magnitude_widens() {
    // The magnitude 2^31 exceeds int32, so the literal lands on int64.
    let result = parse(".code\npush -0x80000000");
    assert!(result.ok(), "unexpected errors: {:?}", result.reports);
    let tokens = result.info.tokens(Segment::Code);
    assert_eq!(tokens[0].annotation, TokenAnnotation::Instruction(Instruction::PUSHQ));
    assert_eq!(tokens[1].annotation, TokenAnnotation::I64(-0x80000000));
}

#[test]
fn test_jmp_resolution() {
    assert_eq!(resolved_instruction("jmp"), TokenAnnotation::Instruction(Instruction::JMP));
    assert_eq!(
        resolved_instruction("jmp somewhere\nsomewhere:"),
        TokenAnnotation::Instruction(Instruction::JMPD)
    );
}

#[test]
fn test_dup_and_call_resolution() {
    assert_eq!(resolved_instruction("dup"), TokenAnnotation::Instruction(Instruction::DUP));
    assert_eq!(resolved_instruction("dup 3"), TokenAnnotation::Instruction(Instruction::DUPE));
    assert_eq!(resolved_instruction("call"), TokenAnnotation::Instruction(Instruction::CALL));
}

#[test]
fn test_unresolvable_mnemonic_operands() {
    // No overload of pop survives a 16-bit literal: the immediate
    // form overflows and the variable forms are reserved.
    let result = parse_forced("pop 300");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::InvalidMnemonicOperands { mnemonic: Mnemonic::POP }
    );
}

#[test]
fn test_variadic_switch() {
    let result = parse(".code\nswitch 2 10 20");
    assert!(result.ok(), "unexpected errors: {:?}", result.reports);
    let tokens = result.info.tokens(Segment::Code);
    assert_eq!(tokens[0].annotation, TokenAnnotation::Instruction(Instruction::SWITCH));
    assert_eq!(tokens[1].annotation, TokenAnnotation::I8(2));
    assert_eq!(tokens[2].annotation, TokenAnnotation::I8(10));
    assert_eq!(tokens[3].annotation, TokenAnnotation::I8(20));
}

// ============================================================================
// Operand checking
// ============================================================================

#[test]
fn test_instruction_passed_as_operand() {
    let result = parse_forced("nop nop");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::UnexpectedOperand {
            encountered: Some(TokenType::Instruction),
            num_expected: 0,
            num_given: 1,
        }
    );
    assert_eq!(
        result.reports[0].diagnosis.message(&result.info.source),
        "unexpected instruction encountered, use ',' to separate multiple instructions on one \
         line"
    );
}

#[test]
fn test_missing_operand() {
    let result = parse_forced("pushb");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::MissingOperand { operand: OperandType::IMM8 }
    );
}

#[test]
fn test_invalid_operand_type() {
    let result = parse_forced("pushb \"str\"");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::InvalidOperandType { operand: OperandType::IMM8 }
    );
}

#[test]
fn test_operand_size_overflow() {
    let result = parse_forced("pushb 0x100");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::LiteralValueSizeOverflow { operand: OperandType::IMM8 }
    );
}

#[test]
fn test_reserved_variable_operands_fail_closed() {
    let result = parse_forced("popl 1");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::InvalidOperandType { operand: OperandType::LV16 }
    );
}

// ============================================================================
// Keywords
// ============================================================================

#[test]
fn test_global_keyword() {
    let result = parse("global main\n.code\nmain:");
    assert!(result.ok(), "unexpected errors: {:?}", result.reports);
    let header = result.info.tokens(Segment::Header);
    assert_eq!(header[0].kind, TokenType::Keyword);
    assert_eq!(header[1].kind, TokenType::LabelRef);
    assert_eq!(header[1].annotation, TokenAnnotation::LabelRef(0));
    assert_eq!(result.info.labels[0].name, "main");
}

#[test]
fn test_global_requires_arguments() {
    let result = parse("global\n");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::ExpectedToken {
            given: TokenType::EndOfLine,
            expected: Expected::Type(TokenType::Label),
        }
    );
}

#[test]
fn test_reserved_keywords() {
    let result = parse("extern thing\n");
    assert_eq!(result.num_errors, 1);
    assert_eq!(result.reports[0].diagnosis, Diagnosis::InvalidIdentifier);
}

// ============================================================================
// Data segment
// ============================================================================

#[test]
fn test_data_byte_declaration() {
    let result = parse(".data\nBYTE_VALUE: DB 0xFF");
    assert!(result.ok(), "unexpected errors: {:?}", result.reports);
    let tokens = result.info.tokens(Segment::Data);
    assert_eq!(tokens[0].kind, TokenType::Label);
    assert_eq!(tokens[1].kind, TokenType::DataType);
    assert_eq!(tokens[1].annotation, TokenAnnotation::DataType(DataType::DB));
    assert_eq!(tokens[2].kind, TokenType::Numeric);
    assert_eq!(tokens[2].annotation, TokenAnnotation::U8(0xFF));
    assert_eq!(result.info.labels[0].segment, Segment::Data);
}

#[test]
fn test_data_value_list() {
    let result = parse(".data\nwords: dw 1, 0x8081");
    assert!(result.ok(), "unexpected errors: {:?}", result.reports);
    let tokens = result.info.tokens(Segment::Data);
    assert_eq!(tokens[2].annotation, TokenAnnotation::I8(1));
    assert_eq!(tokens[3].annotation, TokenAnnotation::U16(0x8081));
}

#[test]
fn test_data_string_declaration() {
    let result = parse(".data\nmsg: ds \"hi\"");
    assert!(result.ok(), "unexpected errors: {:?}", result.reports);
    let tokens = result.info.tokens(Segment::Data);
    assert_eq!(tokens[1].annotation, TokenAnnotation::DataType(DataType::DS));
    assert_eq!(tokens[2].annotation, TokenAnnotation::String(b"hi".to_vec()));
}

#[test]
fn test_data_declaration_requires_type() {
    let result = parse(".data\nvalue: 1");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::ExpectedToken {
            given: TokenType::Numeric,
            expected: Expected::Type(TokenType::DataType),
        }
    );
}

#[test]
fn test_data_width_overflow() {
    let result = parse(".data\nbyte: db 0x100");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::LiteralValueSizeOverflow { operand: OperandType::IMM8 }
    );
}

#[test]
fn test_data_type_mismatch() {
    let result = parse(".data\nbyte: db \"x\"");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::InvalidOperandType { operand: OperandType::IMM8 }
    );
}

// ============================================================================
// Strings and escapes
// ============================================================================

fn string_annotation(literal: &str) -> TokenAnnotation {
    let result = parse_forced(literal);
    let tokens = result.info.tokens(Segment::Header);
    assert_eq!(tokens[0].kind, TokenType::String);
    tokens[0].annotation.clone()
}

#[test]
fn test_simple_escapes() {
    assert_eq!(
        string_annotation("\"a\\n\\t\\r\\\\\\\"b\""),
        TokenAnnotation::String(b"a\n\t\r\\\"b".to_vec())
    );
}

#[test]
fn test_hex_escape_single_pair() {
    assert_eq!(string_annotation("\"\\x41\""), TokenAnnotation::String(b"A".to_vec()));
}

#[test]
fn test_hex_escape_single_digit() {
    assert_eq!(string_annotation("\"\\x9\""), TokenAnnotation::String(b"\x09".to_vec()));
}

#[test]
fn test_hex_escape_multi_byte() {
    // The value is emitted little-endian in as few bytes as it needs.
    assert_eq!(
        string_annotation("\"\\x4142\""),
        TokenAnnotation::String(b"\x42\x41".to_vec())
    );
    assert_eq!(
        string_annotation("\"\\x41424344\""),
        TokenAnnotation::String(b"\x44\x43\x42\x41".to_vec())
    );
}

#[test]
fn test_hex_escape_odd_digits_round_up() {
    assert_eq!(
        string_annotation("\"\\x414\""),
        TokenAnnotation::String(b"\x14\x04".to_vec())
    );
}

#[test]
fn test_hex_escape_backslash_terminator() {
    // A backslash straight after the digits closes the sequence; the
    // following characters are literal.
    assert_eq!(
        string_annotation("\"\\x4142\\CD\""),
        TokenAnnotation::String(b"\x42\x41CD".to_vec())
    );
}

#[test]
fn test_hex_escape_empty() {
    let result = parse_forced("\"\\xzz\"");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::InvalidHexEscapeSequence {
            problem: clasm::diagnostic::HexEscapeProblem::NoHexChars,
        }
    );
}

#[test]
fn test_hex_escape_out_of_range() {
    let result = parse_forced("\"\\x123456789\"");
    assert_eq!(result.num_errors, 1);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::InvalidHexEscapeSequence {
            problem: clasm::diagnostic::HexEscapeProblem::OutOfRange,
        }
    );
    // The first eight digits still emit.
    let tokens = result.info.tokens(Segment::Header);
    assert_eq!(tokens[0].annotation, TokenAnnotation::String(b"\x78\x56\x34\x12".to_vec()));
}

#[test]
fn test_unknown_escape_kept_literally() {
    let result = parse_forced("\"\\z\"");
    assert_eq!(result.num_errors, 0);
    assert_eq!(result.num_warnings, 1);
    assert_eq!(result.reports[0].diagnosis, Diagnosis::InvalidEscapeSequence);
    let tokens = result.info.tokens(Segment::Header);
    assert_eq!(tokens[0].annotation, TokenAnnotation::String(b"z".to_vec()));
}

#[test]
fn test_string_round_trips() {
    for text in ["", "plain", "with space", "punctuation!#%"] {
        assert_eq!(
            string_annotation(&format!("\"{text}\"")),
            TokenAnnotation::String(text.as_bytes().to_vec())
        );
    }
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_custom_reporter_sink() {
    use std::cell::RefCell;
    use std::rc::Rc;
    // A caller-supplied sink observes every report as it is raised.
    let codes = Rc::new(RefCell::new(Vec::new()));
    let sink_codes = codes.clone();
    let options = clasm::parser::Options {
        reporter: clasm::reporter::Reporter::with_sink(move |data| {
            sink_codes.borrow_mut().push(data.report.diagnosis.code());
        }),
        error_reporting: false,
        test_force_tokenization: false,
    };
    let result = clasm::parser::tokenize(&options, util::new_source(".code\njmp ghost"));
    assert_eq!(result.num_errors, 1);
    assert_eq!(*codes.borrow(), vec![2019]);
}

#[test]
fn test_unexpected_lexeme_is_fatal() {
    let result = parse_forced("`123");
    assert!(result.had_fatal);
    assert_eq!(result.num_errors, 1);
    assert_eq!(result.reports[0].diagnosis, Diagnosis::UnexpectedLexeme);
}

#[test]
fn test_unexpected_separator() {
    let result = parse_forced(":");
    assert_eq!(result.num_errors, 1);
    assert_eq!(result.reports[0].diagnosis, Diagnosis::UnexpectedSeparator);
}

#[test]
fn test_invalid_identifier() {
    let result = parse("blahdyblahbloo");
    assert_eq!(result.num_errors, 1);
    assert_eq!(result.reports[0].diagnosis, Diagnosis::InvalidIdentifier);
}

#[test]
fn test_errors_do_not_stop_later_lines() {
    // The bad line reports, then parsing carries on and still sees
    // the unresolved reference at the end.
    let result = parse(".code\npushb 0x100\njmp ghost");
    assert_eq!(result.num_errors, 2);
    assert_eq!(
        result.reports[0].diagnosis,
        Diagnosis::LiteralValueSizeOverflow { operand: OperandType::IMM8 }
    );
    assert_eq!(result.reports[1].diagnosis, Diagnosis::UnresolvedLabelReference);
}
