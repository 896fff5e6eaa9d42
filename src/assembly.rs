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

// ============================================================================
// Operand Types
// ============================================================================

/// The static expectation a concrete instruction places on a single
/// operand token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandType {
    /// Immediate integer, emitted at the given width little-endian.
    IMM8,
    IMM16,
    IMM32,
    IMM64,
    /// Local variable index (reserved).
    LV8,
    LV16,
    LV32,
    /// Global variable index (reserved).
    V16,
    V32,
    /// String index.
    S32,
    /// 32-bit relative offset, always a label reference.
    REL32,
}

impl fmt::Display for OperandType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            OperandType::IMM8 => "immediate 8-bit value",
            OperandType::IMM16 => "immediate 16-bit value",
            OperandType::IMM32 => "immediate 32-bit value",
            OperandType::IMM64 => "immediate 64-bit value",
            OperandType::LV8 | OperandType::LV16 | OperandType::LV32 => "local variable",
            OperandType::V16 | OperandType::V32 => "global variable",
            OperandType::S32 => "string",
            OperandType::REL32 => "32-bit offset",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Keywords
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Global,
    Extern,
    Import,
    Include,
}

impl Keyword {
    pub fn from_name(name: &str) -> Option<Keyword> {
        match name {
            "global" => Some(Keyword::Global),
            "extern" => Some(Keyword::Extern),
            "import" => Some(Keyword::Import),
            "include" => Some(Keyword::Include),
            _ => None,
        }
    }
}

// ============================================================================
// Segments
// ============================================================================

/// A named output section.  `Header` is implicit before the first
/// segment directive; `String` is reserved for deduplicated literals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    Header,
    Data,
    String,
    Code,
}

impl Segment {
    /// The number of distinct segments (for per-segment storage).
    pub const COUNT: usize = 4;

    pub fn from_name(name: &str) -> Option<Segment> {
        match name {
            "code" => Some(Segment::Code),
            "data" => Some(Segment::Data),
            _ => None,
        }
    }

    /// Index of this segment into per-segment storage.
    pub fn index(self) -> usize {
        match self {
            Segment::Header => 0,
            Segment::Data => 1,
            Segment::String => 2,
            Segment::Code => 3,
        }
    }
}

// ============================================================================
// Data Types
// ============================================================================

/// Element declarations available in the data segment.  The data type
/// bounds the width of each value on its line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    DB,
    DW,
    DD,
    DQ,
    DF,
    DS,
}

impl DataType {
    /// Data type names are matched case-insensitively.
    pub fn from_name(name: &str) -> Option<DataType> {
        if name.eq_ignore_ascii_case("db") {
            Some(DataType::DB)
        } else if name.eq_ignore_ascii_case("dw") {
            Some(DataType::DW)
        } else if name.eq_ignore_ascii_case("dd") {
            Some(DataType::DD)
        } else if name.eq_ignore_ascii_case("dq") {
            Some(DataType::DQ)
        } else if name.eq_ignore_ascii_case("df") {
            Some(DataType::DF)
        } else if name.eq_ignore_ascii_case("ds") {
            Some(DataType::DS)
        } else {
            None
        }
    }

    /// The operand expectation each value of this declaration must
    /// satisfy.
    pub fn operand_type(self) -> OperandType {
        match self {
            DataType::DB => OperandType::IMM8,
            DataType::DW => OperandType::IMM16,
            DataType::DD => OperandType::IMM32,
            DataType::DQ => OperandType::IMM64,
            DataType::DF => OperandType::IMM32,
            DataType::DS => OperandType::S32,
        }
    }
}

// ============================================================================
// Instructions
// ============================================================================

/// A concrete instruction.  The opcode of each instruction is its
/// discriminant, assigned in declaration order from zero.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    // Misc
    NOP,
    BREAK,
    THROW,
    // Stack Manipulation
    PUSHN,
    PUSHB,
    PUSHW,
    PUSHD,
    PUSHQ,
    PUSHF,
    PUSHQF,
    PUSHAB,
    PUSHAW,
    PUSHAD,
    PUSHAQ,
    PUSHAF,
    PUSHAQF,
    PUSHS,
    POP,
    POPLN,
    POPL,
    POPLE,
    POPV,
    POPVE,
    SWAP,
    DUP,
    DUPE,
    // Variable Access
    LOCAL,
    GLOBAL,
    ARRAY,
    // Arithmetic/Bitwise/Conversion Operations
    EXF,
    INC,
    DEC,
    ADD,
    SUB,
    MUL,
    DIV,
    MOD,
    NOT,
    AND,
    OR,
    XOR,
    SHL,
    SHR,
    NEG,
    TOI,
    TOF,
    // Comparison
    CMPNN,
    CMPE,
    CMPNE,
    CMPGE,
    CMPLE,
    CMPG,
    CMPL,
    IF,
    EVAL,
    // Branching
    JT,
    JNT,
    JMP,
    JMPD,
    SWITCH,
    RSWITCH,
    // Functions
    CALL,
    CALLD,
    ENTER,
    RET,
    // External Read / Write
    READ,
    WRITE,
    COPY,
    FILL,
    COMP,
    // External Calling
    NATIVE,
    CMD,
    CDECL,
    STDC,
    THISC,
    FASTC,
}

/// One operand slot of an instruction's shape.  A variadic slot
/// repeats its types until the input line is exhausted.
#[derive(Clone, Copy, Debug)]
pub struct InstructionOperand {
    pub types: &'static [OperandType],
    pub variadic: bool,
}

/// One row in a mnemonic's resolution table.
#[derive(Clone, Copy, Debug)]
pub struct InstructionOverload {
    pub instruction: Instruction,
    pub params: &'static [OperandType],
}

const NO_OPERANDS: &[InstructionOperand] = &[];
const OPERANDS_IMM8: &[InstructionOperand] =
    &[InstructionOperand { types: &[OperandType::IMM8], variadic: false }];
const OPERANDS_IMM16: &[InstructionOperand] =
    &[InstructionOperand { types: &[OperandType::IMM16], variadic: false }];
const OPERANDS_IMM32: &[InstructionOperand] =
    &[InstructionOperand { types: &[OperandType::IMM32], variadic: false }];
const OPERANDS_IMM64: &[InstructionOperand] =
    &[InstructionOperand { types: &[OperandType::IMM64], variadic: false }];
const OPERANDS_S32: &[InstructionOperand] =
    &[InstructionOperand { types: &[OperandType::S32], variadic: false }];
const OPERANDS_LV8: &[InstructionOperand] =
    &[InstructionOperand { types: &[OperandType::LV8], variadic: false }];
const OPERANDS_LV16: &[InstructionOperand] =
    &[InstructionOperand { types: &[OperandType::LV16], variadic: false }];
const OPERANDS_LV32: &[InstructionOperand] =
    &[InstructionOperand { types: &[OperandType::LV32], variadic: false }];
const OPERANDS_V16: &[InstructionOperand] =
    &[InstructionOperand { types: &[OperandType::V16], variadic: false }];
const OPERANDS_V32: &[InstructionOperand] =
    &[InstructionOperand { types: &[OperandType::V32], variadic: false }];
const OPERANDS_REL32: &[InstructionOperand] =
    &[InstructionOperand { types: &[OperandType::REL32], variadic: false }];
// A case count followed by the case table itself.
const OPERANDS_SWITCH: &[InstructionOperand] = &[
    InstructionOperand { types: &[OperandType::IMM16], variadic: false },
    InstructionOperand { types: &[OperandType::IMM32], variadic: true },
];

impl Instruction {
    /// The single-byte opcode of this instruction.
    pub fn opcode(self) -> u8 {
        self as u8
    }

    pub fn from_name(name: &str) -> Option<Instruction> {
        use Instruction::*;
        let insn = match name {
            // Misc
            "nop" => NOP,
            "break" => BREAK,
            "throw" => THROW,
            // Stack Manipulation
            "pushn" => PUSHN,
            "pushb" => PUSHB,
            "pushw" => PUSHW,
            "pushd" => PUSHD,
            "pushq" => PUSHQ,
            "pushf" => PUSHF,
            "pushqf" => PUSHQF,
            "pushab" => PUSHAB,
            "pushaw" => PUSHAW,
            "pushad" => PUSHAD,
            "pushaq" => PUSHAQ,
            "pushaf" => PUSHAF,
            "pushaqf" => PUSHAQF,
            "pushs" => PUSHS,
            "pop" => POP,
            "popln" => POPLN,
            "popl" => POPL,
            "pople" => POPLE,
            "popv" => POPV,
            "popve" => POPVE,
            "swap" => SWAP,
            "dup" => DUP,
            "dupe" => DUPE,
            // Variable Access
            "local" => LOCAL,
            "global" => GLOBAL,
            "array" => ARRAY,
            // Arithmetic/Bitwise/Conversion Operations
            "exf" => EXF,
            "inc" => INC,
            "dec" => DEC,
            "add" => ADD,
            "sub" => SUB,
            "mul" => MUL,
            "div" => DIV,
            "mod" => MOD,
            "not" => NOT,
            "and" => AND,
            "or" => OR,
            "xor" => XOR,
            "shl" => SHL,
            "shr" => SHR,
            "neg" => NEG,
            "toi" => TOI,
            "tof" => TOF,
            // Comparison
            "cmpnn" => CMPNN,
            "cmpe" => CMPE,
            "cmpne" => CMPNE,
            "cmpge" => CMPGE,
            "cmple" => CMPLE,
            "cmpg" => CMPG,
            "cmpl" => CMPL,
            "if" => IF,
            "eval" => EVAL,
            // Branching
            "jt" => JT,
            "jnt" => JNT,
            "jmp" => JMP,
            "jmpd" => JMPD,
            "switch" => SWITCH,
            "rswitch" => RSWITCH,
            // Functions
            "call" => CALL,
            "calld" => CALLD,
            "enter" => ENTER,
            "ret" => RET,
            // External Read / Write
            "read" => READ,
            "write" => WRITE,
            "copy" => COPY,
            "fill" => FILL,
            "comp" => COMP,
            // External Calling
            "native" => NATIVE,
            "cmd" => CMD,
            "cdecl" => CDECL,
            "stdc" => STDC,
            "thisc" => THISC,
            "fastc" => FASTC,
            //
            _ => {
                return None;
            }
        };
        Some(insn)
    }

    /// The operand shape of this instruction.
    pub fn operands(self) -> &'static [InstructionOperand] {
        use Instruction::*;
        match self {
            THROW | PUSHB | PUSHAB | POP | DUPE | ARRAY | EVAL | ENTER | READ | WRITE => {
                OPERANDS_IMM8
            }
            PUSHW | PUSHAW => OPERANDS_IMM16,
            PUSHD | PUSHAD | PUSHF | PUSHAF | NATIVE | CMD => OPERANDS_IMM32,
            PUSHQ | PUSHQF | PUSHAQ | PUSHAQF => OPERANDS_IMM64,
            PUSHS => OPERANDS_S32,
            POPLN => OPERANDS_LV8,
            POPL => OPERANDS_LV16,
            POPLE => OPERANDS_LV32,
            POPV => OPERANDS_V16,
            POPVE => OPERANDS_V32,
            JT | JNT | JMPD | CALLD => OPERANDS_REL32,
            SWITCH | RSWITCH => OPERANDS_SWITCH,
            _ => NO_OPERANDS,
        }
    }
}

// ============================================================================
// Mnemonics
// ============================================================================

/// An assembler shorthand which selects one of several concrete
/// instructions by the shape of its operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mnemonic {
    PUSH,
    PUSHA,
    POP,
    DUP,
    JMP,
    CALL,
}

static PUSH_OVERLOADS: &[InstructionOverload] = &[
    InstructionOverload { instruction: Instruction::PUSHN, params: &[] },
    InstructionOverload { instruction: Instruction::PUSHB, params: &[OperandType::IMM8] },
    InstructionOverload { instruction: Instruction::PUSHW, params: &[OperandType::IMM16] },
    InstructionOverload { instruction: Instruction::PUSHD, params: &[OperandType::IMM32] },
    InstructionOverload { instruction: Instruction::PUSHQ, params: &[OperandType::IMM64] },
    InstructionOverload { instruction: Instruction::PUSHF, params: &[OperandType::IMM32] },
    InstructionOverload { instruction: Instruction::PUSHQF, params: &[OperandType::IMM64] },
];

static PUSHA_OVERLOADS: &[InstructionOverload] = &[
    InstructionOverload { instruction: Instruction::PUSHAB, params: &[OperandType::IMM8] },
    InstructionOverload { instruction: Instruction::PUSHAW, params: &[OperandType::IMM16] },
    InstructionOverload { instruction: Instruction::PUSHAD, params: &[OperandType::IMM32] },
    InstructionOverload { instruction: Instruction::PUSHAQ, params: &[OperandType::IMM64] },
    InstructionOverload { instruction: Instruction::PUSHAF, params: &[OperandType::IMM32] },
    InstructionOverload { instruction: Instruction::PUSHAQF, params: &[OperandType::IMM64] },
];

static POP_OVERLOADS: &[InstructionOverload] = &[
    InstructionOverload { instruction: Instruction::POP, params: &[OperandType::IMM8] },
    InstructionOverload { instruction: Instruction::POPLN, params: &[OperandType::LV8] },
    InstructionOverload { instruction: Instruction::POPL, params: &[OperandType::LV16] },
    InstructionOverload { instruction: Instruction::POPLE, params: &[OperandType::LV32] },
    InstructionOverload { instruction: Instruction::POPV, params: &[OperandType::V16] },
    InstructionOverload { instruction: Instruction::POPVE, params: &[OperandType::V32] },
];

static DUP_OVERLOADS: &[InstructionOverload] = &[
    InstructionOverload { instruction: Instruction::DUP, params: &[] },
    InstructionOverload { instruction: Instruction::DUPE, params: &[OperandType::IMM8] },
];

static JMP_OVERLOADS: &[InstructionOverload] = &[
    InstructionOverload { instruction: Instruction::JMP, params: &[] },
    InstructionOverload { instruction: Instruction::JMPD, params: &[OperandType::REL32] },
];

static CALL_OVERLOADS: &[InstructionOverload] = &[
    InstructionOverload { instruction: Instruction::CALL, params: &[] },
    InstructionOverload { instruction: Instruction::CALLD, params: &[OperandType::REL32] },
];

impl Mnemonic {
    pub fn from_name(name: &str) -> Option<Mnemonic> {
        match name {
            "push" => Some(Mnemonic::PUSH),
            "pusha" => Some(Mnemonic::PUSHA),
            "pop" => Some(Mnemonic::POP),
            "dup" => Some(Mnemonic::DUP),
            "jmp" => Some(Mnemonic::JMP),
            "call" => Some(Mnemonic::CALL),
            _ => None,
        }
    }

    /// The resolution table for this mnemonic, ordered from narrowest
    /// operand to widest so that the first full bind selects the
    /// narrowest opcode.
    pub fn overloads(self) -> &'static [InstructionOverload] {
        match self {
            Mnemonic::PUSH => PUSH_OVERLOADS,
            Mnemonic::PUSHA => PUSHA_OVERLOADS,
            Mnemonic::POP => POP_OVERLOADS,
            Mnemonic::DUP => DUP_OVERLOADS,
            Mnemonic::JMP => JMP_OVERLOADS,
            Mnemonic::CALL => CALL_OVERLOADS,
        }
    }
}
