/// Bytecode opcodes.
///
/// Stack machine with a value register: most operators combine the popped
/// stack top with the register and leave the result in the register.
/// Operands: byte, two bytes (`lev off`, `rargc oargc`), or a little-endian
/// word (branch target or literal index).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Brt = 0x01,
    Brf = 0x02,
    Br = 0x03,
    T = 0x04,
    Nil = 0x05,
    Push = 0x06,
    Not = 0x07,
    Add = 0x08,
    Sub = 0x09,
    Mul = 0x0a,
    Div = 0x0b,
    Rem = 0x0c,
    Band = 0x0d,
    Bor = 0x0e,
    Xor = 0x0f,
    Bnot = 0x10,
    Shl = 0x11,
    Shr = 0x12,
    Lt = 0x13,
    Le = 0x14,
    Eq = 0x15,
    Ne = 0x16,
    Ge = 0x17,
    Gt = 0x18,
    Lit = 0x19,
    Gref = 0x1a,
    Gset = 0x1b,
    Getp = 0x1c,
    Setp = 0x1d,
    Return = 0x1e,
    Call = 0x1f,
    Send = 0x20,
    Eref = 0x21,
    Eset = 0x22,
    Frame = 0x23,
    Unframe = 0x24,
    Vref = 0x25,
    Vset = 0x26,
    Neg = 0x27,
    Inc = 0x28,
    Dec = 0x29,
    Dup2 = 0x2a,
    Drop = 0x2b,
    Dup = 0x2c,
    Over = 0x2d,
    NewObject = 0x2e,
    CFrame = 0x2f,
    NewVector = 0x30,
    AFrame = 0x31,
    AFrameR = 0x32,
    Close = 0x33,
    Switch = 0x34,
    ArgsGe = 0x35,
    Try = 0x36,
    EndTry = 0x37,
    Throw = 0x38,
}

/// Operand layout following an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandFormat {
    None,
    Byte,
    TwoBytes,
    Word,
    Literal,
    Switch,
}

const ALL: [Op; 56] = [
    Op::Brt,
    Op::Brf,
    Op::Br,
    Op::T,
    Op::Nil,
    Op::Push,
    Op::Not,
    Op::Add,
    Op::Sub,
    Op::Mul,
    Op::Div,
    Op::Rem,
    Op::Band,
    Op::Bor,
    Op::Xor,
    Op::Bnot,
    Op::Shl,
    Op::Shr,
    Op::Lt,
    Op::Le,
    Op::Eq,
    Op::Ne,
    Op::Ge,
    Op::Gt,
    Op::Lit,
    Op::Gref,
    Op::Gset,
    Op::Getp,
    Op::Setp,
    Op::Return,
    Op::Call,
    Op::Send,
    Op::Eref,
    Op::Eset,
    Op::Frame,
    Op::Unframe,
    Op::Vref,
    Op::Vset,
    Op::Neg,
    Op::Inc,
    Op::Dec,
    Op::Dup2,
    Op::Drop,
    Op::Dup,
    Op::Over,
    Op::NewObject,
    Op::CFrame,
    Op::NewVector,
    Op::AFrame,
    Op::AFrameR,
    Op::Close,
    Op::Switch,
    Op::ArgsGe,
    Op::Try,
    Op::EndTry,
    Op::Throw,
];

impl Op {
    /// Decode an opcode byte.
    pub fn from_byte(b: u8) -> Option<Op> {
        // Opcodes are dense from 0x01.
        ALL.get((b as usize).wrapping_sub(1)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Op::Brt => "BRT",
            Op::Brf => "BRF",
            Op::Br => "BR",
            Op::T => "T",
            Op::Nil => "NIL",
            Op::Push => "PUSH",
            Op::Not => "NOT",
            Op::Add => "ADD",
            Op::Sub => "SUB",
            Op::Mul => "MUL",
            Op::Div => "DIV",
            Op::Rem => "REM",
            Op::Band => "BAND",
            Op::Bor => "BOR",
            Op::Xor => "XOR",
            Op::Bnot => "BNOT",
            Op::Shl => "SHL",
            Op::Shr => "SHR",
            Op::Lt => "LT",
            Op::Le => "LE",
            Op::Eq => "EQ",
            Op::Ne => "NE",
            Op::Ge => "GE",
            Op::Gt => "GT",
            Op::Lit => "LIT",
            Op::Gref => "GREF",
            Op::Gset => "GSET",
            Op::Getp => "GETP",
            Op::Setp => "SETP",
            Op::Return => "RETURN",
            Op::Call => "CALL",
            Op::Send => "SEND",
            Op::Eref => "EREF",
            Op::Eset => "ESET",
            Op::Frame => "FRAME",
            Op::Unframe => "UNFRAME",
            Op::Vref => "VREF",
            Op::Vset => "VSET",
            Op::Neg => "NEG",
            Op::Inc => "INC",
            Op::Dec => "DEC",
            Op::Dup2 => "DUP2",
            Op::Drop => "DROP",
            Op::Dup => "DUP",
            Op::Over => "OVER",
            Op::NewObject => "NEWOBJECT",
            Op::CFrame => "CFRAME",
            Op::NewVector => "NEWVECTOR",
            Op::AFrame => "AFRAME",
            Op::AFrameR => "AFRAMER",
            Op::Close => "CLOSE",
            Op::Switch => "SWITCH",
            Op::ArgsGe => "ARGSGE",
            Op::Try => "TRY",
            Op::EndTry => "ENDTRY",
            Op::Throw => "THROW",
        }
    }

    pub fn format(self) -> OperandFormat {
        match self {
            Op::Brt | Op::Brf | Op::Br | Op::Try => OperandFormat::Word,
            Op::Lit | Op::Gref | Op::Gset => OperandFormat::Literal,
            Op::Call | Op::Send | Op::Frame | Op::CFrame | Op::ArgsGe => OperandFormat::Byte,
            Op::Eref | Op::Eset | Op::AFrame | Op::AFrameR => OperandFormat::TwoBytes,
            Op::Switch => OperandFormat::Switch,
            _ => OperandFormat::None,
        }
    }
}

/// Read a little-endian word operand.
pub fn read_u16(code: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([code[offset], code[offset + 1]])
}
