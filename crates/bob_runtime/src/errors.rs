//! Runtime error taxonomy.
//!
//! Every fallible core operation returns `Result<_, BobError>`. Messages that
//! mention a value carry its printed form, captured when the error is raised,
//! so an error stays meaningful after the heap has moved on.

use bob_syntax::CompileError;
use thiserror::Error;

/// Numeric codes of the legacy error table, reported to embedders.
pub mod codes {
    pub const EXIT: u32 = 0;
    pub const INSUFFICIENT_MEMORY: u32 = 1;
    pub const STACK_OVERFLOW: u32 = 2;
    pub const TOO_MANY_ARGUMENTS: u32 = 3;
    pub const TOO_FEW_ARGUMENTS: u32 = 4;
    pub const TYPE_ERROR: u32 = 5;
    pub const UNBOUND_VARIABLE: u32 = 6;
    pub const INDEX_OUT_OF_BOUNDS: u32 = 7;
    pub const NO_METHOD: u32 = 8;
    pub const BAD_OPCODE: u32 = 9;
    pub const RESTART: u32 = 10;
    pub const WRITE: u32 = 11;
    pub const BAD_PARSE_CODE: u32 = 12;
    pub const IMPOSSIBLE: u32 = 13;
    pub const NO_HASH_VALUE: u32 = 14;
    pub const READ_ONLY_PROPERTY: u32 = 19;
    pub const WRITE_ONLY_PROPERTY: u32 = 20;
    pub const FILE_NOT_FOUND: u32 = 21;
    pub const NEW_INSTANCE: u32 = 22;
    pub const NO_PROPERTY: u32 = 23;
    pub const STACK_EMPTY: u32 = 24;
    pub const NOT_AN_OBJECT_FILE: u32 = 25;
    pub const WRONG_OBJECT_VERSION: u32 = 26;
    pub const VALUE_ERROR: u32 = 27;
    /// A thrown value that no handler caught.
    pub const UNCAUGHT: u32 = 28;
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BobError {
    #[error("Exit")]
    Exit,
    #[error("Insufficient memory")]
    InsufficientMemory,
    #[error("Stack overflow")]
    StackOverflow,
    #[error("Too many arguments - {0}")]
    TooManyArguments(String),
    #[error("Too few arguments - {0}")]
    TooFewArguments(String),
    #[error("Wrong type - {0}")]
    TypeError(String),
    #[error("Unbound variable - {0}")]
    UnboundVariable(String),
    #[error("Index out of bounds - {0}")]
    IndexOutOfBounds(String),
    #[error("Object {object} has no method - {selector}")]
    NoMethod { object: String, selector: String },
    #[error("Bad opcode - {0:02x}")]
    BadOpcode(u8),
    #[error("Restart")]
    Restart,
    #[error("Writing file")]
    Write,
    #[error("Bad parse code")]
    BadParseCode,
    #[error("Impossible error")]
    Impossible,
    #[error("Can't use as an index")]
    NoHashValue,
    #[error("{0}")]
    Compile(#[from] CompileError),
    #[error("Attempt to set a read-only property")]
    ReadOnlyProperty,
    #[error("Attempt to get a write-only property")]
    WriteOnlyProperty,
    #[error("File not found - {0}")]
    FileNotFound(String),
    #[error("Can't create an instance")]
    NewInstance,
    #[error("Object {object} has no property - {tag}")]
    NoProperty { object: String, tag: String },
    #[error("Stack empty - {0}")]
    StackEmpty(String),
    #[error("Not an object file - {0}")]
    NotAnObjectFile(String),
    #[error("Wrong object file version number - {0}")]
    WrongObjectVersion(i64),
    #[error("Bad value - {0}")]
    ValueError(String),
    #[error("Uncaught exception - {0}")]
    Uncaught(String),
}

impl BobError {
    pub fn code(&self) -> u32 {
        match self {
            BobError::Exit => codes::EXIT,
            BobError::InsufficientMemory => codes::INSUFFICIENT_MEMORY,
            BobError::StackOverflow => codes::STACK_OVERFLOW,
            BobError::TooManyArguments(_) => codes::TOO_MANY_ARGUMENTS,
            BobError::TooFewArguments(_) => codes::TOO_FEW_ARGUMENTS,
            BobError::TypeError(_) => codes::TYPE_ERROR,
            BobError::UnboundVariable(_) => codes::UNBOUND_VARIABLE,
            BobError::IndexOutOfBounds(_) => codes::INDEX_OUT_OF_BOUNDS,
            BobError::NoMethod { .. } => codes::NO_METHOD,
            BobError::BadOpcode(_) => codes::BAD_OPCODE,
            BobError::Restart => codes::RESTART,
            BobError::Write => codes::WRITE,
            BobError::BadParseCode => codes::BAD_PARSE_CODE,
            BobError::Impossible => codes::IMPOSSIBLE,
            BobError::NoHashValue => codes::NO_HASH_VALUE,
            BobError::Compile(e) => e.code(),
            BobError::ReadOnlyProperty => codes::READ_ONLY_PROPERTY,
            BobError::WriteOnlyProperty => codes::WRITE_ONLY_PROPERTY,
            BobError::FileNotFound(_) => codes::FILE_NOT_FOUND,
            BobError::NewInstance => codes::NEW_INSTANCE,
            BobError::NoProperty { .. } => codes::NO_PROPERTY,
            BobError::StackEmpty(_) => codes::STACK_EMPTY,
            BobError::NotAnObjectFile(_) => codes::NOT_AN_OBJECT_FILE,
            BobError::WrongObjectVersion(_) => codes::WRONG_OBJECT_VERSION,
            BobError::ValueError(_) => codes::VALUE_ERROR,
            BobError::Uncaught(_) => codes::UNCAUGHT,
        }
    }

    /// `Exit` ends the session; everything else abandons the current
    /// top-level unit only.
    pub fn is_exit(&self) -> bool {
        matches!(self, BobError::Exit)
    }
}
