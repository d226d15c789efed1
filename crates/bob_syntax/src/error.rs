//! Compile-time errors.

use thiserror::Error;

/// Numeric codes reported to embedders, shared with the runtime error table.
pub mod codes {
    pub const SYNTAX_ERROR: u32 = 0x1000;
    pub const STORE_INTO_CONSTANT: u32 = 0x1001;
    pub const TOO_MUCH_CODE: u32 = 0x1002;
    pub const TOO_MANY_LITERALS: u32 = 0x1003;
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompileErrorKind {
    #[error("Syntax error - {0}")]
    Syntax(String),
    #[error("Attempt to store into a constant")]
    StoreIntoConstant,
    #[error("Too much code")]
    TooMuchCode,
    #[error("Too many literals")]
    TooManyLiterals,
}

/// A compile error tagged with the line the scanner was on when it was raised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}\n  in line {line}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub line: u32,
}

impl CompileError {
    pub fn syntax(message: impl Into<String>, line: u32) -> Self {
        Self {
            kind: CompileErrorKind::Syntax(message.into()),
            line,
        }
    }

    pub fn new(kind: CompileErrorKind, line: u32) -> Self {
        Self { kind, line }
    }

    pub fn code(&self) -> u32 {
        match self.kind {
            CompileErrorKind::Syntax(_) => codes::SYNTAX_ERROR,
            CompileErrorKind::StoreIntoConstant => codes::STORE_INTO_CONSTANT,
            CompileErrorKind::TooMuchCode => codes::TOO_MUCH_CODE,
            CompileErrorKind::TooManyLiterals => codes::TOO_MANY_LITERALS,
        }
    }

    /// The message without the trailing line annotation.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display_includes_line() {
        let e = CompileError::syntax("Expecting ';', found '}'", 7);
        assert_eq!(e.to_string(), "Syntax error - Expecting ';', found '}'\n  in line 7");
        assert_eq!(e.code(), codes::SYNTAX_ERROR);
    }

    #[test]
    fn constant_store_has_its_own_code() {
        let e = CompileError::new(CompileErrorKind::StoreIntoConstant, 1);
        assert_eq!(e.code(), 0x1001);
        assert_eq!(e.message(), "Attempt to store into a constant");
    }
}
