//! Error types for compilation and execution.
//!
//! Compile errors and runtime errors are kept apart: the compiler only ever produces a
//! `CompileError`, the virtual machine only ever produces a `RuntimeError`.

use std::fmt;

use thiserror::Error;

use crate::vm::InterpretResult;

/// A single compile-time message, tied to the line of the offending token.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("[line {line}] Error{location}: {message}")]
pub struct Diagnostic {
    pub line: usize,
    /// Either empty, `" at end"`, or `" at '<lexeme>'"`.
    pub location: String,
    pub message: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileError {
    pub fn first(&self) -> Option<&Diagnostic> {
        self.diagnostics.first()
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut iter = self.diagnostics.iter();
        match iter.next() {
            Some(first) => write!(f, "{}", first)?,
            None => return write!(f, "compile error"),
        }
        for diagnostic in iter {
            write!(f, "\n{}", diagnostic)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    #[error("operand must be a number")]
    OperandNotNumber,
    #[error("operands must be numbers")]
    OperandsNotNumbers,
    #[error("operands must be two numbers or two strings")]
    OperandsNotNumbersOrStrings,
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),
    #[error("constant index {0} out of range")]
    ConstantOutOfRange(usize),
    #[error("unexpected end of bytecode")]
    UnexpectedEnd,
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("{kind}\n[line {line}] in script")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: usize,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    pub fn status(&self) -> InterpretResult {
        match self {
            Error::Compile(_) => InterpretResult::CompileErr,
            Error::Runtime(_) => InterpretResult::RuntimeErr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_format() {
        let diagnostic = Diagnostic {
            line: 3,
            location: String::from(" at '+'"),
            message: String::from("expect expression"),
        };
        assert_eq!("[line 3] Error at '+': expect expression", diagnostic.to_string());
    }

    #[test]
    fn runtime_error_format() {
        let err = RuntimeError {
            kind: RuntimeErrorKind::OperandsNotNumbers,
            line: 1,
        };
        assert_eq!("operands must be numbers\n[line 1] in script", err.to_string());
    }

    #[test]
    fn error_maps_to_status() {
        let compile = Error::from(CompileError {
            diagnostics: Vec::new(),
        });
        let runtime = Error::from(RuntimeError {
            kind: RuntimeErrorKind::StackUnderflow,
            line: 0,
        });
        assert_eq!(InterpretResult::CompileErr, compile.status());
        assert_eq!(InterpretResult::RuntimeErr, runtime.status());
    }
}
