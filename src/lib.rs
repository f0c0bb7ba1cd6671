//! A single-pass compiler and stack-based virtual machine for a small expression language.
//!
//! Source text is scanned into spans, compiled straight to bytecode by a Pratt parser, and
//! executed on a bounded value stack.

pub mod bytecode;
pub mod compile;
pub mod config;
pub mod debug;
pub mod error;
pub mod object;
pub mod scan;
pub mod stack;
pub mod value;
pub mod vm;

pub use crate::compile::compile;
pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::value::Value;
pub use crate::vm::{interpret, InterpretResult, VM};
