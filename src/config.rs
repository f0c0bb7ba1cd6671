//! Interpreter configuration.
//!
//! Diagnostic output defaults to the `debug` Cargo feature and may be overridden from the
//! environment. Limits are enforced by the virtual machine.

use std::env;

/// Maximum depth of the value stack.
pub const STACK_MAX: usize = 256;

const PRINT_CODE_VAR: &str = "LOXCORE_PRINT_CODE";
const TRACE_VAR: &str = "LOXCORE_TRACE";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Log a disassembly of every successfully compiled chunk.
    pub print_code: bool,

    /// Log every instruction along with the stack it runs against.
    pub trace_execution: bool,

    pub stack_max: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            print_code: cfg!(feature = "debug"),
            trace_execution: cfg!(feature = "debug"),
            stack_max: STACK_MAX,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(flag) = env_flag(PRINT_CODE_VAR) {
            config.print_code = flag;
        }
        if let Some(flag) = env_flag(TRACE_VAR) {
            config.trace_execution = flag;
        }
        config
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|val| parse_flag(&val))
}

fn parse_flag(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
