//! Bounded value stack for the virtual machine.

use std::fmt;

use crate::error::RuntimeErrorKind;
use crate::value::Value;

pub struct Stack {
    values: Vec<Value>,
    max_size: usize,
}

impl Stack {
    pub fn new(max_size: usize) -> Self {
        Stack {
            values: Vec::with_capacity(max_size),
            max_size,
        }
    }

    pub fn push(&mut self, value: Value) -> Result<(), RuntimeErrorKind> {
        if self.values.len() >= self.max_size {
            return Err(RuntimeErrorKind::StackOverflow);
        }
        self.values.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeErrorKind> {
        self.values.pop().ok_or(RuntimeErrorKind::StackUnderflow)
    }

    /// Looks `distance` slots down from the top without removing anything.
    pub fn peek(&self, distance: usize) -> Result<&Value, RuntimeErrorKind> {
        self.values
            .len()
            .checked_sub(distance + 1)
            .and_then(|index| self.values.get(index))
            .ok_or(RuntimeErrorKind::StackUnderflow)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn reset(&mut self) {
        self.values.clear();
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values[..]
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for val in self.values.iter() {
            write!(f, "[ {} ]", val)?;
        }
        Ok(())
    }
}
