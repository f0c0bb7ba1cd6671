use std::convert::TryFrom;

use crate::value::Value;

/// Constant pool operands are one byte wide.
pub const MAX_CONSTANTS: usize = u8::MAX as usize + 1;

const MIN_CAPACITY: usize = 8;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpCode {
    Constant,
    Negate,
    Add,
    Subtract,
    Multiply,
    Divide,
    Return,
    Nil,
    True,
    False,
    Not,
    Equal,
    Greater,
    Less,
}

impl OpCode {
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Constant => "OP_CONSTANT",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::Return => "OP_RETURN",
            OpCode::Nil => "OP_NIL",
            OpCode::True => "OP_TRUE",
            OpCode::False => "OP_FALSE",
            OpCode::Not => "OP_NOT",
            OpCode::Equal => "OP_EQUAL",
            OpCode::Greater => "OP_GREATER",
            OpCode::Less => "OP_LESS",
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        use OpCode::*;
        Ok(match byte {
            0 => Constant,
            1 => Negate,
            2 => Add,
            3 => Subtract,
            4 => Multiply,
            5 => Divide,
            6 => Return,
            7 => Nil,
            8 => True,
            9 => False,
            10 => Not,
            11 => Equal,
            12 => Greater,
            13 => Less,
            _ => return Err(byte),
        })
    }
}

#[derive(Debug, Default)]
pub struct Chunk {
    code: Vec<u8>,
    lines: Vec<usize>,
    constants: Vec<Value>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code(&self) -> &[u8] {
        &self.code[..]
    }

    pub fn lines(&self) -> &[usize] {
        &self.lines[..]
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants[..]
    }

    pub fn constant(&self, index: usize) -> Option<&Value> {
        self.constants.get(index)
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.code.capacity()
    }

    pub fn write(&mut self, opcode: OpCode, line: usize) {
        self.write_byte(opcode as u8, line);
    }

    pub fn write_byte(&mut self, byte: u8, line: usize) {
        if self.code.len() == self.code.capacity() {
            let capacity = grow_capacity(self.code.capacity());
            self.code.reserve_exact(capacity - self.code.len());
            self.lines.reserve_exact(capacity - self.lines.len());
        }
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Appends to the constant pool and returns the new index. The pool itself is unbounded;
    /// callers emitting one-byte operands must check the index against `MAX_CONSTANTS`.
    pub fn add_constant(&mut self, val: Value) -> usize {
        self.constants.push(val);
        self.constants.len() - 1
    }
}

fn grow_capacity(capacity: usize) -> usize {
    if capacity < MIN_CAPACITY {
        MIN_CAPACITY
    } else {
        capacity * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_decodes_from_byte() {
        for byte in 0..=13u8 {
            let op = OpCode::try_from(byte).unwrap();
            assert_eq!(byte, op as u8);
        }
        assert_eq!(Err(14), OpCode::try_from(14));
        assert_eq!(Err(255), OpCode::try_from(255));
    }

    #[test]
    fn write_records_line_per_byte() {
        let mut chunk = Chunk::new();
        chunk.write(OpCode::Constant, 1);
        chunk.write_byte(0, 1);
        chunk.write(OpCode::Return, 2);
        assert_eq!(&[0, 0, 6], chunk.code());
        assert_eq!(&[1, 1, 2], chunk.lines());
        assert_eq!(3, chunk.len());
    }

    #[test]
    fn code_grows_geometrically_from_eight() {
        let mut chunk = Chunk::new();
        assert!(chunk.is_empty());
        chunk.write(OpCode::Nil, 1);
        assert_eq!(8, chunk.capacity());
        for _ in 0..8 {
            chunk.write(OpCode::Nil, 1);
        }
        assert_eq!(16, chunk.capacity());
        for _ in 0..8 {
            chunk.write(OpCode::Nil, 1);
        }
        assert_eq!(32, chunk.capacity());
    }

    #[test]
    fn add_constant_returns_index() {
        let mut chunk = Chunk::new();
        assert_eq!(0, chunk.add_constant(Value::from(1.0)));
        assert_eq!(1, chunk.add_constant(Value::string("a")));
        assert_eq!(Some(&Value::from(1.0)), chunk.constant(0));
        assert_eq!(None, chunk.constant(2));
        assert_eq!(2, chunk.constants().len());
    }
}
