use std::convert::TryFrom;
use std::fmt::Write;

use crate::bytecode::Chunk;
use crate::bytecode::OpCode;

pub fn disassemble(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", name);
    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_at(chunk, offset, &mut out);
    }
    out
}

/// Appends one line describing the instruction at `offset` and returns the offset of the next
/// instruction.
pub fn disassemble_at(chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    use OpCode::*;
    let _ = write!(out, "{:04} ", offset);
    if offset >= chunk.len() {
        out.push_str("<end>\n");
        return offset;
    }

    let lines = chunk.lines();
    if offset > 0 && lines[offset] == lines[offset - 1] {
        out.push_str("   | ");
    } else {
        let _ = write!(out, "{:4} ", lines[offset]);
    }

    let byte = chunk.code()[offset];
    let opcode = match OpCode::try_from(byte) {
        Err(_) => return unknown_instruction(byte, offset, out),
        Ok(op) => op,
    };

    match opcode {
        Constant => constant_instruction(opcode, chunk, offset, out),
        Negate | Add | Subtract | Multiply | Divide | Return | Nil | True | False | Not
        | Equal | Greater | Less => simple_instruction(opcode, offset, out),
    }
}

fn unknown_instruction(byte: u8, offset: usize, out: &mut String) -> usize {
    let _ = writeln!(out, "unknown opcode {}", byte);
    offset + 1
}

fn simple_instruction(opcode: OpCode, offset: usize, out: &mut String) -> usize {
    let _ = writeln!(out, "{}", opcode.name());
    offset + 1
}

fn constant_instruction(opcode: OpCode, chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let index = match chunk.code().get(offset + 1) {
        Some(&byte) => byte as usize,
        None => {
            let _ = writeln!(out, "{:<16} <missing operand>", opcode.name());
            return offset + 1;
        }
    };
    let _ = write!(out, "{:<16} {:4} '", opcode.name(), index);
    match chunk.constant(index) {
        Some(val) => {
            let _ = write!(out, "{}", val);
        }
        None => out.push_str("<out of range>"),
    }
    out.push_str("'\n");
    offset + 2
}
