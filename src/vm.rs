use std::convert::TryFrom;
use std::io;
use std::io::Write;

use log::{debug, trace, warn};

use crate::bytecode::Chunk;
use crate::bytecode::OpCode;
use crate::compile::compile;
use crate::config::Config;
use crate::debug as disasm;
use crate::error::{Error, RuntimeError, RuntimeErrorKind};
use crate::object::ObjString;
use crate::stack::Stack;
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileErr,
    RuntimeErr,
}

impl InterpretResult {
    pub fn exit_code(self) -> i32 {
        match self {
            InterpretResult::Ok => 0,
            InterpretResult::CompileErr => 65,
            InterpretResult::RuntimeErr => 70,
        }
    }
}

/// Compiles and runs `source` on a fresh VM that prints to stdout.
pub fn interpret(source: &str) -> InterpretResult {
    VM::new().interpret(source)
}

pub struct VM<W = io::Stdout> {
    stack: Stack,
    config: Config,
    out: W,
}

impl VM<io::Stdout> {
    pub fn new() -> Self {
        Self::with_config(Config::default(), io::stdout())
    }
}

impl Default for VM<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> VM<W> {
    pub fn with_output(out: W) -> Self {
        Self::with_config(Config::default(), out)
    }

    pub fn with_config(config: Config, out: W) -> Self {
        Self {
            stack: Stack::new(config.stack_max),
            config,
            out,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stack(&self) -> &[Value] {
        self.stack.as_slice()
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn interpret(&mut self, source: &str) -> InterpretResult {
        match self.eval(source) {
            Ok(_) => InterpretResult::Ok,
            Err(err) => {
                eprintln!("{}", err);
                err.status()
            }
        }
    }

    pub fn eval(&mut self, source: &str) -> Result<Value, Error> {
        let chunk = compile(source)?;
        if self.config.print_code {
            debug!("\n{}", disasm::disassemble(&chunk, "code"));
        }
        let val = self.run(&chunk)?;
        Ok(val)
    }

    pub fn run(&mut self, chunk: &Chunk) -> Result<Value, RuntimeError> {
        self.stack.reset();
        let mut frame = Frame::new(chunk);
        match self.execute(&mut frame) {
            Ok(val) => Ok(val),
            Err(kind) => {
                let line = frame.line();
                self.stack.reset();
                debug!("runtime error at line {}: {}", line, kind);
                Err(RuntimeError { kind, line })
            }
        }
    }

    fn execute(&mut self, frame: &mut Frame) -> Result<Value, RuntimeErrorKind> {
        use OpCode::*;
        loop {
            if self.config.trace_execution {
                self.trace(frame);
            }
            let byte = frame.read_byte()?;
            let opcode = OpCode::try_from(byte).map_err(RuntimeErrorKind::UnknownOpcode)?;
            match opcode {
                Constant => {
                    let val = frame.read_constant()?.clone();
                    self.stack.push(val)?;
                }
                Nil => self.stack.push(Value::Nil)?,
                True => self.stack.push(Value::from(true))?,
                False => self.stack.push(Value::from(false))?,
                Equal => {
                    let rhs = self.stack.pop()?;
                    let lhs = self.stack.pop()?;
                    self.stack.push(Value::from(lhs == rhs))?;
                }
                Greater => self.binary_number(|lhs, rhs| Value::from(lhs > rhs))?,
                Less => self.binary_number(|lhs, rhs| Value::from(lhs < rhs))?,
                Add => self.add()?,
                Subtract => self.binary_number(|lhs, rhs| Value::from(lhs - rhs))?,
                Multiply => self.binary_number(|lhs, rhs| Value::from(lhs * rhs))?,
                Divide => self.binary_number(|lhs, rhs| Value::from(lhs / rhs))?,
                Not => {
                    let val = self.stack.pop()?;
                    self.stack.push(Value::from(val.is_falsey()))?;
                }
                Negate => {
                    let num = self
                        .stack
                        .peek(0)?
                        .as_number()
                        .ok_or(RuntimeErrorKind::OperandNotNumber)?;
                    self.stack.pop()?;
                    self.stack.push(Value::from(-num))?;
                }
                Return => {
                    let val = self.stack.pop()?;
                    if let Err(err) = writeln!(self.out, "{}", val) {
                        warn!("failed to print result: {}", err);
                    }
                    return Ok(val);
                }
            }
        }
    }

    fn trace(&self, frame: &Frame) {
        if frame.ip >= frame.chunk.len() {
            return;
        }
        let mut line = String::new();
        disasm::disassemble_at(frame.chunk, frame.ip, &mut line);
        trace!("          {}", self.stack);
        trace!("{}", line.trim_end());
    }

    fn binary_number(&mut self, op: fn(f64, f64) -> Value) -> Result<(), RuntimeErrorKind> {
        let operands = (self.stack.peek(1)?.as_number(), self.stack.peek(0)?.as_number());
        let (lhs, rhs) = match operands {
            (Some(lhs), Some(rhs)) => (lhs, rhs),
            _ => return Err(RuntimeErrorKind::OperandsNotNumbers),
        };
        self.stack.pop()?;
        self.stack.pop()?;
        self.stack.push(op(lhs, rhs))
    }

    fn add(&mut self) -> Result<(), RuntimeErrorKind> {
        let lhs = self.stack.peek(1)?;
        let rhs = self.stack.peek(0)?;
        let sum = if let (Some(lhs), Some(rhs)) = (lhs.as_number(), rhs.as_number()) {
            Value::from(lhs + rhs)
        } else if let (Some(lhs), Some(rhs)) = (lhs.as_string(), rhs.as_string()) {
            Value::from(ObjString::concat(lhs, rhs))
        } else {
            return Err(RuntimeErrorKind::OperandsNotNumbersOrStrings);
        };
        self.stack.pop()?;
        self.stack.pop()?;
        self.stack.push(sum)
    }
}

struct Frame<'c> {
    chunk: &'c Chunk,
    ip: usize,
}

impl<'c> Frame<'c> {
    fn new(chunk: &'c Chunk) -> Self {
        Self { chunk, ip: 0 }
    }

    fn read_byte(&mut self) -> Result<u8, RuntimeErrorKind> {
        let byte = *self
            .chunk
            .code()
            .get(self.ip)
            .ok_or(RuntimeErrorKind::UnexpectedEnd)?;
        self.ip += 1;
        Ok(byte)
    }

    fn read_constant(&mut self) -> Result<&'c Value, RuntimeErrorKind> {
        let index = self.read_byte()? as usize;
        self.chunk
            .constant(index)
            .ok_or(RuntimeErrorKind::ConstantOutOfRange(index))
    }

    /// Source line of the most recently read byte.
    fn line(&self) -> usize {
        let lines = self.chunk.lines();
        match self.ip.checked_sub(1) {
            Some(index) => lines.get(index).copied().unwrap_or(0),
            None => lines.first().copied().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> (Result<Value, Error>, String) {
        let mut vm = VM::with_output(Vec::new());
        let result = vm.eval(source);
        let printed = String::from_utf8(vm.into_output()).unwrap();
        (result, printed)
    }

    fn value(source: &str) -> Value {
        eval(source).0.unwrap()
    }

    fn runtime_error(source: &str) -> RuntimeError {
        match eval(source).0 {
            Err(Error::Runtime(err)) => err,
            other => panic!("expected runtime error for {:?}, got {:?}", source, other),
        }
    }

    fn chunk_of(bytes: &[u8], constants: Vec<Value>) -> Chunk {
        let mut chunk = Chunk::new();
        for val in constants {
            chunk.add_constant(val);
        }
        for &byte in bytes {
            chunk.write_byte(byte, 1);
        }
        chunk
    }

    #[test]
    fn return_prints_value() {
        let (result, printed) = eval("1 + 2 * 3");
        assert_eq!(Value::from(7.0), result.unwrap());
        assert_eq!("7\n", printed);
    }

    #[test]
    fn arithmetic() {
        assert_eq!(Value::from(9.0), value("(1 + 2) * 3"));
        assert_eq!(Value::from(1.0), value("-2 + 3"));
        assert_eq!(Value::from(2.5), value("5 / 2"));
        assert_eq!(Value::from(-1.0), value("2 - 3"));
        assert_eq!(Value::from(4.0), value("--4"));
    }

    #[test]
    fn divide_by_zero_is_infinite() {
        assert_eq!(Value::from(f64::INFINITY), value("1 / 0"));
    }

    #[test]
    fn literals() {
        assert_eq!(Value::Nil, value("nil"));
        assert_eq!(Value::from(true), value("true"));
        assert_eq!(Value::from(false), value("false"));
    }

    #[test]
    fn comparisons() {
        assert_eq!(Value::from(true), value("1 < 2"));
        assert_eq!(Value::from(false), value("1 > 2"));
        assert_eq!(Value::from(true), value("2 <= 2"));
        assert_eq!(Value::from(true), value("2 >= 2"));
        assert_eq!(Value::from(false), value("3 <= 2"));
    }

    #[test]
    fn equality() {
        assert_eq!(Value::from(true), value("nil == nil"));
        assert_eq!(Value::from(true), value("\"a\" == \"a\""));
        assert_eq!(Value::from(false), value("1 == \"1\""));
        assert_eq!(Value::from(false), value("nil == false"));
        assert_eq!(Value::from(true), value("1 != 2"));
    }

    #[test]
    fn not_follows_truthiness() {
        assert_eq!(Value::from(true), value("!nil"));
        assert_eq!(Value::from(true), value("!false"));
        assert_eq!(Value::from(true), value("!0"));
        assert_eq!(Value::from(false), value("!1"));
        assert_eq!(Value::from(false), value("!\"\""));
        assert_eq!(Value::from(false), value("!\"abc\""));
        assert_eq!(Value::from(false), value("!!0"));
    }

    #[test]
    fn concatenates_strings() {
        let (result, printed) = eval("\"ab\" + \"cd\"");
        assert_eq!(Value::string("abcd"), result.unwrap());
        assert_eq!("abcd\n", printed);
    }

    #[test]
    fn mixed_add_is_runtime_error() {
        let err = runtime_error("\"ab\" + 1");
        assert_eq!(RuntimeErrorKind::OperandsNotNumbersOrStrings, err.kind);
        assert_eq!(1, err.line);
    }

    #[test]
    fn arithmetic_requires_numbers() {
        for source in &["1 - true", "nil * 2", "\"a\" / 1", "1 < \"b\"", "false > 0"] {
            assert_eq!(
                RuntimeErrorKind::OperandsNotNumbers,
                runtime_error(source).kind
            );
        }
    }

    #[test]
    fn negate_requires_number() {
        assert_eq!(
            RuntimeErrorKind::OperandNotNumber,
            runtime_error("-\"a\"").kind
        );
    }

    #[test]
    fn runtime_error_reports_line() {
        assert_eq!(3, runtime_error("1 +\n2 -\n nil").line);
    }

    #[test]
    fn runtime_error_prints_nothing_and_resets_stack() {
        let mut vm = VM::with_output(Vec::new());
        assert!(vm.eval("1 + (2 * nil)").is_err());
        assert!(vm.stack().is_empty());
        assert!(vm.output().is_empty());

        assert_eq!(Value::from(3.0), vm.eval("1 + 2").unwrap());
        assert_eq!(b"3\n", &vm.output()[..]);
    }

    #[test]
    fn compile_error_runs_nothing() {
        let mut vm = VM::with_output(Vec::new());
        match vm.eval("1 +") {
            Err(Error::Compile(_)) => {}
            other => panic!("expected compile error, got {:?}", other),
        }
        assert!(vm.output().is_empty());
    }

    #[test]
    fn interpret_maps_status() {
        let mut vm = VM::with_output(Vec::new());
        assert_eq!(InterpretResult::Ok, vm.interpret("1"));
        assert_eq!(InterpretResult::CompileErr, vm.interpret("\"abc"));
        assert_eq!(InterpretResult::RuntimeErr, vm.interpret("-nil"));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(0, InterpretResult::Ok.exit_code());
        assert_eq!(65, InterpretResult::CompileErr.exit_code());
        assert_eq!(70, InterpretResult::RuntimeErr.exit_code());
    }

    #[test]
    fn deep_nesting_overflows_stack() {
        let depth = 300;
        let source = format!("{}nil{}", "(nil == ".repeat(depth), ")".repeat(depth));
        assert_eq!(RuntimeErrorKind::StackOverflow, runtime_error(&source).kind);
    }

    #[test]
    fn nesting_within_limit_runs() {
        let depth = 200;
        let source = format!("{}1{}", "(1 + ".repeat(depth), ")".repeat(depth));
        assert_eq!(Value::from(201.0), value(&source));
    }

    #[test]
    fn smaller_stack_from_config() {
        let config = Config {
            stack_max: 2,
            ..Config::default()
        };
        let mut vm = VM::with_config(config, Vec::new());
        assert_eq!(Value::from(3.0), vm.eval("1 + 2").unwrap());
        match vm.eval("1 + (2 + 3)") {
            Err(Error::Runtime(err)) => assert_eq!(RuntimeErrorKind::StackOverflow, err.kind),
            other => panic!("expected overflow, got {:?}", other),
        }
    }

    #[test]
    fn unknown_opcode_is_runtime_error() {
        let chunk = chunk_of(&[99], Vec::new());
        let mut vm = VM::with_output(Vec::new());
        let err = vm.run(&chunk).unwrap_err();
        assert_eq!(RuntimeErrorKind::UnknownOpcode(99), err.kind);
    }

    #[test]
    fn missing_return_is_runtime_error() {
        let chunk = chunk_of(&[OpCode::Nil as u8], Vec::new());
        let mut vm = VM::with_output(Vec::new());
        assert_eq!(
            RuntimeErrorKind::UnexpectedEnd,
            vm.run(&chunk).unwrap_err().kind
        );
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn bad_constant_index_is_runtime_error() {
        let chunk = chunk_of(&[OpCode::Constant as u8, 3, OpCode::Return as u8], Vec::new());
        let mut vm = VM::with_output(Vec::new());
        assert_eq!(
            RuntimeErrorKind::ConstantOutOfRange(3),
            vm.run(&chunk).unwrap_err().kind
        );
    }

    #[test]
    fn return_on_empty_stack_underflows() {
        let chunk = chunk_of(&[OpCode::Return as u8], Vec::new());
        let mut vm = VM::with_output(Vec::new());
        assert_eq!(
            RuntimeErrorKind::StackUnderflow,
            vm.run(&chunk).unwrap_err().kind
        );
    }

    #[test]
    fn runs_hand_built_chunk() {
        let chunk = chunk_of(
            &[
                OpCode::Constant as u8,
                0,
                OpCode::Negate as u8,
                OpCode::Constant as u8,
                1,
                OpCode::Add as u8,
                OpCode::Return as u8,
            ],
            vec![Value::from(5.0), Value::from(3.0)],
        );
        let mut vm = VM::with_output(Vec::new());
        assert_eq!(Value::from(-2.0), vm.run(&chunk).unwrap());
    }
}
