use std::convert::TryFrom;

use log::debug;

use crate::bytecode::Chunk;
use crate::bytecode::OpCode;
use crate::bytecode::MAX_CONSTANTS;
use crate::error::CompileError;
use crate::error::Diagnostic;
use crate::object::ObjString;
use crate::scan::Scanner;
use crate::scan::Span;
use crate::scan::Token;
use crate::value::Value;

pub const MAX_NESTING: usize = 1024;

pub fn compile(source: &str) -> Result<Chunk, CompileError> {
    Compiler::new(source).compile()
}

struct Compiler<'a> {
    scanner: Scanner<'a>,
    chunk: Chunk,
    curr: Span<'a>,
    prev: Span<'a>,
    had_error: bool,
    panic_mode: bool,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Compiler<'a> {
    fn new(source: &'a str) -> Self {
        let start = Span {
            token: Token::EOF,
            slice: "",
            line: 1,
        };
        Self {
            scanner: Scanner::new(source),
            chunk: Chunk::new(),
            curr: start,
            prev: start,
            had_error: false,
            panic_mode: false,
            depth: 0,
            diagnostics: Vec::new(),
        }
    }

    fn compile(mut self) -> Result<Chunk, CompileError> {
        self.advance();
        self.expression();
        self.consume(Token::EOF, "expect end of expression");
        self.end();

        if self.had_error {
            debug!("compile failed with {} diagnostic(s)", self.diagnostics.len());
            Err(CompileError {
                diagnostics: self.diagnostics,
            })
        } else {
            debug!(
                "compiled {} bytes, {} constants",
                self.chunk.len(),
                self.chunk.constants().len()
            );
            Ok(self.chunk)
        }
    }

    fn error_at(&mut self, span: Span<'a>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;

        let location = match span.token {
            Token::EOF => String::from(" at end"),
            Token::Err => String::new(),
            _ => format!(" at '{}'", span.slice),
        };
        self.diagnostics.push(Diagnostic {
            line: span.line,
            location,
            message: message.to_owned(),
        });
    }

    fn error_curr(&mut self, message: &str) {
        self.error_at(self.curr, message);
    }

    fn error(&mut self, message: &str) {
        self.error_at(self.prev, message);
    }

    fn advance(&mut self) {
        self.prev = self.curr;
        loop {
            self.curr = self.scanner.scan_token();
            if self.curr.token != Token::Err {
                break;
            }
            let message = self.curr.slice;
            self.error_curr(message);
        }
    }

    fn consume(&mut self, token: Token, message: &str) {
        if self.curr.token == token {
            self.advance();
            return;
        }
        self.error_curr(message);
    }

    fn parse_precedence(&mut self, prec: Prec) {
        if self.depth >= MAX_NESTING {
            self.error_curr("expression nested too deeply");
            return;
        }
        self.depth += 1;
        self.advance();

        match Self::rule(self.prev.token).prefix {
            Some(prefix_fn) => {
                prefix_fn(self);
                while prec <= Self::rule(self.curr.token).prec {
                    self.advance();
                    if let Some(infix_fn) = Self::rule(self.prev.token).infix {
                        infix_fn(self);
                    }
                }
            }
            None => self.error("expect expression"),
        }
        self.depth -= 1;
    }

    fn expression(&mut self) {
        self.parse_precedence(Prec::Assignment);
    }

    fn binary(&mut self) {
        let operator = self.prev.token;

        let prec = Self::rule(operator).prec;
        self.parse_precedence(prec.stronger());

        match operator {
            Token::Plus => self.emit(OpCode::Add),
            Token::Minus => self.emit(OpCode::Subtract),
            Token::Star => self.emit(OpCode::Multiply),
            Token::Slash => self.emit(OpCode::Divide),
            Token::EqEq => self.emit(OpCode::Equal),
            Token::BangEq => self.emit_pair(OpCode::Equal, OpCode::Not),
            Token::Gt => self.emit(OpCode::Greater),
            Token::GtEq => self.emit_pair(OpCode::Less, OpCode::Not),
            Token::Lt => self.emit(OpCode::Less),
            Token::LtEq => self.emit_pair(OpCode::Greater, OpCode::Not),
            _ => unreachable!("no binary operator for {:?}", operator),
        }
    }

    fn unary(&mut self) {
        let operator = self.prev.token;
        self.parse_precedence(Prec::Unary);
        match operator {
            Token::Minus => self.emit(OpCode::Negate),
            Token::Bang => self.emit(OpCode::Not),
            _ => unreachable!("no unary operator for {:?}", operator),
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(Token::Rparen, "expect ')' after expression");
    }

    fn literal(&mut self) {
        match self.prev.token {
            Token::Nil => self.emit(OpCode::Nil),
            Token::True => self.emit(OpCode::True),
            Token::False => self.emit(OpCode::False),
            _ => unreachable!("no literal for {:?}", self.prev.token),
        }
    }

    fn number(&mut self) {
        match self.prev.slice.parse::<f64>() {
            Ok(val) => self.emit_constant(Value::from(val)),
            Err(_) => self.error("invalid number literal"),
        }
    }

    fn string(&mut self) {
        let slice = self.prev.slice;
        let chars = &slice[1..slice.len() - 1];
        self.emit_constant(Value::from(ObjString::new(chars)));
    }

    fn make_constant(&mut self, val: Value) -> u8 {
        if self.chunk.constants().len() >= MAX_CONSTANTS {
            self.error("too many constants in one chunk");
            return 0;
        }
        let index = self.chunk.add_constant(val);
        u8::try_from(index).unwrap_or(0)
    }

    fn emit(&mut self, opcode: OpCode) {
        self.chunk.write(opcode, self.prev.line);
    }

    fn emit_byte(&mut self, byte: u8) {
        self.chunk.write_byte(byte, self.prev.line);
    }

    fn emit_pair(&mut self, op1: OpCode, op2: OpCode) {
        self.emit(op1);
        self.emit(op2);
    }

    fn emit_constant(&mut self, val: Value) {
        let index = self.make_constant(val);
        self.emit(OpCode::Constant);
        self.emit_byte(index);
    }

    fn end(&mut self) {
        self.emit(OpCode::Return);
    }

    fn rule(token: Token) -> ParseRule<'a> {
        use Token::*;
        match token {
            Lparen => ParseRule::new(Some(Self::grouping), None, Prec::None),
            Minus => ParseRule::new(Some(Self::unary), Some(Self::binary), Prec::Term),
            Plus => ParseRule::new(None, Some(Self::binary), Prec::Term),
            Slash | Star => ParseRule::new(None, Some(Self::binary), Prec::Factor),
            Bang => ParseRule::new(Some(Self::unary), None, Prec::None),
            BangEq | EqEq => ParseRule::new(None, Some(Self::binary), Prec::Equality),
            Gt | GtEq | Lt | LtEq => ParseRule::new(None, Some(Self::binary), Prec::Comparison),
            Num => ParseRule::new(Some(Self::number), None, Prec::None),
            Str => ParseRule::new(Some(Self::string), None, Prec::None),
            Nil | True | False => ParseRule::new(Some(Self::literal), None, Prec::None),
            _ => ParseRule::new(None, None, Prec::None),
        }
    }
}

type ParseFn<'a> = fn(&mut Compiler<'a>);

struct ParseRule<'a> {
    prefix: Option<ParseFn<'a>>,
    infix: Option<ParseFn<'a>>,
    prec: Prec,
}

impl<'a> ParseRule<'a> {
    fn new(prefix: Option<ParseFn<'a>>, infix: Option<ParseFn<'a>>, prec: Prec) -> Self {
        Self {
            prefix,
            infix,
            prec,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    None,
    Assignment, // =
    Or,         // or
    And,        // and
    Equality,   // == !=
    Comparison, // < > <= >=
    Term,       // + -
    Factor,     // * /
    Unary,      // ! -
    Call,       // . ()
    Primary,
}

impl Prec {
    fn stronger(self) -> Self {
        match self {
            Prec::None => Prec::Assignment,
            Prec::Assignment => Prec::Or,
            Prec::Or => Prec::And,
            Prec::And => Prec::Equality,
            Prec::Equality => Prec::Comparison,
            Prec::Comparison => Prec::Term,
            Prec::Term => Prec::Factor,
            Prec::Factor => Prec::Unary,
            Prec::Unary => Prec::Call,
            Prec::Call => Prec::Primary,
            Prec::Primary => Prec::Primary,
        }
    }
}
