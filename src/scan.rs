#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    // Punctuation.
    Lparen,
    Rparen,
    Lbrace,
    Rbrace,
    Comma,
    Semi,
    Dot,

    // Operators.
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    BangEq,
    Eq,
    EqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Keywords.
    And,
    Class,
    Else,
    For,
    Fun,
    If,
    Or,
    Print,
    Return,
    Super,
    This,
    Var,
    While,

    // Literals.
    Nil,
    True,
    False,
    Ident,
    Str,
    Num,

    // Markers.
    Err,
    EOF,
}

/// A token together with the slice of source it was scanned from. For `Token::Err` the slice
/// holds the diagnostic message instead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span<'a> {
    pub token: Token,
    pub slice: &'a str,
    pub line: usize,
}

pub struct Scanner<'a> {
    src: &'a str,
    curr: usize,
    line: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            src: source,
            curr: 0,
            line: 1,
            done: false,
        }
    }

    pub fn scan_token(&mut self) -> Span<'a> {
        self.skip_whitespace();
        if self.is_at_end() {
            return self.make_span(Token::EOF);
        }
        match self.advance() {
            b'(' => self.make_span(Token::Lparen),
            b')' => self.make_span(Token::Rparen),
            b'{' => self.make_span(Token::Lbrace),
            b'}' => self.make_span(Token::Rbrace),
            b',' => self.make_span(Token::Comma),
            b';' => self.make_span(Token::Semi),
            b'.' => self.make_span(Token::Dot),
            b'+' => self.make_span(Token::Plus),
            b'-' => self.make_span(Token::Minus),
            b'*' => self.make_span(Token::Star),
            b'/' => self.make_span(Token::Slash),
            b'!' => {
                let matched = self.matched(b'=');
                self.make_span(if matched { Token::BangEq } else { Token::Bang })
            }
            b'=' => {
                let matched = self.matched(b'=');
                self.make_span(if matched { Token::EqEq } else { Token::Eq })
            }
            b'<' => {
                let matched = self.matched(b'=');
                self.make_span(if matched { Token::LtEq } else { Token::Lt })
            }
            b'>' => {
                let matched = self.matched(b'=');
                self.make_span(if matched { Token::GtEq } else { Token::Gt })
            }
            b'"' => self.make_string(),
            b if is_digit(b) => self.make_number(),
            b if is_alpha_score(b) => self.make_identifier(),
            b if !b.is_ascii() => {
                // Swallow the rest of the code point so slices stay on char boundaries.
                while is_continuation(self.peek()) {
                    self.consume();
                }
                self.error_span("unexpected character")
            }
            _ => self.error_span("unexpected character"),
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    fn consume(&mut self) {
        self.curr += 1;
    }

    fn advance(&mut self) -> u8 {
        let byte = self.bytes()[self.curr];
        self.curr += 1;
        byte
    }

    fn peek(&self) -> u8 {
        self.bytes().get(self.curr).copied().unwrap_or(b'\0')
    }

    fn peek_next(&self) -> u8 {
        self.bytes().get(self.curr + 1).copied().unwrap_or(b'\0')
    }

    fn matched(&mut self, expected: u8) -> bool {
        if self.is_at_end() {
            return false;
        }
        if self.peek() != expected {
            return false;
        }
        self.curr += 1;
        true
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                b' ' | b'\r' | b'\t' => {
                    self.consume();
                }
                b'\n' => {
                    self.consume();
                    self.line += 1;
                }
                b'/' if self.peek_next() == b'/' => {
                    while !self.is_at_end() && self.peek() != b'\n' {
                        self.consume();
                    }
                }
                _ => break,
            }
        }
        self.slide_buffer();
    }

    fn slide_buffer(&mut self) -> &'a str {
        let (lexeme, rest) = self.src.split_at(self.curr);
        self.src = rest;
        self.curr = 0;
        lexeme
    }

    fn error_span(&mut self, message: &'static str) -> Span<'a> {
        self.slide_buffer();
        Span {
            token: Token::Err,
            slice: message,
            line: self.line,
        }
    }

    fn make_span(&mut self, token: Token) -> Span<'a> {
        let line = self.line;
        let slice = self.slide_buffer();
        Span { token, slice, line }
    }

    fn make_string(&mut self) -> Span<'a> {
        let line = self.line;
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return self.error_span("unterminated string");
        }
        self.consume();

        let slice = self.slide_buffer();
        Span {
            token: Token::Str,
            slice,
            line,
        }
    }

    fn make_number(&mut self) -> Span<'a> {
        while is_digit(self.peek()) {
            self.consume();
        }

        if self.peek() == b'.' && is_digit(self.peek_next()) {
            self.consume();
            while is_digit(self.peek()) {
                self.consume();
            }
        }

        self.make_span(Token::Num)
    }

    fn make_identifier(&mut self) -> Span<'a> {
        while is_alpha_num_score(self.peek()) {
            self.consume();
        }
        let token = self.check_keyword();
        self.make_span(token)
    }

    fn check_keyword(&self) -> Token {
        let src = self.bytes();
        match src[0] {
            b'a' => return self.check_rest(1, b"nd", Token::And),
            b'c' => return self.check_rest(1, b"lass", Token::Class),
            b'e' => return self.check_rest(1, b"lse", Token::Else),
            b'f' => {
                if self.curr > 1 {
                    match src[1] {
                        b'a' => return self.check_rest(2, b"lse", Token::False),
                        b'o' => return self.check_rest(2, b"r", Token::For),
                        b'u' => return self.check_rest(2, b"n", Token::Fun),
                        _ => {}
                    }
                }
            }
            b'i' => return self.check_rest(1, b"f", Token::If),
            b'n' => return self.check_rest(1, b"il", Token::Nil),
            b'o' => return self.check_rest(1, b"r", Token::Or),
            b'p' => return self.check_rest(1, b"rint", Token::Print),
            b'r' => return self.check_rest(1, b"eturn", Token::Return),
            b's' => return self.check_rest(1, b"uper", Token::Super),
            b't' => {
                if self.curr > 1 {
                    match src[1] {
                        b'h' => return self.check_rest(2, b"is", Token::This),
                        b'r' => return self.check_rest(2, b"ue", Token::True),
                        _ => {}
                    }
                }
            }
            b'v' => return self.check_rest(1, b"ar", Token::Var),
            b'w' => return self.check_rest(1, b"hile", Token::While),
            _ => {}
        }
        Token::Ident
    }

    fn check_rest(&self, start: usize, rest: &[u8], token: Token) -> Token {
        if self.curr == start + rest.len() && &self.bytes()[start..self.curr] == rest {
            return token;
        }
        Token::Ident
    }
}

/// Yields every span up to and including the first EOF.
impl<'a> Iterator for Scanner<'a> {
    type Item = Span<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let span = self.scan_token();
        if span.token == Token::EOF {
            self.done = true;
        }
        Some(span)
    }
}

fn is_digit(byte: u8) -> bool {
    byte.is_ascii_digit()
}

fn is_alpha_score(byte: u8) -> bool {
    byte == b'_' || byte.is_ascii_alphabetic()
}

fn is_alpha_num_score(byte: u8) -> bool {
    byte == b'_' || byte.is_ascii_alphanumeric()
}

fn is_continuation(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}
