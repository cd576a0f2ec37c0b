//! Lexer - tokenizes test module source into tokens

use crate::error::syntax_error;
use core_types::{JsError, SourcePosition};

/// Keyword types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// let keyword
    Let,
    /// const keyword
    Const,
    /// var keyword
    Var,
    /// function keyword
    Function,
    /// return keyword
    Return,
    /// if keyword
    If,
    /// else keyword
    Else,
    /// while keyword
    While,
    /// for keyword
    For,
    /// do keyword
    Do,
    /// break keyword
    Break,
    /// continue keyword
    Continue,
    /// new keyword
    New,
    /// this keyword
    This,
    /// true keyword
    True,
    /// false keyword
    False,
    /// null keyword
    Null,
    // Note: 'undefined' is NOT a keyword - it's a global property
    /// typeof keyword
    Typeof,
    /// instanceof keyword
    Instanceof,
    /// in keyword
    In,
    /// try keyword
    Try,
    /// catch keyword
    Catch,
    /// finally keyword
    Finally,
    /// throw keyword
    Throw,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        let keyword = match word {
            "let" => Keyword::Let,
            "const" => Keyword::Const,
            "var" => Keyword::Var,
            "function" => Keyword::Function,
            "return" => Keyword::Return,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "for" => Keyword::For,
            "do" => Keyword::Do,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "new" => Keyword::New,
            "this" => Keyword::This,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            "typeof" => Keyword::Typeof,
            "instanceof" => Keyword::Instanceof,
            "in" => Keyword::In,
            "try" => Keyword::Try,
            "catch" => Keyword::Catch,
            "finally" => Keyword::Finally,
            "throw" => Keyword::Throw,
            _ => return None,
        };
        Some(keyword)
    }

    /// Source spelling of the keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Let => "let",
            Keyword::Const => "const",
            Keyword::Var => "var",
            Keyword::Function => "function",
            Keyword::Return => "return",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::For => "for",
            Keyword::Do => "do",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::New => "new",
            Keyword::This => "this",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::Typeof => "typeof",
            Keyword::Instanceof => "instanceof",
            Keyword::In => "in",
            Keyword::Try => "try",
            Keyword::Catch => "catch",
            Keyword::Finally => "finally",
            Keyword::Throw => "throw",
        }
    }
}

/// Punctuators (operators and delimiters)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punctuator {
    /// Opening parenthesis
    LParen,
    /// Closing parenthesis
    RParen,
    /// Opening brace
    LBrace,
    /// Closing brace
    RBrace,
    /// Opening bracket
    LBracket,
    /// Closing bracket
    RBracket,
    /// Semicolon
    Semicolon,
    /// Comma
    Comma,
    /// Dot
    Dot,
    /// Colon
    Colon,
    /// Question mark
    Question,
    /// Assignment
    Assign,
    /// Plus
    Plus,
    /// Minus
    Minus,
    /// Multiply
    Star,
    /// Divide
    Slash,
    /// Modulo
    Percent,
    /// Equality
    EqEq,
    /// Strict equality
    EqEqEq,
    /// Inequality
    NotEq,
    /// Strict inequality
    NotEqEq,
    /// Less than
    Lt,
    /// Less than or equal
    LtEq,
    /// Greater than
    Gt,
    /// Greater than or equal
    GtEq,
    /// Logical AND
    AndAnd,
    /// Logical OR
    OrOr,
    /// Logical NOT
    Not,
    /// Plus equals
    PlusEq,
    /// Minus equals
    MinusEq,
    /// Multiply equals
    StarEq,
    /// Divide equals
    SlashEq,
    /// Increment
    PlusPlus,
    /// Decrement
    MinusMinus,
}

impl Punctuator {
    /// Source spelling of the punctuator
    pub fn as_str(&self) -> &'static str {
        match self {
            Punctuator::LParen => "(",
            Punctuator::RParen => ")",
            Punctuator::LBrace => "{",
            Punctuator::RBrace => "}",
            Punctuator::LBracket => "[",
            Punctuator::RBracket => "]",
            Punctuator::Semicolon => ";",
            Punctuator::Comma => ",",
            Punctuator::Dot => ".",
            Punctuator::Colon => ":",
            Punctuator::Question => "?",
            Punctuator::Assign => "=",
            Punctuator::Plus => "+",
            Punctuator::Minus => "-",
            Punctuator::Star => "*",
            Punctuator::Slash => "/",
            Punctuator::Percent => "%",
            Punctuator::EqEq => "==",
            Punctuator::EqEqEq => "===",
            Punctuator::NotEq => "!=",
            Punctuator::NotEqEq => "!==",
            Punctuator::Lt => "<",
            Punctuator::LtEq => "<=",
            Punctuator::Gt => ">",
            Punctuator::GtEq => ">=",
            Punctuator::AndAnd => "&&",
            Punctuator::OrOr => "||",
            Punctuator::Not => "!",
            Punctuator::PlusEq => "+=",
            Punctuator::MinusEq => "-=",
            Punctuator::StarEq => "*=",
            Punctuator::SlashEq => "/=",
            Punctuator::PlusPlus => "++",
            Punctuator::MinusMinus => "--",
        }
    }
}

/// Token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier (variable name, etc.)
    Identifier(String),
    /// Number literal
    Number(f64),
    /// String literal
    String(String),
    /// Keyword
    Keyword(Keyword),
    /// Punctuator/operator
    Punctuator(Punctuator),
    /// End of file
    EOF,
}

impl Token {
    /// Describe the token the way it appears in "Unexpected token" messages
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::Number(n) => format!("number {}", n),
            Token::String(_) => "string".to_string(),
            Token::Keyword(k) => k.as_str().to_string(),
            Token::Punctuator(p) => p.as_str().to_string(),
            Token::EOF => "end of input".to_string(),
        }
    }
}

/// A token together with where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    /// The token
    pub token: Token,
    /// Position of the token's first character
    pub position: SourcePosition,
    /// Whether a line terminator separated this token from the previous one.
    /// Used for Automatic Semicolon Insertion (ASI)
    pub newline_before: bool,
}

/// Lexer for test module source code
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
    peeked: Option<SpannedToken>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            peeked: None,
        }
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> Result<SpannedToken, JsError> {
        if let Some(token) = self.peeked.take() {
            return Ok(token);
        }
        self.scan_token()
    }

    /// Peek at the next token without consuming it
    pub fn peek_token(&mut self) -> Result<&SpannedToken, JsError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scan_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Tokenize the remaining input, including the trailing EOF token
    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>, JsError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.token == Token::EOF;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn scan_token(&mut self) -> Result<SpannedToken, JsError> {
        let start_line = self.line;
        self.skip_whitespace_and_comments()?;
        let newline_before = self.line != start_line;
        let position = self.current_position();

        if self.is_at_end() {
            return Ok(SpannedToken {
                token: Token::EOF,
                position,
                newline_before,
            });
        }

        let ch = self.advance();
        let token = match ch {
            '(' => Token::Punctuator(Punctuator::LParen),
            ')' => Token::Punctuator(Punctuator::RParen),
            '{' => Token::Punctuator(Punctuator::LBrace),
            '}' => Token::Punctuator(Punctuator::RBrace),
            '[' => Token::Punctuator(Punctuator::LBracket),
            ']' => Token::Punctuator(Punctuator::RBracket),
            ';' => Token::Punctuator(Punctuator::Semicolon),
            ',' => Token::Punctuator(Punctuator::Comma),
            ':' => Token::Punctuator(Punctuator::Colon),
            '?' => Token::Punctuator(Punctuator::Question),
            '%' => Token::Punctuator(Punctuator::Percent),
            '.' => {
                if self.peek().is_ascii_digit() {
                    self.scan_number('.', position)?
                } else {
                    Token::Punctuator(Punctuator::Dot)
                }
            }
            '+' => {
                if self.match_char('+') {
                    Token::Punctuator(Punctuator::PlusPlus)
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::PlusEq)
                } else {
                    Token::Punctuator(Punctuator::Plus)
                }
            }
            '-' => {
                if self.match_char('-') {
                    Token::Punctuator(Punctuator::MinusMinus)
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::MinusEq)
                } else {
                    Token::Punctuator(Punctuator::Minus)
                }
            }
            '*' => {
                if self.match_char('=') {
                    Token::Punctuator(Punctuator::StarEq)
                } else {
                    Token::Punctuator(Punctuator::Star)
                }
            }
            '/' => {
                if self.match_char('=') {
                    Token::Punctuator(Punctuator::SlashEq)
                } else {
                    Token::Punctuator(Punctuator::Slash)
                }
            }
            '=' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        Token::Punctuator(Punctuator::EqEqEq)
                    } else {
                        Token::Punctuator(Punctuator::EqEq)
                    }
                } else if self.peek() == '>' {
                    return Err(syntax_error(
                        "Arrow functions are not supported",
                        Some(position),
                    ));
                } else {
                    Token::Punctuator(Punctuator::Assign)
                }
            }
            '!' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        Token::Punctuator(Punctuator::NotEqEq)
                    } else {
                        Token::Punctuator(Punctuator::NotEq)
                    }
                } else {
                    Token::Punctuator(Punctuator::Not)
                }
            }
            '<' => {
                if self.match_char('=') {
                    Token::Punctuator(Punctuator::LtEq)
                } else {
                    Token::Punctuator(Punctuator::Lt)
                }
            }
            '>' => {
                if self.match_char('=') {
                    Token::Punctuator(Punctuator::GtEq)
                } else {
                    Token::Punctuator(Punctuator::Gt)
                }
            }
            '&' => {
                if self.match_char('&') {
                    Token::Punctuator(Punctuator::AndAnd)
                } else {
                    return Err(syntax_error("Unexpected token &", Some(position)));
                }
            }
            '|' => {
                if self.match_char('|') {
                    Token::Punctuator(Punctuator::OrOr)
                } else {
                    return Err(syntax_error("Unexpected token |", Some(position)));
                }
            }
            '"' | '\'' => self.scan_string(ch, position)?,
            c if c.is_ascii_digit() => self.scan_number(c, position)?,
            c if is_id_start(c) => self.scan_identifier(c),
            c => {
                return Err(syntax_error(
                    format!("Invalid or unexpected token '{}'", c),
                    Some(position),
                ))
            }
        };

        Ok(SpannedToken {
            token,
            position,
            newline_before,
        })
    }

    fn scan_string(&mut self, quote: char, start: SourcePosition) -> Result<Token, JsError> {
        let mut value = String::new();
        loop {
            if self.is_at_end() || is_line_terminator(self.peek()) {
                return Err(syntax_error("Unterminated string literal", Some(start)));
            }
            let ch = self.advance();
            if ch == quote {
                return Ok(Token::String(value));
            }
            if ch != '\\' {
                value.push(ch);
                continue;
            }
            if self.is_at_end() {
                return Err(syntax_error("Unterminated string literal", Some(start)));
            }
            let escaped = self.advance();
            match escaped {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                'b' => value.push('\u{0008}'),
                'f' => value.push('\u{000C}'),
                'v' => value.push('\u{000B}'),
                '0' => value.push('\0'),
                'u' => value.push(self.scan_unicode_escape()?),
                // Line continuation
                '\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                other => value.push(other),
            }
        }
    }

    fn scan_unicode_escape(&mut self) -> Result<char, JsError> {
        let start = self.current_position();
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .peek()
                .to_digit(16)
                .ok_or_else(|| syntax_error("Invalid Unicode escape sequence", Some(start)))?;
            self.advance();
            code = code * 16 + digit;
        }
        char::from_u32(code)
            .ok_or_else(|| syntax_error("Invalid Unicode escape sequence", Some(start)))
    }

    fn scan_number(&mut self, first: char, start: SourcePosition) -> Result<Token, JsError> {
        if first == '0' && matches!(self.peek(), 'x' | 'X') {
            self.advance();
            let mut digits = String::new();
            while self.peek().is_ascii_hexdigit() {
                digits.push(self.advance());
            }
            return u64::from_str_radix(&digits, 16)
                .map(|n| Token::Number(n as f64))
                .map_err(|_| syntax_error("Invalid hexadecimal literal", Some(start)));
        }

        let mut text = String::new();
        if first == '.' {
            text.push('0');
        }
        text.push(first);
        while self.peek().is_ascii_digit() {
            text.push(self.advance());
        }
        if first != '.' && self.peek() == '.' {
            text.push(self.advance());
            while self.peek().is_ascii_digit() {
                text.push(self.advance());
            }
        }
        if matches!(self.peek(), 'e' | 'E') {
            text.push(self.advance());
            if matches!(self.peek(), '+' | '-') {
                text.push(self.advance());
            }
            if !self.peek().is_ascii_digit() {
                return Err(syntax_error("Invalid number literal", Some(start)));
            }
            while self.peek().is_ascii_digit() {
                text.push(self.advance());
            }
        }
        // An identifier directly after a number (`3in`) is an error
        if is_id_start(self.peek()) {
            return Err(syntax_error(
                "Invalid or unexpected token",
                Some(self.current_position()),
            ));
        }
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| syntax_error("Invalid number literal", Some(start)))
    }

    fn scan_identifier(&mut self, first: char) -> Token {
        let mut name = String::new();
        name.push(first);
        while is_id_continue(self.peek()) {
            name.push(self.advance());
        }
        match Keyword::from_word(&name) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Identifier(name),
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), JsError> {
        while !self.is_at_end() {
            match self.peek() {
                ' ' | '\t' | '\u{000B}' | '\u{000C}' | '\u{00A0}' | '\u{FEFF}' => {
                    self.advance();
                }
                '\n' | '\u{2028}' | '\u{2029}' => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                '\r' => {
                    // CRLF counts as a single line terminator
                    self.advance();
                    if self.peek() == '\n' {
                        self.advance();
                    }
                    self.line += 1;
                    self.column = 1;
                }
                '/' if self.peek_next() == Some('/') => {
                    while !self.is_at_end() && !is_line_terminator(self.peek()) {
                        self.advance();
                    }
                }
                '/' if self.peek_next() == Some('*') => {
                    let start = self.current_position();
                    self.advance();
                    self.advance();
                    let mut found_end = false;
                    while !self.is_at_end() {
                        if self.peek() == '*' && self.peek_next() == Some('/') {
                            self.advance();
                            self.advance();
                            found_end = true;
                            break;
                        }
                        if self.advance() == '\n' {
                            self.line += 1;
                            self.column = 1;
                        }
                    }
                    if !found_end {
                        return Err(syntax_error(
                            "Unterminated multi-line comment",
                            Some(start),
                        ));
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.chars.get(self.position).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.peek();
        self.position += 1;
        self.column += 1;
        ch
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn current_position(&self) -> SourcePosition {
        SourcePosition {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_id_start(ch: char) -> bool {
    ch == '$' || ch == '_' || ch.is_alphabetic()
}

fn is_id_continue(ch: char) -> bool {
    ch == '$' || ch == '_' || ch.is_alphanumeric()
}
