use crate::error::{DuckError, Span};
use crate::rules::{
    is_blank, is_reserved_keyword, is_syntactic_char, is_valid_identifier, is_valid_number,
    MULTI_CHAR_OPERATORS,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Dim,
    Read,
    Goto,
    If,
    Print,
    Stop,
    End,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "dim" => Some(Keyword::Dim),
            "read" => Some(Keyword::Read),
            "goto" => Some(Keyword::Goto),
            "if" => Some(Keyword::If),
            "print" => Some(Keyword::Print),
            "stop" => Some(Keyword::Stop),
            "end" => Some(Keyword::End),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Less,
    Greater,
    Bang,
    EqualEqual,
    GreaterEqual,
    LessEqual,
    BangEqual,
}

impl Operator {
    fn from_text(text: &str) -> Option<Self> {
        match text {
            "+" => Some(Operator::Plus),
            "-" => Some(Operator::Minus),
            "*" => Some(Operator::Star),
            "/" => Some(Operator::Slash),
            "<" => Some(Operator::Less),
            ">" => Some(Operator::Greater),
            "!" => Some(Operator::Bang),
            "==" => Some(Operator::EqualEqual),
            ">=" => Some(Operator::GreaterEqual),
            "<=" => Some(Operator::LessEqual),
            "!=" => Some(Operator::BangEqual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::Bang => "!",
            Operator::EqualEqual => "==",
            Operator::GreaterEqual => ">=",
            Operator::LessEqual => "<=",
            Operator::BangEqual => "!=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punctuation {
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Equal,
    Comma,
    Semicolon,
}

impl Punctuation {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '(' => Some(Punctuation::LeftParen),
            ')' => Some(Punctuation::RightParen),
            '[' => Some(Punctuation::LeftBracket),
            ']' => Some(Punctuation::RightBracket),
            '=' => Some(Punctuation::Equal),
            ',' => Some(Punctuation::Comma),
            ';' => Some(Punctuation::Semicolon),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    Number(f64),
    Identifier,
    /// Quoted literal; the lexeme holds the text between the quotes.
    String,
    Keyword(Keyword),
    Operator(Operator),
    Punctuation(Punctuation),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span) -> Self {
        Self {
            token_type,
            lexeme,
            span,
        }
    }

    pub fn is_punctuation(&self, punctuation: Punctuation) -> bool {
        self.token_type == TokenType::Punctuation(punctuation)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.token_type == TokenType::Keyword(keyword)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.token_type {
            TokenType::String => write!(f, "\"{}\"", self.lexeme),
            _ => write!(f, "{}", self.lexeme),
        }
    }
}

/// Splits one statement into lexical elements. The cursor only moves
/// forward; `next_token` yields `None` once the statement is exhausted.
pub struct Lexer {
    source: String,
    current: usize,
}

impl Lexer {
    pub fn new(source: String) -> Self {
        Self { source, current: 0 }
    }

    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, DuckError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, DuckError> {
        self.skip_blanks();

        let start = self.current;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        if c == '"' {
            return self.string(start).map(Some);
        }

        if let Some(op) = MULTI_CHAR_OPERATORS
            .iter()
            .find(|op| self.source[start..].starts_with(**op))
        {
            self.current += op.len();
            return self.operator_token(op, start).map(Some);
        }

        if is_syntactic_char(c) {
            self.current += c.len_utf8();
            let text = c.to_string();
            if let Some(punctuation) = Punctuation::from_char(c) {
                return Ok(Some(Token::new(
                    TokenType::Punctuation(punctuation),
                    text,
                    Span::new(start, self.current),
                )));
            }
            return self.operator_token(&text, start).map(Some);
        }

        self.word(start).map(Some)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    fn skip_blanks(&mut self) {
        while let Some(c) = self.peek() {
            if !is_blank(c) {
                break;
            }
            self.current += c.len_utf8();
        }
    }

    fn operator_token(&self, text: &str, start: usize) -> Result<Token, DuckError> {
        let span = Span::new(start, self.current);
        match Operator::from_text(text) {
            Some(op) => Ok(Token::new(TokenType::Operator(op), text.to_string(), span)),
            None => Err(DuckError::lex_error(
                span,
                format!("'{}' is an unrecognized expression.", text),
            )),
        }
    }

    fn string(&mut self, start: usize) -> Result<Token, DuckError> {
        let content_start = start + 1;
        let Some(len) = self.source[content_start..].find('"') else {
            return Err(DuckError::lex_error(
                Span::new(start, self.source.len()),
                "Bad syntax. End of string not defined. '\"' character is missing.".to_string(),
            ));
        };

        let content_end = content_start + len;
        self.current = content_end + 1;
        Ok(Token::new(
            TokenType::String,
            self.source[content_start..content_end].to_string(),
            Span::new(start, self.current),
        ))
    }

    /// Identifiers, keywords and numbers share one shape: everything up to
    /// the next syntactic character. The text decides which one it is.
    fn word(&mut self, start: usize) -> Result<Token, DuckError> {
        let len = self.source[start..]
            .find(is_syntactic_char)
            .unwrap_or(self.source.len() - start);
        self.current = start + len;

        let text = &self.source[start..self.current];
        let span = Span::new(start, self.current);

        if is_valid_number(text) {
            let value = text.parse::<f64>().map_err(|_| {
                DuckError::lex_error(span, format!("'{}' is not a valid number.", text))
            })?;
            return Ok(Token::new(TokenType::Number(value), text.to_string(), span));
        }

        if is_reserved_keyword(text) {
            if let Some(keyword) = Keyword::from_word(text) {
                return Ok(Token::new(TokenType::Keyword(keyword), text.to_string(), span));
            }
        }

        if is_valid_identifier(text) {
            return Ok(Token::new(TokenType::Identifier, text.to_string(), span));
        }

        Err(DuckError::lex_error(
            span,
            format!("'{}' is an unrecognized expression.", text),
        ))
    }
}

/// Convenience wrapper: lex a whole statement in one go.
pub fn tokenize(statement: &str) -> Result<Vec<Token>, DuckError> {
    Lexer::new(statement.to_string()).scan_tokens()
}
