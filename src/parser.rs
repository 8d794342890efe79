use crate::error::{DuckError, Span};
use crate::lexer::{Keyword, Punctuation, Token, TokenType};

/// Cursor over the tokens of a single statement. Statement handlers and the
/// expression evaluator share one `Parser`, so a handler resumes exactly
/// where an expression stopped.
pub struct Parser<'t> {
    tokens: &'t [Token],
    current: usize,
    /// Length of the statement text, used to place end-of-statement errors.
    text_len: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token], text_len: usize) -> Self {
        Self {
            tokens,
            current: 0,
            text_len,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.current)
    }

    /// Tokens from the cursor to the end of the statement.
    pub fn remaining(&self) -> &'t [Token] {
        self.tokens.get(self.current..).unwrap_or(&[])
    }

    pub fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.current);
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    pub fn check_punctuation(&self, punctuation: Punctuation) -> bool {
        self.peek().is_some_and(|t| t.is_punctuation(punctuation))
    }

    pub fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    pub fn match_punctuation(&mut self, punctuation: Punctuation) -> bool {
        if self.check_punctuation(punctuation) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Span of the current token, or a point just past the statement when
    /// every token has been consumed.
    pub fn error_span(&self) -> Span {
        match self.peek() {
            Some(token) => token.span,
            None => Span::single(self.text_len),
        }
    }

    pub fn consume_punctuation(
        &mut self,
        punctuation: Punctuation,
        message: &str,
    ) -> Result<&'t Token, DuckError> {
        if self.check_punctuation(punctuation) {
            self.current += 1;
            Ok(&self.tokens[self.current - 1])
        } else {
            Err(DuckError::syntax_error(self.error_span(), message.to_string()))
        }
    }

    pub fn consume_keyword(&mut self, keyword: Keyword, message: &str) -> Result<&'t Token, DuckError> {
        if self.check_keyword(keyword) {
            self.current += 1;
            Ok(&self.tokens[self.current - 1])
        } else {
            Err(DuckError::syntax_error(self.error_span(), message.to_string()))
        }
    }

    pub fn consume_identifier(&mut self, message: &str) -> Result<&'t Token, DuckError> {
        match self.peek() {
            Some(token) if token.token_type == TokenType::Identifier => {
                self.current += 1;
                Ok(token)
            }
            _ => Err(DuckError::syntax_error(self.error_span(), message.to_string())),
        }
    }

    /// Requires the closing `;` to be the final token of the statement.
    pub fn expect_end(&mut self, message: &str) -> Result<(), DuckError> {
        if self.match_punctuation(Punctuation::Semicolon) && self.is_at_end() {
            return Ok(());
        }

        let span = match self.peek() {
            Some(token) => token.span,
            None => self
                .tokens
                .last()
                .map(|t| t.span)
                .unwrap_or_else(|| Span::single(self.text_len)),
        };
        Err(DuckError::syntax_error_with_help(
            span,
            message.to_string(),
            "every statement ends with a single ';' and nothing after it".to_string(),
        ))
    }
}
