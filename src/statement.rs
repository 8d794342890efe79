use crate::error::{DuckError, Span};
use crate::lexer::{Keyword, Punctuation, Token, TokenType};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Assignment,
    If,
    Goto,
    Dim,
    Print,
    Read,
    Stop,
    End,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            StatementKind::Assignment => "assignment",
            StatementKind::If => "if",
            StatementKind::Goto => "goto",
            StatementKind::Dim => "dim",
            StatementKind::Print => "print",
            StatementKind::Read => "read",
            StatementKind::Stop => "stop",
            StatementKind::End => "end",
        };
        write!(f, "{}", name)
    }
}

/// Determines a statement's kind from its leading keyword, falling back to
/// the shape `<name>[<index>]? = ...` for assignments. Does not evaluate anything.
pub fn classify(text: &str, tokens: &[Token]) -> Result<StatementKind, DuckError> {
    if let Some(TokenType::Keyword(keyword)) = tokens.first().map(|t| &t.token_type) {
        return Ok(match keyword {
            Keyword::Read => StatementKind::Read,
            Keyword::If => StatementKind::If,
            Keyword::Print => StatementKind::Print,
            Keyword::Stop => StatementKind::Stop,
            Keyword::End => StatementKind::End,
            Keyword::Goto => StatementKind::Goto,
            Keyword::Dim => StatementKind::Dim,
        });
    }

    let Some(equal_at) = tokens
        .iter()
        .position(|t| t.is_punctuation(Punctuation::Equal))
    else {
        return Err(DuckError::syntax_error(
            Span::new(0, text.len()),
            "Unable to determine statement type".to_string(),
        ));
    };

    check_assignment_target(text, &tokens[..equal_at], &tokens[equal_at])?;
    Ok(StatementKind::Assignment)
}

/// The tokens before `=` must be a variable, optionally followed by one
/// bracketed index expression.
fn check_assignment_target(text: &str, target: &[Token], equal: &Token) -> Result<(), DuckError> {
    let target_span = Span::new(0, equal.span.start);

    if let Some(quoted) = target.iter().find(|t| t.token_type == TokenType::String) {
        return Err(DuckError::syntax_error(quoted.span, "Invalid syntax.".to_string()));
    }

    let name = match target.first() {
        Some(token) if token.token_type == TokenType::Identifier => token,
        _ => {
            return Err(DuckError::syntax_error(
                target_span,
                "Invalid arithmetic statement. No proper variable or array to assign value to."
                    .to_string(),
            ));
        }
    };

    let rest = &target[1..];
    if let Some(open) = rest.first().filter(|t| t.is_punctuation(Punctuation::LeftBracket)) {
        if rest.get(1).is_some_and(|t| t.is_punctuation(Punctuation::RightBracket)) {
            return Err(DuckError::syntax_error(
                open.span,
                "Array index unspecified".to_string(),
            ));
        }

        let mut depth = 0usize;
        let mut close_at = None;
        for (i, token) in rest.iter().enumerate() {
            match token.token_type {
                TokenType::Punctuation(Punctuation::LeftBracket) => depth += 1,
                TokenType::Punctuation(Punctuation::RightBracket) => {
                    depth -= 1;
                    if depth == 0 {
                        close_at = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }

        match close_at {
            Some(i) if i + 1 == rest.len() => return Ok(()),
            Some(_) => {}
            None => {
                return Err(DuckError::syntax_error(
                    name.span.to(equal.span),
                    "Missing ']' character to end array expression.".to_string(),
                ));
            }
        }
    } else if rest.is_empty() {
        return Ok(());
    }

    let target_text = text[..equal.span.start].trim_end();
    Err(DuckError::syntax_error_with_help(
        target_span,
        format!("{} is an invalid expression to which to assign a value.", target_text),
        "assign to a variable 'x = ...;' or an array element 'a[i] = ...;'".to_string(),
    ))
}
