use crate::error::{DuckError, Span};
use crate::lexer::{tokenize, Keyword, Operator, Punctuation, Token, TokenType};
use crate::parser::Parser;
use crate::tables::{ArrayTable, SymbolTable};
use log::trace;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Negate,
    Not,
}

impl BinaryOp {
    fn from_operator(op: Operator) -> Option<Self> {
        match op {
            Operator::Plus => Some(BinaryOp::Add),
            Operator::Minus => Some(BinaryOp::Subtract),
            Operator::Star => Some(BinaryOp::Multiply),
            Operator::Slash => Some(BinaryOp::Divide),
            Operator::EqualEqual => Some(BinaryOp::Equal),
            Operator::BangEqual => Some(BinaryOp::NotEqual),
            Operator::Less => Some(BinaryOp::Less),
            Operator::LessEqual => Some(BinaryOp::LessEqual),
            Operator::Greater => Some(BinaryOp::Greater),
            Operator::GreaterEqual => Some(BinaryOp::GreaterEqual),
            Operator::Bang => None,
        }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::Less
            | BinaryOp::LessEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEqual => 2,
            BinaryOp::Add | BinaryOp::Subtract => 3,
            BinaryOp::Multiply | BinaryOp::Divide => 4,
        }
    }

    /// Comparisons yield 1 or 0. Division is not guarded: a zero divisor
    /// produces an infinity or NaN like any other IEEE division.
    pub fn apply(&self, left: f64, right: f64) -> f64 {
        let truth = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            BinaryOp::Add => left + right,
            BinaryOp::Subtract => left - right,
            BinaryOp::Multiply => left * right,
            BinaryOp::Divide => left / right,
            BinaryOp::Equal => truth(left == right),
            BinaryOp::NotEqual => truth(left != right),
            BinaryOp::Less => truth(left < right),
            BinaryOp::LessEqual => truth(left <= right),
            BinaryOp::Greater => truth(left > right),
            BinaryOp::GreaterEqual => truth(left >= right),
        }
    }
}

impl UnaryOp {
    fn from_operator(op: Operator) -> Option<Self> {
        match op {
            Operator::Plus => Some(UnaryOp::Plus),
            Operator::Minus => Some(UnaryOp::Negate),
            Operator::Bang => Some(UnaryOp::Not),
            _ => None,
        }
    }

    pub fn apply(&self, operand: f64) -> f64 {
        match self {
            UnaryOp::Plus => operand,
            UnaryOp::Negate => -operand,
            UnaryOp::Not => {
                if operand == 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            UnaryOp::Plus => "+",
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        };
        write!(f, "{}", symbol)
    }
}

/// Entries of the operator stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackOp {
    LeftParen,
    Unary(UnaryOp),
    Binary(BinaryOp),
}

impl StackOp {
    fn precedence(&self) -> u8 {
        match self {
            StackOp::LeftParen => 1,
            StackOp::Binary(op) => op.precedence(),
            StackOp::Unary(_) => 5,
        }
    }
}

/// What the previous element of the expression was. Decides whether an
/// incoming `+ - !` is unary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Nothing,
    Operand,
    Operator,
}

/// Shunting-yard evaluator. Only reads the tables, so evaluating the same
/// tokens against the same tables always gives the same answer.
pub struct Evaluator<'e> {
    symbols: &'e SymbolTable,
    arrays: &'e ArrayTable,
}

impl<'e> Evaluator<'e> {
    pub fn new(symbols: &'e SymbolTable, arrays: &'e ArrayTable) -> Self {
        Self { symbols, arrays }
    }

    /// `,` `;` `]` and `goto` end an expression. They are left unconsumed.
    pub fn is_terminator(token: &Token) -> bool {
        matches!(
            token.token_type,
            TokenType::Punctuation(Punctuation::Comma)
                | TokenType::Punctuation(Punctuation::Semicolon)
                | TokenType::Punctuation(Punctuation::RightBracket)
                | TokenType::Keyword(Keyword::Goto)
        )
    }

    /// Evaluates from the parser's position up to the next terminator.
    pub fn evaluate(&self, parser: &mut Parser) -> Result<f64, DuckError> {
        let start_span = parser.error_span();
        let mut operators: Vec<(StackOp, Span)> = Vec::new();
        let mut operands: Vec<f64> = Vec::new();
        let mut last = Last::Nothing;

        while let Some(token) = parser.peek() {
            if Self::is_terminator(token) {
                break;
            }
            parser.advance();

            match &token.token_type {
                TokenType::Number(value) => {
                    Self::check_operand_position(last, token.span)?;
                    operands.push(*value);
                    last = Last::Operand;
                }
                TokenType::Identifier => {
                    Self::check_operand_position(last, token.span)?;
                    let value = self.resolve(token, parser)?;
                    operands.push(value);
                    last = Last::Operand;
                }
                TokenType::Punctuation(Punctuation::LeftParen) => {
                    if last == Last::Operand {
                        return Err(DuckError::expression_error_with_help(
                            token.span,
                            "Invalid arithmetic expression. An operand cannot precede '('."
                                .to_string(),
                            "put an operator between the value and the parenthesis".to_string(),
                        ));
                    }
                    operators.push((StackOp::LeftParen, token.span));
                    last = Last::Operator;
                }
                TokenType::Punctuation(Punctuation::RightParen) => {
                    Self::close_paren(token.span, last, &mut operators, &mut operands)?;
                    last = Last::Operand;
                }
                TokenType::Operator(op) => {
                    Self::push_operator(*op, token.span, last, &mut operators, &mut operands)?;
                    last = Last::Operator;
                }
                TokenType::String => {
                    return Err(DuckError::expression_error(
                        token.span,
                        "Invalid syntax for arithmetic expression. Strings cannot be used as values."
                            .to_string(),
                    ));
                }
                TokenType::Keyword(_) | TokenType::Punctuation(_) => {
                    return Err(DuckError::expression_error(
                        token.span,
                        format!(
                            "Invalid syntax for arithmetic expression. Unexpected '{}'.",
                            token.lexeme
                        ),
                    ));
                }
            }
        }

        match last {
            Last::Nothing => {
                return Err(DuckError::expression_error(
                    start_span,
                    "Arithmetic expression missing.".to_string(),
                ));
            }
            Last::Operator => {
                return Err(DuckError::expression_error(
                    parser.error_span(),
                    "Invalid arithmetic expression. Arithmetic expressions cannot end with operators."
                        .to_string(),
                ));
            }
            Last::Operand => {}
        }

        while let Some(&(op, span)) = operators.last() {
            if op == StackOp::LeftParen {
                return Err(DuckError::expression_error(
                    span,
                    "Invalid Arithmetic Expression. Ending parenthesis missing.".to_string(),
                ));
            }
            Self::reduce(&mut operators, &mut operands)?;
        }

        match operands.as_slice() {
            [value] => Ok(*value),
            _ => Err(DuckError::expression_error(
                start_span.to(parser.error_span()),
                "Invalid Arithmetic Expression".to_string(),
            )),
        }
    }

    /// Evaluates `<expr> ]` after an opening `[` has been consumed.
    pub fn evaluate_index(&self, parser: &mut Parser) -> Result<f64, DuckError> {
        let index = self.evaluate(parser)?;
        parser.consume_punctuation(
            Punctuation::RightBracket,
            "Invalid syntax for using arrays. ']' character is missing.",
        )?;
        Ok(index)
    }

    fn check_operand_position(last: Last, span: Span) -> Result<(), DuckError> {
        if last == Last::Operand {
            return Err(DuckError::expression_error(
                span,
                "Invalid arithmetic expression. Numbers must have an operator between them."
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Looks up a scalar, or an array element when the name is followed by `[`.
    fn resolve(&self, name: &Token, parser: &mut Parser) -> Result<f64, DuckError> {
        if parser.match_punctuation(Punctuation::LeftBracket) {
            let index = self.evaluate_index(parser)?;
            let span = name.span.to(parser.error_span());
            let value = self
                .arrays
                .get(&name.lexeme, index)
                .map_err(|e| e.at(span))?;
            return value.ok_or_else(|| {
                DuckError::semantic_error(
                    span,
                    format!(
                        "The value at index {} of the array {} has not been initialized.",
                        index, name.lexeme
                    ),
                )
            });
        }

        self.symbols.get(&name.lexeme).ok_or_else(|| {
            let message = format!("The variable {} has not been assigned a value.", name.lexeme);
            if self.arrays.is_declared(&name.lexeme) {
                DuckError::semantic_error_with_help(
                    name.span,
                    message,
                    format!("'{}' is an array; index it as {}[<index>]", name.lexeme, name.lexeme),
                )
            } else {
                DuckError::semantic_error(name.span, message)
            }
        })
    }

    fn push_operator(
        op: Operator,
        span: Span,
        last: Last,
        operators: &mut Vec<(StackOp, Span)>,
        operands: &mut Vec<f64>,
    ) -> Result<(), DuckError> {
        if last != Last::Operand {
            if let Some(&(StackOp::Unary(previous), _)) = operators.last() {
                return Err(DuckError::expression_error(
                    span,
                    format!("{}{} is an invalid operation", previous, op.as_str()),
                ));
            }
            let unary = UnaryOp::from_operator(op).ok_or_else(|| {
                DuckError::expression_error(
                    span,
                    format!(
                        "Invalid Arithmetic Expression. '{}' needs a value on its left.",
                        op.as_str()
                    ),
                )
            })?;
            // Prefix operators bind tightest and have no left operand yet,
            // so nothing on the stack is reduced here.
            operators.push((StackOp::Unary(unary), span));
            return Ok(());
        }

        let binary = BinaryOp::from_operator(op).ok_or_else(|| {
            DuckError::expression_error(
                span,
                format!("Invalid Arithmetic Expression. '{}' is not a binary operator.", op.as_str()),
            )
        })?;

        while let Some(&(top, _)) = operators.last() {
            if top.precedence() < binary.precedence() {
                break;
            }
            Self::reduce(operators, operands)?;
        }
        operators.push((StackOp::Binary(binary), span));
        Ok(())
    }

    fn close_paren(
        span: Span,
        last: Last,
        operators: &mut Vec<(StackOp, Span)>,
        operands: &mut Vec<f64>,
    ) -> Result<(), DuckError> {
        if last != Last::Operand {
            let message = match operators.last() {
                Some((StackOp::LeftParen, _)) => "Invalid arithmetic expression. There must be an arithmetic expression inside parentheses.",
                _ => "Invalid arithmetic expression.",
            };
            return Err(DuckError::expression_error(span, message.to_string()));
        }

        loop {
            match operators.last() {
                None => {
                    return Err(DuckError::expression_error(
                        span,
                        "Invalid arithmetic expression. Opening parenthesis missing.".to_string(),
                    ));
                }
                Some((StackOp::LeftParen, _)) => {
                    operators.pop();
                    return Ok(());
                }
                Some(_) => Self::reduce(operators, operands)?,
            }
        }
    }

    /// Pops one operator and applies it to the top of the operand stack.
    fn reduce(
        operators: &mut Vec<(StackOp, Span)>,
        operands: &mut Vec<f64>,
    ) -> Result<(), DuckError> {
        let Some((op, span)) = operators.pop() else {
            return Ok(());
        };
        let malformed = || {
            DuckError::expression_error(span, "Invalid Arithmetic Expression".to_string())
        };

        match op {
            StackOp::Unary(unary) => {
                let operand = operands.pop().ok_or_else(malformed)?;
                let result = unary.apply(operand);
                trace!("reduce {}{} = {}", unary, operand, result);
                operands.push(result);
            }
            StackOp::Binary(binary) => {
                let right = operands.pop().ok_or_else(malformed)?;
                let left = operands.pop().ok_or_else(malformed)?;
                let result = binary.apply(left, right);
                trace!("reduce {} {:?} {} = {}", left, binary, right, result);
                operands.push(result);
            }
            StackOp::LeftParen => return Err(malformed()),
        }
        Ok(())
    }
}

/// Lexes and evaluates a standalone expression. Evaluation stops at the
/// first terminator, exactly as it does inside a statement.
pub fn evaluate_expression(
    source: &str,
    symbols: &SymbolTable,
    arrays: &ArrayTable,
) -> Result<f64, DuckError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(&tokens, source.len());
    Evaluator::new(symbols, arrays).evaluate(&mut parser)
}
