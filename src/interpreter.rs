use crate::error::{DuckError, Span};
use crate::evaluator::Evaluator;
use crate::lexer::{tokenize, Keyword, Punctuation, Token, TokenType};
use crate::parser::Parser;
use crate::program::Program;
use crate::rules::is_valid_number;
use crate::statement::{classify, StatementKind};
use crate::tables::{ArrayTable, SymbolTable};
use log::{debug, info, trace};
use std::io::{BufRead, Write};
use std::rc::Rc;

/// Once `end;` has run the machine is terminated for good; fetching any
/// further statement is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Running,
    Terminated,
}

/// Result of executing a single statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stopped,
}

/// What a statement handler asks the engine to do with the program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    Jump(usize),
    Terminate,
    Stop,
}

pub struct Interpreter<R, W> {
    program: Program,
    symbols: SymbolTable,
    arrays: ArrayTable,
    state: MachineState,
    program_counter: usize,
    input: R,
    output: W,
    /// Token vectors, filled the first time each statement runs.
    token_cache: Vec<Option<Rc<Vec<Token>>>>,
}

impl<R: BufRead, W: Write> Interpreter<R, W> {
    pub fn new(program: Program, input: R, output: W) -> Self {
        let token_cache = vec![None; program.len()];
        Self {
            program,
            symbols: SymbolTable::new(),
            arrays: ArrayTable::new(),
            state: MachineState::Running,
            program_counter: 0,
            input,
            output,
            token_cache,
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn arrays(&self) -> &ArrayTable {
        &self.arrays
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn program_counter(&self) -> usize {
        self.program_counter
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs statements until `stop;` or the first error.
    pub fn run(&mut self) -> Result<(), DuckError> {
        loop {
            if self.step()? == Step::Stopped {
                self.output.flush().map_err(output_error)?;
                info!("program stopped at statement {}", self.program_counter + 1);
                return Ok(());
            }
        }
    }

    /// Fetches and executes the statement under the program counter.
    pub fn step(&mut self) -> Result<Step, DuckError> {
        let Some(statement) = self.program.statement(self.program_counter) else {
            return Err(DuckError::semantic_error_with_help(
                Span::single(0),
                "Ran off the end of the program. No more lines to execute.".to_string(),
                "a program finishes only by executing 'stop;'".to_string(),
            ));
        };

        let number = self.program_counter + 1;
        let text = statement.text.clone();
        let offset = statement.source_offset;
        let line = statement.source_line;

        if self.state == MachineState::Terminated {
            return Err(DuckError::semantic_error(
                Span::new(0, text.len()),
                "There can be no statements after the end statement.".to_string(),
            )
            .in_statement(number, &text, offset));
        }

        self.execute(&text, line)
            .map_err(|e| e.in_statement(number, &text, offset))
    }

    fn execute(&mut self, text: &str, line: usize) -> Result<Step, DuckError> {
        if !text.trim_end_matches([' ', '\t']).ends_with(';') {
            return Err(DuckError::syntax_error(
                Span::single(text.len().saturating_sub(1)),
                "';' is missing from end of statement".to_string(),
            ));
        }

        let tokens = self.tokens_for(self.program_counter, text)?;
        let kind = classify(text, &tokens)?;
        debug!(
            "[{}] line {} {}: {}",
            self.program_counter + 1,
            line,
            kind,
            text
        );

        let mut parser = Parser::new(&tokens, text.len());
        let flow = match kind {
            StatementKind::Assignment => self.execute_assignment(&mut parser)?,
            StatementKind::If => self.execute_if(&mut parser)?,
            StatementKind::Goto => self.execute_goto(&mut parser)?,
            StatementKind::Dim => self.execute_dim(&mut parser)?,
            StatementKind::Print => self.execute_print(&mut parser)?,
            StatementKind::Read => self.execute_read(&mut parser)?,
            StatementKind::Stop => self.execute_stop(&mut parser)?,
            StatementKind::End => self.execute_end(&mut parser)?,
        };

        match flow {
            Flow::Next => self.program_counter += 1,
            Flow::Jump(target) => {
                debug!("jump {} -> {}", self.program_counter + 1, target + 1);
                self.program_counter = target;
            }
            Flow::Terminate => {
                self.state = MachineState::Terminated;
                self.program_counter += 1;
            }
            Flow::Stop => return Ok(Step::Stopped),
        }
        Ok(Step::Continue)
    }

    fn tokens_for(&mut self, index: usize, text: &str) -> Result<Rc<Vec<Token>>, DuckError> {
        if let Some(Some(tokens)) = self.token_cache.get(index) {
            return Ok(Rc::clone(tokens));
        }

        let tokens = Rc::new(tokenize(text)?);
        trace!(
            "tokens [{}]: {:?}",
            index + 1,
            tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>()
        );
        if let Some(slot) = self.token_cache.get_mut(index) {
            *slot = Some(Rc::clone(&tokens));
        }
        Ok(tokens)
    }

    fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.symbols, &self.arrays)
    }

    fn resolve_label(&self, label: &Token) -> Result<usize, DuckError> {
        self.program.label_location(&label.lexeme).ok_or_else(|| {
            DuckError::semantic_error(
                label.span,
                format!("'{}' is an undefined label", label.lexeme),
            )
        })
    }

    /// `name = expr;` or `name[expr] = expr;`
    fn execute_assignment(&mut self, parser: &mut Parser) -> Result<Flow, DuckError> {
        let name = parser.consume_identifier(
            "Invalid arithmetic statement. No proper variable or array to assign value to.",
        )?;

        let index = if parser.match_punctuation(Punctuation::LeftBracket) {
            Some(self.evaluator().evaluate_index(parser)?)
        } else {
            None
        };
        let target_span = name.span.to(parser.error_span());

        parser.consume_punctuation(
            Punctuation::Equal,
            "Invalid arithmetic statement. '=' is missing.",
        )?;
        let value = self.evaluator().evaluate(parser)?;
        parser.expect_end("Extraneous elements at the end of arithmetic statement.")?;

        match index {
            Some(index) => self
                .arrays
                .assign(&name.lexeme, index, value)
                .map_err(|e| e.at(target_span))?,
            None => self.symbols.record(&name.lexeme, value),
        }
        Ok(Flow::Next)
    }

    /// `if (expr) goto label;`
    fn execute_if(&mut self, parser: &mut Parser) -> Result<Flow, DuckError> {
        parser.consume_keyword(Keyword::If, "Invalid if statement.")?;
        if !parser.check_punctuation(Punctuation::LeftParen) {
            return Err(DuckError::syntax_error(
                parser.error_span(),
                "If statement conditions must be enclosed by parentheses.".to_string(),
            ));
        }

        // The condition ends at the `)` matching the opening one; `goto` must follow it.
        let remaining = parser.remaining();
        if let Some(close) = closing_paren(remaining) {
            if let Some(after) = remaining
                .get(close + 1)
                .filter(|t| !t.is_keyword(Keyword::Goto))
            {
                return Err(DuckError::syntax_error(
                    after.span,
                    "Invalid statement. If statement must have a goto.".to_string(),
                ));
            }
        }

        let condition = self.evaluator().evaluate(parser)?;
        parser.consume_keyword(
            Keyword::Goto,
            "Invalid statement. If statement must have a goto.",
        )?;
        let label = parser.consume_identifier("Goto statement must be followed by a label")?;
        parser.expect_end("Extraneous elements at the end of an if statement.")?;

        if condition != 0.0 {
            Ok(Flow::Jump(self.resolve_label(label)?))
        } else {
            Ok(Flow::Next)
        }
    }

    /// `goto label;`
    fn execute_goto(&mut self, parser: &mut Parser) -> Result<Flow, DuckError> {
        parser.consume_keyword(Keyword::Goto, "Invalid goto statement.")?;
        let label = parser.consume_identifier("Goto statement must be followed by a label")?;
        parser.expect_end("Extraneous elements at the end of a goto statement.")?;
        Ok(Flow::Jump(self.resolve_label(label)?))
    }

    /// `dim name[size];`
    fn execute_dim(&mut self, parser: &mut Parser) -> Result<Flow, DuckError> {
        const FORM: &str = "Array variable name must be of the form: 'dim <array name>[<array size>]'.";

        parser.consume_keyword(Keyword::Dim, "Invalid array declaration statement.")?;
        let name = match parser.peek() {
            Some(token) if token.token_type == TokenType::Identifier => {
                parser.advance();
                token
            }
            Some(token) => {
                return Err(DuckError::syntax_error(
                    token.span,
                    format!("'{}' is an invalid array name.", token.lexeme),
                ));
            }
            None => return Err(DuckError::syntax_error(parser.error_span(), FORM.to_string())),
        };

        parser.consume_punctuation(Punctuation::LeftBracket, FORM)?;
        let size = self.evaluator().evaluate(parser)?;
        parser.consume_punctuation(Punctuation::RightBracket, FORM)?;
        let span = name.span.to(parser.error_span());
        parser.expect_end("Incorrect syntax for array declaration statement.")?;

        let size = self
            .arrays
            .declare(&name.lexeme, size)
            .map_err(|e| e.at(span))?;
        debug!("declared array {}[{}]", name.lexeme, size);
        Ok(Flow::Next)
    }

    /// `print item, item, ...;` where an item is a quoted string or an expression.
    fn execute_print(&mut self, parser: &mut Parser) -> Result<Flow, DuckError> {
        parser.consume_keyword(Keyword::Print, "Invalid print statement.")?;

        loop {
            match parser.peek() {
                Some(token) if token.token_type == TokenType::String => {
                    parser.advance();
                    write!(self.output, "{}", token.lexeme).map_err(output_error)?;
                }
                Some(token) if can_start_expression(token) => {
                    let value = self.evaluator().evaluate(parser)?;
                    write!(self.output, "{}", format_number(value)).map_err(output_error)?;
                }
                _ => {
                    return Err(DuckError::syntax_error_with_help(
                        parser.error_span(),
                        "Invalid print statement.".to_string(),
                        "print takes quoted strings and expressions separated by ','".to_string(),
                    ));
                }
            }

            if !parser.match_punctuation(Punctuation::Comma) {
                break;
            }
        }

        writeln!(self.output).map_err(output_error)?;
        parser.expect_end("Extraneous elements at the end of print statement.")?;
        Ok(Flow::Next)
    }

    /// `read ["prompt",] var, arr[expr], ...;`
    fn execute_read(&mut self, parser: &mut Parser) -> Result<Flow, DuckError> {
        parser.consume_keyword(Keyword::Read, "Invalid read statement.")?;

        if let Some(prompt) = parser.peek().filter(|t| t.token_type == TokenType::String) {
            parser.advance();
            write!(self.output, "{}", prompt.lexeme).map_err(output_error)?;
            parser.consume_punctuation(
                Punctuation::Comma,
                "Need comma separation in read statement",
            )?;
        }

        loop {
            let name = parser.consume_identifier(
                "Invalid syntax for read statement. Expected a variable to read into.",
            )?;
            let value = self.read_number(name)?;

            if parser.match_punctuation(Punctuation::LeftBracket) {
                let index = self.evaluator().evaluate_index(parser)?;
                let span = name.span.to(parser.error_span());
                self.arrays
                    .assign(&name.lexeme, index, value)
                    .map_err(|e| e.at(span))?;
            } else {
                self.symbols.record(&name.lexeme, value);
            }

            if !parser.match_punctuation(Punctuation::Comma) {
                break;
            }
        }

        parser.expect_end("Extraneous elements at the end of read statement.")?;
        Ok(Flow::Next)
    }

    /// Blocks for the next non-blank input line and parses it as a number.
    fn read_number(&mut self, name: &Token) -> Result<f64, DuckError> {
        self.output.flush().map_err(output_error)?;

        let mut line = String::new();
        loop {
            line.clear();
            let read = self.input.read_line(&mut line).map_err(|e| {
                DuckError::semantic_error(name.span, format!("Could not read input: {}", e))
            })?;
            if read == 0 {
                return Err(DuckError::semantic_error(
                    name.span,
                    format!("Unexpected end of input while reading '{}'.", name.lexeme),
                ));
            }

            let entry = line.trim();
            if entry.is_empty() {
                continue;
            }
            if !is_valid_number(entry) {
                return Err(DuckError::semantic_error(
                    name.span,
                    format!("Input value '{}' is not a valid number", entry),
                ));
            }
            return entry.parse::<f64>().map_err(|_| {
                DuckError::semantic_error(
                    name.span,
                    format!("Input value '{}' is not a valid number", entry),
                )
            });
        }
    }

    fn execute_stop(&mut self, parser: &mut Parser) -> Result<Flow, DuckError> {
        parser.consume_keyword(Keyword::Stop, "Invalid stop statement")?;
        parser.expect_end("Invalid stop statement")?;
        Ok(Flow::Stop)
    }

    fn execute_end(&mut self, parser: &mut Parser) -> Result<Flow, DuckError> {
        parser.consume_keyword(Keyword::End, "Invalid end statement")?;
        parser.expect_end("Invalid end statement")?;
        Ok(Flow::Terminate)
    }
}

/// Position of the `)` that closes the `(` at the front of `tokens`.
fn closing_paren(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.token_type {
            TokenType::Punctuation(Punctuation::LeftParen) => depth += 1,
            TokenType::Punctuation(Punctuation::RightParen) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn can_start_expression(token: &Token) -> bool {
    matches!(
        token.token_type,
        TokenType::Number(_)
            | TokenType::Identifier
            | TokenType::Operator(_)
            | TokenType::Punctuation(Punctuation::LeftParen)
    )
}

pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

fn output_error(err: std::io::Error) -> DuckError {
    DuckError::semantic_error(Span::single(0), format!("Could not write output: {}", err))
}
