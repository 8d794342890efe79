use ariadne::{Color, Config, Fmt, IndexType, Label, Report, ReportKind, Source};
use std::fmt;

/// Byte range inside a single statement's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    SyntaxError,
    ExpressionError,
    SemanticError,
}

/// Where in the program a failure happened. Attached by the interpreter,
/// never by the lexer or evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementContext {
    /// 1-based statement number.
    pub number: usize,
    pub text: String,
    /// Byte offset of the statement text inside the whole source file.
    pub source_offset: usize,
}

#[derive(Debug, Clone)]
pub struct DuckError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
    pub context: Option<StatementContext>,
}

impl DuckError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
            context: None,
        }
    }

    pub fn new_with_help(kind: ErrorKind, span: Span, message: String, help: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: Some(help),
            context: None,
        }
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::LexError, span, message)
    }

    pub fn syntax_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::SyntaxError, span, message)
    }

    pub fn syntax_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::SyntaxError, span, message, help)
    }

    pub fn expression_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::ExpressionError, span, message)
    }

    pub fn expression_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::ExpressionError, span, message, help)
    }

    pub fn semantic_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::SemanticError, span, message)
    }

    pub fn semantic_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::SemanticError, span, message, help)
    }

    /// Pins the error to the statement that was executing. An error that
    /// already carries a context keeps it.
    pub fn in_statement(mut self, number: usize, text: &str, source_offset: usize) -> Self {
        if self.context.is_none() {
            self.context = Some(StatementContext {
                number,
                text: text.to_string(),
                source_offset,
            });
        }
        self
    }

    /// The one-line report printed at the process boundary.
    pub fn headline(&self) -> String {
        match &self.context {
            Some(ctx) => format!(
                "Error: Line {}: \"{}\": {}",
                ctx.number, ctx.text, self.message
            ),
            None => format!("Error: {}", self.message),
        }
    }

    pub fn report(&self, source: &str, filename: Option<&str>, color: bool) {
        eprintln!("{}", self.headline());

        if let Some(snippet) = self.render(source, filename, color) {
            eprint!("{}", snippet);
        }
    }

    /// The labeled source snippet for errors tied to a statement. Spans and
    /// offsets are byte positions, so multi-byte text before the statement
    /// does not shift the label.
    pub fn render(&self, source: &str, filename: Option<&str>, color: bool) -> Option<String> {
        let ctx = self.context.as_ref()?;
        let filename = filename.unwrap_or("<program>");

        let label_color = match self.kind {
            ErrorKind::LexError => Color::Red,
            ErrorKind::SyntaxError => Color::Yellow,
            ErrorKind::ExpressionError => Color::Blue,
            ErrorKind::SemanticError => Color::Magenta,
        };

        let kind_str = match self.kind {
            ErrorKind::LexError => "Lexical Error",
            ErrorKind::SyntaxError => "Syntax Error",
            ErrorKind::ExpressionError => "Expression Error",
            ErrorKind::SemanticError => "Semantic Error",
        };

        // Clamp so a span past the statement end still lands on its last byte.
        let len = ctx.text.len().max(1);
        let start_rel = self.span.start.min(len - 1);
        let end_rel = self.span.end.max(start_rel + 1).min(len);
        let start = ctx.source_offset + start_rel;
        let end = ctx.source_offset + end_rel;

        let title = if color {
            format!("{}: {}", kind_str.fg(label_color), self.message)
        } else {
            format!("{}: {}", kind_str, self.message)
        };

        let mut report_builder = Report::build(ReportKind::Error, filename, start)
            .with_config(
                Config::default()
                    .with_color(color)
                    .with_index_type(IndexType::Byte),
            )
            .with_message(title)
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(label_color),
            );

        if let Some(ref help_text) = self.help {
            let note = if color {
                format!("{}: {}", "help".fg(Color::Cyan), help_text)
            } else {
                format!("help: {}", help_text)
            };
            report_builder = report_builder.with_note(note);
        }

        let mut rendered = Vec::new();
        if let Err(err) = report_builder
            .finish()
            .write((filename, Source::from(source)), &mut rendered)
        {
            log::warn!("could not render diagnostic: {}", err);
            return None;
        }
        Some(String::from_utf8_lossy(&rendered).into_owned())
    }
}

impl fmt::Display for DuckError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DuckError {}
