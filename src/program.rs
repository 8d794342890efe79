use crate::error::{DuckError, Span};
use crate::rules::{is_blank, is_valid_identifier, leading_word, trim_blanks};
use log::debug;
use std::collections::HashMap;

/// One executable statement after comments and its label were removed.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceStatement {
    pub text: String,
    /// 1-based line in the source file.
    pub source_line: usize,
    /// Byte offset of `text` inside the source file.
    pub source_offset: usize,
}

/// The statement store: every statement in program order plus the label
/// table. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Program {
    statements: Vec<SourceStatement>,
    labels: HashMap<String, usize>,
}

impl Program {
    /// Splits source text into statements. Blank and comment-only lines are
    /// dropped, so statement numbers can differ from file line numbers.
    pub fn parse(source: &str) -> Result<Self, DuckError> {
        let mut program = Program::default();
        let mut has_stop = false;
        let mut line_start = 0;

        for (line_index, raw_line) in source.split_inclusive('\n').enumerate() {
            let offset = line_start;
            line_start += raw_line.len();

            let line = raw_line.trim_end_matches(['\n', '\r']);
            let code = strip_comment(line);
            let leading = code.len() - code.trim_start_matches(is_blank).len();
            let code = trim_blanks(code);
            if code.is_empty() {
                continue;
            }

            let code_offset = offset + leading;
            let number = program.statements.len() + 1;
            let (label, text, text_offset) = split_label(code)
                .map_err(|e| e.in_statement(number, code, code_offset))?;

            if text.is_empty() {
                return Err(DuckError::syntax_error(
                    Span::new(0, code.len()),
                    "Labeled line has no adjoining statement.".to_string(),
                )
                .in_statement(number, code, code_offset));
            }

            if leading_word(text) == "stop" {
                has_stop = true;
            }

            if let Some(name) = label {
                if let Some(&previous) = program.labels.get(&name) {
                    return Err(DuckError::syntax_error(
                        Span::new(0, name.len()),
                        format!(
                            "Multiple labels with the same name: '{}' already labels statement {}.",
                            name,
                            previous + 1
                        ),
                    )
                    .in_statement(number, code, code_offset));
                }
                program.labels.insert(name, program.statements.len());
            }

            program.statements.push(SourceStatement {
                text: text.to_string(),
                source_line: line_index + 1,
                source_offset: code_offset + text_offset,
            });
        }

        if !has_stop {
            return Err(DuckError::semantic_error_with_help(
                Span::single(0),
                "Missing stop statement.".to_string(),
                "every program needs at least one 'stop;' to finish".to_string(),
            ));
        }

        debug!(
            "loaded {} statements, {} labels",
            program.statements.len(),
            program.labels.len()
        );
        Ok(program)
    }

    pub fn statement(&self, index: usize) -> Option<&SourceStatement> {
        self.statements.get(index)
    }

    pub fn label_location(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }
}

/// Cuts the line at the first `//` that is not inside a quoted string.
fn strip_comment(line: &str) -> &str {
    for (at, _) in line.match_indices("//") {
        let quotes = line[..at].matches('"').count();
        if quotes % 2 == 0 {
            return &line[..at];
        }
    }
    line
}

/// Separates an optional `label:` prefix. A colon that comes after a quote
/// belongs to a string, not to a label. Returns the label, the remaining
/// statement text and that text's offset within `code`.
fn split_label(code: &str) -> Result<(Option<String>, &str, usize), DuckError> {
    let Some(colon) = code.find(':') else {
        return Ok((None, code, 0));
    };
    if code[..colon].contains('"') {
        return Ok((None, code, 0));
    }

    let label = trim_blanks(&code[..colon]);
    if !is_valid_identifier(label) {
        return Err(DuckError::syntax_error_with_help(
            Span::new(0, colon.max(1)),
            format!("'{}' is an invalid label name.", label),
            "labels are identifiers that are not keywords".to_string(),
        ));
    }

    let after = &code[colon + 1..];
    let leading = after.len() - after.trim_start_matches(is_blank).len();
    let text = trim_blanks(after);
    Ok((Some(label.to_string()), text, colon + 1 + leading))
}
