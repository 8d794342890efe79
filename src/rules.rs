//! Character and word classification shared by the lexer, the statement
//! classifier and the program loader.

/// Words that can never name a variable, array or label.
pub const RESERVED_KEYWORDS: [&str; 7] = ["dim", "read", "goto", "if", "print", "stop", "end"];

/// Two-character operators, tried before their one-character prefixes.
pub const MULTI_CHAR_OPERATORS: [&str; 4] = ["==", ">=", "<=", "!="];

/// Spaces and tabs separate elements; nothing else counts as blank.
pub fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Characters that form an element on their own and end any word before them.
pub fn is_syntactic_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '<' | '>' | '!' | '(' | ')' | '[' | ']' | '=' | ',' | ';' | '"'
    ) || is_blank(c)
}

pub fn is_reserved_keyword(text: &str) -> bool {
    RESERVED_KEYWORDS.contains(&text)
}

/// `[A-Za-z_][A-Za-z0-9_]*` that is not a reserved keyword.
pub fn is_valid_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !is_reserved_keyword(text)
}

/// Optional single leading sign, then digits with at most one decimal point.
/// At least one digit is required, so `+`, `-` and `.` alone are rejected.
pub fn is_valid_number(text: &str) -> bool {
    let body = text
        .strip_prefix('+')
        .or_else(|| text.strip_prefix('-'))
        .unwrap_or(text);

    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in body.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

/// The leading run of identifier characters, used to spot a statement's first word.
pub fn leading_word(text: &str) -> &str {
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    &text[..end]
}

/// Strips spaces, tabs and a stray carriage return from both ends.
pub fn trim_blanks(text: &str) -> &str {
    text.trim_matches(|c: char| is_blank(c) || c == '\r')
}
