// Duck Language Interpreter Library
//
// Core of the interpreter for the Duck teaching language: numbered, labeled
// statements executed one at a time under an explicit program counter.

// Public modules
pub mod error;
pub mod evaluator;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod program;
pub mod rules;
pub mod runner;
pub mod statement;
pub mod tables;

// Re-export commonly used items
pub use error::{DuckError, ErrorKind, Span};
pub use evaluator::{evaluate_expression, Evaluator};
pub use interpreter::{Interpreter, MachineState, Step};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::Parser;
pub use program::Program;
pub use statement::{classify, StatementKind};
pub use tables::{ArrayTable, SymbolTable};

// Re-export main functions
pub use runner::{execute, run};
