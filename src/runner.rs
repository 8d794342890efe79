use crate::error::DuckError;
use crate::interpreter::Interpreter;
use crate::program::Program;
use log::{info, LevelFilter};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Options collected from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub path: PathBuf,
    pub color: bool,
    pub log_level: LevelFilter,
}

/// Loads and runs a program against the given input and output. `Ok` means
/// the program reached `stop;`.
pub fn execute<R: BufRead, W: Write>(source: &str, input: R, output: W) -> Result<(), DuckError> {
    let program = Program::parse(source)?;
    info!(
        "program has {} statements and {} labels",
        program.len(),
        program.label_count()
    );

    let mut interpreter = Interpreter::new(program, input, output);
    interpreter.run()
}

/// Runs a program on stdin/stdout and returns the process exit status:
/// 0 after `stop;`, 1 after any error.
pub fn run(source: &str, filename: Option<&str>, color: bool) -> i32 {
    let stdin = io::stdin();
    let stdout = io::stdout();

    match execute(source, stdin.lock(), stdout.lock()) {
        Ok(()) => 0,
        Err(error) => {
            // Anything printed before the failure must appear before the report.
            let _ = io::stdout().flush();
            error.report(source, filename, color);
            1
        }
    }
}
