use clap::{Arg, ArgAction, Command};
use duck::runner::{self, RunConfig};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::fs;
use std::path::PathBuf;

fn main() {
    let matches = Command::new("duck")
        .about("Interpreter for the Duck teaching language")
        .arg(
            Arg::new("file")
                .help("The Duck program to execute")
                .value_name("FILE")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log interpreter activity to stderr (repeat for more detail)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colors in error diagnostics")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = match matches.get_count("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let config = RunConfig {
        // `file` is required, so clap has already rejected a missing argument.
        path: matches
            .get_one::<String>("file")
            .map(PathBuf::from)
            .unwrap_or_default(),
        color: !matches.get_flag("no-color"),
        log_level,
    };

    if let Err(e) = SimpleLogger::new().with_level(config.log_level).init() {
        eprintln!("Warning: could not initialise logging: {}", e);
    }

    std::process::exit(run_file(&config));
}

fn run_file(config: &RunConfig) -> i32 {
    let path = config.path.as_path();

    match fs::read_to_string(path) {
        Ok(source) => {
            let filename = path.display().to_string();
            runner::run(&source, Some(&filename), config.color)
        }
        Err(e) => {
            eprintln!("Error: Could not open the file: {} ({})", path.display(), e);
            1
        }
    }
}
