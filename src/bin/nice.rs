//! Command-line driver.
//!
//! When called without argument it drops into an interactive read-evaluate-print loop where
//! variables persist from one line to the next.
//!
//! When called with a single argument, it interprets the corresponding file and exits with
//! status 69 if the script had a syntax or runtime error.

use std::env;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::process;

use anyhow::{self, Context};

use nice::config::Config;
use nice::interpreter::{Interpreter, EXIT_FAILURE};

/// Exit status when the script cannot be read or output cannot be written.
const EXIT_IO_ERROR: i32 = 74;

fn main() {
    let config = Config::from_env();
    env_logger::Builder::new()
        .parse_filters(&config.log_filter)
        .init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    let status = match args.as_slice() {
        [] => run_prompt(config).map(|()| 0),
        [path] => run_file(path, config),
        _ => {
            println!("Usage: 69 [script]");
            Ok(EXIT_FAILURE)
        }
    };

    match status {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(EXIT_IO_ERROR);
        }
    }
}

fn run_file(path: &str, config: Config) -> Result<i32, anyhow::Error> {
    let bytes = fs::read(path).with_context(|| format!("Could not open file \"{}\".", path))?;
    let source = String::from_utf8_lossy(&bytes);

    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let mut interp = Interpreter::with_config(&mut stdout, &mut stderr, config);
    interp.run(&source)?;
    interp.output().flush()?;

    Ok(interp.exit_code())
}

fn run_prompt(config: Config) -> Result<(), anyhow::Error> {
    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let mut interp = Interpreter::with_config(&mut stdout, &mut stderr, config);
    let prompt = interp.config().prompt.clone();

    let mut input = Vec::new();
    loop {
        let repl_stdout = interp.output();
        repl_stdout.write_all(prompt.as_bytes())?;
        repl_stdout.flush()?;

        input.clear();
        let nbytes = stdin.read_until(b'\n', &mut input)?;
        if nbytes == 0 {
            break;
        }

        // Invalid UTF-8 is replaced rather than ending the session.
        let line = String::from_utf8_lossy(&input);
        interp.run(line.trim_end_matches(&['\n', '\r'][..]))?;
        interp.reset_error();
    }

    Ok(())
}
