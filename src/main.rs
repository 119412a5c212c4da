use std::io::Read;
use std::process::ExitCode;

use minilisp::config::{Config, USAGE};
use minilisp::{Environment, Error, eval_str, load_prelude};

fn report(e: &Error, source_id: &str, input: &str) {
    // The plain-message fallback already ran if rendering failed.
    if let Err(io_err) = e.pretty_print(source_id, input) {
        log::error!("could not write error report for {}: {}", source_id, io_err);
    }
}

fn main() -> ExitCode {
    pretty_env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };

    let global_env = Environment::new_global_populated();

    match config.read_prelude() {
        Ok(Some(prelude)) => {
            if let Err(e) = load_prelude(&prelude, global_env.clone()) {
                report(&e, "prelude", &prelude);
                return ExitCode::FAILURE;
            }
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("Could not read prelude: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let (source_id, program) = match &config.program {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => (path.display().to_string(), text),
            Err(e) => {
                eprintln!("Could not read {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut text = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut text) {
                eprintln!("Could not read standard input: {}", e);
                return ExitCode::FAILURE;
            }
            ("stdin".to_string(), text)
        }
    };

    match eval_str(&program, global_env) {
        Ok(result) => {
            println!("{}", result);
            ExitCode::SUCCESS
        }
        Err(e) => {
            report(&e, &source_id, &program);
            ExitCode::FAILURE
        }
    }
}
