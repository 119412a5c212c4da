use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};

use minilisp::config::{Config, USAGE};
use minilisp::lexer::{LexemeKind, lex};
use minilisp::{Env, Environment, eval_str, load_prelude};

struct LispCompleter {
    env: Env,
}

impl LispCompleter {
    fn new(env: Env) -> Self {
        LispCompleter { env }
    }
}

impl rustyline::completion::Completer for LispCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let prefix = match lex(&line[..pos]).pop() {
            Some(lexeme) if lexeme.span.end == pos => match lexeme.kind {
                LexemeKind::Atom(prefix) => prefix,
                _ => return Ok((pos, vec![])),
            },
            _ => return Ok((pos, vec![])),
        };
        let mut candidates: Vec<String> = self
            .env
            .borrow()
            .get_identifiers()
            .into_iter()
            .filter_map(|id| id.strip_prefix(prefix.as_str()).map(str::to_string))
            .filter(|rest| !rest.is_empty())
            .collect();
        candidates.sort();
        Ok((pos, candidates))
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct InputValidator {
    #[rustyline(Validator)]
    validator: LispValidator,
    #[rustyline(Highlighter)]
    highlighter: LispHighlighter,
    #[rustyline(Completer)]
    completer: LispCompleter,
}

struct LispValidator;

impl Validator for LispValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();
        let mut depth = 0usize;
        let mut in_string = false;

        for (i, c) in input.chars().enumerate() {
            if in_string {
                if c == '"' {
                    in_string = false;
                }
                continue;
            }

            match c {
                '"' => in_string = true,
                '(' => depth += 1,
                ')' => {
                    if depth == 0 {
                        return Ok(ValidationResult::Invalid(Some(format!(
                            "  - Unmatched ')' at position {}",
                            i
                        ))));
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }

        if in_string || depth > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

struct LispHighlighter;

impl Highlighter for LispHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> std::borrow::Cow<'l, str> {
        // (byte offset in `line`, byte offset in `highlighted`) of each open paren
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut highlighted = String::new();
        let mut in_string = false;
        let cursor = pos.checked_sub(1);

        for (i, c) in line.char_indices() {
            if in_string {
                if c == '"' {
                    in_string = false;
                }
                highlighted.push_str(&format!("\x1b[32m{}\x1b[0m", c)); // Green for strings
                continue;
            }

            match c {
                '"' => {
                    in_string = true;
                    highlighted.push_str(&format!("\x1b[32m{}\x1b[0m", c));
                }
                '(' => {
                    stack.push((i, highlighted.len()));
                    highlighted.push(c);
                }
                ')' => match stack.pop() {
                    Some((matching_index, matching_pos)) => {
                        if cursor == Some(i) || cursor == Some(matching_index) {
                            highlighted.push_str(&format!("\x1b[34m{}\x1b[0m", c)); // Blue for matching parens
                            highlighted.replace_range(
                                matching_pos..=matching_pos,
                                "\x1b[1;34m(\x1b[0m",
                            );
                        } else {
                            highlighted.push(c);
                        }
                    }
                    None => highlighted.push_str(&format!("\x1b[31m{}\x1b[0m", c)), // Red for unmatched
                },
                _ => highlighted.push(c),
            }
        }

        std::borrow::Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn main() -> rustyline::Result<()> {
    pretty_env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    println!("minilisp REPL v0.1.0");
    println!("Type 'exit' or press Ctrl-D to quit.");

    let global_env = Environment::new_global_populated();
    match config.read_prelude() {
        Ok(Some(prelude)) => {
            if let Err(e) = load_prelude(&prelude, global_env.clone()) {
                e.pretty_print("prelude", &prelude)?;
            }
        }
        Ok(None) => {}
        Err(e) => eprintln!("Could not read prelude: {}", e),
    }

    let h = InputValidator {
        highlighter: LispHighlighter,
        validator: LispValidator,
        completer: LispCompleter::new(global_env.clone()),
    };
    let rl_config = rustyline::config::Config::builder()
        .edit_mode(config.edit_mode.into())
        .build();
    let mut rl = Editor::with_config(rl_config)?;
    rl.set_helper(Some(h));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(&config.history_file).is_err() {
        println!("No previous history.");
    }

    loop {
        let readline = rl.readline("minilisp> ");
        match readline {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let trimmed_input = line.trim();
                if trimmed_input.is_empty() {
                    continue;
                }
                if trimmed_input.eq_ignore_ascii_case("exit") {
                    break;
                }

                // Definitions accumulate in the same root environment.
                match eval_str(trimmed_input, global_env.clone()) {
                    Ok(result) => println!("{}", result),
                    Err(e) => e.pretty_print("REPL", trimmed_input)?,
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(&config.history_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN_MATCH: &str = "\x1b[1;34m(\x1b[0m";
    const CLOSE_MATCH: &str = "\x1b[34m)\x1b[0m";

    #[test]
    fn test_highlight_matching_parens() {
        let highlighted = LispHighlighter.highlight("(a (b))", 7);
        assert!(highlighted.starts_with(OPEN_MATCH), "{:?}", highlighted);
        assert!(highlighted.ends_with(CLOSE_MATCH), "{:?}", highlighted);
    }

    #[test]
    fn test_highlight_after_multibyte_chars() {
        // The cursor is a byte offset; "é" takes two bytes.
        let line = "(é (a))";
        let highlighted = LispHighlighter.highlight(line, line.len());
        assert!(highlighted.starts_with(OPEN_MATCH), "{:?}", highlighted);
        assert!(highlighted.ends_with(CLOSE_MATCH), "{:?}", highlighted);
        assert_eq!(highlighted.matches(CLOSE_MATCH).count(), 1);
    }

    #[test]
    fn test_highlight_unmatched_close() {
        let highlighted = LispHighlighter.highlight("a)", 0);
        assert_eq!(highlighted, "a\x1b[31m)\x1b[0m");
    }
}
