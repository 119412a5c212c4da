use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_HISTORY_FILE: &str = "minilisp_history.txt";
pub const PRELUDE_ENV_VAR: &str = "MINILISP_PRELUDE";
pub const HISTORY_ENV_VAR: &str = "MINILISP_HISTORY";

pub const USAGE: &str = "usage: minilisp [--prelude FILE] [--history FILE] [--emacs | --vi] [PROGRAM]";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("option '{0}' expects a value")]
    MissingValue(String),
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Vi,
    Emacs,
}

impl From<EditMode> for rustyline::EditMode {
    fn from(mode: EditMode) -> Self {
        match mode {
            EditMode::Vi => rustyline::EditMode::Vi,
            EditMode::Emacs => rustyline::EditMode::Emacs,
        }
    }
}

/// Startup settings shared by the script runner and the REPL.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Source evaluated into the root environment before any user input.
    pub prelude: Option<PathBuf>,
    pub history_file: PathBuf,
    pub edit_mode: EditMode,
    /// Program to run; standard input is read when absent.
    pub program: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prelude: None,
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            edit_mode: EditMode::default(),
            program: None,
        }
    }
}

impl Config {
    /// Reads the process arguments, falling back to environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_args(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    /// Flags win over variables; `var` looks up an environment variable.
    pub fn from_args<I, V>(args: I, var: V) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
        V: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(path) = var(PRELUDE_ENV_VAR) {
            config.prelude = Some(PathBuf::from(path));
        }
        if let Some(path) = var(HISTORY_ENV_VAR) {
            config.history_file = PathBuf::from(path);
        }

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--prelude" => config.prelude = Some(expect_value(&arg, args.next())?),
                "--history" => config.history_file = expect_value(&arg, args.next())?,
                "--emacs" => config.edit_mode = EditMode::Emacs,
                "--vi" => config.edit_mode = EditMode::Vi,
                flag if flag.starts_with("--") => {
                    return Err(ConfigError::UnknownOption(flag.to_string()));
                }
                path if config.program.is_none() => config.program = Some(PathBuf::from(path)),
                other => return Err(ConfigError::UnexpectedArgument(other.to_string())),
            }
        }
        Ok(config)
    }

    /// Returns the prelude text, if one is configured.
    pub fn read_prelude(&self) -> std::io::Result<Option<String>> {
        self.prelude
            .as_ref()
            .map(std::fs::read_to_string)
            .transpose()
    }
}

fn expect_value(flag: &str, value: Option<String>) -> Result<PathBuf, ConfigError> {
    value
        .map(PathBuf::from)
        .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}
