use crate::environment::Env;
use crate::evaluator::{EvalError, evaluate_sequence};
use crate::parser::{BuildError, parse_str};
use crate::source::Span;
use crate::types::Value;
use thiserror::Error;

/// Anything that can abort a program: building its terms or evaluating them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl Error {
    pub fn span(&self) -> Span {
        match self {
            Error::Build(err) => err.span(),
            Error::Eval(err) => err.span(),
        }
    }
}

/// Reads, builds and evaluates every top-level form of `input` in `env`.
/// The value of the last form is the result; an empty program yields nil.
pub fn eval_str(input: &str, env: Env) -> Result<Value, Error> {
    let terms = parse_str(input)?;
    Ok(evaluate_sequence(&terms, env)?)
}

/// Evaluates prelude source into `env` ahead of user input, so its
/// definitions are visible alongside the builtins.
pub fn load_prelude(prelude: &str, env: Env) -> Result<(), Error> {
    let terms = parse_str(prelude)?;
    log::info!("loading prelude ({} top-level forms)", terms.len());
    evaluate_sequence(&terms, env)?;
    Ok(())
}
