// Declare modules publicly so they are part of the library interface
pub mod config;
pub mod environment;
pub mod evaluator;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod pretty_print;
pub mod primitives;
pub mod source;
pub mod types;

pub use environment::{Env, EnvError, Environment};
pub use evaluator::{EvalError, EvalResult, evaluate};
pub use interpreter::{Error, eval_str, load_prelude};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::{BuildError, parse_str};
pub use source::Span;
pub use types::{Term, TermKind, Value};
