use crate::environment::{Env, EnvError, Environment};
use crate::source::Span;
use crate::types::{Closure, Term, TermKind, Value};
use std::rc::Rc;
use thiserror::Error;

// --- Evaluation Error ---
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error(transparent)]
    EnvError(#[from] EnvError), // Errors from environment lookup
    #[error("Evaluation Error: Expected a procedure, but got: {0}")]
    NotAProcedure(Value, Span), // Tried to call something that isn't a procedure
    #[error("Evaluation Error: Invalid arguments - {0}")]
    InvalidArguments(String, Span), // Wrong count or type of args to a primitive
    #[error("Evaluation Error: lambda expects at least {expected} arguments, got {found}")]
    ArityMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },
    #[error("Evaluation Error: Expected a symbol, but got: {0}")]
    NotASymbol(Term, Span), // Expected a symbol (def/defmacro names)
    #[error("Evaluation Error: Invalid special form - {0}")]
    InvalidSpecialForm(String, Span), // Malformed special form (e.g., (if cond))
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::EnvError(EnvError::UnboundVariable(_, span))
            | EvalError::NotAProcedure(_, span)
            | EvalError::InvalidArguments(_, span)
            | EvalError::ArityMismatch { span, .. }
            | EvalError::NotASymbol(_, span)
            | EvalError::InvalidSpecialForm(_, span) => *span,
        }
    }
}

// Result type alias for convenience
pub type EvalResult<T = Value> = Result<T, EvalError>;

// --- Evaluate Function ---

/// Evaluates a term within the specified environment.
///
/// There is no tail-call elimination: unbounded recursion in the evaluated
/// program ends with the host stack being exhausted.
pub fn evaluate(term: &Term, env: Env) -> EvalResult {
    match &term.kind {
        TermKind::Literal(value) => Ok(value.clone()),

        TermKind::SymbolRef(name) => Ok(env.borrow().get(name, term.span)?),

        // Capture the current environment by reference, not by copy.
        TermKind::Lambda(lambda) => Ok(Value::Closure(Rc::new(Closure {
            lambda: lambda.clone(),
            env,
        }))),

        TermKind::Application(terms) => match terms.split_first() {
            Some((head, args)) => evaluate_application(head, args, env, term.span),
            None => Ok(Value::empty_list()),
        },
    }
}

/// Evaluates top-level forms in order, returning the value of the last one.
pub fn evaluate_sequence(terms: &[Term], env: Env) -> EvalResult {
    let mut result = Value::Nil;
    for term in terms {
        result = evaluate(term, env.clone())?;
    }
    Ok(result)
}

fn evaluate_application(head: &Term, args: &[Term], env: Env, span: Span) -> EvalResult {
    // A literal head (e.g. from `apply`) is used as is; anything else,
    // including a nested application, is evaluated to find the callable.
    let operator = evaluate(head, env.clone())?;
    log::trace!("apply {} to {} argument(s) at {}", operator, args.len(), span);

    match operator {
        Value::SpecialForm(form) => (form.func)(args, env, span),
        Value::Macro(closure) => {
            let raw = args.iter().map(|arg| arg.to_datum(&env)).collect();
            invoke_closure(&closure, raw, span)
        }
        procedure @ (Value::Primitive(_) | Value::Closure(_)) => {
            let evaluated = evaluate_arguments(args, &env)?;
            apply_procedure(procedure, evaluated, env, span)
        }
        other => Err(EvalError::NotAProcedure(other, head.span)),
    }
}

fn evaluate_arguments(args: &[Term], env: &Env) -> EvalResult<Vec<Value>> {
    args.iter().map(|arg| evaluate(arg, env.clone())).collect()
}

/// Applies an already evaluated callable to already evaluated arguments.
/// Special forms receive the arguments converted back into terms.
pub fn apply_procedure(procedure: Value, args: Vec<Value>, env: Env, span: Span) -> EvalResult {
    match procedure {
        Value::Primitive(primitive) => (primitive.func)(args, env, span),
        Value::Closure(closure) | Value::Macro(closure) => invoke_closure(&closure, args, span),
        Value::SpecialForm(form) => {
            let terms: Vec<Term> = args
                .into_iter()
                .map(|arg| Term::from_datum(arg, span))
                .collect();
            (form.func)(&terms, env, span)
        }
        other => Err(EvalError::NotAProcedure(other, span)),
    }
}

fn invoke_closure(closure: &Closure, args: Vec<Value>, span: Span) -> EvalResult {
    let lambda = &closure.lambda;
    if args.len() < lambda.params.len() {
        return Err(EvalError::ArityMismatch {
            expected: lambda.params.len(),
            found: args.len(),
            span,
        });
    }

    log::trace!("call lambda {:?} with {} argument(s)", lambda.params, args.len());

    // The new frame hangs off the captured environment, not the caller's.
    let call_env = Environment::new_enclosed(closure.env.clone());
    {
        let mut frame = call_env.borrow_mut();
        // Surplus arguments are ignored.
        for (param, arg) in lambda.params.iter().zip(args) {
            if let Some(name) = param {
                frame.define(name.clone(), arg);
            }
        }
    }

    let mut result = Value::Nil;
    for term in &lambda.body {
        result = evaluate(term, call_env.clone())?;
    }
    Ok(result)
}

// --- Special Forms ---

pub fn evaluate_quote(operands: &[Term], env: Env, span: Span) -> EvalResult {
    match operands.first() {
        Some(term) => Ok(term.to_datum(&env)),
        None => Err(EvalError::InvalidSpecialForm(
            "quote expects an argument".to_string(),
            span,
        )),
    }
}

pub fn evaluate_if(operands: &[Term], env: Env, span: Span) -> EvalResult {
    if let [condition, consequent, alternate] = operands {
        // Only the boolean `true` selects the consequent.
        match evaluate(condition, env.clone())? {
            Value::Boolean(true) => evaluate(consequent, env),
            _ => evaluate(alternate, env),
        }
    } else {
        Err(EvalError::InvalidSpecialForm(
            format!(
                "if expects condition, consequent and alternate, got {} argument(s)",
                operands.len()
            ),
            span,
        ))
    }
}

fn expect_name_and_value<'a>(
    operands: &'a [Term],
    form: &str,
    span: Span,
) -> EvalResult<(&'a str, &'a Term)> {
    match operands {
        [name_term, value_term] => match &name_term.kind {
            TermKind::SymbolRef(name) => Ok((name, value_term)),
            _ => Err(EvalError::NotASymbol(name_term.clone(), name_term.span)),
        },
        _ => Err(EvalError::InvalidSpecialForm(
            format!(
                "{} expects a name and a value, got {} argument(s)",
                form,
                operands.len()
            ),
            span,
        )),
    }
}

pub fn evaluate_def(operands: &[Term], env: Env, span: Span) -> EvalResult {
    let (name, value_term) = expect_name_and_value(operands, "def", span)?;
    let value = evaluate(value_term, env.clone())?;
    log::debug!("def {} = {}", name, value);
    env.borrow_mut().define(name.to_string(), value);
    Ok(Value::empty_list())
}

pub fn evaluate_defmacro(operands: &[Term], env: Env, span: Span) -> EvalResult {
    let (name, value_term) = expect_name_and_value(operands, "defmacro", span)?;
    let closure = match evaluate(value_term, env.clone())? {
        Value::Closure(closure) | Value::Macro(closure) => closure,
        other => {
            return Err(EvalError::InvalidSpecialForm(
                format!("defmacro expects a lambda, got a {}", other.type_name()),
                value_term.span,
            ));
        }
    };
    log::debug!("defmacro {}", name);
    env.borrow_mut()
        .define(name.to_string(), Value::Macro(closure));
    Ok(Value::empty_list())
}
