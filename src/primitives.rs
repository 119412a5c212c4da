use crate::environment::Env;
use crate::evaluator::{EvalError, EvalResult, apply_procedure, evaluate};
use crate::source::Span;
use crate::types::{Term, Value};

fn arity_error(name: &str, expected: usize, actual: usize, span: Span) -> EvalResult {
    Err(EvalError::InvalidArguments(
        format!(
            "Primitive '{}' expects exactly {} arguments, got {}",
            name, expected, actual
        ),
        span,
    ))
}

/// `(car list)`: first element, or nil for anything but a non-empty list.
pub fn prim_car(args: Vec<Value>, _env: Env, _span: Span) -> EvalResult {
    match args.into_iter().next() {
        Some(Value::List(items)) => Ok(items.into_iter().next().unwrap_or(Value::Nil)),
        _ => Ok(Value::Nil),
    }
}

/// `(cdr list)`: everything after the first element, or nil.
pub fn prim_cdr(args: Vec<Value>, _env: Env, _span: Span) -> EvalResult {
    match args.into_iter().next() {
        Some(Value::List(items)) if !items.is_empty() => {
            Ok(Value::List(items.into_iter().skip(1).collect()))
        }
        _ => Ok(Value::Nil),
    }
}

pub fn prim_atom(args: Vec<Value>, _env: Env, _span: Span) -> EvalResult {
    let is_atom = match args.first() {
        Some(Value::List(_)) | None => false,
        Some(_) => true,
    };
    Ok(Value::Boolean(is_atom))
}

pub fn prim_cons(args: Vec<Value>, _env: Env, _span: Span) -> EvalResult {
    let mut args = args.into_iter();
    match (args.next(), args.next(), args.next()) {
        (Some(only), None, None) => Ok(Value::List(vec![only])),
        (Some(head), Some(Value::List(tail)), None) => {
            let mut list = Vec::with_capacity(tail.len() + 1);
            list.push(head);
            list.extend(tail);
            Ok(Value::List(list))
        }
        // Not a list to prepend to: hand the pair back as is.
        (Some(head), Some(tail), None) => Ok(Value::List(vec![head, tail])),
        _ => Ok(Value::Nil),
    }
}

/// Sums the integer arguments; anything else is skipped.
pub fn prim_plus(args: Vec<Value>, _env: Env, span: Span) -> EvalResult {
    let mut sum: i64 = 0;
    for arg in &args {
        if let Value::Integer(n) = arg {
            sum = sum.checked_add(*n).ok_or_else(|| {
                EvalError::InvalidArguments("integer overflow in 'plus'".to_string(), span)
            })?;
        }
    }
    Ok(Value::Integer(sum))
}

pub fn prim_eq(args: Vec<Value>, _env: Env, span: Span) -> EvalResult {
    match args.as_slice() {
        [left, right] => Ok(Value::Boolean(left == right)),
        _ => arity_error("eq", 2, args.len(), span),
    }
}

/// `(apply (f a b))` evaluates the list as a call in the caller's environment;
/// `(apply f (a b))` calls `f` with the list elements as its arguments.
pub fn prim_apply(args: Vec<Value>, env: Env, span: Span) -> EvalResult {
    let mut args = args.into_iter();
    match (args.next(), args.next(), args.next()) {
        (Some(list @ Value::List(_)), None, None) => evaluate(&Term::from_datum(list, span), env),
        (Some(procedure), Some(Value::List(items)), None) => {
            apply_procedure(procedure, items, env, span)
        }
        _ => Err(EvalError::InvalidArguments(
            "apply expects a list, or a procedure and a list of arguments".to_string(),
            span,
        )),
    }
}

/// `(p args...)`: diagnostic print of the evaluated arguments.
pub fn prim_print(args: Vec<Value>, _env: Env, _span: Span) -> EvalResult {
    let printed: Vec<String> = args.iter().map(Value::to_string).collect();
    println!("{}", printed.join(" "));
    Ok(Value::empty_list())
}
