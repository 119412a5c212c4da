use crate::environment::Env;
use crate::evaluator::EvalResult;
use crate::source::Span;
use std::fmt; // For custom display formatting
use std::rc::Rc;

/// An executable term produced by the term builder, with the source span it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub kind: TermKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TermKind {
    Literal(Value),            // Integers and strings, ready to use
    SymbolRef(String),         // Resolved against the environment at evaluation time
    Application(Vec<Term>),    // (head arg1 arg2 ...)
    Lambda(Rc<LambdaTerm>),    // (lambda (params...) body...), built once
}

/// Parameter slots and body of a `lambda` form. Shared by every closure made from it.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaTerm {
    /// `None` marks an anonymous slot: it takes an argument but binds nothing.
    pub params: Vec<Option<String>>,
    pub body: Vec<Term>,
}

impl Term {
    pub fn new(kind: TermKind, span: Span) -> Self {
        Term { kind, span }
    }

    pub fn literal(value: Value, span: Span) -> Self {
        Term::new(TermKind::Literal(value), span)
    }

    pub fn symbol(name: impl Into<String>, span: Span) -> Self {
        Term::new(TermKind::SymbolRef(name.into()), span)
    }

    /// Turns an unevaluated term into data, the way `quote` sees it.
    /// A lambda has no data form, so it becomes a closure over `env`.
    pub fn to_datum(&self, env: &Env) -> Value {
        match &self.kind {
            TermKind::Literal(value) => value.clone(),
            TermKind::SymbolRef(name) => Value::Symbol(name.clone()),
            TermKind::Application(terms) => {
                Value::List(terms.iter().map(|term| term.to_datum(env)).collect())
            }
            TermKind::Lambda(lambda) => Value::Closure(Rc::new(Closure {
                lambda: lambda.clone(),
                env: env.clone(),
            })),
        }
    }

    /// Turns data back into code so that it can be evaluated (`apply`).
    pub fn from_datum(value: Value, span: Span) -> Self {
        match value {
            Value::Symbol(name) => Term::symbol(name, span),
            Value::List(items) => Term::new(
                TermKind::Application(
                    items
                        .into_iter()
                        .map(|item| Term::from_datum(item, span))
                        .collect(),
                ),
                span,
            ),
            other => Term::literal(other, span),
        }
    }
}

/// Runtime values flowing through evaluation.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,             // Result of car/cdr on anything but a non-empty list
    Integer(i64),
    Text(String),
    Boolean(bool),
    Symbol(String),  // Only reachable as quoted data
    List(Vec<Value>),
    Primitive(Primitive),
    SpecialForm(SpecialForm),
    Closure(Rc<Closure>),
    Macro(Rc<Closure>), // A closure invoked with unevaluated arguments
}

impl Value {
    pub fn empty_list() -> Self {
        Value::List(Vec::new())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Integer(_) => "integer",
            Value::Text(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Primitive(_) => "primitive",
            Value::SpecialForm(_) => "special form",
            Value::Closure(_) => "closure",
            Value::Macro(_) => "macro",
        }
    }
}

// Data compares structurally; callables compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Primitive(a), Value::Primitive(b)) => a.name == b.name,
            (Value::SpecialForm(a), Value::SpecialForm(b)) => a.name == b.name,
            (Value::Closure(a), Value::Closure(b)) | (Value::Macro(a), Value::Macro(b)) => {
                Rc::ptr_eq(a, b)
            }
            _ => false,
        }
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[Option<String>]) -> fmt::Result {
    write!(f, "(")?;
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", param.as_deref().unwrap_or("_"))?;
    }
    write!(f, ")")
}

fn write_sequence<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    write!(f, "(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, ")")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "\"{}\"", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::List(items) => write_sequence(f, items),
            Value::Primitive(primitive) => write!(f, "#<primitive:{}>", primitive.name),
            Value::SpecialForm(form) => write!(f, "#<special-form:{}>", form.name),
            Value::Closure(closure) => {
                write!(f, "#<lambda ")?;
                write_params(f, &closure.lambda.params)?;
                write!(f, ">")
            }
            Value::Macro(closure) => {
                write!(f, "#<macro ")?;
                write_params(f, &closure.lambda.params)?;
                write!(f, ">")
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TermKind::Literal(value) => write!(f, "{}", value),
            TermKind::SymbolRef(name) => write!(f, "{}", name),
            TermKind::Application(terms) => write_sequence(f, terms),
            TermKind::Lambda(lambda) => {
                write!(f, "(lambda ")?;
                write_params(f, &lambda.params)?;
                for term in &lambda.body {
                    write!(f, " {}", term)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Native function: receives its arguments already evaluated.
pub type PrimitiveFunc = fn(Vec<Value>, Env, Span) -> EvalResult;

/// Native special form: receives its argument terms unevaluated.
pub type SpecialFormFunc = fn(&[Term], Env, Span) -> EvalResult;

#[derive(Clone)]
pub struct Primitive {
    pub name: &'static str,
    pub func: PrimitiveFunc,
}

#[derive(Clone)]
pub struct SpecialForm {
    pub name: &'static str,
    pub func: SpecialFormFunc,
}

/// A lambda paired with the environment it was evaluated in.
pub struct Closure {
    pub lambda: Rc<LambdaTerm>,
    pub env: Env,
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Primitive({})", self.name)
    }
}

impl fmt::Debug for SpecialForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpecialForm({})", self.name)
    }
}

// The captured environment may contain this closure, so it is left out.
impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("params", &self.lambda.params)
            .field("body", &self.lambda.body)
            .finish_non_exhaustive()
    }
}
