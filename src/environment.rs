use crate::source::Span;
use crate::types::{Primitive, PrimitiveFunc, SpecialForm, SpecialFormFunc, Value};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use thiserror::Error;

// --- Environment Error ---
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    #[error("Unbound variable: '{0}'")]
    UnboundVariable(String, Span), // Symbol name, span where lookup happened
}

/// Shared handle to an environment frame. Closures and active calls hold these.
/// A frame is freed with its last holder, except that a closure defined into
/// the frame it captures forms a cycle and keeps that frame alive.
pub type Env = Rc<RefCell<Environment>>;

// --- Environment Definition ---

#[derive(Debug)]
pub struct Environment {
    // Strong parent link: a closure returned from a nested call must keep
    // every enclosing frame alive, not just the one it captured.
    outer: Option<Env>,
    bindings: HashMap<String, Value>,
}

impl Environment {
    /// Creates a new, empty top-level environment.
    pub fn new() -> Env {
        Rc::new(RefCell::new(Environment {
            outer: None,
            bindings: HashMap::new(),
        }))
    }

    /// Creates the root environment with the builtin library installed.
    pub fn new_global_populated() -> Env {
        let env_ptr = Environment::new();
        {
            let mut env = env_ptr.borrow_mut();

            env.add_special_form("quote", crate::evaluator::evaluate_quote);
            env.add_special_form("if", crate::evaluator::evaluate_if);
            env.add_special_form("def", crate::evaluator::evaluate_def);
            env.add_special_form("defmacro", crate::evaluator::evaluate_defmacro);

            // --- List Primitives ---
            env.add_primitive("car", crate::primitives::prim_car);
            env.add_primitive("cdr", crate::primitives::prim_cdr);
            env.add_primitive("cons", crate::primitives::prim_cons);
            env.add_primitive("atom", crate::primitives::prim_atom);

            env.add_primitive("plus", crate::primitives::prim_plus);
            env.add_primitive("eq", crate::primitives::prim_eq);
            env.add_primitive("apply", crate::primitives::prim_apply);
            env.add_primitive("p", crate::primitives::prim_print);
        }
        env_ptr
    }

    /// Creates a new environment enclosed within an outer one.
    pub fn new_enclosed(outer_env: Env) -> Env {
        Rc::new(RefCell::new(Environment {
            outer: Some(outer_env),
            bindings: HashMap::new(),
        }))
    }

    /// Defines a variable in the *current* environment frame.
    /// Replaces the value if the variable already exists in this frame.
    pub fn define(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Looks up a variable's value.
    /// Checks the current environment first, then walks up the outer environment chain.
    /// `lookup_span` is the location where the variable was referenced, used for error reporting.
    pub fn get(&self, name: &str, lookup_span: Span) -> Result<Value, EnvError> {
        if let Some(value) = self.bindings.get(name) {
            Ok(value.clone())
        } else {
            match &self.outer {
                Some(outer_env_ptr) => outer_env_ptr.borrow().get(name, lookup_span),
                None => Err(EnvError::UnboundVariable(name.to_string(), lookup_span)),
            }
        }
    }

    fn add_primitive(&mut self, name: &'static str, func: PrimitiveFunc) {
        self.define(name.to_string(), Value::Primitive(Primitive { name, func }));
    }

    fn add_special_form(&mut self, name: &'static str, func: SpecialFormFunc) {
        self.define(name.to_string(), Value::SpecialForm(SpecialForm { name, func }));
    }

    /// Gets every identifier visible from this environment (used for completion).
    pub fn get_identifiers(&self) -> HashSet<String> {
        let mut identifiers: HashSet<String> = self.bindings.keys().cloned().collect();
        if let Some(outer_env_ptr) = &self.outer {
            identifiers.extend(outer_env_ptr.borrow().get_identifiers());
        }
        identifiers
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::Integer(n)
    }

    #[test]
    fn test_define_and_get_global() {
        let env = Environment::new();
        env.borrow_mut().define("x".to_string(), int(10));

        let result = env.borrow().get("x", Span::default());
        assert_eq!(result, Ok(int(10)));
    }

    #[test]
    fn test_frame_freed_with_last_holder() {
        let global_env = Environment::new();
        let frame = Environment::new_enclosed(global_env.clone());
        let weak = Rc::downgrade(&frame);
        drop(frame);
        assert!(weak.upgrade().is_none());
        assert_eq!(Rc::strong_count(&global_env), 1);
    }

    #[test]
    fn test_self_capturing_closure_keeps_frame_alive() {
        use crate::types::{Closure, LambdaTerm};

        let frame = Environment::new_enclosed(Environment::new());
        let closure = Value::Closure(Rc::new(Closure {
            lambda: Rc::new(LambdaTerm {
                params: vec![],
                body: vec![],
            }),
            env: frame.clone(),
        }));
        frame.borrow_mut().define("self".to_string(), closure);
        let weak = Rc::downgrade(&frame);
        drop(frame);
        assert!(weak.upgrade().is_some());
    }

    #[test]
    fn test_get_unbound_global() {
        let env = Environment::new();
        let result = env.borrow().get("y", Span::default());
        assert!(matches!(result, Err(EnvError::UnboundVariable(s, _)) if s == "y"));
    }

    #[test]
    fn test_define_and_get_enclosed() {
        let global_env = Environment::new();
        global_env.borrow_mut().define("x".to_string(), int(10));

        let local_env = Environment::new_enclosed(global_env);
        local_env.borrow_mut().define("y".to_string(), int(20));

        assert_eq!(local_env.borrow().get("y", Span::default()), Ok(int(20)));
        assert_eq!(local_env.borrow().get("x", Span::default()), Ok(int(10)));
    }

    #[test]
    fn test_get_unbound_enclosed() {
        let global_env = Environment::new();
        let local_env = Environment::new_enclosed(global_env);

        let span = Span::new(11, 12);
        let result = local_env.borrow().get("z", span);
        assert_eq!(
            result,
            Err(EnvError::UnboundVariable("z".to_string(), span))
        );
    }

    #[test]
    fn test_shadowing() {
        let global_env = Environment::new();
        global_env.borrow_mut().define("x".to_string(), int(10));

        let local_env = Environment::new_enclosed(global_env.clone());
        local_env.borrow_mut().define("x".to_string(), int(50));

        let inner_local_env = Environment::new_enclosed(local_env.clone());
        inner_local_env
            .borrow_mut()
            .define("y".to_string(), Value::Symbol("y-value".to_string()));

        assert_eq!(inner_local_env.borrow().get("x", Span::default()), Ok(int(50)));
        assert_eq!(
            inner_local_env.borrow().get("y", Span::default()),
            Ok(Value::Symbol("y-value".to_string()))
        );
        assert_eq!(local_env.borrow().get("x", Span::default()), Ok(int(50)));
        assert_eq!(global_env.borrow().get("x", Span::default()), Ok(int(10)));
    }

    #[test]
    fn test_redefine_in_same_frame() {
        let env = Environment::new();
        env.borrow_mut().define("x".to_string(), int(1));
        env.borrow_mut().define("x".to_string(), int(2));
        assert_eq!(env.borrow().get("x", Span::default()), Ok(int(2)));
    }

    #[test]
    fn test_global_populated_has_builtins() {
        let env = Environment::new_global_populated();
        let identifiers = env.borrow().get_identifiers();
        for name in [
            "quote", "car", "cdr", "atom", "cons", "plus", "if", "eq", "apply", "def",
            "defmacro", "p",
        ] {
            assert!(identifiers.contains(name), "missing builtin {}", name);
        }
        assert!(matches!(
            env.borrow().get("if", Span::default()),
            Ok(Value::SpecialForm(_))
        ));
        assert!(matches!(
            env.borrow().get("car", Span::default()),
            Ok(Value::Primitive(_))
        ));
    }

    #[test]
    fn test_identifiers_include_outer_frames() {
        let global_env = Environment::new();
        global_env.borrow_mut().define("outer".to_string(), int(1));
        let local_env = Environment::new_enclosed(global_env);
        local_env.borrow_mut().define("inner".to_string(), int(2));

        let identifiers = local_env.borrow().get_identifiers();
        assert!(identifiers.contains("outer"));
        assert!(identifiers.contains("inner"));
    }
}
