use crate::Span;
use crate::lexer::{Token, TokenKind};
use crate::types::{LambdaTerm, Term, TermKind, Value};
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("lambda parameters must be a list of symbols, found '{found}'")]
    InvalidParameterList { found: String, span: Span },
}

impl BuildError {
    pub fn span(&self) -> Span {
        match self {
            BuildError::InvalidParameterList { span, .. } => *span,
        }
    }
}

// Result type alias for convenience
type BuildResult<T> = Result<T, BuildError>;

/// Converts one raw token into an executable term.
pub fn build(token: Token) -> BuildResult<Term> {
    let span = token.span;
    match token.kind {
        TokenKind::String(text) => Ok(Term::literal(Value::Text(strip_quotes(&text)), span)),
        TokenKind::Number(text) | TokenKind::Symbol(text) => Ok(build_atom(text, span)),
        TokenKind::List(mut tokens) => {
            if tokens.len() > 1 && tokens[0].is_symbol("lambda") {
                let body = tokens.split_off(2);
                build_lambda(tokens.swap_remove(1), body, span)
            } else {
                Ok(Term::new(TermKind::Application(build_many(tokens)?), span))
            }
        }
    }
}

pub fn build_many(tokens: Vec<Token>) -> BuildResult<Vec<Term>> {
    tokens.into_iter().map(build).collect()
}

fn strip_quotes(text: &str) -> String {
    let inner = text.strip_prefix('"').unwrap_or(text);
    // An unterminated string has no closing quote to strip.
    inner.strip_suffix('"').unwrap_or(inner).to_string()
}

fn build_atom(text: String, span: Span) -> Term {
    match text.parse::<i64>() {
        Ok(n) => Term::literal(Value::Integer(n), span),
        Err(_) => Term::symbol(text, span),
    }
}

fn build_lambda(params: Token, body: Vec<Token>, span: Span) -> BuildResult<Term> {
    let params = match &params.kind {
        TokenKind::List(decls) => decls
            .iter()
            .map(|decl| match &decl.kind {
                TokenKind::Symbol(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => {
            return Err(BuildError::InvalidParameterList {
                found: params.to_string(),
                span: params.span,
            });
        }
    };
    let body = build_many(body)?;
    Ok(Term::new(
        TermKind::Lambda(Rc::new(LambdaTerm { params, body })),
        span,
    ))
}

// Helper function to tokenize and build a whole source text (useful for tests and REPL)
pub fn parse_str(input: &str) -> BuildResult<Vec<Term>> {
    build_many(crate::lexer::tokenize(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(input: &str) -> Term {
        match parse_str(input) {
            Ok(mut terms) if terms.len() == 1 => terms.remove(0),
            Ok(terms) => panic!("Expected one term for '{}', got {:?}", input, terms),
            Err(e) => panic!("Building failed for input '{}': {}", input, e),
        }
    }

    // Compares the printed term tree, ignoring spans.
    fn assert_built(input: &str, expected: &str) {
        assert_eq!(parse_one(input).to_string(), expected, "Input: '{}'", input);
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_one("42").kind, TermKind::Literal(Value::Integer(42)));
        assert_eq!(parse_one("-7").kind, TermKind::Literal(Value::Integer(-7)));
        assert_eq!(
            parse_one("\"hello world\"").kind,
            TermKind::Literal(Value::Text("hello world".to_string()))
        );
        assert_eq!(
            parse_one("\"\"").kind,
            TermKind::Literal(Value::Text(String::new()))
        );
    }

    #[test]
    fn test_unterminated_string_keeps_content() {
        assert_eq!(
            parse_one("\"abc").kind,
            TermKind::Literal(Value::Text("abc".to_string()))
        );
    }

    #[test]
    fn test_symbols() {
        assert_eq!(parse_one("car").kind, TermKind::SymbolRef("car".to_string()));
        assert_eq!(parse_one("null?").kind, TermKind::SymbolRef("null?".to_string()));
        assert_eq!(parse_one("-").kind, TermKind::SymbolRef("-".to_string()));
    }

    #[test]
    fn test_applications() {
        assert_built("(plus 1 2)", "(plus 1 2)");
        assert_built("()", "()");
        assert_built("((f) \"x\")", "((f) \"x\")");
        assert!(matches!(
            parse_one("(plus 1 2)").kind,
            TermKind::Application(terms) if terms.len() == 3
        ));
    }

    #[test]
    fn test_lambda() {
        let term = parse_one("(lambda (a b) (plus a b) a)");
        let TermKind::Lambda(lambda) = term.kind else {
            panic!("expected a lambda, got {:?}", term);
        };
        assert_eq!(
            lambda.params,
            vec![Some("a".to_string()), Some("b".to_string())]
        );
        assert_eq!(lambda.body.len(), 2);
        assert_eq!(lambda.body[0].to_string(), "(plus a b)");
    }

    #[test]
    fn test_lambda_without_body() {
        assert_built("(lambda ())", "(lambda ())");
    }

    #[test]
    fn test_nested_lambda_is_built_once() {
        assert_built(
            "((lambda (a) ((lambda () a))) 1)",
            "((lambda (a) ((lambda () a))) 1)",
        );
    }

    #[test]
    fn test_lone_lambda_symbol_is_an_application() {
        assert!(matches!(
            parse_one("(lambda)").kind,
            TermKind::Application(terms) if terms.len() == 1
        ));
    }

    #[test]
    fn test_non_symbol_params_are_anonymous() {
        let TermKind::Lambda(lambda) = parse_one("(lambda (a 1 \"s\" (x) b) a)").kind else {
            panic!("expected a lambda");
        };
        assert_eq!(
            lambda.params,
            vec![Some("a".to_string()), None, None, None, Some("b".to_string())]
        );
    }

    #[test]
    fn test_invalid_parameter_list() {
        let err = parse_str("(lambda x x)").unwrap_err();
        assert!(matches!(
            &err,
            BuildError::InvalidParameterList { found, .. } if found == "x"
        ));
        assert_eq!(err.span(), Span::new(8, 9));
    }

    #[test]
    fn test_multiple_forms() {
        let terms = parse_str("(def x 1) x").unwrap();
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[1].kind, TermKind::SymbolRef("x".to_string()));
    }

    #[test]
    fn test_spans() {
        let term = parse_one("(car \"ab\")");
        assert_eq!(term.span, Span::new(0, 10));
        let TermKind::Application(terms) = term.kind else {
            panic!("expected an application");
        };
        assert_eq!(terms[1].span, Span::new(5, 9));
    }
}
