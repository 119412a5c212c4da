use logos::Logos;
use std::fmt;

use crate::Span;

/// Flat lexical units. Everything that is not a parenthesis, a symbol
/// character or a double quote separates tokens and is dropped.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r#"[^\p{L}\p{N}_?()"-]+"#)]
pub enum LexemeKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex(r"[\p{L}\p{N}_?-]+", |lex| lex.slice().to_string())]
    Atom(String),
    // An unterminated string runs to the end of the input.
    #[regex(r#""[^"]*"?"#, |lex| lex.slice().to_string())]
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    pub span: Span,
}

/// One node of the raw token tree handed to the term builder.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Symbol(String),
    Number(String),
    /// Raw text, both quote characters included.
    String(String),
    List(Vec<Token>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }

    fn atom(text: String, span: Span) -> Self {
        let kind = if text.parse::<i64>().is_ok() {
            TokenKind::Number(text)
        } else {
            TokenKind::Symbol(text)
        };
        Token::new(kind, span)
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Symbol(s) if s == name)
    }
}

impl fmt::Display for LexemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexemeKind::LParen => write!(f, "("),
            LexemeKind::RParen => write!(f, ")"),
            LexemeKind::Atom(s) | LexemeKind::String(s) => write!(f, "{}", s),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Symbol(s) | TokenKind::Number(s) | TokenKind::String(s) => {
                write!(f, "{}", s)
            }
            TokenKind::List(tokens) => {
                write!(f, "(")?;
                for (i, token) in tokens.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", token)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn lexemes(input: &str) -> impl Iterator<Item = Lexeme> + '_ {
    LexemeKind::lexer(input)
        .spanned()
        // Every character is covered by a rule or by `skip`, so errors cannot
        // surface; dropping them keeps the reader total.
        .filter_map(|(result, range)| {
            result.ok().map(|kind| Lexeme {
                kind,
                span: range.into(),
            })
        })
}

/// Returns the flat lexeme stream (used by the REPL and benchmarks).
pub fn lex(input: &str) -> Vec<Lexeme> {
    lexemes(input).collect()
}

/// Scans `input` into a tree of tokens, one entry per top-level form.
///
/// The reader never fails: a `)` with no open list ends the scan, and lists
/// still open at the end of the input are closed there.
pub fn tokenize(input: &str) -> Vec<Token> {
    // Each open list remembers where it started and the siblings it interrupted.
    let mut open: Vec<(usize, Vec<Token>)> = Vec::new();
    let mut current: Vec<Token> = Vec::new();

    for Lexeme { kind, span } in lexemes(input) {
        match kind {
            LexemeKind::LParen => open.push((span.start, std::mem::take(&mut current))),
            LexemeKind::RParen => match open.pop() {
                Some((start, siblings)) => {
                    let children = std::mem::replace(&mut current, siblings);
                    current.push(Token::new(
                        TokenKind::List(children),
                        Span::new(start, span.end),
                    ));
                }
                None => break,
            },
            LexemeKind::Atom(text) => current.push(Token::atom(text, span)),
            LexemeKind::String(text) => current.push(Token::new(TokenKind::String(text), span)),
        }
    }

    while let Some((start, siblings)) = open.pop() {
        let children = std::mem::replace(&mut current, siblings);
        current.push(Token::new(
            TokenKind::List(children),
            Span::new(start, input.len()),
        ));
    }
    current
}
