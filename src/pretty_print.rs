use crate::environment::EnvError;
use crate::evaluator::EvalError;
use crate::interpreter::Error;
use crate::parser::BuildError;
use ariadne::{Label, Report, ReportKind, Source};
use std::io::Write;
use std::ops::Range;

type SourceSpan<'a> = (&'a str, Range<usize>);

impl EvalError {
    pub fn report<'a>(&self, source_id: &'a str) -> Report<'a, SourceSpan<'a>> {
        let span = (source_id, self.span().to_range());
        let report = Report::build(ReportKind::Error, span.clone());
        let report = match self {
            EvalError::EnvError(EnvError::UnboundVariable(symbol, _)) => report
                .with_message(format!("Unbound symbol `{}`", symbol))
                .with_label(
                    Label::new(span)
                        .with_message("This symbol is not defined in the current scope"),
                ),
            EvalError::NotAProcedure(value, _) => report
                .with_message(format!("Not a procedure: {}", value))
                .with_label(Label::new(span).with_message(format!(
                    "This {} cannot be called",
                    value.type_name()
                ))),
            EvalError::InvalidArguments(message, _) => report
                .with_message("Invalid arguments:")
                .with_label(Label::new(span).with_message(message)),
            EvalError::ArityMismatch {
                expected, found, ..
            } => report
                .with_message("Too few arguments")
                .with_label(Label::new(span).with_message(format!(
                    "Expected at least {} arguments, found {}",
                    expected, found
                ))),
            EvalError::NotASymbol(term, _) => report
                .with_message(format!("Not a symbol: {}", term))
                .with_label(Label::new(span).with_message("Expected a symbol here")),
            EvalError::InvalidSpecialForm(message, _) => report
                .with_message(format!("Invalid special form: {}", message))
                .with_label(
                    Label::new(span).with_message("This special form is malformed or incomplete"),
                ),
        };
        report.finish()
    }
}

impl BuildError {
    pub fn report<'a>(&self, source_id: &'a str) -> Report<'a, SourceSpan<'a>> {
        let span = (source_id, self.span().to_range());
        let report = match self {
            BuildError::InvalidParameterList { found, .. } => {
                Report::build(ReportKind::Error, span.clone())
                    .with_message("Invalid lambda parameter list")
                    .with_label(Label::new(span).with_message(format!(
                        "Expected a list of symbols, found `{}`",
                        found
                    )))
            }
        };
        report.finish()
    }
}

impl Error {
    /// Prints the error to stderr, pointing into `input` (named `source_id`).
    pub fn pretty_print(&self, source_id: &str, input: &str) -> std::io::Result<()> {
        self.write_report(source_id, input, &mut std::io::stderr().lock())
    }

    /// Writes the report to `w`, or the plain message if rendering fails.
    pub fn write_report<W: Write>(
        &self,
        source_id: &str,
        input: &str,
        w: &mut W,
    ) -> std::io::Result<()> {
        let report = match self {
            Error::Build(err) => err.report(source_id),
            Error::Eval(err) => err.report(source_id),
        };
        if report.write((source_id, Source::from(input)), &mut *w).is_err() {
            writeln!(w, "{}", self)?;
        }
        Ok(())
    }
}
