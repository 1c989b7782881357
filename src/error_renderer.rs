//! Error rendering using ariadne
//!
//! This module renders engine errors with source snippets and labels. Errors
//! do not keep the text they came from, so every function takes the source
//! alongside the error.

use crate::{Diagnostic, Error, Severity};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;

const SOURCE_ID: &str = "<expression>";

/// Render an error with formatting to stderr
///
/// # Example
/// ```no_run
/// use safe_eval::{Engine, render_error};
///
/// let engine = Engine::default();
/// let source = "open('x')";
/// if let Err(e) = engine.check(source) {
///     render_error(&e, source);
/// }
/// ```
pub fn render_error(error: &Error, source: &str) {
    render_error_to_writer(error, source, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
///
/// This is useful when you want to control where the error is written,
/// such as to a file, a buffer, or a custom output stream.
pub fn render_error_to(error: &Error, source: &str, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, source, writer, true)
}

/// Render an error to a String (useful for logs, web UIs, etc.)
pub fn render_error_to_string(error: &Error, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, source, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
///
/// This is the same as `render_error_to_string` but without ANSI color codes,
/// making the output easier to compare in tests.
pub fn render_error_to_string_no_color(error: &Error, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, source, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    error: &Error,
    source: &str,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    render_diagnostics(source, &error.to_diagnostics(), writer, use_color)
}

fn render_diagnostics(
    source: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    for diag in diagnostics {
        let mut colors = ColorGenerator::new();
        colors.next(); // Skip the first color.

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };

        // Parse errors at end of input point one past the last character.
        let span = clamp(diag.span.0.clone(), source.len());

        let mut report = Report::build(kind, (SOURCE_ID, span.clone()))
            .with_message(&diag.message)
            .with_config(ariadne::Config::default().with_color(use_color));

        if let Some(code) = &diag.code {
            report = report.with_code(code);
        }

        let color = colors.next();
        report = report.with_label(
            Label::new((SOURCE_ID, span))
                .with_message(&diag.message)
                .with_color(color),
        );

        for related in &diag.related {
            let color = colors.next();
            report = report.with_label(
                Label::new((SOURCE_ID, clamp(related.span.0.clone(), source.len())))
                    .with_message(&related.message)
                    .with_color(color),
            );
        }

        if let Some(help) = &diag.help {
            report = report.with_help(help);
        }

        report
            .finish()
            .write((SOURCE_ID, Source::from(source)), &mut *writer)?;
    }

    Ok(())
}

fn clamp(span: std::ops::Range<usize>, len: usize) -> std::ops::Range<usize> {
    let start = span.start.min(len);
    start..span.end.clamp(start, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Engine;

    #[test]
    fn test_render_parse_error() {
        let engine = Engine::default();
        let source = "1 + + * 2";
        let err = engine.check(source).unwrap_err();

        let output = render_error_to_string_no_color(&err, source);
        assert!(output.contains("Error"));
        assert!(output.contains("P001"));
        assert!(output.contains(source));
    }

    #[test]
    fn test_render_safety_violation() {
        let engine = Engine::default();
        let source = "float(evil())";
        let err = engine.check(source).unwrap_err();

        let output = render_error_to_string_no_color(&err, source);
        assert!(output.contains("S002"));
        assert!(output.contains("call to 'evil' not in allowed list"));
        assert!(output.contains("register the function on the policy"));
    }

    #[test]
    fn test_render_runtime_error() {
        let engine = Engine::default();
        let source = "[1, 2][5]";
        let err = engine.evaluate(source, &[]).unwrap_err();

        let output = render_error_to_string_no_color(&err, source);
        assert!(output.contains("R005"));
        assert!(output.contains("IndexError"));
        assert!(output.lines().count() > 1);
    }

    #[test]
    fn test_render_error_at_end_of_input() {
        let engine = Engine::default();
        let source = "(1";
        let err = engine.check(source).unwrap_err();

        let output = render_error_to_string_no_color(&err, source);
        assert!(!output.is_empty());
    }

    #[test]
    fn test_no_color_has_no_escape_codes() {
        let engine = Engine::default();
        let source = "evil()";
        let err = engine.check(source).unwrap_err();

        assert!(!render_error_to_string_no_color(&err, source).contains('\u{1b}'));
        assert!(!render_error_to_string(&err, source).is_empty());
    }
}
