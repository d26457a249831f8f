//! Terminal rendering of syntax errors with source snippets.

use ariadne::{Config, Label, Report, ReportKind, Source};

use crate::parser::SyntaxError;

/// Render a syntax error with the offending source line and a labeled span.
pub fn render_syntax_error(source: &str, error: &SyntaxError) -> String {
    render(source, error, true)
}

/// Same as [`render_syntax_error`] but without ANSI color codes, which makes
/// the output easy to compare in tests.
pub fn render_syntax_error_no_color(source: &str, error: &SyntaxError) -> String {
    render(source, error, false)
}

fn render(source: &str, error: &SyntaxError, use_color: bool) -> String {
    let span = error.span();
    let start = span.offset.min(source.len());
    let end = (span.offset + span.len.max(1)).min(source.len().max(1));
    let range = start..end.max(start);

    let mut buffer = Vec::new();
    Report::build(ReportKind::Error, ("<input>", range.clone()))
        .with_message(error.to_string())
        .with_config(Config::default().with_color(use_color))
        .with_label(Label::new(("<input>", range)).with_message("here"))
        .finish()
        .write(("<input>", Source::from(source)), &mut buffer)
        .ok();
    String::from_utf8_lossy(&buffer).into_owned()
}
