//! Ariadne-based diagnostic rendering for type errors.
//!
//! Each `TypeError` becomes a single labeled report: an error code, the
//! error's message, a label at its span, and a help line where the fix is
//! obvious. Output is colorless so it can be compared in tests.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::error::TypeError;

// ── Error Codes ────────────────────────────────────────────────────────

fn error_code(err: &TypeError) -> &'static str {
    match err {
        TypeError::Mismatch { .. } => "E0001",
        TypeError::InfiniteType { .. } => "E0002",
        TypeError::ArityMismatch { .. } => "E0003",
        TypeError::UnresolvedPath { .. } => "E0004",
        TypeError::NotAFunction { .. } => "E0005",
        TypeError::UntypedDeclaration { .. } => "E0006",
        TypeError::NotAStruct { .. } => "E0007",
        TypeError::GenericArgCount { .. } => "E0008",
        TypeError::UnknownField { .. } | TypeError::NoSuchField { .. } => "E0009",
        TypeError::DuplicateField { .. } => "E0010",
        TypeError::MissingFields { .. } => "E0011",
        TypeError::IncompatibleBase { .. } => "E0012",
        TypeError::NonUnitStatement { .. } => "E0013",
        TypeError::InvalidOperand { .. } => "E0014",
        TypeError::InvalidLiteralSuffix { .. } => "E0015",
        TypeError::RecursiveType { .. } => "E0016",
        TypeError::ResolutionFailure { .. } => "E0017",
        TypeError::AmbiguousType { .. } => "E0018",
    }
}

// ── Span Helpers ───────────────────────────────────────────────────────

/// Convert a rowan TextRange to a Rust Range<usize> for ariadne.
fn text_range_to_range(range: rowan::TextRange) -> Range<usize> {
    let start: usize = range.start().into();
    let end: usize = range.end().into();
    start..end
}

// ── Labels and help ────────────────────────────────────────────────────

fn label_message(err: &TypeError) -> String {
    match err {
        TypeError::Mismatch { expected, found, .. } => {
            format!("expected `{}`, found `{}`", expected, found)
        }
        TypeError::ArityMismatch { expected, .. } => {
            format!("expected {} argument(s)", expected)
        }
        TypeError::InfiniteType { .. } => "recursive type here".to_string(),
        TypeError::UnresolvedPath { .. } => "not found in this scope".to_string(),
        TypeError::UntypedDeclaration { .. } => "type unknown here".to_string(),
        TypeError::NotAStruct { found, .. } => format!("this is `{}`", found),
        TypeError::GenericArgCount { expected, .. } => {
            format!("expected {} generic argument(s)", expected)
        }
        TypeError::RecursiveType { .. } => "recursive without indirection".to_string(),
        TypeError::NotAFunction { ty, .. } => format!("has type `{}`", ty),
        TypeError::NoSuchField { field_name, .. } => format!("unknown field `{}`", field_name),
        TypeError::InvalidOperand { ty, .. } => format!("has type `{}`", ty),
        TypeError::InvalidLiteralSuffix { .. } => "invalid suffix".to_string(),
        TypeError::UnknownField { struct_name, .. } => {
            format!("`{}` does not have this field", struct_name)
        }
        TypeError::DuplicateField { .. } => "used more than once".to_string(),
        TypeError::MissingFields { missing, .. } => {
            format!("missing {}", missing.join(", "))
        }
        TypeError::IncompatibleBase { expected, found, .. } => {
            format!("expected `{}`, found `{}`", expected, found)
        }
        TypeError::NonUnitStatement { found, .. } => format!("has type `{}`", found),
        TypeError::ResolutionFailure { .. } => "type could not be resolved".to_string(),
        TypeError::AmbiguousType { .. } => "cannot infer type".to_string(),
    }
}

fn help_message(err: &TypeError) -> Option<String> {
    match err {
        TypeError::ArityMismatch { expected, found, .. } => Some(if expected > found {
            format!("missing {} argument(s)", expected - found)
        } else {
            format!("{} extra argument(s)", found - expected)
        }),
        TypeError::InfiniteType { .. } => {
            Some("a value cannot have a type that refers to itself".to_string())
        }
        TypeError::MissingFields { .. } => {
            Some("add the missing fields or use `..base` to copy them".to_string())
        }
        TypeError::NonUnitStatement { .. } => {
            Some("add `;` to discard the value".to_string())
        }
        TypeError::AmbiguousType { .. } => Some("add a type annotation".to_string()),
        _ => None,
    }
}

// ── Main Rendering Function ────────────────────────────────────────────

/// Render a type error into a formatted diagnostic string using ariadne.
pub fn render_diagnostic(error: &TypeError, source: &str, _filename: &str) -> String {
    let config = Config::default().with_color(false);
    let source_len = source.len();

    // Clamp a range to be valid within source bounds.
    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len);
        let e = r.end.min(source_len).max(s);
        if s == e {
            s..e.saturating_add(1).min(source_len)
        } else {
            s..e
        }
    };

    let range = clamp(text_range_to_range(error.span()));
    let msg = error.to_string();

    let mut builder = Report::build(ReportKind::Error, range.clone())
        .with_code(error_code(error))
        .with_message(&msg)
        .with_config(config)
        .with_label(
            Label::new(range)
                .with_message(label_message(error))
                .with_color(Color::Red),
        );
    if let Some(help) = help_message(error) {
        builder.set_help(help);
    }
    let report = builder.finish();

    let mut buf = Vec::new();
    if report.write(Source::from(source), &mut buf).is_err() {
        return msg;
    }
    String::from_utf8(buf).unwrap_or(msg)
}
