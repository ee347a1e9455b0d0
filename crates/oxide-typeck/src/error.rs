//! Type errors, the diagnostic sink, and traversal control flow.
//!
//! User-facing problems are `TypeError`s, handed to a `DiagnosticSink`.
//! Whether checking continues afterwards is expressed separately through
//! `Abort`. Defects in the checker itself are `InternalError`s and never
//! reach the sink.

use std::fmt;

use oxide_hir::{HirId, TextRange};

use crate::ty::Ty;
use crate::unify::UnifyError;

/// A type error encountered during type checking.
///
/// Each variant carries the location it should be reported at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeError {
    /// Two types that should be equal are not.
    Mismatch {
        expected: Ty,
        found: Ty,
        span: TextRange,
    },
    /// A function called (or unified) with the wrong number of parameters.
    ArityMismatch {
        expected: usize,
        found: usize,
        span: TextRange,
    },
    /// A variable would have to contain itself.
    InfiniteType { ty: Ty, span: TextRange },
    /// A path or type name with no declaration.
    UnresolvedPath { name: String, span: TextRange },
    /// A path resolved, but its declaration has no type recorded.
    UntypedDeclaration { name: String, span: TextRange },
    /// A struct literal path that names something other than a struct.
    NotAStruct {
        name: String,
        found: Ty,
        span: TextRange,
    },
    /// Generic arguments supplied with the wrong arity.
    GenericArgCount {
        name: String,
        expected: usize,
        found: usize,
        span: TextRange,
    },
    /// A struct whose fields (transitively) contain itself.
    RecursiveType { name: String, span: TextRange },
    /// A non-function value is called.
    NotAFunction { ty: Ty, span: TextRange },
    /// A field access on a type with no such field.
    NoSuchField {
        ty: Ty,
        field_name: String,
        span: TextRange,
    },
    /// An operator applied to an operand it does not support.
    InvalidOperand {
        op: &'static str,
        ty: Ty,
        span: TextRange,
    },
    /// A literal suffix that names no numeric primitive of the right kind.
    InvalidLiteralSuffix { suffix: String, span: TextRange },
    /// A struct literal names a field the struct does not declare.
    UnknownField {
        struct_name: String,
        field_name: String,
        span: TextRange,
    },
    /// A struct literal initializes the same field twice.
    DuplicateField { field_name: String, span: TextRange },
    /// A struct literal without a base leaves fields uninitialized.
    MissingFields {
        struct_name: String,
        missing: Vec<String>,
        span: TextRange,
    },
    /// The `..base` expression has a different type than the literal.
    IncompatibleBase {
        expected: Ty,
        found: Ty,
        span: TextRange,
    },
    /// A statement that is not the block's final expression has a non-unit
    /// type.
    NonUnitStatement { found: Ty, span: TextRange },
    /// An `Error` type survived to fallback resolution.
    ResolutionFailure { id: HirId, span: TextRange },
    /// A general inference variable survived to fallback resolution.
    AmbiguousType { id: HirId, span: TextRange },
}

impl TypeError {
    /// Convert a unification failure into a diagnostic at `span`.
    pub fn from_unify(err: UnifyError, span: TextRange) -> Self {
        match err {
            UnifyError::Mismatch { expected, found } => TypeError::Mismatch {
                expected,
                found,
                span,
            },
            UnifyError::ArityMismatch { expected, found } => TypeError::ArityMismatch {
                expected,
                found,
                span,
            },
            UnifyError::InfiniteType { ty, .. } => TypeError::InfiniteType { ty, span },
        }
    }

    /// The location this error is reported at.
    pub fn span(&self) -> TextRange {
        match self {
            TypeError::Mismatch { span, .. }
            | TypeError::ArityMismatch { span, .. }
            | TypeError::InfiniteType { span, .. }
            | TypeError::UnresolvedPath { span, .. }
            | TypeError::UntypedDeclaration { span, .. }
            | TypeError::NotAStruct { span, .. }
            | TypeError::GenericArgCount { span, .. }
            | TypeError::RecursiveType { span, .. }
            | TypeError::NotAFunction { span, .. }
            | TypeError::NoSuchField { span, .. }
            | TypeError::InvalidOperand { span, .. }
            | TypeError::InvalidLiteralSuffix { span, .. }
            | TypeError::UnknownField { span, .. }
            | TypeError::DuplicateField { span, .. }
            | TypeError::MissingFields { span, .. }
            | TypeError::IncompatibleBase { span, .. }
            | TypeError::NonUnitStatement { span, .. }
            | TypeError::ResolutionFailure { span, .. }
            | TypeError::AmbiguousType { span, .. } => *span,
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::Mismatch {
                expected, found, ..
            } => {
                write!(f, "type mismatch: expected `{}`, found `{}`", expected, found)
            }
            TypeError::ArityMismatch {
                expected, found, ..
            } => {
                write!(
                    f,
                    "arity mismatch: expected {} arguments, found {}",
                    expected, found
                )
            }
            TypeError::InfiniteType { ty, .. } => {
                write!(f, "infinite type: a variable occurs in `{}`", ty)
            }
            TypeError::UnresolvedPath { name, .. } => {
                write!(f, "failed to resolve `{}`", name)
            }
            TypeError::UntypedDeclaration { name, .. } => {
                write!(f, "consider giving this a type: `{}`", name)
            }
            TypeError::NotAStruct { name, found, .. } => {
                write!(f, "expected a struct type, `{}` is `{}`", name, found)
            }
            TypeError::GenericArgCount {
                name,
                expected,
                found,
                ..
            } => {
                write!(
                    f,
                    "`{}` expects {} generic arguments, found {}",
                    name, expected, found
                )
            }
            TypeError::RecursiveType { name, .. } => {
                write!(f, "recursive type `{}` has infinite size", name)
            }
            TypeError::NotAFunction { ty, .. } => {
                write!(f, "`{}` is not a function", ty)
            }
            TypeError::NoSuchField { ty, field_name, .. } => {
                write!(f, "type `{}` has no field `{}`", ty, field_name)
            }
            TypeError::InvalidOperand { op, ty, .. } => {
                write!(f, "cannot apply `{}` to `{}`", op, ty)
            }
            TypeError::InvalidLiteralSuffix { suffix, .. } => {
                write!(f, "invalid suffix `{}` for number literal", suffix)
            }
            TypeError::UnknownField {
                struct_name,
                field_name,
                ..
            } => {
                write!(f, "unknown field `{}` on struct `{}`", field_name, struct_name)
            }
            TypeError::DuplicateField { field_name, .. } => {
                write!(f, "field `{}` used more than once", field_name)
            }
            TypeError::MissingFields {
                struct_name,
                missing,
                ..
            } => {
                write!(
                    f,
                    "constructor of `{}` is missing fields: {}",
                    struct_name,
                    missing.join(", ")
                )
            }
            TypeError::IncompatibleBase {
                expected, found, ..
            } => {
                write!(
                    f,
                    "incompatible types for base struct reference: expected `{}`, found `{}`",
                    expected, found
                )
            }
            TypeError::NonUnitStatement { found, .. } => {
                write!(f, "expected `()`, found `{}`", found)
            }
            TypeError::ResolutionFailure { id, .. } => {
                write!(f, "failure in type resolution for {}", id)
            }
            TypeError::AmbiguousType { id, .. } => {
                write!(
                    f,
                    "unable to determine type: please give this a type: {}",
                    id
                )
            }
        }
    }
}

impl std::error::Error for TypeError {}

// ── Sink ───────────────────────────────────────────────────────────────

/// Where diagnostics go. Owned by the caller; the checker only writes.
pub trait DiagnosticSink {
    /// Record an error. Checking continues.
    fn report_error(&mut self, error: TypeError);

    /// Record an error that ends checking of the whole unit. The returned
    /// `Abort` must be propagated.
    fn report_fatal(&mut self, error: TypeError) -> Abort;

    /// Whether any error has been reported so far.
    fn errors_seen(&self) -> bool;
}

/// A sink that keeps every diagnostic in memory.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    pub errors: Vec<TypeError>,
    fatal: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a fatal error was reported.
    pub fn saw_fatal(&self) -> bool {
        self.fatal
    }

    /// Render every collected error with ariadne.
    pub fn render_all(&self, source: &str, filename: &str) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| crate::diagnostics::render_diagnostic(e, source, filename))
            .collect()
    }
}

impl DiagnosticSink for Diagnostics {
    fn report_error(&mut self, error: TypeError) {
        self.errors.push(error);
    }

    fn report_fatal(&mut self, error: TypeError) -> Abort {
        self.errors.push(error);
        self.fatal = true;
        Abort::Unit
    }

    fn errors_seen(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ── Control flow ───────────────────────────────────────────────────────

/// Why a traversal stopped before producing a type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Abort {
    /// No sound type could be produced; unwinds to the enclosing item.
    Item,
    /// A fatal diagnostic was reported; unwinds out of the driver.
    Unit,
    /// The checker itself is broken.
    Bug(InternalError),
}

impl From<InternalError> for Abort {
    fn from(err: InternalError) -> Self {
        Abort::Bug(err)
    }
}

pub type CheckResult<T> = Result<T, Abort>;

/// A violated checker invariant. Indicates a defect in the checker (or a
/// misconfigured context), never a problem in the program being checked.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InternalError {
    #[error("required builtin type `{0}` is not registered")]
    MissingBuiltin(String),
    #[error("no signature recorded for item {0}")]
    MissingSignature(HirId),
    #[error("slot {index} of `{adt}` was never filled while reordering a struct literal")]
    UnfilledFieldSlot { adt: String, index: usize },
    #[error("field index {index} of `{adt}` is out of range")]
    FieldIndexOutOfRange { adt: String, index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_hir::TextSize;

    fn span() -> TextRange {
        TextRange::new(TextSize::from(2), TextSize::from(5))
    }

    #[test]
    fn type_error_display() {
        let err = TypeError::MissingFields {
            struct_name: "P".into(),
            missing: vec!["y".into(), "z".into()],
            span: span(),
        };
        assert_eq!(err.to_string(), "constructor of `P` is missing fields: y, z");

        let err = TypeError::NonUnitStatement {
            found: Ty::i32(),
            span: span(),
        };
        assert_eq!(err.to_string(), "expected `()`, found `i32`");
        assert_eq!(err.span(), span());
    }

    #[test]
    fn unify_errors_convert() {
        let err = TypeError::from_unify(
            UnifyError::Mismatch {
                expected: Ty::bool(),
                found: Ty::i32(),
            },
            span(),
        );
        assert_eq!(err.to_string(), "type mismatch: expected `bool`, found `i32`");
    }

    #[test]
    fn fatal_reports_are_recorded_and_abort_the_unit() {
        let mut sink = Diagnostics::new();
        assert!(!sink.errors_seen());
        let abort = sink.report_fatal(TypeError::DuplicateField {
            field_name: "x".into(),
            span: span(),
        });
        assert_eq!(abort, Abort::Unit);
        assert!(sink.errors_seen());
        assert!(sink.saw_fatal());
    }

    #[test]
    fn internal_errors_are_distinct() {
        let abort: Abort = InternalError::MissingBuiltin("i32".into()).into();
        assert_eq!(
            abort,
            Abort::Bug(InternalError::MissingBuiltin("i32".into()))
        );
        assert_eq!(
            InternalError::MissingBuiltin("i32".into()).to_string(),
            "required builtin type `i32` is not registered"
        );
    }
}
