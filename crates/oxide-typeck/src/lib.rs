//! Oxide type checker: inference and checking over the HIR.
//!
//! This crate assigns a type to every expression and declaration of a
//! name-resolved HIR crate, defaults unconstrained numeric literals, and
//! validates struct literals against their declarations (rewriting their
//! field lists into declaration order for lowering).
//!
//! Checking runs in three passes, each only if the previous one reported
//! nothing:
//!
//! 1. signatures: struct, function and constant types
//! 2. bodies: function bodies and constant initializers
//! 3. fallback: literal defaulting and a final check that every type is
//!    concrete
//!
//! # Architecture
//!
//! - [`ty`]: Type representation (Ty, AdtTy, PrimTy, inference variables)
//! - [`unify`]: The pure unification function
//! - [`context`]: TypeContext (node types, builtins, ena variable table)
//! - [`subst`]: Generic ADT instantiation
//! - [`expr`]: Expression and block checking
//! - [`struct_expr`]: Struct literal resolution and field reordering
//! - [`item`]: Signature collection and item bodies
//! - [`fallback`]: Literal defaulting
//! - [`error`]: Type errors, the diagnostic sink, and internal errors
//! - [`diagnostics`]: Ariadne rendering of type errors

pub mod context;
pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod fallback;
pub mod item;
pub mod struct_expr;
pub mod subst;
pub mod ty;
pub mod unify;

use std::fmt;

use log::debug;
use oxide_hir::{Crate, HirId, Mappings};
use serde::Serialize;

pub use crate::context::TypeContext;
pub use crate::error::{Abort, DiagnosticSink, Diagnostics, InternalError, TypeError};
pub use crate::ty::Ty;

use crate::expr::ExprCtxt;
use crate::item::{check_item_body, SignatureCollector};

/// One of the three checking passes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Pass {
    Signatures,
    Bodies,
    Fallback,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Signatures => write!(f, "signatures"),
            Pass::Bodies => write!(f, "bodies"),
            Pass::Fallback => write!(f, "fallback"),
        }
    }
}

/// Whether the checked crate may be handed to lowering.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every pass completed without diagnostics.
    Lowerable,
    /// `pass` reported diagnostics; no later pass ran.
    Rejected { pass: Pass },
}

/// One row of the final type table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeRow {
    pub id: HirId,
    pub ty: String,
}

/// The result of type checking a crate.
pub struct TypeckResult {
    /// The type of every checked node.
    pub context: TypeContext,
    pub outcome: Outcome,
}

impl TypeckResult {
    pub fn is_lowerable(&self) -> bool {
        self.outcome == Outcome::Lowerable
    }

    /// The resolved type of `id`.
    pub fn type_of(&mut self, id: HirId) -> Option<Ty> {
        self.context.lookup(id)
    }

    /// Every node and its type, in id order.
    pub fn type_table(&mut self) -> Vec<TypeRow> {
        self.context
            .entries()
            .into_iter()
            .map(|(id, ty)| TypeRow {
                id,
                ty: ty.to_string(),
            })
            .collect()
    }

    /// The type table as JSON.
    pub fn to_json(&mut self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.type_table())
    }
}

/// Runs the passes over one crate.
///
/// The passes can be driven one at a time; [`check`] runs all three and
/// stops as soon as a pass reports anything.
pub struct TypeChecker<'a> {
    ctx: TypeContext,
    mappings: &'a mut Mappings,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> TypeChecker<'a> {
    pub fn new(mappings: &'a mut Mappings, sink: &'a mut dyn DiagnosticSink) -> Self {
        Self::with_context(TypeContext::new(), mappings, sink)
    }

    /// Start from a caller-supplied context (for example one with a custom
    /// builtin registry).
    pub fn with_context(
        ctx: TypeContext,
        mappings: &'a mut Mappings,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        TypeChecker {
            ctx,
            mappings,
            sink,
        }
    }

    pub fn context_mut(&mut self) -> &mut TypeContext {
        &mut self.ctx
    }

    pub fn errors_seen(&self) -> bool {
        self.sink.errors_seen()
    }

    /// Pass 1: record the type of every item.
    pub fn collect_signatures(&mut self, krate: &Crate) -> Result<(), InternalError> {
        debug!("pass {}: {} items", Pass::Signatures, krate.items.len());
        let mut collector = SignatureCollector::new(&mut self.ctx, &mut *self.sink, &krate.items);
        for item in &krate.items {
            match collector.collect_item(item) {
                Ok(()) | Err(Abort::Item) => {}
                Err(Abort::Unit) => break,
                Err(Abort::Bug(err)) => return Err(err),
            }
        }
        Ok(())
    }

    /// Pass 2: check every body against the recorded signatures.
    pub fn check_bodies(&mut self, krate: &mut Crate) -> Result<(), InternalError> {
        debug!("pass {}: {} items", Pass::Bodies, krate.items.len());
        let mut ecx = ExprCtxt::new(&mut self.ctx, &mut *self.mappings, &mut *self.sink);
        for item in &mut krate.items {
            debug!("checking `{}` ({})", item.name, item.id);
            match check_item_body(&mut ecx, item) {
                Ok(()) => {}
                Err(Abort::Item) => debug!("gave up on `{}`", item.name),
                Err(Abort::Unit) => break,
                Err(Abort::Bug(err)) => return Err(err),
            }
        }
        Ok(())
    }

    /// Pass 3: default literal variables and reject anything unresolved.
    pub fn resolve_fallbacks(&mut self) -> Result<(), InternalError> {
        debug!("pass {}: {} entries", Pass::Fallback, self.ctx.len());
        match fallback::resolve_fallbacks(&mut self.ctx, &*self.mappings, &mut *self.sink) {
            Ok(()) | Err(Abort::Item) | Err(Abort::Unit) => Ok(()),
            Err(Abort::Bug(err)) => Err(err),
        }
    }

    pub fn finish(self, outcome: Outcome) -> TypeckResult {
        TypeckResult {
            context: self.ctx,
            outcome,
        }
    }

    fn reject_if_errors(&self, pass: Pass) -> Option<Outcome> {
        if self.errors_seen() {
            debug!("pass {} reported errors; stopping", pass);
            Some(Outcome::Rejected { pass })
        } else {
            None
        }
    }
}

/// Type-check a crate with the default builtin registry.
///
/// User errors go to `sink` and show up as [`Outcome::Rejected`]; an `Err`
/// means the checker itself is broken.
pub fn check(
    krate: &mut Crate,
    mappings: &mut Mappings,
    sink: &mut dyn DiagnosticSink,
) -> Result<TypeckResult, InternalError> {
    check_with(TypeContext::new(), krate, mappings, sink)
}

/// Like [`check`], starting from `ctx`.
pub fn check_with(
    ctx: TypeContext,
    krate: &mut Crate,
    mappings: &mut Mappings,
    sink: &mut dyn DiagnosticSink,
) -> Result<TypeckResult, InternalError> {
    let mut checker = TypeChecker::with_context(ctx, mappings, sink);

    checker.collect_signatures(krate)?;
    if let Some(outcome) = checker.reject_if_errors(Pass::Signatures) {
        return Ok(checker.finish(outcome));
    }

    checker.check_bodies(krate)?;
    if let Some(outcome) = checker.reject_if_errors(Pass::Bodies) {
        return Ok(checker.finish(outcome));
    }

    checker.resolve_fallbacks()?;
    if let Some(outcome) = checker.reject_if_errors(Pass::Fallback) {
        return Ok(checker.finish(outcome));
    }

    Ok(checker.finish(Outcome::Lowerable))
}
