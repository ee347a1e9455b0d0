//! Fallback resolution: the last pass.
//!
//! Integer and float literal variables that nothing constrained take the
//! default types `i32` and `f32`. Every other entry must already be
//! concrete.

use std::ops::ControlFlow;

use log::trace;
use oxide_hir::{HirId, Mappings, TextRange, TextSize};

use crate::context::TypeContext;
use crate::error::{CheckResult, DiagnosticSink, TypeError};
use crate::ty::{AdtTy, InferKind, StructFieldTy, Ty};
use crate::unify::unify;

const DEFAULT_INT: &str = "i32";
const DEFAULT_FLOAT: &str = "f32";

/// Why an entry cannot be defaulted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Unresolved {
    /// An `Error` type is stored somewhere in the entry.
    Error,
    /// A general variable was never constrained.
    Ambiguous,
}

struct Defaults {
    int: Ty,
    float: Ty,
}

/// Default every remaining literal variable in `ctx`.
///
/// An `Error` entry or an unconstrained general variable is fatal and ends
/// the walk. Running this again on its own output changes nothing.
pub fn resolve_fallbacks(
    ctx: &mut TypeContext,
    mappings: &Mappings,
    sink: &mut dyn DiagnosticSink,
) -> CheckResult<()> {
    let defaults = Defaults {
        int: ctx.require_builtin(DEFAULT_INT)?,
        float: ctx.require_builtin(DEFAULT_FLOAT)?,
    };

    let mut fatal = None;
    ctx.iterate(|id, ty| {
        match default_ty(ty, &defaults) {
            Ok(defaulted) => {
                if defaulted != *ty {
                    trace!("{}: {} defaulted to {}", id, ty, defaulted);
                    *ty = defaulted;
                }
                ControlFlow::Continue(())
            }
            Err(Unresolved::Error) => {
                let span = location(mappings, id);
                fatal = Some(sink.report_fatal(TypeError::ResolutionFailure { id, span }));
                ControlFlow::Break(())
            }
            Err(Unresolved::Ambiguous) => {
                let span = location(mappings, id);
                fatal = Some(sink.report_fatal(TypeError::AmbiguousType { id, span }));
                ControlFlow::Break(())
            }
        }
    });

    match fatal {
        Some(abort) => Err(abort),
        None => Ok(()),
    }
}

fn location(mappings: &Mappings, id: HirId) -> TextRange {
    mappings
        .lookup_location(id)
        .unwrap_or_else(|| TextRange::empty(TextSize::from(0)))
}

fn default_ty(ty: &Ty, defaults: &Defaults) -> Result<Ty, Unresolved> {
    match ty {
        Ty::Error => Err(Unresolved::Error),
        Ty::Infer(InferKind::General, _) => Err(Unresolved::Ambiguous),
        Ty::Infer(InferKind::Integral, _) => {
            unify(ty, &defaults.int).map_err(|_| Unresolved::Error)
        }
        Ty::Infer(InferKind::Float, _) => {
            unify(ty, &defaults.float).map_err(|_| Unresolved::Error)
        }
        Ty::Fn(params, ret) => {
            let params = params
                .iter()
                .map(|p| default_ty(p, defaults))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Ty::fun(params, default_ty(ret, defaults)?))
        }
        Ty::Adt(adt) => {
            let fields = adt
                .fields
                .iter()
                .map(|f| {
                    Ok(StructFieldTy {
                        name: f.name.clone(),
                        ty: default_ty(&f.ty, defaults)?,
                        index: f.index,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let substs = match &adt.substs {
                Some(args) => Some(
                    args.iter()
                        .map(|a| default_ty(a, defaults))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                None => None,
            };
            Ok(Ty::Adt(AdtTy {
                fields,
                substs,
                ..adt.clone()
            }))
        }
        Ty::Unit | Ty::Prim(_) | Ty::Param(_) => Ok(ty.clone()),
    }
}
