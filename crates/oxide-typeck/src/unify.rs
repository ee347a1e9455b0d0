//! Unification of two types.
//!
//! `unify` is a pure, total function: it combines two types into their most
//! specific common type or reports why they cannot be combined. It never
//! consults or updates any table; `TypeContext::unify` wraps it with
//! variable resolution and binding.

use std::fmt;

use crate::ty::{AdtTy, InferKind, InferVar, StructFieldTy, Ty};

/// Why two types failed to unify. Carries both types so diagnostics can
/// name them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnifyError {
    /// Incompatible type kinds, constructors, or primitives.
    Mismatch { expected: Ty, found: Ty },
    /// Function types with different parameter counts.
    ArityMismatch { expected: usize, found: usize },
    /// A variable would have to contain itself.
    InfiniteType { var: InferVar, ty: Ty },
}

impl fmt::Display for UnifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnifyError::Mismatch { expected, found } => {
                write!(f, "expected `{}`, found `{}`", expected, found)
            }
            UnifyError::ArityMismatch { expected, found } => {
                write!(f, "expected {} parameters, found {}", expected, found)
            }
            UnifyError::InfiniteType { var, ty } => {
                write!(f, "`?{}` occurs in `{}`", var.0, ty)
            }
        }
    }
}

fn mismatch(a: &Ty, b: &Ty) -> UnifyError {
    UnifyError::Mismatch {
        expected: a.clone(),
        found: b.clone(),
    }
}

/// Combine `a` and `b` into their most specific common type.
///
/// - `Error` absorbs anything, without producing a failure.
/// - A general variable yields the other side.
/// - Integral / float variables accept only matching primitives or
///   variables of the same kind; two such variables merge into the one with
///   the lower id so that `unify(a, b) == unify(b, a)`.
/// - ADTs unify only with the same declaration, field by field.
pub fn unify(a: &Ty, b: &Ty) -> Result<Ty, UnifyError> {
    match (a, b) {
        (Ty::Error, _) | (_, Ty::Error) => Ok(Ty::Error),

        // General meets general: keep the older variable.
        (Ty::Infer(InferKind::General, v1), Ty::Infer(InferKind::General, v2)) => {
            Ok(Ty::Infer(InferKind::General, (*v1).min(*v2)))
        }

        // General meets anything else: take the other side (occurs check).
        (Ty::Infer(InferKind::General, v), other) | (other, Ty::Infer(InferKind::General, v)) => {
            if other.mentions(*v) {
                Err(UnifyError::InfiniteType {
                    var: *v,
                    ty: other.clone(),
                })
            } else {
                Ok(other.clone())
            }
        }

        (Ty::Infer(k1, v1), Ty::Infer(k2, v2)) if k1 == k2 => Ok(Ty::Infer(*k1, (*v1).min(*v2))),

        (Ty::Infer(InferKind::Integral, _), Ty::Prim(p))
        | (Ty::Prim(p), Ty::Infer(InferKind::Integral, _))
            if p.is_integral() =>
        {
            Ok(Ty::Prim(*p))
        }

        (Ty::Infer(InferKind::Float, _), Ty::Prim(p))
        | (Ty::Prim(p), Ty::Infer(InferKind::Float, _))
            if p.is_float() =>
        {
            Ok(Ty::Prim(*p))
        }

        (Ty::Unit, Ty::Unit) => Ok(Ty::Unit),

        (Ty::Prim(p1), Ty::Prim(p2)) if p1 == p2 => Ok(Ty::Prim(*p1)),

        (Ty::Param(p1), Ty::Param(p2)) if p1 == p2 => Ok(Ty::Param(p1.clone())),

        // Function types: params pairwise, then return types.
        (Ty::Fn(p1, r1), Ty::Fn(p2, r2)) => {
            if p1.len() != p2.len() {
                return Err(UnifyError::ArityMismatch {
                    expected: p1.len(),
                    found: p2.len(),
                });
            }
            let params = p1
                .iter()
                .zip(p2)
                .map(|(x, y)| unify(x, y))
                .collect::<Result<Vec<_>, _>>()?;
            let ret = unify(r1, r2)?;
            Ok(Ty::fun(params, ret))
        }

        (Ty::Adt(x), Ty::Adt(y)) => unify_adt(x, y).ok_or_else(|| mismatch(a, b))?,

        // Everything else is a mismatch.
        _ => Err(mismatch(a, b)),
    }
}

/// Unify two ADTs. `None` means the declarations (or their shapes) differ;
/// `Some(Err(..))` means a field or argument failed to unify.
fn unify_adt(x: &AdtTy, y: &AdtTy) -> Option<Result<Ty, UnifyError>> {
    if x.def != y.def || x.fields.len() != y.fields.len() {
        return None;
    }

    let substs = match (&x.substs, &y.substs) {
        (None, None) => None,
        (Some(a1), Some(a2)) if a1.len() == a2.len() => {
            match a1
                .iter()
                .zip(a2)
                .map(|(p, q)| unify(p, q))
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(args) => Some(args),
                Err(e) => return Some(Err(e)),
            }
        }
        _ => return None,
    };

    let mut fields = Vec::with_capacity(x.fields.len());
    for (f1, f2) in x.fields.iter().zip(&y.fields) {
        match unify(&f1.ty, &f2.ty) {
            Ok(ty) => fields.push(StructFieldTy {
                name: f1.name.clone(),
                ty,
                index: f1.index,
            }),
            Err(e) => return Some(Err(e)),
        }
    }

    Some(Ok(Ty::Adt(AdtTy {
        def: x.def,
        name: x.name.clone(),
        kind: x.kind,
        fields,
        params: x.params.clone(),
        substs,
    })))
}

// ── Tests ──────────────────────────────────────────────────────────────
