//! The type context: node types, builtin registry, and inference variables.
//!
//! One `TypeContext` is owned by the driver for the duration of a unit's
//! check and threaded through every checking call. It maps each node
//! identity to its current type (later writes replace earlier ones) and owns
//! the `ena` table that records what each inference variable was unified
//! with.

use std::ops::ControlFlow;

use ena::unify::InPlaceUnificationTable;
use oxide_hir::HirId;
use rustc_hash::FxHashMap;

use crate::error::InternalError;
use crate::ty::{AdtTy, InferKind, InferVar, PrimTy, StructFieldTy, Ty};
use crate::unify::{self, UnifyError};

pub struct TypeContext {
    /// Current type of every checked node.
    types: FxHashMap<HirId, Ty>,
    /// Builtin primitives by surface name.
    builtins: FxHashMap<&'static str, Ty>,
    /// The union-find table for inference variables (ena).
    table: InPlaceUnificationTable<InferVar>,
}

impl TypeContext {
    /// Create a context with every builtin primitive registered.
    pub fn new() -> Self {
        let mut ctx = Self::without_builtins();
        for prim in PrimTy::ALL {
            ctx.builtins.insert(prim.name(), Ty::Prim(prim));
        }
        ctx
    }

    /// Create a context with an empty builtin registry.
    pub fn without_builtins() -> Self {
        TypeContext {
            types: FxHashMap::default(),
            builtins: FxHashMap::default(),
            table: InPlaceUnificationTable::new(),
        }
    }

    // ── Node types ──────────────────────────────────────────────────

    /// Record `ty` as the type of `id`, replacing any previous entry.
    pub fn insert(&mut self, id: HirId, ty: Ty) {
        self.types.insert(id, ty);
    }

    /// The current type of `id`, with bound variables substituted.
    pub fn lookup(&mut self, id: HirId) -> Option<Ty> {
        let ty = self.types.get(&id)?.clone();
        Some(self.resolve(&ty))
    }

    pub fn contains(&self, id: HirId) -> bool {
        self.types.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Apply `visitor` to every entry in ascending id order.
    ///
    /// The visitor sees the resolved type and may revise it in place; the
    /// revision is written back under the same id. Returning
    /// `ControlFlow::Break` stops the iteration.
    pub fn iterate<F>(&mut self, mut visitor: F)
    where
        F: FnMut(HirId, &mut Ty) -> ControlFlow<()>,
    {
        let mut ids: Vec<HirId> = self.types.keys().copied().collect();
        ids.sort_unstable();

        for id in ids {
            let Some(stored) = self.types.get(&id).cloned() else {
                continue;
            };
            let mut ty = self.resolve(&stored);
            let flow = visitor(id, &mut ty);
            if ty != stored {
                self.types.insert(id, ty);
            }
            if flow.is_break() {
                break;
            }
        }
    }

    /// Every entry, resolved, in ascending id order.
    pub fn entries(&mut self) -> Vec<(HirId, Ty)> {
        let mut ids: Vec<HirId> = self.types.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(|id| self.lookup(id).map(|ty| (id, ty)))
            .collect()
    }

    // ── Builtins ────────────────────────────────────────────────────

    pub fn lookup_builtin(&self, name: &str) -> Option<Ty> {
        self.builtins.get(name).cloned()
    }

    /// Look up a builtin the checker itself depends on. Its absence is a
    /// checker defect, not a user error.
    pub fn require_builtin(&self, name: &str) -> Result<Ty, InternalError> {
        self.lookup_builtin(name)
            .ok_or_else(|| InternalError::MissingBuiltin(name.to_string()))
    }

    // ── Inference variables ─────────────────────────────────────────

    /// Create a fresh, unbound inference variable of the given kind.
    pub fn fresh_var(&mut self, kind: InferKind) -> Ty {
        Ty::Infer(kind, self.table.new_key(None))
    }

    /// Substitute bound inference variables throughout `ty`.
    pub fn resolve(&mut self, ty: &Ty) -> Ty {
        match ty {
            Ty::Infer(kind, v) => match self.table.probe_value(*v) {
                Some(bound) => self.resolve(&bound),
                None => Ty::Infer(*kind, *v),
            },
            Ty::Fn(params, ret) => {
                let params = params.iter().map(|p| self.resolve(p)).collect();
                let ret = self.resolve(ret);
                Ty::fun(params, ret)
            }
            Ty::Adt(adt) => {
                let fields = adt
                    .fields
                    .iter()
                    .map(|f| StructFieldTy {
                        name: f.name.clone(),
                        ty: self.resolve(&f.ty),
                        index: f.index,
                    })
                    .collect();
                let substs = adt
                    .substs
                    .as_ref()
                    .map(|args| args.iter().map(|a| self.resolve(a)).collect());
                Ty::Adt(AdtTy {
                    fields,
                    substs,
                    ..adt.clone()
                })
            }
            other => other.clone(),
        }
    }

    /// Unify `a` and `b` and persist what was learned about their
    /// variables.
    ///
    /// Both sides are resolved first, combined with [`unify::unify`], and
    /// then every still-unbound variable of either side is bound to its
    /// counterpart in the result. Returns the resolved result.
    pub fn unify(&mut self, a: &Ty, b: &Ty) -> Result<Ty, UnifyError> {
        let a = self.resolve(a);
        let b = self.resolve(b);
        let unified = unify::unify(&a, &b)?;
        self.bind(&a, &unified)?;
        self.bind(&b, &unified)?;
        Ok(self.resolve(&unified))
    }

    /// Walk `ty` alongside `unified` and bind variables of `ty` to their
    /// counterparts.
    fn bind(&mut self, ty: &Ty, unified: &Ty) -> Result<(), UnifyError> {
        if unified.is_error() {
            return Ok(());
        }
        match (ty, unified) {
            (Ty::Infer(kind, v), _) => {
                let var = Ty::Infer(*kind, *v);
                let current = self.resolve(&var);
                let target = self.resolve(unified);
                if current == target {
                    return Ok(());
                }
                if current == var {
                    // Still unbound. Earlier bindings of this walk may have
                    // made the target mention `v`.
                    if target.mentions(*v) {
                        return Err(UnifyError::InfiniteType { var: *v, ty: target });
                    }
                    self.table
                        .unify_var_value(*v, Some(target))
                        .map_err(|(bound, new)| UnifyError::Mismatch {
                            expected: bound,
                            found: new,
                        })
                } else {
                    // Bound earlier in this same walk (the variable occurs
                    // twice); both uses must agree.
                    let merged = unify::unify(&current, &target)?;
                    self.bind(&current, &merged)?;
                    self.bind(&target, &merged)
                }
            }
            (Ty::Fn(p1, r1), Ty::Fn(p2, r2)) => {
                for (p, u) in p1.iter().zip(p2) {
                    self.bind(p, u)?;
                }
                self.bind(r1, r2)
            }
            (Ty::Adt(x), Ty::Adt(y)) => {
                for (f, u) in x.fields.iter().zip(&y.fields) {
                    self.bind(&f.ty, &u.ty)?;
                }
                if let (Some(a1), Some(a2)) = (&x.substs, &y.substs) {
                    for (p, u) in a1.iter().zip(a2) {
                        self.bind(p, u)?;
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
