//! Property tests for unification.
//!
//! Invariants that must hold for any pair of types:
//!
//! 1. Reflexivity: unify(t, t) == Ok(t)
//! 2. Symmetry: unify(a, b) and unify(b, a) agree on success and result
//! 3. Literal variables only accept primitives of their class
//! 4. After a successful context unify, both sides resolve to the result

use oxide_hir::{HirId, StructKind};
use oxide_typeck::context::TypeContext;
use oxide_typeck::ty::{AdtTy, InferKind, InferVar, ParamTy, PrimTy, StructFieldTy, Ty};
use oxide_typeck::unify::unify;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Six variables with a fixed kind each: 0-1 general, 2-3 integral, 4-5
/// float. `fresh_context` creates them in that order.
const VAR_COUNT: u32 = 6;

fn var_kind(index: u32) -> InferKind {
    match index / 2 {
        0 => InferKind::General,
        1 => InferKind::Integral,
        _ => InferKind::Float,
    }
}

fn fresh_context() -> TypeContext {
    let mut ctx = TypeContext::new();
    for index in 0..VAR_COUNT {
        ctx.fresh_var(var_kind(index));
    }
    ctx
}

/// `struct W<T>(T)`, two distinct declarations.
fn wrapper(def: u32, arg: Ty) -> Ty {
    Ty::Adt(AdtTy {
        def: HirId(100 + def),
        name: format!("W{}", def),
        kind: StructKind::Tuple,
        fields: vec![StructFieldTy {
            name: "0".into(),
            ty: arg.clone(),
            index: 0,
        }],
        params: vec![ParamTy {
            index: 0,
            name: "T".into(),
        }],
        substs: Some(vec![arg]),
    })
}

fn arb_prim() -> impl Strategy<Value = PrimTy> {
    prop::sample::select(PrimTy::ALL.to_vec())
}

fn arb_var() -> impl Strategy<Value = Ty> {
    (0..VAR_COUNT).prop_map(|i| Ty::Infer(var_kind(i), InferVar(i)))
}

fn arb_leaf(with_error: bool) -> BoxedStrategy<Ty> {
    let leaf = prop_oneof![
        3 => arb_prim().prop_map(Ty::Prim),
        1 => Just(Ty::Unit),
        3 => arb_var(),
    ];
    if with_error {
        prop_oneof![6 => leaf, 1 => Just(Ty::Error)].boxed()
    } else {
        leaf.boxed()
    }
}

fn arb_ty(depth: u32, with_error: bool) -> BoxedStrategy<Ty> {
    if depth == 0 {
        return arb_leaf(with_error);
    }
    let inner = arb_ty(depth - 1, with_error);
    prop_oneof![
        3 => arb_leaf(with_error),
        1 => (prop::collection::vec(inner.clone(), 0..3), inner.clone())
            .prop_map(|(params, ret)| Ty::fun(params, ret)),
        1 => (0u32..2, inner).prop_map(|(def, arg)| wrapper(def, arg)),
    ]
    .boxed()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn unify_is_reflexive(t in arb_ty(2, true)) {
        prop_assert_eq!(unify(&t, &t), Ok(t.clone()));
    }

    #[test]
    fn unify_is_symmetric(a in arb_ty(2, true), b in arb_ty(2, true)) {
        prop_assert_eq!(unify(&a, &b).ok(), unify(&b, &a).ok());
    }

    #[test]
    fn error_absorbs_anything(t in arb_ty(2, true)) {
        prop_assert_eq!(unify(&Ty::Error, &t), Ok(Ty::Error));
        prop_assert_eq!(unify(&t, &Ty::Error), Ok(Ty::Error));
    }

    #[test]
    fn literal_vars_accept_only_their_class(p in arb_prim()) {
        let int = Ty::Infer(InferKind::Integral, InferVar(2));
        let float = Ty::Infer(InferKind::Float, InferVar(4));
        prop_assert_eq!(unify(&int, &Ty::Prim(p)).is_ok(), p.is_integral());
        prop_assert_eq!(unify(&float, &Ty::Prim(p)).is_ok(), p.is_float());
    }

    #[test]
    fn context_unify_makes_both_sides_agree(a in arb_ty(2, false), b in arb_ty(2, false)) {
        let mut ctx = fresh_context();
        let pure = unify(&a, &b);
        match ctx.unify(&a, &b) {
            Ok(unified) => {
                prop_assert!(pure.is_ok());
                prop_assert_eq!(ctx.resolve(&a), unified.clone());
                prop_assert_eq!(ctx.resolve(&b), unified);
            }
            Err(_) => {
                // The context may also reject a repeated variable whose
                // counterparts disagree, which the pure function cannot see.
            }
        }
    }

    #[test]
    fn pure_failure_means_context_failure(a in arb_ty(2, false), b in arb_ty(2, false)) {
        let mut ctx = fresh_context();
        if unify(&a, &b).is_err() {
            prop_assert!(ctx.unify(&a, &b).is_err());
        }
    }
}
