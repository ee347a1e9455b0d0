//! Substitution of generic arguments into ADTs.
//!
//! A generic struct's declaration type keeps `Ty::Param` in its field types.
//! Using the struct instantiates it: explicit arguments (`Pair::<i32, bool>`)
//! replace each parameter, otherwise every parameter gets a fresh inference
//! variable that later unification fills in.

use oxide_hir::TextRange;

use crate::context::TypeContext;
use crate::error::TypeError;
use crate::ty::{AdtTy, InferKind, StructFieldTy, Ty};

/// Explicit generic arguments of the wrong arity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubstError {
    pub expected: usize,
    pub found: usize,
}

impl SubstError {
    /// The diagnostic for instantiating struct `name` at `span`.
    pub fn into_type_error(self, name: &str, span: TextRange) -> TypeError {
        TypeError::GenericArgCount {
            name: name.to_string(),
            expected: self.expected,
            found: self.found,
            span,
        }
    }
}

/// Replace every `Param(i)` in `ty` with `args[i]`.
///
/// Parameters without a matching argument are left in place.
pub fn substitute(ty: &Ty, args: &[Ty]) -> Ty {
    match ty {
        Ty::Param(p) => args.get(p.index).cloned().unwrap_or_else(|| ty.clone()),
        Ty::Fn(params, ret) => {
            let params = params.iter().map(|p| substitute(p, args)).collect();
            Ty::fun(params, substitute(ret, args))
        }
        Ty::Adt(adt) => Ty::Adt(substitute_adt(adt, args)),
        _ => ty.clone(),
    }
}

fn substitute_adt(adt: &AdtTy, args: &[Ty]) -> AdtTy {
    let fields = adt
        .fields
        .iter()
        .map(|f| StructFieldTy {
            name: f.name.clone(),
            ty: substitute(&f.ty, args),
            index: f.index,
        })
        .collect();
    let substs = adt
        .substs
        .as_ref()
        .map(|own| own.iter().map(|a| substitute(a, args)).collect());
    AdtTy {
        fields,
        substs,
        ..adt.clone()
    }
}

/// Instantiate `adt` with explicitly written arguments.
///
/// A non-generic ADT is returned unchanged whatever `args` holds; the
/// struct-literal path never writes arguments on those.
pub fn apply_explicit(adt: &AdtTy, args: Vec<Ty>) -> Result<AdtTy, SubstError> {
    if !adt.is_generic() {
        return Ok(adt.clone());
    }
    if args.len() != adt.params.len() {
        return Err(SubstError {
            expected: adt.params.len(),
            found: args.len(),
        });
    }
    Ok(instantiate(adt, args))
}

/// Instantiate `adt` with one fresh general variable per parameter.
pub fn infer_fresh(adt: &AdtTy, ctx: &mut TypeContext) -> AdtTy {
    if !adt.is_generic() {
        return adt.clone();
    }
    let args = adt
        .params
        .iter()
        .map(|_| ctx.fresh_var(InferKind::General))
        .collect();
    instantiate(adt, args)
}

fn instantiate(adt: &AdtTy, args: Vec<Ty>) -> AdtTy {
    let fields = adt
        .fields
        .iter()
        .map(|f| StructFieldTy {
            name: f.name.clone(),
            ty: substitute(&f.ty, &args),
            index: f.index,
        })
        .collect();
    AdtTy {
        fields,
        substs: Some(args),
        ..adt.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::ParamTy;
    use oxide_hir::{HirId, StructKind, TextSize};

    fn param(index: usize, name: &str) -> ParamTy {
        ParamTy {
            index,
            name: name.into(),
        }
    }

    fn pair_decl() -> AdtTy {
        AdtTy {
            def: HirId(1),
            name: "Pair".into(),
            kind: StructKind::Named,
            fields: vec![
                StructFieldTy { name: "a".into(), ty: Ty::Param(param(0, "A")), index: 0 },
                StructFieldTy { name: "b".into(), ty: Ty::Param(param(1, "B")), index: 1 },
                StructFieldTy { name: "n".into(), ty: Ty::i32(), index: 2 },
            ],
            params: vec![param(0, "A"), param(1, "B")],
            substs: None,
        }
    }

    #[test]
    fn explicit_args_replace_params() {
        let adt = apply_explicit(&pair_decl(), vec![Ty::bool(), Ty::f64()]).unwrap();
        assert_eq!(adt.field("a").unwrap().ty, Ty::bool());
        assert_eq!(adt.field("b").unwrap().ty, Ty::f64());
        assert_eq!(adt.field("n").unwrap().ty, Ty::i32());
        assert_eq!(adt.substs, Some(vec![Ty::bool(), Ty::f64()]));
        assert_eq!(Ty::Adt(adt).to_string(), "Pair<bool, f64>");
    }

    #[test]
    fn explicit_arity_is_checked() {
        assert_eq!(
            apply_explicit(&pair_decl(), vec![Ty::bool()]),
            Err(SubstError {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn arity_error_becomes_a_diagnostic() {
        let err = apply_explicit(&pair_decl(), Vec::new()).unwrap_err();
        let diag = err.into_type_error("Pair", TextRange::empty(TextSize::from(0)));
        assert_eq!(diag.to_string(), "`Pair` expects 2 generic arguments, found 0");
    }

    #[test]
    fn non_generic_passes_through() {
        let mut plain = pair_decl();
        plain.params.clear();
        assert_eq!(apply_explicit(&plain, Vec::new()), Ok(plain.clone()));
    }

    #[test]
    fn fresh_instantiation_uses_distinct_vars() {
        let mut ctx = TypeContext::new();
        let adt = infer_fresh(&pair_decl(), &mut ctx);
        let a = adt.field("a").unwrap().ty.clone();
        let b = adt.field("b").unwrap().ty.clone();
        assert!(matches!(a, Ty::Infer(InferKind::General, _)));
        assert!(matches!(b, Ty::Infer(InferKind::General, _)));
        assert_ne!(a, b);
        assert_eq!(adt.substs, Some(vec![a, b]));
    }

    #[test]
    fn substitute_reaches_nested_types() {
        let f = Ty::fun(vec![Ty::Param(param(0, "T"))], Ty::Param(param(0, "T")));
        assert_eq!(
            substitute(&f, &[Ty::u8()]),
            Ty::fun(vec![Ty::u8()], Ty::u8())
        );
    }
}
