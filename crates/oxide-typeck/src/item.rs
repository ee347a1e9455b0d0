//! Item signatures and bodies.
//!
//! Pass 1 records a type for every top-level item without looking at any
//! body: struct declarations (on demand, so field types may name structs
//! declared later), function signatures and constant types. Pass 2 checks
//! bodies against those signatures.

use log::debug;
use oxide_hir::{
    ConstDecl, FnDecl, HirId, Item, ItemKind, StructDecl, TypeRef, TypeRefKind, TypeRes,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::context::TypeContext;
use crate::error::{Abort, CheckResult, DiagnosticSink, InternalError, TypeError};
use crate::expr::ExprCtxt;
use crate::subst;
use crate::ty::{AdtTy, InferKind, ParamTy, StructFieldTy, Ty};

// ── Type references ────────────────────────────────────────────────────

/// Where a written type appears.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypePosition {
    /// A struct field, fn parameter or return type, or const type. Generic
    /// structs must be given all their arguments here.
    Signature,
    /// An annotation inside a body. Generic structs written without
    /// arguments get fresh variables.
    Body,
}

/// Lower a written type to a `Ty` and record it under the type's id.
pub fn lower_type_ref(
    ctx: &mut TypeContext,
    sink: &mut dyn DiagnosticSink,
    ty: &TypeRef,
    position: TypePosition,
) -> CheckResult<Ty> {
    let span = ty.span;
    let lowered = match &ty.kind {
        TypeRefKind::Unit => Ty::Unit,
        TypeRefKind::Infer => ctx.fresh_var(InferKind::General),
        TypeRefKind::Path { name, res, args } => {
            let name = name.clone();
            match res {
                None => {
                    sink.report_error(TypeError::UnresolvedPath { name, span });
                    return Err(Abort::Item);
                }
                Some(TypeRes::Builtin) => match ctx.lookup_builtin(&name) {
                    Some(prim) => prim,
                    None => {
                        sink.report_error(TypeError::UnresolvedPath { name, span });
                        return Err(Abort::Item);
                    }
                },
                Some(TypeRes::Param(id)) => match ctx.lookup(*id) {
                    Some(param) => param,
                    None => {
                        sink.report_error(TypeError::UntypedDeclaration { name, span });
                        return Err(Abort::Item);
                    }
                },
                Some(TypeRes::Adt(id)) => match ctx.lookup(*id) {
                    Some(Ty::Adt(adt)) => {
                        Ty::Adt(lower_adt_args(ctx, sink, &adt, args, span, position)?)
                    }
                    Some(found) => {
                        sink.report_error(TypeError::NotAStruct { name, found, span });
                        return Err(Abort::Item);
                    }
                    None => {
                        sink.report_error(TypeError::UntypedDeclaration { name, span });
                        return Err(Abort::Item);
                    }
                },
            }
        }
    };
    ctx.insert(ty.id, lowered.clone());
    Ok(lowered)
}

fn lower_adt_args(
    ctx: &mut TypeContext,
    sink: &mut dyn DiagnosticSink,
    adt: &AdtTy,
    args: &[TypeRef],
    span: oxide_hir::TextRange,
    position: TypePosition,
) -> CheckResult<AdtTy> {
    if args.is_empty() && position == TypePosition::Body {
        return Ok(subst::infer_fresh(adt, ctx));
    }
    let mut lowered = Vec::with_capacity(args.len());
    for arg in args {
        lowered.push(lower_type_ref(ctx, &mut *sink, arg, position)?);
    }
    subst::apply_explicit(adt, lowered).map_err(|err| {
        sink.report_error(err.into_type_error(&adt.name, span));
        Abort::Item
    })
}

// ── Pass 1: signatures ─────────────────────────────────────────────────

/// Registers the type of every top-level item.
pub struct SignatureCollector<'a> {
    ctx: &'a mut TypeContext,
    sink: &'a mut dyn DiagnosticSink,
    /// Every struct item, so field types can register structs on demand.
    structs: FxHashMap<HirId, &'a Item>,
    /// Structs whose registration is underway; meeting one again is a cycle.
    registering: FxHashSet<HirId>,
    /// Structs whose registration already failed and was reported.
    failed: FxHashSet<HirId>,
}

impl<'a> SignatureCollector<'a> {
    pub fn new(
        ctx: &'a mut TypeContext,
        sink: &'a mut dyn DiagnosticSink,
        items: &'a [Item],
    ) -> Self {
        let structs = items
            .iter()
            .filter(|item| matches!(item.kind, ItemKind::Struct(_)))
            .map(|item| (item.id, item))
            .collect();
        SignatureCollector {
            ctx,
            sink,
            structs,
            registering: FxHashSet::default(),
            failed: FxHashSet::default(),
        }
    }

    /// Record the signature of `item`.
    pub fn collect_item(&mut self, item: &Item) -> CheckResult<()> {
        match &item.kind {
            ItemKind::Struct(_) => self.ensure_struct(item.id),
            ItemKind::Fn(decl) => self.collect_fn(item, decl),
            ItemKind::Const(decl) => self.collect_const(item, decl),
        }
    }

    fn lower(&mut self, ty: &TypeRef) -> CheckResult<Ty> {
        self.ensure_referenced(ty)?;
        lower_type_ref(self.ctx, &mut *self.sink, ty, TypePosition::Signature)
    }

    /// Register every struct `ty` mentions before it is lowered.
    fn ensure_referenced(&mut self, ty: &TypeRef) -> CheckResult<()> {
        if let TypeRefKind::Path { res, args, .. } = &ty.kind {
            if let Some(TypeRes::Adt(id)) = res {
                self.ensure_struct(*id)?;
            }
            for arg in args {
                self.ensure_referenced(arg)?;
            }
        }
        Ok(())
    }

    fn ensure_struct(&mut self, id: HirId) -> CheckResult<()> {
        if self.failed.contains(&id) {
            return Err(Abort::Item);
        }
        let Some(item) = self.structs.get(&id).copied() else {
            // Not a struct; lowering reports what it is.
            return Ok(());
        };
        if self.registering.contains(&id) {
            self.sink.report_error(TypeError::RecursiveType {
                name: item.name.clone(),
                span: item.span,
            });
            self.failed.insert(id);
            return Err(Abort::Item);
        }
        if self.ctx.contains(id) {
            return Ok(());
        }
        let ItemKind::Struct(decl) = &item.kind else {
            return Ok(());
        };

        self.registering.insert(id);
        let result = self.register_struct(item, decl);
        self.registering.remove(&id);
        if result.is_err() {
            self.failed.insert(id);
        }
        result
    }

    fn register_struct(&mut self, item: &Item, decl: &StructDecl) -> CheckResult<()> {
        let params: Vec<ParamTy> = decl
            .generics
            .iter()
            .enumerate()
            .map(|(index, g)| ParamTy {
                index,
                name: g.name.clone(),
            })
            .collect();
        for (g, param) in decl.generics.iter().zip(&params) {
            self.ctx.insert(g.id, Ty::Param(param.clone()));
        }

        let mut fields = Vec::with_capacity(decl.fields.len());
        for (index, field) in decl.fields.iter().enumerate() {
            let ty = self.lower(&field.ty)?;
            self.ctx.insert(field.id, ty.clone());
            fields.push(StructFieldTy {
                name: field.name.clone(),
                ty,
                index,
            });
        }

        let adt = Ty::Adt(AdtTy {
            def: item.id,
            name: item.name.clone(),
            kind: decl.kind,
            fields,
            params,
            substs: None,
        });
        debug!("registered struct `{}` ({}): {}", item.name, item.id, adt);
        self.ctx.insert(item.id, adt);
        Ok(())
    }

    fn collect_fn(&mut self, item: &Item, decl: &FnDecl) -> CheckResult<()> {
        let mut params = Vec::with_capacity(decl.params.len());
        for param in &decl.params {
            let ty = self.lower(&param.ty)?;
            self.ctx.insert(param.id, ty.clone());
            params.push(ty);
        }
        let ret = match &decl.ret {
            Some(ty) => self.lower(ty)?,
            None => Ty::Unit,
        };
        let sig = Ty::fun(params, ret);
        debug!("registered fn `{}` ({}): {}", item.name, item.id, sig);
        self.ctx.insert(item.id, sig);
        Ok(())
    }

    fn collect_const(&mut self, item: &Item, decl: &ConstDecl) -> CheckResult<()> {
        let ty = self.lower(&decl.ty)?;
        debug!("registered const `{}` ({}): {}", item.name, item.id, ty);
        self.ctx.insert(item.id, ty);
        Ok(())
    }
}

// ── Pass 2: bodies ─────────────────────────────────────────────────────

/// Check the body of `item` against its recorded signature.
pub fn check_item_body(ecx: &mut ExprCtxt<'_>, item: &mut Item) -> CheckResult<()> {
    match &mut item.kind {
        ItemKind::Fn(decl) => {
            let ret = match ecx.ctx.lookup(item.id) {
                Some(Ty::Fn(_, ret)) => *ret,
                _ => return Err(InternalError::MissingSignature(item.id).into()),
            };
            let body_ty = ecx.check_block(&mut decl.body)?;
            let span = decl
                .body
                .tail
                .as_ref()
                .map_or(decl.body.span, |tail| tail.span);
            ecx.unify_site(&ret, &body_ty, span);
        }
        ItemKind::Const(decl) => {
            let Some(ty) = ecx.ctx.lookup(item.id) else {
                return Err(InternalError::MissingSignature(item.id).into());
            };
            let value_ty = ecx.check_expr(&mut decl.value)?;
            ecx.unify_site(&ty, &value_ty, decl.value.span);
        }
        ItemKind::Struct(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;
    use oxide_hir::build::HirBuilder;
    use oxide_hir::StructKind;

    fn collect(items: &[Item], ctx: &mut TypeContext, sink: &mut Diagnostics) -> Vec<CheckResult<()>> {
        let mut collector = SignatureCollector::new(ctx, sink, items);
        items.iter().map(|item| collector.collect_item(item)).collect()
    }

    #[test]
    fn field_types_may_name_later_structs() {
        let mut b = HirBuilder::new();
        let inner_id = b.reserve_item();
        let inner_ty = b.ty_adt("Inner", inner_id.0, Vec::new());
        let outer_field = b.field_decl("inner", inner_ty);
        let outer = b.struct_item("Outer", StructKind::Named, Vec::new(), vec![outer_field]);
        let flag_ty = b.ty_builtin("bool");
        let flag = b.field_decl("flag", flag_ty);
        let inner = b.struct_item_with_id(inner_id, "Inner", StructKind::Named, Vec::new(), vec![flag]);
        let items = vec![outer, inner];

        let mut ctx = TypeContext::new();
        let mut sink = Diagnostics::new();
        let results = collect(&items, &mut ctx, &mut sink);

        assert!(results.iter().all(Result::is_ok));
        assert!(sink.errors.is_empty());
        assert_eq!(ctx.lookup(items[0].id).unwrap().to_string(), "Outer");
        assert_eq!(ctx.lookup(items[1].id).unwrap().to_string(), "Inner");
    }

    #[test]
    fn recursive_struct_is_reported_once() {
        let mut b = HirBuilder::new();
        let node_id = b.reserve_item();
        let next_ty = b.ty_adt("Node", node_id.0, Vec::new());
        let next = b.field_decl("next", next_ty);
        let node = b.struct_item_with_id(node_id, "Node", StructKind::Named, Vec::new(), vec![next]);
        let items = vec![node];

        let mut ctx = TypeContext::new();
        let mut sink = Diagnostics::new();
        let results = collect(&items, &mut ctx, &mut sink);

        assert_eq!(results, vec![Err(Abort::Item)]);
        assert_eq!(sink.errors.len(), 1);
        assert_eq!(
            sink.errors[0].to_string(),
            "recursive type `Node` has infinite size"
        );
    }

    #[test]
    fn generic_struct_keeps_params_in_fields() {
        let mut b = HirBuilder::new();
        let t = b.generic_param("T");
        let t_ty = b.ty_param(&t);
        let value = b.field_decl("value", t_ty);
        let wrapper = b.struct_item("Wrapper", StructKind::Named, vec![t.clone()], vec![value]);
        let items = vec![wrapper];

        let mut ctx = TypeContext::new();
        let mut sink = Diagnostics::new();
        collect(&items, &mut ctx, &mut sink);

        let Some(Ty::Adt(adt)) = ctx.lookup(items[0].id) else {
            panic!("Wrapper not registered");
        };
        assert_eq!(adt.params.len(), 1);
        assert_eq!(adt.fields[0].ty.to_string(), "T");
        assert_eq!(Ty::Adt(adt).to_string(), "Wrapper<T>");
    }

    #[test]
    fn fn_signature_and_params_are_recorded() {
        let mut b = HirBuilder::new();
        let a_ty = b.ty_builtin("i64");
        let a = b.param("a", a_ty);
        let a_id = a.id;
        let ret = b.ty_builtin("bool");
        let body = b.block(Vec::new(), None);
        let f = b.fn_item("f", vec![a], Some(ret), body);
        let items = vec![f];

        let mut ctx = TypeContext::new();
        let mut sink = Diagnostics::new();
        collect(&items, &mut ctx, &mut sink);

        assert_eq!(ctx.lookup(items[0].id).unwrap().to_string(), "fn(i64) -> bool");
        assert_eq!(ctx.lookup(a_id), Some(Ty::i64()));
    }

    #[test]
    fn unresolved_type_name_fails_the_item() {
        let mut b = HirBuilder::new();
        let ty = b.ty_unresolved("Missing");
        let value = b.int(0);
        let c = b.const_item("C", ty, value);
        let items = vec![c];

        let mut ctx = TypeContext::new();
        let mut sink = Diagnostics::new();
        let results = collect(&items, &mut ctx, &mut sink);

        assert_eq!(results, vec![Err(Abort::Item)]);
        assert_eq!(sink.errors[0].to_string(), "failed to resolve `Missing`");
    }

    #[test]
    fn explicit_generic_args_in_signatures() {
        let mut b = HirBuilder::new();
        let t = b.generic_param("T");
        let t_ty = b.ty_param(&t);
        let value = b.field_decl("value", t_ty);
        let wrapper = b.struct_item("Wrapper", StructKind::Named, vec![t.clone()], vec![value]);
        let arg = b.ty_builtin("u8");
        let annotated = b.ty_adt("Wrapper", wrapper.id, vec![arg]);
        let init = b.int(0);
        let c = b.const_item("C", annotated, init);
        let items = vec![wrapper, c];

        let mut ctx = TypeContext::new();
        let mut sink = Diagnostics::new();
        collect(&items, &mut ctx, &mut sink);

        assert_eq!(ctx.lookup(items[1].id).unwrap().to_string(), "Wrapper<u8>");
    }

    #[test]
    fn signatures_need_every_generic_argument() {
        let mut b = HirBuilder::new();
        let t = b.generic_param("T");
        let t_ty = b.ty_param(&t);
        let value = b.field_decl("value", t_ty);
        let wrapper = b.struct_item("Wrapper", StructKind::Named, vec![t.clone()], vec![value]);
        let bare = b.ty_adt("Wrapper", wrapper.id, Vec::new());
        let field = b.field_decl("w", bare);
        let holder = b.struct_item("Holder", StructKind::Named, Vec::new(), vec![field]);
        let items = vec![wrapper, holder];

        let mut ctx = TypeContext::new();
        let mut sink = Diagnostics::new();
        let results = collect(&items, &mut ctx, &mut sink);

        assert_eq!(results, vec![Ok(()), Err(Abort::Item)]);
        assert_eq!(sink.errors.len(), 1);
        assert_eq!(
            sink.errors[0].to_string(),
            "`Wrapper` expects 1 generic arguments, found 0"
        );
        assert_eq!(ctx.lookup(items[1].id), None);
    }
}
