//! Struct literal resolution.
//!
//! A literal `Path { fields.., ..base }` is checked against the struct it
//! names: every written field is matched to a declared field by name (or
//! tuple index), fields left out are filled from `base` with synthesized
//! field accesses, and the literal's field list is rewritten into
//! declaration order. Lowering relies on that order matching the
//! declaration positionally.

use std::mem;

use index_vec::IndexVec;
use log::trace;
use oxide_hir::{
    Expr, ExprKind, Path, PathSegment, StructExpr, StructExprField, StructExprFieldKind,
    StructKind, TextRange,
};
use rustc_hash::FxHashMap;

use crate::error::{Abort, CheckResult, InternalError, TypeError};
use crate::expr::ExprCtxt;
use crate::ty::{AdtTy, StructFieldTy, Ty};

index_vec::define_index_type! {
    /// Handle to a field node synthesized from the `..base` expression.
    pub struct SynthFieldIdx = u32;
}

/// Where the field node for one declaration slot lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FieldSlot {
    /// Written in the literal, at this source position.
    Source(usize),
    /// Synthesized from the base expression.
    Synthesized(SynthFieldIdx),
}

/// Bookkeeping for one literal. Dropped once the literal is rewritten.
struct FieldResolution {
    /// Field name -> declaration index, for every field assigned so far.
    assigned: FxHashMap<String, usize>,
    /// Declaration index -> field node.
    slots: Vec<Option<FieldSlot>>,
    /// Owns the synthesized field nodes until they are moved into the
    /// literal.
    synthesized: IndexVec<SynthFieldIdx, Option<StructExprField>>,
    /// A field was unknown, duplicated, or had a mismatched value.
    field_errors: bool,
}

impl FieldResolution {
    fn new(num_fields: usize) -> Self {
        FieldResolution {
            assigned: FxHashMap::default(),
            slots: vec![None; num_fields],
            synthesized: IndexVec::new(),
            field_errors: false,
        }
    }

    /// Match one written field against the declaration and check its value.
    fn resolve_field(
        &mut self,
        ecx: &mut ExprCtxt<'_>,
        adt: &AdtTy,
        pos: usize,
        field: &mut StructExprField,
    ) -> CheckResult<()> {
        let name = field.field_name();
        if self.assigned.contains_key(&name) {
            ecx.sink.report_error(TypeError::DuplicateField {
                field_name: name,
                span: field.span,
            });
            self.field_errors = true;
            return Ok(());
        }
        let Some(decl) = adt.field(&name) else {
            ecx.sink.report_error(TypeError::UnknownField {
                struct_name: adt.name.clone(),
                field_name: name,
                span: field.span,
            });
            self.field_errors = true;
            return Ok(());
        };
        let index = decl.index;
        if index >= self.slots.len() {
            return Err(InternalError::FieldIndexOutOfRange {
                adt: adt.name.clone(),
                index,
            }
            .into());
        }

        let value_ty = match &mut field.kind {
            StructExprFieldKind::Named { value, .. } | StructExprFieldKind::Index { value, .. } => {
                ecx.check_expr(value)?
            }
            StructExprFieldKind::Shorthand { name, res } => {
                // `x` is checked as the path expression `x`.
                let mut ident = Expr {
                    id: field.id,
                    span: field.span,
                    kind: ExprKind::Path(Path {
                        segments: vec![PathSegment {
                            name: name.clone(),
                            generic_args: Vec::new(),
                        }],
                        res: *res,
                    }),
                };
                ecx.check_expr(&mut ident)?
            }
        };

        match ecx.ctx.unify(&decl.ty, &value_ty) {
            Ok(ty) => {
                ecx.ctx.insert(field.id, ty);
                self.assigned.insert(name, index);
                self.slots[index] = Some(FieldSlot::Source(pos));
            }
            Err(err) => {
                ecx.sink
                    .report_error(TypeError::from_unify(err, field.span));
                self.field_errors = true;
            }
        }
        Ok(())
    }

    /// Fill declared field `decl` with an access to the same field of
    /// `base`.
    fn synthesize(&mut self, ecx: &mut ExprCtxt<'_>, adt: &AdtTy, decl: &StructFieldTy, base: &Expr) {
        let access_id = ecx.mappings.next_hir_id(base.span);
        let field_id = ecx.mappings.next_hir_id(base.span);
        let receiver = Box::new(base.clone());

        let access_kind = match adt.kind {
            StructKind::Named => ExprKind::Field(receiver, decl.name.clone()),
            StructKind::Tuple => ExprKind::TupleIndex(receiver, decl.index),
        };
        let access = Expr {
            id: access_id,
            span: base.span,
            kind: access_kind,
        };
        let kind = match adt.kind {
            StructKind::Named => StructExprFieldKind::Named {
                name: decl.name.clone(),
                value: access,
            },
            StructKind::Tuple => StructExprFieldKind::Index {
                index: decl.index,
                value: access,
            },
        };

        let ty = ecx.ctx.resolve(&decl.ty);
        ecx.ctx.insert(access_id, ty.clone());
        ecx.ctx.insert(field_id, ty);

        let idx = self.synthesized.push(Some(StructExprField {
            id: field_id,
            span: base.span,
            kind,
        }));
        self.slots[decl.index] = Some(FieldSlot::Synthesized(idx));
        trace!(
            "filled `{}` of `{}` from base as {} (slot {})",
            decl.name,
            adt.name,
            access_id,
            decl.index
        );
    }

    /// Move every field node into declaration order.
    fn into_ordered(
        mut self,
        adt: &AdtTy,
        written: Vec<StructExprField>,
    ) -> Result<Vec<StructExprField>, InternalError> {
        let mut written: Vec<Option<StructExprField>> = written.into_iter().map(Some).collect();
        let mut ordered = Vec::with_capacity(self.slots.len());

        for (index, slot) in self.slots.iter().enumerate() {
            let field = match slot {
                Some(FieldSlot::Source(pos)) => written.get_mut(*pos).and_then(Option::take),
                Some(FieldSlot::Synthesized(idx)) => self.synthesized[*idx].take(),
                None => None,
            };
            let field = field.ok_or_else(|| InternalError::UnfilledFieldSlot {
                adt: adt.name.clone(),
                index,
            })?;
            ordered.push(field);
        }
        Ok(ordered)
    }
}

/// Check a struct literal, rewrite its fields into declaration order, and
/// return its type.
pub fn check_struct_expr(
    ecx: &mut ExprCtxt<'_>,
    lit: &mut StructExpr,
    span: TextRange,
) -> CheckResult<Ty> {
    let adt = resolve_struct_path(ecx, &lit.path, lit.path_span)?;
    let mut literal_ty = Ty::Adt(adt.clone());

    if let Some(base) = lit.base.as_deref_mut() {
        let base_ty = ecx.check_expr(base)?;
        match ecx.ctx.unify(&literal_ty, &base_ty) {
            Ok(ty) => literal_ty = ty,
            Err(_) => {
                let found = ecx.ctx.resolve(&base_ty);
                return Err(ecx.sink.report_fatal(TypeError::IncompatibleBase {
                    expected: literal_ty,
                    found,
                    span: base.span,
                }));
            }
        }
    }

    let mut resolution = FieldResolution::new(adt.num_fields());
    for (pos, field) in lit.fields.iter_mut().enumerate() {
        resolution.resolve_field(ecx, &adt, pos, field)?;
    }
    if resolution.field_errors {
        return Ok(Ty::Error);
    }

    if resolution.assigned.len() != adt.num_fields() {
        let Some(base) = lit.base.as_deref() else {
            let missing = adt
                .fields
                .iter()
                .filter(|f| !resolution.assigned.contains_key(&f.name))
                .map(|f| f.name.clone())
                .collect();
            ecx.sink.report_error(TypeError::MissingFields {
                struct_name: adt.name.clone(),
                missing,
                span,
            });
            return Ok(Ty::Error);
        };
        for decl in &adt.fields {
            if !resolution.assigned.contains_key(&decl.name) {
                resolution.synthesize(ecx, &adt, decl, base);
            }
        }
    }

    let written = mem::take(&mut lit.fields);
    lit.fields = resolution.into_ordered(&adt, written)?;

    Ok(ecx.ctx.resolve(&literal_ty))
}

/// Resolve the literal's path to the (instantiated) struct type.
fn resolve_struct_path(ecx: &mut ExprCtxt<'_>, path: &Path, span: TextRange) -> CheckResult<AdtTy> {
    let name = path.to_string();
    let Some(res) = path.res else {
        ecx.sink
            .report_error(TypeError::UnresolvedPath { name, span });
        return Err(Abort::Item);
    };
    let adt = match ecx.ctx.lookup(res) {
        Some(Ty::Adt(adt)) => adt,
        Some(found) => {
            ecx.sink
                .report_error(TypeError::NotAStruct { name, found, span });
            return Err(Abort::Item);
        }
        None => {
            ecx.sink
                .report_error(TypeError::UntypedDeclaration { name, span });
            return Err(Abort::Item);
        }
    };

    if adt.is_generic() && adt.substs.is_none() {
        let args = path
            .final_segment()
            .map(|seg| seg.generic_args.as_slice())
            .unwrap_or_default();
        return ecx.instantiate_adt(&adt, args, span);
    }
    Ok(adt)
}
