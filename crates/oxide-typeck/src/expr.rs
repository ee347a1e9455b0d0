//! Expression and block checking.
//!
//! `ExprCtxt` walks one item body. Every expression gets a type that is
//! written into the context under the expression's id before the walk
//! returns. Soft errors are reported to the sink and the offending node is
//! typed `Error`; hard errors unwind with `Abort`.

use oxide_hir::{
    BinOp, Block, Expr, ExprKind, Lit, Local, Mappings, Path, Stmt, StmtKind, TextRange, TypeRef,
    UnOp,
};

use crate::context::TypeContext;
use crate::error::{Abort, CheckResult, DiagnosticSink, TypeError};
use crate::item::{lower_type_ref, TypePosition};
use crate::subst;
use crate::ty::{AdtTy, InferKind, PrimTy, Ty};

/// The state threaded through the checking of one item body.
pub struct ExprCtxt<'a> {
    pub ctx: &'a mut TypeContext,
    pub mappings: &'a mut Mappings,
    pub sink: &'a mut dyn DiagnosticSink,
}

impl<'a> ExprCtxt<'a> {
    pub fn new(
        ctx: &'a mut TypeContext,
        mappings: &'a mut Mappings,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        ExprCtxt { ctx, mappings, sink }
    }

    /// Check `expr` and record its type.
    pub fn check_expr(&mut self, expr: &mut Expr) -> CheckResult<Ty> {
        let span = expr.span;
        let ty = match &mut expr.kind {
            ExprKind::Lit(lit) => self.check_lit(lit, span)?,
            ExprKind::Path(path) => self.check_path(path, span)?,
            ExprKind::Block(block) => self.check_block(block)?,
            ExprKind::Struct(lit) => crate::struct_expr::check_struct_expr(self, lit, span)?,
            ExprKind::Field(base, name) => {
                let base_ty = self.check_expr(base)?;
                self.field_of(&base_ty, name, span)
            }
            ExprKind::TupleIndex(base, index) => {
                let base_ty = self.check_expr(base)?;
                self.field_of(&base_ty, &index.to_string(), span)
            }
            ExprKind::Call(callee, args) => self.check_call(callee, args, span)?,
            ExprKind::Unary(op, operand) => {
                let op = *op;
                self.check_unary(op, operand, span)?
            }
            ExprKind::Binary(op, lhs, rhs) => {
                let op = *op;
                self.check_binary(op, lhs, rhs, span)?
            }
            ExprKind::Assign(lhs, rhs) => {
                let lhs_ty = self.check_expr(lhs)?;
                let rhs_ty = self.check_expr(rhs)?;
                self.unify_site(&lhs_ty, &rhs_ty, rhs.span);
                Ty::Unit
            }
            ExprKind::Paren(inner) => self.check_expr(inner)?,
        };
        self.ctx.insert(expr.id, ty.clone());
        Ok(ty)
    }

    /// Unify `expected` with `found`. A failure is reported at `span` and
    /// yields `Error`.
    pub(crate) fn unify_site(&mut self, expected: &Ty, found: &Ty, span: TextRange) -> Ty {
        match self.ctx.unify(expected, found) {
            Ok(ty) => ty,
            Err(err) => {
                self.sink.report_error(TypeError::from_unify(err, span));
                Ty::Error
            }
        }
    }

    // ── Blocks and statements ───────────────────────────────────────

    /// Check a block's statements in order, then its tail.
    pub fn check_block(&mut self, block: &mut Block) -> CheckResult<Ty> {
        let count = block.stmts.len();
        let has_tail = block.tail.is_some();
        let mut final_expr_ty = None;

        for (i, stmt) in block.stmts.iter_mut().enumerate() {
            let ty = self.check_stmt(stmt)?;

            // Without a tail, a trailing expression statement is the value.
            if !has_tail && i + 1 == count && matches!(stmt.kind, StmtKind::Expr(_)) {
                final_expr_ty = Some(ty);
                continue;
            }

            if self.ctx.unify(&Ty::Unit, &ty).is_err() {
                let found = self.ctx.resolve(&ty);
                self.sink.report_error(TypeError::NonUnitStatement {
                    found,
                    span: stmt.span,
                });
            }
        }

        let ty = match &mut block.tail {
            Some(tail) => self.check_expr(tail)?,
            None => final_expr_ty.unwrap_or(Ty::Unit),
        };
        self.ctx.insert(block.id, ty.clone());
        Ok(ty)
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) -> CheckResult<Ty> {
        let ty = match &mut stmt.kind {
            StmtKind::Let(local) => {
                self.check_local(local)?;
                Ty::Unit
            }
            StmtKind::Expr(expr) => self.check_expr(expr)?,
            StmtKind::Semi(expr) => {
                self.check_expr(expr)?;
                Ty::Unit
            }
        };
        self.ctx.insert(stmt.id, ty.clone());
        Ok(ty)
    }

    fn check_local(&mut self, local: &mut Local) -> CheckResult<()> {
        let annotated = match &local.ty {
            Some(ty) => Some(self.lower_type(ty)?),
            None => None,
        };
        let init = match &mut local.init {
            Some(expr) => Some((self.check_expr(expr)?, expr.span)),
            None => None,
        };

        let ty = match (annotated, init) {
            (Some(annotated), Some((init_ty, span))) => {
                // A mismatch keeps the annotation so later uses check against it.
                let ty = self.unify_site(&annotated, &init_ty, span);
                if ty.is_error() {
                    annotated
                } else {
                    ty
                }
            }
            (Some(annotated), None) => annotated,
            (None, Some((init_ty, _))) => init_ty,
            (None, None) => self.ctx.fresh_var(InferKind::General),
        };
        self.ctx.insert(local.id, ty);
        Ok(())
    }

    pub(crate) fn lower_type(&mut self, ty: &TypeRef) -> CheckResult<Ty> {
        lower_type_ref(self.ctx, &mut *self.sink, ty, TypePosition::Body)
    }

    // ── Leaves ──────────────────────────────────────────────────────

    fn check_lit(&mut self, lit: &Lit, span: TextRange) -> CheckResult<Ty> {
        let ty = match lit {
            Lit::Int(_, None) => self.ctx.fresh_var(InferKind::Integral),
            Lit::Float(_, None) => self.ctx.fresh_var(InferKind::Float),
            // `1f32` is a float, as in Rust.
            Lit::Int(_, Some(suffix)) => {
                self.suffixed(suffix, span, |p| p.is_integral() || p.is_float())
            }
            Lit::Float(_, Some(suffix)) => self.suffixed(suffix, span, PrimTy::is_float),
            Lit::Bool(_) => self.ctx.require_builtin("bool")?,
            Lit::Char(_) => self.ctx.require_builtin("char")?,
            Lit::Str(_) => self.ctx.require_builtin("str")?,
            Lit::Unit => Ty::Unit,
        };
        Ok(ty)
    }

    fn suffixed(&mut self, suffix: &str, span: TextRange, accepts: fn(PrimTy) -> bool) -> Ty {
        match self.ctx.lookup_builtin(suffix) {
            Some(Ty::Prim(p)) if accepts(p) => Ty::Prim(p),
            _ => {
                self.sink.report_error(TypeError::InvalidLiteralSuffix {
                    suffix: suffix.to_string(),
                    span,
                });
                Ty::Error
            }
        }
    }

    fn check_path(&mut self, path: &Path, span: TextRange) -> CheckResult<Ty> {
        let Some(res) = path.res else {
            self.sink.report_error(TypeError::UnresolvedPath {
                name: path.to_string(),
                span,
            });
            return Err(Abort::Item);
        };
        let Some(ty) = self.ctx.lookup(res) else {
            self.sink.report_error(TypeError::UntypedDeclaration {
                name: path.to_string(),
                span,
            });
            return Err(Abort::Item);
        };

        match ty {
            Ty::Adt(adt) if adt.is_generic() && adt.substs.is_none() => {
                let args = path
                    .final_segment()
                    .map(|seg| seg.generic_args.as_slice())
                    .unwrap_or_default();
                Ok(Ty::Adt(self.instantiate_adt(&adt, args, span)?))
            }
            other => Ok(other),
        }
    }

    /// Instantiate a generic ADT at a use site: the written arguments if
    /// there are any, fresh variables otherwise.
    pub(crate) fn instantiate_adt(
        &mut self,
        adt: &AdtTy,
        args: &[TypeRef],
        span: TextRange,
    ) -> CheckResult<AdtTy> {
        if args.is_empty() {
            return Ok(subst::infer_fresh(adt, self.ctx));
        }
        let args = args
            .iter()
            .map(|arg| self.lower_type(arg))
            .collect::<CheckResult<Vec<_>>>()?;
        subst::apply_explicit(adt, args).map_err(|err| {
            self.sink.report_error(err.into_type_error(&adt.name, span));
            Abort::Item
        })
    }

    // ── Compound expressions ────────────────────────────────────────

    /// The type of field `name` of a value of type `base_ty`.
    pub(crate) fn field_of(&mut self, base_ty: &Ty, name: &str, span: TextRange) -> Ty {
        match self.ctx.resolve(base_ty) {
            Ty::Error => Ty::Error,
            Ty::Adt(adt) => match adt.field(name) {
                Some(field) => field.ty.clone(),
                None => {
                    self.sink.report_error(TypeError::NoSuchField {
                        ty: Ty::Adt(adt.clone()),
                        field_name: name.to_string(),
                        span,
                    });
                    Ty::Error
                }
            },
            other => {
                self.sink.report_error(TypeError::NoSuchField {
                    ty: other,
                    field_name: name.to_string(),
                    span,
                });
                Ty::Error
            }
        }
    }

    fn check_call(&mut self, callee: &mut Expr, args: &mut [Expr], span: TextRange) -> CheckResult<Ty> {
        let callee_ty = self.check_expr(callee)?;
        let mut arg_tys = Vec::with_capacity(args.len());
        for arg in args.iter_mut() {
            arg_tys.push((self.check_expr(arg)?, arg.span));
        }

        match self.ctx.resolve(&callee_ty) {
            Ty::Fn(params, ret) => {
                if params.len() != arg_tys.len() {
                    self.sink.report_error(TypeError::ArityMismatch {
                        expected: params.len(),
                        found: arg_tys.len(),
                        span,
                    });
                }
                for (param, (arg_ty, arg_span)) in params.iter().zip(&arg_tys) {
                    self.unify_site(param, arg_ty, *arg_span);
                }
                Ok(*ret)
            }
            Ty::Error => Ok(Ty::Error),
            other => {
                self.sink.report_error(TypeError::NotAFunction {
                    ty: other,
                    span: callee.span,
                });
                Ok(Ty::Error)
            }
        }
    }

    fn check_unary(&mut self, op: UnOp, operand: &mut Expr, span: TextRange) -> CheckResult<Ty> {
        let ty = self.check_expr(operand)?;
        let resolved = self.ctx.resolve(&ty);
        let ok = match (op, &resolved) {
            (_, Ty::Error) | (_, Ty::Infer(InferKind::General, _)) => true,
            (UnOp::Neg, Ty::Prim(p)) => p.is_signed(),
            (UnOp::Neg, other) => other.is_numeric(),
            (UnOp::Not, other) => *other == Ty::bool() || other.is_integral(),
        };
        if ok {
            return Ok(resolved);
        }
        let op = match op {
            UnOp::Neg => "-",
            UnOp::Not => "!",
        };
        self.sink.report_error(TypeError::InvalidOperand {
            op,
            ty: resolved,
            span,
        });
        Ok(Ty::Error)
    }

    fn check_binary(
        &mut self,
        op: BinOp,
        lhs: &mut Expr,
        rhs: &mut Expr,
        span: TextRange,
    ) -> CheckResult<Ty> {
        let lhs_ty = self.check_expr(lhs)?;
        let rhs_ty = self.check_expr(rhs)?;

        if op.is_lazy_boolean() {
            let bool_ty = self.ctx.require_builtin("bool")?;
            self.unify_site(&bool_ty, &lhs_ty, lhs.span);
            self.unify_site(&bool_ty, &rhs_ty, rhs.span);
            return Ok(bool_ty);
        }

        let operand = self.unify_site(&lhs_ty, &rhs_ty, rhs.span);
        if op.is_comparison() {
            return Ok(self.ctx.require_builtin("bool")?);
        }

        let operand = self.ctx.resolve(&operand);
        if operand.is_error()
            || operand.is_numeric()
            || matches!(operand, Ty::Infer(InferKind::General, _))
        {
            return Ok(operand);
        }
        self.sink.report_error(TypeError::InvalidOperand {
            op: op.as_str(),
            ty: operand,
            span,
        });
        Ok(Ty::Error)
    }
}
