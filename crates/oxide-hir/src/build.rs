//! Programmatic HIR construction.
//!
//! The lowering from syntax lives elsewhere; this builder lets drivers and
//! tests assemble name-resolved trees directly. Every node gets a fresh id
//! and a one-byte span at an increasing offset, so locations stay distinct.

use rowan::{TextRange, TextSize};

use crate::ids::{HirId, Mappings};
use crate::node::*;

/// Allocates ids and spans while assembling HIR nodes.
#[derive(Debug, Default)]
pub struct HirBuilder {
    mappings: Mappings,
    cursor: u32,
}

impl HirBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish building and hand over the id/location table.
    pub fn into_mappings(self) -> Mappings {
        self.mappings
    }

    pub fn mappings(&self) -> &Mappings {
        &self.mappings
    }

    fn alloc(&mut self) -> (HirId, TextRange) {
        let span = TextRange::at(TextSize::from(self.cursor), TextSize::from(1));
        self.cursor += 1;
        (self.mappings.next_hir_id(span), span)
    }

    fn expr(&mut self, kind: ExprKind) -> Expr {
        let (id, span) = self.alloc();
        Expr { id, span, kind }
    }

    // ── Literals ────────────────────────────────────────────────────

    pub fn int(&mut self, value: u128) -> Expr {
        self.expr(ExprKind::Lit(Lit::Int(value, None)))
    }

    pub fn int_suffixed(&mut self, value: u128, suffix: &str) -> Expr {
        self.expr(ExprKind::Lit(Lit::Int(value, Some(suffix.to_string()))))
    }

    pub fn float(&mut self, value: f64) -> Expr {
        self.expr(ExprKind::Lit(Lit::Float(value, None)))
    }

    pub fn float_suffixed(&mut self, value: f64, suffix: &str) -> Expr {
        self.expr(ExprKind::Lit(Lit::Float(value, Some(suffix.to_string()))))
    }

    pub fn bool_lit(&mut self, value: bool) -> Expr {
        self.expr(ExprKind::Lit(Lit::Bool(value)))
    }

    pub fn char_lit(&mut self, value: char) -> Expr {
        self.expr(ExprKind::Lit(Lit::Char(value)))
    }

    pub fn str_lit(&mut self, value: &str) -> Expr {
        self.expr(ExprKind::Lit(Lit::Str(value.to_string())))
    }

    pub fn unit(&mut self) -> Expr {
        self.expr(ExprKind::Lit(Lit::Unit))
    }

    // ── Expressions ─────────────────────────────────────────────────

    /// A single-segment path resolving to `res`.
    pub fn path(&mut self, name: &str, res: Option<HirId>) -> Expr {
        self.expr(ExprKind::Path(Path {
            segments: vec![PathSegment {
                name: name.to_string(),
                generic_args: Vec::new(),
            }],
            res,
        }))
    }

    pub fn field(&mut self, base: Expr, name: &str) -> Expr {
        self.expr(ExprKind::Field(Box::new(base), name.to_string()))
    }

    pub fn tuple_index(&mut self, base: Expr, index: usize) -> Expr {
        self.expr(ExprKind::TupleIndex(Box::new(base), index))
    }

    pub fn call(&mut self, callee: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call(Box::new(callee), args))
    }

    pub fn unary(&mut self, op: UnOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary(op, Box::new(operand)))
    }

    pub fn binary(&mut self, op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    pub fn assign(&mut self, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Assign(Box::new(lhs), Box::new(rhs)))
    }

    pub fn paren(&mut self, inner: Expr) -> Expr {
        self.expr(ExprKind::Paren(Box::new(inner)))
    }

    pub fn block(&mut self, stmts: Vec<Stmt>, tail: Option<Expr>) -> Block {
        let (id, span) = self.alloc();
        Block {
            id,
            span,
            stmts,
            tail: tail.map(Box::new),
        }
    }

    pub fn block_expr(&mut self, stmts: Vec<Stmt>, tail: Option<Expr>) -> Expr {
        let block = self.block(stmts, tail);
        self.expr(ExprKind::Block(block))
    }

    /// `Name { fields.., ..base }` where `Name` resolves to `res`.
    pub fn struct_expr(
        &mut self,
        name: &str,
        res: Option<HirId>,
        fields: Vec<StructExprField>,
        base: Option<Expr>,
    ) -> Expr {
        self.struct_expr_with_args(name, res, Vec::new(), fields, base)
    }

    /// `Name::<args> { fields.., ..base }`
    pub fn struct_expr_with_args(
        &mut self,
        name: &str,
        res: Option<HirId>,
        generic_args: Vec<TypeRef>,
        fields: Vec<StructExprField>,
        base: Option<Expr>,
    ) -> Expr {
        let (_, path_span) = self.alloc();
        self.expr(ExprKind::Struct(StructExpr {
            path: Path {
                segments: vec![PathSegment {
                    name: name.to_string(),
                    generic_args,
                }],
                res,
            },
            path_span,
            fields,
            base: base.map(Box::new),
        }))
    }

    pub fn named_field(&mut self, name: &str, value: Expr) -> StructExprField {
        let (id, span) = self.alloc();
        StructExprField {
            id,
            span,
            kind: StructExprFieldKind::Named {
                name: name.to_string(),
                value,
            },
        }
    }

    pub fn index_field(&mut self, index: usize, value: Expr) -> StructExprField {
        let (id, span) = self.alloc();
        StructExprField {
            id,
            span,
            kind: StructExprFieldKind::Index { index, value },
        }
    }

    pub fn shorthand_field(&mut self, name: &str, res: Option<HirId>) -> StructExprField {
        let (id, span) = self.alloc();
        StructExprField {
            id,
            span,
            kind: StructExprFieldKind::Shorthand {
                name: name.to_string(),
                res,
            },
        }
    }

    // ── Statements ──────────────────────────────────────────────────

    /// `let name: ty = init;`. Returns the binding id alongside the
    /// statement so paths can resolve to it.
    pub fn let_stmt(
        &mut self,
        name: &str,
        ty: Option<TypeRef>,
        init: Option<Expr>,
    ) -> (HirId, Stmt) {
        let (binding, _) = self.alloc();
        let (id, span) = self.alloc();
        let stmt = Stmt {
            id,
            span,
            kind: StmtKind::Let(Local {
                id: binding,
                name: name.to_string(),
                ty,
                init,
            }),
        };
        (binding, stmt)
    }

    pub fn expr_stmt(&mut self, expr: Expr) -> Stmt {
        let (id, span) = self.alloc();
        Stmt {
            id,
            span,
            kind: StmtKind::Expr(expr),
        }
    }

    pub fn semi_stmt(&mut self, expr: Expr) -> Stmt {
        let (id, span) = self.alloc();
        Stmt {
            id,
            span,
            kind: StmtKind::Semi(expr),
        }
    }

    // ── Types ───────────────────────────────────────────────────────

    fn type_ref(&mut self, kind: TypeRefKind) -> TypeRef {
        let (id, span) = self.alloc();
        TypeRef { id, span, kind }
    }

    pub fn ty_builtin(&mut self, name: &str) -> TypeRef {
        self.type_ref(TypeRefKind::Path {
            name: name.to_string(),
            res: Some(TypeRes::Builtin),
            args: Vec::new(),
        })
    }

    pub fn ty_adt(&mut self, name: &str, item: HirId, args: Vec<TypeRef>) -> TypeRef {
        self.type_ref(TypeRefKind::Path {
            name: name.to_string(),
            res: Some(TypeRes::Adt(item)),
            args,
        })
    }

    pub fn ty_param(&mut self, param: &GenericParam) -> TypeRef {
        self.type_ref(TypeRefKind::Path {
            name: param.name.clone(),
            res: Some(TypeRes::Param(param.id)),
            args: Vec::new(),
        })
    }

    /// A type path that name resolution could not resolve.
    pub fn ty_unresolved(&mut self, name: &str) -> TypeRef {
        self.type_ref(TypeRefKind::Path {
            name: name.to_string(),
            res: None,
            args: Vec::new(),
        })
    }

    pub fn ty_unit(&mut self) -> TypeRef {
        self.type_ref(TypeRefKind::Unit)
    }

    pub fn ty_infer(&mut self) -> TypeRef {
        self.type_ref(TypeRefKind::Infer)
    }

    // ── Items ───────────────────────────────────────────────────────

    pub fn generic_param(&mut self, name: &str) -> GenericParam {
        let (id, span) = self.alloc();
        GenericParam {
            id,
            span,
            name: name.to_string(),
        }
    }

    pub fn field_decl(&mut self, name: &str, ty: TypeRef) -> FieldDecl {
        let (id, span) = self.alloc();
        FieldDecl {
            id,
            span,
            name: name.to_string(),
            ty,
        }
    }

    /// Reserve the id of a struct item before its fields are built, so that
    /// field types can refer back to it.
    pub fn reserve_item(&mut self) -> (HirId, TextRange) {
        self.alloc()
    }

    pub fn struct_item(
        &mut self,
        name: &str,
        kind: StructKind,
        generics: Vec<GenericParam>,
        fields: Vec<FieldDecl>,
    ) -> Item {
        let (id, span) = self.alloc();
        Self::assemble_struct(id, span, name, kind, generics, fields)
    }

    /// Like [`struct_item`](Self::struct_item) with an id obtained from
    /// [`reserve_item`](Self::reserve_item).
    pub fn struct_item_with_id(
        &mut self,
        (id, span): (HirId, TextRange),
        name: &str,
        kind: StructKind,
        generics: Vec<GenericParam>,
        fields: Vec<FieldDecl>,
    ) -> Item {
        Self::assemble_struct(id, span, name, kind, generics, fields)
    }

    fn assemble_struct(
        id: HirId,
        span: TextRange,
        name: &str,
        kind: StructKind,
        generics: Vec<GenericParam>,
        fields: Vec<FieldDecl>,
    ) -> Item {
        Item {
            id,
            span,
            name: name.to_string(),
            kind: ItemKind::Struct(StructDecl {
                kind,
                generics,
                fields,
            }),
        }
    }

    pub fn param(&mut self, name: &str, ty: TypeRef) -> Param {
        let (id, span) = self.alloc();
        Param {
            id,
            span,
            name: name.to_string(),
            ty,
        }
    }

    pub fn fn_item(
        &mut self,
        name: &str,
        params: Vec<Param>,
        ret: Option<TypeRef>,
        body: Block,
    ) -> Item {
        let (id, span) = self.alloc();
        Item {
            id,
            span,
            name: name.to_string(),
            kind: ItemKind::Fn(FnDecl { params, ret, body }),
        }
    }

    /// A function item with an id obtained from [`reserve_item`](Self::reserve_item),
    /// for bodies that call the function recursively.
    pub fn fn_item_with_id(
        &mut self,
        (id, span): (HirId, TextRange),
        name: &str,
        params: Vec<Param>,
        ret: Option<TypeRef>,
        body: Block,
    ) -> Item {
        Item {
            id,
            span,
            name: name.to_string(),
            kind: ItemKind::Fn(FnDecl { params, ret, body }),
        }
    }

    pub fn const_item(&mut self, name: &str, ty: TypeRef, value: Expr) -> Item {
        let (id, span) = self.alloc();
        Item {
            id,
            span,
            name: name.to_string(),
            kind: ItemKind::Const(ConstDecl { ty, value }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_node_gets_a_distinct_location() {
        let mut b = HirBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        assert_ne!(one.id, two.id);
        assert_ne!(one.span, two.span);

        let mappings = b.into_mappings();
        assert_eq!(mappings.lookup_location(one.id), Some(one.span));
        assert_eq!(mappings.lookup_location(two.id), Some(two.span));
    }

    #[test]
    fn struct_expr_keeps_source_field_order() {
        let mut b = HirBuilder::new();
        let y = b.int(2);
        let y = b.named_field("y", y);
        let x = b.int(1);
        let x = b.named_field("x", x);
        let lit = b.struct_expr("P", Some(HirId(0)), vec![y, x], None);

        let ExprKind::Struct(s) = lit.kind else {
            panic!("expected a struct expression");
        };
        let names: Vec<String> = s.fields.iter().map(|f| f.field_name()).collect();
        assert_eq!(names, vec!["y", "x"]);
    }

    #[test]
    fn index_fields_are_named_by_position() {
        let mut b = HirBuilder::new();
        let value = b.bool_lit(true);
        let field = b.index_field(1, value);
        assert_eq!(field.field_name(), "1");
        assert!(field.value().is_some());

        let shorthand = b.shorthand_field("x", None);
        assert_eq!(shorthand.field_name(), "x");
        assert!(shorthand.value().is_none());
    }
}
