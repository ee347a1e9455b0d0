//! Integration tests for the three-pass driver: pass gating, block values,
//! literal defaulting, calls, and the exported type table.

use oxide_hir::build::HirBuilder;
use oxide_hir::{BinOp, Crate, Item, ItemKind};
use oxide_typeck::error::{Diagnostics, TypeError};
use oxide_typeck::{InternalError, Outcome, Pass, Ty, TypeChecker, TypeContext, TypeckResult};

// ── Helpers ────────────────────────────────────────────────────────────

fn check(b: HirBuilder, items: Vec<Item>) -> (TypeckResult, Diagnostics) {
    let mut krate = Crate { items };
    let mut mappings = b.into_mappings();
    let mut sink = Diagnostics::new();
    let result =
        oxide_typeck::check(&mut krate, &mut mappings, &mut sink).expect("checker defect");
    (result, sink)
}

fn body_id(item: &Item) -> oxide_hir::HirId {
    match &item.kind {
        ItemKind::Fn(decl) => decl.body.id,
        other => panic!("not a function: {:?}", other),
    }
}

/// `fn add(a: i32, b: i32) -> i32 { a + b }`
fn declare_add(b: &mut HirBuilder) -> Item {
    let a_ty = b.ty_builtin("i32");
    let a = b.param("a", a_ty);
    let b_ty = b.ty_builtin("i32");
    let bp = b.param("b", b_ty);
    let lhs = b.path("a", Some(a.id));
    let rhs = b.path("b", Some(bp.id));
    let sum = b.binary(BinOp::Add, lhs, rhs);
    let body = b.block(Vec::new(), Some(sum));
    let ret = b.ty_builtin("i32");
    b.fn_item("add", vec![a, bp], Some(ret), body)
}

// ── Blocks ─────────────────────────────────────────────────────────────

/// `fn main() -> bool { 1 == 2 }` written as a trailing expression
/// statement rather than a tail.
#[test]
fn test_final_expression_statement_is_block_value() {
    let mut b = HirBuilder::new();
    let one = b.int(1);
    let two = b.int(2);
    let cmp = b.binary(BinOp::Eq, one, two);
    let stmt = b.expr_stmt(cmp);
    let body = b.block(vec![stmt], None);
    let ret = b.ty_builtin("bool");
    let main = b.fn_item("main", Vec::new(), Some(ret), body);
    let block = body_id(&main);

    let (mut result, sink) = check(b, vec![main]);
    assert!(sink.errors.is_empty(), "{:?}", sink.errors);
    assert!(result.is_lowerable());
    assert_eq!(result.type_of(block), Some(Ty::bool()));
}

/// `fn main() { 1; }`
#[test]
fn test_semicolon_statements_make_unit_block() {
    let mut b = HirBuilder::new();
    let one = b.int(1);
    let one_id = one.id;
    let stmt = b.semi_stmt(one);
    let stmt_id = stmt.id;
    let body = b.block(vec![stmt], None);
    let main = b.fn_item("main", Vec::new(), None, body);
    let block = body_id(&main);

    let (mut result, sink) = check(b, vec![main]);
    assert!(sink.errors.is_empty(), "{:?}", sink.errors);
    assert_eq!(result.type_of(block), Some(Ty::Unit));
    assert_eq!(result.type_of(stmt_id), Some(Ty::Unit));
    assert_eq!(result.type_of(one_id), Some(Ty::i32()));
}

/// `fn main() { true  let y = false; }`. Reported, but checking goes on.
#[test]
fn test_non_unit_statement_is_soft() {
    let mut b = HirBuilder::new();
    let yes = b.bool_lit(true);
    let s1 = b.expr_stmt(yes);
    let no = b.bool_lit(false);
    let (y, s2) = b.let_stmt("y", None, Some(no));
    let body = b.block(vec![s1, s2], None);
    let main = b.fn_item("main", Vec::new(), None, body);

    let (mut result, sink) = check(b, vec![main]);
    assert_eq!(result.outcome, Outcome::Rejected { pass: Pass::Bodies });
    assert_eq!(sink.errors.len(), 1);
    assert_eq!(sink.errors[0].to_string(), "expected `()`, found `bool`");
    assert_eq!(result.type_of(y), Some(Ty::bool()));
}

// ── Pass gating ────────────────────────────────────────────────────────

#[test]
fn test_signature_errors_skip_bodies() {
    let mut b = HirBuilder::new();
    let bad = b.ty_unresolved("Nope");
    let x = b.param("x", bad);
    let f_body = b.block(Vec::new(), None);
    let f = b.fn_item("f", vec![x], None, f_body);
    let one = b.int(1);
    let (z, stmt) = b.let_stmt("z", None, Some(one));
    let body = b.block(vec![stmt], None);
    let main = b.fn_item("main", Vec::new(), None, body);

    let (mut result, sink) = check(b, vec![f, main]);
    assert_eq!(
        result.outcome,
        Outcome::Rejected {
            pass: Pass::Signatures
        }
    );
    assert_eq!(sink.errors.len(), 1);
    assert_eq!(sink.errors[0].to_string(), "failed to resolve `Nope`");
    assert_eq!(result.type_of(z), None);
}

/// `fn main() { let x; let y; let z = 1; }`. The first ambiguity stops
/// the pass, so `z` is never defaulted.
#[test]
fn test_unconstrained_local_is_ambiguous() {
    let mut b = HirBuilder::new();
    let (x, s1) = b.let_stmt("x", None, None);
    let (_, s2) = b.let_stmt("y", None, None);
    let one = b.int(1);
    let (z, s3) = b.let_stmt("z", None, Some(one));
    let body = b.block(vec![s1, s2, s3], None);
    let main = b.fn_item("main", Vec::new(), None, body);

    let (mut result, sink) = check(b, vec![main]);
    assert_eq!(result.outcome, Outcome::Rejected { pass: Pass::Fallback });
    assert!(sink.saw_fatal());
    assert_eq!(sink.errors.len(), 1);
    assert_eq!(result.type_of(z).unwrap().to_string(), "{integer}");
    match &sink.errors[0] {
        TypeError::AmbiguousType { id, .. } => assert_eq!(*id, x),
        other => panic!("expected AmbiguousType, got {:?}", other),
    }
}

#[test]
fn test_missing_builtin_is_internal_error() {
    let mut b = HirBuilder::new();
    let yes = b.bool_lit(true);
    let (_, stmt) = b.let_stmt("b", None, Some(yes));
    let body = b.block(vec![stmt], None);
    let main = b.fn_item("main", Vec::new(), None, body);

    let mut krate = Crate { items: vec![main] };
    let mut mappings = b.into_mappings();
    let mut sink = Diagnostics::new();
    let result = oxide_typeck::check_with(
        TypeContext::without_builtins(),
        &mut krate,
        &mut mappings,
        &mut sink,
    );
    assert_eq!(
        result.err(),
        Some(InternalError::MissingBuiltin("bool".to_string()))
    );
    assert!(sink.errors.is_empty());
}

// ── Literal defaulting ─────────────────────────────────────────────────

/// `fn main() { let x = 1; }`, one pass at a time.
#[test]
fn test_integer_literal_defaults_after_bodies() {
    let mut b = HirBuilder::new();
    let one = b.int(1);
    let (x, stmt) = b.let_stmt("x", None, Some(one));
    let body = b.block(vec![stmt], None);
    let main = b.fn_item("main", Vec::new(), None, body);

    let mut krate = Crate { items: vec![main] };
    let mut mappings = b.into_mappings();
    let mut sink = Diagnostics::new();
    let mut checker = TypeChecker::new(&mut mappings, &mut sink);

    checker.collect_signatures(&krate).unwrap();
    checker.check_bodies(&mut krate).unwrap();
    let before = checker.context_mut().lookup(x).unwrap();
    assert_eq!(before.to_string(), "{integer}");

    checker.resolve_fallbacks().unwrap();
    assert_eq!(checker.context_mut().lookup(x), Some(Ty::i32()));
    let table = checker.context_mut().entries();

    // Idempotent: a second run neither changes nor reports anything.
    checker.resolve_fallbacks().unwrap();
    assert_eq!(checker.context_mut().entries(), table);
    assert!(!checker.errors_seen());
}

/// `fn main() { let x = 1.5; let y: f64 = 2.0; }`
#[test]
fn test_float_literals() {
    let mut b = HirBuilder::new();
    let a = b.float(1.5);
    let (x, s1) = b.let_stmt("x", None, Some(a));
    let f64_ty = b.ty_builtin("f64");
    let c = b.float(2.0);
    let c_id = c.id;
    let (_, s2) = b.let_stmt("y", Some(f64_ty), Some(c));
    let body = b.block(vec![s1, s2], None);
    let main = b.fn_item("main", Vec::new(), None, body);

    let (mut result, sink) = check(b, vec![main]);
    assert!(sink.errors.is_empty(), "{:?}", sink.errors);
    assert_eq!(result.type_of(x), Some(Ty::f32()));
    assert_eq!(result.type_of(c_id), Some(Ty::f64()));
}

// ── Calls ──────────────────────────────────────────────────────────────

/// `fn main() -> i32 { add(1, 2) }`
#[test]
fn test_call_result_type() {
    let mut b = HirBuilder::new();
    let add = declare_add(&mut b);
    let callee = b.path("add", Some(add.id));
    let one = b.int(1);
    let two = b.int(2);
    let call = b.call(callee, vec![one, two]);
    let call_id = call.id;
    let body = b.block(Vec::new(), Some(call));
    let ret = b.ty_builtin("i32");
    let main = b.fn_item("main", Vec::new(), Some(ret), body);
    let add_id = add.id;

    let (mut result, sink) = check(b, vec![add, main]);
    assert!(sink.errors.is_empty(), "{:?}", sink.errors);
    assert_eq!(result.type_of(call_id), Some(Ty::i32()));
    assert_eq!(
        result.type_of(add_id).unwrap().to_string(),
        "fn(i32, i32) -> i32"
    );
}

/// `fn main() -> i32 { add(1) }`
#[test]
fn test_call_arity_mismatch() {
    let mut b = HirBuilder::new();
    let add = declare_add(&mut b);
    let callee = b.path("add", Some(add.id));
    let one = b.int(1);
    let call = b.call(callee, vec![one]);
    let body = b.block(Vec::new(), Some(call));
    let ret = b.ty_builtin("i32");
    let main = b.fn_item("main", Vec::new(), Some(ret), body);

    let (result, sink) = check(b, vec![add, main]);
    assert_eq!(result.outcome, Outcome::Rejected { pass: Pass::Bodies });
    assert_eq!(sink.errors.len(), 1);
    assert_eq!(
        sink.errors[0].to_string(),
        "arity mismatch: expected 2 arguments, found 1"
    );
}

// ── Type table ─────────────────────────────────────────────────────────

/// `const C: u8 = 1;`
#[test]
fn test_type_table_json() {
    let mut b = HirBuilder::new();
    let ty = b.ty_builtin("u8");
    let one = b.int(1);
    let c = b.const_item("C", ty, one);

    let (mut result, sink) = check(b, vec![c]);
    assert!(sink.errors.is_empty(), "{:?}", sink.errors);
    insta::assert_snapshot!(result.to_json().unwrap(), @r###"
    [
      {
        "id": 0,
        "ty": "u8"
      },
      {
        "id": 1,
        "ty": "u8"
      },
      {
        "id": 2,
        "ty": "u8"
      }
    ]
    "###);
}
