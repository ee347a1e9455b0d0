//! Type representation for the Oxide type checker.
//!
//! Defines the core `Ty` enum, the builtin primitives (`PrimTy`), inference
//! variables (`InferVar` + `InferKind`), and nominal ADT types (`AdtTy`).

use std::fmt;

use oxide_hir::{HirId, StructKind};

/// An inference variable, identified by a `u32` index into the unification
/// table owned by the `TypeContext`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InferVar(pub u32);

/// What an inference variable may legally resolve to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InferKind {
    /// Any type.
    General,
    /// An integer primitive (from an unsuffixed integer literal).
    Integral,
    /// A floating-point primitive (from an unsuffixed float literal).
    Float,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntTy {
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UintTy {
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FloatTy {
    F32,
    F64,
}

/// A builtin primitive type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimTy {
    Bool,
    Char,
    Str,
    Int(IntTy),
    Uint(UintTy),
    Float(FloatTy),
}

impl PrimTy {
    /// Every primitive, in registration order.
    pub const ALL: [PrimTy; 17] = [
        PrimTy::Bool,
        PrimTy::Char,
        PrimTy::Str,
        PrimTy::Int(IntTy::I8),
        PrimTy::Int(IntTy::I16),
        PrimTy::Int(IntTy::I32),
        PrimTy::Int(IntTy::I64),
        PrimTy::Int(IntTy::I128),
        PrimTy::Int(IntTy::Isize),
        PrimTy::Uint(UintTy::U8),
        PrimTy::Uint(UintTy::U16),
        PrimTy::Uint(UintTy::U32),
        PrimTy::Uint(UintTy::U64),
        PrimTy::Uint(UintTy::U128),
        PrimTy::Uint(UintTy::Usize),
        PrimTy::Float(FloatTy::F32),
        PrimTy::Float(FloatTy::F64),
    ];

    /// The surface name of this primitive (`i32`, `bool`, ...).
    pub fn name(self) -> &'static str {
        match self {
            PrimTy::Bool => "bool",
            PrimTy::Char => "char",
            PrimTy::Str => "str",
            PrimTy::Int(IntTy::I8) => "i8",
            PrimTy::Int(IntTy::I16) => "i16",
            PrimTy::Int(IntTy::I32) => "i32",
            PrimTy::Int(IntTy::I64) => "i64",
            PrimTy::Int(IntTy::I128) => "i128",
            PrimTy::Int(IntTy::Isize) => "isize",
            PrimTy::Uint(UintTy::U8) => "u8",
            PrimTy::Uint(UintTy::U16) => "u16",
            PrimTy::Uint(UintTy::U32) => "u32",
            PrimTy::Uint(UintTy::U64) => "u64",
            PrimTy::Uint(UintTy::U128) => "u128",
            PrimTy::Uint(UintTy::Usize) => "usize",
            PrimTy::Float(FloatTy::F32) => "f32",
            PrimTy::Float(FloatTy::F64) => "f64",
        }
    }

    pub fn is_integral(self) -> bool {
        matches!(self, PrimTy::Int(_) | PrimTy::Uint(_))
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimTy::Float(_))
    }

    pub fn is_signed(self) -> bool {
        matches!(self, PrimTy::Int(_) | PrimTy::Float(_))
    }
}

/// A declared generic parameter, referenced from field types until the
/// substitution engine replaces it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParamTy {
    /// Position in the declaring ADT's parameter list.
    pub index: usize,
    pub name: String,
}

/// One field of an ADT.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructFieldTy {
    /// Field name; positional fields are named `"0"`, `"1"`, ...
    pub name: String,
    pub ty: Ty,
    /// Position in declaration order.
    pub index: usize,
}

/// A nominal aggregate type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AdtTy {
    /// The declaring item. Two ADTs are the same type constructor iff
    /// their `def`s match.
    pub def: HirId,
    pub name: String,
    pub kind: StructKind,
    /// Fields in declaration order.
    pub fields: Vec<StructFieldTy>,
    pub params: Vec<ParamTy>,
    /// The arguments this ADT was instantiated with. `None` for the
    /// declaration itself and for non-generic ADTs.
    pub substs: Option<Vec<Ty>>,
}

impl AdtTy {
    /// Look up a field by name (or tuple index rendered as a name).
    pub fn field(&self, name: &str) -> Option<&StructFieldTy> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn is_generic(&self) -> bool {
        !self.params.is_empty()
    }
}

/// An Oxide type.
///
/// - `Error`: the type of something already reported as broken
/// - `Infer`: an inference variable (to be resolved by unification)
/// - `Unit`: `()`
/// - `Prim`: a builtin primitive
/// - `Param`: a generic parameter inside an ADT declaration
/// - `Fn`: a function type (params -> return)
/// - `Adt`: a struct, possibly instantiated
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Error,
    Infer(InferKind, InferVar),
    Unit,
    Prim(PrimTy),
    Param(ParamTy),
    Fn(Vec<Ty>, Box<Ty>),
    Adt(AdtTy),
}

impl Ty {
    pub fn prim(prim: PrimTy) -> Ty {
        Ty::Prim(prim)
    }

    pub fn bool() -> Ty {
        Ty::Prim(PrimTy::Bool)
    }

    pub fn i32() -> Ty {
        Ty::Prim(PrimTy::Int(IntTy::I32))
    }

    pub fn i64() -> Ty {
        Ty::Prim(PrimTy::Int(IntTy::I64))
    }

    pub fn u8() -> Ty {
        Ty::Prim(PrimTy::Uint(UintTy::U8))
    }

    pub fn f32() -> Ty {
        Ty::Prim(PrimTy::Float(FloatTy::F32))
    }

    pub fn f64() -> Ty {
        Ty::Prim(PrimTy::Float(FloatTy::F64))
    }

    /// Create a function type.
    pub fn fun(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Fn(params, Box::new(ret))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Ty::Error)
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Ty::Unit)
    }

    /// Whether the type is an integer primitive or an integral variable.
    pub fn is_integral(&self) -> bool {
        match self {
            Ty::Prim(p) => p.is_integral(),
            Ty::Infer(InferKind::Integral, _) => true,
            _ => false,
        }
    }

    /// Whether the type is a float primitive or a float variable.
    pub fn is_float(&self) -> bool {
        match self {
            Ty::Prim(p) => p.is_float(),
            Ty::Infer(InferKind::Float, _) => true,
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral() || self.is_float()
    }

    /// Whether `var` occurs anywhere in this type.
    pub fn mentions(&self, var: InferVar) -> bool {
        match self {
            Ty::Infer(_, v) => *v == var,
            Ty::Fn(params, ret) => params.iter().any(|p| p.mentions(var)) || ret.mentions(var),
            Ty::Adt(adt) => {
                adt.fields.iter().any(|f| f.ty.mentions(var))
                    || adt
                        .substs
                        .as_ref()
                        .is_some_and(|args| args.iter().any(|a| a.mentions(var)))
            }
            Ty::Error | Ty::Unit | Ty::Prim(_) | Ty::Param(_) => false,
        }
    }

    /// Whether any inference variable or error remains anywhere inside.
    pub fn is_fully_resolved(&self) -> bool {
        match self {
            Ty::Error | Ty::Infer(..) => false,
            Ty::Unit | Ty::Prim(_) | Ty::Param(_) => true,
            Ty::Fn(params, ret) => {
                params.iter().all(Ty::is_fully_resolved) && ret.is_fully_resolved()
            }
            Ty::Adt(adt) => {
                adt.fields.iter().all(|f| f.ty.is_fully_resolved())
                    && adt
                        .substs
                        .as_ref()
                        .map_or(true, |args| args.iter().all(Ty::is_fully_resolved))
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: impl IntoIterator<Item = impl fmt::Display>) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Error => write!(f, "<error>"),
            Ty::Infer(InferKind::General, v) => write!(f, "?{}", v.0),
            Ty::Infer(InferKind::Integral, _) => write!(f, "{{integer}}"),
            Ty::Infer(InferKind::Float, _) => write!(f, "{{float}}"),
            Ty::Unit => write!(f, "()"),
            Ty::Prim(p) => write!(f, "{}", p.name()),
            Ty::Param(p) => write!(f, "{}", p.name),
            Ty::Fn(params, ret) => {
                write!(f, "fn(")?;
                write_list(f, params)?;
                write!(f, ") -> {}", ret)
            }
            Ty::Adt(adt) => {
                write!(f, "{}", adt.name)?;
                match &adt.substs {
                    Some(args) if !args.is_empty() => {
                        write!(f, "<")?;
                        write_list(f, args)?;
                        write!(f, ">")
                    }
                    _ if adt.is_generic() => {
                        write!(f, "<")?;
                        write_list(f, adt.params.iter().map(|p| &p.name))?;
                        write!(f, ">")
                    }
                    _ => Ok(()),
                }
            }
        }
    }
}

// ── ena trait implementations ──────────────────────────────────────────

impl ena::unify::UnifyKey for InferVar {
    type Value = Option<Ty>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        InferVar(u)
    }

    fn tag() -> &'static str {
        "InferVar"
    }
}

impl ena::unify::EqUnifyValue for Ty {}
