//! Owned Go syntax tree, lowered from the tree-sitter concrete syntax tree.
//!
//! Only the shapes the type resolver needs are modeled. Function bodies are
//! dropped entirely; expressions keep enough structure to infer the static
//! type of a package-level initializer.

use std::path::PathBuf;

/// Identity of an identifier inside one package: file index plus byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub file: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub pos: Pos,
}

impl Ident {
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

/// Go's visibility rule: an identifier is exported when its first character
/// is an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[derive(Debug, Clone)]
pub struct File {
    pub path: PathBuf,
    pub package: Ident,
    pub decls: Vec<Decl>,
}

impl File {
    pub fn imports(&self) -> impl Iterator<Item = &ImportSpec> {
        self.decls
            .iter()
            .flat_map(|decl| match decl {
                Decl::Gen(gen) if gen.tok == DeclToken::Import => gen.specs.as_slice(),
                _ => &[][..],
            })
            .filter_map(|spec| match spec {
                Spec::Import(import) => Some(import),
                _ => None,
            })
    }
}

#[derive(Debug, Clone)]
pub enum Decl {
    Gen(GenDecl),
    Func(FuncDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclToken {
    Import,
    Const,
    Var,
    Type,
}

#[derive(Debug, Clone)]
pub struct GenDecl {
    pub tok: DeclToken,
    pub specs: Vec<Spec>,
}

#[derive(Debug, Clone)]
pub enum Spec {
    Import(ImportSpec),
    Value(ValueSpec),
    Type(TypeSpec),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit local name, including `_` and `.`.
    pub name: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    /// `type A = B` rather than `type A B`.
    pub alias: bool,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub names: Vec<String>,
    pub constraint: TypeExpr,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub recv: Option<Receiver>,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub sig: FuncType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    /// Name of the receiver's base type, without pointer or type arguments.
    pub base: String,
    pub pointer: bool,
    pub type_params: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FuncType {
    pub params: Vec<TypeExpr>,
    pub results: Vec<TypeExpr>,
    pub variadic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Name(String),
    Qualified { package: String, name: String },
    Generic { base: Box<TypeExpr>, args: Vec<TypeExpr> },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array { len: String, elem: Box<TypeExpr> },
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    Func(FuncType),
    Struct(Vec<Field>),
    Interface(Vec<InterfaceElem>),
    /// Constraint unions, approximation elements and anything else kept as
    /// whitespace-normalized source text.
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Empty for an embedded field.
    pub names: Vec<String>,
    pub ty: TypeExpr,
    /// `*T` embedding.
    pub embedded_pointer: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceElem {
    Method { name: String, sig: FuncType },
    Embed(TypeExpr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Imaginary,
    Rune,
    String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Identifiers, including the predeclared `nil`, `true`, `false`, `iota`.
    Ident(String),
    Lit(LitKind),
    Selector { operand: Box<Expr>, field: String },
    Call { func: Box<Expr>, args: Vec<Expr> },
    Composite(TypeExpr),
    Unary { op: String, operand: Box<Expr> },
    Binary { op: String, left: Box<Expr>, right: Box<Expr> },
    Paren(Box<Expr>),
    TypeAssert(TypeExpr),
    Conversion(TypeExpr),
    FuncLit(FuncType),
    /// A type in expression position, e.g. the argument of `new(T)`.
    Type(TypeExpr),
    Other,
}
