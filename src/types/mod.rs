//! Static types of Go declarations and their canonical string form.
//!
//! The `Display` implementation of [`Type`] is the canonical form used in
//! reports: named types are qualified by their full import path, aliases are
//! already resolved to their targets, and surface details such as parameter
//! names or parentheses never appear.

pub mod check;
pub mod info;

pub use check::Checker;
pub use info::{ErrorContract, MethodDecl, NamedInfo, TypeInfo};

use std::fmt;

pub use crate::syntax::ast::ChanDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Basic {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    Byte,
    Rune,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl Basic {
    pub fn name(&self) -> &'static str {
        match self {
            Basic::Bool => "bool",
            Basic::String => "string",
            Basic::Int => "int",
            Basic::Int8 => "int8",
            Basic::Int16 => "int16",
            Basic::Int32 => "int32",
            Basic::Int64 => "int64",
            Basic::Uint => "uint",
            Basic::Uint8 => "uint8",
            Basic::Uint16 => "uint16",
            Basic::Uint32 => "uint32",
            Basic::Uint64 => "uint64",
            Basic::Uintptr => "uintptr",
            Basic::Float32 => "float32",
            Basic::Float64 => "float64",
            Basic::Complex64 => "complex64",
            Basic::Complex128 => "complex128",
            Basic::Byte => "byte",
            Basic::Rune => "rune",
            Basic::UntypedBool => "untyped bool",
            Basic::UntypedInt => "untyped int",
            Basic::UntypedRune => "untyped rune",
            Basic::UntypedFloat => "untyped float",
            Basic::UntypedComplex => "untyped complex",
            Basic::UntypedString => "untyped string",
            Basic::UntypedNil => "untyped nil",
        }
    }

    /// Predeclared basic type with the given name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(Basic::Bool),
            "string" => Some(Basic::String),
            "int" => Some(Basic::Int),
            "int8" => Some(Basic::Int8),
            "int16" => Some(Basic::Int16),
            "int32" => Some(Basic::Int32),
            "int64" => Some(Basic::Int64),
            "uint" => Some(Basic::Uint),
            "uint8" => Some(Basic::Uint8),
            "uint16" => Some(Basic::Uint16),
            "uint32" => Some(Basic::Uint32),
            "uint64" => Some(Basic::Uint64),
            "uintptr" => Some(Basic::Uintptr),
            "float32" => Some(Basic::Float32),
            "float64" => Some(Basic::Float64),
            "complex64" => Some(Basic::Complex64),
            "complex128" => Some(Basic::Complex128),
            "byte" => Some(Basic::Byte),
            "rune" => Some(Basic::Rune),
            _ => None,
        }
    }

    pub fn is_untyped(&self) -> bool {
        matches!(
            self,
            Basic::UntypedBool
                | Basic::UntypedInt
                | Basic::UntypedRune
                | Basic::UntypedFloat
                | Basic::UntypedComplex
                | Basic::UntypedString
                | Basic::UntypedNil
        )
    }

    /// Type a `var` takes when initialized from an untyped constant.
    pub fn default_type(&self) -> Basic {
        match self {
            Basic::UntypedBool => Basic::Bool,
            Basic::UntypedInt => Basic::Int,
            Basic::UntypedRune => Basic::Rune,
            Basic::UntypedFloat => Basic::Float64,
            Basic::UntypedComplex => Basic::Complex128,
            Basic::UntypedString => Basic::String,
            other => *other,
        }
    }
}

/// Predeclared named types that are not basic types.
pub const UNIVERSE_TYPES: &[&str] = &["error", "any", "comparable"];

/// Reference to a named type. An empty `path` denotes the universe scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedRef {
    pub path: String,
    pub name: String,
    pub args: Vec<Type>,
}

impl NamedRef {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn universe(name: impl Into<String>) -> Self {
        Self::new("", name)
    }

    pub fn is_universe(&self) -> bool {
        self.path.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method {
    pub name: String,
    pub sig: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    /// `None` for an embedded field.
    pub name: Option<String>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Invalid,
    Basic(Basic),
    Named(NamedRef),
    TypeParam {
        name: String,
        /// Present only where the parameter is declared.
        constraint: Option<Box<Type>>,
    },
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array(String, Box<Type>),
    Map(Box<Type>, Box<Type>),
    Chan(ChanDir, Box<Type>),
    Func(Signature),
    Struct(Vec<StructField>),
    Interface {
        methods: Vec<Method>,
        embeds: Vec<Type>,
    },
    Tuple(Vec<Type>),
    Opaque(String),
}

impl Type {
    pub fn universe(name: &str) -> Self {
        Type::Named(NamedRef::universe(name))
    }

    pub fn pointer_to(elem: Type) -> Self {
        Type::Pointer(Box::new(elem))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Invalid)
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, Type::Basic(basic) if basic.is_untyped())
    }

    pub fn default_type(self) -> Type {
        match self {
            Type::Basic(basic) => Type::Basic(basic.default_type()),
            other => other,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Invalid => write!(f, "invalid type"),
            Type::Basic(basic) => write!(f, "{}", basic.name()),
            Type::Named(named) => write!(f, "{}", named),
            Type::TypeParam { name, constraint } => match constraint {
                Some(constraint) => write!(f, "{} {}", name, constraint),
                None => write!(f, "{}", name),
            },
            Type::Pointer(elem) => write!(f, "*{}", elem),
            Type::Slice(elem) => write!(f, "[]{}", elem),
            Type::Array(len, elem) => write!(f, "[{}]{}", len, elem),
            Type::Map(key, value) => write!(f, "map[{}]{}", key, value),
            Type::Chan(ChanDir::Both, elem) => write!(f, "chan {}", elem),
            Type::Chan(ChanDir::Send, elem) => write!(f, "chan<- {}", elem),
            Type::Chan(ChanDir::Recv, elem) => write!(f, "<-chan {}", elem),
            Type::Func(sig) => write!(f, "func{}", sig),
            Type::Struct(fields) => {
                write!(f, "struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    match &field.name {
                        Some(name) => write!(f, "{} {}", name, field.ty)?,
                        None => write!(f, "{}", field.ty)?,
                    }
                }
                write!(f, "}}")
            }
            Type::Interface { methods, embeds } => {
                write!(f, "interface{{")?;
                let mut first = true;
                for method in methods {
                    if !first {
                        write!(f, "; ")?;
                    }
                    first = false;
                    write!(f, "{}{}", method.name, method.sig)?;
                }
                for embed in embeds {
                    if !first {
                        write!(f, "; ")?;
                    }
                    first = false;
                    write!(f, "{}", embed)?;
                }
                write!(f, "}}")
            }
            Type::Tuple(types) => {
                write!(f, "(")?;
                write_list(f, types)?;
                write!(f, ")")
            }
            Type::Opaque(text) => write!(f, "{}", text),
        }
    }
}

impl fmt::Display for NamedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_universe() {
            write!(f, "{}.", self.path)?;
        }
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "[")?;
            write_list(f, &self.args)?;
            write!(f, "]")?;
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if self.variadic && i + 1 == self.params.len() {
                write!(f, "...")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " {}", single),
            results => {
                write!(f, " (")?;
                write_list(f, results)?;
                write!(f, ")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}
