//! Package-level type resolution.
//!
//! The checker resolves the static type of every top-level declaration in a
//! package: type definitions and aliases, function signatures, and the
//! inferred type of `var`/`const` initializers. Function bodies are never
//! looked at. Dependencies must already be checked and are consulted through
//! their [`TypeInfo`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::info::{MethodDecl, NamedInfo, TypeInfo};
use super::{Basic, Method, NamedRef, Signature, StructField, Type, UNIVERSE_TYPES};
use crate::syntax::ast::{
    Decl, DeclToken, Expr, Field, File, FuncDecl, FuncType, GenDecl, Ident, InterfaceElem,
    LitKind, Pos, Spec, TypeExpr, TypeParam, TypeSpec, ValueSpec,
};

const MAX_CHAIN: usize = 16;

/// One name declared by a `var` or `const` spec.
#[derive(Clone, Copy)]
struct ValueSite<'a> {
    /// Spec supplying the type and initializers. For a constant that repeats
    /// the previous spec implicitly this is the earlier spec.
    source: &'a ValueSpec,
    arity: usize,
    index: usize,
    constant: bool,
    file: usize,
}

#[derive(Clone, Copy)]
enum Entity<'a> {
    Type { spec: &'a TypeSpec, file: usize },
    Value(ValueSite<'a>),
    Func { decl: &'a FuncDecl, file: usize },
}

pub struct Checker<'a> {
    path: &'a str,
    files: &'a [File],
    imports: &'a HashMap<String, Arc<TypeInfo>>,
    scope: HashMap<&'a str, Entity<'a>>,
    /// Local import name to import path, per file.
    file_imports: Vec<HashMap<String, String>>,
    sites: Vec<(&'a Ident, ValueSite<'a>)>,
    type_specs: Vec<(&'a TypeSpec, usize)>,
    funcs: Vec<(&'a FuncDecl, usize)>,
    values: HashMap<String, Type>,
    types: HashMap<String, Type>,
    named: HashMap<String, NamedInfo>,
    resolving_values: HashSet<String>,
    resolving_types: HashSet<String>,
}

impl<'a> Checker<'a> {
    pub fn new(
        path: &'a str,
        files: &'a [File],
        imports: &'a HashMap<String, Arc<TypeInfo>>,
    ) -> Self {
        let file_imports = files
            .iter()
            .map(|file| local_imports(file, imports))
            .collect();

        Self {
            path,
            files,
            imports,
            scope: HashMap::new(),
            file_imports,
            sites: Vec::new(),
            type_specs: Vec::new(),
            funcs: Vec::new(),
            values: HashMap::new(),
            types: HashMap::new(),
            named: HashMap::new(),
            resolving_values: HashSet::new(),
            resolving_types: HashSet::new(),
        }
    }

    pub fn check(mut self) -> TypeInfo {
        self.declare();
        self.define_types();
        self.attach_methods();
        let defs = self.record_defs();
        self.export();

        tracing::debug!(
            "Checked {}: {} types, {} values",
            self.path,
            self.types.len(),
            self.values.len()
        );

        TypeInfo {
            path: self.path.to_string(),
            name: self
                .files
                .first()
                .map(|file| file.package.name.clone())
                .unwrap_or_default(),
            defs,
            values: self.values,
            types: self.types,
            named: self.named,
            imports: self.imports.clone(),
        }
    }

    fn declare(&mut self) {
        let files: &'a [File] = self.files;
        for (file_index, file) in files.iter().enumerate() {
            for decl in &file.decls {
                match decl {
                    Decl::Func(func) => {
                        self.funcs.push((func, file_index));
                        let name = func.name.name.as_str();
                        if func.recv.is_none() && name != "_" && name != "init" {
                            self.scope.entry(name).or_insert(Entity::Func {
                                decl: func,
                                file: file_index,
                            });
                        }
                    }
                    Decl::Gen(gen) => match gen.tok {
                        DeclToken::Type => {
                            for spec in &gen.specs {
                                if let Spec::Type(spec) = spec {
                                    self.type_specs.push((spec, file_index));
                                    if spec.name.name != "_" {
                                        self.scope.entry(spec.name.name.as_str()).or_insert(
                                            Entity::Type {
                                                spec,
                                                file: file_index,
                                            },
                                        );
                                    }
                                }
                            }
                        }
                        DeclToken::Var | DeclToken::Const => {
                            for (ident, site) in value_sites(gen, file_index) {
                                if ident.name != "_" {
                                    self.scope
                                        .entry(ident.name.as_str())
                                        .or_insert(Entity::Value(site));
                                }
                                self.sites.push((ident, site));
                            }
                        }
                        DeclToken::Import => {}
                    },
                }
            }
        }
    }

    fn define_types(&mut self) {
        for (spec, file) in self.type_specs.clone() {
            if spec.alias || spec.name.name == "_" {
                continue;
            }
            let params = param_names(&spec.type_params);
            let underlying = self.resolve(&spec.ty, file, &params);
            self.named.entry(spec.name.name.clone()).or_insert(NamedInfo {
                underlying,
                methods: Vec::new(),
            });
        }
    }

    fn attach_methods(&mut self) {
        for (func, file) in self.funcs.clone() {
            let Some(recv) = &func.recv else {
                continue;
            };
            let mut params = recv.type_params.clone();
            params.extend(param_names(&func.type_params));
            let sig = self.signature(&func.sig, file, &params);

            let target = if self.named.contains_key(&recv.base) {
                Some(recv.base.clone())
            } else {
                match self.type_entity(&recv.base) {
                    Some(Type::Named(named)) if named.path == self.path => Some(named.name),
                    _ => None,
                }
            };

            match target.and_then(|name| self.named.get_mut(&name)) {
                Some(info) => info.methods.push(MethodDecl {
                    method: Method {
                        name: func.name.name.clone(),
                        sig,
                    },
                    pointer_receiver: recv.pointer,
                }),
                None => tracing::trace!(
                    "Method {} has no local receiver type {}",
                    func.name.name,
                    recv.base
                ),
            }
        }
    }

    fn record_defs(&mut self) -> HashMap<Pos, Type> {
        let mut defs = HashMap::new();

        for (ident, site) in self.sites.clone() {
            let ty = if ident.name == "_" {
                self.site_type(site)
            } else {
                self.value_type(&ident.name)
            };
            defs.insert(ident.pos, ty);
        }

        for (spec, file) in self.type_specs.clone() {
            let ty = if spec.alias {
                match self.type_entity(&spec.name.name) {
                    Some(ty) if spec.name.name != "_" => ty,
                    _ => {
                        let params = param_names(&spec.type_params);
                        self.resolve(&spec.ty, file, &params)
                    }
                }
            } else {
                let mut named = NamedRef::new(self.path, spec.name.name.clone());
                named.args = self.type_params(&spec.type_params, file);
                Type::Named(named)
            };
            defs.insert(spec.name.pos, ty);
        }

        for (func, file) in self.funcs.clone() {
            let mut params: Vec<String> = func
                .recv
                .as_ref()
                .map(|recv| recv.type_params.clone())
                .unwrap_or_default();
            params.extend(param_names(&func.type_params));
            let sig = self.signature(&func.sig, file, &params);
            defs.insert(func.name.pos, Type::Func(sig));
        }

        defs
    }

    fn export(&mut self) {
        let names: Vec<(&'a str, Entity<'a>)> =
            self.scope.iter().map(|(name, entity)| (*name, *entity)).collect();
        for (name, entity) in names {
            match entity {
                Entity::Type { .. } => {
                    if let Some(ty) = self.type_entity(name) {
                        self.types.insert(name.to_string(), ty);
                    }
                }
                Entity::Value(_) | Entity::Func { .. } => {
                    self.value_type(name);
                }
            }
        }
    }

    fn dep(&self, path: &str) -> Option<&'a TypeInfo> {
        let imports: &'a HashMap<String, Arc<TypeInfo>> = self.imports;
        imports.get(path).map(Arc::as_ref)
    }

    fn import_path(&self, file: usize, local: &str) -> Option<String> {
        self.file_imports.get(file)?.get(local).cloned()
    }

    fn named_info(&self, named: &NamedRef) -> Option<&NamedInfo> {
        if named.path == self.path {
            return self.named.get(&named.name);
        }
        self.imports.values().find_map(|dep| dep.named_info(named))
    }

    fn underlying(&self, ty: &Type) -> Type {
        let mut current = ty.clone();
        for _ in 0..MAX_CHAIN {
            let next = match &current {
                Type::Named(named) if !named.is_universe() => match self.named_info(named) {
                    Some(info) => info.underlying.clone(),
                    None => return current,
                },
                _ => return current,
            };
            current = next;
        }
        current
    }

    /// Type denoted by a package-level type name: the named type itself, or
    /// the target of an alias.
    fn type_entity(&mut self, name: &str) -> Option<Type> {
        let Some(Entity::Type { spec, file }) = self.scope.get(name).copied() else {
            return None;
        };
        if !spec.alias {
            return Some(Type::Named(NamedRef::new(self.path, name)));
        }
        if let Some(ty) = self.types.get(name) {
            return Some(ty.clone());
        }
        if !self.resolving_types.insert(name.to_string()) {
            tracing::debug!("Alias cycle through {}.{}", self.path, name);
            return Some(Type::Invalid);
        }
        let params = param_names(&spec.type_params);
        let target = self.resolve(&spec.ty, file, &params);
        self.resolving_types.remove(name);
        self.types.insert(name.to_string(), target.clone());
        Some(target)
    }

    fn resolve(&mut self, expr: &TypeExpr, file: usize, params: &[String]) -> Type {
        match expr {
            TypeExpr::Name(name) => self.resolve_name(name, params),
            TypeExpr::Qualified { package, name } => self.resolve_qualified(package, name, file),
            TypeExpr::Generic { base, args } => {
                let args: Vec<Type> = args
                    .iter()
                    .map(|arg| self.resolve(arg, file, params))
                    .collect();
                match self.resolve(base, file, params) {
                    Type::Named(mut named) => {
                        named.args = args;
                        Type::Named(named)
                    }
                    other => other,
                }
            }
            TypeExpr::Pointer(elem) => Type::pointer_to(self.resolve(elem, file, params)),
            TypeExpr::Slice(elem) => Type::Slice(Box::new(self.resolve(elem, file, params))),
            TypeExpr::Array { len, elem } => {
                Type::Array(len.clone(), Box::new(self.resolve(elem, file, params)))
            }
            TypeExpr::Map { key, value } => Type::Map(
                Box::new(self.resolve(key, file, params)),
                Box::new(self.resolve(value, file, params)),
            ),
            TypeExpr::Chan { dir, elem } => {
                Type::Chan(*dir, Box::new(self.resolve(elem, file, params)))
            }
            TypeExpr::Func(func) => Type::Func(self.signature(func, file, params)),
            TypeExpr::Struct(fields) => Type::Struct(self.struct_fields(fields, file, params)),
            TypeExpr::Interface(elems) => self.interface(elems, file, params),
            TypeExpr::Other(text) => Type::Opaque(text.clone()),
        }
    }

    fn resolve_name(&mut self, name: &str, params: &[String]) -> Type {
        if params.iter().any(|param| param == name) {
            return Type::TypeParam {
                name: name.to_string(),
                constraint: None,
            };
        }
        if let Some(ty) = self.type_entity(name) {
            return ty;
        }
        if let Some(basic) = Basic::from_name(name) {
            return Type::Basic(basic);
        }
        if UNIVERSE_TYPES.contains(&name) {
            return Type::universe(name);
        }
        tracing::trace!("Unresolved type name {} in {}", name, self.path);
        Type::Opaque(name.to_string())
    }

    fn resolve_qualified(&mut self, package: &str, name: &str, file: usize) -> Type {
        let Some(path) = self.import_path(file, package) else {
            return Type::Opaque(format!("{}.{}", package, name));
        };
        match self.dep(&path).and_then(|dep| dep.lookup_type(name)) {
            Some(ty) => ty.clone(),
            None => Type::Named(NamedRef::new(path, name)),
        }
    }

    fn signature(&mut self, func: &FuncType, file: usize, params: &[String]) -> Signature {
        Signature {
            params: func
                .params
                .iter()
                .map(|param| self.resolve(param, file, params))
                .collect(),
            results: func
                .results
                .iter()
                .map(|result| self.resolve(result, file, params))
                .collect(),
            variadic: func.variadic,
        }
    }

    fn struct_fields(&mut self, fields: &[Field], file: usize, params: &[String]) -> Vec<StructField> {
        let mut out = Vec::new();
        for field in fields {
            let ty = self.resolve(&field.ty, file, params);
            if field.names.is_empty() {
                let ty = match ty {
                    Type::Pointer(_) => ty,
                    ty if field.embedded_pointer => Type::pointer_to(ty),
                    ty => ty,
                };
                out.push(StructField { name: None, ty });
            } else {
                for name in &field.names {
                    out.push(StructField {
                        name: Some(name.clone()),
                        ty: ty.clone(),
                    });
                }
            }
        }
        out
    }

    fn interface(&mut self, elems: &[InterfaceElem], file: usize, params: &[String]) -> Type {
        let mut methods = Vec::new();
        let mut embeds = Vec::new();
        for elem in elems {
            match elem {
                InterfaceElem::Method { name, sig } => methods.push(Method {
                    name: name.clone(),
                    sig: self.signature(sig, file, params),
                }),
                InterfaceElem::Embed(ty) => embeds.push(self.resolve(ty, file, params)),
            }
        }
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        Type::Interface { methods, embeds }
    }

    fn type_params(&mut self, params: &[TypeParam], file: usize) -> Vec<Type> {
        let names = param_names(params);
        let mut out = Vec::new();
        for param in params {
            let constraint = self.resolve(&param.constraint, file, &names);
            for name in &param.names {
                out.push(Type::TypeParam {
                    name: name.clone(),
                    constraint: Some(Box::new(constraint.clone())),
                });
            }
        }
        out
    }

    /// Memoized type of a package-level value or function name.
    fn value_type(&mut self, name: &str) -> Type {
        if let Some(ty) = self.values.get(name) {
            return ty.clone();
        }
        let ty = match self.scope.get(name).copied() {
            Some(Entity::Value(site)) => {
                if !self.resolving_values.insert(name.to_string()) {
                    tracing::debug!("Initialization cycle through {}.{}", self.path, name);
                    return Type::Invalid;
                }
                let ty = self.site_type(site);
                self.resolving_values.remove(name);
                ty
            }
            Some(Entity::Func { decl, file }) => {
                let params = param_names(&decl.type_params);
                Type::Func(self.signature(&decl.sig, file, &params))
            }
            _ => return Type::Invalid,
        };
        self.values.insert(name.to_string(), ty.clone());
        ty
    }

    fn site_type(&mut self, site: ValueSite<'a>) -> Type {
        if let Some(ty) = &site.source.ty {
            return self.resolve(ty, site.file, &[]);
        }
        let values = &site.source.values;
        let ty = if values.len() == site.arity {
            self.infer(&values[site.index], site.file)
        } else if let [single] = values.as_slice() {
            match self.infer(single, site.file) {
                Type::Tuple(mut types) if site.index < types.len() => types.swap_remove(site.index),
                Type::Tuple(_) => Type::Invalid,
                // comma-ok forms: type assertion, map index, receive
                ty if site.arity == 2 && site.index == 0 => ty,
                _ if site.arity == 2 => Type::Basic(Basic::UntypedBool),
                _ => Type::Invalid,
            }
        } else {
            Type::Invalid
        };
        if site.constant {
            ty
        } else {
            ty.default_type()
        }
    }

    fn infer(&mut self, expr: &Expr, file: usize) -> Type {
        match expr {
            Expr::Ident(name) => self.infer_ident(name),
            Expr::Lit(kind) => Type::Basic(match kind {
                LitKind::Int => Basic::UntypedInt,
                LitKind::Float => Basic::UntypedFloat,
                LitKind::Imaginary => Basic::UntypedComplex,
                LitKind::Rune => Basic::UntypedRune,
                LitKind::String => Basic::UntypedString,
            }),
            Expr::Selector { operand, field } => self.infer_selector(operand, field, file),
            Expr::Call { func, args } => self.infer_call(func, args, file),
            Expr::Composite(ty) | Expr::TypeAssert(ty) | Expr::Conversion(ty) => {
                self.resolve(ty, file, &[])
            }
            Expr::Unary { op, operand } => {
                let inner = self.infer(operand, file);
                match op.as_str() {
                    "&" => Type::pointer_to(inner),
                    "*" => match inner {
                        Type::Pointer(elem) => *elem,
                        _ => Type::Invalid,
                    },
                    "<-" => match self.underlying(&inner) {
                        Type::Chan(_, elem) => *elem,
                        _ => Type::Invalid,
                    },
                    _ => inner,
                }
            }
            Expr::Binary { op, left, right } => self.infer_binary(op, left, right, file),
            Expr::Paren(inner) => self.infer(inner, file),
            Expr::FuncLit(func) => Type::Func(self.signature(func, file, &[])),
            Expr::Type(_) | Expr::Other => Type::Invalid,
        }
    }

    fn infer_ident(&mut self, name: &str) -> Type {
        match self.scope.get(name).copied() {
            Some(Entity::Type { .. }) => Type::Invalid,
            Some(_) => self.value_type(name),
            None => match name {
                "nil" => Type::Basic(Basic::UntypedNil),
                "true" | "false" => Type::Basic(Basic::UntypedBool),
                "iota" => Type::Basic(Basic::UntypedInt),
                _ => Type::Invalid,
            },
        }
    }

    fn infer_selector(&mut self, operand: &Expr, field: &str, file: usize) -> Type {
        if let Expr::Ident(local) = operand {
            if !self.scope.contains_key(local.as_str()) {
                if let Some(path) = self.import_path(file, local) {
                    return match self.dep(&path) {
                        Some(dep) => dep.lookup_value(field).cloned().unwrap_or(Type::Invalid),
                        None => {
                            tracing::trace!("{}.{} comes from an unloaded package", path, field);
                            Type::Invalid
                        }
                    };
                }
            }
        }
        let base = self.infer(operand, file);
        self.select(&base, field)
    }

    /// Field or method selected from a value of type `ty`.
    fn select(&self, ty: &Type, field: &str) -> Type {
        let base = match ty {
            Type::Pointer(elem) => elem.as_ref(),
            other => other,
        };
        if let Type::Named(named) = base {
            let method = self
                .named_info(named)
                .and_then(|info| info.methods.iter().find(|decl| decl.method.name == field));
            if let Some(decl) = method {
                return Type::Func(decl.method.sig.clone());
            }
        }
        match self.underlying(base) {
            Type::Struct(fields) => fields
                .into_iter()
                .find(|f| f.name.as_deref() == Some(field))
                .map(|f| f.ty)
                .unwrap_or(Type::Invalid),
            Type::Interface { methods, .. } => methods
                .into_iter()
                .find(|m| m.name == field)
                .map(|m| Type::Func(m.sig))
                .unwrap_or(Type::Invalid),
            _ => Type::Invalid,
        }
    }

    fn infer_call(&mut self, func: &Expr, args: &[Expr], file: usize) -> Type {
        if let Some(target) = self.expr_as_type(func, file) {
            return target;
        }
        if let Expr::Ident(name) = func {
            if !self.scope.contains_key(name.as_str()) {
                if let Some(ty) = self.builtin_call(name, args, file) {
                    return ty;
                }
            }
        }
        let callee = self.infer(func, file);
        match self.underlying(&callee) {
            Type::Func(mut sig) => match sig.results.len() {
                0 => Type::Invalid,
                1 => sig.results.remove(0),
                _ => Type::Tuple(sig.results),
            },
            _ => Type::Invalid,
        }
    }

    fn builtin_call(&mut self, name: &str, args: &[Expr], file: usize) -> Option<Type> {
        let first = args.first();
        Some(match name {
            "new" => Type::pointer_to(
                first
                    .and_then(|arg| self.expr_as_type(arg, file))
                    .unwrap_or(Type::Invalid),
            ),
            "make" => first
                .and_then(|arg| self.expr_as_type(arg, file))
                .unwrap_or(Type::Invalid),
            "len" | "cap" | "copy" => Type::Basic(Basic::Int),
            "append" | "min" | "max" => first
                .map(|arg| self.infer(arg, file))
                .unwrap_or(Type::Invalid),
            "complex" => Type::Basic(Basic::Complex128),
            "real" | "imag" => Type::Basic(Basic::Float64),
            "recover" => Type::universe("any"),
            _ => return None,
        })
    }

    /// The type an expression denotes when it is used as a type, e.g. the
    /// callee of a conversion.
    fn expr_as_type(&mut self, expr: &Expr, file: usize) -> Option<Type> {
        match expr {
            Expr::Type(ty) => Some(self.resolve(ty, file, &[])),
            Expr::Paren(inner) => self.expr_as_type(inner, file),
            Expr::Unary { op, operand } if op == "*" => {
                self.expr_as_type(operand, file).map(Type::pointer_to)
            }
            Expr::Ident(name) => match self.scope.get(name.as_str()).copied() {
                Some(Entity::Type { .. }) => self.type_entity(name),
                Some(_) => None,
                None => Basic::from_name(name).map(Type::Basic).or_else(|| {
                    UNIVERSE_TYPES
                        .contains(&name.as_str())
                        .then(|| Type::universe(name))
                }),
            },
            Expr::Selector { operand, field } => match operand.as_ref() {
                Expr::Ident(local) if !self.scope.contains_key(local.as_str()) => {
                    let path = self.import_path(file, local)?;
                    self.dep(&path)?.lookup_type(field).cloned()
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn infer_binary(&mut self, op: &str, left: &Expr, right: &Expr, file: usize) -> Type {
        match op {
            "==" | "!=" | "<" | "<=" | ">" | ">=" => Type::Basic(Basic::UntypedBool),
            "<<" | ">>" => self.infer(left, file),
            _ => {
                let left = self.infer(left, file);
                if !left.is_untyped() {
                    return left;
                }
                let right = self.infer(right, file);
                match (&left, &right) {
                    (Type::Basic(l), Type::Basic(r)) if r.is_untyped() => {
                        if untyped_rank(*r) > untyped_rank(*l) {
                            right
                        } else {
                            left
                        }
                    }
                    _ => right,
                }
            }
        }
    }
}

fn value_sites(gen: &GenDecl, file: usize) -> Vec<(&Ident, ValueSite<'_>)> {
    let constant = gen.tok == DeclToken::Const;
    let mut sites = Vec::new();
    let mut previous: Option<&ValueSpec> = None;
    for spec in &gen.specs {
        let Spec::Value(spec) = spec else {
            continue;
        };
        let source = match previous {
            Some(previous) if constant && spec.ty.is_none() && spec.values.is_empty() => previous,
            _ => spec,
        };
        previous = Some(source);
        for (index, name) in spec.names.iter().enumerate() {
            sites.push((
                name,
                ValueSite {
                    source,
                    arity: spec.names.len(),
                    index,
                    constant,
                    file,
                },
            ));
        }
    }
    sites
}

fn local_imports(file: &File, imports: &HashMap<String, Arc<TypeInfo>>) -> HashMap<String, String> {
    file.imports()
        .filter_map(|import| {
            let local = match import.name.as_deref() {
                Some("_") | Some(".") => return None,
                Some(name) => name.to_string(),
                None => imports
                    .get(&import.path)
                    .map(|dep| dep.name().to_string())
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| default_package_name(&import.path)),
            };
            Some((local, import.path.clone()))
        })
        .collect()
}

/// Package name assumed for an import that was not loaded: the last path
/// element, skipping a major-version suffix such as `v2`.
pub(crate) fn default_package_name(path: &str) -> String {
    path.rsplit('/')
        .find(|segment| !is_major_version(segment))
        .unwrap_or(path)
        .to_string()
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

fn param_names(params: &[TypeParam]) -> Vec<String> {
    params
        .iter()
        .flat_map(|param| param.names.iter().cloned())
        .collect()
}

fn untyped_rank(basic: Basic) -> u8 {
    match basic {
        Basic::UntypedInt => 1,
        Basic::UntypedRune => 2,
        Basic::UntypedFloat => 3,
        Basic::UntypedComplex => 4,
        _ => 0,
    }
}
