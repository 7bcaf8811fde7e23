use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{Basic, Method, NamedRef, Signature, Type};
use crate::syntax::ast::{Ident, Pos};

/// Bound on embedding and named-type chains followed during method-set
/// queries.
const MAX_DEPTH: usize = 16;

/// The predeclared `error` interface, reduced to its single method.
///
/// Built once per run and passed explicitly to every capability query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContract {
    method: Method,
}

impl ErrorContract {
    /// `interface { Error() string }`
    pub fn universe() -> Self {
        Self {
            method: Method {
                name: "Error".to_string(),
                sig: Signature {
                    params: Vec::new(),
                    results: vec![Type::Basic(Basic::String)],
                    variadic: false,
                },
            },
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn is_satisfied_by(&self, method: &Method) -> bool {
        *method == self.method
    }
}

impl Default for ErrorContract {
    fn default() -> Self {
        Self::universe()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub method: Method,
    pub pointer_receiver: bool,
}

#[derive(Debug, Clone)]
pub struct NamedInfo {
    pub underlying: Type,
    pub methods: Vec<MethodDecl>,
}

/// Resolved type information for one package.
#[derive(Debug, Default)]
pub struct TypeInfo {
    pub(crate) path: String,
    pub(crate) name: String,
    /// Type of every top-level identifier, keyed by its position.
    pub(crate) defs: HashMap<Pos, Type>,
    /// Package-level variables, constants and functions by name.
    pub(crate) values: HashMap<String, Type>,
    /// Package-level type names: the named type, or an alias's target.
    pub(crate) types: HashMap<String, Type>,
    pub(crate) named: HashMap<String, NamedInfo>,
    /// Checked dependencies keyed by import path.
    pub(crate) imports: HashMap<String, Arc<TypeInfo>>,
}

impl TypeInfo {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved type of a top-level identifier declared in this package.
    pub fn type_of(&self, ident: &Ident) -> Option<&Type> {
        self.defs.get(&ident.pos)
    }

    pub fn lookup_value(&self, name: &str) -> Option<&Type> {
        self.values.get(name)
    }

    pub fn lookup_type(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    pub fn import(&self, path: &str) -> Option<&Arc<TypeInfo>> {
        self.imports.get(path)
    }

    /// Declaration info for a named type from this package or any package
    /// reachable through its imports.
    pub fn named_info(&self, named: &NamedRef) -> Option<&NamedInfo> {
        self.find_named(named, 0)
    }

    fn find_named(&self, named: &NamedRef, depth: usize) -> Option<&NamedInfo> {
        if named.path == self.path {
            return self.named.get(&named.name);
        }
        if depth > MAX_DEPTH {
            return None;
        }
        if let Some(dep) = self.imports.get(&named.path) {
            return dep.named.get(&named.name);
        }
        self.imports
            .values()
            .find_map(|dep| dep.find_named(named, depth + 1))
    }

    /// Follows defined types to the type they are built from. Universe and
    /// unresolvable named types are returned unchanged.
    pub fn underlying(&self, ty: &Type) -> Type {
        let mut current = ty.clone();
        for _ in 0..MAX_DEPTH {
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

    /// Whether `ty` satisfies the error contract: its method set contains
    /// `Error() string`.
    pub fn implements(&self, ty: &Type, contract: &ErrorContract) -> bool {
        self.method_set(ty, contract)
            .iter()
            .any(|method| contract.is_satisfied_by(method))
    }

    /// Method set of `ty`, following Go's rules: value receivers for `T`,
    /// all receivers for `*T`, declared and embedded methods for
    /// interfaces, plus methods promoted through embedded struct fields.
    ///
    /// Promotion is resolved by depth: the shallowest method of a name wins,
    /// and two methods (or a method and a field) of the same name at the
    /// same depth cancel out.
    pub fn method_set(&self, ty: &Type, contract: &ErrorContract) -> Vec<Method> {
        let (root, indirect) = match ty {
            Type::Pointer(elem) if self.is_interface_type(elem) => return Vec::new(),
            Type::Pointer(elem) => (elem.as_ref(), true),
            other => (other, false),
        };
        if self.is_interface_type(root) {
            let mut methods = Vec::new();
            self.interface_methods(root, contract, 0, &mut methods);
            return methods;
        }

        let mut current = vec![Embedded {
            ty: root.clone(),
            indirect,
            multiples: false,
        }];
        let mut seen: HashSet<NamedRef> = HashSet::new();
        let mut base = Selections::default();

        for _ in 0..=MAX_DEPTH {
            if current.is_empty() {
                break;
            }
            let mut methods = Selections::default();
            let mut fields: HashSet<String> = HashSet::new();
            let mut next = Vec::new();

            for entry in &current {
                let mut ty = entry.ty.clone();
                if let Type::Named(named) = &entry.ty {
                    if named.is_universe() {
                        if named.name == "error" {
                            methods.add(contract.method(), false, entry);
                        }
                        continue;
                    }
                    if !seen.insert(unqualified(named)) {
                        continue;
                    }
                    let Some(info) = self.named_info(named) else {
                        continue;
                    };
                    for decl in &info.methods {
                        methods.add(&decl.method, decl.pointer_receiver, entry);
                    }
                    ty = self.underlying(&info.underlying);
                }

                match &ty {
                    Type::Struct(struct_fields) => {
                        for field in struct_fields {
                            let (embedded, pointer) = match &field.ty {
                                Type::Pointer(elem) => (elem.as_ref(), true),
                                other => (other, false),
                            };
                            let name = match (&field.name, embedded) {
                                (Some(name), _) => name.clone(),
                                (None, Type::Named(named)) => named.name.clone(),
                                (None, _) => continue,
                            };
                            fields.insert(name);
                            if field.name.is_none() {
                                next.push(Embedded {
                                    ty: embedded.clone(),
                                    indirect: entry.indirect || pointer,
                                    multiples: entry.multiples,
                                });
                            }
                        }
                    }
                    other if self.is_interface_type(other) => {
                        let mut declared = Vec::new();
                        self.interface_methods(other, contract, 0, &mut declared);
                        for method in &declared {
                            methods.add(method, false, entry);
                        }
                    }
                    _ => {}
                }
            }

            for (name, selection) in methods.entries {
                if base.contains(&name) {
                    continue;
                }
                let selection = if fields.contains(&name) { None } else { selection };
                base.insert(name, selection);
            }
            for name in fields {
                if !base.contains(&name) {
                    base.insert(name, None);
                }
            }
            current = consolidate(next);
        }

        base.entries
            .into_iter()
            .filter_map(|(_, selection)| selection)
            .filter(|selection| selection.indirect || !selection.pointer_receiver)
            .map(|selection| selection.method)
            .collect()
    }

    /// Declared and embedded methods of an interface type. Embedded
    /// interfaces may repeat a method, which is not a collision.
    fn interface_methods(
        &self,
        ty: &Type,
        contract: &ErrorContract,
        depth: usize,
        out: &mut Vec<Method>,
    ) {
        if depth > MAX_DEPTH {
            return;
        }
        match self.underlying(ty) {
            Type::Named(named) if named.is_universe() && named.name == "error" => {
                add_method(out, contract.method());
            }
            Type::Interface { methods, embeds } => {
                for method in &methods {
                    add_method(out, method);
                }
                for embed in &embeds {
                    self.interface_methods(embed, contract, depth + 1, out);
                }
            }
            _ => {}
        }
    }

    /// Interface literals, named interfaces, and the universe `error`, `any`
    /// and `comparable`.
    fn is_interface_type(&self, ty: &Type) -> bool {
        match self.underlying(ty) {
            Type::Interface { .. } => true,
            Type::Named(named) => named.is_universe(),
            _ => false,
        }
    }
}

/// An embedded type reached during method-set search.
#[derive(Debug, Clone)]
struct Embedded {
    ty: Type,
    /// Reached through a pointer, so pointer-receiver methods apply.
    indirect: bool,
    /// Reached more than once at the same depth.
    multiples: bool,
}

#[derive(Debug, Clone)]
struct Selection {
    method: Method,
    pointer_receiver: bool,
    indirect: bool,
}

/// Methods by name in first-seen order; `None` marks a collision.
#[derive(Debug, Default)]
struct Selections {
    entries: Vec<(String, Option<Selection>)>,
}

impl Selections {
    fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == name)
    }

    fn insert(&mut self, name: String, selection: Option<Selection>) {
        self.entries.push((name, selection));
    }

    fn add(&mut self, method: &Method, pointer_receiver: bool, entry: &Embedded) {
        let selection = Selection {
            method: method.clone(),
            pointer_receiver,
            indirect: entry.indirect,
        };
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| *existing == method.name)
        {
            Some((_, slot)) => *slot = None,
            None => {
                let selection = (!entry.multiples).then_some(selection);
                self.entries.push((method.name.clone(), selection));
            }
        }
    }
}

/// Merges entries for the same named type at one depth into a single entry
/// marked as reached more than once.
fn consolidate(entries: Vec<Embedded>) -> Vec<Embedded> {
    let mut out: Vec<Embedded> = Vec::with_capacity(entries.len());
    for entry in entries {
        let existing = match &entry.ty {
            Type::Named(named) => out.iter_mut().find(|other| match &other.ty {
                Type::Named(other) => unqualified(other) == unqualified(named),
                _ => false,
            }),
            _ => None,
        };
        match existing {
            Some(other) => other.multiples = true,
            None => out.push(entry),
        }
    }
    out
}

/// A named type without its type arguments.
fn unqualified(named: &NamedRef) -> NamedRef {
    NamedRef::new(named.path.clone(), named.name.clone())
}

fn add_method(out: &mut Vec<Method>, method: &Method) {
    if !out.iter().any(|existing| existing.name == method.name) {
        out.push(method.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_method(name: &str) -> Method {
        Method {
            name: name.to_string(),
            sig: Signature {
                params: vec![],
                results: vec![Type::Basic(Basic::String)],
                variadic: false,
            },
        }
    }

    #[test]
    fn test_contract_matches_error_method_only() {
        let contract = ErrorContract::universe();
        assert!(contract.is_satisfied_by(&string_method("Error")));
        assert!(!contract.is_satisfied_by(&string_method("String")));

        let mut wrong_result = string_method("Error");
        wrong_result.sig.results = vec![Type::Basic(Basic::Int)];
        assert!(!contract.is_satisfied_by(&wrong_result));

        let mut with_param = string_method("Error");
        with_param.sig.params = vec![Type::Basic(Basic::Int)];
        assert!(!contract.is_satisfied_by(&with_param));
    }

    #[test]
    fn test_universe_error_implements() {
        let info = TypeInfo::default();
        let contract = ErrorContract::universe();
        assert!(info.implements(&Type::universe("error"), &contract));
        assert!(!info.implements(&Type::universe("any"), &contract));
        assert!(!info.implements(&Type::Basic(Basic::String), &contract));
        assert!(!info.implements(&Type::Invalid, &contract));
    }

    #[test]
    fn test_method_sets_of_value_and_pointer() {
        let contract = ErrorContract::universe();
        let mut info = TypeInfo {
            path: "example.com/p".to_string(),
            ..Default::default()
        };
        info.named.insert(
            "ptrErr".to_string(),
            NamedInfo {
                underlying: Type::Struct(vec![]),
                methods: vec![MethodDecl {
                    method: string_method("Error"),
                    pointer_receiver: true,
                }],
            },
        );
        let value = Type::Named(NamedRef::new("example.com/p", "ptrErr"));
        assert!(!info.implements(&value, &contract));
        assert!(info.implements(&Type::pointer_to(value), &contract));
    }

    #[test]
    fn test_unknown_named_type_has_no_methods() {
        let info = TypeInfo::default();
        let contract = ErrorContract::universe();
        let opaque = Type::Named(NamedRef::new("github.com/vendor/lib", "Err"));
        assert!(info.method_set(&opaque, &contract).is_empty());
        assert_eq!(info.underlying(&opaque), opaque);
    }
}
