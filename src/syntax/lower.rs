use tree_sitter::Node;

use super::ast::{
    ChanDir, Decl, DeclToken, Expr, Field, File, FuncDecl, FuncType, GenDecl, Ident, ImportSpec,
    InterfaceElem, LitKind, Pos, Receiver, Spec, TypeExpr, TypeParam, TypeSpec, ValueSpec,
};
use super::parser::ParsedFile;
use crate::error::LoadError;

/// Lower a parsed Go file into the owned AST. `file` is the index of the
/// file within its package and becomes part of every identifier's `Pos`.
pub fn lower_file(parsed: &ParsedFile, file: usize) -> Result<File, LoadError> {
    Lowerer { parsed, file }.file()
}

struct Lowerer<'a> {
    parsed: &'a ParsedFile,
    file: usize,
}

impl<'a> Lowerer<'a> {
    fn file(&self) -> Result<File, LoadError> {
        let root = self.parsed.root_node();
        let mut package = None;
        let mut decls = Vec::new();

        for node in named(root) {
            match node.kind() {
                "package_clause" => package = first_named(node).map(|n| self.ident(n)),
                "import_declaration" => decls.push(Decl::Gen(self.import_decl(node))),
                "const_declaration" => {
                    decls.push(Decl::Gen(self.value_decl(node, DeclToken::Const)))
                }
                "var_declaration" => decls.push(Decl::Gen(self.value_decl(node, DeclToken::Var))),
                "type_declaration" => decls.push(Decl::Gen(self.type_decl(node))),
                "function_declaration" | "method_declaration" => {
                    if let Some(func) = self.func_decl(node) {
                        decls.push(Decl::Func(func));
                    }
                }
                _ => {}
            }
        }

        let package = package
            .ok_or_else(|| LoadError::MissingPackageClause(self.parsed.path.clone()))?;

        Ok(File {
            path: self.parsed.path.clone(),
            package,
            decls,
        })
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.parsed.source_bytes()).unwrap_or("")
    }

    fn ident(&self, node: Node<'_>) -> Ident {
        Ident {
            name: self.text(node).to_string(),
            pos: Pos {
                file: self.file,
                offset: node.start_byte(),
            },
        }
    }

    fn import_decl(&self, node: Node<'_>) -> GenDecl {
        let mut specs = Vec::new();
        for child in named(node) {
            match child.kind() {
                "import_spec" => specs.extend(self.import_spec(child)),
                "import_spec_list" => {
                    for spec in named(child) {
                        if spec.kind() == "import_spec" {
                            specs.extend(self.import_spec(spec));
                        }
                    }
                }
                _ => {}
            }
        }
        GenDecl {
            tok: DeclToken::Import,
            specs,
        }
    }

    fn import_spec(&self, node: Node<'_>) -> Option<Spec> {
        let path = node.child_by_field_name("path")?;
        Some(Spec::Import(ImportSpec {
            name: node
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string()),
            path: self
                .text(path)
                .trim_matches(|c| c == '"' || c == '`')
                .to_string(),
        }))
    }

    fn value_decl(&self, node: Node<'_>, tok: DeclToken) -> GenDecl {
        let mut specs = Vec::new();
        self.collect_value_specs(node, &mut specs);
        GenDecl { tok, specs }
    }

    fn collect_value_specs(&self, node: Node<'_>, specs: &mut Vec<Spec>) {
        for child in named(node) {
            match child.kind() {
                "const_spec" | "var_spec" => specs.push(Spec::Value(self.value_spec(child))),
                "var_spec_list" => self.collect_value_specs(child, specs),
                _ => {}
            }
        }
    }

    fn value_spec(&self, node: Node<'_>) -> ValueSpec {
        ValueSpec {
            names: field_children(node, "name")
                .into_iter()
                .map(|n| self.ident(n))
                .collect(),
            ty: node.child_by_field_name("type").map(|n| self.type_expr(n)),
            values: node
                .child_by_field_name("value")
                .map(|list| named(list).into_iter().map(|n| self.expr(n)).collect())
                .unwrap_or_default(),
        }
    }

    fn type_decl(&self, node: Node<'_>) -> GenDecl {
        let specs = named(node)
            .into_iter()
            .filter_map(|child| match child.kind() {
                "type_spec" => self.type_spec(child, false),
                "type_alias" => self.type_spec(child, true),
                _ => None,
            })
            .map(Spec::Type)
            .collect();
        GenDecl {
            tok: DeclToken::Type,
            specs,
        }
    }

    fn type_spec(&self, node: Node<'_>, alias: bool) -> Option<TypeSpec> {
        let name = node.child_by_field_name("name")?;
        let ty = node.child_by_field_name("type")?;
        Some(TypeSpec {
            name: self.ident(name),
            type_params: self.type_params_of(node),
            alias,
            ty: self.type_expr(ty),
        })
    }

    fn type_params_of(&self, node: Node<'_>) -> Vec<TypeParam> {
        let Some(list) = node.child_by_field_name("type_parameters") else {
            return Vec::new();
        };
        named(list)
            .into_iter()
            .filter(|decl| decl.kind() == "type_parameter_declaration")
            .map(|decl| TypeParam {
                names: field_children(decl, "name")
                    .into_iter()
                    .map(|n| self.text(n).to_string())
                    .collect(),
                constraint: decl
                    .child_by_field_name("type")
                    .map(|t| self.type_expr(t))
                    .unwrap_or_else(|| TypeExpr::Name("any".to_string())),
            })
            .collect()
    }

    fn func_decl(&self, node: Node<'_>) -> Option<FuncDecl> {
        let name = node.child_by_field_name("name")?;
        let recv = match node.child_by_field_name("receiver") {
            // A method whose receiver cannot be understood must not turn
            // into a package-level function.
            Some(list) => Some(self.receiver(list)?),
            None => None,
        };
        Some(FuncDecl {
            recv,
            name: self.ident(name),
            type_params: self.type_params_of(node),
            sig: self.func_type(node),
        })
    }

    fn receiver(&self, list: Node<'_>) -> Option<Receiver> {
        let param = named(list)
            .into_iter()
            .find(|n| n.kind() == "parameter_declaration")?;
        let mut ty = param.child_by_field_name("type")?;
        let mut pointer = false;
        let mut type_params = Vec::new();

        loop {
            match ty.kind() {
                "pointer_type" => {
                    pointer = true;
                    ty = first_named(ty)?;
                }
                "parenthesized_type" => ty = first_named(ty)?,
                "generic_type" => {
                    if let Some(args) = ty.child_by_field_name("type_arguments") {
                        type_params = named(args)
                            .into_iter()
                            .map(|arg| normalize(self.text(arg)))
                            .collect();
                    }
                    ty = ty.child_by_field_name("type")?;
                }
                "type_identifier" => {
                    return Some(Receiver {
                        base: self.text(ty).to_string(),
                        pointer,
                        type_params,
                    })
                }
                _ => return None,
            }
        }
    }

    /// Signature of any node carrying `parameters` and `result` fields:
    /// function and method declarations, function types and literals,
    /// interface method elements.
    fn func_type(&self, node: Node<'_>) -> FuncType {
        let (params, variadic) = node
            .child_by_field_name("parameters")
            .map(|list| self.params(list))
            .unwrap_or_default();
        let results = match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => self.params(result).0,
            Some(result) => vec![self.type_expr(result)],
            None => Vec::new(),
        };
        FuncType {
            params,
            results,
            variadic,
        }
    }

    fn params(&self, list: Node<'_>) -> (Vec<TypeExpr>, bool) {
        let mut types = Vec::new();
        let mut variadic = false;

        for param in named(list) {
            let Some(ty) = param.child_by_field_name("type") else {
                continue;
            };
            match param.kind() {
                "parameter_declaration" => {
                    let count = field_children(param, "name").len().max(1);
                    let ty = self.type_expr(ty);
                    types.extend(std::iter::repeat(ty).take(count));
                }
                "variadic_parameter_declaration" => {
                    types.push(self.type_expr(ty));
                    variadic = true;
                }
                _ => {}
            }
        }

        (types, variadic)
    }

    fn type_expr(&self, node: Node<'_>) -> TypeExpr {
        match node.kind() {
            "type_identifier" | "identifier" => TypeExpr::Name(self.text(node).to_string()),
            "qualified_type" => match (
                node.child_by_field_name("package"),
                node.child_by_field_name("name"),
            ) {
                (Some(package), Some(name)) => TypeExpr::Qualified {
                    package: self.text(package).to_string(),
                    name: self.text(name).to_string(),
                },
                _ => self.other(node),
            },
            "generic_type" => match node.child_by_field_name("type") {
                Some(base) => TypeExpr::Generic {
                    base: Box::new(self.type_expr(base)),
                    args: node
                        .child_by_field_name("type_arguments")
                        .map(|args| named(args).into_iter().map(|a| self.type_expr(a)).collect())
                        .unwrap_or_default(),
                },
                None => self.other(node),
            },
            "pointer_type" => match first_named(node) {
                Some(elem) => TypeExpr::Pointer(Box::new(self.type_expr(elem))),
                None => self.other(node),
            },
            "parenthesized_type" | "type_elem" | "type_constraint" => self.unwrap_single(node),
            "slice_type" => TypeExpr::Slice(self.field_type(node, "element")),
            "array_type" => TypeExpr::Array {
                len: node
                    .child_by_field_name("length")
                    .map(|len| normalize(self.text(len)))
                    .unwrap_or_default(),
                elem: self.field_type(node, "element"),
            },
            "implicit_length_array_type" => TypeExpr::Array {
                len: "...".to_string(),
                elem: self.field_type(node, "element"),
            },
            "map_type" => TypeExpr::Map {
                key: self.field_type(node, "key"),
                value: self.field_type(node, "value"),
            },
            "channel_type" => TypeExpr::Chan {
                dir: chan_dir(node),
                elem: self.field_type(node, "value"),
            },
            "function_type" => TypeExpr::Func(self.func_type(node)),
            "struct_type" => TypeExpr::Struct(self.fields(node)),
            "interface_type" => TypeExpr::Interface(self.interface_elems(node)),
            _ => self.other(node),
        }
    }

    fn other(&self, node: Node<'_>) -> TypeExpr {
        TypeExpr::Other(normalize(self.text(node)))
    }

    fn field_type(&self, node: Node<'_>, field: &str) -> Box<TypeExpr> {
        Box::new(match node.child_by_field_name(field) {
            Some(child) => self.type_expr(child),
            None => self.other(node),
        })
    }

    fn unwrap_single(&self, node: Node<'_>) -> TypeExpr {
        match named(node).as_slice() {
            [only] => self.type_expr(*only),
            _ => self.other(node),
        }
    }

    fn fields(&self, node: Node<'_>) -> Vec<Field> {
        let Some(list) = named(node)
            .into_iter()
            .find(|n| n.kind() == "field_declaration_list")
        else {
            return Vec::new();
        };

        named(list)
            .into_iter()
            .filter(|decl| decl.kind() == "field_declaration")
            .filter_map(|decl| {
                let ty = decl.child_by_field_name("type")?;
                let names: Vec<String> = field_children(decl, "name")
                    .into_iter()
                    .map(|n| self.text(n).to_string())
                    .collect();
                let embedded_pointer = names.is_empty() && has_token(decl, "*");
                Some(Field {
                    names,
                    ty: self.type_expr(ty),
                    embedded_pointer,
                })
            })
            .collect()
    }

    fn interface_elems(&self, node: Node<'_>) -> Vec<InterfaceElem> {
        named(node)
            .into_iter()
            .filter_map(|elem| match elem.kind() {
                "method_elem" | "method_spec" => {
                    let name = elem.child_by_field_name("name")?;
                    Some(InterfaceElem::Method {
                        name: self.text(name).to_string(),
                        sig: self.func_type(elem),
                    })
                }
                "type_elem" | "constraint_elem" | "interface_type_name" => {
                    Some(InterfaceElem::Embed(self.unwrap_single(elem)))
                }
                _ => None,
            })
            .collect()
    }

    fn expr(&self, node: Node<'_>) -> Expr {
        match node.kind() {
            "identifier" | "nil" | "true" | "false" | "iota" => {
                Expr::Ident(self.text(node).to_string())
            }
            "int_literal" => Expr::Lit(LitKind::Int),
            "float_literal" => Expr::Lit(LitKind::Float),
            "imaginary_literal" => Expr::Lit(LitKind::Imaginary),
            "rune_literal" => Expr::Lit(LitKind::Rune),
            "interpreted_string_literal" | "raw_string_literal" => Expr::Lit(LitKind::String),
            "selector_expression" => match (
                node.child_by_field_name("operand"),
                node.child_by_field_name("field"),
            ) {
                (Some(operand), Some(field)) => Expr::Selector {
                    operand: Box::new(self.expr(operand)),
                    field: self.text(field).to_string(),
                },
                _ => Expr::Other,
            },
            "call_expression" => match node.child_by_field_name("function") {
                Some(func) => Expr::Call {
                    func: Box::new(self.expr(func)),
                    args: node
                        .child_by_field_name("arguments")
                        .map(|args| named(args).into_iter().map(|a| self.expr(a)).collect())
                        .unwrap_or_default(),
                },
                None => Expr::Other,
            },
            "composite_literal" => node
                .child_by_field_name("type")
                .map(|ty| Expr::Composite(self.type_expr(ty)))
                .unwrap_or(Expr::Other),
            "unary_expression" => match (
                node.child_by_field_name("operator"),
                node.child_by_field_name("operand"),
            ) {
                (Some(op), Some(operand)) => Expr::Unary {
                    op: self.text(op).to_string(),
                    operand: Box::new(self.expr(operand)),
                },
                _ => Expr::Other,
            },
            "binary_expression" => match (
                node.child_by_field_name("operator"),
                node.child_by_field_name("left"),
                node.child_by_field_name("right"),
            ) {
                (Some(op), Some(left), Some(right)) => Expr::Binary {
                    op: self.text(op).to_string(),
                    left: Box::new(self.expr(left)),
                    right: Box::new(self.expr(right)),
                },
                _ => Expr::Other,
            },
            "parenthesized_expression" => first_named(node)
                .map(|inner| Expr::Paren(Box::new(self.expr(inner))))
                .unwrap_or(Expr::Other),
            "type_assertion_expression" => node
                .child_by_field_name("type")
                .map(|ty| Expr::TypeAssert(self.type_expr(ty)))
                .unwrap_or(Expr::Other),
            "type_conversion_expression" => node
                .child_by_field_name("type")
                .map(|ty| Expr::Conversion(self.type_expr(ty)))
                .unwrap_or(Expr::Other),
            "func_literal" => Expr::FuncLit(self.func_type(node)),
            kind if is_type_kind(kind) => Expr::Type(self.type_expr(node)),
            _ => Expr::Other,
        }
    }
}

fn is_type_kind(kind: &str) -> bool {
    matches!(
        kind,
        "type_identifier"
            | "qualified_type"
            | "generic_type"
            | "pointer_type"
            | "parenthesized_type"
            | "slice_type"
            | "array_type"
            | "implicit_length_array_type"
            | "map_type"
            | "channel_type"
            | "function_type"
            | "struct_type"
            | "interface_type"
    )
}

fn chan_dir(node: Node<'_>) -> ChanDir {
    let mut cursor = node.walk();
    let tokens: Vec<&str> = node
        .children(&mut cursor)
        .filter(|child| !child.is_named())
        .map(|child| child.kind())
        .collect();
    match tokens.as_slice() {
        ["<-", ..] => ChanDir::Recv,
        tokens if tokens.contains(&"<-") => ChanDir::Send,
        _ => ChanDir::Both,
    }
}

fn named(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect();
    children
}

fn first_named(node: Node<'_>) -> Option<Node<'_>> {
    named(node).into_iter().next()
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children = node.children_by_field_name(field, &mut cursor).collect();
    children
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
