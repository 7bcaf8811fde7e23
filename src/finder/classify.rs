use super::decls::DeclContext;
use super::models::{Definition, ErrorKind};
use crate::syntax::ast::{Decl, Spec, TypeSpec, ValueSpec};
use crate::types::ErrorContract;

fn specs<'a>(ctx: &DeclContext<'a>) -> &'a [Spec] {
    match ctx.decl {
        Decl::Gen(gen) => gen.specs.as_slice(),
        Decl::Func(_) => &[],
    }
}

/// Names declared by a `var` or `const` group whose type implements
/// `error`.
pub fn extract_sentinels<'a>(
    ctx: DeclContext<'a>,
    contract: &'a ErrorContract,
) -> impl Iterator<Item = Definition> + 'a {
    specs(&ctx)
        .iter()
        .filter_map(|spec| match spec {
            Spec::Value(spec) => Some(spec),
            _ => None,
        })
        .flat_map(|spec: &'a ValueSpec| spec.names.iter())
        .filter_map(move |name| {
            let ty = ctx.info.type_of(name)?;
            ctx.info.implements(ty, contract).then(|| {
                Definition::new(ErrorKind::Sentinel, &name.name, ctx.package, ty.to_string())
            })
        })
}

/// Type definitions in a `type` group whose own method set implements
/// `error`. Aliases are skipped, and a type whose `Error` method has a
/// pointer receiver only qualifies through `*T`, so it is not reported.
pub fn extract_structured<'a>(
    ctx: DeclContext<'a>,
    contract: &'a ErrorContract,
) -> impl Iterator<Item = Definition> + 'a {
    specs(&ctx)
        .iter()
        .filter_map(|spec| match spec {
            Spec::Type(spec) if !spec.alias => Some(spec),
            _ => None,
        })
        .filter_map(move |spec: &'a TypeSpec| {
            let ty = ctx.info.type_of(&spec.name)?;
            ctx.info.implements(ty, contract).then(|| {
                Definition::new(
                    ErrorKind::Structured,
                    &spec.name.name,
                    ctx.package,
                    ty.to_string(),
                )
            })
        })
}
