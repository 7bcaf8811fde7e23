use std::sync::Arc;

use crate::loader::Package;
use crate::syntax::ast::Decl;
use crate::types::TypeInfo;

/// A top-level declaration together with the package it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct DeclContext<'a> {
    pub decl: &'a Decl,
    pub info: &'a TypeInfo,
    pub package: &'a Package,
}

/// Every top-level declaration of every package: package order, then file
/// order, then declaration order. Nothing is visited until it is pulled.
pub fn top_level_decls(packages: &[Arc<Package>]) -> impl Iterator<Item = DeclContext<'_>> {
    packages.iter().flat_map(|package| {
        let package: &Package = package;
        package.files.iter().flat_map(move |file| {
            file.decls.iter().map(move |decl| DeclContext {
                decl,
                info: &package.info,
                package,
            })
        })
    })
}
