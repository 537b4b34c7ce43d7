//! ES module syntax → module registry calls.
//!
//! Runs on transpiled output. Every edit keeps the number of newlines it
//! replaces, so the line mapping of the transform's source map holds.
//!
//! | Source                          | Output                                            |
//! |---------------------------------|---------------------------------------------------|
//! | `import a, { b } from "x"`      | header: `const __im0 = __toESM(__require("x"));`, uses: `__im0.default`, `__im0.b` |
//! | `import * as n from "x"`        | header: `const __im0 = …;`, uses: `__im0`          |
//! | `import "x"`                    | header: `__require("x");`                         |
//! | `export const a = 1`            | `const a = 1` + getter `a`                        |
//! | `export { a as b }`             | getter `b → a`                                    |
//! | `export default expr`           | `const __default = expr` + getter `default`       |
//! | `export { a } from "x"`         | header: `const __re0 = …;` + getter `a → __re0.a` |
//! | `export * from "x"`             | header: `__reexport(exports, __require("x"));`    |
//! | `import("x")`                   | `__import("x")`                                   |
//! | `require("x")`                  | `__require("x")`                                  |
//!
//! Every reference to an imported binding becomes a property read on the
//! imported namespace, so bindings stay live: later reassignments in the
//! exporting module are visible, and a circular import only touches the
//! other module's exports when the code actually runs. Called imports are
//! written `(0, __im0.f)(…)` so `this` is not the namespace.

use oxc::allocator::Allocator;
use oxc::ast::ast::{
    Argument, BindingPattern, CallExpression, Declaration, ExportDefaultDeclarationKind,
    ExportNamedDeclaration, Expression, IdentifierReference, ImportDeclaration,
    ImportDeclarationSpecifier, ImportExpression, MetaProperty, ModuleExportName, ObjectProperty,
    Statement,
};
use oxc::ast_visit::{Visit, walk};
use oxc::parser::Parser;
use oxc::semantic::{Scoping, SemanticBuilder};
use oxc::span::{GetSpan, SourceType, Span};
use oxc::syntax::symbol::SymbolId;
use rustc_hash::FxHashMap;

use super::compile::json_string;
use super::error::BundleError;
use super::location::LineIndex;
use super::resolve::{ModuleId, Resolver};

/// Rewritten module body.
#[derive(Debug, Clone, Default)]
pub struct Rewritten {
    /// Body with module syntax replaced.
    pub code: String,
    /// Statements for the factory's first line (export getters, imports).
    pub header: String,
    pub deps: Vec<ModuleId>,
}

/// Rewrite the module syntax of `code`, resolving specifiers from `path`.
pub fn rewrite_module(
    path: &str,
    code: &str,
    resolver: &Resolver<'_>,
) -> Result<Rewritten, Vec<BundleError>> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
        // transpiled output that does not re-parse is a bug on our side
        let lines = LineIndex::new(code);
        return Err(ret
            .errors
            .iter()
            .map(|diag| {
                let offset = diag
                    .labels
                    .as_ref()
                    .and_then(|l| l.first())
                    .map(|l| l.offset())
                    .unwrap_or(0);
                let (line, column) = lines.position(offset);
                BundleError::Internal(format!(
                    "{path}: generated code does not parse at {line}:{column}: {}",
                    diag.message
                ))
            })
            .collect());
    }

    let scoping = SemanticBuilder::new()
        .build(&ret.program)
        .semantic
        .into_scoping();

    let mut state = RewriteState {
        path,
        code,
        resolver,
        scoping: &scoping,
        imports: FxHashMap::default(),
        namespaces: FxHashMap::default(),
        edits: Vec::new(),
        exports: Vec::new(),
        hoisted: Vec::new(),
        deps: Vec::new(),
        errors: Vec::new(),
        next_ns: 0,
        esm: false,
    };

    // import bindings are visible above their declaration
    for stmt in &ret.program.body {
        if let Statement::ImportDeclaration(decl) = stmt {
            state.bind_imports(decl);
        }
    }
    for stmt in &ret.program.body {
        state.statement(stmt);
    }
    state.visit_program(&ret.program);

    if !state.errors.is_empty() {
        return Err(state.errors);
    }

    let header = state.header();
    Ok(Rewritten {
        code: apply_edits(code, state.edits),
        header,
        deps: state.deps,
    })
}

struct RewriteState<'r> {
    path: &'r str,
    code: &'r str,
    resolver: &'r Resolver<'r>,
    scoping: &'r Scoping,
    /// Imported binding → expression that reads it from its namespace.
    imports: FxHashMap<SymbolId, String>,
    /// Import declaration start → namespace variable.
    namespaces: FxHashMap<u32, String>,
    /// (start, end, replacement) over `code`.
    edits: Vec<(u32, u32, String)>,
    /// (exported name, getter expression).
    exports: Vec<(String, String)>,
    /// Statements moved to the header.
    hoisted: Vec<String>,
    deps: Vec<ModuleId>,
    errors: Vec<BundleError>,
    next_ns: usize,
    /// Saw `import` or `export` syntax.
    esm: bool,
}

impl RewriteState<'_> {
    /// Name the namespace of an import declaration and map its bindings.
    fn bind_imports(&mut self, decl: &ImportDeclaration<'_>) {
        if decl.import_kind.is_type() {
            return;
        }
        let Some(specifiers) = decl.specifiers.as_ref().filter(|s| !s.is_empty()) else {
            return;
        };

        let ns = self.namespace("__im");
        for spec in specifiers {
            let (local, read) = match spec {
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    (&s.local, member(&ns, "default"))
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => (&s.local, ns.clone()),
                ImportDeclarationSpecifier::ImportSpecifier(s) => {
                    if s.import_kind.is_type() {
                        continue;
                    }
                    (&s.local, member(&ns, &export_name(&s.imported)))
                }
            };
            if let Some(symbol) = local.symbol_id.get() {
                self.imports.insert(symbol, read);
            }
        }
        self.namespaces.insert(decl.span.start, ns);
    }

    /// Namespace read for a reference to an imported binding.
    fn imported(&self, id: &IdentifierReference<'_>) -> Option<&str> {
        let reference = id.reference_id.get()?;
        let symbol = self.scoping.get_reference(reference).symbol_id()?;
        self.imports.get(&symbol).map(String::as_str)
    }

    /// Getter body for a local `export { name }`.
    fn local_export(&self, local: &ModuleExportName<'_>) -> String {
        if let ModuleExportName::IdentifierReference(id) = local
            && let Some(read) = self.imported(id)
        {
            return read.to_string();
        }
        export_name(local)
    }

    fn statement(&mut self, stmt: &Statement<'_>) {
        self.esm |= matches!(
            stmt,
            Statement::ImportDeclaration(_)
                | Statement::ExportNamedDeclaration(_)
                | Statement::ExportDefaultDeclaration(_)
                | Statement::ExportAllDeclaration(_)
        );
        match stmt {
            Statement::ImportDeclaration(decl) => {
                self.remove(decl.span);
                if decl.import_kind.is_type() {
                    return;
                }
                let Some(key) = self.resolve(decl.source.value.as_str()) else {
                    return;
                };
                match self.namespaces.get(&decl.span.start) {
                    Some(ns) => {
                        let line = format!("const {ns} = __toESM(__require({key}));");
                        self.hoisted.push(line);
                    }
                    None => self.hoisted.push(format!("__require({key});")),
                }
            }

            Statement::ExportNamedDeclaration(decl) => {
                if decl.export_kind.is_type() {
                    self.remove(decl.span);
                    return;
                }

                if let Some(source) = &decl.source {
                    self.remove(decl.span);
                    let Some(key) = self.resolve(source.value.as_str()) else {
                        return;
                    };
                    let ns = self.namespace("__re");
                    self.hoisted
                        .push(format!("const {ns} = __toESM(__require({key}));"));
                    for spec in &decl.specifiers {
                        if spec.export_kind.is_type() {
                            continue;
                        }
                        self.exports.push((
                            export_name(&spec.exported),
                            member(&ns, &export_name(&spec.local)),
                        ));
                    }
                    return;
                }

                if let Some(declaration) = &decl.declaration {
                    let mut names = Vec::new();
                    declaration_names(declaration, &mut names);
                    if names.is_empty() && !is_runtime_declaration(declaration) {
                        self.remove(decl.span);
                        return;
                    }
                    self.replace(decl.span.start, declaration.span().start, String::new());
                    for name in names {
                        self.exports.push((name.clone(), name));
                    }
                    return;
                }

                self.remove(decl.span);
                for spec in &decl.specifiers {
                    if spec.export_kind.is_type() {
                        continue;
                    }
                    let getter = self.local_export(&spec.local);
                    self.exports.push((export_name(&spec.exported), getter));
                }
            }

            Statement::ExportDefaultDeclaration(decl) => {
                let inner = decl.declaration.span();
                let named = match &decl.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
                        f.id.as_ref().map(|id| id.name.to_string())
                    }
                    ExportDefaultDeclarationKind::ClassDeclaration(c) => {
                        c.id.as_ref().map(|id| id.name.to_string())
                    }
                    ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => {
                        self.remove(decl.span);
                        return;
                    }
                    _ => None,
                };

                match named {
                    Some(name) => {
                        self.replace(decl.span.start, inner.start, String::new());
                        self.exports.push(("default".to_string(), name));
                    }
                    None => {
                        self.replace(decl.span.start, inner.start, "const __default = ".into());
                        let end = decl.span.end as usize;
                        let terminated = self.code[..end].trim_end().ends_with(';')
                            || self.code[end..].trim_start().starts_with(';');
                        if !terminated {
                            self.replace(decl.span.end, decl.span.end, ";".into());
                        }
                        self.exports
                            .push(("default".to_string(), "__default".to_string()));
                    }
                }
            }

            Statement::ExportAllDeclaration(decl) => {
                self.remove(decl.span);
                if decl.export_kind.is_type() {
                    return;
                }
                let Some(key) = self.resolve(decl.source.value.as_str()) else {
                    return;
                };
                match &decl.exported {
                    Some(name) => {
                        let ns = self.namespace("__re");
                        self.hoisted
                            .push(format!("const {ns} = __toESM(__require({key}));"));
                        self.exports.push((export_name(name), ns));
                    }
                    None => {
                        self.hoisted
                            .push(format!("__reexport(exports, __require({key}));"));
                    }
                }
            }

            Statement::TSExportAssignment(_) | Statement::TSNamespaceExportDeclaration(_) => {
                self.remove(stmt.span());
            }

            _ => {}
        }
    }

    /// Resolve a specifier and record the dependency; returns the quoted key.
    fn resolve(&mut self, specifier: &str) -> Option<String> {
        match self.resolver.resolve(specifier, self.path) {
            Ok(id) => {
                let key = json_string(&id.key());
                if !self.deps.contains(&id) {
                    self.deps.push(id);
                }
                Some(key)
            }
            Err(err) => {
                if !self.errors.contains(&err) {
                    self.errors.push(err);
                }
                None
            }
        }
    }

    fn namespace(&mut self, prefix: &str) -> String {
        let name = format!("{prefix}{}", self.next_ns);
        self.next_ns += 1;
        name
    }

    fn remove(&mut self, span: Span) {
        self.replace(span.start, span.end, String::new());
    }

    /// Replace `start..end`, keeping the newlines of the replaced text.
    fn replace(&mut self, start: u32, end: u32, text: String) {
        let newlines = self.code[start as usize..end as usize]
            .bytes()
            .filter(|b| *b == b'\n')
            .count();
        let mut text = text;
        text.push_str(&"\n".repeat(newlines));
        self.edits.push((start, end, text));
    }

    fn header(&self) -> String {
        let mut parts = Vec::new();
        // marks the exports object as a namespace before any dependency
        // runs, so a circular importer reads it through getters
        if self.esm {
            let getters: Vec<String> = self
                .exports
                .iter()
                .map(|(name, expr)| format!("{}: () => {expr}", json_string(name)))
                .collect();
            if getters.is_empty() {
                parts.push("__export(exports, {});".to_string());
            } else {
                parts.push(format!("__export(exports, {{ {} }});", getters.join(", ")));
            }
        }
        parts.extend(self.hoisted.iter().cloned());
        parts.join(" ")
    }
}

impl<'a> Visit<'a> for RewriteState<'_> {
    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        self.replace(it.span.start, it.span.start + "import".len() as u32, "__import".into());
        if let Expression::StringLiteral(lit) = &it.source
            && let Some(key) = self.resolve(lit.value.as_str())
        {
            self.replace(lit.span.start, lit.span.end, key);
        }
        walk::walk_import_expression(self, it);
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &it.callee
            && callee.name.as_str() == "require"
            && it.arguments.len() == 1
            && let Argument::StringLiteral(lit) = &it.arguments[0]
            && let Some(key) = self.resolve(lit.value.as_str())
        {
            self.replace(callee.span.start, callee.span.end, "__require".into());
            self.replace(lit.span.start, lit.span.end, key);
            return;
        }
        if let Expression::Identifier(callee) = &it.callee
            && let Some(read) = self.imported(callee)
        {
            let call = format!("(0, {read})");
            self.replace(callee.span.start, callee.span.end, call);
            for arg in &it.arguments {
                self.visit_argument(arg);
            }
            return;
        }
        walk::walk_call_expression(self, it);
    }

    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        if let Some(read) = self.imported(it) {
            let read = read.to_string();
            self.replace(it.span.start, it.span.end, read);
        }
    }

    fn visit_object_property(&mut self, it: &ObjectProperty<'a>) {
        if it.shorthand
            && let Expression::Identifier(id) = &it.value
            && let Some(read) = self.imported(id)
        {
            let property = format!("{}: {read}", id.name);
            self.replace(it.span.start, it.span.end, property);
            return;
        }
        walk::walk_object_property(self, it);
    }

    fn visit_export_named_declaration(&mut self, it: &ExportNamedDeclaration<'a>) {
        // specifiers were turned into getters and their text removed
        if let Some(declaration) = &it.declaration {
            self.visit_declaration(declaration);
        }
    }

    fn visit_meta_property(&mut self, it: &MetaProperty<'a>) {
        if it.meta.name.as_str() == "import" && it.property.name.as_str() == "meta" {
            self.replace(
                it.span.start,
                it.span.end,
                format!("__importMeta({})", json_string(self.path)),
            );
        }
    }
}

/// `ns.name`, or `ns["name"]` when the name is not an identifier.
fn member(ns: &str, name: &str) -> String {
    let mut chars = name.chars();
    let identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if identifier {
        format!("{ns}.{name}")
    } else {
        format!("{ns}[{}]", json_string(name))
    }
}

fn export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

/// Declarations that survive type stripping.
fn is_runtime_declaration(decl: &Declaration<'_>) -> bool {
    matches!(
        decl,
        Declaration::VariableDeclaration(_)
            | Declaration::FunctionDeclaration(_)
            | Declaration::ClassDeclaration(_)
    )
}

fn declaration_names(decl: &Declaration<'_>, names: &mut Vec<String>) {
    match decl {
        Declaration::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                binding_names(&declarator.id, names);
            }
        }
        Declaration::FunctionDeclaration(f) => {
            if let Some(id) = &f.id {
                names.push(id.name.to_string());
            }
        }
        Declaration::ClassDeclaration(c) => {
            if let Some(id) = &c.id {
                names.push(id.name.to_string());
            }
        }
        _ => {}
    }
}

fn binding_names(pattern: &BindingPattern<'_>, names: &mut Vec<String>) {
    match pattern {
        BindingPattern::BindingIdentifier(id) => names.push(id.name.to_string()),
        BindingPattern::ObjectPattern(obj) => {
            for prop in &obj.properties {
                binding_names(&prop.value, names);
            }
            if let Some(rest) = &obj.rest {
                binding_names(&rest.argument, names);
            }
        }
        BindingPattern::ArrayPattern(arr) => {
            for pattern in arr.elements.iter().flatten() {
                binding_names(pattern, names);
            }
            if let Some(rest) = &arr.rest {
                binding_names(&rest.argument, names);
            }
        }
        BindingPattern::AssignmentPattern(assign) => binding_names(&assign.left, names),
    }
}

/// Apply non-overlapping edits back to front.
fn apply_edits(code: &str, mut edits: Vec<(u32, u32, String)>) -> String {
    edits.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
    let mut out = code.to_string();
    for (start, end, text) in edits {
        out.replace_range(start as usize..end as usize, &text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::options::BuildOptions;
    use crate::vfs::{FileIndex, FileNode};

    fn rewrite(code: &str) -> Result<Rewritten, Vec<BundleError>> {
        let nodes = vec![
            FileNode::folder(
                "1",
                "src",
                vec![
                    FileNode::file("2", "App.js", ""),
                    FileNode::file("3", "util.js", ""),
                    FileNode::file("4", "Lazy.js", ""),
                ],
            ),
        ];
        let index = FileIndex::build(&nodes).unwrap();
        let options = BuildOptions::default();
        let resolver = Resolver::new(&index, &options);
        rewrite_module("src/App.js", code, &resolver)
    }

    fn line_count(s: &str) -> usize {
        s.matches('\n').count()
    }

    #[test]
    fn test_imports_are_hoisted_to_header() {
        let code = "import React, { useState as useS } from \"react\";\nimport * as util from \"./util\";\nimport \"./Lazy\";\nconsole.log(React, useS, util);\n";
        let out = rewrite(code).unwrap();
        assert_eq!(
            out.header,
            "__export(exports, {}); \
             const __im0 = __toESM(__require(\"external:react\")); \
             const __im1 = __toESM(__require(\"src/util.js\")); \
             __require(\"src/Lazy.js\");"
        );
        assert_eq!(line_count(&out.code), line_count(code));
        assert!(
            out.code
                .ends_with("console.log(__im0.default, __im0.useState, __im1);\n")
        );
        assert_eq!(
            out.deps,
            vec![
                ModuleId::External("react".into()),
                ModuleId::Virtual("src/util.js".into()),
                ModuleId::Virtual("src/Lazy.js".into()),
            ]
        );
    }

    #[test]
    fn test_imported_bindings_are_read_at_use_sites() {
        let code = "console.log(early);\nimport { early, helper, \"odd-name\" as odd } from \"./util\";\nhelper(1);\nconst o = { early, odd };\n";
        let out = rewrite(code).unwrap();
        assert_eq!(
            out.code,
            "console.log(__im0.early);\n\n(0, __im0.helper)(1);\nconst o = { early: __im0.early, odd: __im0[\"odd-name\"] };\n"
        );
    }

    #[test]
    fn test_shadowed_names_are_left_alone() {
        let code = "import { a } from \"./util\";\nfunction f(a) { return a; }\nconsole.log(a, f);\n";
        let out = rewrite(code).unwrap();
        assert!(out.code.contains("function f(a) { return a; }"));
        assert!(out.code.contains("console.log(__im0.a, f);"));
    }

    #[test]
    fn test_exporting_an_import_keeps_it_live() {
        let code = "import { count } from \"./util\";\nexport { count as total };\n";
        let out = rewrite(code).unwrap();
        assert_eq!(
            out.header,
            "__export(exports, { \"total\": () => __im0.count }); \
             const __im0 = __toESM(__require(\"src/util.js\"));"
        );
        assert_eq!(out.code, "\n\n");
    }

    #[test]
    fn test_named_exports() {
        let code = "export const a = 1, { b, c: [d] } = obj;\nexport function f() {}\nexport class K {}\nconst x = 2;\nexport { x as y, x };\n";
        let out = rewrite(code).unwrap();
        assert_eq!(
            out.header,
            "__export(exports, { \"a\": () => a, \"b\": () => b, \"d\": () => d, \"f\": () => f, \"K\": () => K, \"y\": () => x, \"x\": () => x });"
        );
        assert!(out.code.starts_with("const a = 1"));
        assert!(out.code.contains("\nfunction f() {}"));
        assert!(out.code.contains("\nclass K {}"));
        assert!(!out.code.contains("export"));
        assert_eq!(line_count(&out.code), line_count(code));
    }

    #[test]
    fn test_default_exports() {
        let out = rewrite("export default function App() {}\n").unwrap();
        assert_eq!(out.code, "function App() {}\n");
        assert_eq!(out.header, "__export(exports, { \"default\": () => App });");

        let out = rewrite("export default 42;\n").unwrap();
        assert_eq!(out.code, "const __default = 42;\n");
        assert_eq!(out.header, "__export(exports, { \"default\": () => __default });");

        let out = rewrite("export default function() {}\n").unwrap();
        assert_eq!(out.code, "const __default = function() {};\n");
    }

    #[test]
    fn test_reexports() {
        let code = "export { helper as h, default } from \"./util\";\nexport * from \"./Lazy\";\nexport * as ns from \"./util\";\n";
        let out = rewrite(code).unwrap();
        assert_eq!(
            out.header,
            "__export(exports, { \"h\": () => __re0.helper, \"default\": () => __re0.default, \"ns\": () => __re1 }); \
             const __re0 = __toESM(__require(\"src/util.js\")); \
             __reexport(exports, __require(\"src/Lazy.js\")); \
             const __re1 = __toESM(__require(\"src/util.js\"));"
        );
        assert_eq!(out.deps.len(), 2);
        assert_eq!(out.code.trim(), "");
    }

    #[test]
    fn test_dynamic_import_and_require() {
        let code = "const Lazy = import(\"./Lazy\");\nconst u = require(\"./util\");\nconst other = import(name);\n";
        let out = rewrite(code).unwrap();
        assert!(out.code.contains("const Lazy = __import(\"src/Lazy.js\");"));
        assert!(out.code.contains("const u = __require(\"src/util.js\");"));
        assert!(out.code.contains("const other = __import(name);"));
        assert!(out.header.is_empty());
    }

    #[test]
    fn test_import_meta() {
        let out = rewrite("console.log(import.meta.url);\n").unwrap();
        assert_eq!(out.code, "console.log(__importMeta(\"src/App.js\").url);\n");
    }

    #[test]
    fn test_unresolved_imports_are_all_reported() {
        let code = "import a from \"./missing\";\nimport b from \"./gone\";\nimport c from \"./missing\";\n";
        let errs = rewrite(code).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs[0].to_string().contains("./missing"));
        assert!(errs[1].to_string().contains("./gone"));
    }

    #[test]
    fn test_multiline_import_keeps_lines() {
        let code = "import {\n  a,\n  b\n} from \"./util\";\nconsole.log(a, b);\n";
        let out = rewrite(code).unwrap();
        assert_eq!(out.code, "\n\n\n\nconsole.log(__im0.a, __im0.b);\n");
    }
}
