//! Bundle emission.
//!
//! Output layout, one self-contained IIFE:
//!
//! ```text
//! (function () {
//! "use strict";
//! var process = {"env":{"NODE_ENV":"development"}};   // defines
//! var __modules = ...                                  // runtime
//! __modules["src/App.tsx"] = function (module, exports) { <header>
//! <module code>
//! };
//! __modules["external:react"] = function (module) { module.exports = React; };
//! __require("src/index.tsx");
//! })();
//! //# sourceMappingURL=data:application/json;base64,...
//! ```
//!
//! Modules appear in discovery order so identical inputs produce identical
//! bytes.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use oxc_sourcemap::{ConcatSourceMapBuilder, SourceMap};
use regex::Regex;
use serde_json::{Map, Value};

use super::compile::{CompiledModule, json_string};
use super::error::BundleError;
use super::options::BuildOptions;
use super::resolve::ModuleId;

const RUNTIME: &str = include_str!("runtime.js");

/// Externals that map to the runtime's JSX shim instead of a plain global.
const JSX_RUNTIME_SUFFIXES: [&str; 2] = ["/jsx-runtime", "/jsx-dev-runtime"];

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern is valid")
});

static GLOBAL_EXPR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
        .expect("global pattern is valid")
});

/// Line-counting output buffer.
struct Output {
    text: String,
    lines: u32,
}

impl Output {
    fn new() -> Self {
        Self {
            text: String::new(),
            lines: 0,
        }
    }

    fn line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
        self.lines += line.matches('\n').count() as u32 + 1;
    }

    fn block(&mut self, block: &str) {
        let block = block.strip_suffix('\n').unwrap_or(block);
        self.line(block);
    }
}

/// Concatenate compiled modules into one script.
pub fn emit(
    entry: &str,
    modules: &[CompiledModule],
    externals: &[String],
    options: &BuildOptions,
) -> Result<String, BundleError> {
    let mut out = Output::new();
    out.line("(function () {");
    out.line("\"use strict\";");

    let defines = define_prelude(&options.define)?;
    if !defines.is_empty() {
        out.block(&defines);
    }
    out.block(RUNTIME);

    let mut maps = Vec::new();
    for module in modules {
        let key = ModuleId::Virtual(module.path.clone()).key();
        if module.header.is_empty() {
            out.line(&format!(
                "__modules[{}] = function (module, exports) {{",
                json_string(&key)
            ));
        } else {
            out.line(&format!(
                "__modules[{}] = function (module, exports) {{ {}",
                json_string(&key),
                module.header
            ));
        }
        let offset = out.lines;
        out.block(&module.code);
        out.line("};");

        if let Some(json) = &module.map {
            let map = SourceMap::from_json_string(json).map_err(|e| {
                BundleError::Internal(format!("source map of `{}`: {e:?}", module.path))
            })?;
            maps.push((map, offset));
        }
    }

    for specifier in externals {
        let key = ModuleId::External(specifier.clone()).key();
        let global = external_expr(specifier, options)?;
        out.line(&format!(
            "__modules[{}] = function (module) {{ module.exports = {global}; }};",
            json_string(&key)
        ));
    }

    out.line(&format!(
        "__require({});",
        json_string(&ModuleId::Virtual(entry.to_string()).key())
    ));
    out.line("})();");

    if options.minify {
        return minify(&out.text);
    }

    if options.sourcemap && !maps.is_empty() {
        let refs: Vec<(&SourceMap, u32)> = maps.iter().map(|(map, line)| (map, *line)).collect();
        let map = ConcatSourceMapBuilder::from_sourcemaps(&refs).into_sourcemap();
        out.text.push_str("//# sourceMappingURL=");
        out.text.push_str(&map.to_data_url());
        out.text.push('\n');
    }

    Ok(out.text)
}

/// Compress and mangle a whole bundle.
fn minify(code: &str) -> Result<String, BundleError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::cjs()).parse();
    if let Some(diag) = ret.errors.first() {
        return Err(BundleError::Internal(format!(
            "minifier rejected the bundle: {}",
            diag.message
        )));
    }

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::default()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);

    Ok(Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code)
}

/// Runtime expression an external evaluates to.
fn external_expr(specifier: &str, options: &BuildOptions) -> Result<String, BundleError> {
    let global = options.externals.get(specifier).ok_or_else(|| {
        BundleError::Internal(format!("external `{specifier}` has no configured global"))
    })?;
    if !GLOBAL_EXPR.is_match(global) {
        return Err(BundleError::Engine(format!(
            "external `{specifier}` maps to `{global}`, which is not a global name"
        )));
    }
    if JSX_RUNTIME_SUFFIXES.iter().any(|s| specifier.ends_with(s)) {
        Ok(format!("__jsxRuntime({global})"))
    } else {
        Ok(global.clone())
    }
}

/// Check every external maps to a usable global expression.
pub(crate) fn validate_externals(options: &BuildOptions) -> Result<(), BundleError> {
    options
        .externals
        .keys()
        .try_for_each(|specifier| external_expr(specifier, options).map(|_| ()))
}

/// `var` statements for the configured defines.
///
/// `process.env.NODE_ENV = "\"development\""` becomes
/// `var process = {"env":{"NODE_ENV":"development"}};`. Keys sharing a root
/// merge into one object.
pub(crate) fn define_prelude(define: &BTreeMap<String, String>) -> Result<String, BundleError> {
    let mut roots: BTreeMap<&str, Value> = BTreeMap::new();

    for (key, raw) in define {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            BundleError::Engine(format!("define `{key}`: value is not valid JSON: {e}"))
        })?;

        let segments: Vec<&str> = key.split('.').collect();
        if let Some(bad) = segments.iter().find(|s| !IDENTIFIER.is_match(s)) {
            return Err(BundleError::Engine(format!(
                "define `{key}`: `{bad}` is not an identifier"
            )));
        }

        let (&root, rest) = segments
            .split_first()
            .ok_or_else(|| BundleError::Engine("define with empty key".into()))?;
        if rest.is_empty() {
            if roots.insert(root, value).is_some() {
                return Err(conflict(key));
            }
            continue;
        }

        let mut slot = roots
            .entry(root)
            .or_insert_with(|| Value::Object(Map::new()));
        for (i, segment) in rest.iter().enumerate() {
            let Value::Object(map) = slot else {
                return Err(conflict(key));
            };
            if i + 1 == rest.len() {
                if map.insert(segment.to_string(), value.clone()).is_some() {
                    return Err(conflict(key));
                }
                break;
            }
            slot = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
    }

    Ok(roots
        .iter()
        .map(|(root, value)| format!("var {root} = {value};"))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn conflict(key: &str) -> BundleError {
    BundleError::Engine(format!("define `{key}` conflicts with another define"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(path: &str, header: &str, code: &str) -> CompiledModule {
        CompiledModule {
            path: path.into(),
            code: code.into(),
            header: header.into(),
            map: None,
            deps: Vec::new(),
        }
    }

    fn options() -> BuildOptions {
        BuildOptions {
            sourcemap: false,
            ..BuildOptions::default()
        }
    }

    #[test]
    fn test_define_prelude_nests_paths() {
        let mut define = BTreeMap::new();
        define.insert("process.env.NODE_ENV".into(), "\"development\"".into());
        define.insert("process.env.DEBUG".into(), "false".into());
        define.insert("__VERSION__".into(), "3".into());
        let prelude = define_prelude(&define).unwrap();
        assert_eq!(
            prelude,
            "var __VERSION__ = 3;\nvar process = {\"env\":{\"DEBUG\":false,\"NODE_ENV\":\"development\"}};"
        );
    }

    #[test]
    fn test_define_rejects_bad_values() {
        let mut define = BTreeMap::new();
        define.insert("a".into(), "not json".into());
        assert!(matches!(define_prelude(&define), Err(BundleError::Engine(_))));

        let mut define = BTreeMap::new();
        define.insert("a-b".into(), "1".into());
        assert!(matches!(define_prelude(&define), Err(BundleError::Engine(_))));

        let mut define = BTreeMap::new();
        define.insert("a".into(), "1".into());
        define.insert("a.b".into(), "2".into());
        assert!(matches!(define_prelude(&define), Err(BundleError::Engine(_))));
    }

    #[test]
    fn test_emit_layout() {
        let modules = vec![
            module("index.ts", "__require(\"util.ts\");", "console.log(1);\n"),
            module("util.ts", "", "exports.x = 1;"),
        ];
        let out = emit("index.ts", &modules, &["react".into()], &options()).unwrap();

        assert!(out.starts_with("(function () {\n\"use strict\";\n"));
        assert!(out.contains("var process = {\"env\":{\"NODE_ENV\":\"development\"}};"));
        assert!(out.contains(
            "__modules[\"index.ts\"] = function (module, exports) { __require(\"util.ts\");\nconsole.log(1);\n};\n"
        ));
        assert!(out.contains("__modules[\"util.ts\"] = function (module, exports) {\nexports.x = 1;\n};\n"));
        assert!(out.contains(
            "__modules[\"external:react\"] = function (module) { module.exports = React; };"
        ));
        assert!(out.ends_with("__require(\"index.ts\");\n})();\n"));

        // index before util: discovery order is kept
        let a = out.find("\"index.ts\"] =").unwrap();
        let b = out.find("\"util.ts\"] =").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_jsx_runtime_external_uses_shim() {
        let out = emit(
            "a.ts",
            &[module("a.ts", "", "")],
            &["react/jsx-runtime".into()],
            &options(),
        )
        .unwrap();
        assert!(out.contains("module.exports = __jsxRuntime(React);"));
    }

    #[test]
    fn test_external_global_must_be_a_name() {
        let mut opts = options();
        opts.externals.insert("evil".into(), "alert(1)".into());
        assert!(matches!(validate_externals(&opts), Err(BundleError::Engine(_))));
        assert!(validate_externals(&options()).is_ok());
    }

    #[test]
    fn test_minify_shrinks_and_drops_map() {
        let mut opts = options();
        opts.minify = true;
        opts.sourcemap = true;
        let modules = vec![module(
            "index.ts",
            "",
            "const message = \"hello\";\nconsole.log(message);",
        )];
        let plain = emit("index.ts", &modules, &[], &options()).unwrap();
        let minified = emit("index.ts", &modules, &[], &opts).unwrap();
        assert!(minified.len() < plain.len());
        assert!(!minified.contains("sourceMappingURL"));
        assert!(minified.contains("hello"));
    }
}
