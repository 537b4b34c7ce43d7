//! Per-module compilation.
//!
//! Scripts: inject (JSX-capable loaders) → parse → semantic → transform → codegen
//! with a source map → module-syntax rewrite. Styles, JSON and text are
//! turned into small CommonJS bodies.

use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions};
use oxc::diagnostics::OxcDiagnostic;
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{HelperLoaderMode, JsxRuntime, TransformOptions, Transformer};

use super::error::BundleError;
use super::inject::inject;
use super::loader::{Loaded, Loader};
use super::location::LineIndex;
use super::options::BuildOptions;
use super::resolve::{ModuleId, Resolver};
use super::rewrite::{Rewritten, rewrite_module};

/// A module compiled into a registry factory body.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    pub path: String,
    /// Factory body; line-aligned with `map` when present.
    pub code: String,
    /// Header statements placed on the factory's opening line.
    pub header: String,
    /// Source map of `code` as JSON.
    pub map: Option<String>,
    /// Dependencies in first-appearance order.
    pub deps: Vec<ModuleId>,
}

/// Compile one loaded module, resolving its imports with `resolver`.
pub fn compile_module(
    loaded: Loaded<'_>,
    resolver: &Resolver<'_>,
    options: &BuildOptions,
) -> Result<CompiledModule, Vec<BundleError>> {
    let path = loaded.path;
    match loaded.loader {
        Loader::Css => compile_css(path, loaded.contents, options.minify).map_err(|e| vec![e]),
        Loader::Json => compile_json(path, loaded.contents).map_err(|e| vec![e]),
        Loader::Text => Ok(plain(
            path,
            format!("module.exports = {};", json_string(loaded.contents)),
        )),
        script => {
            let source = if script.has_jsx() {
                let injected = inject(
                    loaded.contents,
                    path,
                    &options.source_attribute,
                    options.inject,
                );
                if injected.annotated > 0 {
                    crate::debug!("inject"; "{}: {} element(s)", path, injected.annotated);
                }
                injected.code
            } else {
                loaded.contents.to_string()
            };

            let transpiled = transpile(path, &source, script, options)?;
            let Rewritten {
                code,
                header,
                deps,
            } = rewrite_module(path, &transpiled.code, resolver)?;

            Ok(CompiledModule {
                path: path.to_string(),
                code,
                header,
                map: transpiled.map,
                deps,
            })
        }
    }
}

/// Output of the TypeScript/JSX transform.
#[derive(Debug, Clone)]
pub struct Transpiled {
    pub code: String,
    pub map: Option<String>,
}

/// Source type for a script loader.
fn source_type(loader: Loader) -> SourceType {
    let base = SourceType::default().with_module(true);
    match loader {
        Loader::Ts => base.with_typescript(true),
        Loader::Tsx => base.with_typescript(true).with_jsx(true),
        Loader::Jsx => base.with_jsx(true),
        // plain .js may still carry JSX in generated projects
        _ => base.with_jsx(true),
    }
}

/// Build the transform options for a target.
pub(crate) fn transform_options(options: &BuildOptions) -> Result<TransformOptions, BundleError> {
    let mut transform = TransformOptions::from_target(&options.target)
        .map_err(|e| BundleError::Engine(format!("invalid target `{}`: {e}", options.target)))?;
    transform.jsx.runtime = JsxRuntime::Automatic;
    transform.jsx.development = false;
    transform.jsx.import_source = Some(options.jsx_import_source.clone());
    // Helpers are read from the `babelHelpers` global defined by the prelude
    transform.helper_loader.mode = HelperLoaderMode::External;
    Ok(transform)
}

/// Strip types, lower JSX and syntax, and generate code with a source map.
pub fn transpile(
    path: &str,
    source: &str,
    loader: Loader,
    options: &BuildOptions,
) -> Result<Transpiled, Vec<BundleError>> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type(loader)).parse();
    if !ret.errors.is_empty() {
        return Err(diagnostics(path, source, &ret.errors));
    }
    if ret.panicked {
        return Err(vec![compile_error(path, source, 0, "unrecoverable syntax error")]);
    }

    let mut program = ret.program;
    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();

    let transform = transform_options(options).map_err(|e| vec![e])?;
    let ret = Transformer::new(&allocator, Path::new(path), &transform)
        .build_with_scoping(scoping, &mut program);
    if !ret.errors.is_empty() {
        return Err(diagnostics(path, source, &ret.errors));
    }

    let out = Codegen::new()
        .with_options(CodegenOptions {
            source_map_path: (options.sourcemap && !options.minify).then(|| PathBuf::from(path)),
            ..CodegenOptions::default()
        })
        .build(&program);

    Ok(Transpiled {
        code: out.code,
        map: out.map.map(|map| map.to_json_string()),
    })
}

fn compile_css(path: &str, source: &str, minify: bool) -> Result<CompiledModule, BundleError> {
    let parser_options = ParserOptions {
        filename: path.to_string(),
        ..ParserOptions::default()
    };
    let css = match StyleSheet::parse(source, parser_options) {
        Ok(sheet) => sheet
            .to_css(PrinterOptions {
                minify,
                ..PrinterOptions::default()
            })
            .map(|out| out.code)
            .map_err(|e| BundleError::Compile {
                path: path.to_string(),
                line: 1,
                column: 1,
                message: e.kind.to_string(),
            })?,
        Err(e) => {
            let (line, column) = e
                .loc
                .as_ref()
                .map(|loc| (loc.line as usize + 1, loc.column as usize))
                .unwrap_or((1, 1));
            return Err(BundleError::Compile {
                path: path.to_string(),
                line,
                column,
                message: e.kind.to_string(),
            });
        }
    };

    Ok(plain(
        path,
        format!(
            "__injectStyle({}, {});",
            json_string(path),
            json_string(&css)
        ),
    ))
}

fn compile_json(path: &str, source: &str) -> Result<CompiledModule, BundleError> {
    let value: serde_json::Value =
        serde_json::from_str(source).map_err(|e| BundleError::Compile {
            path: path.to_string(),
            line: e.line().max(1),
            column: e.column().max(1),
            message: e.to_string(),
        })?;
    let body = serde_json::to_string(&value).map_err(|e| BundleError::Internal(e.to_string()))?;
    Ok(plain(path, format!("module.exports = {body};")))
}

/// A module with no dependencies and no source map.
fn plain(path: &str, code: String) -> CompiledModule {
    CompiledModule {
        path: path.to_string(),
        code,
        header: String::new(),
        map: None,
        deps: Vec::new(),
    }
}

pub(crate) fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn diagnostics(path: &str, source: &str, errors: &[OxcDiagnostic]) -> Vec<BundleError> {
    errors
        .iter()
        .map(|diag| {
            let offset = diag
                .labels
                .as_ref()
                .and_then(|labels| labels.first())
                .map(|label| label.offset())
                .unwrap_or(0);
            compile_error(path, source, offset, &diag.message)
        })
        .collect()
}

fn compile_error(path: &str, source: &str, offset: usize, message: &str) -> BundleError {
    let (line, column) = LineIndex::new(source).position(offset);
    BundleError::Compile {
        path: path.to_string(),
        line,
        column,
        message: message.to_string(),
    }
}
