//! Minifies the preview runtimes embedded by `src/embed`.
//!
//! `host.js` is minified as is. `sandbox.js` gets `overlay.css` (minified)
//! spliced into its template-literal placeholder first.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use std::fs;
use std::path::Path;

const ASSET_DIR: &str = "src/embed/preview";

/// One runtime script and the stylesheet it inlines, if any.
struct Runtime {
    script: &'static str,
    inline_css: Option<(&'static str, &'static str)>,
    output: &'static str,
}

const RUNTIMES: &[Runtime] = &[
    Runtime {
        script: "host.js",
        inline_css: None,
        output: "host.min.js",
    },
    Runtime {
        script: "sandbox.js",
        inline_css: Some(("overlay.css", "__LIVEPACK_OVERLAY_CSS__")),
        output: "sandbox.min.js",
    },
];

fn main() {
    let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let assets = Path::new(ASSET_DIR);

    for runtime in RUNTIMES {
        let mut source = read(&assets.join(runtime.script));
        if let Some((css_file, placeholder)) = runtime.inline_css {
            let css = escape_template_literal(&minify_css(&read(&assets.join(css_file))));
            assert_eq!(
                source.matches(placeholder).count(),
                1,
                "{} must contain exactly one {}",
                runtime.script,
                placeholder
            );
            source = source.replace(placeholder, &css);
            println!("cargo:rerun-if-changed={ASSET_DIR}/{css_file}");
        }

        let output = Path::new(&out_dir).join(runtime.output);
        fs::write(&output, minify_js(&source))
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", output.display()));
        println!("cargo:rerun-if-changed={ASSET_DIR}/{}", runtime.script);
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
}

fn minify_js(source: &str) -> String {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::mjs()).parse();
    assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);

    let mut program = parsed.program;
    let minified = Minifier::new(MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    })
    .minify(&allocator, &mut program);

    Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(minified.scoping)
        .build(&program)
        .code
}

fn minify_css(source: &str) -> String {
    StyleSheet::parse(source, ParserOptions::default())
        .expect("overlay CSS parses")
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .expect("overlay CSS prints")
        .code
}

/// Escape text for use inside a JS template literal.
fn escape_template_literal(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}
