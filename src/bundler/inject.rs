//! Source-location injection for JSX markup.
//!
//! Every intrinsic opening element (`<div>`, `<my-widget>`) gets
//! `data-source-loc="<path>:<line>:<col>"` right after its tag name.
//! Components, member tags and fragments are left alone so no unknown
//! prop reaches user components.
//!
//! Positions come from AST spans over the original text, so they are
//! exact. The `pattern` strategy is a regex scan kept for sources the
//! parser rejects: it cannot tell `a <b` or generic parameters from tags.

use std::sync::LazyLock;

use oxc::allocator::Allocator;
use oxc::ast::ast::{JSXAttributeItem, JSXAttributeName, JSXElementName, JSXOpeningElement};
use oxc::ast_visit::{Visit, walk};
use oxc::parser::Parser;
use oxc::span::SourceType;
use regex::Regex;

use super::location::{LineIndex, SourceLocation};
use crate::config::InjectStrategy;

/// Result of one injection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injected {
    pub code: String,
    /// Number of elements annotated.
    pub annotated: usize,
    /// The source did not parse and was returned unchanged.
    pub fallback: bool,
}

impl Injected {
    fn unchanged(source: &str, fallback: bool) -> Self {
        Self {
            code: source.to_string(),
            annotated: 0,
            fallback,
        }
    }
}

/// Annotate intrinsic JSX elements in `source` with their location.
pub fn inject(source: &str, path: &str, attribute: &str, strategy: InjectStrategy) -> Injected {
    match strategy {
        InjectStrategy::Off => Injected::unchanged(source, false),
        InjectStrategy::Ast => inject_ast(source, path, attribute),
        InjectStrategy::Pattern => inject_pattern(source, path, attribute),
    }
}

/// Source type for a JSX-bearing path.
pub(crate) fn jsx_source_type(path: &str) -> SourceType {
    let typescript = path.ends_with(".tsx") || path.ends_with(".ts");
    SourceType::default()
        .with_module(true)
        .with_typescript(typescript)
        .with_jsx(true)
}

fn inject_ast(source: &str, path: &str, attribute: &str) -> Injected {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, jsx_source_type(path)).parse();
    if ret.panicked || !ret.errors.is_empty() {
        crate::debug!("inject"; "{}: parse failed, passing through", path);
        return Injected::unchanged(source, true);
    }

    let lines = LineIndex::new(source);
    let mut collector = TagCollector {
        attribute,
        path,
        lines: &lines,
        insertions: Vec::new(),
    };
    collector.visit_program(&ret.program);

    let annotated = collector.insertions.len();
    Injected {
        code: splice(source, collector.insertions),
        annotated,
        fallback: false,
    }
}

struct TagCollector<'c> {
    attribute: &'c str,
    path: &'c str,
    lines: &'c LineIndex<'c>,
    /// (byte offset, text) pairs.
    insertions: Vec<(usize, String)>,
}

impl<'a> Visit<'a> for TagCollector<'_> {
    fn visit_jsx_opening_element(&mut self, it: &JSXOpeningElement<'a>) {
        if let JSXElementName::Identifier(id) = &it.name
            && is_intrinsic(id.name.as_str())
            && !has_attribute(it, self.attribute)
        {
            let (line, column) = self.lines.position(it.span.start as usize);
            let loc = SourceLocation::new(self.path, line, column);
            self.insertions
                .push((id.span.end as usize, render_attribute(self.attribute, &loc)));
        }
        walk::walk_jsx_opening_element(self, it);
    }
}

fn is_intrinsic(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_lowercase()) || name.contains('-')
}

fn has_attribute(element: &JSXOpeningElement<'_>, attribute: &str) -> bool {
    element.attributes.iter().any(|item| match item {
        JSXAttributeItem::Attribute(attr) => match &attr.name {
            JSXAttributeName::Identifier(name) => name.name.as_str() == attribute,
            JSXAttributeName::NamespacedName(_) => false,
        },
        JSXAttributeItem::SpreadAttribute(_) => false,
    })
}

fn render_attribute(attribute: &str, loc: &SourceLocation) -> String {
    let value = loc.to_string().replace('&', "&amp;").replace('"', "&quot;");
    format!(" {attribute}=\"{value}\"")
}

/// Apply insertions back to front so earlier offsets stay valid.
fn splice(source: &str, mut insertions: Vec<(usize, String)>) -> String {
    insertions.sort_by(|a, b| b.0.cmp(&a.0));
    let mut out = source.to_string();
    for (offset, text) in insertions {
        out.insert_str(offset, &text);
    }
    out
}

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([a-z][A-Za-z0-9]*(?:-[A-Za-z0-9]+)*)[\s/>]").expect("tag pattern is valid")
});

fn inject_pattern(source: &str, path: &str, attribute: &str) -> Injected {
    let lines = LineIndex::new(source);
    let mut insertions = Vec::new();

    for caps in TAG_PATTERN.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // `a<b` is a comparison, not a tag
        let prev = source[..whole.start()].chars().next_back();
        if prev.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == ')') {
            continue;
        }
        let tag_rest = &source[name.end()..];
        let tag_end = tag_rest.find('>').unwrap_or(tag_rest.len());
        if tag_rest[..tag_end].contains(&format!("{attribute}=")) {
            continue;
        }
        let (line, column) = lines.position(whole.start());
        let loc = SourceLocation::new(path, line, column);
        insertions.push((name.end(), render_attribute(attribute, &loc)));
    }

    let annotated = insertions.len();
    Injected {
        code: splice(source, insertions),
        annotated,
        fallback: false,
    }
}
