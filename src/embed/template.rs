//! HTML documents with typed placeholders.

use std::marker::PhantomData;

/// Values substituted into one document.
pub trait TemplateVars {
    fn substitute(&self, source: &str) -> String;
}

/// An embedded document that can only be rendered with its own vars type.
#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    source: &'static str,
    _vars: PhantomData<fn(&V)>,
}

impl<V> Template<V> {
    pub const fn new(source: &'static str) -> Self {
        Self {
            source,
            _vars: PhantomData,
        }
    }
}

impl<V: TemplateVars> Template<V> {
    /// Fill in every placeholder.
    pub fn render(&self, vars: &V) -> String {
        let html = vars.substitute(self.source);
        debug_assert!(
            !html.contains("__LIVEPACK_"),
            "unsubstituted placeholder in embedded document"
        );
        html
    }
}
