//! Module graph walk.
//!
//! Breadth-first from the entry. Each wave compiles in parallel; results
//! are folded back in wave order, so discovery order (and therefore the
//! bundle) does not depend on thread scheduling.

use rayon::prelude::*;
use rustc_hash::FxHashSet;

use super::compile::{CompiledModule, compile_module};
use super::emit::emit;
use super::error::{BundleError, BundleErrors};
use super::loader::load;
use super::options::BuildOptions;
use super::resolve::{ModuleId, Resolver, find_entry};
use crate::vfs::{FileIndex, FileNode};

/// Modules reachable from the entry, in discovery order.
#[derive(Debug, Default)]
pub struct Graph {
    pub entry: String,
    pub modules: Vec<CompiledModule>,
    pub externals: Vec<String>,
}

/// Index, walk and emit `tree` in one pass.
pub fn bundle_tree(tree: &[FileNode], options: &BuildOptions) -> Result<String, BundleErrors> {
    let index = FileIndex::build(tree).map_err(BundleError::from)?;
    let graph = walk(&index, options)?;
    crate::debug!(
        "bundle";
        "{} module(s), {} external(s) from {}",
        graph.modules.len(),
        graph.externals.len(),
        graph.entry
    );
    Ok(emit(&graph.entry, &graph.modules, &graph.externals, options)?)
}

/// Compile everything reachable from the entry.
///
/// Errors from every compiled module are collected; any error fails the walk.
pub fn walk(index: &FileIndex<'_>, options: &BuildOptions) -> Result<Graph, BundleErrors> {
    let entry = find_entry(index, &options.entry_points)?;
    let resolver = Resolver::new(index, options);

    let mut seen: FxHashSet<ModuleId> = FxHashSet::default();
    seen.insert(ModuleId::Virtual(entry.clone()));

    let mut graph = Graph {
        entry: entry.clone(),
        ..Graph::default()
    };
    let mut errors = BundleErrors::default();
    let mut wave = vec![entry];

    while !wave.is_empty() {
        let results: Vec<_> = wave
            .par_iter()
            .map(|path| {
                let loaded = load(index, path).map_err(|e| vec![e])?;
                compile_module(loaded, &resolver, options)
            })
            .collect();

        let mut next = Vec::new();
        for result in results {
            match result {
                Ok(module) => {
                    for dep in &module.deps {
                        if !seen.insert(dep.clone()) {
                            continue;
                        }
                        match dep {
                            ModuleId::Virtual(path) => next.push(path.clone()),
                            ModuleId::External(specifier) => {
                                graph.externals.push(specifier.clone())
                            }
                        }
                    }
                    graph.modules.push(module);
                }
                Err(errs) => errors.extend(errs),
            }
        }
        wave = next;
    }

    if errors.is_empty() {
        Ok(graph)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(files: &[(&str, &str)]) -> Vec<FileNode> {
        files
            .iter()
            .enumerate()
            .map(|(i, (name, content))| FileNode::file(i.to_string(), *name, *content))
            .collect()
    }

    #[test]
    fn test_walk_discovery_order() {
        let nodes = tree(&[
            ("index.tsx", "import { a } from './a';\nimport { b } from './b';\nconsole.log(a, b);"),
            ("a.ts", "import { c } from './c';\nexport const a = c;"),
            ("b.ts", "export const b = 2;"),
            ("c.ts", "export const c = 3;"),
        ]);
        let index = FileIndex::build(&nodes).unwrap();
        let graph = walk(&index, &BuildOptions::default()).unwrap();
        let paths: Vec<_> = graph.modules.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["index.tsx", "a.ts", "b.ts", "c.ts"]);
        assert!(graph.externals.is_empty());
    }

    #[test]
    fn test_walk_visits_shared_and_cyclic_deps_once() {
        let nodes = tree(&[
            ("index.tsx", "import './a';\nimport './b';"),
            ("a.ts", "import './b';\nimport './index';"),
            ("b.ts", "import './a';"),
        ]);
        let index = FileIndex::build(&nodes).unwrap();
        let graph = walk(&index, &BuildOptions::default()).unwrap();
        assert_eq!(graph.modules.len(), 3);
    }

    #[test]
    fn test_walk_collects_externals() {
        let nodes = tree(&[(
            "index.tsx",
            "import React from 'react';\nimport { createRoot } from 'react-dom/client';\nconsole.log(React, createRoot);",
        )]);
        let index = FileIndex::build(&nodes).unwrap();
        let graph = walk(&index, &BuildOptions::default()).unwrap();
        assert_eq!(graph.externals, vec!["react", "react-dom/client"]);
    }

    #[test]
    fn test_walk_aggregates_errors_across_modules() {
        let nodes = tree(&[
            ("index.tsx", "import './a';\nimport './b';"),
            ("a.ts", "import './missing';"),
            ("b.ts", "const = ;"),
        ]);
        let index = FileIndex::build(&nodes).unwrap();
        let errs = walk(&index, &BuildOptions::default()).unwrap_err();
        assert!(errs.len() >= 2);
        let text = errs.to_string();
        assert!(text.contains("Could not resolve \"./missing\" from \"a.ts\""));
        assert!(text.contains("b.ts:1:"));
    }

    #[test]
    fn test_missing_entry_stops_before_compiling() {
        let nodes = tree(&[("lib.ts", "const = ;")]);
        let index = FileIndex::build(&nodes).unwrap();
        let errs = walk(&index, &BuildOptions::default()).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs.0[0], BundleError::NoEntryPoint { .. }));
    }
}
