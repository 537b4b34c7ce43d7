//! Project sources on disk.
//!
//! A project is either a directory (walked into a tree) or a JSON file
//! holding a saved `Project` or a flat `GeneratedProject`.

use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use jwalk::WalkDir;

use super::tree::{GeneratedProject, node_id};
use super::{FileNode, NodeKind, Project, VfsError};

/// Directory names never loaded into the tree.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "dist"];

/// Whether a path relative to a project directory is left out of the tree.
pub fn is_skipped(rel: &Path) -> bool {
    rel.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
    })
}

/// Largest file loaded as text.
const MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;

/// Load a project from a directory or JSON file.
pub fn load_project(path: &Path) -> Result<Project, VfsError> {
    if path.is_dir() {
        let structure = load_dir(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        return Ok(Project {
            id: node_id(&path.to_string_lossy()),
            name,
            description: String::new(),
            structure,
            last_saved: now_ms(),
        });
    }

    let text = std::fs::read_to_string(path).map_err(|e| VfsError::Io(path.to_path_buf(), Arc::new(e)))?;
    parse_project_json(&text).map_err(|e| VfsError::Json(path.to_path_buf(), Arc::new(e)))
}

/// Parse either a saved project or a generated file list.
pub fn parse_project_json(text: &str) -> Result<Project, serde_json::Error> {
    match serde_json::from_str::<Project>(text) {
        Ok(project) => Ok(project),
        Err(project_err) => match serde_json::from_str::<GeneratedProject>(text) {
            Ok(generated) => generated
                .into_project(now_ms())
                .map_err(serde::de::Error::custom),
            Err(_) => Err(project_err),
        },
    }
}

/// Walk a directory into a sorted tree.
///
/// Dot-files, dependency folders and non-UTF-8 or oversized files are
/// skipped. Ids are derived from the relative path so a reload keeps them.
pub fn load_dir(root: &Path) -> Result<Vec<FileNode>, VfsError> {
    if !root.is_dir() {
        return Err(VfsError::NotAFolder(root.display().to_string()));
    }

    let mut root_nodes = Vec::new();
    let walker = WalkDir::new(root)
        .skip_hidden(true)
        .sort(true)
        .process_read_dir(|_, _, _, children| {
            children.retain(|entry| match entry {
                Ok(e) => !(e.file_type().is_dir()
                    && SKIPPED_DIRS.contains(&e.file_name().to_string_lossy().as_ref())),
                Err(_) => true,
            });
        });

    for entry in walker {
        let entry = entry.map_err(|e| VfsError::Walk(e.to_string()))?;
        let full = entry.path();
        let Ok(rel) = full.strip_prefix(root) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        if rel.is_empty() {
            continue;
        }

        let node = if entry.file_type().is_dir() {
            FileNode {
                id: node_id(&rel),
                name: entry.file_name().to_string_lossy().into_owned(),
                kind: NodeKind::Folder {
                    children: Vec::new(),
                    is_open: false,
                },
                change: None,
            }
        } else {
            let too_big = entry.metadata().map(|m| m.len() > MAX_FILE_BYTES).unwrap_or(true);
            if too_big {
                crate::debug!("load"; "skipping large file: {}", rel);
                continue;
            }
            let Ok(content) = std::fs::read_to_string(&full) else {
                crate::debug!("load"; "skipping non-text file: {}", rel);
                continue;
            };
            FileNode {
                id: node_id(&rel),
                name: entry.file_name().to_string_lossy().into_owned(),
                kind: NodeKind::File {
                    content: Some(content),
                    language: None,
                },
                change: None,
            }
        };

        insert_at(&mut root_nodes, &rel, node);
    }

    Ok(root_nodes)
}

/// Insert `node` at the slash path `rel`, whose parents were inserted first.
fn insert_at(root: &mut Vec<FileNode>, rel: &str, node: FileNode) {
    let mut level = root;
    let parents = rel.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    for segment in parents.split('/').filter(|s| !s.is_empty()) {
        let Some(pos) = level.iter().position(|n| n.name == segment) else {
            return;
        };
        let Some(children) = level[pos].children_mut() else {
            return;
        };
        level = children;
    }
    level.push(node);
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::FileIndex;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_skipped() {
        assert!(is_skipped(Path::new("node_modules/react/index.js")));
        assert!(is_skipped(Path::new(".git/HEAD")));
        assert!(is_skipped(Path::new("src/.App.tsx.swp")));
        assert!(!is_skipped(Path::new("src/App.tsx")));
    }

    #[test]
    fn test_load_dir_builds_tree() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/components")).unwrap();
        fs::write(dir.path().join("index.tsx"), "root").unwrap();
        fs::write(dir.path().join("src/App.tsx"), "app").unwrap();
        fs::write(dir.path().join("src/components/Button.tsx"), "button").unwrap();

        let tree = load_dir(dir.path()).unwrap();
        let index = FileIndex::build(&tree).unwrap();
        assert_eq!(index.content("index.tsx"), Some("root"));
        assert_eq!(index.content("src/App.tsx"), Some("app"));
        assert_eq!(index.content("src/components/Button.tsx"), Some("button"));
    }

    #[test]
    fn test_load_dir_skips_hidden_and_dependencies() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/react")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("node_modules/react/index.js"), "x").unwrap();
        fs::write(dir.path().join(".git/HEAD"), "x").unwrap();
        fs::write(dir.path().join(".env"), "x").unwrap();
        fs::write(dir.path().join("App.tsx"), "app").unwrap();

        let tree = load_dir(dir.path()).unwrap();
        let index = FileIndex::build(&tree).unwrap();
        assert_eq!(index.paths().collect::<Vec<_>>(), vec!["App.tsx"]);
    }

    #[test]
    fn test_load_dir_ids_are_stable() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("App.tsx"), "one").unwrap();
        let first = load_dir(dir.path()).unwrap();
        fs::write(dir.path().join("App.tsx"), "two").unwrap();
        let second = load_dir(dir.path()).unwrap();
        assert_eq!(first[0].id, second[0].id);
    }

    #[test]
    fn test_parse_generated_project_json() {
        let json = r#"{
            "name": "counter",
            "files": [
                {"path": "src/App.tsx", "content": "export default 1"},
                {"path": "index.tsx", "content": "import './src/App'"}
            ]
        }"#;
        let project = parse_project_json(json).unwrap();
        assert_eq!(project.name, "counter");
        let index = FileIndex::build(&project.structure).unwrap();
        assert!(index.contains("src/App.tsx"));
        assert!(index.contains("index.tsx"));
    }

    #[test]
    fn test_parse_saved_project_json() {
        let json = r#"{
            "id": "p1",
            "name": "saved",
            "description": "",
            "lastSaved": 7,
            "structure": [{"id": "1", "name": "App.tsx", "type": "file", "content": "x"}]
        }"#;
        let project = parse_project_json(json).unwrap();
        assert_eq!(project.id, "p1");
        assert_eq!(project.last_saved, 7);
    }

    #[test]
    fn test_load_project_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("project.json");
        fs::write(
            &path,
            r#"{"name":"x","files":[{"path":"App.tsx","content":""}]}"#,
        )
        .unwrap();
        let project = load_project(&path).unwrap();
        assert_eq!(project.structure.len(), 1);
    }
}
