//! Loading contract projects from disk and writing templates to disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use soroban_ide_core::template::ProjectTemplate;
use soroban_ide_core::workspace::{Node, Workspace};
use soroban_ide_core::{IdeError, Result};

use crate::cli::CliContext;

/// Directories never sent to the build server.
const SKIPPED_DIRS: &[&str] = &["target", "node_modules"];

/// Load `dir` as a workspace whose single root is the project directory.
pub fn load_project(dir: &Path) -> Result<Workspace> {
    let dir = dir.canonicalize()?;
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| IdeError::InvalidName(dir.display().to_string()))?
        .to_string();
    let children = read_children(&dir)?;
    Workspace::from_nodes(vec![Node::directory(name, children)])
}

fn read_children(dir: &Path) -> Result<Vec<Node>> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());

    let mut nodes = Vec::new();
    for entry in entries {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            if SKIPPED_DIRS.contains(&name.as_str()) {
                continue;
            }
            nodes.push(Node::directory(name, read_children(&path)?));
        } else {
            match fs::read_to_string(&path) {
                Ok(content) => nodes.push(Node::file(name, content)),
                Err(e) => log::warn!("[CLI] skipping {}: {}", path.display(), e),
            }
        }
    }
    Ok(nodes)
}

/// Write every node of `ws` below `dest`.
pub fn write_project(ws: &Workspace, dest: &Path) -> Result<()> {
    for node in ws.walk() {
        let target: PathBuf = dest.join(node.path());
        match node.content() {
            Some(content) => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, content).map_err(|source| IdeError::FileWrite {
                    path: target.clone(),
                    source,
                })?;
            }
            None => fs::create_dir_all(&target)?,
        }
    }
    Ok(())
}

/// Render the tree with box-drawing guides.
pub fn format_tree(ws: &Workspace) -> String {
    fn render(nodes: &[Arc<Node>], prefix: &str, out: &mut String) {
        for (i, node) in nodes.iter().enumerate() {
            let last = i + 1 == nodes.len();
            let branch = if last { "└── " } else { "├── " };
            let suffix = if node.is_dir() { "/" } else { "" };
            out.push_str(&format!("{prefix}{branch}{}{suffix}\n", node.name()));
            if let Some(children) = node.children() {
                let guide = if last { "    " } else { "│   " };
                render(children, &format!("{prefix}{guide}"), out);
            }
        }
    }

    let mut out = String::new();
    for root in ws.roots() {
        out.push_str(&format!("{}/\n", root.name()));
        if let Some(children) = root.children() {
            render(children, "", &mut out);
        }
    }
    out
}

pub fn handle_new(ctx: &CliContext, name: &str, template: Option<String>, dest: PathBuf) -> bool {
    let template_name = template.unwrap_or_else(|| ctx.config.default_template.clone());
    let Some(template) = ProjectTemplate::builtin(&template_name) else {
        eprintln!("✗ Unknown template '{}'", template_name);
        eprintln!("  Available: {}", ProjectTemplate::builtin_names().join(", "));
        return false;
    };

    if dest.join(name).exists() {
        eprintln!("✗ {} already exists", dest.join(name).display());
        return false;
    }

    let ws = match template.instantiate(name) {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    if let Err(e) = write_project(&ws, &dest) {
        eprintln!("✗ {}", e);
        return false;
    }

    println!("✓ Created {} from template '{}'", dest.join(name).display(), template.name);
    print!("{}", format_tree(&ws));
    true
}

pub fn handle_tree(dir: &Path) -> bool {
    match load_project(dir) {
        Ok(ws) => {
            print!("{}", format_tree(&ws));
            println!("{} files", ws.file_map().len());
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_ide_core::workspace::NodeKind;

    #[test]
    fn test_new_project_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let ws = ProjectTemplate::hello_world().instantiate("hello").unwrap();
        write_project(&ws, dir.path()).unwrap();

        let loaded = load_project(&dir.path().join("hello")).unwrap();
        assert_eq!(loaded.file_map(), ws.file_map());
    }

    #[test]
    fn test_load_skips_hidden_and_target() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(root.join("target/release")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/lib.rs"), "#![no_std]").unwrap();
        fs::write(root.join(".env"), "SECRET=1").unwrap();

        let ws = load_project(&root).unwrap();
        let paths: Vec<_> = ws.walk().iter().map(|n| n.path().to_string()).collect();
        assert_eq!(paths, ["proj", "proj/src", "proj/src/lib.rs"]);
    }

    #[test]
    fn test_format_tree() {
        let ws = Workspace::new()
            .create("", "proj", NodeKind::Directory)
            .unwrap()
            .create("proj", "src", NodeKind::Directory)
            .unwrap()
            .create("proj/src", "lib.rs", NodeKind::File)
            .unwrap()
            .create("proj", "Cargo.toml", NodeKind::File)
            .unwrap();
        assert_eq!(
            format_tree(&ws),
            "proj/\n├── src/\n│   └── lib.rs\n└── Cargo.toml\n"
        );
    }
}
