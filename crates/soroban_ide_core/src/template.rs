//! Project templates used to seed a new workspace.
//!
//! Supports simple variable substitution using `{{variable}}` syntax.

use indexmap::IndexMap;

use crate::error::Result;
use crate::workspace::{NodeKind, Workspace, path};

/// Available template variables and their descriptions
pub const TEMPLATE_VARIABLES: &[(&str, &str)] =
    &[("project_name", "Name of the project directory and crate")];

/// Name of the built-in starter template
pub const DEFAULT_TEMPLATE: &str = "hello_world";

/// One file of a project template, relative to the project directory.
#[derive(Debug, Clone, Copy)]
pub struct TemplateFile {
    /// Relative path using `/` separators
    pub path: &'static str,
    /// Raw content (before variable substitution)
    pub raw_content: &'static str,
}

/// A built-in project layout.
#[derive(Debug, Clone, Copy)]
pub struct ProjectTemplate {
    /// Template name
    pub name: &'static str,
    /// Short human-readable description
    pub description: &'static str,
    files: &'static [TemplateFile],
}

const HELLO_WORLD_FILES: &[TemplateFile] = &[
    TemplateFile {
        path: "Cargo.toml",
        raw_content: include_str!("../templates/hello_world/Cargo.toml.tpl"),
    },
    TemplateFile {
        path: "src/lib.rs",
        raw_content: include_str!("../templates/hello_world/lib.rs.tpl"),
    },
];

const BUILTIN_TEMPLATES: &[ProjectTemplate] = &[ProjectTemplate {
    name: DEFAULT_TEMPLATE,
    description: "A sample Hello World smart contract for Soroban",
    files: HELLO_WORLD_FILES,
}];

impl ProjectTemplate {
    /// The starter contract project.
    pub fn hello_world() -> Self {
        BUILTIN_TEMPLATES[0]
    }

    /// Look up a built-in template by name.
    pub fn builtin(name: &str) -> Option<Self> {
        BUILTIN_TEMPLATES.iter().copied().find(|t| t.name == name)
    }

    /// Names of all built-in templates.
    pub fn builtin_names() -> Vec<&'static str> {
        BUILTIN_TEMPLATES.iter().map(|t| t.name).collect()
    }

    /// Files of the template, relative to the project root.
    pub fn files(&self) -> &'static [TemplateFile] {
        self.files
    }

    /// Build a workspace holding this template under `project_name`.
    ///
    /// The project's `Cargo.toml` is opened as the active file, falling back
    /// to `lib.rs` when the template has no manifest.
    pub fn instantiate(&self, project_name: &str) -> Result<Workspace> {
        let mut vars = IndexMap::new();
        vars.insert("project_name", project_name.to_string());

        let mut ws = Workspace::new().create("", project_name, NodeKind::Directory)?;
        for file in self.files {
            let mut parent = project_name.to_string();
            let (dirs, name) = match file.path.rsplit_once('/') {
                Some((dirs, name)) => (Some(dirs), name),
                None => (None, file.path),
            };
            for dir in dirs.into_iter().flat_map(|d| d.split('/')) {
                let dir_path = path::join(&parent, dir);
                if !ws.contains(&dir_path) {
                    ws = ws.create(&parent, dir, NodeKind::Directory)?;
                }
                parent = dir_path;
            }
            ws = ws.create(&parent, name, NodeKind::File)?;
            ws = ws.set_content(&path::join(&parent, name), &render(file.raw_content, &vars))?;
        }

        let initial = ws
            .find_first_file("Cargo.toml")
            .or_else(|| ws.find_first_file("lib.rs"))
            .map(|n| n.path().to_string());
        match initial {
            Some(initial) => ws.open(&initial),
            None => Ok(ws),
        }
    }
}

/// Substitute `{{variable}}` placeholders. Unknown placeholders are kept.
pub fn render(content: &str, vars: &IndexMap<&str, String>) -> String {
    let mut result = content.to_string();
    for (var, value) in vars {
        let pattern = format!("{{{{{}}}}}", var);
        result = result.replace(&pattern, value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_world_layout() {
        let ws = ProjectTemplate::hello_world()
            .instantiate("hello_world")
            .unwrap();

        let files: Vec<_> = ws.file_map().into_keys().collect();
        assert_eq!(files, ["hello_world/Cargo.toml", "hello_world/src/lib.rs"]);
        assert_eq!(ws.active_file(), Some("hello_world/Cargo.toml"));
        assert!(ws.active_content().contains("name = \"hello_world\""));
    }

    #[test]
    fn test_project_name_is_substituted() {
        let ws = ProjectTemplate::hello_world().instantiate("counter").unwrap();
        let manifest = ws.select("counter/Cargo.toml").unwrap();
        assert!(manifest.content().unwrap().contains("name = \"counter\""));
        assert!(!manifest.content().unwrap().contains("{{project_name}}"));
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let mut vars = IndexMap::new();
        vars.insert("project_name", "x".to_string());
        assert_eq!(render("{{project_name}} {{other}}", &vars), "x {{other}}");
    }

    #[test]
    fn test_invalid_project_name() {
        assert!(ProjectTemplate::hello_world().instantiate("a/b").is_err());
        assert!(ProjectTemplate::builtin("missing").is_none());
        assert_eq!(ProjectTemplate::builtin_names(), ["hello_world"]);
    }
}
