//! Property tests for the workspace tree engine

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use soroban_ide_core::workspace::{Node, NodeKind, Workspace, path};

#[derive(Debug, Clone)]
enum Op {
    Create { parent: usize, name: String, dir: bool },
    Delete { target: usize },
    Rename { target: usize, name: String },
    Open { target: usize },
    Edit { text: String },
    CloseActive,
}

fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => prop::sample::select(vec!["src", "lib.rs", "Cargo.toml", "a", "b"]).prop_map(String::from),
        1 => prop::sample::select(vec!["", "a/b", ".."]).prop_map(String::from),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<usize>(), name_strategy(), any::<bool>())
            .prop_map(|(parent, name, dir)| Op::Create { parent, name, dir }),
        1 => any::<usize>().prop_map(|target| Op::Delete { target }),
        2 => (any::<usize>(), name_strategy()).prop_map(|(target, name)| Op::Rename { target, name }),
        2 => any::<usize>().prop_map(|target| Op::Open { target }),
        1 => "[a-z ]{0,12}".prop_map(|text| Op::Edit { text }),
        1 => Just(Op::CloseActive),
    ]
}

/// Pick an existing path by index; index 0 of `with_root` is the root ("").
fn pick(ws: &Workspace, index: usize, with_root: bool) -> String {
    let mut paths: Vec<String> = ws.walk().iter().map(|n| n.path().to_string()).collect();
    if with_root {
        paths.insert(0, String::new());
    }
    if paths.is_empty() {
        return "missing".to_string();
    }
    paths[index % paths.len()].clone()
}

fn step(ws: &Workspace, op: &Op) -> Result<Workspace, soroban_ide_core::IdeError> {
    match op {
        Op::Create { parent, name, dir } => {
            let kind = if *dir { NodeKind::Directory } else { NodeKind::File };
            ws.create(&pick(ws, *parent, true), name, kind)
        }
        Op::Delete { target } => ws.delete(&pick(ws, *target, false)),
        Op::Rename { target, name } => ws.rename(&pick(ws, *target, false), name),
        Op::Open { target } => ws.open(&pick(ws, *target, false)),
        Op::Edit { text } => ws.edit_active(text),
        Op::CloseActive => Ok(ws.close_active()),
    }
}

fn check_level(nodes: &[Arc<Node>], parent: &str) {
    let mut names = HashSet::new();
    for node in nodes {
        assert!(names.insert(node.name()), "duplicate sibling {}", node.path());
        assert_eq!(node.path(), path::join(parent, node.name()));
        if let Some(children) = node.children() {
            check_level(children, node.path());
        }
    }
}

fn check_invariants(ws: &Workspace) {
    check_level(ws.roots(), "");

    let paths: Vec<&str> = ws.walk().iter().map(|n| n.path()).collect();
    let unique: HashSet<&str> = paths.iter().copied().collect();
    assert_eq!(paths.len(), unique.len());
    assert_eq!(ws.len(), paths.len());

    if let Some(active) = ws.active_file() {
        let node = ws.select(active).expect("active file must exist");
        assert!(node.is_file());
    }
}

proptest! {
    /// Every reachable tree keeps unique, name-derived paths and a valid
    /// active file; a rejected operation leaves the snapshot untouched.
    #[test]
    fn operations_preserve_tree_invariants(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut ws = Workspace::new();
        for op in &ops {
            let before = ws.clone();
            match step(&ws, op) {
                Ok(next) => ws = next,
                Err(_) => prop_assert_eq!(&ws, &before),
            }
            check_invariants(&ws);
        }
    }

    /// Renaming a directory moves every descendant path with it.
    #[test]
    fn rename_rebases_descendants(new_name in "[a-z]{1,8}") {
        prop_assume!(new_name != "proj");
        let ws = Workspace::new()
            .create("", "proj", NodeKind::Directory).unwrap()
            .create("proj", "src", NodeKind::Directory).unwrap()
            .create("proj/src", "lib.rs", NodeKind::File).unwrap()
            .open("proj/src/lib.rs").unwrap();

        let renamed = ws.rename("proj", &new_name).unwrap();
        let expected = format!("{new_name}/src/lib.rs");
        prop_assert!(renamed.contains(&expected));
        prop_assert!(!renamed.contains("proj/src/lib.rs"));
        prop_assert_eq!(renamed.active_file(), Some(expected.as_str()));
    }
}

#[test]
fn untouched_subtrees_are_shared() {
    let ws = Workspace::new()
        .create("", "left", NodeKind::Directory)
        .unwrap()
        .create("left", "a.rs", NodeKind::File)
        .unwrap()
        .create("", "right", NodeKind::Directory)
        .unwrap();

    let next = ws.create("right", "b.rs", NodeKind::File).unwrap();
    let left_before = ws.select("left").unwrap();
    let left_after = next.select("left").unwrap();
    assert!(Arc::ptr_eq(left_before, left_after));
    assert!(!Arc::ptr_eq(
        ws.select("right").unwrap(),
        next.select("right").unwrap()
    ));
}

#[test]
fn deleting_ancestor_closes_active_file() {
    let ws = Workspace::new()
        .create("", "proj", NodeKind::Directory)
        .unwrap()
        .create("proj", "lib.rs", NodeKind::File)
        .unwrap()
        .open("proj/lib.rs")
        .unwrap();

    let deleted = ws.delete("proj").unwrap();
    assert!(deleted.is_empty());
    assert_eq!(deleted.active_file(), None);
    assert_eq!(ws.active_file(), Some("proj/lib.rs"));
}
