//! Shared fixtures for unit tests.

use crate::workspace::{Node, Workspace};

pub const SAMPLE_MANIFEST: &str = "[package]\nname = \"hello_world\"\n";
pub const SAMPLE_LIB: &str = "#![no_std]\nuse soroban_sdk::contract;\n";

/// `hello_world/{Cargo.toml, src/lib.rs}` with nothing open.
pub fn sample_workspace() -> Workspace {
    Workspace::from_nodes(vec![Node::directory(
        "hello_world",
        vec![
            Node::file("Cargo.toml", SAMPLE_MANIFEST),
            Node::directory("src", vec![Node::file("lib.rs", SAMPLE_LIB)]),
        ],
    )])
    .expect("sample workspace is valid")
}
