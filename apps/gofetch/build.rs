//! Build script for the gofetch CLI.
//!
//! Embeds the git commit hash so `gofetch --version` can report it.

use std::process::Command;

fn main() {
    let commit = git_commit();
    println!("cargo:rustc-env=GOFETCH_GIT_COMMIT={commit}");

    if let Some(root) = workspace_root() {
        println!("cargo:rerun-if-changed={root}/.git/HEAD");
    }
}

/// Returns the top-level directory of the enclosing git checkout, if any.
fn workspace_root() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!path.is_empty()).then_some(path)
}

/// Short hash of `HEAD`, or `unknown` outside a git checkout.
fn git_commit() -> String {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output();

    if let Ok(output) = output
        && output.status.success()
    {
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !hash.is_empty() {
            return hash;
        }
    }

    "unknown".to_string()
}
