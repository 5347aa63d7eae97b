// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");

    // `built` without the git2 feature doesn't know about git: add version & dirty flag manually
    let version = git_output(&["describe", "--match", "v[0-9]*", "--tags", "HEAD"])
        .map(|v| v.trim_start_matches('v').to_string())
        .or_else(|| git_output(&["rev-parse", "--short", "HEAD"]));
    let dirty = git_output(&["diff-index", "--name-only", "HEAD", "--"]).is_some();

    let mut content = String::from("// Git information generated at build time\n");
    content.push_str(&match version {
        Some(v) => format!("pub const GIT_VERSION: Option<&'static str> = Some(\"{v}\");\n"),
        None => "pub const GIT_VERSION: Option<&'static str> = None;\n".into(),
    });
    content.push_str(if dirty {
        "pub const GIT_DIRTY: Option<bool> = Some(true);\n"
    } else {
        "pub const GIT_DIRTY: Option<bool> = None;\n"
    });

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    fs::write(Path::new(&out_dir).join("git_built.rs"), content)
        .expect("Failed to write git_built.rs");
}

/// Run a git command and return its trimmed output, if successful and not empty.
fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8(output.stdout).ok()?.trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}
