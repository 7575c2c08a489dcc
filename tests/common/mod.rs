//! Shared harness for end-to-end tests: spawn `br` against a scratch
//! workspace directory and capture its output.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;
use tempfile::TempDir;

pub struct BrWorkspace {
    pub dir: TempDir,
}

impl BrWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp workspace dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

pub struct RunResult {
    pub status_success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    fn from_output(output: Output) -> Self {
        Self {
            status_success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

pub fn run_br<I, S>(workspace: &BrWorkspace, args: I) -> RunResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cmd = Command::cargo_bin("br").expect("locate br binary");
    cmd.current_dir(workspace.root());
    for arg in args {
        cmd.arg(arg.as_ref());
    }
    let output = cmd.output().expect("run br");
    RunResult::from_output(output)
}

pub fn snapshot_path(workspace: &BrWorkspace) -> PathBuf {
    workspace.root().join(".beads").join("issues.jsonl")
}

pub fn wal_path(workspace: &BrWorkspace) -> PathBuf {
    workspace.root().join(".beads").join("beads.wal")
}
