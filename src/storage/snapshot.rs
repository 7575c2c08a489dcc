//! Line-delimited JSON snapshot file: one issue per line, the on-disk
//! source of truth, tracked in version control.
//!
//! Write discipline (§4.5): serialize to a `.tmp` sibling, `fsync` it,
//! atomically rename over the target, then `fsync` the containing
//! directory. Read discipline: blank lines and lines not starting with
//! `{` are skipped; per-line parse failures are counted as corruption and
//! do not abort the load.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::Result;
use crate::model::Issue;

pub const SNAPSHOT_FILE_NAME: &str = "issues.jsonl";

/// Result of loading a snapshot file.
pub struct LoadResult {
    pub issues: Vec<Issue>,
    pub corrupt_lines: usize,
}

/// Merge-conflict marker bytes the sync engine must refuse to read past.
pub const CONFLICT_MARKERS: [&str; 3] = ["<<<<<<<", "=======", ">>>>>>>"];

/// Load all issues from `path`. A missing file yields an empty result.
pub fn load(path: &Path) -> Result<LoadResult> {
    let Ok(file) = File::open(path) else {
        return Ok(LoadResult {
            issues: Vec::new(),
            corrupt_lines: 0,
        });
    };

    let reader = BufReader::new(file);
    let mut issues = Vec::new();
    let mut corrupt_lines = 0;

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || !trimmed.starts_with('{') {
            continue;
        }
        match serde_json::from_str::<Issue>(trimmed) {
            Ok(issue) => issues.push(issue),
            Err(err) => {
                corrupt_lines += 1;
                warn!(%err, "skipping corrupt snapshot line");
            }
        }
    }

    Ok(LoadResult {
        issues,
        corrupt_lines,
    })
}

/// Does the snapshot contain VCS merge-conflict markers anywhere?
pub fn has_conflict_markers(path: &Path) -> Result<bool> {
    let Ok(file) = File::open(path) else {
        return Ok(false);
    };
    let reader = BufReader::new(file);
    for line in reader.lines() {
        let line = line?;
        if CONFLICT_MARKERS.iter().any(|marker| line.starts_with(marker)) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Atomically write `issues` to `path` using the temp-file + rename +
/// directory-fsync discipline.
pub fn save(path: &Path, issues: &[&Issue]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp_path = tmp_path_for(path);

    {
        let mut tmp = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        for issue in issues {
            let line = serde_json::to_string(issue)?;
            tmp.write_all(line.as_bytes())?;
            tmp.write_all(b"\n")?;
        }
        tmp.sync_all()?;
    }

    fs::rename(&tmp_path, path)?;

    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }

    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let file_name = tmp
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(SNAPSHOT_FILE_NAME);
    tmp.set_file_name(format!("{file_name}.tmp"));
    tmp
}
