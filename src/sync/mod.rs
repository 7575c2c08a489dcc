//! Sync engine: reconciles the in-memory issue store with the on-disk
//! snapshot file.
//!
//! Five modes, per the workspace's `sync.auto_flush`/`sync.auto_import`
//! toggles and the `br sync` command's explicit mode flag:
//!
//! - [`SyncMode::FlushOnly`] exports the live store to the snapshot.
//! - [`SyncMode::ImportOnly`] adopts newer snapshot records into the store.
//! - [`SyncMode::Bidirectional`] (default) flushes only if something is
//!   dirty; otherwise it is a no-op, since the snapshot is the
//!   cross-machine source of truth and an unconditional import would
//!   overwrite unread remote changes.
//! - [`SyncMode::Merge`] performs a 3-way reconciliation between the
//!   snapshot ("remote") and the store ("local"), then re-exports.
//! - [`SyncMode::Status`] reports counts without mutating anything.
//!
//! Every mode but `status` refuses to run if the snapshot contains VCS
//! merge-conflict markers, to avoid trampling an in-progress resolution.

use std::collections::HashSet;
use std::fs;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{BeadsError, Result};
use crate::model::{Issue, IssueType, Priority, Status};
use crate::storage::snapshot;
use crate::workspace::{Workspace, CURRENT_SCHEMA_VERSION};

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Reconciliation strategy for a single `sync` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    FlushOnly,
    ImportOnly,
    #[default]
    Bidirectional,
    Merge,
    Status,
}

impl SyncMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FlushOnly => "flush_only",
            Self::ImportOnly => "import_only",
            Self::Bidirectional => "bidirectional",
            Self::Merge => "merge",
            Self::Status => "status",
        }
    }
}

/// How a single unparseable snapshot line is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// A single corrupt line aborts the whole operation.
    Strict,
    /// Corrupt lines are logged and skipped; the operation still succeeds.
    #[default]
    BestEffort,
    /// Corrupt lines are skipped without comment.
    Partial,
}

/// How a dependency edge referencing an unknown id is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// An edge to an unknown id is an error.
    #[default]
    Strict,
    /// An unknown target is resurrected as a placeholder tombstone issue.
    Resurrect,
    /// The dangling edge is dropped silently.
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub error_policy: ErrorPolicy,
    pub orphan_policy: OrphanPolicy,
    /// Write a `manifest.json` sidecar alongside any flush this run performs.
    pub write_manifest: bool,
}

/// Sidecar JSON written next to a flush when `write_manifest` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub exported_at: chrono::DateTime<Utc>,
    pub issue_count: usize,
    pub schema_version: u32,
}

/// Outcome of a sync run. Fields not meaningful to the mode that ran are
/// left at their default.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub mode: String,
    pub inserted: usize,
    pub updated: usize,
    pub skipped_corrupt: usize,
    pub store_count: usize,
    pub snapshot_count: usize,
    pub pending_export: usize,
    pub flushed: bool,
}

/// Run one sync mode against an open workspace.
pub fn run(workspace: &mut Workspace, mode: SyncMode, options: &SyncOptions) -> Result<SyncReport> {
    if mode != SyncMode::Status {
        let snapshot_path = workspace.paths().snapshot.clone();
        if snapshot::has_conflict_markers(&snapshot_path)? {
            return Err(BeadsError::MergeConflictDetected { path: snapshot_path });
        }
    }

    match mode {
        SyncMode::FlushOnly => flush_only(workspace, options),
        SyncMode::ImportOnly => import_only(workspace, options),
        SyncMode::Bidirectional => bidirectional(workspace, options),
        SyncMode::Merge => merge(workspace, options),
        SyncMode::Status => status(workspace),
    }
}

fn flush_only(workspace: &mut Workspace, options: &SyncOptions) -> Result<SyncReport> {
    let count = workspace.store().len();
    workspace.flush()?;
    if options.write_manifest {
        write_manifest(workspace, count)?;
    }
    info!(count, "flush_only sync completed");
    Ok(SyncReport {
        mode: SyncMode::FlushOnly.as_str().to_string(),
        store_count: count,
        snapshot_count: count,
        flushed: true,
        ..Default::default()
    })
}

fn import_only(workspace: &mut Workspace, options: &SyncOptions) -> Result<SyncReport> {
    let snapshot_path = workspace.paths().snapshot.clone();
    let loaded = snapshot::load(&snapshot_path)?;
    if loaded.corrupt_lines > 0 && options.error_policy == ErrorPolicy::Strict {
        return Err(BeadsError::SnapshotParseError {
            reason: format!("{} corrupt line(s) in snapshot", loaded.corrupt_lines),
        });
    }
    let snapshot_count = loaded.issues.len();

    let mut known_ids: HashSet<String> = workspace.store().known_ids().into_iter().collect();
    known_ids.extend(loaded.issues.iter().map(|i| i.id.clone()));

    let mut inserted = 0;
    let mut updated = 0;
    let mut placeholders = Vec::new();

    for mut incoming in loaded.issues {
        let is_new = !workspace.store().exists(&incoming.id);
        if !is_new {
            let existing = workspace
                .store()
                .get(&incoming.id)
                .expect("existence just checked");
            if incoming.updated_at <= existing.updated_at {
                continue;
            }
        }

        match reconcile_dependencies(&mut incoming, &mut known_ids, options.orphan_policy) {
            Ok(mut new_placeholders) => placeholders.append(&mut new_placeholders),
            Err(err) if options.error_policy == ErrorPolicy::Strict => return Err(err),
            Err(err) => {
                warn!(id = %incoming.id, %err, "skipping issue with orphan dependency during import");
                continue;
            }
        }

        incoming.dirty = false;
        workspace.store().replace_issue(incoming);
        if is_new {
            inserted += 1;
        } else {
            updated += 1;
        }
    }

    adopt_placeholders(workspace, placeholders);

    info!(inserted, updated, "import_only sync completed");
    Ok(SyncReport {
        mode: SyncMode::ImportOnly.as_str().to_string(),
        inserted,
        updated,
        skipped_corrupt: loaded.corrupt_lines,
        store_count: workspace.store().len(),
        snapshot_count,
        ..Default::default()
    })
}

fn bidirectional(workspace: &mut Workspace, options: &SyncOptions) -> Result<SyncReport> {
    let dirty_count = workspace.store().get_dirty_ids().len();
    if dirty_count == 0 {
        let snapshot_path = workspace.paths().snapshot.clone();
        let snapshot_count = snapshot::load(&snapshot_path)?.issues.len();
        return Ok(SyncReport {
            mode: SyncMode::Bidirectional.as_str().to_string(),
            store_count: workspace.store().len(),
            snapshot_count,
            ..Default::default()
        });
    }

    let count = workspace.store().len();
    workspace.flush()?;
    if options.write_manifest {
        write_manifest(workspace, count)?;
    }
    info!(count, "bidirectional sync flushed dirty issues");
    Ok(SyncReport {
        mode: SyncMode::Bidirectional.as_str().to_string(),
        store_count: count,
        snapshot_count: count,
        flushed: true,
        ..Default::default()
    })
}

fn merge(workspace: &mut Workspace, options: &SyncOptions) -> Result<SyncReport> {
    let snapshot_path = workspace.paths().snapshot.clone();
    let loaded = snapshot::load(&snapshot_path)?;
    if loaded.corrupt_lines > 0 && options.error_policy == ErrorPolicy::Strict {
        return Err(BeadsError::SnapshotParseError {
            reason: format!("{} corrupt line(s) in snapshot", loaded.corrupt_lines),
        });
    }

    let mut known_ids: HashSet<String> = workspace.store().known_ids().into_iter().collect();
    known_ids.extend(loaded.issues.iter().map(|i| i.id.clone()));

    let mut inserted = 0;
    let mut updated = 0;
    let mut placeholders = Vec::new();

    for mut remote in loaded.issues {
        let local = workspace.store().get(&remote.id).cloned();
        let remote_wins = local
            .as_ref()
            .is_none_or(|local| remote.updated_at > local.updated_at);
        if !remote_wins {
            continue;
        }

        match reconcile_dependencies(&mut remote, &mut known_ids, options.orphan_policy) {
            Ok(mut new_placeholders) => placeholders.append(&mut new_placeholders),
            Err(err) if options.error_policy == ErrorPolicy::Strict => return Err(err),
            Err(err) => {
                warn!(id = %remote.id, %err, "skipping remote issue with orphan dependency during merge");
                continue;
            }
        }

        remote.dirty = true;
        let was_new = local.is_none();
        workspace.store().replace_issue(remote);
        if was_new {
            inserted += 1;
        } else {
            updated += 1;
        }
    }
    // ids present only locally are left untouched; they re-export below
    // along with everything the merge brought in.

    adopt_placeholders(workspace, placeholders);

    let count = workspace.store().len();
    workspace.flush()?;
    if options.write_manifest {
        write_manifest(workspace, count)?;
    }
    info!(inserted, updated, "merge sync completed and re-exported");
    Ok(SyncReport {
        mode: SyncMode::Merge.as_str().to_string(),
        inserted,
        updated,
        skipped_corrupt: loaded.corrupt_lines,
        store_count: count,
        snapshot_count: count,
        flushed: true,
    })
}

fn status(workspace: &mut Workspace) -> Result<SyncReport> {
    let snapshot_path = workspace.paths().snapshot.clone();
    let loaded = snapshot::load(&snapshot_path)?;
    let pending_export = workspace.store().get_dirty_ids().len();
    Ok(SyncReport {
        mode: SyncMode::Status.as_str().to_string(),
        store_count: workspace.store().len(),
        snapshot_count: loaded.issues.len(),
        skipped_corrupt: loaded.corrupt_lines,
        pending_export,
        ..Default::default()
    })
}

/// Apply `policy` to `issue`'s dependency edges, relative to `known_ids`
/// (mutated in place as placeholders are decided on, so repeated orphan
/// targets across issues in the same run only resurrect once). Returns any
/// placeholder tombstone issues that must be inserted for `Resurrect`.
fn reconcile_dependencies(
    issue: &mut Issue,
    known_ids: &mut HashSet<String>,
    policy: OrphanPolicy,
) -> Result<Vec<Issue>> {
    match policy {
        OrphanPolicy::Strict => {
            for dep in &issue.dependencies {
                if !known_ids.contains(&dep.depends_on_id) {
                    return Err(BeadsError::DependencyNotFound {
                        id: dep.depends_on_id.clone(),
                    });
                }
            }
            Ok(Vec::new())
        }
        OrphanPolicy::Skip => {
            issue
                .dependencies
                .retain(|dep| known_ids.contains(&dep.depends_on_id));
            Ok(Vec::new())
        }
        OrphanPolicy::Resurrect => {
            let mut placeholders = Vec::new();
            for dep in &issue.dependencies {
                if known_ids.insert(dep.depends_on_id.clone()) {
                    placeholders.push(placeholder_tombstone(&dep.depends_on_id));
                }
            }
            Ok(placeholders)
        }
    }
}

fn placeholder_tombstone(id: &str) -> Issue {
    let now = Utc::now();
    let mut issue = Issue::new(
        id.to_string(),
        format!("Resurrected placeholder for missing dependency target {id}"),
        IssueType::Task,
        Priority::MEDIUM,
        None,
        now,
    );
    issue.status = Status::Tombstone;
    issue.closed_at = Some(now);
    issue.dirty = true;
    issue
}

fn adopt_placeholders(workspace: &mut Workspace, placeholders: Vec<Issue>) {
    for placeholder in placeholders {
        if !workspace.store().exists(&placeholder.id) {
            workspace.store().replace_issue(placeholder);
        }
    }
}

fn write_manifest(workspace: &Workspace, issue_count: usize) -> Result<()> {
    let manifest = Manifest {
        exported_at: Utc::now(),
        issue_count,
        schema_version: CURRENT_SCHEMA_VERSION,
    };
    let path = workspace.paths().root.join(MANIFEST_FILE_NAME);
    fs::write(path, serde_json::to_string_pretty(&manifest)?)?;
    Ok(())
}

/// Flush the workspace if dirty and `sync.auto_flush` is enabled, for use at
/// the end of mutating CLI commands. No-op otherwise.
pub fn auto_flush(workspace: &mut Workspace) -> Result<()> {
    if !workspace.config().sync.auto_flush {
        return Ok(());
    }
    if workspace.store().get_dirty_ids().is_empty() {
        return Ok(());
    }
    workspace.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dependency, DependencyType};
    use tempfile::TempDir;

    fn seeded_workspace(dir: &TempDir) -> Workspace {
        crate::workspace::init(dir.path(), Some("bd".to_string())).unwrap();
        Workspace::open(dir.path()).unwrap()
    }

    fn issue(id: &str, now: chrono::DateTime<Utc>) -> Issue {
        Issue::new(id.to_string(), "Title".to_string(), IssueType::Task, Priority::MEDIUM, None, now)
    }

    #[test]
    fn flush_only_exports_and_clears_dirty() {
        let dir = TempDir::new().unwrap();
        let mut ws = seeded_workspace(&dir);
        ws.store().insert(issue("bd-a", Utc::now())).unwrap();

        let report = run(&mut ws, SyncMode::FlushOnly, &SyncOptions::default()).unwrap();
        assert!(report.flushed);
        assert_eq!(report.store_count, 1);
        assert!(ws.store().get_dirty_ids().is_empty());
    }

    #[test]
    fn bidirectional_is_noop_when_clean() {
        let dir = TempDir::new().unwrap();
        let mut ws = seeded_workspace(&dir);
        let report = run(&mut ws, SyncMode::Bidirectional, &SyncOptions::default()).unwrap();
        assert!(!report.flushed);
    }

    #[test]
    fn bidirectional_flushes_when_dirty() {
        let dir = TempDir::new().unwrap();
        let mut ws = seeded_workspace(&dir);
        ws.store().insert(issue("bd-a", Utc::now())).unwrap();
        let report = run(&mut ws, SyncMode::Bidirectional, &SyncOptions::default()).unwrap();
        assert!(report.flushed);
    }

    #[test]
    fn import_only_adopts_strictly_newer_remote_record() {
        let dir = TempDir::new().unwrap();
        let mut ws = seeded_workspace(&dir);
        let older = Utc::now();
        ws.store().insert(issue("bd-a", older)).unwrap();
        ws.flush().unwrap();

        let newer = older + chrono::Duration::seconds(10);
        let mut remote = issue("bd-a", older);
        remote.updated_at = newer;
        remote.title = "Updated remotely".to_string();
        snapshot::save(&ws.paths().snapshot.clone(), &[&remote]).unwrap();

        let report = run(&mut ws, SyncMode::ImportOnly, &SyncOptions::default()).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(ws.store().get("bd-a").unwrap().title, "Updated remotely");
    }

    #[test]
    fn import_only_ignores_stale_remote_record() {
        let dir = TempDir::new().unwrap();
        let mut ws = seeded_workspace(&dir);
        let now = Utc::now();
        ws.store().insert(issue("bd-a", now)).unwrap();
        ws.store()
            .update(
                "bd-a",
                &crate::storage::IssuePatch {
                    title: Some("Local edit".to_string()),
                    ..Default::default()
                },
                None,
                now + chrono::Duration::seconds(5),
            )
            .unwrap();
        ws.flush().unwrap();

        let stale_remote = issue("bd-a", now);
        snapshot::save(&ws.paths().snapshot.clone(), &[&stale_remote]).unwrap();

        let report = run(&mut ws, SyncMode::ImportOnly, &SyncOptions::default()).unwrap();
        assert_eq!(report.updated, 0);
        assert_eq!(ws.store().get("bd-a").unwrap().title, "Local edit");
    }

    #[test]
    fn merge_conflict_markers_abort_non_status_modes() {
        let dir = TempDir::new().unwrap();
        let mut ws = seeded_workspace(&dir);
        std::fs::write(
            &ws.paths().snapshot,
            "<<<<<<< HEAD\n{}\n=======\n{}\n>>>>>>> branch\n",
        )
        .unwrap();

        for mode in [SyncMode::FlushOnly, SyncMode::ImportOnly, SyncMode::Bidirectional, SyncMode::Merge] {
            let err = run(&mut ws, mode, &SyncOptions::default()).unwrap_err();
            assert!(matches!(err, BeadsError::MergeConflictDetected { .. }));
        }

        let report = run(&mut ws, SyncMode::Status, &SyncOptions::default()).unwrap();
        assert_eq!(report.mode, "status");
    }

    #[test]
    fn merge_prefers_locally_dirty_issue_over_older_remote() {
        let dir = TempDir::new().unwrap();
        let mut ws = seeded_workspace(&dir);
        let now = Utc::now();
        ws.store().insert(issue("bd-a", now)).unwrap();
        ws.flush().unwrap();

        ws.store()
            .update(
                "bd-a",
                &crate::storage::IssuePatch {
                    title: Some("Local newer".to_string()),
                    ..Default::default()
                },
                None,
                now + chrono::Duration::seconds(20),
            )
            .unwrap();

        let stale_remote = issue("bd-a", now);
        snapshot::save(&ws.paths().snapshot.clone(), &[&stale_remote]).unwrap();

        let report = run(&mut ws, SyncMode::Merge, &SyncOptions::default()).unwrap();
        assert!(report.flushed);
        assert_eq!(ws.store().get("bd-a").unwrap().title, "Local newer");
    }

    #[test]
    fn merge_inserts_remote_only_issue_and_keeps_local_only_issue() {
        let dir = TempDir::new().unwrap();
        let mut ws = seeded_workspace(&dir);
        let now = Utc::now();
        ws.store().insert(issue("bd-local", now)).unwrap();
        ws.flush().unwrap();
        ws.store().insert(issue("bd-local2", now)).unwrap();

        let remote_only = issue("bd-remote", now);
        snapshot::save(&ws.paths().snapshot.clone(), &[&remote_only]).unwrap();

        let report = run(&mut ws, SyncMode::Merge, &SyncOptions::default()).unwrap();
        assert_eq!(report.inserted, 1);
        assert!(ws.store().exists("bd-remote"));
        assert!(ws.store().exists("bd-local2"));
    }

    #[test]
    fn status_reports_without_mutating() {
        let dir = TempDir::new().unwrap();
        let mut ws = seeded_workspace(&dir);
        ws.store().insert(issue("bd-a", Utc::now())).unwrap();

        let report = run(&mut ws, SyncMode::Status, &SyncOptions::default()).unwrap();
        assert_eq!(report.store_count, 1);
        assert_eq!(report.pending_export, 1);
        assert!(!ws.store().get_dirty_ids().is_empty());
    }

    #[test]
    fn import_strict_orphan_policy_rejects_dangling_dependency() {
        let dir = TempDir::new().unwrap();
        let mut ws = seeded_workspace(&dir);
        let now = Utc::now();
        let mut remote = issue("bd-a", now);
        remote.dependencies.push(Dependency {
            issue_id: "bd-a".to_string(),
            depends_on_id: "bd-ghost".to_string(),
            dep_type: DependencyType::Blocks,
            created_at: now,
            created_by: None,
            metadata: None,
            thread_id: None,
        });
        snapshot::save(&ws.paths().snapshot.clone(), &[&remote]).unwrap();

        let err = run(
            &mut ws,
            SyncMode::ImportOnly,
            &SyncOptions {
                error_policy: ErrorPolicy::Strict,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, BeadsError::DependencyNotFound { .. }));
    }

    #[test]
    fn import_resurrect_orphan_policy_creates_placeholder() {
        let dir = TempDir::new().unwrap();
        let mut ws = seeded_workspace(&dir);
        let now = Utc::now();
        let mut remote = issue("bd-a", now);
        remote.dependencies.push(Dependency {
            issue_id: "bd-a".to_string(),
            depends_on_id: "bd-ghost".to_string(),
            dep_type: DependencyType::Blocks,
            created_at: now,
            created_by: None,
            metadata: None,
            thread_id: None,
        });
        snapshot::save(&ws.paths().snapshot.clone(), &[&remote]).unwrap();

        let report = run(
            &mut ws,
            SyncMode::ImportOnly,
            &SyncOptions {
                orphan_policy: OrphanPolicy::Resurrect,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(ws.store().get("bd-ghost").unwrap().status, Status::Tombstone);
    }
}
