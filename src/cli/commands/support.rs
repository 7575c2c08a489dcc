//! Shared plumbing for command implementations: the per-invocation context
//! and small print helpers. Rendering here is intentionally minimal —
//! one plain-text line per record, or the record's own JSON encoding.

use serde::Serialize;

use crate::error::Result;
use crate::model::Issue;
use crate::storage::wal::OpCode;
use crate::workspace::Workspace;

/// What every command receives: the open workspace, the resolved actor for
/// audit fields, and whether to render JSON instead of plain text.
pub struct CommandContext {
    pub workspace: Workspace,
    pub actor: String,
    pub json: bool,
}

impl CommandContext {
    #[must_use]
    pub fn new(workspace: Workspace, actor: String, json: bool) -> Self {
        Self { workspace, actor, json }
    }

    pub fn print<T: Serialize>(&self, value: &T, plain: impl FnOnce() -> String) {
        if self.json {
            match serde_json::to_string_pretty(value) {
                Ok(rendered) => println!("{rendered}"),
                Err(err) => eprintln!("failed to encode output as JSON: {err}"),
            }
        } else {
            println!("{}", plain());
        }
    }

    /// Record a mutation in the WAL so it survives a crash before the next flush.
    pub fn log_mutation<T: Serialize>(&mut self, op: OpCode, payload: &T) -> Result<()> {
        self.workspace.wal().append(op, payload)?;
        Ok(())
    }
}

/// One-line plain-text summary of an issue: `id [status] priority title`.
#[must_use]
pub fn issue_line(issue: &Issue) -> String {
    format!(
        "{} [{}] {} {}",
        issue.id, issue.status, issue.priority, issue.title
    )
}
