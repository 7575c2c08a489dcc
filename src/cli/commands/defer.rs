//! `br defer`: push one or more issues out of `ready`/`list` until a given time.

use chrono::{DateTime, Utc};

use crate::cli::DeferArgs;
use crate::cli::commands::support::{issue_line, CommandContext};
use crate::error::{BeadsError, Result};
use crate::model::Status;
use crate::storage::store::IssuePatch;
use crate::storage::wal::OpCode;

pub fn execute(ctx: &mut CommandContext, args: DeferArgs) -> Result<()> {
    let until: DateTime<Utc> = DateTime::parse_from_rfc3339(&args.until)
        .map_err(|_| BeadsError::Validation {
            field: "until".to_string(),
            reason: "expected an RFC 3339 timestamp".to_string(),
        })?
        .with_timezone(&Utc);

    let now = Utc::now();
    let patch = IssuePatch {
        status: Some(Status::Deferred),
        defer_until: Some(Some(until)),
        ..IssuePatch::default()
    };

    let mut deferred = Vec::new();
    for id in &args.ids {
        ctx.workspace.store().update(id, &patch, None, now)?;
        ctx.log_mutation(OpCode::Update, &serde_json::json!({"id": id, "defer_until": until}))?;
        deferred.push(ctx.workspace.store().get(id).expect("just deferred").clone());
    }

    ctx.print(&deferred, || {
        deferred.iter().map(issue_line).collect::<Vec<_>>().join("\n")
    });
    Ok(())
}
