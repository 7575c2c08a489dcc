//! `br reopen`: move one or more closed issues back to open.

use chrono::Utc;

use crate::cli::ReopenArgs;
use crate::cli::commands::support::{issue_line, CommandContext};
use crate::error::Result;
use crate::model::Status;
use crate::storage::store::IssuePatch;
use crate::storage::wal::OpCode;

pub fn execute(ctx: &mut CommandContext, args: ReopenArgs) -> Result<()> {
    let now = Utc::now();
    let patch = IssuePatch {
        status: Some(Status::Open),
        close_reason: Some(None),
        ..IssuePatch::default()
    };

    let mut reopened = Vec::new();
    for id in &args.ids {
        ctx.workspace.store().update(id, &patch, None, now)?;
        ctx.log_mutation(OpCode::Update, &serde_json::json!({"id": id, "status": "open"}))?;
        reopened.push(ctx.workspace.store().get(id).expect("just reopened").clone());
    }

    ctx.print(&reopened, || {
        reopened.iter().map(issue_line).collect::<Vec<_>>().join("\n")
    });
    Ok(())
}
