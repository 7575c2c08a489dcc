//! `br close`: mark one or more issues closed.

use chrono::Utc;

use crate::cli::CloseArgs;
use crate::cli::commands::support::{issue_line, CommandContext};
use crate::error::Result;
use crate::model::Status;
use crate::storage::store::IssuePatch;
use crate::storage::wal::OpCode;

pub fn execute(ctx: &mut CommandContext, args: CloseArgs) -> Result<()> {
    let now = Utc::now();
    let patch = IssuePatch {
        status: Some(Status::Closed),
        close_reason: Some(args.reason.clone()),
        ..IssuePatch::default()
    };

    let mut closed = Vec::new();
    for id in &args.ids {
        ctx.workspace.store().update(id, &patch, None, now)?;
        ctx.log_mutation(OpCode::Update, &serde_json::json!({"id": id, "status": "closed"}))?;
        closed.push(ctx.workspace.store().get(id).expect("just closed").clone());
    }

    ctx.print(&closed, || closed.iter().map(issue_line).collect::<Vec<_>>().join("\n"));
    Ok(())
}
