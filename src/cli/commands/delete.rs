//! `br delete`: tombstone (or, with `--hard`, remove) one or more issues.

use chrono::Utc;

use crate::cli::DeleteArgs;
use crate::cli::commands::support::CommandContext;
use crate::error::Result;
use crate::storage::wal::OpCode;

pub fn execute(ctx: &mut CommandContext, args: DeleteArgs) -> Result<()> {
    let now = Utc::now();
    let mut deleted = Vec::new();
    for id in &args.ids {
        ctx.workspace.store().delete(id, args.cascade, args.hard, now)?;
        ctx.log_mutation(
            OpCode::Delete,
            &serde_json::json!({"id": id, "hard": args.hard, "cascade": args.cascade}),
        )?;
        deleted.push(id.clone());
    }

    ctx.print(&deleted, || deleted.join("\n"));
    Ok(())
}
