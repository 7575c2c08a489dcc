//! `br label`: attach or detach free-text labels on an issue.

use chrono::Utc;

use crate::cli::LabelCommand;
use crate::cli::commands::support::CommandContext;
use crate::error::Result;
use crate::storage::wal::OpCode;

pub fn execute(ctx: &mut CommandContext, command: LabelCommand) -> Result<()> {
    let now = Utc::now();
    match command {
        LabelCommand::Add { id, label } => {
            ctx.workspace.store().add_label(&id, &label, now)?;
            ctx.log_mutation(OpCode::LabelAdd, &serde_json::json!({"id": id, "label": label}))?;
            ctx.print(&serde_json::json!({"id": id, "label": label, "added": true}), || {
                format!("{id}: +{label}")
            });
        }
        LabelCommand::Remove { id, label } => {
            ctx.workspace.store().remove_label(&id, &label, now)?;
            ctx.log_mutation(OpCode::LabelRemove, &serde_json::json!({"id": id, "label": label}))?;
            ctx.print(&serde_json::json!({"id": id, "label": label, "removed": true}), || {
                format!("{id}: -{label}")
            });
        }
    }
    Ok(())
}
