//! `br update`: apply a partial patch to one or more issues.

use chrono::Utc;

use crate::cli::UpdateArgs;
use crate::cli::commands::support::{issue_line, CommandContext};
use crate::error::Result;
use crate::storage::store::IssuePatch;
use crate::storage::wal::OpCode;

pub fn execute(ctx: &mut CommandContext, args: UpdateArgs) -> Result<()> {
    let now = Utc::now();
    let patch = IssuePatch {
        title: args.title,
        description: args.description.map(Some),
        design: args.design.map(Some),
        acceptance_criteria: args.acceptance_criteria.map(Some),
        notes: args.notes.map(Some),
        status: args.status,
        priority: args.priority,
        issue_type: args.issue_type,
        assignee: args.assignee.map(Some),
        owner: args.owner.map(Some),
        ..IssuePatch::default()
    };

    let mut updated = Vec::new();
    for id in &args.ids {
        ctx.workspace.store().update(id, &patch, args.expected_version, now)?;
        ctx.log_mutation(OpCode::Update, &serde_json::json!({"id": id}))?;
        updated.push(ctx.workspace.store().get(id).expect("just updated").clone());
    }

    ctx.print(&updated, || {
        updated.iter().map(issue_line).collect::<Vec<_>>().join("\n")
    });
    Ok(())
}
