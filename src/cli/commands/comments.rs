//! `br comments`: append to or list an issue's comment thread.

use chrono::Utc;

use crate::cli::CommentCommand;
use crate::cli::commands::support::CommandContext;
use crate::error::{BeadsError, Result};
use crate::model::Comment;
use crate::storage::wal::OpCode;

pub fn execute(ctx: &mut CommandContext, command: CommentCommand) -> Result<()> {
    match command {
        CommentCommand::Add { id, text } => {
            let now = Utc::now();
            let next_id = ctx
                .workspace
                .store()
                .get(&id)
                .ok_or_else(|| BeadsError::IssueNotFound { id: id.clone() })?
                .comments
                .len() as i64
                + 1;

            let comment = Comment {
                id: next_id,
                issue_id: id.clone(),
                author: ctx.actor.clone(),
                body: text,
                created_at: now,
            };
            ctx.workspace.store().add_comment(&id, comment.clone())?;
            ctx.log_mutation(OpCode::CommentAdd, &serde_json::json!({"id": id, "comment_id": next_id}))?;
            ctx.print(&comment, || format!("{id}#{next_id}: {}", comment.body));
        }
        CommentCommand::List { id } => {
            let comments = ctx
                .workspace
                .store()
                .get(&id)
                .ok_or_else(|| BeadsError::IssueNotFound { id: id.clone() })?
                .comments
                .clone();
            ctx.print(&comments, || {
                comments
                    .iter()
                    .map(|c| format!("{id}#{} [{}]: {}", c.id, c.author, c.body))
                    .collect::<Vec<_>>()
                    .join("\n")
            });
        }
    }
    Ok(())
}
