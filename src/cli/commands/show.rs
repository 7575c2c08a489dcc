//! `br show`: print one or more issues in full.

use crate::cli::ShowArgs;
use crate::cli::commands::support::{issue_line, CommandContext};
use crate::error::{BeadsError, Result};

pub fn execute(ctx: &mut CommandContext, args: ShowArgs) -> Result<()> {
    let mut found = Vec::new();
    for id in &args.ids {
        let issue = ctx
            .workspace
            .store()
            .get(id)
            .ok_or_else(|| BeadsError::IssueNotFound { id: id.clone() })?
            .clone();
        found.push(issue);
    }

    ctx.print(&found, || {
        found.iter().map(issue_line).collect::<Vec<_>>().join("\n")
    });
    Ok(())
}
