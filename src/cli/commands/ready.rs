//! `br ready`: issues with no unsatisfied blocking dependency.

use crate::cli::ReadyArgs;
use crate::cli::commands::support::{issue_line, CommandContext};
use crate::error::Result;
use crate::graph;

pub fn execute(ctx: &mut CommandContext, args: ReadyArgs) -> Result<()> {
    let mut results: Vec<_> = graph::ready(ctx.workspace.store()).into_iter().cloned().collect();
    if let Some(limit) = args.limit {
        results.truncate(limit);
    }

    ctx.print(&results, || {
        results.iter().map(issue_line).collect::<Vec<_>>().join("\n")
    });
    Ok(())
}
