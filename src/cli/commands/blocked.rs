//! `br blocked`: issues waiting on an unsatisfied blocking dependency.

use crate::cli::BlockedArgs;
use crate::cli::commands::support::{issue_line, CommandContext};
use crate::error::Result;
use crate::graph;

pub fn execute(ctx: &mut CommandContext, args: BlockedArgs) -> Result<()> {
    let mut results: Vec<_> = graph::blocked(ctx.workspace.store()).into_iter().cloned().collect();
    if let Some(limit) = args.limit {
        results.truncate(limit);
    }

    ctx.print(&results, || {
        results.iter().map(issue_line).collect::<Vec<_>>().join("\n")
    });
    Ok(())
}
