//! `br count`: tally live issues, optionally grouped by a field.

use crate::cli::CountArgs;
use crate::cli::commands::support::CommandContext;
use crate::error::Result;

pub fn execute(ctx: &mut CommandContext, args: CountArgs) -> Result<()> {
    let counts = ctx.workspace.store().count(args.group_by.as_deref());

    ctx.print(&counts, || {
        let mut lines: Vec<String> = counts.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        lines.sort();
        lines.join("\n")
    });
    Ok(())
}
