//! `br dep`: manage and inspect dependency edges.

use crate::cli::DepCommand;
use crate::cli::commands::support::CommandContext;
use crate::error::Result;
use crate::graph;
use crate::storage::wal::OpCode;

pub fn execute(ctx: &mut CommandContext, command: DepCommand) -> Result<()> {
    match command {
        DepCommand::Add { from, to, dep_type } => {
            graph::add(
                ctx.workspace.store(),
                &from,
                &to,
                dep_type.clone(),
                Some(ctx.actor.clone()),
                None,
                false,
            )?;
            ctx.log_mutation(
                OpCode::DepAdd,
                &serde_json::json!({"from": from, "to": to, "type": dep_type.as_str()}),
            )?;
            ctx.print(
                &serde_json::json!({"from": from, "to": to, "type": dep_type.as_str()}),
                || format!("{from} --{}--> {to}", dep_type.as_str()),
            );
        }
        DepCommand::Remove { from, to } => {
            graph::remove(ctx.workspace.store(), &from, &to)?;
            ctx.log_mutation(OpCode::DepRemove, &serde_json::json!({"from": from, "to": to}))?;
            ctx.print(&serde_json::json!({"from": from, "to": to, "removed": true}), || {
                format!("removed {from} -> {to}")
            });
        }
        DepCommand::List { id } => {
            let deps: Vec<_> = graph::get_dependencies(ctx.workspace.store(), &id)
                .into_iter()
                .cloned()
                .collect();
            ctx.print(&deps, || {
                deps.iter()
                    .map(|d| format!("{} --{}--> {}", id, d.dep_type.as_str(), d.depends_on_id))
                    .collect::<Vec<_>>()
                    .join("\n")
            });
        }
    }
    Ok(())
}
