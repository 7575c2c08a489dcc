//! `br doctor`: report on workspace health without mutating anything.
//!
//! Since opening the workspace already replays the WAL and rejects an
//! unparseable snapshot or a schema from a future version, reaching this
//! command at all means those checks passed; this just surfaces the
//! resulting counts.

use serde::Serialize;

use crate::cli::commands::support::CommandContext;
use crate::error::Result;
use crate::graph;

#[derive(Debug, Serialize)]
struct DoctorReport {
    schema_version: u32,
    issue_count: usize,
    dirty_count: usize,
    ready_count: usize,
    blocked_count: usize,
    cycle_count: usize,
}

pub fn execute(ctx: &mut CommandContext) -> Result<()> {
    let schema_version = crate::workspace::CURRENT_SCHEMA_VERSION;
    let issue_count = ctx.workspace.store().len();
    let dirty_count = ctx.workspace.store().get_dirty_ids().len();
    let ready_count = graph::ready(ctx.workspace.store()).len();
    let blocked_count = graph::blocked(ctx.workspace.store()).len();
    let cycle_count = graph::detect_cycles(ctx.workspace.store()).len();

    let report = DoctorReport {
        schema_version,
        issue_count,
        dirty_count,
        ready_count,
        blocked_count,
        cycle_count,
    };

    ctx.print(&report, || {
        format!(
            "schema v{} | {} issues ({} dirty) | {} ready | {} blocked | {} cycles",
            report.schema_version,
            report.issue_count,
            report.dirty_count,
            report.ready_count,
            report.blocked_count,
            report.cycle_count
        )
    });
    Ok(())
}
