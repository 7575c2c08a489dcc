//! `br sync`: drive the sync engine's five modes from the command line.

use crate::cli::SyncArgs;
use crate::cli::commands::support::CommandContext;
use crate::error::Result;
use crate::sync::{self, ErrorPolicy, OrphanPolicy, SyncMode, SyncOptions};

pub fn execute(ctx: &mut CommandContext, args: SyncArgs) -> Result<()> {
    let mode = match args.mode.as_deref() {
        Some("flush") | Some("flush_only") => SyncMode::FlushOnly,
        Some("import") | Some("import_only") => SyncMode::ImportOnly,
        Some("merge") => SyncMode::Merge,
        Some("status") => SyncMode::Status,
        _ => SyncMode::Bidirectional,
    };

    let error_policy = match args.error_policy.as_deref() {
        Some("strict") => ErrorPolicy::Strict,
        Some("partial") => ErrorPolicy::Partial,
        _ => ErrorPolicy::BestEffort,
    };
    let orphan_policy = match args.orphan_policy.as_deref() {
        Some("resurrect") => OrphanPolicy::Resurrect,
        Some("skip") => OrphanPolicy::Skip,
        _ => OrphanPolicy::Strict,
    };

    let options = SyncOptions {
        error_policy,
        orphan_policy,
        write_manifest: args.manifest,
    };

    let report = sync::run(&mut ctx.workspace, mode, &options)?;
    ctx.print(&report, || {
        format!(
            "{}: {} inserted, {} updated, {} pending export",
            report.mode, report.inserted, report.updated, report.pending_export
        )
    });
    Ok(())
}
