//! `br list`: filter and sort the live issue set.

use chrono::Utc;

use crate::cli::ListArgs;
use crate::cli::commands::support::{issue_line, CommandContext};
use crate::error::Result;
use crate::storage::store::{Filter, SortField};

pub fn execute(ctx: &mut CommandContext, args: ListArgs) -> Result<()> {
    let sort = args.sort.as_deref().map(|spec| {
        let (field, desc) = spec
            .split_once(':')
            .map_or((spec, false), |(f, dir)| (f, dir.eq_ignore_ascii_case("desc")));
        let field = match field {
            "updated_at" => SortField::UpdatedAt,
            "priority" => SortField::Priority,
            _ => SortField::CreatedAt,
        };
        (field, !desc)
    });

    let filter = Filter {
        status: args.status,
        priority_min: args.priority_min,
        priority_max: args.priority_max,
        issue_type: args.issue_type,
        assignee: args.assignee,
        label: args.label,
        title_contains: args.title_contains,
        parent: args.parent,
        overdue: args.overdue,
        include_deferred: args.include_deferred,
        include_tombstones: args.include_tombstones,
        limit: args.limit,
        sort,
        ..Filter::default()
    };

    let now = Utc::now();
    let results: Vec<_> = ctx.workspace.store().list(&filter, now).into_iter().cloned().collect();

    ctx.print(&results, || {
        results.iter().map(issue_line).collect::<Vec<_>>().join("\n")
    });
    Ok(())
}
