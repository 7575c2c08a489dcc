//! `br create`: insert a new issue, optionally wired to a parent.

use std::collections::HashSet;

use chrono::Utc;

use crate::cli::CreateArgs;
use crate::cli::commands::support::{issue_line, CommandContext};
use crate::error::Result;
use crate::graph;
use crate::model::{DependencyType, Issue, IssueType, Priority};
use crate::storage::wal::OpCode;
use crate::util::id::{IdConfig, IdGenerator};

pub fn execute(ctx: &mut CommandContext, args: CreateArgs) -> Result<()> {
    let now = Utc::now();
    let config = ctx.workspace.config().clone();
    let generator = IdGenerator::new(IdConfig {
        prefix: config.id.prefix.clone(),
        min_hash_length: config.id.min_hash_length,
        max_hash_length: config.id.max_hash_length,
    });

    let known: HashSet<String> = ctx.workspace.store().known_ids().into_iter().collect();
    let n_existing = known.len();
    let id = generator.generate(n_existing, |candidate| known.contains(candidate))?;

    let priority = args
        .priority
        .unwrap_or_else(|| config.defaults.priority.map(Priority).unwrap_or(Priority::MEDIUM));
    let issue_type = args.issue_type.unwrap_or_else(|| {
        config
            .defaults
            .issue_type
            .as_deref()
            .and_then(|s| s.parse::<IssueType>().ok())
            .unwrap_or_default()
    });

    let mut issue = Issue::new(id.clone(), args.title, issue_type, priority, Some(ctx.actor.clone()), now);
    issue.description = args.description;
    issue.design = args.design;
    issue.acceptance_criteria = args.acceptance_criteria;
    issue.notes = args.notes;
    issue.assignee = args.assignee;
    issue.owner = args.owner;
    issue.labels = args.labels;

    ctx.workspace.store().insert(issue)?;
    let stored = ctx.workspace.store().get(&id).expect("just inserted").clone();
    ctx.log_mutation(OpCode::Insert, &stored)?;

    if let Some(parent) = args.parent {
        graph::add(
            ctx.workspace.store(),
            &id,
            &parent,
            DependencyType::ParentChild,
            Some(ctx.actor.clone()),
            None,
            false,
        )?;
        ctx.log_mutation(
            OpCode::DepAdd,
            &serde_json::json!({"id": id, "depends_on": parent, "type": "parent_child"}),
        )?;
    }

    let issue = ctx.workspace.store().get(&id).expect("just inserted").clone();
    ctx.print(&issue, || issue_line(&issue));
    Ok(())
}
