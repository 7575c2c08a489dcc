//! Command-line surface.
//!
//! This is deliberately thin: argument parsing and dispatch only. Output
//! rendering is limited to plain text or a single `--json` encoding of the
//! same data — the richer text/JSON/TOON/DOT renderers, shell completion
//! generation, and self-upgrade machinery some builds of this tool carry
//! live outside this crate.

pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "br", version, about = "Local-first issue and dependency tracker")]
pub struct Cli {
    /// Emit machine-readable JSON instead of plain text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable ANSI color in plain-text output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Override the actor recorded on created/updated/commented records.
    #[arg(long, global = true)]
    pub actor: Option<String>,

    /// Override the workspace lock acquisition timeout, in milliseconds.
    #[arg(long, global = true)]
    pub lock_timeout: Option<u64>,

    /// Skip the automatic flush-to-snapshot that normally follows a mutating command.
    #[arg(long, global = true)]
    pub no_auto_flush: bool,

    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long, action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new workspace in the current directory.
    Init {
        #[arg(long)]
        prefix: Option<String>,
    },
    Create(CreateArgs),
    Update(UpdateArgs),
    Delete(DeleteArgs),
    List(ListArgs),
    Show(ShowArgs),
    Close(CloseArgs),
    Reopen(ReopenArgs),
    Defer(DeferArgs),
    Dep {
        #[command(subcommand)]
        command: DepCommand,
    },
    Label {
        #[command(subcommand)]
        command: LabelCommand,
    },
    Comments {
        #[command(subcommand)]
        command: CommentCommand,
    },
    Count(CountArgs),
    Ready(ReadyArgs),
    Blocked(BlockedArgs),
    Sync(SyncArgs),
    /// Report workspace health: snapshot corruption, lock state, schema version.
    Doctor,
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct CreateArgs {
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub design: Option<String>,
    #[arg(long)]
    pub acceptance_criteria: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub priority: Option<crate::model::Priority>,
    #[arg(long = "type")]
    pub issue_type: Option<crate::model::IssueType>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub owner: Option<String>,
    #[arg(long = "label")]
    pub labels: Vec<String>,
    /// Create a `parent-child` dependency onto this existing issue.
    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(clap::Args, Debug, Default)]
pub struct UpdateArgs {
    pub ids: Vec<String>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub design: Option<String>,
    #[arg(long)]
    pub acceptance_criteria: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub status: Option<crate::model::Status>,
    #[arg(long)]
    pub priority: Option<crate::model::Priority>,
    #[arg(long = "type")]
    pub issue_type: Option<crate::model::IssueType>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub owner: Option<String>,
    /// Require the stored version to equal this value, else fail `VersionConflict`.
    #[arg(long)]
    pub expected_version: Option<u64>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    pub ids: Vec<String>,
    /// Remove the record outright instead of tombstoning it.
    #[arg(long)]
    pub hard: bool,
    /// Also delete issues that depend on this one via `blocks`/`parent-child`.
    #[arg(long)]
    pub cascade: bool,
}

#[derive(clap::Args, Debug, Default)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<crate::model::Status>,
    #[arg(long)]
    pub priority_min: Option<crate::model::Priority>,
    #[arg(long)]
    pub priority_max: Option<crate::model::Priority>,
    #[arg(long = "type")]
    pub issue_type: Option<crate::model::IssueType>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub label: Option<String>,
    #[arg(long)]
    pub title_contains: Option<String>,
    #[arg(long)]
    pub parent: Option<String>,
    #[arg(long)]
    pub overdue: bool,
    #[arg(long)]
    pub include_deferred: bool,
    #[arg(long)]
    pub include_tombstones: bool,
    #[arg(long)]
    pub limit: Option<usize>,
    /// `created_at`, `updated_at`, or `priority`, optionally suffixed `:desc`.
    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    pub ids: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct CloseArgs {
    pub ids: Vec<String>,
    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ReopenArgs {
    pub ids: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeferArgs {
    pub ids: Vec<String>,
    /// RFC 3339 timestamp to defer until.
    pub until: String,
}

#[derive(Subcommand, Debug)]
pub enum DepCommand {
    Add {
        from: String,
        to: String,
        #[arg(long = "type", default_value = "blocks")]
        dep_type: crate::model::DependencyType,
    },
    Remove {
        from: String,
        to: String,
    },
    List {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum LabelCommand {
    Add { id: String, label: String },
    Remove { id: String, label: String },
}

#[derive(Subcommand, Debug)]
pub enum CommentCommand {
    Add { id: String, text: String },
    List { id: String },
}

#[derive(clap::Args, Debug, Default)]
pub struct CountArgs {
    /// `status`, `priority`, or `issue_type`.
    #[arg(long)]
    pub group_by: Option<String>,
}

#[derive(clap::Args, Debug, Default)]
pub struct ReadyArgs {
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(clap::Args, Debug, Default)]
pub struct BlockedArgs {
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(clap::Args, Debug, Default)]
pub struct SyncArgs {
    /// `flush`, `import`, `bidirectional` (default), `merge`, or `status`.
    #[arg(long)]
    pub mode: Option<String>,
    #[arg(long)]
    pub manifest: bool,
    /// `strict`, `best-effort` (default), or `partial`.
    #[arg(long)]
    pub error_policy: Option<String>,
    /// `strict` (default), `resurrect`, or `skip`.
    #[arg(long)]
    pub orphan_policy: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Show,
    Get { key: String },
    Set { key: String, value: String },
}
