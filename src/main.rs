use std::io::{self, IsTerminal};
use std::path::Path;

use clap::Parser;
use tracing::debug;

use beads_rust::cli::commands::{self, CommandContext};
use beads_rust::cli::{Cli, Commands};
use beads_rust::logging::init_logging;
use beads_rust::sync;
use beads_rust::workspace::Workspace;
use beads_rust::{config, BeadsError, StructuredError};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, None) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let json = cli.json;

    if let Err(e) = run(cli) {
        handle_error(&e, json);
    }
}

fn run(cli: Cli) -> beads_rust::error::Result<()> {
    if let Commands::Init { prefix } = cli.command {
        return commands::init::execute(prefix, cli.json);
    }

    let beads_dir = config::discover_beads_dir(Some(Path::new(".")))?;
    let workspace = Workspace::open(&beads_dir)?;
    let actor = config::resolve_actor(cli.actor.as_deref());
    let mut ctx = CommandContext::new(workspace, actor, cli.json);

    let outcome = dispatch(&mut ctx, cli.command);

    if outcome.is_ok() && !cli.no_auto_flush {
        if let Err(e) = sync::auto_flush(&mut ctx.workspace) {
            debug!(?e, "auto-flush after command failed (non-fatal)");
        }
    }

    outcome
}

fn dispatch(ctx: &mut CommandContext, command: Commands) -> beads_rust::error::Result<()> {
    match command {
        Commands::Init { .. } => unreachable!("Init is handled before a workspace is opened"),
        Commands::Create(args) => commands::create::execute(ctx, args),
        Commands::Update(args) => commands::update::execute(ctx, args),
        Commands::Delete(args) => commands::delete::execute(ctx, args),
        Commands::List(args) => commands::list::execute(ctx, args),
        Commands::Show(args) => commands::show::execute(ctx, args),
        Commands::Close(args) => commands::close::execute(ctx, args),
        Commands::Reopen(args) => commands::reopen::execute(ctx, args),
        Commands::Defer(args) => commands::defer::execute(ctx, args),
        Commands::Dep { command } => commands::dep::execute(ctx, command),
        Commands::Label { command } => commands::label::execute(ctx, command),
        Commands::Comments { command } => commands::comments::execute(ctx, command),
        Commands::Count(args) => commands::count::execute(ctx, args),
        Commands::Ready(args) => commands::ready::execute(ctx, args),
        Commands::Blocked(args) => commands::blocked::execute(ctx, args),
        Commands::Sync(args) => commands::sync::execute(ctx, args),
        Commands::Doctor => commands::doctor::execute(ctx),
        Commands::Config { command } => commands::config::execute(ctx, command),
    }
}

/// When `--json` is set or stdout is not a TTY, emit structured JSON to
/// stderr; otherwise a human-readable message, colored if stderr is a TTY.
fn handle_error(err: &BeadsError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}
