//! One module per subcommand. Each exposes an `execute` function taking a
//! `CommandContext` and that command's parsed arguments.

mod support;

pub mod blocked;
pub mod close;
pub mod comments;
pub mod config;
pub mod count;
pub mod create;
pub mod defer;
pub mod delete;
pub mod dep;
pub mod doctor;
pub mod init;
pub mod label;
pub mod list;
pub mod ready;
pub mod reopen;
pub mod show;
pub mod sync;
pub mod update;

pub use support::CommandContext;
