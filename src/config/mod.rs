//! Workspace discovery and actor resolution.
//!
//! Configuration proper (id prefix, defaults, sync toggles) lives in
//! `config.yaml` and is owned by `workspace::WorkspaceConfig`; this module
//! only resolves *which* workspace a command runs against and *who* is
//! running it, before a `workspace::Workspace` is opened.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{BeadsError, Result};

/// Directory name for the workspace, relative to a project root.
pub const WORKSPACE_DIR_NAME: &str = ".beads";

/// Discover the active `.beads` directory.
///
/// Honors `BEADS_DIR` when set (and pointing at a real directory),
/// otherwise walks up from `start` (or the current directory) looking for
/// a `.beads` subdirectory.
///
/// # Errors
///
/// Returns `WorkspaceNotInitialized` if no `.beads` directory is found.
pub fn discover_beads_dir(start: Option<&Path>) -> Result<PathBuf> {
    discover_beads_dir_with_env(start, env::var("BEADS_DIR").ok().as_deref())
}

fn discover_beads_dir_with_env(start: Option<&Path>, env_override: Option<&str>) -> Result<PathBuf> {
    if let Some(value) = env_override {
        if !value.trim().is_empty() {
            let path = PathBuf::from(value);
            if path.is_dir() {
                return Ok(path);
            }
        }
    }

    let mut current = match start {
        Some(path) => path.to_path_buf(),
        None => env::current_dir()?,
    };

    loop {
        let candidate = current.join(WORKSPACE_DIR_NAME);
        if candidate.is_dir() {
            return Ok(candidate);
        }
        if !current.pop() {
            break;
        }
    }

    Err(BeadsError::WorkspaceNotInitialized)
}

/// Where a new workspace should be created: `<start>/.beads`, regardless of
/// whether an ancestor already has one.
#[must_use]
pub fn workspace_dir_at(start: &Path) -> PathBuf {
    start.join(WORKSPACE_DIR_NAME)
}

/// Resolve the acting user for audit fields (`created_by`, comment authors),
/// in order: explicit override, `BEADS_ACTOR`, `USER`, `USERNAME`, then a
/// fixed fallback.
#[must_use]
pub fn resolve_actor(override_actor: Option<&str>) -> String {
    if let Some(actor) = override_actor {
        if !actor.trim().is_empty() {
            return actor.to_string();
        }
    }
    for var in ["BEADS_ACTOR", "USER", "USERNAME"] {
        if let Ok(value) = env::var(var) {
            if !value.trim().is_empty() {
                return value;
            }
        }
    }
    "unknown".to_string()
}

/// Overrides threaded in from CLI flags, taking precedence over whatever the
/// resolved workspace's own `config.yaml` says.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub actor: Option<String>,
    pub json: bool,
    pub lock_timeout: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn discover_beads_dir_walks_up() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(".beads")).unwrap();
        let nested = temp.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let discovered = discover_beads_dir(Some(&nested)).unwrap();
        assert_eq!(discovered, temp.path().join(".beads"));
    }

    #[test]
    fn discover_beads_dir_returns_error_when_not_found() {
        let temp = TempDir::new().unwrap();
        let result = discover_beads_dir_with_env(Some(temp.path()), None);
        assert!(matches!(result, Err(BeadsError::WorkspaceNotInitialized)));
    }

    #[test]
    fn discover_beads_dir_honors_env_override() {
        let temp = TempDir::new().unwrap();
        let custom = temp.path().join("custom");
        std::fs::create_dir_all(&custom).unwrap();

        let discovered =
            discover_beads_dir_with_env(Some(temp.path()), Some(custom.to_str().unwrap())).unwrap();
        assert_eq!(discovered, custom);
    }

    #[test]
    fn resolve_actor_prefers_explicit_override() {
        assert_eq!(resolve_actor(Some("alice")), "alice");
    }

    #[test]
    fn resolve_actor_falls_back_to_unknown_without_env_or_override() {
        // Can't unset USER/USERNAME safely in a parallel test run, but an
        // explicit empty override must still fall through to an env var or
        // the fixed fallback rather than return an empty string.
        assert!(!resolve_actor(Some("")).is_empty());
    }
}
