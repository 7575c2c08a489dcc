//! `br init`: create a new workspace in the current directory.

use std::path::Path;

use crate::config;
use crate::error::Result;
use crate::workspace;

pub fn execute(prefix: Option<String>, json: bool) -> Result<()> {
    let root = config::workspace_dir_at(Path::new("."));
    workspace::init(&root, prefix)?;

    if json {
        println!(
            "{}",
            serde_json::json!({"initialized": true, "path": root.display().to_string()})
        );
    } else {
        println!("Initialized workspace at {}", root.display());
    }
    Ok(())
}
