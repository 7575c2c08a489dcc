//! `br config`: inspect or edit `config.yaml` for the open workspace.

use crate::cli::ConfigCommand;
use crate::cli::commands::support::CommandContext;
use crate::error::{BeadsError, Result};

pub fn execute(ctx: &mut CommandContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let config = ctx.workspace.config().clone();
            ctx.print(&config, || {
                serde_yaml::to_string(&config).unwrap_or_else(|_| "<unprintable>".to_string())
            });
        }
        ConfigCommand::Get { key } => {
            let config = ctx.workspace.config().clone();
            let value = match key.as_str() {
                "id.prefix" => config.id.prefix,
                "id.min_hash_length" => config.id.min_hash_length.to_string(),
                "id.max_hash_length" => config.id.max_hash_length.to_string(),
                "defaults.priority" => config.defaults.priority.map_or_else(String::new, |p| p.to_string()),
                "defaults.issue_type" => config.defaults.issue_type.unwrap_or_default(),
                "sync.auto_flush" => config.sync.auto_flush.to_string(),
                "sync.auto_import" => config.sync.auto_import.to_string(),
                "output.color" => config.output.color.map_or_else(String::new, |c| c.to_string()),
                other => {
                    return Err(BeadsError::Validation {
                        field: "key".to_string(),
                        reason: format!("unrecognized config key '{other}'"),
                    })
                }
            };
            ctx.print(&value, || value.clone());
        }
        ConfigCommand::Set { key, value } => {
            let invalid = |reason: String| BeadsError::Validation { field: "value".to_string(), reason };
            let config = ctx.workspace.config_mut();
            match key.as_str() {
                "id.prefix" => config.id.prefix = value.clone(),
                "id.min_hash_length" => {
                    config.id.min_hash_length = value.parse().map_err(|_| invalid("expected an integer".to_string()))?;
                }
                "id.max_hash_length" => {
                    config.id.max_hash_length = value.parse().map_err(|_| invalid("expected an integer".to_string()))?;
                }
                "defaults.priority" => {
                    config.defaults.priority = Some(value.parse().map_err(|_| invalid("expected an integer 0-4".to_string()))?);
                }
                "defaults.issue_type" => config.defaults.issue_type = Some(value.clone()),
                "sync.auto_flush" => {
                    config.sync.auto_flush = value.parse().map_err(|_| invalid("expected true or false".to_string()))?;
                }
                "sync.auto_import" => {
                    config.sync.auto_import = value.parse().map_err(|_| invalid("expected true or false".to_string()))?;
                }
                "output.color" => {
                    config.output.color = Some(value.parse().map_err(|_| invalid("expected true or false".to_string()))?);
                }
                other => {
                    return Err(BeadsError::Validation {
                        field: "key".to_string(),
                        reason: format!("unrecognized config key '{other}'"),
                    })
                }
            }
            ctx.workspace.save_config()?;
            ctx.print(&serde_json::json!({"key": key, "value": value}), || format!("{key} = {value}"));
        }
    }
    Ok(())
}
