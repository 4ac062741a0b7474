//! Configuration file editor command.
//!
//! Opens `voxmemo.toml` in the user's editor and checks it afterwards.

use crate::config::{config_path, VoxmemoConfig};
use anyhow::anyhow;
use std::process::Command;

/// Opens the configuration file in the user's preferred editor.
///
/// Tries `$VISUAL`, `$EDITOR`, then nano and vi. The edited file is parsed
/// once the editor exits so mistakes show up immediately.
///
/// # Errors
/// - If no editor can be found or executed
/// - If the editor exits with a failure status
pub fn handle_config() -> anyhow::Result<()> {
    let config_path = config_path()?;
    tracing::info!("Opening config file: {}", config_path.display());

    let editor = find_editor()?;
    let (program, args) = split_command(&editor)
        .ok_or_else(|| anyhow!("Editor command '{editor}' is empty"))?;
    tracing::debug!("Using editor: {}", editor);

    let status = Command::new(program)
        .args(args)
        .arg(&config_path)
        .status()
        .map_err(|e| {
            anyhow!(
                "Failed to open editor '{editor}': {e}. Make sure the editor is installed and accessible."
            )
        })?;

    if !status.success() {
        return Err(anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }

    match VoxmemoConfig::load() {
        Ok(_) => tracing::info!("Config file edited successfully"),
        Err(e) => {
            tracing::warn!("Edited config does not load: {}", e);
            eprintln!("Warning: {} does not load: {e}", config_path.display());
        }
    }
    Ok(())
}

fn find_editor() -> anyhow::Result<String> {
    for var in ["VISUAL", "EDITOR"] {
        if let Ok(editor) = std::env::var(var) {
            if !editor.trim().is_empty() {
                return Ok(editor);
            }
        }
    }

    ["nano", "vi"]
        .into_iter()
        .find(|editor| is_editor_available(editor))
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No editor found. Please set the $EDITOR environment variable."))
}

fn is_editor_available(editor: &str) -> bool {
    Command::new("which")
        .arg(editor)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Splits an editor command like `code --wait` into program and arguments.
fn split_command(command: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = command.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}
