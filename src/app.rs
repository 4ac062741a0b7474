//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::config::config_path;
use crate::logging;
use crate::setup::{self, SetupNeed};
use crate::storage::RecordingId;
use anyhow::anyhow;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// Writes the default config when it is missing or older than this release.
fn check_and_run_setup() -> anyhow::Result<()> {
    let config_path = config_path()?;

    match setup::check_setup_needed(&config_path)? {
        SetupNeed::UpToDate => {
            tracing::debug!("Config version up to date ({})", env!("CARGO_PKG_VERSION"));
        }
        need => {
            match &need {
                SetupNeed::Outdated(old_version) => tracing::info!(
                    "Setup needed - migrating config from version {} to {}",
                    old_version,
                    env!("CARGO_PKG_VERSION")
                ),
                _ => tracing::info!("No config file yet - running first-time setup"),
            }
            setup::run_setup(&config_path).map_err(|e| {
                tracing::error!("Setup failed: {e}");
                anyhow!("Setup failed: {e}")
            })?;
        }
    }

    Ok(())
}

/// A terminal voice recorder with a live waveform
#[derive(Parser)]
#[command(name = "voxmemo")]
#[command(version)]
#[command(about = "A terminal voice recorder with a live waveform")]
#[command(long_about = "A terminal voice recorder with a live waveform.\n\nRecordings are kept on disk and can be played back or deleted from the\nsame screen.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n\nEXAMPLES:\n    # Open the recorder\n    $ voxmemo\n\n    # Toggle recording from another program (e.g. a window manager binding)\n    $ pkill -USR1 voxmemo\n\n    # Play the most recent recording\n    $ voxmemo play\n\n    # Save a recording as a WAV file\n    $ voxmemo export 1760781234567 -o memo.wav")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/voxmemo/voxmemo.toml\n    Recordings:         ~/.local/share/voxmemo/\n    Logs:               ~/.local/state/voxmemo/voxmemo.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the recorder (default)
    ///
    /// r/Space starts and stops recording, Up/Down select, Enter plays or
    /// pauses, d deletes, q/Esc quits. SIGUSR1 toggles recording.
    #[command(visible_alias = "r")]
    Record,

    /// List stored recordings, most recent first
    #[command(visible_alias = "ls")]
    List,

    /// Play a stored recording to the end
    #[command(visible_alias = "p")]
    Play {
        /// Recording index (1 = most recent, 2 = second most recent, etc.)
        #[arg(value_name = "N")]
        index: Option<usize>,
    },

    /// Delete a stored recording
    Delete {
        /// Recording id as shown by `voxmemo list`
        #[arg(value_name = "ID")]
        id: RecordingId,
    },

    /// Write a recording's audio to a WAV file
    Export {
        /// Recording id as shown by `voxmemo list`
        #[arg(value_name = "ID")]
        id: RecordingId,

        /// Destination file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Uses $VISUAL or $EDITOR, falling back to nano or vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in voxmemo.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value_t = 50)]
        lines: usize,
    },

    /// Generate shell completion script
    ///
    /// Examples:
    ///   voxmemo completions bash > voxmemo.bash
    ///   voxmemo completions zsh > _voxmemo
    ///   voxmemo completions fish > voxmemo.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If setup fails
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that need neither logging nor a config file
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "voxmemo", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => return exit_on_error(commands::handle_list_devices()),
        Some(Commands::Logs { lines }) => return exit_on_error(commands::handle_logs(*lines)),
        _ => {}
    }

    logging::init_logging()?;
    check_and_run_setup()?;

    match cli.command {
        None | Some(Commands::Record) => commands::handle_record().await?,
        Some(Commands::List) => commands::handle_list()?,
        Some(Commands::Play { index }) => commands::handle_play(index)?,
        Some(Commands::Delete { id }) => commands::handle_delete(id)?,
        Some(Commands::Export { id, output }) => commands::handle_export(id, &output)?,
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs { .. }) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

fn exit_on_error(result: anyhow::Result<()>) -> anyhow::Result<()> {
    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_record_is_default() {
        let cli = Cli::try_parse_from(["voxmemo"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_export() {
        let cli =
            Cli::try_parse_from(["voxmemo", "export", "1760781234567", "-o", "memo.wav"]).unwrap();
        match cli.command {
            Some(Commands::Export { id, output }) => {
                assert_eq!(id, RecordingId(1760781234567));
                assert_eq!(output, PathBuf::from("memo.wav"));
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn test_delete_rejects_non_numeric_id() {
        assert!(Cli::try_parse_from(["voxmemo", "delete", "latest"]).is_err());
    }
}
