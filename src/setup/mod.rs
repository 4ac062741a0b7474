//! First-run setup.
//!
//! Writes the default configuration file, stamped with the running version,
//! when the file is missing or older than the binary.

pub mod version;

use std::path::Path;

pub use version::{check_setup_needed, SetupNeed};

/// Embedded default configuration template.
pub(crate) const DEFAULT_CONFIG: &str = include_str!("../../environments/voxmemo.toml");

/// Writes the default configuration to `config_path`.
///
/// An existing file is kept next to the new one as `voxmemo.toml.bak` so a
/// hand-edited config survives an upgrade.
///
/// # Errors
/// Returns an error if any file operations fail.
pub fn run_setup(config_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if config_path.exists() {
        let backup = config_path.with_extension("toml.bak");
        std::fs::copy(config_path, &backup)?;
        tracing::info!("Previous config saved to {}", backup.display());
    }

    std::fs::write(config_path, versioned_template())?;
    tracing::info!("Wrote default config to {}", config_path.display());
    Ok(())
}

fn versioned_template() -> String {
    format!(
        "config_version = \"{}\"\n{}",
        version::CURRENT_VERSION,
        DEFAULT_CONFIG
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_writes_versioned_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("voxmemo.toml");

        run_setup(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("config_version = \""));
        assert_eq!(check_setup_needed(&path).unwrap(), SetupNeed::UpToDate);
    }

    #[test]
    fn test_setup_backs_up_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voxmemo.toml");
        std::fs::write(&path, "[audio]\ndevice = \"1\"\n").unwrap();

        run_setup(&path).unwrap();

        let backup = std::fs::read_to_string(dir.path().join("voxmemo.toml.bak")).unwrap();
        assert_eq!(backup, "[audio]\ndevice = \"1\"\n");
    }
}
