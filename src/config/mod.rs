//! Configuration management for voxmemo.
//!
//! Settings live in `~/.config/voxmemo/voxmemo.toml`. Missing sections fall
//! back to defaults so an older file keeps working after an upgrade.

pub mod file;

pub use file::{
    config_path, AudioConfig, StorageBackend, StorageConfig, VoxmemoConfig, WaveformConfig,
};
