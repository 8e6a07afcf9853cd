//! Codesnap - snapshot and restore VS Code user configuration.
//!
//! This library provides the core functionality for codesnap, including:
//! - Platform resolution (user directory, shell, file browser)
//! - File synchronization with UTF-8 normalization
//! - Extension export and install through the editor CLI
//! - Timestamped snapshot management
//! - Configuration loading

pub mod cfg;
pub mod error;
pub mod extensions;
pub mod platform;
pub mod snapshots;
pub mod sync;
pub mod ui;
