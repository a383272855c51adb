//! CLI utilities for binaries
//!
//! Configuration-path resolution shared by every executable.

use std::path::PathBuf;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "CONFIG_PATH";

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Resolve the configuration path: first CLI argument, then the
/// `CONFIG_PATH` environment variable, then the default.
pub fn config_path_from_env(args: &[String]) -> PathBuf {
    if let Some(path) = args.first() {
        return path.into();
    }
    std::env::var(CONFIG_PATH_VAR)
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
        .into()
}

/// Command line arguments, excluding the program name.
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}
