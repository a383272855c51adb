//! Spot Cycler - Main Library
//!
//! Root crate for the unattended spot cycle-trading bot. The engine
//! itself lives in the `trader` workspace library; this crate adds the
//! glue shared by the binaries.

// Re-export the workspace library for convenience
pub use trader;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;

    pub use cli::{config_path_from_env, parse_args, CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH};
}
