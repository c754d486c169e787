//! Configuration loading and validation.
//!
//! Config files: `canon.toml`, `canon.yaml`, `canon.yml` or `canon.json`.
//! Searched in `./` then `~/.config/canon/`.

pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        config_dir, discover_and_load, find_config_file, find_or_default_config_path,
        load_config,
    },
    schema::{BatchConfig, CanonConfig},
    validate::{Diagnostic, Severity, ValidationResult},
};
