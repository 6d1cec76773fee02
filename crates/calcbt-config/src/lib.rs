//! calcbt-config
//!
//! Layered YAML configuration loading: merge a sequence of YAML files
//! (later files override earlier ones, objects merge recursively) into one
//! canonical JSON document, then deserialize into a [`ConfigFile`] that
//! builds a runnable `calcbt_strategy::Config`.

mod config_file;
mod merge;

pub use config_file::ConfigFile;
pub use merge::load_layered_yaml;

use anyhow::Result;
use calcbt_data::CsvBarReader;
use calcbt_strategy::Config;
use std::path::Path;

/// Convenience wrapper: merges `paths` in order and builds a runnable
/// config in one call.
pub fn load_config(paths: &[impl AsRef<Path>]) -> Result<Config<CsvBarReader>> {
    let merged = load_layered_yaml(paths)?;
    ConfigFile::from_merged_json(merged)?.into_config()
}
