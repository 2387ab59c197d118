pub mod inventory;
pub mod run;

use std::path::Path;

use autopatch_core::PatchConfig;

/// The config file at `path`, or defaults when no file was given.
pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<PatchConfig> {
    match path {
        Some(path) => Ok(PatchConfig::from_file(path)?),
        None => Ok(PatchConfig::default()),
    }
}
