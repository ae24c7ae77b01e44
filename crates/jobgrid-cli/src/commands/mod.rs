pub mod config;
pub mod run;

use std::path::Path;

use jobgrid_core::JobgridConfig;

/// Load `path`, or fall back to defaults when no file was given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<JobgridConfig> {
    match path {
        Some(path) => JobgridConfig::from_file(path),
        None => Ok(JobgridConfig::default()),
    }
}
