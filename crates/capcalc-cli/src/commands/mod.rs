pub mod calc;
pub mod coefficients;
pub mod cost;
pub mod init;
pub mod snapshot;
pub mod state;

use std::path::{Path, PathBuf};

use capcalc_core::{
    resolve_coefficients, CoefficientSource, Coefficients, ConfigFile, FanoutProfile,
    PerformanceConfig,
};
use capcalc_state::StateStore;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "capcalc.toml";

/// Global options shared by every command.
pub struct Context {
    pub config: Option<PathBuf>,
    pub profile: FanoutProfile,
    pub state: PathBuf,
}

impl Context {
    /// The explicit `--config`, else `./capcalc.toml` if it exists.
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config {
            return Some(path.clone());
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        local.exists().then(|| local.to_path_buf())
    }

    pub fn coefficient_source(&self) -> Box<dyn CoefficientSource> {
        match self.config_path() {
            Some(path) => Box::new(ConfigFile::new(path).with_profile(self.profile)),
            None => Box::new(Coefficients::DEFAULT),
        }
    }

    /// Coefficients for this run. Falls back to the built-in set when the
    /// config cannot be used.
    pub fn coefficients(&self) -> Coefficients {
        resolve_coefficients(self.coefficient_source().as_ref())
    }

    /// The parsed config, if one is in play. Unlike [`Self::coefficients`]
    /// a broken config is an error here.
    pub fn load_config(&self) -> anyhow::Result<Option<PerformanceConfig>> {
        match self.config_path() {
            Some(path) => Ok(Some(PerformanceConfig::from_file(&path)?)),
            None => Ok(None),
        }
    }

    pub fn open_state(&self) -> anyhow::Result<StateStore> {
        Ok(StateStore::open(&self.state)?)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A context rooted in `dir` with an explicit config path, so tests never
    /// pick up a capcalc.toml from the working directory.
    pub fn context(dir: &Path) -> Context {
        Context {
            config: Some(dir.join("capcalc.toml")),
            profile: FanoutProfile::Typical,
            state: dir.join("capcalc.redb"),
        }
    }
}
