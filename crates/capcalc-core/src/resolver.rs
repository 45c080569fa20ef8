//! Coefficient resolution with fallback to the built-in set.
//!
//! A source is anything that can produce raw coefficients. The resolver
//! validates what it gets and substitutes [`Coefficients::DEFAULT`] when the
//! source fails or yields an unusable value, so a broken config never blocks
//! an estimate.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::config::{ConfigError, FanoutProfile, PerformanceConfig};
use crate::types::Coefficients;

/// Something that can yield raw coefficients.
pub trait CoefficientSource {
    fn load(&self) -> Result<Coefficients, ConfigError>;

    /// Short human-readable origin, used in logs and reports.
    fn describe(&self) -> String;
}

impl CoefficientSource for Coefficients {
    fn load(&self) -> Result<Coefficients, ConfigError> {
        Ok(*self)
    }

    fn describe(&self) -> String {
        "static coefficients".to_string()
    }
}

impl CoefficientSource for PerformanceConfig {
    fn load(&self) -> Result<Coefficients, ConfigError> {
        self.coefficients(FanoutProfile::Typical)
    }

    fn describe(&self) -> String {
        format!(
            "{} (v{})",
            self.source.as_deref().unwrap_or("performance config"),
            self.version
        )
    }
}

/// A config file on disk, re-read on every load.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    profile: FanoutProfile,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            profile: FanoutProfile::Typical,
        }
    }

    pub fn with_profile(mut self, profile: FanoutProfile) -> Self {
        self.profile = profile;
        self
    }
}

impl CoefficientSource for ConfigFile {
    fn load(&self) -> Result<Coefficients, ConfigError> {
        PerformanceConfig::from_file(&self.path)?.coefficients(self.profile)
    }

    fn describe(&self) -> String {
        match self.profile {
            FanoutProfile::Typical => self.path.display().to_string(),
            FanoutProfile::Peak => format!("{} (peak fan-out)", self.path.display()),
        }
    }
}

/// Resolve coefficients from `source`, falling back to the built-in set on
/// any load or validation failure. Never fails.
pub fn resolve_coefficients(source: &dyn CoefficientSource) -> Coefficients {
    let coefficients = match source.load() {
        Ok(c) => c,
        Err(e) => {
            warn!(
                source = %source.describe(),
                error = %e,
                "failed to load coefficients, using defaults"
            );
            return Coefficients::DEFAULT;
        }
    };

    if let Err(e) = coefficients.validate() {
        warn!(
            source = %source.describe(),
            error = %e,
            "coefficient validation failed, using defaults"
        );
        return Coefficients::DEFAULT;
    }

    debug!(
        source = %source.describe(),
        ?coefficients,
        "using configured coefficients"
    );
    coefficients
}
