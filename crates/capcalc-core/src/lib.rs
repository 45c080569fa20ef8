pub mod config;
pub mod error;
pub mod resolver;
pub mod types;

pub use config::{ConfigError, FanoutProfile, PerformanceConfig, VmCost};
pub use error::{CalcError, Constraint, ErrorKind};
pub use resolver::{resolve_coefficients, CoefficientSource, ConfigFile};
pub use types::*;
