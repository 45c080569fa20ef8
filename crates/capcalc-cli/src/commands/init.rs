use std::path::Path;

use capcalc_core::PerformanceConfig;

use super::DEFAULT_CONFIG_FILE;

/// Write a config scaffold holding the built-in coefficients and VM prices.
pub fn init(path: &str) -> anyhow::Result<()> {
    let output = Path::new(path).join(DEFAULT_CONFIG_FILE);
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }

    std::fs::write(&output, PerformanceConfig::scaffold().to_toml_string()?)?;
    println!("✓ Generated {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use capcalc_core::{Coefficients, FanoutProfile};

    #[test]
    fn writes_loadable_scaffold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();

        init(path).unwrap();

        let config = PerformanceConfig::from_file(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(
            config.coefficients(FanoutProfile::Typical).unwrap(),
            Coefficients::DEFAULT
        );
        assert_eq!(config.utilization_target(), Some(0.7));
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "keep me").unwrap();

        assert!(init(path).is_err());
        let kept = std::fs::read_to_string(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(kept, "keep me");
    }
}
