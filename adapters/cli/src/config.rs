use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use swarm_waves_core::WaveConfig;

/// Reads a TOML wave configuration, or the defaults when no path is given.
pub(crate) fn load(path: Option<&Path>) -> Result<WaveConfig> {
    let Some(path) = path else {
        return Ok(WaveConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read wave config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid wave config at {}", path.display()))
}

/// Parses TOML contents; omitted keys keep their defaults.
pub(crate) fn parse(contents: &str) -> Result<WaveConfig> {
    let config: WaveConfig =
        toml::from_str(contents).context("failed to parse wave config toml contents")?;
    validate(&config)?;
    Ok(config)
}

/// Rejects configurations the controller cannot run meaningfully.
pub(crate) fn validate(config: &WaveConfig) -> Result<()> {
    if config.max_wave == 0 {
        bail!("max_wave must be at least 1");
    }
    if config.starting_wave == 0 || config.starting_wave > config.max_wave {
        bail!(
            "starting_wave {} must lie within 1..={}",
            config.starting_wave,
            config.max_wave
        );
    }
    if config.active_cap == 0 {
        bail!("active_cap must be at least 1");
    }

    let placement = &config.placement;
    if !placement.base_radius.is_finite() || placement.base_radius <= 0.0 {
        bail!("placement.base_radius must be positive, got {}", placement.base_radius);
    }
    if !placement.ring_step.is_finite() || placement.ring_step < 0.0 {
        bail!("placement.ring_step must not be negative, got {}", placement.ring_step);
    }
    if placement.ring_capacity == 0 {
        bail!("placement.ring_capacity must be at least 1");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_waves_core::EnemyKind;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(parse("").expect("parse"), WaveConfig::default());
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let config = parse(
            r#"
            active_cap = 64
            starting_wave = 20

            [placement]
            ring_capacity = 8

            [pool_warm_sizes]
            heavy = 12
            "#,
        )
        .expect("parse");

        assert_eq!(config.active_cap, 64);
        assert_eq!(config.starting_wave, 20);
        assert_eq!(config.max_wave, 999);
        assert_eq!(config.placement.ring_capacity, 8);
        assert_eq!(config.placement.base_radius, 600.0);
        assert_eq!(config.warm_sizes().get(EnemyKind::Tank), 12);
    }

    #[test]
    fn starting_wave_beyond_max_is_rejected() {
        let error = parse("max_wave = 10\nstarting_wave = 11").expect_err("invalid");
        assert!(format!("{error:#}").contains("starting_wave"));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let error = parse("active_cap = \"many\"").expect_err("invalid");
        assert!(format!("{error:#}").contains("failed to parse wave config"));
    }

    #[test]
    fn zero_ring_capacity_is_rejected() {
        assert!(parse("[placement]\nring_capacity = 0").is_err());
    }
}
