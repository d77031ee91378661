//! Client configuration structures and loaders.
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use encounter_core::{EncounterConfig, StyleSet};

/// Errors raised while assembling the client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("invalid style list {value:?}")]
    Styles {
        value: String,
        #[source]
        source: strum::ParseError,
    },
}

/// Configuration required to run the encounter binary.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub encounter: EncounterConfig,
    pub session_id: Option<String>,
    pub log_dir: Option<PathBuf>,
    /// Sandbox world ticks simulated by the dry run.
    pub dry_run_ticks: u64,
    pub world_tick_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            encounter: EncounterConfig::default(),
            session_id: None,
            log_dir: None,
            dry_run_ticks: 200,
            world_tick_ms: 200,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ENCOUNTER_CONFIG` - RON file holding an encounter configuration
    /// - `ENCOUNTER_OPPONENT` - Opponent name filter
    /// - `ENCOUNTER_STYLES` - Enabled styles, e.g. `melee,ranged`
    /// - `ENCOUNTER_OFFENSIVE_POSTURES` - Keep the offensive posture on (default: false)
    /// - `ENCOUNTER_EAT_PCT`, `ENCOUNTER_RESTOCK_PCT`, `ENCOUNTER_RETREAT_PCT`,
    ///   `ENCOUNTER_BOOST_REFRESH_PCT`, `ENCOUNTER_RESOURCE_FLOOR_PCT` - Thresholds
    /// - `ENCOUNTER_TICK_MS` - Scheduler period
    /// - `ENCOUNTER_ACTION_TIMEOUT_MS` - Bound on every dispatched action
    /// - `ENCOUNTER_SEED` - Tie-break seed (default: entropy)
    /// - `ENCOUNTER_SESSION_ID` - Session identifier for log files
    /// - `ENCOUNTER_LOG_DIR` - Log directory (default: platform cache dir)
    /// - `ENCOUNTER_DRY_RUN_TICKS` - World ticks simulated by the dry run (default: 200)
    /// - `ENCOUNTER_WORLD_TICK_MS` - Sandbox world tick length (default: 200)
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source.
    pub fn from_vars(vars: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigLoadError> {
        let mut config = Self::default();
        if let Some(path) = vars("ENCOUNTER_CONFIG") {
            config.encounter = load_encounter(Path::new(&path))?;
        }
        config.apply_overrides(&vars)?;
        Ok(config)
    }

    fn apply_overrides(
        &mut self,
        vars: &impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigLoadError> {
        let encounter = &mut self.encounter;

        if let Some(name) = vars("ENCOUNTER_OPPONENT") {
            encounter.opponent_name = name;
        }
        if let Some(value) = vars("ENCOUNTER_STYLES") {
            encounter.enabled_styles = StyleSet::parse_list(&value)
                .map_err(|source| ConfigLoadError::Styles { value, source })?;
        }
        if let Some(enable) = read_env::<bool>(vars, "ENCOUNTER_OFFENSIVE_POSTURES") {
            encounter.offensive_postures = enable;
        }

        let thresholds = &mut encounter.thresholds;
        for (key, slot) in [
            ("ENCOUNTER_EAT_PCT", &mut thresholds.eat_health_pct),
            ("ENCOUNTER_RESTOCK_PCT", &mut thresholds.restock_resource_pct),
            ("ENCOUNTER_RETREAT_PCT", &mut thresholds.retreat_health_pct),
            ("ENCOUNTER_BOOST_REFRESH_PCT", &mut thresholds.boost_refresh_pct),
            ("ENCOUNTER_RESOURCE_FLOOR_PCT", &mut thresholds.resource_floor_pct),
        ] {
            if let Some(percent) = read_env::<u8>(vars, key) {
                *slot = percent;
            }
        }

        if let Some(period) = read_env::<u64>(vars, "ENCOUNTER_TICK_MS") {
            encounter.tick_period_ms = period;
        }
        if let Some(timeout) = read_env::<u64>(vars, "ENCOUNTER_ACTION_TIMEOUT_MS") {
            encounter.action_timeout_ms = timeout;
        }
        if let Some(seed) = read_env::<u64>(vars, "ENCOUNTER_SEED") {
            encounter.rng_seed = Some(seed);
        }

        self.session_id = vars("ENCOUNTER_SESSION_ID").or(self.session_id.take());
        if let Some(dir) = vars("ENCOUNTER_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(ticks) = read_env::<u64>(vars, "ENCOUNTER_DRY_RUN_TICKS") {
            self.dry_run_ticks = ticks;
        }
        if let Some(tick) = read_env::<u64>(vars, "ENCOUNTER_WORLD_TICK_MS") {
            self.world_tick_ms = tick.max(1);
        }
        Ok(())
    }
}

/// Reads an [`EncounterConfig`] from a RON file. Missing fields keep their
/// defaults.
pub fn load_encounter(path: &Path) -> Result<EncounterConfig, ConfigLoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&content).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_env<T>(vars: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
{
    vars(key)?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use encounter_core::Point;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn no_variables_yield_defaults() {
        let config = ClientConfig::from_vars(vars(&[])).expect("defaults");
        assert_eq!(config.encounter, EncounterConfig::default());
        assert_eq!(config.dry_run_ticks, 200);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn environment_overrides_thresholds_and_styles() {
        let config = ClientConfig::from_vars(vars(&[
            ("ENCOUNTER_EAT_PCT", "60"),
            ("ENCOUNTER_RETREAT_PCT", " 25 "),
            ("ENCOUNTER_STYLES", "ranged, magic"),
            ("ENCOUNTER_SEED", "42"),
            ("ENCOUNTER_TICK_MS", "not a number"),
        ]))
        .expect("overrides apply");

        let encounter = &config.encounter;
        assert_eq!(encounter.thresholds.eat_health_pct, 60);
        assert_eq!(encounter.thresholds.retreat_health_pct, 25);
        assert_eq!(encounter.enabled_styles, StyleSet::RANGED | StyleSet::MAGIC);
        assert_eq!(encounter.rng_seed, Some(42));
        assert_eq!(
            encounter.tick_period_ms,
            EncounterConfig::DEFAULT_TICK_PERIOD_MS
        );
    }

    #[test]
    fn unknown_style_is_rejected() {
        let error = ClientConfig::from_vars(vars(&[("ENCOUNTER_STYLES", "melee,archery")]))
            .expect_err("archery is not a style");
        assert!(matches!(error, ConfigLoadError::Styles { .. }));
    }

    #[test]
    fn ron_file_is_loaded_before_overrides() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"(
                opponent_name: "Tortured gorilla",
                encounter_area: (x: 10, y: 20),
                thresholds: (eat_health_pct: 65),
                tick_period_ms: 100,
            )"#
        )
        .expect("write config");
        let path = file.path().to_string_lossy().into_owned();

        let config = ClientConfig::from_vars(vars(&[
            ("ENCOUNTER_CONFIG", path.as_str()),
            ("ENCOUNTER_TICK_MS", "75"),
        ]))
        .expect("file loads");

        let encounter = &config.encounter;
        assert_eq!(encounter.opponent_name, "Tortured gorilla");
        assert_eq!(encounter.encounter_area, Point::new(10, 20));
        assert_eq!(encounter.thresholds.eat_health_pct, 65);
        assert_eq!(
            encounter.thresholds.retreat_health_pct,
            encounter_core::ThresholdConfig::DEFAULT_RETREAT_HEALTH_PCT
        );
        assert_eq!(encounter.tick_period_ms, 75);
    }

    #[test]
    fn malformed_ron_reports_the_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "(opponent_name: )").expect("write config");

        let error = load_encounter(file.path()).expect_err("malformed");
        match error {
            ConfigLoadError::Parse { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = load_encounter(&dir.path().join("absent.ron")).expect_err("missing");
        assert!(matches!(error, ConfigLoadError::Read { .. }));
    }
}
