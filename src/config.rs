use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{GameError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    /// Fixed RNG seed. `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_cols")]
    pub cols: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentsConfig {
    #[serde(default = "default_enemies")]
    pub enemies: usize,
    #[serde(default = "default_police")]
    pub police: usize,
    #[serde(default = "default_starting_health")]
    pub starting_health: u32,
    #[serde(default = "default_patrol_when_calm")]
    pub police_patrol_when_calm: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_main_ms")]
    pub main_ms: u64,
    #[serde(default = "default_enemy_ms")]
    pub enemy_ms: u64,
    #[serde(default = "default_enemy_aggressive_ms")]
    pub enemy_aggressive_ms: u64,
    #[serde(default = "default_police_ms")]
    pub police_ms: u64,
    #[serde(default = "default_aggression_ms")]
    pub aggression_ms: u64,
}

// Default values
fn default_rows() -> usize { 15 }
fn default_cols() -> usize { 20 }
fn default_enemies() -> usize { 1 }
fn default_police() -> usize { 1 }
fn default_starting_health() -> u32 { 3 }
fn default_patrol_when_calm() -> bool { true }
fn default_main_ms() -> u64 { 200 }
fn default_enemy_ms() -> u64 { 1000 }
fn default_enemy_aggressive_ms() -> u64 { 700 }
fn default_police_ms() -> u64 { 1000 }
fn default_aggression_ms() -> u64 { 5000 }

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            agents: AgentsConfig::default(),
            timing: TimingConfig::default(),
            seed: None,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
        }
    }
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            enemies: default_enemies(),
            police: default_police(),
            starting_health: default_starting_health(),
            police_patrol_when_calm: default_patrol_when_calm(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            main_ms: default_main_ms(),
            enemy_ms: default_enemy_ms(),
            enemy_aggressive_ms: default_enemy_aggressive_ms(),
            police_ms: default_police_ms(),
            aggression_ms: default_aggression_ms(),
        }
    }
}

impl TimingConfig {
    pub fn main(&self) -> Duration {
        Duration::from_millis(self.main_ms)
    }

    pub fn enemy(&self) -> Duration {
        Duration::from_millis(self.enemy_ms)
    }

    pub fn enemy_aggressive(&self) -> Duration {
        Duration::from_millis(self.enemy_aggressive_ms)
    }

    pub fn police(&self) -> Duration {
        Duration::from_millis(self.police_ms)
    }

    pub fn aggression(&self) -> Duration {
        Duration::from_millis(self.aggression_ms)
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| GameError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Player, exit, enemies and police each need a cell of their own.
    pub fn required_cells(&self) -> usize {
        self.agents
            .enemies
            .saturating_add(self.agents.police)
            .saturating_add(2)
    }

    pub fn validate(&self) -> Result<()> {
        let GridConfig { rows, cols } = self.grid;
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidDimensions { rows, cols });
        }
        let Some(cells) = rows.checked_mul(cols) else {
            return Err(GameError::InvalidConfig(format!(
                "a {rows}x{cols} grid is too large"
            )));
        };
        if self.required_cells() > cells {
            return Err(GameError::InvalidConfig(format!(
                "{} agents do not fit on a {rows}x{cols} grid",
                self.required_cells()
            )));
        }
        let t = &self.timing;
        for (name, ms) in [
            ("main_ms", t.main_ms),
            ("enemy_ms", t.enemy_ms),
            ("enemy_aggressive_ms", t.enemy_aggressive_ms),
            ("police_ms", t.police_ms),
            ("aggression_ms", t.aggression_ms),
        ] {
            if ms == 0 {
                return Err(GameError::InvalidConfig(format!("timing.{name} must be non-zero")));
            }
        }
        if self.agents.starting_health == 0 {
            return Err(GameError::InvalidConfig(
                "agents.starting_health must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_game_constants() {
        let config = Config::default();
        assert_eq!((config.grid.rows, config.grid.cols), (15, 20));
        assert_eq!(config.agents.starting_health, 3);
        assert_eq!(config.timing.main(), Duration::from_millis(200));
        assert_eq!(config.timing.enemy(), Duration::from_millis(1000));
        assert_eq!(config.timing.enemy_aggressive(), Duration::from_millis(700));
        assert_eq!(config.timing.police(), Duration::from_millis(1000));
        assert_eq!(config.timing.aggression(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            seed = 42

            [agents]
            enemies = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.agents.enemies, 3);
        assert_eq!(config.agents.police, 1);
        assert_eq!(config.grid, GridConfig::default());
    }

    #[test]
    fn rejects_zero_period() {
        let err = Config::from_toml_str("[timing]\nmain_ms = 0\n").unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_empty_grid() {
        let err = Config::from_toml_str("[grid]\nrows = 0\n").unwrap_err();
        assert!(matches!(err, GameError::InvalidDimensions { rows: 0, cols: 20 }));
    }

    #[test]
    fn rejects_grid_too_large_to_count() {
        let mut config = Config::default();
        config.grid.rows = usize::MAX;
        config.grid.cols = 2;
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));

        let mut config = Config::default();
        config.agents.enemies = usize::MAX;
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = Config::from_toml_str("grid = [").unwrap_err();
        assert!(matches!(err, GameError::ConfigParse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load("/nonexistent/maze-chase.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/maze-chase.toml"));
    }
}
