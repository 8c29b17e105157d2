/// Difficulty preset table.
///
/// The table ships inside the binary (`assets/presets.toml`) and is decoded
/// once at startup. Nothing is read from disk.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::difficulty::{Difficulty, DifficultyProfile, ProfileError};

const EMBEDDED_PRESETS: &str = include_str!("../assets/presets.toml");

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Wall-clock length of one countdown tick.
    pub tick: Duration,
    easy: Arc<DifficultyProfile>,
    normal: Arc<DifficultyProfile>,
    hard: Arc<DifficultyProfile>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("preset table is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("preset table has no `{0}` entry")]
    MissingPreset(&'static str),
    #[error("preset `{name}` is invalid: {source}")]
    InvalidPreset {
        name: &'static str,
        #[source]
        source: ProfileError,
    },
    #[error("tick length must be at least 1 ms")]
    ZeroTick,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug)]
struct TomlConfig {
    #[serde(default)]
    timer: TomlTimer,
    presets: HashMap<String, TomlPreset>,
}

#[derive(Deserialize, Debug)]
struct TomlTimer {
    #[serde(default = "default_tick_ms")]
    tick_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlPreset {
    time_limit_secs: u32,
    wires: Vec<String>,
    code_length: u32,
}

// ── Defaults ──

fn default_tick_ms() -> u64 { 1000 }

impl Default for TomlTimer {
    fn default() -> Self {
        TomlTimer { tick_ms: default_tick_ms() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Decode the embedded preset table.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_toml(EMBEDDED_PRESETS)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let mut raw: TomlConfig = toml::from_str(text)?;
        if raw.timer.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        let mut take = |d: Difficulty| -> Result<Arc<DifficultyProfile>, ConfigError> {
            let key = d.key();
            let p = raw.presets.remove(key).ok_or(ConfigError::MissingPreset(key))?;
            DifficultyProfile::new(key, p.time_limit_secs, p.wires, p.code_length)
                .map(Arc::new)
                .map_err(|source| ConfigError::InvalidPreset { name: key, source })
        };
        let easy = take(Difficulty::Easy)?;
        let normal = take(Difficulty::Normal)?;
        let hard = take(Difficulty::Hard)?;
        if !raw.presets.is_empty() {
            let extra: Vec<_> = raw.presets.keys().collect();
            log::warn!("ignoring unknown presets: {extra:?}");
        }
        Ok(GameConfig {
            tick: Duration::from_millis(raw.timer.tick_ms),
            easy,
            normal,
            hard,
        })
    }

    pub fn profile(&self, difficulty: Difficulty) -> &Arc<DifficultyProfile> {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Normal => &self.normal,
            Difficulty::Hard => &self.hard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_presets_match_table() {
        let cfg = GameConfig::load().unwrap();
        assert_eq!(cfg.tick, Duration::from_secs(1));

        let expect = [
            (Difficulty::Easy, 90, 3, 3),
            (Difficulty::Normal, 60, 5, 4),
            (Difficulty::Hard, 45, 7, 5),
        ];
        for (d, secs, wires, digits) in expect {
            let p = cfg.profile(d);
            assert_eq!(p.name(), d.key());
            assert_eq!(p.time_limit_secs(), secs, "{d}");
            assert_eq!(p.wires().len(), wires, "{d}");
            assert_eq!(p.code_length(), digits, "{d}");
        }
    }

    #[test]
    fn harder_presets_extend_easier_wire_lists() {
        let cfg = GameConfig::load().unwrap();
        let easy = cfg.profile(Difficulty::Easy).wires();
        let hard = cfg.profile(Difficulty::Hard).wires();
        assert_eq!(&hard[..easy.len()], easy);
    }

    #[test]
    fn missing_timer_section_uses_default_tick() {
        let text = r#"
            [presets.easy]
            time_limit_secs = 5
            wires = ["a", "b"]
            code_length = 1
            [presets.normal]
            time_limit_secs = 5
            wires = ["a", "b"]
            code_length = 1
            [presets.hard]
            time_limit_secs = 5
            wires = ["a", "b"]
            code_length = 1
        "#;
        let cfg = GameConfig::from_toml(text).unwrap();
        assert_eq!(cfg.tick, Duration::from_millis(1000));
    }

    #[test]
    fn missing_preset_is_an_error() {
        let text = r#"
            [presets.easy]
            time_limit_secs = 5
            wires = ["a", "b"]
            code_length = 1
        "#;
        assert!(matches!(
            GameConfig::from_toml(text),
            Err(ConfigError::MissingPreset("normal"))
        ));
    }

    #[test]
    fn invalid_preset_names_the_preset() {
        let text = r#"
            [presets.easy]
            time_limit_secs = 5
            wires = ["a"]
            code_length = 1
            [presets.normal]
            time_limit_secs = 5
            wires = ["a", "b"]
            code_length = 1
            [presets.hard]
            time_limit_secs = 5
            wires = ["a", "b"]
            code_length = 1
        "#;
        match GameConfig::from_toml(text) {
            Err(ConfigError::InvalidPreset { name, source }) => {
                assert_eq!(name, "easy");
                assert_eq!(source, ProfileError::TooFewWires(1));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn zero_tick_is_an_error() {
        let text = "[timer]\ntick_ms = 0\n[presets]\n";
        assert!(matches!(GameConfig::from_toml(text), Err(ConfigError::ZeroTick)));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(GameConfig::from_toml("[[["), Err(ConfigError::Parse(_))));
    }
}
