/// Difficulty presets and the immutable profile a round is played under.
///
/// A profile is validated once at construction and never mutated after.
/// Rounds share it through `Arc`, so replaying the same preset costs no copy.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// Longest code whose range `10^(n-1) ..= 10^n - 1` still fits in a `u64`.
pub const MAX_CODE_LENGTH: u32 = 18;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    /// Map a difficulty menu answer (`1`, `2`, `3`) to a preset.
    pub fn from_menu_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Difficulty::Easy),
            "2" => Some(Difficulty::Normal),
            "3" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Key of this preset in the embedded preset table.
    pub fn key(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("time limit must be at least one second")]
    ZeroTimeLimit,
    #[error("a bomb needs at least two wires, got {0}")]
    TooFewWires(usize),
    #[error("wire labels must not be empty")]
    EmptyWireLabel,
    /// Typed input is trimmed, so a padded label could never be matched.
    #[error("wire label has surrounding whitespace: {0:?}")]
    PaddedWireLabel(String),
    #[error("duplicate wire label: {0}")]
    DuplicateWire(String),
    #[error("code length must be between 1 and {MAX_CODE_LENGTH}, got {0}")]
    CodeLength(u32),
}

/// Immutable configuration a round is played under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DifficultyProfile {
    name: String,
    time_limit_secs: u32,
    wires: Vec<String>,
    code_length: u32,
}

impl DifficultyProfile {
    pub fn new(
        name: impl Into<String>,
        time_limit_secs: u32,
        wires: Vec<String>,
        code_length: u32,
    ) -> Result<Self, ProfileError> {
        if time_limit_secs == 0 {
            return Err(ProfileError::ZeroTimeLimit);
        }
        if wires.len() < 2 {
            return Err(ProfileError::TooFewWires(wires.len()));
        }
        let mut seen = HashSet::with_capacity(wires.len());
        for wire in &wires {
            if wire.trim().is_empty() {
                return Err(ProfileError::EmptyWireLabel);
            }
            if wire.trim() != wire.as_str() {
                return Err(ProfileError::PaddedWireLabel(wire.clone()));
            }
            if !seen.insert(wire.as_str()) {
                return Err(ProfileError::DuplicateWire(wire.clone()));
            }
        }
        if code_length == 0 || code_length > MAX_CODE_LENGTH {
            return Err(ProfileError::CodeLength(code_length));
        }
        Ok(DifficultyProfile {
            name: name.into(),
            time_limit_secs,
            wires,
            code_length,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    /// Wire labels in display order.
    pub fn wires(&self) -> &[String] {
        &self.wires
    }

    pub fn code_length(&self) -> u32 {
        self.code_length
    }

    pub fn has_wire(&self, label: &str) -> bool {
        self.wires.iter().any(|w| w == label)
    }
}

#[cfg(test)]
pub(crate) fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
