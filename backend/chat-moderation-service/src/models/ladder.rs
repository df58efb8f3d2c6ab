//! Strike ladder: mute duration per strike number

use crate::error::{ModerationError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteLevel {
    pub strikes: u32,
    pub duration_minutes: u32,
}

/// Ordered strike -> duration table. Lookups past the last rung clamp to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteLadder {
    levels: Vec<MuteLevel>,
}

impl MuteLadder {
    /// Build a ladder from explicit levels; both fields must strictly increase
    pub fn new(levels: Vec<MuteLevel>) -> Result<Self> {
        if levels.is_empty() {
            return Err(ModerationError::Config(
                "mute ladder must have at least one level".to_string(),
            ));
        }

        if levels[0].strikes == 0 || levels[0].duration_minutes == 0 {
            return Err(ModerationError::Config(
                "mute ladder strikes and durations must be positive".to_string(),
            ));
        }

        for pair in levels.windows(2) {
            if pair[1].strikes <= pair[0].strikes
                || pair[1].duration_minutes <= pair[0].duration_minutes
            {
                return Err(ModerationError::Config(format!(
                    "mute ladder must be strictly increasing: {:?} -> {:?}",
                    pair[0], pair[1]
                )));
            }
        }

        Ok(Self { levels })
    }

    /// Durations for strikes 1, 2, 3, ...
    pub fn from_durations(durations: &[u32]) -> Result<Self> {
        let levels = durations
            .iter()
            .enumerate()
            .map(|(idx, &duration_minutes)| MuteLevel {
                strikes: idx as u32 + 1,
                duration_minutes,
            })
            .collect();
        Self::new(levels)
    }

    /// Parse `"5,30,1440"`
    pub fn parse(value: &str) -> Result<Self> {
        let durations = value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u32>().map_err(|e| {
                    ModerationError::Config(format!("invalid mute duration '{}': {}", part, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_durations(&durations)
    }

    /// Duration of the `strike`-th mute (1-based)
    pub fn duration_for_strike(&self, strike: u32) -> u32 {
        let idx = (strike.max(1) - 1) as usize;
        self.levels[idx.min(self.levels.len() - 1)].duration_minutes
    }

    pub fn levels(&self) -> &[MuteLevel] {
        &self.levels
    }
}

impl Default for MuteLadder {
    fn default() -> Self {
        Self {
            levels: vec![
                MuteLevel { strikes: 1, duration_minutes: 5 },
                MuteLevel { strikes: 2, duration_minutes: 30 },
                MuteLevel { strikes: 3, duration_minutes: 1440 },
            ],
        }
    }
}
