use std::ops::Range;

use serde::Serialize;
use thiserror::Error;

/// Player telemetry fields in trainer concatenation order.
///
/// The first eight rise with skill, the rest fall with skill.
pub const PLAYER_TELEMETRY_FIELDS: [&str; 18] = [
    "EnemiesSpawned",
    "RoomsExplored",
    "ItemsUsed",
    "EnemiesKilled",
    "NearMissesWithEnemies",
    "NearMissesWithProjectiles",
    "BombKills",
    "RopesUsed",
    "Time",
    "LongestTimeIn1Room",
    "Jumps",
    "Attacks",
    "IdleTime",
    "EnemiesDetected",
    "DeathByAngryBob",
    "DeathByScreamer",
    "DeathByJumper",
    "DeathByTrap",
];

pub const PLAYER_TELEMETRY_SPLIT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema mismatch: expected {expected} features, found {found}")]
    Mismatch { expected: usize, found: usize },
    #[error("split index {split_index} outside 0..={n_features}")]
    InvalidSplit {
        split_index: usize,
        n_features: usize,
    },
    #[error("feature schema has no fields")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureGroup {
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: &'static [&'static str],
    split_index: usize,
}

impl FeatureSchema {
    pub fn new(names: &'static [&'static str], split_index: usize) -> Result<Self, SchemaError> {
        if names.is_empty() {
            return Err(SchemaError::Empty);
        }
        if split_index > names.len() {
            return Err(SchemaError::InvalidSplit {
                split_index,
                n_features: names.len(),
            });
        }
        Ok(Self { names, split_index })
    }

    pub fn player_telemetry_v1() -> Result<Self, SchemaError> {
        Self::new(&PLAYER_TELEMETRY_FIELDS, PLAYER_TELEMETRY_SPLIT)
    }

    pub fn names(&self) -> &'static [&'static str] {
        self.names
    }

    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    pub fn split_index(&self) -> usize {
        self.split_index
    }

    pub fn increasing(&self) -> Range<usize> {
        0..self.split_index
    }

    pub fn decreasing(&self) -> Range<usize> {
        self.split_index..self.names.len()
    }

    pub fn group_of(&self, index: usize) -> Option<FeatureGroup> {
        if index >= self.names.len() {
            None
        } else if index < self.split_index {
            Some(FeatureGroup::Increasing)
        } else {
            Some(FeatureGroup::Decreasing)
        }
    }

    /// Rejects any vector whose length differs from the schema field count.
    pub fn check_len(&self, found: usize) -> Result<(), SchemaError> {
        if found != self.names.len() {
            return Err(SchemaError::Mismatch {
                expected: self.names.len(),
                found,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub values: Vec<f32>,
}

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/features.rs"]
mod tests;
