// src/config.rs

use crate::constants::{DEFAULT_CACHE_DEPTH, MAX_CACHE_DEPTH, MIN_CACHE_DEPTH};
use crate::error::GameError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StrategyMode {
    /// Ask for several moves at once and serve them from the plan cache.
    MultiMoveCache,
    /// Ask for one move per advisory turn.
    SingleMoveAnalysis,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrategyConfig {
    pub mode: StrategyMode,
    pub cache_depth: u8,
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if (MIN_CACHE_DEPTH..=MAX_CACHE_DEPTH).contains(&self.cache_depth) {
            Ok(())
        } else {
            Err(GameError::InvalidConfig { depth: self.cache_depth })
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            mode: StrategyMode::MultiMoveCache,
            cache_depth: DEFAULT_CACHE_DEPTH,
        }
    }
}

/// Result of a successful `ConfigurationStore::set`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigChange {
    pub previous: StrategyConfig,
    pub current: StrategyConfig,
}

impl ConfigChange {
    /// Leaving the cached strategy or changing the depth makes any existing
    /// plan unusable. Entering the cached strategy starts from an empty plan
    /// too, so every real change counts.
    pub fn invalidates_plan(&self) -> bool {
        !self.is_noop()
    }

    pub fn is_noop(&self) -> bool {
        self.previous == self.current
    }
}

/// Single owner of the active strategy configuration.
#[derive(Clone, Debug, Default)]
pub struct ConfigurationStore {
    current: StrategyConfig,
}

impl ConfigurationStore {
    pub fn new(initial: StrategyConfig) -> Result<Self, GameError> {
        initial.validate()?;
        Ok(Self { current: initial })
    }

    pub fn get(&self) -> StrategyConfig {
        self.current
    }

    /// Rejects out-of-range depths and keeps the previous configuration.
    pub fn set(&mut self, config: StrategyConfig) -> Result<ConfigChange, GameError> {
        config.validate()?;
        let change = ConfigChange {
            previous: self.current,
            current: config,
        };
        self.current = config;
        if !change.is_noop() {
            info!(
                "Strategy changed: {:?} depth {} -> {:?} depth {}",
                change.previous.mode, change.previous.cache_depth, config.mode, config.cache_depth
            );
        }
        Ok(change)
    }
}

pub fn save_profile(dir: &Path, name: &str, config: &StrategyConfig) -> Result<(), GameError> {
    config.validate()?;
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.json", name));
    let json = serde_json::to_string_pretty(config)?;
    fs::File::create(path)?.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_profile(dir: &Path, name: &str) -> Result<StrategyConfig, GameError> {
    let path = dir.join(format!("{}.json", name));
    load_profile_file(&path)
}

pub fn load_profile_file(path: &Path) -> Result<StrategyConfig, GameError> {
    let json = fs::read_to_string(path)?;
    let config: StrategyConfig = serde_json::from_str(&json)?;
    config.validate()?;
    Ok(config)
}

pub fn get_profiles(dir: &Path) -> Result<Vec<String>, GameError> {
    let mut profiles = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
            if let Some(stem) = path.file_stem() {
                if let Some(name) = stem.to_str() {
                    profiles.push(name.to_string());
                }
            }
        }
    }
    profiles.sort();
    Ok(profiles)
}
