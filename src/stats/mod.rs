//! Stat stores: keyed float registries for the player and the current day.
//!
//! Every key a store will ever hold is registered when the store is built.
//! Touching any other key is a logic error: the `try_*` accessors return it,
//! the plain accessors report it (debug builds) and carry on, with `get`
//! returning NaN.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::BakeryConfig;
use crate::shared::*;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatError {
    #[error("stat {key} doesn't exist in {store}")]
    UnknownKey { key: String, store: &'static str },
}

/// A key type a [`StatStore`] can be built over.
pub trait StatKey: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    const STORE: &'static str;
}

impl StatKey for PlayerTracking {
    const STORE: &'static str = "PlayerStats";
}

impl StatKey for DayTracking {
    const STORE: &'static str = "DayStats";
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatStore<K: StatKey> {
    stats: HashMap<K, f32>,
}

pub type PlayerStats = StatStore<PlayerTracking>;
pub type DayStats = StatStore<DayTracking>;

impl<K: StatKey> StatStore<K> {
    /// Build a store holding exactly `initial`'s keys.
    pub fn with_stats(initial: impl IntoIterator<Item = (K, f32)>) -> Self {
        Self {
            stats: initial.into_iter().collect(),
        }
    }

    pub fn contains(&self, key: K) -> bool {
        self.stats.contains_key(&key)
    }

    pub fn try_get(&self, key: K) -> Result<f32, StatError> {
        self.stats.get(&key).copied().ok_or_else(|| unknown(key))
    }

    pub fn try_set(&mut self, key: K, value: f32) -> Result<(), StatError> {
        let slot = self.stats.get_mut(&key).ok_or_else(|| unknown(key))?;
        *slot = value;
        Ok(())
    }

    pub fn try_modify(&mut self, key: K, delta: f32) -> Result<(), StatError> {
        let slot = self.stats.get_mut(&key).ok_or_else(|| unknown(key))?;
        *slot += delta;
        Ok(())
    }

    pub fn get(&self, key: K) -> f32 {
        self.try_get(key).unwrap_or_else(|err| {
            report(&err);
            f32::NAN
        })
    }

    pub fn set(&mut self, key: K, value: f32) {
        if let Err(err) = self.try_set(key, value) {
            report(&err);
        }
    }

    pub fn modify(&mut self, key: K, delta: f32) {
        if let Err(err) = self.try_modify(key, delta) {
            report(&err);
        }
    }

    /// Copy every value `saved` has for a key this store knows.
    /// Keys missing from `saved` keep their current value.
    pub fn restore_from(&mut self, saved: &Self) {
        for (key, value) in &saved.stats {
            match self.stats.get_mut(key) {
                Some(slot) => *slot = *value,
                None => warn!("[Stats] Ignoring saved {:?} unknown to {}", key, K::STORE),
            }
        }
    }
}

fn unknown<K: StatKey>(key: K) -> StatError {
    StatError::UnknownKey {
        key: format!("{:?}", key),
        store: K::STORE,
    }
}

fn report(err: &StatError) {
    if cfg!(debug_assertions) {
        error!("[Stats] {}", err);
    }
}

impl PlayerStats {
    pub fn for_player(config: &BakeryConfig) -> Self {
        Self::with_stats([
            (PlayerTracking::TotalBaguettes, 0.0),
            (PlayerTracking::Goodwill, config.starting_goodwill),
            (PlayerTracking::Money, config.starting_money),
            (PlayerTracking::Debt, config.starting_debt),
            (PlayerTracking::Day, 0.0),
        ])
    }
}

impl DayStats {
    pub fn for_day() -> Self {
        Self::with_stats([
            (DayTracking::BaguettesThisDay, 0.0),
            (DayTracking::BreadQuality, 0.0),
        ])
    }

    pub fn reset(&mut self) {
        *self = Self::for_day();
    }
}

pub struct StatsPlugin;

impl Plugin for StatsPlugin {
    fn build(&self, app: &mut App) {
        let config = crate::data::config(app);
        app.insert_resource(PlayerStats::for_player(&config))
            .insert_resource(DayStats::for_day());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money_only() -> PlayerStats {
        PlayerStats::with_stats([(PlayerTracking::Money, 10.0)])
    }

    #[test]
    fn test_player_defaults() {
        let stats = PlayerStats::for_player(&BakeryConfig::default());
        assert_eq!(stats.get(PlayerTracking::Goodwill), -20.0);
        assert_eq!(stats.get(PlayerTracking::Money), 100.0);
        assert_eq!(stats.get(PlayerTracking::Debt), 1000.0);
        assert_eq!(stats.get(PlayerTracking::Day), 0.0);
        assert_eq!(stats.get(PlayerTracking::TotalBaguettes), 0.0);
    }

    #[test]
    fn test_set_and_modify() {
        let mut stats = DayStats::for_day();
        stats.set(DayTracking::BreadQuality, 2.5);
        stats.modify(DayTracking::BreadQuality, -1.0);
        stats.modify(DayTracking::BaguettesThisDay, 3.0);
        assert_eq!(stats.get(DayTracking::BreadQuality), 1.5);
        assert_eq!(stats.get(DayTracking::BaguettesThisDay), 3.0);
    }

    #[test]
    fn test_unknown_key_errors() {
        let mut stats = money_only();
        let err = stats.try_get(PlayerTracking::Debt).unwrap_err();
        assert_eq!(
            err,
            StatError::UnknownKey {
                key: "Debt".into(),
                store: "PlayerStats"
            }
        );
        assert!(stats.try_set(PlayerTracking::Debt, 1.0).is_err());
        assert!(stats.try_modify(PlayerTracking::Debt, 1.0).is_err());
        assert!(!stats.contains(PlayerTracking::Debt));
    }

    #[test]
    fn test_unknown_key_get_is_nan_and_writes_are_noops() {
        let mut stats = money_only();
        assert!(stats.get(PlayerTracking::Goodwill).is_nan());
        stats.set(PlayerTracking::Goodwill, 5.0);
        stats.modify(PlayerTracking::Goodwill, 5.0);
        assert!(!stats.contains(PlayerTracking::Goodwill));
        assert_eq!(stats.get(PlayerTracking::Money), 10.0);
    }

    #[test]
    fn test_day_reset() {
        let mut stats = DayStats::for_day();
        stats.set(DayTracking::BaguettesThisDay, 12.0);
        stats.reset();
        assert_eq!(stats.get(DayTracking::BaguettesThisDay), 0.0);
    }

    #[test]
    fn test_restore_ignores_unknown_keys() {
        let mut stats = money_only();
        let saved = PlayerStats::for_player(&BakeryConfig::default());
        stats.restore_from(&saved);
        assert_eq!(stats.get(PlayerTracking::Money), 100.0);
        assert!(!stats.contains(PlayerTracking::Debt));
    }

    #[test]
    fn test_store_json_roundtrip() {
        let mut stats = PlayerStats::for_player(&BakeryConfig::default());
        stats.modify(PlayerTracking::Money, 12.5);
        let json = serde_json::to_string(&stats).unwrap();
        let back: PlayerStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }
}
