//! Data layer: the bakery's authored configuration.
//!
//! `BakeryConfig` is read once at session start (from RON, or the compiled-in
//! default which mirrors `assets/config/bakery.ron`) and validated before any
//! domain plugin sees it. Every domain reads its tuning values from here at
//! build time; nothing in the config changes while the game runs.

use std::collections::HashMap;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::*;
use crate::upgrades::{UpgradeCatalog, UpgradeError, ValueKind};

/// Default location of the shipped config, relative to the working directory.
pub const CONFIG_PATH: &str = "assets/config/bakery.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("could not parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("starting day time {0:?} is not a valid wall time")]
    BadStartTime(String),
    #[error("demand curve needs at least one keyframe")]
    EmptyDemandCurve,
    #[error("demand curve keyframes must be sorted by time")]
    UnsortedDemandCurve,
    #[error("minimum demand increase {min} is larger than maximum {max}")]
    DemandIncreaseRange { min: i32, max: i32 },
    #[error("upgrade catalog: {0}")]
    Catalog(#[from] UpgradeError),
}

// ═══════════════════════════════════════════════════════════════════════
// DEMAND CURVE
// ═══════════════════════════════════════════════════════════════════════

/// Piecewise-linear curve over the fraction of the day elapsed.
/// Outside the first/last keyframe the curve holds the end value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandCurve {
    pub keys: Vec<(f32, f32)>,
}

impl DemandCurve {
    pub fn new(keys: Vec<(f32, f32)>) -> Self {
        Self { keys }
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        let Some(&(first_t, first_v)) = self.keys.first() else {
            return 0.0;
        };
        if t <= first_t {
            return first_v;
        }
        for pair in self.keys.windows(2) {
            let (t0, v0) = pair[0];
            let (t1, v1) = pair[1];
            if t <= t1 {
                let span = t1 - t0;
                if span <= f32::EPSILON {
                    return v1;
                }
                return v0 + (v1 - v0) * (t - t0) / span;
            }
        }
        self.keys.last().map(|&(_, v)| v).unwrap_or(first_v)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.keys.is_empty() {
            return Err(ConfigError::EmptyDemandCurve);
        }
        if self.keys.windows(2).any(|pair| pair[1].0 < pair[0].0) {
            return Err(ConfigError::UnsortedDemandCurve);
        }
        Ok(())
    }
}

impl Default for DemandCurve {
    fn default() -> Self {
        // Quiet morning, rush at midday, tailing off toward closing.
        Self::new(vec![(0.0, 0.2), (0.5, 1.0), (1.0, 0.3)])
    }
}

// ═══════════════════════════════════════════════════════════════════════
// UPGRADE CATALOG DEFINITIONS
// ═══════════════════════════════════════════════════════════════════════

/// One upgradable value an entry drives, by backend name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSpec {
    pub backend_name: String,
    pub kind: ValueKind,
}

/// One purchasable level. `values` is parallel to the entry's `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub name: String,
    pub cost: String,
    #[serde(default)]
    pub tooltip: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeSpec {
    pub name: String,
    #[serde(default)]
    pub category: UpgradeCategory,
    #[serde(default)]
    pub can_go_back: bool,
    #[serde(default = "inactive_level")]
    pub starting_level: i32,
    pub values: Vec<ValueSpec>,
    pub levels: Vec<LevelSpec>,
}

fn inactive_level() -> i32 {
    -1
}

fn level(name: &str, cost: &str, tooltip: &str, value: &str) -> LevelSpec {
    LevelSpec {
        name: name.into(),
        cost: cost.into(),
        tooltip: tooltip.into(),
        values: vec![value.into()],
    }
}

fn default_catalog() -> Vec<UpgradeSpec> {
    vec![
        UpgradeSpec {
            name: "Bigger Oven".into(),
            category: UpgradeCategory::Equipment,
            can_go_back: false,
            starting_level: 0,
            values: vec![ValueSpec {
                backend_name: "max_tray_capacity".into(),
                kind: ValueKind::Int,
            }],
            levels: vec![
                level("Single rack", "0", "Holds one tray.", "1"),
                level("Double rack", "150", "Holds two trays at once.", "2"),
                level("Triple rack", "400", "Holds three trays at once.", "3"),
            ],
        },
        UpgradeSpec {
            name: "Convection Fan".into(),
            category: UpgradeCategory::Equipment,
            can_go_back: false,
            starting_level: 0,
            values: vec![ValueSpec {
                backend_name: "bread_cook_minutes".into(),
                kind: ValueKind::Int,
            }],
            levels: vec![
                level("No fan", "0", "Bread takes an hour.", "60"),
                level("Small fan", "200", "Bread takes 45 minutes.", "45"),
                level("Big fan", "500", "Bread takes half an hour.", "30"),
            ],
        },
        UpgradeSpec {
            name: "Slow Dough".into(),
            category: UpgradeCategory::Ingredients,
            can_go_back: true,
            starting_level: -1,
            values: vec![ValueSpec {
                backend_name: "using_slow_dough".into(),
                kind: ValueKind::Bool,
            }],
            levels: vec![
                level("Regular dough", "0", "Forgiving dough.", "false"),
                level(
                    "Slow dough",
                    "50",
                    "Tastier, but burns twice as fast.",
                    "true",
                ),
            ],
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════
// BAKERY CONFIG
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeryConfig {
    /// Real minutes in a working day (overtime excluded).
    pub day_length_minutes: f32,
    pub work_hours: u32,
    pub overtime_hours: u32,
    pub hours_till_opening: u32,
    /// Wall time the day starts at, e.g. "7:00 AM".
    pub starting_day_time: String,
    pub demand_curve: DemandCurve,
    /// In in-game hours; fractional values tick on minutes.
    pub demand_increment_interval: f32,
    pub min_demand_increase: i32,
    pub max_demand_increase: i32,
    /// Seconds.
    pub fade_time: f32,
    /// Seconds spent fully faded before the next phase starts.
    pub fade_delay: f32,
    /// Give up waiting for a scene after this many seconds.
    pub scene_wait_timeout: Option<f32>,
    pub bread_prices: HashMap<BreadType, f32>,
    pub starting_money: f32,
    pub starting_debt: f32,
    pub starting_goodwill: f32,
    /// Ovens in the kitchen at startup.
    pub oven_count: u32,
    pub upgrades: Vec<UpgradeSpec>,
}

impl Default for BakeryConfig {
    fn default() -> Self {
        Self {
            day_length_minutes: 8.0,
            work_hours: 8,
            overtime_hours: 2,
            hours_till_opening: 1,
            starting_day_time: "7:00 AM".into(),
            demand_curve: DemandCurve::default(),
            demand_increment_interval: 0.5,
            min_demand_increase: 1,
            max_demand_increase: 6,
            fade_time: 0.5,
            fade_delay: 0.25,
            scene_wait_timeout: Some(30.0),
            bread_prices: HashMap::from([
                (BreadType::Normal, 2.0),
                (BreadType::Cheese, 3.5),
                (BreadType::Sesame, 3.0),
                (BreadType::Chocolate, 4.5),
            ]),
            starting_money: 100.0,
            starting_debt: 1000.0,
            starting_goodwill: -20.0,
            oven_count: 2,
            upgrades: default_catalog(),
        }
    }
}

impl BakeryConfig {
    /// Parse and validate a RON document.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::de::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.day_length_minutes <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "day_length_minutes",
                value: self.day_length_minutes,
            });
        }
        if self.work_hours == 0 {
            return Err(ConfigError::NonPositive {
                field: "work_hours",
                value: 0.0,
            });
        }
        if self.demand_increment_interval <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "demand_increment_interval",
                value: self.demand_increment_interval,
            });
        }
        if crate::daytime::WallClock::parse(&self.starting_day_time).is_none() {
            return Err(ConfigError::BadStartTime(self.starting_day_time.clone()));
        }
        self.demand_curve.validate()?;
        if self.min_demand_increase > self.max_demand_increase {
            return Err(ConfigError::DemandIncreaseRange {
                min: self.min_demand_increase,
                max: self.max_demand_increase,
            });
        }
        UpgradeCatalog::from_specs(&self.upgrades)?;
        Ok(())
    }

    /// Real seconds in one in-game hour.
    pub fn hour_length_secs(&self) -> f64 {
        self.day_length_secs() / self.work_hours as f64
    }

    /// Real seconds in the working day.
    pub fn day_length_secs(&self) -> f64 {
        self.day_length_minutes as f64 * 60.0
    }

    pub fn bread_price(&self, bread: BreadType) -> Option<f32> {
        self.bread_prices.get(&bread).copied()
    }
}

/// Config as seen by plugins at build time. Falls back to the default when
/// a plugin is added on its own.
pub fn config(app: &App) -> BakeryConfig {
    app.world()
        .get_resource::<BakeryConfig>()
        .cloned()
        .unwrap_or_default()
}

pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BakeryConfig>()
            .add_systems(Startup, log_config);
    }
}

fn log_config(config: Res<BakeryConfig>) {
    info!(
        "[Data] Day: {} min over {} work hours (+{} overtime), shop opens after {} h",
        config.day_length_minutes,
        config.work_hours,
        config.overtime_hours,
        config.hours_till_opening
    );
    info!(
        "[Data] {} upgrade entries, {} ovens",
        config.upgrades.len(),
        config.oven_count
    );
}
