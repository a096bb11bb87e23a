//! Shared types, resources, signals and events for Baguette.
//!
//! This is the type contract. Every domain plugin imports from here.
//! No domain imports from any other domain directly.

pub mod signal;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub use signal::{emit, subscribe, unsubscribe, EmitExt, ListenerId, SignalAppExt, Signals};

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE: the phases of a bakery day
// ═══════════════════════════════════════════════════════════════════════

/// Phases the flow ring cycles through. Declaration order is ring order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    MainMenu,
    Baking,
    Results,
    Upgrades,
    Calendar,
}

impl GameState {
    pub const ALL: [GameState; 5] = [
        GameState::MainMenu,
        GameState::Baking,
        GameState::Results,
        GameState::Upgrades,
        GameState::Calendar,
    ];
}

/// Scene the title screen lives in.
pub const MAIN_MENU_SCENE: &str = "TitleScene";
/// Scene the bakery itself lives in.
pub const PLAY_SCENE: &str = "MainScene";

// ═══════════════════════════════════════════════════════════════════════
// BREAD
// ═══════════════════════════════════════════════════════════════════════

/// Kinds of bread the shop sells. Declaration order is sell priority:
/// simpler bread goes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BreadType {
    Normal,
    Cheese,
    Sesame,
    Chocolate,
}

impl BreadType {
    pub const ALL: [BreadType; 4] = [
        BreadType::Normal,
        BreadType::Cheese,
        BreadType::Sesame,
        BreadType::Chocolate,
    ];

    /// Bread types that come from an added ingredient.
    pub const INGREDIENTS: [BreadType; 3] =
        [BreadType::Cheese, BreadType::Sesame, BreadType::Chocolate];
}

// ═══════════════════════════════════════════════════════════════════════
// STATISTICS KEYS
// ═══════════════════════════════════════════════════════════════════════

/// Player-wide statistics, kept for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerTracking {
    TotalBaguettes,
    Goodwill,
    Money,
    Debt,
    Day,
}

/// Statistics for the current day, wiped at the start of every bake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayTracking {
    BaguettesThisDay,
    BreadQuality,
}

/// Goodwill is bounded to `[-GOODWILL_LIMIT, GOODWILL_LIMIT]`.
pub const GOODWILL_LIMIT: f32 = 50.0;

// ═══════════════════════════════════════════════════════════════════════
// UPGRADES
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UpgradeCategory {
    #[default]
    Equipment,
    Ingredients,
}

// ═══════════════════════════════════════════════════════════════════════
// SIGNALS: dispatched synchronously, in subscription order
// ═══════════════════════════════════════════════════════════════════════

/// A phase has just begun (after the fade to black finished).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateStart(pub GameState);

/// A phase is about to end (before the fade to black starts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateEnd(pub GameState);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GamePaused(pub GameState);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResumed(pub GameState);

/// An in-game minute passed. Carries the time of day in in-game hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinuteTick(pub f32);

/// An in-game hour passed. Carries the time of day in in-game hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourTick(pub f32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShopOpened(pub f32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShopClosed(pub f32);

/// Overtime ran out; the bake has to end now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OvertimeEnded(pub f32);

/// A tray in `oven` just reached its cook goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrayFinished {
    pub oven: Entity,
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS: requests to and from external collaborators
// ═══════════════════════════════════════════════════════════════════════

/// Asks the host to load a scene. The host answers with [`SceneActivated`].
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct SceneLoadRequested {
    pub scene: String,
}

/// Sent by the host once `scene` is the active scene.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct SceneActivated {
    pub scene: String,
}

/// Bread arriving at the shop front.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreadSupplied {
    pub amount: u32,
    pub bread: BreadType,
}

// ═══════════════════════════════════════════════════════════════════════
// SESSION RESOURCES
// ═══════════════════════════════════════════════════════════════════════

/// Whether the current run is the endless practice bake.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PracticeMode {
    pub active: bool,
}

/// Persisted player preferences.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub tutorial_done: bool,
}

// ═══════════════════════════════════════════════════════════════════════
// FORMATTING
// ═══════════════════════════════════════════════════════════════════════

/// Format money for display, only showing decimals for non-whole amounts.
pub fn money_to_string(money: f32) -> String {
    if money % 1.0 != 0.0 {
        format!("{:.2}", money)
    } else {
        format!("{}", money)
    }
}
