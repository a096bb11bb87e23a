//! Upgrades domain: the catalog of purchasable upgrades and the cells they drive.
//!
//! Consumers (ovens, mostly) declare an [`UpgradeValue`] in the
//! [`UpgradeRegistry`] and keep the returned [`CellId`]. Purchases made on the
//! upgrade screen only set catalog levels; the cells pick them up when the
//! Upgrades phase ends.

pub mod data;
pub mod order;
pub mod registry;
pub mod value;

use bevy::prelude::*;

use crate::shared::*;
use crate::stats::PlayerStats;
pub use data::{LevelValue, UpgradeCatalog, UpgradeData};
pub use order::{ProjectedLevel, UpgradeOrder};
pub use registry::{CellId, UpgradeRegistry};
pub use value::{CellValue, UpgradeError, UpgradeValue, ValueKind};

/// The upgrade screen's basket plus whether the screen is up.
#[derive(Resource, Debug, Default)]
pub struct UpgradeScreen {
    pub open: bool,
    pub order: UpgradeOrder,
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Player picked a level box on the upgrade screen.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct SelectUpgradeLevel {
    pub upgrade: String,
    pub level: i32,
}

/// Player pressed confirm on the upgrade screen.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct ConfirmUpgrades;

/// Outcome of a confirm. `cost` is what was paid, zero when refused.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct UpgradesPurchased {
    pub accepted: bool,
    pub cost: f32,
}

pub struct UpgradesPlugin;

impl Plugin for UpgradesPlugin {
    fn build(&self, app: &mut App) {
        let config = crate::data::config(app);
        let catalog = UpgradeCatalog::from_specs(&config.upgrades)
            .unwrap_or_else(|err| panic!("[Upgrades] Catalog rejected: {}", err));
        let registry = UpgradeRegistry::with_catalog(catalog);

        app.insert_resource(registry)
            .init_resource::<UpgradeScreen>()
            .add_event::<SelectUpgradeLevel>()
            .add_event::<ConfirmUpgrades>()
            .add_event::<UpgradesPurchased>()
            .subscribe(open_upgrade_screen)
            .subscribe(apply_upgrades_on_exit)
            .add_systems(Update, (handle_level_selection, handle_confirm).chain());
    }
}

// ─── Listeners ───────────────────────────────────────────────────────────────

fn open_upgrade_screen(In(StateStart(state)): In<StateStart>, mut screen: ResMut<UpgradeScreen>) {
    if state == GameState::Upgrades {
        screen.open = true;
    }
}

/// Confirmed purchases reach the cells here, once the player leaves the screen.
fn apply_upgrades_on_exit(
    In(StateEnd(state)): In<StateEnd>,
    mut screen: ResMut<UpgradeScreen>,
    mut registry: ResMut<UpgradeRegistry>,
) {
    if state != GameState::Upgrades {
        return;
    }
    screen.open = false;
    screen.order.clear();
    registry.update_all_upgrades();
    info!("[Upgrades] Upgrades applied");
}

// ─── Systems ─────────────────────────────────────────────────────────────────

pub fn handle_level_selection(
    mut events: EventReader<SelectUpgradeLevel>,
    mut screen: ResMut<UpgradeScreen>,
    registry: Res<UpgradeRegistry>,
) {
    if !screen.open {
        for _ in events.read() {}
        return;
    }
    let Some(catalog) = registry.catalog() else {
        for _ in events.read() {}
        return;
    };

    for ev in events.read() {
        let Some(entry) = catalog.entry(&ev.upgrade) else {
            warn!("[Upgrades] Unknown upgrade {:?}", ev.upgrade);
            continue;
        };
        if screen.order.store_level(entry, ev.level) {
            debug!(
                "[Upgrades] Basket now costs {}",
                money_to_string(screen.order.projected_cost())
            );
        }
    }
}

pub fn handle_confirm(
    mut events: EventReader<ConfirmUpgrades>,
    mut screen: ResMut<UpgradeScreen>,
    mut registry: ResMut<UpgradeRegistry>,
    mut stats: ResMut<PlayerStats>,
    mut outcome: EventWriter<UpgradesPurchased>,
) {
    for _ in events.read() {
        if !screen.open {
            continue;
        }
        let Some(catalog) = registry.catalog_mut() else {
            continue;
        };
        let money = stats.get(PlayerTracking::Money);
        match screen.order.confirm(catalog, money) {
            Some(cost) => {
                stats.modify(PlayerTracking::Money, -cost);
                info!("[Upgrades] Bought upgrades for {}", money_to_string(cost));
                outcome.send(UpgradesPurchased {
                    accepted: true,
                    cost,
                });
            }
            None => {
                info!(
                    "[Upgrades] Cannot afford {} with {}",
                    money_to_string(screen.order.projected_cost()),
                    money_to_string(money)
                );
                outcome.send(UpgradesPurchased {
                    accepted: false,
                    cost: 0.0,
                });
            }
        }
    }
}
