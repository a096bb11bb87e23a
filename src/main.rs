//! Headless runner: loads the bakery config and plays scripted days, logging
//! each day's results.
//!
//! Usage: `baguette [days]` (default 3). Frames advance by a fixed step, so a
//! run is deterministic and finishes as fast as the CPU allows.

use std::collections::HashMap;
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use baguette::data::{BakeryConfig, ConfigError, CONFIG_PATH};
use baguette::economy::{DayResults, EndBell, PayBills, RingEndBell};
use baguette::flow::{Flow, FlowCommandsExt};
use baguette::host::InstantSceneLoaderPlugin;
use baguette::oven::{
    self, Bread, DeliverTrayRequest, Kitchen, LoadTrayRequest, Oven, OvenDoorRequest, Tray,
    TrayStage, TRAY_SPACES,
};
use baguette::shared::*;
use baguette::stats::{DayStats, PlayerStats};
use baguette::tutorial::PlayRequested;
use baguette::upgrades::{
    self, ConfirmUpgrades, SelectUpgradeLevel, UpgradeRegistry, UpgradeScreen,
};
use baguette::BakeryPlugins;

/// Simulated seconds per frame.
const FRAME_STEP: Duration = Duration::from_millis(50);
const DEFAULT_DAYS: u32 = 3;
/// The upgrade the runner saves up for, one level per visit.
const WANTED_UPGRADE: &str = "Bigger Oven";

fn main() {
    let config = match BakeryConfig::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(ConfigError::Io { path, source }) => {
            eprintln!("No config at {} ({}), using defaults", path, source);
            BakeryConfig::default()
        }
        Err(e) => {
            eprintln!("Bad config: {}", e);
            std::process::exit(1);
        }
    };
    let days = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_DAYS);

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)))
        .add_plugins(LogPlugin::default())
        .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME_STEP))
        .add_plugins(InstantSceneLoaderPlugin)
        .add_plugins(BakeryPlugins { config })
        .insert_resource(Autoplay {
            days_wanted: days,
            ..default()
        })
        .add_systems(
            Update,
            (
                press_play,
                work_ovens,
                ring_bell_when_ready,
                wrap_up_results,
                shop_for_upgrades,
                settle_calendar,
            )
                .before(oven::handle_oven_door)
                .before(upgrades::handle_level_selection),
        )
        .run();
}

// ═══════════════════════════════════════════════════════════════════════
// AUTOPLAYER
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Debug, Default)]
struct Autoplay {
    days_wanted: u32,
    days_played: u32,
    /// Tray prepared for each oven, waiting to go in.
    prepared: HashMap<Entity, Entity>,
    /// Day number the upgrade screen / calendar was last handled for.
    shopped_on: Option<f32>,
    billed_on: Option<f32>,
}

fn idle_in(flow: &Flow, state: GameState) -> bool {
    flow.current_state() == state && !flow.is_transitioning()
}

/// A loaf made the way the judges like it, with a little cheese.
fn good_bread() -> Bread {
    let mut bread = Bread::default();
    bread.roll(2.0);
    for _ in 0..3 {
        bread.slash();
    }
    bread.add_ingredient(BreadType::Cheese);
    bread
}

fn press_play(flow: Res<Flow>, mut play: EventWriter<PlayRequested>, mut pressed: Local<bool>) {
    if !idle_in(&flow, GameState::MainMenu) {
        *pressed = false;
        return;
    }
    if !*pressed {
        *pressed = true;
        play.send(PlayRequested::default());
    }
}

/// One step per oven per frame: open up, put a fresh tray in, shut the door,
/// wait, then take the tray out and carry it to the shop front.
fn work_ovens(
    mut autoplay: ResMut<Autoplay>,
    flow: Res<Flow>,
    kitchen: Res<Kitchen>,
    ovens: Query<(Entity, &Oven)>,
    trays: Query<(Entity, &Tray)>,
    mut doors: EventWriter<OvenDoorRequest>,
    mut loads: EventWriter<LoadTrayRequest>,
    mut deliveries: EventWriter<DeliverTrayRequest>,
    mut commands: Commands,
) {
    if !kitchen.baking || !idle_in(&flow, GameState::Baking) {
        autoplay.prepared.clear();
        return;
    }

    for (tray, state) in &trays {
        if state.stage() == TrayStage::Baked {
            deliveries.send(DeliverTrayRequest { tray });
        }
    }

    for (entity, oven) in &ovens {
        if !oven.is_door_open() {
            if oven.finished_trays() > 0 || oven.pool().tray_count() == 0 {
                doors.send(OvenDoorRequest {
                    oven: entity,
                    open: true,
                });
            }
            continue;
        }

        match autoplay.prepared.remove(&entity) {
            Some(tray) if trays.get(tray).is_ok() => {
                loads.send(LoadTrayRequest { oven: entity, tray });
            }
            _ if oven.pool().tray_count() == 0 => {
                let tray = commands
                    .spawn(Tray::with_breads((0..TRAY_SPACES).map(|_| good_bread())))
                    .id();
                autoplay.prepared.insert(entity, tray);
            }
            _ => {
                doors.send(OvenDoorRequest {
                    oven: entity,
                    open: false,
                });
            }
        }
    }
}

fn ring_bell_when_ready(
    flow: Res<Flow>,
    bell: Res<EndBell>,
    practice: Res<PracticeMode>,
    day: Res<DayStats>,
    mut rings: EventWriter<RingEndBell>,
) {
    if !idle_in(&flow, GameState::Baking) {
        return;
    }
    // A practice day never closes; one delivered tray is enough.
    let practiced = practice.active && day.get(DayTracking::BaguettesThisDay) > 0.0;
    if bell.ready && (!practice.active || practiced) {
        rings.send(RingEndBell);
    }
}

fn wrap_up_results(
    mut autoplay: ResMut<Autoplay>,
    flow: Res<Flow>,
    results: Res<DayResults>,
    player: Res<PlayerStats>,
    mut exit: EventWriter<AppExit>,
    mut commands: Commands,
) {
    if !idle_in(&flow, GameState::Results) {
        return;
    }

    if results.practice {
        info!(
            "[Autoplay] Practice done with {} baguettes, back to the menu",
            results.baguettes_made
        );
        commands.load_scene(MAIN_MENU_SCENE);
        return;
    }

    autoplay.days_played += 1;
    info!(
        "[Autoplay] Day {}: {} sold, profit {}, goodwill {:+.2} ({:.0}% full), money {}, debt {}",
        results.day,
        results.sold,
        money_to_string(results.profit),
        results.goodwill_change,
        results.goodwill_fill * 100.0,
        money_to_string(player.get(PlayerTracking::Money)),
        money_to_string(player.get(PlayerTracking::Debt)),
    );

    if autoplay.days_played >= autoplay.days_wanted {
        info!("[Autoplay] Played {} days, stopping", autoplay.days_played);
        exit.send(AppExit::Success);
    } else {
        commands.progress_flow();
    }
}

fn shop_for_upgrades(
    mut autoplay: ResMut<Autoplay>,
    flow: Res<Flow>,
    screen: Res<UpgradeScreen>,
    player: Res<PlayerStats>,
    registry: Res<UpgradeRegistry>,
    mut select: EventWriter<SelectUpgradeLevel>,
    mut confirm: EventWriter<ConfirmUpgrades>,
    mut commands: Commands,
) {
    if !screen.open || !idle_in(&flow, GameState::Upgrades) {
        return;
    }

    let today = player.get(PlayerTracking::Day);
    if autoplay.shopped_on == Some(today) {
        commands.progress_flow();
        return;
    }
    autoplay.shopped_on = Some(today);

    let next_level = registry
        .catalog()
        .and_then(|catalog| catalog.entry(WANTED_UPGRADE))
        .map(|entry| entry.level() + 1);
    if let Some(level) = next_level {
        select.send(SelectUpgradeLevel {
            upgrade: WANTED_UPGRADE.into(),
            level,
        });
        confirm.send(ConfirmUpgrades);
    }
}

fn settle_calendar(
    mut autoplay: ResMut<Autoplay>,
    flow: Res<Flow>,
    player: Res<PlayerStats>,
    mut bills: EventWriter<PayBills>,
    mut commands: Commands,
) {
    if !idle_in(&flow, GameState::Calendar) {
        return;
    }

    let today = player.get(PlayerTracking::Day);
    if autoplay.billed_on == Some(today) {
        commands.progress_flow();
        return;
    }
    autoplay.billed_on = Some(today);
    bills.send(PayBills);
}
