//! Oven domain: dough goes in on trays and bread comes out for the shop.
//!
//! Each oven owns a [`BakingPool`] of tray entities and three upgrade cells
//! (tray capacity, cook minutes, slow dough). The pool ages trays on every
//! in-game minute while the door is shut. Opening the door hands out the
//! oldest finished tray, and delivering that tray to the shop front puts its
//! bread on the shelves.

pub mod bread;
pub mod pool;

use bevy::prelude::*;

use crate::shared::*;
use crate::stats::DayStats;
use crate::upgrades::{CellId, UpgradeRegistry, UpgradeValue};
pub use bread::{Bread, BreadEvaluation};
pub use pool::{BakingPool, FinishedTray};

pub const MAX_TRAY_CAPACITY: &str = "max_tray_capacity";
pub const BREAD_COOK_MINUTES: &str = "bread_cook_minutes";
pub const USING_SLOW_DOUGH: &str = "using_slow_dough";

/// Loaves that fit on one tray.
pub const TRAY_SPACES: usize = 4;

// ═══════════════════════════════════════════════════════════════════════
// COMPONENTS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component, Debug)]
pub struct Oven {
    pool: BakingPool<Entity>,
    door_open: bool,
    finished_trays: u32,
    max_tray_capacity: CellId,
    cook_minutes: CellId,
    slow_dough: CellId,
}

impl Oven {
    fn new(max_tray_capacity: CellId, cook_minutes: CellId, slow_dough: CellId) -> Self {
        Self {
            pool: BakingPool::new(0),
            door_open: false,
            finished_trays: 0,
            max_tray_capacity,
            cook_minutes,
            slow_dough,
        }
    }

    pub fn pool(&self) -> &BakingPool<Entity> {
        &self.pool
    }

    pub fn is_door_open(&self) -> bool {
        self.door_open
    }

    pub fn finished_trays(&self) -> u32 {
        self.finished_trays
    }

    pub fn cells(&self) -> [CellId; 3] {
        [self.max_tray_capacity, self.cook_minutes, self.slow_dough]
    }

    pub fn capacity(&self, registry: &UpgradeRegistry) -> usize {
        match registry.int(self.max_tray_capacity) {
            Ok(capacity) => usize::try_from(capacity).unwrap_or(0),
            Err(err) => {
                error!("[Oven] {}", err);
                0
            }
        }
    }

    /// Slide `tray` in if there is room.
    pub fn try_consume_tray(&mut self, tray: Entity, registry: &UpgradeRegistry) -> bool {
        if self.pool.tray_count() >= self.capacity(registry) {
            return false;
        }
        self.pool.add_tray(tray);
        true
    }

    /// Pick up cook time and slow dough from the upgrade cells.
    pub fn read_upgrades(&mut self, registry: &UpgradeRegistry) {
        match registry.int(self.cook_minutes) {
            Ok(minutes) => self
                .pool
                .set_cook_minutes(u32::try_from(minutes).unwrap_or_default()),
            Err(err) => error!("[Oven] {}", err),
        }
        match registry.flag(self.slow_dough) {
            Ok(slow) => self.pool.set_slow_dough(slow),
            Err(err) => error!("[Oven] {}", err),
        }
    }

    /// Opening pauses baking and hands out the oldest finished tray.
    pub fn open_door(&mut self) -> Option<FinishedTray<Entity>> {
        if self.door_open {
            return None;
        }
        self.door_open = true;
        self.pool.set_paused(true);
        let finished = self.pool.get_finished_tray()?;
        self.finished_trays = self.finished_trays.saturating_sub(1);
        Some(finished)
    }

    pub fn close_door(&mut self) {
        self.door_open = false;
        self.pool.set_paused(false);
    }

    fn start_day(&mut self, registry: &UpgradeRegistry) {
        self.pool.clear_all();
        self.read_upgrades(registry);
        self.finished_trays = 0;
        self.close_door();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrayStage {
    #[default]
    Prepping,
    InOven,
    Baked,
}

#[derive(Component, Debug, Clone, Default)]
pub struct Tray {
    breads: Vec<Bread>,
    stage: TrayStage,
}

impl Tray {
    pub fn with_breads(breads: impl IntoIterator<Item = Bread>) -> Self {
        let mut tray = Self::default();
        for bread in breads {
            if tray.place(bread).is_err() {
                break;
            }
        }
        tray
    }

    /// Put a loaf on the tray. A full tray hands the loaf back.
    pub fn place(&mut self, bread: Bread) -> Result<(), Bread> {
        if self.is_full() || self.stage != TrayStage::Prepping {
            return Err(bread);
        }
        self.breads.push(bread);
        Ok(())
    }

    pub fn breads(&self) -> &[Bread] {
        &self.breads
    }

    pub fn is_full(&self) -> bool {
        self.breads.len() >= TRAY_SPACES
    }

    pub fn is_empty(&self) -> bool {
        self.breads.is_empty()
    }

    pub fn stage(&self) -> TrayStage {
        self.stage
    }

    fn take_out(&mut self, overcook: u32) {
        self.stage = TrayStage::Baked;
        for bread in &mut self.breads {
            bread.set_overcook(overcook);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// RESOURCES
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Debug, Default)]
pub struct Kitchen {
    pub baking: bool,
    pub ovens: Vec<Entity>,
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTrayRequest {
    pub oven: Entity,
    pub tray: Entity,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrayLoadOutcome {
    pub oven: Entity,
    pub tray: Entity,
    pub loaded: bool,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct OvenDoorRequest {
    pub oven: Entity,
    pub open: bool,
}

/// A finished tray came out of an oven and is in the player's hands.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrayRetrieved {
    pub oven: Entity,
    pub tray: Entity,
    pub overcook: u32,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliverTrayRequest {
    pub tray: Entity,
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct TrayDelivered {
    pub tray: Entity,
    pub breads: u32,
    pub quality: f32,
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct OvenPlugin;

impl Plugin for OvenPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Kitchen>()
            .add_event::<LoadTrayRequest>()
            .add_event::<TrayLoadOutcome>()
            .add_event::<OvenDoorRequest>()
            .add_event::<TrayRetrieved>()
            .add_event::<DeliverTrayRequest>()
            .add_event::<TrayDelivered>()
            .add_event::<BreadSupplied>()
            .add_signal::<TrayFinished>()
            .subscribe(start_baking)
            .subscribe(stop_baking)
            .subscribe(cook_trays)
            .subscribe(count_finished_tray)
            .add_systems(Startup, spawn_kitchen)
            .add_systems(
                Update,
                (handle_oven_door, handle_load_tray, handle_delivery).chain(),
            );
    }
}

/// Spawn an oven with its cells registered. Needs an [`UpgradeRegistry`].
pub fn spawn_oven(world: &mut World) -> Entity {
    let mut oven = {
        let mut registry = world.resource_mut::<UpgradeRegistry>();
        let capacity = registry.init(UpgradeValue::from_int(MAX_TRAY_CAPACITY, 1));
        let minutes = registry.init(UpgradeValue::from_int(BREAD_COOK_MINUTES, 60));
        let slow = registry.init(UpgradeValue::from_bool(USING_SLOW_DOUGH, false));
        Oven::new(capacity, minutes, slow)
    };
    oven.read_upgrades(world.resource::<UpgradeRegistry>());

    let entity = world.spawn(oven).id();
    world.get_resource_or_init::<Kitchen>().ovens.push(entity);
    entity
}

/// Remove an oven and hand its cells back to the registry.
pub fn despawn_oven(world: &mut World, entity: Entity) {
    let Some(cells) = world.get::<Oven>(entity).map(Oven::cells) else {
        warn!("[Oven] {:?} is not an oven", entity);
        return;
    };
    {
        let mut registry = world.resource_mut::<UpgradeRegistry>();
        for cell in cells {
            registry.release(cell);
        }
    }
    world.despawn(entity);
    world
        .get_resource_or_init::<Kitchen>()
        .ovens
        .retain(|&o| o != entity);
}

fn spawn_kitchen(world: &mut World) {
    let count = world
        .get_resource::<crate::data::BakeryConfig>()
        .map_or(1, |config| config.oven_count);
    for _ in 0..count {
        spawn_oven(world);
    }
    info!("[Oven] Kitchen ready with {} ovens", count);
}

// ─── Listeners ───────────────────────────────────────────────────────────────

fn start_baking(
    In(StateStart(state)): In<StateStart>,
    mut kitchen: ResMut<Kitchen>,
    mut ovens: Query<&mut Oven>,
    registry: Res<UpgradeRegistry>,
) {
    if state != GameState::Baking {
        return;
    }
    kitchen.baking = true;
    for mut oven in &mut ovens {
        oven.start_day(&registry);
        debug!(
            "[Oven] Ready: {} trays, {} min, slow dough {}",
            oven.capacity(&registry),
            oven.pool.cook_minutes(),
            oven.pool.slow_dough()
        );
    }
}

/// Whatever is left in the kitchen when the day ends is thrown out.
fn stop_baking(
    In(StateEnd(state)): In<StateEnd>,
    mut kitchen: ResMut<Kitchen>,
    trays: Query<Entity, With<Tray>>,
    mut commands: Commands,
) {
    if state != GameState::Baking {
        return;
    }
    kitchen.baking = false;
    let mut thrown = 0;
    for tray in &trays {
        commands.entity(tray).despawn();
        thrown += 1;
    }
    if thrown > 0 {
        debug!("[Oven] Threw out {} trays", thrown);
    }
}

fn cook_trays(
    In(_): In<MinuteTick>,
    mut ovens: Query<(Entity, &mut Oven)>,
    mut commands: Commands,
) {
    for (entity, mut oven) in &mut ovens {
        for _ in 0..oven.pool.minute_tick() {
            commands.emit(TrayFinished { oven: entity });
        }
    }
}

fn count_finished_tray(In(TrayFinished { oven }): In<TrayFinished>, mut ovens: Query<&mut Oven>) {
    if let Ok(mut oven) = ovens.get_mut(oven) {
        oven.finished_trays += 1;
        info!("[Oven] Tray ready ({} waiting)", oven.finished_trays);
    }
}

// ─── Systems ─────────────────────────────────────────────────────────────────

pub fn handle_load_tray(
    mut requests: EventReader<LoadTrayRequest>,
    mut outcomes: EventWriter<TrayLoadOutcome>,
    kitchen: Res<Kitchen>,
    registry: Res<UpgradeRegistry>,
    mut ovens: Query<&mut Oven>,
    mut trays: Query<&mut Tray>,
) {
    if !kitchen.baking {
        for _ in requests.read() {}
        return;
    }

    for req in requests.read() {
        let loaded = match (ovens.get_mut(req.oven), trays.get_mut(req.tray)) {
            (Ok(mut oven), Ok(mut tray)) => {
                if tray.stage != TrayStage::Prepping || tray.is_empty() {
                    debug!("[Oven] Tray {:?} has nothing to bake", req.tray);
                    false
                } else if !oven.door_open {
                    debug!("[Oven] Door of {:?} is shut", req.oven);
                    false
                } else if oven.try_consume_tray(req.tray, &registry) {
                    tray.stage = TrayStage::InOven;
                    true
                } else {
                    debug!("[Oven] {:?} is full", req.oven);
                    false
                }
            }
            _ => {
                warn!("[Oven] Bad load request {:?}", req);
                false
            }
        };
        outcomes.send(TrayLoadOutcome {
            oven: req.oven,
            tray: req.tray,
            loaded,
        });
    }
}

pub fn handle_oven_door(
    mut requests: EventReader<OvenDoorRequest>,
    mut retrieved: EventWriter<TrayRetrieved>,
    kitchen: Res<Kitchen>,
    mut ovens: Query<&mut Oven>,
    mut trays: Query<&mut Tray>,
) {
    if !kitchen.baking {
        for _ in requests.read() {}
        return;
    }

    for req in requests.read() {
        let Ok(mut oven) = ovens.get_mut(req.oven) else {
            warn!("[Oven] Door request for unknown oven {:?}", req.oven);
            continue;
        };
        if !req.open {
            oven.close_door();
            continue;
        }
        let Some(finished) = oven.open_door() else {
            continue;
        };
        match trays.get_mut(finished.tray) {
            Ok(mut tray) => {
                tray.take_out(finished.overcook);
                info!(
                    "[Oven] Took out a tray, {} min overcooked",
                    finished.overcook
                );
                retrieved.send(TrayRetrieved {
                    oven: req.oven,
                    tray: finished.tray,
                    overcook: finished.overcook,
                });
            }
            Err(_) => warn!("[Oven] Finished tray {:?} no longer exists", finished.tray),
        }
    }
}

/// Baked trays dropped on the shop front: judge each loaf and stock it.
pub fn handle_delivery(
    mut requests: EventReader<DeliverTrayRequest>,
    mut supplied: EventWriter<BreadSupplied>,
    mut delivered: EventWriter<TrayDelivered>,
    kitchen: Res<Kitchen>,
    mut day: ResMut<DayStats>,
    trays: Query<&Tray>,
    mut commands: Commands,
) {
    if !kitchen.baking {
        for _ in requests.read() {}
        return;
    }

    for req in requests.read() {
        let Ok(tray) = trays.get(req.tray) else {
            warn!("[Oven] Delivery of unknown tray {:?}", req.tray);
            continue;
        };
        if tray.stage != TrayStage::Baked {
            debug!("[Oven] Tray {:?} is not baked yet", req.tray);
            continue;
        }

        let mut quality = 0.0;
        for bread in tray.breads() {
            let eval = bread.evaluate();
            supplied.send(BreadSupplied {
                amount: 1,
                bread: eval.bread,
            });
            day.modify(DayTracking::BreadQuality, eval.quality);
            quality += eval.quality;
        }
        info!(
            "[Oven] Delivered {} loaves, quality {:.2}",
            tray.breads().len(),
            quality
        );
        delivered.send(TrayDelivered {
            tray: req.tray,
            breads: tray.breads().len() as u32,
            quality,
        });
        commands.entity(req.tray).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BakeryConfig;
    use crate::stats::StatsPlugin;
    use crate::upgrades::UpgradesPlugin;

    fn app() -> App {
        let mut app = App::new();
        app.insert_resource(BakeryConfig {
            oven_count: 1,
            ..Default::default()
        })
        .add_plugins((StatsPlugin, UpgradesPlugin, OvenPlugin))
        .add_signal::<StateStart>()
        .add_signal::<StateEnd>()
        .add_signal::<MinuteTick>();
        app.update();
        emit(app.world_mut(), StateStart(GameState::Baking));
        app
    }

    fn oven(app: &App) -> Entity {
        app.world().resource::<Kitchen>().ovens[0]
    }

    fn good_bread() -> Bread {
        let mut bread = Bread::default();
        bread.roll(2.0);
        for _ in 0..3 {
            bread.slash();
        }
        bread
    }

    fn ticks(app: &mut App, n: u32) {
        for i in 0..n {
            emit(app.world_mut(), MinuteTick(i as f32 / 60.0));
        }
    }

    #[test]
    fn test_oven_reads_upgrade_cells() {
        let app = app();
        let world = app.world();
        let oven = world.get::<Oven>(oven(&app)).unwrap();
        assert_eq!(oven.pool().cook_minutes(), 60);
        assert!(!oven.pool().slow_dough());
        assert_eq!(oven.capacity(world.resource::<UpgradeRegistry>()), 1);
        assert!(!oven.is_door_open());
    }

    #[test]
    fn test_capacity_limits_trays() {
        let mut app = app();
        let oven = oven(&app);
        let first = app.world_mut().spawn(Tray::default()).id();
        let second = app.world_mut().spawn(Tray::default()).id();
        let world = app.world();
        let registry = world.resource::<UpgradeRegistry>();
        let [capacity, minutes, slow] = world.get::<Oven>(oven).unwrap().cells();
        let mut state = Oven::new(capacity, minutes, slow);
        assert!(state.try_consume_tray(first, registry));
        assert!(!state.try_consume_tray(second, registry));
        assert_eq!(state.pool().tray_count(), 1);
    }

    #[test]
    fn test_full_bake_and_delivery() {
        let mut app = app();
        let oven = oven(&app);
        let tray = app
            .world_mut()
            .spawn(Tray::with_breads([good_bread(), good_bread()]))
            .id();

        app.world_mut().send_event(OvenDoorRequest { oven, open: true });
        app.world_mut().send_event(LoadTrayRequest { oven, tray });
        app.update();
        app.world_mut().send_event(OvenDoorRequest { oven, open: false });
        app.update();
        assert_eq!(app.world().get::<Tray>(tray).unwrap().stage(), TrayStage::InOven);
        assert!(!app.world().get::<Oven>(oven).unwrap().is_door_open());

        ticks(&mut app, 60);
        assert_eq!(app.world().get::<Oven>(oven).unwrap().finished_trays(), 1);

        app.world_mut().send_event(OvenDoorRequest { oven, open: true });
        app.update();
        assert_eq!(app.world().get::<Oven>(oven).unwrap().finished_trays(), 0);
        assert_eq!(app.world().get::<Tray>(tray).unwrap().stage(), TrayStage::Baked);

        app.world_mut().send_event(DeliverTrayRequest { tray });
        app.update();
        assert!(!app.world().entities().contains(tray));
        let day = app.world().resource::<DayStats>();
        assert_eq!(day.get(DayTracking::BreadQuality), 2.0);
        // The market is not running here, so the shelf count stays put.
        assert_eq!(day.get(DayTracking::BaguettesThisDay), 0.0);
    }

    #[test]
    fn test_unbaked_tray_cannot_be_delivered() {
        let mut app = app();
        let tray = app.world_mut().spawn(Tray::with_breads([good_bread()])).id();
        app.world_mut().send_event(DeliverTrayRequest { tray });
        app.update();
        assert!(app.world().entities().contains(tray));
    }

    #[test]
    fn test_empty_tray_refused() {
        let mut app = app();
        let oven = oven(&app);
        let tray = app.world_mut().spawn(Tray::default()).id();
        app.world_mut().send_event(OvenDoorRequest { oven, open: true });
        app.world_mut().send_event(LoadTrayRequest { oven, tray });
        app.update();
        assert_eq!(app.world().get::<Tray>(tray).unwrap().stage(), TrayStage::Prepping);
        assert_eq!(app.world().get::<Oven>(oven).unwrap().pool().tray_count(), 0);
    }

    #[test]
    fn test_trays_thrown_out_when_baking_ends() {
        let mut app = app();
        let tray = app.world_mut().spawn(Tray::with_breads([good_bread()])).id();
        emit(app.world_mut(), StateEnd(GameState::Baking));
        assert!(!app.world().entities().contains(tray));
        assert!(!app.world().resource::<Kitchen>().baking);
    }

    #[test]
    fn test_despawn_oven_releases_cells() {
        let mut app = app();
        let oven = oven(&app);
        let before = app.world().resource::<UpgradeRegistry>().registered_count();
        despawn_oven(app.world_mut(), oven);
        let registry = app.world().resource::<UpgradeRegistry>();
        assert_eq!(registry.registered_count(), before - 3);
        assert!(app.world().resource::<Kitchen>().ovens.is_empty());
    }

    #[test]
    fn test_tray_holds_limited_bread() {
        let mut tray = Tray::default();
        for _ in 0..TRAY_SPACES {
            assert!(tray.place(Bread::default()).is_ok());
        }
        assert!(tray.is_full());
        assert!(tray.place(Bread::default()).is_err());
    }
}
