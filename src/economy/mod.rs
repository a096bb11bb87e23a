//! Economy domain: the end-of-day tally, the bills and the closing bell.
//!
//! Results are tallied when the Results phase starts. The calendar turns over
//! when the Calendar phase ends; debt can be paid while it is up.

use bevy::prelude::*;

use crate::data::BakeryConfig;
use crate::flow::{Flow, FlowCommandsExt};
use crate::market::SupplyDemand;
use crate::shared::*;
use crate::stats::{DayStats, PlayerStats};

pub mod bills;
pub mod results;

pub use bills::pay_bills;
pub use results::{goodwill_change, profit, DayResults};

/// Once-a-day bookings made since the day's baking began. A phase entered
/// again after an abandoned transition must not book them twice.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct DayBook {
    pub tallied: bool,
    pub page_turned: bool,
}

/// Whether ringing the bell ends the day. Armed once the shop has closed.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct EndBell {
    pub ready: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Pay as much debt as the till allows. Only honoured on the calendar.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct PayBills;

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BillsPaid {
    pub amount: f32,
    pub debt_left: f32,
}

#[derive(Event, Debug, Clone, Copy, Default)]
pub struct RingEndBell;

// ─────────────────────────────────────────────────────────────────────────────
// Plugin
// ─────────────────────────────────────────────────────────────────────────────

pub struct EconomyPlugin;

impl Plugin for EconomyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DayResults>()
            .init_resource::<DayBook>()
            .init_resource::<EndBell>()
            .add_event::<PayBills>()
            .add_event::<BillsPaid>()
            .add_event::<RingEndBell>()
            .subscribe(tally_results)
            .subscribe(turn_calendar_page)
            .subscribe(open_day_book)
            .subscribe(hang_bell_for_day)
            .subscribe(arm_bell_on_close)
            .add_systems(Update, (handle_pay_bills, ring_end_bell));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Listeners
// ─────────────────────────────────────────────────────────────────────────────

fn tally_results(
    In(StateStart(state)): In<StateStart>,
    mut results: ResMut<DayResults>,
    mut book: ResMut<DayBook>,
    mut player: ResMut<PlayerStats>,
    day: Res<DayStats>,
    ledger: Res<SupplyDemand>,
    config: Res<BakeryConfig>,
    practice: Res<PracticeMode>,
) {
    if state != GameState::Results {
        return;
    }
    if book.tallied {
        debug!("[Economy] Day {} already tallied", results.day);
        return;
    }
    book.tallied = true;

    *results = DayResults {
        day: player.get(PlayerTracking::Day),
        baguettes_made: day.get(DayTracking::BaguettesThisDay),
        sold: ledger.sold_counter(),
        practice: practice.active,
        ..Default::default()
    };

    if practice.active {
        info!(
            "[Economy] Practice day over: {} baguettes made",
            results.baguettes_made
        );
    } else {
        let change = goodwill_change(
            player.get(PlayerTracking::Goodwill),
            day.get(DayTracking::BreadQuality),
            ledger.balance(),
        );
        player.modify(PlayerTracking::Goodwill, change);

        let takings = profit(&ledger, &config);
        player.modify(PlayerTracking::Money, takings);

        results.goodwill_change = change;
        results.profit = takings;
        info!(
            "[Economy] Day {} over: {} sold, profit {}, goodwill {:+.2}",
            results.day,
            results.sold,
            money_to_string(takings),
            change
        );
    }
    results.goodwill_fill = player.get(PlayerTracking::Goodwill) / GOODWILL_LIMIT;
}

fn turn_calendar_page(
    In(StateEnd(state)): In<StateEnd>,
    mut book: ResMut<DayBook>,
    mut player: ResMut<PlayerStats>,
) {
    if state == GameState::Calendar && !book.page_turned {
        book.page_turned = true;
        player.modify(PlayerTracking::Day, 1.0);
        debug!("[Economy] Day {}", player.get(PlayerTracking::Day));
    }
}

fn open_day_book(In(StateStart(state)): In<StateStart>, mut book: ResMut<DayBook>) {
    if state == GameState::Baking {
        *book = DayBook::default();
    }
}

fn hang_bell_for_day(
    In(StateStart(state)): In<StateStart>,
    mut bell: ResMut<EndBell>,
    practice: Res<PracticeMode>,
) {
    if state == GameState::Baking {
        bell.ready = practice.active;
    }
}

fn arm_bell_on_close(In(_): In<ShopClosed>, mut bell: ResMut<EndBell>) {
    bell.ready = true;
}

// ─────────────────────────────────────────────────────────────────────────────
// Systems
// ─────────────────────────────────────────────────────────────────────────────

pub fn handle_pay_bills(
    mut requests: EventReader<PayBills>,
    mut paid: EventWriter<BillsPaid>,
    mut player: ResMut<PlayerStats>,
    flow: Res<Flow>,
) {
    for _ in requests.read() {
        if flow.current_state() != GameState::Calendar {
            debug!("[Economy] Bills can only be paid from the calendar");
            continue;
        }
        let Some(amount) = pay_bills(&mut player) else {
            continue;
        };
        let debt_left = player.get(PlayerTracking::Debt);
        info!(
            "[Economy] Paid {} towards the debt, {} left",
            money_to_string(amount),
            money_to_string(debt_left)
        );
        paid.send(BillsPaid { amount, debt_left });
    }
}

pub fn ring_end_bell(
    mut rings: EventReader<RingEndBell>,
    mut bell: ResMut<EndBell>,
    practice: Res<PracticeMode>,
    flow: Res<Flow>,
    mut commands: Commands,
) {
    for _ in rings.read() {
        if flow.current_state() != GameState::Baking || flow.is_transitioning() {
            continue;
        }
        if !(bell.ready || practice.active) {
            debug!("[Economy] The shop is still open");
            continue;
        }
        bell.ready = false;
        info!("[Economy] Bell rung, closing up for the day");
        commands.progress_flow();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsPlugin;

    fn app() -> App {
        let mut app = App::new();
        app.insert_resource(BakeryConfig::default())
            .init_resource::<SupplyDemand>()
            .init_resource::<PracticeMode>()
            .insert_resource(Flow::new(0.0, 0.0, None))
            .add_plugins((StatsPlugin, EconomyPlugin))
            .add_signal::<StateStart>()
            .add_signal::<StateEnd>()
            .add_signal::<ShopClosed>();
        app
    }

    #[test]
    fn test_results_apply_goodwill_and_profit() {
        let mut app = app();
        {
            let world = app.world_mut();
            let mut ledger = world.resource_mut::<SupplyDemand>();
            ledger.increase_supply(3, BreadType::Cheese);
            ledger.increase_demand(5);
            world
                .resource_mut::<DayStats>()
                .set(DayTracking::BreadQuality, 2.5);
        }
        emit(app.world_mut(), StateStart(GameState::Results));

        let world = app.world();
        let results = world.resource::<DayResults>();
        // Quality 2.5, two customers left empty handed.
        assert_eq!(results.goodwill_change, 0.5);
        assert_eq!(results.profit, 10.5);
        assert_eq!(results.sold, 3);
        let player = world.resource::<PlayerStats>();
        assert_eq!(player.get(PlayerTracking::Goodwill), -19.5);
        assert_eq!(player.get(PlayerTracking::Money), 110.5);
    }

    #[test]
    fn test_practice_results_touch_nothing() {
        let mut app = app();
        app.world_mut().resource_mut::<PracticeMode>().active = true;
        app.world_mut()
            .resource_mut::<DayStats>()
            .set(DayTracking::BaguettesThisDay, 4.0);
        emit(app.world_mut(), StateStart(GameState::Results));

        let world = app.world();
        let results = world.resource::<DayResults>();
        assert!(results.practice);
        assert_eq!(results.baguettes_made, 4.0);
        assert_eq!(world.resource::<PlayerStats>().get(PlayerTracking::Money), 100.0);
    }

    #[test]
    fn test_calendar_end_turns_the_day() {
        let mut app = app();
        emit(app.world_mut(), StateEnd(GameState::Calendar));
        emit(app.world_mut(), StateEnd(GameState::Results));
        assert_eq!(app.world().resource::<PlayerStats>().get(PlayerTracking::Day), 1.0);
    }

    #[test]
    fn test_reentered_phases_book_once_per_day() {
        let mut app = app();
        app.world_mut()
            .resource_mut::<SupplyDemand>()
            .increase_supply(2, BreadType::Cheese);
        app.world_mut().resource_mut::<SupplyDemand>().increase_demand(2);
        let money = |app: &App| app.world().resource::<PlayerStats>().get(PlayerTracking::Money);
        let day = |app: &App| app.world().resource::<PlayerStats>().get(PlayerTracking::Day);

        emit(app.world_mut(), StateStart(GameState::Results));
        let after_tally = money(&app);
        assert!(after_tally > 100.0);
        emit(app.world_mut(), StateStart(GameState::Results));
        assert_eq!(money(&app), after_tally);

        emit(app.world_mut(), StateEnd(GameState::Calendar));
        emit(app.world_mut(), StateEnd(GameState::Calendar));
        assert_eq!(day(&app), 1.0);

        // A new day opens a fresh book.
        emit(app.world_mut(), StateStart(GameState::Baking));
        emit(app.world_mut(), StateEnd(GameState::Calendar));
        assert_eq!(day(&app), 2.0);
    }

    #[test]
    fn test_bills_only_on_calendar() {
        let mut app = app();
        app.world_mut().send_event(PayBills);
        app.update();
        assert_eq!(app.world().resource::<PlayerStats>().get(PlayerTracking::Money), 100.0);
    }

    #[test]
    fn test_bell_arms_when_shop_closes() {
        let mut app = app();
        emit(app.world_mut(), StateStart(GameState::Baking));
        assert!(!app.world().resource::<EndBell>().ready);
        emit(app.world_mut(), ShopClosed(16.0));
        assert!(app.world().resource::<EndBell>().ready);
    }

    #[test]
    fn test_practice_bell_is_always_ready() {
        let mut app = app();
        app.world_mut().resource_mut::<PracticeMode>().active = true;
        emit(app.world_mut(), StateStart(GameState::Baking));
        assert!(app.world().resource::<EndBell>().ready);
    }
}
