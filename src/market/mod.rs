//! Market domain: bread on the shelves versus customers at the counter.
//!
//! Supply comes from trays delivered to the shop front; demand grows on the
//! clock while the shop is open. Whenever either side changes, waiting
//! customers buy what is on the shelves, simplest bread first. Unsold bread
//! stays on the shelves into the next day; unmet demand is forgotten.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::data::{BakeryConfig, DemandCurve};
use crate::daytime::DayClock;
use crate::shared::*;
use crate::stats::{DayStats, PlayerStats};

// ═══════════════════════════════════════════════════════════════════════
// LEDGER
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SupplyDemand {
    supply: HashMap<BreadType, u32>,
    sold: HashMap<BreadType, u32>,
    supply_counter: u32,
    demand_counter: u32,
    sold_counter: u32,
}

impl Default for SupplyDemand {
    fn default() -> Self {
        Self {
            supply: BreadType::ALL.iter().map(|&b| (b, 0)).collect(),
            sold: BreadType::ALL.iter().map(|&b| (b, 0)).collect(),
            supply_counter: 0,
            demand_counter: 0,
            sold_counter: 0,
        }
    }
}

impl SupplyDemand {
    pub fn increase_supply(&mut self, amount: u32, bread: BreadType) {
        *self.supply.entry(bread).or_insert(0) += amount;
        self.supply_counter += amount;
        self.settle();
    }

    pub fn increase_demand(&mut self, amount: u32) {
        self.demand_counter += amount;
        self.settle();
    }

    /// Sell one of every stocked type per pass, in priority order, until
    /// demand is met or the shelves are bare.
    fn settle(&mut self) {
        while self.demand_counter > 0 {
            let mut sold_any = false;
            for bread in BreadType::ALL {
                if self.demand_counter == 0 {
                    break;
                }
                let Some(stock) = self.supply.get_mut(&bread) else {
                    continue;
                };
                if *stock == 0 {
                    continue;
                }
                *stock -= 1;
                *self.sold.entry(bread).or_insert(0) += 1;
                self.supply_counter -= 1;
                self.sold_counter += 1;
                self.demand_counter -= 1;
                sold_any = true;
            }
            if !sold_any {
                break;
            }
        }
    }

    /// Positive: bread left over. Negative: customers left waiting.
    pub fn balance(&self) -> i64 {
        self.supply_counter as i64 - self.demand_counter as i64
    }

    pub fn supply(&self, bread: BreadType) -> u32 {
        self.supply.get(&bread).copied().unwrap_or(0)
    }

    pub fn sold(&self, bread: BreadType) -> u32 {
        self.sold.get(&bread).copied().unwrap_or(0)
    }

    pub fn supply_counter(&self) -> u32 {
        self.supply_counter
    }

    pub fn demand_counter(&self) -> u32 {
        self.demand_counter
    }

    pub fn sold_counter(&self) -> u32 {
        self.sold_counter
    }

    /// New day: sales and waiting customers reset, the shelves keep their bread.
    pub fn start_day(&mut self) {
        for count in self.sold.values_mut() {
            *count = 0;
        }
        self.sold_counter = 0;
        self.demand_counter = 0;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// DEMAND SCHEDULE
// ═══════════════════════════════════════════════════════════════════════

/// When customers arrive, and how many.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct DemandSchedule {
    /// In in-game hours.
    pub interval: f32,
    pub curve: DemandCurve,
    pub min_increase: i32,
    pub max_increase: i32,
    pub hours_till_opening: u32,
    last_increase_time: f32,
    demand_increase: i32,
    shop_open: bool,
}

impl DemandSchedule {
    pub fn new(config: &BakeryConfig) -> Self {
        Self {
            interval: config.demand_increment_interval,
            curve: config.demand_curve.clone(),
            min_increase: config.min_demand_increase,
            max_increase: config.max_demand_increase,
            hours_till_opening: config.hours_till_opening,
            last_increase_time: 0.0,
            demand_increase: config.min_demand_increase,
            shop_open: false,
        }
    }

    /// Sub-hour intervals need minute resolution.
    pub fn ticks_on_minutes(&self) -> bool {
        self.interval % 1.0 != 0.0
    }

    /// Start-of-day reset. Higher goodwill brings more customers per visit.
    pub fn start_day(&mut self, goodwill: f32) {
        let t = ((goodwill + GOODWILL_LIMIT) / (GOODWILL_LIMIT * 2.0)).clamp(0.0, 1.0);
        let lerp = self.min_increase as f32 + (self.max_increase - self.min_increase) as f32 * t;
        self.demand_increase = lerp as i32;
        self.last_increase_time = 0.0;
        self.shop_open = self.hours_till_opening == 0;
    }

    pub fn demand_increase(&self) -> i32 {
        self.demand_increase
    }

    pub fn is_shop_open(&self) -> bool {
        self.shop_open
    }

    pub fn set_shop_open(&mut self, open: bool) {
        self.shop_open = open;
    }

    /// Consume one interval if `hours` reached it. The interval is consumed
    /// even while the shop is closed.
    pub fn due(&mut self, hours: f32) -> bool {
        if hours >= self.last_increase_time + self.interval {
            self.last_increase_time += self.interval;
            true
        } else {
            false
        }
    }

    /// Customers arriving at `day_fraction` of the day.
    pub fn customers_at(&self, day_fraction: f32) -> u32 {
        let amount = self.curve.evaluate(day_fraction) * self.demand_increase as f32;
        amount.max(0.0) as u32
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct MarketPlugin;

impl Plugin for MarketPlugin {
    fn build(&self, app: &mut App) {
        let config = crate::data::config(app);
        app.init_resource::<SupplyDemand>()
            .insert_resource(DemandSchedule::new(&config))
            .add_event::<BreadSupplied>()
            .subscribe(reset_market_on_bake)
            .subscribe(open_shop)
            .subscribe(close_shop)
            .subscribe(demand_on_minute)
            .subscribe(demand_on_hour)
            .add_systems(Update, stock_shelves);
    }
}

fn reset_market_on_bake(
    In(StateStart(state)): In<StateStart>,
    mut ledger: ResMut<SupplyDemand>,
    mut schedule: ResMut<DemandSchedule>,
    mut player: ResMut<PlayerStats>,
    mut day: ResMut<DayStats>,
) {
    if state != GameState::Baking {
        return;
    }

    // Yesterday's bread goes into the lifetime total before the day stats clear.
    player.modify(
        PlayerTracking::TotalBaguettes,
        day.get(DayTracking::BaguettesThisDay),
    );
    day.reset();

    ledger.start_day();
    schedule.start_day(player.get(PlayerTracking::Goodwill));
    info!(
        "[Market] New day: {} bread carried over, {} customers per visit",
        ledger.supply_counter(),
        schedule.demand_increase()
    );
}

fn open_shop(In(_): In<ShopOpened>, mut schedule: ResMut<DemandSchedule>) {
    schedule.set_shop_open(true);
}

fn close_shop(In(_): In<ShopClosed>, mut schedule: ResMut<DemandSchedule>) {
    schedule.set_shop_open(false);
}

fn demand_on_minute(
    In(MinuteTick(hours)): In<MinuteTick>,
    schedule: ResMut<DemandSchedule>,
    ledger: ResMut<SupplyDemand>,
    clock: Res<DayClock>,
) {
    if schedule.ticks_on_minutes() {
        grow_demand(hours, schedule, ledger, &clock);
    }
}

fn demand_on_hour(
    In(HourTick(hours)): In<HourTick>,
    schedule: ResMut<DemandSchedule>,
    ledger: ResMut<SupplyDemand>,
    clock: Res<DayClock>,
) {
    if !schedule.ticks_on_minutes() {
        grow_demand(hours, schedule, ledger, &clock);
    }
}

fn grow_demand(
    hours: f32,
    mut schedule: ResMut<DemandSchedule>,
    mut ledger: ResMut<SupplyDemand>,
    clock: &DayClock,
) {
    if !schedule.due(hours) || !schedule.is_shop_open() {
        return;
    }
    let customers = schedule.customers_at(clock.time_percentage());
    ledger.increase_demand(customers);
    debug!(
        "[Market] {} customers at {:.2} h, {} sold today",
        customers,
        hours,
        ledger.sold_counter()
    );
}

/// Puts delivered bread on the shelves and counts it towards today's bake.
pub fn stock_shelves(
    mut events: EventReader<BreadSupplied>,
    mut ledger: ResMut<SupplyDemand>,
    mut day: ResMut<DayStats>,
) {
    for ev in events.read() {
        day.modify(DayTracking::BaguettesThisDay, ev.amount as f32);
        ledger.increase_supply(ev.amount, ev.bread);
        debug!("[Market] +{} {:?} on the shelves", ev.amount, ev.bread);
    }
}
