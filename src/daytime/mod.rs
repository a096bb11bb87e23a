//! DayTime domain: the bakery's working-day clock.
//!
//! Converts elapsed (virtual) seconds into in-game hours while the Baking
//! phase runs and fires the clock signals:
//! - `MinuteTick` whenever the in-game minute changes (at most once a frame)
//! - `HourTick` whenever a new hour boundary is crossed
//! - `ShopOpened` / `ShopClosed` at the opening hour and at the end of work hours
//! - `OvertimeEnded` once overtime runs out, which forces the day to end
//!
//! Every signal carries the time of day in in-game hours.

mod wall_clock;

pub use wall_clock::WallClock;

use bevy::prelude::*;

use crate::data::{BakeryConfig, ConfigError};
use crate::shared::*;

/// Something the clock noticed while advancing. Dispatched in this order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockEvent {
    ShopOpened(f32),
    ShopClosed(f32),
    OvertimeEnded(f32),
    Hour(f32),
    Minute(f32),
}

#[derive(Resource, Debug, Clone)]
pub struct DayClock {
    /// Real seconds since the day started.
    elapsed: f64,
    hour_length: f64,
    work_hours: u32,
    overtime_hours: u32,
    hours_till_opening: u32,
    starting_time: WallClock,
    comparison_hour: u32,
    /// Minutes since the day started, not the minute within the hour.
    comparison_minute: u32,
    running: bool,
}

impl DayClock {
    /// Fails if the configured start of day is not a wall-clock time.
    pub fn new(config: &BakeryConfig) -> Result<Self, ConfigError> {
        let starting_time = WallClock::parse(&config.starting_day_time)
            .ok_or_else(|| ConfigError::BadStartTime(config.starting_day_time.clone()))?;
        Ok(Self {
            elapsed: 0.0,
            hour_length: config.hour_length_secs(),
            work_hours: config.work_hours,
            overtime_hours: config.overtime_hours,
            hours_till_opening: config.hours_till_opening,
            starting_time,
            comparison_hour: 0,
            comparison_minute: 0,
            running: false,
        })
    }

    /// Reset to the start of the day and run.
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.comparison_hour = 0;
        self.comparison_minute = 0;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Snap the clock to `hour:minute` into the day.
    pub fn set_time(&mut self, hour: u32, minute: u32) {
        self.comparison_hour = hour;
        self.comparison_minute = hour * 60 + minute;
        self.elapsed = self.hour_length * (hour as f64 + minute as f64 / 60.0);
    }

    /// Advance by `dt` real seconds and report what happened.
    pub fn advance(&mut self, dt: f64) -> Vec<ClockEvent> {
        if !self.running || dt <= 0.0 {
            return Vec::new();
        }

        self.elapsed += dt;
        let mut events = Vec::new();

        let minute = self.minutes_elapsed();
        if minute == self.comparison_minute {
            return events;
        }
        self.comparison_minute = minute;

        let now = self.comparison_time();
        let hour = now.floor() as u32;
        if hour > self.comparison_hour {
            let previous = self.comparison_hour;
            self.comparison_hour = hour;
            let crossed = |threshold: u32| previous < threshold && threshold <= hour;

            if crossed(self.hours_till_opening) {
                events.push(ClockEvent::ShopOpened(now));
            }
            if crossed(self.work_hours) {
                events.push(ClockEvent::ShopClosed(now));
            }
            if crossed(self.work_hours + self.overtime_hours) {
                events.push(ClockEvent::OvertimeEnded(now));
            }
            events.push(ClockEvent::Hour(now));
        }
        events.push(ClockEvent::Minute(now));
        events
    }

    /// Time of day in in-game hours.
    pub fn comparison_time(&self) -> f32 {
        (self.elapsed / self.hour_length) as f32
    }

    pub fn current_hour(&self) -> u32 {
        self.comparison_time().floor() as u32
    }

    pub fn comparison_hour(&self) -> u32 {
        self.comparison_hour
    }

    pub fn comparison_minute(&self) -> u32 {
        self.comparison_minute
    }

    /// Fraction of the working day elapsed; passes 1.0 during overtime.
    pub fn time_percentage(&self) -> f32 {
        (self.elapsed / (self.hour_length * self.work_hours as f64)) as f32
    }

    pub fn wall_time(&self) -> WallClock {
        self.starting_time.add_minutes(self.minutes_elapsed())
    }

    pub fn current_12h(&self) -> String {
        self.wall_time().format_12h()
    }

    pub fn current_24h(&self) -> String {
        self.wall_time().format_24h()
    }

    fn minutes_elapsed(&self) -> u32 {
        (self.elapsed * 60.0 / self.hour_length).floor() as u32
    }
}

pub struct DayTimePlugin;

impl Plugin for DayTimePlugin {
    fn build(&self, app: &mut App) {
        let config = crate::data::config(app);
        let clock = DayClock::new(&config)
            .unwrap_or_else(|err| panic!("[DayTime] Cannot build the day clock: {}", err));
        app.insert_resource(clock)
            .add_signal::<MinuteTick>()
            .add_signal::<HourTick>()
            .add_signal::<ShopOpened>()
            .add_signal::<ShopClosed>()
            .add_signal::<OvertimeEnded>()
            .subscribe(start_clock_on_bake)
            .subscribe(stop_clock_after_bake)
            .add_systems(Update, tick_day_clock);
    }
}

fn start_clock_on_bake(In(StateStart(state)): In<StateStart>, mut clock: ResMut<DayClock>) {
    if state != GameState::Baking {
        return;
    }
    clock.start();
    info!("[DayTime] Day started at {}", clock.current_12h());
}

fn stop_clock_after_bake(In(StateEnd(state)): In<StateEnd>, mut clock: ResMut<DayClock>) {
    if state != GameState::Baking {
        return;
    }
    clock.stop();
    info!("[DayTime] Clock stopped at {}", clock.current_12h());
}

/// Advances the clock by the frame's virtual delta and dispatches its signals.
pub fn tick_day_clock(world: &mut World) {
    let dt = world.resource::<Time>().delta_secs_f64();
    let events = world.resource_mut::<DayClock>().advance(dt);

    for event in events {
        match event {
            ClockEvent::ShopOpened(t) => {
                info!("[DayTime] Shop opened at {:.2} h", t);
                emit(world, ShopOpened(t));
            }
            ClockEvent::ShopClosed(t) => {
                info!("[DayTime] Shop closed at {:.2} h", t);
                emit(world, ShopClosed(t));
            }
            ClockEvent::OvertimeEnded(t) => {
                info!("[DayTime] Overtime over at {:.2} h, ending the day", t);
                emit(world, OvertimeEnded(t));
            }
            ClockEvent::Hour(t) => emit(world, HourTick(t)),
            ClockEvent::Minute(t) => emit(world, MinuteTick(t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 8 work hours of 15 s, 2 overtime hours, opening after 1 hour.
    fn clock() -> DayClock {
        let config = BakeryConfig {
            day_length_minutes: 2.0,
            work_hours: 8,
            overtime_hours: 2,
            hours_till_opening: 1,
            ..default()
        };
        let mut clock = DayClock::new(&config).unwrap();
        clock.start();
        clock
    }

    const MINUTE: f64 = 0.25;

    fn run_minutes(clock: &mut DayClock, minutes: u32) -> Vec<ClockEvent> {
        (0..minutes).flat_map(|_| clock.advance(MINUTE)).collect()
    }

    fn count(events: &[ClockEvent], pred: impl Fn(&ClockEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_stopped_clock_does_not_advance() {
        let mut clock = clock();
        clock.stop();
        assert!(clock.advance(100.0).is_empty());
        assert_eq!(clock.comparison_time(), 0.0);
    }

    #[test]
    fn test_minute_fires_once_per_minute_change() {
        let mut clock = clock();
        let events = run_minutes(&mut clock, 30);
        assert_eq!(count(&events, |e| matches!(e, ClockEvent::Minute(_))), 30);
        assert_eq!(count(&events, |e| matches!(e, ClockEvent::Hour(_))), 0);
    }

    #[test]
    fn test_sub_minute_steps_fire_nothing_until_boundary() {
        let mut clock = clock();
        assert!(clock.advance(0.1).is_empty());
        assert!(clock.advance(0.1).is_empty());
        let events = clock.advance(0.1);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ClockEvent::Minute(t) if (t - 0.02).abs() < 1e-5));
    }

    #[test]
    fn test_full_day_sequence() {
        let mut clock = clock();
        let events = run_minutes(&mut clock, 10 * 60);
        assert_eq!(count(&events, |e| matches!(e, ClockEvent::Hour(_))), 10);
        assert_eq!(count(&events, |e| matches!(e, ClockEvent::ShopOpened(_))), 1);
        assert_eq!(count(&events, |e| matches!(e, ClockEvent::ShopClosed(_))), 1);
        assert_eq!(count(&events, |e| matches!(e, ClockEvent::OvertimeEnded(_))), 1);

        let opened = events
            .iter()
            .position(|e| matches!(e, ClockEvent::ShopOpened(_)))
            .unwrap();
        assert!(matches!(events[opened + 1], ClockEvent::Hour(t) if (t - 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_threshold_order_within_a_frame() {
        let mut clock = clock();
        // Jump straight past the end of overtime.
        let events = clock.advance(15.0 * 10.0);
        let kinds: Vec<&str> = events
            .iter()
            .map(|e| match e {
                ClockEvent::ShopOpened(_) => "open",
                ClockEvent::ShopClosed(_) => "close",
                ClockEvent::OvertimeEnded(_) => "overtime",
                ClockEvent::Hour(_) => "hour",
                ClockEvent::Minute(_) => "minute",
            })
            .collect();
        assert_eq!(kinds, vec!["open", "close", "overtime", "hour", "minute"]);
    }

    #[test]
    fn test_opening_at_zero_never_fires() {
        let config = BakeryConfig {
            hours_till_opening: 0,
            ..default()
        };
        let mut clock = DayClock::new(&config).unwrap();
        clock.start();
        let hour = config.hour_length_secs();
        let events = clock.advance(hour * 3.0);
        assert_eq!(count(&events, |e| matches!(e, ClockEvent::ShopOpened(_))), 0);
    }

    #[test]
    fn test_clock_is_monotonic_and_resets_on_start() {
        let mut clock = clock();
        let mut last = (0, 0);
        for step in [0.1, 0.4, 3.0, 0.01, 20.0, 7.5] {
            clock.advance(step);
            let now = (clock.comparison_hour(), clock.comparison_minute());
            assert!(now.0 >= last.0 && now.1 >= last.1);
            last = now;
        }
        assert!(last.0 > 0);

        clock.start();
        assert_eq!(clock.comparison_hour(), 0);
        assert_eq!(clock.comparison_minute(), 0);
        assert_eq!(clock.comparison_time(), 0.0);
    }

    #[test]
    fn test_set_time() {
        let mut clock = clock();
        run_minutes(&mut clock, 200);
        clock.set_time(0, 0);
        assert_eq!(clock.comparison_time(), 0.0);
        assert_eq!(clock.comparison_hour(), 0);

        clock.set_time(2, 30);
        assert!((clock.comparison_time() - 2.5).abs() < 1e-6);
        assert_eq!(clock.current_24h(), "09:30");
    }

    #[test]
    fn test_time_percentage_and_display() {
        let mut clock = clock();
        clock.advance(60.0);
        assert!((clock.time_percentage() - 0.5).abs() < 1e-6);
        assert_eq!(clock.current_12h(), "11:00 AM");
        assert_eq!(clock.current_hour(), 4);
    }

    #[test]
    fn test_bad_start_time_is_rejected() {
        let config = BakeryConfig {
            starting_day_time: "breakfast".into(),
            ..default()
        };
        assert!(matches!(
            DayClock::new(&config),
            Err(ConfigError::BadStartTime(time)) if time == "breakfast"
        ));
    }

    #[test]
    #[should_panic(expected = "Cannot build the day clock")]
    fn test_plugin_refuses_bad_start_time() {
        let mut app = App::new();
        app.insert_resource(BakeryConfig {
            starting_day_time: "half past seven".into(),
            ..default()
        })
        .add_plugins(DayTimePlugin);
    }
}
