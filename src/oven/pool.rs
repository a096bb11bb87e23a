//! Per-oven cook timers.

/// A tray handed back by [`BakingPool::get_finished_tray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishedTray<T> {
    pub tray: T,
    /// Minutes past the cook goal, doubled for slow dough.
    pub overcook: u32,
}

/// Trays in one oven, each with its own minute counter. Finished trays stay
/// in the pool, still counting, until taken out.
#[derive(Debug, Clone)]
pub struct BakingPool<T> {
    trays: Vec<(T, u32)>,
    cook_minutes: u32,
    slow_dough: bool,
    paused: bool,
}

impl<T> BakingPool<T> {
    pub fn new(cook_minutes: u32) -> Self {
        Self {
            trays: Vec::new(),
            cook_minutes,
            slow_dough: false,
            paused: false,
        }
    }

    pub fn tray_count(&self) -> usize {
        self.trays.len()
    }

    pub fn cook_minutes(&self) -> u32 {
        self.cook_minutes
    }

    pub fn set_cook_minutes(&mut self, minutes: u32) {
        self.cook_minutes = minutes;
    }

    pub fn slow_dough(&self) -> bool {
        self.slow_dough
    }

    pub fn set_slow_dough(&mut self, slow: bool) {
        self.slow_dough = slow;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn add_tray(&mut self, tray: T) {
        self.trays.push((tray, 0));
    }

    /// Age every tray by one minute. Returns how many trays hit their cook
    /// goal on this exact tick.
    pub fn minute_tick(&mut self) -> usize {
        if self.paused {
            return 0;
        }
        let mut finished = 0;
        for (_, elapsed) in &mut self.trays {
            *elapsed += 1;
            if *elapsed == self.cook_minutes {
                finished += 1;
            }
        }
        finished
    }

    /// Take out the oldest tray that has reached its goal.
    pub fn get_finished_tray(&mut self) -> Option<FinishedTray<T>> {
        let goal = self.cook_minutes;
        let index = self.trays.iter().position(|(_, elapsed)| *elapsed >= goal)?;
        let (tray, elapsed) = self.trays.remove(index);
        let multiplier = if self.slow_dough { 2 } else { 1 };
        Some(FinishedTray {
            tray,
            overcook: elapsed.saturating_sub(goal) * multiplier,
        })
    }

    pub fn clear_all(&mut self) {
        self.trays.clear();
    }

    pub fn trays(&self) -> impl Iterator<Item = &T> {
        self.trays.iter().map(|(tray, _)| tray)
    }
}
