//! End-of-day tally: goodwill swing and takings.

use bevy::prelude::*;

use crate::data::BakeryConfig;
use crate::market::SupplyDemand;
use crate::shared::*;

/// What the results screen shows for the day just finished.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct DayResults {
    pub day: f32,
    pub baguettes_made: f32,
    pub sold: u32,
    pub profit: f32,
    pub goodwill_change: f32,
    /// Goodwill after the change, as a fraction of [`GOODWILL_LIMIT`].
    pub goodwill_fill: f32,
    /// Practice days only report what was baked.
    pub practice: bool,
}

/// How far goodwill moves today. The closer goodwill already is to either
/// limit, the less it can move; every unserved customer costs one point.
pub fn goodwill_change(goodwill: f32, quality: f32, balance: i64) -> f32 {
    let max_change = (GOODWILL_LIMIT - goodwill.abs()).max(0.0);
    let unserved = balance.min(0) as f32;
    (quality + unserved).clamp(-max_change, max_change)
}

/// Takings for everything sold today. Bread without a price earns nothing.
pub fn profit(ledger: &SupplyDemand, config: &BakeryConfig) -> f32 {
    BreadType::ALL
        .iter()
        .map(|&bread| {
            let sold = ledger.sold(bread);
            match config.bread_price(bread) {
                Some(price) => sold as f32 * price,
                None => {
                    if sold > 0 {
                        warn!("[Economy] No price for {:?}, {} sold for nothing", bread, sold);
                    }
                    0.0
                }
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goodwill_moves_by_quality() {
        assert_eq!(goodwill_change(0.0, 3.5, 2), 3.5);
        assert_eq!(goodwill_change(0.0, -2.0, 0), -2.0);
    }

    #[test]
    fn test_unserved_customers_cost_goodwill() {
        // Five customers left without bread.
        assert_eq!(goodwill_change(-20.0, 3.0, -5), -2.0);
    }

    #[test]
    fn test_change_shrinks_near_limits() {
        // 50 - |45| = 5
        assert_eq!(goodwill_change(45.0, 12.0, 0), 5.0);
        assert_eq!(goodwill_change(-45.0, -30.0, 0), -5.0);
        assert_eq!(goodwill_change(50.0, 10.0, 0), 0.0);
    }

    #[test]
    fn test_profit_prices_each_bread() {
        let config = BakeryConfig::default();
        let mut ledger = SupplyDemand::default();
        ledger.increase_supply(2, BreadType::Normal);
        ledger.increase_supply(1, BreadType::Chocolate);
        ledger.increase_demand(3);
        // 2 x 2.0 + 1 x 4.5
        assert_eq!(profit(&ledger, &config), 8.5);
    }

    #[test]
    fn test_unpriced_bread_earns_nothing() {
        let mut config = BakeryConfig::default();
        config.bread_prices.remove(&BreadType::Cheese);
        let mut ledger = SupplyDemand::default();
        ledger.increase_supply(1, BreadType::Cheese);
        ledger.increase_demand(1);
        assert_eq!(profit(&ledger, &config), 0.0);
    }
}
