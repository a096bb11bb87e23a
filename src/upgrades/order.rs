//! The upgrade screen's basket: levels picked but not yet paid for.

use super::data::{UpgradeCatalog, UpgradeData};

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedLevel {
    pub upgrade: String,
    pub level: i32,
    pub cost: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpgradeOrder {
    projected: Vec<ProjectedLevel>,
}

impl UpgradeOrder {
    pub fn projected(&self) -> &[ProjectedLevel] {
        &self.projected
    }

    pub fn is_empty(&self) -> bool {
        self.projected.is_empty()
    }

    /// Level the basket would move `entry` to; its current level if untouched.
    pub fn projected_level(&self, entry: &UpgradeData) -> i32 {
        self.find(entry.name())
            .map_or(entry.level(), |p| p.level)
    }

    /// Pick `level` for `entry`. Picking the already projected level again
    /// takes the entry out of the basket. Returns whether the basket changed.
    pub fn store_level(&mut self, entry: &UpgradeData, level: i32) -> bool {
        if !entry.can_go_back() && level <= entry.level() {
            return false;
        }
        if level == self.projected_level(entry) {
            let before = self.projected.len();
            self.projected.retain(|p| p.upgrade != entry.name());
            return self.projected.len() != before;
        }
        let Some(value) = usize::try_from(level)
            .ok()
            .and_then(|i| entry.level_value(i))
        else {
            return false;
        };

        let projection = ProjectedLevel {
            upgrade: entry.name().to_string(),
            level,
            cost: value.cost,
        };
        match self.projected.iter_mut().find(|p| p.upgrade == entry.name()) {
            Some(existing) => *existing = projection,
            None => self.projected.push(projection),
        }
        true
    }

    pub fn projected_cost(&self) -> f32 {
        self.projected.iter().map(|p| p.cost).sum()
    }

    /// Buy everything in the basket if `money` covers it. Returns the amount
    /// to deduct, or `None` (and changes nothing) when it does not.
    pub fn confirm(&mut self, catalog: &mut UpgradeCatalog, money: f32) -> Option<f32> {
        let cost = self.projected_cost();
        if money - cost < 0.0 {
            return None;
        }
        for projection in self.projected.drain(..) {
            if let Some(entry) = catalog.entry_mut(&projection.upgrade) {
                entry.set_level(projection.level);
            }
        }
        Some(cost)
    }

    pub fn clear(&mut self) {
        self.projected.clear();
    }

    fn find(&self, upgrade: &str) -> Option<&ProjectedLevel> {
        self.projected.iter().find(|p| p.upgrade == upgrade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BakeryConfig;

    fn catalog() -> UpgradeCatalog {
        UpgradeCatalog::from_specs(&BakeryConfig::default().upgrades).unwrap()
    }

    #[test]
    fn test_store_and_cost() {
        let catalog = catalog();
        let mut order = UpgradeOrder::default();
        assert!(order.store_level(catalog.entry("Bigger Oven").unwrap(), 1));
        assert!(order.store_level(catalog.entry("Convection Fan").unwrap(), 2));
        assert_eq!(order.projected_cost(), 650.0);

        // Re-picking replaces rather than adds.
        assert!(order.store_level(catalog.entry("Bigger Oven").unwrap(), 2));
        assert_eq!(order.projected_cost(), 900.0);
        assert_eq!(order.projected().len(), 2);
    }

    #[test]
    fn test_cannot_go_back_ignores_lower_levels() {
        let catalog = catalog();
        let oven = catalog.entry("Bigger Oven").unwrap();
        let mut order = UpgradeOrder::default();
        assert!(!order.store_level(oven, 0));
        assert!(order.is_empty());
    }

    #[test]
    fn test_same_level_toggles_off() {
        let catalog = catalog();
        let oven = catalog.entry("Bigger Oven").unwrap();
        let mut order = UpgradeOrder::default();
        order.store_level(oven, 1);
        assert_eq!(order.projected_level(oven), 1);
        assert!(order.store_level(oven, 1));
        assert!(order.is_empty());
        assert_eq!(order.projected_level(oven), 0);
    }

    #[test]
    fn test_out_of_range_level_ignored() {
        let catalog = catalog();
        let mut order = UpgradeOrder::default();
        assert!(!order.store_level(catalog.entry("Bigger Oven").unwrap(), 7));
        assert!(order.is_empty());
    }

    #[test]
    fn test_confirm_requires_enough_money() {
        let mut catalog = catalog();
        let mut order = UpgradeOrder::default();
        order.store_level(catalog.entry("Convection Fan").unwrap(), 1);

        assert_eq!(order.confirm(&mut catalog, 199.0), None);
        assert_eq!(catalog.entry("Convection Fan").unwrap().level(), 0);
        assert!(!order.is_empty());

        assert_eq!(order.confirm(&mut catalog, 200.0), Some(200.0));
        assert_eq!(catalog.entry("Convection Fan").unwrap().level(), 1);
        assert!(order.is_empty());
    }

    #[test]
    fn test_can_go_back_entry_steps_down() {
        let mut catalog = catalog();
        catalog.entry_mut("Slow Dough").unwrap().set_level(1);
        let mut order = UpgradeOrder::default();
        assert!(order.store_level(catalog.entry("Slow Dough").unwrap(), 0));
        assert_eq!(order.confirm(&mut catalog, 0.0), Some(0.0));
        assert_eq!(catalog.entry("Slow Dough").unwrap().level(), 0);
    }
}
