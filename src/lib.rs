//! Baguette library crate: the bakery's day loop as a set of Bevy plugins.
//!
//! The binary (`main.rs`) is a headless runner. This library crate exposes
//! the same modules so that `tests/` integration tests can drive the plugins
//! without a window or GPU.

pub mod shared;
pub mod data;
pub mod stats;
pub mod daytime;
pub mod flow;
pub mod market;
pub mod upgrades;
pub mod oven;
pub mod economy;
pub mod tutorial;
pub mod save;
pub mod host;

use bevy::prelude::*;

use data::BakeryConfig;

/// Every domain plugin, in dependency order, sharing one [`BakeryConfig`].
///
/// Panics while building if the config does not validate. Expects time and a scene loader to be provided by the host app
/// (`MinimalPlugins` and [`host::InstantSceneLoaderPlugin`] headless).
pub struct BakeryPlugins {
    pub config: BakeryConfig,
}

impl Default for BakeryPlugins {
    fn default() -> Self {
        Self {
            config: BakeryConfig::default(),
        }
    }
}

impl Plugin for BakeryPlugins {
    fn build(&self, app: &mut App) {
        if let Err(err) = self.config.validate() {
            panic!("[Data] Invalid bakery config: {}", err);
        }
        // Plugins read the config while building, so it goes in first.
        app.insert_resource(self.config.clone());

        app.add_plugins(data::DataPlugin)
            .add_plugins(stats::StatsPlugin)
            .add_plugins(flow::FlowPlugin)
            .add_plugins(daytime::DayTimePlugin)
            .add_plugins(market::MarketPlugin)
            .add_plugins(upgrades::UpgradesPlugin)
            .add_plugins(oven::OvenPlugin)
            .add_plugins(economy::EconomyPlugin)
            .add_plugins(tutorial::TutorialPlugin)
            .add_plugins(save::SavePlugin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "Invalid bakery config")]
    fn test_unvalidated_start_time_is_fatal() {
        let config = BakeryConfig {
            starting_day_time: "noonish".into(),
            ..Default::default()
        };
        App::new().add_plugins(BakeryPlugins { config });
    }

    #[test]
    #[should_panic(expected = "Invalid bakery config")]
    fn test_unvalidated_catalog_is_fatal() {
        let mut config = BakeryConfig::default();
        config.upgrades[0].levels[1].values[0] = "two".into();
        App::new().add_plugins(BakeryPlugins { config });
    }

    #[test]
    fn test_default_config_builds() {
        let mut app = App::new();
        app.add_plugins(BakeryPlugins::default());
        assert!(app.world().contains_resource::<BakeryConfig>());
    }
}
