//! Upgrade catalog entries and their purchasable levels.

use std::collections::HashSet;

use crate::data::UpgradeSpec;
use crate::shared::UpgradeCategory;

use super::value::{CellValue, UpgradeError, UpgradeValue, ValueKind};
use super::CellId;

#[derive(Debug, Clone, PartialEq)]
pub struct LevelValue {
    pub name: String,
    /// As authored, for display.
    pub cost_label: String,
    pub cost: f32,
    pub tooltip: String,
    /// Parallel to the entry's backend names.
    values: Vec<CellValue>,
}

impl LevelValue {
    pub fn value(&self, index: usize) -> Option<&CellValue> {
        self.values.get(index)
    }
}

/// One catalog entry: a named upgrade driving one or more cells by backend
/// name. Level -1 means the upgrade is inactive and drives nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeData {
    name: String,
    category: UpgradeCategory,
    can_go_back: bool,
    starting_level: i32,
    backend_names: Vec<String>,
    kinds: Vec<ValueKind>,
    levels: Vec<LevelValue>,
    level: i32,
    /// Every registered cell per backend name.
    linked: Vec<Vec<CellId>>,
}

impl UpgradeData {
    /// Build and validate an entry. Every raw value and cost is parsed here,
    /// so a bad catalog fails at load time rather than mid-game.
    pub fn from_spec(spec: &UpgradeSpec) -> Result<Self, UpgradeError> {
        let catalog_err = |reason: String| UpgradeError::Catalog {
            upgrade: spec.name.clone(),
            reason,
        };

        if spec.levels.is_empty() {
            return Err(catalog_err("has no levels".into()));
        }
        let mut seen = HashSet::new();
        for value in &spec.values {
            if value.backend_name.is_empty() {
                return Err(catalog_err("has an empty backend name".into()));
            }
            if !seen.insert(value.backend_name.as_str()) {
                return Err(catalog_err(format!(
                    "lists {} twice",
                    value.backend_name
                )));
            }
        }
        let max_level = spec.levels.len() as i32 - 1;
        if spec.starting_level < -1 || spec.starting_level > max_level {
            return Err(catalog_err(format!(
                "starting level {} outside -1..={}",
                spec.starting_level, max_level
            )));
        }

        let mut levels = Vec::with_capacity(spec.levels.len());
        for level in &spec.levels {
            if level.values.len() != spec.values.len() {
                return Err(catalog_err(format!(
                    "level {:?} has {} values, expected {}",
                    level.name,
                    level.values.len(),
                    spec.values.len()
                )));
            }
            let cost = level.cost.trim().parse::<f32>().map_err(|_| {
                catalog_err(format!("level {:?} has cost {:?}", level.name, level.cost))
            })?;
            let values = spec
                .values
                .iter()
                .zip(&level.values)
                .map(|(value, raw)| value.kind.parse(&value.backend_name, raw))
                .collect::<Result<Vec<_>, _>>()?;
            levels.push(LevelValue {
                name: level.name.clone(),
                cost_label: level.cost.clone(),
                cost,
                tooltip: level.tooltip.clone(),
                values,
            });
        }

        Ok(Self {
            name: spec.name.clone(),
            category: spec.category,
            can_go_back: spec.can_go_back,
            starting_level: spec.starting_level,
            backend_names: spec.values.iter().map(|v| v.backend_name.clone()).collect(),
            kinds: spec.values.iter().map(|v| v.kind).collect(),
            levels,
            level: spec.starting_level,
            linked: vec![Vec::new(); spec.values.len()],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> UpgradeCategory {
        self.category
    }

    pub fn can_go_back(&self) -> bool {
        self.can_go_back
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.level >= 0
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn backend_names(&self) -> &[String] {
        &self.backend_names
    }

    pub fn claims(&self, backend_name: &str) -> bool {
        self.backend_names.iter().any(|n| n == backend_name)
    }

    pub fn level_value(&self, level: usize) -> Option<&LevelValue> {
        self.levels.get(level)
    }

    pub fn increase_level(&mut self) {
        self.level = (self.level + 1).min(self.max_level());
    }

    pub fn decrease_level(&mut self) {
        self.level = (self.level - 1).max(0);
    }

    pub fn set_level(&mut self, level: i32) {
        self.level = level.clamp(0, self.max_level());
    }

    /// Back to the authored starting level (new game).
    pub fn reset_level(&mut self) {
        self.level = self.starting_level;
    }

    fn max_level(&self) -> i32 {
        self.levels.len() as i32 - 1
    }

    /// Link `cell` if this entry drives its backend name.
    pub fn try_register_value(
        &mut self,
        id: CellId,
        cell: &mut UpgradeValue,
    ) -> Result<bool, UpgradeError> {
        let Some(index) = self
            .backend_names
            .iter()
            .position(|n| n == cell.backend_name())
        else {
            return Ok(false);
        };
        if self.kinds[index] != cell.kind() {
            return Err(UpgradeError::KindMismatch {
                name: cell.backend_name().to_string(),
                expected: self.kinds[index],
                actual: cell.kind(),
            });
        }
        if !self.linked[index].contains(&id) {
            self.linked[index].push(id);
        }
        cell.set_registered(true);
        Ok(true)
    }

    pub fn try_deregister_value(&mut self, id: CellId) -> bool {
        let mut removed = false;
        for cells in &mut self.linked {
            let before = cells.len();
            cells.retain(|&c| c != id);
            removed |= cells.len() != before;
        }
        removed
    }

    pub fn unlink_all(&mut self) {
        for cells in &mut self.linked {
            cells.clear();
        }
    }

    /// What the current level writes into every linked cell.
    pub fn assignments(&self) -> Vec<(CellId, CellValue)> {
        self.assignments_where(|_| true)
    }

    /// Like `assignments`, restricted to one backend name.
    pub fn assignments_for(&self, backend_name: &str) -> Vec<(CellId, CellValue)> {
        self.assignments_where(|name| name == backend_name)
    }

    fn assignments_where(&self, keep: impl Fn(&str) -> bool) -> Vec<(CellId, CellValue)> {
        let Ok(level) = usize::try_from(self.level) else {
            return Vec::new();
        };
        let Some(level) = self.levels.get(level) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for (index, name) in self.backend_names.iter().enumerate() {
            if !keep(name) {
                continue;
            }
            if let Some(value) = level.value(index) {
                out.extend(self.linked[index].iter().map(|&id| (id, value.clone())));
            }
        }
        out
    }
}

/// Every upgrade the shop offers, in authored order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpgradeCatalog {
    entries: Vec<UpgradeData>,
}

impl UpgradeCatalog {
    pub fn from_specs(specs: &[UpgradeSpec]) -> Result<Self, UpgradeError> {
        let mut names = HashSet::new();
        let mut entries = Vec::with_capacity(specs.len());
        for spec in specs {
            if !names.insert(spec.name.as_str()) {
                return Err(UpgradeError::Catalog {
                    upgrade: spec.name.clone(),
                    reason: "appears twice in the catalog".into(),
                });
            }
            entries.push(UpgradeData::from_spec(spec)?);
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[UpgradeData] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [UpgradeData] {
        &mut self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&UpgradeData> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entry_mut(&mut self, name: &str) -> Option<&mut UpgradeData> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    pub fn in_category(&self, category: UpgradeCategory) -> impl Iterator<Item = &UpgradeData> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    /// Backend names driven by more than one entry.
    pub fn shared_backend_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut shared = Vec::new();
        for name in self.entries.iter().flat_map(|e| e.backend_names.iter()) {
            if !seen.insert(name.as_str()) && !shared.contains(name) {
                shared.push(name.clone());
            }
        }
        shared
    }
}
