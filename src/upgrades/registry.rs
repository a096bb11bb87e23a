use std::collections::HashMap;

use bevy::prelude::*;

use super::data::UpgradeCatalog;
use super::value::{CellValue, UpgradeError, UpgradeValue};

/// Handle to a cell owned by the [`UpgradeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub(crate) u32);

/// Session-scoped home of every upgrade cell, plus the catalog that drives
/// them. Consumers declare their cells here and read them back by id.
#[derive(Resource, Debug, Default)]
pub struct UpgradeRegistry {
    cells: HashMap<CellId, UpgradeValue>,
    /// Registered cells, in registration order.
    registered: Vec<CellId>,
    catalog: Option<UpgradeCatalog>,
    next_id: u32,
}

impl UpgradeRegistry {
    pub fn with_catalog(catalog: UpgradeCatalog) -> Self {
        let mut registry = Self::default();
        registry.install_catalog(catalog);
        registry
    }

    /// Take ownership of `cell` without registering it.
    pub fn declare(&mut self, cell: UpgradeValue) -> CellId {
        let id = CellId(self.next_id);
        self.next_id += 1;
        self.cells.insert(id, cell);
        id
    }

    /// Declare and register in one go.
    pub fn init(&mut self, cell: UpgradeValue) -> CellId {
        let id = self.declare(cell);
        if let Err(err) = self.register(id) {
            error!("[Upgrades] {}", err);
        }
        id
    }

    /// Start driving `id` from the catalog and push its current level value
    /// into it. Registering twice changes nothing.
    pub fn register(&mut self, id: CellId) -> Result<(), UpgradeError> {
        let cell = self.cells.get_mut(&id).ok_or(UpgradeError::UnknownCell(id))?;
        if cell.is_registered() || cell.backend_name().is_empty() {
            return Ok(());
        }
        let name = cell.backend_name().to_string();
        if !self.registered.contains(&id) {
            self.registered.push(id);
        }

        let Some(catalog) = self.catalog.as_mut() else {
            return Ok(());
        };
        let mut claimed = false;
        for entry in catalog.entries_mut() {
            match entry.try_register_value(id, cell) {
                Ok(true) => claimed = true,
                Ok(false) => {}
                Err(err) => error!("[Upgrades] {}: {}", entry.name(), err),
            }
        }
        if !claimed {
            error!("[Upgrades] Could not find {} in any upgrade", name);
        }

        self.update_upgrade_value(&name);
        debug!(
            "[Upgrades] Registered {} ({} values)",
            name,
            self.registered.len()
        );
        Ok(())
    }

    pub fn deregister(&mut self, id: CellId) {
        self.registered.retain(|&c| c != id);
        if let Some(catalog) = self.catalog.as_mut() {
            for entry in catalog.entries_mut() {
                entry.try_deregister_value(id);
            }
        }
        if let Some(cell) = self.cells.get_mut(&id) {
            cell.set_registered(false);
        }
    }

    /// Deregister and drop a cell whose owner is going away.
    pub fn release(&mut self, id: CellId) -> Option<UpgradeValue> {
        self.deregister(id);
        self.cells.remove(&id)
    }

    /// Activate `catalog` and link every cell registered so far.
    pub fn install_catalog(&mut self, catalog: UpgradeCatalog) {
        for name in catalog.shared_backend_names() {
            debug!(
                "[Upgrades] {} is driven by several upgrades; the last in the catalog wins",
                name
            );
        }
        self.remove_catalog();
        self.catalog = Some(catalog);

        let pending: Vec<CellId> = self.registered.clone();
        for id in pending {
            if let Err(err) = self.register(id) {
                error!("[Upgrades] {}", err);
            }
        }
        info!(
            "[Upgrades] Catalog installed: {} upgrades, {} values linked",
            self.catalog.as_ref().map_or(0, |c| c.entries().len()),
            self.registered.len()
        );
    }

    /// Unlink every cell and take the catalog out. Registered cells stay
    /// registered and relink when a catalog is installed again.
    pub fn remove_catalog(&mut self) -> Option<UpgradeCatalog> {
        let mut catalog = self.catalog.take()?;
        for entry in catalog.entries_mut() {
            entry.unlink_all();
        }
        for cell in self.cells.values_mut() {
            cell.set_registered(false);
        }
        Some(catalog)
    }

    pub fn catalog(&self) -> Option<&UpgradeCatalog> {
        self.catalog.as_ref()
    }

    pub fn catalog_mut(&mut self) -> Option<&mut UpgradeCatalog> {
        self.catalog.as_mut()
    }

    /// Reset every registered cell to its default, then let every upgrade
    /// write its current level. Later catalog entries overwrite earlier ones.
    pub fn update_all_upgrades(&mut self) {
        for id in &self.registered {
            if let Some(cell) = self.cells.get_mut(id) {
                cell.reset_value();
            }
        }
        let Some(catalog) = self.catalog.as_ref() else {
            return;
        };
        for entry in catalog.entries() {
            apply(&mut self.cells, entry.assignments());
        }
    }

    /// Push the current level value of every upgrade driving `backend_name`.
    pub fn update_upgrade_value(&mut self, backend_name: &str) {
        let Some(catalog) = self.catalog.as_ref() else {
            return;
        };
        for entry in catalog.entries() {
            apply(&mut self.cells, entry.assignments_for(backend_name));
        }
    }

    pub fn is_registered(&self, id: CellId) -> bool {
        self.registered.contains(&id)
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    pub fn value(&self, id: CellId) -> Result<&UpgradeValue, UpgradeError> {
        self.cells.get(&id).ok_or(UpgradeError::UnknownCell(id))
    }

    pub fn int(&self, id: CellId) -> Result<i64, UpgradeError> {
        self.value(id)?.as_int()
    }

    pub fn float(&self, id: CellId) -> Result<f32, UpgradeError> {
        self.value(id)?.as_float()
    }

    pub fn flag(&self, id: CellId) -> Result<bool, UpgradeError> {
        self.value(id)?.as_bool()
    }

    pub fn text(&self, id: CellId) -> Result<&str, UpgradeError> {
        self.value(id)?.as_text()
    }
}

fn apply(cells: &mut HashMap<CellId, UpgradeValue>, assignments: Vec<(CellId, CellValue)>) {
    for (id, value) in assignments {
        let Some(cell) = cells.get_mut(&id) else {
            continue;
        };
        if let Err(err) = cell.assign(value) {
            error!("[Upgrades] {}", err);
        }
    }
}
