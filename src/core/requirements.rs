//! Requirement aggregation
//!
//! For each category, collects the strings every used component declares,
//! keyed by component type. Each category map is filled once per build and
//! guarded by its own lock.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};

use crate::core::build_info::{ComponentBuildInfo, RequirementCategory};
use crate::core::resolver::ComponentSets;
use crate::error::{BuildError, CatalogError};

/// Component type to the strings it requires
pub type RequirementMap = BTreeMap<String, BTreeSet<String>>;

/// Component that receives project-wide location permissions
pub const LOCATION_COMPONENT: &str = "com.google.appinventor.components.runtime.WebViewer";

/// Permissions granted when the project declares location use
pub const LOCATION_PERMISSIONS: [&str; 3] = [
    "android.permission.ACCESS_FINE_LOCATION",
    "android.permission.ACCESS_COARSE_LOCATION",
    "android.permission.ACCESS_MOCK_LOCATION",
];

/// Per-category requirement maps for one build
#[derive(Debug)]
pub struct Requirements {
    maps: BTreeMap<RequirementCategory, Mutex<RequirementMap>>,
}

impl Default for Requirements {
    fn default() -> Self {
        Self::new()
    }
}

impl Requirements {
    /// Empty maps for every category
    pub fn new() -> Self {
        Self {
            maps: RequirementCategory::ALL
                .iter()
                .map(|&c| (c, Mutex::new(RequirementMap::new())))
                .collect(),
        }
    }

    /// Fill one category from `infos`, keeping only types the project uses.
    ///
    /// Does nothing if the category already has entries. Components declaring
    /// nothing for the category get no entry.
    pub fn populate<'a, I>(
        &self,
        category: RequirementCategory,
        infos: I,
        used: &ComponentSets,
    ) -> Result<(), CatalogError>
    where
        I: IntoIterator<Item = &'a ComponentBuildInfo>,
    {
        let mut map = self.lock(category);
        if !map.is_empty() {
            return Ok(());
        }

        for info in infos {
            let Some(values) = info.category(category)? else {
                tracing::info!(
                    component = %info.type_name,
                    field = category.field(),
                    "Component does not declare field"
                );
                continue;
            };
            if !used.uses(&info.type_name) {
                continue;
            }
            let values: BTreeSet<String> = values.into_iter().collect();
            if !values.is_empty() {
                map.insert(info.type_name.clone(), values);
            }
        }
        Ok(())
    }

    /// Fill every category from the built-in and extension descriptors
    pub fn populate_all(
        &self,
        builtin: &[ComponentBuildInfo],
        extensions: &[ComponentBuildInfo],
        used: &ComponentSets,
        uses_location: bool,
    ) -> Result<(), BuildError> {
        for category in RequirementCategory::ALL {
            self.populate(category, builtin.iter().chain(extensions), used)
                .map_err(|e| BuildError::stage(category.stage(), e))?;

            if category == RequirementCategory::Permissions && uses_location {
                self.lock(category)
                    .entry(LOCATION_COMPONENT.to_string())
                    .or_default()
                    .extend(LOCATION_PERMISSIONS.iter().map(|p| (*p).to_string()));
            }

            tracing::info!(
                category = category.field(),
                n = self.count(category),
                "Requirements needed"
            );
        }
        Ok(())
    }

    /// Snapshot of one category
    pub fn get(&self, category: RequirementCategory) -> RequirementMap {
        self.lock(category).clone()
    }

    /// Total number of entries across all types in a category
    pub fn count(&self, category: RequirementCategory) -> usize {
        self.lock(category).values().map(BTreeSet::len).sum()
    }

    /// Union of every type's entries in a category
    pub fn union(&self, category: RequirementCategory) -> BTreeSet<String> {
        self.lock(category).values().flatten().cloned().collect()
    }

    fn lock(&self, category: RequirementCategory) -> std::sync::MutexGuard<'_, RequirementMap> {
        // Every category is inserted in `new`.
        self.maps[&category]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
