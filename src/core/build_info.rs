//! Component build-info catalog
//!
//! Every component type ships a JSON descriptor listing what it needs from the
//! build: permissions, libraries, native libraries, assets, activities and
//! broadcast receivers. Built-in descriptors come as one array in
//! `files/simple_components_build_info.json`; each extension carries its own.

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::paths;
use crate::error::{BuildError, CatalogError, Stage};
use crate::infra::resources::ResourceCache;

/// A requirement category, named after its JSON field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequirementCategory {
    Assets,
    Activities,
    BroadcastReceivers,
    Libraries,
    Native,
    Permissions,
    /// Deprecated single-string receiver declarations
    LegacyBroadcastReceiver,
}

impl RequirementCategory {
    /// Every category, in aggregation order
    pub const ALL: [RequirementCategory; 7] = [
        RequirementCategory::Assets,
        RequirementCategory::Activities,
        RequirementCategory::BroadcastReceivers,
        RequirementCategory::Libraries,
        RequirementCategory::Native,
        RequirementCategory::Permissions,
        RequirementCategory::LegacyBroadcastReceiver,
    ];

    /// JSON field holding this category
    pub fn field(self) -> &'static str {
        match self {
            Self::Assets => "assets",
            Self::Activities => "activities",
            Self::BroadcastReceivers => "broadcastReceivers",
            Self::Libraries => "libraries",
            Self::Native => "native",
            Self::Permissions => "permissions",
            Self::LegacyBroadcastReceiver => "broadcastReceiver",
        }
    }

    /// Stage reported when aggregating this category fails
    pub fn stage(self) -> Stage {
        match self {
            Self::Assets => Stage::Assets,
            Self::Activities => Stage::Activities,
            Self::BroadcastReceivers => Stage::BroadcastReceivers,
            Self::Libraries => Stage::Libraries,
            Self::Native => Stage::NativeLibraries,
            Self::Permissions => Stage::Permissions,
            Self::LegacyBroadcastReceiver => Stage::BroadcastReceiver,
        }
    }

    /// Whether descriptors may omit this field
    pub fn optional(self) -> bool {
        self == Self::LegacyBroadcastReceiver
    }
}

impl fmt::Display for RequirementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// One component's build descriptor
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentBuildInfo {
    /// Fully qualified component type
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl ComponentBuildInfo {
    /// Strings listed under `category`.
    ///
    /// Returns `Ok(None)` when an optional field is absent.
    pub fn category(&self, category: RequirementCategory) -> Result<Option<Vec<String>>, CatalogError> {
        let Some(value) = self.fields.get(category.field()) else {
            if category.optional() {
                return Ok(None);
            }
            return Err(CatalogError::MissingField {
                component: self.type_name.clone(),
                field: category.field().to_string(),
            });
        };

        let malformed = || CatalogError::Malformed {
            origin: self.type_name.clone(),
            error: format!("'{}' is not an array of strings", category.field()),
        };
        value
            .as_array()
            .ok_or_else(malformed)?
            .iter()
            .map(|v| v.as_str().map(str::to_string).ok_or_else(malformed))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Descriptor {
    Many(Vec<ComponentBuildInfo>),
    One(ComponentBuildInfo),
}

/// Parse a descriptor array
pub fn parse_catalog(origin: &str, text: &str) -> Result<Vec<ComponentBuildInfo>, CatalogError> {
    serde_json::from_str(text).map_err(|e| CatalogError::Malformed {
        origin: origin.to_string(),
        error: e.to_string(),
    })
}

/// Parse an extension descriptor, which holds one object or an array
pub fn parse_extension_descriptor(
    origin: &str,
    text: &str,
) -> Result<Vec<ComponentBuildInfo>, CatalogError> {
    let descriptor: Descriptor = serde_json::from_str(text).map_err(|e| CatalogError::Malformed {
        origin: origin.to_string(),
        error: e.to_string(),
    })?;
    Ok(match descriptor {
        Descriptor::Many(infos) => infos,
        Descriptor::One(info) => vec![info],
    })
}

/// The built-in component catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    components: Vec<ComponentBuildInfo>,
}

impl Catalog {
    /// Parse the built-in catalog document
    pub fn parse(origin: &str, text: &str) -> Result<Self, CatalogError> {
        Ok(Self {
            components: parse_catalog(origin, text)?,
        })
    }

    /// Read the catalog shipped with the runtime resources
    pub fn load(resources: &ResourceCache) -> Result<Self, BuildError> {
        let text = resources
            .read_to_string(paths::COMP_BUILD_INFO)
            .map_err(|e| BuildError::stage(Stage::Extensions, e))?;
        Self::parse(paths::COMP_BUILD_INFO, &text).map_err(|e| BuildError::stage(Stage::Extensions, e))
    }

    /// Build a catalog from descriptors
    pub fn from_components(components: Vec<ComponentBuildInfo>) -> Self {
        Self { components }
    }

    /// All built-in type names
    pub fn type_names(&self) -> BTreeSet<String> {
        self.components.iter().map(|c| c.type_name.clone()).collect()
    }

    /// Whether `type_name` is built in
    pub fn contains(&self, type_name: &str) -> bool {
        self.components.iter().any(|c| c.type_name == type_name)
    }

    /// Descriptors in catalog order
    pub fn components(&self) -> &[ComponentBuildInfo] {
        &self.components
    }
}
