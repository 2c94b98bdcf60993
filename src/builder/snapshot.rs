//! Read-only snapshot of what the registry knows, for diagnostics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::settings::ExportedSettings;
use crate::core::unit::{UnitKind, UnitPath, UnitState};
use crate::core::variant::Variant;
use crate::resolver::UnitRegistry;

/// Every known unit with its exports and dependency edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub project: String,
    pub variant: Variant,
    pub units: BTreeMap<UnitPath, UnitRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UnitRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<UnitKind>,
    pub state: UnitState,
    pub exports: ExportedSettings,
    pub deps: Vec<UnitPath>,
    pub dependents: Vec<UnitPath>,
}

impl BuildManifest {
    pub fn from_registry(project: &str, variant: Variant, registry: &UnitRegistry) -> Self {
        let units = registry
            .units()
            .map(|(unit, entry)| {
                let record = UnitRecord {
                    kind: entry.kind,
                    state: entry.state,
                    exports: entry.settings.clone(),
                    deps: entry.deps.clone(),
                    dependents: registry
                        .dependents(unit)
                        .into_iter()
                        .filter(|u| !u.is_root())
                        .collect(),
                };
                (unit.clone(), record)
            })
            .collect();

        BuildManifest {
            project: project.to_string(),
            variant,
            units,
        }
    }

    pub fn get(&self, unit: &UnitPath) -> Option<&UnitRecord> {
        self.units.get(unit)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
