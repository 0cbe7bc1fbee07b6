//! Names known to the engine, read from its schema file.
//!
//! Only used to warn; the engine does the real validation.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::campaign::CampaignDescriptor;
use crate::config::ConfigDescriptor;
use crate::error::{Result, io_error};

#[derive(Debug, Clone, Default)]
pub struct Schema {
    parameters: Option<BTreeSet<String>>,
    classes: Option<BTreeSet<String>>,
}

impl Schema {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(io_error(path))?;
        let data: Value = serde_json::from_str(&raw)?;
        Ok(Self::from_json(&data))
    }

    pub fn from_json(data: &Value) -> Self {
        let mut parameters = BTreeSet::new();
        if let Some(config) = data.get("config") {
            collect_parameters(config, &mut parameters);
        }

        let classes = data
            .get("interventions")
            .and_then(|v| v.as_object())
            .map(|groups| {
                groups
                    .values()
                    .filter_map(|g| g.as_object())
                    .flat_map(|g| g.keys().cloned())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            parameters: Some(parameters),
            classes: Some(classes),
        }
    }

    /// Accepts every name.
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn unknown_parameters<'a>(&self, config: &'a ConfigDescriptor) -> Vec<&'a str> {
        let Some(known) = &self.parameters else {
            return Vec::new();
        };
        config
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| !known.contains(*name))
            .collect()
    }

    pub fn unknown_classes(&self, campaign: &CampaignDescriptor) -> Vec<&'static str> {
        let Some(known) = &self.classes else {
            return Vec::new();
        };
        campaign
            .intervention_classes()
            .into_iter()
            .filter(|class| !known.contains(*class))
            .collect()
    }
}

// Parameter entries are the objects carrying a "type"; anything else is a grouping.
fn collect_parameters(value: &Value, out: &mut BTreeSet<String>) {
    let Some(object) = value.as_object() else {
        return;
    };
    for (key, child) in object {
        if child.get("type").is_some() {
            out.insert(key.clone());
        } else {
            collect_parameters(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::TriggeredPropertyChange;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::from_json(&json!({
            "config": {
                "MALARIA_SIM": {
                    "Simulation_Duration": { "type": "float", "default": 365 },
                    "Run_Number": { "type": "integer", "default": 0 }
                }
            },
            "interventions": {
                "Individual": { "PropertyValueChanger": {} },
                "Node": { "NodeLevelHealthTriggeredIV": {} }
            }
        }))
    }

    #[test]
    fn test_unknown_parameters() {
        let mut config = ConfigDescriptor::new();
        config.set("Simulation_Duration", 730).set("Not_A_Parameter", 1);
        assert_eq!(schema().unknown_parameters(&config), vec!["Not_A_Parameter"]);
    }

    #[test]
    fn test_known_classes() {
        let mut campaign = CampaignDescriptor::default();
        campaign.add(TriggeredPropertyChange::new(["Pregnant"], "Pregnancy", "IsPregnant"));
        assert!(schema().unknown_classes(&campaign).is_empty());
    }

    #[test]
    fn test_permissive() {
        let mut config = ConfigDescriptor::new();
        config.set("Anything", 1);
        assert!(Schema::permissive().unknown_parameters(&config).is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Schema::load(Path::new("/no/such/schema.json")).is_err());
    }
}
