//! Engine configuration (`config.json`) and the layered merge that produces it.
//!
//! Every write is recorded with the [`Layer`] it came from. Resolving picks the
//! highest layer for each parameter (last write wins inside a layer) and
//! reports every parameter that more than one non-default write touched.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value, json};

/// Flat mapping of parameter name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDescriptor {
    parameters: BTreeMap<String, Value>,
}

impl ConfigDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.parameters.iter()
    }

    /// Renders the `{"parameters": {...}}` document the engine reads.
    pub fn to_json(&self) -> Value {
        let parameters: Map<String, Value> = self
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        json!({ "parameters": parameters })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ConfigDescriptor {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            parameters: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Origin of a write, in increasing precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    /// Team defaults for the simulation type.
    Defaults,
    /// Settings implied by the campaign or demographics.
    Implicit,
    /// The producer's parameter set.
    Parameters,
    /// Report configuration.
    Reporters,
    /// Explicit overrides on the assembled task.
    Task,
    /// Per-simulation sweep values.
    Sweep,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Defaults => "defaults",
            Layer::Implicit => "implicit",
            Layer::Parameters => "parameters",
            Layer::Reporters => "reporters",
            Layer::Task => "task",
            Layer::Sweep => "sweep",
        };
        f.write_str(name)
    }
}

/// A parameter written more than once outside the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub parameter: String,
    pub layers: Vec<Layer>,
    /// The writes disagree on the value.
    pub conflicting: bool,
    pub winner: Layer,
}

#[derive(Debug, Clone, PartialEq)]
struct Write {
    layer: Layer,
    value: Value,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMerge {
    writes: BTreeMap<String, Vec<Write>>,
}

impl ConfigMerge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, layer: Layer, name: impl Into<String>, value: impl Into<Value>) {
        self.writes.entry(name.into()).or_default().push(Write {
            layer,
            value: value.into(),
        });
    }

    pub fn extend(&mut self, layer: Layer, config: &ConfigDescriptor) {
        for (name, value) in config.iter() {
            self.write(layer, name.clone(), value.clone());
        }
    }

    pub fn resolve(&self) -> (ConfigDescriptor, Vec<Diagnostic>) {
        let mut config = ConfigDescriptor::new();
        let mut diagnostics = Vec::new();

        for (name, writes) in &self.writes {
            let Some(winner) = winning_write(writes) else {
                continue;
            };
            config.set(name.clone(), winner.value.clone());

            let counted: Vec<&Write> = writes
                .iter()
                .filter(|w| !matches!(w.layer, Layer::Defaults | Layer::Sweep))
                .collect();
            if counted.len() > 1 {
                let conflicting = counted.iter().any(|w| w.value != counted[0].value);
                diagnostics.push(Diagnostic {
                    parameter: name.clone(),
                    layers: counted.iter().map(|w| w.layer).collect(),
                    conflicting,
                    winner: winner.layer,
                });
            }
        }

        (config, diagnostics)
    }
}

/// Highest layer wins; among equals the later write (`max_by_key` keeps the last).
fn winning_write(writes: &[Write]) -> Option<&Write> {
    writes.iter().max_by_key(|w| w.layer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_higher_layer_wins_regardless_of_order() {
        let mut merge = ConfigMerge::new();
        merge.write(Layer::Task, "Birth_Rate_Dependence", "INDIVIDUAL_PREGNANCIES");
        merge.write(Layer::Defaults, "Birth_Rate_Dependence", "FIXED_BIRTH_RATE");
        merge.write(Layer::Parameters, "Birth_Rate_Dependence", "POPULATION_DEP_RATE");

        let (config, diagnostics) = merge.resolve();
        assert_eq!(
            config.get("Birth_Rate_Dependence"),
            Some(&json!("INDIVIDUAL_PREGNANCIES"))
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].conflicting);
        assert_eq!(diagnostics[0].winner, Layer::Task);
        assert_eq!(diagnostics[0].layers, vec![Layer::Task, Layer::Parameters]);
    }

    #[test]
    fn test_last_write_wins_within_layer() {
        let mut merge = ConfigMerge::new();
        merge.write(Layer::Parameters, "x_Birth", 1.0);
        merge.write(Layer::Parameters, "x_Birth", 3.62);
        let (config, diagnostics) = merge.resolve();
        assert_eq!(config.get("x_Birth"), Some(&json!(3.62)));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_defaults_override_is_not_flagged() {
        let mut merge = ConfigMerge::new();
        merge.write(Layer::Defaults, "Simulation_Duration", 365);
        merge.write(Layer::Parameters, "Simulation_Duration", 730);
        let (config, diagnostics) = merge.resolve();
        assert_eq!(config.get("Simulation_Duration"), Some(&json!(730)));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_redundant_writes_are_not_conflicting() {
        let mut merge = ConfigMerge::new();
        merge.write(Layer::Implicit, "Custom_Individual_Events", json!(["Ind_Property_Blackout"]));
        merge.write(Layer::Task, "Custom_Individual_Events", json!(["Ind_Property_Blackout"]));
        let (_, diagnostics) = merge.resolve();
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics[0].conflicting);
    }

    #[test]
    fn test_sweep_writes_are_not_flagged() {
        let mut merge = ConfigMerge::new();
        merge.write(Layer::Parameters, "Run_Number", 0);
        merge.write(Layer::Sweep, "Run_Number", 2);
        let (config, diagnostics) = merge.resolve();
        assert_eq!(config.get("Run_Number"), Some(&json!(2)));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_to_json_wraps_parameters() {
        let config: ConfigDescriptor = [("Run_Number", json!(1)), ("Simulation_Duration", json!(730))]
            .into_iter()
            .collect();
        assert_eq!(
            config.to_json(),
            json!({ "parameters": { "Run_Number": 1, "Simulation_Duration": 730 } })
        );
    }
}
