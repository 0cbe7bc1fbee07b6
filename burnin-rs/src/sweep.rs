use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{Error, Result};

/// Sweep values of one simulation, keyed by parameter.
pub type Tags = BTreeMap<String, Value>;

/// One swept parameter and the values it takes.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepAxis {
    pub parameter: String,
    pub values: Vec<Value>,
}

impl SweepAxis {
    pub fn new<V: Into<Value>>(parameter: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            parameter: parameter.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Expands sweep axes into the cartesian product of their values.
#[derive(Debug, Clone, Default)]
pub struct SimulationBuilder {
    axes: Vec<SweepAxis>,
}

impl SimulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sweep_definition(&mut self, axis: SweepAxis) -> Result<&mut Self> {
        if axis.values.is_empty() {
            return Err(Error::InvalidSweep(format!(
                "`{}` has no values",
                axis.parameter
            )));
        }
        if self.axes.iter().any(|a| a.parameter == axis.parameter) {
            return Err(Error::InvalidSweep(format!(
                "`{}` is already swept",
                axis.parameter
            )));
        }
        self.axes.push(axis);
        Ok(self)
    }

    pub fn axes(&self) -> &[SweepAxis] {
        &self.axes
    }

    /// Number of simulations; one when nothing is swept.
    pub fn count(&self) -> usize {
        self.axes.iter().map(|a| a.values.len()).product()
    }

    /// Tags of every simulation, the first axis varying slowest.
    pub fn variants(&self) -> Vec<Tags> {
        self.axes.iter().fold(vec![Tags::new()], |acc, axis| {
            acc.iter()
                .flat_map(|tags| {
                    axis.values.iter().map(move |value| {
                        let mut tags = tags.clone();
                        tags.insert(axis.parameter.clone(), value.clone());
                        tags
                    })
                })
                .collect()
        })
    }
}
