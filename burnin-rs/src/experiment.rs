//! A named batch of simulations expanded from one task and a sweep.

use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};
use tracing::info;

use crate::assets::sha256_hex;
use crate::config::ConfigDescriptor;
use crate::error::{Error, Result};
use crate::platform::{Platform, Submission};
use crate::sweep::{SimulationBuilder, Tags};
use crate::task::EmodTask;

const ID_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub id: String,
    pub tags: Tags,
    pub config: ConfigDescriptor,
}

impl Simulation {
    pub fn metadata(&self, experiment_id: &str) -> Value {
        json!({
            "id": self.id,
            "experiment_id": experiment_id,
            "tags": self.tags
        })
    }
}

#[derive(Debug, Clone)]
pub struct Experiment {
    name: String,
    id: String,
    task: EmodTask,
    sweep_parameters: Vec<String>,
    simulations: Vec<Simulation>,
}

impl Experiment {
    pub fn from_builder(builder: &SimulationBuilder, task: EmodTask, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let created = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let id = short_digest(format!("{name}:{created}").as_bytes());

        task.check();

        let simulations = builder
            .variants()
            .into_iter()
            .map(|tags| -> Result<Simulation> {
                let key = serde_json::to_string(&tags)?;
                Ok(Simulation {
                    id: short_digest(format!("{id}:{key}").as_bytes()),
                    config: task.simulation_config(&tags),
                    tags,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(experiment = %name, id = %id, simulations = simulations.len(), "experiment created");

        Ok(Self {
            name,
            id,
            task,
            sweep_parameters: builder.axes().iter().map(|a| a.parameter.clone()).collect(),
            simulations,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task(&self) -> &EmodTask {
        &self.task
    }

    pub fn simulations(&self) -> &[Simulation] {
        &self.simulations
    }

    pub fn sweep_parameters(&self) -> &[String] {
        &self.sweep_parameters
    }

    pub fn metadata(&self) -> Value {
        json!({
            "name": self.name,
            "id": self.id,
            "simulation_count": self.simulations.len(),
            "sweep_parameters": self.sweep_parameters,
            "assets": self
                .task
                .common_assets
                .assets()
                .iter()
                .map(|a| json!({ "destination": a.destination, "checksum": a.checksum }))
                .collect::<Vec<_>>()
        })
    }

    /// Hands the experiment to `platform` and returns without waiting for it.
    pub fn run(&self, platform: &dyn Platform) -> Result<Submission> {
        info!(experiment = %self.name, platform = platform.name(), "submitting");
        platform.submit(self)
    }
}

/// Login name of the current user.
pub fn current_user() -> Result<String> {
    ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|user| !user.is_empty())
        .ok_or(Error::UnknownUser)
}

fn short_digest(bytes: &[u8]) -> String {
    let mut digest = sha256_hex(bytes);
    digest.truncate(ID_LEN);
    digest
}
