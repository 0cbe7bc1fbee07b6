//! Builders for EMOD malaria simulation inputs and submission of seed sweeps
//! as SLURM array jobs.

pub mod assets;
pub mod bootstrap;
pub mod campaign;
pub mod config;
pub mod demographics;
pub mod error;
pub mod experiment;
pub mod logging;
pub mod malaria;
pub mod manifest;
pub mod platform;
pub mod reporters;
pub mod schema;
pub mod sweep;
pub mod task;

pub use campaign::{CampaignDescriptor, TargetSex, TriggeredPropertyChange};
pub use config::{ConfigDescriptor, ConfigMerge, Diagnostic, Layer};
pub use demographics::{AgeDistribution, DemographicsDescriptor};
pub use error::{Error, Result};
pub use experiment::{Experiment, Simulation, current_user};
pub use logging::init_logging;
pub use manifest::Manifest;
pub use platform::{Platform, Submission};
pub use reporters::EventRecorder;
pub use schema::Schema;
pub use sweep::{SimulationBuilder, SweepAxis, Tags};
pub use task::{EmodTask, SimulationInputs};
