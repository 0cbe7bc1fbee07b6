//! Execution platforms that take an experiment and run it elsewhere.

pub mod slurm;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::experiment::Experiment;
use crate::manifest::Manifest;

pub use slurm::{SlurmPlatform, SlurmProfile};

pub trait Platform {
    fn name(&self) -> &str;

    /// Resolves a container image reference for jobs on this platform.
    fn container_image(&self, sif: &Path) -> Result<PathBuf>;

    /// Submits `experiment` without waiting for it to finish.
    fn submit(&self, experiment: &Experiment) -> Result<Submission>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub experiment_dir: PathBuf,
    /// Scheduler job id; `None` when nothing was submitted.
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    SlurmLocal,
}

impl FromStr for PlatformKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SLURM_LOCAL" | "SLURM" => Ok(PlatformKind::SlurmLocal),
            other => Err(Error::UnknownPlatform(other.to_string())),
        }
    }
}

/// Builds the platform named by `selector` from its manifest profile.
pub fn from_manifest(selector: &str, manifest: &Manifest, dry_run: bool) -> Result<Box<dyn Platform>> {
    match selector.parse::<PlatformKind>()? {
        PlatformKind::SlurmLocal => {
            let profile: SlurmProfile = manifest.platform_profile_as(selector)?;
            Ok(Box::new(SlurmPlatform::new(
                selector,
                manifest.job_directory.clone(),
                profile,
                dry_run,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_kind() {
        assert_eq!("SLURM_LOCAL".parse::<PlatformKind>().unwrap(), PlatformKind::SlurmLocal);
        assert!(matches!(
            "COMPS".parse::<PlatformKind>(),
            Err(Error::UnknownPlatform(name)) if name == "COMPS"
        ));
    }

    #[test]
    fn test_from_manifest() {
        let raw = r#"
eradication_path = "Eradication"
schema_file = "schema.json"
input_dir = "inputs"
job_directory = "experiments"

[platform.SLURM_LOCAL]
partition = "b1139"
account = "b1139"
time = "2:00:00"
modules = ["singularity"]
"#;
        let manifest = Manifest::from_toml_str(raw, Path::new("/work")).unwrap();
        let platform = from_manifest("SLURM_LOCAL", &manifest, true).unwrap();
        assert_eq!(platform.name(), "SLURM_LOCAL");
        assert!(from_manifest("LOCAL", &manifest, true).is_err());
    }
}
