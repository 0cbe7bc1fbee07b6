//! Local SLURM cluster: lays the experiment out on a shared filesystem and
//! submits one array job for all of its simulations.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{Platform, Submission};
use crate::bootstrap::make_executable;
use crate::error::{Error, Result, io_error};
use crate::experiment::Experiment;
use crate::task::{CAMPAIGN_FILENAME, CONFIG_FILENAME};

const ASSETS_DIR: &str = "Assets";
const SBATCH_SCRIPT: &str = "sbatch.sh";
const RUN_SCRIPT: &str = "_run.sh";
const SIMULATION_INDEX: &str = "simulations.csv";
const JOB_ID_FILE: &str = "job_id.txt";

/// Resource policy for the experiment's array job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlurmProfile {
    pub partition: String,
    pub account: Option<String>,
    pub time: String,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default = "default_max_running_jobs")]
    pub max_running_jobs: u32,
    #[serde(default = "default_ntasks")]
    pub ntasks: u32,
    pub mem_per_cpu: Option<String>,
    /// Submission command.
    #[serde(default = "default_sbatch")]
    pub sbatch: String,
}

fn default_max_running_jobs() -> u32 {
    10
}

fn default_ntasks() -> u32 {
    1
}

fn default_sbatch() -> String {
    "sbatch".to_string()
}

#[derive(Debug, Clone)]
pub struct SlurmPlatform {
    name: String,
    job_directory: PathBuf,
    profile: SlurmProfile,
    dry_run: bool,
}

impl SlurmPlatform {
    pub fn new(name: &str, job_directory: PathBuf, profile: SlurmProfile, dry_run: bool) -> Self {
        Self {
            name: name.to_string(),
            job_directory,
            profile,
            dry_run,
        }
    }

    /// `<name>_<id>` under the job directory, with anything but
    /// `[A-Za-z0-9._-]` in the name replaced by `_`.
    pub fn experiment_dir(&self, experiment: &Experiment) -> PathBuf {
        let name: String = experiment
            .name()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.job_directory.join(format!("{name}_{}", experiment.id()))
    }

    /// Writes the experiment directory and returns its path.
    pub fn materialize(&self, experiment: &Experiment) -> Result<PathBuf> {
        let dir = self.experiment_dir(experiment);
        if dir.exists() {
            return Err(Error::ExperimentExists(dir));
        }
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let task = experiment.task();
        let assets_dir = dir.join(ASSETS_DIR);
        for asset in task.common_assets.assets() {
            let target = asset.materialize(&assets_dir)?;
            debug!(asset = %target.display(), "asset copied");
        }
        make_executable(&assets_dir.join(task.executable()))?;

        let mut metadata = experiment.metadata();
        metadata["platform"] = serde_json::json!({
            "name": self.name,
            "profile": self.profile
        });
        write_json(&dir.join("metadata.json"), &metadata)?;

        let campaign = serde_json::to_vec_pretty(&task.campaign().to_json())?;
        let run_script = self.run_script(&task.executable(), task.sif());
        for simulation in experiment.simulations() {
            let sim_dir = dir.join(&simulation.id);
            fs::create_dir_all(&sim_dir).map_err(io_error(&sim_dir))?;
            write_json(&sim_dir.join(CONFIG_FILENAME), &simulation.config.to_json())?;
            write_bytes(&sim_dir.join(CAMPAIGN_FILENAME), &campaign)?;
            write_json(&sim_dir.join("metadata.json"), &simulation.metadata(experiment.id()))?;
            let script = sim_dir.join(RUN_SCRIPT);
            write_bytes(&script, run_script.as_bytes())?;
            make_executable(&script)?;
        }

        write_simulation_index(&dir.join(SIMULATION_INDEX), experiment)?;
        write_bytes(
            &dir.join(SBATCH_SCRIPT),
            self.sbatch_script(experiment).as_bytes(),
        )?;

        info!(
            dir = %dir.display(),
            simulations = experiment.simulations().len(),
            "experiment directory written"
        );
        Ok(dir)
    }

    pub fn sbatch_script(&self, experiment: &Experiment) -> String {
        let p = &self.profile;
        let mut script = String::from("#!/bin/bash\n");
        let _ = writeln!(script, "#SBATCH --job-name={}", experiment.name());
        let _ = writeln!(script, "#SBATCH --partition={}", p.partition);
        if let Some(account) = &p.account {
            let _ = writeln!(script, "#SBATCH --account={account}");
        }
        let _ = writeln!(script, "#SBATCH --time={}", p.time);
        let _ = writeln!(script, "#SBATCH --ntasks={}", p.ntasks);
        if let Some(mem) = &p.mem_per_cpu {
            let _ = writeln!(script, "#SBATCH --mem-per-cpu={mem}");
        }
        let _ = writeln!(
            script,
            "#SBATCH --array=1-{}%{}",
            experiment.simulations().len(),
            p.max_running_jobs
        );
        script.push_str("#SBATCH --output=slurm-%A_%a.out\n\n");
        for module in &p.modules {
            let _ = writeln!(script, "module load {module}");
        }
        let _ = writeln!(
            script,
            "\nSIM_ID=$(awk -F, -v row=$((SLURM_ARRAY_TASK_ID + 1)) 'NR == row {{ print $1 }}' {SIMULATION_INDEX})"
        );
        script.push_str("cd \"$SIM_ID\" || exit 1\n");
        let _ = writeln!(script, "bash {RUN_SCRIPT} > stdout.txt 2> stderr.txt");
        script
    }

    fn run_script(&self, executable: &str, sif: Option<&Path>) -> String {
        let engine = format!(
            "../{ASSETS_DIR}/{executable} --config {CONFIG_FILENAME} --input-path ../{ASSETS_DIR}"
        );
        match sif {
            Some(image) => format!(
                "#!/bin/bash\nsingularity exec \"{}\" {engine}\n",
                image.display()
            ),
            None => format!("#!/bin/bash\n{engine}\n"),
        }
    }

    fn sbatch(&self, dir: &Path) -> Result<String> {
        let output = Command::new(&self.profile.sbatch)
            .arg("--parsable")
            .arg(SBATCH_SCRIPT)
            .current_dir(dir)
            .output()
            .map_err(io_error(Path::new(&self.profile.sbatch)))?;
        if !output.status.success() {
            return Err(Error::Submission(format!(
                "{} exited with {}: {}",
                self.profile.sbatch,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        // --parsable prints "jobid" or "jobid;cluster"
        let stdout = String::from_utf8_lossy(&output.stdout);
        let job_id = stdout.trim().split(';').next().unwrap_or_default().to_string();
        if job_id.is_empty() {
            return Err(Error::Submission(format!(
                "{} printed no job id",
                self.profile.sbatch
            )));
        }
        Ok(job_id)
    }
}

impl Platform for SlurmPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn container_image(&self, sif: &Path) -> Result<PathBuf> {
        if sif.is_file() {
            sif.canonicalize().map_err(io_error(sif))
        } else {
            warn!(image = %sif.display(), "container image not found locally, passing through");
            Ok(sif.to_path_buf())
        }
    }

    fn submit(&self, experiment: &Experiment) -> Result<Submission> {
        let dir = self.materialize(experiment)?;
        if self.dry_run {
            info!(dir = %dir.display(), "dry run, not submitting");
            return Ok(Submission {
                experiment_dir: dir,
                job_id: None,
            });
        }

        let job_id = self.sbatch(&dir)?;
        write_bytes(&dir.join(JOB_ID_FILE), job_id.as_bytes())?;
        info!(job_id = %job_id, experiment = %experiment.name(), "array job submitted");
        Ok(Submission {
            experiment_dir: dir,
            job_id: Some(job_id),
        })
    }
}

fn write_bytes(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data).map_err(io_error(path))
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    write_bytes(path, &serde_json::to_vec_pretty(value)?)
}

fn write_simulation_index(path: &Path, experiment: &Experiment) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let mut headers = vec!["simulation_id".to_string()];
    headers.extend(experiment.sweep_parameters().iter().cloned());
    wtr.write_record(&headers)?;
    for simulation in experiment.simulations() {
        let mut row = vec![simulation.id.clone()];
        for parameter in experiment.sweep_parameters() {
            let cell = match simulation.tags.get(parameter) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            row.push(cell);
        }
        wtr.write_record(&row)?;
    }
    wtr.flush().map_err(io_error(path))?;
    Ok(())
}
