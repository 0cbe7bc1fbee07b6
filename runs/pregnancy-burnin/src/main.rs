pub mod parameters;
pub mod scenario;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use emod_burnin::platform::{self, Platform};
use emod_burnin::{
    EmodTask, Experiment, Manifest, Result, Schema, Submission, bootstrap, current_user, malaria,
};
use serde_json::json;
use tracing::{error, info};

use parameters::BurnInParameters;
use scenario::PregnancyBurnIn;

/// Submit the pregnancy-tracking malaria burn-in as a seed sweep
#[derive(Parser, Debug)]
#[command(name = "pregnancy-burnin")]
struct Args {
    /// Manifest with engine, schema, image and input paths
    #[arg(short, long, default_value = "manifest.toml")]
    manifest: PathBuf,

    /// Execution platform
    #[arg(short, long, default_value = "SLURM_LOCAL")]
    platform: String,

    /// Years to run before serializing the population
    #[arg(long)]
    serialize_years: Option<u32>,

    /// Number of random seeds to sweep
    #[arg(long)]
    num_seeds: Option<u32>,

    /// Write the experiment directory but do not submit it
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    emod_burnin::init_logging();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let manifest = Manifest::load(&args.manifest)?;
    let parameters = manifest
        .section::<BurnInParameters>("burnin")?
        .unwrap_or_default()
        .with_overrides(args.serialize_years, args.num_seeds);
    let days = parameters.burnin_days()?;
    info!(?parameters, days, "burn-in parameters");

    bootstrap::setup(&manifest)?;

    let submission = general_sim(&args.platform, &manifest, parameters, args.dry_run)?;
    match &submission.job_id {
        Some(job_id) => info!(job_id = %job_id, dir = %submission.experiment_dir.display(), "submitted"),
        None => info!(dir = %submission.experiment_dir.display(), "experiment written"),
    }
    Ok(())
}

/// Assembles the burn-in experiment and submits it to `selected_platform`.
fn general_sim(
    selected_platform: &str,
    manifest: &Manifest,
    parameters: BurnInParameters,
    dry_run: bool,
) -> Result<Submission> {
    let platform = platform::from_manifest(selected_platform, manifest, dry_run)?;
    let user = current_user()?;
    let experiment = build_experiment(manifest, parameters, platform.as_ref(), &user)?;
    experiment.run(platform.as_ref())
}

fn build_experiment(
    manifest: &Manifest,
    parameters: BurnInParameters,
    platform: &dyn Platform,
    user: &str,
) -> Result<Experiment> {
    let scenario = PregnancyBurnIn::new(parameters);

    info!("Creating EMODTask (from files)...");
    let schema = Schema::load(&manifest.schema_file)?;
    let mut task = EmodTask::from_inputs(
        &manifest.eradication_path,
        schema,
        &malaria::team_defaults(),
        &scenario,
    )?;

    if let Some(sif) = &manifest.sif_path {
        task.set_sif(sif, platform)?;
    }
    task.set_parameter("Birth_Rate_Dependence", "INDIVIDUAL_PREGNANCIES");
    task.set_parameter("Custom_Individual_Events", json!(["Ind_Property_Blackout"]));

    task.common_assets
        .add_directory(&manifest.climate_dir, Some("climate"))?;

    let builder = scenario.sweep()?;

    let recorder = scenario.event_recorder()?;
    task.add_reporter(&recorder)?;
    info!(events = ?recorder.events, end_day = recorder.end_day, "event recorder added");

    Experiment::from_builder(&builder, task, PregnancyBurnIn::experiment_name(user))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use emod_burnin::{Diagnostic, Error, Layer};
    use serde_json::Value;

    use super::*;

    const SCHEMA: &str = r#"{
        "config": { "MALARIA_SIM": { "Simulation_Duration": { "type": "float" } } },
        "interventions": {
            "Individual": { "PropertyValueChanger": {} },
            "Node": { "NodeLevelHealthTriggeredIV": {} }
        }
    }"#;

    fn workspace(dir: &Path) -> Manifest {
        fs::create_dir_all(dir.join("download")).unwrap();
        fs::write(dir.join("download").join("Eradication"), b"#!/bin/sh\n").unwrap();
        fs::write(dir.join("download").join("schema.json"), SCHEMA).unwrap();
        let climate = dir.join("inputs").join("example_weather").join("out");
        fs::create_dir_all(&climate).unwrap();
        for name in [
            "example_air_temperature_daily.bin",
            "example_rainfall_daily.bin",
            "example_relative_humidity_daily.bin",
        ] {
            fs::write(climate.join(name), name.as_bytes()).unwrap();
        }
        let raw = include_str!("../manifest.toml");
        Manifest::from_toml_str(raw, dir).unwrap()
    }

    fn platform(manifest: &Manifest) -> Box<dyn Platform> {
        platform::from_manifest("SLURM_LOCAL", manifest, true).unwrap()
    }

    #[test]
    fn test_two_years_three_seeds() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = workspace(dir.path());
        let platform = platform(&manifest);
        let parameters = BurnInParameters {
            serialize_years: 2,
            num_seeds: 3,
        };
        let experiment = build_experiment(&manifest, parameters, platform.as_ref(), "jdoe").unwrap();

        assert_eq!(experiment.name(), "jdoe_FE_example_burnin50_IP");
        let simulations = experiment.simulations();
        assert_eq!(simulations.len(), 3);
        let mut seeds = Vec::new();
        for simulation in simulations {
            let config = &simulation.config;
            assert_eq!(config.get("Simulation_Duration"), Some(&json!(730)));
            assert_eq!(config.get("Serialization_Time_Steps"), Some(&json!([730])));
            assert_eq!(config.get("Report_Event_Recorder_Start_Day"), Some(&json!(1)));
            assert_eq!(config.get("Report_Event_Recorder_End_Day"), Some(&json!(730)));
            assert_eq!(
                config.get("Birth_Rate_Dependence"),
                Some(&json!("INDIVIDUAL_PREGNANCIES"))
            );
            assert_eq!(
                config.get("Custom_Individual_Events"),
                Some(&json!(["Ind_Property_Blackout"]))
            );
            seeds.push(config.get("Run_Number").unwrap().as_u64().unwrap());
        }
        seeds.sort();
        assert_eq!(seeds, vec![0, 1, 2]);

        assert_eq!(
            experiment.task().diagnostics(),
            vec![Diagnostic {
                parameter: "Custom_Individual_Events".into(),
                layers: vec![Layer::Implicit, Layer::Task],
                conflicting: false,
                winner: Layer::Task,
            }]
        );

        let assets = &experiment.task().common_assets;
        assert!(assets.get("climate/example_rainfall_daily.bin").is_some());
        assert!(assets.get("demographics.json").is_some());
        assert!(assets.get("Eradication").is_some());
    }

    #[test]
    fn test_variants_differ_only_in_run_number() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = workspace(dir.path());
        let platform = platform(&manifest);
        let experiment =
            build_experiment(&manifest, BurnInParameters::default(), platform.as_ref(), "jdoe").unwrap();

        let strip = |config: &emod_burnin::ConfigDescriptor| -> Vec<(String, Value)> {
            config
                .iter()
                .filter(|(name, _)| name.as_str() != "Run_Number")
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect()
        };
        let first = strip(&experiment.simulations()[0].config);
        for simulation in experiment.simulations() {
            assert_eq!(strip(&simulation.config), first);
        }
    }

    #[test]
    fn test_dry_run_submission() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = workspace(dir.path());
        let platform = platform(&manifest);
        let experiment =
            build_experiment(&manifest, BurnInParameters::default(), platform.as_ref(), "jdoe").unwrap();
        let submission = experiment.run(platform.as_ref()).unwrap();

        assert_eq!(submission.job_id, None);
        assert!(submission.experiment_dir.starts_with(&manifest.job_directory));
        let campaign: Value = serde_json::from_slice(
            &fs::read(
                submission
                    .experiment_dir
                    .join(&experiment.simulations()[0].id)
                    .join("campaign.json"),
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(campaign["Events"].as_array().unwrap().len(), 2);
        assert!(
            submission
                .experiment_dir
                .join("Assets")
                .join("climate")
                .join("example_relative_humidity_daily.bin")
                .is_file()
        );
    }

    #[test]
    fn test_missing_climate_directory() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = workspace(dir.path());
        fs::remove_dir_all(&manifest.climate_dir).unwrap();
        let platform = platform(&manifest);
        let err = build_experiment(&manifest, BurnInParameters::default(), platform.as_ref(), "jdoe")
            .unwrap_err();
        assert!(matches!(err, Error::MissingAssetDirectory(_)));
    }

    #[test]
    fn test_manifest_burnin_section() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = workspace(dir.path());
        let parameters = manifest
            .section::<BurnInParameters>("burnin")
            .unwrap()
            .unwrap_or_default()
            .with_overrides(Some(50), None);
        assert_eq!(parameters.serialize_years, 50);
        assert_eq!(parameters.num_seeds, 3);
        assert_eq!(parameters.burnin_days().unwrap(), 18250);
    }
}
