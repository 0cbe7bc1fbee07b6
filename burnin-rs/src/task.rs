//! A runnable engine task: config merge, campaign, demographics and assets.

use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tracing::{info, warn};

use crate::assets::{Asset, AssetCollection};
use crate::campaign::CampaignDescriptor;
use crate::config::{ConfigDescriptor, ConfigMerge, Diagnostic, Layer};
use crate::demographics::DemographicsDescriptor;
use crate::error::Result;
use crate::platform::Platform;
use crate::reporters::EventRecorder;
use crate::schema::Schema;
use crate::sweep::Tags;

pub const DEMOGRAPHICS_FILENAME: &str = "demographics.json";
pub const CAMPAIGN_FILENAME: &str = "campaign.json";
pub const CONFIG_FILENAME: &str = "config.json";

/// Produces the three inputs of a simulation.
pub trait SimulationInputs {
    /// Parameter overrides applied on top of the team defaults.
    fn config(&self) -> Result<ConfigDescriptor>;
    fn campaign(&self) -> Result<CampaignDescriptor>;
    fn demographics(&self) -> Result<DemographicsDescriptor>;
}

#[derive(Debug, Clone)]
pub struct EmodTask {
    eradication_path: PathBuf,
    merge: ConfigMerge,
    campaign: CampaignDescriptor,
    demographics: DemographicsDescriptor,
    schema: Schema,
    sif: Option<PathBuf>,
    pub common_assets: AssetCollection,
}

impl EmodTask {
    pub fn from_inputs(
        eradication_path: &Path,
        schema: Schema,
        defaults: &ConfigDescriptor,
        inputs: &impl SimulationInputs,
    ) -> Result<Self> {
        let campaign = inputs.campaign()?;
        let demographics = inputs.demographics()?;

        let mut merge = ConfigMerge::new();
        merge.extend(Layer::Defaults, defaults);
        merge.extend(Layer::Implicit, &demographics.implicit_config());
        merge.write(Layer::Implicit, "Demographics_Filenames", json!([DEMOGRAPHICS_FILENAME]));
        merge.write(Layer::Implicit, "Campaign_Filename", CAMPAIGN_FILENAME);
        let custom_events = campaign.custom_events();
        if !custom_events.is_empty() {
            merge.write(Layer::Implicit, "Custom_Individual_Events", json!(custom_events));
        }
        merge.extend(Layer::Parameters, &inputs.config()?);

        let mut common_assets = AssetCollection::new();
        common_assets.add_file(eradication_path, None)?;
        common_assets.add_asset(Asset::from_content(
            DEMOGRAPHICS_FILENAME,
            serde_json::to_vec_pretty(&demographics.to_json())?,
        ))?;

        info!(
            engine = %eradication_path.display(),
            rules = campaign.rules().len(),
            nodes = demographics.nodes().len(),
            "task assembled"
        );

        Ok(Self {
            eradication_path: eradication_path.to_path_buf(),
            merge,
            campaign,
            demographics,
            schema,
            sif: None,
            common_assets,
        })
    }

    /// Binds a container image, as resolved by `platform`.
    pub fn set_sif(&mut self, sif: &Path, platform: &dyn Platform) -> Result<()> {
        let image = platform.container_image(sif)?;
        info!(platform = platform.name(), image = %image.display(), "container image bound");
        self.sif = Some(image);
        Ok(())
    }

    pub fn sif(&self) -> Option<&Path> {
        self.sif.as_deref()
    }

    /// Overrides a config parameter on the assembled task.
    pub fn set_parameter(&mut self, name: &str, value: impl Into<Value>) {
        self.merge.write(Layer::Task, name, value);
    }

    pub fn add_reporter(&mut self, recorder: &EventRecorder) -> Result<()> {
        recorder.validate()?;
        self.merge.extend(Layer::Reporters, &recorder.to_config());
        Ok(())
    }

    /// Engine executable name inside the assets directory.
    pub fn executable(&self) -> String {
        self.eradication_path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Eradication".to_string())
    }

    pub fn campaign(&self) -> &CampaignDescriptor {
        &self.campaign
    }

    pub fn demographics(&self) -> &DemographicsDescriptor {
        &self.demographics
    }

    /// The resolved base configuration.
    pub fn config(&self) -> ConfigDescriptor {
        self.merge.resolve().0
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.merge.resolve().1
    }

    /// The base configuration with `tags` applied as sweep values.
    pub fn simulation_config(&self, tags: &Tags) -> ConfigDescriptor {
        let mut merge = self.merge.clone();
        for (name, value) in tags {
            merge.write(Layer::Sweep, name.clone(), value.clone());
        }
        merge.resolve().0
    }

    /// Logs repeated writes and names the schema does not know.
    pub fn check(&self) {
        let (config, diagnostics) = self.merge.resolve();
        for d in &diagnostics {
            let layers: Vec<String> = d.layers.iter().map(ToString::to_string).collect();
            if d.conflicting {
                warn!(
                    parameter = %d.parameter,
                    layers = %layers.join(","),
                    winner = %d.winner,
                    "parameter written with different values"
                );
            } else {
                info!(parameter = %d.parameter, layers = %layers.join(","), "parameter written more than once");
            }
        }
        for name in self.schema.unknown_parameters(&config) {
            warn!(parameter = name, "parameter not found in schema");
        }
        for class in self.schema.unknown_classes(&self.campaign) {
            warn!(class, "intervention class not found in schema");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::campaign::{TargetSex, TriggeredPropertyChange};
    use crate::error::Error;

    pub(crate) struct Toggle;

    impl SimulationInputs for Toggle {
        fn config(&self) -> Result<ConfigDescriptor> {
            let mut config = ConfigDescriptor::new();
            config
                .set("Simulation_Duration", 730)
                .set("Run_Number", 0)
                .set("Birth_Rate_Dependence", "FIXED_BIRTH_RATE");
            Ok(config)
        }

        fn campaign(&self) -> Result<CampaignDescriptor> {
            let mut campaign = CampaignDescriptor::default();
            campaign.add(
                TriggeredPropertyChange::new(["Pregnant"], "Pregnancy", "IsPregnant")
                    .target_sex(TargetSex::Female),
            );
            Ok(campaign)
        }

        fn demographics(&self) -> Result<DemographicsDescriptor> {
            let mut demog = DemographicsDescriptor::from_template_node(0.0, 0.0, 100, "Test");
            demog.add_individual_property("Pregnancy", ["NotPregnant", "IsPregnant"], vec![1.0, 0.0])?;
            Ok(demog)
        }
    }

    pub(crate) fn engine() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"#!/bin/sh\n").unwrap();
        file
    }

    pub(crate) fn task(engine: &Path) -> EmodTask {
        let mut defaults = ConfigDescriptor::new();
        defaults.set("Simulation_Duration", 365).set("Custom_Individual_Events", json!([]));
        EmodTask::from_inputs(engine, Schema::permissive(), &defaults, &Toggle).unwrap()
    }

    #[test]
    fn test_from_inputs() {
        let engine = engine();
        let task = task(engine.path());
        let config = task.config();
        assert_eq!(config.get("Simulation_Duration"), Some(&json!(730)));
        assert_eq!(
            config.get("Custom_Individual_Events"),
            Some(&json!(["Ind_Property_Blackout"]))
        );
        assert_eq!(config.get("Demographics_Filenames"), Some(&json!(["demographics.json"])));
        assert!(task.common_assets.get(DEMOGRAPHICS_FILENAME).is_some());
        assert!(task.common_assets.get(&task.executable()).is_some());
        assert!(task.diagnostics().is_empty());
    }

    #[test]
    fn test_task_override_wins_and_is_flagged() {
        let engine = engine();
        let mut task = task(engine.path());
        task.set_parameter("Birth_Rate_Dependence", "INDIVIDUAL_PREGNANCIES");
        assert_eq!(
            task.config().get("Birth_Rate_Dependence"),
            Some(&json!("INDIVIDUAL_PREGNANCIES"))
        );
        let diagnostics = task.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].parameter, "Birth_Rate_Dependence");
        assert!(diagnostics[0].conflicting);
    }

    #[test]
    fn test_simulation_config_applies_tags() {
        let engine = engine();
        let task = task(engine.path());
        let tags: Tags = [("Run_Number".to_string(), json!(2))].into_iter().collect();
        let config = task.simulation_config(&tags);
        assert_eq!(config.get("Run_Number"), Some(&json!(2)));
        assert_eq!(task.config().get("Run_Number"), Some(&json!(0)));
    }

    #[test]
    fn test_invalid_reporter_is_rejected() {
        let engine = engine();
        let mut task = task(engine.path());
        let err = task
            .add_reporter(&EventRecorder::new(["Pregnant"], 10, 1))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidReporter(_)));
        assert!(task.config().get("Report_Event_Recorder").is_none());
    }

    #[test]
    fn test_missing_engine() {
        let err = EmodTask::from_inputs(
            Path::new("/no/such/Eradication"),
            Schema::permissive(),
            &ConfigDescriptor::new(),
            &Toggle,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
