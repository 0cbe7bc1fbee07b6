//! Pregnancy-tracking burn-in at a single synthetic site.

use emod_burnin::campaign::TargetSex;
use emod_burnin::malaria;
use emod_burnin::{
    AgeDistribution, CampaignDescriptor, ConfigDescriptor, DemographicsDescriptor, EventRecorder,
    Result, SimulationBuilder, SimulationInputs, SweepAxis, TriggeredPropertyChange,
};
use serde_json::json;

use crate::parameters::BurnInParameters;

pub const PREGNANCY: &str = "Pregnancy";
pub const IS_PREGNANT: &str = "IsPregnant";
pub const NOT_PREGNANT: &str = "NotPregnant";
pub const PREGNANT_EVENT: &str = "Pregnant";
pub const BIRTH_EVENT: &str = "GaveBirth";

const SPECIES: [&str; 3] = ["gambiae", "arabiensis", "funestus"];

pub struct PregnancyBurnIn {
    parameters: BurnInParameters,
}

impl PregnancyBurnIn {
    pub fn new(parameters: BurnInParameters) -> Self {
        Self { parameters }
    }

    /// One simulation per random seed.
    pub fn sweep(&self) -> Result<SimulationBuilder> {
        let mut builder = SimulationBuilder::new();
        builder.add_sweep_definition(SweepAxis::new("Run_Number", 0..self.parameters.num_seeds))?;
        Ok(builder)
    }

    /// Pregnancy events over the whole burn-in, tagged with the property value.
    pub fn event_recorder(&self) -> Result<EventRecorder> {
        let recorder = EventRecorder::new(
            [PREGNANT_EVENT, BIRTH_EVENT],
            1,
            self.parameters.burnin_days()?,
        )
        .ages(0.0, 100.0)
        .record_properties([PREGNANCY])
        .property_change(PREGNANCY);
        Ok(recorder)
    }

    pub fn experiment_name(user: &str) -> String {
        format!("{user}_FE_example_burnin50_IP")
    }
}

impl SimulationInputs for PregnancyBurnIn {
    fn config(&self) -> Result<ConfigDescriptor> {
        let duration = self.parameters.burnin_days()?;
        let mut config = ConfigDescriptor::new();
        config
            .set("Air_Temperature_Filename", "climate/example_air_temperature_daily.bin")
            .set("Land_Temperature_Filename", "climate/example_air_temperature_daily.bin")
            .set("Rainfall_Filename", "climate/example_rainfall_daily.bin")
            .set("Relative_Humidity_Filename", "climate/example_relative_humidity_daily.bin")
            .set("Vector_Species_Params", malaria::species_params(&SPECIES)?)
            .set("Simulation_Duration", duration)
            .set("Run_Number", 0)
            .set("x_Temporary_Larval_Habitat", 0.316228)
            .set("x_Birth", 3.62)
            .set("Base_Individual_Sample_Rate", 1)
            .set("Inset_Chart_Include_Pregnancies", 1)
            .set("Serialized_Population_Writing_Type", "TIMESTEP")
            .set("Serialization_Time_Steps", json!([duration]))
            .set("Serialization_Mask_Node_Write", 0)
            .set("Serialization_Precision", "REDUCED");
        Ok(config)
    }

    fn campaign(&self) -> Result<CampaignDescriptor> {
        let mut campaign = CampaignDescriptor::default();
        campaign
            .add(
                TriggeredPropertyChange::new([PREGNANT_EVENT], PREGNANCY, IS_PREGNANT)
                    .target_sex(TargetSex::Female)
                    .daily_probability(1.0)
                    .revert_in_days(None)
                    .blackout(true),
            )
            .add(
                TriggeredPropertyChange::new([BIRTH_EVENT], PREGNANCY, NOT_PREGNANT)
                    .target_sex(TargetSex::Female)
                    .daily_probability(1.0)
                    .revert_in_days(None)
                    .blackout(true),
            );
        Ok(campaign)
    }

    fn demographics(&self) -> Result<DemographicsDescriptor> {
        let mut demog = DemographicsDescriptor::from_template_node(5.7376, -0.4404, 3000, "Example_Site");
        demog.set_age_distribution(AgeDistribution::ss_africa());
        demog.add_individual_property(PREGNANCY, [NOT_PREGNANT, IS_PREGNANT], vec![1.0, 0.0])?;
        Ok(demog)
    }
}
