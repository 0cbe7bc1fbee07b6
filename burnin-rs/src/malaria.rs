use serde_json::{Value, json};

use crate::config::ConfigDescriptor;
use crate::error::{Error, Result};

/// Baseline configuration for a single-node malaria simulation.
pub fn team_defaults() -> ConfigDescriptor {
    [
        ("Simulation_Type", json!("MALARIA_SIM")),
        ("Simulation_Duration", json!(365)),
        ("Simulation_Timestep", json!(1)),
        ("Start_Time", json!(0)),
        ("Run_Number", json!(0)),
        ("Node_Grid_Size", json!(0.042)),
        ("Demographics_Filenames", json!(["demographics.json"])),
        ("Campaign_Filename", json!("campaign.json")),
        ("Enable_Interventions", json!(1)),
        ("Enable_Demographics_Builtin", json!(0)),
        ("Enable_Demographics_Risk", json!(1)),
        ("Enable_Vital_Dynamics", json!(1)),
        ("Enable_Birth", json!(1)),
        ("Enable_Natural_Mortality", json!(1)),
        ("Enable_Disease_Mortality", json!(0)),
        ("Birth_Rate_Dependence", json!("FIXED_BIRTH_RATE")),
        ("Death_Rate_Dependence", json!("NOT_INITIALIZED")),
        ("Age_Initialization_Distribution_Type", json!("DISTRIBUTION_SIMPLE")),
        ("Base_Individual_Sample_Rate", json!(1)),
        ("Climate_Model", json!("CLIMATE_BY_DATA")),
        ("Enable_Climate_Stochasticity", json!(0)),
        ("Malaria_Model", json!("MALARIA_MECHANISTIC_MODEL")),
        ("Malaria_Strain_Model", json!("FALCIPARUM_RANDOM_STRAIN")),
        ("Parasite_Switch_Type", json!("RATE_PER_PARASITE_7VARS")),
        ("Max_Individual_Infections", json!(3)),
        ("Infection_Updates_Per_Timestep", json!(8)),
        ("Incubation_Period_Constant", json!(7)),
        ("Antibody_IRBC_Kill_Rate", json!(1.596)),
        ("Antigen_Switch_Rate", json!(7.645e-10)),
        ("Base_Gametocyte_Production_Rate", json!(0.0615)),
        ("Falciparum_MSP_Variants", json!(32)),
        ("Falciparum_Nonspecific_Types", json!(76)),
        ("Falciparum_PfEMP1_Variants", json!(1070)),
        ("Fever_IRBC_Kill_Rate", json!(1.4)),
        ("Gametocyte_Stage_Survival_Rate", json!(0.588)),
        ("MSP1_Merozoite_Kill_Fraction", json!(0.511)),
        ("Max_MSP1_Antibody_Growthrate", json!(0.045)),
        ("Merozoites_Per_Hepatocyte", json!(15000)),
        ("Merozoites_Per_Schizont", json!(16)),
        ("Nonspecific_Antigenicity_Factor", json!(0.415)),
        ("Pyrogenic_Threshold", json!(15000)),
        ("Vector_Sampling_Type", json!("VECTOR_COMPARTMENTS_NUMBER")),
        ("Human_Feeding_Mortality", json!(0.1)),
        ("Egg_Hatch_Density_Dependence", json!("NO_DENSITY_DEPENDENCE")),
        ("Temperature_Dependent_Feeding_Cycle", json!("NO_TEMPERATURE_DEPENDENCE")),
        ("Vector_Larval_Rainfall_Mortality", json!("NONE")),
        ("Vector_Species_Params", json!([])),
        ("x_Temporary_Larval_Habitat", json!(1)),
        ("x_Birth", json!(1)),
        ("Custom_Individual_Events", json!([])),
        ("Inset_Chart_Include_Pregnancies", json!(0)),
        ("Report_Event_Recorder", json!(0)),
        ("Serialized_Population_Writing_Type", json!("NONE")),
        ("Serialization_Precision", json!("FULL")),
        ("Serialization_Mask_Node_Write", json!(0)),
    ]
    .into_iter()
    .collect()
}

/// `Vector_Species_Params` entries for the named species, in the given order.
pub fn species_params(names: &[&str]) -> Result<Value> {
    let species = names
        .iter()
        .map(|name| species(name).ok_or_else(|| Error::UnknownSpecies((*name).to_string())))
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::Array(species))
}

fn species(name: &str) -> Option<Value> {
    let (anthropophily, indoor_feeding, habitats) = match name {
        "gambiae" => (
            0.85,
            0.95,
            json!([
                { "Habitat_Type": "TEMPORARY_RAINFALL", "Max_Larval_Capacity": 11250000000.0_f64 },
                { "Habitat_Type": "CONSTANT", "Max_Larval_Capacity": 40000000.0_f64 }
            ]),
        ),
        "arabiensis" => (
            0.65,
            0.5,
            json!([
                { "Habitat_Type": "TEMPORARY_RAINFALL", "Max_Larval_Capacity": 8000000000.0_f64 },
                { "Habitat_Type": "CONSTANT", "Max_Larval_Capacity": 20000000.0_f64 }
            ]),
        ),
        "funestus" => (
            0.5,
            0.86,
            json!([
                { "Habitat_Type": "WATER_VEGETATION", "Max_Larval_Capacity": 6000000000.0_f64 }
            ]),
        ),
        _ => return None,
    };

    Some(json!({
        "Name": name,
        "Acquire_Modifier": 0.8,
        "Adult_Life_Expectancy": 20,
        "Anthropophily": anthropophily,
        "Aquatic_Arrhenius_1": 84200000000.0_f64,
        "Aquatic_Arrhenius_2": 8328,
        "Aquatic_Mortality_Rate": 0.1,
        "Days_Between_Feeds": 3,
        "Egg_Batch_Size": 100,
        "Habitats": habitats,
        "Immature_Duration": 2,
        "Indoor_Feeding_Fraction": indoor_feeding,
        "Infected_Arrhenius_1": 117000000000.0_f64,
        "Infected_Arrhenius_2": 8336,
        "Infected_Egg_Batch_Factor": 0.8,
        "Infectious_Human_Feed_Mortality_Factor": 1.5,
        "Male_Life_Expectancy": 10,
        "Transmission_Rate": 0.9,
        "Vector_Sugar_Feeding_Frequency": "VECTOR_SUGAR_FEEDING_NONE"
    }))
}
