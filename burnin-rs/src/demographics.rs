use serde_json::{Value, json};

use crate::config::ConfigDescriptor;
use crate::error::{Error, Result};

const DISTRIBUTION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: u32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub initial_population: u64,
}

/// Cumulative age distribution: `distribution_values` are CDF points and
/// `result_values` the matching ages in days.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeDistribution {
    pub distribution_values: Vec<f64>,
    pub result_values: Vec<f64>,
    pub result_scale_factor: f64,
}

impl AgeDistribution {
    /// Sub-Saharan Africa age structure, in five year bands.
    pub fn ss_africa() -> Self {
        Self {
            distribution_values: vec![
                0.0, 0.1665, 0.3228, 0.4636, 0.5868, 0.6918, 0.7775, 0.8448, 0.8950, 0.9313,
                0.9566, 0.9737, 0.9849, 0.9920, 0.9962, 0.9985, 0.9996, 1.0,
            ],
            result_values: (0..18).map(|band| f64::from(band) * 5.0 * 365.0).collect(),
            result_scale_factor: 1.0,
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "AgeDistribution": {
                "DistributionValues": [self.distribution_values],
                "ResultScaleFactor": self.result_scale_factor,
                "ResultValues": [self.result_values]
            }
        })
    }
}

/// Categorical per-individual attribute with its starting distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct IndividualProperty {
    pub property: String,
    pub values: Vec<String>,
    pub initial_distribution: Vec<f64>,
}

impl IndividualProperty {
    fn validate(&self) -> Result<()> {
        let invalid = |message: String| Error::InvalidProperty {
            property: self.property.clone(),
            message,
        };

        if self.values.is_empty() {
            return Err(invalid("no values".into()));
        }
        if self.values.len() != self.initial_distribution.len() {
            return Err(invalid(format!(
                "{} values but {} distribution weights",
                self.values.len(),
                self.initial_distribution.len()
            )));
        }
        for (i, value) in self.values.iter().enumerate() {
            if self.values[..i].contains(value) {
                return Err(invalid(format!("duplicate value `{value}`")));
            }
        }
        if self.initial_distribution.iter().any(|w| *w < 0.0) {
            return Err(invalid("negative distribution weight".into()));
        }
        let total: f64 = self.initial_distribution.iter().sum();
        if (total - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(invalid(format!("distribution sums to {total}, expected 1")));
        }
        Ok(())
    }

    /// Initial weight of `value`, if it is one of the property values.
    pub fn weight_of(&self, value: &str) -> Option<f64> {
        self.values
            .iter()
            .position(|v| v == value)
            .map(|i| self.initial_distribution[i])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemographicsDescriptor {
    id_reference: String,
    nodes: Vec<Node>,
    age_distribution: Option<AgeDistribution>,
    individual_properties: Vec<IndividualProperty>,
}

impl DemographicsDescriptor {
    /// A single node with id 1.
    pub fn from_template_node(latitude: f64, longitude: f64, population: u64, name: &str) -> Self {
        Self {
            id_reference: name.to_string(),
            nodes: vec![Node {
                id: 1,
                name: name.to_string(),
                latitude,
                longitude,
                initial_population: population,
            }],
            age_distribution: None,
            individual_properties: Vec::new(),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn set_age_distribution(&mut self, distribution: AgeDistribution) {
        self.age_distribution = Some(distribution);
    }

    pub fn add_individual_property<V: Into<String>>(
        &mut self,
        property: &str,
        values: impl IntoIterator<Item = V>,
        initial_distribution: Vec<f64>,
    ) -> Result<()> {
        let ip = IndividualProperty {
            property: property.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            initial_distribution,
        };
        if self.individual_property(property).is_some() {
            return Err(Error::InvalidProperty {
                property: ip.property,
                message: "already defined".into(),
            });
        }
        ip.validate()?;
        self.individual_properties.push(ip);
        Ok(())
    }

    pub fn individual_property(&self, property: &str) -> Option<&IndividualProperty> {
        self.individual_properties
            .iter()
            .find(|ip| ip.property == property)
    }

    /// Engine settings these demographics rely on.
    pub fn implicit_config(&self) -> ConfigDescriptor {
        let mut config = ConfigDescriptor::new();
        if self.age_distribution.is_some() {
            config.set("Age_Initialization_Distribution_Type", "DISTRIBUTION_COMPLEX");
        }
        config
    }

    pub fn to_json(&self) -> Value {
        let nodes: Vec<Value> = self
            .nodes
            .iter()
            .map(|node| {
                json!({
                    "NodeID": node.id,
                    "Name": node.name,
                    "NodeAttributes": {
                        "Latitude": node.latitude,
                        "Longitude": node.longitude,
                        "InitialPopulation": node.initial_population
                    }
                })
            })
            .collect();

        let properties: Vec<Value> = self
            .individual_properties
            .iter()
            .map(|ip| {
                json!({
                    "Property": ip.property,
                    "Values": ip.values,
                    "Initial_Distribution": ip.initial_distribution,
                    "Transitions": [],
                    "TransmissionMatrix": {}
                })
            })
            .collect();

        let individual_attributes = self
            .age_distribution
            .as_ref()
            .map(AgeDistribution::to_json)
            .unwrap_or_else(|| json!({}));

        json!({
            "Metadata": {
                "IdReference": self.id_reference,
                "NodeCount": self.nodes.len(),
                "Tool": concat!("emod-burnin ", env!("CARGO_PKG_VERSION"))
            },
            "Defaults": {
                "NodeAttributes": {},
                "IndividualAttributes": individual_attributes,
                "IndividualProperties": properties
            },
            "Nodes": nodes
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> DemographicsDescriptor {
        DemographicsDescriptor::from_template_node(5.7376, -0.4404, 3000, "Example_Site")
    }

    #[test]
    fn test_template_node() {
        let demog = site();
        let doc = demog.to_json();
        assert_eq!(doc["Metadata"]["NodeCount"], json!(1));
        assert_eq!(doc["Nodes"][0]["NodeID"], json!(1));
        assert_eq!(doc["Nodes"][0]["NodeAttributes"]["InitialPopulation"], json!(3000));
        assert_eq!(doc["Nodes"][0]["NodeAttributes"]["Latitude"], json!(5.7376));
        assert!(demog.implicit_config().is_empty());
    }

    #[test]
    fn test_age_distribution_is_complex() {
        let mut demog = site();
        demog.set_age_distribution(AgeDistribution::ss_africa());
        assert_eq!(
            demog.implicit_config().get("Age_Initialization_Distribution_Type"),
            Some(&json!("DISTRIBUTION_COMPLEX"))
        );
        let ages = &demog.to_json()["Defaults"]["IndividualAttributes"]["AgeDistribution"];
        let cdf = ages["DistributionValues"][0].as_array().unwrap();
        assert_eq!(cdf.last(), Some(&json!(1.0)));
        assert_eq!(cdf.len(), ages["ResultValues"][0].as_array().unwrap().len());
    }

    #[test]
    fn test_add_individual_property() {
        let mut demog = site();
        demog
            .add_individual_property("Pregnancy", ["NotPregnant", "IsPregnant"], vec![1.0, 0.0])
            .unwrap();
        let ip = demog.individual_property("Pregnancy").unwrap();
        assert_eq!(ip.weight_of("NotPregnant"), Some(1.0));
        assert_eq!(ip.weight_of("IsPregnant"), Some(0.0));
        let doc = demog.to_json();
        assert_eq!(
            doc["Defaults"]["IndividualProperties"][0]["Initial_Distribution"],
            json!([1.0, 0.0])
        );
    }

    #[test]
    fn test_distribution_must_sum_to_one() {
        let mut demog = site();
        let err = demog
            .add_individual_property("Pregnancy", ["NotPregnant", "IsPregnant"], vec![0.5, 0.4])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidProperty { .. }));
        assert!(demog.individual_property("Pregnancy").is_none());
    }

    #[test]
    fn test_distribution_length_mismatch() {
        let mut demog = site();
        assert!(
            demog
                .add_individual_property("Pregnancy", ["NotPregnant", "IsPregnant"], vec![1.0])
                .is_err()
        );
    }

    #[test]
    fn test_duplicate_property() {
        let mut demog = site();
        demog
            .add_individual_property("Pregnancy", ["NotPregnant", "IsPregnant"], vec![1.0, 0.0])
            .unwrap();
        assert!(
            demog
                .add_individual_property("Pregnancy", ["NotPregnant", "IsPregnant"], vec![1.0, 0.0])
                .is_err()
        );
    }
}
