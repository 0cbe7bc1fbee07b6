//! Campaign (`campaign.json`) built from triggered individual-property changes.

use serde_json::{Value, json};

/// Event broadcast while a blackout is active; must be a declared custom event.
pub const BLACKOUT_EVENT: &str = "Ind_Property_Blackout";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSex {
    All,
    Male,
    Female,
}

/// Changes an individual property when one of `triggers` is broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredPropertyChange {
    pub triggers: Vec<String>,
    pub property: String,
    pub value: String,
    pub start_day: f64,
    pub target_sex: TargetSex,
    pub target_age_min: f64,
    pub target_age_max: f64,
    pub coverage: f64,
    pub daily_probability: f64,
    pub maximum_duration: f64,
    /// Days until the previous value is restored; `None` keeps the change.
    pub revert_in_days: Option<f64>,
    pub listening_duration: f64,
    pub blackout: bool,
}

impl TriggeredPropertyChange {
    pub fn new<I, S>(triggers: I, property: impl Into<String>, value: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            triggers: triggers.into_iter().map(Into::into).collect(),
            property: property.into(),
            value: value.into(),
            start_day: 0.0,
            target_sex: TargetSex::All,
            target_age_min: 0.0,
            target_age_max: 200.0,
            coverage: 1.0,
            daily_probability: 1.0,
            maximum_duration: 0.0,
            revert_in_days: None,
            listening_duration: -1.0,
            blackout: true,
        }
    }

    pub fn target_sex(mut self, sex: TargetSex) -> Self {
        self.target_sex = sex;
        self
    }

    pub fn daily_probability(mut self, probability: f64) -> Self {
        self.daily_probability = probability;
        self
    }

    pub fn revert_in_days(mut self, days: Option<f64>) -> Self {
        self.revert_in_days = days;
        self
    }

    pub fn blackout(mut self, blackout: bool) -> Self {
        self.blackout = blackout;
        self
    }

    fn to_event(&self) -> Value {
        let changer = json!({
            "class": "PropertyValueChanger",
            "Target_Property_Key": self.property,
            "Target_Property_Value": self.value,
            "Daily_Probability": self.daily_probability,
            "Maximum_Duration": self.maximum_duration,
            "Revert": self.revert_in_days.unwrap_or(0.0)
        });

        let mut listener = json!({
            "class": "NodeLevelHealthTriggeredIV",
            "Trigger_Condition_List": self.triggers,
            "Demographic_Coverage": self.coverage,
            "Duration": self.listening_duration,
            "Actual_IndividualIntervention_Config": changer
        });
        match self.target_sex {
            TargetSex::All => {
                listener["Target_Demographic"] = json!("Everyone");
            }
            sex => {
                let gender = if sex == TargetSex::Male { "Male" } else { "Female" };
                listener["Target_Demographic"] = json!("ExplicitAgeRangesAndGender");
                listener["Target_Age_Min"] = json!(self.target_age_min);
                listener["Target_Age_Max"] = json!(self.target_age_max);
                listener["Target_Gender"] = json!(gender);
            }
        }
        if self.blackout {
            listener["Blackout_Event_Trigger"] = json!(BLACKOUT_EVENT);
            listener["Blackout_Period"] = json!(1.0);
            listener["Blackout_On_First_Occurrence"] = json!(0);
        }

        json!({
            "class": "CampaignEvent",
            "Start_Day": self.start_day,
            "Nodeset_Config": { "class": "NodeSetAll" },
            "Event_Coordinator_Config": {
                "class": "StandardInterventionDistributionEventCoordinator",
                "Number_Repetitions": 1,
                "Intervention_Config": listener
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignDescriptor {
    name: String,
    rules: Vec<TriggeredPropertyChange>,
}

impl Default for CampaignDescriptor {
    fn default() -> Self {
        Self::new("Initial Campaign")
    }
}

impl CampaignDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn add(&mut self, rule: TriggeredPropertyChange) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[TriggeredPropertyChange] {
        &self.rules
    }

    /// `(trigger, property, value)` for every rule and trigger.
    pub fn transitions(&self) -> Vec<(&str, &str, &str)> {
        self.rules
            .iter()
            .flat_map(|rule| {
                rule.triggers
                    .iter()
                    .map(|t| (t.as_str(), rule.property.as_str(), rule.value.as_str()))
            })
            .collect()
    }

    /// Custom events the campaign broadcasts itself.
    pub fn custom_events(&self) -> Vec<String> {
        if self.rules.iter().any(|r| r.blackout) {
            vec![BLACKOUT_EVENT.to_string()]
        } else {
            Vec::new()
        }
    }

    /// Intervention classes referenced by the rendered campaign.
    pub fn intervention_classes(&self) -> Vec<&'static str> {
        if self.rules.is_empty() {
            Vec::new()
        } else {
            vec!["NodeLevelHealthTriggeredIV", "PropertyValueChanger"]
        }
    }

    pub fn to_json(&self) -> Value {
        let events: Vec<Value> = self.rules.iter().map(TriggeredPropertyChange::to_event).collect();
        json!({
            "Campaign_Name": self.name,
            "Use_Defaults": 1,
            "Events": events
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_female_blackout_rule() {
        let mut campaign = CampaignDescriptor::default();
        campaign.add(
            TriggeredPropertyChange::new(["Pregnant"], "Pregnancy", "IsPregnant")
                .target_sex(TargetSex::Female),
        );
        let doc = campaign.to_json();
        let listener = &doc["Events"][0]["Event_Coordinator_Config"]["Intervention_Config"];
        assert_eq!(listener["Trigger_Condition_List"], json!(["Pregnant"]));
        assert_eq!(listener["Target_Gender"], json!("Female"));
        assert_eq!(listener["Blackout_Event_Trigger"], json!(BLACKOUT_EVENT));
        let changer = &listener["Actual_IndividualIntervention_Config"];
        assert_eq!(changer["Target_Property_Key"], json!("Pregnancy"));
        assert_eq!(changer["Target_Property_Value"], json!("IsPregnant"));
        assert_eq!(changer["Daily_Probability"], json!(1.0));
        assert_eq!(changer["Revert"], json!(0.0));
        assert_eq!(campaign.custom_events(), vec![BLACKOUT_EVENT.to_string()]);
    }

    #[test]
    fn test_without_blackout() {
        let mut campaign = CampaignDescriptor::default();
        campaign.add(TriggeredPropertyChange::new(["GaveBirth"], "Pregnancy", "NotPregnant").blackout(false));
        let doc = campaign.to_json();
        let listener = &doc["Events"][0]["Event_Coordinator_Config"]["Intervention_Config"];
        assert!(listener.get("Blackout_Event_Trigger").is_none());
        assert_eq!(listener["Target_Demographic"], json!("Everyone"));
        assert!(campaign.custom_events().is_empty());
    }

    #[test]
    fn test_transitions() {
        let mut campaign = CampaignDescriptor::default();
        campaign
            .add(TriggeredPropertyChange::new(["Pregnant"], "Pregnancy", "IsPregnant"))
            .add(TriggeredPropertyChange::new(["GaveBirth"], "Pregnancy", "NotPregnant"));
        assert_eq!(
            campaign.transitions(),
            vec![
                ("Pregnant", "Pregnancy", "IsPregnant"),
                ("GaveBirth", "Pregnancy", "NotPregnant")
            ]
        );
    }
}
