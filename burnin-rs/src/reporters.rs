use serde_json::json;

use crate::config::ConfigDescriptor;
use crate::error::{Error, Result};

/// Built-in event recorder report, configured through the engine config.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecorder {
    pub events: Vec<String>,
    pub start_day: u32,
    pub end_day: u32,
    pub min_age_years: f64,
    pub max_age_years: f64,
    pub ips_to_record: Vec<String>,
    pub property_change_ip_to_record: Option<String>,
    pub node_ids: Vec<u32>,
    pub must_have_ip_key_value: Option<String>,
    pub must_have_intervention: Option<String>,
}

impl EventRecorder {
    pub fn new<S: Into<String>>(events: impl IntoIterator<Item = S>, start_day: u32, end_day: u32) -> Self {
        Self {
            events: events.into_iter().map(Into::into).collect(),
            start_day,
            end_day,
            min_age_years: 0.0,
            max_age_years: 9.3228e35,
            ips_to_record: Vec::new(),
            property_change_ip_to_record: None,
            node_ids: Vec::new(),
            must_have_ip_key_value: None,
            must_have_intervention: None,
        }
    }

    pub fn ages(mut self, min_years: f64, max_years: f64) -> Self {
        self.min_age_years = min_years;
        self.max_age_years = max_years;
        self
    }

    pub fn record_properties<S: Into<String>>(mut self, ips: impl IntoIterator<Item = S>) -> Self {
        self.ips_to_record = ips.into_iter().map(Into::into).collect();
        self
    }

    pub fn property_change(mut self, ip: impl Into<String>) -> Self {
        self.property_change_ip_to_record = Some(ip.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.events.is_empty() {
            return Err(Error::InvalidReporter("no events to record".into()));
        }
        if self.start_day > self.end_day {
            return Err(Error::InvalidReporter(format!(
                "start day {} is after end day {}",
                self.start_day, self.end_day
            )));
        }
        if self.min_age_years > self.max_age_years {
            return Err(Error::InvalidReporter(format!(
                "minimum age {} exceeds maximum age {}",
                self.min_age_years, self.max_age_years
            )));
        }
        Ok(())
    }

    pub fn to_config(&self) -> ConfigDescriptor {
        let mut config = ConfigDescriptor::new();
        config
            .set("Report_Event_Recorder", 1)
            .set("Report_Event_Recorder_Events", json!(self.events))
            .set("Report_Event_Recorder_Ignore_Events_In_List", 0)
            .set("Report_Event_Recorder_Start_Day", self.start_day)
            .set("Report_Event_Recorder_End_Day", self.end_day)
            .set("Report_Event_Recorder_Min_Age_Years", self.min_age_years)
            .set("Report_Event_Recorder_Max_Age_Years", self.max_age_years)
            .set("Report_Event_Recorder_Node_IDs_Of_Interest", json!(self.node_ids))
            .set("Report_Event_Recorder_Individual_Properties", json!(self.ips_to_record))
            .set(
                "Report_Event_Recorder_PropertyChange_IP_Key_Of_Interest",
                self.property_change_ip_to_record.clone().unwrap_or_default(),
            )
            .set(
                "Report_Event_Recorder_Must_Have_IP_Key_Value",
                self.must_have_ip_key_value.clone().unwrap_or_default(),
            )
            .set(
                "Report_Event_Recorder_Must_Have_Intervention",
                self.must_have_intervention.clone().unwrap_or_default(),
            );
        config
    }
}
