// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Typed fire incident record, parsed from a [`RawRow`] by the validator stage.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::model::raw_row::RawRow;
use crate::value_objects::IncidentNumber;

/// A single fire incident record, with every CSV column typed.
///
/// Counts (`suppression_units`, `fire_fatalities`, ...) are `i64` rather than
/// `Option<i64>`: an empty or non-numeric source value coerces to `0` at
/// parse time, so `0` and "value was absent" are indistinguishable
/// downstream — this matches the source system's `to_int` helper and is
/// deliberate (see the quality rules for how this interacts with
/// "missing value" detection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireEvent {
    // Identity
    pub incident_number: String,
    pub exposure_number: i64,
    pub id: String,
    pub call_number: String,

    // Timestamps
    pub incident_date: Option<DateTime<Utc>>,
    pub alarm_dt: Option<DateTime<Utc>>,
    pub arrival_dt: Option<DateTime<Utc>>,
    pub close_dt: Option<DateTime<Utc>>,

    // Location
    pub address: String,
    pub city: String,
    pub zipcode: String,
    pub battalion: String,
    pub station_area: String,
    pub box_number: Option<String>,
    pub neighborhood_district: Option<String>,
    pub supervisor_district: Option<String>,
    pub point: Option<String>,

    // Response
    pub suppression_units: i64,
    pub suppression_personnel: i64,
    pub ems_units: i64,
    pub ems_personnel: i64,
    pub other_units: i64,
    pub other_personnel: i64,
    pub first_unit_on_scene: Option<String>,

    // Outcomes
    pub fire_fatalities: i64,
    pub fire_injuries: i64,
    pub civilian_fatalities: i64,
    pub civilian_injuries: i64,
    pub number_of_alarms: i64,
    pub estimated_property_loss: Option<String>,
    pub estimated_contents_loss: Option<String>,
    pub primary_situation: Option<String>,
    pub mutual_aid: Option<String>,
    pub action_taken_primary: Option<String>,
    pub action_taken_secondary: Option<String>,
    pub action_taken_other: Option<String>,

    // Fire properties
    pub detector_alerted_occupants: Option<String>,
    pub property_use: Option<String>,
    pub area_of_fire_origin: Option<String>,
    pub ignition_cause: Option<String>,
    pub ignition_factor_primary: Option<String>,
    pub ignition_factor_secondary: Option<String>,
    pub heat_source: Option<String>,
    pub item_first_ignited: Option<String>,
    pub human_factors_associated_with_ignition: Option<String>,
    pub structure_type: Option<String>,
    pub structure_status: Option<String>,
    pub floor_of_fire_origin: Option<String>,
    pub fire_spread: Option<String>,
    pub no_flame_spread: Option<String>,
    pub floors_minimum_damage: Option<String>,
    pub floors_significant_damage: Option<String>,
    pub floors_heavy_damage: Option<String>,
    pub floors_extreme_damage: Option<String>,
    pub detectors_present: Option<String>,
    pub detector_type: Option<String>,
    pub detector_operation: Option<String>,
    pub detector_effectiveness: Option<String>,
    pub detector_failure_reason: Option<String>,
    pub extinguishing_system_present: Option<String>,
    pub extinguishing_system_type: Option<String>,
    pub extinguishing_system_performance: Option<String>,
    pub extinguishing_system_failure_reason: Option<String>,
    pub sprinkler_heads_operating: Option<String>,

    // Provenance
    pub data_as_of: Option<String>,
    pub data_loaded_at: Option<String>,
}

/// CSV column name -> struct field, looked up by [`FireEvent::from_raw_row`].
///
/// The `Automatic Extinguishing Sytem *` columns keep the source data's
/// "Sytem" misspelling verbatim: it's an external interface contract (the
/// upstream CSV export), not a naming choice we get to make.
fn required(row: &RawRow, column: &str) -> Result<String, PipelineError> {
    row.get(column)
        .map(str::to_string)
        .ok_or_else(|| PipelineError::Parse(format!("missing required column: {column}")))
}

fn optional(row: &RawRow, column: &str) -> Option<String> {
    row.get(column).filter(|v| !v.is_empty()).map(str::to_string)
}

fn to_int(row: &RawRow, column: &str) -> i64 {
    row.get(column)
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.chars().all(|c| c.is_ascii_digit()))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Try each format in turn (datetime formats first, then a bare-date
/// fallback), returning the first that parses. Matches the source system's
/// `try_strptime` semantics: a bad/empty value is not an error, just `None`.
pub fn parse_any_datetime(value: &str, formats: &[String]) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }
    for fmt in formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(date.and_hms_opt(0, 0, 0).unwrap(), Utc));
        }
    }
    None
}

impl FireEvent {
    /// Parse a raw CSV row into a typed `FireEvent`.
    ///
    /// `date_formats` is the effective format list (`DATE_FORMAT` followed by
    /// each entry of the pipe-separated `DATETIME_FORMAT`), tried in order
    /// for every timestamp column. A row with an unparseable or missing date
    /// still parses successfully here — date-based rejection is a
    /// data-quality rule, not a parse failure (see `crate::quality`).
    pub fn from_raw_row(row: &RawRow, date_formats: &[String]) -> Result<Self, PipelineError> {
        let parse_dt = |column: &str| -> Option<DateTime<Utc>> {
            row.get(column).and_then(|v| parse_any_datetime(v, date_formats))
        };

        Ok(FireEvent {
            incident_number: required(row, "Incident Number")?,
            exposure_number: to_int(row, "Exposure Number"),
            id: required(row, "ID")?,
            call_number: required(row, "Call Number")?,

            incident_date: parse_dt("Incident Date"),
            alarm_dt: parse_dt("Alarm DtTm"),
            arrival_dt: parse_dt("Arrival DtTm"),
            close_dt: parse_dt("Close DtTm"),

            address: required(row, "Address")?,
            city: required(row, "City")?,
            zipcode: required(row, "zipcode")?,
            battalion: required(row, "Battalion")?,
            station_area: required(row, "Station Area")?,
            box_number: optional(row, "Box"),
            neighborhood_district: optional(row, "neighborhood_district"),
            supervisor_district: optional(row, "Supervisor District"),
            point: optional(row, "point"),

            suppression_units: to_int(row, "Suppression Units"),
            suppression_personnel: to_int(row, "Suppression Personnel"),
            ems_units: to_int(row, "EMS Units"),
            ems_personnel: to_int(row, "EMS Personnel"),
            other_units: to_int(row, "Other Units"),
            other_personnel: to_int(row, "Other Personnel"),
            first_unit_on_scene: optional(row, "First Unit On Scene"),

            fire_fatalities: to_int(row, "Fire Fatalities"),
            fire_injuries: to_int(row, "Fire Injuries"),
            civilian_fatalities: to_int(row, "Civilian Fatalities"),
            civilian_injuries: to_int(row, "Civilian Injuries"),
            number_of_alarms: to_int(row, "Number of Alarms"),
            estimated_property_loss: optional(row, "Estimated Property Loss"),
            estimated_contents_loss: optional(row, "Estimated Contents Loss"),
            primary_situation: optional(row, "Primary Situation"),
            mutual_aid: optional(row, "Mutual Aid"),
            action_taken_primary: optional(row, "Action Taken Primary"),
            action_taken_secondary: optional(row, "Action Taken Secondary"),
            action_taken_other: optional(row, "Action Taken Other"),

            detector_alerted_occupants: optional(row, "Detector Alerted Occupants"),
            property_use: optional(row, "Property Use"),
            area_of_fire_origin: optional(row, "Area of Fire Origin"),
            ignition_cause: optional(row, "Ignition Cause"),
            ignition_factor_primary: optional(row, "Ignition Factor Primary"),
            ignition_factor_secondary: optional(row, "Ignition Factor Secondary"),
            heat_source: optional(row, "Heat Source"),
            item_first_ignited: optional(row, "Item First Ignited"),
            human_factors_associated_with_ignition: optional(row, "Human Factors Associated with Ignition"),
            structure_type: optional(row, "Structure Type"),
            structure_status: optional(row, "Structure Status"),
            floor_of_fire_origin: optional(row, "Floor of Fire Origin"),
            fire_spread: optional(row, "Fire Spread"),
            no_flame_spread: optional(row, "No Flame Spread"),
            floors_minimum_damage: optional(row, "Number of floors with minimum damage"),
            floors_significant_damage: optional(row, "Number of floors with significant damage"),
            floors_heavy_damage: optional(row, "Number of floors with heavy damage"),
            floors_extreme_damage: optional(row, "Number of floors with extreme damage"),
            detectors_present: optional(row, "Detectors Present"),
            detector_type: optional(row, "Detector Type"),
            detector_operation: optional(row, "Detector Operation"),
            detector_effectiveness: optional(row, "Detector Effectiveness"),
            detector_failure_reason: optional(row, "Detector Failure Reason"),
            extinguishing_system_present: optional(row, "Automatic Extinguishing System Present"),
            extinguishing_system_type: optional(row, "Automatic Extinguishing Sytem Type"),
            extinguishing_system_performance: optional(row, "Automatic Extinguishing Sytem Perfomance"),
            extinguishing_system_failure_reason: optional(row, "Automatic Extinguishing Sytem Failure Reason"),
            sprinkler_heads_operating: optional(row, "Number of Sprinkler Heads Operating"),

            data_as_of: optional(row, "data_as_of"),
            data_loaded_at: optional(row, "data_loaded_at"),
        })
    }

    pub fn incident_number(&self) -> IncidentNumber {
        IncidentNumber::new(self.incident_number.clone())
    }

    /// Build the serving-layer base key for this event: `{prefix}:{incident_number}`.
    ///
    /// The source system's equivalent helper produces a double colon
    /// (`f"{prefix}{':' if prefix else ''}:{...}"` always appends a second
    /// `:` even when the prefix already ends in one); this implementation
    /// uses the single-colon scheme the interface actually documents.
    pub fn to_key(&self, prefix: &str) -> String {
        format!("{prefix}:{}", self.incident_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn sample_row() -> RawRow {
        let mut fields = IndexMap::new();
        fields.insert("Incident Number".into(), "19123456".into());
        fields.insert("Exposure Number".into(), "0".into());
        fields.insert("ID".into(), "191234560".into());
        fields.insert("Call Number".into(), "192221234".into());
        fields.insert("Address".into(), "100 Market St".into());
        fields.insert("Incident Date".into(), "2019/05/01".into());
        fields.insert("Alarm DtTm".into(), "2019/05/01 10:15:00".into());
        fields.insert("Arrival DtTm".into(), "".into());
        fields.insert("Close DtTm".into(), "".into());
        fields.insert("City".into(), "San Francisco".into());
        fields.insert("zipcode".into(), "94105".into());
        fields.insert("Battalion".into(), "B01".into());
        fields.insert("Station Area".into(), "01".into());
        fields.insert("Box".into(), "".into());
        fields.insert("Suppression Units".into(), "3".into());
        fields.insert("Suppression Personnel".into(), "12".into());
        fields.insert("EMS Units".into(), "".into());
        fields.insert("EMS Personnel".into(), "".into());
        fields.insert("Other Units".into(), "".into());
        fields.insert("Other Personnel".into(), "".into());
        fields.insert("First Unit On Scene".into(), "".into());
        fields.insert("Fire Fatalities".into(), "".into());
        fields.insert("Fire Injuries".into(), "".into());
        fields.insert("Civilian Fatalities".into(), "".into());
        fields.insert("Civilian Injuries".into(), "".into());
        fields.insert("Number of Alarms".into(), "1".into());
        fields.insert("Supervisor District".into(), "6".into());
        fields.insert("neighborhood_district".into(), "Financial District".into());
        RawRow::new(fields)
    }

    fn date_formats() -> Vec<String> {
        vec!["%Y/%m/%d %H:%M:%S".to_string(), "%Y/%m/%d".to_string()]
    }

    #[test]
    fn test_parses_required_and_counts() {
        let row = sample_row();
        let event = FireEvent::from_raw_row(&row, &date_formats()).unwrap();
        assert_eq!(event.incident_number, "19123456");
        assert_eq!(event.suppression_units, 3);
        assert_eq!(event.ems_units, 0); // empty -> coerced to 0, not missing
        assert!(event.box_number.is_none());
    }

    #[test]
    fn test_parses_date_only_and_datetime_formats() {
        let row = sample_row();
        let event = FireEvent::from_raw_row(&row, &date_formats()).unwrap();
        assert!(event.incident_date.is_some());
        assert!(event.alarm_dt.is_some());
        assert!(event.arrival_dt.is_none());
    }

    #[test]
    fn test_missing_required_column_is_parse_error() {
        let mut fields = IndexMap::new();
        fields.insert("Incident Number".into(), "19123456".into());
        let row = RawRow::new(fields);
        let result = FireEvent::from_raw_row(&row, &date_formats());
        assert!(matches!(result, Err(PipelineError::Parse(_))));
    }

    #[test]
    fn test_to_key_uses_single_colon() {
        let row = sample_row();
        let event = FireEvent::from_raw_row(&row, &date_formats()).unwrap();
        assert_eq!(event.to_key("fire_event"), "fire_event:19123456");
    }
}
