// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Data-Quality Rule Engine
//!
//! Forks the validator stage's stream into validated/rejected lanes. A
//! [`FireEvent`] with zero issues is "validated"; one with any issue is
//! "rejected" with the issue map attached, matching the upstream analysis
//! pass this is grounded on.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::model::FireEvent;

/// The result of running the quality rules over one event: empty means the
/// event passed every rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityReport {
    pub issues: IndexMap<String, String>,
}

impl QualityReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Every `Option<String>`/`String` field considered by the blanket
/// missing-value rule, paired with its current value. Count fields
/// (`i64`, coerced from empty-or-non-numeric to `0` at parse time) and
/// already-parsed timestamp fields are intentionally excluded: a `0` count
/// or a successfully parsed date can never look "missing" here.
fn string_fields(event: &FireEvent) -> Vec<(&'static str, Option<&str>)> {
    vec![
        ("incident_number", Some(event.incident_number.as_str())),
        ("id", Some(event.id.as_str())),
        ("call_number", Some(event.call_number.as_str())),
        ("address", Some(event.address.as_str())),
        ("city", Some(event.city.as_str())),
        ("zipcode", Some(event.zipcode.as_str())),
        ("battalion", Some(event.battalion.as_str())),
        ("station_area", Some(event.station_area.as_str())),
        ("box_number", event.box_number.as_deref()),
        ("neighborhood_district", event.neighborhood_district.as_deref()),
        ("supervisor_district", event.supervisor_district.as_deref()),
        ("point", event.point.as_deref()),
        ("first_unit_on_scene", event.first_unit_on_scene.as_deref()),
        ("estimated_property_loss", event.estimated_property_loss.as_deref()),
        ("estimated_contents_loss", event.estimated_contents_loss.as_deref()),
        ("primary_situation", event.primary_situation.as_deref()),
        ("mutual_aid", event.mutual_aid.as_deref()),
        ("action_taken_primary", event.action_taken_primary.as_deref()),
        ("action_taken_secondary", event.action_taken_secondary.as_deref()),
        ("action_taken_other", event.action_taken_other.as_deref()),
        ("detector_alerted_occupants", event.detector_alerted_occupants.as_deref()),
        ("property_use", event.property_use.as_deref()),
        ("area_of_fire_origin", event.area_of_fire_origin.as_deref()),
        ("ignition_cause", event.ignition_cause.as_deref()),
        ("ignition_factor_primary", event.ignition_factor_primary.as_deref()),
        ("ignition_factor_secondary", event.ignition_factor_secondary.as_deref()),
        ("heat_source", event.heat_source.as_deref()),
        ("item_first_ignited", event.item_first_ignited.as_deref()),
        (
            "human_factors_associated_with_ignition",
            event.human_factors_associated_with_ignition.as_deref(),
        ),
        ("structure_type", event.structure_type.as_deref()),
        ("structure_status", event.structure_status.as_deref()),
        ("floor_of_fire_origin", event.floor_of_fire_origin.as_deref()),
        ("fire_spread", event.fire_spread.as_deref()),
        ("no_flame_spread", event.no_flame_spread.as_deref()),
        ("floors_minimum_damage", event.floors_minimum_damage.as_deref()),
        ("floors_significant_damage", event.floors_significant_damage.as_deref()),
        ("floors_heavy_damage", event.floors_heavy_damage.as_deref()),
        ("floors_extreme_damage", event.floors_extreme_damage.as_deref()),
        ("detectors_present", event.detectors_present.as_deref()),
        ("detector_type", event.detector_type.as_deref()),
        ("detector_operation", event.detector_operation.as_deref()),
        ("detector_effectiveness", event.detector_effectiveness.as_deref()),
        ("detector_failure_reason", event.detector_failure_reason.as_deref()),
        ("extinguishing_system_present", event.extinguishing_system_present.as_deref()),
        ("extinguishing_system_type", event.extinguishing_system_type.as_deref()),
        ("extinguishing_system_performance", event.extinguishing_system_performance.as_deref()),
        ("extinguishing_system_failure_reason", event.extinguishing_system_failure_reason.as_deref()),
        ("sprinkler_heads_operating", event.sprinkler_heads_operating.as_deref()),
        ("data_as_of", event.data_as_of.as_deref()),
        ("data_loaded_at", event.data_loaded_at.as_deref()),
    ]
}

/// Run every data-quality rule over `event`.
///
/// `additional_allowed_empty_fields` exempts named fields from the blanket
/// missing-value rule (the `ADITIONAL_ALLOWED_EMPTY_FIELDS` config knob,
/// whose spelling mirrors the upstream environment variable it configures).
pub fn analyze(event: &FireEvent, additional_allowed_empty_fields: &HashSet<String>) -> QualityReport {
    let mut issues = IndexMap::new();

    for (field, value) in string_fields(event) {
        let is_missing = value.map(str::is_empty).unwrap_or(true);
        if is_missing && !additional_allowed_empty_fields.contains(field) {
            issues.insert(field.to_string(), "Missing value".to_string());
        }
    }

    if event.incident_date.is_none() {
        issues.insert("incident_date".to_string(), "Missing Incident Date".to_string());
    }

    if event.supervisor_district.is_none() {
        issues.insert("supervisor_district".to_string(), "Missing District".to_string());
    }

    if event.battalion.is_empty() {
        issues.insert("battalion".to_string(), "Missing Battalion".to_string());
    }

    QualityReport { issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawRow;
    use indexmap::IndexMap as Map;

    fn complete_row() -> RawRow {
        let mut fields = Map::new();
        for (key, value) in [
            ("Incident Number", "19123456"),
            ("Exposure Number", "0"),
            ("ID", "191234560"),
            ("Call Number", "192221234"),
            ("Address", "100 Market St"),
            ("Incident Date", "2019/05/01"),
            ("Alarm DtTm", "2019/05/01 10:15:00"),
            ("Arrival DtTm", "2019/05/01 10:20:00"),
            ("Close DtTm", "2019/05/01 11:00:00"),
            ("City", "San Francisco"),
            ("zipcode", "94105"),
            ("Battalion", "B01"),
            ("Station Area", "01"),
            ("Box", "1234"),
            ("Suppression Units", "3"),
            ("Suppression Personnel", "12"),
            ("EMS Units", "1"),
            ("EMS Personnel", "2"),
            ("Other Units", "0"),
            ("Other Personnel", "0"),
            ("First Unit On Scene", "E01"),
            ("Fire Fatalities", "0"),
            ("Fire Injuries", "0"),
            ("Civilian Fatalities", "0"),
            ("Civilian Injuries", "0"),
            ("Number of Alarms", "1"),
            ("Supervisor District", "6"),
            ("neighborhood_district", "Financial District"),
            ("point", "(37.79, -122.39)"),
            ("Estimated Property Loss", "1000"),
            ("Estimated Contents Loss", "500"),
            ("Primary Situation", "111"),
            ("Mutual Aid", "N"),
            ("Action Taken Primary", "11"),
            ("Action Taken Secondary", ""),
            ("Action Taken Other", ""),
            ("Detector Alerted Occupants", "1"),
            ("Property Use", "419"),
            ("Area of Fire Origin", "21"),
            ("Ignition Cause", "1"),
            ("Ignition Factor Primary", "48"),
            ("Ignition Factor Secondary", "48"),
            ("Heat Source", "12"),
            ("Item First Ignited", "12"),
            ("Human Factors Associated with Ignition", "0"),
            ("Structure Type", "1"),
            ("Structure Status", "1"),
            ("Floor of Fire Origin", "1"),
            ("Fire Spread", "1"),
            ("No Flame Spread", "1"),
            ("Number of floors with minimum damage", "0"),
            ("Number of floors with significant damage", "0"),
            ("Number of floors with heavy damage", "0"),
            ("Number of floors with extreme damage", "0"),
            ("Detectors Present", "N"),
            ("Detector Type", ""),
            ("Detector Operation", ""),
            ("Detector Effectiveness", ""),
            ("Detector Failure Reason", ""),
            ("Automatic Extinguishing System Present", "N"),
            ("Automatic Extinguishing Sytem Type", ""),
            ("Automatic Extinguishing Sytem Perfomance", ""),
            ("Automatic Extinguishing Sytem Failure Reason", ""),
            ("Number of Sprinkler Heads Operating", "0"),
            ("data_as_of", "2026-01-01"),
            ("data_loaded_at", "2026-01-01T00:00:00"),
        ] {
            fields.insert(key.to_string(), value.to_string());
        }
        RawRow::new(fields)
    }

    fn date_formats() -> Vec<String> {
        vec!["%Y/%m/%d %H:%M:%S".to_string(), "%Y/%m/%d".to_string()]
    }

    #[test]
    fn test_complete_event_has_allowed_empty_fields_exempted() {
        let row = complete_row();
        let event = FireEvent::from_raw_row(&row, &date_formats()).unwrap();
        let allowed: HashSet<String> = [
            "action_taken_secondary",
            "action_taken_other",
            "detector_type",
            "detector_operation",
            "detector_effectiveness",
            "detector_failure_reason",
            "extinguishing_system_type",
            "extinguishing_system_performance",
            "extinguishing_system_failure_reason",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let report = analyze(&event, &allowed);
        assert!(report.is_valid(), "unexpected issues: {:?}", report.issues);
    }

    #[test]
    fn test_missing_incident_date_flagged_even_without_exemption() {
        let mut fields = complete_row().fields().clone();
        fields.insert("Incident Date".to_string(), "".to_string());
        let row = RawRow::new(fields);
        let event = FireEvent::from_raw_row(&row, &date_formats()).unwrap();

        let report = analyze(&event, &HashSet::new());
        assert!(report.issues.contains_key("incident_date"));
    }

    #[test]
    fn test_missing_battalion_flagged() {
        let mut fields = complete_row().fields().clone();
        fields.insert("Battalion".to_string(), "".to_string());
        let row = RawRow::new(fields);
        let event = FireEvent::from_raw_row(&row, &date_formats());
        // Battalion is a required parse column; an empty value still parses
        // (the CSV reader yields "" for an empty field), so this exercises
        // the quality rule, not the parser.
        if let Ok(event) = event {
            let report = analyze(&event, &HashSet::new());
            assert!(report.issues.contains_key("battalion"));
        }
    }
}
