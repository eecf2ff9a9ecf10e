// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Star-Schema Decomposition
//!
//! A pure function splitting a [`FireEvent`] into the dimension/fact tuple
//! the original service carried for downstream analytical consumers. Not
//! wired into any stage — an external collaborator per spec §9.

use chrono::{DateTime, Utc};

use fire_pipeline_domain::model::FireEvent;

#[derive(Debug, Clone, PartialEq)]
pub struct LocationDimension {
    pub id: String,
    pub address: String,
    pub city: String,
    pub zipcode: String,
    pub neighborhood_district: Option<String>,
    pub supervisor_district: Option<String>,
    pub point: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeDimension {
    pub id: String,
    pub incident_date: Option<DateTime<Utc>>,
    pub alarm_dt: Option<DateTime<Utc>>,
    pub arrival_dt: Option<DateTime<Utc>>,
    pub close_dt: Option<DateTime<Utc>>,
    pub data_as_of: Option<String>,
    pub data_loaded_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncidentDimension {
    pub incident_number: String,
    pub exposure_number: i64,
    pub call_number: String,
    pub battalion: String,
    pub station_area: String,
    pub box_number: Option<String>,
    pub first_unit_on_scene: Option<String>,
    pub primary_situation: Option<String>,
    pub mutual_aid: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorDimension {
    pub id: String,
    pub detectors_present: Option<String>,
    pub detector_type: Option<String>,
    pub detector_operation: Option<String>,
    pub detector_effectiveness: Option<String>,
    pub detector_failure_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuppressionDimension {
    pub id: String,
    pub suppression_units: i64,
    pub suppression_personnel: i64,
    pub ems_units: i64,
    pub ems_personnel: i64,
    pub other_units: i64,
    pub other_personnel: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FireSpreadDimension {
    pub id: String,
    pub fire_spread: Option<String>,
    pub no_flame_spread: Option<String>,
    pub floors_minimum_damage: Option<String>,
    pub floors_significant_damage: Option<String>,
    pub floors_heavy_damage: Option<String>,
    pub floors_extreme_damage: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FireOriginDimension {
    pub id: String,
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
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtinguishingSystemDimension {
    pub id: String,
    pub present: Option<String>,
    pub system_type: Option<String>,
    pub performance: Option<String>,
    pub failure_reason: Option<String>,
    pub sprinkler_heads_operating: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FireEventFact {
    pub id: String,
    pub location_id: String,
    pub datetime_id: String,
    pub incident_id: String,
    pub detector_id: String,
    pub suppression_id: String,
    pub fire_spread_id: String,
    pub fire_origin_id: String,
    pub extinguishing_system_id: String,
    pub fire_fatalities: i64,
    pub fire_injuries: i64,
    pub civilian_fatalities: i64,
    pub civilian_injuries: i64,
    pub estimated_property_loss: Option<String>,
    pub estimated_contents_loss: Option<String>,
    pub number_of_alarms: i64,
    pub action_taken_primary: Option<String>,
    pub action_taken_secondary: Option<String>,
    pub action_taken_other: Option<String>,
    pub detector_alerted_occupants: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StarSchemaFacts {
    pub location: LocationDimension,
    pub datetime_dim: DateTimeDimension,
    pub incident: IncidentDimension,
    pub detector: DetectorDimension,
    pub suppression: SuppressionDimension,
    pub fire_spread: FireSpreadDimension,
    pub fire_origin: FireOriginDimension,
    pub extinguishing_system: ExtinguishingSystemDimension,
    pub fact: FireEventFact,
}

/// Decompose a single [`FireEvent`] into its star-schema dimension and fact
/// rows, all keyed off the event's row `id`.
pub fn decompose(event: &FireEvent) -> StarSchemaFacts {
    let location = LocationDimension {
        id: format!("{}_location", event.id),
        address: event.address.clone(),
        city: event.city.clone(),
        zipcode: event.zipcode.clone(),
        neighborhood_district: event.neighborhood_district.clone(),
        supervisor_district: event.supervisor_district.clone(),
        point: event.point.clone(),
    };

    let datetime_dim = DateTimeDimension {
        id: format!("{}_datetime", event.id),
        incident_date: event.incident_date,
        alarm_dt: event.alarm_dt,
        arrival_dt: event.arrival_dt,
        close_dt: event.close_dt,
        data_as_of: event.data_as_of.clone(),
        data_loaded_at: event.data_loaded_at.clone(),
    };

    let incident = IncidentDimension {
        incident_number: event.incident_number.clone(),
        exposure_number: event.exposure_number,
        call_number: event.call_number.clone(),
        battalion: event.battalion.clone(),
        station_area: event.station_area.clone(),
        box_number: event.box_number.clone(),
        first_unit_on_scene: event.first_unit_on_scene.clone(),
        primary_situation: event.primary_situation.clone(),
        mutual_aid: event.mutual_aid.clone(),
    };

    let detector = DetectorDimension {
        id: format!("{}_detector", event.id),
        detectors_present: event.detectors_present.clone(),
        detector_type: event.detector_type.clone(),
        detector_operation: event.detector_operation.clone(),
        detector_effectiveness: event.detector_effectiveness.clone(),
        detector_failure_reason: event.detector_failure_reason.clone(),
    };

    let suppression = SuppressionDimension {
        id: format!("{}_suppression", event.id),
        suppression_units: event.suppression_units,
        suppression_personnel: event.suppression_personnel,
        ems_units: event.ems_units,
        ems_personnel: event.ems_personnel,
        other_units: event.other_units,
        other_personnel: event.other_personnel,
    };

    let fire_spread = FireSpreadDimension {
        id: format!("{}_fire_spread", event.id),
        fire_spread: event.fire_spread.clone(),
        no_flame_spread: event.no_flame_spread.clone(),
        floors_minimum_damage: event.floors_minimum_damage.clone(),
        floors_significant_damage: event.floors_significant_damage.clone(),
        floors_heavy_damage: event.floors_heavy_damage.clone(),
        floors_extreme_damage: event.floors_extreme_damage.clone(),
    };

    let fire_origin = FireOriginDimension {
        id: format!("{}_fire_origin", event.id),
        area_of_fire_origin: event.area_of_fire_origin.clone(),
        ignition_cause: event.ignition_cause.clone(),
        ignition_factor_primary: event.ignition_factor_primary.clone(),
        ignition_factor_secondary: event.ignition_factor_secondary.clone(),
        heat_source: event.heat_source.clone(),
        item_first_ignited: event.item_first_ignited.clone(),
        human_factors_associated_with_ignition: event.human_factors_associated_with_ignition.clone(),
        structure_type: event.structure_type.clone(),
        structure_status: event.structure_status.clone(),
        floor_of_fire_origin: event.floor_of_fire_origin.clone(),
    };

    let extinguishing_system = ExtinguishingSystemDimension {
        id: format!("{}_extinguishing_system", event.id),
        present: event.extinguishing_system_present.clone(),
        system_type: event.extinguishing_system_type.clone(),
        performance: event.extinguishing_system_performance.clone(),
        failure_reason: event.extinguishing_system_failure_reason.clone(),
        sprinkler_heads_operating: event.sprinkler_heads_operating.clone(),
    };

    let fact = FireEventFact {
        id: event.id.clone(),
        location_id: location.id.clone(),
        datetime_id: datetime_dim.id.clone(),
        incident_id: incident.incident_number.clone(),
        detector_id: detector.id.clone(),
        suppression_id: suppression.id.clone(),
        fire_spread_id: fire_spread.id.clone(),
        fire_origin_id: fire_origin.id.clone(),
        extinguishing_system_id: extinguishing_system.id.clone(),
        fire_fatalities: event.fire_fatalities,
        fire_injuries: event.fire_injuries,
        civilian_fatalities: event.civilian_fatalities,
        civilian_injuries: event.civilian_injuries,
        estimated_property_loss: event.estimated_property_loss.clone(),
        estimated_contents_loss: event.estimated_contents_loss.clone(),
        number_of_alarms: event.number_of_alarms,
        action_taken_primary: event.action_taken_primary.clone(),
        action_taken_secondary: event.action_taken_secondary.clone(),
        action_taken_other: event.action_taken_other.clone(),
        detector_alerted_occupants: event.detector_alerted_occupants.clone(),
    };

    StarSchemaFacts { location, datetime_dim, incident, detector, suppression, fire_spread, fire_origin, extinguishing_system, fact }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_pipeline_domain::model::RawRow;
    use indexmap::IndexMap;

    fn sample_event() -> FireEvent {
        let mut fields = IndexMap::new();
        for (k, v) in [
            ("Incident Number", "19123456"),
            ("Exposure Number", "0"),
            ("ID", "191234560"),
            ("Call Number", "192221234"),
            ("Address", "100 Market St"),
            ("City", "San Francisco"),
            ("zipcode", "94105"),
            ("Battalion", "B01"),
            ("Station Area", "01"),
        ] {
            fields.insert(k.to_string(), v.to_string());
        }
        FireEvent::from_raw_row(&RawRow::new(fields), &["%Y/%m/%d".to_string()]).unwrap()
    }

    #[test]
    fn dimension_ids_are_keyed_off_row_id() {
        let event = sample_event();
        let facts = decompose(&event);
        assert_eq!(facts.location.id, "191234560_location");
        assert_eq!(facts.fact.id, "191234560");
        assert_eq!(facts.fact.location_id, facts.location.id);
        assert_eq!(facts.fact.incident_id, event.incident_number);
    }
}
