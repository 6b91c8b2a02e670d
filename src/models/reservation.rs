use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::base::FacilityId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidReservation {
    #[error("Group name must not be empty")]
    MissingGroup,
    #[error("At least one base must be selected")]
    NoFacilities,
    #[error("End time must be after start time")]
    EmptyWindow,
}

/// A reservation that has passed validation: non-empty group, at least one
/// facility and `end_time > start_time`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReservationRequest {
    pub group_name: String,
    pub facility_ids: Vec<FacilityId>,
    pub start_time: i64,
    pub end_time: i64,
}

impl ReservationRequest {
    pub fn new(
        group_name: &str,
        facility_ids: impl IntoIterator<Item = FacilityId>,
        start_time: i64,
        end_time: i64,
    ) -> Result<Self, InvalidReservation> {
        let group_name = group_name.trim();
        if group_name.is_empty() {
            return Err(InvalidReservation::MissingGroup);
        }

        let facility_ids = dedup_in_order(facility_ids);
        if facility_ids.is_empty() {
            return Err(InvalidReservation::NoFacilities);
        }

        if end_time <= start_time {
            return Err(InvalidReservation::EmptyWindow);
        }

        Ok(Self {
            group_name: group_name.to_string(),
            facility_ids,
            start_time,
            end_time,
        })
    }
}

/// Whole seconds of a unix timestamp. Browsers send `getTime() / 1000`, so a
/// fractional part is accepted and truncated.
pub fn parse_unix_seconds(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    whole.parse().ok()
}

pub fn dedup_in_order(ids: impl IntoIterator<Item = FacilityId>) -> Vec<FacilityId> {
    let mut seen = BTreeSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReservationType {
    LargeEvent,
    Scrim,
    Training,
    Pog,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Availability,
    Reservation,
}

/// Body posted to the base service for both reservations and availability checks.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BaseServiceRequest {
    pub facility_ids: Vec<FacilityId>,
    pub reservation_type: ReservationType,
    pub request_type: RequestType,
    pub group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

impl BaseServiceRequest {
    pub fn reservation(request: &ReservationRequest) -> Self {
        Self {
            facility_ids: request.facility_ids.clone(),
            reservation_type: ReservationType::Scrim,
            request_type: RequestType::Reservation,
            group_name: request.group_name.clone(),
            start_time: Some(request.start_time),
            end_time: Some(request.end_time),
        }
    }

    pub fn availability(facility_ids: &[FacilityId], start_time: i64, end_time: i64) -> Self {
        Self {
            facility_ids: facility_ids.to_vec(),
            reservation_type: ReservationType::Scrim,
            request_type: RequestType::Availability,
            group_name: String::new(),
            start_time: Some(start_time),
            end_time: Some(end_time),
        }
    }
}

/// A single reservation as reported by the base service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Reservation {
    pub facility_id: FacilityId,
    #[serde(default)]
    pub group_name: String,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_type: Option<ReservationType>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ReservationOutcome {
    #[serde(default)]
    pub succeeded_reservations: Vec<Reservation>,
    #[serde(default)]
    pub failed_reservations: Vec<Reservation>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct AvailabilityOutcome {
    #[serde(default)]
    pub possible_reservations: Vec<Reservation>,
    #[serde(default)]
    pub denied_reservations: Vec<Reservation>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct BaseServiceResponse<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Requested facilities split into those that were booked and those that were not.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ReservationResult {
    pub reserved: Vec<FacilityId>,
    pub failed: Vec<FacilityId>,
    #[serde(skip)]
    pub reservations: Vec<Reservation>,
}

impl ReservationResult {
    /// Every requested facility ends up in exactly one of the two sets. Anything the
    /// service did not confirm counts as failed, and unrequested ids are dropped.
    pub fn partition(requested: &[FacilityId], outcome: ReservationOutcome) -> Self {
        let failed_ids: BTreeSet<FacilityId> = outcome
            .failed_reservations
            .iter()
            .map(|reservation| reservation.facility_id)
            .collect();

        let mut reservations = Vec::new();
        for reservation in outcome.succeeded_reservations {
            let wanted = requested.contains(&reservation.facility_id);
            let duplicate = reservations
                .iter()
                .any(|r: &Reservation| r.facility_id == reservation.facility_id);
            if wanted && !duplicate && !failed_ids.contains(&reservation.facility_id) {
                reservations.push(reservation);
            }
        }

        let (reserved, failed): (Vec<FacilityId>, Vec<FacilityId>) = requested.iter().partition(|id| {
            reservations
                .iter()
                .any(|reservation| reservation.facility_id == **id)
        });

        Self {
            reserved,
            failed,
            reservations,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub type AvailabilityMap = BTreeMap<FacilityId, bool>;

/// Bookability of each requested facility. Denials win over possible
/// reservations and anything the service left out is not bookable.
pub fn availability_map(requested: &[FacilityId], outcome: AvailabilityOutcome) -> AvailabilityMap {
    let mut map: AvailabilityMap = requested.iter().map(|id| (*id, false)).collect();

    for reservation in outcome.possible_reservations {
        if let Some(available) = map.get_mut(&reservation.facility_id) {
            *available = true;
        }
    }
    for reservation in outcome.denied_reservations {
        if let Some(available) = map.get_mut(&reservation.facility_id) {
            *available = false;
        }
    }

    map
}
