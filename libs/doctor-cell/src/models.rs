use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use thiserror::Error;
use std::fmt;

// ==============================================================================
// DOCTOR ROSTER
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
    pub city: String,
    pub accepted_insurance: Vec<InsuranceType>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("Dr. {} {}", self.first_name, self.last_name)
    }

    pub fn accepts(&self, insurance: &InsuranceType) -> bool {
        self.accepted_insurance.contains(insurance)
    }

    pub fn practices(&self, specialty: &str) -> bool {
        self.specialty.eq_ignore_ascii_case(specialty.trim())
    }

    pub fn is_in_city(&self, city: &str) -> bool {
        self.city.eq_ignore_ascii_case(city.trim())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceType {
    Public,
    Private,
    SelfPay,
}

// ==============================================================================
// TIME SLOTS
// ==============================================================================

/// One bookable slot in a doctor's calendar. Identity is the (date, time) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub available: bool,
}

impl TimeSlot {
    pub fn new(date: NaiveDate, time: NaiveTime, available: bool) -> Self {
        Self { date, time, available }
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn key(&self) -> (NaiveDate, NaiveTime) {
        (self.date, self.time)
    }
}

/// Fixed daily bands of the generated calendar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DayBand {
    Morning,
    Afternoon,
}

impl DayBand {
    pub const ALL: [DayBand; 2] = [DayBand::Morning, DayBand::Afternoon];

    /// Hour the band's first slot starts at.
    pub fn start_hour(&self) -> u32 {
        match self {
            DayBand::Morning => 9,
            DayBand::Afternoon => 14,
        }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        use chrono::Timelike;

        match self {
            DayBand::Morning => time.hour() < 12,
            DayBand::Afternoon => time.hour() >= 12,
        }
    }
}

impl fmt::Display for DayBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayBand::Morning => write!(f, "morning"),
            DayBand::Afternoon => write!(f, "afternoon"),
        }
    }
}

// ==============================================================================
// MATCHING REQUESTS AND RESULTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    FastLane,
    Specialty,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::FastLane => write!(f, "fast_lane"),
            MatchType::Specialty => write!(f, "specialty"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientIdentity {
    pub patient_id: String,
    pub name: String,
}

/// Optional availability preferences attached to a specialty request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityConstraints {
    #[serde(default)]
    pub preferred_weekdays: Vec<Weekday>,
    pub preferred_band: Option<DayBand>,
    pub earliest_date: Option<NaiveDate>,
}

impl AvailabilityConstraints {
    pub fn allows(&self, slot: &TimeSlot) -> bool {
        use chrono::Datelike;

        if !self.preferred_weekdays.is_empty() && !self.preferred_weekdays.contains(&slot.date.weekday()) {
            return false;
        }
        if let Some(band) = self.preferred_band {
            if !band.contains(slot.time) {
                return false;
            }
        }
        if let Some(earliest) = self.earliest_date {
            if slot.date < earliest {
                return false;
            }
        }
        true
    }
}

/// "Any doctor, soonest" request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FastLaneMatchRequest {
    pub patient: PatientIdentity,
    pub city: String,
    pub insurance: InsuranceType,
}

/// "This specialty (or doctor), with my availability" request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecialtyMatchRequest {
    pub patient: PatientIdentity,
    pub specialty: String,
    pub preferred_doctor_id: Option<String>,
    pub city: String,
    pub insurance: InsuranceType,
    pub availability: Option<AvailabilityConstraints>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "match_type", rename_all = "snake_case")]
pub enum MatchRequest {
    FastLane(FastLaneMatchRequest),
    Specialty(SpecialtyMatchRequest),
}

impl MatchRequest {
    pub fn match_type(&self) -> MatchType {
        match self {
            MatchRequest::FastLane(_) => MatchType::FastLane,
            MatchRequest::Specialty(_) => MatchType::Specialty,
        }
    }

    pub fn patient(&self) -> &PatientIdentity {
        match self {
            MatchRequest::FastLane(r) => &r.patient,
            MatchRequest::Specialty(r) => &r.patient,
        }
    }

    pub fn city(&self) -> &str {
        match self {
            MatchRequest::FastLane(r) => &r.city,
            MatchRequest::Specialty(r) => &r.city,
        }
    }

    pub fn insurance(&self) -> InsuranceType {
        match self {
            MatchRequest::FastLane(r) => r.insurance,
            MatchRequest::Specialty(r) => r.insurance,
        }
    }

    pub fn specialty(&self) -> Option<&str> {
        match self {
            MatchRequest::FastLane(_) => None,
            MatchRequest::Specialty(r) => Some(&r.specialty),
        }
    }
}

/// Doctor and slot resolved by the matching service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchedAppointment {
    pub doctor_id: String,
    pub doctor_name: String,
    pub specialty: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// The patient has to accept this match before it counts as confirmed.
    #[serde(default)]
    pub requires_confirmation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    pub success: bool,
    pub appointment: Option<MatchedAppointment>,
}

impl MatchResult {
    pub fn matched(appointment: MatchedAppointment) -> Self {
        Self {
            success: true,
            appointment: Some(appointment),
        }
    }

    pub fn no_match() -> Self {
        Self {
            success: false,
            appointment: None,
        }
    }

    /// The resolved appointment, if the result is a well-formed success.
    pub fn into_matched(self) -> Option<MatchedAppointment> {
        if self.success {
            self.appointment
        } else {
            None
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchingError {
    #[error("Matching service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid match request: {0}")]
    InvalidRequest(String),

    #[error("Matching timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}
