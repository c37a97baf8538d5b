use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use doctor_cell::models::{InsuranceType, MatchRequest, MatchType};

/// A patient's booking intent as captured by the booking form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRequest {
    pub match_request: MatchRequest,
    /// Set when booking on behalf of a family member.
    pub for_user_id: Option<String>,
    pub for_user_name: Option<String>,
}

impl BookingRequest {
    pub fn new(match_request: MatchRequest) -> Self {
        Self {
            match_request,
            for_user_id: None,
            for_user_name: None,
        }
    }

    pub fn for_family_member(mut self, user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        self.for_user_id = Some(user_id.into());
        self.for_user_name = Some(user_name.into());
        self
    }
}

/// What the "request sent" screen shows while matching runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestSummary {
    pub patient_name: String,
    pub for_user_name: Option<String>,
    pub match_type: MatchType,
    pub specialty: Option<String>,
    pub city: String,
    pub insurance: InsuranceType,
    pub submitted_at: DateTime<Utc>,
}

impl RequestSummary {
    pub fn from_request(request: &BookingRequest) -> Self {
        let match_request = &request.match_request;
        Self {
            patient_name: match_request.patient().name.clone(),
            for_user_name: request.for_user_name.clone(),
            match_type: match_request.match_type(),
            specialty: match_request.specialty().map(str::to_string),
            city: match_request.city().to_string(),
            insurance: match_request.insurance(),
            submitted_at: Utc::now(),
        }
    }
}

/// Screens the booking flow can send the user to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    RequestSent { appointment_id: String },
    AppointmentDetail { appointment_id: String },
}
