#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tokio::sync::Notify;

use appointment_cell::models::AppointmentPatch;
use booking_queue_cell::{Navigator, Route};
use doctor_cell::models::{
    FastLaneMatchRequest, InsuranceType, MatchRequest, MatchResult, MatchedAppointment, MatchingError,
    PatientIdentity, SpecialtyMatchRequest,
};
use doctor_cell::services::MatchingService;

pub fn patient() -> PatientIdentity {
    PatientIdentity {
        patient_id: "patient-1".to_string(),
        name: "Maria Silva".to_string(),
    }
}

pub fn fast_lane_request() -> MatchRequest {
    MatchRequest::FastLane(FastLaneMatchRequest {
        patient: patient(),
        city: "Lisbon".to_string(),
        insurance: InsuranceType::Public,
    })
}

pub fn specialty_request(specialty: &str, preferred_doctor_id: Option<&str>) -> MatchRequest {
    MatchRequest::Specialty(SpecialtyMatchRequest {
        patient: patient(),
        specialty: specialty.to_string(),
        preferred_doctor_id: preferred_doctor_id.map(str::to_string),
        city: "Lisbon".to_string(),
        insurance: InsuranceType::Private,
        availability: None,
    })
}

pub fn matched_appointment(requires_confirmation: bool) -> MatchedAppointment {
    MatchedAppointment {
        doctor_id: "doc-gp-01".to_string(),
        doctor_name: "Dr. Ana Ribeiro".to_string(),
        specialty: "general_practice".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
        time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        requires_confirmation,
    }
}

/// Matcher that holds every call until the test opens the gate.
pub struct GatedMatcher {
    gate: Notify,
    result: Result<MatchResult, MatchingError>,
}

impl GatedMatcher {
    pub fn new(result: Result<MatchResult, MatchingError>) -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            result,
        })
    }

    pub fn open(&self) {
        self.gate.notify_one();
    }

    async fn respond(&self) -> Result<MatchResult, MatchingError> {
        self.gate.notified().await;
        self.result.clone()
    }
}

#[async_trait]
impl MatchingService for GatedMatcher {
    async fn fast_lane_match(&self, _request: &FastLaneMatchRequest) -> Result<MatchResult, MatchingError> {
        self.respond().await
    }

    async fn specialty_match(&self, _request: &SpecialtyMatchRequest) -> Result<MatchResult, MatchingError> {
        self.respond().await
    }
}

/// Records which callback fired and with what.
#[derive(Default, Clone)]
pub struct CallbackLog {
    pub successes: Arc<Mutex<Vec<AppointmentPatch>>>,
    pub failures: Arc<Mutex<Vec<String>>>,
}

impl CallbackLog {
    pub fn on_success(&self) -> impl FnOnce(AppointmentPatch) + Send + 'static {
        let successes = self.successes.clone();
        move |patch| successes.lock().unwrap().push(patch)
    }

    pub fn on_failure(&self) -> impl FnOnce(String) + Send + 'static {
        let failures = self.failures.clone();
        move |id| failures.lock().unwrap().push(id)
    }

    pub fn successes(&self) -> Vec<AppointmentPatch> {
        self.successes.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().unwrap().clone()
    }
}

/// Navigator that keeps every route it was sent to.
#[derive(Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}
