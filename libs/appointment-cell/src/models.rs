// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::fmt;

use doctor_cell::models::{MatchType, TimeSlot};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub doctor_id: Option<String>,
    pub doctor_name: Option<String>,
    pub specialty: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub match_type: Option<MatchType>,
    /// Family member the appointment is booked for, when not the account holder.
    pub for_user_id: Option<String>,
    pub for_user_name: Option<String>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub reminder_set: bool,
    #[serde(default)]
    pub calendar_synced: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub feedback: Option<AppointmentFeedback>,
}

impl Appointment {
    /// Placeholder record created before any doctor or slot has been resolved.
    pub fn placeholder(id: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            id: id.into(),
            doctor_id: None,
            doctor_name: None,
            specialty: None,
            date: None,
            time: None,
            match_type: Some(match_type),
            for_user_id: None,
            for_user_name: None,
            status: AppointmentStatus::Matching,
            reminder_set: false,
            calendar_synced: false,
            created_at: None,
            updated_at: None,
            cancel_reason: None,
            feedback: None,
        }
    }

    /// The booked slot, once both date and time are known.
    pub fn slot(&self) -> Option<TimeSlot> {
        match (self.date, self.time) {
            (Some(date), Some(time)) => Some(TimeSlot::new(date, time, true)),
            _ => None,
        }
    }

    /// Merge every `Some` field of the patch over this record.
    pub fn apply(&mut self, patch: AppointmentPatch) {
        let AppointmentPatch {
            doctor_id,
            doctor_name,
            specialty,
            date,
            time,
            status,
            reminder_set,
            calendar_synced,
            cancel_reason,
            feedback,
        } = patch;

        if let Some(v) = doctor_id {
            self.doctor_id = Some(v);
        }
        if let Some(v) = doctor_name {
            self.doctor_name = Some(v);
        }
        if let Some(v) = specialty {
            self.specialty = Some(v);
        }
        if let Some(v) = date {
            self.date = Some(v);
        }
        if let Some(v) = time {
            self.time = Some(v);
        }
        if let Some(v) = status {
            self.status = v;
        }
        if let Some(v) = reminder_set {
            self.reminder_set = v;
        }
        if let Some(v) = calendar_synced {
            self.calendar_synced = v;
        }
        if let Some(v) = cancel_reason {
            self.cancel_reason = Some(v);
        }
        if let Some(v) = feedback {
            self.feedback = Some(v);
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Matching,
    AwaitConfirm,
    Confirmed,
    Completed,
    CancelledPatient,
    CancelledDoctor,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Matching => write!(f, "matching"),
            AppointmentStatus::AwaitConfirm => write!(f, "await_confirm"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::CancelledPatient => write!(f, "cancelled_patient"),
            AppointmentStatus::CancelledDoctor => write!(f, "cancelled_doctor"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentFeedback {
    pub rating: u8,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppointmentPatch {
    pub doctor_id: Option<String>,
    pub doctor_name: Option<String>,
    pub specialty: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub status: Option<AppointmentStatus>,
    pub reminder_set: Option<bool>,
    pub calendar_synced: Option<bool>,
    pub cancel_reason: Option<String>,
    pub feedback: Option<AppointmentFeedback>,
}

impl AppointmentPatch {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

// ==============================================================================
// SLOT SUGGESTION MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionReason {
    SameTime,
    SimilarTime,
    Soonest,
    SameWeekday,
}

impl SuggestionReason {
    pub fn label(&self) -> &'static str {
        match self {
            SuggestionReason::SameTime => "Same time",
            SuggestionReason::SimilarTime => "Similar time",
            SuggestionReason::Soonest => "Soonest available",
            SuggestionReason::SameWeekday => "Same weekday",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestedSlot {
    #[serde(flatten)]
    pub slot: TimeSlot,
    pub reason: SuggestionReason,
    pub label: String,
}

impl SuggestedSlot {
    pub fn new(slot: TimeSlot, reason: SuggestionReason) -> Self {
        let label = format!(
            "{}: {} at {}",
            reason.label(),
            slot.date.format("%a %d %b"),
            slot.time.format("%H:%M")
        );
        Self { slot, reason, label }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found: {0}")]
    NotFound(String),

    #[error("Appointment id already in use: {0}")]
    DuplicateId(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
}

impl From<AppointmentError> for shared_models::AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound(_) => shared_models::AppError::NotFound(err.to_string()),
            AppointmentError::DuplicateId(_) => shared_models::AppError::Conflict(err.to_string()),
            AppointmentError::InvalidStatusTransition { .. } => {
                shared_models::AppError::ValidationError(err.to_string())
            }
        }
    }
}
