// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

pub struct AppointmentLifecycleService;

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed.
    ///
    /// Re-asserting the current status is not a transition and always passes.
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        if current_status == new_status {
            return Ok(());
        }

        if !self.get_valid_transitions(current_status).contains(new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: *current_status,
                to: *new_status,
            });
        }

        debug!("Status transition validated: {} -> {}", current_status, new_status);
        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Matching => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::AwaitConfirm,
                AppointmentStatus::CancelledPatient,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::CancelledPatient,
                AppointmentStatus::CancelledDoctor,
            ],
            // Terminal as far as this engine is concerned
            AppointmentStatus::AwaitConfirm => vec![],
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::CancelledPatient => vec![],
            AppointmentStatus::CancelledDoctor => vec![],
        }
    }

    pub fn is_terminal(&self, status: &AppointmentStatus) -> bool {
        self.get_valid_transitions(status).is_empty()
    }

    pub fn is_cancelled(&self, status: &AppointmentStatus) -> bool {
        matches!(status, AppointmentStatus::CancelledPatient | AppointmentStatus::CancelledDoctor)
    }
}
