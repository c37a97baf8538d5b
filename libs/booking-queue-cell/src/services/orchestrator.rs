use std::sync::Arc;

use chrono::Utc;
use tokio::runtime::Handle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentPatch};
use appointment_cell::services::AppointmentStore;
use shared_config::AppConfig;
use shared_database::{get_json, set_json, KeyValueStore};

use crate::error::BookingQueueError;
use crate::models::{BookingRequest, RequestSummary, Route};
use crate::services::coordinator::{BackgroundMatchingCoordinator, MatchHandle};
use crate::services::navigation::Navigator;

/// What `submit` hands back: the placeholder's id and the running match.
#[derive(Debug)]
pub struct SubmissionReceipt {
    pub appointment_id: String,
    pub handle: MatchHandle,
}

/// Entry point of the booking flow.
///
/// Submitting writes the request summary, stores a `matching` placeholder,
/// starts the background match and moves the user to the "request sent"
/// screen, in that order. The caller never waits for the match.
pub struct BookingSubmissionOrchestrator {
    store: Arc<AppointmentStore>,
    coordinator: BackgroundMatchingCoordinator,
    navigator: Arc<dyn Navigator>,
    summaries: Arc<dyn KeyValueStore>,
    summary_key: String,
}

impl BookingSubmissionOrchestrator {
    pub fn new(
        store: Arc<AppointmentStore>,
        coordinator: BackgroundMatchingCoordinator,
        navigator: Arc<dyn Navigator>,
        summaries: Arc<dyn KeyValueStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            store,
            coordinator,
            navigator,
            summaries,
            summary_key: config.request_summary_key.clone(),
        }
    }

    pub fn store(&self) -> &Arc<AppointmentStore> {
        &self.store
    }

    #[instrument(skip(self, request), fields(match_type = %request.match_request.match_type()))]
    pub fn submit(&self, request: BookingRequest) -> Result<SubmissionReceipt, BookingQueueError> {
        validate_request(&request)?;

        // The match task needs a runtime; check before anything is written
        if let Err(e) = Handle::try_current() {
            warn!("Booking submitted outside an async runtime: {}", e);
            return Err(BookingQueueError::RuntimeUnavailable(e.to_string()));
        }

        let summary = RequestSummary::from_request(&request);
        if let Err(e) = set_json(self.summaries.as_ref(), &self.summary_key, &summary) {
            warn!("Could not persist booking request summary: {}", e);
        }

        let appointment_id = generate_appointment_id();
        let mut placeholder = Appointment::placeholder(&appointment_id, request.match_request.match_type());
        placeholder.specialty = request.match_request.specialty().map(str::to_string);
        placeholder.for_user_id = request.for_user_id.clone();
        placeholder.for_user_name = request.for_user_name.clone();

        self.store.add(placeholder)?;
        info!("Booking request {} submitted, matching in background", appointment_id);

        let on_success = {
            let store = self.store.clone();
            let id = appointment_id.clone();
            move |patch: AppointmentPatch| match store.update(&id, patch) {
                Ok(Some(updated)) => debug!("Appointment {} resolved as {}", id, updated.status),
                Ok(None) => warn!("Matched appointment {} is no longer in the store", id),
                Err(e) => error!("Could not apply match to appointment {}: {}", id, e),
            }
        };
        let on_failure = {
            let store = self.store.clone();
            move |id: String| match store.cancel(&id) {
                Ok(_) => debug!("Appointment {} cancelled after failed match", id),
                Err(e) => error!("Could not cancel unmatched appointment {}: {}", id, e),
            }
        };

        let handle = self
            .coordinator
            .launch(appointment_id.clone(), request.match_request, on_success, on_failure);

        self.navigator.navigate(Route::RequestSent {
            appointment_id: appointment_id.clone(),
        });

        Ok(SubmissionReceipt { appointment_id, handle })
    }

    /// The summary of the latest submission, if one was persisted and still parses.
    pub fn last_request_summary(&self) -> Option<RequestSummary> {
        match get_json(self.summaries.as_ref(), &self.summary_key) {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Could not read booking request summary: {}", e);
                None
            }
        }
    }
}

fn validate_request(request: &BookingRequest) -> Result<(), BookingQueueError> {
    let patient = request.match_request.patient();
    if patient.patient_id.trim().is_empty() {
        return Err(BookingQueueError::ValidationError("patient id is required".to_string()));
    }
    if request.for_user_id.is_some() != request.for_user_name.is_some() {
        return Err(BookingQueueError::ValidationError(
            "family member bookings need both id and name".to_string(),
        ));
    }
    Ok(())
}

/// `apt-<unix millis>-<8 hex chars>`.
pub fn generate_appointment_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("apt-{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}
