use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use appointment_cell::models::{AppointmentPatch, AppointmentStatus};
use doctor_cell::models::{MatchRequest, MatchResult, MatchedAppointment, MatchingError};
use doctor_cell::services::MatchingService;

/// Shared flag the caller flips to make a running match task drop its result.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Handle to one in-flight match.
///
/// Dropping it does not stop the task. Cancelling only suppresses the
/// callbacks; the external call still runs to completion.
#[derive(Debug)]
pub struct MatchHandle {
    appointment_id: String,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl MatchHandle {
    pub fn appointment_id(&self) -> &str {
        &self.appointment_id
    }

    pub fn cancel(&self) {
        debug!("Cancelling match for appointment {}", self.appointment_id);
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the task has settled and any callback has run.
    pub async fn finished(self) {
        if let Err(e) = self.task.await {
            error!("Match task for appointment {} ended abnormally: {}", self.appointment_id, e);
        }
    }
}

/// Runs matches in the background and reports the outcome through callbacks.
pub struct BackgroundMatchingCoordinator {
    matching: Arc<dyn MatchingService>,
}

#[derive(Debug)]
enum Outcome {
    Matched(MatchedAppointment),
    NoMatch,
    Failed(String),
}

impl BackgroundMatchingCoordinator {
    pub fn new(matching: Arc<dyn MatchingService>) -> Self {
        Self { matching }
    }

    /// Spawn the match and return immediately.
    ///
    /// `on_success` gets the patch resolving the placeholder, `on_failure` gets
    /// the appointment id. At most one of them runs, and neither does once the
    /// handle is cancelled.
    pub fn launch<S, F>(&self, appointment_id: impl Into<String>, request: MatchRequest, on_success: S, on_failure: F) -> MatchHandle
    where
        S: FnOnce(AppointmentPatch) + Send + 'static,
        F: FnOnce(String) + Send + 'static,
    {
        let appointment_id = appointment_id.into();
        let token = CancellationToken::new();

        let task = tokio::spawn(run_match(
            self.matching.clone(),
            appointment_id.clone(),
            request,
            token.clone(),
            on_success,
            on_failure,
        ));

        MatchHandle {
            appointment_id,
            token,
            task,
        }
    }
}

#[instrument(skip(matching, request, token, on_success, on_failure), fields(match_type = %request.match_type()))]
async fn run_match<S, F>(
    matching: Arc<dyn MatchingService>,
    appointment_id: String,
    request: MatchRequest,
    token: CancellationToken,
    on_success: S,
    on_failure: F,
) where
    S: FnOnce(AppointmentPatch) + Send + 'static,
    F: FnOnce(String) + Send + 'static,
{
    let call = async {
        match &request {
            MatchRequest::FastLane(r) => matching.fast_lane_match(r).await,
            MatchRequest::Specialty(r) => matching.specialty_match(r).await,
        }
    };
    let result = AssertUnwindSafe(call).catch_unwind().await;

    if token.is_cancelled() {
        debug!("Match for appointment {} settled after cancellation, dropping result", appointment_id);
        return;
    }

    match classify(result) {
        Outcome::Matched(matched) => {
            info!(
                "Appointment {} matched with {} on {} at {}",
                appointment_id, matched.doctor_id, matched.date, matched.time
            );
            on_success(resolution_patch(matched));
        }
        Outcome::NoMatch => {
            info!("No match found for appointment {}", appointment_id);
            on_failure(appointment_id);
        }
        Outcome::Failed(reason) => {
            error!("Matching failed for appointment {}: {}", appointment_id, reason);
            on_failure(appointment_id);
        }
    }
}

fn classify(result: std::thread::Result<Result<MatchResult, MatchingError>>) -> Outcome {
    match result {
        Ok(Ok(result)) => match result.into_matched() {
            Some(matched) if !matched.doctor_id.trim().is_empty() => Outcome::Matched(matched),
            _ => Outcome::NoMatch,
        },
        Ok(Err(e)) => Outcome::Failed(e.to_string()),
        Err(_) => Outcome::Failed("matching service panicked".to_string()),
    }
}

fn resolution_patch(matched: MatchedAppointment) -> AppointmentPatch {
    let status = if matched.requires_confirmation {
        AppointmentStatus::AwaitConfirm
    } else {
        AppointmentStatus::Confirmed
    };

    AppointmentPatch {
        doctor_id: Some(matched.doctor_id),
        doctor_name: Some(matched.doctor_name),
        specialty: Some(matched.specialty),
        date: Some(matched.date),
        time: Some(matched.time),
        status: Some(status),
        ..AppointmentPatch::default()
    }
}
