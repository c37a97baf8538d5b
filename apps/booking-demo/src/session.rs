use std::sync::Arc;

use tracing::info;

use appointment_cell::services::{AppointmentStore, QuickRebookPicker, RescheduleSuggestionRanker};
use booking_queue_cell::{BackgroundMatchingCoordinator, BookingSubmissionOrchestrator, BroadcastNavigator};
use doctor_cell::services::{SimulatedMatchingService, SlotAvailabilityProvider};
use shared_config::AppConfig;
use shared_database::{FileStore, KeyValueStore};

/// Everything one booking session needs, wired against the file backend.
pub struct BookingSession {
    pub store: Arc<AppointmentStore>,
    pub orchestrator: BookingSubmissionOrchestrator,
    pub navigator: Arc<BroadcastNavigator>,
    pub ranker: RescheduleSuggestionRanker,
    pub picker: QuickRebookPicker,
}

pub fn create_session(config: &AppConfig) -> BookingSession {
    let backend: Arc<dyn KeyValueStore> = Arc::new(FileStore::from_config(config));
    let store = Arc::new(AppointmentStore::from_config(backend.clone(), config));
    info!("Appointment store ready with {} saved appointments", store.len());

    let navigator = Arc::new(BroadcastNavigator::new());
    let matching = Arc::new(SimulatedMatchingService::new(config));

    let orchestrator = BookingSubmissionOrchestrator::new(
        store.clone(),
        BackgroundMatchingCoordinator::new(matching),
        navigator.clone(),
        backend,
        config,
    );

    BookingSession {
        store,
        orchestrator,
        navigator,
        ranker: RescheduleSuggestionRanker::new(SlotAvailabilityProvider::from_today()),
        picker: QuickRebookPicker::new(SlotAvailabilityProvider::from_today()),
    }
}
