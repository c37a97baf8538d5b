// libs/appointment-cell/src/services/store.rs
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::{get_json, set_json, KeyValueStore};

use crate::models::{Appointment, AppointmentError, AppointmentPatch, AppointmentStatus};
use crate::services::lifecycle::AppointmentLifecycleService;

pub const STATE_VERSION: u32 = 1;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Shape of the blob written under the store's key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub appointments: Vec<Appointment>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            appointments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Added(Appointment),
    Updated(Appointment),
    Reset,
}

/// Session-wide appointment collection with write-through persistence.
///
/// In-memory state is authoritative. Every mutation writes the whole state to
/// the backend under one key; backend failures are logged and swallowed.
/// Mutations are serialised by the inner lock and broadcast to subscribers.
pub struct AppointmentStore {
    appointments: RwLock<Vec<Appointment>>,
    backend: Arc<dyn KeyValueStore>,
    storage_key: String,
    lifecycle: AppointmentLifecycleService,
    events: broadcast::Sender<StoreEvent>,
}

impl AppointmentStore {
    /// Load persisted state, falling back to an empty store on any read failure.
    pub fn load(backend: Arc<dyn KeyValueStore>, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();

        let appointments = match get_json::<PersistedState>(backend.as_ref(), &storage_key) {
            Ok(Some(state)) if state.version <= STATE_VERSION => {
                info!("Loaded {} persisted appointments", state.appointments.len());
                state.appointments
            }
            Ok(Some(state)) => {
                warn!("Persisted state version {} is newer than {}, starting empty", state.version, STATE_VERSION);
                Vec::new()
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read persisted appointments, starting empty: {}", e);
                Vec::new()
            }
        };

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            appointments: RwLock::new(appointments),
            backend,
            storage_key,
            lifecycle: AppointmentLifecycleService::new(),
            events,
        }
    }

    pub fn from_config(backend: Arc<dyn KeyValueStore>, config: &AppConfig) -> Self {
        Self::load(backend, config.appointments_key.clone())
    }

    /// Insert at the end, stamping missing timestamps.
    pub fn add(&self, mut appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.write();

        if appointments.iter().any(|a| a.id == appointment.id) {
            return Err(AppointmentError::DuplicateId(appointment.id));
        }

        let now = Utc::now();
        appointment.created_at.get_or_insert(now);
        appointment.updated_at.get_or_insert(now);

        appointments.push(appointment.clone());
        self.persist(&appointments);
        drop(appointments);

        debug!("Added appointment {} ({})", appointment.id, appointment.status);
        self.notify(StoreEvent::Added(appointment.clone()));
        Ok(appointment)
    }

    /// Merge a patch into an existing appointment.
    ///
    /// Returns `Ok(None)` when the id is unknown. A status change must be a
    /// legal lifecycle transition; otherwise nothing is written.
    pub fn update(&self, id: &str, patch: AppointmentPatch) -> Result<Option<Appointment>, AppointmentError> {
        let mut appointments = self.write();

        let Some(appointment) = appointments.iter_mut().find(|a| a.id == id) else {
            debug!("Ignoring update for unknown appointment {}", id);
            return Ok(None);
        };

        if let Some(next) = patch.status.as_ref() {
            self.lifecycle.validate_status_transition(&appointment.status, next)?;
        }

        appointment.apply(patch);
        appointment.updated_at = Some(Utc::now());
        let updated = appointment.clone();

        self.persist(&appointments);
        drop(appointments);

        debug!("Updated appointment {} ({})", updated.id, updated.status);
        self.notify(StoreEvent::Updated(updated.clone()));
        Ok(Some(updated))
    }

    pub fn cancel(&self, id: &str) -> Result<Option<Appointment>, AppointmentError> {
        self.update(id, AppointmentPatch::status(AppointmentStatus::CancelledPatient))
    }

    pub fn cancel_with_reason(&self, id: &str, reason: impl Into<String>) -> Result<Option<Appointment>, AppointmentError> {
        self.update(
            id,
            AppointmentPatch {
                status: Some(AppointmentStatus::CancelledPatient),
                cancel_reason: Some(reason.into()),
                ..AppointmentPatch::default()
            },
        )
    }

    pub fn get_by_id(&self, id: &str) -> Option<Appointment> {
        self.read().iter().find(|a| a.id == id).cloned()
    }

    /// Every appointment in insertion order.
    pub fn all(&self) -> Vec<Appointment> {
        self.read().clone()
    }

    pub fn by_status(&self, status: AppointmentStatus) -> Vec<Appointment> {
        self.read().iter().filter(|a| a.status == status).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Full account reset: drop every appointment and the persisted blob.
    pub fn reset(&self) {
        let mut appointments = self.write();
        appointments.clear();

        if let Err(e) = self.backend.remove(&self.storage_key) {
            warn!("Failed to clear persisted appointments: {}", e);
        }
        drop(appointments);

        info!("Appointment store reset");
        self.notify(StoreEvent::Reset);
    }

    fn persist(&self, appointments: &[Appointment]) {
        let state = PersistedState {
            version: STATE_VERSION,
            appointments: appointments.to_vec(),
        };

        if let Err(e) = set_json(self.backend.as_ref(), &self.storage_key, &state) {
            warn!("Failed to persist appointments, keeping in-memory state: {}", e);
        }
    }

    fn notify(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Appointment>> {
        self.appointments.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Appointment>> {
        self.appointments.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
