use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime, Utc};

use appointment_cell::models::{Appointment, AppointmentError, AppointmentPatch, AppointmentStatus};
use appointment_cell::services::{AppointmentStore, StoreEvent};
use doctor_cell::models::MatchType;
use shared_config::AppConfig;
use shared_database::{FileStore, KeyValueStore, MemoryStore, PersistenceError};

const KEY: &str = "appointments";

/// Backend whose writes always fail, like a full quota or private mode.
#[derive(Default)]
struct FailingStore {
    writes_attempted: AtomicUsize,
}

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
        Err(PersistenceError::Unavailable("storage disabled".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), PersistenceError> {
        self.writes_attempted.fetch_add(1, Ordering::SeqCst);
        Err(PersistenceError::Unavailable("quota exceeded".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable("storage disabled".to_string()))
    }
}

fn memory_store() -> (Arc<MemoryStore>, AppointmentStore) {
    let backend = Arc::new(MemoryStore::new());
    let store = AppointmentStore::load(backend.clone(), KEY);
    (backend, store)
}

fn resolved_patch(status: AppointmentStatus) -> AppointmentPatch {
    AppointmentPatch {
        doctor_id: Some("doc-gp-01".to_string()),
        doctor_name: Some("Dr. Ana Ribeiro".to_string()),
        specialty: Some("general_practice".to_string()),
        date: NaiveDate::from_ymd_opt(2026, 2, 3),
        time: NaiveTime::from_hms_opt(10, 0, 0),
        status: Some(status),
        ..AppointmentPatch::default()
    }
}

fn without_timestamps(mut appointment: Appointment) -> Appointment {
    appointment.created_at = None;
    appointment.updated_at = None;
    appointment
}

#[test]
fn test_add_then_get_by_id_round_trips() {
    let (_, store) = memory_store();
    let mut placeholder = Appointment::placeholder("apt-1", MatchType::Specialty);
    placeholder.for_user_id = Some("child-7".to_string());
    placeholder.for_user_name = Some("Leo".to_string());

    store.add(placeholder.clone()).unwrap();

    let loaded = store.get_by_id("apt-1").expect("appointment stored");
    assert_eq!(without_timestamps(loaded.clone()), placeholder);
    assert!(loaded.created_at.is_some());
    assert_eq!(loaded.created_at, loaded.updated_at);
}

#[test]
fn test_add_keeps_existing_timestamps() {
    let (_, store) = memory_store();
    let stamped_at = Utc::now() - chrono::Duration::days(3);
    let mut appointment = Appointment::placeholder("apt-1", MatchType::FastLane);
    appointment.created_at = Some(stamped_at);

    let added = store.add(appointment).unwrap();
    assert_eq!(added.created_at, Some(stamped_at));
    assert!(added.updated_at.unwrap() > stamped_at);
}

#[test]
fn test_add_preserves_insertion_order_and_rejects_reused_ids() {
    let (_, store) = memory_store();
    for id in ["apt-c", "apt-a", "apt-b"] {
        store.add(Appointment::placeholder(id, MatchType::FastLane)).unwrap();
    }

    let ids: Vec<String> = store.all().into_iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["apt-c", "apt-a", "apt-b"]);

    assert_matches!(
        store.add(Appointment::placeholder("apt-a", MatchType::FastLane)),
        Err(AppointmentError::DuplicateId(id)) if id == "apt-a"
    );
    assert_eq!(store.len(), 3);
}

#[test]
fn test_update_merges_patch_and_refreshes_updated_at() {
    let (_, store) = memory_store();
    let added = store.add(Appointment::placeholder("apt-1", MatchType::FastLane)).unwrap();

    std::thread::sleep(std::time::Duration::from_millis(5));
    let updated = store
        .update("apt-1", resolved_patch(AppointmentStatus::Confirmed))
        .unwrap()
        .expect("known id");

    assert_eq!(updated.status, AppointmentStatus::Confirmed);
    assert_eq!(updated.doctor_id.as_deref(), Some("doc-gp-01"));
    assert_eq!(updated.match_type, Some(MatchType::FastLane));
    assert_eq!(updated.created_at, added.created_at);
    assert!(updated.updated_at > added.updated_at);

    let reminder = store
        .update("apt-1", AppointmentPatch { reminder_set: Some(true), ..AppointmentPatch::default() })
        .unwrap()
        .unwrap();
    assert!(reminder.reminder_set);
    assert_eq!(reminder.doctor_name.as_deref(), Some("Dr. Ana Ribeiro"));
}

#[test]
fn test_update_unknown_id_is_a_no_op() {
    let (backend, store) = memory_store();
    assert_eq!(store.update("missing", resolved_patch(AppointmentStatus::Confirmed)), Ok(None));
    assert_eq!(store.cancel("missing"), Ok(None));
    assert!(store.is_empty());
    assert_eq!(backend.get(KEY).unwrap(), None);
}

#[test]
fn test_status_only_moves_forward() {
    let (_, store) = memory_store();
    store.add(Appointment::placeholder("apt-1", MatchType::FastLane)).unwrap();

    store.cancel("apt-1").unwrap();
    let result = store.update("apt-1", resolved_patch(AppointmentStatus::Confirmed));
    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::CancelledPatient,
            to: AppointmentStatus::Confirmed,
        })
    );

    // A rejected patch writes nothing
    let stored = store.get_by_id("apt-1").unwrap();
    assert_eq!(stored.status, AppointmentStatus::CancelledPatient);
    assert_eq!(stored.doctor_id, None);
}

#[test]
fn test_confirmed_can_complete_or_be_cancelled() {
    let (_, store) = memory_store();
    for id in ["apt-1", "apt-2"] {
        store.add(Appointment::placeholder(id, MatchType::Specialty)).unwrap();
        store.update(id, resolved_patch(AppointmentStatus::Confirmed)).unwrap();
    }

    let completed = store
        .update("apt-1", AppointmentPatch::status(AppointmentStatus::Completed))
        .unwrap()
        .unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);

    let cancelled = store.cancel_with_reason("apt-2", "Feeling better").unwrap().unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::CancelledPatient);
    assert_eq!(cancelled.cancel_reason.as_deref(), Some("Feeling better"));

    assert_eq!(store.by_status(AppointmentStatus::Completed).len(), 1);
    assert_eq!(store.by_status(AppointmentStatus::Confirmed).len(), 0);
}

#[test]
fn test_every_mutation_writes_through() {
    let (backend, store) = memory_store();
    store.add(Appointment::placeholder("apt-1", MatchType::FastLane)).unwrap();
    store.update("apt-1", resolved_patch(AppointmentStatus::AwaitConfirm)).unwrap();

    let raw = backend.get(KEY).unwrap().expect("state persisted");
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["version"], 1);
    assert_eq!(json["appointments"][0]["id"], "apt-1");
    assert_eq!(json["appointments"][0]["status"], "await_confirm");
    assert_eq!(json["appointments"][0]["date"], "2026-02-03");
}

#[test]
fn test_reload_restores_state() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::for_tests(dir.path());

    {
        let store = AppointmentStore::from_config(Arc::new(FileStore::from_config(&config)), &config);
        store.add(Appointment::placeholder("apt-1", MatchType::FastLane)).unwrap();
        store.update("apt-1", resolved_patch(AppointmentStatus::Confirmed)).unwrap();
    }

    let reloaded = AppointmentStore::from_config(Arc::new(FileStore::from_config(&config)), &config);
    let appointment = reloaded.get_by_id("apt-1").unwrap();
    assert_eq!(appointment.status, AppointmentStatus::Confirmed);
    assert_eq!(appointment.time, NaiveTime::from_hms_opt(10, 0, 0));
}

#[test]
fn test_corrupt_persisted_state_falls_back_to_empty() {
    let backend = Arc::new(MemoryStore::new());
    backend.set(KEY, "{\"version\": 1, \"appointments\": [{\"id\": 3").unwrap();

    let store = AppointmentStore::load(backend.clone(), KEY);
    assert!(store.is_empty());

    // Still fully usable, and the next write replaces the corrupt blob
    store.add(Appointment::placeholder("apt-1", MatchType::FastLane)).unwrap();
    let reloaded = AppointmentStore::load(backend, KEY);
    assert_eq!(reloaded.len(), 1);
}

#[test]
fn test_newer_state_version_is_ignored() {
    let backend = Arc::new(MemoryStore::new());
    backend.set(KEY, "{\"version\": 99, \"appointments\": []}").unwrap();

    let store = AppointmentStore::load(backend, KEY);
    assert!(store.is_empty());
}

#[test]
fn test_persistence_failures_are_swallowed() {
    let backend = Arc::new(FailingStore::default());
    let store = AppointmentStore::load(backend.clone(), KEY);

    store.add(Appointment::placeholder("apt-1", MatchType::FastLane)).unwrap();
    store.cancel("apt-1").unwrap();
    store.reset();
    store.add(Appointment::placeholder("apt-2", MatchType::FastLane)).unwrap();

    assert_eq!(backend.writes_attempted.load(Ordering::SeqCst), 3);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get_by_id("apt-2").unwrap().status, AppointmentStatus::Matching);
}

#[test]
fn test_reset_clears_memory_and_backend() {
    let (backend, store) = memory_store();
    store.add(Appointment::placeholder("apt-1", MatchType::FastLane)).unwrap();

    store.reset();
    assert!(store.is_empty());
    assert_eq!(backend.get(KEY).unwrap(), None);
}

#[tokio::test]
async fn test_subscribers_see_every_mutation() {
    let (_, store) = memory_store();
    let mut events = store.subscribe();

    store.add(Appointment::placeholder("apt-1", MatchType::FastLane)).unwrap();
    store.update("apt-1", resolved_patch(AppointmentStatus::Confirmed)).unwrap();
    store.update("apt-1", AppointmentPatch::status(AppointmentStatus::Matching)).unwrap_err();
    store.reset();

    assert_matches!(events.recv().await, Ok(StoreEvent::Added(a)) if a.status == AppointmentStatus::Matching);
    assert_matches!(events.recv().await, Ok(StoreEvent::Updated(a)) if a.status == AppointmentStatus::Confirmed);
    assert_matches!(events.recv().await, Ok(StoreEvent::Reset));
}
