// libs/appointment-cell/src/services/rebook.rs
use chrono::{Local, NaiveDateTime};
use tracing::debug;

use doctor_cell::models::TimeSlot;
use doctor_cell::services::SlotAvailabilityProvider;

/// Picks the single best "rebook now" slot from a doctor's calendar.
pub struct QuickRebookPicker {
    availability: SlotAvailabilityProvider,
}

impl QuickRebookPicker {
    pub fn new(availability: SlotAvailabilityProvider) -> Self {
        Self { availability }
    }

    pub fn pick_for_doctor(&self, doctor_id: &str, now: NaiveDateTime) -> Option<TimeSlot> {
        let picked = pick_next_available_slot(&self.availability.get_calendar(doctor_id), now);
        debug!("Quick rebook for doctor {}: {:?}", doctor_id, picked.map(|s| s.starts_at()));
        picked
    }
}

/// Earliest available slot starting at or after `now`.
///
/// When every available slot is already in the past, the earliest of them is
/// returned instead, so a `Some` is best-effort rather than a freshness
/// guarantee. `None` only when nothing is available at all.
pub fn pick_next_available_slot(slots: &[TimeSlot], now: NaiveDateTime) -> Option<TimeSlot> {
    let mut available: Vec<TimeSlot> = slots.iter().filter(|s| s.available).copied().collect();
    available.sort_by_key(|s| s.starts_at());

    available
        .iter()
        .find(|s| s.starts_at() >= now)
        .or_else(|| available.first())
        .copied()
}

pub fn pick_next_available_slot_now(slots: &[TimeSlot]) -> Option<TimeSlot> {
    pick_next_available_slot(slots, Local::now().naive_local())
}
