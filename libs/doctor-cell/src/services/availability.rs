use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime, Weekday};
use tracing::debug;

use crate::models::{DayBand, TimeSlot};

/// Number of calendar days (weekends included in the count) a calendar spans.
pub const CALENDAR_DAYS: i64 = 14;
pub const SLOTS_PER_BAND: u32 = 6;
pub const SLOT_MINUTES: u32 = 30;

/// Deterministic per-doctor calendar.
///
/// Calendars cover day offsets `1..=CALENDAR_DAYS` after the reference date,
/// weekdays only, with a morning and an afternoon band of `SLOTS_PER_BAND`
/// half-hour slots. A slot is available when
/// `(day_offset + slot_index + seed) % 4 != 0`, where `slot_index` runs over the
/// whole day and `seed` comes from the doctor id. Same inputs, same calendar.
#[derive(Debug, Clone)]
pub struct SlotAvailabilityProvider {
    reference_date: NaiveDate,
}

impl SlotAvailabilityProvider {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    pub fn from_today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Full calendar for a doctor, sorted by (date, time).
    pub fn get_calendar(&self, doctor_id: &str) -> Vec<TimeSlot> {
        let seed = seed_for(doctor_id);
        let times = daily_slot_times();
        let mut slots = Vec::with_capacity(times.len() * CALENDAR_DAYS as usize);

        for day_offset in 1..=CALENDAR_DAYS {
            let date = self.reference_date + Duration::days(day_offset);
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }

            for (slot_index, time) in times.iter().enumerate() {
                let available = (day_offset as u32 + slot_index as u32 + seed) % 4 != 0;
                slots.push(TimeSlot::new(date, *time, available));
            }
        }

        debug!("Generated {} slots for doctor {} (seed {})", slots.len(), doctor_id, seed);
        slots
    }

    /// Dates with at least one available slot, ascending.
    pub fn get_available_dates(&self, doctor_id: &str) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .get_calendar(doctor_id)
            .into_iter()
            .filter(|slot| slot.available)
            .map(|slot| slot.date)
            .collect();

        dates.sort();
        dates.dedup();
        dates
    }

    /// Every slot (available or not) on one date.
    pub fn get_slots_for_date(&self, doctor_id: &str, date: NaiveDate) -> Vec<TimeSlot> {
        self.get_calendar(doctor_id)
            .into_iter()
            .filter(|slot| slot.date == date)
            .collect()
    }
}

/// Small repeatable seed derived from the doctor id.
pub fn seed_for(doctor_id: &str) -> u32 {
    doctor_id.bytes().fold(0, |acc, b| (acc + u32::from(b)) % 7)
}

/// Slot start times of one day, morning band first.
pub fn daily_slot_times() -> Vec<NaiveTime> {
    DayBand::ALL
        .iter()
        .flat_map(|band| {
            (0..SLOTS_PER_BAND).filter_map(move |i| {
                let minutes = band.start_hour() * 60 + i * SLOT_MINUTES;
                NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
            })
        })
        .collect()
}
