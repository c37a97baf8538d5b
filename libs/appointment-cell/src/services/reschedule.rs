// libs/appointment-cell/src/services/reschedule.rs
use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, NaiveTime};
use tracing::debug;

use doctor_cell::models::TimeSlot;
use doctor_cell::services::SlotAvailabilityProvider;

use crate::models::{Appointment, SuggestedSlot, SuggestionReason};

pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;
pub const SIMILAR_TIME_WINDOW_MINUTES: i64 = 120;

const SAME_TIME_CAP: usize = 2;
const SIMILAR_TIME_CAP: usize = 2;
const SOONEST_CAP: usize = 3;
const SAME_WEEKDAY_CAP: usize = 2;

/// Ranks alternative slots for moving an existing appointment.
pub struct RescheduleSuggestionRanker {
    availability: SlotAvailabilityProvider,
}

impl RescheduleSuggestionRanker {
    pub fn new(availability: SlotAvailabilityProvider) -> Self {
        Self { availability }
    }

    pub fn get_suggested_slots(&self, doctor_id: &str, original: &Appointment, limit: usize) -> Vec<SuggestedSlot> {
        let calendar = self.availability.get_calendar(doctor_id);
        let suggestions = rank_suggestions(&calendar, original.date, original.time, limit);

        debug!(
            "Suggested {} reschedule slots for appointment {} with doctor {}",
            suggestions.len(),
            original.id,
            doctor_id
        );
        suggestions
    }
}

/// Pure ranking over a calendar.
///
/// Tiers run in order (same time, similar time, soonest, same weekday). Each
/// tier skips slots an earlier tier already took, then takes up to its cap.
/// The original slot and unavailable slots never appear. A tier that needs the
/// original's date or time is empty when that part is unknown.
pub fn rank_suggestions(
    slots: &[TimeSlot],
    original_date: Option<NaiveDate>,
    original_time: Option<NaiveTime>,
    limit: usize,
) -> Vec<SuggestedSlot> {
    let is_original = |s: &TimeSlot| Some(s.date) == original_date && Some(s.time) == original_time;

    let mut candidates: Vec<&TimeSlot> = slots
        .iter()
        .filter(|s| s.available && !is_original(*s))
        .collect();
    candidates.sort_by_key(|s| s.starts_at());
    candidates.dedup_by_key(|s| s.key());

    let mut ranked = Ranked::default();

    if let Some(time) = original_time {
        let same_time = candidates.iter().copied().filter(|s| s.time == time);
        ranked.take(same_time, SuggestionReason::SameTime, SAME_TIME_CAP);

        let mut similar: Vec<(i64, &TimeSlot)> = candidates
            .iter()
            .filter_map(|s| {
                let distance = (s.time - time).num_minutes().abs();
                (distance > 0 && distance <= SIMILAR_TIME_WINDOW_MINUTES).then_some((distance, *s))
            })
            .collect();
        // Stable sort keeps (date, time) order inside equal distances
        similar.sort_by_key(|(distance, _)| *distance);
        ranked.take(similar.into_iter().map(|(_, s)| s), SuggestionReason::SimilarTime, SIMILAR_TIME_CAP);
    }

    ranked.take(candidates.iter().copied(), SuggestionReason::Soonest, SOONEST_CAP);

    if let Some(date) = original_date {
        let weekday = date.weekday();
        let same_weekday = candidates.iter().copied().filter(|s| s.date.weekday() == weekday);
        ranked.take(same_weekday, SuggestionReason::SameWeekday, SAME_WEEKDAY_CAP);
    }

    let mut suggestions = ranked.suggestions;
    suggestions.truncate(limit);
    suggestions
}

#[derive(Default)]
struct Ranked {
    seen: HashSet<(NaiveDate, NaiveTime)>,
    suggestions: Vec<SuggestedSlot>,
}

impl Ranked {
    fn take<'a>(&mut self, tier: impl Iterator<Item = &'a TimeSlot>, reason: SuggestionReason, cap: usize) {
        let mut taken = 0;
        for slot in tier {
            if taken == cap {
                break;
            }
            if self.seen.insert(slot.key()) {
                self.suggestions.push(SuggestedSlot::new(*slot, reason));
                taken += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(d: u32, h: u32, m: u32) -> TimeSlot {
        TimeSlot::new(date(d), time(h, m), true)
    }

    #[test]
    fn test_same_time_beats_closer_similar_time() {
        // Original Tue 3 Feb 10:00
        let slots = vec![slot(4, 8, 0), slot(3, 11, 30), slot(10, 10, 0)];
        let ranked = rank_suggestions(&slots, Some(date(3)), Some(time(10, 0)), 5);

        let pos = |d: u32, h: u32, m: u32| {
            ranked.iter().position(|s| s.slot.key() == (date(d), time(h, m))).unwrap()
        };
        assert!(pos(10, 10, 0) < pos(3, 11, 30));
        assert_eq!(ranked[0].reason, SuggestionReason::SameTime);
        assert_eq!(ranked[1].reason, SuggestionReason::SimilarTime);
    }

    #[test]
    fn test_tier_order_and_caps() {
        let original = (date(3), time(10, 0));
        let slots = vec![
            slot(3, 9, 0),
            slot(3, 10, 0), // original
            slot(4, 10, 0),
            slot(5, 10, 0),
            slot(6, 10, 0),
            slot(4, 11, 0),
            slot(4, 9, 30),
            slot(4, 14, 0),
            slot(10, 16, 30),
        ];

        let ranked = rank_suggestions(&slots, Some(original.0), Some(original.1), 10);
        let reasons: Vec<_> = ranked.iter().map(|s| s.reason).collect();

        assert_eq!(
            reasons,
            vec![
                SuggestionReason::SameTime,
                SuggestionReason::SameTime,
                SuggestionReason::SimilarTime,
                SuggestionReason::SimilarTime,
                SuggestionReason::Soonest,
                SuggestionReason::Soonest,
                SuggestionReason::Soonest,
                SuggestionReason::SameWeekday,
            ]
        );
        // same time: soonest dates first
        assert_eq!(ranked[0].slot.key(), (date(4), time(10, 0)));
        assert_eq!(ranked[1].slot.key(), (date(5), time(10, 0)));
        // similar time: 30 minutes away before 60, earlier date first
        assert_eq!(ranked[2].slot.key(), (date(4), time(9, 30)));
        assert_eq!(ranked[3].slot.key(), (date(3), time(9, 0)));
        // Tue 10 Feb is the only remaining Tuesday
        assert_eq!(ranked[7].slot.key(), (date(10), time(16, 30)));
    }

    #[test]
    fn test_excludes_original_and_unavailable() {
        let mut blocked = slot(4, 10, 0);
        blocked.available = false;
        let slots = vec![slot(3, 10, 0), blocked, slot(5, 10, 0)];

        let ranked = rank_suggestions(&slots, Some(date(3)), Some(time(10, 0)), 5);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].slot.key(), (date(5), time(10, 0)));
    }

    #[test]
    fn test_limit_and_uniqueness() {
        let slots: Vec<TimeSlot> = (2..=13)
            .flat_map(|d| [slot(d, 9, 0), slot(d, 10, 0), slot(d, 14, 0)])
            .collect();

        for limit in 0..8 {
            let ranked = rank_suggestions(&slots, Some(date(3)), Some(time(10, 0)), limit);
            assert!(ranked.len() <= limit);

            let keys: HashSet<_> = ranked.iter().map(|s| s.slot.key()).collect();
            assert_eq!(keys.len(), ranked.len());
            assert!(!keys.contains(&(date(3), time(10, 0))));
        }
    }

    #[test]
    fn test_unknown_original_falls_back_to_soonest() {
        let slots = vec![slot(5, 9, 0), slot(4, 16, 0), slot(4, 9, 0), slot(6, 9, 0)];
        let ranked = rank_suggestions(&slots, None, None, 5);

        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|s| s.reason == SuggestionReason::Soonest));
        assert_eq!(ranked[0].slot.key(), (date(4), time(9, 0)));
    }

    #[test]
    fn test_label_mentions_reason_and_time() {
        let ranked = rank_suggestions(&[slot(4, 10, 0)], Some(date(3)), Some(time(10, 0)), 5);
        assert_eq!(ranked[0].label, "Same time: Wed 04 Feb at 10:00");
    }
}
