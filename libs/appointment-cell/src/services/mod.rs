pub mod lifecycle;
pub mod store;
pub mod reschedule;
pub mod rebook;

pub use lifecycle::AppointmentLifecycleService;
pub use store::{AppointmentStore, PersistedState, StoreEvent};
pub use reschedule::{rank_suggestions, RescheduleSuggestionRanker};
pub use rebook::{pick_next_available_slot, pick_next_available_slot_now, QuickRebookPicker};
