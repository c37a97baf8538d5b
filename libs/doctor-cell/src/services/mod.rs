pub mod availability;
pub mod matching;

pub use availability::SlotAvailabilityProvider;
pub use matching::{MatchingService, SimulatedMatchingService};
