pub mod coordinator;
pub mod navigation;
pub mod orchestrator;

pub use coordinator::{BackgroundMatchingCoordinator, CancellationToken, MatchHandle};
pub use navigation::{BroadcastNavigator, Navigator};
pub use orchestrator::{generate_appointment_id, BookingSubmissionOrchestrator, SubmissionReceipt};
