pub mod controller;
pub mod mutations;
pub mod orchestrator;
pub mod routes;
pub mod session_gate;
pub mod state;

// Re-export the pieces a binary or embedding UI needs to drive the dashboard.
pub use controller::Dashboard;
pub use mutations::PendingDeactivation;
pub use orchestrator::LoadOutcome;
pub use routes::{guard, RouteDecision};
pub use session_gate::SessionHandle;
pub use state::{AppState, CreateForm, ViewState};
