//! Planning sessions
//!
//! `TripSession` is the synchronous façade over one Orchestrator.
//! `SessionHandle` wraps it in an actor for hosts that deliver events from
//! several async sources.

mod bus;
mod facade;
mod handle;
mod planning;
mod search;

pub use bus::{DEFAULT_EVENT_CAPACITY, SessionBus, SessionEvent};
pub use facade::{SessionSnapshot, TripSession};
pub use handle::{DEFAULT_QUEUE_CAPACITY, SessionError, SessionHandle};
pub use planning::{PlanningStep, planning_step};
pub use search::{SearchError, SearchExecutor};
