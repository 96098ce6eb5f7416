//! Orchestrator state machine
//!
//! A synchronous reducer: one event in, one fully-settled state out.

mod events;
mod machine;
mod state;

pub use events::{ClassifiedIntent, Event};
pub use machine::{Dispatch, DispatchStatus, Effect, Orchestrator, Rejection};
pub use state::{MachineState, OrchestratorState, StateName};
