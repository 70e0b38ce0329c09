//! State machine module
//!
//! Contains the FSM implementation for the generation session lifecycle.

mod events;
mod states;
mod transitions;

pub use events::GenerationEvent;
pub use states::GenerationState;
pub use transitions::{StateMachine, StateTransition, TransitionError};
