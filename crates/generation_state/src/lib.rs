//! generation_state - State machine for generation sessions
//!
//! This crate provides the lifecycle FSM for one generation session:
//! `Idle -> InFlight <-> Retrying -> {Succeeded, Failed, Aborted}`.

pub mod machine;

// Re-export commonly used types
pub use machine::{GenerationEvent, GenerationState, StateMachine, StateTransition, TransitionError};
