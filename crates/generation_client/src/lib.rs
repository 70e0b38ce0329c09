//! generation_client - Retrying, cancellable generation sessions
//!
//! - `cancellation` - one token/source pair per session
//! - `transport` - the remote call seam and its reqwest implementation
//! - `orchestrator` - the attempt/backoff loop
//! - `session` - per-session lifecycle bookkeeping and observable snapshots
//! - `studio` - request submission, session handles and history wiring

pub mod cancellation;
pub mod orchestrator;
pub mod session;
pub mod studio;
pub mod transport;

pub use cancellation::{CancelSource, CancelToken, CancellationController};
pub use orchestrator::RetryOrchestrator;
pub use session::{GenerationSession, Outcome, SessionSnapshot};
pub use studio::{GenerationStudio, SessionHandle};
pub use transport::{GenerationTransport, HttpGenerationTransport};

#[cfg(test)]
mod testing;
