//! Session state and the process-wide session registry.
//!
//! A [`Session`] is one user's live conversation with the agent engine plus
//! its relay-side bookkeeping. The [`SessionRegistry`] owns every session
//! exclusively; endpoint handlers go through it for each operation so that
//! concurrent start/send/end calls — including a client calling `end` while
//! its own stream is mid-cleanup — see a consistent view and the underlying
//! conversation is closed exactly once.
//!
//! Sessions are process-local by design: nothing here survives a restart.

/// Session registry.
pub mod registry;
/// Session state and lifecycle.
pub mod session;

pub use registry::SessionRegistry;
pub use session::{Lifecycle, Session};
