//! # tether-sessions
//!
//! Session state and lifecycle for the tether daemon.
//!
//! - [`SessionRegistry`]: in-memory table, the only copy of session state
//! - [`SessionLifecycleManager`]: create, fork, join, stop and sweep
//! - [`spawn_sweeper`]: periodic cleanup task
//!
//! All registry writes go through the lifecycle manager. Creation for a
//! `(category, owner)` pair is serialized by a keyed lock holding the pending
//! creation's future, so racing callers share one outcome.

pub mod artifacts;
mod creation_lock;
pub mod lifecycle;
pub mod process;
pub mod registry;
pub mod sweep;

pub use artifacts::SessionDescriptor;
pub use lifecycle::{
    CreateSession, LifecycleConfig, SessionLifecycleManager, SharedSession, SweepReport,
};
pub use registry::{SessionFilter, SessionRegistry};
pub use sweep::spawn_sweeper;
