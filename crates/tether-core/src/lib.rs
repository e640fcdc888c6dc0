pub mod errors;
pub mod events;
pub mod handlers;
pub mod ids;
pub mod session;

pub use errors::SessionError;
pub use events::{CleanupReason, EventBus, SessionEvent};
pub use handlers::{HandlerEntry, HandlerRegistry, RegisterOptions, RegistryError};
pub use ids::{MalformedId, SessionId};
pub use session::{
    ArtifactPaths, ConnectionIdentity, IdentityContext, Session, SessionCategory, SessionContext,
    StarterKind, TrackedProcess, SHARED_OWNER,
};
