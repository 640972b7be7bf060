//! Request orchestration for a media-download client.
//!
//! The crate turns raw user input into a stable session: keystrokes are
//! debounced into metadata lookups, every network operation carries a
//! cancellation token so only the newest result lands, and the session
//! itself only ever changes through explicit merge patches. Hosts embed
//! [`Coordinator`], feed it input events and observe session snapshots
//! through a watch channel.

mod coordinator;
mod debounce;
mod errors;
mod models;
mod normalize;
mod registry;
mod service;
mod session;

pub use coordinator::{
    Coordinator, CoordinatorConfig, LogOnlyTrigger, SilentTrigger, MSG_ENTER_URL, MSG_FALLBACK,
    MSG_PREPARING, MSG_STARTING,
};
pub use debounce::DebounceScheduler;
pub use errors::Error;
pub use models::{
    format_duration, CommunityLinks, MediaDescription, Rendition, Session, SessionPatch,
    DEFAULT_RENDITION, DEFAULT_SOURCE_LABEL, DEFAULT_TITLE,
};
pub use normalize::{normalize, GENERIC_METADATA_ERROR};
pub use registry::{RequestKind, RequestRegistry, RequestToken};
pub use service::{
    ExtractionService, HttpExtractionService, ServiceConfig, DEV_BASE_URL, PRODUCTION_BASE_URL,
};
pub use session::FetchState;
