//! Viewport observation.
//!
//! - [`session`] - owned handle to one live observation session
//! - [`viewport`] - the observer pairing a live `is_intersecting` signal
//!   with a one-shot `has_been_visible` latch

pub mod session;
pub mod viewport;

pub use session::ObservationSession;
pub use viewport::ViewportObserver;
