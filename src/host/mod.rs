//! Host capability boundary.
//!
//! The reveal core never talks to a real DOM or browser API. Everything it
//! needs from the environment is expressed by [`ViewportHost`]:
//! - register a rectangle, receive intersection-change callbacks, unregister
//! - subscribe to scroll events
//! - schedule/cancel one callback for the next rendering frame
//! - read scroll geometry
//!
//! Any environment that can do those four things can drive the reveal
//! system: a platform intersection API, polling geometry comparison, or a
//! synthesized-event test double. [`page::PageHost`] in this crate is a
//! geometry-evaluating implementation used by the demos and tests.

pub mod page;

use crate::types::{ObserverConfig, RegionId, ScrollMetrics};

// =============================================================================
// Handle Types
// =============================================================================

/// Handle to one live observation session at the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationId(pub u64);

/// Handle to one installed scroll listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Handle to one scheduled next-frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequestId(pub u64);

// =============================================================================
// Events
// =============================================================================

/// One intersection-change event delivered to an observation callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionChange {
    /// Whether the region now intersects at its configured threshold.
    pub is_intersecting: bool,
    /// Visible fraction of the region's area at evaluation time, in [0, 1].
    pub ratio: f32,
}

/// Callback invoked by the host on every intersection change of one session.
pub type IntersectionCallback = Box<dyn FnMut(IntersectionChange)>;

/// Callback invoked by the host on every scroll event.
pub type ScrollCallback = Box<dyn FnMut()>;

/// Callback scheduled to run once on the next rendering frame.
pub type FrameCallback = Box<dyn FnOnce()>;

// =============================================================================
// Host Trait
// =============================================================================

/// The environment capability the reveal core runs against.
///
/// Single-threaded, event-driven: implementations use interior mutability
/// and deliver callbacks on the host's own event loop. All methods take
/// `&self`; hosts are shared as `Rc<dyn ViewportHost>`.
///
/// # Teardown contract
///
/// `unobserve`, `remove_scroll_listener` and `cancel_frame` remove the
/// registered callback itself. After they return, the host holds no way to
/// invoke it — cancellation is structural, not a still-mounted check.
pub trait ViewportHost {
    /// Start observing a region.
    ///
    /// The callback receives an initial event reflecting the current state,
    /// then one event per intersection change. Returns `None` when the host
    /// has no observation mechanism; callers degrade to permanently
    /// not-intersecting and must not treat this as fatal.
    fn observe(
        &self,
        region: RegionId,
        config: ObserverConfig,
        on_change: IntersectionCallback,
    ) -> Option<ObservationId>;

    /// Stop an observation session. Safe to call with an already-released id.
    fn unobserve(&self, id: ObservationId);

    /// Install a scroll listener.
    fn add_scroll_listener(&self, on_scroll: ScrollCallback) -> ListenerId;

    /// Remove a scroll listener. Safe to call with an already-removed id.
    fn remove_scroll_listener(&self, id: ListenerId);

    /// Schedule a callback for the next rendering frame.
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId;

    /// Cancel a scheduled frame callback before it runs.
    fn cancel_frame(&self, id: FrameRequestId);

    /// Current scroll geometry.
    fn scroll_metrics(&self) -> ScrollMetrics;
}
