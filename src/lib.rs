//! # spark-reveal
//!
//! Reactive scroll-reveal system for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! fine-grained reactivity.
//!
//! ## Architecture
//!
//! Everything is driven by one capability boundary and two latching state
//! machines:
//!
//! ```text
//! ViewportHost → intersection events → RegionState signal (latch)
//!                                       ├─ RevealableSection (Hidden → Revealed)
//!                                       └─ StaggeredCardGrid (gate → ActivationSet)
//! ViewportHost → scroll events → frame-coalesced progress signal
//! ```
//!
//! A [`ViewportHost`](host::ViewportHost) provides "register a rectangle,
//! receive intersection-change callbacks, unregister", plus scroll events
//! and frame scheduling. [`PageHost`](host::page::PageHost) is a
//! geometry-evaluating host used by the demos and tests; real platforms
//! bind their own intersection APIs behind the same trait.
//!
//! All latches are one-way by construction: a section that has revealed
//! never hides, a card that has activated never deactivates, and both
//! invariants live in the type system rather than in flag bookkeeping.
//!
//! ## Modules
//!
//! - [`types`] - Core types (Rect, ObserverConfig, Visibility latch, styles)
//! - [`host`] - The host capability trait and the page host
//! - [`observe`] - Observation sessions and the viewport observer
//! - [`scroll`] - Frame-coalesced scroll-progress tracker
//! - [`components`] - RevealableSection and StaggeredCardGrid
//! - [`content`] - Banner content contract (serde)

pub mod components;
pub mod content;
pub mod host;
pub mod observe;
pub mod scroll;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use host::{
    FrameRequestId, IntersectionChange, ListenerId, ObservationId, ViewportHost,
    page::PageHost,
};

pub use observe::{ObservationSession, ViewportObserver};

pub use scroll::{
    accent_hue, is_tracker_active, reset_scroll_state, scroll_progress,
    scroll_progress_signal, subscribe_to_scroll_progress, subscriber_count,
};

pub use components::{
    CardSlot, RevealableSection, StaggeredCardGrid,
    card_grid::{CARD_ROOT_MARGIN, CARD_THRESHOLD, GRID_THRESHOLD},
    section::SECTION_THRESHOLD,
};

pub use content::{BannerRecord, BannerVariant, ContentError, card_slots, load_banners};
