//! Scroll Progress Tracker - frame-coalesced scroll position.
//!
//! Tracks normalized document scroll progress (0 = top, 1 = bottom) as a
//! shared reactive signal. One tracker per thread regardless of how many
//! components subscribe; the scroll listener starts with the first
//! subscriber and stops with the last.
//!
//! # Frame coalescing
//!
//! Scroll events arrive much faster than the display refreshes. The tracker
//! keeps a pending-frame slot: a scroll event schedules a recompute only
//! when the slot is empty, and the slot clears when the recompute runs.
//! However many scroll events land inside one frame, progress is recomputed
//! at most once for that frame.
//!
//! # Example
//!
//! ```ignore
//! use spark_reveal::scroll::{subscribe_to_scroll_progress, scroll_progress};
//!
//! let unsubscribe = subscribe_to_scroll_progress(page.as_host());
//!
//! // ... scroll events + frames happen ...
//! let progress = scroll_progress(); // 0.0 ..= 1.0
//!
//! unsubscribe();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::trace;
use spark_signals::{Signal, signal};

use crate::host::{FrameRequestId, ListenerId, ViewportHost};

// =============================================================================
// Tracker Registry
// =============================================================================

/// Shared tracker state behind the subscribe/unsubscribe API.
struct ScrollRegistry {
    /// Normalized progress signal, eagerly initialized at activation.
    progress: Signal<f32>,
    /// The one scheduled recompute, when a scroll burst is in flight.
    pending: Rc<Cell<Option<FrameRequestId>>>,
    /// Installed scroll listener.
    listener: ListenerId,
    /// Host the listener and frame requests live on.
    host: Rc<dyn ViewportHost>,
    /// Number of active subscribers.
    subscribers: usize,
}

thread_local! {
    static SCROLL_REGISTRY: RefCell<Option<ScrollRegistry>> = const { RefCell::new(None) };
}

// =============================================================================
// Public API
// =============================================================================

/// Subscribe to scroll-progress tracking on the given host.
///
/// The first subscriber installs the scroll listener and computes the
/// initial progress eagerly (page load is not "progress unknown"). Later
/// subscribers share the same tracker; the host argument of the first
/// subscriber wins.
///
/// Returns an unsubscribe function. When the last subscriber unsubscribes,
/// any pending recompute is cancelled and the listener removed — no
/// orphaned callbacks survive teardown.
pub fn subscribe_to_scroll_progress(host: Rc<dyn ViewportHost>) -> Box<dyn FnOnce()> {
    SCROLL_REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();

        if let Some(active) = registry.as_mut() {
            active.subscribers += 1;
            return;
        }

        // Eager initial value: computed at activation, not on first scroll.
        let progress = signal(host.scroll_metrics().progress());
        let pending: Rc<Cell<Option<FrameRequestId>>> = Rc::new(Cell::new(None));

        let listener_host = host.clone();
        let listener_progress = progress.clone();
        let listener_pending = pending.clone();
        let listener = Box::new(move || {
            // Coalesce: one recompute in flight at a time.
            if listener_pending.get().is_some() {
                return;
            }

            let frame_host = listener_host.clone();
            let frame_progress = listener_progress.clone();
            let frame_pending = listener_pending.clone();
            let id = listener_host.request_frame(Box::new(move || {
                frame_pending.set(None);
                let next = frame_host.scroll_metrics().progress();
                trace!("scroll progress recompute: {next}");
                if frame_progress.get() != next {
                    frame_progress.set(next);
                }
            }));
            listener_pending.set(Some(id));
        });

        let listener = host.add_scroll_listener(listener);
        *registry = Some(ScrollRegistry {
            progress,
            pending,
            listener,
            host,
            subscribers: 1,
        });
    });

    Box::new(|| {
        SCROLL_REGISTRY.with(|registry| {
            let mut registry = registry.borrow_mut();

            let last = match registry.as_mut() {
                Some(active) => {
                    active.subscribers = active.subscribers.saturating_sub(1);
                    active.subscribers == 0
                }
                None => false,
            };
            if !last {
                return;
            }

            // Last subscriber: tear the tracker down completely.
            if let Some(active) = registry.take() {
                if let Some(id) = active.pending.take() {
                    active.host.cancel_frame(id);
                }
                active.host.remove_scroll_listener(active.listener);
            }
        });
    })
}

/// Current scroll progress in [0, 1]. Returns 0.0 when no tracker is active.
pub fn scroll_progress() -> f32 {
    SCROLL_REGISTRY.with(|registry| {
        registry
            .borrow()
            .as_ref()
            .map(|active| active.progress.get())
            .unwrap_or(0.0)
    })
}

/// The progress signal, for deriveds and effects. `None` when inactive.
pub fn scroll_progress_signal() -> Option<Signal<f32>> {
    SCROLL_REGISTRY.with(|registry| {
        registry
            .borrow()
            .as_ref()
            .map(|active| active.progress.clone())
    })
}

/// Accent hue derived from scroll progress, in degrees.
///
/// Sweeps from 200 (blue) at the top to 260 (purple) at the bottom. Nothing
/// in this crate consumes it; it is an inert derived output kept for
/// presentation layers that want it.
pub fn accent_hue() -> f32 {
    200.0 + scroll_progress() * 60.0
}

/// Number of active subscribers (0 when inactive).
pub fn subscriber_count() -> usize {
    SCROLL_REGISTRY.with(|registry| {
        registry
            .borrow()
            .as_ref()
            .map(|active| active.subscribers)
            .unwrap_or(0)
    })
}

/// Whether a tracker is currently installed.
pub fn is_tracker_active() -> bool {
    SCROLL_REGISTRY.with(|registry| registry.borrow().is_some())
}

/// Tear down the tracker regardless of subscriber count (for testing).
pub fn reset_scroll_state() {
    SCROLL_REGISTRY.with(|registry| {
        if let Some(active) = registry.borrow_mut().take() {
            if let Some(id) = active.pending.take() {
                active.host.cancel_frame(id);
            }
            active.host.remove_scroll_listener(active.listener);
        }
    });
}

// =============================================================================
// Tests
// =============================================================================
