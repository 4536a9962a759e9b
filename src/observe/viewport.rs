//! Viewport observer.
//!
//! [`ViewportObserver`] wraps one observed rectangle and exposes the pair
//! the reveal components consume:
//! - `is_intersecting` - live flag, follows the region in and out of view
//! - `has_been_visible` - one-shot latch, set on first intersection and
//!   never cleared within the observer's lifetime
//!
//! Both live in a single [`RegionState`] signal so one intersection event
//! updates them atomically: no reader can see the latch from one transition
//! paired with the live flag from another.
//!
//! # Lifecycle
//!
//! An observer starts detached (no target, both flags false). [`attach`]
//! starts the observation session; changing the target or config releases
//! the old session before creating the new one, so duplicate callbacks are
//! impossible. Dropping the observer (or [`detach`]) releases the session;
//! a host without an observation mechanism leaves the observer permanently
//! degraded to not-intersecting instead of failing.
//!
//! [`attach`]: ViewportObserver::attach
//! [`detach`]: ViewportObserver::detach

use std::rc::Rc;

use log::warn;
use spark_signals::{Signal, signal};

use crate::host::{IntersectionCallback, ViewportHost};
use crate::types::{ObserverConfig, RegionId, RegionState};

use super::session::ObservationSession;

// =============================================================================
// Viewport Observer
// =============================================================================

/// Tracks intersection state for one observed rectangle.
pub struct ViewportObserver {
    host: Rc<dyn ViewportHost>,
    config: ObserverConfig,
    state: Signal<RegionState>,
    target: Option<RegionId>,
    session: Option<ObservationSession>,
    /// Set once the host reported the mechanism unavailable, to warn once.
    degraded: bool,
}

impl ViewportObserver {
    /// Create a detached observer with the given config.
    pub fn new(host: Rc<dyn ViewportHost>, config: ObserverConfig) -> Self {
        Self {
            host,
            config,
            state: signal(RegionState::default()),
            target: None,
            session: None,
            degraded: false,
        }
    }

    /// Create a detached observer with the default config (10% threshold,
    /// no root margin).
    pub fn with_defaults(host: Rc<dyn ViewportHost>) -> Self {
        Self::new(host, ObserverConfig::default())
    }

    // -------------------------------------------------------------------------
    // State access
    // -------------------------------------------------------------------------

    /// Whether the region currently intersects the viewport.
    pub fn is_intersecting(&self) -> bool {
        self.state.get().is_intersecting
    }

    /// Whether the region has ever intersected during this observer's
    /// lifetime. Monotonic: once true, stays true.
    pub fn has_been_visible(&self) -> bool {
        self.state.get().visibility.has_been_seen()
    }

    /// The combined state signal, for deriveds and effects.
    ///
    /// Reading it inside a derived/effect creates a reactive dependency.
    pub fn state_signal(&self) -> Signal<RegionState> {
        self.state.clone()
    }

    /// The active config.
    pub fn config(&self) -> ObserverConfig {
        self.config
    }

    /// The attached region, if any.
    pub fn target(&self) -> Option<RegionId> {
        self.target
    }

    /// Whether the observer gave up because the host lacks an observation
    /// mechanism.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Attach to a region and start observing it.
    ///
    /// Replaces any previous target; the old session is released before the
    /// new one is created. Attaching to the current target is a no-op.
    pub fn attach(&mut self, region: RegionId) {
        if self.target == Some(region) && self.session.is_some() {
            return;
        }
        self.target = Some(region);
        self.register();
    }

    /// Stop observing. The live flag is cleared; the latch survives until
    /// the observer itself is dropped.
    pub fn detach(&mut self) {
        self.session = None; // releases at the host
        self.target = None;
        let current = self.state.get();
        if current.is_intersecting {
            self.state.set(current.apply(false));
        }
    }

    /// Replace the config. If attached, the session is re-registered: old
    /// session torn down first, then a fresh one created with the new
    /// config. A no-op when the config is unchanged.
    pub fn set_config(&mut self, config: ObserverConfig) {
        if self.config == config {
            return;
        }
        self.config = config;
        if self.target.is_some() {
            self.register();
        }
    }

    /// (Re)create the observation session for the current target + config.
    fn register(&mut self) {
        // Old session first: the host must never hold two callbacks for us.
        self.session = None;

        let Some(region) = self.target else {
            return;
        };

        let state = self.state.clone();
        let on_change: IntersectionCallback = Box::new(move |change| {
            let current = state.get();
            let next = current.apply(change.is_intersecting);
            if next != current {
                state.set(next);
            }
        });

        match self.host.observe(region, self.config, on_change) {
            Some(id) => {
                self.session = Some(ObservationSession::new(self.host.clone(), id));
            }
            None => {
                // Permanent degraded defaults: not-intersecting, never seen
                // (unless already latched by an earlier session).
                if !self.degraded {
                    warn!(
                        "viewport observation unavailable; region {} will never report visible",
                        region.0
                    );
                    self.degraded = true;
                }
            }
        }
    }
}

impl std::fmt::Debug for ViewportObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportObserver")
            .field("target", &self.target)
            .field("config", &self.config)
            .field("state", &self.state.get())
            .field("degraded", &self.degraded)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::page::PageHost;
    use crate::types::{Rect, RootMargin};

    fn page() -> PageHost {
        PageHost::new(1000.0, 800.0, 3000.0)
    }

    #[test]
    fn test_detached_observer_reports_nothing() {
        let page = page();
        let observer = ViewportObserver::with_defaults(page.as_host());

        assert!(!observer.is_intersecting());
        assert!(!observer.has_been_visible());
        assert_eq!(page.observation_count(), 0);
    }

    #[test]
    fn test_attach_latches_if_already_visible() {
        let page = page();
        let region = page.insert_region(Rect::new(0.0, 100.0, 500.0, 200.0));

        let mut observer = ViewportObserver::with_defaults(page.as_host());
        observer.attach(region);

        assert!(observer.is_intersecting());
        assert!(observer.has_been_visible());
    }

    #[test]
    fn test_latch_survives_leaving_view() {
        let page = page();
        let region = page.insert_region(Rect::new(0.0, 1200.0, 500.0, 200.0));

        let mut observer = ViewportObserver::with_defaults(page.as_host());
        observer.attach(region);
        assert!(!observer.has_been_visible());

        // Scroll the region into view
        page.set_scroll_offset(1000.0);
        assert!(observer.is_intersecting());
        assert!(observer.has_been_visible());

        // Scroll fully past it: live flag drops, latch holds
        page.set_scroll_offset(2200.0);
        assert!(!observer.is_intersecting());
        assert!(observer.has_been_visible());

        // And again after several round trips
        page.set_scroll_offset(0.0);
        page.set_scroll_offset(1000.0);
        page.set_scroll_offset(0.0);
        assert!(!observer.is_intersecting());
        assert!(observer.has_been_visible());
    }

    #[test]
    fn test_attach_same_region_is_noop() {
        let page = page();
        let region = page.insert_region(Rect::new(0.0, 1200.0, 500.0, 200.0));

        let mut observer = ViewportObserver::with_defaults(page.as_host());
        observer.attach(region);
        let first_session = page.observation_count();
        observer.attach(region);

        assert_eq!(page.observation_count(), first_session);
    }

    #[test]
    fn test_config_change_reregisters_without_duplicates() {
        let page = page();
        let region = page.insert_region(Rect::new(0.0, 1200.0, 500.0, 200.0));

        let mut observer = ViewportObserver::with_defaults(page.as_host());
        observer.attach(region);
        assert_eq!(page.observation_count(), 1);

        observer.set_config(ObserverConfig::new(0.3, RootMargin::px(-50.0)));
        // Exactly one session, with the new config
        assert_eq!(page.observation_count(), 1);
        assert_eq!(observer.config().threshold, 0.3);

        // Unchanged config does not churn the session
        observer.set_config(ObserverConfig::new(0.3, RootMargin::px(-50.0)));
        assert_eq!(page.observation_count(), 1);
    }

    #[test]
    fn test_detach_releases_session_and_keeps_latch() {
        let page = page();
        let region = page.insert_region(Rect::new(0.0, 100.0, 500.0, 200.0));

        let mut observer = ViewportObserver::with_defaults(page.as_host());
        observer.attach(region);
        assert!(observer.has_been_visible());

        observer.detach();
        assert_eq!(page.observation_count(), 0);
        assert!(!observer.is_intersecting());
        assert!(observer.has_been_visible()); // latch outlives the session
    }

    #[test]
    fn test_released_observer_ignores_later_events() {
        let page = page();
        let region = page.insert_region(Rect::new(0.0, 1200.0, 500.0, 200.0));

        let mut observer = ViewportObserver::with_defaults(page.as_host());
        observer.attach(region);
        page.set_scroll_offset(1000.0);

        let state = observer.state_signal();
        let last = state.get();
        assert!(last.is_intersecting);

        drop(observer);
        assert_eq!(page.observation_count(), 0);

        // Simulated events after release never reach the released state
        page.set_scroll_offset(0.0);
        page.set_scroll_offset(1000.0);
        page.evaluate();
        assert_eq!(state.get(), last);
    }

    #[test]
    fn test_unavailable_host_degrades_quietly() {
        let page = page();
        page.set_observation_available(false);
        let region = page.insert_region(Rect::new(0.0, 100.0, 500.0, 200.0));

        let mut observer = ViewportObserver::with_defaults(page.as_host());
        observer.attach(region);

        assert!(observer.is_degraded());
        assert!(!observer.is_intersecting());
        assert!(!observer.has_been_visible());

        // Scrolling changes nothing: degradation is permanent
        page.set_scroll_offset(500.0);
        assert!(!observer.is_intersecting());
    }
}
