//! Page host - geometry-evaluating [`ViewportHost`].
//!
//! [`PageHost`] simulates one vertically scrollable document:
//! - regions are plain rectangles in document coordinates
//! - intersection is evaluated from geometry (visible-area ratio against
//!   each session's threshold, viewport adjusted by the root margin)
//! - scroll listeners fire synchronously on offset changes
//! - frame callbacks queue up until [`run_frame`](PageHost::run_frame)
//!
//! This is both the in-repo host implementation for demos and the test
//! double for the whole reveal system: tests drive it by moving the scroll
//! offset and pumping frames, and every intersection event the core ever
//! sees is synthesized here.
//!
//! # Re-entrant callbacks
//!
//! Delivering an intersection event can synchronously create or release
//! other sessions (a grid opening its card-observation gate does exactly
//! that). Callbacks are therefore taken out of the session table while they
//! run, and a release that arrives mid-flight is honored when the callback
//! returns instead of being lost.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::debug;

use crate::types::{ObserverConfig, Rect, RegionId, ScrollMetrics};

use super::{
    FrameCallback, FrameRequestId, IntersectionCallback, IntersectionChange, ListenerId,
    ObservationId, ScrollCallback, ViewportHost,
};

// =============================================================================
// Page Host
// =============================================================================

/// One live observation session.
struct Observation {
    region: RegionId,
    config: ObserverConfig,
    on_change: IntersectionCallback,
    /// Last reported intersection flag; events fire only on change.
    last: bool,
}

struct PageInner {
    // Geometry
    regions: RefCell<HashMap<RegionId, Rect>>,
    viewport_width: Cell<f32>,
    viewport_height: Cell<f32>,
    content_height: Cell<f32>,
    scroll_offset: Cell<f32>,

    // Observation sessions
    observations: RefCell<HashMap<ObservationId, Observation>>,
    /// Sessions whose callback is currently executing (taken out of the table).
    in_flight: RefCell<HashSet<ObservationId>>,
    /// In-flight sessions released by their own (or a sibling's) callback.
    released_in_flight: RefCell<HashSet<ObservationId>>,
    /// When false, `observe` reports the mechanism as unavailable.
    observation_available: Cell<bool>,

    // Scroll listeners
    scroll_listeners: RefCell<HashMap<ListenerId, ScrollCallback>>,
    listeners_in_flight: RefCell<HashSet<ListenerId>>,
    listeners_released_in_flight: RefCell<HashSet<ListenerId>>,

    // Frame queue
    frame_queue: RefCell<Vec<(FrameRequestId, FrameCallback)>>,

    // Id counters (monotonic, never reused)
    next_region: Cell<u64>,
    next_observation: Cell<u64>,
    next_listener: Cell<u64>,
    next_frame: Cell<u64>,
}

/// Simulated scrollable page implementing [`ViewportHost`].
///
/// Cheap to clone; clones share the same document. Keep one clone on the
/// driving side (tests, demo loop) and hand `Rc<dyn ViewportHost>` to the
/// reveal components.
#[derive(Clone)]
pub struct PageHost {
    inner: Rc<PageInner>,
}

impl PageHost {
    /// Create a page with the given viewport size and total content height.
    pub fn new(viewport_width: f32, viewport_height: f32, content_height: f32) -> Self {
        Self {
            inner: Rc::new(PageInner {
                regions: RefCell::new(HashMap::new()),
                viewport_width: Cell::new(viewport_width),
                viewport_height: Cell::new(viewport_height),
                content_height: Cell::new(content_height),
                scroll_offset: Cell::new(0.0),
                observations: RefCell::new(HashMap::new()),
                in_flight: RefCell::new(HashSet::new()),
                released_in_flight: RefCell::new(HashSet::new()),
                observation_available: Cell::new(true),
                scroll_listeners: RefCell::new(HashMap::new()),
                listeners_in_flight: RefCell::new(HashSet::new()),
                listeners_released_in_flight: RefCell::new(HashSet::new()),
                frame_queue: RefCell::new(Vec::new()),
                next_region: Cell::new(1),
                next_observation: Cell::new(1),
                next_listener: Cell::new(1),
                next_frame: Cell::new(1),
            }),
        }
    }

    /// Share this page as a host handle for the reveal components.
    pub fn as_host(&self) -> Rc<dyn ViewportHost> {
        Rc::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Document layout
    // -------------------------------------------------------------------------

    /// Register a rectangle and return its handle.
    pub fn insert_region(&self, rect: Rect) -> RegionId {
        let id = RegionId(self.inner.next_region.get());
        self.inner.next_region.set(id.0 + 1);
        self.inner.regions.borrow_mut().insert(id, rect);
        id
    }

    /// Move or resize a registered rectangle. Re-evaluates observations.
    pub fn move_region(&self, id: RegionId, rect: Rect) {
        self.inner.regions.borrow_mut().insert(id, rect);
        self.evaluate();
    }

    /// Remove a rectangle. Sessions targeting it report not-intersecting.
    pub fn remove_region(&self, id: RegionId) {
        self.inner.regions.borrow_mut().remove(&id);
        self.evaluate();
    }

    /// Resize the viewport. Re-evaluates observations.
    pub fn set_viewport(&self, width: f32, height: f32) {
        self.inner.viewport_width.set(width);
        self.inner.viewport_height.set(height);
        self.clamp_scroll();
        self.evaluate();
    }

    /// Change the total content height.
    pub fn set_content_height(&self, height: f32) {
        self.inner.content_height.set(height);
        self.clamp_scroll();
        self.evaluate();
    }

    /// Simulate the observation mechanism being present or absent.
    ///
    /// With `false`, subsequent `observe` calls return `None` and observers
    /// degrade per their contract. Existing sessions are unaffected.
    pub fn set_observation_available(&self, available: bool) {
        self.inner.observation_available.set(available);
    }

    // -------------------------------------------------------------------------
    // Scrolling and frames
    // -------------------------------------------------------------------------

    /// Scroll to an absolute offset (clamped to the scrollable range).
    ///
    /// Fires scroll listeners and then re-evaluates intersections, both
    /// synchronously. A no-op move fires nothing.
    pub fn set_scroll_offset(&self, offset: f32) {
        let max = (self.inner.content_height.get() - self.inner.viewport_height.get()).max(0.0);
        let clamped = offset.clamp(0.0, max);
        if clamped == self.inner.scroll_offset.get() {
            return;
        }
        self.inner.scroll_offset.set(clamped);
        self.dispatch_scroll();
        self.evaluate();
    }

    /// Scroll by a delta.
    pub fn scroll_by(&self, delta: f32) {
        self.set_scroll_offset(self.inner.scroll_offset.get() + delta);
    }

    /// Run one rendering frame: drains and executes every callback that was
    /// scheduled before this call. Callbacks scheduled while the frame runs
    /// land in the next frame, matching animation-frame semantics.
    pub fn run_frame(&self) {
        let queue = self.inner.frame_queue.take();
        for (_, callback) in queue {
            callback();
        }
    }

    /// Number of callbacks waiting for the next frame.
    pub fn pending_frame_count(&self) -> usize {
        self.inner.frame_queue.borrow().len()
    }

    /// Number of live observation sessions.
    pub fn observation_count(&self) -> usize {
        self.inner.observations.borrow().len() + self.inner.in_flight.borrow().len()
    }

    /// Number of installed scroll listeners.
    pub fn scroll_listener_count(&self) -> usize {
        self.inner.scroll_listeners.borrow().len() + self.inner.listeners_in_flight.borrow().len()
    }

    // -------------------------------------------------------------------------
    // Evaluation
    // -------------------------------------------------------------------------

    /// Viewport rectangle in document coordinates.
    fn viewport_rect(&self) -> Rect {
        Rect::new(
            0.0,
            self.inner.scroll_offset.get(),
            self.inner.viewport_width.get(),
            self.inner.viewport_height.get(),
        )
    }

    fn clamp_scroll(&self) {
        let max = (self.inner.content_height.get() - self.inner.viewport_height.get()).max(0.0);
        let current = self.inner.scroll_offset.get();
        if current > max {
            self.inner.scroll_offset.set(max);
        }
    }

    /// Current intersection of one region under one config. A missing
    /// region reports a zero ratio instead of an error.
    fn current_change(&self, region: RegionId, config: &ObserverConfig) -> IntersectionChange {
        let rect = self.inner.regions.borrow().get(&region).copied();
        let ratio = match rect {
            Some(r) => r.visible_ratio(&self.viewport_rect().expand(config.root_margin.0)),
            None => 0.0,
        };
        IntersectionChange {
            is_intersecting: config.is_intersecting(ratio),
            ratio,
        }
    }

    /// Re-evaluate every session and deliver events where the intersection
    /// flag changed since the last delivery.
    pub fn evaluate(&self) {
        let ids: Vec<ObservationId> = self.inner.observations.borrow().keys().copied().collect();
        for id in ids {
            let Some(obs) = self.inner.observations.borrow_mut().remove(&id) else {
                continue;
            };
            let change = self.current_change(obs.region, &obs.config);
            if change.is_intersecting != obs.last {
                self.deliver(id, obs, change);
            } else {
                self.inner.observations.borrow_mut().insert(id, obs);
            }
        }
    }

    /// Invoke a session callback with the session taken out of the table,
    /// then put it back unless the callback released it in the meantime.
    fn deliver(&self, id: ObservationId, mut obs: Observation, change: IntersectionChange) {
        obs.last = change.is_intersecting;
        self.inner.in_flight.borrow_mut().insert(id);
        (obs.on_change)(change);
        self.inner.in_flight.borrow_mut().remove(&id);

        if self.inner.released_in_flight.borrow_mut().remove(&id) {
            debug!("observation {} released during delivery", id.0);
            return;
        }
        self.inner.observations.borrow_mut().insert(id, obs);
    }

    /// Fire every scroll listener, tolerating listeners that add or remove
    /// listeners while running.
    fn dispatch_scroll(&self) {
        let ids: Vec<ListenerId> = self.inner.scroll_listeners.borrow().keys().copied().collect();
        for id in ids {
            let Some(mut listener) = self.inner.scroll_listeners.borrow_mut().remove(&id) else {
                continue;
            };
            self.inner.listeners_in_flight.borrow_mut().insert(id);
            listener();
            self.inner.listeners_in_flight.borrow_mut().remove(&id);

            if self.inner.listeners_released_in_flight.borrow_mut().remove(&id) {
                continue;
            }
            self.inner.scroll_listeners.borrow_mut().insert(id, listener);
        }
    }
}

impl std::fmt::Debug for PageHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageHost")
            .field("regions", &self.inner.regions.borrow().len())
            .field("observations", &self.observation_count())
            .field("scroll_offset", &self.inner.scroll_offset.get())
            .finish()
    }
}

// =============================================================================
// ViewportHost Implementation
// =============================================================================

impl ViewportHost for PageHost {
    fn observe(
        &self,
        region: RegionId,
        config: ObserverConfig,
        on_change: IntersectionCallback,
    ) -> Option<ObservationId> {
        if !self.inner.observation_available.get() {
            return None;
        }

        let id = ObservationId(self.inner.next_observation.get());
        self.inner.next_observation.set(id.0 + 1);

        let change = self.current_change(region, &config);
        let obs = Observation {
            region,
            config,
            on_change,
            last: change.is_intersecting,
        };
        debug!(
            "observe region {} as session {} (threshold {})",
            region.0, id.0, config.threshold
        );

        // Initial delivery reflects the state at registration time, so a
        // region already in view latches immediately.
        self.deliver(id, obs, change);
        Some(id)
    }

    fn unobserve(&self, id: ObservationId) {
        let removed = self.inner.observations.borrow_mut().remove(&id).is_some();
        if removed {
            debug!("unobserve session {}", id.0);
        } else if self.inner.in_flight.borrow().contains(&id) {
            self.inner.released_in_flight.borrow_mut().insert(id);
        }
    }

    fn add_scroll_listener(&self, on_scroll: ScrollCallback) -> ListenerId {
        let id = ListenerId(self.inner.next_listener.get());
        self.inner.next_listener.set(id.0 + 1);
        self.inner.scroll_listeners.borrow_mut().insert(id, on_scroll);
        id
    }

    fn remove_scroll_listener(&self, id: ListenerId) {
        let removed = self.inner.scroll_listeners.borrow_mut().remove(&id).is_some();
        if !removed && self.inner.listeners_in_flight.borrow().contains(&id) {
            self.inner.listeners_released_in_flight.borrow_mut().insert(id);
        }
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let id = FrameRequestId(self.inner.next_frame.get());
        self.inner.next_frame.set(id.0 + 1);
        self.inner.frame_queue.borrow_mut().push((id, callback));
        id
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        self.inner
            .frame_queue
            .borrow_mut()
            .retain(|(queued, _)| *queued != id);
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            offset: self.inner.scroll_offset.get(),
            content_height: self.inner.content_height.get(),
            viewport_height: self.inner.viewport_height.get(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::types::RootMargin;

    /// Collects delivered intersection flags for assertions.
    fn recording_callback() -> (Rc<RefCell<Vec<bool>>>, IntersectionCallback) {
        let log: Rc<RefCell<Vec<bool>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let cb: IntersectionCallback =
            Box::new(move |change| sink.borrow_mut().push(change.is_intersecting));
        (log, cb)
    }

    #[test]
    fn test_initial_delivery_reflects_current_state() {
        let page = PageHost::new(1000.0, 800.0, 2000.0);

        // In view at registration
        let visible = page.insert_region(Rect::new(0.0, 100.0, 500.0, 200.0));
        let (log, cb) = recording_callback();
        page.observe(visible, ObserverConfig::default(), cb).unwrap();
        assert_eq!(*log.borrow(), vec![true]);

        // Below the fold at registration
        let hidden = page.insert_region(Rect::new(0.0, 1500.0, 500.0, 200.0));
        let (log, cb) = recording_callback();
        page.observe(hidden, ObserverConfig::default(), cb).unwrap();
        assert_eq!(*log.borrow(), vec![false]);
    }

    #[test]
    fn test_events_fire_only_on_change() {
        let page = PageHost::new(1000.0, 800.0, 3000.0);
        let region = page.insert_region(Rect::new(0.0, 1000.0, 500.0, 200.0));

        let (log, cb) = recording_callback();
        page.observe(region, ObserverConfig::default(), cb).unwrap();
        assert_eq!(*log.borrow(), vec![false]);

        // Still out of view: no event
        page.set_scroll_offset(50.0);
        assert_eq!(*log.borrow(), vec![false]);

        // Scrolled into view: one enter event
        page.set_scroll_offset(900.0);
        assert_eq!(*log.borrow(), vec![false, true]);

        // Deeper scroll, still in view: no event
        page.set_scroll_offset(1000.0);
        assert_eq!(*log.borrow(), vec![false, true]);

        // Past it: one leave event
        page.set_scroll_offset(2200.0);
        assert_eq!(*log.borrow(), vec![false, true, false]);
    }

    #[test]
    fn test_threshold_and_root_margin() {
        let page = PageHost::new(1000.0, 800.0, 3000.0);
        // 200px tall region starting at the bottom edge of the unscrolled
        // viewport, narrow enough to sit inside the shrunken horizontal span
        let region = page.insert_region(Rect::new(100.0, 800.0, 500.0, 200.0));

        let (log, cb) = recording_callback();
        let config = ObserverConfig::new(0.3, RootMargin::px(-50.0));
        page.observe(region, config, cb).unwrap();
        assert_eq!(*log.borrow(), vec![false]);

        // Shrunken viewport bottom edge is at scroll + 750. Visible height
        // is scroll - 50, and 30% of 200px needs 60px -> scroll >= 110.
        page.set_scroll_offset(100.0);
        assert_eq!(*log.borrow(), vec![false]);

        page.set_scroll_offset(110.0);
        assert_eq!(*log.borrow(), vec![false, true]);
    }

    #[test]
    fn test_unobserve_stops_delivery() {
        let page = PageHost::new(1000.0, 800.0, 3000.0);
        let region = page.insert_region(Rect::new(0.0, 1000.0, 500.0, 200.0));

        let (log, cb) = recording_callback();
        let id = page.observe(region, ObserverConfig::default(), cb).unwrap();
        assert_eq!(page.observation_count(), 1);

        page.unobserve(id);
        assert_eq!(page.observation_count(), 0);

        page.set_scroll_offset(900.0);
        assert_eq!(*log.borrow(), vec![false]); // nothing after release

        // Releasing again is a no-op
        page.unobserve(id);
    }

    #[test]
    fn test_unavailable_observation_mechanism() {
        let page = PageHost::new(1000.0, 800.0, 2000.0);
        page.set_observation_available(false);

        let region = page.insert_region(Rect::new(0.0, 0.0, 500.0, 200.0));
        let (log, cb) = recording_callback();
        assert!(page.observe(region, ObserverConfig::default(), cb).is_none());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_callback_can_release_itself() {
        let page = PageHost::new(1000.0, 800.0, 3000.0);
        let region = page.insert_region(Rect::new(0.0, 1000.0, 500.0, 200.0));

        // The callback releases its own session on the first enter event.
        let handle: Rc<RefCell<Option<ObservationId>>> = Rc::new(RefCell::new(None));
        let count = Rc::new(RefCell::new(0usize));

        let page_for_cb = page.clone();
        let handle_for_cb = handle.clone();
        let count_for_cb = count.clone();
        let cb: IntersectionCallback = Box::new(move |change| {
            if change.is_intersecting {
                *count_for_cb.borrow_mut() += 1;
                if let Some(id) = *handle_for_cb.borrow() {
                    page_for_cb.unobserve(id);
                }
            }
        });

        let id = page.observe(region, ObserverConfig::default(), cb).unwrap();
        *handle.borrow_mut() = Some(id);

        page.set_scroll_offset(900.0);
        assert_eq!(*count.borrow(), 1);
        assert_eq!(page.observation_count(), 0);

        // Session is really gone: scrolling away and back delivers nothing
        page.set_scroll_offset(0.0);
        page.set_scroll_offset(900.0);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_frame_queue_runs_once_per_frame() {
        let page = PageHost::new(1000.0, 800.0, 2000.0);
        let runs = Rc::new(RefCell::new(0usize));

        let runs_cb = runs.clone();
        page.request_frame(Box::new(move || *runs_cb.borrow_mut() += 1));
        assert_eq!(page.pending_frame_count(), 1);

        page.run_frame();
        assert_eq!(*runs.borrow(), 1);
        assert_eq!(page.pending_frame_count(), 0);

        // Nothing queued: frame is a no-op
        page.run_frame();
        assert_eq!(*runs.borrow(), 1);
    }

    #[test]
    fn test_frame_scheduled_during_frame_waits() {
        let page = PageHost::new(1000.0, 800.0, 2000.0);
        let runs = Rc::new(RefCell::new(Vec::new()));

        let page_inner = page.clone();
        let runs_outer = runs.clone();
        page.request_frame(Box::new(move || {
            runs_outer.borrow_mut().push("first");
            let runs_nested = runs_outer.clone();
            page_inner.request_frame(Box::new(move || runs_nested.borrow_mut().push("second")));
        }));

        page.run_frame();
        assert_eq!(*runs.borrow(), vec!["first"]);

        page.run_frame();
        assert_eq!(*runs.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_cancel_frame() {
        let page = PageHost::new(1000.0, 800.0, 2000.0);
        let ran = Rc::new(RefCell::new(false));

        let ran_cb = ran.clone();
        let id = page.request_frame(Box::new(move || *ran_cb.borrow_mut() = true));
        page.cancel_frame(id);

        page.run_frame();
        assert!(!*ran.borrow());
    }

    #[test]
    fn test_scroll_clamping_and_metrics() {
        let page = PageHost::new(1000.0, 800.0, 2000.0);

        page.set_scroll_offset(99_999.0);
        assert_eq!(page.scroll_metrics().offset, 1200.0);

        page.set_scroll_offset(-50.0);
        assert_eq!(page.scroll_metrics().offset, 0.0);

        let m = page.scroll_metrics();
        assert_eq!(m.content_height, 2000.0);
        assert_eq!(m.viewport_height, 800.0);
    }

    #[test]
    fn test_scroll_listener_lifecycle() {
        let page = PageHost::new(1000.0, 800.0, 2000.0);
        let count = Rc::new(RefCell::new(0usize));

        let count_cb = count.clone();
        let id = page.add_scroll_listener(Box::new(move || *count_cb.borrow_mut() += 1));

        page.set_scroll_offset(100.0);
        page.set_scroll_offset(200.0);
        assert_eq!(*count.borrow(), 2);

        // No-op scroll fires nothing
        page.set_scroll_offset(200.0);
        assert_eq!(*count.borrow(), 2);

        page.remove_scroll_listener(id);
        page.set_scroll_offset(300.0);
        assert_eq!(*count.borrow(), 2);
        assert_eq!(page.scroll_listener_count(), 0);
    }

    #[test]
    fn test_removed_region_reports_not_intersecting() {
        let page = PageHost::new(1000.0, 800.0, 2000.0);
        let region = page.insert_region(Rect::new(0.0, 100.0, 500.0, 200.0));

        let (log, cb) = recording_callback();
        page.observe(region, ObserverConfig::default(), cb).unwrap();
        assert_eq!(*log.borrow(), vec![true]);

        // Unmounting the rectangle delivers a leave event, not a crash
        page.remove_region(region);
        assert_eq!(*log.borrow(), vec![true, false]);
    }
}
