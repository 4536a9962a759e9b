//! Staggered Card Grid - parent-gated per-card activation.
//!
//! The grid as a whole reveals like a section (10% visible, one-shot).
//! Only after that grid-level latch fires does the grid begin observing
//! its individual cards: each card joins the activation set the first time
//! 30% of it is visible inside a viewport shrunk by 50px — the inward
//! margin delays the trigger slightly past the naive geometric
//! intersection point on purpose.
//!
//! # Gating invariant
//!
//! No card-level observation session exists while the grid's latch is
//! unset. When the gate opens, sessions for every attached card are
//! created together; cards attached later (gate already open) are observed
//! immediately.
//!
//! # Activation set
//!
//! A reactive set of card ids, insert-only for the grid's lifetime.
//! Membership is the card's state: in the set = `Active`, out = `Pending`.
//! The set is discarded with the grid; nothing persists across remounts.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;
use spark_signals::{ReactiveSet, effect};

use crate::host::{IntersectionCallback, ViewportHost};
use crate::observe::{ObservationSession, ViewportObserver};
use crate::types::{
    Breakpoint, CardId, CardSize, CardState, CardStyle, ObserverConfig, RegionId, RevealPhase,
    RevealStyle, RootMargin, column_span,
};

/// Threshold for the grid-level reveal: 10% visible.
pub const GRID_THRESHOLD: f32 = ObserverConfig::DEFAULT_THRESHOLD;

/// Threshold for per-card activation: 30% visible.
pub const CARD_THRESHOLD: f32 = 0.3;

/// Inward root margin for per-card activation, in pixels.
pub const CARD_ROOT_MARGIN: f32 = -50.0;

// =============================================================================
// Card Slots
// =============================================================================

/// One declared card: identity plus size class. The grid consumes exactly
/// this pair from the banner content; everything else passes through to
/// presentation untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardSlot {
    pub id: CardId,
    pub size: CardSize,
}

impl CardSlot {
    /// Create a slot.
    pub const fn new(id: CardId, size: CardSize) -> Self {
        Self { id, size }
    }
}

// =============================================================================
// Grid
// =============================================================================

/// Shared grid state reachable from the gate effect and card callbacks.
struct GridInner {
    host: Rc<dyn ViewportHost>,
    grid_observer: RefCell<ViewportObserver>,
    card_config: ObserverConfig,
    cards: Vec<CardSlot>,
    /// Card rectangles registered so far, keyed by card id.
    targets: RefCell<HashMap<CardId, RegionId>>,
    /// Live per-card sessions, keyed by card id. Empty until the gate opens.
    sessions: RefCell<HashMap<CardId, ObservationSession>>,
    /// The activation set: insert-only membership drives card state.
    active: Rc<RefCell<ReactiveSet<CardId>>>,
    gate_open: Cell<bool>,
}

impl GridInner {
    /// Create the observation sessions for every attached card. Runs once,
    /// on the first grid-latch transition.
    fn open_gate(self: &Rc<Self>) {
        if self.gate_open.get() {
            return;
        }
        self.gate_open.set(true);
        debug!("card grid gate open: observing {} cards", self.cards.len());

        // Declared order, for deterministic session creation; the host's
        // event delivery order across cards stays unspecified regardless.
        for slot in &self.cards {
            let region = self.targets.borrow().get(&slot.id).copied();
            if let Some(region) = region {
                self.observe_card(slot.id, region);
            }
        }
    }

    /// Start one card's observation session.
    fn observe_card(self: &Rc<Self>, id: CardId, region: RegionId) {
        if self.sessions.borrow().contains_key(&id) {
            return;
        }

        let active = self.active.clone();
        let on_change: IntersectionCallback = Box::new(move |change| {
            // Insert-only: leaving view never removes a card.
            if change.is_intersecting && !active.borrow().contains(&id) {
                active.borrow_mut().insert(id);
            }
        });

        // A host without an observation mechanism leaves the card pending
        // forever; the grid-level observer already warned about degrading.
        if let Some(obs_id) = self.host.observe(region, self.card_config, on_change) {
            self.sessions
                .borrow_mut()
                .insert(id, ObservationSession::new(self.host.clone(), obs_id));
        }
    }
}

/// Grid of cards with grid-level reveal and per-card staggered activation.
pub struct StaggeredCardGrid {
    inner: Rc<GridInner>,
    /// Stops the gate effect; taken on drop.
    stop_gate: Option<Box<dyn FnOnce()>>,
}

impl StaggeredCardGrid {
    /// Create a grid for a fixed collection of cards.
    ///
    /// The grid rectangle and the card rectangles attach separately; see
    /// [`attach_grid`](Self::attach_grid) and
    /// [`attach_card`](Self::attach_card).
    pub fn new(host: Rc<dyn ViewportHost>, cards: Vec<CardSlot>) -> Self {
        let grid_observer = ViewportObserver::new(
            host.clone(),
            ObserverConfig::with_threshold(GRID_THRESHOLD),
        );
        let state = grid_observer.state_signal();

        let inner = Rc::new(GridInner {
            host,
            grid_observer: RefCell::new(grid_observer),
            card_config: ObserverConfig::new(CARD_THRESHOLD, RootMargin::px(CARD_ROOT_MARGIN)),
            cards,
            targets: RefCell::new(HashMap::new()),
            sessions: RefCell::new(HashMap::new()),
            active: Rc::new(RefCell::new(ReactiveSet::new())),
            gate_open: Cell::new(false),
        });

        // Gate effect: re-runs on every grid state change and opens the
        // card-observation gate on the first latch transition.
        let gate_inner = inner.clone();
        let stop = effect(move || {
            if state.get().visibility.has_been_seen() {
                gate_inner.open_gate();
            }
        });

        Self {
            inner,
            stop_gate: Some(Box::new(stop)),
        }
    }

    // -------------------------------------------------------------------------
    // Rectangle wiring
    // -------------------------------------------------------------------------

    /// Attach the grid's own rectangle and start the grid-level reveal.
    pub fn attach_grid(&self, region: RegionId) {
        self.inner.grid_observer.borrow_mut().attach(region);
    }

    /// Register a card's rectangle.
    ///
    /// Before the gate opens this only records the target; once the gate is
    /// open (including at call time), the card is observed immediately.
    /// Ids not in the declared collection are ignored.
    pub fn attach_card(&self, id: CardId, region: RegionId) {
        if !self.inner.cards.iter().any(|slot| slot.id == id) {
            debug!("ignoring rectangle for undeclared card {id}");
            return;
        }
        self.inner.targets.borrow_mut().insert(id, region);
        if self.inner.gate_open.get() {
            self.inner.observe_card(id, region);
        }
    }

    /// Release one card's rectangle and session.
    pub fn detach_card(&self, id: CardId) {
        self.inner.targets.borrow_mut().remove(&id);
        self.inner.sessions.borrow_mut().remove(&id);
    }

    // -------------------------------------------------------------------------
    // Grid-level reveal
    // -------------------------------------------------------------------------

    /// Phase of the grid-level reveal (RevealableSection semantics).
    pub fn phase(&self) -> RevealPhase {
        if self.inner.grid_observer.borrow().has_been_visible() {
            RevealPhase::Revealed
        } else {
            RevealPhase::Hidden
        }
    }

    /// Whether the grid-level reveal has fired.
    pub fn is_revealed(&self) -> bool {
        self.phase() == RevealPhase::Revealed
    }

    /// Presentation tokens for the grid wrapper.
    pub fn style(&self) -> RevealStyle {
        RevealStyle::for_phase(self.phase())
    }

    /// Whether card-level observation has started.
    pub fn gate_is_open(&self) -> bool {
        self.inner.gate_open.get()
    }

    // -------------------------------------------------------------------------
    // Card state
    // -------------------------------------------------------------------------

    /// Activation state of one card.
    pub fn card_state(&self, id: CardId) -> CardState {
        if self.inner.active.borrow().contains(&id) {
            CardState::Active
        } else {
            CardState::Pending
        }
    }

    /// Whether a card has been activated.
    pub fn is_active(&self, id: CardId) -> bool {
        self.card_state(id) == CardState::Active
    }

    /// Presentation tokens for one card.
    pub fn card_style(&self, id: CardId) -> CardStyle {
        CardStyle::for_state(self.card_state(id))
    }

    /// Snapshot of the activation set, sorted for stable assertions.
    pub fn active_cards(&self) -> Vec<CardId> {
        let mut ids: Vec<CardId> = self.inner.active.borrow().iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of activated cards.
    pub fn activation_count(&self) -> usize {
        self.inner.active.borrow().len()
    }

    /// The activation set itself, for deriveds that react to membership.
    pub fn activation_set(&self) -> Rc<RefCell<ReactiveSet<CardId>>> {
        self.inner.active.clone()
    }

    // -------------------------------------------------------------------------
    // Layout
    // -------------------------------------------------------------------------

    /// The declared cards, in order.
    pub fn cards(&self) -> &[CardSlot] {
        &self.inner.cards
    }

    /// Column span for one card at a breakpoint. `None` for unknown ids.
    pub fn card_span(&self, id: CardId, breakpoint: Breakpoint) -> Option<u8> {
        self.inner
            .cards
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| column_span(slot.size, breakpoint))
    }

    /// Live per-card session count (testing / diagnostics).
    pub fn card_session_count(&self) -> usize {
        self.inner.sessions.borrow().len()
    }
}

impl Drop for StaggeredCardGrid {
    fn drop(&mut self) {
        // Stop the gate effect before releasing sessions so a teardown
        // cannot re-open the gate.
        if let Some(stop) = self.stop_gate.take() {
            stop();
        }
        self.inner.grid_observer.borrow_mut().detach();
        self.inner.sessions.borrow_mut().clear();
        self.inner.targets.borrow_mut().clear();
    }
}

impl std::fmt::Debug for StaggeredCardGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaggeredCardGrid")
            .field("cards", &self.inner.cards.len())
            .field("gate_open", &self.inner.gate_open.get())
            .field("active", &self.active_cards())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
