//! Revealable Section - one-shot fade/slide reveal wrapper.
//!
//! Wraps one rendered rectangle and drives the `Hidden -> Revealed`
//! transition: the section reveals the first time 10% of it enters the
//! viewport and stays revealed forever after, even when scrolled back out.
//! There is no reverse transition.
//!
//! The section only decides *state*; the presentation layer reads
//! [`phase`](RevealableSection::phase) or
//! [`style`](RevealableSection::style) and applies the actual transition.

use std::rc::Rc;

use crate::host::ViewportHost;
use crate::observe::ViewportObserver;
use crate::types::{ObserverConfig, RegionId, RevealPhase, RevealStyle};

/// Threshold for section reveal: 10% of the section visible.
pub const SECTION_THRESHOLD: f32 = ObserverConfig::DEFAULT_THRESHOLD;

/// Section wrapper applying a one-shot reveal transition.
#[derive(Debug)]
pub struct RevealableSection {
    observer: ViewportObserver,
}

impl RevealableSection {
    /// Create a detached section on the given host.
    pub fn new(host: Rc<dyn ViewportHost>) -> Self {
        Self {
            observer: ViewportObserver::new(host, ObserverConfig::with_threshold(SECTION_THRESHOLD)),
        }
    }

    /// Attach the section's rectangle and start observing it.
    pub fn attach(&mut self, region: RegionId) {
        self.observer.attach(region);
    }

    /// Stop observing. The reveal, once fired, is not undone.
    pub fn detach(&mut self) {
        self.observer.detach();
    }

    /// Current phase of the reveal state machine.
    ///
    /// `Hidden` until the wrapped region has been visible once; `Revealed`
    /// (terminal) from then on.
    pub fn phase(&self) -> RevealPhase {
        if self.observer.has_been_visible() {
            RevealPhase::Revealed
        } else {
            RevealPhase::Hidden
        }
    }

    /// Whether the reveal has fired.
    pub fn is_revealed(&self) -> bool {
        self.phase() == RevealPhase::Revealed
    }

    /// Presentation tokens for the current phase.
    pub fn style(&self) -> RevealStyle {
        RevealStyle::for_phase(self.phase())
    }

    /// The underlying observer, for reactive consumers that want the
    /// combined state signal.
    pub fn observer(&self) -> &ViewportObserver {
        &self.observer
    }
}

// =============================================================================
// Tests
// =============================================================================
