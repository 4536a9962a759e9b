//! Core types for spark-reveal.
//!
//! These types define the foundation that everything builds on.
//! They flow through the reactive pipeline and define what the reveal
//! components understand: rectangles, observation configs, and the
//! one-way visibility state machines.

use serde::{Deserialize, Serialize};

// =============================================================================
// Geometry
// =============================================================================

/// Axis-aligned rectangle in document coordinates (pixels).
///
/// `y` grows downward, matching a scrolled page: the viewport at scroll
/// offset `s` covers `y in [s, s + viewport_height]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Area in square pixels. Degenerate rectangles have zero area.
    pub fn area(&self) -> f32 {
        if self.width <= 0.0 || self.height <= 0.0 {
            0.0
        } else {
            self.width * self.height
        }
    }

    /// Overlap with another rectangle. Empty overlap collapses to a
    /// zero-area rectangle rather than an `Option`.
    pub fn intersection(&self, other: &Self) -> Self {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        Self {
            x: left,
            y: top,
            width: (right - left).max(0.0),
            height: (bottom - top).max(0.0),
        }
    }

    /// Grow the rectangle by `amount` pixels on every side.
    ///
    /// Negative amounts shrink it (an inward root margin). Shrinking past
    /// zero collapses to a zero-sized rectangle centered on the original.
    pub fn expand(&self, amount: f32) -> Self {
        let width = (self.width + 2.0 * amount).max(0.0);
        let height = (self.height + 2.0 * amount).max(0.0);
        Self {
            x: self.x + (self.width - width) / 2.0,
            y: self.y + (self.height - height) / 2.0,
            width,
            height,
        }
    }

    /// Fraction of this rectangle's area covered by `clip`, in [0, 1].
    pub fn visible_ratio(&self, clip: &Self) -> f32 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        (self.intersection(clip).area() / area).clamp(0.0, 1.0)
    }
}

// =============================================================================
// Observation Config
// =============================================================================

/// Uniform margin applied to the viewport before intersection is evaluated,
/// in signed pixels.
///
/// Positive values grow the viewport (trigger early), negative values shrink
/// it (trigger late). Mirrors a single-value CSS `rootMargin`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RootMargin(pub f32);

impl RootMargin {
    /// No margin: the viewport is used as-is.
    pub const NONE: Self = Self(0.0);

    /// Margin from a pixel amount.
    pub const fn px(amount: f32) -> Self {
        Self(amount)
    }
}

/// Configuration for one observation session.
///
/// Immutable per session: changing either field tears the session down and
/// creates a new one (the old session is released first, so a config change
/// can never produce duplicate callbacks).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverConfig {
    /// Fraction of the region's area that must be visible to count as
    /// intersecting, in [0, 1].
    pub threshold: f32,
    /// Signed viewport margin applied before evaluation.
    pub root_margin: RootMargin,
}

impl ObserverConfig {
    /// Default reveal threshold: 10% of the region visible.
    pub const DEFAULT_THRESHOLD: f32 = 0.1;

    /// Config with the given threshold and no root margin.
    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            root_margin: RootMargin::NONE,
        }
    }

    /// Config with both fields set.
    pub fn new(threshold: f32, root_margin: RootMargin) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            root_margin,
        }
    }

    /// Decide intersection from a visible-area ratio.
    ///
    /// A zero threshold means "any visible pixel counts"; otherwise the
    /// ratio must reach the threshold.
    pub fn is_intersecting(&self, ratio: f32) -> bool {
        if self.threshold <= 0.0 {
            ratio > 0.0
        } else {
            ratio >= self.threshold
        }
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            root_margin: RootMargin::NONE,
        }
    }
}

// =============================================================================
// Visibility State Machines
// =============================================================================

/// One-way visibility latch for an observed region.
///
/// `NeverSeen -> SeenOnce` is the only transition; there is no way back.
/// Modeling the latch as tagged state (instead of a mutable bool) makes the
/// monotonicity invariant structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// The region has never intersected the viewport.
    #[default]
    NeverSeen,
    /// The region has intersected at least once. Terminal.
    SeenOnce,
}

impl Visibility {
    /// Latch the state. Idempotent; never un-latches.
    pub fn seen(self) -> Self {
        Self::SeenOnce
    }

    /// Whether the latch has fired.
    pub fn has_been_seen(self) -> bool {
        matches!(self, Self::SeenOnce)
    }
}

/// Current + latched visibility for one observed region.
///
/// The pair is always written together in a single signal update, so no
/// reader can observe `is_intersecting` from one transition combined with
/// `visibility` from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionState {
    /// Whether the region currently intersects the (margin-adjusted)
    /// viewport at its configured threshold.
    pub is_intersecting: bool,
    /// Monotonic has-ever-intersected latch.
    pub visibility: Visibility,
}

impl RegionState {
    /// Apply an intersection-change event.
    ///
    /// Entering view sets both fields; leaving view clears only
    /// `is_intersecting` — the latch survives.
    pub fn apply(self, is_intersecting: bool) -> Self {
        Self {
            is_intersecting,
            visibility: if is_intersecting {
                self.visibility.seen()
            } else {
                self.visibility
            },
        }
    }
}

/// Reveal state of a wrapped section: `Hidden -> Revealed`, terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealPhase {
    /// Not yet seen: reduced opacity, vertical offset.
    #[default]
    Hidden,
    /// Seen at least once: full opacity, neutral offset. Terminal.
    Revealed,
}

/// Activation state of a grid card: `Pending -> Active`, one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardState {
    /// Not yet in the activation set: dimmed, slightly scaled down.
    #[default]
    Pending,
    /// Admitted to the activation set. Terminal.
    Active,
}

// =============================================================================
// Presentation Tokens
// =============================================================================

/// Visual tokens a section presenter reads to style the reveal transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealStyle {
    /// 0.0 (invisible) to 1.0 (opaque).
    pub opacity: f32,
    /// Downward offset in pixels; 0 when settled.
    pub offset_y: f32,
}

impl RevealStyle {
    /// Hidden state: transparent, shifted 32px down.
    pub const HIDDEN: Self = Self {
        opacity: 0.0,
        offset_y: 32.0,
    };

    /// Revealed state: opaque, neutral position.
    pub const REVEALED: Self = Self {
        opacity: 1.0,
        offset_y: 0.0,
    };

    /// Tokens for a reveal phase.
    pub const fn for_phase(phase: RevealPhase) -> Self {
        match phase {
            RevealPhase::Hidden => Self::HIDDEN,
            RevealPhase::Revealed => Self::REVEALED,
        }
    }
}

/// Visual tokens a card presenter reads to style card activation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardStyle {
    /// 0.0 to 1.0.
    pub opacity: f32,
    /// 1.0 = natural size.
    pub scale: f32,
}

impl CardStyle {
    /// Pending state: 70% opacity, 5% scaled down.
    pub const PENDING: Self = Self {
        opacity: 0.7,
        scale: 0.95,
    };

    /// Active state: fully opaque, natural size.
    pub const ACTIVE: Self = Self {
        opacity: 1.0,
        scale: 1.0,
    };

    /// Tokens for a card state.
    pub const fn for_state(state: CardState) -> Self {
        match state {
            CardState::Pending => Self::PENDING,
            CardState::Active => Self::ACTIVE,
        }
    }
}

// =============================================================================
// Layout Policy
// =============================================================================

/// Size class of a card, controlling padding and column span downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardSize {
    Small,
    Medium,
    Large,
}

/// Viewport width class the grid is rendered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    /// Single-column layout (phones).
    Narrow,
    /// Two-column layout (tablets).
    Medium,
    /// Four-column layout (desktops).
    Wide,
}

impl Breakpoint {
    /// Total grid columns at this breakpoint.
    pub const fn grid_columns(self) -> u8 {
        match self {
            Self::Narrow => 1,
            Self::Medium => 2,
            Self::Wide => 4,
        }
    }
}

/// Columns a card of the given size occupies at the given breakpoint.
///
/// Large cards span 2 columns at medium and wide breakpoints; everything
/// else (and everything at the narrow breakpoint) spans 1. Pure layout
/// policy, no behavioral state.
pub const fn column_span(size: CardSize, breakpoint: Breakpoint) -> u8 {
    match (size, breakpoint) {
        (CardSize::Large, Breakpoint::Medium | Breakpoint::Wide) => 2,
        _ => 1,
    }
}

// =============================================================================
// Scroll Metrics
// =============================================================================

/// Read-only scroll geometry snapshot provided by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    /// Current scroll offset from the top of the document, in pixels.
    pub offset: f32,
    /// Total content height, in pixels.
    pub content_height: f32,
    /// Viewport height, in pixels.
    pub viewport_height: f32,
}

impl ScrollMetrics {
    /// Normalized scroll progress in [0, 1].
    ///
    /// 0 at the top, 1 at the bottom. A document that does not scroll
    /// (content no taller than the viewport) reports 0 at any offset.
    pub fn progress(&self) -> f32 {
        let scrollable = self.content_height - self.viewport_height;
        if scrollable > 0.0 {
            (self.offset / scrollable).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque handle to a layout rectangle registered with a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u64);

/// Identifier of a card in a grid. Matches the banner record id.
pub type CardId = u32;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 100.0, 100.0);

        let overlap = a.intersection(&b);
        assert_eq!(overlap, Rect::new(50.0, 50.0, 50.0, 50.0));

        // Disjoint rectangles collapse to zero area
        let c = Rect::new(500.0, 500.0, 10.0, 10.0);
        assert_eq!(a.intersection(&c).area(), 0.0);
    }

    #[test]
    fn test_rect_visible_ratio() {
        let region = Rect::new(0.0, 0.0, 100.0, 100.0);

        // Fully covered
        assert_eq!(region.visible_ratio(&Rect::new(0.0, 0.0, 200.0, 200.0)), 1.0);

        // Half covered (bottom half clipped)
        let half = region.visible_ratio(&Rect::new(0.0, 0.0, 100.0, 50.0));
        assert!((half - 0.5).abs() < 1e-6);

        // Zero-area region never reports visibility
        let empty = Rect::new(0.0, 0.0, 0.0, 100.0);
        assert_eq!(empty.visible_ratio(&Rect::new(0.0, 0.0, 100.0, 100.0)), 0.0);
    }

    #[test]
    fn test_rect_expand_negative_shrinks() {
        let viewport = Rect::new(0.0, 0.0, 1000.0, 800.0);
        let shrunk = viewport.expand(-50.0);

        assert_eq!(shrunk.x, 50.0);
        assert_eq!(shrunk.y, 50.0);
        assert_eq!(shrunk.width, 900.0);
        assert_eq!(shrunk.height, 700.0);

        // Shrinking past zero collapses instead of inverting
        let tiny = Rect::new(0.0, 0.0, 10.0, 10.0).expand(-20.0);
        assert_eq!(tiny.area(), 0.0);
    }

    #[test]
    fn test_config_threshold_decision() {
        let config = ObserverConfig::with_threshold(0.3);
        assert!(!config.is_intersecting(0.0));
        assert!(!config.is_intersecting(0.29));
        assert!(config.is_intersecting(0.3));
        assert!(config.is_intersecting(1.0));

        // Zero threshold: any visible pixel counts
        let any = ObserverConfig::with_threshold(0.0);
        assert!(!any.is_intersecting(0.0));
        assert!(any.is_intersecting(0.001));
    }

    #[test]
    fn test_config_clamps_threshold() {
        assert_eq!(ObserverConfig::with_threshold(2.0).threshold, 1.0);
        assert_eq!(ObserverConfig::with_threshold(-1.0).threshold, 0.0);
    }

    #[test]
    fn test_visibility_latch_is_one_way() {
        let v = Visibility::NeverSeen;
        assert!(!v.has_been_seen());

        let v = v.seen();
        assert!(v.has_been_seen());

        // Latching again is idempotent
        assert_eq!(v.seen(), Visibility::SeenOnce);
    }

    #[test]
    fn test_region_state_apply() {
        let s = RegionState::default();
        assert!(!s.is_intersecting);
        assert!(!s.visibility.has_been_seen());

        // Entering view sets both
        let s = s.apply(true);
        assert!(s.is_intersecting);
        assert!(s.visibility.has_been_seen());

        // Leaving view clears only the current flag
        let s = s.apply(false);
        assert!(!s.is_intersecting);
        assert!(s.visibility.has_been_seen());

        // Re-entering is still latched
        let s = s.apply(true);
        assert!(s.is_intersecting);
        assert!(s.visibility.has_been_seen());
    }

    #[test]
    fn test_scroll_progress_formula() {
        // Document 2000px tall, viewport 800px: scrollable range 1200px
        let at = |offset: f32| ScrollMetrics {
            offset,
            content_height: 2000.0,
            viewport_height: 800.0,
        };

        assert_eq!(at(0.0).progress(), 0.0);
        assert!((at(600.0).progress() - 0.5).abs() < 1e-6);
        assert_eq!(at(1200.0).progress(), 1.0);
    }

    #[test]
    fn test_scroll_progress_non_scrollable() {
        // Content no taller than viewport: progress pinned to 0
        let m = ScrollMetrics {
            offset: 400.0,
            content_height: 800.0,
            viewport_height: 800.0,
        };
        assert_eq!(m.progress(), 0.0);
    }

    #[test]
    fn test_column_span_policy() {
        use Breakpoint::*;
        use CardSize::{Large, Small};

        // Narrow: everything is a single column
        assert_eq!(column_span(Large, Narrow), 1);
        assert_eq!(column_span(Small, Narrow), 1);

        // Medium/wide: only large cards span 2
        assert_eq!(column_span(Large, Medium), 2);
        assert_eq!(column_span(Large, Wide), 2);
        assert_eq!(column_span(CardSize::Medium, Wide), 1);
        assert_eq!(column_span(Small, Medium), 1);

        assert_eq!(Narrow.grid_columns(), 1);
        assert_eq!(Medium.grid_columns(), 2);
        assert_eq!(Wide.grid_columns(), 4);
    }

    #[test]
    fn test_style_tokens() {
        assert_eq!(RevealStyle::for_phase(RevealPhase::Hidden), RevealStyle::HIDDEN);
        assert_eq!(
            RevealStyle::for_phase(RevealPhase::Revealed),
            RevealStyle::REVEALED
        );
        assert_eq!(CardStyle::for_state(CardState::Pending), CardStyle::PENDING);
        assert_eq!(CardStyle::for_state(CardState::Active), CardStyle::ACTIVE);
    }
}
