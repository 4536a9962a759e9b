//! Reveal components.
//!
//! - [`section`] - one-shot revealable section wrapper
//! - [`card_grid`] - parent-gated staggered card grid

pub mod card_grid;
pub mod section;

pub use card_grid::{CardSlot, StaggeredCardGrid};
pub use section::RevealableSection;
