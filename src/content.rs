//! Banner content contract.
//!
//! The grid's external collaborator is a "banner content source": an
//! ordered sequence of banner records, typically a JSON document. The
//! reveal core wires only `{id, size}` into grid observation; title,
//! description, variant and image seed pass through to presentation
//! untouched.
//!
//! Loading validates the parts the contract promises: non-empty titles,
//! unique ids, and an image seed wherever the image variant asks for one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::card_grid::CardSlot;
use crate::types::{CardId, CardSize};

// =============================================================================
// Records
// =============================================================================

/// Visual variant of a banner card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerVariant {
    /// Plain card.
    Basic,
    /// Emphasized card (gradient background, heavier border).
    Highlighted,
    /// Card with a seeded image header.
    Image,
}

/// One banner record from the content source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerRecord {
    /// Unique identifier; doubles as the grid's card id.
    pub id: CardId,
    /// Visual variant.
    #[serde(rename = "type")]
    pub variant: BannerVariant,
    /// Card title. Non-empty by contract.
    pub title: String,
    /// Card body text.
    pub description: String,
    /// Seed for the image variant's picture; required only there.
    #[serde(rename = "imageSeed", default, skip_serializing_if = "Option::is_none")]
    pub image_seed: Option<String>,
    /// Size class driving padding and column span.
    pub size: CardSize,
}

impl BannerRecord {
    /// The `{id, size}` pair the grid consumes.
    pub fn card_slot(&self) -> CardSlot {
        CardSlot::new(self.id, self.size)
    }
}

/// Grid slots for a banner sequence, in declared order.
pub fn card_slots(records: &[BannerRecord]) -> Vec<CardSlot> {
    records.iter().map(BannerRecord::card_slot).collect()
}

// =============================================================================
// Errors
// =============================================================================

/// Why a banner document was rejected.
#[derive(Debug)]
pub enum ContentError {
    /// The document is not valid JSON for the banner shape.
    Parse(serde_json::Error),
    /// A record carries an empty title.
    EmptyTitle { id: CardId },
    /// An image-variant record has no image seed.
    MissingImageSeed { id: CardId },
    /// Two records share an id.
    DuplicateId { id: CardId },
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "malformed banner document: {err}"),
            Self::EmptyTitle { id } => write!(f, "banner {id} has an empty title"),
            Self::MissingImageSeed { id } => {
                write!(f, "banner {id} is an image variant without an image seed")
            }
            Self::DuplicateId { id } => write!(f, "banner id {id} appears more than once"),
        }
    }
}

impl std::error::Error for ContentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Parse and validate a banner document.
pub fn load_banners(json: &str) -> Result<Vec<BannerRecord>, ContentError> {
    let records: Vec<BannerRecord> = serde_json::from_str(json)?;
    validate(&records)?;
    Ok(records)
}

/// Validate an already-parsed banner sequence.
pub fn validate(records: &[BannerRecord]) -> Result<(), ContentError> {
    let mut seen = std::collections::HashSet::new();
    for record in records {
        if !seen.insert(record.id) {
            return Err(ContentError::DuplicateId { id: record.id });
        }
        if record.title.trim().is_empty() {
            return Err(ContentError::EmptyTitle { id: record.id });
        }
        if record.variant == BannerVariant::Image && record.image_seed.is_none() {
            return Err(ContentError::MissingImageSeed { id: record.id });
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
