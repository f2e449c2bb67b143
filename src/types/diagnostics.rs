//! Structured skip/recovery diagnostics.
//!
//! Import, export, and atlas generation recover from bad references by
//! nulling fields, skipping rows, or leaving rectangles unplaced. Each
//! recovery is recorded as a [`Diagnostic`] and returned beside the
//! primary result so callers and tests can assert on it directly,
//! instead of only being written to a log stream.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entity::EntityKind;
use super::id::RawId;

/// One recovered condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Diagnostic {
    /// An optional foreign key could not be remapped; the field was
    /// nulled and the row imported.
    #[serde(rename_all = "camelCase")]
    ReferenceNulled {
        /// Collection the row belongs to.
        entity: EntityKind,
        /// Archive-local id of the row.
        row: RawId,
        /// Name of the nulled field.
        field: String,
    },
    /// A required foreign key could not be remapped; the row was
    /// skipped entirely.
    #[serde(rename_all = "camelCase")]
    RowSkipped {
        /// Collection the row belongs to.
        entity: EntityKind,
        /// Archive-local id of the row.
        row: RawId,
        /// Name of the unresolved field.
        field: String,
    },
    /// A referenced binary entry was absent from the archive; the
    /// owning row was skipped.
    #[serde(rename_all = "camelCase")]
    AssetMissing {
        /// Collection the row belongs to.
        entity: EntityKind,
        /// Archive-local id of the row.
        row: RawId,
        /// The missing entry name.
        entry: String,
    },
    /// A tree or scene-object row was never reached from a root
    /// (dangling parent or cycle); it was skipped.
    #[serde(rename_all = "camelCase")]
    Unreachable {
        /// Collection the row belongs to.
        entity: EntityKind,
        /// Archive-local id of the row.
        row: RawId,
    },
    /// An animation step referenced a layer that was not imported;
    /// the step was dropped from the sequence.
    #[serde(rename_all = "camelCase")]
    StepDropped {
        /// Archive-local id of the animation.
        animation: RawId,
        /// Index of the dropped step.
        index: usize,
    },
    /// A grid item referenced a frame that was not imported; the item
    /// was dropped from the grid.
    #[serde(rename_all = "camelCase")]
    ItemDropped {
        /// Archive-local id of the grid.
        grid: RawId,
        /// Index of the dropped item.
        index: usize,
    },
    /// A rectangle exceeded the page bound and can never be placed.
    #[serde(rename_all = "camelCase")]
    RectUnplaced {
        /// Id of the source image.
        source: RawId,
        /// Rectangle width.
        width: u32,
        /// Rectangle height.
        height: u32,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReferenceNulled { entity, row, field } => {
                write!(f, "{} {}: unresolved {}, field nulled", entity, row, field)
            }
            Self::RowSkipped { entity, row, field } => {
                write!(f, "{} {}: unresolved {}, row skipped", entity, row, field)
            }
            Self::AssetMissing { entity, row, entry } => {
                write!(f, "{} {}: archive entry {} missing, row skipped", entity, row, entry)
            }
            Self::Unreachable { entity, row } => {
                write!(f, "{} {}: unreachable from any root, skipped", entity, row)
            }
            Self::StepDropped { animation, index } => {
                write!(f, "animation {}: step {} dropped, layer unresolved", animation, index)
            }
            Self::ItemDropped { grid, index } => {
                write!(f, "grid {}: item {} dropped, frame unresolved", grid, index)
            }
            Self::RectUnplaced { source, width, height } => {
                write!(f, "rect {} ({}x{}): exceeds page bound, unplaced", source, width, height)
            }
        }
    }
}

/// An append-only diagnostic list that mirrors every record to the log.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(diagnostic = %diagnostic, "recovered");
        self.entries.push(diagnostic);
    }

    /// All recorded diagnostics, in order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Consume into the underlying vector.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        for d in iter {
            self.record(d);
        }
    }
}
