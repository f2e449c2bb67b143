//! # spriteloom
//!
//! Project interchange and atlas generation for 2D game authoring.
//!
//! The crate is the engineering core of an authoring tool for raster
//! frames, composable sprites, tile grids, and scenes. It answers two
//! questions:
//!
//! > How does an entire project — a forest of collections plus a dense
//! > web of cross-referencing entities — travel as one portable
//! > archive and come back with full referential integrity?
//!
//! > How do many small raster frames become a few fixed-size atlas
//! > pages without carrying visually-duplicate pixels?
//!
//! ## Architecture
//!
//! ```text
//! ProjectRepo ⇄ ProjectExporter / ProjectImporter ⇄ zip archive
//!      ↓
//! PackExporter → DuplicateEliminator → pack → compose → atlas pages
//!                      ↓ (compare)
//!              perceptual frame diff
//! ```
//!
//! Everything reaches the persistent store through the asynchronous
//! [`store::ProjectRepo`] contract; rendering, UI, and the store
//! implementation itself live outside this crate.
//!
//! ## Guarantees
//!
//! - Export never mutates the source project
//! - Import creates a brand-new project and brand-new ids for every row
//! - Packing the same rectangles yields identical placements every run
//! - Recovered conditions surface as structured diagnostics, not logs

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod atlas;
pub mod compare;
pub mod dedup;
pub mod interchange;
pub mod store;
pub mod types;

// Re-exports
pub use types::{
    AnimationStep, CollisionRect, Diagnostic, Diagnostics, Entity, EntityKind, Frame, GroundPoint,
    Id, Project, RawId, Scene, SceneObject, SceneObjectKind, Sprite, SpriteAnimation, SpriteFrame,
    SpriteLayer, TilesGrid, TilesGridBackground, TilesGridItem, TreeNode,
};
pub use store::{all_rows, InMemoryRepo, Predicate, ProjectRepo, RepoError, Table};
pub use compare::{counts_as_duplicate, diff_count, DUPLICATE_CUTOFF, MAX_YIQ_DISTANCE_SQ, SENSITIVITY};
pub use dedup::{DedupOutcome, DuplicateEliminator, FrameImage};
pub use atlas::{
    compose_page, compose_pages, pack, page_file_name, AtlasEntry, AtlasPage, AtlasRect,
    PackOptions, PackResult, PagedAtlas, Placement, RectSpec,
};
pub use interchange::{
    background_entry_name, frame_entry_name, ArchiveError, ArchiveReader, ArchiveWriter,
    AtlasPageManifest, ExportError, ExportOutput, FramesPackDef, GridPackDef, ImportError,
    ImportReport, LayersGridDef, PackExporter, ProjectExporter, ProjectImporter, ScenePackDef,
    SpriteBundle, SpritePackDef,
};

/// Fixed atlas page bound, in pixel units, for both axes.
pub const MAX_PAGE_DIMENSION: u32 = 6000;
