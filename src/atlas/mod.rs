//! Atlas generation: rectangle packing and page composition.
//!
//! Consolidates many small raster images into one or more fixed-size
//! atlas pages:
//!
//! 1. **Pack**: place axis-aligned rectangles in a growing binary tree
//! 2. **Compose**: blit placed sources onto a page canvas
//! 3. **Page**: repeat over the unplaced residual until empty
//!
//! ## Core Contract
//!
//! The same rectangle list and page bound always produce identical
//! placements; unplaceable rectangles surface as data, never as
//! errors.
//!
//! ```text
//! RectSpecs → pack → PackResult → compose_page → AtlasPage
//!                 ↘ unplaced residual → next page
//! ```

pub mod compositor;
pub mod packer;
pub mod pages;

pub use compositor::{compose_page, AtlasEntry, AtlasRect};
pub use packer::{pack, PackOptions, PackResult, Placement, RectSpec};
pub use pages::{compose_pages, page_file_name, AtlasPage, PagedAtlas};
