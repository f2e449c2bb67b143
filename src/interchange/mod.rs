//! Project interchange: archive container, export, and import.
//!
//! A project travels as a zip archive of JSON documents plus binary
//! raster entries. Export walks the entity graph through the
//! repository contract and packages it; import reconstructs the graph
//! in dependency order, rewriting every foreign key through per-session
//! id-remap tables.
//!
//! ```text
//! ProjectRepo → ProjectExporter → archive bytes → ProjectImporter → ProjectRepo
//!                     ↓                                  ↓
//!               diagnostics                        new ids + diagnostics
//! ```
//!
//! The atlas "pack" variants add a raster pipeline in front of the
//! archive: duplicate elimination, rectangle packing, and page
//! composition.

pub mod archive;
pub mod export;
pub mod import;
pub mod pack_export;

pub use archive::{
    background_entry_name, entries, frame_entry_name, ArchiveError, ArchiveReader, ArchiveWriter,
};
pub use export::{ExportError, ExportOutput, ProjectExporter};
pub use import::{ImportError, ImportReport, ProjectImporter};
pub use pack_export::{
    AtlasPageManifest, FramesPackDef, GridPackDef, LayersGridDef, PackExporter, ScenePackDef,
    SpriteBundle, SpritePackDef,
};
