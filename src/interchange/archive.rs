//! Zip container I/O for project interchange.
//!
//! Archives are built and read entirely in memory over
//! `Cursor<Vec<u8>>`; entry names are fixed contract strings shared
//! with previously exported archives.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Cursor, Read, Write};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::types::{Frame, Id, Project, TilesGrid};

/// Fixed archive entry names.
pub mod entries {
    /// Project document.
    pub const PROJECTS: &str = "projects.json";
    /// Frame-tree nodes document.
    pub const FRAMES_TREE: &str = "frames-tree.json";
    /// Frames document.
    pub const FRAMES: &str = "frames.json";
    /// Sprite-tree nodes document.
    pub const SPRITES_TREE: &str = "sprites-tree.json";
    /// Sprites document.
    pub const SPRITES: &str = "sprites.json";
    /// Sprite layers document.
    pub const SPRITES_LAYERS: &str = "sprites-layers.json";
    /// Sprite frame placements document.
    pub const SPRITES_FRAMES: &str = "sprites-frames.json";
    /// Sprite animations document.
    pub const SPRITES_ANIMATIONS: &str = "sprites-animations.json";
    /// Tile grids document.
    pub const TILES_GRID: &str = "tiles-grid.json";
    /// Tile grid backgrounds document.
    pub const TILES_GRID_BG: &str = "tiles-grid-bg.json";
    /// Scenes document.
    pub const SCENES: &str = "scenes.json";
    /// Scene objects document.
    pub const SCENES_OBJECTS: &str = "scenes-objects.json";

    /// Sprite pack definition.
    pub const SPRITE_DEF: &str = "sprite-def.json";
    /// Scene pack definition.
    pub const SCENE_DEF: &str = "scene-def.json";
    /// Grid pack definition.
    pub const GRID_DEF: &str = "grid-def.json";
    /// Frames pack definition.
    pub const FRAMES_DEF: &str = "frames-def.json";
    /// Grid-layers pack definition.
    pub const LAYERS_GRID_DEF: &str = "layers-grid-def.json";
}

/// Archive entry holding a frame's raster bytes.
pub fn frame_entry_name(id: Id<Frame>) -> String {
    format!("{id}.png")
}

/// Archive entry holding a grid background's raster bytes.
///
/// Disambiguated by grid and project ids since several grids may reuse
/// the same original filename.
pub fn background_entry_name(name: &str, grid: Id<TilesGrid>, project: Id<Project>) -> String {
    format!("{name}-{grid}x{project}.png")
}

/// Archive container failure.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The container failed to open, append, or finalize.
    #[error("archive container: {0}")]
    Container(#[from] ZipError),
    /// An entry's bytes failed to read or write.
    #[error("archive entry {name}: {message}")]
    Entry {
        /// Entry name.
        name: String,
        /// Underlying I/O failure.
        message: String,
    },
    /// An entry held malformed JSON.
    #[error("archive entry {name}: {source}")]
    Json {
        /// Entry name.
        name: String,
        /// Parse or encode failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Builds an archive in memory.
pub struct ArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl ArchiveWriter {
    /// Start an empty archive.
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Append a JSON document entry.
    pub fn write_json<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), ArchiveError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| ArchiveError::Json {
            name: name.to_string(),
            source,
        })?;
        self.write_bytes(name, &bytes)
    }

    /// Append a binary entry.
    pub fn write_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip.start_file(name, options)?;
        self.zip
            .write_all(bytes)
            .map_err(|e| ArchiveError::Entry {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    /// Finalize and return the archive bytes.
    pub fn finish(self) -> Result<Vec<u8>, ArchiveError> {
        Ok(self.zip.finish()?.into_inner())
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads entries from archive bytes.
pub struct ArchiveReader {
    zip: ZipArchive<Cursor<Vec<u8>>>,
}

impl ArchiveReader {
    /// Open an archive from its bytes.
    pub fn open(bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        Ok(Self {
            zip: ZipArchive::new(Cursor::new(bytes))?,
        })
    }

    /// Read a JSON document entry; `None` when the entry is absent.
    pub fn read_json<T: DeserializeOwned>(
        &mut self,
        name: &str,
    ) -> Result<Option<T>, ArchiveError> {
        let Some(bytes) = self.read_bytes(name)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| ArchiveError::Json {
                name: name.to_string(),
                source,
            })
    }

    /// Read a binary entry; `None` when the entry is absent.
    pub fn read_bytes(&mut self, name: &str) -> Result<Option<Vec<u8>>, ArchiveError> {
        let mut file = match self.zip.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| ArchiveError::Entry {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        Ok(Some(bytes))
    }
}
