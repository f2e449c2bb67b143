//! Tile grid rows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entity::Entity;
use super::frame::Frame;
use super::id::Id;
use super::project::Project;

/// One cell placement inside a tile grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesGridItem {
    /// The raster frame drawn in the cell.
    pub frame_id: Id<Frame>,
    /// Cell column.
    pub col: u32,
    /// Cell row.
    pub row: u32,
    /// Mirror horizontally.
    pub flip_x: bool,
    /// Mirror vertically.
    pub flip_y: bool,
    /// Stretch the frame to the cell size instead of clipping.
    pub stretch: bool,
    /// Draw order within the cell.
    pub z_index: i32,
    /// Free-form authoring properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl TilesGridItem {
    /// Create an item for a cell.
    pub fn new(frame_id: Id<Frame>, col: u32, row: u32) -> Self {
        Self {
            frame_id,
            col,
            row,
            flip_x: false,
            flip_y: false,
            stretch: false,
            z_index: 0,
            properties: BTreeMap::new(),
        }
    }
}

/// A tile grid: cell geometry, map size, and placed items.
///
/// Items are embedded in the row rather than stored as their own
/// collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesGrid {
    /// Repository-assigned id.
    pub id: Id<TilesGrid>,
    /// Owning project.
    pub project_id: Id<Project>,
    /// Display name.
    pub name: String,
    /// Cell width in pixels.
    pub cell_width: u32,
    /// Cell height in pixels.
    pub cell_height: u32,
    /// Map width in cells.
    pub map_width: u32,
    /// Map height in cells.
    pub map_height: u32,
    /// Placed items.
    pub items: Vec<TilesGridItem>,
}

impl TilesGrid {
    /// Create a grid row with a placeholder id.
    pub fn new(
        project_id: Id<Project>,
        name: impl Into<String>,
        cell: (u32, u32),
        map: (u32, u32),
    ) -> Self {
        Self {
            id: Id::new(0),
            project_id,
            name: name.into(),
            cell_width: cell.0,
            cell_height: cell.1,
            map_width: map.0,
            map_height: map.1,
            items: Vec::new(),
        }
    }
}

impl Entity for TilesGrid {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}

/// The single backdrop raster of a tile grid.
///
/// `name` is the original filename stem; the archive entry name is
/// disambiguated by grid and project ids since several grids may reuse
/// the same filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesGridBackground {
    /// Repository-assigned id.
    pub id: Id<TilesGridBackground>,
    /// Owning grid.
    pub grid_id: Id<TilesGrid>,
    /// Owning project.
    pub project_id: Id<Project>,
    /// Original filename stem.
    pub name: String,
    /// Archive entry carrying the raster bytes, set during export.
    pub filename: Option<String>,
    /// Encoded PNG bytes. Not serialized.
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl TilesGridBackground {
    /// Create a background row with a placeholder id.
    pub fn new(
        grid_id: Id<TilesGrid>,
        project_id: Id<Project>,
        name: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            id: Id::new(0),
            grid_id,
            project_id,
            name: name.into(),
            filename: None,
            data,
        }
    }
}

impl Entity for TilesGridBackground {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}
