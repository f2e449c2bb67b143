//! Raster frame rows.

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::id::Id;
use super::project::{Project, TreeNode};

/// A raster asset: PNG bytes plus pixel dimensions and tree placement.
///
/// `data` holds the encoded PNG and never travels through the JSON
/// documents; during export it is written as a separate archive entry
/// and `filename` records the entry name for the importer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Repository-assigned id.
    pub id: Id<Frame>,
    /// Owning project.
    pub project_id: Id<Project>,
    /// Placement in the frame tree, `None` for top-level frames.
    pub tree_id: Option<Id<TreeNode>>,
    /// Display name.
    pub name: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Archive entry carrying the raster bytes, set during export.
    pub filename: Option<String>,
    /// Encoded PNG bytes. Not serialized.
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Frame {
    /// Create a frame row with a placeholder id.
    pub fn new(
        project_id: Id<Project>,
        name: impl Into<String>,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> Self {
        Self {
            id: Id::new(0),
            project_id,
            tree_id: None,
            name: name.into(),
            width,
            height,
            filename: None,
            data,
        }
    }

    /// Place the frame under a tree node.
    pub fn under(mut self, tree_id: Id<TreeNode>) -> Self {
        self.tree_id = Some(tree_id);
        self
    }
}

impl Entity for Frame {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}
