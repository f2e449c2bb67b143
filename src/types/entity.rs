//! The row contract shared by every entity type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::id::Id;

/// Collection label for an entity type.
///
/// Used in diagnostics and to name archive documents. The two tree
/// collections share the `TreeNode` row type but are distinct
/// collections, so they get distinct kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    /// The project row itself.
    Project,
    /// Frame-tree nodes.
    FrameTreeNode,
    /// Raster frames.
    Frame,
    /// Sprite-tree nodes.
    SpriteTreeNode,
    /// Sprites.
    Sprite,
    /// Per-sprite layers.
    SpriteLayer,
    /// Frame placements inside a layer.
    SpriteFrame,
    /// Named animations.
    SpriteAnimation,
    /// Tile grids.
    TilesGrid,
    /// Tile grid backgrounds.
    TilesGridBackground,
    /// Scenes.
    Scene,
    /// Scene objects.
    SceneObject,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Project => "project",
            Self::FrameTreeNode => "frame-tree-node",
            Self::Frame => "frame",
            Self::SpriteTreeNode => "sprite-tree-node",
            Self::Sprite => "sprite",
            Self::SpriteLayer => "sprite-layer",
            Self::SpriteFrame => "sprite-frame",
            Self::SpriteAnimation => "sprite-animation",
            Self::TilesGrid => "tiles-grid",
            Self::TilesGridBackground => "tiles-grid-bg",
            Self::Scene => "scene",
            Self::SceneObject => "scene-object",
        };
        write!(f, "{}", name)
    }
}

/// A repository row.
///
/// Every entity carries a repository-assigned numeric id; the
/// repository sets it on insert via [`Entity::set_id`].
pub trait Entity:
    Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// The row's id.
    fn id(&self) -> Id<Self>;

    /// Replace the row's id (repository-assigned on insert).
    fn set_id(&mut self, id: Id<Self>);
}
