//! Scene rows.

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::id::{Id, RawId};
use super::project::Project;

/// A scene: a stage with dimensions and a forest of placed actors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Repository-assigned id.
    pub id: Id<Scene>,
    /// Owning project.
    pub project_id: Id<Project>,
    /// Display name.
    pub name: String,
    /// Stage width in pixels.
    pub width: u32,
    /// Stage height in pixels.
    pub height: u32,
}

impl Scene {
    /// Create a scene row with a placeholder id.
    pub fn new(project_id: Id<Project>, name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: Id::new(0),
            project_id,
            name: name.into(),
            width,
            height,
        }
    }
}

impl Entity for Scene {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}

/// What a scene object is, which also decides what `reference_id`
/// points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SceneObjectKind {
    /// Container layer for sprite actors.
    LayerSprites,
    /// A sprite actor; `reference_id` names the sprite.
    Sprite,
    /// Container layer for ground pieces.
    LayerGround,
    /// A ground piece; `reference_id` names a raster frame.
    Ground,
    /// A tile-grid layer; `reference_id` names the grid.
    LayerGrid,
    /// Container layer for event markers.
    LayerEvents,
    /// An event marker.
    Event,
}

impl SceneObjectKind {
    /// Whether objects of this kind must carry a resolvable
    /// `reference_id` to be meaningful.
    pub fn requires_reference(self) -> bool {
        matches!(self, Self::Sprite | Self::Ground | Self::LayerGrid)
    }
}

/// A node of a scene's actor forest.
///
/// `reference_id` is typed by `kind` (sprite, ground frame, or tile
/// grid); `animation_id` optionally picks the animation a sprite actor
/// plays. Forests are acyclic; sibling order is the `order` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    /// Repository-assigned id.
    pub id: Id<SceneObject>,
    /// Owning scene.
    pub scene_id: Id<Scene>,
    /// Parent object, `None` for roots.
    pub parent_id: Option<Id<SceneObject>>,
    /// Object kind.
    pub kind: SceneObjectKind,
    /// Kind-dependent reference (see [`SceneObjectKind`]).
    pub reference_id: Option<RawId>,
    /// Animation played by a sprite actor.
    pub animation_id: Option<RawId>,
    /// Horizontal placement.
    pub x: i32,
    /// Vertical placement.
    pub y: i32,
    /// Sibling order.
    pub order: i32,
}

impl SceneObject {
    /// Create a root object with a placeholder id.
    pub fn new(scene_id: Id<Scene>, kind: SceneObjectKind) -> Self {
        Self {
            id: Id::new(0),
            scene_id,
            parent_id: None,
            kind,
            reference_id: None,
            animation_id: None,
            x: 0,
            y: 0,
            order: 0,
        }
    }

    /// Attach under a parent object.
    pub fn under(mut self, parent_id: Id<SceneObject>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the kind-dependent reference.
    pub fn referencing(mut self, reference: RawId) -> Self {
        self.reference_id = Some(reference);
        self
    }

    /// Position the object.
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

impl Entity for SceneObject {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}
