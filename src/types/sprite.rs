//! Sprite rows: sprites, layers, frame placements, animations.

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::frame::Frame;
use super::id::Id;
use super::project::{Project, TreeNode};

/// A composable sprite: an ordered stack of layers holding frame
/// placements, plus named animations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprite {
    /// Repository-assigned id.
    pub id: Id<Sprite>,
    /// Owning project.
    pub project_id: Id<Project>,
    /// Placement in the sprite tree, `None` for top-level sprites.
    pub tree_id: Option<Id<TreeNode>>,
    /// Display name.
    pub name: String,
}

impl Sprite {
    /// Create a sprite row with a placeholder id.
    pub fn new(project_id: Id<Project>, name: impl Into<String>) -> Self {
        Self {
            id: Id::new(0),
            project_id,
            tree_id: None,
            name: name.into(),
        }
    }
}

impl Entity for Sprite {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}

/// An ordered layer of a sprite with flip flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteLayer {
    /// Repository-assigned id.
    pub id: Id<SpriteLayer>,
    /// Owning sprite.
    pub sprite_id: Id<Sprite>,
    /// Display name.
    pub name: String,
    /// Stacking order within the sprite.
    pub order: i32,
    /// Mirror horizontally.
    pub flip_x: bool,
    /// Mirror vertically.
    pub flip_y: bool,
}

impl SpriteLayer {
    /// Create a layer row with a placeholder id.
    pub fn new(sprite_id: Id<Sprite>, name: impl Into<String>, order: i32) -> Self {
        Self {
            id: Id::new(0),
            sprite_id,
            name: name.into(),
            order,
            flip_x: false,
            flip_y: false,
        }
    }
}

impl Entity for SpriteLayer {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}

/// One placement of a raster frame inside a sprite layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteFrame {
    /// Repository-assigned id.
    pub id: Id<SpriteFrame>,
    /// Owning sprite.
    pub sprite_id: Id<Sprite>,
    /// Layer the placement lives on.
    pub layer_id: Id<SpriteLayer>,
    /// The placed raster frame.
    pub frame_id: Id<Frame>,
    /// Horizontal offset within the sprite.
    pub x: i32,
    /// Vertical offset within the sprite.
    pub y: i32,
    /// Draw order within the layer.
    pub z_index: i32,
    /// Whether the placement is drawn.
    pub visible: bool,
}

impl SpriteFrame {
    /// Create a placement row with a placeholder id.
    pub fn new(sprite_id: Id<Sprite>, layer_id: Id<SpriteLayer>, frame_id: Id<Frame>) -> Self {
        Self {
            id: Id::new(0),
            sprite_id,
            layer_id,
            frame_id,
            x: 0,
            y: 0,
            z_index: 0,
            visible: true,
        }
    }

    /// Position the placement.
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

impl Entity for SpriteFrame {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}

/// A point in sprite-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundPoint {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

/// An axis-aligned rectangle in sprite-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// One step of an animation: which layer shows for how long.
///
/// The layer reference is required; the optional frame reference pins
/// a specific placement for tooling that scrubs by placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationStep {
    /// Layer shown during this step.
    pub layer_id: Id<SpriteLayer>,
    /// Optional placement highlighted during this step.
    pub frame_id: Option<Id<SpriteFrame>>,
    /// Step duration in milliseconds.
    pub duration_ms: u32,
}

/// A named, ordered animation over a sprite's layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteAnimation {
    /// Repository-assigned id.
    pub id: Id<SpriteAnimation>,
    /// Owning sprite.
    pub sprite_id: Id<Sprite>,
    /// Display name.
    pub name: String,
    /// Ordered steps.
    pub steps: Vec<AnimationStep>,
    /// Optional ground contact point.
    pub ground: Option<GroundPoint>,
    /// Optional collision rectangle.
    pub collision: Option<CollisionRect>,
}

impl SpriteAnimation {
    /// Create an animation row with a placeholder id.
    pub fn new(sprite_id: Id<Sprite>, name: impl Into<String>) -> Self {
        Self {
            id: Id::new(0),
            sprite_id,
            name: name.into(),
            steps: Vec::new(),
            ground: None,
            collision: None,
        }
    }
}

impl Entity for SpriteAnimation {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}
