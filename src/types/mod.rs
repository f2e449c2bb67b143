//! Typed entity rows and identifiers.

pub mod diagnostics;
pub mod entity;
pub mod frame;
pub mod grid;
pub mod id;
pub mod project;
pub mod scene;
pub mod sprite;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use entity::{Entity, EntityKind};
pub use frame::Frame;
pub use grid::{TilesGrid, TilesGridBackground, TilesGridItem};
pub use id::{Id, RawId};
pub use project::{Project, TreeNode};
pub use scene::{Scene, SceneObject, SceneObjectKind};
pub use sprite::{
    AnimationStep, CollisionRect, GroundPoint, Sprite, SpriteAnimation, SpriteFrame, SpriteLayer,
};
