//! Entity repository contract.
//!
//! The persistent store used during authoring is an external
//! collaborator; this module defines the typed asynchronous contract it
//! is consumed through. [`Table`] is the per-entity-type surface
//! (`get`/`list`/`insert`/`update`/`remove`), [`ProjectRepo`] exposes
//! one typed table per collection. Implementations must guarantee
//! deterministic ordering of `list` results.

pub mod memory;

use async_trait::async_trait;

use crate::types::{
    Entity, EntityKind, Frame, Id, Project, RawId, Scene, SceneObject, Sprite, SpriteAnimation,
    SpriteFrame, SpriteLayer, TilesGrid, TilesGridBackground, TreeNode,
};

/// Error raised by the underlying store and propagated unchanged.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepoError {
    /// The addressed row does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Collection of the missing row.
        kind: EntityKind,
        /// Id of the missing row.
        id: RawId,
    },
    /// The backend rejected the operation.
    #[error("repository backend error: {0}")]
    Backend(String),
}

/// Row filter passed to [`Table::list`].
pub type Predicate<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// A predicate matching every row.
pub fn all_rows<E: Entity>() -> Predicate<E> {
    Box::new(|_| true)
}

/// One typed collection of the repository.
///
/// All methods are async to support database-backed implementations;
/// rows are committed individually (`insert` returns the row with its
/// repository-assigned id). `remove` applies the repository's cascade
/// rules.
#[async_trait]
pub trait Table<E: Entity>: Send + Sync {
    /// Fetch a row by id.
    async fn get(&self, id: Id<E>) -> Result<Option<E>, RepoError>;

    /// Fetch all rows matching the predicate, ordered by id.
    async fn list(&self, predicate: Predicate<E>) -> Result<Vec<E>, RepoError>;

    /// Insert a row, returning it with its assigned id.
    async fn insert(&self, row: E) -> Result<E, RepoError>;

    /// Replace an existing row.
    async fn update(&self, row: E) -> Result<(), RepoError>;

    /// Remove a row and everything cascading from it.
    async fn remove(&self, id: Id<E>) -> Result<(), RepoError>;
}

/// The full repository: one typed table per collection.
///
/// The frame tree and the sprite tree are independent collections that
/// share the [`TreeNode`] row type.
pub trait ProjectRepo: Send + Sync {
    /// Project rows.
    fn projects(&self) -> &dyn Table<Project>;
    /// Frame-tree nodes.
    fn frame_tree(&self) -> &dyn Table<TreeNode>;
    /// Raster frames.
    fn frames(&self) -> &dyn Table<Frame>;
    /// Sprite-tree nodes.
    fn sprite_tree(&self) -> &dyn Table<TreeNode>;
    /// Sprites.
    fn sprites(&self) -> &dyn Table<Sprite>;
    /// Sprite layers.
    fn sprite_layers(&self) -> &dyn Table<SpriteLayer>;
    /// Frame placements.
    fn sprite_frames(&self) -> &dyn Table<SpriteFrame>;
    /// Animations.
    fn animations(&self) -> &dyn Table<SpriteAnimation>;
    /// Tile grids.
    fn grids(&self) -> &dyn Table<TilesGrid>;
    /// Tile grid backgrounds.
    fn grid_backgrounds(&self) -> &dyn Table<TilesGridBackground>;
    /// Scenes.
    fn scenes(&self) -> &dyn Table<Scene>;
    /// Scene objects.
    fn scene_objects(&self) -> &dyn Table<SceneObject>;
}

pub use memory::InMemoryRepo;
