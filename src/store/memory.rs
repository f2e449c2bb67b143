//! In-memory repository, the reference implementation of the store
//! contract.
//!
//! Backs the test suites and doubles as the reference for cascade
//! semantics. Uses `BTreeMap` tables for deterministic iteration order
//! and a single monotonic id sequence across all collections.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{Predicate, ProjectRepo, RepoError, Table};
use crate::types::{
    Entity, EntityKind, Frame, Id, Project, RawId, Scene, SceneObject, Sprite, SpriteAnimation,
    SpriteFrame, SpriteLayer, TilesGrid, TilesGridBackground, TreeNode,
};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    projects: BTreeMap<i64, Project>,
    frame_tree: BTreeMap<i64, TreeNode>,
    frames: BTreeMap<i64, Frame>,
    sprite_tree: BTreeMap<i64, TreeNode>,
    sprites: BTreeMap<i64, Sprite>,
    sprite_layers: BTreeMap<i64, SpriteLayer>,
    sprite_frames: BTreeMap<i64, SpriteFrame>,
    animations: BTreeMap<i64, SpriteAnimation>,
    grids: BTreeMap<i64, TilesGrid>,
    grid_backgrounds: BTreeMap<i64, TilesGridBackground>,
    scenes: BTreeMap<i64, Scene>,
    scene_objects: BTreeMap<i64, SceneObject>,
}

/// Collect a node and all its descendants in a parent-linked forest.
fn descendants<T>(
    rows: &BTreeMap<i64, T>,
    root: i64,
    parent_of: impl Fn(&T) -> Option<i64>,
) -> BTreeSet<i64> {
    let mut selected = BTreeSet::new();
    selected.insert(root);
    let mut worklist = vec![root];
    while let Some(current) = worklist.pop() {
        for (id, row) in rows {
            if parent_of(row) == Some(current) && selected.insert(*id) {
                worklist.push(*id);
            }
        }
    }
    selected
}

impl Inner {
    fn alloc(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Drop placements of a removed frame and scrub step references to
    /// the dropped placements.
    fn remove_frame(&mut self, id: i64) {
        self.frames.remove(&id);
        let dropped: BTreeSet<i64> = self
            .sprite_frames
            .iter()
            .filter(|(_, sf)| sf.frame_id.raw() == id)
            .map(|(sf_id, _)| *sf_id)
            .collect();
        self.sprite_frames.retain(|sf_id, _| !dropped.contains(sf_id));
        for animation in self.animations.values_mut() {
            for step in &mut animation.steps {
                if step.frame_id.map(|f| dropped.contains(&f.raw())) == Some(true) {
                    step.frame_id = None;
                }
            }
        }
        for grid in self.grids.values_mut() {
            grid.items.retain(|item| item.frame_id.raw() != id);
        }
    }

    fn remove_frame_node(&mut self, id: i64) {
        let nodes = descendants(&self.frame_tree, id, |n| n.parent_id.map(Id::raw));
        self.frame_tree.retain(|node_id, _| !nodes.contains(node_id));
        let owned: Vec<i64> = self
            .frames
            .iter()
            .filter(|(_, f)| f.tree_id.map(|t| nodes.contains(&t.raw())) == Some(true))
            .map(|(frame_id, _)| *frame_id)
            .collect();
        for frame_id in owned {
            self.remove_frame(frame_id);
        }
    }

    fn remove_sprite(&mut self, id: i64) {
        self.sprites.remove(&id);
        self.sprite_layers.retain(|_, l| l.sprite_id.raw() != id);
        self.sprite_frames.retain(|_, sf| sf.sprite_id.raw() != id);
        self.animations.retain(|_, a| a.sprite_id.raw() != id);
    }

    fn remove_sprite_node(&mut self, id: i64) {
        let nodes = descendants(&self.sprite_tree, id, |n| n.parent_id.map(Id::raw));
        self.sprite_tree.retain(|node_id, _| !nodes.contains(node_id));
        let owned: Vec<i64> = self
            .sprites
            .iter()
            .filter(|(_, s)| s.tree_id.map(|t| nodes.contains(&t.raw())) == Some(true))
            .map(|(sprite_id, _)| *sprite_id)
            .collect();
        for sprite_id in owned {
            self.remove_sprite(sprite_id);
        }
    }

    fn remove_layer(&mut self, id: i64) {
        self.sprite_layers.remove(&id);
        self.sprite_frames.retain(|_, sf| sf.layer_id.raw() != id);
        for animation in self.animations.values_mut() {
            animation.steps.retain(|step| step.layer_id.raw() != id);
        }
    }

    fn remove_sprite_frame(&mut self, id: i64) {
        self.sprite_frames.remove(&id);
        for animation in self.animations.values_mut() {
            for step in &mut animation.steps {
                if step.frame_id.map(Id::raw) == Some(id) {
                    step.frame_id = None;
                }
            }
        }
    }

    fn remove_animation(&mut self, id: i64) {
        self.animations.remove(&id);
    }

    fn remove_grid(&mut self, id: i64) {
        self.grids.remove(&id);
        self.grid_backgrounds.retain(|_, bg| bg.grid_id.raw() != id);
    }

    fn remove_grid_background(&mut self, id: i64) {
        self.grid_backgrounds.remove(&id);
    }

    fn remove_scene(&mut self, id: i64) {
        self.scenes.remove(&id);
        self.scene_objects.retain(|_, obj| obj.scene_id.raw() != id);
    }

    fn remove_scene_object(&mut self, id: i64) {
        let objects = descendants(&self.scene_objects, id, |o| o.parent_id.map(Id::raw));
        self.scene_objects.retain(|obj_id, _| !objects.contains(obj_id));
    }

    fn remove_project(&mut self, id: i64) {
        self.projects.remove(&id);
        let frame_nodes: Vec<i64> = self
            .frame_tree
            .iter()
            .filter(|(_, n)| n.project_id.raw() == id && n.parent_id.is_none())
            .map(|(node_id, _)| *node_id)
            .collect();
        for node_id in frame_nodes {
            self.remove_frame_node(node_id);
        }
        let frames: Vec<i64> = self
            .frames
            .iter()
            .filter(|(_, f)| f.project_id.raw() == id)
            .map(|(frame_id, _)| *frame_id)
            .collect();
        for frame_id in frames {
            self.remove_frame(frame_id);
        }
        let sprite_nodes: Vec<i64> = self
            .sprite_tree
            .iter()
            .filter(|(_, n)| n.project_id.raw() == id && n.parent_id.is_none())
            .map(|(node_id, _)| *node_id)
            .collect();
        for node_id in sprite_nodes {
            self.remove_sprite_node(node_id);
        }
        let sprites: Vec<i64> = self
            .sprites
            .iter()
            .filter(|(_, s)| s.project_id.raw() == id)
            .map(|(sprite_id, _)| *sprite_id)
            .collect();
        for sprite_id in sprites {
            self.remove_sprite(sprite_id);
        }
        let grids: Vec<i64> = self
            .grids
            .iter()
            .filter(|(_, g)| g.project_id.raw() == id)
            .map(|(grid_id, _)| *grid_id)
            .collect();
        for grid_id in grids {
            self.remove_grid(grid_id);
        }
        let scenes: Vec<i64> = self
            .scenes
            .iter()
            .filter(|(_, s)| s.project_id.raw() == id)
            .map(|(scene_id, _)| *scene_id)
            .collect();
        for scene_id in scenes {
            self.remove_scene(scene_id);
        }
    }
}

macro_rules! table_view {
    ($view:ident, $entity:ty, $kind:expr, $field:ident, $remove:ident) => {
        #[derive(Clone)]
        struct $view(Arc<RwLock<Inner>>);

        #[async_trait]
        impl Table<$entity> for $view {
            async fn get(&self, id: Id<$entity>) -> Result<Option<$entity>, RepoError> {
                Ok(self.0.read().$field.get(&id.raw()).cloned())
            }

            async fn list(
                &self,
                predicate: Predicate<$entity>,
            ) -> Result<Vec<$entity>, RepoError> {
                Ok(self
                    .0
                    .read()
                    .$field
                    .values()
                    .filter(|row| predicate(row))
                    .cloned()
                    .collect())
            }

            async fn insert(&self, mut row: $entity) -> Result<$entity, RepoError> {
                let mut inner = self.0.write();
                let id = inner.alloc();
                row.set_id(Id::new(id));
                inner.$field.insert(id, row.clone());
                Ok(row)
            }

            async fn update(&self, row: $entity) -> Result<(), RepoError> {
                let mut inner = self.0.write();
                let id = row.id().raw();
                if !inner.$field.contains_key(&id) {
                    return Err(RepoError::NotFound {
                        kind: $kind,
                        id: RawId(id),
                    });
                }
                inner.$field.insert(id, row);
                Ok(())
            }

            async fn remove(&self, id: Id<$entity>) -> Result<(), RepoError> {
                let mut inner = self.0.write();
                if !inner.$field.contains_key(&id.raw()) {
                    return Err(RepoError::NotFound {
                        kind: $kind,
                        id: id.erase(),
                    });
                }
                inner.$remove(id.raw());
                Ok(())
            }
        }
    };
}

table_view!(ProjectsView, Project, EntityKind::Project, projects, remove_project);
table_view!(FrameTreeView, TreeNode, EntityKind::FrameTreeNode, frame_tree, remove_frame_node);
table_view!(FramesView, Frame, EntityKind::Frame, frames, remove_frame);
table_view!(SpriteTreeView, TreeNode, EntityKind::SpriteTreeNode, sprite_tree, remove_sprite_node);
table_view!(SpritesView, Sprite, EntityKind::Sprite, sprites, remove_sprite);
table_view!(SpriteLayersView, SpriteLayer, EntityKind::SpriteLayer, sprite_layers, remove_layer);
table_view!(
    SpriteFramesView,
    SpriteFrame,
    EntityKind::SpriteFrame,
    sprite_frames,
    remove_sprite_frame
);
table_view!(
    AnimationsView,
    SpriteAnimation,
    EntityKind::SpriteAnimation,
    animations,
    remove_animation
);
table_view!(GridsView, TilesGrid, EntityKind::TilesGrid, grids, remove_grid);
table_view!(
    GridBackgroundsView,
    TilesGridBackground,
    EntityKind::TilesGridBackground,
    grid_backgrounds,
    remove_grid_background
);
table_view!(ScenesView, Scene, EntityKind::Scene, scenes, remove_scene);
table_view!(
    SceneObjectsView,
    SceneObject,
    EntityKind::SceneObject,
    scene_objects,
    remove_scene_object
);

/// In-memory repository.
pub struct InMemoryRepo {
    projects: ProjectsView,
    frame_tree: FrameTreeView,
    frames: FramesView,
    sprite_tree: SpriteTreeView,
    sprites: SpritesView,
    sprite_layers: SpriteLayersView,
    sprite_frames: SpriteFramesView,
    animations: AnimationsView,
    grids: GridsView,
    grid_backgrounds: GridBackgroundsView,
    scenes: ScenesView,
    scene_objects: SceneObjectsView,
}

impl InMemoryRepo {
    /// Create an empty repository.
    pub fn new() -> Self {
        let inner = Arc::new(RwLock::new(Inner::default()));
        Self {
            projects: ProjectsView(inner.clone()),
            frame_tree: FrameTreeView(inner.clone()),
            frames: FramesView(inner.clone()),
            sprite_tree: SpriteTreeView(inner.clone()),
            sprites: SpritesView(inner.clone()),
            sprite_layers: SpriteLayersView(inner.clone()),
            sprite_frames: SpriteFramesView(inner.clone()),
            animations: AnimationsView(inner.clone()),
            grids: GridsView(inner.clone()),
            grid_backgrounds: GridBackgroundsView(inner.clone()),
            scenes: ScenesView(inner.clone()),
            scene_objects: SceneObjectsView(inner),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectRepo for InMemoryRepo {
    fn projects(&self) -> &dyn Table<Project> {
        &self.projects
    }

    fn frame_tree(&self) -> &dyn Table<TreeNode> {
        &self.frame_tree
    }

    fn frames(&self) -> &dyn Table<Frame> {
        &self.frames
    }

    fn sprite_tree(&self) -> &dyn Table<TreeNode> {
        &self.sprite_tree
    }

    fn sprites(&self) -> &dyn Table<Sprite> {
        &self.sprites
    }

    fn sprite_layers(&self) -> &dyn Table<SpriteLayer> {
        &self.sprite_layers
    }

    fn sprite_frames(&self) -> &dyn Table<SpriteFrame> {
        &self.sprite_frames
    }

    fn animations(&self) -> &dyn Table<SpriteAnimation> {
        &self.animations
    }

    fn grids(&self) -> &dyn Table<TilesGrid> {
        &self.grids
    }

    fn grid_backgrounds(&self) -> &dyn Table<TilesGridBackground> {
        &self.grid_backgrounds
    }

    fn scenes(&self) -> &dyn Table<Scene> {
        &self.scenes
    }

    fn scene_objects(&self) -> &dyn Table<SceneObject> {
        &self.scene_objects
    }
}
