//! Entity graph import.
//!
//! Reads an archive and reconstructs its entity graph in a fixed
//! dependency order, so each stage only needs id-remap tables already
//! populated by earlier stages. Every import creates a brand-new
//! project and brand-new ids; no id from the archive survives into the
//! destination repository.
//!
//! ## Stage order
//!
//! 1. frame-tree nodes (parent before children)
//! 2. frames
//! 3. sprite-tree nodes
//! 4. sprites
//! 5. sprite layers
//! 6. sprite frame placements
//! 7. animations
//! 8. tile grids
//! 9. grid backgrounds
//! 10. scenes
//! 11. scene objects (parent before children)
//!
//! ## Recovery
//!
//! Unresolved optional references are nulled, unresolved required
//! references skip the row, missing binary entries skip the owning
//! row; each recovery lands in the report's diagnostics. Rows are
//! committed individually and never rolled back: archives may
//! originate from a different, evolving schema revision, so a later
//! failure keeps the rows already imported.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::archive::{background_entry_name, entries, frame_entry_name, ArchiveError, ArchiveReader};
use crate::store::{ProjectRepo, RepoError, Table};
use crate::types::{
    Diagnostic, Diagnostics, EntityKind, Frame, Id, Project, Scene, SceneObject, SceneObjectKind,
    Sprite, SpriteAnimation, SpriteFrame, SpriteLayer, TilesGrid, TilesGridBackground, TreeNode,
};

/// Import failure. Only fatal conditions surface here; everything
/// recoverable lands in [`ImportReport::diagnostics`].
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The archive carries no top-level project document.
    #[error("archive has no project manifest")]
    MissingProject,
    /// The archive container is unreadable.
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    /// The repository rejected an operation; remaining stages abort,
    /// already-committed rows stay.
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A finished import.
#[derive(Debug)]
pub struct ImportReport {
    /// Id of the freshly created project.
    pub project_id: Id<Project>,
    /// Every recovery applied along the way.
    pub diagnostics: Vec<Diagnostic>,
}

/// Marker for a required reference that cannot be mapped.
struct Unresolved;

/// Per-import id-remap state.
///
/// One table per entity collection, mapping archive-local ids to the
/// ids assigned by the destination repository. Session-scoped so
/// concurrent imports into different repositories never interfere.
#[derive(Debug, Default)]
struct ImportSession {
    frame_nodes: BTreeMap<Id<TreeNode>, Id<TreeNode>>,
    frames: BTreeMap<Id<Frame>, Id<Frame>>,
    sprite_nodes: BTreeMap<Id<TreeNode>, Id<TreeNode>>,
    sprites: BTreeMap<Id<Sprite>, Id<Sprite>>,
    layers: BTreeMap<Id<SpriteLayer>, Id<SpriteLayer>>,
    sprite_frames: BTreeMap<Id<SpriteFrame>, Id<SpriteFrame>>,
    animations: BTreeMap<Id<SpriteAnimation>, Id<SpriteAnimation>>,
    grids: BTreeMap<Id<TilesGrid>, Id<TilesGrid>>,
    scenes: BTreeMap<Id<Scene>, Id<Scene>>,
    scene_objects: BTreeMap<Id<SceneObject>, Id<SceneObject>>,
    diagnostics: Diagnostics,
}

/// Reconstructs a project from archive bytes.
pub struct ProjectImporter<R: ProjectRepo> {
    repo: Arc<R>,
}

impl<R: ProjectRepo> ProjectImporter<R> {
    /// Create an importer over a repository.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Import an archive, returning the new project id and the
    /// recovery diagnostics.
    pub async fn import_project(&self, bytes: Vec<u8>) -> Result<ImportReport, ImportError> {
        let mut reader = ArchiveReader::open(bytes)?;

        let projects: Vec<Project> = reader.read_json(entries::PROJECTS)?.unwrap_or_default();
        let Some(source_project) = projects.into_iter().next() else {
            return Err(ImportError::MissingProject);
        };

        let project = self
            .repo
            .projects()
            .insert(Project::new(source_project.name))
            .await?;
        tracing::debug!(project = %project.id, "importing into new project");

        let mut session = ImportSession::default();

        self.import_tree(
            &mut reader,
            entries::FRAMES_TREE,
            EntityKind::FrameTreeNode,
            self.repo.frame_tree(),
            project.id,
            &mut session,
            true,
        )
        .await?;
        self.import_frames(&mut reader, project.id, &mut session).await?;
        self.import_tree(
            &mut reader,
            entries::SPRITES_TREE,
            EntityKind::SpriteTreeNode,
            self.repo.sprite_tree(),
            project.id,
            &mut session,
            false,
        )
        .await?;
        self.import_sprites(&mut reader, project.id, &mut session).await?;
        self.import_layers(&mut reader, &mut session).await?;
        self.import_sprite_frames(&mut reader, &mut session).await?;
        self.import_animations(&mut reader, &mut session).await?;
        self.import_grids(&mut reader, project.id, &mut session).await?;
        self.import_backgrounds(&mut reader, project.id, &mut session).await?;
        self.import_scenes(&mut reader, project.id, &mut session).await?;
        self.import_scene_objects(&mut reader, &mut session).await?;

        tracing::debug!(
            project = %project.id,
            diagnostics = session.diagnostics.len(),
            "import finished"
        );

        Ok(ImportReport {
            project_id: project.id,
            diagnostics: session.diagnostics.into_vec(),
        })
    }

    /// Import one tree collection depth-first, parents before
    /// children. Nodes never reached from a root (dangling parent or
    /// cycle) are skipped.
    #[allow(clippy::too_many_arguments)]
    async fn import_tree(
        &self,
        reader: &mut ArchiveReader,
        entry: &str,
        kind: EntityKind,
        table: &dyn Table<TreeNode>,
        project_id: Id<Project>,
        session: &mut ImportSession,
        frame_tree: bool,
    ) -> Result<(), ImportError> {
        let rows: Vec<TreeNode> = reader.read_json(entry)?.unwrap_or_default();

        let mut children: BTreeMap<Id<TreeNode>, Vec<&TreeNode>> = BTreeMap::new();
        let mut roots: Vec<&TreeNode> = Vec::new();
        for row in &rows {
            match row.parent_id {
                Some(parent) => children.entry(parent).or_default().push(row),
                None => roots.push(row),
            }
        }
        let by_position = |a: &&TreeNode, b: &&TreeNode| (a.order, a.id).cmp(&(b.order, b.id));
        roots.sort_by(by_position);
        for siblings in children.values_mut() {
            siblings.sort_by(by_position);
        }

        let remap = if frame_tree {
            &mut session.frame_nodes
        } else {
            &mut session.sprite_nodes
        };

        let mut visited: BTreeSet<Id<TreeNode>> = BTreeSet::new();
        let mut worklist: Vec<&TreeNode> = roots.into_iter().rev().collect();
        while let Some(row) = worklist.pop() {
            if !visited.insert(row.id) {
                continue;
            }

            let mut fresh = row.clone();
            fresh.project_id = project_id;
            fresh.parent_id = row.parent_id.and_then(|old| remap.get(&old).copied());
            let inserted = table.insert(fresh).await.map_err(ImportError::Repo)?;
            remap.insert(row.id, inserted.id);

            if let Some(kids) = children.get(&row.id) {
                for kid in kids.iter().rev() {
                    worklist.push(*kid);
                }
            }
        }

        for row in &rows {
            if !visited.contains(&row.id) {
                session.diagnostics.record(Diagnostic::Unreachable {
                    entity: kind,
                    row: row.id.erase(),
                });
            }
        }

        Ok(())
    }

    async fn import_frames(
        &self,
        reader: &mut ArchiveReader,
        project_id: Id<Project>,
        session: &mut ImportSession,
    ) -> Result<(), ImportError> {
        let rows: Vec<Frame> = reader.read_json(entries::FRAMES)?.unwrap_or_default();
        for row in rows {
            let entry = row
                .filename
                .clone()
                .unwrap_or_else(|| frame_entry_name(row.id));
            let Some(data) = reader.read_bytes(&entry)? else {
                session.diagnostics.record(Diagnostic::AssetMissing {
                    entity: EntityKind::Frame,
                    row: row.id.erase(),
                    entry,
                });
                continue;
            };

            let tree_id = match row.tree_id {
                None => None,
                Some(old) => match session.frame_nodes.get(&old) {
                    Some(new) => Some(*new),
                    None => {
                        session.diagnostics.record(Diagnostic::ReferenceNulled {
                            entity: EntityKind::Frame,
                            row: row.id.erase(),
                            field: "treeId".to_string(),
                        });
                        None
                    }
                },
            };

            let mut fresh = row.clone();
            fresh.project_id = project_id;
            fresh.tree_id = tree_id;
            fresh.filename = None;
            fresh.data = data;
            let inserted = self.repo.frames().insert(fresh).await?;
            session.frames.insert(row.id, inserted.id);
        }
        Ok(())
    }

    async fn import_sprites(
        &self,
        reader: &mut ArchiveReader,
        project_id: Id<Project>,
        session: &mut ImportSession,
    ) -> Result<(), ImportError> {
        let rows: Vec<Sprite> = reader.read_json(entries::SPRITES)?.unwrap_or_default();
        for row in rows {
            let tree_id = match row.tree_id {
                None => None,
                Some(old) => match session.sprite_nodes.get(&old) {
                    Some(new) => Some(*new),
                    None => {
                        session.diagnostics.record(Diagnostic::ReferenceNulled {
                            entity: EntityKind::Sprite,
                            row: row.id.erase(),
                            field: "treeId".to_string(),
                        });
                        None
                    }
                },
            };

            let mut fresh = row.clone();
            fresh.project_id = project_id;
            fresh.tree_id = tree_id;
            let inserted = self.repo.sprites().insert(fresh).await?;
            session.sprites.insert(row.id, inserted.id);
        }
        Ok(())
    }

    async fn import_layers(
        &self,
        reader: &mut ArchiveReader,
        session: &mut ImportSession,
    ) -> Result<(), ImportError> {
        let rows: Vec<SpriteLayer> = reader.read_json(entries::SPRITES_LAYERS)?.unwrap_or_default();
        for row in rows {
            let Some(sprite_id) = session.sprites.get(&row.sprite_id).copied() else {
                session.diagnostics.record(Diagnostic::RowSkipped {
                    entity: EntityKind::SpriteLayer,
                    row: row.id.erase(),
                    field: "spriteId".to_string(),
                });
                continue;
            };

            let mut fresh = row.clone();
            fresh.sprite_id = sprite_id;
            let inserted = self.repo.sprite_layers().insert(fresh).await?;
            session.layers.insert(row.id, inserted.id);
        }
        Ok(())
    }

    async fn import_sprite_frames(
        &self,
        reader: &mut ArchiveReader,
        session: &mut ImportSession,
    ) -> Result<(), ImportError> {
        let rows: Vec<SpriteFrame> =
            reader.read_json(entries::SPRITES_FRAMES)?.unwrap_or_default();
        'rows: for row in rows {
            // All three references are required: a placement with any
            // of them missing is meaningless.
            let resolved = [
                ("spriteId", session.sprites.get(&row.sprite_id).map(|s| s.raw())),
                ("layerId", session.layers.get(&row.layer_id).map(|l| l.raw())),
                ("frameId", session.frames.get(&row.frame_id).map(|f| f.raw())),
            ];
            for (field, value) in &resolved {
                if value.is_none() {
                    session.diagnostics.record(Diagnostic::RowSkipped {
                        entity: EntityKind::SpriteFrame,
                        row: row.id.erase(),
                        field: (*field).to_string(),
                    });
                    continue 'rows;
                }
            }

            let mut fresh = row.clone();
            fresh.sprite_id = session.sprites[&row.sprite_id];
            fresh.layer_id = session.layers[&row.layer_id];
            fresh.frame_id = session.frames[&row.frame_id];
            let inserted = self.repo.sprite_frames().insert(fresh).await?;
            session.sprite_frames.insert(row.id, inserted.id);
        }
        Ok(())
    }

    async fn import_animations(
        &self,
        reader: &mut ArchiveReader,
        session: &mut ImportSession,
    ) -> Result<(), ImportError> {
        let rows: Vec<SpriteAnimation> = reader
            .read_json(entries::SPRITES_ANIMATIONS)?
            .unwrap_or_default();
        for row in rows {
            let Some(sprite_id) = session.sprites.get(&row.sprite_id).copied() else {
                session.diagnostics.record(Diagnostic::RowSkipped {
                    entity: EntityKind::SpriteAnimation,
                    row: row.id.erase(),
                    field: "spriteId".to_string(),
                });
                continue;
            };

            let mut steps = Vec::with_capacity(row.steps.len());
            for (index, step) in row.steps.iter().enumerate() {
                let Some(layer_id) = session.layers.get(&step.layer_id).copied() else {
                    session.diagnostics.record(Diagnostic::StepDropped {
                        animation: row.id.erase(),
                        index,
                    });
                    continue;
                };
                let frame_id = match step.frame_id {
                    None => None,
                    Some(old) => match session.sprite_frames.get(&old) {
                        Some(new) => Some(*new),
                        None => {
                            session.diagnostics.record(Diagnostic::ReferenceNulled {
                                entity: EntityKind::SpriteAnimation,
                                row: row.id.erase(),
                                field: "steps.frameId".to_string(),
                            });
                            None
                        }
                    },
                };
                steps.push(crate::types::AnimationStep {
                    layer_id,
                    frame_id,
                    duration_ms: step.duration_ms,
                });
            }

            let mut fresh = row.clone();
            fresh.sprite_id = sprite_id;
            fresh.steps = steps;
            let inserted = self.repo.animations().insert(fresh).await?;
            session.animations.insert(row.id, inserted.id);
        }
        Ok(())
    }

    async fn import_grids(
        &self,
        reader: &mut ArchiveReader,
        project_id: Id<Project>,
        session: &mut ImportSession,
    ) -> Result<(), ImportError> {
        let rows: Vec<TilesGrid> = reader.read_json(entries::TILES_GRID)?.unwrap_or_default();
        for row in rows {
            let mut items = Vec::with_capacity(row.items.len());
            for (index, item) in row.items.iter().enumerate() {
                let Some(frame_id) = session.frames.get(&item.frame_id).copied() else {
                    session.diagnostics.record(Diagnostic::ItemDropped {
                        grid: row.id.erase(),
                        index,
                    });
                    continue;
                };
                let mut fresh = item.clone();
                fresh.frame_id = frame_id;
                items.push(fresh);
            }

            let mut fresh = row.clone();
            fresh.project_id = project_id;
            fresh.items = items;
            let inserted = self.repo.grids().insert(fresh).await?;
            session.grids.insert(row.id, inserted.id);
        }
        Ok(())
    }

    async fn import_backgrounds(
        &self,
        reader: &mut ArchiveReader,
        project_id: Id<Project>,
        session: &mut ImportSession,
    ) -> Result<(), ImportError> {
        let rows: Vec<TilesGridBackground> =
            reader.read_json(entries::TILES_GRID_BG)?.unwrap_or_default();
        for row in rows {
            let Some(grid_id) = session.grids.get(&row.grid_id).copied() else {
                session.diagnostics.record(Diagnostic::RowSkipped {
                    entity: EntityKind::TilesGridBackground,
                    row: row.id.erase(),
                    field: "gridId".to_string(),
                });
                continue;
            };

            let entry = row.filename.clone().unwrap_or_else(|| {
                background_entry_name(&row.name, row.grid_id, row.project_id)
            });
            let Some(data) = reader.read_bytes(&entry)? else {
                session.diagnostics.record(Diagnostic::AssetMissing {
                    entity: EntityKind::TilesGridBackground,
                    row: row.id.erase(),
                    entry,
                });
                continue;
            };

            let mut fresh = row.clone();
            fresh.project_id = project_id;
            fresh.grid_id = grid_id;
            fresh.filename = None;
            fresh.data = data;
            self.repo.grid_backgrounds().insert(fresh).await?;
        }
        Ok(())
    }

    async fn import_scenes(
        &self,
        reader: &mut ArchiveReader,
        project_id: Id<Project>,
        session: &mut ImportSession,
    ) -> Result<(), ImportError> {
        let rows: Vec<Scene> = reader.read_json(entries::SCENES)?.unwrap_or_default();
        for row in rows {
            let mut fresh = row.clone();
            fresh.project_id = project_id;
            let inserted = self.repo.scenes().insert(fresh).await?;
            session.scenes.insert(row.id, inserted.id);
        }
        Ok(())
    }

    /// Resolve a scene object's kind-dependent reference against the
    /// session tables. `Ok(None)` means "no reference";
    /// `Err(Unresolved)` means a required reference cannot be mapped.
    fn resolve_scene_reference(
        session: &ImportSession,
        object: &SceneObject,
    ) -> Result<Option<crate::types::RawId>, Unresolved> {
        let Some(reference) = object.reference_id else {
            return if object.kind.requires_reference() {
                Err(Unresolved)
            } else {
                Ok(None)
            };
        };
        let mapped = match object.kind {
            SceneObjectKind::Sprite => session
                .sprites
                .get(&reference.typed::<Sprite>())
                .map(|id| id.erase()),
            SceneObjectKind::Ground => session
                .frames
                .get(&reference.typed::<Frame>())
                .map(|id| id.erase()),
            SceneObjectKind::LayerGrid => session
                .grids
                .get(&reference.typed::<TilesGrid>())
                .map(|id| id.erase()),
            // Container and event kinds carry no reference; drop
            // whatever the archive had.
            SceneObjectKind::LayerSprites
            | SceneObjectKind::LayerGround
            | SceneObjectKind::LayerEvents
            | SceneObjectKind::Event => None,
        };
        match (mapped, object.kind.requires_reference()) {
            (Some(id), _) => Ok(Some(id)),
            (None, true) => Err(Unresolved),
            (None, false) => Ok(None),
        }
    }

    async fn import_scene_objects(
        &self,
        reader: &mut ArchiveReader,
        session: &mut ImportSession,
    ) -> Result<(), ImportError> {
        let rows: Vec<SceneObject> =
            reader.read_json(entries::SCENES_OBJECTS)?.unwrap_or_default();

        let mut children: BTreeMap<Id<SceneObject>, Vec<&SceneObject>> = BTreeMap::new();
        let mut roots: Vec<&SceneObject> = Vec::new();
        for row in &rows {
            match row.parent_id {
                Some(parent) => children.entry(parent).or_default().push(row),
                None => roots.push(row),
            }
        }
        let by_position = |a: &&SceneObject, b: &&SceneObject| (a.order, a.id).cmp(&(b.order, b.id));
        roots.sort_by(by_position);
        for siblings in children.values_mut() {
            siblings.sort_by(by_position);
        }

        let mut visited: BTreeSet<Id<SceneObject>> = BTreeSet::new();
        let mut worklist: Vec<&SceneObject> = roots.into_iter().rev().collect();
        while let Some(row) = worklist.pop() {
            if !visited.insert(row.id) {
                continue;
            }

            let Some(scene_id) = session.scenes.get(&row.scene_id).copied() else {
                session.diagnostics.record(Diagnostic::RowSkipped {
                    entity: EntityKind::SceneObject,
                    row: row.id.erase(),
                    field: "sceneId".to_string(),
                });
                continue;
            };

            let parent_id = match row.parent_id {
                None => None,
                Some(old) => match session.scene_objects.get(&old) {
                    Some(new) => Some(*new),
                    // Unreachable in practice: children only enter the
                    // worklist after their parent imported.
                    None => continue,
                },
            };

            let reference_id = match Self::resolve_scene_reference(session, row) {
                Ok(reference) => reference,
                Err(Unresolved) => {
                    session.diagnostics.record(Diagnostic::RowSkipped {
                        entity: EntityKind::SceneObject,
                        row: row.id.erase(),
                        field: "referenceId".to_string(),
                    });
                    continue;
                }
            };

            let animation_id = match row.animation_id {
                None => None,
                Some(old) => match session
                    .animations
                    .get(&old.typed::<SpriteAnimation>())
                {
                    Some(new) => Some(new.erase()),
                    None => {
                        session.diagnostics.record(Diagnostic::ReferenceNulled {
                            entity: EntityKind::SceneObject,
                            row: row.id.erase(),
                            field: "animationId".to_string(),
                        });
                        None
                    }
                },
            };

            let mut fresh = row.clone();
            fresh.scene_id = scene_id;
            fresh.parent_id = parent_id;
            fresh.reference_id = reference_id;
            fresh.animation_id = animation_id;
            let inserted = self.repo.scene_objects().insert(fresh).await?;
            session.scene_objects.insert(row.id, inserted.id);

            if let Some(kids) = children.get(&row.id) {
                for kid in kids.iter().rev() {
                    worklist.push(*kid);
                }
            }
        }

        for row in &rows {
            if !visited.contains(&row.id) {
                session.diagnostics.record(Diagnostic::Unreachable {
                    entity: EntityKind::SceneObject,
                    row: row.id.erase(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::archive::ArchiveWriter;
    use crate::store::{all_rows, InMemoryRepo};
    use crate::types::Entity;
    use crate::types::RawId;

    fn archive(build: impl FnOnce(&mut ArchiveWriter)) -> Vec<u8> {
        let mut writer = ArchiveWriter::new();
        build(&mut writer);
        writer.finish().unwrap()
    }

    fn source_project(writer: &mut ArchiveWriter) {
        writer
            .write_json(
                entries::PROJECTS,
                &vec![Project {
                    id: Id::new(1),
                    name: "source".to_string(),
                }],
            )
            .unwrap();
    }

    fn frame_row(id: i64, name: &str) -> Frame {
        let mut frame = Frame::new(Id::new(1), name, 2, 2, Vec::new());
        frame.set_id(Id::new(id));
        frame.filename = Some(format!("{id}.png"));
        frame
    }

    fn importer() -> (Arc<InMemoryRepo>, ProjectImporter<InMemoryRepo>) {
        let repo = Arc::new(InMemoryRepo::new());
        (repo.clone(), ProjectImporter::new(repo))
    }

    #[tokio::test]
    async fn archive_without_project_manifest_is_fatal() {
        let (_, importer) = importer();

        let empty = archive(|_| {});
        assert!(matches!(
            importer.import_project(empty).await.unwrap_err(),
            ImportError::MissingProject
        ));

        let empty_doc = archive(|w| {
            w.write_json(entries::PROJECTS, &Vec::<Project>::new()).unwrap();
        });
        assert!(matches!(
            importer.import_project(empty_doc).await.unwrap_err(),
            ImportError::MissingProject
        ));
    }

    #[tokio::test]
    async fn creates_a_fresh_project_with_fresh_ids() {
        let (repo, importer) = importer();
        // Occupy low ids so remapping is observable.
        repo.projects().insert(Project::new("existing")).await.unwrap();

        let bytes = archive(source_project);
        let report = importer.import_project(bytes).await.unwrap();

        let imported = repo.projects().get(report.project_id).await.unwrap().unwrap();
        assert_eq!(imported.name, "source");
        assert_ne!(report.project_id.raw(), 1);
        assert!(report.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn tree_children_follow_parents_and_orphans_are_skipped() {
        let (repo, importer) = importer();

        let bytes = archive(|w| {
            source_project(w);
            let root = TreeNode {
                id: Id::new(10),
                project_id: Id::new(1),
                parent_id: None,
                name: "root".to_string(),
                order: 0,
            };
            let child = TreeNode {
                id: Id::new(11),
                project_id: Id::new(1),
                parent_id: Some(Id::new(10)),
                name: "child".to_string(),
                order: 0,
            };
            let orphan = TreeNode {
                id: Id::new(12),
                project_id: Id::new(1),
                parent_id: Some(Id::new(999)),
                name: "orphan".to_string(),
                order: 0,
            };
            w.write_json(entries::FRAMES_TREE, &vec![root, child, orphan]).unwrap();
        });

        let report = importer.import_project(bytes).await.unwrap();

        let nodes = repo.frame_tree().list(all_rows()).await.unwrap();
        assert_eq!(nodes.len(), 2);
        let root = nodes.iter().find(|n| n.name == "root").unwrap();
        let child = nodes.iter().find(|n| n.name == "child").unwrap();
        assert_eq!(child.parent_id, Some(root.id));
        assert_eq!(root.project_id, report.project_id);

        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::Unreachable {
                entity: EntityKind::FrameTreeNode,
                row: RawId(12),
            }]
        );
    }

    #[tokio::test]
    async fn dangling_sprite_frame_is_skipped_but_siblings_import() {
        let (repo, importer) = importer();

        let bytes = archive(|w| {
            source_project(w);
            w.write_json(entries::FRAMES, &vec![frame_row(30, "f")]).unwrap();
            w.write_bytes("30.png", &[1, 2, 3]).unwrap();

            let mut sprite = Sprite::new(Id::new(1), "hero");
            sprite.set_id(Id::new(10));
            w.write_json(entries::SPRITES, &vec![sprite]).unwrap();

            let mut layer = SpriteLayer::new(Id::new(10), "base", 0);
            layer.set_id(Id::new(20));
            w.write_json(entries::SPRITES_LAYERS, &vec![layer]).unwrap();

            let mut good = SpriteFrame::new(Id::new(10), Id::new(20), Id::new(30));
            good.set_id(Id::new(40));
            let mut dangling = SpriteFrame::new(Id::new(10), Id::new(20), Id::new(777));
            dangling.set_id(Id::new(41));
            w.write_json(entries::SPRITES_FRAMES, &vec![good, dangling]).unwrap();
        });

        let report = importer.import_project(bytes).await.unwrap();

        let placements = repo.sprite_frames().list(all_rows()).await.unwrap();
        assert_eq!(placements.len(), 1);

        let frames = repo.frames().list(all_rows()).await.unwrap();
        assert_eq!(placements[0].frame_id, frames[0].id);
        assert_eq!(frames[0].data, vec![1, 2, 3]);

        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::RowSkipped {
                entity: EntityKind::SpriteFrame,
                row: RawId(41),
                field: "frameId".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn frame_without_binary_entry_is_skipped() {
        let (repo, importer) = importer();

        let bytes = archive(|w| {
            source_project(w);
            w.write_json(entries::FRAMES, &vec![frame_row(30, "ghost")]).unwrap();
            // No 30.png entry.
        });

        let report = importer.import_project(bytes).await.unwrap();
        assert!(repo.frames().list(all_rows()).await.unwrap().is_empty());
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::AssetMissing {
                entity: EntityKind::Frame,
                row: RawId(30),
                entry: "30.png".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn scene_object_recovers_per_reference_rules() {
        let (repo, importer) = importer();

        let bytes = archive(|w| {
            source_project(w);

            let mut scene = Scene::new(Id::new(1), "level", 320, 240);
            scene.set_id(Id::new(50));
            w.write_json(entries::SCENES, &vec![scene]).unwrap();

            // A container layer with a stale animation reference: the
            // object imports, the reference nulls.
            let mut layer = SceneObject::new(Id::new(50), SceneObjectKind::LayerSprites);
            layer.set_id(Id::new(60));
            layer.animation_id = Some(RawId(777));

            // A sprite actor whose sprite was never imported: the row
            // skips and its child becomes unreachable.
            let mut actor = SceneObject::new(Id::new(50), SceneObjectKind::Sprite);
            actor.set_id(Id::new(61));
            actor.reference_id = Some(RawId(888));
            let mut marker = SceneObject::new(Id::new(50), SceneObjectKind::Event);
            marker.set_id(Id::new(62));
            marker.parent_id = Some(Id::new(61));

            w.write_json(entries::SCENES_OBJECTS, &vec![layer, actor, marker]).unwrap();
        });

        let report = importer.import_project(bytes).await.unwrap();

        let objects = repo.scene_objects().list(all_rows()).await.unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].kind, SceneObjectKind::LayerSprites);
        assert_eq!(objects[0].animation_id, None);

        assert_eq!(
            report.diagnostics,
            vec![
                Diagnostic::ReferenceNulled {
                    entity: EntityKind::SceneObject,
                    row: RawId(60),
                    field: "animationId".to_string(),
                },
                Diagnostic::RowSkipped {
                    entity: EntityKind::SceneObject,
                    row: RawId(61),
                    field: "referenceId".to_string(),
                },
                Diagnostic::Unreachable {
                    entity: EntityKind::SceneObject,
                    row: RawId(62),
                },
            ]
        );
    }

    #[tokio::test]
    async fn animation_steps_drop_when_their_layer_is_gone() {
        let (repo, importer) = importer();

        let bytes = archive(|w| {
            source_project(w);

            let mut sprite = Sprite::new(Id::new(1), "hero");
            sprite.set_id(Id::new(10));
            w.write_json(entries::SPRITES, &vec![sprite]).unwrap();

            let mut layer = SpriteLayer::new(Id::new(10), "base", 0);
            layer.set_id(Id::new(20));
            w.write_json(entries::SPRITES_LAYERS, &vec![layer]).unwrap();

            let mut animation = SpriteAnimation::new(Id::new(10), "walk");
            animation.set_id(Id::new(70));
            animation.steps.push(crate::types::AnimationStep {
                layer_id: Id::new(20),
                frame_id: None,
                duration_ms: 120,
            });
            animation.steps.push(crate::types::AnimationStep {
                layer_id: Id::new(999),
                frame_id: None,
                duration_ms: 120,
            });
            w.write_json(entries::SPRITES_ANIMATIONS, &vec![animation]).unwrap();
        });

        let report = importer.import_project(bytes).await.unwrap();

        let animations = repo.animations().list(all_rows()).await.unwrap();
        assert_eq!(animations.len(), 1);
        assert_eq!(animations[0].steps.len(), 1);
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::StepDropped {
                animation: RawId(70),
                index: 1,
            }]
        );
    }
}
