//! Entity graph export.
//!
//! Walks a project's entity graph through the repository contract and
//! packages it as a zip archive: one JSON document per entity type
//! plus one binary entry per raster asset, cross-referenced through
//! `filename` fields. Export is a pure read; the source project is
//! never mutated.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::archive::{background_entry_name, entries, frame_entry_name, ArchiveError, ArchiveWriter};
use crate::store::{ProjectRepo, RepoError, Table};
use crate::types::{
    Diagnostic, Diagnostics, EntityKind, Frame, Id, Project, Scene, SceneObject, Sprite,
    SpriteAnimation, SpriteFrame, SpriteLayer, TilesGrid, TilesGridBackground, TreeNode,
};

/// Export failure.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The addressed root entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Collection of the missing row.
        kind: EntityKind,
        /// Id of the missing row.
        id: crate::types::RawId,
    },
    /// The repository rejected an operation; remaining stages abort.
    #[error(transparent)]
    Repo(#[from] RepoError),
    /// The archive could not be written.
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    /// A raster failed to encode or decode.
    #[error("raster: {0}")]
    Image(#[from] image::ImageError),
}

/// A finished export: archive bytes plus recovery diagnostics.
#[derive(Debug)]
pub struct ExportOutput {
    /// The zip archive.
    pub bytes: Vec<u8>,
    /// Rows skipped during export.
    pub diagnostics: Vec<Diagnostic>,
}

/// Packages a project's entity graph into an archive.
pub struct ProjectExporter<R: ProjectRepo> {
    repo: Arc<R>,
}

impl<R: ProjectRepo> ProjectExporter<R> {
    /// Create an exporter over a repository.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Export one project and everything transitively belonging to it.
    pub async fn export_project(&self, project_id: Id<Project>) -> Result<ExportOutput, ExportError> {
        let project = self
            .repo
            .projects()
            .get(project_id)
            .await?
            .ok_or(ExportError::NotFound {
                kind: EntityKind::Project,
                id: project_id.erase(),
            })?;

        tracing::debug!(project = %project_id, "exporting project");

        let mut writer = ArchiveWriter::new();
        let mut diagnostics = Diagnostics::new();

        writer.write_json(entries::PROJECTS, &vec![project])?;

        let frame_nodes: Vec<TreeNode> = self
            .repo
            .frame_tree()
            .list(Box::new(move |n| n.project_id == project_id))
            .await?;
        writer.write_json(entries::FRAMES_TREE, &frame_nodes)?;

        let frames = self
            .repo
            .frames()
            .list(Box::new(move |f| f.project_id == project_id))
            .await?;
        let mut frame_rows: Vec<Frame> = Vec::with_capacity(frames.len());
        for mut frame in frames {
            if frame.data.is_empty() {
                diagnostics.record(Diagnostic::AssetMissing {
                    entity: EntityKind::Frame,
                    row: frame.id.erase(),
                    entry: frame_entry_name(frame.id),
                });
                continue;
            }
            let entry = frame_entry_name(frame.id);
            writer.write_bytes(&entry, &frame.data)?;
            frame.filename = Some(entry);
            frame_rows.push(frame);
        }
        writer.write_json(entries::FRAMES, &frame_rows)?;

        let sprite_nodes: Vec<TreeNode> = self
            .repo
            .sprite_tree()
            .list(Box::new(move |n| n.project_id == project_id))
            .await?;
        writer.write_json(entries::SPRITES_TREE, &sprite_nodes)?;

        let sprites: Vec<Sprite> = self
            .repo
            .sprites()
            .list(Box::new(move |s| s.project_id == project_id))
            .await?;
        writer.write_json(entries::SPRITES, &sprites)?;

        let sprite_ids: BTreeSet<Id<Sprite>> = sprites.iter().map(|s| s.id).collect();

        let owned = sprite_ids.clone();
        let layers: Vec<SpriteLayer> = self
            .repo
            .sprite_layers()
            .list(Box::new(move |l| owned.contains(&l.sprite_id)))
            .await?;
        writer.write_json(entries::SPRITES_LAYERS, &layers)?;

        let owned = sprite_ids.clone();
        let sprite_frames: Vec<SpriteFrame> = self
            .repo
            .sprite_frames()
            .list(Box::new(move |sf| owned.contains(&sf.sprite_id)))
            .await?;
        writer.write_json(entries::SPRITES_FRAMES, &sprite_frames)?;

        let owned = sprite_ids;
        let animations: Vec<SpriteAnimation> = self
            .repo
            .animations()
            .list(Box::new(move |a| owned.contains(&a.sprite_id)))
            .await?;
        writer.write_json(entries::SPRITES_ANIMATIONS, &animations)?;

        let grids: Vec<TilesGrid> = self
            .repo
            .grids()
            .list(Box::new(move |g| g.project_id == project_id))
            .await?;
        writer.write_json(entries::TILES_GRID, &grids)?;

        let backgrounds = self
            .repo
            .grid_backgrounds()
            .list(Box::new(move |bg| bg.project_id == project_id))
            .await?;
        let mut background_rows: Vec<TilesGridBackground> = Vec::with_capacity(backgrounds.len());
        for mut background in backgrounds {
            if background.data.is_empty() {
                diagnostics.record(Diagnostic::AssetMissing {
                    entity: EntityKind::TilesGridBackground,
                    row: background.id.erase(),
                    entry: background_entry_name(
                        &background.name,
                        background.grid_id,
                        background.project_id,
                    ),
                });
                continue;
            }
            let entry = background_entry_name(
                &background.name,
                background.grid_id,
                background.project_id,
            );
            writer.write_bytes(&entry, &background.data)?;
            background.filename = Some(entry);
            background_rows.push(background);
        }
        writer.write_json(entries::TILES_GRID_BG, &background_rows)?;

        let scenes: Vec<Scene> = self
            .repo
            .scenes()
            .list(Box::new(move |s| s.project_id == project_id))
            .await?;
        writer.write_json(entries::SCENES, &scenes)?;

        let scene_ids: BTreeSet<Id<Scene>> = scenes.iter().map(|s| s.id).collect();
        let scene_objects: Vec<SceneObject> = self
            .repo
            .scene_objects()
            .list(Box::new(move |o| scene_ids.contains(&o.scene_id)))
            .await?;
        writer.write_json(entries::SCENES_OBJECTS, &scene_objects)?;

        let bytes = writer.finish()?;
        tracing::debug!(
            bytes = bytes.len(),
            diagnostics = diagnostics.len(),
            "export finished"
        );

        Ok(ExportOutput {
            bytes,
            diagnostics: diagnostics.into_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::archive::ArchiveReader;
    use crate::store::{InMemoryRepo, Table};

    async fn seeded_repo() -> (Arc<InMemoryRepo>, Id<Project>) {
        let repo = Arc::new(InMemoryRepo::new());
        let project = repo.projects().insert(Project::new("demo")).await.unwrap();
        (repo, project.id)
    }

    #[tokio::test]
    async fn missing_project_is_an_error() {
        let (repo, _) = seeded_repo().await;
        let exporter = ProjectExporter::new(repo);
        let err = exporter.export_project(Id::new(999)).await.unwrap_err();
        assert!(matches!(err, ExportError::NotFound { .. }));
    }

    #[tokio::test]
    async fn emits_all_fixed_documents() {
        let (repo, project_id) = seeded_repo().await;
        let output = ProjectExporter::new(repo).export_project(project_id).await.unwrap();

        let mut reader = ArchiveReader::open(output.bytes).unwrap();
        for name in [
            entries::PROJECTS,
            entries::FRAMES_TREE,
            entries::FRAMES,
            entries::SPRITES_TREE,
            entries::SPRITES,
            entries::SPRITES_LAYERS,
            entries::SPRITES_FRAMES,
            entries::SPRITES_ANIMATIONS,
            entries::TILES_GRID,
            entries::TILES_GRID_BG,
            entries::SCENES,
            entries::SCENES_OBJECTS,
        ] {
            assert!(
                reader.read_bytes(name).unwrap().is_some(),
                "missing document {name}"
            );
        }
    }

    #[tokio::test]
    async fn frame_bytes_become_named_entries() {
        let (repo, project_id) = seeded_repo().await;
        let frame = repo
            .frames()
            .insert(Frame::new(project_id, "f", 1, 1, vec![0xAA, 0xBB]))
            .await
            .unwrap();

        let output = ProjectExporter::new(repo).export_project(project_id).await.unwrap();
        let mut reader = ArchiveReader::open(output.bytes).unwrap();

        let entry = frame_entry_name(frame.id);
        assert_eq!(reader.read_bytes(&entry).unwrap().unwrap(), vec![0xAA, 0xBB]);

        let rows: Vec<Frame> = reader.read_json(entries::FRAMES).unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].filename.as_deref(), Some(entry.as_str()));
        // Raster bytes never travel through the JSON document.
        assert!(rows[0].data.is_empty());
    }

    #[tokio::test]
    async fn dataless_frame_is_skipped_with_diagnostic() {
        let (repo, project_id) = seeded_repo().await;
        repo.frames()
            .insert(Frame::new(project_id, "empty", 1, 1, Vec::new()))
            .await
            .unwrap();

        let output = ProjectExporter::new(repo).export_project(project_id).await.unwrap();
        assert_eq!(output.diagnostics.len(), 1);

        let mut reader = ArchiveReader::open(output.bytes).unwrap();
        let rows: Vec<Frame> = reader.read_json(entries::FRAMES).unwrap().unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn other_projects_rows_stay_out() {
        let (repo, project_id) = seeded_repo().await;
        let other = repo.projects().insert(Project::new("other")).await.unwrap();
        repo.sprites()
            .insert(Sprite::new(other.id, "stranger"))
            .await
            .unwrap();

        let output = ProjectExporter::new(repo).export_project(project_id).await.unwrap();
        let mut reader = ArchiveReader::open(output.bytes).unwrap();
        let sprites: Vec<Sprite> = reader.read_json(entries::SPRITES).unwrap().unwrap();
        assert!(sprites.is_empty());
    }
}
