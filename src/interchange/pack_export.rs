//! Atlas "pack" export variants.
//!
//! Raster-heavy exports for game runtimes: duplicate frames are merged
//! first, the survivors are packed onto atlas pages, and a def JSON
//! maps every frame id to its page rectangle. Redirected references
//! (from the duplicate merge) flow into the emitted rows, so a def
//! never points at a merged-away frame.

use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::sync::Arc;

use super::archive::{entries, frame_entry_name, ArchiveWriter};
use super::export::{ExportError, ExportOutput};
use crate::atlas::{compose_pages, page_file_name, AtlasEntry, PackOptions, RectSpec};
use crate::dedup::{DedupOutcome, DuplicateEliminator, FrameImage};
use crate::store::{ProjectRepo, Table};
use crate::types::{
    Diagnostic, Diagnostics, EntityKind, Frame, Id, Project, Scene, SceneObject, SceneObjectKind,
    Sprite, SpriteAnimation, SpriteFrame, SpriteLayer, TilesGrid,
};

/// Placements of one composed atlas page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtlasPageManifest {
    /// Page file name inside the archive.
    pub page: String,
    /// Frame rectangles on the page.
    pub frames: Vec<AtlasEntry<Id<Frame>>>,
}

/// A sprite with all its owned rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteBundle {
    /// The sprite row.
    pub sprite: Sprite,
    /// Its layers.
    pub layers: Vec<SpriteLayer>,
    /// Its frame placements.
    pub frames: Vec<SpriteFrame>,
    /// Its animations.
    pub animations: Vec<SpriteAnimation>,
}

/// `sprite-def.json` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpritePackDef {
    /// The exported sprite.
    pub sprite: SpriteBundle,
    /// Atlas placements.
    pub atlas: Vec<AtlasPageManifest>,
}

/// `frames-def.json` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FramesPackDef {
    /// Surviving frame rows.
    pub frames: Vec<Frame>,
    /// Atlas placements.
    pub atlas: Vec<AtlasPageManifest>,
}

/// `grid-def.json` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPackDef {
    /// The exported grid.
    pub grid: TilesGrid,
    /// Atlas placements.
    pub atlas: Vec<AtlasPageManifest>,
}

/// `layers-grid-def.json` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayersGridDef {
    /// The scene's grid layers.
    pub grids: Vec<TilesGrid>,
}

/// `scene-def.json` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePackDef {
    /// The exported scene.
    pub scene: Scene,
    /// Its actor forest.
    pub objects: Vec<SceneObject>,
    /// Sprites the actors reference.
    pub sprites: Vec<SpriteBundle>,
    /// Atlas placements.
    pub atlas: Vec<AtlasPageManifest>,
}

/// Composed pages plus their manifests.
struct BuiltAtlas {
    manifests: Vec<AtlasPageManifest>,
    pages: Vec<(String, Vec<u8>)>,
}

/// Exports atlas packs for sprites, scenes, grids, and raw frame sets.
pub struct PackExporter<R: ProjectRepo> {
    repo: Arc<R>,
    options: PackOptions,
}

impl<R: ProjectRepo> PackExporter<R> {
    /// Create a pack exporter with the default page bound.
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            options: PackOptions::default(),
        }
    }

    /// Override the page bound.
    pub fn with_options(mut self, options: PackOptions) -> Self {
        self.options = options;
        self
    }

    /// Export every frame of a project as a deduplicated atlas pack:
    /// `frames-def.json` plus pages named `frames-pack.png` /
    /// `frames-pack-N.png`.
    pub async fn export_frames_pack(
        &self,
        project_id: Id<Project>,
    ) -> Result<ExportOutput, ExportError> {
        self.require_project(project_id).await?;
        let mut diagnostics = Diagnostics::new();

        let frames = self
            .repo
            .frames()
            .list(Box::new(move |f| f.project_id == project_id))
            .await?;

        let (images, outcome) = self.dedup(&frames, &mut diagnostics).await?;
        let atlas = self.build_atlas(&images, &mut diagnostics, |index, total| {
            if total == 1 {
                "frames-pack.png".to_string()
            } else {
                format!("frames-pack-{}.png", index + 1)
            }
        })?;

        let kept: BTreeSet<Id<Frame>> = outcome.kept.iter().copied().collect();
        let frames: Vec<Frame> = frames
            .into_iter()
            .filter(|f| kept.contains(&f.id))
            .map(|mut f| {
                f.filename = None;
                f
            })
            .collect();

        let def = FramesPackDef {
            frames,
            atlas: atlas.manifests,
        };
        self.finish(entries::FRAMES_DEF, &def, atlas.pages, None, diagnostics)
    }

    /// Export one sprite as `sprite-def.json` plus `texture.png`
    /// pages.
    pub async fn export_sprite_pack(
        &self,
        sprite_id: Id<Sprite>,
    ) -> Result<ExportOutput, ExportError> {
        let sprite = self
            .repo
            .sprites()
            .get(sprite_id)
            .await?
            .ok_or(ExportError::NotFound {
                kind: EntityKind::Sprite,
                id: sprite_id.erase(),
            })?;
        let mut diagnostics = Diagnostics::new();

        let mut bundle = self.sprite_bundle(sprite).await?;
        let frame_ids: BTreeSet<Id<Frame>> = bundle.frames.iter().map(|sf| sf.frame_id).collect();
        let frames = self.frames_by_id(&frame_ids).await?;

        let (images, outcome) = self.dedup(&frames, &mut diagnostics).await?;
        redirect_bundle(&mut bundle, &outcome);

        let atlas = self.build_atlas(&images, &mut diagnostics, |index, total| {
            page_file_name("texture", index, total)
        })?;

        let def = SpritePackDef {
            sprite: bundle,
            atlas: atlas.manifests,
        };
        self.finish(entries::SPRITE_DEF, &def, atlas.pages, None, diagnostics)
    }

    /// Export one tile grid as `grid-def.json` plus `texture.png`
    /// pages.
    pub async fn export_grid_pack(
        &self,
        grid_id: Id<TilesGrid>,
    ) -> Result<ExportOutput, ExportError> {
        let mut grid = self
            .repo
            .grids()
            .get(grid_id)
            .await?
            .ok_or(ExportError::NotFound {
                kind: EntityKind::TilesGrid,
                id: grid_id.erase(),
            })?;
        let mut diagnostics = Diagnostics::new();

        let frame_ids: BTreeSet<Id<Frame>> = grid.items.iter().map(|i| i.frame_id).collect();
        let frames = self.frames_by_id(&frame_ids).await?;

        let (images, outcome) = self.dedup(&frames, &mut diagnostics).await?;
        for item in &mut grid.items {
            item.frame_id = outcome.canonical(item.frame_id);
        }

        let atlas = self.build_atlas(&images, &mut diagnostics, |index, total| {
            page_file_name("texture", index, total)
        })?;

        let def = GridPackDef {
            grid,
            atlas: atlas.manifests,
        };
        self.finish(entries::GRID_DEF, &def, atlas.pages, None, diagnostics)
    }

    /// Export one scene as `scene-def.json` (plus
    /// `layers-grid-def.json` when the scene has grid layers) and
    /// `texture.png` pages.
    pub async fn export_scene_pack(
        &self,
        scene_id: Id<Scene>,
    ) -> Result<ExportOutput, ExportError> {
        let scene = self
            .repo
            .scenes()
            .get(scene_id)
            .await?
            .ok_or(ExportError::NotFound {
                kind: EntityKind::Scene,
                id: scene_id.erase(),
            })?;
        let mut diagnostics = Diagnostics::new();

        let mut objects: Vec<SceneObject> = self
            .repo
            .scene_objects()
            .list(Box::new(move |o| o.scene_id == scene_id))
            .await?;

        let mut bundles: Vec<SpriteBundle> = Vec::new();
        let mut grids: Vec<TilesGrid> = Vec::new();
        let mut frame_ids: BTreeSet<Id<Frame>> = BTreeSet::new();
        let mut seen_sprites: BTreeSet<Id<Sprite>> = BTreeSet::new();
        let mut seen_grids: BTreeSet<Id<TilesGrid>> = BTreeSet::new();

        for object in &objects {
            let Some(reference) = object.reference_id else {
                continue;
            };
            match object.kind {
                SceneObjectKind::Sprite => {
                    let sprite_id = reference.typed::<Sprite>();
                    if !seen_sprites.insert(sprite_id) {
                        continue;
                    }
                    if let Some(sprite) = self.repo.sprites().get(sprite_id).await? {
                        let bundle = self.sprite_bundle(sprite).await?;
                        frame_ids.extend(bundle.frames.iter().map(|sf| sf.frame_id));
                        bundles.push(bundle);
                    }
                }
                SceneObjectKind::LayerGrid => {
                    let grid_id = reference.typed::<TilesGrid>();
                    if !seen_grids.insert(grid_id) {
                        continue;
                    }
                    if let Some(grid) = self.repo.grids().get(grid_id).await? {
                        frame_ids.extend(grid.items.iter().map(|i| i.frame_id));
                        grids.push(grid);
                    }
                }
                SceneObjectKind::Ground => {
                    frame_ids.insert(reference.typed::<Frame>());
                }
                _ => {}
            }
        }

        let frames = self.frames_by_id(&frame_ids).await?;
        let (images, outcome) = self.dedup(&frames, &mut diagnostics).await?;

        for bundle in &mut bundles {
            redirect_bundle(bundle, &outcome);
        }
        for grid in &mut grids {
            for item in &mut grid.items {
                item.frame_id = outcome.canonical(item.frame_id);
            }
        }
        for object in &mut objects {
            if object.kind == SceneObjectKind::Ground {
                if let Some(reference) = object.reference_id {
                    object.reference_id =
                        Some(outcome.canonical(reference.typed::<Frame>()).erase());
                }
            }
        }

        let atlas = self.build_atlas(&images, &mut diagnostics, |index, total| {
            page_file_name("texture", index, total)
        })?;

        let def = ScenePackDef {
            scene,
            objects,
            sprites: bundles,
            atlas: atlas.manifests,
        };
        let grid_layers = (!grids.is_empty()).then_some(LayersGridDef { grids });
        self.finish(entries::SCENE_DEF, &def, atlas.pages, grid_layers, diagnostics)
    }

    async fn require_project(&self, project_id: Id<Project>) -> Result<(), ExportError> {
        self.repo
            .projects()
            .get(project_id)
            .await?
            .ok_or(ExportError::NotFound {
                kind: EntityKind::Project,
                id: project_id.erase(),
            })?;
        Ok(())
    }

    async fn sprite_bundle(&self, sprite: Sprite) -> Result<SpriteBundle, ExportError> {
        let sprite_id = sprite.id;
        let layers = self
            .repo
            .sprite_layers()
            .list(Box::new(move |l| l.sprite_id == sprite_id))
            .await?;
        let frames = self
            .repo
            .sprite_frames()
            .list(Box::new(move |sf| sf.sprite_id == sprite_id))
            .await?;
        let animations = self
            .repo
            .animations()
            .list(Box::new(move |a| a.sprite_id == sprite_id))
            .await?;
        Ok(SpriteBundle {
            sprite,
            layers,
            frames,
            animations,
        })
    }

    async fn frames_by_id(&self, ids: &BTreeSet<Id<Frame>>) -> Result<Vec<Frame>, ExportError> {
        let wanted = ids.clone();
        Ok(self
            .repo
            .frames()
            .list(Box::new(move |f| wanted.contains(&f.id)))
            .await?)
    }

    /// Decode the candidate frames and run the duplicate pre-pass.
    /// Undecodable frames are skipped with a diagnostic.
    async fn dedup(
        &self,
        frames: &[Frame],
        diagnostics: &mut Diagnostics,
    ) -> Result<(Vec<FrameImage>, DedupOutcome), ExportError> {
        let mut images = Vec::with_capacity(frames.len());
        for frame in frames {
            match FrameImage::decode(frame) {
                Ok(image) => images.push(image),
                Err(error) => {
                    tracing::warn!(frame = %frame.id, %error, "undecodable frame");
                    diagnostics.record(Diagnostic::AssetMissing {
                        entity: EntityKind::Frame,
                        row: frame.id.erase(),
                        entry: frame_entry_name(frame.id),
                    });
                }
            }
        }

        let eliminator = DuplicateEliminator::new(self.repo.clone());
        let outcome = eliminator.eliminate(&images).await?;
        let kept: BTreeSet<Id<Frame>> = outcome.kept.iter().copied().collect();
        images.retain(|img| kept.contains(&img.id));
        Ok((images, outcome))
    }

    /// Pack and composite the surviving frames; oversized rectangles
    /// become diagnostics, pages become encoded PNGs.
    fn build_atlas<N>(
        &self,
        images: &[FrameImage],
        diagnostics: &mut Diagnostics,
        name_page: N,
    ) -> Result<BuiltAtlas, ExportError>
    where
        N: FnMut(usize, usize) -> String,
    {
        let sources: BTreeMap<Id<Frame>, RgbaImage> = images
            .iter()
            .map(|img| (img.id, img.image.clone()))
            .collect();
        let rects: Vec<RectSpec<Id<Frame>>> = images
            .iter()
            .map(|img| RectSpec::new(img.id, img.image.width(), img.image.height()))
            .collect();

        let atlas = compose_pages(rects, &sources, self.options, name_page);

        for rect in &atlas.oversized {
            diagnostics.record(Diagnostic::RectUnplaced {
                source: rect.key.erase(),
                width: rect.width,
                height: rect.height,
            });
        }

        let mut manifests = Vec::with_capacity(atlas.pages.len());
        let mut pages = Vec::with_capacity(atlas.pages.len());
        for page in atlas.pages {
            let mut bytes = Cursor::new(Vec::new());
            page.image.write_to(&mut bytes, ImageFormat::Png)?;
            manifests.push(AtlasPageManifest {
                page: page.name.clone(),
                frames: page.entries,
            });
            pages.push((page.name, bytes.into_inner()));
        }

        Ok(BuiltAtlas { manifests, pages })
    }

    /// Write the def document and its pages into one archive.
    fn finish<D: Serialize>(
        &self,
        def_entry: &str,
        def: &D,
        pages: Vec<(String, Vec<u8>)>,
        grid_layers: Option<LayersGridDef>,
        diagnostics: Diagnostics,
    ) -> Result<ExportOutput, ExportError> {
        let mut writer = ArchiveWriter::new();
        writer.write_json(def_entry, def)?;
        if let Some(layers) = grid_layers {
            writer.write_json(entries::LAYERS_GRID_DEF, &layers)?;
        }
        for (name, bytes) in pages {
            writer.write_bytes(&name, &bytes)?;
        }
        Ok(ExportOutput {
            bytes: writer.finish()?,
            diagnostics: diagnostics.into_vec(),
        })
    }
}

/// Point a bundle's frame references at their post-merge canonicals.
fn redirect_bundle(bundle: &mut SpriteBundle, outcome: &DedupOutcome) {
    for placement in &mut bundle.frames {
        placement.frame_id = outcome.canonical(placement.frame_id);
    }
}
