//! Round-trip tests for project interchange.
//!
//! These tests verify that `import(export(P))` reconstructs P up to
//! id-renaming: identical tree shapes, field values, and raster bytes.

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Rgba, RgbaImage};
use spriteloom::store::all_rows;
use spriteloom::{
    AnimationStep, CollisionRect, Frame, GroundPoint, Id, InMemoryRepo, Project, ProjectExporter,
    ProjectImporter, ProjectRepo, Scene, SceneObject, SceneObjectKind, Sprite, SpriteAnimation,
    SpriteFrame, SpriteLayer, Table, TilesGrid, TilesGridBackground, TilesGridItem, TreeNode,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(rgba));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

struct SeededProject {
    project: Id<Project>,
    hero_frame: Id<Frame>,
}

/// Build a project exercising every entity collection.
async fn seed(repo: &InMemoryRepo) -> SeededProject {
    let project = repo.projects().insert(Project::new("world")).await.unwrap();

    let characters = repo
        .frame_tree()
        .insert(TreeNode::root(project.id, "characters", 0))
        .await
        .unwrap();
    let hero_folder = repo
        .frame_tree()
        .insert(TreeNode::child(project.id, characters.id, "hero", 0))
        .await
        .unwrap();

    let hero_frame = repo
        .frames()
        .insert(
            Frame::new(project.id, "hero-idle", 8, 8, png(8, 8, [200, 40, 40, 255]))
                .under(hero_folder.id),
        )
        .await
        .unwrap();
    let dust_frame = repo
        .frames()
        .insert(Frame::new(project.id, "dust", 4, 4, png(4, 4, [90, 80, 70, 255])))
        .await
        .unwrap();

    let actors = repo
        .sprite_tree()
        .insert(TreeNode::root(project.id, "actors", 0))
        .await
        .unwrap();
    let mut hero = Sprite::new(project.id, "hero");
    hero.tree_id = Some(actors.id);
    let hero = repo.sprites().insert(hero).await.unwrap();

    let body = repo
        .sprite_layers()
        .insert(SpriteLayer::new(hero.id, "body", 0))
        .await
        .unwrap();
    let mut fx = SpriteLayer::new(hero.id, "fx", 1);
    fx.flip_x = true;
    let fx = repo.sprite_layers().insert(fx).await.unwrap();

    let body_placement = repo
        .sprite_frames()
        .insert(SpriteFrame::new(hero.id, body.id, hero_frame.id).at(2, 3))
        .await
        .unwrap();
    repo.sprite_frames()
        .insert(SpriteFrame::new(hero.id, fx.id, dust_frame.id).at(-1, 6))
        .await
        .unwrap();

    let mut walk = SpriteAnimation::new(hero.id, "walk");
    walk.steps.push(AnimationStep {
        layer_id: body.id,
        frame_id: Some(body_placement.id),
        duration_ms: 120,
    });
    walk.steps.push(AnimationStep {
        layer_id: fx.id,
        frame_id: None,
        duration_ms: 80,
    });
    walk.ground = Some(GroundPoint { x: 4, y: 8 });
    walk.collision = Some(CollisionRect {
        x: 1,
        y: 1,
        width: 6,
        height: 7,
    });
    let walk = repo.animations().insert(walk).await.unwrap();

    let mut grid = TilesGrid::new(project.id, "ground", (16, 16), (4, 2));
    let mut item = TilesGridItem::new(dust_frame.id, 1, 0);
    item.flip_y = true;
    item.z_index = 2;
    item.properties
        .insert("solid".to_string(), serde_json::json!(true));
    grid.items.push(item);
    let grid = repo.grids().insert(grid).await.unwrap();

    repo.grid_backgrounds()
        .insert(TilesGridBackground::new(
            grid.id,
            project.id,
            "backdrop",
            png(4, 4, [10, 20, 30, 255]),
        ))
        .await
        .unwrap();

    let scene = repo
        .scenes()
        .insert(Scene::new(project.id, "level-1", 640, 480))
        .await
        .unwrap();
    let sprite_layer = repo
        .scene_objects()
        .insert(SceneObject::new(scene.id, SceneObjectKind::LayerSprites))
        .await
        .unwrap();
    let mut actor = SceneObject::new(scene.id, SceneObjectKind::Sprite)
        .under(sprite_layer.id)
        .referencing(hero.id.erase())
        .at(100, 200);
    actor.animation_id = Some(walk.id.erase());
    repo.scene_objects().insert(actor).await.unwrap();
    repo.scene_objects()
        .insert(
            SceneObject::new(scene.id, SceneObjectKind::LayerGrid).referencing(grid.id.erase()),
        )
        .await
        .unwrap();
    let ground_layer = repo
        .scene_objects()
        .insert(SceneObject::new(scene.id, SceneObjectKind::LayerGround))
        .await
        .unwrap();
    repo.scene_objects()
        .insert(
            SceneObject::new(scene.id, SceneObjectKind::Ground)
                .under(ground_layer.id)
                .referencing(dust_frame.id.erase())
                .at(0, 400),
        )
        .await
        .unwrap();

    SeededProject {
        project: project.id,
        hero_frame: hero_frame.id,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ROUND-TRIP TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_project_round_trips_up_to_id_renaming() {
    init_tracing();

    let source = Arc::new(InMemoryRepo::new());
    let seeded = seed(&source).await;

    let exported = ProjectExporter::new(source.clone())
        .export_project(seeded.project)
        .await
        .unwrap();
    assert!(exported.diagnostics.is_empty());

    let destination = Arc::new(InMemoryRepo::new());
    let report = ProjectImporter::new(destination.clone())
        .import_project(exported.bytes)
        .await
        .unwrap();
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);

    // Same shape everywhere.
    assert_eq!(destination.frame_tree().list(all_rows()).await.unwrap().len(), 2);
    assert_eq!(destination.frames().list(all_rows()).await.unwrap().len(), 2);
    assert_eq!(destination.sprite_tree().list(all_rows()).await.unwrap().len(), 1);
    assert_eq!(destination.sprites().list(all_rows()).await.unwrap().len(), 1);
    assert_eq!(destination.sprite_layers().list(all_rows()).await.unwrap().len(), 2);
    assert_eq!(destination.sprite_frames().list(all_rows()).await.unwrap().len(), 2);
    assert_eq!(destination.animations().list(all_rows()).await.unwrap().len(), 1);
    assert_eq!(destination.grids().list(all_rows()).await.unwrap().len(), 1);
    assert_eq!(destination.grid_backgrounds().list(all_rows()).await.unwrap().len(), 1);
    assert_eq!(destination.scenes().list(all_rows()).await.unwrap().len(), 1);
    assert_eq!(destination.scene_objects().list(all_rows()).await.unwrap().len(), 5);

    // Tree shape survives under new ids.
    let nodes = destination.frame_tree().list(all_rows()).await.unwrap();
    let root = nodes.iter().find(|n| n.name == "characters").unwrap();
    let child = nodes.iter().find(|n| n.name == "hero").unwrap();
    assert_eq!(child.parent_id, Some(root.id));
    assert_eq!(root.project_id, report.project_id);

    // Raster bytes survive verbatim; placement survives remapped.
    let frames = destination.frames().list(all_rows()).await.unwrap();
    let hero_frame = frames.iter().find(|f| f.name == "hero-idle").unwrap();
    let source_hero = source.frames().get(seeded.hero_frame).await.unwrap().unwrap();
    assert_eq!(hero_frame.data, source_hero.data);
    assert_eq!(hero_frame.tree_id, Some(child.id));
    assert_eq!(hero_frame.width, 8);

    // Sprite parts point at the remapped rows.
    let sprites = destination.sprites().list(all_rows()).await.unwrap();
    let layers = destination.sprite_layers().list(all_rows()).await.unwrap();
    let placements = destination.sprite_frames().list(all_rows()).await.unwrap();
    let animations = destination.animations().list(all_rows()).await.unwrap();
    let hero = &sprites[0];
    assert!(layers.iter().all(|l| l.sprite_id == hero.id));
    let body = layers.iter().find(|l| l.name == "body").unwrap();
    let body_placement = placements.iter().find(|p| p.layer_id == body.id).unwrap();
    assert_eq!(body_placement.frame_id, hero_frame.id);
    assert_eq!((body_placement.x, body_placement.y), (2, 3));
    let walk = &animations[0];
    assert_eq!(walk.sprite_id, hero.id);
    assert_eq!(walk.steps.len(), 2);
    assert_eq!(walk.steps[0].layer_id, body.id);
    assert_eq!(walk.steps[0].frame_id, Some(body_placement.id));
    assert_eq!(walk.ground, Some(GroundPoint { x: 4, y: 8 }));

    // Grid items and background follow the grid.
    let grids = destination.grids().list(all_rows()).await.unwrap();
    let dust = frames.iter().find(|f| f.name == "dust").unwrap();
    assert_eq!(grids[0].items.len(), 1);
    assert_eq!(grids[0].items[0].frame_id, dust.id);
    assert_eq!(
        grids[0].items[0].properties.get("solid"),
        Some(&serde_json::json!(true))
    );
    let backgrounds = destination.grid_backgrounds().list(all_rows()).await.unwrap();
    assert_eq!(backgrounds[0].grid_id, grids[0].id);
    assert!(!backgrounds[0].data.is_empty());

    // Scene objects keep their kind-dependent references.
    let scenes = destination.scenes().list(all_rows()).await.unwrap();
    let objects = destination.scene_objects().list(all_rows()).await.unwrap();
    assert!(objects.iter().all(|o| o.scene_id == scenes[0].id));
    let actor = objects
        .iter()
        .find(|o| o.kind == SceneObjectKind::Sprite)
        .unwrap();
    assert_eq!(actor.reference_id, Some(hero.id.erase()));
    assert_eq!(actor.animation_id, Some(walk.id.erase()));
    let grid_layer = objects
        .iter()
        .find(|o| o.kind == SceneObjectKind::LayerGrid)
        .unwrap();
    assert_eq!(grid_layer.reference_id, Some(grids[0].id.erase()));
    let ground = objects
        .iter()
        .find(|o| o.kind == SceneObjectKind::Ground)
        .unwrap();
    assert_eq!(ground.reference_id, Some(dust.id.erase()));
    let layer = objects
        .iter()
        .find(|o| o.kind == SceneObjectKind::LayerSprites)
        .unwrap();
    assert_eq!(actor.parent_id, Some(layer.id));
}

#[tokio::test]
async fn single_node_single_frame_scenario() {
    init_tracing();

    let source = Arc::new(InMemoryRepo::new());
    let project = source.projects().insert(Project::new("tiny")).await.unwrap();
    let node = source
        .frame_tree()
        .insert(TreeNode::root(project.id, "folder", 0))
        .await
        .unwrap();
    source
        .frames()
        .insert(Frame::new(project.id, "only", 2, 2, png(2, 2, [1, 2, 3, 255])).under(node.id))
        .await
        .unwrap();

    let exported = ProjectExporter::new(source)
        .export_project(project.id)
        .await
        .unwrap();

    let destination = Arc::new(InMemoryRepo::new());
    let report = ProjectImporter::new(destination.clone())
        .import_project(exported.bytes)
        .await
        .unwrap();
    assert!(report.diagnostics.is_empty());

    let nodes = destination.frame_tree().list(all_rows()).await.unwrap();
    let frames = destination.frames().list(all_rows()).await.unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].tree_id, Some(nodes[0].id));
}

#[tokio::test]
async fn export_does_not_mutate_the_source_project() {
    init_tracing();

    let source = Arc::new(InMemoryRepo::new());
    let seeded = seed(&source).await;

    let before = source.frames().list(all_rows()).await.unwrap();
    ProjectExporter::new(source.clone())
        .export_project(seeded.project)
        .await
        .unwrap();
    let after = source.frames().list(all_rows()).await.unwrap();

    assert_eq!(before, after);
    // The export-time filename linkage never lands in the store.
    assert!(after.iter().all(|f| f.filename.is_none()));
}

#[tokio::test]
async fn import_twice_creates_two_independent_projects() {
    init_tracing();

    let source = Arc::new(InMemoryRepo::new());
    let seeded = seed(&source).await;
    let exported = ProjectExporter::new(source)
        .export_project(seeded.project)
        .await
        .unwrap();

    let destination = Arc::new(InMemoryRepo::new());
    let importer = ProjectImporter::new(destination.clone());
    let first = importer.import_project(exported.bytes.clone()).await.unwrap();
    let second = importer.import_project(exported.bytes).await.unwrap();

    assert_ne!(first.project_id, second.project_id);
    assert_eq!(destination.sprites().list(all_rows()).await.unwrap().len(), 2);
    let frames = destination.frames().list(all_rows()).await.unwrap();
    assert_eq!(frames.len(), 4);
}
