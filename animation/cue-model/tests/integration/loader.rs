//! Asset loading tests

use crate::common::*;
use cue_model::animation::{Interpolation, Property};
use cue_model::{AnimatedModel, AssetLoader, GltfLoader, LoadError, ModelError, parse_gltf};
use pretty_assertions::assert_eq;
use test_case::test_case;

#[test]
fn test_glb_scene_structure() {
    let asset = parse_gltf(&skinned_glb(), None).unwrap();
    let graph = &asset.graph;

    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.roots, vec![ARMATURE, BODY]);
    assert_eq!(graph.nodes[SPINE].parent, Some(HIPS));
    assert_eq!(graph.nodes[BODY].mesh, Some(0));
    assert_eq!(graph.nodes[BODY].skin, Some(0));

    let skin = &graph.skins[0];
    assert_eq!(skin.name.as_deref(), Some("Rig"));
    assert_eq!(skin.joints, vec![HIPS, SPINE]);
    assert_eq!(skin.inverse_bind_matrices.len(), 2);
    assert_eq!(
        skin.inverse_bind_matrices[1].w_axis.y,
        -2.0,
        "inverse bind matrices are column-major"
    );
}

#[test]
fn test_glb_mesh_and_material() {
    let asset = parse_gltf(&skinned_glb(), None).unwrap();
    let graph = &asset.graph;

    let primitive = &graph.meshes[0].primitives[0];
    assert_eq!(primitive.positions.len(), 4);
    assert_eq!(primitive.normals.len(), 4);
    assert_eq!(primitive.indices, vec![0, 1, 2, 2, 1, 3]);
    assert_eq!(primitive.joints[2], [1, 0, 0, 0]);
    assert!(primitive.is_skinned());
    assert_eq!(primitive.material, Some(0));

    let material = &graph.materials[0];
    assert_eq!(material.name.as_deref(), Some("Visor"));
    assert_eq!(material.base_color, [0.2, 0.4, 0.8, 1.0]);
    assert!(material.double_sided);
}

#[test]
fn test_clips_keep_declaration_order() {
    let asset = parse_gltf(&skinned_glb(), None).unwrap();
    let names: Vec<&str> = asset.clips.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Idle", "Run", "Walk", "Attack"]);
}

#[test_case(IDLE, 2.0, Property::Translation ; "idle")]
#[test_case(RUN, 1.0, Property::Translation ; "run")]
#[test_case(WALK, 1.0, Property::Translation ; "walk")]
#[test_case(ATTACK, 0.5, Property::Rotation ; "attack")]
fn test_clip_tracks(index: usize, duration: f32, property: Property) {
    let asset = parse_gltf(&skinned_glb(), None).unwrap();
    let clip = &asset.clips[index];

    assert!((clip.duration - duration).abs() < 1e-6);
    assert_eq!(clip.tracks.len(), 1);
    assert_eq!(clip.tracks[0].property(), property);
    assert_eq!(clip.tracks[0].interpolation, Interpolation::Linear);
}

#[tokio::test]
async fn test_filesystem_loader_paths() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_asset(dir.path(), FIXTURE_NAME, &skinned_glb());

    let loader = GltfLoader::new(dir.path());
    let by_name = loader.load(FIXTURE_NAME).await.unwrap();
    assert_eq!(by_name.clips.len(), 4);

    let url = format!("file://{}", path.display());
    let by_url = GltfLoader::default().load(&url).await.unwrap();
    assert_eq!(by_url.graph.nodes.len(), 4);
}

#[tokio::test]
async fn test_garbage_file_fails_to_parse() {
    let dir = tempfile::tempdir().unwrap();
    write_asset(dir.path(), "broken.glb", b"glTF but not really");

    let err = GltfLoader::new(dir.path()).load("broken.glb").await.unwrap_err();
    assert!(matches!(err, LoadError::Gltf(_)), "unexpected error: {err}");
}

#[test_log::test(tokio::test)]
async fn test_missing_file_surfaces_through_model() {
    let dir = tempfile::tempdir().unwrap();
    let loader = GltfLoader::new(dir.path());

    let mut model = AnimatedModel::new();
    let err = model.load(&loader, "nowhere.glb", 0.0).await.unwrap_err();
    assert!(matches!(err, ModelError::Load(LoadError::Io { .. })));
    assert!(!model.is_loaded());
    assert_eq!(model.current_animation(), None);
}

#[tokio::test]
async fn test_remote_source_is_unsupported() {
    let mut model = AnimatedModel::new();
    let err = model
        .load(&GltfLoader::default(), "https://example.com/Astronaut.glb", 0.0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::Load(LoadError::UnsupportedSource(_))
    ));
}

#[tokio::test]
async fn test_asset_without_clips_is_rejected() {
    let loader = MemoryLoader::new().with_asset("Crate.glb", static_glb());
    let err = AnimatedModel::load_from(&loader, "Crate.glb", 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Load(LoadError::NoClips(_))));

    // the same bytes are still a valid scene
    let asset = parse_gltf(&static_glb(), None).unwrap();
    assert_eq!(asset.graph.find_by_name("Crate"), Some(0));
}
