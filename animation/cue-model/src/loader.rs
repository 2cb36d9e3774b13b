//! Asset loading: the loader seam and a glTF/GLB implementation

use std::future::Future;
use std::path::{Path, PathBuf};

use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;

use crate::animation::{AnimationClip, Interpolation, Track, TrackValues};
use crate::error::LoadError;
use crate::scene::{Material, Mesh, Primitive, SceneGraph, SceneNode, Skin, Transform};

/// A parsed asset: scene graph plus clips in declaration order
#[derive(Debug, Clone, Default)]
pub struct LoadedAsset {
    pub graph: SceneGraph,
    pub clips: Vec<AnimationClip>,
}

/// Fetches and parses a skinned asset
pub trait AssetLoader {
    /// Load the asset named by `source`
    fn load(&self, source: &str) -> impl Future<Output = Result<LoadedAsset, LoadError>>;
}

/// Loads `.glb` / `.gltf` files from the local filesystem
#[derive(Debug, Clone)]
pub struct GltfLoader {
    base_dir: PathBuf,
}

impl GltfLoader {
    /// Relative sources are resolved against `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Turn a plain path or `file://` URL into a filesystem path
    pub fn resolve(&self, source: &str) -> Result<PathBuf, LoadError> {
        let raw = match source.strip_prefix("file://") {
            Some(rest) => rest,
            None if source.contains("://") => {
                return Err(LoadError::UnsupportedSource(source.to_string()));
            }
            None => source,
        };

        let path = Path::new(raw);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.base_dir.join(path))
        }
    }
}

impl Default for GltfLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl AssetLoader for GltfLoader {
    async fn load(&self, source: &str) -> Result<LoadedAsset, LoadError> {
        let path = self.resolve(source)?;
        log::debug!("Loading asset from {}", path.display());

        let bytes = tokio::fs::read(&path).await.map_err(|e| LoadError::Io {
            path: path.clone(),
            source: e,
        })?;

        parse_gltf(&bytes, path.parent())
    }
}

/// Parse a binary (`.glb`) or JSON (`.gltf`) document
///
/// External buffers are resolved relative to `base`. Node indices in the
/// returned graph match the document's node indices.
pub fn parse_gltf(bytes: &[u8], base: Option<&Path>) -> Result<LoadedAsset, LoadError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, base, blob)?;
    let buffer_data = |buffer: gltf::Buffer<'_>| buffers.get(buffer.index()).map(|d| d.0.as_slice());

    let mut graph = SceneGraph::new();

    for node in document.nodes() {
        let (translation, rotation, scale) = node.transform().decomposed();
        let mut scene_node = SceneNode::new(
            node.name().map(str::to_owned),
            Transform {
                translation: Vec3::from(translation),
                rotation: Quat::from_array(rotation),
                scale: Vec3::from(scale),
            },
        );
        scene_node.mesh = node.mesh().map(|m| m.index());
        scene_node.skin = node.skin().map(|s| s.index());
        graph.add_node(scene_node);
    }

    for node in document.nodes() {
        for child in node.children() {
            graph.attach(node.index(), child.index());
        }
    }

    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        graph.roots = scene.nodes().map(|n| n.index()).collect();
    }

    for mesh in document.meshes() {
        let mut primitives = Vec::new();
        for primitive in mesh.primitives() {
            let reader = primitive.reader(buffer_data);
            let positions: Vec<Vec3> = reader
                .read_positions()
                .map(|iter| iter.map(Vec3::from).collect())
                .unwrap_or_default();
            if positions.is_empty() {
                log::warn!(
                    "Skipping primitive {} of mesh {} without positions",
                    primitive.index(),
                    mesh.index()
                );
                continue;
            }

            primitives.push(Primitive {
                normals: reader
                    .read_normals()
                    .map(|iter| iter.map(Vec3::from).collect())
                    .unwrap_or_default(),
                uvs: reader
                    .read_tex_coords(0)
                    .map(|tc| tc.into_f32().collect())
                    .unwrap_or_default(),
                indices: reader
                    .read_indices()
                    .map(|idx| idx.into_u32().collect())
                    .unwrap_or_default(),
                joints: reader
                    .read_joints(0)
                    .map(|j| j.into_u16().collect())
                    .unwrap_or_default(),
                weights: reader
                    .read_weights(0)
                    .map(|w| w.into_f32().collect())
                    .unwrap_or_default(),
                material: primitive.material().index(),
                positions,
            });
        }

        graph.meshes.push(Mesh {
            name: mesh.name().map(str::to_owned),
            primitives,
        });
    }

    for skin in document.skins() {
        let reader = skin.reader(buffer_data);
        graph.skins.push(Skin {
            name: skin.name().map(str::to_owned),
            joints: skin.joints().map(|j| j.index()).collect(),
            inverse_bind_matrices: reader
                .read_inverse_bind_matrices()
                .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
                .unwrap_or_default(),
        });
    }

    for material in document.materials() {
        let pbr = material.pbr_metallic_roughness();
        graph.materials.push(Material {
            name: material.name().map(str::to_owned),
            base_color: pbr.base_color_factor(),
            base_color_texture: pbr.base_color_texture().map(|info| info.texture().index()),
            double_sided: material.double_sided(),
        });
    }

    let mut clips = Vec::new();
    for animation in document.animations() {
        let name = animation
            .name()
            .map_or_else(|| format!("Animation {}", animation.index()), str::to_owned);

        let mut tracks = Vec::new();
        for channel in animation.channels() {
            let target = channel.target().node().index();
            let reader = channel.reader(buffer_data);

            let times: Vec<f32> = reader
                .read_inputs()
                .ok_or_else(|| {
                    LoadError::Malformed(format!("clip '{name}' has a channel without key times"))
                })?
                .collect();

            let values = match reader.read_outputs() {
                Some(ReadOutputs::Translations(iter)) => {
                    TrackValues::Translation(iter.map(Vec3::from).collect())
                }
                Some(ReadOutputs::Rotations(rotations)) => TrackValues::Rotation(
                    rotations.into_f32().map(Quat::from_array).collect(),
                ),
                Some(ReadOutputs::Scales(iter)) => TrackValues::Scale(iter.map(Vec3::from).collect()),
                Some(ReadOutputs::MorphTargetWeights(_)) => {
                    log::debug!("Skipping morph target channel of clip '{name}'");
                    continue;
                }
                None => {
                    return Err(LoadError::Malformed(format!(
                        "clip '{name}' has a channel without output values"
                    )));
                }
            };

            let interpolation = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Step => Interpolation::Step,
                gltf::animation::Interpolation::Linear => Interpolation::Linear,
                gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
            };

            tracks.push(Track {
                target,
                interpolation,
                times,
                values,
            });
        }

        clips.push(AnimationClip::new(name, tracks));
    }

    log::debug!(
        "Parsed glTF: {} nodes, {} meshes, {} skins, {} clips",
        graph.nodes.len(),
        graph.meshes.len(),
        graph.skins.len(),
        clips.len()
    );

    Ok(LoadedAsset { graph, clips })
}
