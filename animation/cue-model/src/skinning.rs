//! Linear-blend skinning and skinned bounding boxes
//!
//! Skinned meshes are stored in bind pose. To know where a deformed vertex
//! actually is, each influencing joint contributes
//! `world(joint) * inverse_bind(joint) * position`, weighted by the vertex's
//! joint weight. Bounding boxes computed from the bind pose alone are wrong
//! for animated characters, so [`skinned_bounds`] walks the posed vertices.
//!
//! # Example
//!
//! ```rust
//! use cue_model::scene::SceneGraph;
//! use cue_model::skinning::skinned_bounds;
//!
//! let mut graph = SceneGraph::new();
//! graph.update_world_matrices();
//!
//! // No geometry, no bounds
//! assert!(skinned_bounds(&graph).is_none());
//! ```

use glam::{Mat4, Vec3};

use crate::math::Aabb;
use crate::scene::{Primitive, SceneGraph, Skin};

/// Weights below this are ignored
const WEIGHT_THRESHOLD: f32 = 0.001;

/// Per-joint skinning matrices for one skin
///
/// Uses the world matrices from the last
/// [`SceneGraph::update_world_matrices`]. Joints without an inverse bind
/// matrix use the identity.
pub fn joint_matrices(graph: &SceneGraph, skin: &Skin) -> Vec<Mat4> {
    skin.joints
        .iter()
        .enumerate()
        .map(|(i, &joint)| {
            let world = graph.node(joint).map_or(Mat4::IDENTITY, |n| n.world);
            let inverse_bind = skin
                .inverse_bind_matrices
                .get(i)
                .copied()
                .unwrap_or(Mat4::IDENTITY);
            world * inverse_bind
        })
        .collect()
}

/// Deform one bind-pose position by up to four joint influences
///
/// Weights are normalized. A vertex with no usable influence keeps its bind
/// position.
pub fn skin_vertex(position: Vec3, joints: [u16; 4], weights: [f32; 4], matrices: &[Mat4]) -> Vec3 {
    let mut skinned = Vec3::ZERO;
    let mut total_weight = 0.0f32;

    for (&joint, &weight) in joints.iter().zip(&weights) {
        if weight < WEIGHT_THRESHOLD {
            continue;
        }
        let Some(matrix) = matrices.get(joint as usize) else {
            continue;
        };
        skinned += matrix.transform_point3(position) * weight;
        total_weight += weight;
    }

    if total_weight < WEIGHT_THRESHOLD {
        return position;
    }
    skinned / total_weight
}

fn extend_primitive(bounds: &mut Option<Aabb>, primitive: &Primitive, node_world: Mat4, matrices: Option<&[Mat4]>) {
    for (i, &position) in primitive.positions.iter().enumerate() {
        let point = match matrices {
            Some(matrices) if primitive.is_skinned() => {
                let joints = primitive.joints.get(i).copied().unwrap_or_default();
                let weights = primitive.weights.get(i).copied().unwrap_or_default();
                skin_vertex(position, joints, weights, matrices)
            }
            _ => node_world.transform_point3(position),
        };

        match bounds {
            Some(aabb) => aabb.extend(point),
            None => *bounds = Some(Aabb::from_point(point)),
        }
    }
}

/// World-space bounds of every mesh in the graph in its current pose
///
/// Returns None when the graph has no vertices.
pub fn skinned_bounds(graph: &SceneGraph) -> Option<Aabb> {
    let mut bounds = None;

    for node in &graph.nodes {
        let Some(mesh) = node.mesh.and_then(|m| graph.meshes.get(m)) else {
            continue;
        };
        let matrices = node
            .skin
            .and_then(|s| graph.skins.get(s))
            .map(|skin| joint_matrices(graph, skin));

        for primitive in &mesh.primitives {
            extend_primitive(&mut bounds, primitive, node.world, matrices.as_deref());
        }
    }

    bounds
}
