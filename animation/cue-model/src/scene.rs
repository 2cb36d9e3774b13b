//! Owned scene graph for one model instance
//!
//! Nodes live in an arena and are addressed by index. Every buffer (vertex
//! data, skins, materials) is an owned `Vec`, so [`SceneGraph::duplicate`]
//! is a deep copy: two graphs never share skeleton or geometry storage.

use glam::{Mat4, Quat, Vec3};

/// Local transform of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A node in the scene graph
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: Option<String>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub transform: Transform,
    /// Index into [`SceneGraph::meshes`]
    pub mesh: Option<usize>,
    /// Index into [`SceneGraph::skins`]
    pub skin: Option<usize>,
    /// World matrix as of the last [`SceneGraph::update_world_matrices`]
    pub world: Mat4,
}

impl SceneNode {
    pub fn new(name: Option<String>, transform: Transform) -> Self {
        Self {
            name,
            parent: None,
            children: Vec::new(),
            transform,
            mesh: None,
            skin: None,
            world: Mat4::IDENTITY,
        }
    }
}

/// One drawable primitive of a mesh
#[derive(Debug, Clone, Default)]
pub struct Primitive {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    /// Joint indices into the node's skin, four influences per vertex
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<[f32; 4]>,
    pub material: Option<usize>,
}

impl Primitive {
    pub fn is_skinned(&self) -> bool {
        !self.joints.is_empty() && self.joints.len() == self.weights.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(|p| p.positions.len()).sum()
    }
}

/// Skeleton binding: joint nodes and their inverse bind matrices
#[derive(Debug, Clone, Default)]
pub struct Skin {
    pub name: Option<String>,
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Vec<Mat4>,
}

#[derive(Debug, Clone)]
pub struct Material {
    pub name: Option<String>,
    pub base_color: [f32; 4],
    pub base_color_texture: Option<usize>,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color: [1.0, 1.0, 1.0, 1.0],
            base_color_texture: None,
            double_sided: false,
        }
    }
}

/// Arena-backed scene graph
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    pub nodes: Vec<SceneNode>,
    pub meshes: Vec<Mesh>,
    pub skins: Vec<Skin>,
    pub materials: Vec<Material>,
    /// Top-level nodes, in scene order
    pub roots: Vec<usize>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parentless node and register it as a root
    pub fn add_node(&mut self, node: SceneNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        self.roots.push(index);
        index
    }

    /// Re-parent `child` under `parent`, detaching it from any previous parent
    pub fn attach(&mut self, parent: usize, child: usize) {
        if parent >= self.nodes.len() || child >= self.nodes.len() || parent == child {
            return;
        }

        if let Some(old) = self.nodes[child].parent {
            self.nodes[old].children.retain(|&c| c != child);
        }
        self.roots.retain(|&r| r != child);

        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    pub fn node(&self, index: usize) -> Option<&SceneNode> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut SceneNode> {
        self.nodes.get_mut(index)
    }

    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.name.as_deref() == Some(name))
    }

    /// Node indices in depth-first order, parents before children
    pub fn traverse(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        let mut visited = vec![false; self.nodes.len()];

        while let Some(index) = stack.pop() {
            if index >= self.nodes.len() || visited[index] {
                continue;
            }
            visited[index] = true;
            order.push(index);
            stack.extend(self.nodes[index].children.iter().rev());
        }

        order
    }

    /// Recompute every node's world matrix from its local transform
    pub fn update_world_matrices(&mut self) {
        for index in self.traverse() {
            let local = self.nodes[index].transform.to_matrix();
            let world = match self.nodes[index].parent {
                Some(parent) => self.nodes[parent].world * local,
                None => local,
            };
            self.nodes[index].world = world;
        }
    }

    /// Whether any node carries a skin
    pub fn is_skinned(&self) -> bool {
        self.nodes.iter().any(|n| n.skin.is_some())
    }

    /// Deep copy of nodes, geometry, skins and materials
    pub fn duplicate(&self) -> Self {
        self.clone()
    }
}
