//! Tree rendering for scene hierarchies

use console::Style;
use cue_model::{AnimationClip, SceneGraph};

use super::format::{format_seconds, format_vec3};

/// A node in a rendered tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub children: Vec<TreeNode>,
    /// Shown after the name, in insertion order
    pub metadata: Vec<(String, String)>,
}

/// Kinds of tree entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Root,
    Group,
    Node,
    Joint,
    Mesh,
    Clip,
}

/// Options for tree rendering
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub no_color: bool,
    pub show_metadata: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            no_color: false,
            show_metadata: true,
        }
    }
}

impl TreeNode {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            children: Vec::new(),
            metadata: Vec::new(),
        }
    }

    pub fn add_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.push((key.to_string(), value.into()));
        self
    }
}

impl NodeType {
    pub fn icon(self) -> &'static str {
        match self {
            NodeType::Root => "📦",
            NodeType::Group => "📁",
            NodeType::Node => "◦",
            NodeType::Joint => "🦴",
            NodeType::Mesh => "🔷",
            NodeType::Clip => "🎞️",
        }
    }

    pub fn style(self, no_color: bool) -> Style {
        if no_color {
            return Style::new();
        }
        match self {
            NodeType::Root => Style::new().bold().cyan(),
            NodeType::Group => Style::new().bold().yellow(),
            NodeType::Node => Style::new(),
            NodeType::Joint => Style::new().magenta(),
            NodeType::Mesh => Style::new().green(),
            NodeType::Clip => Style::new().blue(),
        }
    }
}

fn scene_node(graph: &SceneGraph, index: usize, visited: &mut [bool]) -> TreeNode {
    visited[index] = true;
    let node = &graph.nodes[index];

    let is_joint = graph.skins.iter().any(|s| s.joints.contains(&index));
    let node_type = if node.mesh.is_some() {
        NodeType::Mesh
    } else if is_joint {
        NodeType::Joint
    } else {
        NodeType::Node
    };

    let name = node
        .name
        .clone()
        .unwrap_or_else(|| format!("node {index}"));
    let mut tree = TreeNode::new(format!("[{index}] {name}"), node_type);

    if node.transform.translation != glam::Vec3::ZERO {
        tree = tree.with_metadata("t", format_vec3(node.transform.translation));
    }
    if let Some(mesh) = node.mesh.and_then(|m| graph.meshes.get(m)) {
        tree = tree.with_metadata("vertices", mesh.vertex_count().to_string());
    }
    if let Some(skin) = node.skin {
        tree = tree.with_metadata("skin", skin.to_string());
    }

    for &child in &node.children {
        if child < visited.len() && !visited[child] {
            tree = tree.add_child(scene_node(graph, child, visited));
        }
    }
    tree
}

/// Build a tree of the scene hierarchy plus a group listing the clips
pub fn scene_tree(title: &str, graph: &SceneGraph, clips: &[AnimationClip]) -> TreeNode {
    let mut visited = vec![false; graph.nodes.len()];
    let mut scene = TreeNode::new("Scene", NodeType::Group)
        .with_metadata("nodes", graph.nodes.len().to_string());
    for &root in &graph.roots {
        if root < visited.len() && !visited[root] {
            scene = scene.add_child(scene_node(graph, root, &mut visited));
        }
    }

    let mut animations =
        TreeNode::new("Animations", NodeType::Group).with_metadata("clips", clips.len().to_string());
    for (index, clip) in clips.iter().enumerate() {
        animations = animations.add_child(
            TreeNode::new(format!("[{index}] {}", clip.name), NodeType::Clip)
                .with_metadata("duration", format_seconds(clip.duration)),
        );
    }

    TreeNode::new(title, NodeType::Root)
        .add_child(scene)
        .add_child(animations)
}

/// Render a tree structure to string
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let mut output = String::new();
    render_node(root, &mut output, "", true, 0, options);
    output
}

fn render_node(
    node: &TreeNode,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &TreeOptions,
) {
    if let Some(max_depth) = options.max_depth
        && depth > max_depth
    {
        return;
    }

    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };
    let style = node.node_type.style(options.no_color);

    output.push_str(prefix);
    output.push_str(connector);
    output.push_str(node.node_type.icon());
    output.push(' ');
    output.push_str(&style.apply_to(&node.name).to_string());

    if options.show_metadata && !node.metadata.is_empty() {
        let meta: Vec<String> = node
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect();
        let meta_style = if options.no_color {
            Style::new()
        } else {
            Style::new().dim()
        };
        output.push_str(&format!(" {}", meta_style.apply_to(format!("[{}]", meta.join(", ")))));
    }
    output.push('\n');

    let child_prefix = if depth == 0 {
        String::new()
    } else {
        format!("{prefix}{}", if is_last { "    " } else { "│   " })
    };
    for (i, child) in node.children.iter().enumerate() {
        render_node(
            child,
            output,
            &child_prefix,
            i == node.children.len() - 1,
            depth + 1,
            options,
        );
    }
}
