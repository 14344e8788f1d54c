//! Node hierarchy stored as an arena
//!
//! Nodes refer to each other by index. A parent is always inserted before its
//! children, so world transforms can be computed in a single forward pass.

use crate::foundation::math::Mat4;

/// Scene node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Index of this node in the arena
    pub node_id: usize,
    /// Parent node, `None` for roots
    pub parent: Option<usize>,
    /// Child nodes in insertion order
    pub children: Vec<usize>,
    /// Meshes drawn with this node's transform
    pub mesh_ids: Vec<usize>,
    /// Transform relative to the parent
    pub local_transform: Mat4,
}

/// Arena of nodes with parent/child links
#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    nodes: Vec<Node>,
}

impl NodeTree {
    /// Empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node under `parent`. Returns `None` when the parent does not exist.
    pub fn push(&mut self, parent: Option<usize>, local_transform: Mat4) -> Option<usize> {
        let node_id = self.nodes.len();
        if let Some(parent_id) = parent {
            self.nodes.get_mut(parent_id)?.children.push(node_id);
        }
        self.nodes.push(Node {
            node_id,
            parent,
            children: Vec::new(),
            mesh_ids: Vec::new(),
            local_transform,
        });
        Some(node_id)
    }

    /// Attach a mesh to a node
    pub fn attach_mesh(&mut self, node_id: usize, mesh_id: usize) -> bool {
        match self.nodes.get_mut(node_id) {
            Some(node) => {
                node.mesh_ids.push(mesh_id);
                true
            }
            None => false,
        }
    }

    /// Node by id
    pub fn get(&self, node_id: usize) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// All nodes in arena order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Replace a node's local transform
    pub fn set_local_transform(&mut self, node_id: usize, transform: Mat4) -> bool {
        match self.nodes.get_mut(node_id) {
            Some(node) => {
                node.local_transform = transform;
                true
            }
            None => false,
        }
    }

    /// Product of the ancestors' local transforms and the node's own
    pub fn world_transform(&self, node_id: usize) -> Option<Mat4> {
        let mut node = self.nodes.get(node_id)?;
        let mut transform = node.local_transform;
        while let Some(parent_id) = node.parent {
            node = self.nodes.get(parent_id)?;
            transform = node.local_transform * transform;
        }
        Some(transform)
    }

    /// World transform of every node, indexed by node id
    pub fn world_transforms(&self) -> Vec<Mat4> {
        let mut world: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let parent = node.parent.and_then(|id| world.get(id).copied()).unwrap_or_else(Mat4::identity);
            world.push(parent * node.local_transform);
        }
        world
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new_translation(&Vec3::new(x, y, z))
    }

    #[test]
    fn test_parent_links() {
        let mut tree = NodeTree::new();
        let root = tree.push(None, Mat4::identity()).unwrap();
        let child = tree.push(Some(root), Mat4::identity()).unwrap();
        assert_eq!(tree.get(root).unwrap().children, vec![child]);
        assert_eq!(tree.get(child).unwrap().parent, Some(root));
        assert!(tree.push(Some(7), Mat4::identity()).is_none());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_world_transform_composes_ancestors() {
        let mut tree = NodeTree::new();
        let root = tree.push(None, translation(1.0, 0.0, 0.0)).unwrap();
        let child = tree.push(Some(root), Mat4::new_scaling(2.0)).unwrap();
        let leaf = tree.push(Some(child), translation(0.0, 1.0, 0.0)).unwrap();

        let world = tree.world_transform(leaf).unwrap();
        let origin = world.transform_point(&nalgebra::Point3::origin());
        assert_relative_eq!(origin.coords, Vec3::new(1.0, 2.0, 0.0));

        let all = tree.world_transforms();
        assert_relative_eq!(all[leaf], world);
    }

    #[test]
    fn test_set_local_transform_moves_subtree() {
        let mut tree = NodeTree::new();
        let root = tree.push(None, Mat4::identity()).unwrap();
        let child = tree.push(Some(root), translation(0.0, 0.0, 1.0)).unwrap();

        assert!(tree.set_local_transform(root, translation(3.0, 0.0, 0.0)));
        let world = tree.world_transforms();
        assert_relative_eq!(world[child], translation(3.0, 0.0, 1.0));
        assert!(!tree.set_local_transform(9, Mat4::identity()));
    }

    #[test]
    fn test_clear() {
        let mut tree = NodeTree::new();
        let root = tree.push(None, Mat4::identity()).unwrap();
        assert!(tree.attach_mesh(root, 0));
        tree.clear();
        assert!(tree.is_empty());
    }
}
