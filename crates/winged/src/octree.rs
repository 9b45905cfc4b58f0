//! Loose octree over the faces of a mesh.
//!
//! - A face lives in exactly one node, chosen by its center and scale band:
//!   it descends while its extent is at most `width * relative_min_face_extent`.
//! - Queries test nodes against bounds scaled by `loose_factor`, so faces that
//!   drifted a little after a vertex move are still found.
//! - Degenerated faces are kept in a separate bucket and never queried.
//! - The root grows towards faces outside of it and shrinks when only one
//!   child subtree remains.
//!
//! The tree stores face slots only. Queries receive the face geometry through
//! a closure so the mesh stays the single owner of positions.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;
use sculpt_config::OctreeConfig;
use tracing::trace;

use crate::intersection::{plane_aabb, plane_triangle, ray_aabb, ray_triangle, sphere_aabb, sphere_triangle};
use crate::primitive::{Aabb, Plane, Ray, Sphere, Triangle};
use crate::types::FaceId;

/// Slot of an octree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Where a face is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Node(NodeId),
    Degenerated,
}

/// A cube region of the octree
#[derive(Debug, Clone)]
pub struct OctreeNode {
    center: Vec3,
    width: f32,
    depth: i32,
    parent: Option<NodeId>,
    children: Option<[NodeId; 8]>,
    faces: BTreeSet<FaceId>,
}

impl OctreeNode {
    fn new(center: Vec3, width: f32, depth: i32, parent: Option<NodeId>) -> Self {
        Self {
            center,
            width,
            depth,
            parent,
            children: None,
            faces: BTreeSet::new(),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    /// Depth relative to the first root; negative after the root grew
    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> Option<&[NodeId; 8]> {
        self.children.as_ref()
    }

    pub fn faces(&self) -> &BTreeSet<FaceId> {
        &self.faces
    }

    fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.children.is_none()
    }

    /// Center inside the node (boundary included) and extent at most its width
    fn approx_contains(&self, center: Vec3, extent: f32) -> bool {
        Aabb::cube(self.center, self.width).contains_point(center) && extent <= self.width
    }

    /// Octant of `position`: `+4` for x, `+2` for y, `+1` for z above the center
    fn child_index(&self, position: Vec3) -> usize {
        let mut index = 0;
        if self.center.x < position.x {
            index += 4;
        }
        if self.center.y < position.y {
            index += 2;
        }
        if self.center.z < position.z {
            index += 1;
        }
        index
    }

    fn loose_aabb(&self, loose_factor: f32) -> Aabb {
        Aabb::cube(self.center, self.width * loose_factor)
    }
}

/// Face hit by a ray query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeHit {
    pub face: FaceId,
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Shape of the tree, for diagnostics and tests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OctreeStatistics {
    pub num_nodes: usize,
    pub num_faces: usize,
    pub num_degenerated_faces: usize,
    pub min_depth: Option<i32>,
    pub max_depth: Option<i32>,
    pub max_faces_per_node: usize,
    pub num_faces_per_depth: BTreeMap<i32, usize>,
    pub num_nodes_per_depth: BTreeMap<i32, usize>,
}

#[derive(Debug, Clone)]
pub struct Octree {
    config: OctreeConfig,
    epsilon: f32,
    nodes: Vec<Option<OctreeNode>>,
    free_nodes: Vec<u32>,
    root: Option<NodeId>,
    root_setup: Option<(Vec3, f32)>,
    degenerated: BTreeSet<FaceId>,
    num_faces: usize,
}

impl Octree {
    pub fn new(config: OctreeConfig, epsilon: f32) -> Self {
        Self {
            config,
            epsilon,
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            root: None,
            root_setup: None,
            degenerated: BTreeSet::new(),
            num_faces: 0,
        }
    }

    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Place of the root once the first face arrives.
    ///
    /// Without a setup the root is centered on the first face.
    pub fn setup_root(&mut self, center: Vec3, width: f32) {
        debug_assert!(self.root.is_none());
        self.root_setup = Some((center, width));
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&OctreeNode> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Number of stored faces, degenerated ones included
    pub fn num_faces(&self) -> usize {
        self.num_faces
    }

    pub fn num_degenerated_faces(&self) -> usize {
        self.degenerated.len()
    }

    pub fn some_degenerated_face(&self) -> Option<FaceId> {
        self.degenerated.first().copied()
    }

    pub fn reset(&mut self) {
        self.nodes.clear();
        self.free_nodes.clear();
        self.root = None;
        self.root_setup = None;
        self.degenerated.clear();
        self.num_faces = 0;
    }

    // ========================================================================
    // Node arena
    // ========================================================================

    fn alloc(&mut self, node: OctreeNode) -> NodeId {
        match self.free_nodes.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() as u32 - 1)
            }
        }
    }

    fn free(&mut self, id: NodeId) {
        if let Some(slot) = self.nodes.get_mut(id.0 as usize) {
            if slot.take().is_some() {
                self.free_nodes.push(id.0);
            }
        }
    }

    /// # Panics
    /// If `id` names a freed node.
    fn get(&self, id: NodeId) -> &OctreeNode {
        match self.node(id) {
            Some(node) => node,
            None => panic!("access to freed octree node {}", id.0),
        }
    }

    fn get_mut(&mut self, id: NodeId) -> &mut OctreeNode {
        match self.nodes.get_mut(id.0 as usize).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("access to freed octree node {}", id.0),
        }
    }

    fn make_children(&mut self, id: NodeId) -> [NodeId; 8] {
        let (center, width, depth) = {
            let node = self.get(id);
            (node.center, node.width, node.depth)
        };
        let q = width * 0.25;
        let mut children = [NodeId(0); 8];
        for (index, child) in children.iter_mut().enumerate() {
            let offset = Vec3::new(
                if index & 4 != 0 { q } else { -q },
                if index & 2 != 0 { q } else { -q },
                if index & 1 != 0 { q } else { -q },
            );
            *child = self.alloc(OctreeNode::new(center + offset, width * 0.5, depth + 1, Some(id)));
        }
        self.get_mut(id).children = Some(children);
        children
    }

    // ========================================================================
    // Insert / delete / realign
    // ========================================================================

    /// Store a face and return the node now holding it
    pub fn insert(&mut self, face: FaceId, triangle: &Triangle) -> NodeRef {
        self.num_faces += 1;

        if triangle.is_degenerated(self.epsilon) {
            self.degenerated.insert(face);
            return NodeRef::Degenerated;
        }

        let center = triangle.center();
        let extent = triangle.one_dim_extent();

        let mut id = match self.root {
            Some(root) => root,
            None => self.init_root(center, extent),
        };
        while !self.get(id).approx_contains(center, extent) {
            id = self.make_parent(center);
        }

        loop {
            let node = self.get(id);
            if extent <= node.width * self.config.relative_min_face_extent {
                let index = node.child_index(center);
                let existing = node.children;
                let children = match existing {
                    Some(children) => children,
                    None => self.make_children(id),
                };
                id = children[index];
            } else {
                self.get_mut(id).faces.insert(face);
                return NodeRef::Node(id);
            }
        }
    }

    fn init_root(&mut self, center: Vec3, extent: f32) -> NodeId {
        let (position, width) = self
            .root_setup
            .unwrap_or((center, extent + self.config.root_padding));
        let root = self.alloc(OctreeNode::new(position, width, 0, None));
        self.root = Some(root);
        root
    }

    /// Wrap the root as one child of a root twice as wide, grown towards `towards`
    fn make_parent(&mut self, towards: Vec3) -> NodeId {
        let old_root = match self.root {
            Some(root) => root,
            None => panic!("make_parent on an octree without root"),
        };
        let (root_center, root_width, root_depth) = {
            let root = self.get(old_root);
            (root.center, root.width, root.depth)
        };
        let half = root_width * 0.5;
        let mut parent_center = Vec3::ZERO;
        let mut index: usize = 0;

        for axis in 0..3 {
            if root_center[axis] < towards[axis] {
                parent_center[axis] = root_center[axis] + half;
            } else {
                parent_center[axis] = root_center[axis] - half;
                index += 4 >> axis;
            }
        }

        let new_root = self.alloc(OctreeNode::new(parent_center, root_width * 2.0, root_depth - 1, None));
        let mut children = self.make_children(new_root);
        self.free(children[index]);
        children[index] = old_root;
        self.get_mut(new_root).children = Some(children);
        self.get_mut(old_root).parent = Some(new_root);
        self.root = Some(new_root);

        trace!(depth = root_depth - 1, width = root_width * 2.0, "octree root grew");
        new_root
    }

    /// Remove a face from the node named by its back-reference
    pub fn delete(&mut self, face: FaceId, node: NodeRef) {
        match node {
            NodeRef::Degenerated => {
                let removed = self.degenerated.remove(&face);
                debug_assert!(removed, "{face} not in degenerated bucket");
            }
            NodeRef::Node(id) => {
                let removed = self.get_mut(id).faces.remove(&face);
                debug_assert!(removed, "{face} not in octree node {}", id.0);
                self.prune(id);
            }
        }
        self.num_faces -= 1;

        if let Some(root) = self.root {
            if self.get(root).is_empty() {
                self.free(root);
                self.root = None;
            } else {
                self.shrink_root();
            }
        }
    }

    /// Drop children that are all empty, walking upwards
    fn prune(&mut self, id: NodeId) {
        let mut current = id;
        while self.get(current).is_empty() {
            let Some(parent) = self.get(current).parent else {
                return;
            };
            let Some(children) = self.get(parent).children else {
                return;
            };
            if children.iter().any(|&child| !self.get(child).is_empty()) {
                return;
            }
            for child in children {
                self.free(child);
            }
            self.get_mut(parent).children = None;
            current = parent;
        }
    }

    /// Replace the root by its only non-empty child while the root holds no faces
    pub fn shrink_root(&mut self) {
        while let Some(root) = self.root {
            let node = self.get(root);
            let Some(children) = node.children else {
                return;
            };
            if !node.faces.is_empty() {
                return;
            }
            let mut non_empty = children.iter().filter(|&&child| !self.get(child).is_empty());
            let (Some(&single), None) = (non_empty.next(), non_empty.next()) else {
                return;
            };
            for child in children {
                if child != single {
                    self.free(child);
                }
            }
            self.free(root);
            self.get_mut(single).parent = None;
            self.root = Some(single);
        }
    }

    /// Move a face after its geometry changed.
    ///
    /// Faces still sitting in the node an insert would choose are left alone.
    pub fn realign(&mut self, face: FaceId, node: NodeRef, triangle: &Triangle) -> NodeRef {
        if self.is_placed(node, triangle) {
            return node;
        }
        self.delete(face, node);
        self.insert(face, triangle)
    }

    fn is_placed(&self, node: NodeRef, triangle: &Triangle) -> bool {
        let degenerated = triangle.is_degenerated(self.epsilon);
        match node {
            NodeRef::Degenerated => degenerated,
            NodeRef::Node(_) if degenerated => false,
            NodeRef::Node(id) => {
                let center = triangle.center();
                let extent = triangle.one_dim_extent();
                let rel = self.config.relative_min_face_extent;
                let node = self.get(id);
                let fits_parent = node
                    .parent
                    .is_none_or(|parent| extent <= self.get(parent).width * rel);
                node.approx_contains(center, extent) && extent > node.width * rel && fits_parent
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Closest face hit by `ray`
    pub fn intersect_ray(&self, ray: &Ray, triangle: impl Fn(FaceId) -> Triangle) -> Option<OctreeHit> {
        let mut best: Option<OctreeHit> = None;
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();

        while let Some(id) = stack.pop() {
            let node = self.get(id);
            if !ray_aabb(ray, &node.loose_aabb(self.config.loose_factor)) {
                continue;
            }
            for &face in &node.faces {
                let tri = triangle(face);
                if let Some(hit) = ray_triangle(ray, &tri, self.epsilon) {
                    let distance = ray.origin.distance(hit.point);
                    if best.is_none_or(|b| distance < b.distance) {
                        best = Some(OctreeHit {
                            face,
                            distance,
                            point: hit.point,
                            normal: tri.normal(),
                        });
                    }
                }
            }
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
        best
    }

    /// All faces touching `sphere`, in ascending slot order
    pub fn intersect_sphere(&self, sphere: &Sphere, triangle: impl Fn(FaceId) -> Triangle) -> Vec<FaceId> {
        self.collect(
            |aabb| sphere_aabb(sphere, aabb),
            |face| sphere_triangle(sphere, &triangle(face)),
        )
    }

    /// All faces crossed by `plane`, in ascending slot order
    pub fn intersect_plane(&self, plane: &Plane, triangle: impl Fn(FaceId) -> Triangle) -> Vec<FaceId> {
        self.collect(
            |aabb| plane_aabb(plane, aabb),
            |face| plane_triangle(plane, &triangle(face), self.epsilon),
        )
    }

    fn collect(&self, node_test: impl Fn(&Aabb) -> bool, face_test: impl Fn(FaceId) -> bool) -> Vec<FaceId> {
        let mut faces = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();

        while let Some(id) = stack.pop() {
            let node = self.get(id);
            if !node_test(&node.loose_aabb(self.config.loose_factor)) {
                continue;
            }
            faces.extend(node.faces.iter().copied().filter(|&face| face_test(face)));
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
        faces.sort_unstable();
        faces
    }

    /// Every place `face` is stored, by full scan
    pub fn scan_face(&self, face: FaceId) -> Vec<NodeRef> {
        let mut found: Vec<NodeRef> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(slot, node)| node.as_ref().map(|n| (NodeId(slot as u32), n)))
            .filter(|(_, node)| node.faces.contains(&face))
            .map(|(id, _)| NodeRef::Node(id))
            .collect();
        if self.degenerated.contains(&face) {
            found.push(NodeRef::Degenerated);
        }
        found
    }

    pub fn statistics(&self) -> OctreeStatistics {
        let mut stats = OctreeStatistics {
            num_degenerated_faces: self.degenerated.len(),
            num_faces: self.degenerated.len(),
            ..Default::default()
        };
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();

        while let Some(id) = stack.pop() {
            let node = self.get(id);
            let faces = node.faces.len();
            stats.num_nodes += 1;
            stats.num_faces += faces;
            stats.min_depth = Some(stats.min_depth.map_or(node.depth, |d| d.min(node.depth)));
            stats.max_depth = Some(stats.max_depth.map_or(node.depth, |d| d.max(node.depth)));
            stats.max_faces_per_node = stats.max_faces_per_node.max(faces);
            *stats.num_faces_per_depth.entry(node.depth).or_default() += faces;
            *stats.num_nodes_per_depth.entry(node.depth).or_default() += 1;

            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn octree() -> Octree {
        Octree::new(OctreeConfig::default(), 1e-4)
    }

    fn small_triangle(at: Vec3, size: f32) -> Triangle {
        Triangle::new(at, at + Vec3::X * size, at + Vec3::Y * size)
    }

    #[test]
    fn test_small_faces_descend() {
        let mut tree = octree();
        tree.setup_root(Vec3::ZERO, 2.0);

        let big = tree.insert(FaceId(0), &small_triangle(Vec3::ZERO, 1.0));
        let small = tree.insert(FaceId(1), &small_triangle(Vec3::splat(0.5), 0.01));

        let NodeRef::Node(big) = big else { panic!("big face is degenerated") };
        let NodeRef::Node(small) = small else { panic!("small face is degenerated") };
        assert_eq!(tree.node(big).unwrap().depth(), 0);
        assert!(tree.node(small).unwrap().depth() > 0);
        assert_eq!(tree.num_faces(), 2);
    }

    #[test]
    fn test_root_grows_towards_outside_face() {
        let mut tree = octree();
        tree.setup_root(Vec3::ZERO, 1.0);
        tree.insert(FaceId(0), &small_triangle(Vec3::ZERO, 0.5));
        let node = tree.insert(FaceId(1), &small_triangle(Vec3::splat(3.0), 0.5));

        let root = tree.node(tree.root().unwrap()).unwrap();
        assert!(root.depth() < 0);
        assert!(root.width() >= 4.0);
        assert_eq!(tree.scan_face(FaceId(1)), vec![node]);
    }

    #[test]
    fn test_delete_prunes_and_empties() {
        let mut tree = octree();
        tree.setup_root(Vec3::ZERO, 2.0);
        let a = tree.insert(FaceId(0), &small_triangle(Vec3::ZERO, 1.0));
        let b = tree.insert(FaceId(1), &small_triangle(Vec3::splat(0.5), 0.01));

        tree.delete(FaceId(1), b);
        assert!(tree.scan_face(FaceId(1)).is_empty());
        assert_eq!(tree.statistics().num_nodes, 1);

        tree.delete(FaceId(0), a);
        assert!(tree.root().is_none());
        assert_eq!(tree.num_faces(), 0);
    }

    #[test]
    fn test_shrink_root_after_growth() {
        let mut tree = octree();
        tree.setup_root(Vec3::ZERO, 1.0);
        let a = tree.insert(FaceId(0), &small_triangle(Vec3::ZERO, 0.5));
        tree.insert(FaceId(1), &small_triangle(Vec3::splat(3.0), 0.1));
        let grown_depth = tree.node(tree.root().unwrap()).unwrap().depth();

        tree.delete(FaceId(0), a);
        let root = tree.node(tree.root().unwrap()).unwrap();
        assert!(root.depth() > grown_depth);
        assert_eq!(tree.statistics().num_faces, 1);
    }

    #[test]
    fn test_degenerated_faces_use_bucket() {
        let mut tree = octree();
        let flat = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert_eq!(tree.insert(FaceId(3), &flat), NodeRef::Degenerated);
        assert_eq!(tree.some_degenerated_face(), Some(FaceId(3)));

        let fixed = small_triangle(Vec3::ZERO, 1.0);
        let node = tree.realign(FaceId(3), NodeRef::Degenerated, &fixed);
        assert!(matches!(node, NodeRef::Node(_)));
        assert_eq!(tree.some_degenerated_face(), None);
        assert_eq!(tree.num_faces(), 1);
    }

    #[test]
    fn test_realign_fast_path_keeps_node() {
        let mut tree = octree();
        tree.setup_root(Vec3::ZERO, 2.0);
        let tri = small_triangle(Vec3::ZERO, 1.0);
        let node = tree.insert(FaceId(0), &tri);
        let moved = small_triangle(Vec3::splat(0.01), 1.0);
        assert_eq!(tree.realign(FaceId(0), node, &moved), node);
    }

    #[test]
    fn test_queries() {
        let mut tree = octree();
        tree.setup_root(Vec3::ZERO, 4.0);
        let tris = [
            small_triangle(Vec3::ZERO, 1.0),
            small_triangle(Vec3::new(0.0, 0.0, 1.0), 1.0),
            small_triangle(Vec3::new(1.5, 1.5, 0.0), 0.2),
        ];
        for (slot, tri) in tris.iter().enumerate() {
            tree.insert(FaceId(slot as u32), tri);
        }
        let lookup = |face: FaceId| tris[face.0 as usize];

        let ray = Ray::new(Vec3::new(0.2, 0.2, 5.0), -Vec3::Z);
        let hit = tree.intersect_ray(&ray, lookup).unwrap();
        assert_eq!(hit.face, FaceId(1));

        let sphere = Sphere::new(Vec3::new(1.6, 1.6, 0.0), 0.1);
        assert_eq!(tree.intersect_sphere(&sphere, lookup), vec![FaceId(2)]);

        let plane = Plane::new(Vec3::new(0.0, 0.0, 0.5), Vec3::Z);
        assert!(tree.intersect_plane(&plane, lookup).is_empty());
        let plane = Plane::new(Vec3::new(0.5, 0.0, 0.0), Vec3::X);
        assert_eq!(tree.intersect_plane(&plane, lookup), vec![FaceId(0), FaceId(1)]);
    }
}
