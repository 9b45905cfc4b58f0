//! The winged-edge mesh container.
//!
//! [`WingedMesh`] owns:
//! - the vertex, edge and face pools
//! - flat position, normal and render-index buffers
//! - the face octree
//!
//! Methods here are raw mutators. They do not record anything; undoable
//! editing goes through the transaction layer of the sculpting crate.

mod construction;
mod geometry;
mod rotation;
mod validation;

use glam::Vec3;
use sculpt_config::KernelConfig;
use tracing::debug;

use crate::affected::AffectedFaces;
use crate::element::{Edge, EdgeGeometry, Face, Vertex};
use crate::octree::{NodeRef, Octree, OctreeHit, OctreeStatistics};
use crate::pool::Pool;
use crate::primitive::{Plane, Ray, Sphere, Triangle};
use crate::types::{EdgeId, ElementRef, FaceId, Identifier, SlotId, VertexId, WingedError};

pub use rotation::{Pivot, Rotation};
pub use validation::ManifoldError;

/// Element counts of a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshStatistics {
    pub num_vertices: usize,
    pub num_edges: usize,
    pub num_faces: usize,
    pub num_free_face_slots: usize,
    pub octree: OctreeStatistics,
}

#[derive(Debug, Clone)]
pub struct WingedMesh {
    identifier: Identifier,
    config: KernelConfig,
    vertices: Pool<VertexId, Vertex>,
    edges: Pool<EdgeId, Edge>,
    faces: Pool<FaceId, Face>,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
    octree: Octree,
}

impl WingedMesh {
    pub fn new(config: KernelConfig) -> Self {
        Self::with_identifier(Identifier::next(), config)
    }

    pub fn with_identifier(identifier: Identifier, config: KernelConfig) -> Self {
        Self {
            identifier,
            config,
            vertices: Pool::new(),
            edges: Pool::new(),
            faces: Pool::new(),
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
            octree: Octree::new(config.octree, config.geometry.epsilon),
        }
    }

    pub fn identifier(&self) -> Identifier {
        self.identifier
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f32 {
        self.config.geometry.epsilon
    }

    // ========================================================================
    // Counts and lookup
    // ========================================================================

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty() && self.faces.is_empty()
    }

    /// # Panics
    /// If `id` names a deleted vertex.
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id]
    }

    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id]
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id]
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id]
    }

    pub fn face_mut(&mut self, id: FaceId) -> &mut Face {
        &mut self.faces[id]
    }

    pub fn get_vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn get_face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id)
    }

    pub fn resolve_vertex(&self, identifier: Identifier) -> Option<VertexId> {
        self.vertices.resolve(identifier)
    }

    pub fn resolve_edge(&self, identifier: Identifier) -> Option<EdgeId> {
        self.edges.resolve(identifier)
    }

    pub fn resolve_face(&self, identifier: Identifier) -> Option<FaceId> {
        self.faces.resolve(identifier)
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.ids()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.ids()
    }

    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.ids()
    }

    pub fn free_face_slots(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.free_slots()
    }

    pub fn some_face(&self) -> Option<FaceId> {
        self.faces.first()
    }

    pub fn vertex_ref(&self, id: VertexId) -> ElementRef<VertexId> {
        ElementRef::new(self.vertices[id].identifier, id)
    }

    pub fn edge_ref(&self, id: EdgeId) -> ElementRef<EdgeId> {
        ElementRef::new(self.edges[id].identifier, id)
    }

    pub fn face_ref(&self, id: FaceId) -> ElementRef<FaceId> {
        ElementRef::new(self.faces[id].identifier, id)
    }

    // ========================================================================
    // Buffers
    // ========================================================================

    pub fn position(&self, vertex: VertexId) -> Vec3 {
        self.positions[vertex.index()]
    }

    pub fn normal(&self, vertex: VertexId) -> Vec3 {
        self.normals[vertex.index()]
    }

    pub fn set_position(&mut self, vertex: VertexId, position: Vec3) {
        self.positions[vertex.index()] = position;
    }

    pub fn set_normal(&mut self, vertex: VertexId, normal: Vec3) {
        self.normals[vertex.index()] = normal;
    }

    /// The three render indices owned by `face`
    pub fn face_indices(&self, face: FaceId) -> [u32; 3] {
        let first = Face::first_index_number(face);
        [self.indices[first], self.indices[first + 1], self.indices[first + 2]]
    }

    pub fn set_face_indices(&mut self, face: FaceId, indices: [u32; 3]) {
        let first = Face::first_index_number(face);
        self.indices[first..first + 3].copy_from_slice(&indices);
    }

    /// Write the render indices of a triangle from its topology.
    ///
    /// # Panics
    /// If `face` is not a triangle.
    pub fn write_indices(&mut self, face: FaceId) {
        assert!(self.is_triangle(face), "{face} is not a triangle");
        let indices = [
            self.face_vertex(face, 0).slot(),
            self.face_vertex(face, 1).slot(),
            self.face_vertex(face, 2).slot(),
        ];
        self.set_face_indices(face, indices);
    }

    /// Refresh the normal buffer entry of `vertex` from its adjacent faces
    pub fn write_normal(&mut self, vertex: VertexId) {
        let normal = self.interpolated_normal(vertex);
        self.set_normal(vertex, normal);
    }

    pub fn write_all_indices(&mut self) {
        let faces: Vec<FaceId> = self.face_ids().collect();
        for face in faces {
            self.write_indices(face);
        }
    }

    pub fn write_all_normals(&mut self) {
        let vertices: Vec<VertexId> = self.vertex_ids().collect();
        for vertex in vertices {
            self.write_normal(vertex);
        }
    }

    /// Prepare the buffers for upload.
    ///
    /// Free face slots copy the indices of a live face so they draw nothing visible.
    pub fn buffer_data(&mut self) {
        let Some(some_face) = self.some_face() else {
            self.indices.iter_mut().for_each(|index| *index = 0);
            return;
        };
        let live = self.face_indices(some_face);
        let free: Vec<FaceId> = self.free_face_slots().collect();
        for face in free {
            self.set_face_indices(face, live);
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    fn grow_vertex_buffers(&mut self) {
        let len = self.vertices.num_slots();
        if self.positions.len() < len {
            self.positions.resize(len, Vec3::ZERO);
            self.normals.resize(len, Vec3::ZERO);
        }
    }

    fn grow_index_buffer(&mut self) {
        let len = 3 * self.faces.num_slots();
        if self.indices.len() < len {
            self.indices.resize(len, 0);
        }
    }

    // ========================================================================
    // Element creation and deletion
    // ========================================================================

    pub fn add_vertex(&mut self, position: Vec3) -> VertexId {
        let id = self.vertices.insert(Vertex::new(Identifier::next()));
        self.grow_vertex_buffers();
        self.set_position(id, position);
        self.set_normal(id, Vec3::ZERO);
        id
    }

    /// Rebuild a vertex at its former slot with its former identifier
    pub fn add_vertex_at(
        &mut self,
        vertex: ElementRef<VertexId>,
        position: Vec3,
        normal: Vec3,
    ) -> Result<(), WingedError> {
        self.vertices
            .insert_at(vertex.slot, Vertex::new(vertex.identifier))?;
        self.grow_vertex_buffers();
        self.set_position(vertex.slot, position);
        self.set_normal(vertex.slot, normal);
        Ok(())
    }

    /// Add an edge whose rotation links still point to itself
    pub fn add_edge(&mut self, vertex1: VertexId, vertex2: VertexId, left: FaceId, right: FaceId) -> EdgeId {
        self.edges.insert_with(|id| {
            Edge::new(
                Identifier::next(),
                EdgeGeometry {
                    vertex1,
                    vertex2,
                    left_face: left,
                    right_face: right,
                    left_predecessor: id,
                    left_successor: id,
                    right_predecessor: id,
                    right_successor: id,
                },
            )
        })
    }

    pub fn add_edge_at(&mut self, edge: ElementRef<EdgeId>, geometry: EdgeGeometry) -> Result<(), WingedError> {
        self.edges
            .insert_at(edge.slot, Edge::new(edge.identifier, geometry))
    }

    /// Add a face without edge and place it in the octree
    pub fn add_face(&mut self, triangle: &Triangle) -> FaceId {
        let octree = &mut self.octree;
        let id = self.faces.insert_with(|id| Face {
            identifier: Identifier::next(),
            edge: None,
            octree_node: octree.insert(id, triangle),
        });
        self.grow_index_buffer();
        id
    }

    pub fn add_face_at(
        &mut self,
        face: ElementRef<FaceId>,
        edge: Option<EdgeId>,
        triangle: &Triangle,
    ) -> Result<(), WingedError> {
        if self.faces.contains(face.slot) {
            return Err(WingedError::SlotOccupied {
                kind: FaceId::KIND,
                slot: face.slot.slot(),
            });
        }
        let octree_node = self.octree.insert(face.slot, triangle);
        self.faces.insert_at(
            face.slot,
            Face {
                identifier: face.identifier,
                edge,
                octree_node,
            },
        )?;
        self.grow_index_buffer();
        Ok(())
    }

    pub fn delete_vertex(&mut self, vertex: VertexId) -> Option<Vertex> {
        self.vertices.remove(vertex)
    }

    pub fn delete_edge(&mut self, edge: EdgeId) -> Option<Edge> {
        self.edges.remove(edge)
    }

    pub fn delete_face(&mut self, face: FaceId) -> Option<Face> {
        let removed = self.faces.remove(face)?;
        self.octree.delete(face, removed.octree_node);
        Some(removed)
    }

    /// Empty the mesh, keeping its identifier and configuration
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.faces.clear();
        self.positions.clear();
        self.normals.clear();
        self.indices.clear();
        self.octree.reset();
    }

    // ========================================================================
    // Octree
    // ========================================================================

    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    pub fn setup_octree_root(&mut self, center: Vec3, width: f32) {
        self.octree.setup_root(center, width);
    }

    /// Re-place a face in the octree after its geometry changed
    pub fn realign_face(&mut self, face: FaceId) {
        let triangle = self.face_triangle(face);
        let node = self.faces[face].octree_node;
        let node = self.octree.realign(face, node, &triangle);
        self.faces[face].octree_node = node;
    }

    pub fn realign_all_faces(&mut self) {
        let faces: Vec<FaceId> = self.face_ids().collect();
        for face in faces {
            self.realign_face(face);
        }
    }

    /// Whether `face` currently sits in the octree's degenerated bucket
    pub fn is_in_degenerated_bucket(&self, face: FaceId) -> bool {
        self.faces[face].octree_node == NodeRef::Degenerated
    }

    pub fn some_degenerated_face(&self) -> Option<FaceId> {
        self.octree.some_degenerated_face()
    }

    /// Closest face hit by `ray`
    pub fn intersect_ray(&self, ray: &Ray) -> Option<OctreeHit> {
        self.octree.intersect_ray(ray, |face| self.face_triangle(face))
    }

    /// Insert every face touching `sphere` into `affected` and commit
    pub fn intersect_sphere(&self, sphere: &Sphere, affected: &mut AffectedFaces) -> bool {
        let faces = self.octree.intersect_sphere(sphere, |face| self.face_triangle(face));
        affected.insert_all(faces.iter().copied());
        affected.commit();
        !faces.is_empty()
    }

    pub fn intersect_plane(&self, plane: &Plane, affected: &mut AffectedFaces) -> bool {
        let faces = self.octree.intersect_plane(plane, |face| self.face_triangle(face));
        affected.insert_all(faces.iter().copied());
        affected.commit();
        !faces.is_empty()
    }

    pub fn statistics(&self) -> MeshStatistics {
        let stats = MeshStatistics {
            num_vertices: self.num_vertices(),
            num_edges: self.num_edges(),
            num_faces: self.num_faces(),
            num_free_face_slots: self.faces.free_slots().count(),
            octree: self.octree.statistics(),
        };
        debug!(
            vertices = stats.num_vertices,
            edges = stats.num_edges,
            faces = stats.num_faces,
            nodes = stats.octree.num_nodes,
            "mesh statistics"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::MeshDefinition;

    fn tetrahedron() -> WingedMesh {
        WingedMesh::from_definition(&MeshDefinition::tetrahedron(), KernelConfig::default()).unwrap()
    }

    #[test]
    fn test_add_and_delete_reuse_slots() {
        let mut mesh = tetrahedron();
        let v = mesh.add_vertex(Vec3::ONE);
        assert_eq!(v, VertexId(4));
        assert_eq!(mesh.position(v), Vec3::ONE);

        let identifier = mesh.vertex(v).identifier;
        mesh.delete_vertex(v);
        assert_eq!(mesh.resolve_vertex(identifier), None);
        assert_eq!(mesh.add_vertex(Vec3::ZERO), VertexId(4));
    }

    #[test]
    fn test_add_at_restores_identifier() {
        let mut mesh = tetrahedron();
        let v = mesh.add_vertex(Vec3::ONE);
        let reference = mesh.vertex_ref(v);
        mesh.delete_vertex(v);

        mesh.add_vertex_at(reference, Vec3::ONE, Vec3::Y).unwrap();
        assert_eq!(mesh.resolve_vertex(reference.identifier), Some(v));
        assert_eq!(mesh.normal(v), Vec3::Y);
        assert!(mesh.add_vertex_at(reference, Vec3::ONE, Vec3::Y).is_err());
    }

    #[test]
    fn test_new_edge_links_to_itself() {
        let mut mesh = tetrahedron();
        let e = mesh.add_edge(VertexId(0), VertexId(1), FaceId(0), FaceId(1));
        let edge = mesh.edge(e);
        assert_eq!(edge.left_successor, e);
        assert_eq!(edge.right_predecessor, e);
    }

    #[test]
    fn test_delete_face_leaves_octree() {
        let mut mesh = tetrahedron();
        let face = FaceId(2);
        mesh.delete_face(face);
        assert!(mesh.octree().scan_face(face).is_empty());
        assert_eq!(mesh.octree().num_faces(), 3);
    }

    #[test]
    fn test_buffer_data_fills_free_slots() {
        let mut mesh = tetrahedron();
        mesh.delete_face(FaceId(1));
        mesh.buffer_data();
        assert_eq!(mesh.face_indices(FaceId(1)), mesh.face_indices(FaceId(0)));
    }

    #[test]
    fn test_reset_empties_everything() {
        let mut mesh = tetrahedron();
        let identifier = mesh.identifier();
        mesh.reset();
        assert!(mesh.is_empty());
        assert!(mesh.indices().is_empty());
        assert_eq!(mesh.octree().num_faces(), 0);
        assert_eq!(mesh.identifier(), identifier);
    }

    #[test]
    fn test_ray_picks_front_face() {
        let mesh = WingedMesh::from_definition(&MeshDefinition::icosphere(1), KernelConfig::default()).unwrap();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let hit = mesh.intersect_ray(&ray).unwrap();
        assert!(hit.point.z > 0.9);
        assert!(mesh.face_triangle(hit.face).normal().z > 0.0);
    }
}
