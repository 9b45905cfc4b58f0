//! Adjacency rotations and topology queries.
//!
//! A rotation walks the edges around a pivot:
//! - around a face it follows the face's successor links
//! - around a vertex it follows the left or right predecessor, depending
//!   on which endpoint the vertex is
//!
//! Rotations borrow the mesh; collect them before mutating.

use super::WingedMesh;
use crate::types::{EdgeId, FaceId, VertexId};

/// What a rotation turns around
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pivot {
    Face(FaceId),
    Vertex(VertexId),
}

/// Iterator over the edges around a pivot, starting at a given edge
#[derive(Debug, Clone)]
pub struct Rotation<'a> {
    mesh: &'a WingedMesh,
    pivot: Pivot,
    start: EdgeId,
    current: Option<EdgeId>,
    steps: usize,
}

impl<'a> Rotation<'a> {
    fn new(mesh: &'a WingedMesh, pivot: Pivot, start: Option<EdgeId>) -> Self {
        Self {
            mesh,
            pivot,
            start: start.unwrap_or(EdgeId(0)),
            current: start,
            steps: 0,
        }
    }

    fn advance(&self, edge: EdgeId) -> EdgeId {
        let edge = self.mesh.edge(edge);
        match self.pivot {
            Pivot::Face(face) => edge.successor(face),
            Pivot::Vertex(vertex) => edge.vertex_predecessor(vertex),
        }
    }
}

impl Iterator for Rotation<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        let edge = self.current?;
        self.steps += 1;
        debug_assert!(
            self.steps <= self.mesh.num_edges() + 1,
            "rotation around {:?} does not close",
            self.pivot
        );
        let next = self.advance(edge);
        self.current = (next != self.start).then_some(next);
        Some(edge)
    }
}

impl WingedMesh {
    // ========================================================================
    // Rotations
    // ========================================================================

    pub fn rotation(&self, pivot: Pivot) -> Rotation<'_> {
        let start = match pivot {
            Pivot::Face(face) => self.face(face).edge,
            Pivot::Vertex(vertex) => self.vertex(vertex).edge,
        };
        Rotation::new(self, pivot, start)
    }

    pub fn rotation_from(&self, pivot: Pivot, start: EdgeId) -> Rotation<'_> {
        Rotation::new(self, pivot, Some(start))
    }

    pub fn face_edges(&self, face: FaceId) -> Vec<EdgeId> {
        self.rotation(Pivot::Face(face)).collect()
    }

    pub fn face_edges_from(&self, face: FaceId, start: EdgeId) -> Vec<EdgeId> {
        self.rotation_from(Pivot::Face(face), start).collect()
    }

    /// Corners of `face` in traversal order
    pub fn face_vertices(&self, face: FaceId) -> Vec<VertexId> {
        self.rotation(Pivot::Face(face))
            .map(|e| self.edge(e).first_vertex(face))
            .collect()
    }

    pub fn face_vertices_from(&self, face: FaceId, start: EdgeId) -> Vec<VertexId> {
        self.rotation_from(Pivot::Face(face), start)
            .map(|e| self.edge(e).first_vertex(face))
            .collect()
    }

    /// Faces sharing an edge with `face`
    pub fn face_neighbors(&self, face: FaceId) -> Vec<FaceId> {
        self.rotation(Pivot::Face(face))
            .map(|e| self.edge(e).other_face(face))
            .collect()
    }

    pub fn vertex_edges(&self, vertex: VertexId) -> Vec<EdgeId> {
        self.rotation(Pivot::Vertex(vertex)).collect()
    }

    pub fn vertex_edges_from(&self, vertex: VertexId, start: EdgeId) -> Vec<EdgeId> {
        self.rotation_from(Pivot::Vertex(vertex), start).collect()
    }

    /// One-ring of `vertex`
    pub fn vertex_neighbors(&self, vertex: VertexId) -> Vec<VertexId> {
        self.rotation(Pivot::Vertex(vertex))
            .map(|e| self.edge(e).other_vertex(vertex))
            .collect()
    }

    pub fn vertex_neighbors_from(&self, vertex: VertexId, start: EdgeId) -> Vec<VertexId> {
        self.rotation_from(Pivot::Vertex(vertex), start)
            .map(|e| self.edge(e).other_vertex(vertex))
            .collect()
    }

    pub fn vertex_faces(&self, vertex: VertexId) -> Vec<FaceId> {
        self.rotation(Pivot::Vertex(vertex))
            .map(|e| {
                let edge = self.edge(e);
                if edge.is_vertex1(vertex) {
                    edge.right_face
                } else {
                    edge.left_face
                }
            })
            .collect()
    }

    // ========================================================================
    // Topology queries
    // ========================================================================

    /// Number of incident edges; 0 for a vertex without edge
    pub fn valence(&self, vertex: VertexId) -> usize {
        self.rotation(Pivot::Vertex(vertex)).count()
    }

    /// Number of edges of `face`
    pub fn face_num_edges(&self, face: FaceId) -> usize {
        self.rotation(Pivot::Face(face)).count()
    }

    pub fn is_triangle(&self, face: FaceId) -> bool {
        self.face_num_edges(face) == 3
    }

    /// The `index`-th corner of `face`, counted from its reference edge
    ///
    /// # Panics
    /// If `face` has no edge.
    pub fn face_vertex(&self, face: FaceId, index: usize) -> VertexId {
        let Some(start) = self.face(face).edge else {
            panic!("{face} has no edge");
        };
        self.edge_vertex(start, face, index)
    }

    /// The `index`-th corner of `face`, counted from `edge`
    pub fn edge_vertex(&self, edge: EdgeId, face: FaceId, index: usize) -> VertexId {
        let edge = self.successor_n(edge, face, index);
        self.edge(edge).first_vertex(face)
    }

    /// The edge `n` steps after `edge` around `face`
    pub fn successor_n(&self, edge: EdgeId, face: FaceId, n: usize) -> EdgeId {
        (0..n).fold(edge, |e, _| self.edge(e).successor(face))
    }

    pub fn predecessor_n(&self, edge: EdgeId, face: FaceId, n: usize) -> EdgeId {
        (0..n).fold(edge, |e, _| self.edge(e).predecessor(face))
    }

    /// The edge connecting two vertices
    pub fn find_edge(&self, vertex1: VertexId, vertex2: VertexId) -> Option<EdgeId> {
        self.rotation(Pivot::Vertex(vertex1))
            .find(|&e| self.edge(e).other_vertex(vertex1) == vertex2)
    }
}
