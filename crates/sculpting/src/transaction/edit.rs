//! Recording mutators.
//!
//! [`MeshEdit`] pairs a mesh with the transaction that logs every change
//! made through it. Topology operators only ever mutate a mesh through a
//! `MeshEdit`, which keeps every gesture undoable.
//!
//! Unchanged values are not recorded.

use glam::Vec3;
use winged::{EdgeGeometry, EdgeId, FaceGradient, FaceId, Triangle, VertexId, WingedMesh};

use super::operation::{EdgeEnd, EdgeLink, EdgeSide, Operation};
use super::Transaction;

pub struct MeshEdit<'a> {
    mesh: &'a mut WingedMesh,
    transaction: &'a mut Transaction,
}

impl<'a> MeshEdit<'a> {
    pub(super) fn new(mesh: &'a mut WingedMesh, transaction: &'a mut Transaction) -> Self {
        debug_assert_eq!(
            mesh.identifier(),
            transaction.mesh(),
            "transaction belongs to another mesh"
        );
        Self { mesh, transaction }
    }

    pub fn mesh(&self) -> &WingedMesh {
        self.mesh
    }

    /// Number of operations recorded so far
    pub fn num_operations(&self) -> usize {
        self.transaction.len()
    }

    fn record(&mut self, operation: Operation) {
        self.transaction.push(operation);
    }

    // ========================================================================
    // Elements
    // ========================================================================

    pub fn add_vertex(&mut self, position: Vec3) -> VertexId {
        let vertex = self.mesh.add_vertex(position);
        self.record(Operation::AddVertex {
            vertex: self.mesh.vertex_ref(vertex),
            position,
        });
        vertex
    }

    /// Add an edge with fully specified links
    pub fn add_edge(&mut self, geometry: EdgeGeometry) -> EdgeId {
        let edge = self.mesh.add_edge(
            geometry.vertex1,
            geometry.vertex2,
            geometry.left_face,
            geometry.right_face,
        );
        self.mesh.edge_mut(edge).set_geometry(geometry);
        self.record(Operation::AddEdge {
            edge: self.mesh.edge_ref(edge),
            geometry,
        });
        edge
    }

    /// Add an edge whose links still point to itself; wire it up with
    /// [`MeshEdit::set_edge_geometry`] once its neighbours exist
    pub fn add_unlinked_edge(&mut self, vertex1: VertexId, vertex2: VertexId, left: FaceId, right: FaceId) -> EdgeId {
        let edge = self.mesh.add_edge(vertex1, vertex2, left, right);
        self.record(Operation::AddEdge {
            edge: self.mesh.edge_ref(edge),
            geometry: self.mesh.edge(edge).geometry(),
        });
        edge
    }

    /// Add a face without edge. `triangle` places it in the octree.
    pub fn add_face(&mut self, triangle: &Triangle) -> FaceId {
        let face = self.mesh.add_face(triangle);
        self.record(Operation::AddFace {
            face: self.mesh.face_ref(face),
            triangle: *triangle,
        });
        face
    }

    pub fn delete_vertex(&mut self, vertex: VertexId) {
        let operation = Operation::DeleteVertex {
            vertex: self.mesh.vertex_ref(vertex),
            edge: self.mesh.vertex(vertex).edge,
            position: self.mesh.position(vertex),
            normal: self.mesh.normal(vertex),
        };
        self.record(operation);
        self.mesh.delete_vertex(vertex);
    }

    pub fn delete_edge(&mut self, edge: EdgeId) {
        let e = self.mesh.edge(edge);
        let operation = Operation::DeleteEdge {
            edge: self.mesh.edge_ref(edge),
            geometry: e.geometry(),
            is_t_edge: e.is_t_edge,
            face_gradient: e.face_gradient,
        };
        self.record(operation);
        self.mesh.delete_edge(edge);
    }

    /// Delete a face. `triangle` is where the face goes back into the
    /// octree on undo; its rotation may already be dissolved at this point.
    pub fn delete_face(&mut self, face: FaceId, triangle: &Triangle) {
        let operation = Operation::DeleteFace {
            face: self.mesh.face_ref(face),
            edge: self.mesh.face(face).edge,
            triangle: *triangle,
            indices: self.mesh.face_indices(face),
        };
        self.record(operation);
        self.mesh.delete_face(face);
    }

    /// Empty the mesh. Undo restores a snapshot.
    pub fn reset_mesh(&mut self) {
        self.record(Operation::ResetMesh {
            before: Box::new(self.mesh.clone()),
        });
        self.mesh.reset();
    }

    // ========================================================================
    // Vertex and face fields
    // ========================================================================

    pub fn set_vertex_edge(&mut self, vertex: VertexId, edge: EdgeId) {
        let old = self.mesh.vertex(vertex).edge;
        if old == Some(edge) {
            return;
        }
        self.record(Operation::SetVertexEdge {
            vertex: self.mesh.vertex_ref(vertex),
            old,
            new: Some(edge),
        });
        self.mesh.vertex_mut(vertex).edge = Some(edge);
    }

    pub fn set_position(&mut self, vertex: VertexId, position: Vec3) {
        let old = self.mesh.position(vertex);
        if old == position {
            return;
        }
        self.record(Operation::SetPosition {
            vertex: self.mesh.vertex_ref(vertex),
            old,
            new: position,
        });
        self.mesh.set_position(vertex, position);
    }

    pub fn set_normal(&mut self, vertex: VertexId, normal: Vec3) {
        let old = self.mesh.normal(vertex);
        if old == normal {
            return;
        }
        self.record(Operation::SetNormal {
            vertex: self.mesh.vertex_ref(vertex),
            old,
            new: normal,
        });
        self.mesh.set_normal(vertex, normal);
    }

    pub fn set_face_edge(&mut self, face: FaceId, edge: EdgeId) {
        let old = self.mesh.face(face).edge;
        if old == Some(edge) {
            return;
        }
        self.record(Operation::SetFaceEdge {
            face: self.mesh.face_ref(face),
            old,
            new: Some(edge),
        });
        self.mesh.face_mut(face).edge = Some(edge);
    }

    // ========================================================================
    // Edge fields
    // ========================================================================

    pub fn set_edge_vertex(&mut self, edge: EdgeId, end: EdgeEnd, vertex: VertexId) {
        let old = end.get(self.mesh.edge(edge));
        if old == vertex {
            return;
        }
        self.record(Operation::SetEdgeVertex {
            edge: self.mesh.edge_ref(edge),
            end,
            old,
            new: vertex,
        });
        end.set(self.mesh.edge_mut(edge), vertex);
    }

    pub fn set_edge_face(&mut self, edge: EdgeId, side: EdgeSide, face: FaceId) {
        let old = side.get(self.mesh.edge(edge));
        if old == face {
            return;
        }
        self.record(Operation::SetEdgeFace {
            edge: self.mesh.edge_ref(edge),
            side,
            old,
            new: face,
        });
        side.set(self.mesh.edge_mut(edge), face);
    }

    pub fn set_edge_link(&mut self, edge: EdgeId, link: EdgeLink, target: EdgeId) {
        let old = link.get(self.mesh.edge(edge));
        if old == target {
            return;
        }
        self.record(Operation::SetEdgeLink {
            edge: self.mesh.edge_ref(edge),
            link,
            old,
            new: target,
        });
        link.set(self.mesh.edge_mut(edge), target);
    }

    /// Move `edge` from face `old` to face `new`, keeping its side
    pub fn set_face_of(&mut self, edge: EdgeId, old: FaceId, new: FaceId) {
        let side = if self.mesh.edge(edge).is_left_face(old) {
            EdgeSide::Left
        } else {
            EdgeSide::Right
        };
        self.set_edge_face(edge, side, new);
    }

    /// Set the successor of `edge` on the side of `face`
    pub fn set_successor(&mut self, edge: EdgeId, face: FaceId, successor: EdgeId) {
        let link = EdgeLink::successor(self.mesh.edge(edge), face);
        self.set_edge_link(edge, link, successor);
    }

    /// Set the predecessor of `edge` on the side of `face`
    pub fn set_predecessor(&mut self, edge: EdgeId, face: FaceId, predecessor: EdgeId) {
        let link = EdgeLink::predecessor(self.mesh.edge(edge), face);
        self.set_edge_link(edge, link, predecessor);
    }

    /// Swap the endpoint `old` of `edge` for `new`
    pub fn replace_vertex(&mut self, edge: EdgeId, old: VertexId, new: VertexId) {
        let end = if self.mesh.edge(edge).is_vertex1(old) {
            EdgeEnd::Vertex1
        } else {
            EdgeEnd::Vertex2
        };
        self.set_edge_vertex(edge, end, new);
    }

    /// Overwrite all eight topological fields of `edge`
    pub fn set_edge_geometry(&mut self, edge: EdgeId, geometry: EdgeGeometry) {
        self.set_edge_vertex(edge, EdgeEnd::Vertex1, geometry.vertex1);
        self.set_edge_vertex(edge, EdgeEnd::Vertex2, geometry.vertex2);
        self.set_edge_face(edge, EdgeSide::Left, geometry.left_face);
        self.set_edge_face(edge, EdgeSide::Right, geometry.right_face);
        self.set_edge_link(edge, EdgeLink::LeftPredecessor, geometry.left_predecessor);
        self.set_edge_link(edge, EdgeLink::LeftSuccessor, geometry.left_successor);
        self.set_edge_link(edge, EdgeLink::RightPredecessor, geometry.right_predecessor);
        self.set_edge_link(edge, EdgeLink::RightSuccessor, geometry.right_successor);
    }

    pub fn set_t_edge(&mut self, edge: EdgeId, is_t_edge: bool) {
        let old = self.mesh.edge(edge).is_t_edge;
        if old == is_t_edge {
            return;
        }
        self.record(Operation::SetTEdge {
            edge: self.mesh.edge_ref(edge),
            old,
            new: is_t_edge,
        });
        self.mesh.edge_mut(edge).is_t_edge = is_t_edge;
    }

    pub fn set_face_gradient(&mut self, edge: EdgeId, gradient: FaceGradient) {
        let old = self.mesh.edge(edge).face_gradient;
        if old == gradient {
            return;
        }
        self.record(Operation::SetFaceGradient {
            edge: self.mesh.edge_ref(edge),
            old,
            new: gradient,
        });
        self.mesh.edge_mut(edge).face_gradient = gradient;
    }

    // ========================================================================
    // Buffers
    // ========================================================================

    /// Write the render indices of a triangle from its topology.
    ///
    /// # Panics
    /// If `face` is not a triangle.
    pub fn write_indices(&mut self, face: FaceId) {
        let old = self.mesh.face_indices(face);
        self.mesh.write_indices(face);
        let new = self.mesh.face_indices(face);
        if old != new {
            self.record(Operation::SetIndices { face, old, new });
        }
    }

    /// Store the interpolated normal of `vertex`
    pub fn write_normal(&mut self, vertex: VertexId) {
        let normal = self.mesh.interpolated_normal(vertex);
        self.set_normal(vertex, normal);
    }

    /// Re-place a face in the octree. Not recorded: undo realigns every
    /// face it touches.
    pub fn realign_face(&mut self, face: FaceId) {
        self.mesh.realign_face(face);
    }

    pub fn realign_all_faces(&mut self) {
        self.mesh.realign_all_faces();
    }

    /// Fill free face slots for upload. Not recorded.
    pub fn buffer_data(&mut self) {
        self.mesh.buffer_data();
    }
}
