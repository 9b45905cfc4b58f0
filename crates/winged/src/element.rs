//! Element records of the winged-edge structure.
//!
//! Records only store handles. Anything needing positions or other elements
//! lives on [`crate::WingedMesh`].

use serde::{Deserialize, Serialize};

use crate::octree::NodeRef;
use crate::pool::Element;
use crate::types::{EdgeId, FaceGradient, FaceId, Identifier, SlotId, VertexId};

/// A vertex. Its slot doubles as the position/normal buffer index.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub identifier: Identifier,
    /// Any incident edge; `None` only while the vertex is being built or torn down
    pub edge: Option<EdgeId>,
}

impl Vertex {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            identifier,
            edge: None,
        }
    }
}

/// The eight topological fields of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeGeometry {
    pub vertex1: VertexId,
    pub vertex2: VertexId,
    pub left_face: FaceId,
    pub right_face: FaceId,
    pub left_predecessor: EdgeId,
    pub left_successor: EdgeId,
    pub right_predecessor: EdgeId,
    pub right_successor: EdgeId,
}

/// A winged edge.
///
/// The left face is traversed `vertex1 -> vertex2`, the right face
/// `vertex2 -> vertex1`. Predecessor/successor links are per side.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub identifier: Identifier,
    pub vertex1: VertexId,
    pub vertex2: VertexId,
    pub left_face: FaceId,
    pub right_face: FaceId,
    pub left_predecessor: EdgeId,
    pub left_successor: EdgeId,
    pub right_predecessor: EdgeId,
    pub right_successor: EdgeId,
    /// Non-structural bridge edge created by triangulation
    pub is_t_edge: bool,
    pub face_gradient: FaceGradient,
}

impl Edge {
    pub fn new(identifier: Identifier, geometry: EdgeGeometry) -> Self {
        Self {
            identifier,
            vertex1: geometry.vertex1,
            vertex2: geometry.vertex2,
            left_face: geometry.left_face,
            right_face: geometry.right_face,
            left_predecessor: geometry.left_predecessor,
            left_successor: geometry.left_successor,
            right_predecessor: geometry.right_predecessor,
            right_successor: geometry.right_successor,
            is_t_edge: false,
            face_gradient: FaceGradient::None,
        }
    }

    pub fn geometry(&self) -> EdgeGeometry {
        EdgeGeometry {
            vertex1: self.vertex1,
            vertex2: self.vertex2,
            left_face: self.left_face,
            right_face: self.right_face,
            left_predecessor: self.left_predecessor,
            left_successor: self.left_successor,
            right_predecessor: self.right_predecessor,
            right_successor: self.right_successor,
        }
    }

    pub fn set_geometry(&mut self, geometry: EdgeGeometry) {
        self.vertex1 = geometry.vertex1;
        self.vertex2 = geometry.vertex2;
        self.left_face = geometry.left_face;
        self.right_face = geometry.right_face;
        self.left_predecessor = geometry.left_predecessor;
        self.left_successor = geometry.left_successor;
        self.right_predecessor = geometry.right_predecessor;
        self.right_successor = geometry.right_successor;
    }

    /// Whether `face` is the left face.
    ///
    /// # Panics
    /// If `face` is not adjacent to this edge.
    pub fn is_left_face(&self, face: FaceId) -> bool {
        if face == self.left_face {
            true
        } else if face == self.right_face {
            false
        } else {
            panic!("{face} is not adjacent to edge {}", self.identifier)
        }
    }

    pub fn is_right_face(&self, face: FaceId) -> bool {
        !self.is_left_face(face)
    }

    /// Whether `vertex` is the first endpoint.
    ///
    /// # Panics
    /// If `vertex` is not an endpoint of this edge.
    pub fn is_vertex1(&self, vertex: VertexId) -> bool {
        if vertex == self.vertex1 {
            true
        } else if vertex == self.vertex2 {
            false
        } else {
            panic!("{vertex} is not an endpoint of edge {}", self.identifier)
        }
    }

    pub fn is_vertex2(&self, vertex: VertexId) -> bool {
        !self.is_vertex1(vertex)
    }

    pub fn has_vertex(&self, vertex: VertexId) -> bool {
        vertex == self.vertex1 || vertex == self.vertex2
    }

    pub fn has_face(&self, face: FaceId) -> bool {
        face == self.left_face || face == self.right_face
    }

    /// First vertex when walking around `face`
    pub fn first_vertex(&self, face: FaceId) -> VertexId {
        if self.is_left_face(face) {
            self.vertex1
        } else {
            self.vertex2
        }
    }

    pub fn second_vertex(&self, face: FaceId) -> VertexId {
        if self.is_left_face(face) {
            self.vertex2
        } else {
            self.vertex1
        }
    }

    pub fn predecessor(&self, face: FaceId) -> EdgeId {
        if self.is_left_face(face) {
            self.left_predecessor
        } else {
            self.right_predecessor
        }
    }

    pub fn successor(&self, face: FaceId) -> EdgeId {
        if self.is_left_face(face) {
            self.left_successor
        } else {
            self.right_successor
        }
    }

    pub fn other_face(&self, face: FaceId) -> FaceId {
        if self.is_left_face(face) {
            self.right_face
        } else {
            self.left_face
        }
    }

    pub fn other_vertex(&self, vertex: VertexId) -> VertexId {
        if self.is_vertex1(vertex) {
            self.vertex2
        } else {
            self.vertex1
        }
    }

    /// The edge preceding this one around `vertex` in a vertex rotation
    pub fn vertex_predecessor(&self, vertex: VertexId) -> EdgeId {
        if self.is_vertex1(vertex) {
            self.left_predecessor
        } else {
            self.right_predecessor
        }
    }
}

/// A face. Its slot decides the render-index slots it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub identifier: Identifier,
    /// Any edge of the face; `None` only while the face is being built
    pub edge: Option<EdgeId>,
    /// Octree node holding this face
    pub octree_node: NodeRef,
}

impl Face {
    /// First of the three render-index slots owned by face `id`
    pub fn first_index_number(id: FaceId) -> usize {
        3 * id.index()
    }
}

impl Element for Vertex {
    fn identifier(&self) -> Identifier {
        self.identifier
    }
}

impl Element for Edge {
    fn identifier(&self) -> Identifier {
        self.identifier
    }
}

impl Element for Face {
    fn identifier(&self) -> Identifier {
        self.identifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_edge() -> Edge {
        Edge::new(
            Identifier::next(),
            EdgeGeometry {
                vertex1: VertexId(0),
                vertex2: VertexId(1),
                left_face: FaceId(0),
                right_face: FaceId(1),
                left_predecessor: EdgeId(2),
                left_successor: EdgeId(3),
                right_predecessor: EdgeId(4),
                right_successor: EdgeId(5),
            },
        )
    }

    #[test]
    fn test_side_dependent_accessors() {
        let edge = sample_edge();
        assert_eq!(edge.first_vertex(FaceId(0)), VertexId(0));
        assert_eq!(edge.first_vertex(FaceId(1)), VertexId(1));
        assert_eq!(edge.successor(FaceId(0)), EdgeId(3));
        assert_eq!(edge.predecessor(FaceId(1)), EdgeId(4));
        assert_eq!(edge.other_face(FaceId(1)), FaceId(0));
        assert_eq!(edge.other_vertex(VertexId(1)), VertexId(0));
        assert_eq!(edge.vertex_predecessor(VertexId(0)), EdgeId(2));
        assert_eq!(edge.vertex_predecessor(VertexId(1)), EdgeId(4));
    }

    #[test]
    #[should_panic]
    fn test_foreign_face_panics() {
        sample_edge().is_left_face(FaceId(9));
    }

    #[test]
    fn test_geometry_roundtrip() {
        let mut edge = sample_edge();
        let mut geometry = edge.geometry();
        geometry.left_successor = EdgeId(11);
        edge.set_geometry(geometry);
        assert_eq!(edge.left_successor, EdgeId(11));
        assert_eq!(edge.geometry(), geometry);
    }

    #[test]
    fn test_face_index_slots() {
        assert_eq!(Face::first_index_number(FaceId(0)), 0);
        assert_eq!(Face::first_index_number(FaceId(7)), 21);
    }
}
