//! Validation of the manifold invariant and render buffers.
//!
//! Checks that:
//! 1. every link of every live element names a live element
//! 2. every edge borders two distinct faces
//! 3. every face rotation closes after at least 3 steps, and every edge it
//!    visits borders that face
//! 4. every vertex rotation closes and only visits edges at that vertex
//! 5. every triangle's render indices match its corners
//!
//! Walks are bounded by the edge count, so broken topology is reported
//! instead of looping.

use super::WingedMesh;
use crate::types::{EdgeId, FaceId, VertexId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifoldError {
    #[error("{vertex} has no edge")]
    VertexWithoutEdge { vertex: VertexId },
    #[error("{face} has no edge")]
    FaceWithoutEdge { face: FaceId },
    #[error("{element} links to dead {target}")]
    DanglingLink { element: String, target: String },
    #[error("{edge} has the same face {face} on both sides")]
    SameFaces { edge: EdgeId, face: FaceId },
    #[error("rotation around {face} does not close")]
    OpenFaceRotation { face: FaceId },
    #[error("rotation around {face} visits {edge}, which does not border it")]
    ForeignEdge { face: FaceId, edge: EdgeId },
    #[error("{face} has only {num_edges} edges")]
    TooFewEdges { face: FaceId, num_edges: usize },
    #[error("rotation around {vertex} does not close")]
    OpenVertexRotation { vertex: VertexId },
    #[error("rotation around {vertex} visits {edge}, which does not touch it")]
    DetachedEdge { vertex: VertexId, edge: EdgeId },
    #[error("{face} is not a triangle ({num_edges} edges)")]
    NotTriangle { face: FaceId, num_edges: usize },
    #[error("render indices of {face} are {found:?}, expected {expected:?}")]
    IndexMismatch {
        face: FaceId,
        found: [u32; 3],
        expected: [u32; 3],
    },
}

impl WingedMesh {
    /// Check the manifold invariant
    pub fn validate(&self) -> Result<(), ManifoldError> {
        self.validate_links()?;

        let limit = self.num_edges() + 1;

        for face in self.face_ids() {
            let Some(start) = self.face(face).edge else {
                return Err(ManifoldError::FaceWithoutEdge { face });
            };
            let mut edge = start;
            let mut num_edges = 0;
            loop {
                if !self.edge(edge).has_face(face) {
                    return Err(ManifoldError::ForeignEdge { face, edge });
                }
                num_edges += 1;
                edge = self.edge(edge).successor(face);
                if edge == start {
                    break;
                }
                if num_edges > limit {
                    return Err(ManifoldError::OpenFaceRotation { face });
                }
            }
            if num_edges < 3 {
                return Err(ManifoldError::TooFewEdges { face, num_edges });
            }
        }

        for vertex in self.vertex_ids() {
            let Some(start) = self.vertex(vertex).edge else {
                return Err(ManifoldError::VertexWithoutEdge { vertex });
            };
            let mut edge = start;
            let mut steps = 0;
            loop {
                if !self.edge(edge).has_vertex(vertex) {
                    return Err(ManifoldError::DetachedEdge { vertex, edge });
                }
                steps += 1;
                edge = self.edge(edge).vertex_predecessor(vertex);
                if edge == start {
                    break;
                }
                if steps > limit {
                    return Err(ManifoldError::OpenVertexRotation { vertex });
                }
            }
        }
        Ok(())
    }

    /// Check the manifold invariant plus triangle-only faces with matching render indices
    pub fn validate_buffers(&self) -> Result<(), ManifoldError> {
        self.validate()?;
        for face in self.face_ids() {
            let num_edges = self.face_num_edges(face);
            if num_edges != 3 {
                return Err(ManifoldError::NotTriangle { face, num_edges });
            }
            let expected = [0, 1, 2].map(|i| self.face_vertex(face, i).0);
            let found = self.face_indices(face);
            if found != expected {
                return Err(ManifoldError::IndexMismatch {
                    face,
                    found,
                    expected,
                });
            }
        }
        Ok(())
    }

    fn validate_links(&self) -> Result<(), ManifoldError> {
        let dangling = |element: String, target: String| ManifoldError::DanglingLink { element, target };

        for vertex in self.vertex_ids() {
            if let Some(edge) = self.vertex(vertex).edge {
                if self.get_edge(edge).is_none() {
                    return Err(dangling(vertex.to_string(), edge.to_string()));
                }
            }
        }
        for face in self.face_ids() {
            if let Some(edge) = self.face(face).edge {
                if self.get_edge(edge).is_none() {
                    return Err(dangling(face.to_string(), edge.to_string()));
                }
            }
        }
        for id in self.edge_ids() {
            let edge = self.edge(id);
            for vertex in [edge.vertex1, edge.vertex2] {
                if self.get_vertex(vertex).is_none() {
                    return Err(dangling(id.to_string(), vertex.to_string()));
                }
            }
            for face in [edge.left_face, edge.right_face] {
                if self.get_face(face).is_none() {
                    return Err(dangling(id.to_string(), face.to_string()));
                }
            }
            for link in [
                edge.left_predecessor,
                edge.left_successor,
                edge.right_predecessor,
                edge.right_successor,
            ] {
                if self.get_edge(link).is_none() {
                    return Err(dangling(id.to_string(), link.to_string()));
                }
            }
            if edge.left_face == edge.right_face {
                return Err(ManifoldError::SameFaces {
                    edge: id,
                    face: edge.left_face,
                });
            }
        }
        Ok(())
    }
}
