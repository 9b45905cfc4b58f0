//! Geometric helpers over edges, faces and vertices.

use glam::Vec3;

use super::WingedMesh;
use crate::primitive::Triangle;
use crate::types::{EdgeId, FaceId, VertexId};

impl WingedMesh {
    /// `vertex2 - vertex1`
    pub fn edge_vector(&self, edge: EdgeId) -> Vec3 {
        let e = self.edge(edge);
        self.position(e.vertex2) - self.position(e.vertex1)
    }

    /// Edge vector pointing away from `vertex`
    pub fn edge_vector_from(&self, edge: EdgeId, vertex: VertexId) -> Vec3 {
        if self.edge(edge).is_vertex1(vertex) {
            self.edge_vector(edge)
        } else {
            -self.edge_vector(edge)
        }
    }

    pub fn edge_length(&self, edge: EdgeId) -> f32 {
        self.edge_vector(edge).length()
    }

    pub fn edge_length_squared(&self, edge: EdgeId) -> f32 {
        self.edge_vector(edge).length_squared()
    }

    pub fn edge_middle(&self, edge: EdgeId) -> Vec3 {
        let e = self.edge(edge);
        (self.position(e.vertex1) + self.position(e.vertex2)) * 0.5
    }

    /// The incident edge of `vertex` most opposite to `edge`, if the angle
    /// between them is wider than 120 degrees
    pub fn adjacent_sibling(&self, edge: EdgeId, vertex: VertexId) -> Option<EdgeId> {
        let this = self.edge_vector_from(edge, vertex).normalize_or_zero();
        let mut best = None;
        let mut best_dot = -0.5;

        for other in self.vertex_edges(vertex) {
            let dot = this.dot(self.edge_vector_from(other, vertex).normalize_or_zero());
            if dot < best_dot {
                best = Some(other);
                best_dot = dot;
            }
        }
        best
    }

    /// Triangle spanned by the first three corners of `face`
    pub fn face_triangle(&self, face: FaceId) -> Triangle {
        Triangle::new(
            self.position(self.face_vertex(face, 0)),
            self.position(self.face_vertex(face, 1)),
            self.position(self.face_vertex(face, 2)),
        )
    }

    /// Triangle as the render buffer currently draws it
    pub fn indexed_triangle(&self, face: FaceId) -> Triangle {
        let [a, b, c] = self.face_indices(face);
        Triangle::new(
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        )
    }

    pub fn face_normal(&self, face: FaceId) -> Vec3 {
        self.face_triangle(face).normal()
    }

    /// Whether `face` has effectively zero area
    pub fn is_degenerated(&self, face: FaceId) -> bool {
        self.face_triangle(face).is_degenerated(self.epsilon())
    }

    pub fn face_incircle_radius(&self, face: FaceId) -> f32 {
        self.face_triangle(face).incircle_radius()
    }

    pub fn longest_edge(&self, face: FaceId) -> EdgeId {
        let edges = self.face_edges(face);
        let mut longest = edges[0];
        for &edge in &edges[1..] {
            if self.edge_length_squared(edge) > self.edge_length_squared(longest) {
                longest = edge;
            }
        }
        longest
    }

    /// Average of the normals of all non-degenerated adjacent faces, normalized
    pub fn interpolated_normal(&self, vertex: VertexId) -> Vec3 {
        let sum: Vec3 = self
            .vertex_faces(vertex)
            .into_iter()
            .filter(|&face| !self.is_degenerated(face))
            .map(|face| self.face_normal(face))
            .sum();
        sum.normalize_or_zero()
    }

    /// Centroid of the one-ring of `vertex`
    pub fn ring_centroid(&self, vertex: VertexId) -> Vec3 {
        let ring = self.vertex_neighbors(vertex);
        if ring.is_empty() {
            return self.position(vertex);
        }
        let sum: Vec3 = ring.iter().map(|&v| self.position(v)).sum();
        sum / ring.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use sculpt_config::KernelConfig;

    use crate::definition::MeshDefinition;
    use crate::mesh::WingedMesh;
    use crate::types::VertexId;

    fn octahedron() -> WingedMesh {
        WingedMesh::from_definition(&MeshDefinition::octahedron(), KernelConfig::default()).unwrap()
    }

    #[test]
    fn test_edge_measures() {
        let mesh = octahedron();
        for e in mesh.edge_ids() {
            assert_relative_eq!(mesh.edge_length(e), 2.0_f32.sqrt(), epsilon = 1e-5);
            let middle = mesh.edge_middle(e);
            assert_relative_eq!(middle.length(), 0.5_f32.sqrt(), epsilon = 1e-5);
        }
    }

    #[test]
    fn test_interpolated_normal_points_outwards() {
        let mesh = octahedron();
        for v in mesh.vertex_ids() {
            let normal = mesh.interpolated_normal(v);
            let outward = mesh.position(v).normalize();
            assert_relative_eq!(normal.dot(outward), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_adjacent_sibling_on_octahedron() {
        let mesh = octahedron();
        let v = VertexId(0);
        let e = mesh.vertex_edges(v)[0];
        let sibling = mesh.adjacent_sibling(e, v).unwrap();
        let dot = mesh.edge_vector_from(e, v).normalize().dot(mesh.edge_vector_from(sibling, v).normalize());
        assert_relative_eq!(dot, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_faces_are_not_degenerated() {
        let mesh = octahedron();
        for f in mesh.face_ids() {
            assert!(!mesh.is_degenerated(f));
            assert!(mesh.face_normal(f).dot(mesh.face_triangle(f).center()) > 0.0);
        }
    }

    #[test]
    fn test_ring_centroid_of_octahedron_apex() {
        let mesh = octahedron();
        let centroid = mesh.ring_centroid(VertexId(0));
        assert_relative_eq!(centroid.length(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(mesh.position(VertexId(0)).length(), 1.0);
    }
}
