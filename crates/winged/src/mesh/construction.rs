//! Construction of a winged mesh from an indexed triangle soup.

use std::collections::{HashMap, HashSet};

use sculpt_config::KernelConfig;
use tracing::debug;

use super::WingedMesh;
use crate::definition::MeshDefinition;
use crate::primitive::{Aabb, Triangle};
use crate::types::{EdgeId, FaceId, VertexId, WingedError};

impl WingedMesh {
    /// Build a closed manifold mesh from positions and triangle index triples.
    ///
    /// Shared edges are detected through a map keyed on directed vertex pairs:
    /// a triangle using `(b, a)` after another one created `(a, b)` becomes
    /// that edge's right face. Slots follow the definition's order.
    pub fn from_definition(definition: &MeshDefinition, config: KernelConfig) -> Result<Self, WingedError> {
        let mut mesh = Self::new(config);
        mesh.import(definition)?;
        Ok(mesh)
    }

    /// Replace the contents of this mesh with `definition`
    pub fn import(&mut self, definition: &MeshDefinition) -> Result<(), WingedError> {
        let positions = definition.positions();
        let indices = definition.indices();

        if positions.is_empty() {
            return Err(WingedError::NoVertices);
        }
        if indices.len() % 3 != 0 {
            return Err(WingedError::NotTriangles(indices.len()));
        }
        for (triangle, chunk) in indices.chunks_exact(3).enumerate() {
            for &index in chunk {
                if index as usize >= positions.len() {
                    return Err(WingedError::IndexOutOfBounds {
                        triangle,
                        index,
                        count: positions.len(),
                    });
                }
            }
            if chunk[0] == chunk[1] || chunk[1] == chunk[2] || chunk[2] == chunk[0] {
                return Err(WingedError::DegenerateTriangle(triangle));
            }
        }

        self.reset();

        // Octree root spans the bounding box
        let aabb = Aabb::from_points(positions.iter().copied());
        self.setup_octree_root(aabb.center(), aabb.size().max_element());

        for &position in positions {
            self.add_vertex(position);
        }

        let mut edge_map: HashMap<(u32, u32), EdgeId> = HashMap::new();
        let mut matched: HashSet<(u32, u32)> = HashSet::new();

        for chunk in indices.chunks_exact(3) {
            let corners = [chunk[0], chunk[1], chunk[2]];
            let triangle = Triangle::new(
                positions[corners[0] as usize],
                positions[corners[1] as usize],
                positions[corners[2] as usize],
            );
            let face = self.add_face(&triangle);

            let mut edges = [EdgeId(0); 3];
            for (i, edge) in edges.iter_mut().enumerate() {
                let a = corners[i];
                let b = corners[(i + 1) % 3];
                *edge = self.find_or_add_edge(&mut edge_map, &mut matched, a, b, face)?;
            }

            self.face_mut(face).edge = Some(edges[0]);
            for i in 0..3 {
                let predecessor = edges[(i + 2) % 3];
                let successor = edges[(i + 1) % 3];
                let edge = self.edge_mut(edges[i]);
                if edge.is_left_face(face) {
                    edge.left_predecessor = predecessor;
                    edge.left_successor = successor;
                } else {
                    edge.right_predecessor = predecessor;
                    edge.right_successor = successor;
                }
            }
        }

        if let Some(&(a, b)) = edge_map.keys().find(|key| !matched.contains(*key)) {
            return Err(WingedError::OpenEdge(a, b));
        }
        if let Some(vertex) = self.vertex_ids().find(|&v| self.vertex(v).edge.is_none()) {
            return Err(WingedError::IsolatedVertex(vertex.0));
        }

        self.write_all_indices();
        self.write_all_normals();
        self.buffer_data();

        debug!(
            vertices = self.num_vertices(),
            edges = self.num_edges(),
            faces = self.num_faces(),
            "imported mesh"
        );
        Ok(())
    }

    fn find_or_add_edge(
        &mut self,
        edge_map: &mut HashMap<(u32, u32), EdgeId>,
        matched: &mut HashSet<(u32, u32)>,
        a: u32,
        b: u32,
        face: FaceId,
    ) -> Result<EdgeId, WingedError> {
        if edge_map.contains_key(&(a, b)) {
            return Err(WingedError::DuplicateEdge(a, b));
        }
        if let Some(&edge) = edge_map.get(&(b, a)) {
            if !matched.insert((b, a)) {
                return Err(WingedError::NonManifoldEdge(b, a));
            }
            self.edge_mut(edge).right_face = face;
            return Ok(edge);
        }

        let (v1, v2) = (VertexId(a), VertexId(b));
        let edge = self.add_edge(v1, v2, face, face);
        edge_map.insert((a, b), edge);
        self.vertex_mut(v1).edge = Some(edge);
        self.vertex_mut(v2).edge = Some(edge);
        Ok(edge)
    }
}
