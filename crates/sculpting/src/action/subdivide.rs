//! Subdivide every face of a mesh.

use std::collections::BTreeSet;

use glam::Vec3;
use tracing::debug;
use winged::{AffectedFaces, EdgeId, VertexId};

use crate::butterfly;
use crate::partial;
use crate::transaction::MeshEdit;

/// Butterfly-split every edge, then cut every face into four triangles.
///
/// All split positions are computed on the unmodified mesh first, so the
/// result does not depend on the order in which edges are visited.
pub fn subdivide_mesh(edit: &mut MeshEdit<'_>) {
    let mut affected = AffectedFaces::new();
    affected.insert_all(edit.mesh().face_ids());
    affected.commit();

    let mesh = edit.mesh();
    let splits: Vec<(EdgeId, Vec3)> = affected
        .to_edge_vec(mesh)
        .into_iter()
        .map(|edge| (edge, butterfly::subdivide_edge(mesh, edge)))
        .collect();

    let mut new_vertices = BTreeSet::<VertexId>::new();
    for &(edge, position) in &splits {
        let new_edge = partial::insert_edge_vertex(edit, &mut affected, edge, position);
        new_vertices.insert(edit.mesh().edge(new_edge).vertex2);
    }

    let faces: Vec<_> = affected.faces().iter().copied().collect();
    for &face in &faces {
        partial::triangulate_6gon(edit, &mut affected, face, &new_vertices);
    }

    let vertices: Vec<VertexId> = edit.mesh().vertex_ids().collect();
    for vertex in vertices {
        edit.write_normal(vertex);
    }
    edit.realign_all_faces();
    edit.buffer_data();

    debug!(
        edges = splits.len(),
        faces = edit.mesh().num_faces(),
        "subdivided mesh {}",
        edit.mesh().identifier()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partial::fixtures;
    use crate::transaction::Transaction;

    #[test]
    fn test_octahedron_quadruples() {
        let mut mesh = fixtures::octahedron();
        let mut transaction = Transaction::new(mesh.identifier());

        subdivide_mesh(&mut transaction.edit(&mut mesh));

        assert_eq!(mesh.num_faces(), 32);
        assert_eq!(mesh.num_edges(), 48);
        assert_eq!(mesh.num_vertices(), 18);
        assert_eq!(mesh.validate(), Ok(()));
        assert_eq!(mesh.validate_buffers(), Ok(()));
    }

    #[test]
    fn test_icosphere_new_vertices_have_valence_six() {
        let mut mesh = fixtures::icosphere();
        let old: BTreeSet<VertexId> = mesh.vertex_ids().collect();
        let valences: Vec<usize> = old.iter().map(|&v| mesh.valence(v)).collect();
        let mut transaction = Transaction::new(mesh.identifier());

        subdivide_mesh(&mut transaction.edit(&mut mesh));

        assert_eq!(mesh.num_faces(), 320);
        for vertex in mesh.vertex_ids().filter(|v| !old.contains(v)) {
            assert_eq!(mesh.valence(vertex), 6);
        }
        for (&vertex, &valence) in old.iter().zip(&valences) {
            assert_eq!(mesh.valence(vertex), valence);
        }
    }

    #[test]
    fn test_subdivision_undo_restores_counts() {
        let mut mesh = fixtures::octahedron();
        let indices = mesh.indices().to_vec();
        let mut transaction = Transaction::new(mesh.identifier());

        subdivide_mesh(&mut transaction.edit(&mut mesh));
        transaction.mark_applied();
        transaction.undo(&mut mesh).unwrap();

        assert_eq!(mesh.num_faces(), 8);
        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(&mesh.indices()[..indices.len()], &indices[..]);
        assert_eq!(mesh.validate_buffers(), Ok(()));
    }
}
