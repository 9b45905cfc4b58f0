//! High-level actions.
//!
//! An action is one user-level edit of a whole mesh. It runs on a
//! [`MeshEdit`], so everything it does lands in a single transaction, and it
//! always ends with [`finalize`]:
//!
//! ```text
//!   operators ──> affected faces ──> finalize
//!                                     ├─ realign faces in the octree
//!                                     ├─ collapse degenerated faces
//!                                     ├─ interpolate normals
//!                                     └─ prepare buffers
//! ```
//!
//! Only after [`finalize`] returns is the mesh guaranteed to be manifold and
//! free of degenerated faces.

mod collapse;
mod edges;
mod split;
mod subdivide;
mod vertices;

use tracing::debug;
use winged::{AffectedFaces, FaceId};

use crate::partial;
use crate::transaction::MeshEdit;

pub use collapse::collapse_face;
pub use edges::{reduce_edges, relax_edges};
pub use split::split_mesh;
pub use subdivide::subdivide_mesh;
pub use vertices::{move_vertices, smooth};

// ============================================================================
// Finalize
// ============================================================================

/// Bring the mesh back into a consistent state after an edit.
///
/// Staged faces are committed first. Calling this again with an empty
/// `affected` set changes nothing.
pub fn finalize(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces) {
    affected.commit();
    let faces: Vec<FaceId> = alive(edit, affected.faces().iter().copied());
    for &face in &faces {
        edit.realign_face(face);
    }

    let collapsed = collapse_degenerated_faces(edit, affected);

    let vertices = affected.to_vertex_set(edit.mesh());
    for &vertex in &vertices {
        edit.write_normal(vertex);
    }
    edit.buffer_data();

    debug!(
        faces = faces.len(),
        vertices = vertices.len(),
        collapsed,
        "finalized mesh {}",
        edit.mesh().identifier()
    );
    debug_assert_eq!(edit.mesh().octree().num_degenerated_faces(), 0);
}

/// Collapse degenerated faces until the octree reports none.
///
/// Faces disturbed by a collapse get fresh indices, are realigned and join
/// the committed faces of `affected`. Returns the number of collapses.
pub fn collapse_degenerated_faces(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces) -> usize {
    let mut collapsed = 0;
    while let Some(face) = edit.mesh().some_degenerated_face() {
        partial::collapse_face(edit, affected, face);
        collapsed += 1;
        if edit.mesh().is_empty() {
            break;
        }

        let disturbed = alive(edit, affected.uncommitted_faces().iter().copied());
        for face in disturbed {
            if edit.mesh().is_triangle(face) {
                edit.write_indices(face);
            }
            edit.realign_face(face);
        }
        affected.commit();
    }
    collapsed
}

fn alive(edit: &MeshEdit<'_>, faces: impl Iterator<Item = FaceId>) -> Vec<FaceId> {
    faces.filter(|&face| edit.mesh().get_face(face).is_some()).collect()
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use winged::{EdgeId, VertexId};

    use super::*;
    use crate::partial::fixtures;
    use crate::transaction::Transaction;

    #[test]
    fn test_finalize_writes_normals_of_moved_vertices() {
        let mut mesh = fixtures::icosphere();
        let vertex = VertexId(3);
        let before = mesh.normal(vertex);
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();
        let mut edit = transaction.edit(&mut mesh);

        edit.set_position(vertex, 1.3 * edit.mesh().position(vertex) + 0.2 * Vec3::X);
        affected.insert_all(edit.mesh().vertex_faces(vertex));
        finalize(&mut edit, &mut affected);

        assert_ne!(mesh.normal(vertex), before);
        assert_eq!(mesh.normal(vertex), mesh.interpolated_normal(vertex));
        assert!(!affected.has_uncommitted());
    }

    #[test]
    fn test_finalize_with_nothing_affected_records_nothing() {
        let mut mesh = fixtures::icosphere();
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();

        finalize(&mut transaction.edit(&mut mesh), &mut affected);

        assert!(transaction.is_empty());
    }

    #[test]
    fn test_degenerated_face_is_collapsed() {
        let mut mesh = fixtures::icosphere();
        let edge = EdgeId(7);
        let (v1, v2) = (mesh.edge(edge).vertex1, mesh.edge(edge).vertex2);
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();
        let mut edit = transaction.edit(&mut mesh);

        // Move v1 onto v2: both faces of the edge lose their area
        let target = edit.mesh().position(v2);
        edit.set_position(v1, target);
        affected.insert_all(edit.mesh().vertex_faces(v1));
        finalize(&mut edit, &mut affected);

        assert_eq!(mesh.octree().num_degenerated_faces(), 0);
        assert!(mesh.num_faces() < 80);
        assert!(mesh.face_ids().all(|face| !mesh.is_degenerated(face)));
        assert_eq!(mesh.validate(), Ok(()));
        assert_eq!(mesh.validate_buffers(), Ok(()));
    }
}
