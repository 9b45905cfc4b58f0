//! Collapse a face into a single vertex.

use tracing::{debug, warn};
use winged::{AffectedFaces, FaceId};

use crate::partial::{try_collapse_edge, Collapse};
use crate::transaction::MeshEdit;

use super::finalize;

/// Merge the corners of the triangle `face` into one vertex at its center.
///
/// The face is removed by collapsing one of its edges and then the edge
/// between the merged vertex and the remaining corner. Valence 3 corners
/// are dissolved on the way, which also removes the face. Returns false
/// if the first collapse would pinch the mesh; nothing is changed then.
///
/// # Panics
/// If `face` is not a triangle.
pub fn collapse_face(edit: &mut MeshEdit<'_>, face: FaceId) -> bool {
    let mesh = edit.mesh();
    assert!(mesh.is_triangle(face), "{face} is not a triangle");
    let Some(edge) = mesh.face(face).edge else {
        panic!("{face} has no edge");
    };
    let center = mesh.face_triangle(face).center();
    let apex = mesh.vertex(mesh.edge_vertex(edge, face, 2)).identifier;
    let mut affected = AffectedFaces::new();

    let merged = match try_collapse_edge(edit, &mut affected, edge) {
        Collapse::Merged(vertex) => Some(vertex),
        Collapse::Dissolved => None,
        Collapse::Refused => {
            warn!("Cannot collapse {face}: its edge would pinch the mesh");
            return false;
        }
    };

    let spoke = merged.and_then(|vertex| {
        let apex = edit.mesh().resolve_vertex(apex)?;
        edit.mesh().find_edge(vertex, apex)
    });
    if let Some(spoke) = spoke {
        match try_collapse_edge(edit, &mut affected, spoke) {
            Collapse::Merged(vertex) => {
                edit.set_position(vertex, center);
                affected.insert_all(edit.mesh().vertex_faces(vertex));
            }
            Collapse::Dissolved => {}
            Collapse::Refused => debug!("{face} collapsed to an edge only"),
        }
    }

    finalize(edit, &mut affected);
    true
}
