//! Deletion: dissolve an edge into one face, or remove a vertex with its star.

use tracing::trace;
use winged::{AffectedFaces, EdgeId, FaceId, VertexId};

use crate::transaction::{EdgeEnd, EdgeLink, MeshEdit};

use super::fail_safe;

/// Remove `edge` and merge its right face into its left face.
///
/// ```text
///    v2                v2
///    |\                |\
///    | \       =>      | \
///  L |e R              | L
///    | /               | /
///    |/                |/
///    v1                v1
/// ```
///
/// Returns the surviving face.
///
/// # Panics
/// If both sides of `edge` are the same face.
pub fn delete_edge_and_right_face(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces, edge: EdgeId) -> FaceId {
    let mesh = edit.mesh();
    let e = mesh.edge(edge).clone();
    let (remaining, face_to_delete) = (e.left_face, e.right_face);
    assert_ne!(remaining, face_to_delete, "{edge} has the same face on both sides");

    let triangle = mesh.face_triangle(face_to_delete);
    let moved: Vec<EdgeId> = mesh
        .face_edges(face_to_delete)
        .into_iter()
        .filter(|&other| other != edge)
        .collect();

    affected.remove(face_to_delete);
    affected.insert(remaining);

    for other in moved {
        edit.set_face_of(other, face_to_delete, remaining);
    }

    edit.set_successor(e.left_predecessor, remaining, e.right_successor);
    edit.set_predecessor(e.left_successor, remaining, e.right_predecessor);
    edit.set_successor(e.right_predecessor, remaining, e.left_successor);
    edit.set_predecessor(e.right_successor, remaining, e.left_predecessor);

    edit.set_vertex_edge(e.vertex1, e.left_predecessor);
    edit.set_vertex_edge(e.vertex2, e.left_successor);
    edit.set_face_edge(remaining, e.left_successor);

    edit.delete_edge(edge);
    edit.delete_face(face_to_delete, &triangle);

    trace!("Dissolved {edge} into {remaining}");
    remaining
}

/// Remove a vertex of valence 2, joining its two edges into one.
///
/// Returns the surviving edge.
fn delete_valence2_vertex(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces, vertex: VertexId) -> EdgeId {
    let mesh = edit.mesh();
    debug_assert_eq!(mesh.valence(vertex), 2);
    let Some(remaining) = mesh.vertex(vertex).edge else {
        panic!("{vertex} has no edge");
    };
    let r = mesh.edge(remaining).clone();
    let (left, right) = (r.left_face, r.right_face);
    let at_vertex1 = r.is_vertex1(vertex);
    let to_delete = if at_vertex1 {
        r.left_predecessor
    } else {
        r.left_successor
    };
    let d = mesh.edge(to_delete).clone();
    let other = d.other_vertex(vertex);
    let far = r.other_vertex(vertex);

    if at_vertex1 {
        edit.set_edge_link(remaining, EdgeLink::LeftPredecessor, d.predecessor(left));
        edit.set_edge_link(remaining, EdgeLink::RightSuccessor, d.successor(right));
        edit.set_edge_vertex(remaining, EdgeEnd::Vertex1, other);
    } else {
        edit.set_edge_link(remaining, EdgeLink::LeftSuccessor, d.successor(left));
        edit.set_edge_link(remaining, EdgeLink::RightPredecessor, d.predecessor(right));
        edit.set_edge_vertex(remaining, EdgeEnd::Vertex2, other);
    }

    if d.is_vertex1(vertex) {
        edit.set_predecessor(d.left_successor, d.left_face, remaining);
        edit.set_successor(d.right_predecessor, d.right_face, remaining);
    } else {
        edit.set_successor(d.left_predecessor, d.left_face, remaining);
        edit.set_predecessor(d.right_successor, d.right_face, remaining);
    }

    edit.set_vertex_edge(other, remaining);
    edit.set_vertex_edge(far, remaining);
    edit.set_face_edge(left, remaining);
    edit.set_face_edge(right, remaining);
    affected.insert(left);
    affected.insert(right);

    edit.delete_edge(to_delete);
    edit.delete_vertex(vertex);
    remaining
}

/// Remove `vertex` and all its incident edges, leaving a single face that
/// covers the former star.
///
/// This does not guard against pinching the mesh; on a tetrahedron it leaves
/// two faces sharing all three edges. Use [`delete_valence3_vertex`] for
/// the guarded variant.
pub fn delete_vertex(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces, vertex: VertexId) -> FaceId {
    let valence = edit.mesh().valence(vertex);
    for _ in 2..valence {
        let Some(edge) = edit.mesh().vertex(vertex).edge else {
            panic!("{vertex} has no edge");
        };
        delete_edge_and_right_face(edit, affected, edge);
    }
    let edge = delete_valence2_vertex(edit, affected, vertex);
    let remaining = edit.mesh().edge(edge).left_face;
    delete_edge_and_right_face(edit, affected, edge);

    trace!("Deleted {vertex} of valence {valence}");
    remaining
}

/// Remove a vertex of valence 3, leaving one triangle.
///
/// If a neighbour also has valence 3 the deletion would pinch the mesh;
/// the edit gives up through [`fail_safe`]. Returns the surviving triangle,
/// or `None` after a reset.
///
/// # Panics
/// If `vertex` does not have valence 3.
pub fn delete_valence3_vertex(
    edit: &mut MeshEdit<'_>,
    affected: &mut AffectedFaces,
    vertex: VertexId,
) -> Option<FaceId> {
    let mesh = edit.mesh();
    assert_eq!(mesh.valence(vertex), 3, "{vertex} does not have valence 3");

    if mesh.vertex_neighbors(vertex).into_iter().any(|v| mesh.valence(v) == 3) {
        fail_safe(edit, affected, "neighbour of valence 3 vertex has valence 3");
        return None;
    }
    let remaining = delete_vertex(edit, affected, vertex);
    edit.write_indices(remaining);
    Some(remaining)
}
