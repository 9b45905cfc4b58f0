//! Edge flips and valence relaxation.

use winged::{AffectedFaces, EdgeGeometry, EdgeId, FaceGradient};

use crate::transaction::MeshEdit;

/// Valence every vertex of a regular triangle mesh has
const TARGET_VALENCE: usize = 6;

/// Replace the diagonal `v1 -> v2` of the quad formed by its two triangles
/// with the other diagonal `v4 -> v3`.
///
/// ```text
///        v3                 v3
///       /  \               /|\
///     v1 -- v2     =>    v1 | v2
///       \  /               \|/
///        v4                 v4
/// ```
///
/// The edge keeps its slot and both faces keep their sides.
///
/// # Panics
/// If a face next to `edge` is not a triangle.
pub fn flip_edge(edit: &mut MeshEdit<'_>, edge: EdgeId) {
    let mesh = edit.mesh();
    let e = mesh.edge(edge).clone();
    let (left, right) = (e.left_face, e.right_face);
    assert!(
        mesh.is_triangle(left) && mesh.is_triangle(right),
        "{edge} does not border two triangles"
    );
    let v3 = mesh.edge_vertex(edge, left, 2);
    let v4 = mesh.edge_vertex(edge, right, 2);

    edit.set_face_edge(left, edge);
    edit.set_face_edge(right, edge);
    edit.set_vertex_edge(e.vertex1, e.left_predecessor);
    edit.set_vertex_edge(e.vertex2, e.right_predecessor);

    edit.set_face_of(e.left_successor, left, right);
    edit.set_face_of(e.right_successor, right, left);

    edit.set_predecessor(e.left_predecessor, left, edge);
    edit.set_successor(e.left_predecessor, left, e.right_successor);
    edit.set_predecessor(e.left_successor, right, e.right_predecessor);
    edit.set_successor(e.left_successor, right, edge);
    edit.set_predecessor(e.right_predecessor, right, edge);
    edit.set_successor(e.right_predecessor, right, e.left_successor);
    edit.set_predecessor(e.right_successor, left, e.left_predecessor);
    edit.set_successor(e.right_successor, left, edge);

    edit.set_edge_geometry(
        edge,
        EdgeGeometry {
            vertex1: v4,
            vertex2: v3,
            left_face: left,
            right_face: right,
            left_predecessor: e.right_successor,
            left_successor: e.left_predecessor,
            right_predecessor: e.left_successor,
            right_successor: e.right_predecessor,
        },
    );
    edit.set_t_edge(edge, false);
    edit.set_face_gradient(edge, FaceGradient::None);

    edit.write_indices(left);
    edit.write_indices(right);
}

/// Flip `edge` if that moves the four involved valences closer to 6.
///
/// Endpoints of valence 3 or less are never reduced further, and an edge
/// whose flip would duplicate an existing edge is left alone. Returns
/// whether the edge was flipped.
pub fn relax_edge(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces, edge: EdgeId) -> bool {
    let mesh = edit.mesh();
    let e = mesh.edge(edge);
    let (left, right) = (e.left_face, e.right_face);
    let v3 = mesh.edge_vertex(edge, left, 2);
    let v4 = mesh.edge_vertex(edge, right, 2);
    let [k1, k2, k3, k4] = [e.vertex1, e.vertex2, v3, v4].map(|v| mesh.valence(v));

    if k1 <= 3 || k2 <= 3 || mesh.find_edge(v3, v4).is_some() {
        return false;
    }

    let before = [k1, k2, k3, k4]
        .iter()
        .map(|k| k.abs_diff(TARGET_VALENCE))
        .sum::<usize>();
    let after = k1.abs_diff(TARGET_VALENCE + 1)
        + k2.abs_diff(TARGET_VALENCE + 1)
        + k3.abs_diff(TARGET_VALENCE - 1)
        + k4.abs_diff(TARGET_VALENCE - 1);
    if after >= before {
        return false;
    }

    affected.insert(left);
    affected.insert(right);
    flip_edge(edit, edge);
    true
}
