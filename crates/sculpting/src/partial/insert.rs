//! Insertion: split an edge at a new vertex, or a face along a new edge.

use std::collections::BTreeSet;

use glam::Vec3;
use tracing::trace;
use winged::{AffectedFaces, EdgeGeometry, EdgeId, FaceGradient, FaceId, Triangle, VertexId};

use crate::transaction::{EdgeEnd, EdgeLink, MeshEdit};

/// Split `edge` at a new vertex placed at `position`.
///
/// ```text
///       new          edge
///   v1 ------> new_v ------> v2
/// ```
///
/// `edge` keeps its slot and now starts at the new vertex. Both adjacent
/// faces gain one edge. Returns the new edge `v1 -> new_v`.
pub fn insert_edge_vertex(
    edit: &mut MeshEdit<'_>,
    affected: &mut AffectedFaces,
    edge: EdgeId,
    position: Vec3,
) -> EdgeId {
    let e = edit.mesh().edge(edge).clone();

    let new_vertex = edit.add_vertex(position);
    let new_edge = edit.add_edge(EdgeGeometry {
        vertex1: e.vertex1,
        vertex2: new_vertex,
        left_face: e.left_face,
        right_face: e.right_face,
        left_predecessor: e.left_predecessor,
        left_successor: edge,
        right_predecessor: edge,
        right_successor: e.right_successor,
    });

    edit.set_edge_vertex(edge, EdgeEnd::Vertex1, new_vertex);
    edit.set_edge_link(edge, EdgeLink::RightSuccessor, new_edge);
    edit.set_edge_link(edge, EdgeLink::LeftPredecessor, new_edge);

    edit.set_vertex_edge(new_vertex, edge);

    edit.set_successor(e.left_predecessor, e.left_face, new_edge);
    edit.set_predecessor(e.right_successor, e.right_face, new_edge);

    edit.set_vertex_edge(e.vertex1, new_edge);
    edit.set_face_edge(e.left_face, new_edge);
    edit.set_face_edge(e.right_face, edge);

    affected.insert(e.left_face);
    affected.insert(e.right_face);

    trace!("Split {edge} at new {new_vertex}");
    new_edge
}

/// Split `face` by a new edge `a -> b`.
///
/// The part of the face walking from `b` round to `a` becomes a new face on
/// the left of the new edge; `face` keeps the rest.
///
/// ```text
///   b ----- x
///   |  new  |
///   a ----- y      face keeps a, ..., b
/// ```
///
/// Returns the new edge and the new face.
///
/// # Panics
/// If `a` or `b` is not a corner of `face`, or if they are already connected
/// along the face.
pub fn split_face_with(
    edit: &mut MeshEdit<'_>,
    affected: &mut AffectedFaces,
    face: FaceId,
    a: VertexId,
    b: VertexId,
) -> (EdgeId, FaceId) {
    let mesh = edit.mesh();
    let edges = mesh.face_edges(face);
    let Some(&left_successor) = edges.iter().find(|&&e| mesh.edge(e).first_vertex(face) == b) else {
        panic!("{b} is not a corner of {face}");
    };
    let Some(&left_predecessor) = edges.iter().find(|&&e| mesh.edge(e).second_vertex(face) == a) else {
        panic!("{a} is not a corner of {face}");
    };
    let right_predecessor = mesh.edge(left_successor).predecessor(face);
    let right_successor = mesh.edge(left_predecessor).successor(face);
    assert!(
        left_successor != left_predecessor && right_predecessor != right_successor,
        "{a} and {b} are adjacent in {face}"
    );

    // Boundary of the new face, walking from b to a
    let chain: Vec<EdgeId> = {
        let mut chain = Vec::new();
        let mut current = left_successor;
        loop {
            chain.push(current);
            if current == left_predecessor {
                break;
            }
            current = mesh.edge(current).successor(face);
        }
        chain
    };
    let corners: Vec<Vec3> = chain
        .iter()
        .map(|&e| mesh.position(mesh.edge(e).first_vertex(face)))
        .chain(std::iter::once(mesh.position(a)))
        .collect();
    let triangle = Triangle::new(corners[0], corners[1], corners[2]);

    let new_face = edit.add_face(&triangle);
    let new_edge = edit.add_edge(EdgeGeometry {
        vertex1: a,
        vertex2: b,
        left_face: new_face,
        right_face: face,
        left_predecessor,
        left_successor,
        right_predecessor,
        right_successor,
    });

    edit.set_face_edge(new_face, new_edge);
    edit.set_face_edge(face, new_edge);

    for &e in &chain {
        edit.set_face_of(e, face, new_face);
    }
    edit.set_successor(left_predecessor, new_face, new_edge);
    edit.set_predecessor(left_successor, new_face, new_edge);
    edit.set_successor(right_predecessor, face, new_edge);
    edit.set_predecessor(right_successor, face, new_edge);

    affected.insert(new_face);
    affected.insert(face);

    trace!("Split {face} along {a} -> {b} into new {new_face}");
    (new_edge, new_face)
}

/// Cut the triangle ending at `vertex` off `face`.
///
/// Connects `vertex` to the corner two steps before it, so the new face is
/// `(prev2, prev1, vertex)`. Returns the new edge and the new triangle.
pub fn insert_edge_face(
    edit: &mut MeshEdit<'_>,
    affected: &mut AffectedFaces,
    face: FaceId,
    vertex: VertexId,
) -> (EdgeId, FaceId) {
    let mesh = edit.mesh();
    assert!(mesh.face_num_edges(face) > 3, "{face} is already a triangle");

    let Some(incoming) = mesh
        .face_edges(face)
        .into_iter()
        .find(|&e| mesh.edge(e).second_vertex(face) == vertex)
    else {
        panic!("{vertex} is not a corner of {face}");
    };
    let before = mesh.edge(incoming).predecessor(face);
    let target = mesh.edge(before).first_vertex(face);

    split_face_with(edit, affected, face, vertex, target)
}

/// [`insert_edge_face`] at whichever endpoint of `edge` is in `new_vertices`,
/// preferring `vertex1`.
///
/// The inserted edge runs from a fresh vertex into the face, so it is marked
/// as a T-edge with the cut-off triangle on its gradient side.
pub fn insert_edge_face_at_new_vertex(
    edit: &mut MeshEdit<'_>,
    affected: &mut AffectedFaces,
    face: FaceId,
    edge: EdgeId,
    new_vertices: &BTreeSet<VertexId>,
) -> (EdgeId, FaceId) {
    let e = edit.mesh().edge(edge);
    let vertex = if new_vertices.contains(&e.vertex1) {
        e.vertex1
    } else {
        e.vertex2
    };
    debug_assert!(new_vertices.contains(&vertex), "{edge} has no new endpoint");

    let (new_edge, new_face) = insert_edge_face(edit, affected, face, vertex);
    edit.set_t_edge(new_edge, true);
    edit.set_face_gradient(new_edge, FaceGradient::Left);
    (new_edge, new_face)
}
