//! Triangulation of faces left with extra corners by edge splits.
//!
//! After edges of a triangle are split at new vertices the face is a
//! polygon with 4, 5 or 6 corners. Each case has a fixed cut pattern:
//!
//! ```text
//!   quad               5-gon                 6-gon
//!     x                  x                     x
//!    /|\                /|\                   / \
//!   / | \              n-+ \                 n---n
//!  /  |  \            /  '. \               / \ / \
//! x---n---x          x-----n-x             x---n---x
//! ```
//!
//! `n` marks new vertices. Every resulting triangle gets fresh render indices.

use std::collections::BTreeSet;

use glam::Vec3;
use tracing::trace;
use winged::{AffectedFaces, EdgeGeometry, EdgeId, FaceId, Triangle, VertexId};

use crate::transaction::MeshEdit;

use super::insert::{insert_edge_face, insert_edge_face_at_new_vertex, insert_edge_vertex};

/// Cut a quad in two, connecting its new vertex to the opposite corner.
///
/// Returns the new triangle.
///
/// # Panics
/// If `face` is not a quad with a corner in `new_vertices`.
pub fn triangulate_quad(
    edit: &mut MeshEdit<'_>,
    affected: &mut AffectedFaces,
    face: FaceId,
    new_vertices: &BTreeSet<VertexId>,
) -> FaceId {
    let mesh = edit.mesh();
    assert_eq!(mesh.face_num_edges(face), 4, "{face} is not a quad");
    let Some(edge) = mesh.face_edges(face).into_iter().find(|&e| {
        let e = mesh.edge(e);
        new_vertices.contains(&e.vertex1) || new_vertices.contains(&e.vertex2)
    }) else {
        panic!("{face} has no new corner");
    };

    let (_, new_face) = insert_edge_face_at_new_vertex(edit, affected, face, edge, new_vertices);
    edit.write_indices(face);
    edit.write_indices(new_face);
    new_face
}

/// Cut a pentagon with two new corners into three triangles.
///
/// The first cut goes out from the new vertex just before the only
/// unsplit edge; the second connects the lower valence end of that edge.
///
/// # Panics
/// If `face` is not a pentagon with exactly one edge free of new vertices.
pub fn triangulate_5gon(
    edit: &mut MeshEdit<'_>,
    affected: &mut AffectedFaces,
    face: FaceId,
    new_vertices: &BTreeSet<VertexId>,
) {
    let mesh = edit.mesh();
    assert_eq!(mesh.face_num_edges(face), 5, "{face} is not a pentagon");
    let Some(unsplit) = mesh.face_edges(face).into_iter().find(|&e| {
        let e = mesh.edge(e);
        !new_vertices.contains(&e.vertex1) && !new_vertices.contains(&e.vertex2)
    }) else {
        panic!("every edge of {face} has a new vertex");
    };
    let before = mesh.edge(unsplit).predecessor(face);

    let (_, first) = insert_edge_face_at_new_vertex(edit, affected, face, before, new_vertices);
    edit.write_indices(first);

    let mesh = edit.mesh();
    let e = mesh.edge(unsplit);
    let vertex = if mesh.valence(e.vertex1) < mesh.valence(e.vertex2) {
        e.vertex1
    } else {
        e.vertex2
    };
    let (_, second) = insert_edge_face(edit, affected, face, vertex);
    edit.write_indices(face);
    edit.write_indices(second);
}

/// Cut a hexagon with alternating new corners into four triangles, one
/// per original corner plus the center triangle spanned by the new ones.
///
/// # Panics
/// If `face` is not a hexagon.
pub fn triangulate_6gon(
    edit: &mut MeshEdit<'_>,
    affected: &mut AffectedFaces,
    face: FaceId,
    new_vertices: &BTreeSet<VertexId>,
) {
    let mesh = edit.mesh();
    assert_eq!(mesh.face_num_edges(face), 6, "{face} is not a hexagon");
    let Some(start) = mesh.face(face).edge else {
        panic!("{face} has no edge");
    };

    // e01 leaves an original corner towards a new one
    let e01 = if new_vertices.contains(&mesh.edge(start).second_vertex(face)) {
        start
    } else {
        mesh.edge(start).predecessor(face)
    };
    let edges = mesh.face_edges_from(face, e01);
    let [e01, e12, e23, e34, e45, e50] = [edges[0], edges[1], edges[2], edges[3], edges[4], edges[5]];
    let v: Vec<VertexId> = edges.iter().map(|&e| mesh.edge(e).first_vertex(face)).collect();
    let p: Vec<Vec3> = v.iter().map(|&vertex| mesh.position(vertex)).collect();

    let a = edit.add_face(&Triangle::new(p[0], p[1], p[5]));
    let b = edit.add_face(&Triangle::new(p[1], p[2], p[3]));
    let c = edit.add_face(&Triangle::new(p[3], p[4], p[5]));
    edit.set_face_edge(a, e01);
    edit.set_face_edge(b, e23);
    edit.set_face_edge(c, e45);

    let e13 = edit.add_unlinked_edge(v[1], v[3], face, b);
    let e35 = edit.add_unlinked_edge(v[3], v[5], face, c);
    let e51 = edit.add_unlinked_edge(v[5], v[1], face, a);

    edit.set_edge_geometry(e13, inner_edge(v[1], v[3], face, b, [e51, e35, e23, e12]));
    edit.set_edge_geometry(e35, inner_edge(v[3], v[5], face, c, [e13, e51, e45, e34]));
    edit.set_edge_geometry(e51, inner_edge(v[5], v[1], face, a, [e35, e13, e01, e50]));

    relink(edit, e01, face, a, e50, e51);
    relink(edit, e12, face, b, e13, e23);
    relink(edit, e23, face, b, e12, e13);
    relink(edit, e34, face, c, e35, e45);
    relink(edit, e45, face, c, e34, e35);
    relink(edit, e50, face, a, e51, e01);

    edit.set_face_edge(face, e13);

    for triangle in [face, a, b, c] {
        edit.write_indices(triangle);
        affected.insert(triangle);
    }
}

/// Triangulate a face after splitting some of its edges
///
/// # Panics
/// If `face` does not have 4, 5 or 6 edges.
pub fn triangulate(
    edit: &mut MeshEdit<'_>,
    affected: &mut AffectedFaces,
    face: FaceId,
    new_vertices: &BTreeSet<VertexId>,
) {
    match edit.mesh().face_num_edges(face) {
        4 => {
            triangulate_quad(edit, affected, face, new_vertices);
        }
        5 => triangulate_5gon(edit, affected, face, new_vertices),
        6 => triangulate_6gon(edit, affected, face, new_vertices),
        n => panic!("cannot triangulate {face} with {n} edges"),
    }
}

/// Split `edge` at `position` and triangulate both adjacent faces.
///
/// Returns the new vertex, which ends with valence 4.
pub fn split_and_triangulate_edge(
    edit: &mut MeshEdit<'_>,
    affected: &mut AffectedFaces,
    edge: EdgeId,
    position: Vec3,
) -> VertexId {
    let e = edit.mesh().edge(edge);
    let (left, right) = (e.left_face, e.right_face);

    let new_edge = insert_edge_vertex(edit, affected, edge, position);
    let vertex = edit.mesh().edge(new_edge).vertex2;
    let new_vertices = BTreeSet::from([vertex]);

    triangulate_quad(edit, affected, left, &new_vertices);
    triangulate_quad(edit, affected, right, &new_vertices);
    trace!("Split {edge} at {vertex}");
    vertex
}

/// Split a triangle into three around a new vertex at `position`.
///
/// ```text
///          v2
///         /|\
///        / | \
///     b /  v3 \ a
///      / /   \ \
///     v0 ----- v1
///          f
/// ```
///
/// `face` keeps the corner `v0, v1`. Returns the new vertex.
pub fn split_and_triangulate_face(
    edit: &mut MeshEdit<'_>,
    affected: &mut AffectedFaces,
    face: FaceId,
    position: Vec3,
) -> VertexId {
    let mesh = edit.mesh();
    assert!(mesh.is_triangle(face), "{face} is not a triangle");
    let Some(e01) = mesh.face(face).edge else {
        panic!("{face} has no edge");
    };
    let e12 = mesh.edge(e01).successor(face);
    let e20 = mesh.edge(e12).successor(face);
    let v0 = mesh.edge(e01).first_vertex(face);
    let v1 = mesh.edge(e12).first_vertex(face);
    let v2 = mesh.edge(e20).first_vertex(face);
    let (p0, p1, p2) = (mesh.position(v0), mesh.position(v1), mesh.position(v2));

    let v3 = edit.add_vertex(position);
    let a = edit.add_face(&Triangle::new(p1, p2, position));
    let b = edit.add_face(&Triangle::new(p0, position, p2));

    let e03 = edit.add_unlinked_edge(v0, v3, b, face);
    let e13 = edit.add_unlinked_edge(v1, v3, face, a);
    let e23 = edit.add_unlinked_edge(v2, v3, a, b);

    edit.set_edge_geometry(e03, inner_edge(v0, v3, b, face, [e20, e23, e13, e01]));
    edit.set_edge_geometry(e13, inner_edge(v1, v3, face, a, [e01, e03, e23, e12]));
    edit.set_edge_geometry(e23, inner_edge(v2, v3, a, b, [e12, e13, e03, e20]));

    edit.set_predecessor(e01, face, e03);
    edit.set_successor(e01, face, e13);
    relink(edit, e12, face, a, e13, e23);
    relink(edit, e20, face, b, e23, e03);

    edit.set_vertex_edge(v3, e03);
    edit.set_face_edge(a, e12);
    edit.set_face_edge(b, e20);

    for triangle in [face, a, b] {
        edit.write_indices(triangle);
        affected.insert(triangle);
    }
    trace!("Split {face} at {v3}");
    v3
}

/// Links are `[left_predecessor, left_successor, right_predecessor, right_successor]`
fn inner_edge(vertex1: VertexId, vertex2: VertexId, left: FaceId, right: FaceId, links: [EdgeId; 4]) -> EdgeGeometry {
    EdgeGeometry {
        vertex1,
        vertex2,
        left_face: left,
        right_face: right,
        left_predecessor: links[0],
        left_successor: links[1],
        right_predecessor: links[2],
        right_successor: links[3],
    }
}

/// Move `edge` from face `old` to `new` and set its links there
fn relink(edit: &mut MeshEdit<'_>, edge: EdgeId, old: FaceId, new: FaceId, predecessor: EdgeId, successor: EdgeId) {
    edit.set_face_of(edge, old, new);
    edit.set_predecessor(edge, new, predecessor);
    edit.set_successor(edge, new, successor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partial::{delete_edge_and_right_face, fixtures};
    use crate::transaction::Transaction;

    #[test]
    fn test_split_edge_adds_two_faces() {
        let mut mesh = fixtures::icosphere();
        let edge = EdgeId(7);
        let middle = mesh.edge_middle(edge);
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();

        let vertex = split_and_triangulate_edge(&mut transaction.edit(&mut mesh), &mut affected, edge, middle);

        assert_eq!(mesh.num_faces(), 82);
        assert_eq!(mesh.valence(vertex), 4);
        assert_eq!(affected.uncommitted_faces().len(), 4);
        assert_eq!(mesh.validate_buffers(), Ok(()));
    }

    #[test]
    fn test_split_face_adds_valence3_vertex() {
        let mut mesh = fixtures::octahedron();
        let face = FaceId(4);
        let center = mesh.face_triangle(face).center();
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();

        let vertex = split_and_triangulate_face(&mut transaction.edit(&mut mesh), &mut affected, face, center);

        assert_eq!(mesh.num_faces(), 10);
        assert_eq!(mesh.num_edges(), 15);
        assert_eq!(mesh.valence(vertex), 3);
        assert_eq!(mesh.validate_buffers(), Ok(()));
        for f in mesh.vertex_faces(vertex) {
            assert!(mesh.face_normal(f).dot(center) > 0.0);
        }
    }

    #[test]
    fn test_dissolved_edge_triangulates_back() {
        let mut mesh = fixtures::icosphere();
        let edge = EdgeId(11);
        let corner = mesh.edge_vertex(edge, mesh.edge(edge).right_face, 2);
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();
        let mut edit = transaction.edit(&mut mesh);

        let quad = delete_edge_and_right_face(&mut edit, &mut affected, edge);
        assert_eq!(edit.mesh().num_faces(), 79);
        triangulate(&mut edit, &mut affected, quad, &BTreeSet::from([corner]));

        assert_eq!(mesh.num_faces(), 80);
        assert_eq!(mesh.validate_buffers(), Ok(()));
    }

    #[test]
    fn test_hexagon_from_three_splits() {
        let mut mesh = fixtures::octahedron();
        let face = FaceId(0);
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();
        let mut edit = transaction.edit(&mut mesh);

        let mut new_vertices = BTreeSet::new();
        for edge in edit.mesh().face_edges(face) {
            let middle = edit.mesh().edge_middle(edge);
            let new_edge = insert_edge_vertex(&mut edit, &mut affected, edge, middle);
            new_vertices.insert(edit.mesh().edge(new_edge).vertex2);
        }
        triangulate(&mut edit, &mut affected, face, &new_vertices);

        assert!(mesh.is_triangle(face));
        for vertex in mesh.face_vertices(face) {
            assert!(new_vertices.contains(&vertex));
        }
        assert_eq!(mesh.num_faces(), 11);
        assert_eq!(mesh.validate(), Ok(()));
    }

    #[test]
    fn test_pentagon_from_two_splits() {
        let mut mesh = fixtures::icosphere();
        let face = FaceId(3);
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();
        let mut edit = transaction.edit(&mut mesh);

        let mut new_vertices = BTreeSet::new();
        for edge in edit.mesh().face_edges(face).into_iter().take(2) {
            let middle = edit.mesh().edge_middle(edge);
            let new_edge = insert_edge_vertex(&mut edit, &mut affected, edge, middle);
            new_vertices.insert(edit.mesh().edge(new_edge).vertex2);
        }
        triangulate(&mut edit, &mut affected, face, &new_vertices);

        assert!(mesh.is_triangle(face));
        assert_eq!(mesh.num_faces(), 82);
        assert_eq!(mesh.validate(), Ok(()));
    }
}
