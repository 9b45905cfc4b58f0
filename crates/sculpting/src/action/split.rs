//! Cut a mesh along a plane.
//!
//! Afterwards no triangle crosses the plane: every edge that did is split
//! where it meets the plane, and the new vertices are connected across
//! each cut face.
//!
//! ```text
//!   before              after
//!     a                   a
//!    / \                 / \
//!  -/---\-- plane  =>  -n---n-
//!  /     \             / \   \
//! b-------c           b---'---c
//! ```

use std::collections::BTreeSet;

use tracing::debug;
use winged::intersection::ray_plane;
use winged::{AffectedFaces, FaceId, Plane, Ray, VertexId, WingedMesh};

use crate::partial;
use crate::transaction::MeshEdit;

use super::finalize;

/// Split every face crossing `plane`.
///
/// Vertices closer to the plane than epsilon are snapped onto it first.
/// Returns false, without changing anything, if the plane misses the mesh.
///
/// # Panics
/// If a face crossed by the plane is neither a triangle nor cut through
/// exactly one or two of its edges.
pub fn split_mesh(edit: &mut MeshEdit<'_>, plane: &Plane) -> bool {
    let mut affected = AffectedFaces::new();
    if !edit.mesh().intersect_plane(plane, &mut affected) {
        debug!("Plane does not touch mesh {}", edit.mesh().identifier());
        return false;
    }
    let epsilon = edit.mesh().epsilon();

    snap_vertices(edit, &affected, plane, epsilon);
    let mesh = edit.mesh();
    affected.retain_committed(|&face| is_cut(mesh, face, plane, epsilon));

    let new_vertices = split_edges(edit, &mut affected, plane, epsilon);
    connect_new_vertices(edit, &mut affected, &new_vertices);
    affected.commit();

    let faces: Vec<FaceId> = affected.faces().iter().copied().collect();
    for face in faces {
        match edit.mesh().face_num_edges(face) {
            3 => edit.write_indices(face),
            4 => {
                partial::triangulate_quad(edit, &mut affected, face, &new_vertices);
            }
            n => panic!("{face} has {n} edges after connecting the cut"),
        }
    }

    debug!(
        vertices = new_vertices.len(),
        faces = affected.faces().len(),
        "split mesh {}",
        edit.mesh().identifier()
    );
    finalize(edit, &mut affected);
    true
}

fn snap_vertices(edit: &mut MeshEdit<'_>, affected: &AffectedFaces, plane: &Plane, epsilon: f32) {
    for vertex in affected.to_vertex_set(edit.mesh()) {
        let position = edit.mesh().position(vertex);
        if plane.distance(position).abs() < epsilon {
            edit.set_position(vertex, plane.project(position));
        }
    }
}

/// Whether the plane passes through the interior of `face`: either no corner
/// lies on it, or exactly one does and the other two are on opposite sides.
fn is_cut(mesh: &WingedMesh, face: FaceId, plane: &Plane, epsilon: f32) -> bool {
    let distances = mesh
        .face_vertices(face)
        .into_iter()
        .map(|vertex| plane.distance(mesh.position(vertex)))
        .collect::<Vec<f32>>();
    let on_plane = |d: f32| d.abs() < epsilon;
    let above = |d: f32| d > epsilon;

    match distances.iter().filter(|&&d| on_plane(d)).count() {
        0 => true,
        1 => {
            let off: Vec<f32> = distances.into_iter().filter(|&d| !on_plane(d)).collect();
            above(off[0]) != above(off[1])
        }
        _ => false,
    }
}

/// Insert a vertex wherever an edge of the cut faces crosses the plane
fn split_edges(
    edit: &mut MeshEdit<'_>,
    affected: &mut AffectedFaces,
    plane: &Plane,
    epsilon: f32,
) -> BTreeSet<VertexId> {
    let mut new_vertices = BTreeSet::new();
    for edge in affected.to_edge_vec(edit.mesh()) {
        let mesh = edit.mesh();
        let e = mesh.edge(edge);
        let (p1, p2) = (mesh.position(e.vertex1), mesh.position(e.vertex2));
        let ray = Ray::new(p1, p2 - p1);
        let length = mesh.edge_length(edge);

        let Some(t) = ray_plane(&ray, plane, epsilon) else {
            continue;
        };
        if t > epsilon && t < length - epsilon {
            let new_edge = partial::insert_edge_vertex(edit, affected, edge, ray.point_at(t));
            new_vertices.insert(edit.mesh().edge(new_edge).vertex2);
        }
    }
    new_vertices
}

/// Connect the new vertices of every cut face.
///
/// A face with one split edge is a quad and is cut in two triangles right
/// away. A face with two split edges is a pentagon; the edge between its
/// two new vertices leaves a triangle and a quad.
fn connect_new_vertices(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces, new_vertices: &BTreeSet<VertexId>) {
    let faces: Vec<FaceId> = affected.faces().iter().copied().collect();
    for face in faces {
        let mesh = edit.mesh();
        let corners: Vec<VertexId> = mesh
            .face_vertices(face)
            .into_iter()
            .filter(|v| new_vertices.contains(v))
            .collect();

        match (mesh.face_num_edges(face), corners.as_slice()) {
            (3, []) => {}
            (4, &[vertex]) => {
                partial::insert_edge_face(edit, affected, face, vertex);
            }
            (5, &[a, b]) => {
                partial::split_face_with(edit, affected, face, a, b);
            }
            (n, _) => panic!("{face} with {n} edges has {} new corners", corners.len()),
        }
    }
}
