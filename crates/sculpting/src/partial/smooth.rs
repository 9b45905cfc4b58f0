//! Tangential smoothing.
//!
//! Each iteration moves every vertex towards the average of its one-ring,
//! but only within the tangent plane given by its averaged face normal. The
//! moved point is then projected back onto the surface along that normal,
//! so smoothing evens out the triangulation without shrinking the shape.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;
use tracing::debug;
use winged::intersection::ray_triangle;
use winged::{AffectedFaces, Ray, Triangle, VertexId, WingedMesh};

use crate::transaction::MeshEdit;

/// Smooth `vertices` in place.
///
/// All vertices of one iteration are moved simultaneously. Only the final
/// positions are recorded, and every face touching a moved vertex is
/// staged in `affected`.
pub fn smooth(
    edit: &mut MeshEdit<'_>,
    affected: &mut AffectedFaces,
    vertices: &BTreeSet<VertexId>,
    iterations: u32,
) {
    if vertices.is_empty() || iterations == 0 {
        return;
    }

    let mesh = edit.mesh();
    let mut positions: BTreeMap<VertexId, Vec3> = BTreeMap::new();
    for _ in 0..iterations {
        let moved: Vec<(VertexId, Vec3)> = vertices
            .iter()
            .map(|&vertex| (vertex, smoothed_position(mesh, &positions, vertex)))
            .collect();
        positions.extend(moved);
    }

    debug!(vertices = vertices.len(), iterations, "smoothing");
    for (vertex, position) in positions {
        edit.set_position(vertex, position);
        affected.insert_all(edit.mesh().vertex_faces(vertex));
    }
}

/// Current position, preferring one computed by an earlier iteration
fn lookup(mesh: &WingedMesh, positions: &BTreeMap<VertexId, Vec3>, vertex: VertexId) -> Vec3 {
    positions.get(&vertex).copied().unwrap_or_else(|| mesh.position(vertex))
}

fn smoothed_position(mesh: &WingedMesh, positions: &BTreeMap<VertexId, Vec3>, vertex: VertexId) -> Vec3 {
    let position = lookup(mesh, positions, vertex);
    let ring = mesh.vertex_neighbors(vertex);
    if ring.is_empty() {
        return position;
    }

    let delta = ring
        .iter()
        .map(|&neighbor| lookup(mesh, positions, neighbor) - position)
        .sum::<Vec3>()
        / ring.len() as f32;

    let epsilon = mesh.epsilon();
    let triangles: Vec<Triangle> = mesh
        .vertex_faces(vertex)
        .into_iter()
        .map(|face| {
            let [a, b, c] = [0, 1, 2].map(|i| lookup(mesh, positions, mesh.face_vertex(face, i)));
            Triangle::new(a, b, c)
        })
        .filter(|triangle| !triangle.is_degenerated(epsilon))
        .collect();

    let normal = triangles.iter().map(Triangle::normal).sum::<Vec3>().normalize_or_zero();
    if normal == Vec3::ZERO {
        return position;
    }

    let tangential = position + delta - normal * normal.dot(delta);
    let ray = Ray::line(tangential, normal);
    triangles
        .iter()
        .find_map(|triangle| ray_triangle(&ray, triangle, epsilon))
        .map_or(tangential, |hit| hit.point)
}
