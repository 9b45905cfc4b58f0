//! Modified butterfly subdivision.
//!
//! The new point of an edge `(v1, v2)` is computed from the rings of both
//! endpoints. Ring entries are collected around each endpoint starting at
//! the edge itself, so `a1[0]` lies at `v2` and `a2[0]` at `v1`.
//!
//! ```text
//!         a1[1] ----- a2[k]
//!         /   \       /   \
//!        /     \     /     \
//!     a1[2] --- v1 ------- v2 --- a2[2]
//!        \     /     \     /
//!         \   /       \   /
//!         a1[5] ----- a2[1]
//! ```
//!
//! - both endpoints regular (valence 6): 8-point stencil
//! - one endpoint irregular: stencil over that endpoint's ring
//! - both irregular: average of both one-sided stencils
//!
//! Ring entries do not have to be direct neighbours: where a ring edge is
//! much shorter than the subdivided edge, the walk continues along the
//! straightest continuation ([`WingedMesh::adjacent_sibling`]) while that
//! brings the accumulated length closer to the edge length.

use std::f32::consts::PI;

use glam::Vec3;
use winged::{EdgeId, VertexId, WingedMesh};

/// Valence of a regular vertex in a triangle mesh
const REGULAR_VALENCE: usize = 6;

/// Position of the point that subdivides `edge`
pub fn subdivide_edge(mesh: &WingedMesh, edge: EdgeId) -> Vec3 {
    let e = mesh.edge(edge);
    let (v1, v2) = (e.vertex1, e.vertex2);
    let a1 = adjacents(mesh, edge, v1);
    let a2 = adjacents(mesh, edge, v2);

    subdivide(mesh.position(v1), &a1, mesh.position(v2), &a2)
}

fn subdivide(v1: Vec3, a1: &[Vec3], v2: Vec3, a2: &[Vec3]) -> Vec3 {
    match (a1.len() == REGULAR_VALENCE, a2.len() == REGULAR_VALENCE) {
        (true, true) => subdivide_k6(a1, a2),
        (true, false) => subdivide_k(v2, a2),
        (false, true) => subdivide_k(v1, a1),
        (false, false) => 0.5 * (subdivide_k(a2[0], a1) + subdivide_k(a1[0], a2)),
    }
}

fn subdivide_k6(a1: &[Vec3], a2: &[Vec3]) -> Vec3 {
    0.5 * a1[0] + 0.5 * a2[0] + 0.125 * a1[1] + 0.125 * a2[1]
        - 0.0625 * a1[2]
        - 0.0625 * a2[2]
        - 0.0625 * a1[4]
        - 0.0625 * a2[4]
}

/// One-sided stencil around `center`.
///
/// Valence 3 carries zero weights and yields `center` itself.
fn subdivide_k(center: Vec3, a: &[Vec3]) -> Vec3 {
    let offset = match a.len() {
        3 => Vec3::ZERO,
        4 => 0.375 * (a[0] - center) - 0.125 * (a[2] - center),
        k => {
            let k = k as f32;
            a.iter()
                .enumerate()
                .map(|(j, &p)| {
                    let j = j as f32;
                    let s = (0.25 + (2.0 * PI * j / k).cos() + 0.5 * (4.0 * PI * j / k).cos()) / k;
                    s * (p - center)
                })
                .sum()
        }
    };
    offset + center
}

/// Ring of `vertex`, starting at `edge`
fn adjacents(mesh: &WingedMesh, edge: EdgeId, vertex: VertexId) -> Vec<Vec3> {
    let edge_length = mesh.edge_length(edge);

    mesh.vertex_edges_from(vertex, edge)
        .into_iter()
        .map(|e| {
            let mut current = e;
            let mut other = mesh.edge(e).other_vertex(vertex);
            let mut length = mesh.edge_length(e);

            // Each step lengthens the path, so the walk terminates
            while let Some(sibling) = mesh.adjacent_sibling(current, other) {
                let extended = length + mesh.edge_length(sibling);
                if (edge_length - length).abs() < (edge_length - extended).abs() {
                    break;
                }
                other = mesh.edge(sibling).other_vertex(other);
                current = sibling;
                length = extended;
            }
            mesh.position(other)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use sculpt_config::KernelConfig;
    use winged::MeshDefinition;

    use super::*;

    #[test]
    fn test_valence_three_stencil_is_identity() {
        let center = Vec3::new(1.0, 2.0, 3.0);
        let ring = [Vec3::X, Vec3::Y, Vec3::Z];
        assert_eq!(subdivide_k(center, &ring), center);
    }

    #[test]
    fn test_valence_four_stencil() {
        let ring = [Vec3::X, Vec3::Y, -Vec3::X, -Vec3::Y];
        let p = subdivide_k(Vec3::ZERO, &ring);
        assert_relative_eq!(p.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_regular_flat_ring_gives_midpoint() {
        // Flat regular grid: both rings are hexagons
        let hexagon = |center: Vec3, start: f32| -> Vec<Vec3> {
            (0..6)
                .map(|i| {
                    let angle = start + i as f32 * PI / 3.0;
                    center + Vec3::new(angle.cos(), angle.sin(), 0.0)
                })
                .collect()
        };
        let v1 = Vec3::ZERO;
        let v2 = Vec3::X;
        let a1 = hexagon(v1, 0.0);
        let a2 = hexagon(v2, PI);

        let p = subdivide(v1, &a1, v2, &a2);
        assert_relative_eq!(p.x, 0.5, epsilon = 1e-5);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_octahedron_point_stays_between_endpoints() {
        let mesh = WingedMesh::from_definition(&MeshDefinition::octahedron(), KernelConfig::default()).unwrap();
        for edge in mesh.edge_ids() {
            let p = subdivide_edge(&mesh, edge);
            let middle = mesh.edge_middle(edge);
            // Valence 4 on both sides pushes the point outwards along the middle
            assert!(p.length() >= middle.length() - 1e-5);
            assert_relative_eq!(p.normalize().dot(middle.normalize()), 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_ring_starts_at_edge() {
        let mesh = WingedMesh::from_definition(&MeshDefinition::icosphere(1), KernelConfig::default()).unwrap();
        let edge = EdgeId(0);
        let e = mesh.edge(edge);
        let ring = adjacents(&mesh, edge, e.vertex1);
        assert_eq!(ring.len(), mesh.valence(e.vertex1));
        assert_eq!(ring[0], mesh.position(e.vertex2));
    }
}
