//! Edge subdivision and growth of the subdivision domain.

use std::collections::BTreeSet;

use sculpt_config::SubdivisionConfig;
use tracing::trace;
use winged::{AffectedFaces, EdgeId, FaceId, VertexId, WingedMesh};

use crate::butterfly;
use crate::transaction::MeshEdit;

use super::triangulate::split_and_triangulate_edge;

/// Split `edge` at its butterfly point and triangulate both sides.
///
/// Returns the new vertex.
pub fn subdivide_edge(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces, edge: EdgeId) -> VertexId {
    let position = butterfly::subdivide_edge(edit.mesh(), edge);
    split_and_triangulate_edge(edit, affected, edge, position)
}

/// Grow the committed faces of `affected` before subdivision.
///
/// 1. Add the faces around every domain vertex, `one_ring_extensions` times
/// 2. Close the domain: a neighbouring face joins if it shares edges with
///    at least two domain faces, or touches a vertex of valence above
///    `pole_valence`. Joined faces are re-examined until nothing changes.
///
/// The grown domain is committed.
pub fn extend_domain(mesh: &WingedMesh, affected: &mut AffectedFaces, config: &SubdivisionConfig) {
    for _ in 0..config.one_ring_extensions {
        let vertices: BTreeSet<VertexId> = affected.to_vertex_set(mesh);
        for vertex in vertices {
            affected.insert_all(mesh.vertex_faces(vertex));
        }
        affected.commit();
    }

    let pole_valence = config.pole_valence as usize;
    let mut pending: Vec<FaceId> = affected
        .faces()
        .iter()
        .flat_map(|&face| mesh.face_neighbors(face))
        .filter(|&face| !affected.contains(face))
        .collect();

    let mut added = 0;
    while let Some(face) = pending.pop() {
        if affected.contains(face) {
            continue;
        }
        let neighbors = mesh.face_neighbors(face);
        let domain_neighbors = neighbors.iter().filter(|&&n| affected.contains(n)).count();
        let at_pole = mesh
            .face_vertices(face)
            .into_iter()
            .any(|v| mesh.valence(v) > pole_valence);

        if domain_neighbors >= 2 || at_pole {
            affected.insert(face);
            added += 1;
            pending.extend(neighbors.into_iter().filter(|&n| !affected.contains(n)));
        }
    }
    affected.commit();
    trace!("Extended domain to {} faces ({added} by closure)", affected.faces().len());
}
