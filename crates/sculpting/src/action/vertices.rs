//! Vertex-set actions.

use std::collections::BTreeSet;

use glam::Vec3;
use tracing::debug;
use winged::{AffectedFaces, VertexId};

use crate::partial;
use crate::transaction::MeshEdit;

use super::finalize;

/// Smooth `vertices` for `iterations` rounds and finalize the mesh
pub fn smooth(edit: &mut MeshEdit<'_>, vertices: &BTreeSet<VertexId>, iterations: u32) {
    let mut affected = AffectedFaces::new();
    partial::smooth(edit, &mut affected, vertices, iterations);
    finalize(edit, &mut affected);
}

/// Translate `vertices` by `delta` and finalize the mesh
pub fn move_vertices(edit: &mut MeshEdit<'_>, vertices: &BTreeSet<VertexId>, delta: Vec3) {
    let mut affected = AffectedFaces::new();
    for &vertex in vertices {
        let position = edit.mesh().position(vertex);
        edit.set_position(vertex, position + delta);
        affected.insert_all(edit.mesh().vertex_faces(vertex));
    }
    debug!(vertices = vertices.len(), ?delta, "moved vertices");
    finalize(edit, &mut affected);
}
