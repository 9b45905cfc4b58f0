//! Topology operators.
//!
//! Partial actions are the atomic legal moves on a winged mesh. Each one
//! mutates the mesh only through a [`MeshEdit`], so it is recorded in the
//! current transaction, and stages the faces it touches in an
//! [`AffectedFaces`] set.
//!
//! Conventions shared by all operators:
//! - Preconditions on the shape of the input (a face must be a triangle,
//!   a vertex must have valence 3) are asserted.
//! - Expected dead ends (a collapse that would pinch the mesh) return `false`.
//! - Inconsistencies found mid-algorithm trigger [`fail_safe`], which empties
//!   the mesh. The reset is recorded, so undo restores the mesh.
//! - Every operator that leaves a triangle behind rewrites that triangle's
//!   render indices itself.

mod collapse;
mod delete;
mod flip;
mod insert;
mod smooth;
mod subdivide;
mod triangulate;

use tracing::warn;
use winged::AffectedFaces;

use crate::transaction::MeshEdit;

pub use collapse::{collapse_edge, collapse_face};
pub(crate) use collapse::{try_collapse_edge, Collapse};
pub use delete::{delete_edge_and_right_face, delete_valence3_vertex, delete_vertex};
pub use flip::{flip_edge, relax_edge};
pub use insert::{insert_edge_face, insert_edge_face_at_new_vertex, insert_edge_vertex, split_face_with};
pub use smooth::smooth;
pub use subdivide::{extend_domain, subdivide_edge};
pub use triangulate::{
    split_and_triangulate_edge, split_and_triangulate_face, triangulate, triangulate_5gon, triangulate_6gon,
    triangulate_quad,
};

/// Give up on the current edit: empty the mesh and forget all affected faces
pub fn fail_safe(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces, reason: &str) {
    warn!(
        "Resetting mesh {} ({} faces): {reason}",
        edit.mesh().identifier(),
        edit.mesh().num_faces()
    );
    edit.reset_mesh();
    affected.reset();
}

#[cfg(test)]
pub(crate) mod fixtures {
    use sculpt_config::KernelConfig;
    use winged::{MeshDefinition, WingedMesh};

    pub fn mesh(definition: MeshDefinition) -> WingedMesh {
        WingedMesh::from_definition(&definition, KernelConfig::default()).unwrap()
    }

    pub fn tetrahedron() -> WingedMesh {
        mesh(MeshDefinition::tetrahedron())
    }

    pub fn octahedron() -> WingedMesh {
        mesh(MeshDefinition::octahedron())
    }

    pub fn icosphere() -> WingedMesh {
        mesh(MeshDefinition::icosphere(1))
    }
}
