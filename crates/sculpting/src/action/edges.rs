//! Edge passes over the domain of a gesture.

use sculpt_config::ReduceConfig;
use tracing::{debug, trace};
use winged::{AffectedFaces, EdgeId, Identifier};

use crate::partial;
use crate::transaction::MeshEdit;

/// Flip every live edge of `edges` that improves vertex valences.
///
/// Flipped faces are staged in `affected`. Returns the number of flips.
pub fn relax_edges(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces, edges: &[EdgeId]) -> usize {
    let mut flipped = 0;
    for &edge in edges {
        if edit.mesh().get_edge(edge).is_none() {
            continue;
        }
        if partial::relax_edge(edit, affected, edge) {
            flipped += 1;
        }
    }
    trace!("Relaxed {flipped} of {} edges", edges.len());
    flipped
}

/// Collapse the short edges of the committed faces in `affected`.
///
/// An edge is short if it is shorter than the average edge length of the
/// domain times `config.intensity`. The domain is reset and refilled with
/// the faces around the collapses. Stops early if the mesh runs empty.
/// Returns the number of edges that were collapsed.
pub fn reduce_edges(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces, config: &ReduceConfig) -> usize {
    let mesh = edit.mesh();
    let edges = affected.to_edge_vec(mesh);
    if edges.is_empty() {
        return 0;
    }
    let average = edges.iter().map(|&edge| mesh.edge_length(edge)).sum::<f32>() / edges.len() as f32;
    let threshold = average * config.intensity;
    let threshold_squared = threshold * threshold;
    let identifiers: Vec<Identifier> = edges.iter().map(|&edge| mesh.edge(edge).identifier).collect();
    affected.reset();

    let mut collapsed = 0;
    for identifier in identifiers {
        if edit.mesh().is_empty() {
            debug!("Mesh ran empty while reducing edges");
            break;
        }
        let Some(edge) = edit.mesh().resolve_edge(identifier) else {
            continue;
        };
        if edit.mesh().edge_length_squared(edge) < threshold_squared && partial::collapse_edge(edit, affected, edge) {
            collapsed += 1;
        }
    }
    affected.commit();
    debug!(collapsed, threshold, "reduced edges");
    collapsed
}
