//! Edge and face collapse.

use tracing::trace;
use winged::{AffectedFaces, EdgeId, FaceId, Identifier, VertexId, WingedMesh};

use crate::transaction::MeshEdit;

use super::delete::{delete_edge_and_right_face, delete_valence3_vertex};
use super::fail_safe;

/// Merge both endpoints of `edge` into a new vertex at its middle.
///
/// ```text
///        v3                   v3
///       /  \                  |
///     v1 -- v2      =>       new
///       \  /                  |
///        v4                   v4
/// ```
///
/// Valence 3 vertices around the edge are handled first, since collapsing
/// next to them would leave a valence 2 vertex:
/// 1. `v1` or `v2` of valence 3: delete that vertex instead
/// 2. `v3` or `v4` of valence 3: delete it and retry while `edge` survives
/// 3. `v1` and `v2` share a neighbour besides `v3` and `v4`: the collapse
///    would pinch the mesh, returns `false`
///
/// Returns `true` if the mesh changed, including a fail-safe reset.
///
/// # Panics
/// If a face next to `edge` is not a triangle.
pub fn collapse_edge(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces, edge: EdgeId) -> bool {
    !matches!(try_collapse_edge(edit, affected, edge), Collapse::Refused)
}

/// What [`try_collapse_edge`] did to the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Collapse {
    /// Both endpoints were merged into this vertex
    Merged(VertexId),
    /// A valence 3 vertex was deleted instead, or the mesh was reset
    Dissolved,
    /// The collapse would pinch the mesh; nothing changed
    Refused,
}

pub(crate) fn try_collapse_edge(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces, edge: EdgeId) -> Collapse {
    let identifier = edit.mesh().edge(edge).identifier;
    let mut edge = edge;

    loop {
        let mesh = edit.mesh();
        let e = mesh.edge(edge).clone();
        assert!(
            mesh.is_triangle(e.left_face) && mesh.is_triangle(e.right_face),
            "{edge} does not border two triangles"
        );
        let (v1, v2) = (e.vertex1, e.vertex2);
        let v3 = mesh.edge(e.left_successor).other_vertex(v2);
        let v4 = mesh.edge(e.right_successor).other_vertex(v1);

        if mesh.valence(v1) == 3 {
            delete_valence3_vertex(edit, affected, v1);
            return Collapse::Dissolved;
        }
        if mesh.valence(v2) == 3 {
            delete_valence3_vertex(edit, affected, v2);
            return Collapse::Dissolved;
        }
        let apex = [v3, v4].into_iter().find(|&v| mesh.valence(v) == 3);
        if let Some(apex) = apex {
            if delete_valence3_vertex(edit, affected, apex).is_none() {
                return Collapse::Dissolved;
            }
            match edit.mesh().resolve_edge(identifier) {
                Some(survivor) => {
                    edge = survivor;
                    continue;
                }
                None => return Collapse::Dissolved,
            }
        }
        if pinches(edit.mesh(), v1, v2, v3, v4) {
            trace!("Collapse of {edge} would pinch the mesh");
            return Collapse::Refused;
        }

        return Collapse::Merged(collapse(edit, affected, edge, identifier));
    }
}

/// Whether `v1` and `v2` share a neighbour other than the apexes
fn pinches(mesh: &WingedMesh, v1: VertexId, v2: VertexId, v3: VertexId, v4: VertexId) -> bool {
    let ring2 = mesh.vertex_neighbors(v2);
    mesh.vertex_neighbors(v1)
        .into_iter()
        .filter(|&v| v != v2 && v != v3 && v != v4)
        .any(|v| ring2.contains(&v))
}

fn collapse(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces, edge: EdgeId, identifier: Identifier) -> VertexId {
    let e = edit.mesh().edge(edge).clone();
    let (v1, v2) = (e.vertex1, e.vertex2);

    let middle = edit.mesh().edge_middle(edge);
    let vertex = edit.add_vertex(middle);

    delete_edge_and_right_face(edit, affected, e.left_successor);
    delete_edge_and_right_face(edit, affected, e.right_successor);

    let mesh = edit.mesh();
    let mut incident = mesh.vertex_edges(v1);
    incident.extend(mesh.vertex_edges(v2));
    let e = mesh.edge(edge).clone();
    let (left, right) = (e.left_face, e.right_face);

    edit.set_successor(e.left_predecessor, left, e.left_successor);
    edit.set_predecessor(e.left_successor, left, e.left_predecessor);
    edit.set_successor(e.right_predecessor, right, e.right_successor);
    edit.set_predecessor(e.right_successor, right, e.right_predecessor);

    edit.set_vertex_edge(vertex, e.left_successor);
    edit.set_face_edge(left, e.left_successor);
    edit.set_face_edge(right, e.right_successor);

    for other in incident.into_iter().filter(|&other| other != edge) {
        let old = if edit.mesh().edge(other).has_vertex(v1) { v1 } else { v2 };
        edit.replace_vertex(other, old, vertex);
    }

    edit.delete_edge(edge);
    edit.delete_vertex(v1);
    edit.delete_vertex(v2);

    for face in edit.mesh().vertex_faces(vertex) {
        affected.insert(face);
        edit.write_indices(face);
    }
    trace!("Collapsed edge {identifier} into {vertex}");
    vertex
}

/// Remove a (typically degenerated) triangle.
///
/// A corner of valence 3 is deleted outright. Otherwise the edges of the
/// face are tried from shortest to longest until one collapses. If none
/// can be collapsed the edit gives up through [`fail_safe`].
pub fn collapse_face(edit: &mut MeshEdit<'_>, affected: &mut AffectedFaces, face: FaceId) {
    let mesh = edit.mesh();
    let corner = mesh.face_vertices(face).into_iter().find(|&v| mesh.valence(v) == 3);
    if let Some(corner) = corner {
        delete_valence3_vertex(edit, affected, corner);
        return;
    }

    let face_identifier = mesh.face(face).identifier;
    let mut edges: Vec<(Identifier, f32)> = mesh
        .face_edges(face)
        .into_iter()
        .map(|e| (mesh.edge(e).identifier, mesh.edge_length_squared(e)))
        .collect();
    edges.sort_by(|a, b| a.1.total_cmp(&b.1));

    for (identifier, _) in edges {
        if edit.mesh().resolve_face(face_identifier) != Some(face) {
            return;
        }
        let Some(edge) = edit.mesh().resolve_edge(identifier) else {
            continue;
        };
        if collapse_edge(edit, affected, edge) {
            return;
        }
    }
    fail_safe(edit, affected, "no edge of the face can be collapsed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partial::{fixtures, split_and_triangulate_edge};
    use crate::transaction::Transaction;

    #[test]
    fn test_collapse_undoes_edge_split() {
        let mut mesh = fixtures::icosphere();
        let edge = EdgeId(5);
        let middle = mesh.edge_middle(edge);
        let counts = (mesh.num_vertices(), mesh.num_edges(), mesh.num_faces());
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();
        let mut edit = transaction.edit(&mut mesh);

        let vertex = split_and_triangulate_edge(&mut edit, &mut affected, edge, middle);
        let Some(spoke) = edit.mesh().vertex(vertex).edge else {
            panic!("new vertex without edge");
        };
        assert!(collapse_edge(&mut edit, &mut affected, spoke));

        assert_eq!((mesh.num_vertices(), mesh.num_edges(), mesh.num_faces()), counts);
        assert_eq!(mesh.validate_buffers(), Ok(()));
    }

    #[test]
    fn test_collapse_moves_to_middle() {
        let mut mesh = fixtures::icosphere();
        let edge = EdgeId(0);
        let middle = mesh.edge_middle(edge);
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();

        assert!(collapse_edge(&mut transaction.edit(&mut mesh), &mut affected, edge));

        assert_eq!(mesh.num_faces(), 78);
        assert!(mesh.vertex_ids().any(|v| mesh.position(v) == middle));
        assert_eq!(mesh.validate_buffers(), Ok(()));
    }

    #[test]
    fn test_collapse_on_tetrahedron_resets() {
        let mut mesh = fixtures::tetrahedron();
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();

        assert!(collapse_edge(&mut transaction.edit(&mut mesh), &mut affected, EdgeId(0)));
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_octahedron_collapses_to_bipyramid() {
        let mut mesh = fixtures::octahedron();
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();

        assert!(collapse_edge(&mut transaction.edit(&mut mesh), &mut affected, EdgeId(0)));
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), 6);
        assert_eq!(mesh.validate_buffers(), Ok(()));
    }

    #[test]
    fn test_merged_vertex_is_reported() {
        let mut mesh = fixtures::icosphere();
        let edge = EdgeId(0);
        let middle = mesh.edge_middle(edge);
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();

        let Collapse::Merged(vertex) = try_collapse_edge(&mut transaction.edit(&mut mesh), &mut affected, edge) else {
            panic!("edge was not merged");
        };
        assert_eq!(mesh.position(vertex), middle);
        assert_eq!(affected.uncommitted_faces().len(), mesh.valence(vertex));
    }

    #[test]
    fn test_shared_neighbour_pinches() {
        // Octahedron corners: 0 = +Y, 2 = +X, 4 = +Z, 5 = -Z
        let mesh = fixtures::octahedron();
        let (py, px, pz, nz) = (VertexId(0), VertexId(2), VertexId(4), VertexId(5));

        assert!(!pinches(&mesh, px, py, pz, nz));
        // With -Z not recognized as an apex the rings overlap there
        assert!(pinches(&mesh, px, py, pz, pz));
    }

    #[test]
    fn test_collapse_face_removes_face() {
        let mut mesh = fixtures::icosphere();
        let face = FaceId(10);
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();

        collapse_face(&mut transaction.edit(&mut mesh), &mut affected, face);

        assert_eq!(mesh.num_faces(), 78);
        assert_eq!(mesh.validate_buffers(), Ok(()));
    }
}
