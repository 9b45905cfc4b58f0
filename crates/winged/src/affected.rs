//! Staged set of faces touched by an edit.
//!
//! Operators insert into the uncommitted stage; [`AffectedFaces::commit`]
//! publishes them. Callers iterating the committed faces therefore never see
//! faces added by a half-finished edit.

use std::collections::BTreeSet;

use crate::mesh::WingedMesh;
use crate::types::{EdgeId, FaceId, VertexId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffectedFaces {
    committed: BTreeSet<FaceId>,
    uncommitted: BTreeSet<FaceId>,
}

impl AffectedFaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, face: FaceId) {
        self.uncommitted.insert(face);
    }

    pub fn insert_all(&mut self, faces: impl IntoIterator<Item = FaceId>) {
        self.uncommitted.extend(faces);
    }

    /// Stage every face of `other`, committed or not
    pub fn merge(&mut self, other: &AffectedFaces) {
        self.uncommitted.extend(other.committed.iter().copied());
        self.uncommitted.extend(other.uncommitted.iter().copied());
    }

    /// Forget a face in both stages
    pub fn remove(&mut self, face: FaceId) {
        self.committed.remove(&face);
        self.uncommitted.remove(&face);
    }

    pub fn reset(&mut self) {
        self.committed.clear();
        self.uncommitted.clear();
    }

    pub fn commit(&mut self) {
        self.committed.append(&mut self.uncommitted);
    }

    pub fn contains(&self, face: FaceId) -> bool {
        self.committed.contains(&face) || self.uncommitted.contains(&face)
    }

    pub fn faces(&self) -> &BTreeSet<FaceId> {
        &self.committed
    }

    pub fn uncommitted_faces(&self) -> &BTreeSet<FaceId> {
        &self.uncommitted
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.uncommitted.is_empty()
    }

    pub fn has_uncommitted(&self) -> bool {
        !self.uncommitted.is_empty()
    }

    /// Keep committed faces for which `keep` holds
    pub fn retain_committed(&mut self, keep: impl FnMut(&FaceId) -> bool) {
        self.committed.retain(keep);
    }

    /// Corners of all committed faces that are still alive
    pub fn to_vertex_set(&self, mesh: &WingedMesh) -> BTreeSet<VertexId> {
        self.committed
            .iter()
            .filter(|&&face| mesh.get_face(face).is_some())
            .flat_map(|&face| mesh.face_vertices(face))
            .collect()
    }

    /// Edges of all committed faces, each exactly once.
    ///
    /// An edge is taken from its left face, or from whichever face it has in
    /// the set when the other face lies outside.
    pub fn to_edge_vec(&self, mesh: &WingedMesh) -> Vec<EdgeId> {
        let mut edges = Vec::new();
        for &face in &self.committed {
            if mesh.get_face(face).is_none() {
                continue;
            }
            for edge in mesh.face_edges(face) {
                let e = mesh.edge(edge);
                if e.left_face == face || !self.committed.contains(&e.other_face(face)) {
                    edges.push(edge);
                }
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use sculpt_config::KernelConfig;

    use super::*;
    use crate::definition::MeshDefinition;

    #[test]
    fn test_commit_moves_staged_faces() {
        let mut affected = AffectedFaces::new();
        affected.insert(FaceId(3));
        assert!(affected.contains(FaceId(3)));
        assert!(affected.faces().is_empty());

        affected.commit();
        assert_eq!(affected.faces().iter().copied().collect::<Vec<_>>(), vec![FaceId(3)]);
        assert!(!affected.has_uncommitted());

        affected.remove(FaceId(3));
        assert!(affected.is_empty());
    }

    #[test]
    fn test_merge_stages_both_sets() {
        let mut a = AffectedFaces::new();
        a.insert(FaceId(1));
        a.commit();
        a.insert(FaceId(2));

        let mut b = AffectedFaces::new();
        b.merge(&a);
        assert!(b.faces().is_empty());
        assert_eq!(b.uncommitted_faces().len(), 2);
    }

    #[test]
    fn test_edge_vec_has_no_duplicates() {
        let mesh = WingedMesh::from_definition(&MeshDefinition::icosphere(1), KernelConfig::default()).unwrap();
        let mut affected = AffectedFaces::new();
        affected.insert_all(mesh.face_ids().take(10));
        affected.commit();

        let edges = affected.to_edge_vec(&mesh);
        let unique: BTreeSet<_> = edges.iter().copied().collect();
        assert_eq!(edges.len(), unique.len());

        let expected: BTreeSet<_> = affected.faces().iter().flat_map(|&f| mesh.face_edges(f)).collect();
        assert_eq!(unique, expected);
    }

    #[test]
    fn test_whole_mesh_closure() {
        let mesh = WingedMesh::from_definition(&MeshDefinition::octahedron(), KernelConfig::default()).unwrap();
        let mut affected = AffectedFaces::new();
        affected.insert_all(mesh.face_ids());
        affected.commit();
        assert_eq!(affected.to_vertex_set(&mesh).len(), 6);
        assert_eq!(affected.to_edge_vec(&mesh).len(), 12);
    }
}
