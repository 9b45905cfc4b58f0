//! Undoable edits.
//!
//! A [`Transaction`] is the ordered log of [`Operation`]s one gesture made
//! to one mesh. Undo replays the log backwards with old values, redo
//! forwards with new values. After a replay every face the log touched is
//! realigned in the octree and the buffers are prepared for upload.
//!
//! States: `Created -> Applied <-> Undone`.

mod edit;
mod operation;

use std::collections::BTreeSet;

use tracing::{debug, error};
use winged::{FaceId, Identifier, WingedError, WingedMesh};

pub use edit::MeshEdit;
pub use operation::{EdgeEnd, EdgeLink, EdgeSide, Operation};

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("no live {kind} with identifier {identifier}")]
    Unresolved {
        kind: &'static str,
        identifier: Identifier,
    },
    #[error("{kind} {identifier} lives at slot {found}, expected slot {expected}")]
    SlotMismatch {
        kind: &'static str,
        identifier: Identifier,
        expected: u32,
        found: u32,
    },
    #[error("Mesh error: {0}")]
    Mesh(#[from] WingedError),
    #[error("no mesh with identifier {0}")]
    UnknownMesh(Identifier),
    #[error("transaction is {found:?}, expected {expected:?}")]
    InvalidState {
        expected: TransactionState,
        found: TransactionState,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Still recording
    Created,
    Applied,
    Undone,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    mesh: Identifier,
    operations: Vec<Operation>,
    state: TransactionState,
}

impl Transaction {
    pub fn new(mesh: Identifier) -> Self {
        Self {
            mesh,
            operations: Vec::new(),
            state: TransactionState::Created,
        }
    }

    /// Identifier of the mesh this transaction edits
    pub fn mesh(&self) -> Identifier {
        self.mesh
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Start recording edits on `mesh`.
    ///
    /// # Panics
    /// In debug builds, if `mesh` is not the mesh this transaction belongs to.
    pub fn edit<'a>(&'a mut self, mesh: &'a mut WingedMesh) -> MeshEdit<'a> {
        MeshEdit::new(mesh, self)
    }

    pub(crate) fn push(&mut self, operation: Operation) {
        debug_assert_eq!(self.state, TransactionState::Created, "transaction is closed");
        self.operations.push(operation);
    }

    /// Close the log; the edits are now on the mesh
    pub fn mark_applied(&mut self) {
        self.state = TransactionState::Applied;
    }

    pub fn undo(&mut self, mesh: &mut WingedMesh) -> Result<(), TransactionError> {
        self.expect_state(TransactionState::Applied, mesh)?;
        for operation in self.operations.iter().rev() {
            operation.undo(mesh).inspect_err(|err| {
                error!("Undo of {operation:?} failed: {err}");
            })?;
        }
        self.refresh(mesh);
        self.state = TransactionState::Undone;
        debug!("Undid {} operations on mesh {}", self.operations.len(), self.mesh);
        Ok(())
    }

    pub fn redo(&mut self, mesh: &mut WingedMesh) -> Result<(), TransactionError> {
        self.expect_state(TransactionState::Undone, mesh)?;
        for operation in &self.operations {
            operation.redo(mesh).inspect_err(|err| {
                error!("Redo of {operation:?} failed: {err}");
            })?;
        }
        self.refresh(mesh);
        self.state = TransactionState::Applied;
        debug!("Redid {} operations on mesh {}", self.operations.len(), self.mesh);
        Ok(())
    }

    fn expect_state(&self, expected: TransactionState, mesh: &WingedMesh) -> Result<(), TransactionError> {
        if self.state != expected {
            return Err(TransactionError::InvalidState {
                expected,
                found: self.state,
            });
        }
        if mesh.identifier() != self.mesh {
            return Err(TransactionError::UnknownMesh(self.mesh));
        }
        Ok(())
    }

    /// Realign touched faces and prepare the buffers
    fn refresh(&self, mesh: &mut WingedMesh) {
        let mut faces = BTreeSet::new();
        for operation in &self.operations {
            operation.touched_faces(mesh, &mut faces);
        }
        let faces: Vec<FaceId> = faces.into_iter().collect();
        for face in faces {
            mesh.realign_face(face);
        }
        mesh.buffer_data();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use sculpt_config::KernelConfig;
    use winged::{MeshDefinition, VertexId};

    use super::*;

    fn cube() -> WingedMesh {
        WingedMesh::from_definition(&MeshDefinition::cube(), KernelConfig::default()).unwrap()
    }

    #[test]
    fn test_state_machine() {
        let mut mesh = cube();
        let mut transaction = Transaction::new(mesh.identifier());
        assert!(matches!(
            transaction.undo(&mut mesh),
            Err(TransactionError::InvalidState { .. })
        ));

        transaction.edit(&mut mesh).set_position(VertexId(0), Vec3::splat(-1.0));
        transaction.mark_applied();
        assert!(matches!(
            transaction.redo(&mut mesh),
            Err(TransactionError::InvalidState { .. })
        ));

        transaction.undo(&mut mesh).unwrap();
        assert_eq!(transaction.state(), TransactionState::Undone);
        assert_eq!(mesh.position(VertexId(0)), Vec3::splat(-0.5));

        transaction.redo(&mut mesh).unwrap();
        assert_eq!(mesh.position(VertexId(0)), Vec3::splat(-1.0));
    }

    #[test]
    fn test_rejects_foreign_mesh() {
        let mut mesh = cube();
        let mut other = cube();
        let mut transaction = Transaction::new(mesh.identifier());
        transaction.edit(&mut mesh).set_position(VertexId(1), Vec3::ZERO);
        transaction.mark_applied();
        assert!(matches!(
            transaction.undo(&mut other),
            Err(TransactionError::UnknownMesh(_))
        ));
    }

    #[test]
    fn test_structural_undo_restores_counts() {
        let mut mesh = cube();
        let before = mesh.clone();
        let mut transaction = Transaction::new(mesh.identifier());
        {
            let mut edit = transaction.edit(&mut mesh);
            let face = FaceId(0);
            let triangle = edit.mesh().face_triangle(face);
            edit.delete_face(face, &triangle);
            let v = edit.add_vertex(Vec3::ONE);
            edit.delete_vertex(v);
        }
        transaction.mark_applied();
        assert_eq!(mesh.num_faces(), 11);

        transaction.undo(&mut mesh).unwrap();
        assert_eq!(mesh.num_faces(), 12);
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.face_indices(FaceId(0)), before.face_indices(FaceId(0)));
        assert_eq!(mesh.validate_buffers(), Ok(()));
    }
}
