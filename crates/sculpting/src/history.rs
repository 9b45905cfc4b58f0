//! Undo and redo across meshes.
//!
//! Each undo entry is a [`Gesture`]: the transaction of one edit, or the
//! creation or deletion of a whole mesh. Pushing a gesture clears the redo
//! stack.

use tracing::{debug, error};
use winged::{Identifier, MeshDefinition, WingedMesh};

use crate::registry::MeshRegistry;
use crate::transaction::{MeshEdit, Transaction, TransactionError};

/// One undoable step
#[derive(Debug, Clone)]
pub enum Gesture {
    Edit(Transaction),
    /// `stash` holds the mesh while the creation is undone
    CreateMesh {
        mesh: Identifier,
        stash: Option<WingedMesh>,
    },
    /// `stash` holds the mesh while the deletion is in effect
    DeleteMesh {
        mesh: Identifier,
        stash: Option<WingedMesh>,
    },
}

impl Gesture {
    fn undo(&mut self, registry: &mut MeshRegistry) -> Result<(), TransactionError> {
        match self {
            Gesture::Edit(transaction) => {
                let mesh = registry.get_mut(transaction.mesh())?;
                transaction.undo(mesh)
            }
            Gesture::CreateMesh { mesh, stash } => {
                *stash = Some(registry.remove(*mesh)?);
                Ok(())
            }
            Gesture::DeleteMesh { mesh, stash } => {
                let restored = stash.take().ok_or(TransactionError::UnknownMesh(*mesh))?;
                registry.insert(restored);
                Ok(())
            }
        }
    }

    fn redo(&mut self, registry: &mut MeshRegistry) -> Result<(), TransactionError> {
        match self {
            Gesture::Edit(transaction) => {
                let mesh = registry.get_mut(transaction.mesh())?;
                transaction.redo(mesh)
            }
            Gesture::CreateMesh { mesh, stash } => {
                let restored = stash.take().ok_or(TransactionError::UnknownMesh(*mesh))?;
                registry.insert(restored);
                Ok(())
            }
            Gesture::DeleteMesh { mesh, stash } => {
                *stash = Some(registry.remove(*mesh)?);
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: Vec<Gesture>,
    redo_stack: Vec<Gesture>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a finished gesture. Empty edits are dropped.
    pub fn push(&mut self, gesture: Gesture) {
        if matches!(&gesture, Gesture::Edit(transaction) if transaction.is_empty()) {
            return;
        }
        self.redo_stack.clear();
        self.undo_stack.push(gesture);
    }

    /// Run `action` on a mesh inside a new transaction and record it
    pub fn record<R>(
        &mut self,
        registry: &mut MeshRegistry,
        mesh: Identifier,
        action: impl FnOnce(&mut MeshEdit<'_>) -> R,
    ) -> Result<R, TransactionError> {
        let target = registry.get_mut(mesh)?;
        let mut transaction = Transaction::new(mesh);
        let result = action(&mut transaction.edit(target));
        transaction.mark_applied();
        debug!("Recorded {} operations on mesh {mesh}", transaction.len());
        self.push(Gesture::Edit(transaction));
        Ok(result)
    }

    pub fn create_mesh(
        &mut self,
        registry: &mut MeshRegistry,
        definition: &MeshDefinition,
    ) -> Result<Identifier, TransactionError> {
        let mesh = registry.create_mesh(definition)?;
        self.push(Gesture::CreateMesh { mesh, stash: None });
        Ok(mesh)
    }

    pub fn delete_mesh(&mut self, registry: &mut MeshRegistry, mesh: Identifier) -> Result<(), TransactionError> {
        let removed = registry.remove(mesh)?;
        self.push(Gesture::DeleteMesh {
            mesh,
            stash: Some(removed),
        });
        Ok(())
    }

    /// Undo the last gesture.
    ///
    /// Returns false if there was nothing to undo. A gesture that fails to
    /// replay is dropped.
    pub fn undo(&mut self, registry: &mut MeshRegistry) -> Result<bool, TransactionError> {
        let Some(mut gesture) = self.undo_stack.pop() else {
            debug!("Undo: no entries available");
            return Ok(false);
        };
        if let Err(err) = gesture.undo(registry) {
            error!("Undo failed, dropping gesture: {err}");
            return Err(err);
        }
        debug!("Undo: {} entries left", self.undo_stack.len());
        self.redo_stack.push(gesture);
        Ok(true)
    }

    pub fn redo(&mut self, registry: &mut MeshRegistry) -> Result<bool, TransactionError> {
        let Some(mut gesture) = self.redo_stack.pop() else {
            debug!("Redo: no entries available");
            return Ok(false);
        };
        if let Err(err) = gesture.redo(registry) {
            error!("Redo failed, dropping gesture: {err}");
            return Err(err);
        }
        debug!("Redo: {} entries left", self.redo_stack.len());
        self.undo_stack.push(gesture);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
