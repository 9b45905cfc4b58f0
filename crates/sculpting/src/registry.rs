//! Meshes by identifier.

use std::collections::BTreeMap;

use sculpt_config::KernelConfig;
use tracing::debug;
use winged::{Identifier, MeshDefinition, WingedMesh};

use crate::transaction::TransactionError;

/// Owner of every mesh in a scene
#[derive(Debug, Clone, Default)]
pub struct MeshRegistry {
    meshes: BTreeMap<Identifier, WingedMesh>,
    config: KernelConfig,
}

impl MeshRegistry {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            meshes: BTreeMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Import a triangle soup as a new mesh
    pub fn create_mesh(&mut self, definition: &MeshDefinition) -> Result<Identifier, TransactionError> {
        let mesh = WingedMesh::from_definition(definition, self.config)?;
        let identifier = mesh.identifier();
        debug!(
            "Created mesh {identifier}: {} vertices, {} faces",
            mesh.num_vertices(),
            mesh.num_faces()
        );
        self.meshes.insert(identifier, mesh);
        Ok(identifier)
    }

    /// Store a mesh under its own identifier, returning any mesh it replaces
    pub fn insert(&mut self, mesh: WingedMesh) -> Option<WingedMesh> {
        self.meshes.insert(mesh.identifier(), mesh)
    }

    pub fn remove(&mut self, mesh: Identifier) -> Result<WingedMesh, TransactionError> {
        self.meshes
            .remove(&mesh)
            .ok_or(TransactionError::UnknownMesh(mesh))
    }

    pub fn get(&self, mesh: Identifier) -> Result<&WingedMesh, TransactionError> {
        self.meshes.get(&mesh).ok_or(TransactionError::UnknownMesh(mesh))
    }

    pub fn get_mut(&mut self, mesh: Identifier) -> Result<&mut WingedMesh, TransactionError> {
        self.meshes
            .get_mut(&mesh)
            .ok_or(TransactionError::UnknownMesh(mesh))
    }

    pub fn contains(&self, mesh: Identifier) -> bool {
        self.meshes.contains_key(&mesh)
    }

    pub fn ids(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.meshes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
