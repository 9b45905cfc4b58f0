//! GPU-facing views of the mesh buffers.
//!
//! Uploading is the application's concern; the kernel only guarantees the
//! buffers are consistent after every finalized edit.

use bytemuck::{Pod, Zeroable};

use crate::mesh::WingedMesh;

/// Interleaved vertex record
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl WingedMesh {
    /// One record per vertex slot, free slots included
    pub fn render_vertices(&self) -> Vec<RenderVertex> {
        self.positions()
            .iter()
            .zip(self.normals())
            .map(|(position, normal)| RenderVertex {
                position: position.to_array(),
                normal: normal.to_array(),
            })
            .collect()
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.positions())
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.normals())
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.indices())
    }
}

#[cfg(test)]
mod tests {
    use sculpt_config::KernelConfig;

    use super::*;
    use crate::definition::MeshDefinition;

    #[test]
    fn test_byte_views_match_buffers() {
        let mesh = WingedMesh::from_definition(&MeshDefinition::cube(), KernelConfig::default()).unwrap();
        assert_eq!(mesh.position_bytes().len(), 8 * 12);
        assert_eq!(mesh.index_bytes().len(), 12 * 3 * 4);

        let vertices = mesh.render_vertices();
        assert_eq!(vertices.len(), 8);
        assert_eq!(vertices[7].position, [0.5, 0.5, 0.5]);
        assert_eq!(std::mem::size_of::<RenderVertex>(), 24);
        assert_eq!(bytemuck::cast_slice::<RenderVertex, u8>(&vertices).len(), 8 * 24);
    }
}
