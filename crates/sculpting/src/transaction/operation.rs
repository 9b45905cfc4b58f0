//! Low-level recorded edits.
//!
//! Every [`Operation`] carries both the old and the new value of what it
//! changed. The element it operates on is stored as an [`ElementRef`] and is
//! re-resolved by identifier at replay time; a mismatch between the stored
//! slot and the resolved slot means the log no longer fits the mesh.
//!
//! Link values (an edge's successor, a face's edge, ...) are stored as plain
//! slots. Replaying a whole transaction in order restores every slot exactly,
//! so those values stay valid.

use std::collections::BTreeSet;

use glam::Vec3;
use winged::{
    Edge, EdgeGeometry, EdgeId, ElementRef, FaceGradient, FaceId, Identifier, SlotId, Triangle, VertexId,
    WingedMesh,
};

use super::TransactionError;

/// Which endpoint of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEnd {
    Vertex1,
    Vertex2,
}

impl EdgeEnd {
    pub fn get(self, edge: &Edge) -> VertexId {
        match self {
            EdgeEnd::Vertex1 => edge.vertex1,
            EdgeEnd::Vertex2 => edge.vertex2,
        }
    }

    pub(super) fn set(self, edge: &mut Edge, vertex: VertexId) {
        match self {
            EdgeEnd::Vertex1 => edge.vertex1 = vertex,
            EdgeEnd::Vertex2 => edge.vertex2 = vertex,
        }
    }
}

/// Which face of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSide {
    Left,
    Right,
}

impl EdgeSide {
    pub fn get(self, edge: &Edge) -> FaceId {
        match self {
            EdgeSide::Left => edge.left_face,
            EdgeSide::Right => edge.right_face,
        }
    }

    pub(super) fn set(self, edge: &mut Edge, face: FaceId) {
        match self {
            EdgeSide::Left => edge.left_face = face,
            EdgeSide::Right => edge.right_face = face,
        }
    }
}

/// Which rotation link of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLink {
    LeftPredecessor,
    LeftSuccessor,
    RightPredecessor,
    RightSuccessor,
}

impl EdgeLink {
    pub fn get(self, edge: &Edge) -> EdgeId {
        match self {
            EdgeLink::LeftPredecessor => edge.left_predecessor,
            EdgeLink::LeftSuccessor => edge.left_successor,
            EdgeLink::RightPredecessor => edge.right_predecessor,
            EdgeLink::RightSuccessor => edge.right_successor,
        }
    }

    pub(super) fn set(self, edge: &mut Edge, link: EdgeId) {
        match self {
            EdgeLink::LeftPredecessor => edge.left_predecessor = link,
            EdgeLink::LeftSuccessor => edge.left_successor = link,
            EdgeLink::RightPredecessor => edge.right_predecessor = link,
            EdgeLink::RightSuccessor => edge.right_successor = link,
        }
    }

    /// The successor link on the side of `face`
    pub fn successor(edge: &Edge, face: FaceId) -> Self {
        if edge.is_left_face(face) {
            EdgeLink::LeftSuccessor
        } else {
            EdgeLink::RightSuccessor
        }
    }

    pub fn predecessor(edge: &Edge, face: FaceId) -> Self {
        if edge.is_left_face(face) {
            EdgeLink::LeftPredecessor
        } else {
            EdgeLink::RightPredecessor
        }
    }
}

/// One recorded change
#[derive(Debug, Clone)]
pub enum Operation {
    AddVertex {
        vertex: ElementRef<VertexId>,
        position: Vec3,
    },
    DeleteVertex {
        vertex: ElementRef<VertexId>,
        edge: Option<EdgeId>,
        position: Vec3,
        normal: Vec3,
    },
    AddEdge {
        edge: ElementRef<EdgeId>,
        geometry: EdgeGeometry,
    },
    DeleteEdge {
        edge: ElementRef<EdgeId>,
        geometry: EdgeGeometry,
        is_t_edge: bool,
        face_gradient: FaceGradient,
    },
    AddFace {
        face: ElementRef<FaceId>,
        triangle: Triangle,
    },
    DeleteFace {
        face: ElementRef<FaceId>,
        edge: Option<EdgeId>,
        /// Geometry used to place the face back into the octree
        triangle: Triangle,
        indices: [u32; 3],
    },
    SetVertexEdge {
        vertex: ElementRef<VertexId>,
        old: Option<EdgeId>,
        new: Option<EdgeId>,
    },
    SetPosition {
        vertex: ElementRef<VertexId>,
        old: Vec3,
        new: Vec3,
    },
    SetNormal {
        vertex: ElementRef<VertexId>,
        old: Vec3,
        new: Vec3,
    },
    SetEdgeVertex {
        edge: ElementRef<EdgeId>,
        end: EdgeEnd,
        old: VertexId,
        new: VertexId,
    },
    SetEdgeFace {
        edge: ElementRef<EdgeId>,
        side: EdgeSide,
        old: FaceId,
        new: FaceId,
    },
    SetEdgeLink {
        edge: ElementRef<EdgeId>,
        link: EdgeLink,
        old: EdgeId,
        new: EdgeId,
    },
    SetTEdge {
        edge: ElementRef<EdgeId>,
        old: bool,
        new: bool,
    },
    SetFaceGradient {
        edge: ElementRef<EdgeId>,
        old: FaceGradient,
        new: FaceGradient,
    },
    SetFaceEdge {
        face: ElementRef<FaceId>,
        old: Option<EdgeId>,
        new: Option<EdgeId>,
    },
    /// Render indices of a face slot. The slot may be free at replay time.
    SetIndices {
        face: FaceId,
        old: [u32; 3],
        new: [u32; 3],
    },
    /// Fail-safe reset; undo restores the snapshot
    ResetMesh {
        before: Box<WingedMesh>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    Undo,
    Redo,
}

impl Replay {
    fn pick<T>(self, old: T, new: T) -> T {
        match self {
            Replay::Undo => old,
            Replay::Redo => new,
        }
    }
}

fn resolve<I: SlotId>(found: Option<I>, element: ElementRef<I>) -> Result<I, TransactionError> {
    match found {
        Some(slot) if slot == element.slot => Ok(slot),
        Some(slot) => Err(TransactionError::SlotMismatch {
            kind: I::KIND,
            identifier: element.identifier,
            expected: element.slot.slot(),
            found: slot.slot(),
        }),
        None => Err(TransactionError::Unresolved {
            kind: I::KIND,
            identifier: element.identifier,
        }),
    }
}

fn vertex(mesh: &WingedMesh, vertex: ElementRef<VertexId>) -> Result<VertexId, TransactionError> {
    resolve(mesh.resolve_vertex(vertex.identifier), vertex)
}

fn edge(mesh: &WingedMesh, edge: ElementRef<EdgeId>) -> Result<EdgeId, TransactionError> {
    resolve(mesh.resolve_edge(edge.identifier), edge)
}

fn face(mesh: &WingedMesh, face: ElementRef<FaceId>) -> Result<FaceId, TransactionError> {
    resolve(mesh.resolve_face(face.identifier), face)
}

impl Operation {
    pub fn undo(&self, mesh: &mut WingedMesh) -> Result<(), TransactionError> {
        self.replay(mesh, Replay::Undo)
    }

    pub fn redo(&self, mesh: &mut WingedMesh) -> Result<(), TransactionError> {
        self.replay(mesh, Replay::Redo)
    }

    /// Identifier of the element this operation changes, if any
    pub fn operand(&self) -> Option<Identifier> {
        match self {
            Operation::AddVertex { vertex, .. }
            | Operation::DeleteVertex { vertex, .. }
            | Operation::SetVertexEdge { vertex, .. }
            | Operation::SetPosition { vertex, .. }
            | Operation::SetNormal { vertex, .. } => Some(vertex.identifier),
            Operation::AddEdge { edge, .. }
            | Operation::DeleteEdge { edge, .. }
            | Operation::SetEdgeVertex { edge, .. }
            | Operation::SetEdgeFace { edge, .. }
            | Operation::SetEdgeLink { edge, .. }
            | Operation::SetTEdge { edge, .. }
            | Operation::SetFaceGradient { edge, .. } => Some(edge.identifier),
            Operation::AddFace { face, .. }
            | Operation::DeleteFace { face, .. }
            | Operation::SetFaceEdge { face, .. } => Some(face.identifier),
            Operation::SetIndices { .. } => None,
            Operation::ResetMesh { before } => Some(before.identifier()),
        }
    }

    fn replay(&self, mesh: &mut WingedMesh, replay: Replay) -> Result<(), TransactionError> {
        match self {
            Operation::AddVertex { vertex: v, position } => match replay {
                Replay::Undo => {
                    let id = vertex(mesh, *v)?;
                    mesh.delete_vertex(id);
                }
                Replay::Redo => mesh.add_vertex_at(*v, *position, Vec3::ZERO)?,
            },
            Operation::DeleteVertex {
                vertex: v,
                edge: e,
                position,
                normal,
            } => match replay {
                Replay::Undo => {
                    mesh.add_vertex_at(*v, *position, *normal)?;
                    mesh.vertex_mut(v.slot).edge = *e;
                }
                Replay::Redo => {
                    let id = vertex(mesh, *v)?;
                    mesh.delete_vertex(id);
                }
            },
            Operation::AddEdge { edge: e, geometry } => match replay {
                Replay::Undo => {
                    let id = edge(mesh, *e)?;
                    mesh.delete_edge(id);
                }
                Replay::Redo => mesh.add_edge_at(*e, *geometry)?,
            },
            Operation::DeleteEdge {
                edge: e,
                geometry,
                is_t_edge,
                face_gradient,
            } => match replay {
                Replay::Undo => {
                    mesh.add_edge_at(*e, *geometry)?;
                    let restored = mesh.edge_mut(e.slot);
                    restored.is_t_edge = *is_t_edge;
                    restored.face_gradient = *face_gradient;
                }
                Replay::Redo => {
                    let id = edge(mesh, *e)?;
                    mesh.delete_edge(id);
                }
            },
            Operation::AddFace { face: f, triangle } => match replay {
                Replay::Undo => {
                    let id = face(mesh, *f)?;
                    mesh.delete_face(id);
                }
                Replay::Redo => mesh.add_face_at(*f, None, triangle)?,
            },
            Operation::DeleteFace {
                face: f,
                edge: e,
                triangle,
                indices,
            } => match replay {
                Replay::Undo => {
                    mesh.add_face_at(*f, *e, triangle)?;
                    mesh.set_face_indices(f.slot, *indices);
                }
                Replay::Redo => {
                    let id = face(mesh, *f)?;
                    mesh.delete_face(id);
                }
            },
            Operation::SetVertexEdge { vertex: v, old, new } => {
                let id = vertex(mesh, *v)?;
                mesh.vertex_mut(id).edge = replay.pick(*old, *new);
            }
            Operation::SetPosition { vertex: v, old, new } => {
                let id = vertex(mesh, *v)?;
                mesh.set_position(id, replay.pick(*old, *new));
            }
            Operation::SetNormal { vertex: v, old, new } => {
                let id = vertex(mesh, *v)?;
                mesh.set_normal(id, replay.pick(*old, *new));
            }
            Operation::SetEdgeVertex { edge: e, end, old, new } => {
                let id = edge(mesh, *e)?;
                end.set(mesh.edge_mut(id), replay.pick(*old, *new));
            }
            Operation::SetEdgeFace { edge: e, side, old, new } => {
                let id = edge(mesh, *e)?;
                side.set(mesh.edge_mut(id), replay.pick(*old, *new));
            }
            Operation::SetEdgeLink { edge: e, link, old, new } => {
                let id = edge(mesh, *e)?;
                link.set(mesh.edge_mut(id), replay.pick(*old, *new));
            }
            Operation::SetTEdge { edge: e, old, new } => {
                let id = edge(mesh, *e)?;
                mesh.edge_mut(id).is_t_edge = replay.pick(*old, *new);
            }
            Operation::SetFaceGradient { edge: e, old, new } => {
                let id = edge(mesh, *e)?;
                mesh.edge_mut(id).face_gradient = replay.pick(*old, *new);
            }
            Operation::SetFaceEdge { face: f, old, new } => {
                let id = face(mesh, *f)?;
                mesh.face_mut(id).edge = replay.pick(*old, *new);
            }
            Operation::SetIndices { face: f, old, new } => {
                mesh.set_face_indices(*f, replay.pick(*old, *new));
            }
            Operation::ResetMesh { before } => match replay {
                Replay::Undo => *mesh = before.as_ref().clone(),
                Replay::Redo => mesh.reset(),
            },
        }
        Ok(())
    }

    /// Collect the live faces whose geometry this operation may have changed
    pub(crate) fn touched_faces(&self, mesh: &WingedMesh, faces: &mut BTreeSet<FaceId>) {
        let add_vertex_faces = |vertex: VertexId, faces: &mut BTreeSet<FaceId>| {
            if mesh.get_vertex(vertex).is_some_and(|v| v.edge.is_some()) {
                faces.extend(mesh.vertex_faces(vertex));
            }
        };
        let add_edge_faces = |edge: EdgeId, faces: &mut BTreeSet<FaceId>| {
            if let Some(e) = mesh.get_edge(edge) {
                faces.extend([e.left_face, e.right_face].into_iter().filter(|&f| mesh.get_face(f).is_some()));
            }
        };

        match self {
            Operation::SetPosition { vertex, .. } => add_vertex_faces(vertex.slot, faces),
            Operation::AddEdge { edge, .. }
            | Operation::DeleteEdge { edge, .. }
            | Operation::SetEdgeVertex { edge, .. }
            | Operation::SetEdgeFace { edge, .. }
            | Operation::SetEdgeLink { edge, .. } => add_edge_faces(edge.slot, faces),
            Operation::AddFace { face, .. }
            | Operation::DeleteFace { face, .. }
            | Operation::SetFaceEdge { face, .. } => {
                if mesh.get_face(face.slot).is_some() {
                    faces.insert(face.slot);
                }
            }
            Operation::ResetMesh { .. } => faces.extend(mesh.face_ids()),
            _ => {}
        }
    }
}
