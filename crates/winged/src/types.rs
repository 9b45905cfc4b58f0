//! Handles and error types for the winged-edge mesh.
//!
//! Two kinds of handles exist side by side:
//! - Slot ids ([`VertexId`], [`EdgeId`], [`FaceId`]) index the pooled storage.
//!   Slots are recycled after deletion.
//! - [`Identifier`]s are unique for the lifetime of the process and are
//!   never recycled, so they stay meaningful across undo/redo.

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Slot index into one of the mesh's element pools
pub trait SlotId: Copy + Eq + Ord + Hash + fmt::Debug {
    /// Element kind, used in error messages
    const KIND: &'static str;

    fn from_slot(slot: u32) -> Self;
    fn slot(self) -> u32;

    fn index(self) -> usize {
        self.slot() as usize
    }
}

macro_rules! slot_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl SlotId for $name {
            const KIND: &'static str = $kind;

            fn from_slot(slot: u32) -> Self {
                Self(slot)
            }

            fn slot(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

slot_id!(
    /// Type-safe vertex slot. Also the index into the position and normal buffers.
    VertexId,
    "vertex"
);
slot_id!(
    /// Type-safe edge slot
    EdgeId,
    "edge"
);
slot_id!(
    /// Type-safe face slot. Owns render-index slots `3 * slot .. 3 * slot + 3`.
    FaceId,
    "face"
);

static NEXT_IDENTIFIER: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique handle assigned once at element (or mesh) creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier(u64);

impl Identifier {
    /// Draw a fresh identifier. Identifiers increase monotonically.
    pub fn next() -> Self {
        Self(NEXT_IDENTIFIER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A slot id paired with the identifier of the element that lived there.
///
/// Stored by the undo log: the identifier detects a recycled slot, the slot
/// tells where to rebuild a deleted element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef<I> {
    pub identifier: Identifier,
    pub slot: I,
}

impl<I> ElementRef<I> {
    pub fn new(identifier: Identifier, slot: I) -> Self {
        Self { identifier, slot }
    }
}

/// Subdivision-level mismatch marker of an edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceGradient {
    #[default]
    None,
    Left,
    Right,
}

/// Errors raised while building a mesh from an indexed triangle soup
#[derive(Debug, thiserror::Error)]
pub enum WingedError {
    #[error("Mesh definition has no vertices")]
    NoVertices,
    #[error("Index count {0} is not divisible by 3")]
    NotTriangles(usize),
    #[error("Triangle {triangle} references vertex {index}, but only {count} vertices exist")]
    IndexOutOfBounds {
        triangle: usize,
        index: u32,
        count: usize,
    },
    #[error("Triangle {0} repeats a vertex")]
    DegenerateTriangle(usize),
    #[error("Directed edge ({0}, {1}) is used by more than one triangle")]
    DuplicateEdge(u32, u32),
    #[error("Edge ({0}, {1}) is shared by more than two triangles")]
    NonManifoldEdge(u32, u32),
    #[error("Edge ({0}, {1}) borders only one triangle")]
    OpenEdge(u32, u32),
    #[error("Vertex {0} is not referenced by any triangle")]
    IsolatedVertex(u32),
    #[error("{kind} slot {slot} is already occupied")]
    SlotOccupied { kind: &'static str, slot: u32 },
}
