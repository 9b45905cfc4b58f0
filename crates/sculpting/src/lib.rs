//! Topology-changing sculpting on winged-edge meshes.
//!
//! This crate turns the raw [`winged::WingedMesh`] into an undoable
//! sculpting kernel:
//! - **Transaction**: every mutation goes through a [`MeshEdit`] that
//!   records an inverse-able operation log
//! - **History**: per-gesture undo/redo across the meshes of a registry
//! - **Partial**: topology operators (insert, delete, collapse, flip,
//!   subdivide, triangulate, smooth) that leave post-work staged in
//!   [`winged::AffectedFaces`]
//! - **Action**: whole edits built from operators, ending in [`finalize`]
//! - **Brush**: carve displacement and domain queries
//! - **Pipeline**: stroke → dab → post-processing → finalize
//!
//! # Architecture
//!
//! ```text
//!   SculptingPipeline ──> SculptBrush ──┐
//!           │                           v
//!           └──────────────> action ──> partial ──> MeshEdit ──> WingedMesh
//!                                                      │
//!   History <── Transaction <──────────────────────────┘
//! ```
//!
//! Operators never call [`finalize`] themselves. An action runs any number
//! of operators and finalizes once, so the mesh is only guaranteed free of
//! degenerated faces, realigned in the octree and buffered between actions.

pub mod action;
pub mod brush;
pub mod butterfly;
pub mod history;
pub mod partial;
pub mod pipeline;
pub mod registry;
pub mod transaction;

pub use action::finalize;
pub use brush::{BrushMode, DomainQuery, Falloff, SculptBrush};
pub use history::{Gesture, History};
pub use pipeline::{DabResult, SculptingPipeline, StrokeEndResult};
pub use registry::MeshRegistry;
pub use transaction::{MeshEdit, Transaction, TransactionError};
